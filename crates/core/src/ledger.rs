//! Optimistic data layer between the input controller and the store.
//!
//! Commits mutate the in-memory [`Ledger`] synchronously, then the matching
//! store call runs in the background. The UI therefore never shows a value
//! that has not at least been requested to persist. Store operations drain
//! through one worker task in issue order, so a burst of drag commits can
//! never overtake each other on disk. When a store call fails, the worker
//! reports it and refetches the full record set; ground truth replaces the
//! optimistic state wholesale. There is no partial retry and no queued
//! replay.

use chrono::NaiveDate;
use tokio::sync::mpsc;
use tracing::{debug, error};

use crate::models::{date_key, Commit, CommitTarget, DayMap};
use crate::store::FileStore;

/// Outcomes of background store work, delivered to the host event loop.
#[derive(Debug)]
pub enum StoreEvent {
    /// An upsert or delete failed; a resync attempt follows automatically.
    PersistFailed {
        /// What the failed call was persisting.
        target: CommitTarget,
        /// The underlying store error.
        error: anyhow::Error,
    },
    /// Fresh ground truth fetched from the store. The host should feed it
    /// to [`Coordinator::apply_resync`].
    Resynced {
        /// Every recorded day for the profile.
        days: DayMap,
        /// The stored weekly goal.
        goal: Option<u8>,
    },
    /// The resync itself failed; local state is left as-is.
    ResyncFailed(anyhow::Error),
}

/// Local in-memory view of the profile's records.
#[derive(Debug, Clone, Default)]
pub struct Ledger {
    days: DayMap,
    goal: Option<u8>,
}

impl Ledger {
    /// Build a ledger from hydrated store contents.
    pub fn new(days: DayMap, goal: Option<u8>) -> Self {
        Ledger { days, goal }
    }

    /// All recorded days, keyed by date string.
    pub fn days(&self) -> &DayMap {
        &self.days
    }

    /// The recorded count for a date, if any.
    pub fn count_on(&self, date: NaiveDate) -> Option<u8> {
        self.days.get(&date_key(date)).copied()
    }

    /// The weekly goal, if set.
    pub fn goal(&self) -> Option<u8> {
        self.goal
    }

    /// Apply a day commit to local state.
    pub fn apply_day(&mut self, key: &str, commit: Commit) {
        match commit {
            Commit::Set(count) => {
                self.days.insert(key.to_string(), count);
            }
            Commit::Clear => {
                self.days.remove(key);
            }
        }
    }

    /// Apply a goal commit to local state.
    pub fn apply_goal(&mut self, commit: Commit) {
        self.goal = commit.value();
    }
}

enum StoreOp {
    PersistDay { date: NaiveDate, commit: Commit },
    PersistGoal { commit: Commit },
    Resync,
}

/// Routes committed value changes to the ledger and the store.
///
/// Construction spawns the store worker, so a coordinator must be created
/// inside a tokio runtime. Dropping it lets the worker drain and exit;
/// already-issued operations always run to completion.
pub struct Coordinator {
    ledger: Ledger,
    ops: mpsc::UnboundedSender<StoreOp>,
}

impl Coordinator {
    /// Wire a coordinator over a hydrated ledger. Store outcomes arrive on
    /// the paired receiver of `events`.
    pub fn new(
        store: FileStore,
        profile: String,
        ledger: Ledger,
        events: mpsc::Sender<StoreEvent>,
    ) -> Self {
        let (ops, ops_rx) = mpsc::unbounded_channel();
        tokio::spawn(run_store_worker(store, profile, ops_rx, events));
        Coordinator { ledger, ops }
    }

    /// Read access for rendering.
    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    /// Commit a day's value: local state first, then the store call in the
    /// background.
    pub fn commit_day(&mut self, date: NaiveDate, commit: Commit) {
        let key = date_key(date);
        self.ledger.apply_day(&key, commit);
        debug!(date = %key, ?commit, "day committed");
        let _ = self.ops.send(StoreOp::PersistDay { date, commit });
    }

    /// Commit the weekly goal. Clearing stores null; the goal row is never
    /// deleted.
    pub fn commit_goal(&mut self, commit: Commit) {
        self.ledger.apply_goal(commit);
        debug!(?commit, "goal committed");
        let _ = self.ops.send(StoreOp::PersistGoal { commit });
    }

    /// Fetch ground truth in the background; the result arrives as a
    /// [`StoreEvent::Resynced`].
    pub fn begin_resync(&self) {
        let _ = self.ops.send(StoreOp::Resync);
    }

    /// Replace local state with fetched ground truth.
    pub fn apply_resync(&mut self, days: DayMap, goal: Option<u8>) {
        self.ledger = Ledger::new(days, goal);
    }
}

async fn run_store_worker(
    store: FileStore,
    profile: String,
    mut ops: mpsc::UnboundedReceiver<StoreOp>,
    events: mpsc::Sender<StoreEvent>,
) {
    while let Some(op) = ops.recv().await {
        match op {
            StoreOp::PersistDay { date, commit } => {
                let key = date_key(date);
                let result = match commit {
                    Commit::Set(count) => store.upsert_day(&profile, &key, count).await,
                    Commit::Clear => store.delete_day(&profile, &key).await,
                };
                if let Err(err) = result {
                    report_and_resync(&store, &profile, &events, CommitTarget::Day(date), err)
                        .await;
                }
            }
            StoreOp::PersistGoal { commit } => {
                if let Err(err) = store.save_goal(&profile, commit.value()).await {
                    report_and_resync(&store, &profile, &events, CommitTarget::Goal, err).await;
                }
            }
            StoreOp::Resync => {
                let _ = events.send(fetch_ground_truth(&store, &profile).await).await;
            }
        }
    }
}

async fn report_and_resync(
    store: &FileStore,
    profile: &str,
    events: &mpsc::Sender<StoreEvent>,
    target: CommitTarget,
    error: anyhow::Error,
) {
    error!(?target, %error, "persistence failed, refetching ground truth");
    let _ = events.send(StoreEvent::PersistFailed { target, error }).await;
    let _ = events.send(fetch_ground_truth(store, profile).await).await;
}

async fn fetch_ground_truth(store: &FileStore, profile: &str) -> StoreEvent {
    let days = match store.load_days(profile).await {
        Ok(days) => days,
        Err(err) => return StoreEvent::ResyncFailed(err),
    };
    match store.load_goal(profile).await {
        Ok(goal) => StoreEvent::Resynced { days, goal },
        Err(err) => StoreEvent::ResyncFailed(err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adjuster::{Adjuster, GestureEvent};
    use crate::models::MAX_COUNT;
    use std::time::Duration;
    use tempfile::tempdir;
    use tokio::time::{sleep, timeout};

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    async fn recv(rx: &mut mpsc::Receiver<StoreEvent>) -> StoreEvent {
        timeout(Duration::from_secs(5), rx.recv())
            .await
            .expect("timed out waiting for store event")
            .expect("event channel closed")
    }

    async fn wait_for_stored(store: &FileStore, profile: &str, key: &str) -> Option<u8> {
        for _ in 0..50 {
            let days = store.load_days(profile).await.unwrap();
            if let Some(count) = days.get(key) {
                return Some(*count);
            }
            sleep(Duration::from_millis(20)).await;
        }
        None
    }

    #[tokio::test]
    async fn commit_is_visible_locally_before_persistence() {
        let dir = tempdir().unwrap();
        let store = FileStore::new(dir.path());
        let (tx, _rx) = mpsc::channel(8);
        let mut coordinator =
            Coordinator::new(store.clone(), "p".to_string(), Ledger::default(), tx);

        let date = day(2025, 3, 14);
        coordinator.commit_day(date, Commit::Set(5));
        // Local read succeeds before any store round trip completes.
        assert_eq!(coordinator.ledger().count_on(date), Some(5));

        assert_eq!(wait_for_stored(&store, "p", "2025-03-14").await, Some(5));
    }

    #[tokio::test]
    async fn tap_on_empty_cell_stores_an_explicit_zero() {
        let dir = tempdir().unwrap();
        let store = FileStore::new(dir.path());
        let (tx, _rx) = mpsc::channel(8);
        let mut coordinator =
            Coordinator::new(store.clone(), "p".to_string(), Ledger::default(), tx);

        // An empty cell opens the adjuster in the clearing state; a single
        // tap commits 0, not 1.
        let date = day(2025, 3, 14);
        let mut adjuster = Adjuster::new(coordinator.ledger().count_on(date));
        assert!(adjuster.is_clearing());
        let commit = adjuster
            .handle(GestureEvent::Tap)
            .commit
            .expect("tap from clearing commits");
        coordinator.commit_day(date, commit);

        assert_eq!(coordinator.ledger().count_on(date), Some(0));
        assert_eq!(wait_for_stored(&store, "p", "2025-03-14").await, Some(0));
    }

    #[tokio::test]
    async fn rapid_commits_persist_in_order() {
        let dir = tempdir().unwrap();
        let store = FileStore::new(dir.path());
        let (tx, _rx) = mpsc::channel(8);
        let mut coordinator =
            Coordinator::new(store.clone(), "p".to_string(), Ledger::default(), tx);

        let date = day(2025, 3, 14);
        // A drag burst: every intermediate value commits.
        for value in [5, 6, 7, 8] {
            coordinator.commit_day(date, Commit::Set(value));
        }
        assert_eq!(coordinator.ledger().count_on(date), Some(8));

        // The last issued value wins on disk, never an intermediate one.
        for _ in 0..50 {
            if store.load_days("p").await.unwrap().get("2025-03-14") == Some(&8) {
                return;
            }
            sleep(Duration::from_millis(20)).await;
        }
        panic!("final value never reached the store");
    }

    #[tokio::test]
    async fn clear_removes_local_entry_and_store_row() {
        let dir = tempdir().unwrap();
        let store = FileStore::new(dir.path());
        store.upsert_day("p", "2025-03-14", 7).await.unwrap();
        let days = store.load_days("p").await.unwrap();
        let (tx, _rx) = mpsc::channel(8);
        let mut coordinator =
            Coordinator::new(store.clone(), "p".to_string(), Ledger::new(days, None), tx);

        let date = day(2025, 3, 14);
        coordinator.commit_day(date, Commit::Clear);
        assert_eq!(coordinator.ledger().count_on(date), None);

        for _ in 0..50 {
            if !store
                .load_days("p")
                .await
                .unwrap()
                .contains_key("2025-03-14")
            {
                return;
            }
            sleep(Duration::from_millis(20)).await;
        }
        panic!("delete never reached the store");
    }

    #[tokio::test]
    async fn goal_commit_applies_locally_and_persists() {
        let dir = tempdir().unwrap();
        let store = FileStore::new(dir.path());
        let (tx, _rx) = mpsc::channel(8);
        let mut coordinator =
            Coordinator::new(store.clone(), "p".to_string(), Ledger::default(), tx);

        coordinator.commit_goal(Commit::Set(9));
        assert_eq!(coordinator.ledger().goal(), Some(9));

        for _ in 0..50 {
            if store.load_goal("p").await.unwrap() == Some(9) {
                break;
            }
            sleep(Duration::from_millis(20)).await;
        }
        assert_eq!(store.load_goal("p").await.unwrap(), Some(9));

        coordinator.commit_goal(Commit::Clear);
        assert_eq!(coordinator.ledger().goal(), None);
    }

    #[tokio::test]
    async fn failed_persist_reports_then_attempts_resync() {
        let dir = tempdir().unwrap();
        let store = FileStore::new(dir.path());
        // A directory where the days document should be makes every write
        // and read of it fail, without touching permissions.
        std::fs::create_dir_all(dir.path().join("p").join("days.json")).unwrap();
        let (tx, mut rx) = mpsc::channel(8);
        let mut coordinator = Coordinator::new(store, "p".to_string(), Ledger::default(), tx);

        let date = day(2025, 3, 14);
        coordinator.commit_day(date, Commit::Set(5));
        // Optimistic state is applied even though persistence will fail.
        assert_eq!(coordinator.ledger().count_on(date), Some(5));

        match recv(&mut rx).await {
            StoreEvent::PersistFailed { target, .. } => {
                assert_eq!(target, CommitTarget::Day(date));
            }
            other => panic!("expected PersistFailed, got {other:?}"),
        }
        match recv(&mut rx).await {
            StoreEvent::ResyncFailed(_) => {}
            other => panic!("expected ResyncFailed, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn resync_replaces_optimistic_state_with_ground_truth() {
        let dir = tempdir().unwrap();
        let store = FileStore::new(dir.path());
        store.upsert_day("p", "2025-03-14", 3).await.unwrap();
        store.save_goal("p", Some(10)).await.unwrap();

        let (tx, mut rx) = mpsc::channel(8);
        let mut coordinator = Coordinator::new(store, "p".to_string(), Ledger::default(), tx);

        // Pretend an optimistic commit was applied that never made it out.
        let date = day(2025, 3, 14);
        coordinator
            .ledger
            .apply_day("2025-03-14", Commit::Set(MAX_COUNT));
        assert_eq!(coordinator.ledger().count_on(date), Some(MAX_COUNT));

        coordinator.begin_resync();
        match recv(&mut rx).await {
            StoreEvent::Resynced { days, goal } => {
                coordinator.apply_resync(days, goal);
            }
            other => panic!("expected Resynced, got {other:?}"),
        }
        // The store's value wins; the optimistic one is gone.
        assert_eq!(coordinator.ledger().count_on(date), Some(3));
        assert_eq!(coordinator.ledger().goal(), Some(10));
    }
}
