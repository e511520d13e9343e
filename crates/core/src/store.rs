//! Persisted record store: JSON documents under a per-profile directory.
//!
//! The store is the durable side of the optimistic data layer. Operations
//! follow the external contract: all days for a profile, upsert/delete by
//! `(profile, date)`, and a single-row weekly goal per profile, with
//! last-writer-wins semantics per key. All I/O is async so persistence
//! never blocks the interaction loop.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tokio::fs;

use crate::models::{DayMap, MAX_COUNT};

const DAYS_FILE: &str = "days.json";
const GOAL_FILE: &str = "goal.json";

/// Single-row weekly goal document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct GoalDoc {
    weekly_goal: Option<u8>,
}

/// File-backed record store rooted at a data directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    /// Create a store over the given root. Nothing is touched until the
    /// first operation.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        FileStore { root: root.into() }
    }

    /// Root directory holding all profiles.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Ensure the profile's directory exists.
    pub async fn prepare(&self, profile: &str) -> Result<()> {
        let dir = self.profile_dir(profile);
        fs::create_dir_all(&dir)
            .await
            .with_context(|| format!("failed to create data directory {}", dir.display()))?;
        Ok(())
    }

    /// Load every recorded day for the profile. A missing document is an
    /// empty map, not an error. Stored counts are clamped back into range
    /// in case the document was edited by hand.
    pub async fn load_days(&self, profile: &str) -> Result<DayMap> {
        let path = self.days_path(profile);
        let mut days: DayMap = match read_document(&path).await? {
            Some(days) => days,
            None => DayMap::new(),
        };
        for count in days.values_mut() {
            *count = (*count).min(MAX_COUNT);
        }
        Ok(days)
    }

    /// Insert or replace the count for one `(profile, date)` key.
    pub async fn upsert_day(&self, profile: &str, date: &str, count: u8) -> Result<()> {
        let mut days = self.load_days(profile).await?;
        days.insert(date.to_string(), count.min(MAX_COUNT));
        self.write_days(profile, &days).await
    }

    /// Remove the record for one `(profile, date)` key. Deleting an absent
    /// key is not an error.
    pub async fn delete_day(&self, profile: &str, date: &str) -> Result<()> {
        let mut days = self.load_days(profile).await?;
        days.remove(date);
        self.write_days(profile, &days).await
    }

    /// Load the profile's weekly goal, if one is set.
    pub async fn load_goal(&self, profile: &str) -> Result<Option<u8>> {
        let doc: GoalDoc = match read_document(&self.goal_path(profile)).await? {
            Some(doc) => doc,
            None => GoalDoc::default(),
        };
        Ok(doc.weekly_goal.map(|goal| goal.min(MAX_COUNT)))
    }

    /// Set or clear the weekly goal. The goal is a single row; clearing
    /// stores null rather than deleting the document.
    pub async fn save_goal(&self, profile: &str, goal: Option<u8>) -> Result<()> {
        let doc = GoalDoc {
            weekly_goal: goal.map(|value| value.min(MAX_COUNT)),
        };
        write_document(&self.goal_path(profile), &doc).await
    }

    async fn write_days(&self, profile: &str, days: &DayMap) -> Result<()> {
        write_document(&self.days_path(profile), days).await
    }

    fn profile_dir(&self, profile: &str) -> PathBuf {
        self.root.join(sanitize_component(profile))
    }

    fn days_path(&self, profile: &str) -> PathBuf {
        self.profile_dir(profile).join(DAYS_FILE)
    }

    fn goal_path(&self, profile: &str) -> PathBuf {
        self.profile_dir(profile).join(GOAL_FILE)
    }
}

async fn read_document<T>(path: &Path) -> Result<Option<T>>
where
    T: serde::de::DeserializeOwned,
{
    let bytes = match fs::read(path).await {
        Ok(bytes) => bytes,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(err) => {
            return Err(err).with_context(|| format!("failed to read {}", path.display()))
        }
    };
    let value = serde_json::from_slice(&bytes)
        .with_context(|| format!("failed to parse {}", path.display()))?;
    Ok(Some(value))
}

async fn write_document<T>(path: &Path, value: &T) -> Result<()>
where
    T: Serialize,
{
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .await
            .with_context(|| format!("failed to create directory {}", parent.display()))?;
    }
    let payload =
        serde_json::to_vec_pretty(value).context("failed to serialize store document")?;
    fs::write(path, payload)
        .await
        .with_context(|| format!("failed to write {}", path.display()))
}

fn sanitize_component(input: &str) -> String {
    let mut result = String::with_capacity(input.len());
    for ch in input.chars() {
        if ch.is_ascii_alphanumeric() || matches!(ch, '-' | '_') {
            result.push(ch);
        }
    }
    if result.is_empty() {
        "default".to_string()
    } else {
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn day_records_round_trip() -> Result<()> {
        let dir = tempdir()?;
        let store = FileStore::new(dir.path());

        assert!(store.load_days("casey").await?.is_empty());

        store.upsert_day("casey", "2025-03-14", 5).await?;
        store.upsert_day("casey", "2025-03-15", 0).await?;
        let days = store.load_days("casey").await?;
        assert_eq!(days.get("2025-03-14"), Some(&5));
        assert_eq!(days.get("2025-03-15"), Some(&0));

        // Upsert replaces in place.
        store.upsert_day("casey", "2025-03-14", 7).await?;
        assert_eq!(
            store.load_days("casey").await?.get("2025-03-14"),
            Some(&7)
        );

        store.delete_day("casey", "2025-03-14").await?;
        let days = store.load_days("casey").await?;
        assert!(!days.contains_key("2025-03-14"));
        // Deleting twice is fine.
        store.delete_day("casey", "2025-03-14").await?;
        Ok(())
    }

    #[tokio::test]
    async fn zero_survives_the_round_trip() -> Result<()> {
        let dir = tempdir()?;
        let store = FileStore::new(dir.path());
        store.upsert_day("p", "2025-01-01", 0).await?;
        assert_eq!(store.load_days("p").await?.get("2025-01-01"), Some(&0));
        Ok(())
    }

    #[tokio::test]
    async fn hand_edited_counts_are_clamped_on_load() -> Result<()> {
        let dir = tempdir()?;
        let store = FileStore::new(dir.path());
        store.prepare("p").await?;
        let path = dir.path().join("p").join(DAYS_FILE);
        fs::write(&path, br#"{"2025-01-01": 250}"#).await?;
        assert_eq!(
            store.load_days("p").await?.get("2025-01-01"),
            Some(&MAX_COUNT)
        );
        Ok(())
    }

    #[tokio::test]
    async fn goal_round_trip_including_clear() -> Result<()> {
        let dir = tempdir()?;
        let store = FileStore::new(dir.path());

        assert_eq!(store.load_goal("p").await?, None);
        store.save_goal("p", Some(9)).await?;
        assert_eq!(store.load_goal("p").await?, Some(9));
        store.save_goal("p", None).await?;
        assert_eq!(store.load_goal("p").await?, None);
        Ok(())
    }

    #[tokio::test]
    async fn profiles_are_isolated() -> Result<()> {
        let dir = tempdir()?;
        let store = FileStore::new(dir.path());
        store.upsert_day("one", "2025-01-01", 3).await?;
        assert!(store.load_days("two").await?.is_empty());
        Ok(())
    }

    #[test]
    fn sanitize_keeps_profile_paths_safe() {
        assert_eq!(sanitize_component("../../etc"), "etc");
        assert_eq!(sanitize_component("casey-2"), "casey-2");
        assert_eq!(sanitize_component(""), "default");
    }
}
