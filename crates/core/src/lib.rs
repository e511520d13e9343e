#![warn(clippy::all, missing_docs)]

//! Core domain logic for the tallytui consumption calendar.
//!
//! This crate hosts the value-adjuster interaction state machine, input
//! modality resolution, the optimistic ledger/coordinator, the persisted
//! record store, calendar and statistics math, and configuration handling
//! used by the terminal UI and any future frontends.

pub mod adjuster;
pub mod calendar;
pub mod config;
pub mod ledger;
pub mod modality;
pub mod models;
pub mod stats;
pub mod store;

pub use adjuster::{Adjuster, AdjusterState, GestureEvent, Outcome, Pulse};
pub use config::AppConfig;
pub use ledger::{Coordinator, Ledger, StoreEvent};
pub use modality::{InputMode, ModalityResolver};
pub use models::{Commit, CommitTarget, DayMap, MAX_COUNT};
pub use store::FileStore;
