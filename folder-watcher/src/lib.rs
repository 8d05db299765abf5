//! # Folder Watcher
//!
//! This crate watches the user's monitored folders and tells consumers,
//! once per burst of activity, that something under them changed.
//!
//! ## Features
//!
//! - **Replaceable Watch Set**: One recursive native watch per folder,
//!   swapped wholesale or edited one folder at a time
//! - **Debouncing**: A single restartable timer coalesces bursts across
//!   every watched folder into one notification
//! - **Pull-based Signal**: Consumers subscribe to a change counter and
//!   decide for themselves when to re-read and re-render
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                    Folder Watch Manager                         │
//! ├─────────────────────────────────────────────────────────────────┤
//! │  WatchedRoot(s) ──► DebounceTrigger ──► DebounceTimer           │
//! │  (notify thread)     (epoch check)      (tokio task)            │
//! │                                              │                  │
//! │                                              ▼                  │
//! │                                ChangeNotifier ──► ChangeReceiver│
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The manager's methods are synchronous but the debounce timer runs as a
//! task, so the manager must be created inside a tokio runtime.

pub mod config;
pub mod debounce;
pub mod error;
pub mod event;
pub mod manager;
pub mod notifier;

pub use config::WatchConfig;
pub use debounce::{DebounceTimer, DebounceTrigger};
pub use error::{Result, WatcherError};
pub use event::FileEventKind;
pub use manager::{FolderWatchManager, SkipReason, SkippedRoot, WatchSummary, WatcherStats};
pub use notifier::{ChangeNotifier, ChangeReceiver};
