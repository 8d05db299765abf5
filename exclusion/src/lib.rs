//! # Exclusion
//!
//! Decides which filesystem subtrees are safe to enumerate. Directory
//! walkers consult an [`ExclusionPolicy`] before descending into any
//! subdirectory so that system volumes, snapshot stores, and similar
//! trees never show up in the browser.
//!
//! ## Tiers
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                      ExclusionPolicy                         │
//! ├──────────────────────────────────────────────────────────────┤
//! │  exact path ─► folder name ─► platform ─► common file ─► pattern │
//! │      any tier matching excludes the path (union)             │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! Evaluation never fails from the caller's point of view: malformed
//! input is logged and treated as "not excluded".

pub mod error;
pub mod normalize;
pub mod platform;
pub mod policy;
pub mod rules;
pub mod walk;

pub use error::{ExclusionError, Result};
pub use normalize::{fold, normalize};
pub use platform::Platform;
pub use policy::{ExclusionMatch, ExclusionPolicy};
pub use rules::{ExclusionRuleSet, RuleCounts};
pub use walk::{EntryKind, ErrorPolicy, Walk, WalkEntry, WalkOptions, walk};
