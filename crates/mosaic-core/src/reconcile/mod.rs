//! Live message reconciliation.
//!
//! Merges a wholesale history load and an incremental live feed into one
//! ordered, deduplicated message list per session. A sequence gap on the live
//! feed is never patched selectively: it triggers a full reload.
//!
//! # Module Structure
//!
//! - `store`: The ordered message list and the collapse set
//! - `reconciler`: Session-switch state machine, cursor and merge algorithm

mod reconciler;
mod store;


pub use reconciler::{IgnoreReason, LiveOutcome, LoadOutcome, LoadTicket, Phase, Reconciler};
pub use store::{CollapseSet, ReconciledStore};
