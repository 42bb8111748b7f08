//! Live feed module.
//!
//! # Module Structure
//!
//! - `envelope`: Wire envelopes pushed by the transport (`LiveItem`)
//! - `subscription`: The subscription contract (`LiveFeed`, `Subscription`)
//! - `hub`: In-process multiplexer (`FeedHub`)

mod envelope;
mod hub;
mod subscription;

pub use envelope::{LiveItem, LiveMessage, LiveNotification, SessionSignal};
pub use hub::FeedHub;
pub use subscription::{LiveFeed, LiveHandler, Subscription};
