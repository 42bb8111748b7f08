//! Session history module.
//!
//! - `source`: Page-level fetch interface (`HistorySource`, `HistoryQuery`, `HistoryPage`)
//! - `loader`: Full-history loader used by the reconciler (`HistoryLoader`)

mod loader;
mod source;

pub use loader::{FULL_HISTORY_PAGE_SIZE, HistoryLoader};
pub use source::{HistoryPage, HistoryQuery, HistorySource};
