pub mod bus;
pub mod error;
pub mod feed;
pub mod history;
pub mod message;
pub mod reconcile;
pub mod registry;
pub mod session;

// Re-export common error type
pub use error::MosaicError;
