//! Message domain module.
//!
//! # Module Structure
//!
//! - `kind`: Role and type tags (`MessageRole`, `MessageType`)
//! - `body`: Decoded payloads (`MessageBody`) and payload normalisation
//! - `model`: The immutable `Message` and the history row `WireMessage`

mod body;
mod kind;
mod model;

pub use body::{MessageBody, normalize_payload};
pub use kind::{MessageRole, MessageType};
pub use model::{Message, WireMessage};
