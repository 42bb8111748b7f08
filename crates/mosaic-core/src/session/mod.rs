//! Session domain module.
//!
//! # Module Structure
//!
//! - `model`: Session identity and externally owned status (`Session`, `SessionKey`,
//!   `SessionLifecycle`, `RuntimeStatus`, `ComposerState`)
//! - `commands`: Send / interrupt interface (`SessionCommands`)

mod commands;
mod model;

pub use commands::{OutgoingMessage, SessionCommands};
pub use model::{ComposerState, RuntimeStatus, Session, SessionKey, SessionLifecycle};
