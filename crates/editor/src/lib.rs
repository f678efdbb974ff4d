//! Reversible editing for the topology graph.
//!
//! Every user edit is a [`Command`] applied through a [`CommandLog`], which
//! keeps a single-timeline undo/redo history. Multi-part edits such as bulk
//! deletes or pastes are grouped into one `Command::Composite`.

mod clipboard;
mod command;
mod error;
mod history;

pub use clipboard::{Clipboard, PASTE_OFFSET};
pub use command::{AddLink, AddNode, Command, MoveNode, RemoveNode};
pub use error::EditError;
pub use history::CommandLog;
