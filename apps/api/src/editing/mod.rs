//! Natural-language resume editing.
//!
//! A chat instruction becomes a batch of `MutationCommand`s (via the language model),
//! which are validated against the schema and applied to a working copy of the document.

pub mod apply;
pub mod command;
pub mod extract;
pub mod interpreter;
pub mod prompts;
pub mod schema;

pub use apply::ApplyReport;
pub use interpreter::{CommandInterpreter, Interpretation};
