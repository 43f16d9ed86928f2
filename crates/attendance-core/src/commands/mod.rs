//! Chat command handling.
//!
//! This module turns inbound chat text into a [`Command`], runs it against
//! the dataset cache, search engine and query history through the
//! [`Dispatcher`], and renders the reply text.

pub mod dispatcher;
pub mod messages;
pub mod parse;

pub use dispatcher::{Dispatcher, InvalidQuery};
pub use messages::{Reply, ReplyFormat};
pub use parse::Command;
