//! Event intake and command dispatch for the Q&A bot.
//!
//! A single intake task feeds a bounded queue; a single dispatcher task
//! drains it in order and performs every write.

pub mod commands;
pub mod context;
pub mod dispatcher;
pub mod error;
pub mod intake;
pub mod ports;
pub mod replies;

pub use commands::Command;
pub use context::{AppContext, AppState};
pub use dispatcher::{handle_message, run_dispatcher};
pub use error::{ChatError, DispatchError, IntakeError, ValidationError};
pub use intake::{DEFAULT_QUEUE_CAPACITY, message_queue, run_intake};
pub use ports::{EventSource, ProfileLookup, ReplySink};
