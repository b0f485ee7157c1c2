pub mod events;
pub mod models;

pub use events::{ConnectionState, InboundEvent, Message};
pub use models::{Answer, Profile, Question, User};
