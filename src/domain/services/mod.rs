pub mod actions;
mod attachments;
mod bot_flow;
mod chat_state;
mod session_store;
mod synchronizer;
mod ticket_resolver;
mod upload_coordinator;

pub use attachments::*;
pub use bot_flow::*;
pub use chat_state::*;
pub use session_store::*;
pub use synchronizer::*;
pub use ticket_resolver::*;
pub use upload_coordinator::*;
