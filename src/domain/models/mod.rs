mod action;
mod backend;
mod event;
mod message;
mod recorder;
mod render;
mod session;
mod slash_commands;
mod ticket;

pub use action::*;
pub use backend::*;
pub use event::*;
pub use message::*;
pub use recorder::*;
pub use render::*;
pub use session::*;
pub use slash_commands::*;
pub use ticket::*;
