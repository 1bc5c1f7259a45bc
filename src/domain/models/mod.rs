mod chat_event;
mod chat_state;
mod endpoint;
mod error;
mod history;
mod session;
mod slash_commands;
mod transport;

pub use chat_event::*;
pub use chat_state::*;
pub use endpoint::*;
pub use error::*;
pub use history::*;
pub use session::*;
pub use slash_commands::*;
pub use transport::*;
