mod chat_client;
mod frame_decoder;
mod streams;
mod thinking_timer;

pub use chat_client::*;
pub use frame_decoder::*;
pub use streams::*;
pub use thinking_timer::*;
