mod chat_stream_client;

pub use chat_stream_client::{AuthStyle, ChatStreamClient};
