pub mod chat_stream;
pub mod config;
pub mod format;
pub mod history;
pub mod message;
pub mod request;
pub mod session;
pub mod storage;
pub mod stream_decoder;
