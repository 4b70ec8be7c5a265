//! Sink implementations
//!
//! Contains LogSink, ChannelSink, FileSink, and FanoutSink.

mod channel;
mod fanout;
mod file;
mod log;

pub use self::channel::{ChannelSink, FrameReceiver};
pub use self::fanout::FanoutSink;
pub use self::file::{FileSink, FileSinkConfig};
pub use self::log::LogSink;
