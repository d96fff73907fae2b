pub mod error;
pub mod media;
pub mod protocol;
pub mod server;
pub mod session;
pub mod source;
pub mod transport;

pub use error::{Result, StreamError};
pub use media::RtpPacket;
pub use server::{Server, StreamConfig};
pub use source::VideoSource;
