mod channel;
pub mod codec;
pub mod engine;
pub mod transport;

pub use channel::Channel;
pub use codec::{MessageBuilder, RecordExtractor, ResponseParser};
pub use engine::{HostCallback, NameInfoCallback, QueryCallback, QueryEngine, QueryState};
pub use transport::{SocketEvent, SocketMultiplexer, Transport};
