mod clock;
mod event_source;
mod service_catalog_port;

pub use clock::Clock;
pub use event_source::{EventSource, SocketFd, SocketInterest, NO_SOCKET};
pub use service_catalog_port::ServiceCatalogPort;
