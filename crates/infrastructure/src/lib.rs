//! Ferrous Resolv Infrastructure Layer
pub mod dns;
pub mod logging;
pub mod service_catalog;
pub mod system;

pub use dns::Channel;
pub use logging::init_logging;
pub use service_catalog::ServiceCatalog;
pub use system::SystemClock;
