pub trait ServiceCatalogPort: Send + Sync {
    /// Well-known service name for `port` under `protocol` ("tcp" or "udp").
    fn service_name(&self, port: u16, protocol: &str) -> Option<String>;
}
