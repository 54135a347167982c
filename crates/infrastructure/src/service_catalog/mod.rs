use ferrous_resolv_application::ports::ServiceCatalogPort;
use rustc_hash::FxHashMap;
use serde::Deserialize;

#[derive(Deserialize)]
struct RawService {
    name: String,
    port: u16,
    protocols: Vec<String>,
}

/// Port to service-name table, seeded from services.json at compile time.
#[derive(Debug, Clone, Default)]
pub struct ServiceCatalog {
    by_port: FxHashMap<(u16, String), String>,
}

impl ServiceCatalog {
    pub fn load() -> Self {
        let json = include_str!("services.json");
        Self::from_json(json).expect("services.json must be valid JSON")
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let raw: Vec<RawService> = serde_json::from_str(json)?;
        let mut catalog = Self::default();
        for service in raw {
            for protocol in &service.protocols {
                catalog.insert(service.port, protocol, &service.name);
            }
        }
        Ok(catalog)
    }

    /// Adds or replaces the name of `port` under `protocol`.
    pub fn insert(&mut self, port: u16, protocol: &str, name: &str) {
        self.by_port
            .insert((port, protocol.to_ascii_lowercase()), name.to_string());
    }

    pub fn len(&self) -> usize {
        self.by_port.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_port.is_empty()
    }
}

impl ServiceCatalogPort for ServiceCatalog {
    fn service_name(&self, port: u16, protocol: &str) -> Option<String> {
        self.by_port
            .get(&(port, protocol.to_ascii_lowercase()))
            .cloned()
    }
}
