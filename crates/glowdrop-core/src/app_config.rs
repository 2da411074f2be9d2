use std::net::SocketAddr;
use std::path::PathBuf;

use crate::discovery::DiscoverySettings;
use crate::geo::Coordinates;
use crate::vendors::ChainDenyList;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub env: Environment,
    pub bind_addr: SocketAddr,
    pub log_level: String,
    /// `None` selects the embedded reference dataset.
    pub reference_data_path: Option<PathBuf>,
    /// Fallback origin for customers whose postal code is not in the index.
    pub hub: Coordinates,
    pub banned_chains: Vec<String>,
    /// Search radii (miles) accepted at the API edge.
    pub allowed_radii: Vec<u32>,
    pub discovery_cache_max_entries: usize,
    /// Bearer tokens accepted on the catalog import routes.
    pub admin_tokens: Vec<String>,
}

impl AppConfig {
    #[must_use]
    pub fn discovery_settings(&self) -> DiscoverySettings {
        DiscoverySettings {
            hub: self.hub,
            chains: ChainDenyList::new(&self.banned_chains),
        }
    }
}
