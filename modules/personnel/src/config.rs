use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Configuration for the personnel module (`modules.personnel` in the app config)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PersonnelConfig {
    /// How long a cached collection is served without refetching.
    #[serde(default = "default_cache_ttl_sec")]
    pub cache_ttl_sec: u64,
    /// Page size used when loading the whole people collection.
    #[serde(default = "default_people_fetch_size")]
    pub people_fetch_size: u32,
    /// File name of the persisted token, relative to the home directory.
    #[serde(default = "default_token_file")]
    pub token_file: String,
}

impl Default for PersonnelConfig {
    fn default() -> Self {
        Self {
            cache_ttl_sec: default_cache_ttl_sec(),
            people_fetch_size: default_people_fetch_size(),
            token_file: default_token_file(),
        }
    }
}

impl PersonnelConfig {
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_sec)
    }
}

fn default_cache_ttl_sec() -> u64 {
    300
}

fn default_people_fetch_size() -> u32 {
    1000
}

fn default_token_file() -> String {
    "token".to_string()
}
