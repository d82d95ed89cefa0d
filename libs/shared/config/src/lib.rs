use std::env;
use std::fmt;
use std::str::FromStr;

use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Supabase,
    Memory,
}

impl fmt::Display for StorageBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageBackend::Supabase => write!(f, "supabase"),
            StorageBackend::Memory => write!(f, "memory"),
        }
    }
}

impl FromStr for StorageBackend {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "supabase" => Ok(StorageBackend::Supabase),
            "memory" | "in_memory" => Ok(StorageBackend::Memory),
            other => Err(format!("unknown storage backend '{}'", other)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub supabase_url: String,
    pub supabase_anon_key: String,
    pub storage_backend: StorageBackend,
    pub storage_timeout_seconds: u64,
    pub notification_timeout_ms: u64,
    pub notification_channel_capacity: usize,
    pub server_port: u16,
    pub slot_seed_path: Option<String>,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_source(|key| env::var(key).ok())
    }

    /// Builds the configuration from any key lookup; `from_env` passes the process environment.
    pub fn from_source<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let supabase_url = lookup("SUPABASE_URL").unwrap_or_else(|| {
            warn!("SUPABASE_URL not set, using empty value");
            String::new()
        });
        let supabase_anon_key = lookup("SUPABASE_ANON_PUBLIC_KEY").unwrap_or_else(|| {
            warn!("SUPABASE_ANON_PUBLIC_KEY not set, using empty value");
            String::new()
        });

        let supabase_ready = !supabase_url.is_empty() && !supabase_anon_key.is_empty();
        let default_backend = if supabase_ready {
            StorageBackend::Supabase
        } else {
            StorageBackend::Memory
        };

        let storage_backend = match lookup("STORAGE_BACKEND") {
            Some(raw) => raw.parse().unwrap_or_else(|e| {
                warn!("Invalid STORAGE_BACKEND ({}), using {}", e, default_backend);
                default_backend
            }),
            None => {
                warn!("STORAGE_BACKEND not set, using {}", default_backend);
                default_backend
            }
        };

        let config = Self {
            supabase_url,
            supabase_anon_key,
            storage_backend,
            storage_timeout_seconds: parse_or_default(&lookup, "STORAGE_TIMEOUT_SECONDS", 10),
            notification_timeout_ms: parse_or_default(&lookup, "NOTIFICATION_TIMEOUT_MS", 2000),
            notification_channel_capacity: parse_or_default(
                &lookup,
                "NOTIFICATION_CHANNEL_CAPACITY",
                256,
            ),
            server_port: parse_or_default(&lookup, "SERVER_PORT", 3000),
            slot_seed_path: lookup("SLOT_SEED_PATH").filter(|p| !p.trim().is_empty()),
        };

        if config.storage_backend == StorageBackend::Supabase && !config.is_configured() {
            warn!("Supabase storage selected but not fully configured - missing environment variables");
        }

        config
    }

    pub fn is_configured(&self) -> bool {
        !self.supabase_url.is_empty() && !self.supabase_anon_key.is_empty()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            supabase_url: String::new(),
            supabase_anon_key: String::new(),
            storage_backend: StorageBackend::Memory,
            storage_timeout_seconds: 10,
            notification_timeout_ms: 2000,
            notification_channel_capacity: 256,
            server_port: 3000,
            slot_seed_path: None,
        }
    }
}

fn parse_or_default<F, T>(lookup: &F, key: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: FromStr + fmt::Display + Copy,
{
    match lookup(key) {
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!("{} has invalid value '{}', using default {}", key, raw, default);
            default
        }),
        None => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> AppConfig {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_source(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults_fall_back_to_memory_backend() {
        let config = config_from(&[]);

        assert_eq!(config.storage_backend, StorageBackend::Memory);
        assert_eq!(config.storage_timeout_seconds, 10);
        assert_eq!(config.notification_timeout_ms, 2000);
        assert_eq!(config.notification_channel_capacity, 256);
        assert_eq!(config.server_port, 3000);
        assert!(config.slot_seed_path.is_none());
        assert!(!config.is_configured());
    }

    #[test]
    fn test_supabase_backend_selected_when_configured() {
        let config = config_from(&[
            ("SUPABASE_URL", "http://localhost:54321"),
            ("SUPABASE_ANON_PUBLIC_KEY", "anon"),
        ]);

        assert!(config.is_configured());
        assert_eq!(config.storage_backend, StorageBackend::Supabase);
    }

    #[test]
    fn test_explicit_backend_and_invalid_numbers() {
        let config = config_from(&[
            ("SUPABASE_URL", "http://localhost:54321"),
            ("SUPABASE_ANON_PUBLIC_KEY", "anon"),
            ("STORAGE_BACKEND", "memory"),
            ("STORAGE_TIMEOUT_SECONDS", "not-a-number"),
            ("SERVER_PORT", "8080"),
        ]);

        assert_eq!(config.storage_backend, StorageBackend::Memory);
        assert_eq!(config.storage_timeout_seconds, 10);
        assert_eq!(config.server_port, 8080);
    }

    #[test]
    fn test_unknown_backend_uses_default() {
        let config = config_from(&[("STORAGE_BACKEND", "postgres")]);
        assert_eq!(config.storage_backend, StorageBackend::Memory);
    }
}
