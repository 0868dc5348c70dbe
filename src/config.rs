use std::str::FromStr;

use anyhow::{anyhow, bail, Context};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreKind {
    Postgres,
    Memory,
}

impl FromStr for StoreKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s {
            "postgres" => Ok(StoreKind::Postgres),
            "memory" => Ok(StoreKind::Memory),
            other => Err(anyhow!("unknown LEDGER_STORE {other:?}, expected postgres or memory")),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub bind_address: String,
    pub store: StoreKind,
    pub database_url: Option<String>,
    pub log_level: tracing::Level,
}

impl Settings {
    /// Reads settings from the process environment (after `.env`).
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let bind_address = lookup("BIND_ADDRESS").unwrap_or_else(|| "127.0.0.1:8080".to_string());
        let store = match lookup("LEDGER_STORE") {
            Some(value) => value.parse()?,
            None => StoreKind::Postgres,
        };
        let database_url = lookup("DATABASE_URL").filter(|url| !url.is_empty());
        if store == StoreKind::Postgres && database_url.is_none() {
            bail!("DATABASE_URL must be set when LEDGER_STORE is postgres");
        }
        let log_level = match lookup("LOG_LEVEL") {
            Some(value) => tracing::Level::from_str(&value).with_context(|| format!("invalid LOG_LEVEL {value:?}"))?,
            None => tracing::Level::INFO,
        };
        Ok(Self {
            bind_address,
            store,
            database_url,
            log_level,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn settings(vars: &[(&str, &str)]) -> anyhow::Result<Settings> {
        let vars: HashMap<String, String> = vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        Settings::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults_need_database_url() {
        assert!(settings(&[]).is_err());

        let s = settings(&[("DATABASE_URL", "postgres://localhost/ledger")]).unwrap();
        assert_eq!(s.bind_address, "127.0.0.1:8080");
        assert_eq!(s.store, StoreKind::Postgres);
        assert_eq!(s.log_level, tracing::Level::INFO);
    }

    #[test]
    fn test_memory_store() {
        let s = settings(&[("LEDGER_STORE", "memory"), ("LOG_LEVEL", "debug"), ("BIND_ADDRESS", "0.0.0.0:9000")]).unwrap();
        assert_eq!(s.store, StoreKind::Memory);
        assert_eq!(s.database_url, None);
        assert_eq!(s.log_level, tracing::Level::DEBUG);
        assert_eq!(s.bind_address, "0.0.0.0:9000");
    }

    #[test]
    fn test_invalid_values() {
        assert!(settings(&[("LEDGER_STORE", "firestore")]).is_err());
        assert!(settings(&[("LEDGER_STORE", "memory"), ("LOG_LEVEL", "loud")]).is_err());
    }
}
