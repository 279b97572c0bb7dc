use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::Context;

use sezora_core::session::DEFAULT_ADMIN_EMAIL;
use sezora_db::DEFAULT_FEED_CAPACITY;

#[derive(Debug, Clone)]
pub struct Config {
    pub jwt_secret: String,
    pub db_path: PathBuf,
    pub host: String,
    pub port: u16,
    pub admin_email: String,
    /// Seeds the admin account on startup when set.
    pub admin_password: Option<String>,
    pub feed_capacity: usize,
}

impl Config {
    /// Read `SEZORA_*` variables, falling back to development defaults.
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(var: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let port = var("SEZORA_PORT").unwrap_or_else(|| "3000".into());
        let feed_capacity = match var("SEZORA_FEED_CAPACITY") {
            Some(raw) => raw
                .parse()
                .with_context(|| format!("SEZORA_FEED_CAPACITY '{}' is not a number", raw))?,
            None => DEFAULT_FEED_CAPACITY,
        };
        if feed_capacity == 0 {
            anyhow::bail!("SEZORA_FEED_CAPACITY must be greater than zero");
        }

        Ok(Self {
            jwt_secret: var("SEZORA_JWT_SECRET").unwrap_or_else(|| "dev-secret-change-me".into()),
            db_path: PathBuf::from(var("SEZORA_DB_PATH").unwrap_or_else(|| "sezora.db".into())),
            host: var("SEZORA_HOST").unwrap_or_else(|| "0.0.0.0".into()),
            port: port
                .parse()
                .with_context(|| format!("SEZORA_PORT '{}' is not a port", port))?,
            admin_email: var("SEZORA_ADMIN_EMAIL").unwrap_or_else(|| DEFAULT_ADMIN_EMAIL.into()),
            admin_password: var("SEZORA_ADMIN_PASSWORD").filter(|pw| !pw.is_empty()),
            feed_capacity,
        })
    }

    pub fn addr(&self) -> anyhow::Result<SocketAddr> {
        Ok(format!("{}:{}", self.host, self.port).parse()?)
    }
}
