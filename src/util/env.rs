//! Environment helpers: centralized dotenv loading and ergonomic getters.
//! Call `init_env()` once early in each binary (or rely on lazy Once).
use anyhow::{anyhow, Result};
use std::str::FromStr;
use std::sync::Once;
use tracing::info;

static INIT: Once = Once::new();

/// Load .env exactly once. Safe to call many times.
pub fn init_env() {
    INIT.call_once(|| {
        if dotenv::dotenv().is_ok() {
            return;
        }
        // Fallback to the crate root so `cargo run` from a subdirectory still works.
        let candidate = format!("{}/.env", env!("CARGO_MANIFEST_DIR"));
        let _ = dotenv::from_filename(candidate);
    });
}

/// Get optional env var (None if unset or empty).
pub fn env_opt(key: &str) -> Option<String> {
    init_env();
    match std::env::var(key) {
        Ok(v) if !v.trim().is_empty() => Some(v),
        _ => None,
    }
}

/// Get parsed value with default fallback.
pub fn env_parse<T>(key: &str, default: T) -> T
where
    T: FromStr + Clone,
{
    init_env();
    match std::env::var(key) {
        Ok(raw) => raw.trim().parse::<T>().unwrap_or(default),
        Err(_) => default,
    }
}

/// Boolean flag; accepts 1/true/on/yes (case-insensitive) as true.
pub fn env_flag(key: &str, default: bool) -> bool {
    init_env();
    match std::env::var(key) {
        Ok(raw) => parse_flag(&raw),
        Err(_) => default,
    }
}

fn parse_flag(raw: &str) -> bool {
    let v = raw.trim().to_ascii_lowercase();
    matches!(v.as_str(), "1" | "true" | "on" | "yes")
}

/// Libpq-style connection parts. Defaults match the local development database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PgParts {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub database: String,
}

impl Default for PgParts {
    fn default() -> Self {
        Self {
            host: "localhost".into(),
            port: 5432,
            user: "postgres".into(),
            password: "admin".into(),
            database: "restapi".into(),
        }
    }
}

impl PgParts {
    /// Read `PGHOST` / `PGPORT` / `PGUSER` / `PGPASSWORD` / `PGDATABASE`.
    pub fn from_env() -> Self {
        let d = Self::default();
        Self {
            host: env_opt("PGHOST").unwrap_or(d.host),
            port: env_parse("PGPORT", d.port),
            user: env_opt("PGUSER").unwrap_or(d.user),
            password: env_opt("PGPASSWORD").unwrap_or(d.password),
            database: env_opt("PGDATABASE").unwrap_or(d.database),
        }
    }

    /// Compose a DSN. Credentials are percent-encoded, IPv6 hosts are
    /// bracketed and a socket directory (`/var/run/postgresql`) is passed as
    /// the `host` query parameter.
    pub fn to_url(&self) -> Result<String> {
        let mut out = url::Url::parse("postgres://localhost")?;
        out.set_username(&self.user)
            .map_err(|_| anyhow!("user name cannot be placed in a database URL"))?;
        out.set_password(Some(&self.password))
            .map_err(|_| anyhow!("password cannot be placed in a database URL"))?;
        let host = self.host.trim();
        if !host.starts_with('/') {
            out.set_host(Some(&normalize_ipv6_host(host)))?;
        }
        out.set_port(Some(self.port))
            .map_err(|_| anyhow!("port cannot be placed in a database URL"))?;
        out.set_path(&format!("/{}", self.database));
        if host.starts_with('/') {
            out.query_pairs_mut().append_pair("host", host);
        }
        Ok(out.to_string())
    }
}

fn normalize_ipv6_host(raw: &str) -> String {
    let trimmed = raw.trim_matches(|c| c == '[' || c == ']');
    if trimmed.contains(':') {
        format!("[{trimmed}]")
    } else {
        trimmed.to_string()
    }
}

/// Database URL: explicit DSN variables first, then composed from PG* parts.
pub fn db_url() -> Result<String> {
    init_env();
    for k in ["DATABASE_URL", "PG_URL"] {
        if let Some(v) = env_opt(k) {
            info!(target = "env", source = k, "using explicit database URL");
            return Ok(v);
        }
    }
    let parts = PgParts::from_env();
    info!(
        target = "env",
        host = %parts.host,
        port = parts.port,
        database = %parts.database,
        "composing database URL from PG* variables"
    );
    parts.to_url()
}
