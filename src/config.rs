use std::{path::PathBuf, str::FromStr};

use anyhow::{anyhow, bail, Context};
use serde::Deserialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackendKind {
    Postgres,
    Memory,
}

impl FromStr for StoreBackendKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(Self::Postgres),
            "memory" => Ok(Self::Memory),
            other => bail!("unknown STORE_BACKEND `{other}`"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackendKind {
    Local,
    S3,
}

impl FromStr for StorageBackendKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "local" => Ok(Self::Local),
            "s3" | "minio" => Ok(Self::S3),
            other => bail!("unknown STORAGE_BACKEND `{other}`"),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_minutes: i64,
    pub refresh_ttl_minutes: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct S3Config {
    pub endpoint: String,
    pub bucket: String,
    pub access_key: String,
    pub secret_key: String,
    pub region: String,
}

/// Hosted chat model used for summaries and answers. Without an API key the
/// AI endpoints answer 502.
#[derive(Debug, Clone, Deserialize)]
pub struct LlmConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
    pub chunk_size: usize,
    /// Larger documents are refused before any model call.
    pub max_chunks: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub store_backend: StoreBackendKind,
    pub database_url: Option<String>,
    pub db_max_connections: u32,
    pub jwt: JwtConfig,
    pub storage_backend: StorageBackendKind,
    pub upload_dir: PathBuf,
    pub s3: Option<S3Config>,
    pub llm: LlmConfig,
    pub host: String,
    pub port: u16,
}

fn parsed<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|e| anyhow!("{key}: {e}")),
        None => Ok(default),
    }
}

fn required(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> anyhow::Result<String> {
    lookup(key)
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| anyhow!("{key} is not set"))
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key/value source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let store_backend = parsed(&lookup, "STORE_BACKEND", StoreBackendKind::Postgres)?;
        let database_url = lookup("DATABASE_URL").filter(|v| !v.trim().is_empty());
        if store_backend == StoreBackendKind::Postgres && database_url.is_none() {
            bail!("DATABASE_URL is required when STORE_BACKEND=postgres");
        }

        let jwt = JwtConfig {
            secret: required(&lookup, "JWT_SECRET")?,
            issuer: lookup("JWT_ISSUER").unwrap_or_else(|| "healthvault".into()),
            audience: lookup("JWT_AUDIENCE").unwrap_or_else(|| "healthvault-users".into()),
            ttl_minutes: parsed(&lookup, "JWT_TTL_MINUTES", 60)?,
            refresh_ttl_minutes: parsed(&lookup, "JWT_REFRESH_TTL_MINUTES", 60 * 24 * 14)?,
        };

        let storage_backend = parsed(&lookup, "STORAGE_BACKEND", StorageBackendKind::Local)?;
        let s3 = match storage_backend {
            StorageBackendKind::S3 => Some(S3Config {
                endpoint: required(&lookup, "MINIO_ENDPOINT")?,
                bucket: required(&lookup, "MINIO_BUCKET")?,
                access_key: required(&lookup, "MINIO_ACCESS_KEY")?,
                secret_key: required(&lookup, "MINIO_SECRET_KEY")?,
                region: lookup("MINIO_REGION").unwrap_or_else(|| "us-east-1".into()),
            }),
            StorageBackendKind::Local => None,
        };

        let llm = LlmConfig {
            api_key: lookup("LLM_API_KEY").filter(|v| !v.trim().is_empty()),
            base_url: lookup("LLM_BASE_URL")
                .unwrap_or_else(|| "https://api.openai.com/v1".into())
                .trim_end_matches('/')
                .to_string(),
            model: lookup("LLM_MODEL").unwrap_or_else(|| "gpt-3.5-turbo".into()),
            chunk_size: parsed(&lookup, "LLM_CHUNK_SIZE", 2000)?,
            max_chunks: parsed(&lookup, "LLM_MAX_CHUNKS", 50)?,
        };
        if llm.chunk_size == 0 {
            bail!("LLM_CHUNK_SIZE must be positive");
        }
        if llm.max_chunks == 0 {
            bail!("LLM_MAX_CHUNKS must be positive");
        }

        Ok(Self {
            store_backend,
            database_url,
            db_max_connections: parsed(&lookup, "DB_MAX_CONNECTIONS", 10)?,
            jwt,
            storage_backend,
            upload_dir: lookup("UPLOAD_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("./uploads")),
            s3,
            llm,
            host: lookup("APP_HOST").unwrap_or_else(|| "0.0.0.0".into()),
            port: parsed(&lookup, "APP_PORT", 8080)?,
        })
    }

    pub fn listen_addr(&self) -> anyhow::Result<std::net::SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .with_context(|| format!("invalid listen address {}:{}", self.host, self.port))
    }
}
