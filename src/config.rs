use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Configuration for the lecture-graph service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// HTTP API settings
    pub server: ServerConfig,

    /// Object storage holding uploaded videos
    pub storage: StorageConfig,

    /// External processing backend
    pub backend: BackendConfig,

    /// Lecture record persistence
    pub store: StoreConfig,

    /// Client-side upload settings
    pub upload: UploadConfig,

    /// Logging settings
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Bind address
    pub host: String,

    /// Listen port
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// S3-compatible endpoint (e.g. an R2 account endpoint)
    pub endpoint: Option<String>,

    pub access_key: Option<String>,

    pub secret_key: Option<String>,

    /// Bucket receiving uploads
    pub bucket: String,

    /// Signing region ("auto" for R2)
    pub region: String,

    /// Base URL under which uploaded objects are publicly readable
    pub public_url: Option<String>,

    /// Lifetime of presigned upload URLs (seconds)
    pub presign_expiry_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Base URL of the processing backend
    pub url: String,

    /// Timeout for the processing trigger request (seconds)
    pub timeout_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Directory for lecture record files
    pub data_dir: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadConfig {
    /// Base URL of the lecture-graph API used by the upload client
    pub server_url: String,

    /// Size of each streamed body chunk (bytes)
    pub chunk_size: usize,

    /// Timeout for metadata requests (seconds); byte transfers are not limited
    pub request_timeout_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default filter directive when RUST_LOG is unset
    pub level: String,
}

impl Config {
    /// Load configuration from file, falling back to the environment
    pub fn load() -> Result<Self> {
        let config_paths = [
            "lecture-graph.toml",
            "config/lecture-graph.toml",
            "/etc/lecture-graph/config.toml",
        ];

        for path in &config_paths {
            if let Ok(config_str) = std::fs::read_to_string(path) {
                match toml::from_str(&config_str) {
                    Ok(config) => {
                        tracing::info!("📄 Loaded configuration from: {}", path);
                        return Ok(config);
                    }
                    Err(e) => {
                        tracing::warn!("Failed to parse config file {}: {}", path, e);
                    }
                }
            }
        }

        Self::from_env()
    }

    /// Load configuration from a specific file
    pub fn from_file(path: &str) -> Result<Self> {
        let config_str = std::fs::read_to_string(path)
            .map_err(|e| anyhow!("Cannot read config file {}: {}", path, e))?;
        let config = toml::from_str(&config_str)?;
        Ok(config)
    }

    /// Defaults overridden by environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_vars(|name| std::env::var(name).ok())
    }

    /// Defaults overridden by whatever `lookup` returns for each variable
    fn from_vars(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();
        // surrounding whitespace removed; blank counts as unset
        let env_value = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        if let Some(endpoint) = env_value("CLOUDFLARE_R2_ENDPOINT") {
            config.storage.endpoint = Some(endpoint);
        }

        if let Some(access_key) = env_value("CLOUDFLARE_R2_ACCESS_KEY") {
            config.storage.access_key = Some(access_key);
        }

        if let Some(secret_key) = env_value("CLOUDFLARE_R2_SECRET_KEY") {
            config.storage.secret_key = Some(secret_key);
        }

        if let Some(public_url) = env_value("R2_PUBLIC_URL") {
            config.storage.public_url = Some(public_url);
        }

        if let Some(bucket) = env_value("LECTURE_GRAPH_BUCKET") {
            config.storage.bucket = bucket;
        }

        if let Some(backend_url) = env_value("LECTURE_GRAPH_BACKEND_URL") {
            config.backend.url = backend_url;
        }

        if let Some(port) = env_value("LECTURE_GRAPH_PORT") {
            config.server.port = port
                .parse()
                .map_err(|_| anyhow!("LECTURE_GRAPH_PORT is not a valid port: {}", port))?;
        }

        if let Some(data_dir) = env_value("LECTURE_GRAPH_DATA_DIR") {
            config.store.data_dir = PathBuf::from(data_dir);
        }

        if let Some(server_url) = env_value("LECTURE_GRAPH_SERVER_URL") {
            config.upload.server_url = server_url;
        }

        if let Some(level) = env_value("LECTURE_GRAPH_LOG_LEVEL") {
            config.logging.level = level;
        }

        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.server.port == 0 {
            return Err(anyhow!("server.port must be greater than 0"));
        }

        if self.storage.bucket.trim().is_empty() {
            return Err(anyhow!("storage.bucket must not be empty"));
        }

        if self.storage.presign_expiry_secs == 0 {
            return Err(anyhow!("storage.presign_expiry_secs must be greater than 0"));
        }

        if self.upload.chunk_size == 0 {
            return Err(anyhow!("upload.chunk_size must be greater than 0"));
        }

        for (name, value) in [
            ("backend.url", Some(&self.backend.url)),
            ("upload.server_url", Some(&self.upload.server_url)),
            ("storage.endpoint", self.storage.endpoint.as_ref()),
            ("storage.public_url", self.storage.public_url.as_ref()),
        ] {
            if let Some(value) = value {
                url::Url::parse(value).map_err(|e| anyhow!("{} is not a valid URL: {}", name, e))?;
            }
        }

        if !self.storage.has_credentials() {
            tracing::warn!("Storage credentials are missing. File uploads will fail.");
        }

        tracing::info!("✅ Configuration validation passed");
        Ok(())
    }

    /// Get runtime configuration summary
    pub fn summary(&self) -> String {
        format!(
            "Lecture Graph Configuration:\n\
            - Listen: {}:{}\n\
            - Bucket: {}\n\
            - Storage Endpoint: {}\n\
            - Public URL: {}\n\
            - Backend: {}\n\
            - Data Directory: {}",
            self.server.host,
            self.server.port,
            self.storage.bucket,
            self.storage.endpoint.as_deref().unwrap_or("(unset)"),
            self.storage.public_url.as_deref().unwrap_or("(unset)"),
            self.backend.url,
            self.store.data_dir.display(),
        )
    }
}

impl StorageConfig {
    pub fn has_credentials(&self) -> bool {
        self.endpoint.is_some() && self.access_key.is_some() && self.secret_key.is_some()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 3000,
            },
            storage: StorageConfig {
                endpoint: None,
                access_key: None,
                secret_key: None,
                bucket: "lecture-graph".to_string(),
                region: "auto".to_string(),
                public_url: None,
                presign_expiry_secs: 3600, // 1 hour
            },
            backend: BackendConfig {
                url: "http://localhost:8000".to_string(),
                timeout_seconds: 30,
            },
            store: StoreConfig {
                data_dir: PathBuf::from("./data/lectures"),
            },
            upload: UploadConfig {
                server_url: "http://localhost:3000".to_string(),
                chunk_size: 256 * 1024, // 256KB chunks
                request_timeout_seconds: 30,
            },
            logging: LoggingConfig {
                level: "lecture_graph=info,warn".to_string(),
            },
        }
    }
}

/// Configuration builder for programmatic config creation
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.config.server.port = port;
        self
    }

    pub fn with_bucket(mut self, bucket: impl Into<String>) -> Self {
        self.config.storage.bucket = bucket.into();
        self
    }

    pub fn with_storage_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.config.storage.endpoint = Some(endpoint.into());
        self
    }

    pub fn with_credentials(mut self, access_key: impl Into<String>, secret_key: impl Into<String>) -> Self {
        self.config.storage.access_key = Some(access_key.into());
        self.config.storage.secret_key = Some(secret_key.into());
        self
    }

    pub fn with_public_url(mut self, url: impl Into<String>) -> Self {
        self.config.storage.public_url = Some(url.into());
        self
    }

    pub fn with_backend_url(mut self, url: impl Into<String>) -> Self {
        self.config.backend.url = url.into();
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
