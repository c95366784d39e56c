use serde::{Deserialize, Serialize};

/// Storage backend selection and per-backend settings.
///
/// The driver is chosen once at startup; there is no per-request fallback
/// between backends.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Backend driver, either `"local"` or `"s3"`.
    #[serde(default = "default_driver")]
    pub driver: String,
    #[serde(default)]
    pub local: LocalStorageConfig,
    #[serde(default)]
    pub s3: S3StorageConfig,
    /// Default lifetime for signed download URLs, in seconds.
    #[serde(default = "default_signed_url_ttl")]
    pub signed_url_ttl_seconds: u64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            driver: default_driver(),
            local: LocalStorageConfig::default(),
            s3: S3StorageConfig::default(),
            signed_url_ttl_seconds: default_signed_url_ttl(),
        }
    }
}

/// Settings for the on-disk backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocalStorageConfig {
    /// Directory all object keys are resolved under. Created on startup if
    /// missing.
    #[serde(default = "default_root_path")]
    pub root_path: String,
}

impl Default for LocalStorageConfig {
    fn default() -> Self {
        Self {
            root_path: default_root_path(),
        }
    }
}

/// Settings for the S3-compatible backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct S3StorageConfig {
    /// Custom endpoint for S3-compatible stores such as MinIO. Leave unset
    /// for AWS itself.
    #[serde(default)]
    pub endpoint: Option<String>,
    #[serde(default = "default_region")]
    pub region: String,
    #[serde(default)]
    pub bucket: String,
    /// Static credentials. When unset the ambient AWS credential chain is
    /// used instead.
    #[serde(default)]
    pub access_key: Option<String>,
    #[serde(default)]
    pub secret_key: Option<String>,
}

impl Default for S3StorageConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            region: default_region(),
            bucket: String::new(),
            access_key: None,
            secret_key: None,
        }
    }
}

fn default_driver() -> String {
    "local".to_string()
}

fn default_root_path() -> String {
    "data/storage".to_string()
}

fn default_region() -> String {
    "us-east-1".to_string()
}

fn default_signed_url_ttl() -> u64 {
    900
}
