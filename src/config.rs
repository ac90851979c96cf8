use std::net::SocketAddr;

use crate::credential::Credential;

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";
pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for field '{field}': {value} - {reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Incompatible configuration: {reason}")]
    IncompatibleConfig { reason: String },
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Static key pair and region for the vision service. Missing values fall
/// back to the AWS default provider chain.
#[derive(Debug, Clone, Default)]
pub struct AwsSettings {
    pub access_key: Option<AwsAccessKey>,
    pub region: Option<String>,
    /// Overrides the regional Rekognition endpoint.
    pub endpoint_url: Option<String>,
}

#[derive(Clone)]
pub struct AwsAccessKey {
    pub access_key_id: String,
    pub secret_access_key: String,
}

impl std::fmt::Debug for AwsAccessKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AwsAccessKey")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"***")
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub openai_api_key: Option<Credential>,
    pub openai_base_url: String,
    pub aws: AwsSettings,
    pub max_upload_bytes: usize,
}

impl AppConfig {
    pub fn from_env() -> ConfigResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> ConfigResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let bind_raw = get("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let bind_addr = bind_raw
            .parse::<SocketAddr>()
            .map_err(|e| ConfigError::InvalidValue {
                field: "BIND_ADDR".to_string(),
                value: bind_raw.clone(),
                reason: e.to_string(),
            })?;

        let max_upload_bytes = match get("MAX_UPLOAD_BYTES") {
            None => DEFAULT_MAX_UPLOAD_BYTES,
            Some(raw) => match raw.parse::<usize>() {
                Ok(n) if n > 0 => n,
                _ => {
                    return Err(ConfigError::InvalidValue {
                        field: "MAX_UPLOAD_BYTES".to_string(),
                        value: raw,
                        reason: "must be a positive integer".to_string(),
                    })
                }
            },
        };

        let access_key = match (get("AWS_ACCESS_KEY_ID"), get("AWS_SECRET_ACCESS_KEY")) {
            (Some(access_key_id), Some(secret_access_key)) => Some(AwsAccessKey {
                access_key_id,
                secret_access_key,
            }),
            (None, None) => None,
            _ => {
                return Err(ConfigError::IncompatibleConfig {
                    reason: "AWS_ACCESS_KEY_ID and AWS_SECRET_ACCESS_KEY must be set together"
                        .to_string(),
                })
            }
        };

        let openai_base_url = get("OPENAI_BASE_URL")
            .unwrap_or_else(|| DEFAULT_OPENAI_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        Ok(Self {
            bind_addr,
            openai_api_key: get("OPENAI_API_KEY").and_then(Credential::new),
            openai_base_url,
            aws: AwsSettings {
                access_key,
                region: get("AWS_DEFAULT_REGION"),
                endpoint_url: get("REKOGNITION_ENDPOINT_URL"),
            },
            max_upload_bytes,
        })
    }
}
