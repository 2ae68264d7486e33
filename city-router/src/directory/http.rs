//! HTTP building directory client.

use std::sync::Arc;
use std::time::Duration;

use reqwest::Url;
use reqwest::header::{HeaderMap, HeaderValue};
use tokio::sync::Semaphore;
use tracing::trace;

use super::error::DirectoryError;
use super::{Building, BuildingDirectory};

/// Default maximum concurrent requests.
const DEFAULT_MAX_CONCURRENT: usize = 8;

/// Configuration for the HTTP directory client.
#[derive(Debug, Clone)]
pub struct DirectoryConfig {
    /// Base URL; buildings live under `{base_url}/buildings/{id}`
    pub base_url: String,
    /// Sent as the `x-api-key` header when set
    pub api_key: Option<String>,
    /// Maximum concurrent requests
    pub max_concurrent: usize,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl DirectoryConfig {
    /// Create a new config for the directory at `base_url`.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: None,
            max_concurrent: DEFAULT_MAX_CONCURRENT,
            timeout_secs: 10,
        }
    }

    /// Set the API key.
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Set maximum concurrent requests.
    pub fn with_max_concurrent(mut self, n: usize) -> Self {
        self.max_concurrent = n.max(1);
        self
    }

    /// Set request timeout.
    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    /// Request timeout as a Duration.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Building directory reached over HTTP.
///
/// Uses a semaphore to bound concurrent requests.
#[derive(Debug, Clone)]
pub struct HttpBuildingDirectory {
    http: reqwest::Client,
    base_url: Url,
    semaphore: Arc<Semaphore>,
}

impl HttpBuildingDirectory {
    /// Create a new client with the given configuration.
    pub fn new(config: DirectoryConfig) -> Result<Self, DirectoryError> {
        let mut base_url = Url::parse(&config.base_url).map_err(|e| DirectoryError::Api {
            status: 0,
            message: format!("invalid base URL {}: {e}", config.base_url),
        })?;
        match base_url.path_segments_mut() {
            Ok(mut segments) => {
                segments.pop_if_empty();
            }
            Err(()) => {
                return Err(DirectoryError::Api {
                    status: 0,
                    message: format!("base URL {} cannot have a path", config.base_url),
                });
            }
        }

        let mut headers = HeaderMap::new();
        if let Some(key) = &config.api_key {
            let value = HeaderValue::from_str(key).map_err(|_| DirectoryError::Api {
                status: 0,
                message: "invalid API key format".to_string(),
            })?;
            headers.insert("x-api-key", value);
        }

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.timeout())
            .build()?;

        Ok(Self {
            http,
            base_url,
            semaphore: Arc::new(Semaphore::new(config.max_concurrent)),
        })
    }

    /// `{base_url}/buildings/{id}`, with `id` percent-encoded as one segment.
    pub fn building_url(&self, id: &str) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.push("buildings").push(id);
        }
        url
    }
}

impl BuildingDirectory for HttpBuildingDirectory {
    async fn get_building(&self, id: &str) -> Result<Building, DirectoryError> {
        let _permit = self
            .semaphore
            .acquire()
            .await
            .map_err(|_| DirectoryError::Api {
                status: 0,
                message: "semaphore closed".to_string(),
            })?;

        let url = self.building_url(id);
        trace!(%url, "fetching building");
        let response = self.http.get(url).send().await?;
        let status = response.status();

        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(DirectoryError::NotFound(id.to_string()));
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(DirectoryError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| DirectoryError::Json {
            message: e.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_builder() {
        let config = DirectoryConfig::new("http://localhost:8080/")
            .with_api_key("secret")
            .with_max_concurrent(0)
            .with_timeout(3);
        assert_eq!(config.api_key.as_deref(), Some("secret"));
        assert_eq!(config.max_concurrent, 1);
        assert_eq!(config.timeout(), Duration::from_secs(3));
    }

    #[test]
    fn building_url_has_no_double_slash() {
        let client = HttpBuildingDirectory::new(DirectoryConfig::new("http://localhost:8080/")).unwrap();
        assert_eq!(
            client.building_url("dock-a").as_str(),
            "http://localhost:8080/buildings/dock-a"
        );
    }

    #[test]
    fn building_id_is_one_path_segment() {
        let client =
            HttpBuildingDirectory::new(DirectoryConfig::new("http://localhost:8080/api")).unwrap();
        assert_eq!(
            client.building_url("dock/a?b#c").as_str(),
            "http://localhost:8080/api/buildings/dock%2Fa%3Fb%23c"
        );
    }

    #[test]
    fn rejects_unusable_base_url() {
        for base in ["not a url", "mailto:someone@example.com"] {
            assert!(matches!(
                HttpBuildingDirectory::new(DirectoryConfig::new(base)),
                Err(DirectoryError::Api { status: 0, .. })
            ));
        }
    }

    #[test]
    fn rejects_unprintable_api_key() {
        let config = DirectoryConfig::new("http://localhost").with_api_key("bad\nkey");
        assert!(matches!(
            HttpBuildingDirectory::new(config),
            Err(DirectoryError::Api { status: 0, .. })
        ));
    }

    #[tokio::test]
    async fn unreachable_host_is_http_error() {
        let config = DirectoryConfig::new("http://127.0.0.1:1").with_timeout(2);
        let client = HttpBuildingDirectory::new(config).unwrap();
        assert!(matches!(
            client.get_building("dock-a").await,
            Err(DirectoryError::Http(_))
        ));
    }
}
