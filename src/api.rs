use crate::mock::{mock_clusters, mock_service_details};
use crate::model::{ClusterService, RefreshStatus, ServiceDetails};
use anyhow::{Context, Result};
use chrono::Utc;
use reqwest::StatusCode;
use reqwest::header::{COOKIE, HeaderMap, HeaderValue};
use serde::de::DeserializeOwned;
use std::future::Future;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

pub const DEFAULT_FALLBACK_ALIASES: [&str; 4] = ["dev", "prod", "staging", "production1"];

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("request to {path} failed: {source}")]
    Transport {
        path: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{path} answered {status}")]
    Status { path: String, status: StatusCode },
    #[error("{path} rejected the session ({status})")]
    Unauthorized { path: String, status: StatusCode },
    #[error("failed to decode {path}: {source}")]
    Decode {
        path: String,
        #[source]
        source: reqwest::Error,
    },
}

/// Where a payload came from. Anything other than `Live` is placeholder
/// data generated locally.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum Origin {
    Live,
    Fallback(String),
    Unauthorized,
}

impl Origin {
    fn from_error(error: &ApiError) -> Self {
        match error {
            ApiError::Unauthorized { .. } => Self::Unauthorized,
            other => Self::Fallback(other.to_string()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Fetched<T> {
    pub data: T,
    pub origin: Origin,
}

/// The one call the refresh poller needs; split out so the poll loop can be
/// driven by a scripted source in tests.
pub trait RefreshStatusSource: Send + Sync + 'static {
    fn refresh_status(
        &self,
        alias: &str,
    ) -> impl Future<Output = std::result::Result<RefreshStatus, ApiError>> + Send;
}

#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    fallback_aliases: Vec<String>,
}

impl ApiClient {
    pub fn new(
        base_url: &str,
        request_timeout: Duration,
        session_cookie: Option<&str>,
        fallback_aliases: Vec<String>,
    ) -> Result<Self> {
        let mut headers = HeaderMap::new();
        if let Some(cookie) = session_cookie.map(str::trim).filter(|value| !value.is_empty()) {
            let value = HeaderValue::from_str(cookie).context("session cookie is not a valid header")?;
            headers.insert(COOKIE, value);
        }

        let http = reqwest::Client::builder()
            .cookie_store(true)
            .default_headers(headers)
            .timeout(request_timeout)
            .build()
            .context("failed to build HTTP client")?;

        let fallback_aliases = if fallback_aliases.is_empty() {
            DEFAULT_FALLBACK_ALIASES
                .iter()
                .map(|alias| alias.to_string())
                .collect()
        } else {
            fallback_aliases
        };

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            fallback_aliases,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn fallback_aliases(&self) -> &[String] {
        &self.fallback_aliases
    }

    pub async fn fetch_aliases(&self) -> Fetched<Vec<String>> {
        match self.get_json::<Vec<String>>("/aliases", &[]).await {
            Ok(aliases) if !aliases.is_empty() => Fetched {
                data: aliases,
                origin: Origin::Live,
            },
            Ok(_) => {
                warn!("backend returned no aliases, using fallback list");
                Fetched {
                    data: self.fallback_aliases.clone(),
                    origin: Origin::Fallback("empty alias list".to_string()),
                }
            }
            Err(error) => {
                warn!("alias discovery failed, using fallback list: {error}");
                Fetched {
                    origin: Origin::from_error(&error),
                    data: self.fallback_aliases.clone(),
                }
            }
        }
    }

    pub async fn fetch_clusters(&self, alias: &str) -> Fetched<Vec<ClusterService>> {
        match self
            .get_json::<Vec<ClusterService>>("/clusters", &[("alias", alias)])
            .await
        {
            Ok(services) => Fetched {
                data: services,
                origin: Origin::Live,
            },
            Err(error) => {
                warn!("cluster fetch for {alias} failed, using mock data: {error}");
                Fetched {
                    origin: Origin::from_error(&error),
                    data: mock_clusters(alias, Utc::now()),
                }
            }
        }
    }

    pub async fn fetch_service_details(
        &self,
        service_name: &str,
        cluster_name: &str,
        alias: &str,
    ) -> Fetched<ServiceDetails> {
        match self
            .get_json::<ServiceDetails>(
                "/service-details",
                &[
                    ("service_name", service_name),
                    ("cluster_name", cluster_name),
                    ("alias", alias),
                ],
            )
            .await
        {
            Ok(details) => Fetched {
                data: details,
                origin: Origin::Live,
            },
            Err(error) => {
                warn!("service details for {cluster_name}/{service_name} failed, using mock data: {error}");
                Fetched {
                    origin: Origin::from_error(&error),
                    data: mock_service_details(service_name, Utc::now()),
                }
            }
        }
    }

    /// Starts a backend refresh job. A refused request is `false`; a
    /// transport failure is treated as accepted so the status poll can report
    /// what actually happened.
    pub async fn trigger_refresh(&self, alias: &str) -> bool {
        let url = self.url("/refresh");
        match self.http.get(&url).query(&[("alias", alias)]).send().await {
            Ok(response) => {
                debug!("refresh trigger for {alias} answered {}", response.status());
                response.status().is_success()
            }
            Err(error) => {
                warn!("refresh trigger for {alias} failed: {error}");
                true
            }
        }
    }

    pub async fn check_refresh_status(
        &self,
        alias: &str,
    ) -> std::result::Result<RefreshStatus, ApiError> {
        self.get_json::<RefreshStatus>("/refresh-status", &[("alias", alias)])
            .await
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> std::result::Result<T, ApiError> {
        let response = self
            .http
            .get(self.url(path))
            .query(query)
            .send()
            .await
            .map_err(|source| ApiError::Transport {
                path: path.to_string(),
                source,
            })?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(ApiError::Unauthorized {
                path: path.to_string(),
                status,
            });
        }
        if !status.is_success() {
            return Err(ApiError::Status {
                path: path.to_string(),
                status,
            });
        }

        response.json::<T>().await.map_err(|source| ApiError::Decode {
            path: path.to_string(),
            source,
        })
    }
}

impl RefreshStatusSource for ApiClient {
    fn refresh_status(
        &self,
        alias: &str,
    ) -> impl Future<Output = std::result::Result<RefreshStatus, ApiError>> + Send {
        self.check_refresh_status(alias)
    }
}

#[cfg(test)]
mod tests {
    use super::{ApiClient, ApiError, DEFAULT_FALLBACK_ALIASES, Origin};
    use reqwest::StatusCode;
    use std::time::Duration;

    fn unreachable_client() -> ApiClient {
        ApiClient::new(
            "http://127.0.0.1:9/",
            Duration::from_millis(200),
            None,
            Vec::new(),
        )
        .expect("client builds")
    }

    #[test]
    fn base_url_is_normalized_and_fallbacks_defaulted() {
        let client = unreachable_client();
        assert_eq!(client.base_url(), "http://127.0.0.1:9");
        assert_eq!(client.fallback_aliases(), DEFAULT_FALLBACK_ALIASES);
    }

    #[test]
    fn invalid_session_cookie_is_rejected() {
        let result = ApiClient::new(
            "http://localhost:8000",
            Duration::from_secs(1),
            Some("bad\nvalue"),
            Vec::new(),
        );
        assert!(result.is_err());
    }

    #[test]
    fn unauthorized_errors_map_to_unauthorized_origin() {
        let error = ApiError::Unauthorized {
            path: "/clusters".to_string(),
            status: StatusCode::UNAUTHORIZED,
        };
        assert_eq!(Origin::from_error(&error), Origin::Unauthorized);

        let error = ApiError::Status {
            path: "/clusters".to_string(),
            status: StatusCode::BAD_GATEWAY,
        };
        assert!(matches!(Origin::from_error(&error), Origin::Fallback(_)));
    }

    #[tokio::test]
    async fn unreachable_backend_degrades_to_placeholders() {
        let client = unreachable_client();

        let aliases = client.fetch_aliases().await;
        assert_eq!(aliases.data, DEFAULT_FALLBACK_ALIASES);
        assert_ne!(aliases.origin, Origin::Live);

        let clusters = client.fetch_clusters("staging").await;
        assert_eq!(clusters.data.len(), 15);
        assert!(clusters.data.iter().all(|row| row.account_alias == "staging"));

        assert!(client.check_refresh_status("staging").await.is_err());
        assert!(client.trigger_refresh("staging").await);
    }
}
