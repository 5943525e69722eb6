//! HTTP directory client
//!
//! Reads roles, admins and country-admin profiles from a remote directory
//! service. Responses may be bare JSON values or wrapped in a `data`,
//! `roles`, `admin` or `profile` envelope.

use crate::access_control::types::{AdminIdentity, CountryAdminProfile, Role};
use crate::auth::BoxedAuthProvider;
use crate::config::DirectoryConfig;
use crate::directory::{AdminDirectory, CountryAdminDirectory, RoleDirectory};
use crate::error::{DirectoryError, DirectoryResult};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, instrument, warn};

/// Directory service client
pub struct HttpDirectory {
    http: Client,
    base_url: String,
    roles_path: String,
    admins_path: String,
    country_admin_path: String,
    auth: Option<BoxedAuthProvider>,
    max_retries: u32,
    timeout_secs: u64,
}

/// The value under a well-known key, or the value itself.
///
/// Wrapped forms are tried first: a profile whose fields all default would
/// otherwise decode from any object.
#[derive(Deserialize)]
#[serde(untagged)]
enum Envelope<T> {
    Data { data: T },
    Roles { roles: T },
    Admin { admin: T },
    Profile { profile: T },
    Bare(T),
}

impl<T> Envelope<T> {
    fn into_inner(self) -> T {
        match self {
            Envelope::Bare(value)
            | Envelope::Data { data: value }
            | Envelope::Roles { roles: value }
            | Envelope::Admin { admin: value }
            | Envelope::Profile { profile: value } => value,
        }
    }
}

impl HttpDirectory {
    /// Create a new directory client from configuration
    pub fn new(
        config: &DirectoryConfig,
        auth: Option<BoxedAuthProvider>,
    ) -> DirectoryResult<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .pool_max_idle_per_host(10)
            .pool_idle_timeout(Duration::from_secs(90))
            .danger_accept_invalid_certs(!config.verify_ssl)
            .user_agent(format!("feature-gate/{}", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(DirectoryError::Request)?;

        if let Some(provider) = &auth {
            debug!(auth = provider.auth_type(), "Directory client authenticated");
        }

        Ok(Self {
            http,
            base_url: config.base_url().to_string(),
            roles_path: config.roles_path.clone(),
            admins_path: config.admins_path.clone(),
            country_admin_path: config.country_admin_path.clone(),
            auth,
            max_retries: config.max_retries,
            timeout_secs: config.timeout_secs,
        })
    }

    /// Build a URL for an endpoint template, substituting `{id}`
    fn url(&self, template: &str, id: Option<&str>) -> String {
        let path = match id {
            Some(id) => template.replace("{id}", &urlencoding::encode(id)),
            None => template.to_string(),
        };
        format!("{}{}", self.base_url, path)
    }

    /// Add authentication to a request
    async fn authenticate(&self, request: RequestBuilder) -> DirectoryResult<RequestBuilder> {
        let Some(auth) = &self.auth else {
            return Ok(request);
        };

        let header = auth
            .get_auth_header()
            .await
            .map_err(|e| DirectoryError::Api {
                status: 401,
                message: e.to_string(),
            })?;

        Ok(request.header(header.header_name(), header.header_value()))
    }

    /// Execute a request with retries
    async fn execute(&self, request: RequestBuilder) -> DirectoryResult<Response> {
        let mut last_error = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                // Exponential backoff
                let delay = Duration::from_millis(100 * 2u64.pow(attempt - 1));
                tokio::time::sleep(delay).await;
                debug!("Retrying directory request (attempt {})", attempt + 1);
            }

            let req = request.try_clone().ok_or_else(|| {
                DirectoryError::InvalidResponse("Cannot clone request".to_string())
            })?;

            let error = match req.send().await {
                Ok(response) => match self.handle_response(response).await {
                    Ok(response) => return Ok(response),
                    Err(e) => e,
                },
                Err(e) if e.is_timeout() => DirectoryError::Timeout {
                    timeout_secs: self.timeout_secs,
                },
                Err(e) => DirectoryError::Request(e),
            };

            warn!(error = %error, attempt = attempt + 1, "Directory request failed");
            let retry = is_retryable(&error);
            last_error = Some(error);
            if !retry {
                break;
            }
        }

        Err(last_error
            .unwrap_or_else(|| DirectoryError::InvalidResponse("Unknown error".to_string())))
    }

    /// Map non-success statuses to errors
    async fn handle_response(&self, response: Response) -> DirectoryResult<Response> {
        let status = response.status();

        if status.is_success() {
            return Ok(response);
        }

        let retry_after = response
            .headers()
            .get(reqwest::header::RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<u64>().ok());

        let body = response.text().await.unwrap_or_default();

        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(DirectoryError::RateLimited {
                retry_after: retry_after.unwrap_or(60),
            });
        }

        Err(DirectoryError::from_response(status.as_u16(), &body))
    }

    /// GET an endpoint and decode its (possibly enveloped) JSON body
    #[instrument(skip(self), fields(url = %url))]
    async fn get<T: DeserializeOwned>(&self, url: String) -> DirectoryResult<T> {
        let request = self.authenticate(self.http.get(&url)).await?;
        let response = self.execute(request).await?;

        let envelope: Envelope<T> = response.json().await.map_err(|e| {
            DirectoryError::InvalidResponse(format!("Failed to parse response: {}", e))
        })?;

        Ok(envelope.into_inner())
    }
}

#[async_trait]
impl RoleDirectory for HttpDirectory {
    async fn list_roles(&self) -> DirectoryResult<Vec<Role>> {
        self.get(self.url(&self.roles_path, None)).await
    }
}

#[async_trait]
impl AdminDirectory for HttpDirectory {
    async fn get_admin(&self, id: &str) -> DirectoryResult<AdminIdentity> {
        self.get(self.url(&self.admins_path, Some(id))).await
    }
}

#[async_trait]
impl CountryAdminDirectory for HttpDirectory {
    async fn get_self(&self, admin_id: &str) -> DirectoryResult<CountryAdminProfile> {
        self.get(self.url(&self.country_admin_path, Some(admin_id)))
            .await
    }
}

/// Check if an error is retryable
fn is_retryable(error: &DirectoryError) -> bool {
    match error {
        DirectoryError::Request(e) => e.is_connect(),
        DirectoryError::Timeout { .. } => true,
        DirectoryError::RateLimited { .. } => true,
        DirectoryError::Api { status, .. } => *status >= 500,
        _ => false,
    }
}
