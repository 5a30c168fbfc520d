//! Admin password rotation over the GeoServer REST security API.
//!
//! GeoServer is usually still booting when this runs, so connection-level
//! failures are retried on a fixed delay. Any HTTP response, successful or
//! not, ends the loop.

use std::time::Duration;

use async_trait::async_trait;
use base64::{Engine, engine::general_purpose::STANDARD};
use reqwest::{
    Client,
    header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
};
use thiserror::Error;
use tracing::{info, warn};
use url::Url;

use crate::{
    ConfigLoadError, GeoServerConfig,
    constants::{
        PASSWORD_MAX_ATTEMPTS, PASSWORD_RETRY_DELAY, REST_PATH,
        SELF_PASSWORD_PATH,
    },
};

const XML_MEDIA_TYPE: &str = "application/xml";

/// The change could not even be attempted.
#[derive(Debug, Error)]
pub enum PasswordError {
    /// GeoServer connection settings are invalid.
    #[error("invalid GeoServer settings")]
    Config(#[from] ConfigLoadError),
    /// The REST URL derived from the settings does not parse.
    #[error("invalid GeoServer REST endpoint '{url}'")]
    InvalidEndpoint {
        /// Endpoint as built.
        url: String,
        /// Parse failure.
        #[source]
        source: url::ParseError,
    },
}

/// A request that never produced an HTTP response.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Connect, TLS or I/O failure reported by the HTTP client.
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
}

/// What happened to the password change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PasswordOutcome {
    /// GeoServer answered 200.
    Updated {
        /// Requests sent, including the successful one.
        attempts: u32,
    },
    /// GeoServer answered with any other status; not retried.
    Rejected {
        /// HTTP status code.
        status: u16,
        /// Requests sent.
        attempts: u32,
    },
    /// Every attempt failed before a response arrived.
    Unreachable {
        /// Requests sent.
        attempts: u32,
    },
}

impl PasswordOutcome {
    /// Requests sent before the outcome was known.
    pub fn attempts(&self) -> u32 {
        match *self {
            PasswordOutcome::Updated { attempts }
            | PasswordOutcome::Rejected { attempts, .. }
            | PasswordOutcome::Unreachable { attempts } => attempts,
        }
    }

    /// Whether the new password is in place.
    pub fn is_updated(&self) -> bool {
        matches!(self, PasswordOutcome::Updated { .. })
    }
}

/// Bounds on the connection retry loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Requests to send before giving up; at least one is always sent.
    pub max_attempts: u32,
    /// Pause after each failed request.
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: PASSWORD_MAX_ATTEMPTS,
            delay: PASSWORD_RETRY_DELAY,
        }
    }
}

/// Everything needed to issue the PUT, computed once up front.
#[derive(Clone, PartialEq, Eq)]
pub struct PasswordChangeRequest {
    /// `<rest>/security/self/password`.
    pub url: Url,
    /// Basic auth with the factory password.
    pub authorization: String,
    /// XML body carrying the new password.
    pub body: String,
}

impl std::fmt::Debug for PasswordChangeRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PasswordChangeRequest")
            .field("url", &self.url.as_str())
            .finish_non_exhaustive()
    }
}

impl PasswordChangeRequest {
    /// Derive URL, credentials and body from the settings.
    pub fn from_config(
        config: &GeoServerConfig,
    ) -> Result<Self, PasswordError> {
        let endpoint =
            format!("{}/{SELF_PASSWORD_PATH}", rest_base_url(config));
        let url = Url::parse(&endpoint).map_err(|source| {
            PasswordError::InvalidEndpoint {
                url: endpoint.clone(),
                source,
            }
        })?;
        Ok(Self {
            url,
            authorization: basic_auth_header(
                &config.admin_user,
                &config.factory_password,
            ),
            body: password_change_body(&config.admin_password),
        })
    }
}

/// Sends the password change.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RestTransport: Send + Sync {
    /// Issue the PUT and return the HTTP status code.
    async fn put_password(
        &self,
        request: &PasswordChangeRequest,
    ) -> Result<u16, TransportError>;
}

/// Waits between retries.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Sleeper: Send + Sync {
    /// Pause for `duration`.
    async fn sleep(&self, duration: Duration);
}

/// [`Sleeper`] backed by the tokio timer.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// [`RestTransport`] over a shared reqwest client.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    /// Send requests through `client`.
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl RestTransport for ReqwestTransport {
    async fn put_password(
        &self,
        request: &PasswordChangeRequest,
    ) -> Result<u16, TransportError> {
        let response = self
            .client
            .put(request.url.clone())
            .header(CONTENT_TYPE, XML_MEDIA_TYPE)
            .header(ACCEPT, XML_MEDIA_TYPE)
            .header(AUTHORIZATION, &request.authorization)
            .body(request.body.clone())
            .send()
            .await?;
        Ok(response.status().as_u16())
    }
}

/// Rotates the admin password, retrying while GeoServer is unreachable.
#[derive(Debug)]
pub struct PasswordConfigurator<T, S> {
    transport: T,
    sleeper: S,
    policy: RetryPolicy,
}

impl PasswordConfigurator<ReqwestTransport, TokioSleeper> {
    /// Production wiring: reqwest transport and tokio sleeps.
    pub fn with_client(client: Client) -> Self {
        Self::new(ReqwestTransport::new(client), TokioSleeper)
    }
}

impl<T, S> PasswordConfigurator<T, S>
where
    T: RestTransport,
    S: Sleeper,
{
    /// Use the default 28 x 2 s policy.
    pub fn new(transport: T, sleeper: S) -> Self {
        Self {
            transport,
            sleeper,
            policy: RetryPolicy::default(),
        }
    }

    /// Replace the retry policy.
    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Send the change, retrying until GeoServer answers or attempts run out.
    pub async fn run(
        &self,
        config: &GeoServerConfig,
    ) -> Result<PasswordOutcome, PasswordError> {
        let request = PasswordChangeRequest::from_config(config)?;
        info!(
            "configuring GeoServer credentials for '{}' at {}",
            config.admin_user, request.url
        );
        Ok(self.send_with_retry(&request).await)
    }

    async fn send_with_retry(
        &self,
        request: &PasswordChangeRequest,
    ) -> PasswordOutcome {
        let max_attempts = self.policy.max_attempts.max(1);

        for attempt in 1..=max_attempts {
            match self.transport.put_password(request).await {
                Ok(200) => {
                    info!("GeoServer admin password updated successfully");
                    return PasswordOutcome::Updated { attempts: attempt };
                }
                Ok(status) => {
                    warn!(
                        "GeoServer admin password NOT updated: code [{status}]"
                    );
                    return PasswordOutcome::Rejected {
                        status,
                        attempts: attempt,
                    };
                }
                Err(err) => {
                    info!(
                        "waiting for GeoServer to come up ({attempt}/{max_attempts}): {err}"
                    );
                    self.sleeper.sleep(self.policy.delay).await;
                }
            }
        }

        warn!(
            "GeoServer never became reachable after {max_attempts} attempts; password unchanged"
        );
        PasswordOutcome::Unreachable {
            attempts: max_attempts,
        }
    }
}

/// REST root for the configured instance.
///
/// `SITEURL` wins over protocol/host/port when set.
pub fn rest_base_url(config: &GeoServerConfig) -> String {
    match config.site_url.as_deref() {
        Some(site) => format!("{}/{REST_PATH}", site.trim_end_matches('/')),
        None => format!(
            "{}://{}:{}/{REST_PATH}",
            config.protocol, config.host, config.port
        ),
    }
}

/// `Authorization` header value for HTTP basic auth.
pub fn basic_auth_header(user: &str, password: &str) -> String {
    format!("Basic {}", STANDARD.encode(format!("{user}:{password}")))
}

/// XML document accepted by the self password endpoint.
pub fn password_change_body(new_password: &str) -> String {
    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
         <userPassword>\n    \
         <newPassword>{}</newPassword>\n\
         </userPassword>",
        escape_xml(new_password)
    )
}

fn escape_xml(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}
