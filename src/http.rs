//! HTTP access for discovery, feeds, sitemaps and article pages.
//!
//! Everything that talks to the network goes through the [`Fetcher`] trait,
//! so the collection pipeline can run against an in-memory fake in tests.
//! [`HttpClient`] is the real implementation. Its TLS trust settings are an
//! explicit [`TlsMode`] value chosen at construction; there is no global
//! state, so two clients with different trust settings can coexist.

use crate::errors::{ConfigError, FetchError};
use reqwest::{Certificate, Client, ClientBuilder};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, instrument, warn};

const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 \
                          (KHTML, like Gecko) Chrome/124.0 Safari/537.36";

/// Async GET of a URL into bytes.
///
/// Implementors return `Err` for transport failures and non-2xx responses.
/// Callers decide whether that is fatal; in this crate it never is.
pub trait Fetcher {
    async fn get(&self, url: &str, timeout: Duration) -> Result<Vec<u8>, FetchError>;
}

/// Certificate verification policy for outbound requests.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TlsMode {
    /// Platform/webpki roots.
    #[default]
    Verify,
    /// Default roots plus a PEM bundle from this path.
    CustomCa(PathBuf),
    /// No certificate verification. Opt-in only.
    Insecure,
}

/// reqwest-backed [`Fetcher`].
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
}

impl HttpClient {
    /// Build a client for the given trust policy.
    ///
    /// # Errors
    ///
    /// * [`ConfigError::CaBundle`] if the `--cafile` path cannot be read
    /// * [`ConfigError::Certificate`] if it holds no usable PEM certificate
    /// * [`ConfigError::Client`] if reqwest rejects the builder
    pub fn new(tls: &TlsMode) -> Result<Self, ConfigError> {
        let mut builder = ClientBuilder::new()
            .user_agent(USER_AGENT)
            .connect_timeout(Duration::from_secs(10))
            .redirect(reqwest::redirect::Policy::limited(10))
            .use_rustls_tls();

        match tls {
            TlsMode::Verify => {}
            TlsMode::CustomCa(path) => {
                let shown = path.display().to_string();
                let pem = std::fs::read(path).map_err(|source| ConfigError::CaBundle {
                    path: shown.clone(),
                    source,
                })?;
                let certs = Certificate::from_pem_bundle(&pem).map_err(|e| ConfigError::Certificate {
                    path: shown.clone(),
                    reason: e.to_string(),
                })?;
                if certs.is_empty() {
                    return Err(ConfigError::Certificate {
                        path: shown,
                        reason: "no certificates found".to_string(),
                    });
                }
                debug!(path = %shown, count = certs.len(), "Loaded custom CA bundle");
                for cert in certs {
                    builder = builder.add_root_certificate(cert);
                }
            }
            TlsMode::Insecure => {
                warn!("TLS certificate verification is DISABLED (--insecure)");
                builder = builder.danger_accept_invalid_certs(true);
            }
        }

        let client = builder
            .build()
            .map_err(|e| ConfigError::Client(e.to_string()))?;
        Ok(Self { client })
    }
}

impl Fetcher for HttpClient {
    #[instrument(level = "debug", skip_all, fields(%url))]
    async fn get(&self, url: &str, timeout: Duration) -> Result<Vec<u8>, FetchError> {
        let parsed = url::Url::parse(url)?;
        let response = self
            .client
            .get(parsed)
            .header(reqwest::header::ACCEPT, "*/*")
            .timeout(timeout)
            .send()
            .await
            .map_err(FetchError::from_reqwest_error)?;

        let status = response.status();
        if !status.is_success() {
            debug!(%status, "Non-success response");
            return Err(FetchError::Http { status });
        }

        let body = response
            .bytes()
            .await
            .map_err(FetchError::from_reqwest_error)?;
        debug!(bytes = body.len(), "Fetched");
        Ok(body.to_vec())
    }
}

#[cfg(test)]
pub mod testing {
    //! In-memory [`Fetcher`] for pipeline tests.

    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// Serves canned bodies by exact URL and answers 404 for everything else.
    /// Every requested URL is recorded in order.
    #[derive(Debug, Default)]
    pub struct FakeFetcher {
        pages: HashMap<String, Vec<u8>>,
        failing: HashMap<String, reqwest::StatusCode>,
        requests: Mutex<Vec<String>>,
    }

    impl FakeFetcher {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_page(mut self, url: &str, body: impl Into<Vec<u8>>) -> Self {
            self.pages.insert(url.to_string(), body.into());
            self
        }

        pub fn with_status(mut self, url: &str, status: u16) -> Self {
            let status = reqwest::StatusCode::from_u16(status).unwrap();
            self.failing.insert(url.to_string(), status);
            self
        }

        pub fn requests(&self) -> Vec<String> {
            self.requests.lock().unwrap().clone()
        }

        pub fn request_count(&self, url: &str) -> usize {
            self.requests.lock().unwrap().iter().filter(|u| *u == url).count()
        }
    }

    impl Fetcher for FakeFetcher {
        async fn get(&self, url: &str, _timeout: Duration) -> Result<Vec<u8>, FetchError> {
            self.requests.lock().unwrap().push(url.to_string());
            if let Some(status) = self.failing.get(url) {
                return Err(FetchError::Http { status: *status });
            }
            match self.pages.get(url) {
                Some(body) => Ok(body.clone()),
                None => Err(FetchError::Http {
                    status: reqwest::StatusCode::NOT_FOUND,
                }),
            }
        }
    }
}
