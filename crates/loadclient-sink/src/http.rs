//! Shared reqwest client construction for HTTP backends.

use std::path::PathBuf;
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};

use crate::error::HttpSetupError;

/// Per-request timeout for backend calls.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Credentials and TLS settings for an HTTP backend.
#[derive(Debug, Clone)]
pub struct HttpOptions {
    /// Accept invalid TLS certificates.
    pub insecure: bool,
    /// File holding a bearer token sent with every request.
    pub bearer_token_file: Option<PathBuf>,
    /// PEM file with an extra trusted CA.
    pub ca_file: Option<PathBuf>,
    pub timeout: Duration,
}

impl Default for HttpOptions {
    fn default() -> Self {
        Self {
            insecure: false,
            bearer_token_file: None,
            ca_file: None,
            timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

impl HttpOptions {
    pub fn build_client(&self) -> Result<reqwest::Client, HttpSetupError> {
        let mut builder = reqwest::Client::builder().timeout(self.timeout);

        if self.insecure {
            tracing::warn!("TLS certificate verification is disabled");
            builder = builder.danger_accept_invalid_certs(true);
        }

        if let Some(path) = &self.ca_file {
            let pem = std::fs::read(path).map_err(|source| HttpSetupError::ReadFile {
                what: "CA certificate",
                path: path.clone(),
                source,
            })?;
            builder = builder.add_root_certificate(reqwest::Certificate::from_pem(&pem)?);
        }

        if let Some(path) = &self.bearer_token_file {
            let token =
                std::fs::read_to_string(path).map_err(|source| HttpSetupError::ReadFile {
                    what: "bearer token",
                    path: path.clone(),
                    source,
                })?;
            let mut value = HeaderValue::from_str(&format!("Bearer {}", token.trim()))
                .map_err(|_| HttpSetupError::InvalidToken(path.clone()))?;
            value.set_sensitive(true);

            let mut headers = HeaderMap::new();
            headers.insert(AUTHORIZATION, value);
            builder = builder.default_headers(headers);
        }

        Ok(builder.build()?)
    }
}

/// Join a base URL and a path without doubling the slash.
pub fn join_url(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_join_url() {
        assert_eq!(
            join_url("http://loki:3100/", "/loki/api/v1/push"),
            "http://loki:3100/loki/api/v1/push"
        );
        assert_eq!(join_url("http://es:9200", "logger"), "http://es:9200/logger");
    }

    #[test]
    fn test_missing_token_file() {
        let options = HttpOptions {
            bearer_token_file: Some(PathBuf::from("/nonexistent/token")),
            ..Default::default()
        };
        let err = options.build_client().unwrap_err();
        assert!(matches!(err, HttpSetupError::ReadFile { what: "bearer token", .. }));
    }

    #[test]
    fn test_token_file_is_trimmed() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "secret-token").unwrap();
        let options = HttpOptions {
            bearer_token_file: Some(file.path().to_path_buf()),
            ..Default::default()
        };
        assert!(options.build_client().is_ok());
    }
}
