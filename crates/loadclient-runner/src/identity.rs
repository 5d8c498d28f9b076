//! Worker identities.

use std::fmt;
use std::sync::Arc;

use rand::Rng;

/// Who produced a unit: host, worker index and a random disambiguator, so
/// identities stay unique across processes on the same host.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct WorkerIdentity {
    host: String,
    index: usize,
    suffix: u64,
    rendered: Arc<str>,
}

impl WorkerIdentity {
    pub fn new(host: impl Into<String>, index: usize, suffix: u64) -> Self {
        let host = host.into();
        let rendered = Arc::from(format!("{host}.{index}.{suffix:032X}"));
        Self {
            host,
            index,
            suffix,
            rendered,
        }
    }

    pub fn generate<R: Rng + ?Sized>(host: &str, index: usize, rng: &mut R) -> Self {
        Self::new(host, index, rng.random())
    }

    /// This machine's host name, or `localhost` when it cannot be read.
    pub fn local_host() -> String {
        hostname::get()
            .ok()
            .and_then(|name| name.into_string().ok())
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| "localhost".to_string())
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn suffix(&self) -> u64 {
        self.suffix
    }

    pub fn as_str(&self) -> &str {
        &self.rendered
    }

    /// Shared rendering for records.
    pub fn shared(&self) -> Arc<str> {
        Arc::clone(&self.rendered)
    }
}

impl fmt::Display for WorkerIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.rendered)
    }
}
