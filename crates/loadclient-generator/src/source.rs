//! Raw log content sources.

use clap::ValueEnum;
use rand::Rng;

use crate::error::GeneratorError;
use crate::samples::{APPLICATION, SIMPLE, SYNTHETIC_ALPHABET};

/// Payload length for synthetic lines when none is configured.
pub const DEFAULT_SYNTHETIC_PAYLOAD_SIZE: usize = 100;

/// Which content a worker produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum SourceKind {
    /// Short humorous lines from a fixed pool.
    #[default]
    Simple,
    /// Realistic application and infrastructure log lines.
    Application,
    /// Random letters of a configured length.
    Synthetic,
}

impl SourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::Simple => "simple",
            SourceKind::Application => "application",
            SourceKind::Synthetic => "synthetic",
        }
    }
}

/// A configured source of raw log payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineSource {
    kind: SourceKind,
    payload_size: usize,
}

impl LineSource {
    /// Build a source. A `payload_size` of 0 selects the default for
    /// synthetic sources and is ignored by the pool-based ones.
    pub fn new(kind: SourceKind, payload_size: usize) -> Self {
        let payload_size = match (kind, payload_size) {
            (SourceKind::Synthetic, 0) => DEFAULT_SYNTHETIC_PAYLOAD_SIZE,
            (_, size) => size,
        };
        Self { kind, payload_size }
    }

    /// Build a source, rejecting an explicit zero-length synthetic payload.
    pub fn try_new(kind: SourceKind, payload_size: Option<usize>) -> Result<Self, GeneratorError> {
        match (kind, payload_size) {
            (SourceKind::Synthetic, Some(0)) => Err(GeneratorError::InvalidPayloadSize(0)),
            (_, size) => Ok(Self::new(kind, size.unwrap_or(0))),
        }
    }

    pub fn kind(&self) -> SourceKind {
        self.kind
    }

    pub fn payload_size(&self) -> usize {
        self.payload_size
    }

    /// Produce one payload.
    pub fn next_line<R: Rng + ?Sized>(&self, rng: &mut R) -> String {
        match self.kind {
            SourceKind::Simple => pick(SIMPLE, rng).to_string(),
            SourceKind::Application => pick(APPLICATION, rng).to_string(),
            SourceKind::Synthetic => (0..self.payload_size)
                .map(|_| char::from(SYNTHETIC_ALPHABET[rng.random_range(0..SYNTHETIC_ALPHABET.len())]))
                .collect(),
        }
    }
}

fn pick<'a, R: Rng + ?Sized>(pool: &[&'a str], rng: &mut R) -> &'a str {
    pool[rng.random_range(0..pool.len())]
}
