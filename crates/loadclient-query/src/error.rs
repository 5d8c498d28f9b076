//! Error types for query replay.

use std::path::PathBuf;

use loadclient_sink::HttpSetupError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum QueryError {
    #[error("No queries configured: pass --query or --query-file")]
    EmptyPool,

    #[error("Failed to read query file {path}: {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse query file {path}: {source}")]
    ParseFile {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Invalid query target: {0}")]
    Config(String),

    #[error(transparent)]
    HttpSetup(#[from] HttpSetupError),

    #[error("Query request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Query returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Failed to decode query response: {0}")]
    Decode(String),
}
