//! Line formatters.
//!
//! A formatter turns `(identity, seq, payload)` into the final line. Output is
//! a pure function of its inputs and the clock: the `stream` and `level`
//! fields of the structured formats come from [`line_key`], not from a random
//! generator.

use clap::ValueEnum;
use serde::Serialize;

use crate::clock::Clock;
use crate::error::GeneratorError;
use crate::labels::{line_key, Level, Stream};

/// Output layout of a generated line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum LogFormat {
    /// `goloader seq - {id} - {seq} - {payload}`
    #[default]
    Default,
    /// CRI-O container log layout.
    Crio,
    /// `key=value` pairs.
    Csv,
    /// One JSON object per line.
    Json,
}

#[derive(Serialize)]
struct JsonLine<'a> {
    ts: String,
    stream: &'static str,
    host: &'a str,
    lvl: &'static str,
    count: u64,
    msg: &'a str,
}

impl LogFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogFormat::Default => "default",
            LogFormat::Crio => "crio",
            LogFormat::Csv => "csv",
            LogFormat::Json => "json",
        }
    }

    /// Render one line, including its trailing newline.
    pub fn render<C: Clock + ?Sized>(
        &self,
        clock: &C,
        identity: &str,
        seq: u64,
        payload: &str,
    ) -> Result<String, GeneratorError> {
        let line = match self {
            LogFormat::Default => format!("{}\n", plain(identity, seq, payload)),
            LogFormat::Crio => format!(
                "{} stdout F {}\n",
                clock.timestamp(),
                plain(identity, seq, payload)
            ),
            LogFormat::Csv => {
                let (stream, level) = derived_fields(identity, seq);
                format!(
                    "ts={} stream={} host={} level={} count={} msg={:?}\n",
                    clock.timestamp(),
                    stream,
                    identity,
                    level,
                    seq,
                    payload
                )
            }
            LogFormat::Json => {
                let (stream, level) = derived_fields(identity, seq);
                let mut line = serde_json::to_string(&JsonLine {
                    ts: clock.timestamp(),
                    stream: stream.as_str(),
                    host: identity,
                    lvl: level.as_str(),
                    count: seq,
                    msg: payload,
                })?;
                line.push('\n');
                line
            }
        };
        Ok(line)
    }
}

fn plain(identity: &str, seq: u64, payload: &str) -> String {
    format!("goloader seq - {identity} - {seq:010} - {payload}")
}

fn derived_fields(identity: &str, seq: u64) -> (Stream, Level) {
    let key = line_key(identity, seq);
    (Stream::from_key(key), Level::from_key(key.rotate_left(32)))
}
