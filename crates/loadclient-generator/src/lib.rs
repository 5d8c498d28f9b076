//! Log content for the loadclient load generator.
//!
//! This crate produces the raw content of every generated log line and renders
//! it into its final wire-ready form:
//!
//! ```text
//!   LineSource ──► payload ──► LogFormat::render(identity, seq, payload) ──► line
//!   (simple,                    (default, crio, csv, json)
//!    application,
//!    synthetic)
//! ```
//!
//! Sources take the random generator as an argument. Every worker owns its own
//! `StdRng`, so no generator is ever shared between workers.
//!
//! # Example
//!
//! ```rust
//! use loadclient_generator::{FixedClock, LineSource, LogFormat, SourceKind};
//! use rand::rngs::StdRng;
//! use rand::SeedableRng;
//!
//! let mut rng = StdRng::seed_from_u64(7);
//! let source = LineSource::new(SourceKind::Simple, 0);
//! let payload = source.next_line(&mut rng);
//!
//! let clock = FixedClock::epoch();
//! let line = LogFormat::Default.render(&clock, "host.0.0", 3, &payload).unwrap();
//! assert!(line.starts_with("goloader seq - host.0.0 - 0000000003 - "));
//! ```

pub mod clock;
pub mod error;
pub mod format;
pub mod labels;
pub mod samples;
pub mod source;

pub use clock::{Clock, FixedClock, SystemClock};
pub use error::GeneratorError;
pub use format::LogFormat;
pub use labels::{Component, Level, Service, Stream};
pub use source::{LineSource, SourceKind, DEFAULT_SYNTHETIC_PAYLOAD_SIZE};
