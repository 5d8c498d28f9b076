//! loadclient
//!
//! A synthetic load generator and query driver for log ingestion backends.
//!
//! # Modes
//!
//! - `generate`: produce log lines at a fixed per-worker rate and ship them to
//!   stdout, a file, a Loki push endpoint or an Elasticsearch bulk endpoint.
//! - `query`: replay a pool of queries against Loki (`query_range`) or
//!   Elasticsearch (`_search`) at a fixed per-worker rate per minute.
//!
//! # CLI Usage
//!
//! ```bash
//! # 4 workers, 500 lines/s each, to Loki with host labels
//! loadclient generate --threads 4 --log-lines-per-sec 500 \
//!   --destination loki --destination-url http://loki:3100 \
//!   --loki-labels client-host --loki-tenant-id team-a
//!
//! # 10000 synthetic JSON lines into a file
//! loadclient generate --source synthetic --synthetic-payload-size 256 \
//!   --log-format json --destination file --output-file /tmp/lines.log \
//!   --total-log-lines 10000
//!
//! # 2 workers, 30 queries/min each, over the last 5 minutes
//! loadclient query --threads 2 --queries-per-minute 30 \
//!   --destination loki --destination-url http://loki:3100 \
//!   --query '{client="promtail"}' --query-range 5m
//! ```

use std::path::PathBuf;

use anyhow::Context;
use clap::Args;
use loadclient_generator::{LineSource, LogFormat, SourceKind};
use loadclient_query::{
    ElasticsearchQueryConfig, LokiQueryConfig, QueryPool, QueryTarget, QueryTargetKind,
};
use loadclient_runner::{GenerateSpec, QuerySpec, Rate, RunConfig};
use loadclient_sink::{ElasticsearchConfig, HttpOptions, LokiConfig, LokiLabels, SinkConfig, SinkKind};

pub mod config;

use config::parse_duration;

/// Backend connection options shared by both modes.
#[derive(Args, Clone, Debug)]
pub struct BackendOpts {
    /// Base URL of the Loki or Elasticsearch API
    #[arg(long, env = "LOADCLIENT_DESTINATION_URL")]
    pub destination_url: Option<String>,

    /// Loki tenant, sent as X-Scope-OrgID
    #[arg(long, env = "LOADCLIENT_LOKI_TENANT_ID")]
    pub loki_tenant_id: Option<String>,

    /// Elasticsearch index to write to or search
    #[arg(long, default_value = "logger", env = "LOADCLIENT_ELASTICSEARCH_INDEX")]
    pub elasticsearch_index: String,

    /// Accept invalid TLS certificates
    #[arg(long, env = "LOADCLIENT_DISABLE_SECURITY_CHECK")]
    pub disable_security_check: bool,

    /// File holding a bearer token sent with every request
    #[arg(long, value_name = "PATH", env = "LOADCLIENT_BEARER_TOKEN_FILE")]
    pub bearer_token_file: Option<PathBuf>,

    /// PEM file with an additional trusted CA certificate
    #[arg(long, value_name = "PATH", env = "LOADCLIENT_CA_FILE")]
    pub ca_file: Option<PathBuf>,
}

impl BackendOpts {
    fn http(&self) -> HttpOptions {
        HttpOptions {
            insecure: self.disable_security_check,
            bearer_token_file: self.bearer_token_file.clone(),
            ca_file: self.ca_file.clone(),
            ..Default::default()
        }
    }

    fn url(&self, backend: &str) -> anyhow::Result<String> {
        self.destination_url
            .clone()
            .with_context(|| format!("--destination-url is required for {backend}"))
    }
}

#[derive(Args, Clone, Debug)]
pub struct GenerateArgs {
    /// Number of concurrent workers
    #[arg(long, default_value_t = 1, env = "LOADCLIENT_THREADS")]
    pub threads: usize,

    /// Lines per second, per worker
    #[arg(long, default_value_t = 1, env = "LOADCLIENT_LOG_LINES_PER_SEC")]
    pub log_lines_per_sec: u64,

    /// Lines per worker before stopping (0 = run until interrupted)
    #[arg(long, default_value_t = 0, env = "LOADCLIENT_TOTAL_LOG_LINES")]
    pub total_log_lines: u64,

    /// Content of generated lines
    #[arg(long, value_enum, default_value_t = SourceKind::Simple, env = "LOADCLIENT_SOURCE")]
    pub source: SourceKind,

    /// Payload length for the synthetic source (default: 100)
    #[arg(long, env = "LOADCLIENT_SYNTHETIC_PAYLOAD_SIZE")]
    pub synthetic_payload_size: Option<usize>,

    /// Layout of generated lines
    #[arg(long, value_enum, default_value_t = LogFormat::Default, env = "LOADCLIENT_LOG_FORMAT")]
    pub log_format: LogFormat,

    /// Where lines are sent
    #[arg(long, value_enum, default_value_t = SinkKind::Stdout, env = "LOADCLIENT_DESTINATION")]
    pub destination: SinkKind,

    /// Output path for the file destination
    #[arg(long, default_value = "output", env = "LOADCLIENT_OUTPUT_FILE")]
    pub output_file: PathBuf,

    /// Labels attached to Loki streams
    #[arg(long, value_enum, default_value_t = LokiLabels::Client, env = "LOADCLIENT_LOKI_LABELS")]
    pub loki_labels: LokiLabels,

    /// Maximum wait for async deliveries after workers stop (e.g. "60s", "2m")
    #[arg(long, default_value = "60s", env = "LOADCLIENT_DRAIN_TIMEOUT")]
    pub drain_timeout: String,

    #[command(flatten)]
    pub backend: BackendOpts,
}

impl GenerateArgs {
    pub fn into_spec(self) -> anyhow::Result<GenerateSpec> {
        let drain_timeout = parse_duration(&self.drain_timeout)
            .with_context(|| format!("Invalid --drain-timeout '{}'", self.drain_timeout))?;
        let run = RunConfig::new(Rate::per_second(self.log_lines_per_sec), self.threads)
            .with_total_units(self.total_log_lines)
            .with_drain_timeout(drain_timeout);
        let source = LineSource::try_new(self.source, self.synthetic_payload_size)
            .context("Invalid --synthetic-payload-size")?;

        let sink = match self.destination {
            SinkKind::Stdout => SinkConfig::Stdout,
            SinkKind::File => SinkConfig::File {
                path: self.output_file,
            },
            SinkKind::Loki => {
                let mut config = LokiConfig::new(self.backend.url("loki")?);
                config.tenant_id = self.backend.loki_tenant_id.clone();
                config.labels = self.loki_labels;
                config.http = self.backend.http();
                SinkConfig::Loki(config)
            }
            SinkKind::Elasticsearch => {
                let mut config = ElasticsearchConfig::new(self.backend.url("elasticsearch")?);
                config.index = self.backend.elasticsearch_index.clone();
                config.http = self.backend.http();
                SinkConfig::Elasticsearch(config)
            }
        };

        Ok(GenerateSpec {
            run,
            source,
            format: self.log_format,
            sink,
        })
    }
}

#[derive(Args, Clone, Debug)]
pub struct QueryArgs {
    /// Number of concurrent workers
    #[arg(long, default_value_t = 1, env = "LOADCLIENT_THREADS")]
    pub threads: usize,

    /// Queries per minute, per worker
    #[arg(long, default_value_t = 1, env = "LOADCLIENT_QUERIES_PER_MINUTE")]
    pub queries_per_minute: u64,

    /// Queries per worker before stopping (0 = run until interrupted)
    #[arg(long, default_value_t = 0, env = "LOADCLIENT_TOTAL_QUERIES")]
    pub total_queries: u64,

    /// Backend to query
    #[arg(long, value_enum, default_value_t = QueryTargetKind::Loki, env = "LOADCLIENT_DESTINATION")]
    pub destination: QueryTargetKind,

    /// Query to replay (repeatable)
    #[arg(long = "query", value_name = "QUERY", env = "LOADCLIENT_QUERY", value_delimiter = '\n')]
    pub queries: Vec<String>,

    /// YAML file with queries; takes precedence over --query
    #[arg(long, value_name = "PATH", env = "LOADCLIENT_QUERY_FILE")]
    pub query_file: Option<PathBuf>,

    /// Loki lookback window (e.g. "1s", "5m", "1h")
    #[arg(long, default_value = "1h", env = "LOADCLIENT_QUERY_RANGE")]
    pub query_range: String,

    #[command(flatten)]
    pub backend: BackendOpts,
}

impl QueryArgs {
    pub fn into_spec(self) -> anyhow::Result<QuerySpec> {
        let run = RunConfig::new(Rate::per_minute(self.queries_per_minute), self.threads)
            .with_total_units(self.total_queries);
        let pool = QueryPool::from_sources(self.query_file.as_deref(), &self.queries)
            .context("Failed to load queries")?;

        let target = match self.destination {
            QueryTargetKind::Loki => {
                let range = parse_duration(&self.query_range)
                    .with_context(|| format!("Invalid --query-range '{}'", self.query_range))?;
                let mut config = LokiQueryConfig::new(self.backend.url("loki")?);
                config.tenant_id = self.backend.loki_tenant_id.clone();
                config.range = range;
                config.http = self.backend.http();
                QueryTarget::Loki(config)
            }
            QueryTargetKind::Elasticsearch => {
                let mut config = ElasticsearchQueryConfig::new(self.backend.url("elasticsearch")?);
                config.index = self.backend.elasticsearch_index.clone();
                config.http = self.backend.http();
                QueryTarget::Elasticsearch(config)
            }
        };

        Ok(QuerySpec { run, target, pool })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use std::time::Duration;

    #[derive(Parser)]
    struct Generate {
        #[command(flatten)]
        args: GenerateArgs,
    }

    #[derive(Parser)]
    struct Query {
        #[command(flatten)]
        args: QueryArgs,
    }

    #[test]
    fn test_generate_defaults() {
        let spec = Generate::parse_from(["generate"]).args.into_spec().unwrap();
        assert_eq!(spec.run.rate, Rate::per_second(1));
        assert_eq!(spec.run.workers, 1);
        assert_eq!(spec.run.total_units, 0);
        assert_eq!(spec.run.drain.timeout, Duration::from_secs(60));
        assert_eq!(spec.format, LogFormat::Default);
        assert!(matches!(spec.sink, SinkConfig::Stdout));
    }

    #[test]
    fn test_generate_loki() {
        let spec = Generate::parse_from([
            "generate",
            "--threads",
            "3",
            "--log-lines-per-sec",
            "500",
            "--destination",
            "loki",
            "--destination-url",
            "http://loki:3100",
            "--loki-labels",
            "client-host",
            "--loki-tenant-id",
            "team-a",
            "--drain-timeout",
            "90s",
        ])
        .args
        .into_spec()
        .unwrap();

        assert_eq!(spec.run.workers, 3);
        assert_eq!(spec.run.drain.timeout, Duration::from_secs(90));
        match spec.sink {
            SinkConfig::Loki(config) => {
                assert_eq!(config.url, "http://loki:3100");
                assert_eq!(config.tenant_id.as_deref(), Some("team-a"));
                assert_eq!(config.labels, LokiLabels::ClientHost);
            }
            other => panic!("unexpected sink: {other:?}"),
        }
    }

    #[test]
    fn test_generate_requires_url_for_http_sinks() {
        let err = Generate::parse_from(["generate", "--destination", "elasticsearch"])
            .args
            .into_spec()
            .unwrap_err();
        assert!(err.to_string().contains("--destination-url"));
    }

    #[test]
    fn test_generate_rejects_zero_payload() {
        let err = Generate::parse_from([
            "generate",
            "--source",
            "synthetic",
            "--synthetic-payload-size",
            "0",
        ])
        .args
        .into_spec()
        .unwrap_err();
        assert!(format!("{err:#}").contains("payload size"));
    }

    #[test]
    fn test_query_spec() {
        let spec = Query::parse_from([
            "query",
            "--queries-per-minute",
            "30",
            "--destination-url",
            "http://loki:3100",
            "--query",
            "{client=\"promtail\"}",
            "--query",
            "{level=\"error\"}",
            "--query-range",
            "5m",
        ])
        .args
        .into_spec()
        .unwrap();

        assert_eq!(spec.run.rate, Rate::per_minute(30));
        assert_eq!(spec.pool.len(), 2);
        match spec.target {
            QueryTarget::Loki(config) => assert_eq!(config.range, Duration::from_secs(300)),
            other => panic!("unexpected target: {other:?}"),
        }
    }

    #[test]
    fn test_query_file_takes_precedence() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        std::io::Write::write_all(
            &mut file,
            b"query:\n  - '{job=\"a\"}'\n  - '{job=\"b\"}'\n  - '{job=\"c\"}'\n",
        )
        .unwrap();
        let path = file.path().to_str().unwrap().to_string();

        let spec = Query::parse_from([
            "query",
            "--destination",
            "elasticsearch",
            "--destination-url",
            "http://elasticsearch:9200",
            "--elasticsearch-index",
            "app",
            "--query-file",
            &path,
            "--query",
            "ignored",
        ])
        .args
        .into_spec()
        .unwrap();

        assert_eq!(spec.pool.len(), 3);
        match spec.target {
            QueryTarget::Elasticsearch(config) => assert_eq!(config.index, "app"),
            other => panic!("unexpected target: {other:?}"),
        }
    }

    #[test]
    fn test_query_needs_queries() {
        let err = Query::parse_from(["query", "--destination-url", "http://loki:3100"])
            .args
            .into_spec()
            .unwrap_err();
        assert!(format!("{err:#}").contains("No queries configured"));
    }

    #[test]
    fn test_query_bad_range() {
        let err = Query::parse_from([
            "query",
            "--destination-url",
            "http://loki:3100",
            "--query",
            "{a=\"b\"}",
            "--query-range",
            "soon",
        ])
        .args
        .into_spec()
        .unwrap_err();
        assert!(err.to_string().contains("--query-range"));
    }
}
