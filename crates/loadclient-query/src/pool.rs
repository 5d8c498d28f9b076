//! The set of queries workers pick from.

use std::path::Path;

use rand::Rng;
use serde::Deserialize;

use crate::error::QueryError;

/// Accepted layouts of a query file.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum QueryFile {
    List(Vec<String>),
    Mapping { query: Vec<String> },
}

/// A non-empty list of queries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryPool {
    queries: Vec<String>,
}

impl QueryPool {
    /// Build a pool, dropping blank entries.
    pub fn new<I, S>(queries: I) -> Result<Self, QueryError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let queries: Vec<String> = queries
            .into_iter()
            .map(Into::into)
            .filter(|q| !q.trim().is_empty())
            .collect();
        if queries.is_empty() {
            return Err(QueryError::EmptyPool);
        }
        Ok(Self { queries })
    }

    /// Load a YAML file holding either a list of queries or a mapping with a
    /// `query:` list.
    pub fn from_yaml_file(path: &Path) -> Result<Self, QueryError> {
        let contents = std::fs::read_to_string(path).map_err(|source| QueryError::ReadFile {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml_str(&contents).map_err(|err| match err {
            QueryError::ParseFile { source, .. } => QueryError::ParseFile {
                path: path.to_path_buf(),
                source,
            },
            other => other,
        })
    }

    pub fn from_yaml_str(contents: &str) -> Result<Self, QueryError> {
        let parsed: QueryFile =
            serde_yaml::from_str(contents).map_err(|source| QueryError::ParseFile {
                path: Default::default(),
                source,
            })?;
        match parsed {
            QueryFile::List(queries) | QueryFile::Mapping { query: queries } => Self::new(queries),
        }
    }

    /// Queries from the file when given, else from the command line.
    pub fn from_sources(file: Option<&Path>, inline: &[String]) -> Result<Self, QueryError> {
        match file {
            Some(path) => Self::from_yaml_file(path),
            None => Self::new(inline.iter().cloned()),
        }
    }

    pub fn len(&self) -> usize {
        self.queries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queries.is_empty()
    }

    pub fn queries(&self) -> &[String] {
        &self.queries
    }

    /// Uniformly random query.
    pub fn pick<R: Rng + ?Sized>(&self, rng: &mut R) -> &str {
        &self.queries[rng.random_range(0..self.queries.len())]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::io::Write;

    #[test]
    fn test_empty_pool_rejected() {
        assert!(matches!(
            QueryPool::new(Vec::<String>::new()),
            Err(QueryError::EmptyPool)
        ));
        assert!(matches!(QueryPool::new(["  ", ""]), Err(QueryError::EmptyPool)));
    }

    #[test]
    fn test_yaml_list() {
        let pool = QueryPool::from_yaml_str("- '{client=\"promtail\"}'\n- '{level=\"error\"}'\n").unwrap();
        assert_eq!(pool.len(), 2);
        assert_eq!(pool.queries()[1], "{level=\"error\"}");
    }

    #[test]
    fn test_yaml_mapping() {
        let pool = QueryPool::from_yaml_str("query:\n  - '{\"query\":{\"match_all\":{}}}'\n").unwrap();
        assert_eq!(pool.queries(), ["{\"query\":{\"match_all\":{}}}"]);
    }

    #[test]
    fn test_yaml_invalid() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "query: 12").unwrap();
        let err = QueryPool::from_yaml_file(file.path()).unwrap_err();
        match err {
            QueryError::ParseFile { path, .. } => assert_eq!(path, file.path()),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_missing_file() {
        let err = QueryPool::from_sources(Some(Path::new("/nonexistent/queries.yaml")), &[]).unwrap_err();
        assert!(matches!(err, QueryError::ReadFile { .. }));
    }

    #[test]
    fn test_file_takes_precedence() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "- from-file").unwrap();
        let pool = QueryPool::from_sources(Some(file.path()), &["inline".to_string()]).unwrap();
        assert_eq!(pool.queries(), ["from-file"]);
    }

    #[test]
    fn test_pick_stays_in_pool() {
        let pool = QueryPool::new(["a", "b", "c"]).unwrap();
        let mut rng = StdRng::seed_from_u64(5);
        for _ in 0..50 {
            assert!(["a", "b", "c"].contains(&pool.pick(&mut rng)));
        }
    }
}
