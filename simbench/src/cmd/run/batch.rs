use std::{path::Path, sync::Arc};

use rama::error::{BoxError, ErrorContext as _};

/// Request lines sent during a single iteration of a run.
///
/// Every line goes out over its own connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestBatch {
    lines: Vec<Arc<str>>,
}

impl RequestBatch {
    /// A batch sending the same request line `count` times.
    pub fn repeat(line: impl Into<Arc<str>>, count: usize) -> Self {
        let line = line.into();
        Self {
            lines: std::iter::repeat_n(line, count).collect(),
        }
    }

    /// Load a file list, one request per non-empty line.
    pub async fn from_file_list(path: &Path) -> Result<Self, BoxError> {
        let content = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("read file list '{}'", path.display()))?;
        let batch = Self::parse_file_list(&content);
        if batch.is_empty() {
            return Err(BoxError::from(format!(
                "file list '{}' contains no requests",
                path.display()
            )));
        }
        Ok(batch)
    }

    /// One request per non-empty line of `content`.
    pub fn parse_file_list(content: &str) -> Self {
        let lines = content
            .lines()
            .map(|line| line.trim_end_matches('\r'))
            .filter(|line| !line.trim().is_empty())
            .map(|line| Arc::from(format!("{line}\n")))
            .collect();
        Self { lines }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<str>> {
        self.lines.iter()
    }
}
