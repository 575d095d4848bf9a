use std::{fmt, str::FromStr};

use crate::sim::{ReadResult, ReadStatus};

use super::request::FIELD_DELIMITER;

/// Response as written back to the client:
/// `<status_code>,<bytes_read>,<total_elapsed_ms>,<file_path>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadResponse {
    pub status: ReadStatus,
    pub bytes_read: u64,
    /// Queue wait plus simulated service time.
    pub total_elapsed_ms: u64,
    pub file_path: String,
}

impl ReadResponse {
    pub fn new(result: ReadResult, queue_wait_ms: u64, file_path: impl Into<String>) -> Self {
        Self {
            status: result.status,
            bytes_read: result.bytes_read,
            total_elapsed_ms: queue_wait_ms.saturating_add(result.elapsed_ms),
            file_path: file_path.into(),
        }
    }
}

impl fmt::Display for ReadResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{FIELD_DELIMITER}{}{FIELD_DELIMITER}{}{FIELD_DELIMITER}{}",
            self.status.code(),
            self.bytes_read,
            self.total_elapsed_ms,
            self.file_path,
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponseParseError {
    MissingField(&'static str),
    InvalidStatus(String),
    InvalidNumber { field: &'static str, value: String },
}

impl fmt::Display for ResponseParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingField(field) => write!(f, "response is missing field '{field}'"),
            Self::InvalidStatus(value) => write!(f, "invalid status code '{value}'"),
            Self::InvalidNumber { field, value } => {
                write!(f, "invalid number '{value}' for field '{field}'")
            }
        }
    }
}

impl std::error::Error for ResponseParseError {}

impl FromStr for ReadResponse {
    type Err = ResponseParseError;

    /// The file path is everything after the third delimiter,
    /// so it may contain delimiters itself.
    /// Only a trailing `\n` is dropped, any `\r` belongs to the file path.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut fields = s.strip_suffix('\n').unwrap_or(s).splitn(4, FIELD_DELIMITER);

        let status = fields
            .next()
            .filter(|v| !v.is_empty())
            .ok_or(ResponseParseError::MissingField("status"))?;
        let status = status
            .parse::<u8>()
            .ok()
            .and_then(ReadStatus::from_code)
            .ok_or_else(|| ResponseParseError::InvalidStatus(status.to_owned()))?;

        let bytes_read = parse_number(fields.next(), "bytes_read")?;
        let total_elapsed_ms = parse_number(fields.next(), "total_elapsed_ms")?;

        let file_path = fields
            .next()
            .ok_or(ResponseParseError::MissingField("file_path"))?;

        Ok(Self {
            status,
            bytes_read,
            total_elapsed_ms,
            file_path: file_path.to_owned(),
        })
    }
}

fn parse_number(value: Option<&str>, field: &'static str) -> Result<u64, ResponseParseError> {
    let value = value.ok_or(ResponseParseError::MissingField(field))?;
    value
        .parse()
        .map_err(|_| ResponseParseError::InvalidNumber {
            field,
            value: value.to_owned(),
        })
}
