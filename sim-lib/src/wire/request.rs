use tokio::time::Instant;

/// Separator between the optional predetermined response time and the file path.
pub const FIELD_DELIMITER: char = ',';

/// Maximum number of digits honored for a predetermined response time.
pub const MAX_OVERRIDE_DIGITS: usize = 9;

/// How the optional response time prefix of a request line was interpreted.
///
/// A prefix that cannot be used is not an error:
/// the request is served as if no prefix was given.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseOutcome {
    /// Line carries no delimiter, it is a file path only.
    NoDelimiter,
    /// Prefix is a valid predetermined response time in milliseconds.
    Override(u64),
    /// Prefix is empty, too long, or not made of ASCII digits.
    InvalidOverride,
}

impl ParseOutcome {
    #[inline]
    pub fn predetermined_elapsed_ms(self) -> Option<u64> {
        match self {
            Self::Override(ms) => Some(ms),
            Self::NoDelimiter | Self::InvalidOverride => None,
        }
    }
}

/// A request as read from a single line, immutable once parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub receipt_time: Instant,
    pub outcome: ParseOutcome,
    pub file_path: String,
}

impl Request {
    /// Parse a raw request line of the form `<file_path>` or `<ms>,<file_path>`,
    /// with or without its line terminator.
    pub fn parse(line: &str, receipt_time: Instant) -> Self {
        let line = strip_line_terminator(line);

        let (outcome, file_path) = match line.split_once(FIELD_DELIMITER) {
            None => (ParseOutcome::NoDelimiter, line),
            Some((prefix, file_path)) => (parse_override(prefix), file_path),
        };

        Self {
            receipt_time,
            outcome,
            file_path: file_path.to_owned(),
        }
    }

    #[inline]
    pub fn predetermined_elapsed_ms(&self) -> Option<u64> {
        self.outcome.predetermined_elapsed_ms()
    }
}

fn parse_override(prefix: &str) -> ParseOutcome {
    if prefix.is_empty()
        || prefix.len() > MAX_OVERRIDE_DIGITS
        || !prefix.bytes().all(|b| b.is_ascii_digit())
    {
        return ParseOutcome::InvalidOverride;
    }
    prefix
        .parse()
        .map(ParseOutcome::Override)
        .unwrap_or(ParseOutcome::InvalidOverride)
}

fn strip_line_terminator(line: &str) -> &str {
    let line = line.strip_suffix('\n').unwrap_or(line);
    line.strip_suffix('\r').unwrap_or(line)
}
