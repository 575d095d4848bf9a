use std::fmt;

/// Final status of a simulated read, as exposed on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum ReadStatus {
    Success = 0,
    ReadTimeout = 1,
    IoFailure = 2,
    QueueTimeout = 3,
}

impl ReadStatus {
    pub const ALL: [Self; 4] = [
        Self::Success,
        Self::ReadTimeout,
        Self::IoFailure,
        Self::QueueTimeout,
    ];

    #[inline]
    pub fn code(self) -> u8 {
        self as u8
    }

    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Self::Success),
            1 => Some(Self::ReadTimeout),
            2 => Some(Self::IoFailure),
            3 => Some(Self::QueueTimeout),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::ReadTimeout => "read-timeout",
            Self::IoFailure => "io-failure",
            Self::QueueTimeout => "queue-timeout",
        }
    }
}

impl fmt::Display for ReadStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of the simulated read of a single request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadResult {
    pub status: ReadStatus,
    /// Always zero unless `status` is [`ReadStatus::Success`].
    pub bytes_read: u64,
    /// Simulated service time, excluding time spent waiting in queue.
    pub elapsed_ms: u64,
}

impl ReadResult {
    pub fn queue_timeout() -> Self {
        Self {
            status: ReadStatus::QueueTimeout,
            bytes_read: 0,
            elapsed_ms: 0,
        }
    }

    /// Mark the read as timed out, discarding whatever was read.
    pub(crate) fn time_out(&mut self, elapsed_ms: u64) {
        self.status = ReadStatus::ReadTimeout;
        self.bytes_read = 0;
        self.elapsed_ms = elapsed_ms;
    }
}
