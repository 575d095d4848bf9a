use std::fmt;

use crate::config::{SecondsRange, SimulationConfig};

/// Kind of simulated IO a request experiences.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutcomeClass {
    IoFailure,
    SlowRead,
    NormalRead,
}

impl OutcomeClass {
    /// Select the class for a single draw in `[0, 1)`.
    ///
    /// The thresholds are cumulative: a draw `<= p_io_fail` fails,
    /// a draw `<= p_slow_read` is slow, anything above reads normally.
    pub fn classify(draw: f64, cfg: &SimulationConfig) -> Self {
        if draw <= cfg.p_io_fail {
            Self::IoFailure
        } else if draw <= cfg.p_slow_read {
            Self::SlowRead
        } else {
            Self::NormalRead
        }
    }

    /// Range from which the read duration of this class is sampled.
    pub fn range(self, cfg: &SimulationConfig) -> SecondsRange {
        match self {
            Self::IoFailure => cfg.io_fail_range,
            Self::SlowRead => cfg.slow_read_range,
            Self::NormalRead => cfg.normal_read_range,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::IoFailure => "io-failure",
            Self::SlowRead => "slow-read",
            Self::NormalRead => "normal-read",
        }
    }
}

impl fmt::Display for OutcomeClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
