use rama::{error::BoxError, telemetry::tracing};

/// Inclusive `[min, max]` range in seconds from which a simulated
/// read duration is sampled.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SecondsRange {
    pub min: f64,
    pub max: f64,
}

impl SecondsRange {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }
}

/// Static configuration of the simulator, read once at startup.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationConfig {
    /// Budget a client is willing to wait for its read, in whole seconds.
    pub read_timeout_secs: u64,
    /// Probability that a read fails with an IO error.
    pub p_io_fail: f64,
    /// Cumulative probability (including [`Self::p_io_fail`])
    /// that a read is pathologically slow.
    pub p_slow_read: f64,
    /// Upper bound (exclusive) of the bytes a successful read reports.
    pub max_read_bytes: u64,
    pub io_fail_range: SecondsRange,
    pub slow_read_range: SecondsRange,
    pub normal_read_range: SecondsRange,
    /// Maximum additional time above the timeout
    /// for reads that were assigned a timeout up front.
    pub max_time_above_timeout_secs: f64,
    /// Root seed of the shared random variate source.
    pub seed: u64,
}

pub const DEFAULT_READ_TIMEOUT_SECS: u64 = 4;
pub const DEFAULT_P_IO_FAIL: f64 = 0.001;
pub const DEFAULT_P_SLOW_READ: f64 = 0.10;
pub const DEFAULT_MAX_READ_BYTES: u64 = 100_000;
pub const DEFAULT_IO_FAIL_RANGE: SecondsRange = SecondsRange::new(0.3, 3.0);
pub const DEFAULT_SLOW_READ_RANGE: SecondsRange = SecondsRange::new(6.0, 20.0);
pub const DEFAULT_NORMAL_READ_RANGE: SecondsRange = SecondsRange::new(0.075, 0.4);
pub const DEFAULT_SEED: u64 = 0x5EED_D15C;

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            read_timeout_secs: DEFAULT_READ_TIMEOUT_SECS,
            p_io_fail: DEFAULT_P_IO_FAIL,
            p_slow_read: DEFAULT_P_SLOW_READ,
            max_read_bytes: DEFAULT_MAX_READ_BYTES,
            io_fail_range: DEFAULT_IO_FAIL_RANGE,
            slow_read_range: DEFAULT_SLOW_READ_RANGE,
            normal_read_range: DEFAULT_NORMAL_READ_RANGE,
            max_time_above_timeout_secs: DEFAULT_SLOW_READ_RANGE.max * 0.8,
            seed: DEFAULT_SEED,
        }
    }
}

impl SimulationConfig {
    #[inline]
    pub fn read_timeout_ms(&self) -> u64 {
        self.read_timeout_secs.saturating_mul(1000)
    }

    /// Checks the invariants the decision engine relies upon.
    pub fn validate(&self) -> Result<(), BoxError> {
        if self.read_timeout_secs == 0 {
            return Err(BoxError::from("read timeout must be at least 1 second"));
        }

        for (name, p) in [("p_io_fail", self.p_io_fail), ("p_slow_read", self.p_slow_read)] {
            if !(0.0..=1.0).contains(&p) {
                return Err(BoxError::from(format!(
                    "{name} must be within [0, 1], got {p}"
                )));
            }
        }

        if self.p_io_fail > self.p_slow_read {
            return Err(BoxError::from(format!(
                "p_io_fail ({}) must be <= p_slow_read ({})",
                self.p_io_fail, self.p_slow_read
            )));
        }

        for (name, range) in [
            ("io fail", self.io_fail_range),
            ("slow read", self.slow_read_range),
            ("normal read", self.normal_read_range),
        ] {
            if !(range.min >= 0.0 && range.min <= range.max && range.max.is_finite()) {
                return Err(BoxError::from(format!(
                    "{name} range must satisfy 0 <= min <= max, got [{}, {}]",
                    range.min, range.max
                )));
            }
        }

        if !(self.max_time_above_timeout_secs >= 0.0 && self.max_time_above_timeout_secs.is_finite())
        {
            return Err(BoxError::from(format!(
                "max time above timeout must be a finite non-negative value, got {}",
                self.max_time_above_timeout_secs
            )));
        }

        Ok(())
    }
}

/// Simulation overrides as they can be given on the command line.
/// Anything left undefined keeps its default value.
#[derive(Debug, Clone, clap::Args, Default)]
pub struct SimulationArgs {
    /// Seconds a read may take before the client is considered gone.
    #[arg(long, value_name = "SECONDS")]
    pub read_timeout: Option<u64>,

    /// Probability of a simulated IO failure.
    #[arg(long, value_name = "P")]
    pub p_io_fail: Option<f64>,

    /// Probability of a pathologically slow read (dying disk),
    /// cumulative with the IO failure probability.
    #[arg(long, value_name = "P")]
    pub p_slow_read: Option<f64>,

    /// Upper bound (exclusive) of bytes reported for a successful read.
    #[arg(long, value_name = "BYTES")]
    pub max_read_bytes: Option<u64>,

    #[arg(long, value_name = "SECONDS")]
    pub io_fail_min: Option<f64>,

    #[arg(long, value_name = "SECONDS")]
    pub io_fail_max: Option<f64>,

    #[arg(long, value_name = "SECONDS")]
    pub slow_read_min: Option<f64>,

    #[arg(long, value_name = "SECONDS")]
    pub slow_read_max: Option<f64>,

    #[arg(long, value_name = "SECONDS")]
    pub normal_read_min: Option<f64>,

    #[arg(long, value_name = "SECONDS")]
    pub normal_read_max: Option<f64>,

    /// Maximum extra time above the timeout for reads assigned a timeout.
    #[arg(long, value_name = "SECONDS")]
    pub max_time_above_timeout: Option<f64>,

    /// Root seed for the random variate source.
    #[arg(long, value_name = "SEED")]
    pub seed: Option<u64>,
}

impl SimulationArgs {
    /// Merge the defined overrides on top of the given base config
    /// and validate the result.
    pub fn try_into_config(self, base: SimulationConfig) -> Result<SimulationConfig, BoxError> {
        let args = self;

        macro_rules! merge_config {
            ($base:ident, {$($property:ident => $($field:ident).+),+ $(,)?}) => {{
                let mut cfg = $base;
                $(
                    if let Some(value) = args.$property {
                        tracing::info!("property '{}': use overwrite: {value}", stringify!($property));
                        cfg.$($field).+ = value;
                    } else {
                        tracing::debug!(
                            "property '{}': use default: {}",
                            stringify!($property),
                            cfg.$($field).+,
                        );
                    }
                )+
                cfg
            }};
        }

        let cfg = merge_config!(
            base,
            {
                read_timeout => read_timeout_secs,
                p_io_fail => p_io_fail,
                p_slow_read => p_slow_read,
                max_read_bytes => max_read_bytes,
                io_fail_min => io_fail_range.min,
                io_fail_max => io_fail_range.max,
                slow_read_min => slow_read_range.min,
                slow_read_max => slow_read_range.max,
                normal_read_min => normal_read_range.min,
                normal_read_max => normal_read_range.max,
                max_time_above_timeout => max_time_above_timeout_secs,
                seed => seed,
            }
        );

        cfg.validate()?;
        Ok(cfg)
    }
}
