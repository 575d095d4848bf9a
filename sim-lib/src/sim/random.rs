use std::sync::atomic::{AtomicU64, Ordering};

use rand::{Rng as _, SeedableRng as _, rngs::SmallRng};

/// Process wide source of random variates.
///
/// Every request draws from its own [`VariateStream`], seeded from the
/// root seed and a request discriminator. Concurrent requests therefore never
/// contend on shared generator state, and replaying the same discriminators
/// replays the same decisions.
#[derive(Debug)]
pub struct VariateSource {
    root_seed: u64,
    next_discriminator: AtomicU64,
}

impl VariateSource {
    pub fn new(root_seed: u64) -> Self {
        Self {
            root_seed,
            next_discriminator: AtomicU64::new(0),
        }
    }

    pub fn root_seed(&self) -> u64 {
        self.root_seed
    }

    /// Hand out the stream for the next request.
    pub fn next_stream(&self) -> VariateStream {
        let discriminator = self.next_discriminator.fetch_add(1, Ordering::Relaxed);
        self.stream(discriminator)
    }

    /// Stream for an explicit discriminator; identical inputs give identical streams.
    pub fn stream(&self, discriminator: u64) -> VariateStream {
        VariateStream {
            discriminator,
            rng: SmallRng::seed_from_u64(mix_seed(self.root_seed, discriminator)),
        }
    }
}

// splitmix64 finalizer so neighbouring discriminators do not
// produce correlated generator states
fn mix_seed(root_seed: u64, discriminator: u64) -> u64 {
    let mut z = root_seed ^ discriminator.wrapping_mul(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

/// Per request generator of uniform variates in `[0, 1)`.
#[derive(Debug, Clone)]
pub struct VariateStream {
    discriminator: u64,
    rng: SmallRng,
}

impl VariateStream {
    pub fn discriminator(&self) -> u64 {
        self.discriminator
    }

    /// Uniform value in `[0, 1)`.
    pub fn random_value(&mut self) -> f64 {
        self.rng.random::<f64>()
    }

    /// Value in `[min, max)`, sampled as `random_value() * max`
    /// and pulled up to `min` when it lands below it.
    /// This piles up probability mass on `min` itself.
    pub fn random_value_between(&mut self, min: f64, max: f64) -> f64 {
        let value = self.random_value() * max;
        if value < min { min } else { value }
    }
}
