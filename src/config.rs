//! Construction-time configuration and its validation errors.

use core::fmt;

pub const DEFAULT_BUCKETS: usize = 16;
pub const DEFAULT_LOAD_FACTOR: usize = 1;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Config {
    /// Bucket count of the first table. Non-zero power of two.
    pub initial_buckets: usize,
    /// Growth starts once the entry count exceeds `buckets * load_factor`.
    pub load_factor: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    BucketsNotPowerOfTwo(usize),
    ZeroLoadFactor,
}

impl Config {
    pub fn with_initial_buckets(mut self, buckets: usize) -> Self {
        self.initial_buckets = buckets;
        self
    }

    pub fn with_load_factor(mut self, load_factor: usize) -> Self {
        self.load_factor = load_factor;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.initial_buckets.is_power_of_two() {
            return Err(ConfigError::BucketsNotPowerOfTwo(self.initial_buckets));
        }
        if self.load_factor == 0 {
            return Err(ConfigError::ZeroLoadFactor);
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            initial_buckets: DEFAULT_BUCKETS,
            load_factor: DEFAULT_LOAD_FACTOR,
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::BucketsNotPowerOfTwo(n) => {
                write!(f, "initial bucket count {} is not a non-zero power of two", n)
            }
            ConfigError::ZeroLoadFactor => f.write_str("load factor must be at least 1"),
        }
    }
}

impl std::error::Error for ConfigError {}
