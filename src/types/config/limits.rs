//! Pool and worker limit configuration types

use std::num::NonZeroUsize;

nonzero_newtype! {
    /// A non-zero ceiling on live storage handles
    ///
    /// A pool that may never hold a handle cannot serve a single borrow,
    /// so zero is rejected when the configuration is parsed.
    ///
    /// # Examples
    /// ```
    /// use linkstats::types::MaxActive;
    ///
    /// let max = MaxActive::new(32).unwrap();
    /// assert_eq!(max.get(), 32);
    ///
    /// assert!(MaxActive::new(0).is_none());
    /// ```
    #[doc(alias = "pool_size")]
    pub struct MaxActive(NonZeroUsize: usize, serialize as serialize_u64);
}

impl MaxActive {
    /// Default ceiling on live handles per worker pool
    pub const DEFAULT: Self = Self(NonZeroUsize::new(100).unwrap());
}

impl Default for MaxActive {
    fn default() -> Self {
        Self::DEFAULT
    }
}

nonzero_newtype! {
    /// A non-zero number of worker threads
    ///
    /// Each worker runs its own runtime and owns its own pool.
    pub struct WorkerCount(NonZeroUsize: usize, serialize as serialize_u64);
}

impl WorkerCount {
    /// Default worker count
    pub const DEFAULT: Self = Self(NonZeroUsize::new(1).unwrap());
}

impl Default for WorkerCount {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl std::str::FromStr for WorkerCount {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = s
            .trim()
            .parse::<usize>()
            .map_err(|e| format!("invalid worker count '{}': {}", s, e))?;
        Self::new(value).ok_or_else(|| "worker count cannot be 0".to_string())
    }
}

impl std::str::FromStr for MaxActive {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = s
            .trim()
            .parse::<usize>()
            .map_err(|e| format!("invalid pool size '{}': {}", s, e))?;
        Self::new(value).ok_or_else(|| "max_active cannot be 0".to_string())
    }
}
