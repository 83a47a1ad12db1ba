//! Network-related configuration types

use std::num::NonZeroU16;
use std::str::FromStr;

use crate::types::ValidationError;

nonzero_newtype! {
    /// A validated network port number that cannot be zero
    ///
    /// # Examples
    /// ```
    /// use linkstats::types::Port;
    ///
    /// let port = Port::new(8100).unwrap();
    /// assert_eq!(port.get(), 8100);
    ///
    /// assert!(Port::new(0).is_none());
    /// ```
    #[doc(alias = "tcp_port")]
    pub struct Port(NonZeroU16: u16, serialize as serialize_u16);
}

impl Port {
    /// Default ingestion socket port (8100)
    pub const SOCKET_SERVER: Self = Self(NonZeroU16::new(8100).unwrap());

    /// Default dashboard HTTP port (8105)
    pub const DASHBOARD: Self = Self(NonZeroU16::new(8105).unwrap());

    /// Default PostgreSQL port (5432)
    pub const POSTGRES: Self = Self(NonZeroU16::new(5432).unwrap());
}

impl Default for Port {
    fn default() -> Self {
        Self::SOCKET_SERVER
    }
}

impl FromStr for Port {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let port = s
            .trim()
            .parse::<u16>()
            .map_err(|_| ValidationError::InvalidPortNumber(s.to_string()))?;
        Self::new(port).ok_or(ValidationError::InvalidPort)
    }
}

impl TryFrom<u16> for Port {
    type Error = ValidationError;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        Self::new(value).ok_or(ValidationError::InvalidPort)
    }
}
