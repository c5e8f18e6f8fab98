//! Station identity types.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Error returned when a string cannot identify any station.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid station identifier: {reason}")]
pub struct InvalidStationRef {
    reason: &'static str,
}

/// Stable numeric station ID from the station registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StationId(u32);

impl StationId {
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    pub const fn get(self) -> u32 {
        self.0
    }
}

impl From<u32> for StationId {
    fn from(id: u32) -> Self {
        Self(id)
    }
}

impl fmt::Display for StationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for StationId {
    type Err = InvalidStationRef;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if !is_numeric(s) {
            return Err(InvalidStationRef {
                reason: "station ID must be ASCII digits",
            });
        }
        s.parse().map(Self).map_err(|_| InvalidStationRef {
            reason: "station ID out of range",
        })
    }
}

/// A station registry record, as supplied by the writer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Station {
    pub id: StationId,
    pub short_name: String,
    pub is_public: bool,
}

impl Station {
    pub fn new(id: u32, short_name: impl Into<String>, is_public: bool) -> Self {
        Self {
            id: StationId(id),
            short_name: short_name.into(),
            is_public,
        }
    }
}

/// A reference to a station by ID or by short name.
///
/// IDs are resolved through the lookup index; short names address station
/// entries directly.
///
/// # Examples
///
/// ```
/// use nowplaying_cache::{StationId, StationRef};
///
/// assert_eq!(StationRef::parse("42").unwrap(), StationRef::Id(StationId::new(42)));
/// assert_eq!(
///     StationRef::parse("jazz_fm").unwrap(),
///     StationRef::ShortName("jazz_fm".to_string())
/// );
/// assert!(StationRef::parse("").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum StationRef {
    Id(StationId),
    ShortName(String),
}

impl StationRef {
    /// Classify a raw identifier.
    ///
    /// Anything made only of ASCII digits is an ID, everything else is a
    /// short name. Digit strings too large for an ID are rejected rather than
    /// reinterpreted as names.
    pub fn parse(s: &str) -> Result<Self, InvalidStationRef> {
        if s.is_empty() {
            return Err(InvalidStationRef {
                reason: "must not be empty",
            });
        }

        if is_numeric(s) {
            return s.parse().map(StationRef::Id);
        }

        Ok(StationRef::ShortName(s.to_string()))
    }
}

impl FromStr for StationRef {
    type Err = InvalidStationRef;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl From<StationId> for StationRef {
    fn from(id: StationId) -> Self {
        StationRef::Id(id)
    }
}

impl From<&Station> for StationRef {
    fn from(station: &Station) -> Self {
        StationRef::ShortName(station.short_name.clone())
    }
}

impl fmt::Display for StationRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StationRef::Id(id) => write!(f, "#{id}"),
            StationRef::ShortName(name) => f.write_str(name),
        }
    }
}

fn is_numeric(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}
