//! Filter state shared by the list view, the HTTP client and the query-string
//! codec.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::queue::{JobStatus, ParseJobStatusError};

/// Status selector: every status, or exactly one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum StatusFilter {
    #[default]
    All,
    Only(JobStatus),
}

impl StatusFilter {
    /// Selector cycle order used by the filter bar.
    pub const CYCLE: [StatusFilter; 4] = [
        StatusFilter::All,
        StatusFilter::Only(JobStatus::Pending),
        StatusFilter::Only(JobStatus::Processing),
        StatusFilter::Only(JobStatus::Completed),
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Only(status) => status.as_str(),
        }
    }

    /// The status to send to the server, `None` meaning "no constraint".
    pub fn status(&self) -> Option<JobStatus> {
        match self {
            Self::All => None,
            Self::Only(status) => Some(*status),
        }
    }

    pub fn next(&self) -> Self {
        let position = Self::CYCLE.iter().position(|s| s == self).unwrap_or(0);
        Self::CYCLE[(position + 1) % Self::CYCLE.len()]
    }

    pub fn prev(&self) -> Self {
        let position = Self::CYCLE.iter().position(|s| s == self).unwrap_or(0);
        Self::CYCLE[(position + Self::CYCLE.len() - 1) % Self::CYCLE.len()]
    }
}

impl fmt::Display for StatusFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StatusFilter {
    type Err = ParseJobStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("all") {
            return Ok(Self::All);
        }
        s.parse::<JobStatus>().map(Self::Only)
    }
}

impl Serialize for StatusFilter {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for StatusFilter {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// The filter driving which jobs are listed.
///
/// The list keeps two copies: the pending one the operator is editing and the
/// committed one that drives fetching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct FilterState {
    pub status: StatusFilter,
    pub requires_manual_review: bool,
}

impl FilterState {
    pub fn new(status: StatusFilter, requires_manual_review: bool) -> Self {
        Self {
            status,
            requires_manual_review,
        }
    }

    /// Whether anything narrows the listing.
    pub fn is_narrowed(&self) -> bool {
        self.status != StatusFilter::All || self.requires_manual_review
    }
}

/// Marker bumped on every pagination reset.
///
/// Captured when a fetch starts and compared when it resolves; a mismatch
/// means the filter changed in between and the result is dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
pub struct Generation(u64);

impl Generation {
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    pub const fn next(self) -> Self {
        Self(self.0.wrapping_add(1))
    }

    pub const fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for Generation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "g{}", self.0)
    }
}

/// One page request issued by the pagination controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub generation: Generation,
    pub filter: FilterState,
    pub offset: usize,
    pub limit: usize,
}
