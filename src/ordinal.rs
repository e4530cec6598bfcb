//! Node ordinal — the integer suffix the orchestrator assigns to each pod.
//!
//! `kafka-2` → `2`. A fully qualified host name is reduced to its first
//! label first, so `kafka-2.kafka.svc.cluster.local` also yields `2`.

use std::fmt;

use crate::error::AppError;

/// Separator between the name prefix and the ordinal.
pub const ORDINAL_SEPARATOR: char = '-';

/// Non-negative ordinal parsed from an assigned name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeOrdinal(u32);

impl NodeOrdinal {
    #[inline]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    #[inline]
    pub const fn as_u32(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for NodeOrdinal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<NodeOrdinal> for u32 {
    fn from(ordinal: NodeOrdinal) -> Self {
        ordinal.0
    }
}

/// Parse the trailing integer after the last `-` in `assigned_name`.
///
/// The prefix before that `-` must be non-empty, so `-3` is malformed.
pub fn resolve_ordinal(assigned_name: &str) -> Result<NodeOrdinal, AppError> {
    let malformed = |reason: &str| AppError::MalformedName {
        name: assigned_name.to_string(),
        reason: reason.to_string(),
    };

    let short_name = assigned_name
        .trim()
        .split('.')
        .next()
        .unwrap_or_default();

    let (prefix, suffix) = short_name
        .rsplit_once(ORDINAL_SEPARATOR)
        .ok_or_else(|| malformed("no '-' separator before an ordinal"))?;

    if prefix.is_empty() {
        return Err(malformed("empty name prefix"));
    }
    if suffix.is_empty() {
        return Err(malformed("no trailing ordinal"));
    }
    // `u32::from_str` accepts a leading '+'; ordinals are plain digits only.
    if !suffix.bytes().all(|b| b.is_ascii_digit()) {
        return Err(malformed("trailing ordinal is not a non-negative integer"));
    }

    suffix
        .parse::<u32>()
        .map(NodeOrdinal)
        .map_err(|_| malformed("trailing ordinal is out of range"))
}
