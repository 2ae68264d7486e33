//! Transport and routing modes.

use std::fmt;

use serde::{Deserialize, Serialize};

/// How a path segment is travelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportMode {
    /// On foot over land and bridges.
    #[default]
    Walk,
    /// By boat along a canal edge.
    Gondola,
}

impl TransportMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransportMode::Walk => "walk",
            TransportMode::Gondola => "gondola",
        }
    }
}

impl fmt::Display for TransportMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which bridges a land route may use.
///
/// Callers pass a free-form mode string: `"real"` restricts the search to
/// bridges that are actually built, anything else also allows planned ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RouteMode {
    #[default]
    Real,
    All,
}

impl RouteMode {
    /// Interprets a caller-supplied mode string.
    pub fn parse(s: &str) -> Self {
        if s.eq_ignore_ascii_case("real") {
            RouteMode::Real
        } else {
            RouteMode::All
        }
    }

    /// Whether planned (not yet constructed) bridges may be crossed.
    pub fn allows_planned_bridges(&self) -> bool {
        matches!(self, RouteMode::All)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RouteMode::Real => "real",
            RouteMode::All => "all",
        }
    }
}

impl fmt::Display for RouteMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
