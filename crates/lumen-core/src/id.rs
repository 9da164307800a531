//! Strongly-typed identifiers.

use std::fmt;

/// Simulation step identifier carried by every snapshot.
///
/// Signed because the wire format is a plain integer and the client does
/// no semantic validation: a negative tick is passed through untouched.
/// A well-behaved server sends non-decreasing ticks, but nothing here
/// relies on it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TickId(pub i64);

impl fmt::Display for TickId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for TickId {
    fn from(v: i64) -> Self {
        Self(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_and_ordering() {
        assert_eq!(TickId(-3).to_string(), "-3");
        assert!(TickId(1) < TickId(2));
        assert_eq!(TickId::from(7), TickId(7));
    }
}
