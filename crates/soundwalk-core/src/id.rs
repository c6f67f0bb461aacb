//! Strongly-typed identifiers for spots and audio resources.

use std::fmt;

/// Identifies a spot within a catalog.
///
/// Opaque to the engine: the only operations that matter are equality
/// and hashing. Backends emit numeric ids, so the inner value is a `u64`.
/// Ids are unique within a catalog and stable for the session lifetime.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SpotId(pub u64);

impl fmt::Display for SpotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for SpotId {
    fn from(v: u64) -> Self {
        Self(v)
    }
}

/// Identifies a playable resource created by an [`AudioSink`](crate::AudioSink).
///
/// Issued by [`AudioSink::create`](crate::AudioSink::create). The engine
/// never interprets the value; it only hands it back to the sink that
/// issued it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AudioHandle(pub u64);

impl fmt::Display for AudioHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl From<u64> for AudioHandle {
    fn from(v: u64) -> Self {
        Self(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spot_id_display_is_bare_number() {
        assert_eq!(SpotId(42).to_string(), "42");
        assert_eq!(SpotId::from(7), SpotId(7));
    }

    #[test]
    fn audio_handle_display_is_prefixed() {
        assert_eq!(AudioHandle(3).to_string(), "#3");
    }
}
