//! Error types shared across the Soundwalk workspace.
//!
//! Organized by collaborator: [`FetchError`] for the catalog and
//! surroundings providers, [`PlaybackError`] for the audio sink.

use std::error::Error;
use std::fmt;

use crate::id::AudioHandle;

/// Errors from a catalog or surroundings fetch.
///
/// A failed surroundings fetch leaves the registry untouched; the
/// previous active set stays authoritative until the next success.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FetchError {
    /// The request could not be completed (network, TLS, timeout).
    Transport {
        /// Description of the transport failure.
        reason: String,
    },
    /// The backend answered with a non-success status.
    Status {
        /// The HTTP-style status code.
        code: u16,
    },
    /// The response body could not be decoded.
    Decode {
        /// Description of the decoding failure.
        reason: String,
    },
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transport { reason } => write!(f, "transport failure: {reason}"),
            Self::Status { code } => write!(f, "backend returned status {code}"),
            Self::Decode { reason } => write!(f, "undecodable response: {reason}"),
        }
    }
}

impl Error for FetchError {}

/// The audio sink operation that was attempted.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PlaybackOp {
    /// Binding a sound descriptor to a playable resource.
    Create,
    /// Routing a resource to the output.
    Connect,
    /// Detaching a resource from the output.
    Disconnect,
    /// Starting or resuming playback.
    Play,
    /// Pausing playback.
    Pause,
    /// Seeking to position zero.
    Rewind,
    /// Setting the auto-repeat flag.
    ConfigureLoop,
    /// Registering a completion observer.
    WatchEnded,
}

impl fmt::Display for PlaybackOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Create => "create",
            Self::Connect => "connect",
            Self::Disconnect => "disconnect",
            Self::Play => "play",
            Self::Pause => "pause",
            Self::Rewind => "rewind",
            Self::ConfigureLoop => "configure_loop",
            Self::WatchEnded => "watch_ended",
        };
        f.write_str(name)
    }
}

/// Errors from an audio sink operation.
///
/// Always scoped to a single spot: the engine logs and reports them but
/// never lets one spot's failure block the rest of a reconciliation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PlaybackError {
    /// The resource is not ready for the operation (still loading,
    /// autoplay not yet unlocked).
    NotReady {
        /// The resource in question.
        handle: AudioHandle,
    },
    /// The sink does not know the handle.
    UnknownHandle {
        /// The unrecognized handle.
        handle: AudioHandle,
    },
    /// The sink refused the operation.
    Rejected {
        /// Which operation was refused.
        op: PlaybackOp,
        /// Description supplied by the sink.
        reason: String,
    },
}

impl fmt::Display for PlaybackError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotReady { handle } => write!(f, "resource {handle} not ready"),
            Self::UnknownHandle { handle } => write!(f, "unknown resource {handle}"),
            Self::Rejected { op, reason } => write!(f, "sink rejected {op}: {reason}"),
        }
    }
}

impl Error for PlaybackError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_messages() {
        assert_eq!(
            FetchError::Status { code: 503 }.to_string(),
            "backend returned status 503"
        );
        assert_eq!(
            PlaybackError::Rejected {
                op: PlaybackOp::Play,
                reason: "autoplay blocked".into(),
            }
            .to_string(),
            "sink rejected play: autoplay blocked"
        );
        assert_eq!(
            PlaybackError::NotReady {
                handle: AudioHandle(9)
            }
            .to_string(),
            "resource #9 not ready"
        );
    }
}
