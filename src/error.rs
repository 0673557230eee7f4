/*! Crate error type. */

use crate::registry::ResourceId;
use std::fmt::Display;

#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// A map was requested while the record is already mapped.
    AlreadyMapped,
    /// An unmap/diff was requested while the record is not mapped.
    NotMapped,
    /// A zero-length map was requested.
    EmptyMap,
    /// The null identity cannot own a tracking record.
    NullResource,
    /// Replay restoration asked for an ID that is already live.
    ///
    /// The capture stream and the live replay state have diverged; the replay
    /// session cannot continue.
    ReplayIdCollision(ResourceId),
    /// A replay-only operation was attempted while capturing.
    NotReplaying,
}

impl Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::AlreadyMapped => write!(f, "resource is already mapped"),
            Error::NotMapped => write!(f, "resource is not mapped"),
            Error::EmptyMap => write!(f, "zero-length map"),
            Error::NullResource => write!(f, "the null resource cannot be tracked"),
            Error::ReplayIdCollision(id) => {
                write!(f, "replay resource id {} is already live", id.raw())
            }
            Error::NotReplaying => write!(f, "registry is not in replay mode"),
        }
    }
}
