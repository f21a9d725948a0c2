use crate::picture::Picture;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// What a finishing job was produced from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobKind {
    /// Assembled picture of a whole session
    Composite,
    /// Single shot archived right after capture
    Shot { index: u32 },
}

/// Picture plus everything a finishing task needs, captured by value at
/// enqueue time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinishingJob {
    pub kind: JobKind,
    pub picture: Picture,
    /// Output name relative to the storage directory, without extension
    pub destination: String,
    pub session: Uuid,
}

impl FinishingJob {
    pub fn composite(picture: Picture, destination: String, session: Uuid) -> Self {
        Self {
            kind: JobKind::Composite,
            picture,
            destination,
            session,
        }
    }

    pub fn shot(index: u32, picture: Picture, destination: String, session: Uuid) -> Self {
        Self {
            kind: JobKind::Shot { index },
            picture,
            destination,
            session,
        }
    }

    pub fn is_composite(&self) -> bool {
        matches!(self.kind, JobKind::Composite)
    }
}

impl fmt::Display for FinishingJob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            JobKind::Composite => write!(f, "composite '{}'", self.destination),
            JobKind::Shot { index } => write!(f, "shot {} '{}'", index, self.destination),
        }
    }
}
