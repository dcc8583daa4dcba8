//! Business metadata attached to raised events.

use serde::{Deserialize, Serialize};

use crate::id::ContestId;

/// Metadata consumed by the event signing subsystem.
///
/// It travels next to the event payload, never inside it, so the signer can pick
/// the key of the owning contest without understanding every event kind.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EventSignatureBusinessMetadata {
    pub contest_id: ContestId,
}

impl EventSignatureBusinessMetadata {
    pub fn new(contest_id: ContestId) -> Self {
        Self { contest_id }
    }
}
