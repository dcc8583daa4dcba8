use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use votebasis_core::{AggregateId, EventSignatureBusinessMetadata, UserId};

/// Envelope for an event: payload plus provenance and stream metadata.
///
/// This is the unit handed to downstream consumers (signing, auditing, read models).
///
/// Notes:
/// - **Append-only**: `sequence_number` is monotonically increasing per stream.
/// - `metadata` is business metadata for the signer; it is not part of the payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventEnvelope<E> {
    event_id: Uuid,

    aggregate_id: AggregateId,
    aggregate_type: String,

    /// Monotonically increasing position in the aggregate stream.
    sequence_number: u64,

    author: UserId,
    occurred_at: DateTime<Utc>,
    metadata: Option<EventSignatureBusinessMetadata>,

    payload: E,
}

impl<E> EventEnvelope<E> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        event_id: Uuid,
        aggregate_id: AggregateId,
        aggregate_type: impl Into<String>,
        sequence_number: u64,
        author: UserId,
        occurred_at: DateTime<Utc>,
        metadata: Option<EventSignatureBusinessMetadata>,
        payload: E,
    ) -> Self {
        Self {
            event_id,
            aggregate_id,
            aggregate_type: aggregate_type.into(),
            sequence_number,
            author,
            occurred_at,
            metadata,
            payload,
        }
    }

    pub fn event_id(&self) -> Uuid {
        self.event_id
    }

    pub fn aggregate_id(&self) -> AggregateId {
        self.aggregate_id
    }

    pub fn aggregate_type(&self) -> &str {
        &self.aggregate_type
    }

    pub fn sequence_number(&self) -> u64 {
        self.sequence_number
    }

    pub fn author(&self) -> UserId {
        self.author
    }

    pub fn occurred_at(&self) -> DateTime<Utc> {
        self.occurred_at
    }

    pub fn metadata(&self) -> Option<&EventSignatureBusinessMetadata> {
        self.metadata.as_ref()
    }

    pub fn payload(&self) -> &E {
        &self.payload
    }

    pub fn into_payload(self) -> E {
        self.payload
    }
}
