//! Versioned upcasting of stored event payloads.
//!
//! Stored payloads are adjacently tagged JSON (`{"type": ..., "data": {...}}`).
//! Upcasters run right after loading and before deserialization, one step per
//! version, so corrections for old events live in exactly one place per event
//! kind instead of being scattered through `apply`.

use std::collections::BTreeMap;

use serde_json::Value as JsonValue;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum UpcastError {
    #[error("payload of {event_type} v{version} is malformed: {reason}")]
    Malformed {
        event_type: String,
        version: u32,
        reason: String,
    },
}

/// Migrates one event type from `from_version` to `from_version + 1`.
pub trait Upcaster: Send + Sync {
    fn event_type(&self) -> &str;

    fn from_version(&self) -> u32;

    /// Rewrite the `data` object of the payload in place.
    fn upcast(&self, data: &mut serde_json::Map<String, JsonValue>) -> Result<(), String>;
}

/// Registry of upcasters keyed by `(event_type, from_version)`.
#[derive(Default)]
pub struct UpcasterChain {
    steps: BTreeMap<(String, u32), Box<dyn Upcaster>>,
}

impl core::fmt::Debug for UpcasterChain {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("UpcasterChain")
            .field("steps", &self.steps.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl UpcasterChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, upcaster: impl Upcaster + 'static) -> &mut Self {
        let key = (upcaster.event_type().to_string(), upcaster.from_version());
        self.steps.insert(key, Box::new(upcaster));
        self
    }

    pub fn with(mut self, upcaster: impl Upcaster + 'static) -> Self {
        self.register(upcaster);
        self
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Bring `payload` from `version` up to the newest registered version.
    ///
    /// Returns the resulting version; payloads without registered steps pass through.
    pub fn upcast(
        &self,
        event_type: &str,
        mut version: u32,
        payload: &mut JsonValue,
    ) -> Result<u32, UpcastError> {
        while let Some(step) = self.steps.get(&(event_type.to_string(), version)) {
            let malformed = |reason: String| UpcastError::Malformed {
                event_type: event_type.to_string(),
                version,
                reason,
            };
            let data = payload
                .get_mut("data")
                .and_then(JsonValue::as_object_mut)
                .ok_or_else(|| malformed("missing data object".to_string()))?;
            step.upcast(data).map_err(malformed)?;
            version += 1;
        }
        Ok(version)
    }
}

/// Fills a field that older versions did not write with its historical default.
///
/// `path` addresses nested objects inside `data`, e.g. `["election", "mandate_algorithm"]`.
#[derive(Debug, Clone)]
pub struct DefaultField {
    event_type: &'static str,
    from_version: u32,
    path: &'static [&'static str],
    default: JsonValue,
}

impl DefaultField {
    pub fn new(
        event_type: &'static str,
        from_version: u32,
        path: &'static [&'static str],
        default: JsonValue,
    ) -> Self {
        Self {
            event_type,
            from_version,
            path,
            default,
        }
    }
}

impl Upcaster for DefaultField {
    fn event_type(&self) -> &str {
        self.event_type
    }

    fn from_version(&self) -> u32 {
        self.from_version
    }

    fn upcast(&self, data: &mut serde_json::Map<String, JsonValue>) -> Result<(), String> {
        let Some((field, parents)) = self.path.split_last() else {
            return Err("empty field path".to_string());
        };

        let mut target = data;
        for parent in parents {
            target = target
                .get_mut(*parent)
                .and_then(JsonValue::as_object_mut)
                .ok_or_else(|| format!("missing object {parent}"))?;
        }

        let missing = matches!(target.get(*field), None | Some(JsonValue::Null));
        if missing {
            target.insert((*field).to_string(), self.default.clone());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn chain() -> UpcasterChain {
        UpcasterChain::new().with(DefaultField::new(
            "proportional_election.created",
            1,
            &["election", "mandate_algorithm"],
            json!("hagenbach_bischoff"),
        ))
    }

    #[test]
    fn fills_missing_field_and_bumps_version() {
        let mut payload = json!({
            "type": "ProportionalElectionCreated",
            "data": { "election": { "number_of_mandates": 5 } }
        });

        let version = chain()
            .upcast("proportional_election.created", 1, &mut payload)
            .unwrap();

        assert_eq!(version, 2);
        assert_eq!(
            payload["data"]["election"]["mandate_algorithm"],
            json!("hagenbach_bischoff")
        );
    }

    #[test]
    fn keeps_explicit_values() {
        let mut payload = json!({
            "type": "ProportionalElectionCreated",
            "data": { "election": { "mandate_algorithm": "double_proportional1_doi0_doi_quorum" } }
        });

        chain()
            .upcast("proportional_election.created", 1, &mut payload)
            .unwrap();

        assert_eq!(
            payload["data"]["election"]["mandate_algorithm"],
            json!("double_proportional1_doi0_doi_quorum")
        );
    }

    #[test]
    fn current_versions_pass_through() {
        let mut payload = json!({ "type": "X", "data": {} });
        let version = chain()
            .upcast("proportional_election.created", 2, &mut payload)
            .unwrap();
        assert_eq!(version, 2);
        assert_eq!(payload, json!({ "type": "X", "data": {} }));
    }

    #[test]
    fn malformed_payload_is_reported() {
        let mut payload = json!({ "type": "ProportionalElectionCreated" });
        let err = chain()
            .upcast("proportional_election.created", 1, &mut payload)
            .unwrap_err();
        assert!(matches!(err, UpcastError::Malformed { version: 1, .. }));
    }
}
