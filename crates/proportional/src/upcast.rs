//! Schema upgrades for stored proportional election events.

use serde_json::json;

use votebasis_events::{DefaultField, UpcasterChain};

/// Elections stored before the mandate algorithm was configurable used Hagenbach-Bischoff.
pub fn upcasters() -> UpcasterChain {
    UpcasterChain::new()
        .with(DefaultField::new(
            "proportional_election.created",
            1,
            &["election", "mandate_algorithm"],
            json!("hagenbach_bischoff"),
        ))
        .with(DefaultField::new(
            "proportional_election.updated",
            1,
            &["election", "mandate_algorithm"],
            json!("hagenbach_bischoff"),
        ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{MandateAlgorithm, ProportionalElectionEvent};
    use serde_json::Value;

    #[test]
    fn v1_election_updated_defaults_to_hagenbach_bischoff() {
        let mut payload: Value = json!({
            "type": "ProportionalElectionUpdated",
            "data": {
                "election": {
                    "id": "0190a5d2-0000-7000-8000-000000000001",
                    "contest_id": "0190a5d2-0000-7000-8000-000000000002",
                    "domain_of_influence_id": "0190a5d2-0000-7000-8000-000000000003",
                    "political_business_number": "201",
                    "official_description": { "de": "Nationalratswahl" },
                    "short_description": { "de": "NR" },
                    "internal_description": "",
                    "number_of_mandates": 5,
                    "ballot_bundle_size": 25,
                    "candidate_check_digit": false,
                    "enforce_empty_vote_count_for_counting_circles": false,
                    "enforce_candidate_check_digit_for_counting_circles": false,
                    "enforce_review_procedure_for_counting_circles": false
                },
                "event_info": {
                    "occurred_at": "2030-01-01T00:00:00Z",
                    "author": "0190a5d2-0000-7000-8000-000000000004"
                }
            }
        });

        let version = upcasters()
            .upcast("proportional_election.updated", 1, &mut payload)
            .unwrap();
        assert_eq!(version, 2);

        let event: ProportionalElectionEvent = serde_json::from_value(payload).unwrap();
        match event {
            ProportionalElectionEvent::ProportionalElectionUpdated(updated) => assert_eq!(
                updated.election.mandate_algorithm,
                MandateAlgorithm::HagenbachBischoff
            ),
            other => panic!("unexpected event {other:?}"),
        }
    }

    #[test]
    fn current_events_pass_through() {
        let mut payload = json!({ "type": "ListDeleted", "data": {} });
        let before = payload.clone();
        let version = upcasters()
            .upcast("proportional_election.list_deleted", 1, &mut payload)
            .unwrap();
        assert_eq!(version, 1);
        assert_eq!(payload, before);
    }
}
