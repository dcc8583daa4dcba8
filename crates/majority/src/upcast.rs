//! Schema upgrades for stored majority election events.

use serde_json::json;

use votebasis_events::{DefaultField, UpcasterChain};

/// Elections stored before result entry was configurable entered final results.
pub fn upcasters() -> UpcasterChain {
    UpcasterChain::new()
        .with(DefaultField::new(
            "majority_election.created",
            1,
            &["election", "result_entry"],
            json!("final_results"),
        ))
        .with(DefaultField::new(
            "majority_election.updated",
            1,
            &["election", "result_entry"],
            json!("final_results"),
        ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{MajorityElectionEvent, MajorityElectionResultEntry};
    use serde_json::Value;

    #[test]
    fn v1_election_created_enters_final_results() {
        let mut payload: Value = json!({
            "type": "MajorityElectionCreated",
            "data": {
                "election": {
                    "id": "0190a5d2-0000-7000-8000-000000000001",
                    "contest_id": "0190a5d2-0000-7000-8000-000000000002",
                    "domain_of_influence_id": "0190a5d2-0000-7000-8000-000000000003",
                    "political_business_number": "301",
                    "official_description": { "de": "Regierungsratswahl" },
                    "short_description": { "de": "RR" },
                    "internal_description": "",
                    "number_of_mandates": 7,
                    "mandate_algorithm": "absolute_majority",
                    "ballot_bundle_size": 25,
                    "individual_candidates_disabled": false,
                    "enforce_empty_vote_count_for_counting_circles": false,
                    "enforce_result_entry_for_counting_circles": false
                },
                "e_voting_approval": "unsupported",
                "event_info": {
                    "occurred_at": "2030-01-01T00:00:00Z",
                    "author": "0190a5d2-0000-7000-8000-000000000004"
                }
            }
        });

        let version = upcasters()
            .upcast("majority_election.created", 1, &mut payload)
            .unwrap();
        assert_eq!(version, 2);

        let event: MajorityElectionEvent = serde_json::from_value(payload).unwrap();
        match event {
            MajorityElectionEvent::MajorityElectionCreated(created) => assert_eq!(
                created.election.result_entry,
                MajorityElectionResultEntry::FinalResults
            ),
            other => panic!("unexpected event {other:?}"),
        }
    }

    #[test]
    fn v2_payload_keeps_detailed_entry() {
        let mut payload = json!({
            "type": "MajorityElectionUpdated",
            "data": { "election": { "result_entry": "detailed" } }
        });
        let version = upcasters()
            .upcast("majority_election.updated", 2, &mut payload)
            .unwrap();
        assert_eq!(version, 2);
        assert_eq!(payload["data"]["election"]["result_entry"], "detailed");
    }
}
