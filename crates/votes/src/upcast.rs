//! Schema upgrades for stored vote events.

use serde_json::json;

use votebasis_events::{DefaultField, UpcasterChain};

/// Votes written before vote types existed all had their questions on one ballot.
pub fn upcasters() -> UpcasterChain {
    UpcasterChain::new()
        .with(DefaultField::new(
            "vote.created",
            1,
            &["vote", "vote_type"],
            json!("questions_on_single_ballot"),
        ))
        .with(DefaultField::new(
            "vote.updated",
            1,
            &["vote", "vote_type"],
            json!("questions_on_single_ballot"),
        ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{VoteEvent, VoteType};
    use serde_json::Value;

    #[test]
    fn v1_vote_created_gets_single_ballot_type() {
        let mut payload: Value = json!({
            "type": "VoteCreated",
            "data": {
                "vote": {
                    "id": "0190a5d2-0000-7000-8000-000000000001",
                    "contest_id": "0190a5d2-0000-7000-8000-000000000002",
                    "domain_of_influence_id": "0190a5d2-0000-7000-8000-000000000003",
                    "political_business_number": "1",
                    "official_description": { "de": "Vorlage" },
                    "short_description": { "de": "Vorlage" },
                    "internal_description": "",
                    "report_domain_of_influence_level": 1,
                    "result_algorithm": "popular_majority",
                    "result_entry": "final_results",
                    "enforce_result_entry_for_counting_circles": false
                },
                "e_voting_approval": "unsupported",
                "event_info": {
                    "occurred_at": "2030-01-01T00:00:00Z",
                    "author": "0190a5d2-0000-7000-8000-000000000004"
                }
            }
        });

        let version = upcasters().upcast("vote.created", 1, &mut payload).unwrap();
        assert_eq!(version, 2);

        let event: VoteEvent = serde_json::from_value(payload).unwrap();
        match event {
            VoteEvent::VoteCreated(created) => {
                assert_eq!(created.vote.vote_type, VoteType::QuestionsOnSingleBallot)
            }
            other => panic!("unexpected event {other:?}"),
        }
    }
}
