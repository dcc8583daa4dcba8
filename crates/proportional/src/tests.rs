use chrono::Utc;

use votebasis_contest::ContestState;
use votebasis_core::{
    Aggregate, AggregateRoot, CandidateId, CommandContext, ContestId, DomainError,
    DomainOfInfluenceId, EntityPosition, ListId, ListUnionId, ProportionalElectionId,
    Translations, UserId,
};
use votebasis_political_business::{
    ApprovalOutcome, CandidatePerson, EVotingApproval, PoliticalBusiness, SexType,
};

use crate::*;

const TESTING: ContestState = ContestState::TestingPhase;

fn ctx() -> CommandContext {
    CommandContext::at(UserId::new(), Utc::now())
}

fn election_input(mandates: u32, algorithm: MandateAlgorithm) -> ProportionalElectionInput {
    ProportionalElectionInput {
        contest_id: ContestId::new(),
        domain_of_influence_id: DomainOfInfluenceId::new(),
        political_business_number: "201".into(),
        official_description: Translations::new().with("de", "Nationalratswahl"),
        short_description: Translations::new().with("de", "NR"),
        internal_description: String::new(),
        number_of_mandates: mandates,
        mandate_algorithm: algorithm,
        ballot_bundle_size: 25,
        candidate_check_digit: false,
        enforce_empty_vote_count_for_counting_circles: false,
        enforce_candidate_check_digit_for_counting_circles: false,
        enforce_review_procedure_for_counting_circles: false,
    }
}

fn created(mandates: u32) -> ProportionalElection {
    created_with(election_input(mandates, MandateAlgorithm::HagenbachBischoff), false)
}

fn created_with(input: ProportionalElectionInput, e_voting: bool) -> ProportionalElection {
    let mut election = ProportionalElection::empty(ProportionalElectionId::new());
    election.create(input, TESTING, e_voting, &ctx()).unwrap();
    election
}

fn list_input(position: u32, order_number: &str) -> ListInput {
    ListInput {
        position,
        order_number: order_number.into(),
        description: Translations::new().with("de", format!("Liste {order_number}")),
        short_description: Translations::new().with("de", order_number),
        blank_row_count: 0,
        party_id: None,
    }
}

fn with_lists(mandates: u32, count: u32) -> (ProportionalElection, Vec<ListId>) {
    let mut election = created(mandates);
    let ids: Vec<ListId> = (1..=count)
        .map(|position| {
            let id = ListId::new();
            election
                .create_list(id, list_input(position, &format!("0{position}")), TESTING, &ctx())
                .unwrap();
            id
        })
        .collect();
    (election, ids)
}

fn person(name: &str) -> CandidatePerson {
    CandidatePerson {
        first_name: name.into(),
        last_name: "Muster".into(),
        political_first_name: name.into(),
        political_last_name: "Muster".into(),
        date_of_birth: None,
        sex: SexType::Undefined,
        occupation: Translations::default(),
        title: String::new(),
        incumbent: false,
        zip_code: "9000".into(),
        locality: "St. Gallen".into(),
        origin: String::new(),
    }
}

fn candidate_input(number: &str, position: u32) -> CandidateInput {
    CandidateInput {
        number: number.into(),
        position,
        accumulated: false,
        accumulated_position: 0,
        person: person(number),
        party_id: None,
    }
}

fn accumulated_input(number: &str, position: u32) -> CandidateInput {
    CandidateInput {
        accumulated: true,
        accumulated_position: position + 1,
        ..candidate_input(number, position)
    }
}

fn add_candidate(
    election: &mut ProportionalElection,
    list_id: ListId,
    input: CandidateInput,
) -> CandidateId {
    let id = CandidateId::new();
    election
        .create_candidate(list_id, id, input, TESTING, &ctx())
        .unwrap();
    id
}

fn union_input(position: u32, root: Option<ListUnionId>) -> ListUnionInput {
    ListUnionInput {
        position,
        description: Translations::new().with("de", format!("Verbindung {position}")),
        root_list_union_id: root,
    }
}

fn add_union(
    election: &mut ProportionalElection,
    root: Option<ListUnionId>,
    list_ids: &[ListId],
) -> ListUnionId {
    let id = ListUnionId::new();
    let position = election.list_unions_in(root).len() as u32 + 1;
    election
        .create_list_union(id, union_input(position, root), TESTING, &ctx())
        .unwrap();
    election
        .update_list_union_entries(id, list_ids.to_vec(), TESTING, &ctx())
        .unwrap();
    id
}

fn positions(list: &List) -> Vec<(String, u32)> {
    list.candidates()
        .into_iter()
        .map(|c| (c.number.clone(), c.position))
        .collect()
}

#[test]
fn activation_requires_complete_lists() {
    let (mut election, lists) = with_lists(5, 1);
    let list_id = lists[0];
    let ids: Vec<CandidateId> = (1..=5)
        .map(|p| add_candidate(&mut election, list_id, candidate_input(&p.to_string(), p)))
        .collect();

    election.update_active_state(true, TESTING, &ctx()).unwrap();
    assert!(election.is_active());

    election
        .delete_candidate(list_id, ids[2], TESTING, &ctx())
        .unwrap();
    assert_eq!(
        positions(election.list(list_id).unwrap()),
        vec![
            ("1".to_string(), 1),
            ("2".to_string(), 2),
            ("4".to_string(), 3),
            ("5".to_string(), 4)
        ]
    );

    assert!(matches!(
        election.update_active_state(true, TESTING, &ctx()),
        Err(DomainError::Validation(_))
    ));
    election.update_active_state(false, TESTING, &ctx()).unwrap();
}

#[test]
fn election_without_lists_can_be_activated() {
    let mut election = created(3);
    election.update_active_state(true, TESTING, &ctx()).unwrap();
    assert!(election.is_active());
}

#[test]
fn blank_rows_count_towards_capacity() {
    let mut election = created(2);
    let list_id = ListId::new();
    let mut input = list_input(1, "01");
    input.blank_row_count = 1;
    election.create_list(list_id, input, TESTING, &ctx()).unwrap();

    add_candidate(&mut election, list_id, candidate_input("1", 1));
    assert!(matches!(
        election.create_candidate(list_id, CandidateId::new(), candidate_input("2", 2), TESTING, &ctx()),
        Err(DomainError::Validation(_))
    ));
    election.validate_lists_complete().unwrap();
}

#[test]
fn candidate_positions_must_follow_occupied_slots() {
    let (mut election, lists) = with_lists(5, 1);
    add_candidate(&mut election, lists[0], accumulated_input("1", 1));

    let err = election
        .create_candidate(lists[0], CandidateId::new(), candidate_input("2", 2), TESTING, &ctx())
        .unwrap_err();
    assert!(matches!(err, DomainError::Validation(_)));
    add_candidate(&mut election, lists[0], candidate_input("2", 3));
}

#[test]
fn candidate_numbers_are_unique_per_list() {
    let (mut election, lists) = with_lists(5, 2);
    add_candidate(&mut election, lists[0], candidate_input("1", 1));
    assert!(matches!(
        election.create_candidate(lists[0], CandidateId::new(), candidate_input("1", 2), TESTING, &ctx()),
        Err(DomainError::Validation(_))
    ));
    add_candidate(&mut election, lists[1], candidate_input("1", 1));
}

#[test]
fn dropping_an_accumulation_frees_its_slot() {
    let (mut election, lists) = with_lists(5, 1);
    let list_id = lists[0];
    let first = add_candidate(&mut election, list_id, accumulated_input("1", 1));
    let second = add_candidate(&mut election, list_id, candidate_input("2", 3));

    election
        .update_candidate(list_id, first, candidate_input("1", 1), TESTING, &ctx())
        .unwrap();

    let list = election.list(list_id).unwrap();
    assert_eq!(list.candidate(second).unwrap().position, 2);
    assert_eq!(list.candidate(first).unwrap().accumulated_position, 0);
    assert_eq!(list.slots(), vec![1, 2]);

    // Accumulating again takes the next free slot.
    let mut again = accumulated_input("1", 1);
    again.accumulated_position = 3;
    election
        .update_candidate(list_id, first, again, TESTING, &ctx())
        .unwrap();
    assert_eq!(election.list(list_id).unwrap().slots(), vec![1, 2, 3]);
}

#[test]
fn reorder_lists_accumulated_candidates_twice() {
    let (mut election, lists) = with_lists(5, 1);
    let list_id = lists[0];
    let first = add_candidate(&mut election, list_id, accumulated_input("1", 1));
    let second = add_candidate(&mut election, list_id, candidate_input("2", 3));

    let missing_slot = vec![EntityPosition::new(second, 1), EntityPosition::new(first, 2)];
    assert!(matches!(
        election.reorder_candidates(list_id, missing_slot, TESTING, &ctx()),
        Err(DomainError::Validation(_))
    ));

    let slots = vec![
        EntityPosition::new(second, 1),
        EntityPosition::new(first, 2),
        EntityPosition::new(first, 3),
    ];
    election
        .reorder_candidates(list_id, slots, TESTING, &ctx())
        .unwrap();
    let list = election.list(list_id).unwrap();
    assert_eq!(list.candidate(second).unwrap().position, 1);
    assert_eq!(list.candidate(first).unwrap().position, 2);
    assert_eq!(list.candidate(first).unwrap().accumulated_position, 3);
}

#[test]
fn deleting_a_list_renumbers_and_cleans_unions() {
    let (mut election, lists) = with_lists(5, 3);
    let (l1, l2, l3) = (lists[0], lists[1], lists[2]);

    let main_union = add_union(&mut election, None, &[l1, l2, l3]);
    election
        .update_list_union_main_list(main_union, Some(l1), TESTING, &ctx())
        .unwrap();
    let sub = add_union(&mut election, Some(main_union), &[l2, l3]);
    let other = add_union(&mut election, None, &[l2, l3]);
    assert_eq!(election.list_union(other).unwrap().position, 2);

    election.delete_list(l1, TESTING, &ctx()).unwrap();

    assert!(election.list_union(main_union).is_err());
    assert!(election.list_union(sub).is_err());
    assert_eq!(election.list_union(other).unwrap().position, 1);
    assert_eq!(election.list(l2).unwrap().position, 1);
    assert_eq!(election.list(l3).unwrap().position, 2);
}

#[test]
fn deleting_a_member_list_shrinks_unions() {
    let (mut election, lists) = with_lists(5, 3);
    let root = add_union(&mut election, None, &lists);
    let sub = add_union(&mut election, Some(root), &[lists[1], lists[2]]);

    election.delete_list(lists[2], TESTING, &ctx()).unwrap();

    assert_eq!(election.list_union(root).unwrap().list_ids, vec![lists[0], lists[1]]);
    assert_eq!(election.list_union(sub).unwrap().list_ids, vec![lists[1]]);
}

#[test]
fn sub_unions_stay_within_their_root() {
    let (mut election, lists) = with_lists(5, 3);
    let root = add_union(&mut election, None, &[lists[0], lists[1]]);

    let sub = ListUnionId::new();
    election
        .create_list_union(sub, union_input(1, Some(root)), TESTING, &ctx())
        .unwrap();
    assert!(matches!(
        election.update_list_union_entries(sub, vec![lists[1], lists[2]], TESTING, &ctx()),
        Err(DomainError::Validation(_))
    ));
    election
        .update_list_union_entries(sub, vec![lists[0], lists[1]], TESTING, &ctx())
        .unwrap();

    // No second level.
    assert!(matches!(
        election.create_list_union(ListUnionId::new(), union_input(1, Some(sub)), TESTING, &ctx()),
        Err(DomainError::Validation(_))
    ));

    // Narrowing the root may not leave a sub-union with a single list.
    assert!(matches!(
        election.update_list_union_entries(root, vec![lists[0], lists[2]], TESTING, &ctx()),
        Err(DomainError::Validation(_))
    ));
    assert_eq!(election.list_union(root).unwrap().list_ids, vec![lists[0], lists[1]]);
    assert_eq!(election.list_union(sub).unwrap().list_ids, vec![lists[0], lists[1]]);
}

#[test]
fn narrowing_a_root_union_prunes_its_sub_unions() {
    let (mut election, lists) = with_lists(5, 4);
    let root = add_union(&mut election, None, &lists[..3]);
    let sub = add_union(&mut election, Some(root), &lists[..3]);

    election
        .update_list_union_entries(root, vec![lists[0], lists[1], lists[3]], TESTING, &ctx())
        .unwrap();
    assert_eq!(election.list_union(sub).unwrap().list_ids, vec![lists[0], lists[1]]);

    assert!(matches!(
        election.update_list_union_entries(root, vec![lists[1], lists[3]], TESTING, &ctx()),
        Err(DomainError::Validation(_))
    ));
}

#[test]
fn union_entries_need_two_distinct_lists() {
    let (mut election, lists) = with_lists(5, 2);
    let union = ListUnionId::new();
    election
        .create_list_union(union, union_input(1, None), TESTING, &ctx())
        .unwrap();

    for entries in [vec![lists[0]], vec![lists[0], lists[0]], vec![lists[0], ListId::new()]] {
        assert!(matches!(
            election.update_list_union_entries(union, entries, TESTING, &ctx()),
            Err(DomainError::Validation(_))
        ));
    }
}

#[test]
fn main_list_must_be_a_member() {
    let (mut election, lists) = with_lists(5, 3);
    let union = add_union(&mut election, None, &[lists[0], lists[1]]);
    assert!(matches!(
        election.update_list_union_main_list(union, Some(lists[2]), TESTING, &ctx()),
        Err(DomainError::Validation(_))
    ));

    election
        .update_list_union_main_list(union, Some(lists[1]), TESTING, &ctx())
        .unwrap();
    election
        .update_list_union_entries(union, vec![lists[0], lists[2]], TESTING, &ctx())
        .unwrap();
    assert_eq!(election.list_union(union).unwrap().main_list_id, None);
}

#[test]
fn list_unions_require_hagenbach_bischoff() {
    let mut election = created_with(
        election_input(5, MandateAlgorithm::DoubleProportional1Doi0DoiQuorum),
        false,
    );
    assert!(matches!(
        election.create_list_union(ListUnionId::new(), union_input(1, None), TESTING, &ctx()),
        Err(DomainError::Validation(_))
    ));

    let (mut election, lists) = with_lists(5, 2);
    add_union(&mut election, None, &lists);
    let mut input = election_input(5, MandateAlgorithm::DoubleProportionalNDois5DoiOr3TotQuorum);
    input.contest_id = election.contest_id().unwrap();
    assert!(matches!(
        election.update_from(input, TESTING, &ctx()),
        Err(DomainError::Validation(_))
    ));
}

#[test]
fn deleting_a_union_moves_later_siblings_up() {
    let (mut election, lists) = with_lists(5, 2);
    let first = add_union(&mut election, None, &lists);
    let second = add_union(&mut election, None, &lists);
    let third = add_union(&mut election, None, &lists);
    election.take_pending();

    election.delete_list_union(first, TESTING, &ctx()).unwrap();

    assert_eq!(election.list_union(second).unwrap().position, 1);
    assert_eq!(election.list_union(third).unwrap().position, 2);
    let raised: Vec<&str> = election
        .pending_events()
        .iter()
        .map(|r| votebasis_events::Event::event_type(&r.event))
        .collect();
    assert_eq!(
        raised,
        vec![
            "proportional_election.list_union_deleted",
            "proportional_election.list_unions_reordered"
        ]
    );
}

#[test]
fn deleting_the_last_union_raises_no_reorder() {
    let (mut election, lists) = with_lists(5, 2);
    add_union(&mut election, None, &lists);
    let last = add_union(&mut election, None, &lists);
    election.take_pending();

    election.delete_list_union(last, TESTING, &ctx()).unwrap();
    assert_eq!(election.pending_events().len(), 1);
}

#[test]
fn reorder_list_unions_within_a_root() {
    let (mut election, lists) = with_lists(5, 2);
    let first = add_union(&mut election, None, &lists);
    let second = add_union(&mut election, None, &lists);

    assert!(matches!(
        election.reorder_list_unions(None, vec![EntityPosition::new(first, 1)], TESTING, &ctx()),
        Err(DomainError::Validation(_))
    ));
    election
        .reorder_list_unions(
            None,
            vec![EntityPosition::new(second, 1), EntityPosition::new(first, 2)],
            TESTING,
            &ctx(),
        )
        .unwrap();
    assert_eq!(election.list_union(second).unwrap().position, 1);
}

fn draft(id: Option<ListUnionId>, name: &str, list_ids: &[ListId]) -> SubListUnionDraft {
    SubListUnionDraft {
        id,
        description: Translations::new().with("de", name),
        list_ids: list_ids.to_vec(),
        main_list_id: None,
    }
}

#[test]
fn sub_union_sync_emits_only_differences() {
    let (mut election, lists) = with_lists(5, 3);
    let root = add_union(&mut election, None, &lists);
    election.take_pending();

    election
        .sync_sub_list_unions(
            root,
            vec![
                draft(None, "A", &[lists[0], lists[1]]),
                draft(None, "B", &[lists[1], lists[2]]),
            ],
            TESTING,
            &ctx(),
        )
        .unwrap();
    assert_eq!(election.take_pending().len(), 2);

    let subs: Vec<ListUnion> = election
        .list_unions_in(Some(root))
        .into_iter()
        .cloned()
        .collect();
    assert_eq!(subs.len(), 2);
    let same: Vec<SubListUnionDraft> = subs
        .iter()
        .map(|s| SubListUnionDraft {
            id: Some(s.id),
            description: s.description.clone(),
            list_ids: s.list_ids.clone(),
            main_list_id: s.main_list_id,
        })
        .collect();
    election
        .sync_sub_list_unions(root, same, TESTING, &ctx())
        .unwrap();
    assert!(election.pending_events().is_empty());

    // Keep B only; it moves to position 1.
    let b = subs[1].id;
    election
        .sync_sub_list_unions(root, vec![draft(Some(b), "B", &[lists[1], lists[2]])], TESTING, &ctx())
        .unwrap();
    let raised: Vec<&str> = election
        .pending_events()
        .iter()
        .map(|r| votebasis_events::Event::event_type(&r.event))
        .collect();
    assert_eq!(
        raised,
        vec![
            "proportional_election.list_union_deleted",
            "proportional_election.list_union_updated"
        ]
    );
    assert_eq!(election.list_union(b).unwrap().position, 1);
    assert_eq!(election.list_unions_in(Some(root)).len(), 1);
}

#[test]
fn sub_union_sync_rejects_foreign_unions() {
    let (mut election, lists) = with_lists(5, 2);
    let root = add_union(&mut election, None, &lists);
    let other_root = add_union(&mut election, None, &lists);

    assert!(matches!(
        election.sync_sub_list_unions(root, vec![draft(Some(other_root), "X", &lists)], TESTING, &ctx()),
        Err(DomainError::Validation(_))
    ));
}

#[test]
fn approved_election_is_frozen_until_reverted() {
    let mut election = created_with(election_input(5, MandateAlgorithm::HagenbachBischoff), true);
    assert_eq!(election.e_voting_approval(), EVotingApproval::Pending);

    election.approve_e_voting(TESTING, &ctx()).unwrap();
    assert!(matches!(
        election.approve_e_voting(TESTING, &ctx()),
        Err(DomainError::Conflict(_))
    ));
    assert_eq!(
        election.try_approve_e_voting(TESTING, &ctx()).unwrap(),
        ApprovalOutcome::Unchanged
    );
    assert!(matches!(
        election.create_list(ListId::new(), list_input(1, "01"), TESTING, &ctx()),
        Err(DomainError::EVotingApproved(_))
    ));

    election.revert_e_voting_approval(TESTING, &ctx()).unwrap();
    election
        .create_list(ListId::new(), list_input(1, "01"), TESTING, &ctx())
        .unwrap();
}

#[test]
fn e_voting_approval_needs_e_voting_contest() {
    let mut election = created(5);
    assert!(matches!(
        election.approve_e_voting(TESTING, &ctx()),
        Err(DomainError::EVotingNotSupported(_))
    ));
}

#[test]
fn structural_changes_are_gated_by_the_contest() {
    let (mut election, lists) = with_lists(5, 1);
    assert!(matches!(
        election.create_candidate(lists[0], CandidateId::new(), candidate_input("1", 1), ContestState::Active, &ctx()),
        Err(DomainError::TestingPhaseEnded)
    ));
    assert!(matches!(
        election.delete_list(lists[0], ContestState::PastLocked, &ctx()),
        Err(DomainError::ContestLocked)
    ));
}

#[test]
fn late_updates_accept_descriptions_only() {
    let (mut election, lists) = with_lists(5, 1);
    let list_id = lists[0];
    let candidate = add_candidate(&mut election, list_id, candidate_input("1", 1));

    let mut renumbered = list_input(1, "09");
    renumbered.description = Translations::new().with("de", "Neu");
    assert!(matches!(
        election.update_list_after_testing_phase_ended(list_id, renumbered, ContestState::Active, &ctx()),
        Err(DomainError::ModificationNotAllowed(_))
    ));

    let mut described = list_input(1, "01");
    described.description = Translations::new().with("de", "Neu");
    assert!(matches!(
        election.update_list_after_testing_phase_ended(list_id, described.clone(), TESTING, &ctx()),
        Err(DomainError::InvalidState(_))
    ));
    election
        .update_list_after_testing_phase_ended(list_id, described, ContestState::Active, &ctx())
        .unwrap();
    assert_eq!(
        election.list(list_id).unwrap().description.get("de"),
        Some("Neu")
    );

    let mut moved = candidate_input("1", 1);
    moved.person.locality = "Wil".into();
    election
        .update_candidate_after_testing_phase_ended(list_id, candidate, moved, ContestState::Active, &ctx())
        .unwrap();
    let mut renumbered = candidate_input("7", 1);
    renumbered.person.locality = "Wil".into();
    assert!(matches!(
        election.update_candidate_after_testing_phase_ended(list_id, candidate, renumbered, ContestState::Active, &ctx()),
        Err(DomainError::ModificationNotAllowed(_))
    ));
}

#[test]
fn check_digits_follow_order_numbers() {
    let mut input = election_input(5, MandateAlgorithm::HagenbachBischoff);
    input.candidate_check_digit = true;
    let mut election = created_with(input, false);

    assert!(matches!(
        election.create_list(ListId::new(), list_input(1, "A1"), TESTING, &ctx()),
        Err(DomainError::Validation(_))
    ));

    let list_id = ListId::new();
    election
        .create_list(list_id, list_input(1, "01"), TESTING, &ctx())
        .unwrap();
    let candidate = add_candidate(&mut election, list_id, candidate_input("01", 1));
    assert_eq!(
        election.list(list_id).unwrap().candidate(candidate).unwrap().check_digit,
        3
    );

    election
        .update_list(list_id, list_input(1, "03"), TESTING, &ctx())
        .unwrap();
    assert_eq!(
        election.list(list_id).unwrap().candidate(candidate).unwrap().check_digit,
        7
    );
}

fn populated() -> ProportionalElection {
    let (mut election, lists) = with_lists(4, 3);
    let a = add_candidate(&mut election, lists[0], accumulated_input("1", 1));
    add_candidate(&mut election, lists[0], candidate_input("2", 3));
    add_candidate(&mut election, lists[1], candidate_input("1", 1));
    election
        .update_candidate(lists[0], a, candidate_input("1", 1), TESTING, &ctx())
        .unwrap();
    let root = add_union(&mut election, None, &lists);
    add_union(&mut election, Some(root), &[lists[0], lists[1]]);
    add_union(&mut election, None, &[lists[1], lists[2]]);
    election
        .reorder_lists(
            vec![
                EntityPosition::new(lists[2], 1),
                EntityPosition::new(lists[0], 2),
                EntityPosition::new(lists[1], 3),
            ],
            TESTING,
            &ctx(),
        )
        .unwrap();
    election.delete_list(lists[0], TESTING, &ctx()).unwrap();
    election
}

#[test]
fn replay_rebuilds_identical_state() {
    let mut election = populated();
    let history: Vec<ProportionalElectionEvent> =
        election.take_pending().into_iter().map(|r| r.event).collect();

    let replayed = ProportionalElection::from_history(*election.id(), &history);
    assert_eq!(replayed, election);
}

#[test]
fn replay_from_stored_json_rebuilds_identical_state() {
    let mut election = populated();
    let stored: Vec<serde_json::Value> = election
        .take_pending()
        .into_iter()
        .map(|r| serde_json::to_value(&r.event).unwrap())
        .collect();

    let history: Vec<ProportionalElectionEvent> = stored
        .into_iter()
        .map(|json| serde_json::from_value(json).unwrap())
        .collect();
    let replayed = ProportionalElection::from_history(*election.id(), &history);
    assert_eq!(replayed, election);
}

mod proptest_tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Property: after any sequence of candidate mutations the slots of a list are 1..=n.
        #[test]
        fn candidate_slots_stay_continuous(ops in proptest::collection::vec((0u8..4, 0usize..8), 1..40)) {
            let (mut election, lists) = with_lists(8, 1);
            let list_id = lists[0];
            let mut next_number = 0u32;

            for (op, pick) in ops {
                let list = election.list(list_id).unwrap();
                let next = list.occupied_slots() + 1;
                let existing: Vec<Candidate> = list.candidates().into_iter().cloned().collect();
                next_number += 1;
                let number = next_number.to_string();

                let _ = match op {
                    0 => election.create_candidate(list_id, CandidateId::new(), candidate_input(&number, next), TESTING, &ctx()),
                    1 => election.create_candidate(list_id, CandidateId::new(), accumulated_input(&number, next), TESTING, &ctx()),
                    2 if !existing.is_empty() => {
                        let victim = &existing[pick % existing.len()];
                        election.delete_candidate(list_id, victim.id, TESTING, &ctx())
                    }
                    3 if !existing.is_empty() => {
                        let target = &existing[pick % existing.len()];
                        let input = CandidateInput {
                            number: target.number.clone(),
                            position: target.position,
                            accumulated: !target.accumulated,
                            accumulated_position: if target.accumulated { 0 } else { next },
                            person: target.person.clone(),
                            party_id: target.party_id,
                        };
                        election.update_candidate(list_id, target.id, input, TESTING, &ctx())
                    }
                    _ => Ok(()),
                };

                let list = election.list(list_id).unwrap();
                let expected: Vec<u32> = (1..=list.occupied_slots()).collect();
                prop_assert_eq!(list.slots(), expected);
                prop_assert!(list.occupied_slots() <= 8);
            }
        }
    }
}
