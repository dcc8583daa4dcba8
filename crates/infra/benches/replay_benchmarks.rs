use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};

use chrono::Utc;
use votebasis_contest::ContestState;
use votebasis_core::{
    Aggregate, CandidateId, CommandContext, ContestId, DomainOfInfluenceId, ExpectedVersion, ListId,
    ProportionalElectionId, Translations, TypedId, UserId,
};
use votebasis_infra::{CommandDispatcher, EventStore, InMemoryEventStore, UncommittedEvent};
use votebasis_political_business::{CandidatePerson, SexType};
use votebasis_proportional::{
    CandidateInput, ListInput, MandateAlgorithm, ProportionalElection, ProportionalElectionInput,
};

const MANDATES: u32 = 20;

fn ctx() -> CommandContext {
    CommandContext::at(UserId::new(), Utc::now())
}

fn election_input() -> ProportionalElectionInput {
    ProportionalElectionInput {
        contest_id: ContestId::new(),
        domain_of_influence_id: DomainOfInfluenceId::new(),
        political_business_number: "201".into(),
        official_description: Translations::new().with("de", "Kantonsratswahl"),
        short_description: Translations::new().with("de", "KR"),
        internal_description: String::new(),
        number_of_mandates: MANDATES,
        mandate_algorithm: MandateAlgorithm::HagenbachBischoff,
        ballot_bundle_size: 25,
        candidate_check_digit: false,
        enforce_empty_vote_count_for_counting_circles: false,
        enforce_candidate_check_digit_for_counting_circles: false,
        enforce_review_procedure_for_counting_circles: false,
    }
}

fn list_input(position: u32) -> ListInput {
    ListInput {
        position,
        order_number: format!("{position:02}"),
        description: Translations::new().with("de", format!("Liste {position}")),
        short_description: Translations::new().with("de", format!("L{position}")),
        blank_row_count: 0,
        party_id: None,
    }
}

fn candidate_input(list: u32, position: u32) -> CandidateInput {
    let name = format!("{list:02}.{position:02}");
    CandidateInput {
        number: format!("{position:02}"),
        position,
        accumulated: false,
        accumulated_position: 0,
        person: CandidatePerson {
            first_name: name.clone(),
            last_name: "Muster".into(),
            political_first_name: name,
            political_last_name: "Muster".into(),
            date_of_birth: None,
            sex: SexType::Undefined,
            occupation: Translations::default(),
            title: String::new(),
            incumbent: false,
            zip_code: "9000".into(),
            locality: "St. Gallen".into(),
            origin: String::new(),
        },
        party_id: None,
    }
}

/// Stores an election with `lists` full lists; returns its id.
fn seed(dispatcher: &CommandDispatcher<InMemoryEventStore>, lists: u32) -> ProportionalElectionId {
    let id = ProportionalElectionId::new();
    let testing = ContestState::TestingPhase;

    dispatcher
        .execute::<ProportionalElection, _, _>(id, |election| {
            election.create(election_input(), testing, false, &ctx())
        })
        .unwrap();

    for list in 1..=lists {
        let list_id = ListId::new();
        dispatcher
            .execute::<ProportionalElection, _, _>(id, |election| {
                election.create_list(list_id, list_input(list), testing, &ctx())?;
                for position in 1..=MANDATES {
                    election.create_candidate(
                        list_id,
                        CandidateId::new(),
                        candidate_input(list, position),
                        testing,
                        &ctx(),
                    )?;
                }
                Ok(())
            })
            .unwrap();
    }

    id
}

fn bench_replay(c: &mut Criterion) {
    let mut group = c.benchmark_group("proportional_election_replay");

    for lists in [1u32, 10, 30] {
        let dispatcher = CommandDispatcher::with_domain_upcasters(InMemoryEventStore::new());
        let id = seed(&dispatcher, lists);
        let events = dispatcher
            .store()
            .load_stream(id.aggregate_id())
            .unwrap()
            .len();

        group.throughput(Throughput::Elements(events as u64));
        group.bench_with_input(BenchmarkId::new("load", lists), &id, |b, &id| {
            b.iter(|| black_box(dispatcher.load::<ProportionalElection>(id).unwrap()));
        });
    }

    group.finish();
}

fn bench_command_latency(c: &mut Criterion) {
    let mut group = c.benchmark_group("command_latency");

    group.bench_function("update_list_with_history", |b| {
        let dispatcher = CommandDispatcher::with_domain_upcasters(InMemoryEventStore::new());
        let id = seed(&dispatcher, 10);
        let election = dispatcher.load::<ProportionalElection>(id).unwrap();
        let Some(list_id) = election.lists().first().map(|list| list.id) else {
            return;
        };

        let mut round = 0u32;
        b.iter(|| {
            round += 1;
            let mut input = list_input(1);
            input.description = Translations::new().with("de", format!("Liste {}", black_box(round)));
            dispatcher
                .execute::<ProportionalElection, _, _>(id, |election| {
                    election.update_list(list_id, input, ContestState::TestingPhase, &ctx())
                })
                .unwrap();
        });
    });

    group.finish();
}

fn bench_append_throughput(c: &mut Criterion) {
    let mut group = c.benchmark_group("event_append_throughput");

    for batch_size in [1usize, 10, 100] {
        group.throughput(Throughput::Elements(batch_size as u64));
        group.bench_with_input(
            BenchmarkId::new("batch_append", batch_size),
            &batch_size,
            |b, &size| {
                let store = InMemoryEventStore::new();
                let mut election = ProportionalElection::empty(ProportionalElectionId::new());
                election
                    .create(election_input(), ContestState::TestingPhase, false, &ctx())
                    .unwrap();
                let raised = election.take_pending();

                b.iter(|| {
                    let aggregate_id = ProportionalElectionId::new().aggregate_id();
                    let events: Vec<UncommittedEvent> = (0..size)
                        .map(|_| {
                            UncommittedEvent::from_raised(
                                aggregate_id,
                                ProportionalElection::AGGREGATE_TYPE,
                                uuid::Uuid::now_v7(),
                                &raised[0],
                            )
                            .unwrap()
                        })
                        .collect();

                    black_box(store.append(events, ExpectedVersion::Exact(0)).unwrap());
                });
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_replay, bench_command_latency, bench_append_throughput);
criterion_main!(benches);
