//! Vote domain module (event-sourced).
//!
//! A vote holds ordered ballots; each ballot carries its questions and, for
//! variant ballots, optional tie-break questions.

pub mod ballot;
pub mod upcast;
pub mod vote;

pub use ballot::{
    Ballot, BallotInput, BallotQuestion, BallotQuestionType, BallotSubType, BallotType,
    TieBreakQuestion,
};
pub use upcast::upcasters;
pub use vote::{
    BallotAfterTestingPhaseUpdated, BallotCreated, BallotDeleted, BallotUpdated, Vote,
    VoteActiveStateUpdated, VoteAfterTestingPhaseUpdated, VoteCreated, VoteData, VoteDeleted,
    VoteEVotingApprovalUpdated, VoteEvent, VoteInput, VoteResultAlgorithm, VoteResultEntry,
    VoteType, VoteUpdated,
};
