//! Time-driven contest transitions.
//!
//! The job owns no schedule; an outer timer calls `run_once` with the contests
//! to inspect. Each step is dispatched separately, so one contest may move
//! from testing phase to locked within a single run when both dates passed.

use uuid::Uuid;

use votebasis_contest::{Contest, Transition};
use votebasis_core::{Clock, CommandContext, ContestId, DomainResult, ErrorKind, TypedId, UserId};

use crate::command_dispatcher::{CommandDispatcher, DispatchError};
use crate::config::InfraConfig;
use crate::event_store::EventStore;

/// Counts of what a run did.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct LifecycleReport {
    pub testing_phases_ended: usize,
    pub locked: usize,
    pub archived: usize,
    pub failed: usize,
}

#[derive(Debug, Clone, Copy)]
enum Step {
    EndTestingPhase,
    SetPastLocked,
    Archive,
}

impl Step {
    const ALL: [Step; 3] = [Step::EndTestingPhase, Step::SetPastLocked, Step::Archive];

    fn name(self) -> &'static str {
        match self {
            Step::EndTestingPhase => "end_testing_phase",
            Step::SetPastLocked => "set_past_locked",
            Step::Archive => "archive",
        }
    }

    fn run(self, contest: &mut Contest, ctx: &CommandContext) -> DomainResult<Transition> {
        match self {
            Step::EndTestingPhase => contest.try_end_testing_phase(ctx),
            Step::SetPastLocked => contest.try_set_past_locked(ctx),
            Step::Archive => contest.try_archive(ctx),
        }
    }
}

pub struct ContestLifecycleJob<'a, S> {
    dispatcher: &'a CommandDispatcher<S>,
    batch_size: usize,
    actor: UserId,
}

impl<'a, S> ContestLifecycleJob<'a, S>
where
    S: EventStore,
{
    pub fn new(dispatcher: &'a CommandDispatcher<S>, config: &InfraConfig) -> Self {
        Self {
            dispatcher,
            batch_size: config.lifecycle_batch_size.max(1),
            actor: UserId::from_uuid(Uuid::nil()),
        }
    }

    /// Author recorded on the events the job raises.
    pub fn with_actor(mut self, actor: UserId) -> Self {
        self.actor = actor;
        self
    }

    /// Advance every contest in `ids` whose scheduled date passed.
    ///
    /// Contests that are not due, or not in a state the step applies to, are
    /// skipped. Other failures are logged and counted; they do not stop the run.
    pub fn run_once(&self, ids: &[ContestId], clock: &dyn Clock) -> LifecycleReport {
        let mut report = LifecycleReport::default();
        let ctx = CommandContext::new(self.actor, clock);

        for (batch, chunk) in ids.chunks(self.batch_size).enumerate() {
            let span = tracing::info_span!("contest_lifecycle", batch, contests = chunk.len());
            let _guard = span.enter();

            for &contest_id in chunk {
                for step in Step::ALL {
                    self.run_step(contest_id, step, &ctx, &mut report);
                }
            }
        }

        tracing::info!(
            testing_phases_ended = report.testing_phases_ended,
            locked = report.locked,
            archived = report.archived,
            failed = report.failed,
            "contest lifecycle run finished"
        );
        report
    }

    fn run_step(
        &self,
        contest_id: ContestId,
        step: Step,
        ctx: &CommandContext,
        report: &mut LifecycleReport,
    ) {
        let result = self
            .dispatcher
            .execute::<Contest, _, _>(contest_id, |contest| step.run(contest, ctx));

        match result {
            Ok(dispatched) => {
                if dispatched.outcome == Transition::Applied {
                    tracing::info!(contest_id = %contest_id, step = step.name(), "contest transitioned");
                    match step {
                        Step::EndTestingPhase => report.testing_phases_ended += 1,
                        Step::SetPastLocked => report.locked += 1,
                        Step::Archive => report.archived += 1,
                    }
                }
            }
            Err(err) if err.domain_kind() == Some(ErrorKind::StateGate) => {
                tracing::trace!(contest_id = %contest_id, step = step.name(), reason = %err, "skipped");
            }
            Err(err) => {
                report.failed += 1;
                log_failure(contest_id, step, &err);
            }
        }
    }
}

fn log_failure(contest_id: ContestId, step: Step, err: &DispatchError) {
    match err {
        DispatchError::Concurrency(_) => {
            tracing::warn!(contest_id = %contest_id, step = step.name(), error = %err, "concurrent modification, retry next run");
        }
        _ => {
            tracing::error!(contest_id = %contest_id, step = step.name(), error = %err, "contest transition failed");
        }
    }
}
