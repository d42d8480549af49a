use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use crate::application::retry::RetryPolicy;
use crate::domain::ports::{Critic, Drafter, Reviser};
use crate::domain::{
    Artifact, DomainError, RefineState, Refinement, RefinementStats, TaskContext,
};

pub const DEFAULT_MAX_ROUNDS: usize = 5;

/// Drives `draft → critique → (revise → critique)* → done`.
///
/// `max_rounds` bounds the number of critique calls in one run. When the
/// critic still objects on the last allowed round the run fails with
/// [`DomainError::NotConverged`], carrying the last artifact and critique.
/// Any role failure that survives the retry policy aborts the run.
///
/// The loop holds no per-run state, so a single instance can serve
/// concurrent runs.
pub struct RefinementLoop {
    drafter: Arc<dyn Drafter>,
    critic: Arc<dyn Critic>,
    reviser: Arc<dyn Reviser>,
    max_rounds: usize,
    retry: RetryPolicy,
}

impl RefinementLoop {
    pub fn new(
        drafter: Arc<dyn Drafter>,
        critic: Arc<dyn Critic>,
        reviser: Arc<dyn Reviser>,
    ) -> Self {
        Self {
            drafter,
            critic,
            reviser,
            max_rounds: DEFAULT_MAX_ROUNDS,
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_max_rounds(mut self, max_rounds: usize) -> Self {
        self.max_rounds = max_rounds.max(1);
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn max_rounds(&self) -> usize {
        self.max_rounds
    }

    pub async fn run(&self, context: &TaskContext) -> Result<Artifact, DomainError> {
        self.refine(context).await.map(|r| r.artifact)
    }

    #[instrument(skip(self, context), fields(max_rounds = self.max_rounds))]
    pub async fn refine(&self, context: &TaskContext) -> Result<Refinement, DomainError> {
        let mut stats = RefinementStats::default();
        let mut state = RefineState::Drafting;

        loop {
            debug!(state = state.name(), ?stats, "refinement step");

            state = match state {
                RefineState::Drafting => {
                    let artifact = self
                        .retry
                        .run("draft", move || self.drafter.draft(context))
                        .await?;
                    stats.drafts += 1;
                    RefineState::Critiquing(artifact)
                }
                RefineState::Critiquing(artifact) => {
                    let current = &artifact;
                    let verdict = self
                        .retry
                        .run("critique", move || self.critic.critique(context, current))
                        .await?;
                    stats.critiques += 1;

                    match verdict.critique {
                        None => RefineState::Done(verdict.artifact),
                        Some(critique) if stats.critiques >= self.max_rounds => {
                            warn!(rounds = stats.critiques, "critic did not accept within cap");
                            return Err(DomainError::NotConverged {
                                rounds: stats.critiques,
                                critique: critique.into_inner(),
                                artifact: verdict.artifact.into_inner(),
                            });
                        }
                        Some(critique) => RefineState::Revising(verdict.artifact, critique),
                    }
                }
                RefineState::Revising(artifact, critique) => {
                    let (current, feedback) = (&artifact, &critique);
                    let revised = self
                        .retry
                        .run("revise", move || {
                            self.reviser.revise(context, current, feedback)
                        })
                        .await?;
                    stats.revisions += 1;
                    RefineState::Critiquing(revised)
                }
                RefineState::Done(artifact) => {
                    info!(
                        critiques = stats.critiques,
                        revisions = stats.revisions,
                        "refinement accepted"
                    );
                    return Ok(Refinement { artifact, stats });
                }
            };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Verdict;
    use crate::testing::ScriptedRoles;

    fn controller(roles: &Arc<ScriptedRoles>, max_rounds: usize) -> RefinementLoop {
        RefinementLoop::new(roles.clone(), roles.clone(), roles.clone())
            .with_max_rounds(max_rounds)
            .with_retry(RetryPolicy::none())
    }

    fn haiku() -> TaskContext {
        TaskContext::new("write a haiku")
    }

    #[tokio::test]
    async fn test_accepted_first_draft_skips_revision() {
        let roles = Arc::new(ScriptedRoles::new().draft(Ok("A")));
        let refinement = controller(&roles, 5).refine(&haiku()).await.unwrap();

        assert_eq!(refinement.artifact.as_str(), "A");
        assert_eq!(roles.counts(), (1, 1, 0));
        assert_eq!(
            refinement.stats,
            RefinementStats {
                drafts: 1,
                critiques: 1,
                revisions: 0
            }
        );
    }

    #[tokio::test]
    async fn test_haiku_example() {
        let roles = Arc::new(
            ScriptedRoles::new()
                .draft(Ok("A"))
                .verdict(Ok(Verdict::reject("needs rhyme", "A")))
                .revision(Ok("B"))
                .verdict(Ok(Verdict::accept("B"))),
        );

        let artifact = controller(&roles, 5).run(&haiku()).await.unwrap();

        assert_eq!(artifact.as_str(), "B");
        assert_eq!(roles.counts(), (1, 2, 1));
        assert_eq!(*roles.seen_critiques.lock().unwrap(), vec!["needs rhyme"]);
    }

    #[tokio::test]
    async fn test_n_rounds_take_n_critiques_and_n_minus_one_revisions() {
        let n = 4;
        let mut roles = ScriptedRoles::new();
        for i in 1..n {
            roles = roles.verdict(Ok(Verdict::reject(format!("issue {i}"), "x")));
        }
        let roles = Arc::new(roles.verdict(Ok(Verdict::accept("final"))));

        let refinement = controller(&roles, 10).refine(&haiku()).await.unwrap();

        assert_eq!(refinement.artifact.as_str(), "final");
        assert_eq!(roles.counts(), (1, n, n - 1));
    }

    #[tokio::test]
    async fn test_critic_artifact_replaces_current() {
        let roles = Arc::new(
            ScriptedRoles::new()
                .draft(Ok("rough"))
                .verdict(Ok(Verdict::accept("polished by critic"))),
        );

        let artifact = controller(&roles, 3).run(&haiku()).await.unwrap();
        assert_eq!(artifact.as_str(), "polished by critic");
    }

    #[tokio::test]
    async fn test_empty_critique_still_triggers_revision() {
        let roles = Arc::new(
            ScriptedRoles::new()
                .draft(Ok("A"))
                .verdict(Ok(Verdict::reject("", "A")))
                .revision(Ok("B")),
        );

        let artifact = controller(&roles, 3).run(&haiku()).await.unwrap();

        assert_eq!(artifact.as_str(), "B");
        assert_eq!(roles.counts(), (1, 2, 1));
    }

    #[tokio::test]
    async fn test_never_satisfied_critic_hits_cap() {
        let roles = Arc::new(ScriptedRoles::new().draft(Ok("A")).reject_forever("more"));

        let err = controller(&roles, 3).run(&haiku()).await.unwrap_err();

        match err {
            DomainError::NotConverged {
                rounds,
                critique,
                artifact,
            } => {
                assert_eq!(rounds, 3);
                assert_eq!(critique, "more");
                assert_eq!(artifact, "A''");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(roles.counts(), (1, 3, 2));
    }

    #[tokio::test]
    async fn test_zero_cap_is_raised_to_one_round() {
        let roles = Arc::new(ScriptedRoles::new().reject_forever("no"));
        let err = controller(&roles, 0).run(&haiku()).await.unwrap_err();

        assert!(matches!(err, DomainError::NotConverged { rounds: 1, .. }));
        assert_eq!(roles.counts(), (1, 1, 0));
    }

    #[tokio::test]
    async fn test_role_failure_aborts_run() {
        let roles = Arc::new(
            ScriptedRoles::new()
                .draft(Ok("A"))
                .verdict(Ok(Verdict::reject("fix", "A")))
                .revision(Err(DomainError::validation("missing field `artifact`"))),
        );

        let err = controller(&roles, 5).run(&haiku()).await.unwrap_err();

        assert!(matches!(err, DomainError::Validation(_)));
        assert_eq!(roles.counts(), (1, 1, 1));
    }

    #[tokio::test]
    async fn test_transient_failures_are_retried() {
        let roles = Arc::new(
            ScriptedRoles::new()
                .draft(Err(DomainError::external("connection reset")))
                .draft(Ok("A")),
        );
        let controller = RefinementLoop::new(roles.clone(), roles.clone(), roles.clone())
            .with_retry(RetryPolicy::immediate(2));

        let artifact = controller.run(&haiku()).await.unwrap();

        assert_eq!(artifact.as_str(), "A");
        assert_eq!(roles.counts(), (2, 1, 0));
    }

    #[tokio::test]
    async fn test_concurrent_runs_are_isolated() {
        let roles = Arc::new(ScriptedRoles::new());
        let controller = controller(&roles, 2);
        let first = TaskContext::new("first");
        let second = TaskContext::new("second");

        let (a, b) = futures::future::join(controller.run(&first), controller.run(&second)).await;

        assert_eq!(a.unwrap().as_str(), "draft");
        assert_eq!(b.unwrap().as_str(), "draft");
        assert_eq!(roles.counts(), (2, 2, 0));
    }
}
