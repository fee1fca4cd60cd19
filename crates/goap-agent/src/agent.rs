//! Background planning for one agent.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use goap_core::{Action, GoapError, Plan, PlanStatus, PropositionSet, Result};
use goap_planner::Planner;
use goap_state::WorldStateProvider;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Single-shot "planning finished" signal.
///
/// Any `FnOnce() + Send + 'static` closure is a notifier, so a
/// `tokio::sync::oneshot::Sender` is used by wrapping it:
/// `move || { let _ = tx.send(()); }`.
pub trait CompletionNotifier: Send + 'static {
    /// Signal that the search finished.
    fn notify(self);
}

impl<F> CompletionNotifier for F
where
    F: FnOnce() + Send + 'static,
{
    fn notify(self) {
        self()
    }
}

/// Clears the in-flight flag when dropped.
struct InFlightGuard {
    flag: Arc<AtomicBool>,
}

impl InFlightGuard {
    fn acquire(flag: &Arc<AtomicBool>) -> Result<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| GoapError::PlanInFlight)?;
        Ok(Self {
            flag: Arc::clone(flag),
        })
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

/// Runs searches for one agent off the async runtime and keeps the last
/// completed plan around for the plan accessor.
///
/// Cloning is cheap and clones share the same plan, status and in-flight flag.
#[derive(Clone)]
pub struct PlanningAgent {
    id: Uuid,
    planner: Arc<dyn Planner>,
    world: Arc<dyn WorldStateProvider>,
    last_plan: Arc<RwLock<Plan>>,
    status: Arc<RwLock<PlanStatus>>,
    in_flight: Arc<AtomicBool>,
}

impl PlanningAgent {
    /// Create a new agent.
    pub fn new(planner: Arc<dyn Planner>, world: Arc<dyn WorldStateProvider>) -> Self {
        Self {
            id: Uuid::new_v4(),
            planner,
            world,
            last_plan: Arc::new(RwLock::new(Plan::new())),
            status: Arc::new(RwLock::new(PlanStatus::Idle)),
            in_flight: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Agent ID used in logs.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// The planner searches run on.
    pub fn planner(&self) -> &Arc<dyn Planner> {
        &self.planner
    }

    /// Plan from the current world to `goal`.
    ///
    /// At most one search runs per agent; a second call while one is running
    /// fails with [`GoapError::PlanInFlight`] and leaves the running search
    /// alone. On success the plan becomes the agent's last plan; on failure the
    /// last plan is cleared.
    ///
    /// The search and its bookkeeping run in their own task. Dropping the
    /// returned future (e.g. from `tokio::time::timeout`) stops waiting but
    /// leaves the agent busy until that search has finished and been recorded.
    pub async fn plan(&self, goal: PropositionSet) -> Result<Plan> {
        let guard = InFlightGuard::acquire(&self.in_flight)?;
        let agent = self.clone();

        tokio::spawn(async move {
            let result = agent.run(goal).await;
            drop(guard);
            result
        })
        .await
        .map_err(|e| GoapError::Internal(format!("planning task failed: {e}")))?
    }

    async fn run(&self, goal: PropositionSet) -> Result<Plan> {
        *self.status.write().await = PlanStatus::Planning;
        info!("Agent {} planning for {} goal propositions", self.id, goal.len());

        let result = self.search(goal).await;

        let mut last_plan = self.last_plan.write().await;
        match &result {
            Ok(plan) => {
                info!("Agent {} planned {} steps", self.id, plan.len());
                *last_plan = plan.clone();
                *self.status.write().await = PlanStatus::Complete;
            }
            Err(e) => {
                warn!("Agent {} planning failed: {}", self.id, e);
                last_plan.clear();
                *self.status.write().await = PlanStatus::Failed;
            }
        }

        result
    }

    /// Spawn [`plan`](Self::plan) in the background and fire `notifier` exactly
    /// once when it finishes, whether or not a plan was found.
    pub fn plan_with_notifier<N>(&self, goal: PropositionSet, notifier: N) -> JoinHandle<Result<Plan>>
    where
        N: CompletionNotifier,
    {
        let agent = self.clone();
        tokio::spawn(async move {
            let result = agent.plan(goal).await;
            debug!("Agent {} notifying completion", agent.id);
            notifier.notify();
            result
        })
    }

    /// Plan again only if the last plan no longer applies to the current world.
    pub async fn ensure_plan(&self, goal: PropositionSet) -> Result<Plan> {
        let plan = self.last_plan().await;
        if !plan.is_empty() {
            let start = self.world.current().await?;
            if self.planner.validate_plan(&plan, &start)?
                && plan.simulate(&start).meets_goal(&goal)
            {
                debug!("Agent {} keeps its {} step plan", self.id, plan.len());
                return Ok(plan);
            }
            info!("Agent {} plan is stale, replanning", self.id);
        }
        self.plan(goal).await
    }

    /// The most recently completed plan. Empty before the first success.
    pub async fn last_plan(&self) -> Plan {
        self.last_plan.read().await.clone()
    }

    /// The last plan as (action, resulting state) pairs.
    pub async fn plan_steps(&self) -> Vec<(Action, PropositionSet)> {
        self.last_plan
            .read()
            .await
            .iter()
            .map(|(action, state)| (action.clone(), state.clone()))
            .collect()
    }

    /// Status of the latest search.
    pub async fn status(&self) -> PlanStatus {
        *self.status.read().await
    }

    /// Whether a search is running, including one whose caller gave up on it.
    pub fn is_planning(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    async fn search(&self, goal: PropositionSet) -> Result<Plan> {
        let start = self.world.current().await?;
        let planner = Arc::clone(&self.planner);

        tokio::task::spawn_blocking(move || planner.find_plan(&start, &goal))
            .await
            .map_err(|e| GoapError::Internal(format!("planning task failed: {e}")))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use goap_core::ActionCatalog;
    use goap_planner::{IdaStarPlanner, PlannerConfig};
    use goap_state::InMemoryWorld;
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;
    use tokio::sync::oneshot;

    /// Sleeps on the blocking thread before searching.
    struct SlowPlanner {
        inner: IdaStarPlanner,
        delay: Duration,
    }

    impl Planner for SlowPlanner {
        fn find_plan(&self, start: &PropositionSet, goal: &PropositionSet) -> Result<Plan> {
            std::thread::sleep(self.delay);
            self.inner.find_plan(start, goal)
        }

        fn catalog(&self) -> &ActionCatalog {
            self.inner.catalog()
        }

        fn config(&self) -> &PlannerConfig {
            self.inner.config()
        }

        fn set_config(&mut self, config: PlannerConfig) {
            self.inner.set_config(config)
        }
    }

    fn campfire() -> ActionCatalog {
        ActionCatalog::new(vec![
            Action::builder("ChopWood")
                .cost(1)
                .effect("hasWood", true)
                .build()
                .unwrap(),
            Action::builder("BuildFire")
                .cost(1)
                .precondition("hasWood", true)
                .effect("hasFire", true)
                .build()
                .unwrap(),
        ])
    }

    fn agent_with(world: Arc<InMemoryWorld>) -> PlanningAgent {
        PlanningAgent::new(Arc::new(IdaStarPlanner::new(campfire())), world)
    }

    fn fire() -> PropositionSet {
        PropositionSet::new().with("hasFire", true)
    }

    #[tokio::test]
    async fn test_plan_stores_last_plan() {
        let agent = agent_with(Arc::new(InMemoryWorld::new()));
        assert!(agent.last_plan().await.is_empty());
        assert_eq!(agent.status().await, PlanStatus::Idle);

        let plan = agent.plan(fire()).await.unwrap();
        assert_eq!(plan.action_names(), ["ChopWood", "BuildFire"]);
        assert_eq!(agent.status().await, PlanStatus::Complete);
        assert_eq!(agent.last_plan().await.id, plan.id);

        let steps = agent.plan_steps().await;
        assert_eq!(steps.len(), 2);
        assert_eq!(steps[1].0.name, "BuildFire");
        assert_eq!(steps[1].1.get("hasFire"), Some(true));
        assert!(!agent.is_planning());
    }

    #[tokio::test]
    async fn test_failure_clears_last_plan() {
        let agent = agent_with(Arc::new(InMemoryWorld::new()));
        agent.plan(fire()).await.unwrap();

        let err = agent
            .plan(PropositionSet::new().with("hasShelter", true))
            .await
            .unwrap_err();
        assert!(err.is_no_plan());
        assert!(agent.last_plan().await.is_empty());
        assert_eq!(agent.status().await, PlanStatus::Failed);
    }

    #[tokio::test]
    async fn test_second_search_rejected_while_in_flight() {
        let agent = agent_with(Arc::new(InMemoryWorld::new()));

        let guard = InFlightGuard::acquire(&agent.in_flight).unwrap();
        assert!(agent.is_planning());
        let err = agent.plan(fire()).await.unwrap_err();
        assert_eq!(err, GoapError::PlanInFlight);
        assert!(err.is_recoverable());
        assert_eq!(agent.status().await, PlanStatus::Idle);

        drop(guard);
        assert!(agent.plan(fire()).await.is_ok());
    }

    #[tokio::test]
    async fn test_timed_out_caller_keeps_agent_consistent() {
        let planner = SlowPlanner {
            inner: IdaStarPlanner::new(campfire()),
            delay: Duration::from_millis(200),
        };
        let agent = PlanningAgent::new(Arc::new(planner), Arc::new(InMemoryWorld::new()));

        let waited = tokio::time::timeout(Duration::from_millis(20), agent.plan(fire())).await;
        assert!(waited.is_err());

        // The abandoned search still owns the agent.
        assert!(agent.is_planning());
        assert_eq!(agent.status().await, PlanStatus::Planning);
        assert_eq!(agent.plan(fire()).await.unwrap_err(), GoapError::PlanInFlight);

        while agent.is_planning() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(agent.status().await, PlanStatus::Complete);
        assert_eq!(agent.last_plan().await.action_names(), ["ChopWood", "BuildFire"]);
        assert!(agent.plan(fire()).await.is_ok());
    }

    #[tokio::test]
    async fn test_notifier_fires_once_on_success() {
        let agent = agent_with(Arc::new(InMemoryWorld::new()));
        let (tx, rx) = oneshot::channel();

        let handle = agent.plan_with_notifier(fire(), move || {
            let _ = tx.send(());
        });

        rx.await.unwrap();
        let plan = handle.await.unwrap().unwrap();
        assert_eq!(plan.len(), 2);
        assert_eq!(agent.last_plan().await.id, plan.id);
    }

    #[tokio::test]
    async fn test_notifier_fires_on_failure() {
        let agent = agent_with(Arc::new(InMemoryWorld::new()));
        let calls = Arc::new(AtomicUsize::new(0));

        let counter = Arc::clone(&calls);
        let handle = agent.plan_with_notifier(PropositionSet::new().with("hasShelter", true), move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        assert!(handle.await.unwrap().is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_plans_from_current_world() {
        let world = Arc::new(InMemoryWorld::new());
        world.set("hasWood", true).await;
        let agent = agent_with(Arc::clone(&world));

        let plan = agent.plan(fire()).await.unwrap();
        assert_eq!(plan.action_names(), ["BuildFire"]);

        world.set("hasFire", true).await;
        assert!(agent.plan(fire()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_ensure_plan_replans_when_stale() {
        let world = Arc::new(InMemoryWorld::new());
        world.set("hasWood", true).await;
        let agent = agent_with(Arc::clone(&world));

        let first = agent.ensure_plan(fire()).await.unwrap();
        let kept = agent.ensure_plan(fire()).await.unwrap();
        assert_eq!(first.id, kept.id);
        assert_eq!(first.action_names(), ["BuildFire"]);

        // BuildFire is no longer operable.
        world.remove("hasWood").await;
        let replanned = agent.ensure_plan(fire()).await.unwrap();
        assert_ne!(replanned.id, first.id);
        assert_eq!(replanned.action_names(), ["ChopWood", "BuildFire"]);
    }
}
