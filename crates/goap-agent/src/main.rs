//! # GOAP Agent
//!
//! Plans a scenario file and walks the resulting plan through the world.
//!
//! ```text
//! goap-agent <scenario.json>
//! ```

use anyhow::Context;
use goap_agent::Scenario;
use goap_planner::Planner;
use goap_state::{ChangeFilter, WorldStateProvider};
use tokio::sync::oneshot;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = FmtSubscriber::builder().with_env_filter(filter).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let path = std::env::args()
        .nth(1)
        .context("usage: goap-agent <scenario.json>")?;
    let scenario = Scenario::load(&path).await?;
    let (agent, world) = scenario.agent()?;
    info!(
        "Loaded {} with {} actions, catalog {}",
        path,
        scenario.actions.len(),
        agent.planner().catalog().fingerprint()
    );

    let (done_tx, done_rx) = oneshot::channel();
    let handle = agent.plan_with_notifier(scenario.goal.clone(), move || {
        let _ = done_tx.send(());
    });
    done_rx.await.context("planning task dropped its notifier")?;
    let plan = handle.await??;

    let stats = &plan.stats;
    println!(
        "Plan {} ({} steps, cost {}, {} iterations, {} expansions, {} ms)",
        plan.id,
        plan.len(),
        plan.total_cost(),
        stats.iterations,
        stats.expansions,
        stats.elapsed_ms
    );
    for (i, step) in plan.steps.iter().enumerate() {
        println!("  {}. {} (g={}, h={}, f={})", i + 1, step.action.name, step.g, step.h, step.f);
    }

    let start = world.current().await?;
    let simulated = plan.simulate(&start);
    println!("Simulated end state: {}", serde_json::to_string(&simulated)?);

    let mut changes = world.subscribe(ChangeFilter::ids(scenario.goal.iter().map(|(id, _)| id.clone())));
    for (action, _) in plan.iter() {
        world.apply_effects(&action.effects).await;
    }
    drop(world);
    drop(agent);
    while let Some(change) = changes.recv().await {
        info!("{} -> {:?} (world v{})", change.id, change.new_value, change.version);
    }

    Ok(())
}
