use crate::auth::ConnectionConfig;
use crate::plan::Plan;
use crate::runner::TaskRunner;
use crate::target::{Host, Target};
use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

/// Runs a plan's full task list on every host at once.
///
/// Each host gets its own worker. Within a worker tasks run strictly in plan
/// order, and the first `failure` ends that host's run. Workers share nothing
/// but the plan's status record, so one host's failure never touches another.
pub struct FleetOrchestrator {
    runner: Arc<dyn TaskRunner>,
    connection: Arc<ConnectionConfig>,
}

impl FleetOrchestrator {
    pub fn new(runner: Arc<dyn TaskRunner>, connection: ConnectionConfig) -> Self {
        Self {
            runner,
            connection: Arc::new(connection),
        }
    }

    /// Returns once every worker has run out of tasks or stopped on a failure.
    pub async fn run(&self, plan: Arc<Plan>) {
        let mut workers = JoinSet::new();
        for host in &plan.hosts {
            let target = Target::remote(host.clone(), Arc::clone(&self.connection));
            workers.spawn(run_host(
                Arc::clone(&self.runner),
                Arc::clone(&plan),
                host.clone(),
                target,
            ));
        }

        while let Some(joined) = workers.join_next().await {
            if let Err(e) = joined {
                error!("Host worker aborted: {}", e);
            }
        }
        debug!("All {} host workers finished", plan.hosts.len());
    }
}

async fn run_host(runner: Arc<dyn TaskRunner>, plan: Arc<Plan>, host: Host, target: Target) {
    for task in &plan.tasks {
        let outcome = if task.local_action {
            info!(host = %host, task = %task.id, "Local action detected");
            runner.run(task, &Target::Local, &plan.vars).await
        } else {
            runner.run(task, &target, &plan.vars).await
        };

        plan.status().record_status(&host, &task.id, outcome.status);

        if let Some(e) = &outcome.error {
            warn!(host = %host, task = %task.id, runner = runner.kind(), "Error when executing task: {}", e);
        }
        if outcome.status.is_failure() {
            warn!(host = %host, task = %task.id, "Task was unsuccessful, skipping remaining tasks");
            break;
        }
        debug!(host = %host, task = %task.id, status = %outcome.status, "Task finished");
    }
}
