use henchman_core::{Target, Task, TaskOutcome, TaskRunner, TaskVars};
use henchman_local::LocalRunner;
use henchman_ssh::SshRunner;

/// Sends local actions to the local runner and everything else over SSH.
#[derive(Debug, Default)]
pub struct DispatchRunner {
    ssh: SshRunner,
    local: LocalRunner,
}

impl DispatchRunner {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl TaskRunner for DispatchRunner {
    fn kind(&self) -> &str {
        "dispatch"
    }

    async fn run(&self, task: &Task, target: &Target, vars: &TaskVars) -> TaskOutcome {
        match target {
            Target::Local => self.local.run(task, target, vars).await,
            Target::Remote { .. } => self.ssh.run(task, target, vars).await,
        }
    }
}
