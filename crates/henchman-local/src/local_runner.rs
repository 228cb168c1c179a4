use henchman_core::error::TaskExecutionError;
use henchman_core::{Target, Task, TaskOutcome, TaskRunner, TaskVars};
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, info};

/// Local runner: runs a task's shell command on this machine.
/// Used for the local pseudo-target.
#[derive(Debug, Clone)]
pub struct LocalRunner {
    shell: String,
}

impl LocalRunner {
    pub fn new() -> Self {
        Self { shell: "sh".into() }
    }

    /// Use a different shell binary (must accept `-c <command>`).
    pub fn with_shell(shell: impl Into<String>) -> Self {
        Self {
            shell: shell.into(),
        }
    }
}

impl Default for LocalRunner {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl TaskRunner for LocalRunner {
    fn kind(&self) -> &str {
        "local"
    }

    async fn run(&self, task: &Task, target: &Target, vars: &TaskVars) -> TaskOutcome {
        debug!("Local exec on {}: {}", target.address(), task.shell);

        let output = Command::new(&self.shell)
            .arg("-c")
            .arg(&task.shell)
            .envs(vars)
            .stdin(Stdio::null())
            .output()
            .await;

        let output = match output {
            Ok(o) => o,
            Err(e) => {
                return TaskOutcome::failed(TaskExecutionError::Process(format!(
                    "Failed to spawn {}: {}",
                    self.shell, e
                )))
            }
        };

        let stdout = String::from_utf8_lossy(&output.stdout);
        if !stdout.trim().is_empty() {
            debug!("Task {} stdout: {}", task.id, stdout.trim());
        }

        match output.status.code() {
            Some(0) => {
                info!("Task {} succeeded locally", task.id);
                TaskOutcome::success()
            }
            Some(code) => TaskOutcome::failed(TaskExecutionError::NonZeroExit {
                code,
                output: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            }),
            None => TaskOutcome::failed(TaskExecutionError::Process(format!(
                "Task {} terminated by signal",
                task.id
            ))),
        }
    }
}
