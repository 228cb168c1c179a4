use crate::target::Target;
use crate::task::{Task, TaskOutcome, TaskVars};

/// Runs one task against one target. Every transport implements this.
///
/// A runner never fails outright: problems come back as a `failure` status
/// with the error attached, and the orchestrator decides what to do.
#[async_trait::async_trait]
pub trait TaskRunner: Send + Sync {
    /// Runner kind ("ssh", "local", ...), used in log lines.
    fn kind(&self) -> &str;

    async fn run(&self, task: &Task, target: &Target, vars: &TaskVars) -> TaskOutcome;
}

/// Quote a string for a POSIX shell.
pub fn shell_escape(s: &str) -> String {
    format!("'{}'", s.replace('\'', "'\\''"))
}

/// `export K='v'; ` prefix for every var, in a stable order.
pub fn export_prefix(vars: &TaskVars) -> String {
    let mut keys: Vec<_> = vars.keys().collect();
    keys.sort();
    keys.into_iter()
        .map(|k| format!("export {}={}; ", k, shell_escape(&vars[k])))
        .collect()
}
