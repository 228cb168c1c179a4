use henchman_core::error::TaskExecutionError;
use henchman_core::runner::{export_prefix, shell_escape};
use henchman_core::{AuthMethod, ConnectionConfig, Host, Target, Task, TaskOutcome, TaskRunner, TaskVars};
use ssh2::{ExtendedData, Session};
use std::io::Read;
use std::net::TcpStream;
use tracing::{debug, info};

/// SSH runner: connects to the target host, runs the task's command through
/// `sh -c` with the plan vars exported, and maps the exit status.
///
/// libssh2 is blocking, so each run happens on tokio's blocking pool.
#[derive(Debug, Clone, Default)]
pub struct SshRunner;

impl SshRunner {
    pub fn new() -> Self {
        Self
    }
}

/// Result of one remote command. Stderr is merged into `output`.
struct RemoteOutput {
    output: String,
    exit_status: i32,
}

/// Establish an authenticated SSH session to `host`.
fn connect(host: &Host, config: &ConnectionConfig) -> Result<Session, TaskExecutionError> {
    debug!("Connecting to {}@{}", config.user, host);
    let tcp = TcpStream::connect((host.address.as_str(), host.port)).map_err(|e| {
        TaskExecutionError::SshConnection(format!("TCP connect to {}: {}", host, e))
    })?;

    let mut sess = Session::new()
        .map_err(|e| TaskExecutionError::SshConnection(format!("Session::new: {}", e)))?;
    sess.set_tcp_stream(tcp);
    sess.handshake()
        .map_err(|e| TaskExecutionError::SshConnection(format!("Handshake with {}: {}", host, e)))?;

    match &config.auth {
        AuthMethod::Password(password) => sess
            .userauth_password(&config.user, password)
            .map_err(|e| TaskExecutionError::SshConnection(format!("Password auth: {}", e)))?,
        AuthMethod::PrivateKey(path) => sess
            .userauth_pubkey_file(&config.user, None, path, None)
            .map_err(|e| TaskExecutionError::SshConnection(format!("Pubkey auth: {}", e)))?,
    }

    if !sess.authenticated() {
        return Err(TaskExecutionError::SshConnection("Authentication failed".into()));
    }

    info!("SSH connected to {}@{}", config.user, host);
    Ok(sess)
}

/// Decode command output, replacing invalid UTF-8 rather than failing.
fn decode_output(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).trim().to_string()
}

/// Execute a command on the remote host and collect its output.
///
/// Stderr is merged into the main stream, so a full stderr window can never
/// stall the read of stdout.
fn exec_remote(sess: &Session, cmd: &str) -> Result<RemoteOutput, TaskExecutionError> {
    debug!("Remote exec: {}", cmd);
    let mut channel = sess
        .channel_session()
        .map_err(|e| TaskExecutionError::SshCommand(format!("Channel: {}", e)))?;
    channel
        .handle_extended_data(ExtendedData::Merge)
        .map_err(|e| TaskExecutionError::SshCommand(format!("Merge stderr: {}", e)))?;
    channel
        .exec(cmd)
        .map_err(|e| TaskExecutionError::SshCommand(format!("Exec '{}': {}", cmd, e)))?;

    let mut raw = Vec::new();
    channel
        .read_to_end(&mut raw)
        .map_err(|e| TaskExecutionError::SshCommand(format!("Read output: {}", e)))?;

    channel
        .wait_close()
        .map_err(|e| TaskExecutionError::SshCommand(format!("Close channel: {}", e)))?;
    let exit_status = channel
        .exit_status()
        .map_err(|e| TaskExecutionError::SshCommand(format!("Exit status: {}", e)))?;

    Ok(RemoteOutput {
        output: decode_output(&raw),
        exit_status,
    })
}

/// The remote command line: vars exported, then the task's shell, under `sh -c`.
fn remote_command(task: &Task, vars: &TaskVars) -> String {
    format!("sh -c {}", shell_escape(&format!("{}{}", export_prefix(vars), task.shell)))
}

fn run_blocking(host: &Host, config: &ConnectionConfig, cmd: &str) -> TaskOutcome {
    let output = match connect(host, config).and_then(|sess| exec_remote(&sess, cmd)) {
        Ok(o) => o,
        Err(e) => return TaskOutcome::failed(e),
    };

    if !output.output.is_empty() {
        debug!("{} output: {}", host, output.output);
    }

    if output.exit_status == 0 {
        TaskOutcome::success()
    } else {
        TaskOutcome::failed(TaskExecutionError::NonZeroExit {
            code: output.exit_status,
            output: output.output,
        })
    }
}

#[async_trait::async_trait]
impl TaskRunner for SshRunner {
    fn kind(&self) -> &str {
        "ssh"
    }

    async fn run(&self, task: &Task, target: &Target, vars: &TaskVars) -> TaskOutcome {
        let (host, connection) = match target {
            Target::Remote { host, connection } => (host.clone(), connection.clone()),
            Target::Local => {
                return TaskOutcome::failed(TaskExecutionError::Process(
                    "SSH runner cannot run local actions".into(),
                ))
            }
        };

        let cmd = remote_command(task, vars);
        info!("Running task {} on {}", task.id, host);
        let joined =
            tokio::task::spawn_blocking(move || run_blocking(&host, &connection, &cmd)).await;

        joined.unwrap_or_else(|e| {
            TaskOutcome::failed(TaskExecutionError::Process(format!("SSH worker panicked: {}", e)))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use std::sync::Arc;

    #[test]
    fn wraps_command_with_exports() {
        let mut vars = TaskVars::new();
        vars.insert("env".into(), "prod".into());
        let cmd = remote_command(&Task::new("t", "echo $env"), &vars);
        assert_eq!(cmd, "sh -c 'export env='\\''prod'\\''; echo $env'");
    }

    #[test]
    fn decodes_invalid_utf8_lossily() {
        assert_eq!(decode_output(b"ok\n"), "ok");
        assert_eq!(decode_output(&[b'a', 0xff, b'b']), "a\u{FFFD}b");
        assert_eq!(decode_output(b""), "");
    }

    #[tokio::test]
    async fn local_target_is_rejected() {
        let outcome = SshRunner::new()
            .run(&Task::new("t", "true"), &Target::Local, &TaskVars::new())
            .await;
        assert!(outcome.status.is_failure());
    }

    #[tokio::test]
    async fn unreachable_host_is_failure() {
        // Port 1 on loopback refuses connections.
        let connection = Arc::new(ConnectionConfig {
            user: "deploy".into(),
            auth: AuthMethod::PrivateKey(PathBuf::from("/nonexistent/id_rsa")),
        });
        let target = Target::remote(Host::new("127.0.0.1", 1), connection);
        let outcome = SshRunner::new()
            .run(&Task::new("t", "true"), &target, &TaskVars::new())
            .await;
        assert!(outcome.status.is_failure());
        assert!(matches!(outcome.error, Some(TaskExecutionError::SshConnection(_))));
    }
}
