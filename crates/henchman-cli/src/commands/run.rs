use crate::dispatch::DispatchRunner;
use crate::prompt::TerminalPrompt;
use anyhow::Context;
use henchman_core::config::{Config, Defaults};
use henchman_core::{parse_extra_args, select_auth, AuthRequest, FleetOrchestrator, Plan, Report};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

pub struct RunOptions {
    pub plan: PathBuf,
    pub user: Option<String>,
    pub password: bool,
    pub no_password: bool,
    pub private_keyfile: Option<PathBuf>,
    pub port: Option<u16>,
    pub extra_args: String,
    pub json: bool,
}

/// Run the plan on every host and print the report.
/// Returns true if any host stopped on a failure.
pub async fn run(config: &Config, opts: RunOptions) -> anyhow::Result<bool> {
    let fallback_user = std::env::var("USER").ok().or_else(os_user);
    let request = auth_request(&opts, &config.defaults, fallback_user);
    let connection = select_auth(&request, &TerminalPrompt).context("SSH auth prep failed")?;

    let extra_vars = parse_extra_args(&opts.extra_args)?;
    let port = opts.port.unwrap_or(config.defaults.port);
    let plan = Plan::load(&opts.plan, &extra_vars, port)
        .with_context(|| format!("Couldn't read the plan {}", opts.plan.display()))?;

    info!(
        "Running {} task(s) on {} host(s) as {}",
        plan.tasks.len(),
        plan.hosts.len(),
        connection.user
    );

    let started_at = chrono::Utc::now();
    let plan = Arc::new(plan);
    FleetOrchestrator::new(Arc::new(DispatchRunner::new()), connection)
        .run(Arc::clone(&plan))
        .await;

    let report = Report::from_plan(&plan, started_at);
    if opts.json {
        println!("{}", serde_json::to_string_pretty(&report.to_json())?);
    } else {
        print!("{}", report.render());
    }

    Ok(report.any_failed())
}

/// Name of the user this process runs as, from the password database.
#[cfg(unix)]
fn os_user() -> Option<String> {
    use nix::unistd::{getuid, User};
    User::from_uid(getuid()).ok().flatten().map(|u| u.name)
}

#[cfg(not(unix))]
fn os_user() -> Option<String> {
    None
}

/// Flags win over the config file; the user falls back to `fallback_user`
/// (`$USER`, then the OS user).
fn auth_request(
    opts: &RunOptions,
    defaults: &Defaults,
    fallback_user: Option<String>,
) -> AuthRequest {
    AuthRequest {
        username: opts
            .user
            .clone()
            .or_else(|| defaults.user.clone())
            .or(fallback_user)
            .unwrap_or_default(),
        use_password: !opts.no_password && (opts.password || defaults.password),
        keyfile: opts
            .private_keyfile
            .clone()
            .unwrap_or_else(|| defaults.keyfile()),
    }
}
