pub mod auth;
pub mod config;
pub mod error;
pub mod orchestrator;
pub mod plan;
pub mod report;
pub mod runner;
pub mod status;
pub mod target;
pub mod task;

pub use auth::{select_auth, AuthMethod, AuthRequest, ConnectionConfig, SecretPrompt};
pub use config::Config;
pub use error::{AuthError, ConfigError, PlanError, TaskExecutionError};
pub use orchestrator::FleetOrchestrator;
pub use plan::{parse_extra_args, Plan};
pub use report::Report;
pub use runner::TaskRunner;
pub use status::StatusRecord;
pub use target::{Host, Target};
pub use task::{Task, TaskId, TaskOutcome, TaskStatus, TaskVars};
