use std::path::PathBuf;
use thiserror::Error;

/// Credential setup failed. Fatal to the whole run, raised before any worker starts.
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Couldn't get password: {0}")]
    Prompt(String),

    #[error("Empty password")]
    EmptyPassword,

    #[error("Missing username")]
    MissingUser,

    #[error("Couldn't read private key {path}: {source}")]
    KeyUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Not a private key: {0}")]
    KeyInvalid(PathBuf),
}

/// Error returned alongside a task status. Logged by the worker, never propagated.
#[derive(Error, Debug)]
pub enum TaskExecutionError {
    #[error("SSH connection failed: {0}")]
    SshConnection(String),

    #[error("SSH command failed: {0}")]
    SshCommand(String),

    #[error("Process error: {0}")]
    Process(String),

    #[error("Command exited with status {code}: {output}")]
    NonZeroExit { code: i32, output: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Error, Debug)]
pub enum PlanError {
    #[error("Error reading plan {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Couldn't parse plan: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Duplicate task id: {0}")]
    DuplicateTask(String),

    #[error("Duplicate host: {0}")]
    DuplicateHost(String),

    #[error("Task {0} has no shell command")]
    MissingCommand(String),

    #[error("Invalid host '{0}': expected address[:port]")]
    InvalidHost(String),

    #[error("Invalid variable name: {0}")]
    InvalidVarName(String),

    #[error("Variable {0} must be a string, number or boolean")]
    InvalidVarValue(String),

    #[error("Invalid extra argument '{0}': expected key=value")]
    InvalidExtraArg(String),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Couldn't parse config: {0}")]
    Yaml(#[from] serde_yaml::Error),
}
