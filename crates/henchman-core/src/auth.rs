use crate::error::AuthError;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Opaque credential handed to the transport. Password and key auth are
/// mutually exclusive.
#[derive(Clone, PartialEq, Eq)]
pub enum AuthMethod {
    Password(String),
    PrivateKey(PathBuf),
}

impl fmt::Debug for AuthMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthMethod::Password(_) => f.write_str("Password(<redacted>)"),
            AuthMethod::PrivateKey(path) => f.debug_tuple("PrivateKey").field(path).finish(),
        }
    }
}

/// User plus credential: everything a target needs to log in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionConfig {
    pub user: String,
    pub auth: AuthMethod,
}

/// Source of the password in password mode.
pub trait SecretPrompt {
    fn read_secret(&self, prompt: &str) -> Result<String, AuthError>;
}

/// What the user asked for on the command line.
#[derive(Debug, Clone)]
pub struct AuthRequest {
    pub username: String,
    pub use_password: bool,
    pub keyfile: PathBuf,
}

/// Build the connection config. Password mode always wins; the key file is
/// not touched when it is requested.
pub fn select_auth(
    request: &AuthRequest,
    prompt: &dyn SecretPrompt,
) -> Result<ConnectionConfig, AuthError> {
    if request.username.trim().is_empty() {
        return Err(AuthError::MissingUser);
    }

    let auth = if request.use_password {
        let password = prompt.read_secret("Password:")?;
        if password.is_empty() {
            return Err(AuthError::EmptyPassword);
        }
        debug!("Using password authentication for {}", request.username);
        AuthMethod::Password(password)
    } else {
        load_private_key(&request.keyfile)?;
        debug!(
            "Using key authentication for {} ({})",
            request.username,
            request.keyfile.display()
        );
        AuthMethod::PrivateKey(request.keyfile.clone())
    };

    Ok(ConnectionConfig {
        user: request.username.clone(),
        auth,
    })
}

/// Read the key file and check it carries private key armor.
fn load_private_key(path: &Path) -> Result<(), AuthError> {
    let contents = std::fs::read_to_string(path).map_err(|source| AuthError::KeyUnreadable {
        path: path.to_path_buf(),
        source,
    })?;

    let armored = contents.lines().map(str::trim).any(|line| {
        line.starts_with("-----BEGIN ") && line.ends_with("PRIVATE KEY-----")
    });
    if !armored {
        return Err(AuthError::KeyInvalid(path.to_path_buf()));
    }
    Ok(())
}
