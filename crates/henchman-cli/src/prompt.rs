use henchman_core::{AuthError, SecretPrompt};

/// Reads the password from the terminal without echo.
pub struct TerminalPrompt;

impl SecretPrompt for TerminalPrompt {
    fn read_secret(&self, prompt: &str) -> Result<String, AuthError> {
        dialoguer::Password::new()
            .with_prompt(prompt.trim_end_matches(':'))
            .allow_empty_password(true)
            .interact()
            .map_err(|e| AuthError::Prompt(e.to_string()))
    }
}
