//! Backend token management.

use std::io::Write;
use std::sync::Arc;

use cost_wallet::{SecretStorage, AUTH_TOKEN_KEY};

use crate::cli::TokenCommands;
use crate::error::CliError;
use crate::output::{Message, OutputFormat};

/// Token command executor.
pub struct TokenCommand {
    storage: Arc<dyn SecretStorage>,
}

impl TokenCommand {
    /// Create a token command over `storage`.
    #[must_use]
    pub fn new(storage: Arc<dyn SecretStorage>) -> Self {
        Self { storage }
    }

    /// Execute a token subcommand.
    ///
    /// # Errors
    ///
    /// Returns an error if the token is empty or storage fails.
    pub fn execute<W: Write>(
        &self,
        writer: &mut W,
        format: &OutputFormat,
        command: &TokenCommands,
    ) -> Result<(), CliError> {
        match command {
            TokenCommands::Set { value } => {
                let value = value.trim();
                if value.is_empty() {
                    return Err(CliError::InvalidArgument("token cannot be empty".into()));
                }
                self.storage.set(AUTH_TOKEN_KEY, value)?;
                format.write(writer, &Message::success("Token stored"))?;
            }
            TokenCommands::Clear => {
                let had_token = self.storage.get(AUTH_TOKEN_KEY)?.is_some();
                self.storage.delete(AUTH_TOKEN_KEY)?;
                let msg = if had_token {
                    Message::success("Token cleared")
                } else {
                    Message::info("No token stored")
                };
                format.write(writer, &msg)?;
            }
        }
        Ok(())
    }
}
