//! CLI subcommands.

pub mod parse;
pub mod receive;
pub mod received;

use inbound_receiving::config::ConfigError;
use inbound_receiving::{ErpError, ReceivingError};
use thiserror::Error;

/// Errors that end a CLI command.
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration could not be loaded.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The ERP client could not be built.
    #[error(transparent)]
    Erp(#[from] ErpError),

    /// A receiving operation failed.
    #[error(transparent)]
    Receiving(#[from] ReceivingError),

    /// The input is not an order/line code.
    #[error("Not an order/line code: {0}")]
    InvalidScan(String),

    /// Reading operator input failed.
    #[error("Input error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_names_variable() {
        let error = CliError::from(ConfigError::MissingEnvVar("ERP_BASE_URL".to_string()));
        assert_eq!(error.to_string(), "Missing environment variable: ERP_BASE_URL");
    }
}
