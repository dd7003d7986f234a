//! CLI-level errors (wraps infrastructure errors)

use thiserror::Error;

use crate::application::ApplicationError;
use crate::domain::DomainError;
use crate::exitcode;
use crate::infrastructure::traits::StoreError;
use crate::infrastructure::InfraError;

/// CLI errors are the top-level error type.
/// These are what get displayed to the user.
#[derive(Error, Debug)]
pub enum CliError {
    #[error("{0}")]
    Infra(#[from] InfraError),

    #[error("invalid arguments: {0}")]
    InvalidArgs(String),

    #[error("{0}")]
    Usage(String),
}

impl From<ApplicationError> for CliError {
    fn from(e: ApplicationError) -> Self {
        CliError::Infra(InfraError::Application(e))
    }
}

/// Result type for CLI operations.
pub type CliResult<T> = Result<T, CliError>;

impl CliError {
    /// Get the appropriate exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::InvalidArgs(_) | CliError::Usage(_) => exitcode::USAGE,
            CliError::Infra(e) => match e {
                InfraError::Io { .. } => exitcode::IOERR,
                InfraError::Store { source, .. } => store_exit_code(source),
                InfraError::Application(app) => match app {
                    ApplicationError::Config { .. } => exitcode::CONFIG,
                    ApplicationError::OperationFailed { source, .. } => source
                        .downcast_ref::<StoreError>()
                        .map_or(exitcode::SOFTWARE, store_exit_code),
                    ApplicationError::Domain(d) => match d {
                        DomainError::NotFound { .. } => exitcode::NOINPUT,
                        DomainError::CircularReference { .. }
                        | DomainError::ScopeMismatch { .. }
                        | DomainError::HasChildren(_) => exitcode::DATAERR,
                        DomainError::ConstraintConflict { .. } => exitcode::SOFTWARE,
                    },
                },
            },
        }
    }
}

/// I/O failures of the store exit IOERR, anything else it reports SOFTWARE.
fn store_exit_code(e: &StoreError) -> i32 {
    match e {
        StoreError::Io { .. } => exitcode::IOERR,
        _ => exitcode::SOFTWARE,
    }
}
