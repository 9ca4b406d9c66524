//! CLI-level errors (wraps application errors)

use thiserror::Error;

use crate::application::ApplicationError;

/// CLI errors are the top-level error type.
/// These are what get displayed to the user.
#[derive(Error, Debug)]
pub enum CliError {
    #[error("{0}")]
    Application(#[from] ApplicationError),

    #[error("invalid arguments: {0}")]
    InvalidArgs(String),

    #[error("{0} check(s) failed")]
    ChecksFailed(usize),

    #[error("cannot write {path}: {source}")]
    Write {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Result type for CLI operations.
pub type CliResult<T> = Result<T, CliError>;

impl CliError {
    /// Get the appropriate exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::InvalidArgs(_) => crate::exitcode::USAGE,
            CliError::ChecksFailed(_) => crate::exitcode::CHECKS_FAILED,
            CliError::Write { .. } => crate::exitcode::CANTCREAT,
            CliError::Application(e) => match e {
                ApplicationError::Config { .. } => crate::exitcode::CONFIG,
                ApplicationError::Fixture { .. } => crate::exitcode::DATAERR,
                ApplicationError::OperationFailed { .. } => crate::exitcode::NOINPUT,
                ApplicationError::Domain(_) => crate::exitcode::SOFTWARE,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn given_errors_when_mapping_exit_codes_then_follow_sysexits() {
        assert_eq!(CliError::ChecksFailed(2).exit_code(), crate::exitcode::CHECKS_FAILED);
        assert_eq!(
            CliError::InvalidArgs("x".into()).exit_code(),
            crate::exitcode::USAGE
        );
        let fixture = CliError::from(ApplicationError::Fixture {
            path: PathBuf::from("f.toml"),
            message: "bad".into(),
        });
        assert_eq!(fixture.exit_code(), crate::exitcode::DATAERR);
        assert_eq!(fixture.to_string(), "invalid fixture f.toml: bad");
    }
}
