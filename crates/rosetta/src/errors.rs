//! Error handling and exit codes.

use rosetta_core::exit_codes;
use rosetta_core::RegistryError;
use rosetta_orchestration::DispatchRejection;

/// Top-level application errors.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error("cannot start optimization: {0}")]
    Rejected(#[from] DispatchRejection),

    #[error("every provider failed")]
    AllFailed,

    #[error("interrupted")]
    Interrupted,
}

/// Map an application error to the process exit code.
pub fn exit_code(err: &anyhow::Error) -> i32 {
    match err.downcast_ref::<AppError>() {
        Some(AppError::Config(_) | AppError::Rejected(_)) => exit_codes::ERROR_CONFIG,
        Some(AppError::Registry(_)) => exit_codes::ERROR_REGISTRY,
        Some(AppError::AllFailed) => exit_codes::ERROR_ALL_FAILED,
        Some(AppError::Interrupted) => exit_codes::ERROR_CANCELED,
        None if err.downcast_ref::<RegistryError>().is_some() => exit_codes::ERROR_REGISTRY,
        None => exit_codes::ERROR_GENERIC,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_codes() {
        assert_eq!(exit_code(&AppError::Config("bad".into()).into()), 4);
        assert_eq!(
            exit_code(&AppError::Rejected(DispatchRejection::EmptyPrompt).into()),
            4
        );
        assert_eq!(
            exit_code(&AppError::Registry(RegistryError::Unavailable("down".into())).into()),
            2
        );
        assert_eq!(exit_code(&AppError::AllFailed.into()), 3);
        assert_eq!(exit_code(&AppError::Interrupted.into()), 130);
        assert_eq!(exit_code(&anyhow::anyhow!("disk full")), 1);
        assert_eq!(
            exit_code(&RegistryError::Unavailable("down".into()).into()),
            2
        );
    }

    #[test]
    fn messages() {
        assert_eq!(
            AppError::Rejected(DispatchRejection::EmptySelection).to_string(),
            "cannot start optimization: no providers selected"
        );
        assert_eq!(
            AppError::Registry(RegistryError::Unavailable("down".into())).to_string(),
            "provider source unavailable: down"
        );
    }
}
