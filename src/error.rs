use crate::api::ClientError;
use crate::form::{FormError, SubmitError};

/// Exit code for bad local input (flags, files, form validation).
pub const EXIT_INPUT: u8 = 2;
/// Exit code for a failure status returned by the API.
pub const EXIT_API_STATUS: u8 = 3;
/// Exit code for connection failures and malformed responses.
pub const EXIT_REMOTE: u8 = 4;

#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    pub fn input(message: impl Into<String>) -> Self {
        Self::new(EXIT_INPUT, message)
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}

impl From<ClientError> for AppError {
    fn from(err: ClientError) -> Self {
        let exit_code = match &err {
            ClientError::Status { .. } => EXIT_API_STATUS,
            ClientError::Request(_) => EXIT_INPUT,
            ClientError::Connection(_) | ClientError::Malformed(_) => EXIT_REMOTE,
        };
        Self::new(exit_code, crate::report::format_client_error(&err))
    }
}

impl From<FormError> for AppError {
    fn from(err: FormError) -> Self {
        Self::input(err.to_string())
    }
}

impl From<SubmitError> for AppError {
    fn from(err: SubmitError) -> Self {
        match err {
            SubmitError::Form(e) => e.into(),
            SubmitError::Client(e) => e.into(),
        }
    }
}
