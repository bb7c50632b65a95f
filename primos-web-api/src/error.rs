use crate::dto::{RESPONSE_BAD_REQUEST, RESPONSE_INTERNAL_ERROR, RESPONSE_UNAUTHORIZED};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("Already checked in today (UTC)")]
    AlreadyCheckedIn,

    #[error("{0}")]
    Unauthorized(String),

    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    #[error("Chain error: {0}")]
    Chain(String),

    #[error("Metadata error: {0}")]
    Metadata(String),
}

impl ApiError {
    pub fn code(&self) -> u16 {
        match self {
            ApiError::BadRequest(_) | ApiError::AlreadyCheckedIn => RESPONSE_BAD_REQUEST,
            ApiError::Unauthorized(_) => RESPONSE_UNAUTHORIZED,
            ApiError::Database(_) | ApiError::Chain(_) | ApiError::Metadata(_) => {
                RESPONSE_INTERNAL_ERROR
            }
        }
    }

    /// Message safe to hand back to the caller. Backend failures are logged
    /// and replaced by a generic text.
    pub fn public_message(&self) -> String {
        match self {
            ApiError::Database(_) => "System error. Please contact administrator!".to_owned(),
            ApiError::Chain(_) => "Error reading from the Ronin network".to_owned(),
            _ => self.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn database_errors_hide_details() {
        let error = ApiError::from(sea_orm::DbErr::Custom("password leaked".to_owned()));
        assert_eq!(error.code(), RESPONSE_INTERNAL_ERROR);
        assert!(!error.public_message().contains("password"));
    }

    #[test]
    fn already_checked_in_is_a_bad_request() {
        let error = ApiError::AlreadyCheckedIn;
        assert_eq!(error.code(), RESPONSE_BAD_REQUEST);
        assert_eq!(error.public_message(), "Already checked in today (UTC)");
    }
}
