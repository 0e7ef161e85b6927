use crate::runtime::ValidationErrors;
use thiserror::Error as ThisError;

///
/// HandlerError
///
/// Everything a generated controller, gateway, or resolver can fail with.
///

#[derive(Debug, ThisError)]
pub enum HandlerError {
    #[error("authentication required")]
    Unauthorized,

    #[error("forbidden: {0}")]
    Forbidden(String),

    #[error(transparent)]
    Validation(#[from] ValidationErrors),

    #[error("invalid payload: {0}")]
    Decode(String),

    #[error("cannot encode response: {0}")]
    Encode(String),

    #[error("{0}")]
    Service(String),

    #[error("operation '{0}' is not implemented")]
    NotImplemented(&'static str),

    #[error("unknown operation '{0}'")]
    UnknownOperation(String),
}

impl HandlerError {
    /// HTTP status a transport should answer with.
    #[must_use]
    pub const fn status(&self) -> u16 {
        match self {
            Self::Unauthorized => 401,
            Self::Forbidden(_) => 403,
            Self::Validation(_) => 422,
            Self::Decode(_) => 400,
            Self::Encode(_) | Self::Service(_) => 500,
            Self::NotImplemented(_) => 501,
            Self::UnknownOperation(_) => 404,
        }
    }

    pub fn service(message: impl Into<String>) -> Self {
        Self::Service(message.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_errors_map_to_unprocessable() {
        let mut errors = ValidationErrors::new();
        errors.push("name", "must not be empty");

        let err = HandlerError::from(errors);
        assert_eq!(err.status(), 422);
        assert_eq!(err.to_string(), "name: must not be empty");
    }

    #[test]
    fn not_implemented_names_the_operation() {
        let err = HandlerError::NotImplemented("Groups.listGroups");
        assert_eq!(err.status(), 501);
        assert_eq!(err.to_string(), "operation 'Groups.listGroups' is not implemented");
    }
}
