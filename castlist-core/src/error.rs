use castlist_model::{ModelError, PersonID};
use thiserror::Error;

/// Machine-readable classification of a [`CatalogError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    NotFound,
    InvalidArgument,
    AlreadyExists,
    InvalidImage,
    Internal,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::NotFound => "not_found",
            ErrorKind::InvalidArgument => "invalid_argument",
            ErrorKind::AlreadyExists => "already_exists",
            ErrorKind::InvalidImage => "invalid_image",
            ErrorKind::Internal => "internal",
        }
    }
}

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("invalid input data: {message}")]
    InvalidArgument {
        message: String,
        user_message: Option<String>,
    },

    #[error("already exists: {}", format_ids(.ids))]
    AlreadyExists {
        ids: Vec<PersonID>,
        user_message: String,
    },

    #[error("invalid image: {details}")]
    InvalidImage { details: String },

    #[error("internal error: {0}")]
    Internal(String),
}

impl CatalogError {
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        CatalogError::InvalidArgument {
            message: message.into(),
            user_message: None,
        }
    }

    /// Invalid argument whose message is meant to be shown to the caller.
    pub fn invalid_argument_for_user(message: impl Into<String>) -> Self {
        let message = message.into();
        CatalogError::InvalidArgument {
            user_message: Some(message.clone()),
            message,
        }
    }

    pub fn already_exists(ids: Vec<PersonID>) -> Self {
        let user_message = format!(
            "found persons with ids: {}. If this list does not contain the id of the \
             person you want to add, add more information about the person",
            format_ids(&ids)
        );
        CatalogError::AlreadyExists { ids, user_message }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            CatalogError::NotFound(_) => ErrorKind::NotFound,
            CatalogError::InvalidArgument { .. } => ErrorKind::InvalidArgument,
            CatalogError::AlreadyExists { .. } => ErrorKind::AlreadyExists,
            CatalogError::InvalidImage { .. } => ErrorKind::InvalidImage,
            CatalogError::Internal(_) => ErrorKind::Internal,
        }
    }

    /// Human-readable message intended for end users, when one exists.
    pub fn user_message(&self) -> Option<&str> {
        match self {
            CatalogError::InvalidArgument { user_message, .. } => {
                user_message.as_deref()
            }
            CatalogError::AlreadyExists { user_message, .. } => {
                Some(user_message.as_str())
            }
            CatalogError::InvalidImage { details } if !details.is_empty() => {
                Some(details.as_str())
            }
            _ => None,
        }
    }
}

impl From<ModelError> for CatalogError {
    fn from(err: ModelError) -> Self {
        CatalogError::invalid_argument(err.to_string())
    }
}

pub(crate) fn format_ids(ids: &[PersonID]) -> String {
    ids.iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(",")
}

pub type Result<T> = std::result::Result<T, CatalogError>;
