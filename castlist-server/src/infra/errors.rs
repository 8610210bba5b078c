use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use castlist_core::{CatalogError, ErrorKind};
use castlist_model::PersonID;
use serde_json::{Value, json};
use std::fmt;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub kind: &'static str,
    pub message: String,
    pub user_message: Option<String>,
    pub ids: Option<Vec<PersonID>>,
    pub details: Option<String>,
}

impl AppError {
    pub fn new(
        status: StatusCode,
        kind: &'static str,
        message: impl Into<String>,
    ) -> Self {
        Self {
            status,
            kind,
            message: message.into(),
            user_message: None,
            ids: None,
            details: None,
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            ErrorKind::Internal.as_str(),
            message,
        )
    }

    /// Request-shape problems caught before the service is called.
    pub fn bad_request(message: impl Into<String>) -> Self {
        let message = message.into();
        Self {
            user_message: Some(message.clone()),
            ..Self::new(
                StatusCode::BAD_REQUEST,
                ErrorKind::InvalidArgument.as_str(),
                message,
            )
        }
    }

    fn body(&self) -> Value {
        let mut error = json!({
            "kind": self.kind,
            "message": self.message,
            "status": self.status.as_u16(),
        });
        if let Some(user_message) = &self.user_message {
            error["user_message"] = json!(user_message);
        }
        if let Some(ids) = &self.ids {
            error["ids"] = json!(ids);
        }
        if let Some(details) = &self.details {
            error["details"] = json!(details);
        }
        json!({ "error": error })
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for AppError {}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body())).into_response()
    }
}

fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::InvalidArgument | ErrorKind::InvalidImage => {
            StatusCode::BAD_REQUEST
        }
        ErrorKind::AlreadyExists => StatusCode::CONFLICT,
        ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl From<CatalogError> for AppError {
    fn from(err: CatalogError) -> Self {
        let kind = err.kind();
        let status = status_for(kind);
        if status.is_server_error() {
            tracing::error!(error = %err, "request failed");
        }

        let mut app = Self::new(status, kind.as_str(), err.to_string());
        app.user_message = err.user_message().map(str::to_owned);
        match err {
            CatalogError::AlreadyExists { ids, .. } => app.ids = Some(ids),
            CatalogError::InvalidImage { details } => app.details = Some(details),
            _ => {}
        }
        app
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        Self::internal(err.to_string())
    }
}
