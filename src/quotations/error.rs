use axum::{response::IntoResponse, Json};
use tracing::error;

#[derive(Debug, thiserror::Error)]
pub enum QuotationsError {
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Database error: {0}")]
    Database(String),
}

impl From<diesel::result::Error> for QuotationsError {
    fn from(err: diesel::result::Error) -> Self {
        match err {
            diesel::result::Error::NotFound => Self::NotFound("Record not found".to_string()),
            other => Self::Database(other.to_string()),
        }
    }
}

impl From<diesel::r2d2::PoolError> for QuotationsError {
    fn from(err: diesel::r2d2::PoolError) -> Self {
        Self::Database(err.to_string())
    }
}

impl IntoResponse for QuotationsError {
    fn into_response(self) -> axum::response::Response {
        use axum::http::StatusCode;
        let (status, message) = match &self {
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            Self::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            Self::Conflict(msg) => (StatusCode::CONFLICT, msg.clone()),
            Self::Database(msg) => {
                error!(error = %msg, "quotation store failure");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal storage error".to_string(),
                )
            }
        };
        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use axum::response::IntoResponse;

    #[test]
    fn status_mapping_follows_taxonomy() {
        let cases = [
            (QuotationsError::Validation("q".into()), StatusCode::BAD_REQUEST),
            (QuotationsError::NotFound("q".into()), StatusCode::NOT_FOUND),
            (QuotationsError::Conflict("q".into()), StatusCode::CONFLICT),
            (
                QuotationsError::Database("q".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, expected) in cases {
            assert_eq!(err.into_response().status(), expected);
        }
    }

    #[test]
    fn diesel_not_found_maps_to_not_found() {
        let err: QuotationsError = diesel::result::Error::NotFound.into();
        assert!(matches!(err, QuotationsError::NotFound(_)));
    }
}
