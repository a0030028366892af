use thiserror::Error;

/// Errors raised while building request contexts or loading configuration.
///
/// Resolution itself never fails: a missing identity is `None`.
#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("Invalid query string: {0}")]
    InvalidQuery(String),

    #[error("Invalid request body: {0}")]
    InvalidBody(String),

    #[error("Invalid path parameters: {0}")]
    InvalidPathParams(String),

    #[error("Failed to read request body: {0}")]
    BodyRead(String),

    #[error("Request body exceeds {limit} bytes")]
    BodyTooLarge { limit: usize },

    #[error("Invalid identity resolver configuration: {0}")]
    Config(#[from] Box<figment::Error>),
}

impl From<figment::Error> for IdentityError {
    fn from(err: figment::Error) -> Self {
        Self::Config(Box::new(err))
    }
}

#[cfg(feature = "axum-ext")]
impl axum::response::IntoResponse for IdentityError {
    fn into_response(self) -> axum::response::Response {
        use axum::http::StatusCode;
        use axum::response::Json;
        use serde_json::json;

        let status = match self {
            IdentityError::InvalidQuery(_)
            | IdentityError::InvalidBody(_)
            | IdentityError::InvalidPathParams(_)
            | IdentityError::BodyRead(_) => StatusCode::BAD_REQUEST,
            IdentityError::BodyTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            IdentityError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(json!({
            "error": self.to_string(),
            "status": status.as_u16(),
        }));

        (status, body).into_response()
    }
}

#[cfg(all(test, feature = "axum-ext"))]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use axum::response::IntoResponse;

    #[test]
    fn decoding_errors_map_to_bad_request() {
        let resp = IdentityError::InvalidQuery("bad".to_owned()).into_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let resp = IdentityError::InvalidBody("bad".to_owned()).into_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let resp = IdentityError::InvalidPathParams("bad".to_owned()).into_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn oversized_body_maps_to_payload_too_large() {
        let resp = IdentityError::BodyTooLarge { limit: 16 }.into_response();
        assert_eq!(resp.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[test]
    fn body_read_error_maps_to_bad_request() {
        let resp = IdentityError::BodyRead("connection reset".to_owned()).into_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }
}
