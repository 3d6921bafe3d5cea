//! Request extractors that reject with the API's JSON error body.
//!
//! axum's own `Json`, `Query` and `Path` answer a bad request with a
//! plain-text 400, 415 or 422. Handlers use these wrappers instead, so a
//! malformed body, an unknown enum value or a non-numeric id becomes
//! `400 {"error": "..."}` like every other client error.

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{FromRequest, FromRequestParts};
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use crate::error::AppError;

/// JSON body extractor and response.
#[derive(Debug, Clone, Copy, Default, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct Json<T>(pub T);

impl<T: Serialize> IntoResponse for Json<T> {
    fn into_response(self) -> Response {
        axum::Json(self.0).into_response()
    }
}

/// Query string extractor.
#[derive(Debug, Clone, Copy, Default, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(AppError))]
pub struct Query<T>(pub T);

/// Path parameter extractor.
#[derive(Debug, Clone, Copy, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(AppError))]
pub struct Path<T>(pub T);

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    use axum::Router;
    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode, header};
    use axum::routing::post;
    use serde::Deserialize;
    use serde_json::Value;
    use tower::ServiceExt;

    #[derive(Debug, Deserialize)]
    struct Quantity {
        quantity: u32,
    }

    #[derive(Debug, Deserialize)]
    struct Listing {
        page: i64,
    }

    async fn echo(
        Path(id): Path<i32>,
        Query(list): Query<Listing>,
        Json(body): Json<Quantity>,
    ) -> Json<Value> {
        Json(serde_json::json!({ "id": id, "page": list.page, "quantity": body.quantity }))
    }

    fn router() -> Router {
        Router::new().route("/items/{id}", post(echo))
    }

    async fn send(uri: &str, content_type: Option<&str>, body: &str) -> (StatusCode, Value) {
        let mut builder = Request::builder().method("POST").uri(uri);
        if let Some(content_type) = content_type {
            builder = builder.header(header::CONTENT_TYPE, content_type);
        }
        let response = router()
            .oneshot(builder.body(Body::from(body.to_owned())).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_valid_request_passes_through() {
        let (status, body) =
            send("/items/4?page=2", Some("application/json"), r#"{"quantity":3}"#).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["quantity"], 3);
        assert_eq!(body["page"], 2);
    }

    #[tokio::test]
    async fn test_rejections_are_json_bad_requests() {
        let cases = [
            ("/items/4?page=1", Some("application/json"), r#"{"quantity":"#),
            ("/items/4?page=1", Some("application/json"), r#"{"quantity":-1}"#),
            ("/items/4?page=1", None, r#"{"quantity":1}"#),
            ("/items/4?page=first", Some("application/json"), r#"{"quantity":1}"#),
            ("/items/four?page=1", Some("application/json"), r#"{"quantity":1}"#),
        ];
        for (uri, content_type, body) in cases {
            let (status, json) = send(uri, content_type, body).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{uri} {body}");
            assert!(json["error"].is_string(), "{uri} {body}: {json}");
        }
    }
}
