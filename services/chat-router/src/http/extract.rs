//! Extractors that wrap axum's `Json`/`Path`/`Query` so a deserialize
//! failure is routed through [`super::response::bad_request`] instead
//! of axum's default rejection response.
//!
//! Without this, a malformed body or query string never reaches
//! `Service`'s own validation — axum short-circuits the handler and
//! returns its own plain-text rejection (422 for `Json`, for example),
//! which violates the spec's `400 {"error": ...}` error contract
//! (§4.3/§7) for anything axum itself considers invalid, such as a
//! `POST /api/messages` body missing the required `timestamp` field.

use super::response::bad_request;
use axum::extract::{FromRequest, FromRequestParts, Request};
use axum::http::request::Parts;
use axum::response::Response;
use axum::{async_trait, Json as AxumJson};
use serde::de::DeserializeOwned;

pub struct Json<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for Json<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match AxumJson::<T>::from_request(req, state).await {
            Ok(AxumJson(value)) => Ok(Self(value)),
            Err(rejection) => Err(bad_request(rejection.to_string())),
        }
    }
}

pub struct Path<T>(pub T);

#[async_trait]
impl<T, S> FromRequestParts<S> for Path<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match axum::extract::Path::<T>::from_request_parts(parts, state).await {
            Ok(axum::extract::Path(value)) => Ok(Self(value)),
            Err(rejection) => Err(bad_request(rejection.to_string())),
        }
    }
}

pub struct Query<T>(pub T);

#[async_trait]
impl<T, S> FromRequestParts<S> for Query<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match axum::extract::Query::<T>::from_request_parts(parts, state).await {
            Ok(axum::extract::Query(value)) => Ok(Self(value)),
            Err(rejection) => Err(bad_request(rejection.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::StatusCode;
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    struct Payload {
        #[allow(dead_code)]
        timestamp: i64,
    }

    #[tokio::test]
    async fn json_rejection_becomes_bad_request_envelope() {
        let req = Request::builder()
            .method("POST")
            .uri("/")
            .header("content-type", "application/json")
            .body(Body::from("{}"))
            .unwrap();
        let err = Json::<Payload>::from_request(req, &()).await.unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        let body = to_bytes(err.into_body(), usize::MAX).await.unwrap();
        let parsed: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert!(parsed["error"].is_string());
    }
}
