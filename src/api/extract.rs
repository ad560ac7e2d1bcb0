//! Request Extractors
//!
//! Path and query extractors whose rejections use the JSON error body.

use axum::{
    async_trait,
    extract::{FromRequestParts, Path, Query},
    http::{request::Parts, Method, Uri},
};
use serde::de::DeserializeOwned;

use crate::error::StoreError;

/// `Path` that rejects with [`StoreError::BadRequest`].
#[derive(Debug)]
pub struct ApiPath<T>(pub T);

#[async_trait]
impl<T, S> FromRequestParts<S> for ApiPath<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = StoreError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(value) = Path::<T>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| StoreError::BadRequest(rejection.body_text()))?;
        Ok(Self(value))
    }
}

/// `Query` that rejects with [`StoreError::BadRequest`].
#[derive(Debug)]
pub struct ApiQuery<T>(pub T);

#[async_trait]
impl<T, S> FromRequestParts<S> for ApiQuery<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = StoreError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(value) = Query::<T>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| StoreError::BadRequest(rejection.body_text()))?;
        Ok(Self(value))
    }
}

// == Fallbacks ==

/// Router fallback for paths no route matches.
pub async fn route_not_found(uri: Uri) -> StoreError {
    StoreError::NotFound(format!(
        "The requested URL {} was not found on the server.",
        uri.path()
    ))
}

/// Fallback for known paths called with an unsupported method.
pub async fn method_not_allowed(method: Method, uri: Uri) -> StoreError {
    StoreError::MethodNotAllowed(format!(
        "The method {} is not allowed for the requested URL {}.",
        method,
        uri.path()
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    fn parts(uri: &str) -> Parts {
        Request::builder()
            .uri(uri)
            .body(())
            .unwrap()
            .into_parts()
            .0
    }

    #[tokio::test]
    async fn test_bad_query_is_bad_request() {
        let mut parts = parts("/items?page=abc");

        #[derive(Debug, serde::Deserialize)]
        struct Page {
            #[allow(dead_code)]
            page: u32,
        }

        let result = ApiQuery::<Page>::from_request_parts(&mut parts, &()).await;
        assert!(matches!(result, Err(StoreError::BadRequest(_))));
    }

    #[tokio::test]
    async fn test_fallback_errors() {
        let err = route_not_found(Uri::from_static("/nope")).await;
        assert!(matches!(err, StoreError::NotFound(ref msg) if msg.contains("/nope")));

        let err = method_not_allowed(Method::POST, Uri::from_static("/items/1")).await;
        assert!(matches!(err, StoreError::MethodNotAllowed(ref msg) if msg.contains("POST")));
    }
}
