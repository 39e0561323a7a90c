//! Axum extractors shared by every route

use crate::core::error::{DashError, RequestError};
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use uuid::Uuid;

/// Header carrying the calling user's id
pub const USER_ID_HEADER: &str = "x-user-id";

/// The user a request acts for, read from `X-User-Id`.
///
/// Absent header means an unscoped request. A present but malformed header
/// is rejected.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Actor(pub Option<Uuid>);

impl Actor {
    pub fn id(&self) -> Option<Uuid> {
        self.0
    }
}

impl<S> FromRequestParts<S> for Actor
where
    S: Send + Sync,
{
    type Rejection = DashError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let Some(raw) = parts.headers.get(USER_ID_HEADER) else {
            return Ok(Actor(None));
        };

        let id = raw
            .to_str()
            .ok()
            .and_then(|s| Uuid::parse_str(s.trim()).ok())
            .ok_or_else(|| RequestError::InvalidHeader {
                header: "X-User-Id".to_string(),
            })?;

        Ok(Actor(Some(id)))
    }
}

/// Parse a path segment as a record id
pub fn parse_id(raw: &str) -> Result<Uuid, DashError> {
    Uuid::parse_str(raw).map_err(|_| {
        RequestError::InvalidEntityId {
            id: raw.to_string(),
        }
        .into()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    async fn extract(header: Option<&str>) -> Result<Actor, DashError> {
        let mut builder = Request::builder().uri("/deals");
        if let Some(value) = header {
            builder = builder.header("X-User-Id", value);
        }
        let (mut parts, _) = builder.body(()).unwrap().into_parts();
        Actor::from_request_parts(&mut parts, &()).await
    }

    #[tokio::test]
    async fn test_missing_header_is_unscoped() {
        assert_eq!(extract(None).await.unwrap(), Actor(None));
    }

    #[tokio::test]
    async fn test_valid_header() {
        let id = Uuid::new_v4();
        let actor = extract(Some(&id.to_string())).await.unwrap();
        assert_eq!(actor.id(), Some(id));
    }

    #[tokio::test]
    async fn test_malformed_header_rejected() {
        let err = extract(Some("not-a-uuid")).await.unwrap_err();
        assert_eq!(err.error_code(), "INVALID_HEADER");
    }

    #[test]
    fn test_parse_id() {
        assert!(parse_id("nope").is_err());
        assert!(parse_id(&Uuid::nil().to_string()).is_ok());
    }
}
