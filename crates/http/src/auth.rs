//! Session extractors.
//!
//! Handlers that mutate state take [`CurrentSubject`]; the verified subject is
//! also stored in the request extensions for the rest of the request.
//!
//! ```ignore
//! async fn delete_review(
//!     CurrentSubject(subject): CurrentSubject,
//!     Path(id): Path<String>,
//! ) -> Result<ApiResponse<()>, AppError> { ... }
//! ```

use std::sync::Arc;

use axum::{
    extract::{FromRef, FromRequestParts},
    http::{header::AUTHORIZATION, request::Parts},
};
use shelf_authz::{session::token_from_header, SessionAuthenticator, Subject};

use crate::error::AppError;

/// The verified caller. Rejects with `401` when the token is missing or invalid.
#[derive(Debug, Clone, Copy)]
pub struct CurrentSubject(pub Subject);

/// The verified caller, if any. A missing `Authorization` header yields `None`;
/// a present but invalid token is still rejected.
#[derive(Debug, Clone, Copy)]
pub struct OptionalSubject(pub Option<Subject>);

impl<S> FromRequestParts<S> for CurrentSubject
where
    Arc<SessionAuthenticator>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match resolve(parts, state)? {
            Some(subject) => Ok(Self(subject)),
            None => Err(AppError::unauthorized("access denied, no token provided")),
        }
    }
}

impl<S> FromRequestParts<S> for OptionalSubject
where
    Arc<SessionAuthenticator>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        resolve(parts, state).map(Self)
    }
}

fn resolve<S>(parts: &mut Parts, state: &S) -> Result<Option<Subject>, AppError>
where
    Arc<SessionAuthenticator>: FromRef<S>,
{
    if let Some(subject) = parts.extensions.get::<Subject>() {
        return Ok(Some(*subject));
    }

    let Some(header) = parts.headers.get(AUTHORIZATION) else {
        return Ok(None);
    };
    let value = header
        .to_str()
        .map_err(|_| AppError::unauthorized("invalid token"))?;

    let sessions = Arc::<SessionAuthenticator>::from_ref(state);
    let subject = sessions.verify(token_from_header(value))?;

    tracing::debug!(subject = %subject.id, "request authenticated");
    parts.extensions.insert(subject);
    Ok(Some(subject))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;
    use shelf_db::RecordId;
    use time::Duration;

    fn sessions() -> Arc<SessionAuthenticator> {
        Arc::new(SessionAuthenticator::new("test-secret", Duration::hours(1)))
    }

    fn parts(authorization: Option<&str>) -> Parts {
        let mut builder = Request::builder().uri("/");
        if let Some(value) = authorization {
            builder = builder.header(AUTHORIZATION, value);
        }
        builder.body(()).unwrap().into_parts().0
    }

    #[tokio::test]
    async fn test_current_subject_from_bearer_token() {
        let state = sessions();
        let user_id = RecordId::new();
        let token = state.issue(user_id).unwrap().token;

        let mut parts = parts(Some(&format!("Bearer {token}")));
        let CurrentSubject(subject) = CurrentSubject::from_request_parts(&mut parts, &state)
            .await
            .unwrap();

        assert_eq!(subject.id, user_id);
        assert_eq!(parts.extensions.get::<Subject>(), Some(&subject));
    }

    #[tokio::test]
    async fn test_missing_token_is_unauthorized() {
        let state = sessions();
        let mut parts = parts(None);

        let rejection = CurrentSubject::from_request_parts(&mut parts, &state)
            .await
            .unwrap_err();
        assert!(matches!(rejection, AppError::Unauthorized { .. }));
    }

    #[tokio::test]
    async fn test_optional_subject() {
        let state = sessions();

        let OptionalSubject(anonymous) = OptionalSubject::from_request_parts(&mut parts(None), &state)
            .await
            .unwrap();
        assert!(anonymous.is_none());

        let invalid = OptionalSubject::from_request_parts(&mut parts(Some("garbage")), &state).await;
        assert!(matches!(invalid, Err(AppError::Unauthorized { .. })));
    }
}
