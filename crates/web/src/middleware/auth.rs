use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts},
    middleware::Next,
    response::Response,
};
use std::collections::HashSet;
use uuid::Uuid;

use crate::error::WebError;

/// Header carrying the id of the user the gateway authenticated.
pub const USER_ID_HEADER: &str = "x-user-id";

/// Rejects requests that do not carry a known bearer key.
pub async fn require_auth(
    State(api_keys): State<ApiKeys>,
    req: Request,
    next: Next,
) -> Result<Response, WebError> {
    let token = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "));

    match token {
        Some(token) if api_keys.is_valid(token.trim()) => Ok(next.run(req).await),
        Some(_) => {
            tracing::warn!("Invalid API key attempt");
            Err(WebError::Unauthorized)
        }
        None => Err(WebError::Unauthorized),
    }
}

#[derive(Clone)]
pub struct ApiKeys {
    keys: HashSet<String>,
}

impl ApiKeys {
    pub fn from_comma_separated(keys_str: &str) -> Self {
        let keys = keys_str
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect();

        Self { keys }
    }

    pub fn is_valid(&self, key: &str) -> bool {
        self.keys.contains(key)
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

/// The user on whose behalf the request is made.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor(pub Uuid);

#[axum::async_trait]
impl<S> FromRequestParts<S> for Actor
where
    S: Send + Sync,
{
    type Rejection = WebError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| Uuid::parse_str(value.trim()).ok())
            .map(Actor)
            .ok_or(WebError::Unauthorized)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{Router, body::Body, http::StatusCode, middleware, routing::get};
    use tower::ServiceExt;

    async fn whoami(Actor(id): Actor) -> String {
        id.to_string()
    }

    fn app() -> Router {
        Router::new()
            .route("/whoami", get(whoami))
            .route_layer(middleware::from_fn_with_state(
                ApiKeys::from_comma_separated(" gateway-key , other-key,"),
                require_auth,
            ))
    }

    fn request(auth: Option<&str>, user: Option<&str>) -> Request {
        let mut builder = axum::http::Request::builder().uri("/whoami");
        if let Some(auth) = auth {
            builder = builder.header(header::AUTHORIZATION, auth);
        }
        if let Some(user) = user {
            builder = builder.header(USER_ID_HEADER, user);
        }
        builder.body(Body::empty()).unwrap()
    }

    #[test]
    fn parses_comma_separated_keys() {
        let keys = ApiKeys::from_comma_separated("a, b,,c ");
        assert!(keys.is_valid("a"));
        assert!(keys.is_valid("b"));
        assert!(keys.is_valid("c"));
        assert!(!keys.is_valid(""));
        assert!(ApiKeys::from_comma_separated(" , ").is_empty());
    }

    #[tokio::test]
    async fn rejects_missing_or_unknown_keys() {
        let user = Uuid::new_v4().to_string();

        let missing = app().oneshot(request(None, Some(&user))).await.unwrap();
        assert_eq!(missing.status(), StatusCode::UNAUTHORIZED);

        let wrong = app()
            .oneshot(request(Some("Bearer nope"), Some(&user)))
            .await
            .unwrap();
        assert_eq!(wrong.status(), StatusCode::UNAUTHORIZED);

        let basic = app()
            .oneshot(request(Some("Basic gateway-key"), Some(&user)))
            .await
            .unwrap();
        assert_eq!(basic.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn passes_actor_through_with_valid_key() {
        let user = Uuid::new_v4();
        let response = app()
            .oneshot(request(Some("Bearer other-key"), Some(&user.to_string())))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(body, user.to_string().as_bytes());
    }

    #[tokio::test]
    async fn requires_a_well_formed_user_id() {
        let missing = app()
            .oneshot(request(Some("Bearer gateway-key"), None))
            .await
            .unwrap();
        assert_eq!(missing.status(), StatusCode::UNAUTHORIZED);

        let malformed = app()
            .oneshot(request(Some("Bearer gateway-key"), Some("not-a-uuid")))
            .await
            .unwrap();
        assert_eq!(malformed.status(), StatusCode::UNAUTHORIZED);
    }
}
