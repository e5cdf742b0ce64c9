use crate::Authenticator;
use agrimove_core::Identity;
use axum::body::Body;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::{header, HeaderValue, Request, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tower::{Layer, Service};
use tracing::{debug, error};

/// Detail returned for every rejected bearer token, whatever the cause.
pub const CREDENTIALS_DETAIL: &str = "Could not validate credentials";

/// Guards the wrapped routes with bearer-token authentication. The
/// resolved [`Identity`] is placed in the request extensions.
#[derive(Clone)]
pub struct AuthLayer {
    authenticator: Arc<Authenticator>,
}
impl AuthLayer {
    pub fn new(authenticator: Arc<Authenticator>) -> Self {
        Self { authenticator }
    }
}
impl<I> Layer<I> for AuthLayer {
    type Service = AuthService<I>;
    fn layer(&self, inner: I) -> Self::Service {
        AuthService {
            inner,
            authenticator: self.authenticator.clone(),
        }
    }
}
#[derive(Clone)]
pub struct AuthService<I> {
    inner: I,
    authenticator: Arc<Authenticator>,
}
impl<I> Service<Request<Body>> for AuthService<I>
where
    I: Service<Request<Body>, Response = Response> + Clone + Send + 'static,
    I::Future: Send,
{
    type Response = Response;
    type Error = I::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;
    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }
    fn call(&mut self, mut req: Request<Body>) -> Self::Future {
        let token = bearer_token(&req).map(String::from);
        let authenticator = self.authenticator.clone();
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);
        Box::pin(async move {
            let Some(token) = token else {
                debug!(path = %req.uri().path(), "missing bearer token");
                return Ok(unauthorized_response());
            };
            match authenticator.authenticate(&token).await {
                Ok(identity) => {
                    debug!(username = %identity.username, "request authenticated");
                    req.extensions_mut().insert(identity);
                    inner.call(req).await
                }
                Err(e) if e.is_token_rejection() => {
                    debug!(reason = %e, path = %req.uri().path(), "bearer token rejected");
                    Ok(unauthorized_response())
                }
                Err(e) => {
                    error!(error = %e, "token validation failed");
                    Ok(error_response())
                }
            }
        })
    }
}

fn bearer_token(req: &Request<Body>) -> Option<&str> {
    let value = req.headers().get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    let token = token.trim();
    if scheme.eq_ignore_ascii_case("bearer") && !token.is_empty() {
        Some(token)
    } else {
        None
    }
}

/// The single response for any refused bearer token.
pub fn unauthorized_response() -> Response {
    let mut response = (
        StatusCode::UNAUTHORIZED,
        Json(serde_json::json!({ "detail": CREDENTIALS_DETAIL })),
    )
        .into_response();
    response
        .headers_mut()
        .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
    response
}

fn error_response() -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(serde_json::json!({ "detail": "Internal server error" })),
    )
        .into_response()
}

/// Extractor for the identity resolved by [`AuthLayer`]. Handlers outside
/// the layer get the standard unauthorized response.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub Identity);

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Identity>()
            .cloned()
            .map(CurrentUser)
            .ok_or_else(unauthorized_response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{InMemoryCredentialStore, PasswordHasher, TokenManager};
    use agrimove_core::NewUser;
    use axum::routing::get;
    use axum::Router;
    use chrono::{Duration, Utc};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tower::ServiceExt;

    async fn setup() -> (Router, Arc<Authenticator>, Arc<AtomicUsize>) {
        let secret = TokenManager::generate_secret().unwrap();
        let authenticator = Arc::new(Authenticator::new(
            Arc::new(InMemoryCredentialStore::new()),
            PasswordHasher::new(1_000).unwrap(),
            TokenManager::new(&secret),
        ));
        authenticator
            .register(NewUser {
                username: "farmer1".into(),
                password: "password".into(),
                confirm_password: "password".into(),
                ..Default::default()
            })
            .await
            .unwrap();
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let router = Router::new()
            .route(
                "/protected",
                get(move |CurrentUser(identity): CurrentUser| {
                    let counter = counter.clone();
                    async move {
                        counter.fetch_add(1, Ordering::SeqCst);
                        identity.username
                    }
                }),
            )
            .route_layer(AuthLayer::new(authenticator.clone()));
        (router, authenticator, calls)
    }

    async fn call(router: Router, authorization: Option<String>) -> (StatusCode, String, Option<String>) {
        let mut builder = Request::builder().uri("/protected");
        if let Some(value) = authorization {
            builder = builder.header(header::AUTHORIZATION, value);
        }
        let response = router
            .oneshot(builder.body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let challenge = response
            .headers()
            .get(header::WWW_AUTHENTICATE)
            .map(|v| v.to_str().unwrap().to_string());
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, String::from_utf8(bytes.to_vec()).unwrap(), challenge)
    }

    #[tokio::test]
    async fn test_valid_token_reaches_handler() {
        let (router, auth, calls) = setup().await;
        let issued = auth.login("farmer1", "password").await.unwrap();

        let (status, body, _) = call(router.clone(), Some(format!("Bearer {}", issued.token))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "farmer1");

        let (status, _, _) = call(router, Some(format!("bearer {}", issued.token))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_rejections_are_identical_and_skip_handler() {
        let (router, auth, calls) = setup().await;
        let expired = auth
            .tokens()
            .issue_at("farmer1", None, Utc::now() - Duration::hours(1))
            .unwrap();
        let unknown = auth.tokens().issue("ghost", None).unwrap();
        let valid = auth.login("farmer1", "password").await.unwrap();

        let cases = vec![
            None,
            Some("Bearer".to_string()),
            Some("Bearer ".to_string()),
            Some(format!("Basic {}", valid.token)),
            Some("Bearer not-a-token".to_string()),
            Some(format!("Bearer {}", expired.token)),
            Some(format!("Bearer {}", unknown.token)),
            Some(format!("Bearer {}x", valid.token)),
        ];

        let mut responses = Vec::new();
        for authorization in cases {
            responses.push(call(router.clone(), authorization).await);
        }
        for (status, body, challenge) in &responses {
            assert_eq!(*status, StatusCode::UNAUTHORIZED);
            assert_eq!(challenge.as_deref(), Some("Bearer"));
            assert_eq!(body, &responses[0].1);
        }
        let body: serde_json::Value = serde_json::from_str(&responses[0].1).unwrap();
        assert_eq!(body["detail"], CREDENTIALS_DETAIL);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }
}
