//! Authentication middleware and extractors
//!
//! Resolves the bearer credential to an `Identity` and guards routes
//! that require one.

use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts, State},
    http::{HeaderMap, Request, request::Parts},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::CookieJar;

use super::identity::{Capability, Identity, Role};
use super::session::verify_session_token;
use crate::AppState;
use crate::error::AppError;

fn extract_token_from_headers(headers: &HeaderMap) -> Option<String> {
    headers
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(ToOwned::to_owned)
        .or_else(|| {
            let jar = CookieJar::from_headers(headers);
            jar.get("session").map(|cookie| cookie.value().to_owned())
        })
}

/// Verify a token and load the identity it names
///
/// The role tag picks the backing store: monk tokens are looked up in the
/// monks table, everything else in users. A token whose identity no longer
/// exists is rejected.
async fn authenticate_token(token: &str, state: &AppState) -> Result<Identity, AppError> {
    let session = verify_session_token(token, &state.config.auth.session_secret)?;

    let identity = match session.role {
        Role::Monk => state
            .db
            .get_monk(&session.identity_id)
            .await?
            .map(|monk| Identity::from_monk(&monk)),
        Role::User | Role::Admin => state
            .db
            .get_user(&session.identity_id)
            .await?
            .map(|user| Identity::from_user(&user)),
    };

    identity.ok_or_else(|| {
        tracing::debug!(
            identity_id = %session.identity_id,
            role = %session.role,
            "Credential refers to an unknown identity"
        );
        AppError::Unauthorized
    })
}

/// Middleware to require authentication
///
/// Extracts and verifies the credential from the Authorization header or
/// `session` cookie and adds the resolved `Identity` to request extensions.
///
/// # Usage
/// ```ignore
/// let protected_routes = Router::new()
///     .route("/itinerary/generate", ...)
///     .route_layer(middleware::from_fn_with_state(state, require_auth));
/// ```
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request<axum::body::Body>,
    next: Next,
) -> Result<Response, AppError> {
    let token = extract_token_from_headers(request.headers()).ok_or(AppError::Unauthorized)?;

    let identity = authenticate_token(&token, &state).await?;
    request.extensions_mut().insert(identity);

    Ok(next.run(request).await)
}

/// Extractor for the current authenticated identity
///
/// # Usage
/// ```ignore
/// async fn handler(CurrentIdentity(identity): CurrentIdentity) -> impl IntoResponse {
///     format!("Hello, {}", identity.name)
/// }
/// ```
#[derive(Debug, Clone)]
pub struct CurrentIdentity(pub Identity);

#[async_trait]
impl<S> FromRequestParts<S> for CurrentIdentity
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        if let Some(identity) = parts.extensions.get::<Identity>().cloned() {
            return Ok(CurrentIdentity(identity));
        }

        let state = AppState::from_ref(state);
        let token = extract_token_from_headers(&parts.headers).ok_or(AppError::Unauthorized)?;
        let identity = authenticate_token(&token, &state).await?;
        parts.extensions.insert(identity.clone());

        Ok(CurrentIdentity(identity))
    }
}

/// Optional identity extractor
///
/// Returns None for absent or invalid credentials instead of failing;
/// downstream code then applies the anonymous policy.
#[derive(Debug, Clone)]
pub struct MaybeIdentity(pub Option<Identity>);

#[async_trait]
impl<S> FromRequestParts<S> for MaybeIdentity
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        if let Some(identity) = parts.extensions.get::<Identity>().cloned() {
            return Ok(MaybeIdentity(Some(identity)));
        }

        let app_state = AppState::from_ref(state);
        let identity = match extract_token_from_headers(&parts.headers) {
            Some(token) => authenticate_token(&token, &app_state).await.ok(),
            None => None,
        };

        if let Some(identity) = &identity {
            parts.extensions.insert(identity.clone());
        }

        Ok(MaybeIdentity(identity))
    }
}

/// Extractor that only admits Admin identities
///
/// Missing credential → 401, non-admin → 403.
#[derive(Debug, Clone)]
pub struct AdminIdentity(pub Identity);

#[async_trait]
impl<S> FromRequestParts<S> for AdminIdentity
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let CurrentIdentity(identity) = CurrentIdentity::from_request_parts(parts, state).await?;
        if !identity.is_admin() {
            return Err(AppError::Forbidden);
        }
        Ok(AdminIdentity(identity))
    }
}

/// Extractor that only admits Monk identities
#[derive(Debug, Clone)]
pub struct MonkIdentity(pub Identity);

#[async_trait]
impl<S> FromRequestParts<S> for MonkIdentity
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let CurrentIdentity(identity) = CurrentIdentity::from_request_parts(parts, state).await?;
        identity.require(Capability::ManageOwnPosts)?;
        Ok(MonkIdentity(identity))
    }
}
