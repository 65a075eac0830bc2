use axum::http::{Request, header};
use axum::middleware::Next;
use axum::response::Response;
use birdie_shared::auth::Role;
use birdie_shared::jwt::{self, IdTokenClaims};
use tracing::{error, warn};

use super::{AppError, AppState};

/// Verified identity-provider claims, set by [`require_bearer`].
#[derive(Clone, Debug)]
pub struct IdToken(pub IdTokenClaims);

/// Caller identity resolved against the users table, set by [`resolve_user`].
#[derive(Clone, Debug)]
pub struct AuthCtx {
    pub claims: IdTokenClaims,
    pub user_id: i64,
    pub email: String,
    pub role: Role,
}

/// Extracts the token from an `Authorization` header value. `None` when the
/// `Bearer` scheme is missing.
fn bearer_token(header_val: &str) -> Option<&str> {
    header_val.strip_prefix("Bearer ").map(str::trim)
}

pub async fn require_bearer(
    axum::extract::State(state): axum::extract::State<AppState>,
    mut req: Request<axum::body::Body>,
    next: Next,
) -> Result<Response, AppError> {
    let header_str = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    if header_str.trim().is_empty() {
        return Err(AppError::unauthorized("empty token"));
    }
    let Some(token) = bearer_token(header_str) else {
        warn!("auth: authorization header without Bearer scheme");
        return Err(AppError::unauthorized("invalid token"));
    };
    if token.is_empty() {
        return Err(AppError::unauthorized("empty token"));
    }

    let claims = match state.verifier.verify(token) {
        Ok(c) => c,
        Err(e) => {
            let issuer = jwt::decode_unverified(token)
                .map(|c| c.iss)
                .unwrap_or_default();
            warn!(error = %e, issuer = %issuer, "auth: id token verification failed");
            return Err(AppError::unauthorized("invalid token"));
        }
    };
    if claims.email.trim().is_empty() {
        warn!(sub = %claims.sub, "auth: id token carries no email");
        return Err(AppError::unauthorized("invalid token"));
    }

    req.extensions_mut().insert(IdToken(claims));
    Ok(next.run(req).await)
}

/// Maps the verified email to a local user, creating a teacher on first sight.
pub async fn resolve_user(
    axum::extract::State(state): axum::extract::State<AppState>,
    mut req: Request<axum::body::Body>,
    next: Next,
) -> Result<Response, AppError> {
    let Some(IdToken(claims)) = req.extensions().get::<IdToken>().cloned() else {
        return Err(AppError::unauthorized("empty token"));
    };
    let user = state
        .store
        .get_or_create_user(&claims.email, &claims.sub)
        .await
        .map_err(|e| {
            error!(email = %claims.email, error = %e, "auth: get_or_create_user failed");
            AppError::internal("database connection error")
        })?;
    let role = user.role().map_err(|e| {
        error!(email = %claims.email, error = %e, "auth: stored role unreadable");
        AppError::internal(e)
    })?;

    req.extensions_mut().insert(AuthCtx {
        claims,
        user_id: user.id,
        email: user.email,
        role,
    });
    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::bearer_token;

    #[test]
    fn bearer_scheme_is_required() {
        assert_eq!(bearer_token("Bearer abc.def.ghi"), Some("abc.def.ghi"));
        assert_eq!(bearer_token("Bearer   "), Some(""));
        assert_eq!(bearer_token("abc.def.ghi"), None);
        assert_eq!(bearer_token("Bearerabc.def.ghi"), None);
        assert_eq!(bearer_token("Basic dXNlcjpwYXNz"), None);
    }
}
