use super::{AppError, auth::AuthCtx};
use axum::response::Response;
use axum::{
    extract::OriginalUri,
    http::{Method, Request},
    middleware::Next,
};
use birdie_shared::auth::Role;

/// What a route demands from the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Access {
    /// Any resolved user.
    Authenticated,
    /// The given role, or ADMIN.
    Role(Role),
    Deny,
}

pub async fn enforce_acl(req: Request<axum::body::Body>, next: Next) -> Result<Response, AppError> {
    let path = req
        .extensions()
        .get::<OriginalUri>()
        .map(|orig| orig.0.path().to_string())
        .unwrap_or_else(|| req.uri().path().to_string());
    let method = req.method().clone();
    let Some(auth) = req.extensions().get::<AuthCtx>() else {
        return Err(AppError::unauthorized("empty token"));
    };

    let segs = segmented(&path);
    let allowed = match required_access(&method, &segs) {
        Access::Authenticated => true,
        Access::Role(required) => auth.role.satisfies(required),
        Access::Deny => false,
    };

    if !allowed {
        tracing::warn!(
            method = %method,
            path = %path,
            email = %auth.email,
            role = %auth.role,
            "ACL: role not permitted; denying"
        );
        return Err(AppError::forbidden());
    }

    Ok(next.run(req).await)
}

fn required_access(method: &Method, segs: &[&str]) -> Access {
    match segs {
        ["private"] if *method == Method::GET => Access::Authenticated,
        ["scoped"] if *method == Method::GET => Access::Role(Role::Teacher),
        ["api", "v1", "reports", ..] => Access::Role(Role::Admin),
        ["api", "v1", "teachers" | "teacher_notes" | "kids" | "kid_notes" | "carnets", ..] => {
            Access::Role(Role::Teacher)
        }
        _ => Access::Deny,
    }
}

fn segmented(path: &str) -> Vec<&str> {
    path.split('/').filter(|s| !s.is_empty()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn access(method: Method, path: &str) -> Access {
        required_access(&method, &segmented(path))
    }

    #[test]
    fn resource_routes_need_teacher() {
        for p in [
            "/api/v1/kids/",
            "/api/v1/kids/3",
            "/api/v1/kid_notes/period",
            "/api/v1/teacher_notes/date",
            "/api/v1/carnets",
            "/api/v1/teachers/1",
        ] {
            assert_eq!(access(Method::GET, p), Access::Role(Role::Teacher), "{p}");
        }
    }

    #[test]
    fn reports_need_admin() {
        assert_eq!(
            access(Method::POST, "/api/v1/reports/monthly-report"),
            Access::Role(Role::Admin)
        );
    }

    #[test]
    fn probes_and_unknown_paths() {
        assert_eq!(access(Method::GET, "/private"), Access::Authenticated);
        assert_eq!(access(Method::GET, "/scoped"), Access::Role(Role::Teacher));
        assert_eq!(access(Method::GET, "/api/v1/users"), Access::Deny);
        assert_eq!(access(Method::GET, "/api/v2/kids"), Access::Deny);
    }

    #[test]
    fn roles_resolve_against_requirements() {
        assert!(Role::Admin.satisfies(Role::Teacher));
        assert!(Role::Teacher.satisfies(Role::Teacher));
        assert!(!Role::Teacher.satisfies(Role::Admin));
        assert!(!Role::Parent.satisfies(Role::Teacher));
    }
}
