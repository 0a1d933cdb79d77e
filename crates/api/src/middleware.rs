use std::sync::Arc;

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::Response,
};

use taskgate_auth::AuthGateway;

use crate::app::errors;
use crate::context::CallerContext;

#[derive(Clone)]
pub struct AuthState {
    pub gateway: Arc<AuthGateway>,
}

/// Resolve the bearer token (if any) into a [`CallerContext`] extension.
///
/// No `Authorization` header means an anonymous caller. A header that is
/// present but unusable, or a token that fails verification, is rejected with
/// 401 before routing.
pub async fn auth_middleware(
    State(state): State<AuthState>,
    mut req: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Response {
    let caller = match extract_bearer(req.headers()) {
        Ok(None) => CallerContext::anonymous(),
        Ok(Some(token)) => match state.gateway.authenticate_request(token) {
            Ok(identity) => CallerContext::authenticated(identity),
            Err(e) => {
                tracing::debug!(error = %e, "bearer token rejected");
                return errors::json_error(StatusCode::UNAUTHORIZED, "unauthenticated", e.to_string());
            }
        },
        Err(message) => {
            return errors::json_error(StatusCode::UNAUTHORIZED, "unauthenticated", message);
        }
    };

    req.extensions_mut().insert(caller);
    next.run(req).await
}

fn extract_bearer(headers: &HeaderMap) -> Result<Option<&str>, &'static str> {
    let Some(header) = headers.get(axum::http::header::AUTHORIZATION) else {
        return Ok(None);
    };

    let header = header
        .to_str()
        .map_err(|_| "authorization header is not valid ascii")?;

    let token = header
        .strip_prefix("Bearer ")
        .ok_or("authorization header must use the Bearer scheme")?
        .trim();

    if token.is_empty() {
        return Err("bearer token is empty");
    }

    Ok(Some(token))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(value: &str) -> HeaderMap {
        let mut h = HeaderMap::new();
        h.insert(axum::http::header::AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        h
    }

    #[test]
    fn missing_header_is_anonymous() {
        assert_eq!(extract_bearer(&HeaderMap::new()), Ok(None));
    }

    #[test]
    fn bearer_token_is_extracted() {
        assert_eq!(extract_bearer(&headers("Bearer abc.def")), Ok(Some("abc.def")));
    }

    #[test]
    fn other_schemes_and_empty_tokens_are_errors() {
        assert!(extract_bearer(&headers("Basic dTpw")).is_err());
        assert!(extract_bearer(&headers("Bearer   ")).is_err());
    }
}
