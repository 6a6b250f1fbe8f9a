use axum::{
    extract::{Extension, Request},
    http::{header, HeaderMap},
    middleware::Next,
    response::Response,
};

use crate::auth::{validate_jwt, Claims};
use crate::error::ApiError;
use crate::state::AppState;

/// Authenticated user context extracted from JWT
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuthUser {
    pub user_id: i64,
    pub username: String,
}

impl From<Claims> for AuthUser {
    fn from(claims: Claims) -> Self {
        Self {
            user_id: claims.user_id,
            username: claims.username,
        }
    }
}

/// Reject the request unless it carries a valid token; otherwise inject `AuthUser`.
pub async fn require_auth(
    Extension(state): Extension<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let security = &state.config.security;

    let token = extract_token(request.headers(), &security.cookie_name)
        .map_err(ApiError::unauthorized)?;

    let claims = validate_jwt(&token, &security.jwt_secret).map_err(|e| {
        tracing::debug!("rejected token: {}", e);
        ApiError::unauthorized("Invalid or expired token")
    })?;

    request.extensions_mut().insert(AuthUser::from(claims));
    Ok(next.run(request).await)
}

/// Inject `AuthUser` when a valid token is present; never rejects.
pub async fn optional_auth(
    Extension(state): Extension<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let security = &state.config.security;

    if let Ok(token) = extract_token(request.headers(), &security.cookie_name) {
        if let Ok(claims) = validate_jwt(&token, &security.jwt_secret) {
            request.extensions_mut().insert(AuthUser::from(claims));
        }
    }

    next.run(request).await
}

/// Bearer header first; the session cookie only when no Authorization header is sent.
pub fn extract_token(headers: &HeaderMap, cookie_name: &str) -> Result<String, &'static str> {
    if let Some(auth_header) = headers.get(header::AUTHORIZATION) {
        let auth_str = auth_header
            .to_str()
            .map_err(|_| "Invalid Authorization header format")?;

        let token = auth_str
            .strip_prefix("Bearer ")
            .ok_or("Authorization header must use Bearer token format")?
            .trim();
        if token.is_empty() {
            return Err("Empty JWT token");
        }
        return Ok(token.to_string());
    }

    cookie_value(headers, cookie_name).ok_or("Missing authentication token")
}

fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, value)| *key == name && !value.is_empty())
        .map(|(_, value)| value.to_string())
}

/// `Set-Cookie` value carrying a session token.
pub fn session_cookie(name: &str, token: &str, max_age_secs: u64, secure: bool) -> String {
    let mut cookie = format!(
        "{}={}; Path=/; Max-Age={}; HttpOnly; SameSite=Lax",
        name, token, max_age_secs
    );
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}

/// `Set-Cookie` value that clears the session cookie.
pub fn expired_cookie(name: &str) -> String {
    format!("{}=; Path=/; Max-Age=0; HttpOnly; SameSite=Lax", name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(pairs: &[(header::HeaderName, &str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.append(name.clone(), HeaderValue::from_str(value).unwrap());
        }
        map
    }

    #[test]
    fn bearer_header_wins_over_cookie() {
        let h = headers(&[
            (header::AUTHORIZATION, "Bearer header-token"),
            (header::COOKIE, "token=cookie-token"),
        ]);
        assert_eq!(extract_token(&h, "token").unwrap(), "header-token");
    }

    #[test]
    fn falls_back_to_named_cookie() {
        let h = headers(&[(header::COOKIE, "theme=dark; token=cookie-token; lang=en")]);
        assert_eq!(extract_token(&h, "token").unwrap(), "cookie-token");
        assert!(extract_token(&h, "session").is_err());
    }

    #[test]
    fn malformed_header_does_not_fall_back() {
        let h = headers(&[
            (header::AUTHORIZATION, "Basic abc"),
            (header::COOKIE, "token=cookie-token"),
        ]);
        assert!(extract_token(&h, "token").is_err());

        let h = headers(&[(header::AUTHORIZATION, "Bearer   ")]);
        assert_eq!(extract_token(&h, "token"), Err("Empty JWT token"));
    }

    #[test]
    fn missing_token_is_reported() {
        assert_eq!(
            extract_token(&HeaderMap::new(), "token"),
            Err("Missing authentication token")
        );
    }

    #[test]
    fn cookies_are_http_only() {
        let cookie = session_cookie("token", "abc", 86_400, true);
        assert!(cookie.starts_with("token=abc;"));
        assert!(cookie.contains("Max-Age=86400"));
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.ends_with("Secure"));
        assert!(expired_cookie("token").contains("Max-Age=0"));
    }
}
