use axum::http::{header, HeaderMap, HeaderValue};

/// Holds the access token issued by the code exchange.
pub const ACCESS_TOKEN_COOKIE: &str = "recipebox-access-token";

/// Holds the PKCE verifier between the magic-link request and the callback.
pub const CODE_VERIFIER_COOKIE: &str = "recipebox-code-verifier";

/// Seconds a magic link can take to be followed.
pub const CODE_VERIFIER_MAX_AGE: i64 = 600;

/// Used when the auth service does not report a token lifetime.
pub const DEFAULT_SESSION_MAX_AGE: i64 = 3600;

/// Value of the first cookie called `name` in the request headers.
pub fn read_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.to_string())
        .filter(|value| !value.is_empty())
}

/// An HttpOnly, SameSite=Lax cookie scoped to the whole site.
pub fn set_cookie(name: &str, value: &str, max_age: i64, secure: bool) -> Option<HeaderValue> {
    let mut cookie = format!(
        "{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
        name, value, max_age
    );
    if secure {
        cookie.push_str("; Secure");
    }
    HeaderValue::from_str(&cookie).ok()
}

pub fn clear_cookie(name: &str, secure: bool) -> Option<HeaderValue> {
    set_cookie(name, "", 0, secure)
}
