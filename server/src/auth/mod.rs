mod cookies;
mod extractor;

pub use cookies::{
    clear_cookie, read_cookie, set_cookie, ACCESS_TOKEN_COOKIE, CODE_VERIFIER_COOKIE,
    CODE_VERIFIER_MAX_AGE, DEFAULT_SESSION_MAX_AGE,
};
pub use extractor::{AuthError, AuthUser};
