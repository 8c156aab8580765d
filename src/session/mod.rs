//! Cookie session store.
//!
//! The bearer token lives in the HttpOnly `pelios_token` cookie; the display
//! name lives in the readable `pelios_user` cookie. Only the token exchange and
//! logout write them; guards, views and the proxy read them.

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use std::convert::Infallible;

use crate::config::SessionConfig;

pub const TOKEN_COOKIE: &str = "pelios_token";
pub const USER_COOKIE: &str = "pelios_user";

/// A successfully exchanged session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub token: String,
    pub user_name: String,
}

/// Display-only session state handed to views.
#[derive(Debug, Clone, Default)]
pub struct SessionContext {
    pub user_name: Option<String>,
}

impl SessionContext {
    pub fn from_jar(jar: &CookieJar) -> Self {
        Self {
            user_name: user_name(jar),
        }
    }

    pub fn display_name(&self) -> &str {
        self.user_name.as_deref().unwrap_or("")
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for SessionContext
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self::from_jar(&CookieJar::from_headers(&parts.headers)))
    }
}

/// Bearer token from the session cookie, if present and non-empty
pub fn token(jar: &CookieJar) -> Option<String> {
    jar.get(TOKEN_COOKIE)
        .map(|c| c.value().to_string())
        .filter(|t| !t.is_empty())
}

/// Display name from the user cookie, if present and non-empty
pub fn user_name(jar: &CookieJar) -> Option<String> {
    jar.get(USER_COOKIE)
        .map(|c| c.value().to_string())
        .filter(|n| !n.is_empty())
}

/// Write both session cookies.
///
/// The token cookie has no expiry so it dies with the browser session; the
/// user cookie lives for `user_cookie_days`.
pub fn issue(jar: CookieJar, session: &Session, config: &SessionConfig) -> CookieJar {
    let token = Cookie::build((TOKEN_COOKIE, session.token.clone()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(config.production)
        .build();

    let user = Cookie::build((USER_COOKIE, session.user_name.clone()))
        .path("/")
        .same_site(SameSite::Lax)
        .secure(config.production)
        .max_age(time::Duration::days(config.user_cookie_days))
        .build();

    jar.add(token).add(user)
}

/// Overwrite both cookies with an empty value and `Max-Age=0`.
pub fn clear(jar: CookieJar) -> CookieJar {
    let expired = |name: &'static str| {
        Cookie::build((name, ""))
            .path("/")
            .max_age(time::Duration::ZERO)
            .build()
    };

    jar.add(expired(TOKEN_COOKIE)).add(expired(USER_COOKIE))
}
