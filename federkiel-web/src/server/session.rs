use crate::server::ServerError;
use axum::{
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::{Cookie, Key, SameSite, SignedCookieJar};
use federkiel_common::model::{
    Id,
    session::{SESSION_TTL, Session, SessionToken},
    user::{UserMarker, Username},
};
use federkiel_db::client::DbClient;
use std::sync::Arc;
use time::UtcDateTime;
use tracing::debug;

pub const SESSION_COOKIE: &str = "session";

/// Identity resolved from the session cookie, threaded explicitly into the
/// handlers that need it.
#[derive(Clone, Eq, PartialEq, Debug, Hash)]
pub struct SessionUser {
    pub id: Id<UserMarker>,
    pub name: Username,
}

impl From<&Session> for SessionUser {
    fn from(session: &Session) -> Self {
        Self {
            id: session.user_id,
            name: session.username.clone(),
        }
    }
}

/// Extractor for routes that serve anonymous and authenticated requests
/// alike.
///
/// A missing cookie, a cookie that fails signature or token decoding, an
/// unknown token, and an expired session all resolve to `None`; only a
/// failing session-store lookup is an error.
#[derive(Clone, Eq, PartialEq, Debug, Default, Hash)]
pub struct MaybeUser(pub Option<SessionUser>);

impl<S> FromRequestParts<S> for MaybeUser
where
    Arc<DbClient>: FromRef<S>,
    Key: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ServerError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let jar = match SignedCookieJar::<Key>::from_request_parts(parts, state).await {
            Ok(jar) => jar,
            Err(infallible) => match infallible {},
        };

        let Some(cookie) = jar.get(SESSION_COOKIE) else {
            return Ok(Self(None));
        };

        let Ok(token) = cookie.value().parse::<SessionToken>() else {
            debug!("Session cookie value did not decode as a token");
            return Ok(Self(None));
        };

        let session = Arc::<DbClient>::from_ref(state).fetch_session(&token).await?;

        let Some(session) = session else {
            return Ok(Self(None));
        };

        if session.is_expired_at(UtcDateTime::now()) {
            return Ok(Self(None));
        }

        Ok(Self(Some(SessionUser::from(&session))))
    }
}

/// Extractor for routes that require a signed-in account; anonymous requests
/// are sent to the fixed login location instead of erroring.
#[derive(Clone, Eq, PartialEq, Debug, Hash)]
pub struct AuthenticatedUser(pub SessionUser);

#[derive(Debug)]
pub enum AuthRejection {
    LoginRedirect,
    Error(ServerError),
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        match self {
            AuthRejection::LoginRedirect => Redirect::to("/login").into_response(),
            AuthRejection::Error(err) => err.into_response(),
        }
    }
}

impl<S> FromRequestParts<S> for AuthenticatedUser
where
    Arc<DbClient>: FromRef<S>,
    Key: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let MaybeUser(user) = MaybeUser::from_request_parts(parts, state)
            .await
            .map_err(AuthRejection::Error)?;

        user.map(Self).ok_or(AuthRejection::LoginRedirect)
    }
}

#[must_use]
pub fn session_cookie(session: &Session) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, session.token.as_cookie_value()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .max_age(SESSION_TTL)
        .build()
}

/// Matches the path of [`session_cookie`] so the jar removes the right one.
#[must_use]
pub fn removal_cookie() -> Cookie<'static> {
    Cookie::build(SESSION_COOKIE).path("/").build()
}

#[cfg(test)]
mod tests {
    use crate::server::session::{self, SESSION_COOKIE};
    use axum_extra::extract::cookie::{Key, SameSite, SignedCookieJar};
    use federkiel_common::model::{
        session::{SESSION_TTL, Session},
        user::Username,
    };

    fn sample_session() -> Session {
        Session::start(1.into(), Username::new("alice".to_owned()).unwrap())
    }

    #[test]
    fn session_cookie_attributes() {
        let cookie = session::session_cookie(&sample_session());

        assert_eq!(cookie.name(), SESSION_COOKIE);
        assert_eq!(cookie.path(), Some("/"));
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.same_site(), Some(SameSite::Lax));
        assert_eq!(cookie.max_age(), Some(SESSION_TTL));
    }

    #[test]
    fn signed_jar_roundtrip_with_derived_key() {
        let key = Key::derive_from(b"0123456789abcdef0123456789abcdef");
        let session = sample_session();

        let jar = SignedCookieJar::new(key).add(session::session_cookie(&session));
        let cookie = jar.get(SESSION_COOKIE).unwrap();

        assert_eq!(cookie.value(), session.token.as_cookie_value());
    }
}