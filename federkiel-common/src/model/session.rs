use crate::model::{
    Id,
    user::{UserMarker, Username},
};
use base64::{DecodeError, Engine, prelude::BASE64_URL_SAFE_NO_PAD};
use std::{
    fmt::{Debug, Formatter},
    str::FromStr,
};
use thiserror::Error;
use time::{Duration, UtcDateTime};

pub const SESSION_TOKEN_LEN: usize = 32;
pub const SESSION_TTL: Duration = Duration::hours(24);

#[derive(Clone, Eq, PartialEq, Debug, Error)]
pub enum SessionTokenDecodeError {
    #[error("Decoding base64 failed: {0}")]
    Decode(#[from] DecodeError),
    #[error("The length of the token is incorrect")]
    InvalidLength,
}

/// Opaque client-held token identifying a server-side session record.
#[derive(Clone, Eq, PartialEq, Hash)]
pub struct SessionToken([u8; SESSION_TOKEN_LEN]);

impl SessionToken {
    #[must_use]
    pub fn generate_random() -> Self {
        Self(rand::random())
    }

    #[must_use]
    pub fn as_cookie_value(&self) -> String {
        BASE64_URL_SAFE_NO_PAD.encode(self.0)
    }
}

impl FromStr for SessionToken {
    type Err = SessionTokenDecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = BASE64_URL_SAFE_NO_PAD
            .decode(s)?
            .try_into()
            .map_err(|_| Self::Err::InvalidLength)?;

        Ok(Self(bytes))
    }
}

impl Debug for SessionToken {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("SessionToken").field(&"[redacted]").finish()
    }
}

/// Server-side record of an authenticated browsing context.
///
/// The account name is cached on the record so authenticated requests do not
/// need a user lookup.
#[derive(Clone, Eq, PartialEq, Debug, Hash)]
pub struct Session {
    pub token: SessionToken,
    pub user_id: Id<UserMarker>,
    pub username: Username,
    pub created_at: UtcDateTime,
    pub expires_at: UtcDateTime,
}

impl Session {
    #[must_use]
    pub fn start(user_id: Id<UserMarker>, username: Username) -> Self {
        let created_at = UtcDateTime::now();

        Self {
            token: SessionToken::generate_random(),
            user_id,
            username,
            created_at,
            expires_at: created_at + SESSION_TTL,
        }
    }

    #[must_use]
    pub fn is_expired_at(&self, now: UtcDateTime) -> bool {
        self.expires_at <= now
    }
}

#[cfg(test)]
mod tests {
    use crate::model::{
        session::{SESSION_TTL, Session, SessionToken},
        user::Username,
    };
    use time::Duration;

    #[test]
    fn token_cookie_roundtrip() {
        let token = SessionToken::generate_random();
        let parsed: SessionToken = token.as_cookie_value().parse().unwrap();

        assert_eq!(token, parsed);
    }

    #[test]
    fn tokens_are_distinct() {
        assert_ne!(
            SessionToken::generate_random(),
            SessionToken::generate_random()
        );
    }

    #[test]
    fn malformed_cookie_values_are_rejected() {
        assert!("".parse::<SessionToken>().is_err());
        assert!("not base64 !!".parse::<SessionToken>().is_err());
        // Valid base64, wrong decoded length.
        assert!("c2hvcnQ".parse::<SessionToken>().is_err());
    }

    #[test]
    fn debug_output_is_redacted() {
        let token = SessionToken::generate_random();
        assert_eq!(format!("{token:?}"), "SessionToken(\"[redacted]\")");
    }

    #[test]
    fn session_expiry() {
        let session = Session::start(1.into(), Username::new("alice".to_owned()).unwrap());

        assert_eq!(session.expires_at - session.created_at, SESSION_TTL);
        assert!(!session.is_expired_at(session.created_at));
        assert!(session.is_expired_at(session.expires_at));
        assert!(session.is_expired_at(session.expires_at + Duration::seconds(1)));
    }
}
