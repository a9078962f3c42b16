use crate::server::{
    Result, ServerError, ServerRouter,
    form::Form,
    render,
    session::{self, MaybeUser, SESSION_COOKIE},
};
use axum::{
    extract::State,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::{
    extract::cookie::SignedCookieJar,
    routing::{RouterExt, TypedPath},
};
use federkiel_common::model::{
    password::HashedPassword,
    session::{Session, SessionToken},
    user::{CreateUser, Username},
};
use federkiel_db::client::{DbClient, DbError};
use serde::Deserialize;
use std::sync::Arc;
use thiserror::Error;
use tracing::warn;

pub const PASSWORD_MIN_LEN: usize = 6;

const LOGIN_FAILED: &str = "Invalid username or password";

pub fn routes() -> ServerRouter {
    ServerRouter::new()
        .typed_get(login_page)
        .typed_post(login)
        .typed_get(register_page)
        .typed_post(register)
        .typed_get(logout_get)
        .typed_post(logout_post)
}

/// Reasons a registration attempt is refused; checked in order, first
/// failure wins.
#[derive(Copy, Clone, Eq, PartialEq, Debug, Error)]
enum RegisterRefusal {
    #[error("Passwords don't match")]
    PasswordMismatch,
    #[error("Password must be at least 6 characters")]
    PasswordTooShort,
    #[error("Please choose a username of 1 to 50 characters")]
    InvalidUsername,
    #[error("Username already exists")]
    UsernameTaken,
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/login", rejection(ServerError))]
struct LoginPath();

#[derive(TypedPath, Deserialize)]
#[typed_path("/register", rejection(ServerError))]
struct RegisterPath();

#[derive(TypedPath, Deserialize)]
#[typed_path("/logout", rejection(ServerError))]
struct LogoutPath();

#[derive(Deserialize)]
struct LoginForm {
    username: String,
    password: String,
}

#[derive(Deserialize)]
struct RegisterForm {
    username: String,
    password: String,
    confirm_password: String,
}

async fn login_page(LoginPath(): LoginPath, MaybeUser(user): MaybeUser) -> Response {
    if user.is_some() {
        Redirect::to("/").into_response()
    } else {
        render::login_page(None).into_response()
    }
}

/// Unknown account and wrong password render the identical page, so the
/// response does not leak which usernames exist.
async fn login(
    LoginPath(): LoginPath,
    State(db): State<Arc<DbClient>>,
    jar: SignedCookieJar,
    Form(form): Form<LoginForm>,
) -> Result<Response> {
    let credential = match Username::new(form.username) {
        Ok(name) => db.fetch_credential(&name).await?,
        // An unrepresentable name cannot belong to any account.
        Err(_) => None,
    };

    let Some(credential) = credential else {
        return Ok(render::login_page(Some(LOGIN_FAILED)).into_response());
    };

    if !credential.password_hash.verify(&form.password) {
        return Ok(render::login_page(Some(LOGIN_FAILED)).into_response());
    }

    let session = Session::start(credential.user.id, credential.user.name);
    db.create_session(&session).await?;

    Ok((jar.add(session::session_cookie(&session)), Redirect::to("/")).into_response())
}

async fn register_page(RegisterPath(): RegisterPath, MaybeUser(user): MaybeUser) -> Response {
    if user.is_some() {
        Redirect::to("/").into_response()
    } else {
        render::register_page(None).into_response()
    }
}

async fn register(
    RegisterPath(): RegisterPath,
    State(db): State<Arc<DbClient>>,
    jar: SignedCookieJar,
    Form(form): Form<RegisterForm>,
) -> Result<Response> {
    let name = match validate_registration(&form) {
        Ok(name) => name,
        Err(refusal) => return Ok(refused(refusal)),
    };

    if db.fetch_credential(&name).await?.is_some() {
        return Ok(refused(RegisterRefusal::UsernameTaken));
    }

    let password_hash = HashedPassword::hash(&form.password)?;
    let user = match db.create_user(&CreateUser {
        name,
        password_hash,
    })
    .await
    {
        Ok(user) => user,
        // Lost the race for the name against a concurrent registration.
        Err(DbError::UsernameTaken) => return Ok(refused(RegisterRefusal::UsernameTaken)),
        Err(err) => return Err(err.into()),
    };

    let session = Session::start(user.id, user.name);
    db.create_session(&session).await?;

    Ok((jar.add(session::session_cookie(&session)), Redirect::to("/")).into_response())
}

async fn logout_get(
    LogoutPath(): LogoutPath,
    State(db): State<Arc<DbClient>>,
    jar: SignedCookieJar,
) -> Response {
    logout(&db, jar).await
}

async fn logout_post(
    LogoutPath(): LogoutPath,
    State(db): State<Arc<DbClient>>,
    jar: SignedCookieJar,
) -> Response {
    logout(&db, jar).await
}

/// Idempotent: logging out without a session still redirects home, and a
/// failing session-store delete is logged rather than surfaced.
async fn logout(db: &DbClient, jar: SignedCookieJar) -> Response {
    let jar = if let Some(cookie) = jar.get(SESSION_COOKIE) {
        if let Ok(token) = cookie.value().parse::<SessionToken>()
            && let Err(err) = db.delete_session(&token).await
        {
            warn!(error = %err, "Destroying session failed");
        }

        jar.remove(session::removal_cookie())
    } else {
        jar
    };

    (jar, Redirect::to("/")).into_response()
}

fn validate_registration(form: &RegisterForm) -> Result<Username, RegisterRefusal> {
    if form.password != form.confirm_password {
        return Err(RegisterRefusal::PasswordMismatch);
    }

    if form.password.chars().count() < PASSWORD_MIN_LEN {
        return Err(RegisterRefusal::PasswordTooShort);
    }

    Username::new(form.username.clone()).map_err(|_| RegisterRefusal::InvalidUsername)
}

fn refused(refusal: RegisterRefusal) -> Response {
    render::register_page(Some(&refusal.to_string())).into_response()
}

#[cfg(test)]
mod tests {
    use crate::server::routes::auth::{RegisterForm, RegisterRefusal, validate_registration};

    fn form(username: &str, password: &str, confirm_password: &str) -> RegisterForm {
        RegisterForm {
            username: username.to_owned(),
            password: password.to_owned(),
            confirm_password: confirm_password.to_owned(),
        }
    }

    #[test]
    fn valid_registration_passes() {
        let name = validate_registration(&form("alice", "secret1", "secret1")).unwrap();
        assert_eq!(name.get(), "alice");
    }

    #[test]
    fn mismatched_passwords_are_refused() {
        assert_eq!(
            validate_registration(&form("alice", "secret1", "secret2")),
            Err(RegisterRefusal::PasswordMismatch)
        );
    }

    #[test]
    fn short_passwords_are_refused() {
        assert_eq!(
            validate_registration(&form("alice", "five5", "five5")),
            Err(RegisterRefusal::PasswordTooShort)
        );
    }

    #[test]
    fn mismatch_is_reported_before_length() {
        // Both checks fail; the mismatch must win.
        assert_eq!(
            validate_registration(&form("alice", "a", "b")),
            Err(RegisterRefusal::PasswordMismatch)
        );
    }

    #[test]
    fn invalid_usernames_are_refused_after_password_checks() {
        assert_eq!(
            validate_registration(&form("", "secret1", "secret1")),
            Err(RegisterRefusal::InvalidUsername)
        );
        assert_eq!(
            validate_registration(&form("", "a", "a")),
            Err(RegisterRefusal::PasswordTooShort)
        );
    }

    #[test]
    fn refusal_messages_match_the_forms() {
        assert_eq!(
            RegisterRefusal::PasswordMismatch.to_string(),
            "Passwords don't match"
        );
        assert_eq!(
            RegisterRefusal::PasswordTooShort.to_string(),
            "Password must be at least 6 characters"
        );
        assert_eq!(
            RegisterRefusal::UsernameTaken.to_string(),
            "Username already exists"
        );
    }
}
