use axum::{
    Router,
    extract::{
        FromRef, Request,
        rejection::{FormRejection, PathRejection},
    },
    http::{StatusCode, Uri},
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::Key;
use federkiel_common::model::{Id, password::PasswordHashError, post::PostMarker};
use federkiel_db::client::{DbClient, DbError};
use std::sync::Arc;
use thiserror::Error;
use tracing::error;

mod access;
mod form;
mod render;
mod routes;
mod session;

pub type ServerRouter = Router<ServerState>;

#[derive(Clone, FromRef)]
pub struct ServerState {
    pub db_client: Arc<DbClient>,
    pub cookie_key: Key,
}

pub fn routes() -> ServerRouter {
    routes::routes().fallback(fallback)
}

pub async fn fallback(request: Request) -> ServerError {
    ServerError::UnknownRoute(request.into_parts().0.uri)
}

pub type Result<T, E = ServerError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Unknown route requested: {0}")]
    UnknownRoute(Uri),
    #[error("Path rejected: {0}")]
    PathRejection(#[from] PathRejection),
    #[error("Incoming form rejected: {0}")]
    FormRejection(#[from] FormRejection),
    #[error("Post with id {0} was not found.")]
    PostByIdNotFound(Id<PostMarker>),
    #[error("The session's account does not own the resource")]
    AccessDenied,
    #[error("The password could not be hashed: {0}")]
    PasswordHash(#[from] PasswordHashError),
    #[error(transparent)]
    Database(#[from] DbError),
}

impl ServerError {
    pub fn status(&self) -> StatusCode {
        match self {
            ServerError::UnknownRoute(_)
            | ServerError::PathRejection(_)
            | ServerError::PostByIdNotFound(_) => StatusCode::NOT_FOUND,
            ServerError::AccessDenied => StatusCode::FORBIDDEN,
            ServerError::FormRejection(_) => StatusCode::BAD_REQUEST,
            ServerError::PasswordHash(_) | ServerError::Database(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// What the client gets to see; internal detail stays in the log.
    pub fn public_message(&self) -> &'static str {
        match self {
            ServerError::PostByIdNotFound(_) => "Blog not found",
            ServerError::UnknownRoute(_) | ServerError::PathRejection(_) => "Page not found",
            ServerError::AccessDenied => "Access denied",
            ServerError::FormRejection(_) => "The submitted form was invalid",
            ServerError::PasswordHash(_) | ServerError::Database(_) => {
                "Something went wrong. Please try again."
            }
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status();

        error!(error = %self, %status, "Replying with error page");

        (status, render::error_page(status, self.public_message())).into_response()
    }
}
