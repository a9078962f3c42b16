use crate::server::ServerRouter;
use axum::Router;

mod auth;
mod posts;

pub fn routes() -> ServerRouter {
    Router::new().merge(auth::routes()).merge(posts::routes())
}
