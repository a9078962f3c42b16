use crate::server::{
    Result, ServerError, ServerRouter, access,
    form::Form,
    render,
    session::{AuthenticatedUser, MaybeUser},
};
use axum::{
    extract::State,
    response::{Html, IntoResponse, Redirect, Response},
};
use axum_extra::routing::{RouterExt, TypedPath};
use federkiel_common::model::{
    Id,
    post::{NewPost, PostBody, PostMarker, PostRevision, PostTitle},
};
use federkiel_db::client::DbClient;
use serde::Deserialize;
use std::sync::Arc;
use tracing::error;

const RETRY_MESSAGE: &str = "Something went wrong. Please try again.";

pub fn routes() -> ServerRouter {
    ServerRouter::new()
        .typed_get(index)
        .typed_get(my_blogs)
        .typed_get(create_blog_page)
        .typed_post(submit_blog)
        .typed_get(view_blog)
        .typed_get(edit_blog_page)
        .typed_post(edit_blog)
        .typed_post(delete_blog)
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/", rejection(ServerError))]
struct IndexPath();

#[derive(TypedPath, Deserialize)]
#[typed_path("/my-blogs", rejection(ServerError))]
struct MyBlogsPath();

#[derive(TypedPath, Deserialize)]
#[typed_path("/create-blog", rejection(ServerError))]
struct CreateBlogPath();

#[derive(TypedPath, Deserialize)]
#[typed_path("/submit-blog", rejection(ServerError))]
struct SubmitBlogPath();

#[derive(TypedPath, Deserialize)]
#[typed_path("/blog/{id}", rejection(ServerError))]
struct BlogPath {
    id: Id<PostMarker>,
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/edit-blog/{id}", rejection(ServerError))]
struct EditBlogPath {
    id: Id<PostMarker>,
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/delete-blog/{id}", rejection(ServerError))]
struct DeleteBlogPath {
    id: Id<PostMarker>,
}

#[derive(Deserialize)]
struct PostForm {
    title: String,
    body: String,
}

async fn index(
    IndexPath(): IndexPath,
    State(db): State<Arc<DbClient>>,
    MaybeUser(user): MaybeUser,
) -> Result<Html<String>> {
    let posts = db.list_posts().await?;

    Ok(render::index_page(&posts, user.as_ref().map(|u| &u.name)))
}

async fn my_blogs(
    MyBlogsPath(): MyBlogsPath,
    State(db): State<Arc<DbClient>>,
    AuthenticatedUser(user): AuthenticatedUser,
) -> Result<Html<String>> {
    let posts = db.list_posts_by_author(user.id).await?;

    Ok(render::my_blogs_page(&posts, &user.name))
}

async fn create_blog_page(
    CreateBlogPath(): CreateBlogPath,
    AuthenticatedUser(user): AuthenticatedUser,
) -> Html<String> {
    render::create_page(&user.name, None)
}

async fn submit_blog(
    SubmitBlogPath(): SubmitBlogPath,
    State(db): State<Arc<DbClient>>,
    AuthenticatedUser(user): AuthenticatedUser,
    Form(form): Form<PostForm>,
) -> Response {
    let (title, body) = match parse_post_form(form) {
        Ok(fields) => fields,
        Err(message) => return render::create_page(&user.name, Some(message)).into_response(),
    };

    let new_post = NewPost {
        title,
        body,
        author_name: user.name.clone(),
        author_id: user.id,
    };

    match db.create_post(&new_post).await {
        Ok(_) => Redirect::to("/my-blogs").into_response(),
        Err(err) => {
            error!(error = %err, "Creating post failed");
            render::create_page(&user.name, Some(RETRY_MESSAGE)).into_response()
        }
    }
}

async fn view_blog(
    BlogPath { id }: BlogPath,
    State(db): State<Arc<DbClient>>,
    MaybeUser(user): MaybeUser,
) -> Result<Html<String>> {
    let post = db
        .fetch_post(id)
        .await?
        .ok_or(ServerError::PostByIdNotFound(id))?;

    let can_edit = user
        .as_ref()
        .is_some_and(|user| access::authorize_owner(user, &post).is_ok());

    Ok(render::view_page(
        &post,
        user.as_ref().map(|u| &u.name),
        can_edit,
    ))
}

async fn edit_blog_page(
    EditBlogPath { id }: EditBlogPath,
    State(db): State<Arc<DbClient>>,
    AuthenticatedUser(user): AuthenticatedUser,
) -> Result<Html<String>> {
    let post = db
        .fetch_post(id)
        .await?
        .ok_or(ServerError::PostByIdNotFound(id))?;

    access::authorize_owner(&user, &post)?;

    Ok(render::edit_page(&post, &user.name, None))
}

async fn edit_blog(
    EditBlogPath { id }: EditBlogPath,
    State(db): State<Arc<DbClient>>,
    AuthenticatedUser(user): AuthenticatedUser,
    Form(form): Form<PostForm>,
) -> Result<Response> {
    let post = db
        .fetch_post(id)
        .await?
        .ok_or(ServerError::PostByIdNotFound(id))?;

    access::authorize_owner(&user, &post)?;

    let (title, body) = match parse_post_form(form) {
        Ok(fields) => fields,
        Err(message) => {
            return Ok(render::edit_page(&post, &user.name, Some(message)).into_response());
        }
    };

    db.update_post(id, &PostRevision { title, body })
        .await?
        .ok_or(ServerError::PostByIdNotFound(id))?;

    Ok(Redirect::to("/my-blogs").into_response())
}

async fn delete_blog(
    DeleteBlogPath { id }: DeleteBlogPath,
    State(db): State<Arc<DbClient>>,
    AuthenticatedUser(user): AuthenticatedUser,
) -> Result<Redirect> {
    let post = db
        .fetch_post(id)
        .await?
        .ok_or(ServerError::PostByIdNotFound(id))?;

    access::authorize_owner(&user, &post)?;

    // Deleting a post that a concurrent request already removed is fine.
    db.delete_post(id).await?;

    Ok(Redirect::to("/my-blogs"))
}

fn parse_post_form(form: PostForm) -> Result<(PostTitle, PostBody), &'static str> {
    let title =
        PostTitle::new(form.title).map_err(|_| "Please provide a title of 1 to 200 characters")?;
    let body = PostBody::new(form.body).map_err(|_| "The post body must not be empty")?;

    Ok((title, body))
}

#[cfg(test)]
mod tests {
    use crate::server::routes::posts::{PostForm, parse_post_form};

    #[test]
    fn well_formed_posts_parse() {
        let (title, body) = parse_post_form(PostForm {
            title: "First post".to_owned(),
            body: "Hello".to_owned(),
        })
        .unwrap();

        assert_eq!(title.get(), "First post");
        assert_eq!(body.get(), "Hello");
    }

    #[test]
    fn empty_titles_are_reported() {
        let err = parse_post_form(PostForm {
            title: String::new(),
            body: "Hello".to_owned(),
        })
        .unwrap_err();

        assert_eq!(err, "Please provide a title of 1 to 200 characters");
    }

    #[test]
    fn empty_bodies_are_reported() {
        let err = parse_post_form(PostForm {
            title: "First post".to_owned(),
            body: String::new(),
        })
        .unwrap_err();

        assert_eq!(err, "The post body must not be empty");
    }
}
