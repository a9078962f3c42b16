//! Server-side HTML rendering.
//!
//! Every piece of user-supplied text passes through [`escape`] before it is
//! embedded in markup.

use axum::{http::StatusCode, response::Html};
use federkiel_common::model::{post::Post, user::Username};
use std::fmt::Write;
use time::{UtcDateTime, macros::format_description};

/// The login and registration pages only ever serve anonymous visitors;
/// authenticated requests are redirected before rendering.
pub fn login_page(error: Option<&str>) -> Html<String> {
    let mut body = String::from("<h1>Log in</h1>\n");
    push_error(&mut body, error);
    body.push_str(
        "<form method=\"post\" action=\"/login\">\n\
         <label>Username <input type=\"text\" name=\"username\" required></label>\n\
         <label>Password <input type=\"password\" name=\"password\" required></label>\n\
         <button type=\"submit\">Log in</button>\n\
         </form>\n\
         <p>No account yet? <a href=\"/register\">Register</a></p>\n",
    );

    layout("Log in", None, &body)
}

pub fn register_page(error: Option<&str>) -> Html<String> {
    let mut body = String::from("<h1>Register</h1>\n");
    push_error(&mut body, error);
    body.push_str(
        "<form method=\"post\" action=\"/register\">\n\
         <label>Username <input type=\"text\" name=\"username\" required></label>\n\
         <label>Password <input type=\"password\" name=\"password\" required></label>\n\
         <label>Confirm password \
         <input type=\"password\" name=\"confirm_password\" required></label>\n\
         <button type=\"submit\">Register</button>\n\
         </form>\n\
         <p>Already have an account? <a href=\"/login\">Log in</a></p>\n",
    );

    layout("Register", None, &body)
}

pub fn index_page(posts: &[Post], user: Option<&Username>) -> Html<String> {
    let mut body = String::from("<h1>All blogs</h1>\n");

    if posts.is_empty() {
        body.push_str("<p>No blogs yet.</p>\n");
    }
    for post in posts {
        let _ = write!(
            body,
            "<article>\n\
             <h2><a href=\"/blog/{id}\">{title}</a></h2>\n\
             <p class=\"meta\">by {author} on {date}</p>\n\
             </article>\n",
            id = post.id,
            title = escape(post.title.get()),
            author = escape(post.author_name.get()),
            date = format_date(post.created_at),
        );
    }

    layout("All blogs", user, &body)
}

pub fn my_blogs_page(posts: &[Post], user: &Username) -> Html<String> {
    let mut body = format!("<h1>{}&#39;s blogs</h1>\n", escape(user.get()));

    if posts.is_empty() {
        body.push_str("<p>You have not written anything yet. <a href=\"/create-blog\">Start now</a>.</p>\n");
    }
    for post in posts {
        let _ = write!(
            body,
            "<article>\n\
             <h2><a href=\"/blog/{id}\">{title}</a></h2>\n\
             <p class=\"meta\">last updated {date}</p>\n\
             <a href=\"/edit-blog/{id}\">Edit</a>\n\
             <form method=\"post\" action=\"/delete-blog/{id}\">\
             <button type=\"submit\">Delete</button></form>\n\
             </article>\n",
            id = post.id,
            title = escape(post.title.get()),
            date = format_date(post.updated_at),
        );
    }

    layout("My blogs", Some(user), &body)
}

pub fn view_page(post: &Post, user: Option<&Username>, can_edit: bool) -> Html<String> {
    let mut body = format!(
        "<article>\n\
         <h1>{title}</h1>\n\
         <p class=\"meta\">by {author} on {date}</p>\n\
         <div>{content}</div>\n\
         </article>\n",
        title = escape(post.title.get()),
        author = escape(post.author_name.get()),
        date = format_date(post.created_at),
        content = escape(post.body.get()),
    );

    if can_edit {
        let _ = write!(
            body,
            "<a href=\"/edit-blog/{id}\">Edit</a>\n\
             <form method=\"post\" action=\"/delete-blog/{id}\">\
             <button type=\"submit\">Delete</button></form>\n",
            id = post.id,
        );
    }

    layout(post.title.get(), user, &body)
}

pub fn create_page(user: &Username, error: Option<&str>) -> Html<String> {
    let mut body = String::from("<h1>New blog</h1>\n");
    push_error(&mut body, error);
    body.push_str(
        "<form method=\"post\" action=\"/submit-blog\">\n\
         <label>Title <input type=\"text\" name=\"title\" required></label>\n\
         <label>Content <textarea name=\"body\" required></textarea></label>\n\
         <button type=\"submit\">Publish</button>\n\
         </form>\n",
    );

    layout("New blog", Some(user), &body)
}

pub fn edit_page(post: &Post, user: &Username, error: Option<&str>) -> Html<String> {
    let mut body = String::from("<h1>Edit blog</h1>\n");
    push_error(&mut body, error);
    let _ = write!(
        body,
        "<form method=\"post\" action=\"/edit-blog/{id}\">\n\
         <label>Title <input type=\"text\" name=\"title\" value=\"{title}\" required></label>\n\
         <label>Content <textarea name=\"body\" required>{content}</textarea></label>\n\
         <button type=\"submit\">Save</button>\n\
         </form>\n",
        id = post.id,
        title = escape(post.title.get()),
        content = escape(post.body.get()),
    );

    layout("Edit blog", Some(user), &body)
}

pub fn error_page(status: StatusCode, message: &str) -> Html<String> {
    let body = format!(
        "<h1>{status}</h1>\n<p>{message}</p>\n<p><a href=\"/\">Back to all blogs</a></p>\n",
        message = escape(message),
    );

    layout(message, None, &body)
}

fn layout(title: &str, user: Option<&Username>, body: &str) -> Html<String> {
    let nav = match user {
        Some(name) => format!(
            "<a href=\"/\">All blogs</a> \
             <a href=\"/my-blogs\">My blogs</a> \
             <a href=\"/create-blog\">New blog</a> \
             <a href=\"/logout\">Log out ({})</a>",
            escape(name.get()),
        ),
        None => "<a href=\"/\">All blogs</a> \
                 <a href=\"/login\">Log in</a> \
                 <a href=\"/register\">Register</a>"
            .to_owned(),
    };

    Html(format!(
        "<!DOCTYPE html>\n\
         <html lang=\"en\">\n\
         <head>\n\
         <meta charset=\"utf-8\">\n\
         <title>{title} - Federkiel</title>\n\
         </head>\n\
         <body>\n\
         <nav>{nav}</nav>\n\
         <main>\n{body}</main>\n\
         </body>\n\
         </html>\n",
        title = escape(title),
    ))
}

fn push_error(body: &mut String, error: Option<&str>) {
    if let Some(message) = error {
        let _ = writeln!(body, "<p class=\"error\">{}</p>", escape(message));
    }
}

fn format_date(datetime: UtcDateTime) -> String {
    datetime
        .format(format_description!("[year]-[month]-[day] [hour]:[minute]"))
        .unwrap_or_else(|_| datetime.to_string())
}

fn escape(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use crate::server::render;
    use axum::response::Html;
    use federkiel_common::model::{
        post::{Post, PostBody, PostTitle},
        user::Username,
    };
    use time::macros::utc_datetime;

    fn sample_post() -> Post {
        Post {
            id: 7.into(),
            title: PostTitle::new("<script>alert(1)</script>".to_owned()).unwrap(),
            body: PostBody::new("a & b < c".to_owned()).unwrap(),
            author_name: Username::new("alice".to_owned()).unwrap(),
            author_id: 1.into(),
            created_at: utc_datetime!(2026-02-03 09:30),
            updated_at: utc_datetime!(2026-02-04 10:00),
        }
    }

    #[test]
    fn escape_neutralizes_markup() {
        assert_eq!(
            render::escape("<b>\"x\" & 'y'</b>"),
            "&lt;b&gt;&quot;x&quot; &amp; &#39;y&#39;&lt;/b&gt;"
        );
        assert_eq!(render::escape("plain"), "plain");
    }

    #[test]
    fn view_page_escapes_user_content() {
        let Html(page) = render::view_page(&sample_post(), None, false);

        assert!(!page.contains("<script>"));
        assert!(page.contains("&lt;script&gt;alert(1)&lt;/script&gt;"));
        assert!(page.contains("a &amp; b &lt; c"));
        assert!(page.contains("2026-02-03 09:30"));
    }

    #[test]
    fn view_page_shows_edit_controls_only_to_the_owner() {
        let post = sample_post();

        let Html(for_owner) = render::view_page(&post, None, true);
        let Html(for_visitor) = render::view_page(&post, None, false);

        assert!(for_owner.contains("/edit-blog/7"));
        assert!(for_owner.contains("/delete-blog/7"));
        assert!(!for_visitor.contains("/edit-blog/7"));
        assert!(!for_visitor.contains("/delete-blog/7"));
    }

    #[test]
    fn login_page_carries_the_error_message() {
        let Html(page) = render::login_page(Some("Invalid username or password"));
        assert!(page.contains("Invalid username or password"));

        let Html(clean) = render::login_page(None);
        assert!(!clean.contains("class=\"error\""));
    }

    #[test]
    fn nav_follows_session_state() {
        let alice = Username::new("alice".to_owned()).unwrap();

        let Html(signed_in) = render::index_page(&[], Some(&alice));
        assert!(signed_in.contains("/logout"));
        assert!(!signed_in.contains("/login"));

        let Html(anonymous) = render::index_page(&[], None);
        assert!(anonymous.contains("/login"));
        assert!(!anonymous.contains("/logout"));
    }
}
