//! Ownership decisions for the mutating post routes.

use crate::server::{Result, ServerError, session::SessionUser};
use federkiel_common::model::post::Post;

/// Pure decision over session identity and resource owner.
///
/// An anonymous request never reaches this point; the denial here is the
/// explicit kind, distinguishable from the login redirect.
pub fn authorize_owner(user: &SessionUser, post: &Post) -> Result<()> {
    if user.id == post.author_id {
        Ok(())
    } else {
        Err(ServerError::AccessDenied)
    }
}

#[cfg(test)]
mod tests {
    use crate::server::{ServerError, access::authorize_owner, session::SessionUser};
    use federkiel_common::model::{
        post::{Post, PostBody, PostTitle},
        user::Username,
    };
    use time::macros::utc_datetime;

    fn post_owned_by(author_id: i64) -> Post {
        Post {
            id: 1.into(),
            title: PostTitle::new("T".to_owned()).unwrap(),
            body: PostBody::new("C".to_owned()).unwrap(),
            author_name: Username::new("alice".to_owned()).unwrap(),
            author_id: author_id.into(),
            created_at: utc_datetime!(2026-01-01 12:00),
            updated_at: utc_datetime!(2026-01-01 12:00),
        }
    }

    #[test]
    fn owner_is_authorized() {
        let alice = SessionUser {
            id: 1.into(),
            name: Username::new("alice".to_owned()).unwrap(),
        };

        assert!(authorize_owner(&alice, &post_owned_by(1)).is_ok());
    }

    #[test]
    fn non_owner_is_denied() {
        let bob = SessionUser {
            id: 2.into(),
            name: Username::new("bob".to_owned()).unwrap(),
        };

        assert!(matches!(
            authorize_owner(&bob, &post_owned_by(1)),
            Err(ServerError::AccessDenied)
        ));
    }
}
