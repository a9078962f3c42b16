use crate::model::{
    Id,
    user::{UserMarker, Username},
};
use thiserror::Error;
use time::UtcDateTime;

pub const POST_TITLE_MAX_LEN: usize = 200;

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash)]
pub struct PostMarker;

/// A published blog post.
///
/// `author_name` is captured from the session at creation time and kept even
/// though it duplicates the owning account's name; `author_id` is never
/// reassigned.
#[derive(Clone, Eq, PartialEq, Debug, Hash)]
pub struct Post {
    pub id: Id<PostMarker>,
    pub title: PostTitle,
    pub body: PostBody,
    pub author_name: Username,
    pub author_id: Id<UserMarker>,
    pub created_at: UtcDateTime,
    pub updated_at: UtcDateTime,
}

#[derive(Clone, Eq, PartialEq, Debug, Hash)]
pub struct NewPost {
    pub title: PostTitle,
    pub body: PostBody,
    pub author_name: Username,
    pub author_id: Id<UserMarker>,
}

/// Owner-supplied replacement for a post's title and body.
#[derive(Clone, Eq, PartialEq, Debug, Default, Hash)]
pub struct PostRevision {
    pub title: PostTitle,
    pub body: PostBody,
}

#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash)]
pub struct PostTitle(String);

#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash, Error)]
#[error("The post title is invalid: {0:?}")]
pub struct InvalidPostTitleError(String);

impl PostTitle {
    pub fn new(title: String) -> Result<Self, InvalidPostTitleError> {
        let length = title.chars().count();
        if length == 0 || length > POST_TITLE_MAX_LEN {
            Err(InvalidPostTitleError(title))
        } else {
            Ok(PostTitle(title))
        }
    }

    #[must_use]
    pub fn get(&self) -> &str {
        &self.0
    }
}

#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash)]
pub struct PostBody(String);

#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash, Error)]
#[error("The post body must not be empty")]
pub struct InvalidPostBodyError;

impl PostBody {
    pub fn new(body: String) -> Result<Self, InvalidPostBodyError> {
        if body.is_empty() {
            Err(InvalidPostBodyError)
        } else {
            Ok(PostBody(body))
        }
    }

    #[must_use]
    pub fn get(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use crate::model::post::{POST_TITLE_MAX_LEN, PostBody, PostTitle};

    #[test]
    fn legal_titles() {
        assert!(PostTitle::new("T".to_owned()).is_ok());
        assert!(PostTitle::new("x".repeat(POST_TITLE_MAX_LEN)).is_ok());
    }

    #[test]
    fn illegal_titles() {
        assert!(PostTitle::new(String::new()).is_err());
        assert!(PostTitle::new("x".repeat(POST_TITLE_MAX_LEN + 1)).is_err());
    }

    #[test]
    fn bodies_must_not_be_empty() {
        assert!(PostBody::new("C".to_owned()).is_ok());
        assert!(PostBody::new(String::new()).is_err());
    }
}
