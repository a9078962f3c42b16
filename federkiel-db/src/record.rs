use federkiel_common::model::{
    ModelValidationError,
    password::HashedPassword,
    post::{Post, PostBody, PostTitle},
    session::Session,
    user::{Credential, User, Username},
};
use sqlx::FromRow;
use time::PrimitiveDateTime;

#[derive(Clone, Eq, PartialEq, Debug, Default, Hash, FromRow)]
pub(crate) struct UserRecord {
    pub id: i64,
    pub username: String,
}

#[derive(Clone, Eq, PartialEq, Debug, Default, Hash, FromRow)]
pub(crate) struct CredentialRecord {
    pub id: i64,
    pub username: String,
    pub password_hash: String,
}

#[derive(Clone, Eq, PartialEq, Debug, FromRow)]
pub(crate) struct PostRecord {
    pub id: i64,
    pub title: String,
    pub body: String,
    pub author_name: String,
    pub user_id: i64,
    pub created_at: PrimitiveDateTime,
    pub updated_at: PrimitiveDateTime,
}

#[derive(Clone, Eq, PartialEq, Debug, FromRow)]
pub(crate) struct SessionRecord {
    pub token: String,
    pub user_id: i64,
    pub username: String,
    pub created_at: PrimitiveDateTime,
    pub expires_at: PrimitiveDateTime,
}

impl TryFrom<UserRecord> for User {
    type Error = ModelValidationError;

    fn try_from(value: UserRecord) -> Result<Self, Self::Error> {
        Ok(Self {
            id: value.id.into(),
            name: Username::new(value.username)?,
        })
    }
}

impl TryFrom<CredentialRecord> for Credential {
    type Error = ModelValidationError;

    fn try_from(value: CredentialRecord) -> Result<Self, Self::Error> {
        Ok(Self {
            user: User {
                id: value.id.into(),
                name: Username::new(value.username)?,
            },
            password_hash: HashedPassword::from_stored(value.password_hash),
        })
    }
}

impl TryFrom<PostRecord> for Post {
    type Error = ModelValidationError;

    fn try_from(value: PostRecord) -> Result<Self, Self::Error> {
        Ok(Self {
            id: value.id.into(),
            title: PostTitle::new(value.title)?,
            body: PostBody::new(value.body)?,
            author_name: Username::new(value.author_name)?,
            author_id: value.user_id.into(),
            created_at: value.created_at.as_utc(),
            updated_at: value.updated_at.as_utc(),
        })
    }
}

impl TryFrom<SessionRecord> for Session {
    type Error = ModelValidationError;

    fn try_from(value: SessionRecord) -> Result<Self, Self::Error> {
        Ok(Self {
            token: value.token.parse()?,
            user_id: value.user_id.into(),
            username: Username::new(value.username)?,
            created_at: value.created_at.as_utc(),
            expires_at: value.expires_at.as_utc(),
        })
    }
}
