use crate::record::{CredentialRecord, PostRecord, SessionRecord, UserRecord};
use federkiel_common::model::{
    Id, ModelValidationError,
    post::{NewPost, Post, PostMarker, PostRevision},
    session::{Session, SessionToken},
    user::{CreateUser, Credential, User, UserMarker, Username},
};
use sqlx::{
    PgPool,
    postgres::{PgConnectOptions, PgPoolOptions},
    query, query_as,
};
use thiserror::Error;
use time::{PrimitiveDateTime, UtcDateTime};

pub type Result<T, E = DbError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum DbError {
    #[error("An object in the database was invalid: {0}")]
    Data(#[from] ModelValidationError),
    #[error("The username is already taken")]
    UsernameTaken,
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

/// Connection parameters, sourced from the process environment by the caller.
#[derive(Clone, Eq, PartialEq, Debug, Hash)]
pub struct DbConfig {
    pub host: String,
    pub port: u16,
    pub database: String,
    pub user: String,
    pub password: String,
}

const MAX_CONNECTIONS: u32 = 5;

pub struct DbClient {
    pool: PgPool,
}

impl DbClient {
    pub async fn connect(config: &DbConfig) -> Result<Self> {
        let options = PgConnectOptions::new()
            .host(&config.host)
            .port(config.port)
            .database(&config.database)
            .username(&config.user)
            .password(&config.password);

        let pool = PgPoolOptions::new()
            .max_connections(MAX_CONNECTIONS)
            .connect_with(options)
            .await?;

        Ok(Self { pool })
    }

    /// Creates the tables on first start; subsequent starts are no-ops.
    pub async fn ensure_schema(&self) -> Result<()> {
        query(
            "
            CREATE TABLE IF NOT EXISTS users (
                id BIGSERIAL PRIMARY KEY,
                username TEXT NOT NULL UNIQUE,
                password_hash TEXT NOT NULL,
                created_at TIMESTAMP NOT NULL DEFAULT (now() AT TIME ZONE 'utc')
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        query(
            "
            CREATE TABLE IF NOT EXISTS posts (
                id BIGSERIAL PRIMARY KEY,
                title TEXT NOT NULL,
                body TEXT NOT NULL,
                author_name TEXT NOT NULL,
                user_id BIGINT NOT NULL REFERENCES users (id),
                created_at TIMESTAMP NOT NULL DEFAULT (now() AT TIME ZONE 'utc'),
                updated_at TIMESTAMP NOT NULL DEFAULT (now() AT TIME ZONE 'utc')
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        query(
            "
            CREATE TABLE IF NOT EXISTS sessions (
                token TEXT PRIMARY KEY,
                user_id BIGINT NOT NULL REFERENCES users (id),
                username TEXT NOT NULL,
                created_at TIMESTAMP NOT NULL,
                expires_at TIMESTAMP NOT NULL
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }

    pub async fn fetch_credential(&self, name: &Username) -> Result<Option<Credential>> {
        let record = query_as::<_, CredentialRecord>(
            "
            SELECT
                users.id,
                users.username,
                users.password_hash
            FROM
                users
            WHERE
                users.username = $1
            ",
        )
        .bind(name.get())
        .fetch_optional(&self.pool)
        .await?;

        let credential = record.map(Credential::try_from).transpose()?;
        Ok(credential)
    }

    pub async fn create_user(&self, user: &CreateUser) -> Result<User> {
        let record = query_as::<_, UserRecord>(
            "
            INSERT INTO users (username, password_hash)
            VALUES ($1, $2)
            RETURNING users.id, users.username
            ",
        )
        .bind(user.name.get())
        .bind(user.password_hash.as_phc_str())
        .fetch_one(&self.pool)
        .await
        .map_err(unique_name_violation)?;

        Ok(record.try_into()?)
    }

    pub async fn list_posts(&self) -> Result<Vec<Post>> {
        let records = query_as::<_, PostRecord>(
            "
            SELECT
                posts.id,
                posts.title,
                posts.body,
                posts.author_name,
                posts.user_id,
                posts.created_at,
                posts.updated_at
            FROM
                posts
            ORDER BY
                posts.created_at DESC, posts.id DESC
            ",
        )
        .fetch_all(&self.pool)
        .await?;

        collect_posts(records)
    }

    pub async fn list_posts_by_author(&self, author_id: Id<UserMarker>) -> Result<Vec<Post>> {
        let records = query_as::<_, PostRecord>(
            "
            SELECT
                posts.id,
                posts.title,
                posts.body,
                posts.author_name,
                posts.user_id,
                posts.created_at,
                posts.updated_at
            FROM
                posts
            WHERE
                posts.user_id = $1
            ORDER BY
                posts.created_at DESC, posts.id DESC
            ",
        )
        .bind(author_id.get())
        .fetch_all(&self.pool)
        .await?;

        collect_posts(records)
    }

    pub async fn fetch_post(&self, post_id: Id<PostMarker>) -> Result<Option<Post>> {
        let record = query_as::<_, PostRecord>(
            "
            SELECT
                posts.id,
                posts.title,
                posts.body,
                posts.author_name,
                posts.user_id,
                posts.created_at,
                posts.updated_at
            FROM
                posts
            WHERE
                posts.id = $1
            ",
        )
        .bind(post_id.get())
        .fetch_optional(&self.pool)
        .await?;

        let post = record.map(Post::try_from).transpose()?;
        Ok(post)
    }

    pub async fn create_post(&self, post: &NewPost) -> Result<Post> {
        let record = query_as::<_, PostRecord>(
            "
            INSERT INTO posts (title, body, author_name, user_id)
            VALUES ($1, $2, $3, $4)
            RETURNING
                posts.id,
                posts.title,
                posts.body,
                posts.author_name,
                posts.user_id,
                posts.created_at,
                posts.updated_at
            ",
        )
        .bind(post.title.get())
        .bind(post.body.get())
        .bind(post.author_name.get())
        .bind(post.author_id.get())
        .fetch_one(&self.pool)
        .await?;

        Ok(record.try_into()?)
    }

    /// Concurrent revisions of the same post are last-write-wins by policy.
    pub async fn update_post(
        &self,
        post_id: Id<PostMarker>,
        revision: &PostRevision,
    ) -> Result<Option<Post>> {
        let record = query_as::<_, PostRecord>(
            "
            UPDATE posts
            SET title = $2, body = $3, updated_at = (now() AT TIME ZONE 'utc')
            WHERE posts.id = $1
            RETURNING
                posts.id,
                posts.title,
                posts.body,
                posts.author_name,
                posts.user_id,
                posts.created_at,
                posts.updated_at
            ",
        )
        .bind(post_id.get())
        .bind(revision.title.get())
        .bind(revision.body.get())
        .fetch_optional(&self.pool)
        .await?;

        let post = record.map(Post::try_from).transpose()?;
        Ok(post)
    }

    pub async fn delete_post(&self, post_id: Id<PostMarker>) -> Result<bool> {
        let result = query("DELETE FROM posts WHERE posts.id = $1")
            .bind(post_id.get())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn create_session(&self, session: &Session) -> Result<()> {
        query(
            "
            INSERT INTO sessions (token, user_id, username, created_at, expires_at)
            VALUES ($1, $2, $3, $4, $5)
            ",
        )
        .bind(session.token.as_cookie_value())
        .bind(session.user_id.get())
        .bind(session.username.get())
        .bind(as_primitive(session.created_at))
        .bind(as_primitive(session.expires_at))
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn fetch_session(&self, token: &SessionToken) -> Result<Option<Session>> {
        let record = query_as::<_, SessionRecord>(
            "
            SELECT
                sessions.token,
                sessions.user_id,
                sessions.username,
                sessions.created_at,
                sessions.expires_at
            FROM
                sessions
            WHERE
                sessions.token = $1
            ",
        )
        .bind(token.as_cookie_value())
        .fetch_optional(&self.pool)
        .await?;

        let session = record.map(Session::try_from).transpose()?;
        Ok(session)
    }

    /// Idempotent: deleting an absent session succeeds.
    pub async fn delete_session(&self, token: &SessionToken) -> Result<()> {
        query("DELETE FROM sessions WHERE sessions.token = $1")
            .bind(token.as_cookie_value())
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Expired rows are rejected at the gate; this sweeps them from storage.
    pub async fn delete_expired_sessions(&self) -> Result<u64> {
        let result = query("DELETE FROM sessions WHERE sessions.expires_at <= $1")
            .bind(as_primitive(UtcDateTime::now()))
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}

fn collect_posts(records: Vec<PostRecord>) -> Result<Vec<Post>> {
    let posts = records
        .into_iter()
        .map(Post::try_from)
        .collect::<Result<_, _>>()?;
    Ok(posts)
}

fn unique_name_violation(err: sqlx::Error) -> DbError {
    match err {
        sqlx::Error::Database(db_err) if db_err.is_unique_violation() => DbError::UsernameTaken,
        other => other.into(),
    }
}

fn as_primitive(datetime: UtcDateTime) -> PrimitiveDateTime {
    PrimitiveDateTime::new(datetime.date(), datetime.time())
}
