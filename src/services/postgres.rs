use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::time::Duration;

use crate::models::{Match, MatchStatus, Message, NewUser, ProfileUpdate, User, UserId};
use crate::services::store::{Store, StoreError, StoreResult};

const USER_COLUMNS: &str = "id, username, email, password_hash, first_name, last_name, birth_date, \
     department, job_title, bio, profile_image_url, gender, interested_in_genders, active, \
     created_at, updated_at";

const MATCH_COLUMNS: &str = "id, initiator_id, recipient_id, status, created_at, matched_at";

const MESSAGE_COLUMNS: &str = "id, sender_id, recipient_id, content, sent_at, read_at";

/// PostgreSQL-backed store
///
/// The `matches` table carries a unique index over
/// `(LEAST(initiator_id, recipient_id), GREATEST(initiator_id, recipient_id))`,
/// which is what makes concurrent likes on the same pair safe.
pub struct PostgresClient {
    pool: PgPool,
}

impl PostgresClient {
    /// Create a new PostgreSQL client from a connection string
    pub async fn new(
        database_url: &str,
        max_connections: u32,
        min_connections: u32,
        acquire_timeout: Duration,
        idle_timeout: Duration,
    ) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .min_connections(min_connections)
            .acquire_timeout(acquire_timeout)
            .idle_timeout(idle_timeout)
            .test_before_acquire(true)
            .connect(database_url)
            .await?;

        // Run migrations on startup
        sqlx::migrate!("./migrations").run(&pool).await?;

        Ok(Self { pool })
    }

    /// Create a new PostgreSQL client from settings
    pub async fn from_settings(
        url: &str,
        max_connections: Option<u32>,
        min_connections: Option<u32>,
        acquire_timeout_secs: Option<u64>,
        idle_timeout_secs: Option<u64>,
    ) -> Result<Self, StoreError> {
        tracing::info!("Connecting to PostgreSQL");

        Self::new(
            url,
            max_connections.unwrap_or(10),
            min_connections.unwrap_or(1),
            Duration::from_secs(acquire_timeout_secs.unwrap_or(5)),
            Duration::from_secs(idle_timeout_secs.unwrap_or(600)),
        )
        .await
    }
}

fn map_unique_violation(err: sqlx::Error, what: &str) -> StoreError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => StoreError::Duplicate(what.to_string()),
        _ => StoreError::SqlxError(err),
    }
}

#[async_trait]
impl Store for PostgresClient {
    async fn create_user(&self, new_user: NewUser) -> StoreResult<User> {
        let query = format!(
            r#"
            INSERT INTO users (username, email, password_hash, first_name, last_name, birth_date,
                               department, job_title, gender, interested_in_genders)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING {USER_COLUMNS}
            "#
        );

        let user = sqlx::query_as::<_, User>(&query)
            .bind(&new_user.username)
            .bind(&new_user.email)
            .bind(&new_user.password_hash)
            .bind(&new_user.first_name)
            .bind(&new_user.last_name)
            .bind(new_user.birth_date)
            .bind(&new_user.department)
            .bind(&new_user.job_title)
            .bind(new_user.gender)
            .bind(&new_user.interested_in_genders)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| map_unique_violation(e, &new_user.username))?;

        tracing::info!("Created user {} ({})", user.id, user.username);

        Ok(user)
    }

    async fn find_user(&self, id: UserId) -> StoreResult<Option<User>> {
        let query = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");

        let user = sqlx::query_as::<_, User>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    async fn find_users(&self, ids: &[UserId]) -> StoreResult<Vec<User>> {
        let query = format!("SELECT {USER_COLUMNS} FROM users WHERE id = ANY($1) ORDER BY id");

        let users = sqlx::query_as::<_, User>(&query)
            .bind(ids)
            .fetch_all(&self.pool)
            .await?;

        Ok(users)
    }

    async fn update_profile(&self, id: UserId, update: &ProfileUpdate) -> StoreResult<Option<User>> {
        let query = format!(
            r#"
            UPDATE users SET
                first_name = $2,
                last_name = $3,
                bio = $4,
                department = $5,
                job_title = $6,
                profile_image_url = $7,
                interested_in_genders = $8,
                updated_at = NOW()
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        );

        let user = sqlx::query_as::<_, User>(&query)
            .bind(id)
            .bind(&update.first_name)
            .bind(&update.last_name)
            .bind(&update.bio)
            .bind(&update.department)
            .bind(&update.job_title)
            .bind(&update.profile_image_url)
            .bind(&update.interested_in_genders)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    async fn find_potential_matches(&self, viewer: &User) -> StoreResult<Vec<User>> {
        // `department = NULL` matches nothing, and `&&` against an empty
        // array is false, so such viewers get no candidates.
        let query = format!(
            r#"
            SELECT {USER_COLUMNS}
            FROM users
            WHERE id <> $1
              AND active
              AND interested_in_genders && $2
              AND department = $3
            ORDER BY id
            "#
        );

        let users = sqlx::query_as::<_, User>(&query)
            .bind(viewer.id)
            .bind(&viewer.interested_in_genders)
            .bind(&viewer.department)
            .fetch_all(&self.pool)
            .await?;

        tracing::debug!("Found {} potential matches for user {}", users.len(), viewer.id);

        Ok(users)
    }

    async fn find_match_between(&self, a: UserId, b: UserId) -> StoreResult<Option<Match>> {
        let query = format!(
            r#"
            SELECT {MATCH_COLUMNS}
            FROM matches
            WHERE (initiator_id = $1 AND recipient_id = $2)
               OR (initiator_id = $2 AND recipient_id = $1)
            "#
        );

        let record = sqlx::query_as::<_, Match>(&query)
            .bind(a)
            .bind(b)
            .fetch_optional(&self.pool)
            .await?;

        Ok(record)
    }

    async fn insert_pending_match(&self, initiator: UserId, recipient: UserId) -> StoreResult<Option<Match>> {
        let query = format!(
            r#"
            INSERT INTO matches (initiator_id, recipient_id, status)
            VALUES ($1, $2, $3)
            ON CONFLICT DO NOTHING
            RETURNING {MATCH_COLUMNS}
            "#
        );

        let record = sqlx::query_as::<_, Match>(&query)
            .bind(initiator)
            .bind(recipient)
            .bind(MatchStatus::Pending)
            .fetch_optional(&self.pool)
            .await?;

        Ok(record)
    }

    async fn transition_match(&self, id: i64, from: MatchStatus, to: MatchStatus) -> StoreResult<Option<Match>> {
        let matched_at: Option<DateTime<Utc>> = (to == MatchStatus::Matched).then(Utc::now);

        let query = format!(
            r#"
            UPDATE matches
            SET status = $3,
                matched_at = COALESCE($4, matched_at)
            WHERE id = $1 AND status = $2
            RETURNING {MATCH_COLUMNS}
            "#
        );

        let record = sqlx::query_as::<_, Match>(&query)
            .bind(id)
            .bind(from)
            .bind(to)
            .bind(matched_at)
            .fetch_optional(&self.pool)
            .await?;

        Ok(record)
    }

    async fn find_matched_for_user(&self, user_id: UserId) -> StoreResult<Vec<Match>> {
        let query = format!(
            r#"
            SELECT {MATCH_COLUMNS}
            FROM matches
            WHERE (initiator_id = $1 OR recipient_id = $1) AND status = $2
            ORDER BY created_at, id
            "#
        );

        let records = sqlx::query_as::<_, Match>(&query)
            .bind(user_id)
            .bind(MatchStatus::Matched)
            .fetch_all(&self.pool)
            .await?;

        Ok(records)
    }

    async fn find_pending_for_recipient(&self, user_id: UserId) -> StoreResult<Vec<Match>> {
        let query = format!(
            r#"
            SELECT {MATCH_COLUMNS}
            FROM matches
            WHERE recipient_id = $1 AND status = $2
            ORDER BY created_at, id
            "#
        );

        let records = sqlx::query_as::<_, Match>(&query)
            .bind(user_id)
            .bind(MatchStatus::Pending)
            .fetch_all(&self.pool)
            .await?;

        Ok(records)
    }

    async fn insert_message(&self, sender: UserId, recipient: UserId, content: &str) -> StoreResult<Message> {
        let query = format!(
            r#"
            INSERT INTO messages (sender_id, recipient_id, content)
            VALUES ($1, $2, $3)
            RETURNING {MESSAGE_COLUMNS}
            "#
        );

        let message = sqlx::query_as::<_, Message>(&query)
            .bind(sender)
            .bind(recipient)
            .bind(content)
            .fetch_one(&self.pool)
            .await?;

        Ok(message)
    }

    async fn find_messages_between(&self, a: UserId, b: UserId) -> StoreResult<Vec<Message>> {
        let query = format!(
            r#"
            SELECT {MESSAGE_COLUMNS}
            FROM messages
            WHERE (sender_id = $1 AND recipient_id = $2)
               OR (sender_id = $2 AND recipient_id = $1)
            ORDER BY sent_at ASC, id ASC
            "#
        );

        let messages = sqlx::query_as::<_, Message>(&query)
            .bind(a)
            .bind(b)
            .fetch_all(&self.pool)
            .await?;

        Ok(messages)
    }

    async fn mark_read(&self, recipient: UserId, ids: &[i64], read_at: DateTime<Utc>) -> StoreResult<u64> {
        if ids.is_empty() {
            return Ok(0);
        }

        let query = r#"
            UPDATE messages
            SET read_at = $3
            WHERE recipient_id = $1 AND id = ANY($2) AND read_at IS NULL
        "#;

        let result = sqlx::query(query)
            .bind(recipient)
            .bind(ids)
            .bind(read_at)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    async fn find_unread_for(&self, user_id: UserId) -> StoreResult<Vec<Message>> {
        let query = format!(
            r#"
            SELECT {MESSAGE_COLUMNS}
            FROM messages
            WHERE recipient_id = $1 AND read_at IS NULL
            ORDER BY id
            "#
        );

        let messages = sqlx::query_as::<_, Message>(&query)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(messages)
    }

    /// Health check for the database connection
    async fn health_check(&self) -> StoreResult<bool> {
        sqlx::query("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map(|_| true)
            .map_err(Into::into)
    }
}
