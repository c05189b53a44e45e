//! `SQLite` implementation of [`UserStore`].

use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row, SqliteConnection, SqlitePool};

use safelink_app::ports::UserStore;
use safelink_domain::error::{ConflictError, SafelinkError};
use safelink_domain::id::UserId;
use safelink_domain::user::{NotificationChannel, Subscription, User, UserBuilder, UserStatus};

use crate::columns::{integer_param, parse, parse_optional_time, parse_time, version_from_column};
use crate::error::{StorageError, decode_err};

/// Row of the `users` table, still missing its subscriptions.
struct Wrapper {
    id: UserId,
    builder: UserBuilder,
}

impl<'r> FromRow<'r, SqliteRow> for Wrapper {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let id: String = row.try_get("id")?;
        let name: String = row.try_get("name")?;
        let email: String = row.try_get("email")?;
        let phone_number: String = row.try_get("phone_number")?;
        let is_active: bool = row.try_get("is_active")?;
        let requires_approval: bool = row.try_get("requires_approval")?;
        let channels_json: String = row.try_get("notification_channels")?;
        let version: i64 = row.try_get("version")?;

        let id: UserId = parse(&id)?;
        let channels: Vec<NotificationChannel> =
            serde_json::from_str(&channels_json).map_err(decode_err)?;

        let builder = User::builder()
            .id(id)
            .name(name)
            .email(email)
            .phone_number(phone_number)
            .is_active(is_active)
            .requires_approval(requires_approval)
            .notification_channels(channels)
            .version(version_from_column(version)?);

        Ok(Self { id, builder })
    }
}

struct SubscriptionRow(Subscription);

impl<'r> FromRow<'r, SqliteRow> for SubscriptionRow {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let id: String = row.try_get("id")?;
        let subscriber_id: String = row.try_get("subscriber_id")?;
        let subscribed_to_id: String = row.try_get("subscribed_to_id")?;
        let status: String = row.try_get("status")?;
        let created_at: String = row.try_get("created_at")?;
        let approved_at: Option<String> = row.try_get("approved_at")?;
        let last_known_status: Option<String> = row.try_get("last_known_status")?;

        let last_known_status: Option<UserStatus> =
            last_known_status.as_deref().map(parse).transpose()?;

        Ok(Self(
            Subscription::restore(parse(&subscriber_id)?, parse(&subscribed_to_id)?)
                .id(parse(&id)?)
                .status(parse(&status)?)
                .created_at(parse_time(&created_at)?)
                .approved_at(parse_optional_time(approved_at)?)
                .last_known_status(last_known_status)
                .finish(),
        ))
    }
}

const INSERT: &str = r"
    INSERT INTO users (id, name, email, phone_number, is_active, requires_approval, notification_channels, version)
    VALUES (?, ?, ?, ?, ?, ?, ?, ?)
";

const UPDATE: &str = r"
    UPDATE users
    SET name = ?, email = ?, phone_number = ?, is_active = ?, requires_approval = ?,
        notification_channels = ?, version = version + 1
    WHERE id = ? AND version = ?
";

const UPSERT_SUBSCRIPTION: &str = r"
    INSERT INTO subscriptions (
        id, owner_id, subscriber_id, subscribed_to_id, status, created_at, approved_at,
        last_known_status
    )
    VALUES (?, ?, ?, ?, ?, ?, ?, ?)
    ON CONFLICT (owner_id, subscriber_id, subscribed_to_id) DO UPDATE SET
        status = excluded.status,
        approved_at = excluded.approved_at,
        last_known_status = excluded.last_known_status
";

const SELECT_BY_ID: &str = "SELECT * FROM users WHERE id = ?";
const SELECT_ALL: &str = "SELECT * FROM users ORDER BY name";
const SELECT_BY_EMAIL: &str = "SELECT * FROM users WHERE email = ? LIMIT 1";
const SELECT_VERSION: &str = "SELECT version FROM users WHERE id = ?";
const SELECT_REQUIRES_APPROVAL: &str = "SELECT requires_approval FROM users WHERE id = ?";
const SELECT_OWNED_SUBSCRIPTIONS: &str =
    "SELECT * FROM subscriptions WHERE owner_id = ? ORDER BY created_at";
const SELECT_SUBSCRIPTIONS_OF: &str =
    "SELECT * FROM subscriptions WHERE subscriber_id = ? ORDER BY created_at";
const DELETE_SUBSCRIPTIONS: &str = "DELETE FROM subscriptions WHERE owner_id = ?";
const DELETE_BY_ID: &str = "DELETE FROM users WHERE id = ?";

/// `SQLite`-backed user store.
///
/// Subscriptions are stored with the user they point at and written back
/// by `save` alongside that user.
#[derive(Clone)]
pub struct SqliteUserStore {
    pool: SqlitePool,
}

impl SqliteUserStore {
    /// Create a new store using the given connection pool.
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    async fn hydrate(&self, row: Wrapper) -> Result<User, SafelinkError> {
        let subscriptions: Vec<SubscriptionRow> = sqlx::query_as(SELECT_OWNED_SUBSCRIPTIONS)
            .bind(row.id.to_string())
            .fetch_all(&self.pool)
            .await
            .map_err(StorageError::from)?;

        let user = row
            .builder
            .subscriptions(subscriptions.into_iter().map(|s| s.0))
            .build()
            .map_err(StorageError::from)?;
        Ok(user)
    }
}

async fn insert_row(conn: &mut SqliteConnection, user: &User) -> Result<(), StorageError> {
    let channels_json = serde_json::to_string(user.notification_channels())?;

    sqlx::query(INSERT)
        .bind(user.id().to_string())
        .bind(user.name())
        .bind(user.email())
        .bind(user.phone_number())
        .bind(user.is_active())
        .bind(user.requires_subscription_approval())
        .bind(&channels_json)
        .bind(1_i64)
        .execute(conn)
        .await?;
    Ok(())
}

async fn update_row(conn: &mut SqliteConnection, user: &User) -> Result<u64, StorageError> {
    let channels_json = serde_json::to_string(user.notification_channels())?;

    let result = sqlx::query(UPDATE)
        .bind(user.name())
        .bind(user.email())
        .bind(user.phone_number())
        .bind(user.is_active())
        .bind(user.requires_subscription_approval())
        .bind(&channels_json)
        .bind(user.id().to_string())
        .bind(integer_param(user.version())?)
        .execute(conn)
        .await?;
    Ok(result.rows_affected())
}

async fn upsert_subscriptions(
    conn: &mut SqliteConnection,
    user: &User,
) -> Result<(), StorageError> {
    let owner_id = user.id().to_string();
    for subscription in user.subscriptions() {
        sqlx::query(UPSERT_SUBSCRIPTION)
            .bind(subscription.id().to_string())
            .bind(&owner_id)
            .bind(subscription.subscriber_id().to_string())
            .bind(subscription.subscribed_to_id().to_string())
            .bind(subscription.status().as_str())
            .bind(subscription.created_at().to_rfc3339())
            .bind(subscription.approved_at().map(|at| at.to_rfc3339()))
            .bind(subscription.last_known_status().map(UserStatus::as_str))
            .execute(&mut *conn)
            .await?;
    }
    Ok(())
}

impl UserStore for SqliteUserStore {
    async fn get_by_id(&self, id: UserId) -> Result<User, SafelinkError> {
        let row: Option<Wrapper> = sqlx::query_as(SELECT_BY_ID)
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(StorageError::from)?;

        match row {
            Some(row) => self.hydrate(row).await,
            None => Ok(User::none()),
        }
    }

    #[tracing::instrument(skip_all, fields(user_id = %user.id()))]
    async fn add(&self, mut user: User) -> Result<User, SafelinkError> {
        let mut tx = self.pool.begin().await.map_err(StorageError::from)?;

        match insert_row(&mut tx, &user).await {
            Err(StorageError::Database(sqlx::Error::Database(err))) if err.is_unique_violation() => {
                return Err(ConflictError {
                    entity: "User",
                    id: user.id().to_string(),
                    expected_version: 0,
                }
                .into());
            }
            other => other?,
        }
        upsert_subscriptions(&mut tx, &user).await?;
        tx.commit().await.map_err(StorageError::from)?;

        user.set_version(1);
        tracing::debug!("user inserted");
        Ok(user)
    }

    #[tracing::instrument(skip_all, fields(user_id = %user.id(), version = user.version()))]
    async fn save(&self, mut user: User) -> Result<User, SafelinkError> {
        let mut tx = self.pool.begin().await.map_err(StorageError::from)?;

        let next_version = if update_row(&mut tx, &user).await? == 1 {
            user.version() + 1
        } else {
            let existing: Option<(i64,)> = sqlx::query_as(SELECT_VERSION)
                .bind(user.id().to_string())
                .fetch_optional(&mut *tx)
                .await
                .map_err(StorageError::from)?;
            if let Some((stored,)) = existing {
                tracing::warn!(stored, "version mismatch");
                return Err(ConflictError {
                    entity: "User",
                    id: user.id().to_string(),
                    expected_version: user.version(),
                }
                .into());
            }
            insert_row(&mut tx, &user).await?;
            1
        };
        upsert_subscriptions(&mut tx, &user).await?;
        tx.commit().await.map_err(StorageError::from)?;

        user.set_version(next_version);
        Ok(user)
    }

    async fn get_all(&self) -> Result<Vec<User>, SafelinkError> {
        let rows: Vec<Wrapper> = sqlx::query_as(SELECT_ALL)
            .fetch_all(&self.pool)
            .await
            .map_err(StorageError::from)?;

        let mut users = Vec::with_capacity(rows.len());
        for row in rows {
            users.push(self.hydrate(row).await?);
        }
        Ok(users)
    }

    async fn get_by_email(&self, email: &str) -> Result<Option<User>, SafelinkError> {
        let row: Option<Wrapper> = sqlx::query_as(SELECT_BY_EMAIL)
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .map_err(StorageError::from)?;

        match row {
            Some(row) => Ok(Some(self.hydrate(row).await?)),
            None => Ok(None),
        }
    }

    #[tracing::instrument(skip(self))]
    async fn delete(&self, id: UserId) -> Result<bool, SafelinkError> {
        let mut tx = self.pool.begin().await.map_err(StorageError::from)?;

        sqlx::query(DELETE_SUBSCRIPTIONS)
            .bind(id.to_string())
            .execute(&mut *tx)
            .await
            .map_err(StorageError::from)?;
        let result = sqlx::query(DELETE_BY_ID)
            .bind(id.to_string())
            .execute(&mut *tx)
            .await
            .map_err(StorageError::from)?;
        tx.commit().await.map_err(StorageError::from)?;

        Ok(result.rows_affected() > 0)
    }

    async fn requires_subscription_approval(&self, id: UserId) -> Result<bool, SafelinkError> {
        let row: Option<(bool,)> = sqlx::query_as(SELECT_REQUIRES_APPROVAL)
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(StorageError::from)?;

        Ok(row.is_none_or(|(requires_approval,)| requires_approval))
    }

    async fn subscriptions_of(
        &self,
        subscriber_id: UserId,
    ) -> Result<Vec<Subscription>, SafelinkError> {
        let rows: Vec<SubscriptionRow> = sqlx::query_as(SELECT_SUBSCRIPTIONS_OF)
            .bind(subscriber_id.to_string())
            .fetch_all(&self.pool)
            .await
            .map_err(StorageError::from)?;

        Ok(rows.into_iter().map(|s| s.0).collect())
    }
}
