//! `SQLite` implementation of [`EmergencyStore`].

use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row, SqliteConnection, SqlitePool};

use safelink_app::ports::EmergencyStore;
use safelink_domain::area::Area;
use safelink_domain::emergency::{Emergency, EmergencyBuilder, EmergencyResponse, EmergencyStatus};
use safelink_domain::error::{ConflictError, SafelinkError};
use safelink_domain::id::{EmergencyId, UserId};
use safelink_domain::location::Location;
use safelink_domain::time::now;

use crate::columns::{
    enum_text, integer_param, parse, parse_enum, parse_optional_time, parse_time,
    version_from_column,
};
use crate::error::{StorageError, decode_err};

/// Row of the `emergencies` table, still missing its responses.
struct Wrapper {
    id: EmergencyId,
    builder: EmergencyBuilder,
}

impl<'r> FromRow<'r, SqliteRow> for Wrapper {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let id: String = row.try_get("id")?;
        let initiator_id: String = row.try_get("initiator_id")?;
        let latitude: f64 = row.try_get("latitude")?;
        let longitude: f64 = row.try_get("longitude")?;
        let location_description: String = row.try_get("location_description")?;
        let areas_json: String = row.try_get("affected_areas")?;
        let severity: String = row.try_get("severity")?;
        let emergency_type: Option<String> = row.try_get("emergency_type")?;
        let description: String = row.try_get("description")?;
        let status: String = row.try_get("status")?;
        let created_at: String = row.try_get("created_at")?;
        let resolved_at: Option<String> = row.try_get("resolved_at")?;
        let resolution_note: Option<String> = row.try_get("resolution_note")?;
        let version: i64 = row.try_get("version")?;

        let id: EmergencyId = parse(&id)?;
        let areas: Vec<Area> = serde_json::from_str(&areas_json).map_err(decode_err)?;
        let status: EmergencyStatus = parse(&status)?;

        let mut builder = Emergency::builder()
            .id(id)
            .initiator_id(parse(&initiator_id)?)
            .location(Location::new(latitude, longitude, location_description))
            .affected_areas(areas)
            .severity(parse(&severity)?)
            .description(description)
            .created_at(parse_time(&created_at)?)
            .version(version_from_column(version)?);
        if let Some(kind) = emergency_type {
            builder = builder.emergency_type(parse_enum(&kind)?);
        }
        if status == EmergencyStatus::Resolved {
            let resolved_at = parse_optional_time(resolved_at)?.unwrap_or_else(now);
            builder = builder.resolved(resolved_at, resolution_note);
        }

        Ok(Self { id, builder })
    }
}

struct ResponseRow(EmergencyResponse);

impl<'r> FromRow<'r, SqliteRow> for ResponseRow {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let user_id: String = row.try_get("user_id")?;
        let is_safe: bool = row.try_get("is_safe")?;
        let message: String = row.try_get("message")?;
        let responded_at: String = row.try_get("responded_at")?;

        Ok(Self(EmergencyResponse::at(
            parse(&user_id)?,
            is_safe,
            message,
            parse_time(&responded_at)?,
        )))
    }
}

const INSERT: &str = r"
    INSERT INTO emergencies (
        id, initiator_id, latitude, longitude, location_description, affected_areas,
        severity, emergency_type, description, status, created_at, resolved_at,
        resolution_note, version
    )
    VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
";

const UPDATE: &str = r"
    UPDATE emergencies
    SET initiator_id = ?, latitude = ?, longitude = ?, location_description = ?,
        affected_areas = ?, severity = ?, emergency_type = ?, description = ?, status = ?,
        created_at = ?, resolved_at = ?, resolution_note = ?, version = version + 1
    WHERE id = ? AND version = ?
";

const INSERT_RESPONSE: &str = r"
    INSERT INTO emergency_responses (emergency_id, position, user_id, is_safe, message, responded_at)
    VALUES (?, ?, ?, ?, ?, ?)
";

const SELECT_BY_ID: &str = "SELECT * FROM emergencies WHERE id = ?";
const SELECT_ALL: &str = "SELECT * FROM emergencies ORDER BY created_at";
const SELECT_BY_STATUS: &str = "SELECT * FROM emergencies WHERE status = ? ORDER BY created_at";
const SELECT_BY_USER: &str = r"
    SELECT * FROM emergencies
    WHERE initiator_id = ?
       OR id IN (SELECT emergency_id FROM emergency_responses WHERE user_id = ?)
    ORDER BY created_at
";
const SELECT_VERSION: &str = "SELECT version FROM emergencies WHERE id = ?";
const SELECT_RESPONSES: &str =
    "SELECT * FROM emergency_responses WHERE emergency_id = ? ORDER BY position";
const COUNT_RESPONSES: &str = "SELECT COUNT(*) FROM emergency_responses WHERE emergency_id = ?";

/// `SQLite`-backed emergency store.
///
/// Responses are append-only: `save` writes only the responses beyond the
/// ones already stored.
#[derive(Clone)]
pub struct SqliteEmergencyStore {
    pool: SqlitePool,
}

impl SqliteEmergencyStore {
    /// Create a new store using the given connection pool.
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    async fn hydrate(&self, row: Wrapper) -> Result<Emergency, SafelinkError> {
        let responses: Vec<ResponseRow> = sqlx::query_as(SELECT_RESPONSES)
            .bind(row.id.to_string())
            .fetch_all(&self.pool)
            .await
            .map_err(StorageError::from)?;

        let emergency = row
            .builder
            .responses(responses.into_iter().map(|r| r.0))
            .build()
            .map_err(StorageError::from)?;
        Ok(emergency)
    }

    async fn hydrate_all(&self, rows: Vec<Wrapper>) -> Result<Vec<Emergency>, SafelinkError> {
        let mut emergencies = Vec::with_capacity(rows.len());
        for row in rows {
            emergencies.push(self.hydrate(row).await?);
        }
        Ok(emergencies)
    }
}

async fn insert_row(
    conn: &mut SqliteConnection,
    emergency: &Emergency,
) -> Result<(), StorageError> {
    let areas_json = serde_json::to_string(emergency.affected_areas())?;
    let emergency_type = emergency.emergency_type().as_ref().map(enum_text).transpose()?;

    sqlx::query(INSERT)
        .bind(emergency.id().to_string())
        .bind(emergency.initiator_id().to_string())
        .bind(emergency.location().latitude())
        .bind(emergency.location().longitude())
        .bind(emergency.location().description())
        .bind(&areas_json)
        .bind(emergency.severity().as_str())
        .bind(emergency_type)
        .bind(emergency.description())
        .bind(emergency.status().as_str())
        .bind(emergency.created_at().to_rfc3339())
        .bind(emergency.resolved_at().map(|at| at.to_rfc3339()))
        .bind(emergency.resolution_note())
        .bind(1_i64)
        .execute(conn)
        .await?;
    Ok(())
}

async fn update_row(
    conn: &mut SqliteConnection,
    emergency: &Emergency,
) -> Result<u64, StorageError> {
    let areas_json = serde_json::to_string(emergency.affected_areas())?;
    let emergency_type = emergency.emergency_type().as_ref().map(enum_text).transpose()?;

    let result = sqlx::query(UPDATE)
        .bind(emergency.initiator_id().to_string())
        .bind(emergency.location().latitude())
        .bind(emergency.location().longitude())
        .bind(emergency.location().description())
        .bind(&areas_json)
        .bind(emergency.severity().as_str())
        .bind(emergency_type)
        .bind(emergency.description())
        .bind(emergency.status().as_str())
        .bind(emergency.created_at().to_rfc3339())
        .bind(emergency.resolved_at().map(|at| at.to_rfc3339()))
        .bind(emergency.resolution_note())
        .bind(emergency.id().to_string())
        .bind(integer_param(emergency.version())?)
        .execute(conn)
        .await?;
    Ok(result.rows_affected())
}

/// Append the responses past the ones already persisted.
async fn append_responses(
    conn: &mut SqliteConnection,
    emergency: &Emergency,
) -> Result<(), StorageError> {
    let id = emergency.id().to_string();
    let (stored,): (i64,) = sqlx::query_as(COUNT_RESPONSES)
        .bind(&id)
        .fetch_one(&mut *conn)
        .await?;
    let stored = usize::try_from(stored).map_err(decode_err)?;

    for (position, response) in emergency.responses().iter().enumerate().skip(stored) {
        sqlx::query(INSERT_RESPONSE)
            .bind(&id)
            .bind(integer_param(position)?)
            .bind(response.user_id.to_string())
            .bind(response.is_safe)
            .bind(&response.message)
            .bind(response.responded_at.to_rfc3339())
            .execute(&mut *conn)
            .await?;
    }
    Ok(())
}

fn conflict(emergency: &Emergency) -> SafelinkError {
    ConflictError {
        entity: "Emergency",
        id: emergency.id().to_string(),
        expected_version: emergency.version(),
    }
    .into()
}

impl EmergencyStore for SqliteEmergencyStore {
    async fn get_by_id(&self, id: EmergencyId) -> Result<Option<Emergency>, SafelinkError> {
        let row: Option<Wrapper> = sqlx::query_as(SELECT_BY_ID)
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(StorageError::from)?;

        match row {
            Some(row) => Ok(Some(self.hydrate(row).await?)),
            None => Ok(None),
        }
    }

    #[tracing::instrument(skip_all, fields(emergency_id = %emergency.id()))]
    async fn add(&self, mut emergency: Emergency) -> Result<Emergency, SafelinkError> {
        let mut tx = self.pool.begin().await.map_err(StorageError::from)?;

        match insert_row(&mut tx, &emergency).await {
            Err(StorageError::Database(sqlx::Error::Database(err))) if err.is_unique_violation() => {
                return Err(ConflictError {
                    entity: "Emergency",
                    id: emergency.id().to_string(),
                    expected_version: 0,
                }
                .into());
            }
            other => other?,
        }
        append_responses(&mut tx, &emergency).await?;
        tx.commit().await.map_err(StorageError::from)?;

        emergency.set_version(1);
        tracing::debug!("emergency inserted");
        Ok(emergency)
    }

    #[tracing::instrument(
        skip_all,
        fields(emergency_id = %emergency.id(), version = emergency.version())
    )]
    async fn save(&self, mut emergency: Emergency) -> Result<Emergency, SafelinkError> {
        let mut tx = self.pool.begin().await.map_err(StorageError::from)?;

        let next_version = if update_row(&mut tx, &emergency).await? == 1 {
            emergency.version() + 1
        } else {
            let existing: Option<(i64,)> = sqlx::query_as(SELECT_VERSION)
                .bind(emergency.id().to_string())
                .fetch_optional(&mut *tx)
                .await
                .map_err(StorageError::from)?;
            if let Some((stored,)) = existing {
                tracing::warn!(stored, "version mismatch");
                return Err(conflict(&emergency));
            }
            insert_row(&mut tx, &emergency).await?;
            1
        };
        append_responses(&mut tx, &emergency).await?;
        tx.commit().await.map_err(StorageError::from)?;

        emergency.set_version(next_version);
        Ok(emergency)
    }

    async fn get_all(&self) -> Result<Vec<Emergency>, SafelinkError> {
        let rows: Vec<Wrapper> = sqlx::query_as(SELECT_ALL)
            .fetch_all(&self.pool)
            .await
            .map_err(StorageError::from)?;

        self.hydrate_all(rows).await
    }

    async fn get_by_status(&self, status: EmergencyStatus) -> Result<Vec<Emergency>, SafelinkError> {
        let rows: Vec<Wrapper> = sqlx::query_as(SELECT_BY_STATUS)
            .bind(status.as_str())
            .fetch_all(&self.pool)
            .await
            .map_err(StorageError::from)?;

        self.hydrate_all(rows).await
    }

    async fn get_by_user(&self, user_id: UserId) -> Result<Vec<Emergency>, SafelinkError> {
        let user_id = user_id.to_string();
        let rows: Vec<Wrapper> = sqlx::query_as(SELECT_BY_USER)
            .bind(&user_id)
            .bind(&user_id)
            .fetch_all(&self.pool)
            .await
            .map_err(StorageError::from)?;

        self.hydrate_all(rows).await
    }
}
