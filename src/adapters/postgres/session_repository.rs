//! PostgreSQL implementation of SessionRepository.
//!
//! One row per session in `trip_sessions`; the transcript, analysis and
//! itinerary are JSONB columns. An update locks the row, appends the new
//! turns with `messages || $n` and replaces the analysis in one transaction.

use async_trait::async_trait;
use sqlx::postgres::{PgConnection, PgPool, PgPoolOptions, PgRow};
use sqlx::types::Json;
use sqlx::Row;

use crate::config::DatabaseConfig;
use crate::domain::foundation::{SessionId, Timestamp};
use crate::domain::session::{Analysis, Session, SessionUpdate, Turn};
use crate::domain::trip::Itinerary;
use crate::ports::{RepositoryError, SessionRepository};

/// PostgreSQL implementation of SessionRepository.
#[derive(Clone)]
pub struct PostgresSessionRepository {
    pool: PgPool,
}

impl PostgresSessionRepository {
    /// Creates a new PostgresSessionRepository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Opens a pool from configuration, running migrations when enabled.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, RepositoryError> {
        let pool = PgPoolOptions::new()
            .min_connections(config.min_connections)
            .max_connections(config.max_connections)
            .acquire_timeout(config.acquire_timeout())
            .idle_timeout(config.idle_timeout())
            .max_lifetime(config.max_lifetime())
            .connect(&config.url)
            .await
            .map_err(db_error)?;

        if config.run_migrations {
            sqlx::migrate!("./migrations")
                .run(&pool)
                .await
                .map_err(|e| RepositoryError::Unavailable(format!("migration failed: {}", e)))?;
        }

        Ok(Self::new(pool))
    }
}

#[async_trait]
impl SessionRepository for PostgresSessionRepository {
    async fn get(&self, id: &SessionId) -> Result<Option<Session>, RepositoryError> {
        let row = sqlx::query(
            r#"
            SELECT id, created_at, updated_at, messages, latest_analysis, itinerary
            FROM trip_sessions
            WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error)?;

        row.map(row_to_session).transpose()
    }

    async fn insert(&self, session: &Session) -> Result<(), RepositoryError> {
        let mut conn = self.pool.acquire().await.map_err(db_error)?;
        insert_row(&mut *conn, session).await
    }

    async fn update(
        &self,
        id: &SessionId,
        update: SessionUpdate,
        upsert: bool,
    ) -> Result<Session, RepositoryError> {
        let mut tx = self.pool.begin().await.map_err(db_error)?;

        let row = sqlx::query(
            r#"
            SELECT id, created_at, updated_at, messages, latest_analysis, itinerary
            FROM trip_sessions
            WHERE id = $1
            FOR UPDATE
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(&mut *tx)
        .await
        .map_err(db_error)?;

        let mut session = match row {
            Some(row) => row_to_session(row)?,
            None if upsert => {
                let fresh = Session::new(*id);
                insert_row(&mut *tx, &fresh).await?;
                fresh
            }
            None => return Err(RepositoryError::NotFound(*id)),
        };

        let appended = update.append_messages.clone();
        let analysis = update.latest_analysis.clone();
        let itinerary = update.itinerary.clone();
        session.apply(update);

        sqlx::query(
            r#"
            UPDATE trip_sessions SET
                updated_at = $2,
                messages = messages || $3,
                latest_analysis = COALESCE($4, latest_analysis),
                itinerary = COALESCE($5, itinerary)
            WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .bind(session.updated_at().as_datetime())
        .bind(Json(appended))
        .bind(analysis.map(Json))
        .bind(itinerary.map(Json))
        .execute(&mut *tx)
        .await
        .map_err(db_error)?;

        tx.commit().await.map_err(db_error)?;

        Ok(session)
    }

    fn backend_name(&self) -> &'static str {
        "postgres"
    }
}

async fn insert_row(
    conn: &mut PgConnection,
    session: &Session,
) -> Result<(), RepositoryError> {
    let result = sqlx::query(
        r#"
        INSERT INTO trip_sessions (
            id, created_at, updated_at, messages, latest_analysis, itinerary
        ) VALUES ($1, $2, $3, $4, $5, $6)
        ON CONFLICT (id) DO NOTHING
        "#,
    )
    .bind(session.session_id().as_uuid())
    .bind(session.created_at().as_datetime())
    .bind(session.updated_at().as_datetime())
    .bind(Json(session.messages()))
    .bind(Json(session.latest_analysis()))
    .bind(session.itinerary().map(Json))
    .execute(conn)
    .await
    .map_err(db_error)?;

    if result.rows_affected() == 0 {
        return Err(RepositoryError::AlreadyExists(*session.session_id()));
    }
    Ok(())
}

fn db_error(e: sqlx::Error) -> RepositoryError {
    RepositoryError::Unavailable(e.to_string())
}

fn row_to_session(row: PgRow) -> Result<Session, RepositoryError> {
    let id: uuid::Uuid = row.try_get("id").map_err(db_error)?;
    let created_at: chrono::DateTime<chrono::Utc> = row.try_get("created_at").map_err(db_error)?;
    let updated_at: chrono::DateTime<chrono::Utc> = row.try_get("updated_at").map_err(db_error)?;
    let messages: Json<Vec<Turn>> = row.try_get("messages").map_err(decode_error)?;
    let analysis: Json<Analysis> = row.try_get("latest_analysis").map_err(decode_error)?;
    let itinerary: Option<Json<Itinerary>> = row.try_get("itinerary").map_err(decode_error)?;

    Ok(Session::reconstitute(
        SessionId::from_uuid(id),
        Timestamp::from_datetime(created_at),
        Timestamp::from_datetime(updated_at),
        messages.0,
        analysis.0,
        itinerary.map(|json| json.0),
    ))
}

fn decode_error(e: sqlx::Error) -> RepositoryError {
    RepositoryError::Serialization(e.to_string())
}
