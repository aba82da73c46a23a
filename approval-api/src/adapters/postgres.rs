use async_trait::async_trait;
use core_data::models::{WorkflowRecord, WorkflowState};
use core_data::ports::store::{RecordStore, StoreError};
use sqlx::postgres::PgPoolOptions;
use sqlx::types::Json;
use sqlx::PgPool;
use tracing::{debug, info, instrument};

/// Records live in one table; the full record is kept as JSONB and the
/// columns needed for lookup and the state guard are kept beside it.
const CREATE_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS perfiles (
        id          BIGINT PRIMARY KEY,
        workflow_id TEXT NOT NULL,
        estado      TEXT NOT NULL,
        version     BIGINT NOT NULL DEFAULT 0,
        data        JSONB NOT NULL,
        created_at  TIMESTAMPTZ NOT NULL,
        updated_at  TIMESTAMPTZ NOT NULL
    )
"#;

const ADD_VERSION: &str = "ALTER TABLE perfiles ADD COLUMN IF NOT EXISTS version BIGINT NOT NULL DEFAULT 0";

const CREATE_INDEX: &str =
    "CREATE INDEX IF NOT EXISTS perfiles_workflow_id_idx ON perfiles (workflow_id, created_at)";

pub struct PgRecordStore {
    pool: PgPool,
}

impl PgRecordStore {
    pub async fn connect(url: &str, max_connections: u32) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(url)
            .await
            .map_err(backend)?;
        sqlx::query(CREATE_TABLE).execute(&pool).await.map_err(backend)?;
        sqlx::query(ADD_VERSION).execute(&pool).await.map_err(backend)?;
        sqlx::query(CREATE_INDEX).execute(&pool).await.map_err(backend)?;
        info!(max_connections, "PostgreSQL record store ready");
        Ok(Self { pool })
    }
}

fn backend(e: sqlx::Error) -> StoreError {
    StoreError::Backend(e.to_string())
}

#[async_trait]
impl RecordStore for PgRecordStore {
    async fn get(&self, id: u64) -> Result<WorkflowRecord, StoreError> {
        sqlx::query_scalar::<_, Json<WorkflowRecord>>("SELECT data FROM perfiles WHERE id = $1")
            .bind(id as i64)
            .fetch_optional(&self.pool)
            .await
            .map_err(backend)?
            .map(|Json(record)| record)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    async fn history(&self, workflow_id: &str) -> Result<Vec<WorkflowRecord>, StoreError> {
        let rows = sqlx::query_scalar::<_, Json<WorkflowRecord>>(
            "SELECT data FROM perfiles WHERE workflow_id = $1 ORDER BY created_at ASC, id ASC",
        )
        .bind(workflow_id)
        .fetch_all(&self.pool)
        .await
        .map_err(backend)?;
        Ok(rows.into_iter().map(|Json(record)| record).collect())
    }

    async fn list(&self) -> Result<Vec<WorkflowRecord>, StoreError> {
        let rows = sqlx::query_scalar::<_, Json<WorkflowRecord>>(
            "SELECT data FROM perfiles ORDER BY created_at DESC, id DESC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(backend)?;
        Ok(rows.into_iter().map(|Json(record)| record).collect())
    }

    #[instrument(skip(self, record), fields(record_id = record.id()))]
    async fn insert(&self, record: WorkflowRecord) -> Result<WorkflowRecord, StoreError> {
        sqlx::query(
            r#"
            INSERT INTO perfiles (id, workflow_id, estado, version, data, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(record.id() as i64)
        .bind(record.workflow_id())
        .bind(record.estado().to_string())
        .bind(record.version() as i64)
        .bind(Json(&record))
        .bind(*record.created_at())
        .bind(*record.updated_at())
        .execute(&self.pool)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db) if db.is_unique_violation() => StoreError::Duplicate(record.id()),
            _ => backend(e),
        })?;
        debug!("Record inserted");
        Ok(record)
    }

    #[instrument(skip(self, record, expected), fields(record_id = record.id(), expected = %expected))]
    async fn update_if(
        &self,
        record: &WorkflowRecord,
        expected: &WorkflowState,
    ) -> Result<WorkflowRecord, StoreError> {
        let next = record.next_version();
        let result = sqlx::query(
            r#"
            UPDATE perfiles
            SET estado = $4, version = $5, data = $6, updated_at = $7
            WHERE id = $1 AND estado = $2 AND version = $3
            "#,
        )
        .bind(record.id() as i64)
        .bind(expected.to_string())
        .bind(record.version() as i64)
        .bind(next.estado().to_string())
        .bind(next.version() as i64)
        .bind(Json(&next))
        .bind(*next.updated_at())
        .execute(&self.pool)
        .await
        .map_err(backend)?;

        if result.rows_affected() == 1 {
            return Ok(next);
        }

        let current = sqlx::query_as::<_, (String, i64)>("SELECT estado, version FROM perfiles WHERE id = $1")
            .bind(record.id() as i64)
            .fetch_optional(&self.pool)
            .await
            .map_err(backend)?;
        match current {
            Some((estado, version)) => Err(StoreError::Conflict {
                id: record.id(),
                expected: format!("{} (version {})", expected, record.version()),
                current: format!("{} (version {})", estado, version),
            }),
            None => Err(StoreError::NotFound(record.id().to_string())),
        }
    }
}
