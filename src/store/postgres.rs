use crate::store::{DeleteOutcome, DocumentStore, Filter, PatchOp, PatchOutcome, StoreError};
use serde_json::Value;
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Postgres, QueryBuilder, Row};

/// Every logical collection lives in one `documents` table keyed by
/// `(collection, id, partition_key)` with the document kept as JSONB.
#[derive(Clone)]
pub struct PgDocumentStore {
    pub pool: PgPool,
}

impl PgDocumentStore {
    pub async fn connect(database_url: &str, max_connections: u32) -> anyhow::Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;
        sqlx::migrate!("./migrations").run(&pool).await?;
        Ok(Self { pool })
    }
}

#[async_trait::async_trait]
impl DocumentStore for PgDocumentStore {
    async fn create(&self, collection: &str, id: &str, partition_key: &str, body: Value) -> Result<u16, StoreError> {
        let inserted = sqlx::query(
            r#"
            INSERT INTO documents (collection, id, partition_key, body)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (collection, id, partition_key) DO NOTHING
            "#,
        )
        .bind(collection)
        .bind(id)
        .bind(partition_key)
        .bind(body)
        .execute(&self.pool)
        .await?
        .rows_affected();

        if inserted == 0 {
            return Err(StoreError::Conflict {
                collection: collection.to_string(),
                id: id.to_string(),
            });
        }
        Ok(201)
    }

    async fn query(&self, collection: &str, filter: &Filter) -> Result<Vec<Value>, StoreError> {
        let mut qb: QueryBuilder<Postgres> = QueryBuilder::new("SELECT body FROM documents WHERE collection = ");
        qb.push_bind(collection.to_string());

        match filter {
            Filter::Eq(path, value) => {
                qb.push(" AND body #>> ");
                qb.push_bind(path.clone());
                qb.push("::text[] = ");
                qb.push_bind(value.clone());
            }
            Filter::AnyEq(paths, value) => {
                if paths.is_empty() {
                    return Ok(Vec::new());
                }
                qb.push(" AND (");
                for (i, path) in paths.iter().enumerate() {
                    if i > 0 {
                        qb.push(" OR ");
                    }
                    qb.push("body #>> ");
                    qb.push_bind(path.clone());
                    qb.push("::text[] = ");
                    qb.push_bind(value.clone());
                }
                qb.push(")");
            }
            Filter::Prefix(path, prefix) => {
                qb.push(" AND starts_with(body #>> ");
                qb.push_bind(path.clone());
                qb.push("::text[], ");
                qb.push_bind(prefix.clone());
                qb.push(")");
            }
        }
        qb.push(" ORDER BY created_at ASC");

        let rows = qb.build().fetch_all(&self.pool).await?;
        Ok(rows.into_iter().map(|row| row.get::<Value, _>("body")).collect())
    }

    async fn delete(&self, collection: &str, id: &str, partition_key: &str) -> Result<DeleteOutcome, StoreError> {
        let deleted = sqlx::query("DELETE FROM documents WHERE collection = $1 AND id = $2 AND partition_key = $3")
            .bind(collection)
            .bind(id)
            .bind(partition_key)
            .execute(&self.pool)
            .await?
            .rows_affected();

        Ok(if deleted == 0 {
            DeleteOutcome::Absent
        } else {
            DeleteOutcome::Deleted
        })
    }

    async fn patch(
        &self,
        collection: &str,
        id: &str,
        partition_key: &str,
        ops: &[PatchOp],
    ) -> Result<PatchOutcome, StoreError> {
        let mut tx = self.pool.begin().await?;
        let row = sqlx::query(
            "SELECT body FROM documents WHERE collection = $1 AND id = $2 AND partition_key = $3 FOR UPDATE",
        )
        .bind(collection)
        .bind(id)
        .bind(partition_key)
        .fetch_optional(tx.as_mut())
        .await?;

        let Some(row) = row else {
            tx.rollback().await?;
            return Ok(PatchOutcome::Absent);
        };

        let mut body: Value = row.get("body");
        for op in ops {
            op.apply(&mut body);
        }

        sqlx::query(
            r#"
            UPDATE documents SET body = $4, updated_at = now()
            WHERE collection = $1 AND id = $2 AND partition_key = $3
            "#,
        )
        .bind(collection)
        .bind(id)
        .bind(partition_key)
        .bind(body)
        .execute(tx.as_mut())
        .await?;
        tx.commit().await?;

        Ok(PatchOutcome::Patched)
    }
}
