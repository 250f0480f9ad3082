//! Postgres-backed document store. Every collection shares the `documents`
//! table; documents live in a JSONB column and filters use containment.

use async_trait::async_trait;
use serde_json::Value;
use sqlx::{types::Json, PgPool};
use std::sync::Arc;
use std::time::{Duration, Instant};
use uuid::Uuid;

use super::models::{Collection, DeleteResult, Document, InsertOneResult, UpdateResult, ID_FIELD};
use super::store::{natural_key, DocumentStore, Filter, FindOptions, SortOrder, StoreError};

#[derive(Debug, Clone)]
pub struct PgDocumentStore {
    pool: Arc<PgPool>,
}

impl PgDocumentStore {
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }

    fn assign_id(mut doc: Document) -> (String, Document) {
        let id = Uuid::new_v4().to_string();
        doc.insert(ID_FIELD.to_string(), Value::String(id.clone()));
        (id, doc)
    }
}

#[async_trait]
impl DocumentStore for PgDocumentStore {
    fn backend(&self) -> &'static str {
        "postgres"
    }

    async fn insert_one(
        &self,
        collection: Collection,
        doc: Document,
    ) -> Result<InsertOneResult, StoreError> {
        let (id, doc) = Self::assign_id(doc);

        sqlx::query("INSERT INTO documents (collection, id, doc) VALUES ($1, $2, $3)")
            .bind(collection.as_str())
            .bind(&id)
            .bind(Json(&doc))
            .execute(self.pool.as_ref())
            .await?;

        Ok(InsertOneResult::new(id))
    }

    async fn insert_unique(
        &self,
        collection: Collection,
        key_fields: &[&str],
        doc: Document,
    ) -> Result<Option<InsertOneResult>, StoreError> {
        let key = natural_key(&doc, key_fields)?;
        let (id, doc) = Self::assign_id(doc);

        // The unique index on (collection, natural_key) arbitrates concurrent inserts.
        let inserted: Option<String> = sqlx::query_scalar(
            r#"
            INSERT INTO documents (collection, id, natural_key, doc)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (collection, natural_key) DO NOTHING
            RETURNING id
            "#,
        )
        .bind(collection.as_str())
        .bind(&id)
        .bind(&key)
        .bind(Json(&doc))
        .fetch_optional(self.pool.as_ref())
        .await?;

        Ok(inserted.map(InsertOneResult::new))
    }

    async fn find(
        &self,
        collection: Collection,
        filter: &Filter,
        options: FindOptions,
    ) -> Result<Vec<Document>, StoreError> {
        let limit = options.limit.map(|l| l as i64);

        let rows: Vec<Json<Document>> = match &options.sort {
            Some(sort) => {
                let direction = match sort.order {
                    SortOrder::Ascending => "ASC NULLS FIRST",
                    SortOrder::Descending => "DESC NULLS LAST",
                };
                let sql = format!(
                    r#"
                    SELECT doc FROM documents
                    WHERE collection = $1 AND doc @> $2
                    ORDER BY doc -> $3 {}, created_at, id
                    LIMIT $4
                    "#,
                    direction
                );
                sqlx::query_scalar(&sql)
                    .bind(collection.as_str())
                    .bind(Json(filter))
                    .bind(&sort.field)
                    .bind(limit)
                    .fetch_all(self.pool.as_ref())
                    .await?
            }
            None => {
                sqlx::query_scalar(
                    r#"
                    SELECT doc FROM documents
                    WHERE collection = $1 AND doc @> $2
                    ORDER BY created_at, id
                    LIMIT $3
                    "#,
                )
                .bind(collection.as_str())
                .bind(Json(filter))
                .bind(limit)
                .fetch_all(self.pool.as_ref())
                .await?
            }
        };

        Ok(rows.into_iter().map(|Json(doc)| doc).collect())
    }

    async fn find_one(
        &self,
        collection: Collection,
        filter: &Filter,
    ) -> Result<Option<Document>, StoreError> {
        let row: Option<Json<Document>> = sqlx::query_scalar(
            r#"
            SELECT doc FROM documents
            WHERE collection = $1 AND doc @> $2
            ORDER BY created_at, id
            LIMIT 1
            "#,
        )
        .bind(collection.as_str())
        .bind(Json(filter))
        .fetch_optional(self.pool.as_ref())
        .await?;

        Ok(row.map(|Json(doc)| doc))
    }

    async fn update_one(
        &self,
        collection: Collection,
        filter: &Filter,
        mut set: Document,
    ) -> Result<UpdateResult, StoreError> {
        set.remove(ID_FIELD);

        let modified: Option<bool> = sqlx::query_scalar(
            r#"
            WITH target AS (
                SELECT id, doc FROM documents
                WHERE collection = $1 AND doc @> $2
                ORDER BY created_at, id
                LIMIT 1
                FOR UPDATE
            )
            UPDATE documents d
            SET doc = d.doc || $3
            FROM target
            WHERE d.collection = $1 AND d.id = target.id
            RETURNING target.doc <> d.doc
            "#,
        )
        .bind(collection.as_str())
        .bind(Json(filter))
        .bind(Json(&set))
        .fetch_optional(self.pool.as_ref())
        .await?;

        Ok(match modified {
            Some(changed) => UpdateResult::new(1, u64::from(changed)),
            None => UpdateResult::new(0, 0),
        })
    }

    async fn delete_one(
        &self,
        collection: Collection,
        filter: &Filter,
    ) -> Result<DeleteResult, StoreError> {
        let result = sqlx::query(
            r#"
            DELETE FROM documents
            WHERE collection = $1 AND id = (
                SELECT id FROM documents
                WHERE collection = $1 AND doc @> $2
                ORDER BY created_at, id
                LIMIT 1
            )
            "#,
        )
        .bind(collection.as_str())
        .bind(Json(filter))
        .execute(self.pool.as_ref())
        .await?;

        Ok(DeleteResult::new(result.rows_affected()))
    }

    async fn ping(&self) -> Result<Duration, StoreError> {
        let start = Instant::now();
        sqlx::query("SELECT 1").fetch_one(self.pool.as_ref()).await?;
        Ok(start.elapsed())
    }
}
