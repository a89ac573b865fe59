use std::{marker::PhantomData, sync::Arc};

use async_trait::async_trait;
use sqlx::{
    postgres::{PgArguments, PgPoolOptions},
    query::QueryAs,
    PgPool, Postgres, Transaction,
};
use tokio::sync::Mutex;
use tracing::{debug, error};

use super::{
    AnyStore, Entity, EntityKind, FieldValue, Filter, ResourceStore, Session, StoreBackend,
    StoreError, StoreOpener, StoreResult,
};

type SharedTx = Arc<Mutex<Option<Transaction<'static, Postgres>>>>;

#[derive(Clone)]
pub struct PgBackend {
    pool: PgPool,
}

impl PgBackend {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(database_url: &str, max_connections: u32) -> anyhow::Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl StoreBackend for PgBackend {
    fn name(&self) -> &'static str {
        "postgres"
    }

    async fn begin(&self) -> StoreResult<Box<dyn Session>> {
        let tx = self.pool.begin().await.map_err(|e| {
            error!(error = %e, "begin transaction failed");
            StoreError::from(e)
        })?;
        Ok(Box::new(PgSession {
            tx: Arc::new(Mutex::new(Some(tx))),
        }))
    }
}

/// One transaction; every store opened from it shares the same connection.
struct PgSession {
    tx: SharedTx,
}

impl StoreOpener for PgSession {
    fn open_entity<E: Entity>(&self) -> StoreResult<AnyStore> {
        Ok(E::into_any(Arc::new(PgStore::<E> {
            tx: self.tx.clone(),
            _entity: PhantomData,
        })))
    }
}

#[async_trait]
impl Session for PgSession {
    fn open(&self, kind: EntityKind) -> StoreResult<AnyStore> {
        self.open_kind(kind)
    }

    async fn commit(&self) -> StoreResult<()> {
        let tx = self.tx.lock().await.take();
        match tx {
            Some(tx) => {
                tx.commit().await?;
                debug!("transaction committed");
                Ok(())
            }
            None => Err(StoreError::Storage("transaction already finished".into())),
        }
    }
}

pub struct PgStore<E: Entity> {
    tx: SharedTx,
    _entity: PhantomData<fn() -> E>,
}

fn bind_value<'q, O>(
    query: QueryAs<'q, Postgres, O, PgArguments>,
    value: FieldValue,
) -> QueryAs<'q, Postgres, O, PgArguments> {
    match value {
        FieldValue::Text(v) => query.bind(v),
        FieldValue::Int(v) => query.bind(v),
        FieldValue::BigInt(v) => query.bind(v),
        FieldValue::Float(v) => query.bind(v),
        FieldValue::Bool(v) => query.bind(v),
        FieldValue::Timestamp(v) => query.bind(v),
        FieldValue::Date(v) => query.bind(v),
    }
}

fn column_list<E: Entity>() -> String {
    E::COLUMNS.join(", ")
}

fn finished() -> StoreError {
    StoreError::Storage("transaction already finished".into())
}

/// Builds `WHERE` for an equality filter; null values become `IS NULL` and
/// take no placeholder.
fn where_clause(filter: &Filter) -> (String, Vec<FieldValue>) {
    let mut parts = Vec::new();
    let mut binds = Vec::new();
    for (column, value) in filter.conditions() {
        if value.is_null() {
            parts.push(format!("{column} IS NULL"));
        } else {
            binds.push(value.clone());
            parts.push(format!("{column} = ${}", binds.len()));
        }
    }
    if parts.is_empty() {
        (String::new(), binds)
    } else {
        (format!(" WHERE {}", parts.join(" AND ")), binds)
    }
}

#[async_trait]
impl<E: Entity> ResourceStore<E> for PgStore<E> {
    async fn insert(&self, entity: E) -> StoreResult<E> {
        let placeholders = (1..=E::COLUMNS.len())
            .map(|i| format!("${i}"))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!(
            "INSERT INTO {table} ({cols}) VALUES ({placeholders}) RETURNING {cols}",
            table = E::TABLE,
            cols = column_list::<E>(),
        );

        let mut query = sqlx::query_as::<_, E>(&sql);
        for value in entity.values() {
            query = bind_value(query, value);
        }

        let mut guard = self.tx.lock().await;
        let tx = guard.as_mut().ok_or_else(finished)?;
        Ok(query.fetch_one(&mut **tx).await?)
    }

    async fn get_by_id(&self, id: &str) -> StoreResult<Option<E>> {
        let sql = format!(
            "SELECT {} FROM {} WHERE id = $1",
            column_list::<E>(),
            E::TABLE
        );
        let mut guard = self.tx.lock().await;
        let tx = guard.as_mut().ok_or_else(finished)?;
        Ok(sqlx::query_as::<_, E>(&sql)
            .bind(id)
            .fetch_optional(&mut **tx)
            .await?)
    }

    async fn list_all(&self, filter: &Filter) -> StoreResult<Vec<E>> {
        filter.check_columns::<E>()?;
        let (where_sql, binds) = where_clause(filter);
        let sql = format!(
            "SELECT {} FROM {}{} ORDER BY id",
            column_list::<E>(),
            E::TABLE,
            where_sql
        );

        let mut query = sqlx::query_as::<_, E>(&sql);
        for value in binds {
            query = bind_value(query, value);
        }

        let mut guard = self.tx.lock().await;
        let tx = guard.as_mut().ok_or_else(finished)?;
        Ok(query.fetch_all(&mut **tx).await?)
    }

    async fn update(&self, id: &str, patch: E::Patch) -> StoreResult<Option<E>> {
        let select = format!(
            "SELECT {} FROM {} WHERE id = $1 FOR UPDATE",
            column_list::<E>(),
            E::TABLE
        );

        let mut guard = self.tx.lock().await;
        let tx = guard.as_mut().ok_or_else(finished)?;

        let Some(mut row) = sqlx::query_as::<_, E>(&select)
            .bind(id)
            .fetch_optional(&mut **tx)
            .await?
        else {
            return Ok(None);
        };
        row.apply(patch)?;

        let assignments = E::COLUMNS[1..]
            .iter()
            .enumerate()
            .map(|(i, column)| format!("{column} = ${}", i + 1))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!(
            "UPDATE {table} SET {assignments} WHERE id = ${last} RETURNING {cols}",
            table = E::TABLE,
            last = E::COLUMNS.len(),
            cols = column_list::<E>(),
        );

        let mut query = sqlx::query_as::<_, E>(&sql);
        for value in row.values().into_iter().skip(1) {
            query = bind_value(query, value);
        }
        query = query.bind(id.to_string());

        Ok(query.fetch_optional(&mut **tx).await?)
    }

    async fn delete(&self, id: &str) -> StoreResult<bool> {
        let sql = format!("DELETE FROM {} WHERE id = $1", E::TABLE);
        let mut guard = self.tx.lock().await;
        let tx = guard.as_mut().ok_or_else(finished)?;
        let result = sqlx::query(&sql).bind(id).execute(&mut **tx).await?;
        Ok(result.rows_affected() > 0)
    }
}
