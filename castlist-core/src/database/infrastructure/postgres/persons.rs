use async_trait::async_trait;
use castlist_model::{
    CreatePersonParams, Person, PersonID, SearchPersonParams,
    UpdatePersonParams,
};
use sqlx::{Arguments, PgPool, postgres::PgArguments};
use tracing::{debug, info};

use crate::database::ports::persons::PersonsRepository;
use crate::error::{CatalogError, Result};
use crate::query::{
    Pagination, SqlValue, compile_insert, compile_set, compile_where,
};

const PERSON_COLUMNS: &str =
    "id, fullname_ru, fullname_en, birthday, sex, photo_id";

/// PostgreSQL-backed implementation of the `PersonsRepository` port.
#[derive(Clone, Debug)]
pub struct PostgresPersonsRepository {
    pool: PgPool,
}

impl PostgresPersonsRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn pool(&self) -> &PgPool {
        &self.pool
    }

    async fn fetch_persons(
        &self,
        sql: &str,
        args: Vec<SqlValue>,
    ) -> Result<Vec<Person>> {
        debug!(%sql, args = args.len(), "fetching persons");
        sqlx::query_as_with::<_, Person, _>(sql, into_arguments(args)?)
            .fetch_all(self.pool())
            .await
            .map_err(|e| map_store_error("Failed to fetch persons", e))
    }

    async fn fetch_ids(
        &self,
        sql: &str,
        args: Vec<SqlValue>,
    ) -> Result<Vec<PersonID>> {
        sqlx::query_scalar_with::<_, PersonID, _>(sql, into_arguments(args)?)
            .fetch_all(self.pool())
            .await
            .map_err(|e| map_store_error("Failed to fetch person ids", e))
    }
}

#[async_trait]
impl PersonsRepository for PostgresPersonsRepository {
    async fn get_persons(
        &self,
        ids: &[PersonID],
        pagination: Pagination,
    ) -> Result<Vec<Person>> {
        let sql = format!(
            "SELECT {PERSON_COLUMNS} FROM persons WHERE id = ANY($1) \
             ORDER BY id LIMIT $2 OFFSET $3"
        );
        let args = vec![
            id_array(ids),
            SqlValue::BigInt(pagination.limit()),
            SqlValue::BigInt(pagination.offset()),
        ];
        self.fetch_persons(&sql, args).await
    }

    async fn get_all_persons(&self, pagination: Pagination) -> Result<Vec<Person>> {
        let sql = format!(
            "SELECT {PERSON_COLUMNS} FROM persons ORDER BY id LIMIT $1 OFFSET $2"
        );
        let args = vec![
            SqlValue::BigInt(pagination.limit()),
            SqlValue::BigInt(pagination.offset()),
        ];
        self.fetch_persons(&sql, args).await
    }

    async fn search_persons(
        &self,
        params: &SearchPersonParams,
        pagination: Pagination,
    ) -> Result<Vec<Person>> {
        let compiled = compile_where(params);
        if compiled.is_empty() {
            return Err(CatalogError::invalid_argument(
                "search predicate has no fields",
            ));
        }

        let mut args = compiled.args;
        args.push(SqlValue::BigInt(pagination.limit()));
        args.push(SqlValue::BigInt(pagination.offset()));
        let sql = format!(
            "SELECT {PERSON_COLUMNS} FROM persons WHERE {} ORDER BY id \
             LIMIT ${} OFFSET ${}",
            compiled.clause,
            args.len() - 1,
            args.len()
        );
        self.fetch_persons(&sql, args).await
    }

    async fn search_persons_by_name(
        &self,
        name: &str,
        pagination: Pagination,
    ) -> Result<Vec<Person>> {
        let sql = format!(
            "SELECT {PERSON_COLUMNS} FROM persons \
             WHERE LOWER(fullname_ru) LIKE $1 OR LOWER(fullname_en) LIKE $1 \
             ORDER BY id LIMIT $2 OFFSET $3"
        );
        let args = vec![
            SqlValue::text(like_prefix(name)),
            SqlValue::BigInt(pagination.limit()),
            SqlValue::BigInt(pagination.offset()),
        ];
        self.fetch_persons(&sql, args).await
    }

    async fn matching_ids(
        &self,
        params: &SearchPersonParams,
        limit: Option<i64>,
    ) -> Result<Vec<PersonID>> {
        let compiled = compile_where(params);
        if compiled.is_empty() {
            return Err(CatalogError::invalid_argument(
                "search predicate has no fields",
            ));
        }

        let mut args = compiled.args;
        let mut sql =
            format!("SELECT id FROM persons WHERE {} ORDER BY id", compiled.clause);
        if let Some(limit) = limit {
            args.push(SqlValue::BigInt(limit));
            sql.push_str(&format!(" LIMIT ${}", args.len()));
        }
        self.fetch_ids(&sql, args).await
    }

    async fn person_exists(&self, id: PersonID) -> Result<bool> {
        sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM persons WHERE id = $1)",
        )
        .bind(id)
        .fetch_one(self.pool())
        .await
        .map_err(|e| map_store_error("Failed to check person existence", e))
    }

    async fn existing_ids(&self, ids: &[PersonID]) -> Result<Vec<PersonID>> {
        self.fetch_ids(
            "SELECT id FROM persons WHERE id = ANY($1) ORDER BY id",
            vec![id_array(ids)],
        )
        .await
    }

    async fn create_person(&self, params: &CreatePersonParams) -> Result<PersonID> {
        let compiled = compile_insert(params);
        if compiled.is_empty() {
            return Err(CatalogError::invalid_argument(
                "person has no fields to insert",
            ));
        }

        let sql = format!(
            "INSERT INTO persons ({}) VALUES ({}) RETURNING id",
            compiled.columns, compiled.placeholders
        );
        let id = sqlx::query_scalar_with::<_, PersonID, _>(
            &sql,
            into_arguments(compiled.args)?,
        )
        .fetch_one(self.pool())
        .await
        .map_err(|e| map_store_error("Failed to insert person", e))?;

        info!(person_id = %id, "Created person");
        Ok(id)
    }

    async fn update_person(
        &self,
        id: PersonID,
        params: &UpdatePersonParams,
        exclude_defaults: bool,
    ) -> Result<()> {
        let compiled =
            compile_set(params, vec![SqlValue::Int(id.0)], exclude_defaults);
        if compiled.is_empty() {
            debug!(person_id = %id, "Nothing to update");
            return Ok(());
        }

        let sql = format!("UPDATE persons SET {} WHERE id = $1", compiled.clause);
        let result = sqlx::query_with(&sql, into_arguments(compiled.args)?)
            .execute(self.pool())
            .await
            .map_err(|e| map_store_error("Failed to update person", e))?;

        if result.rows_affected() == 0 {
            return Err(CatalogError::NotFound(format!("person {}", id)));
        }
        Ok(())
    }

    async fn delete_persons(&self, ids: &[PersonID]) -> Result<Vec<PersonID>> {
        let mut deleted = self
            .fetch_ids(
                "DELETE FROM persons WHERE id = ANY($1) RETURNING id",
                vec![id_array(ids)],
            )
            .await?;
        deleted.sort();

        info!(requested = ids.len(), deleted = deleted.len(), "Deleted persons");
        Ok(deleted)
    }
}

fn id_array(ids: &[PersonID]) -> SqlValue {
    SqlValue::IntArray(ids.iter().map(|id| id.0).collect())
}

fn into_arguments(values: Vec<SqlValue>) -> Result<PgArguments> {
    let mut args = PgArguments::default();
    for value in values {
        let bound = match value {
            SqlValue::Text(v) => args.add(v),
            SqlValue::Date(v) => args.add(v),
            SqlValue::Int(v) => args.add(v),
            SqlValue::BigInt(v) => args.add(v),
            SqlValue::IntArray(v) => args.add(v),
        };
        bound.map_err(|e| {
            CatalogError::Internal(format!("Failed to bind argument: {}", e))
        })?;
    }
    Ok(args)
}

fn map_store_error(context: &str, err: sqlx::Error) -> CatalogError {
    match err {
        sqlx::Error::RowNotFound => CatalogError::NotFound(context.to_string()),
        other => CatalogError::Internal(format!("{}: {}", context, other)),
    }
}

/// Lower-cased `LIKE` pattern matching values that start with `name`.
fn like_prefix(name: &str) -> String {
    let mut pattern = String::with_capacity(name.len() + 1);
    for ch in name.to_lowercase().chars() {
        if matches!(ch, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(ch);
    }
    pattern.push('%');
    pattern
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn like_prefix_lowercases_and_escapes_wildcards() {
        assert_eq!(like_prefix("Ива"), "ива%");
        assert_eq!(like_prefix("50%_a"), "50\\%\\_a%");
        assert_eq!(like_prefix("a\\b"), "a\\\\b%");
    }

    #[test]
    fn row_not_found_maps_to_not_found() {
        let err = map_store_error("Failed", sqlx::Error::RowNotFound);
        assert_eq!(err.kind(), crate::error::ErrorKind::NotFound);

        let err = map_store_error("Failed", sqlx::Error::PoolTimedOut);
        assert_eq!(err.kind(), crate::error::ErrorKind::Internal);
    }
}
