use async_trait::async_trait;
use castlist_model::{
    CreatePersonParams, Person, PersonID, SearchPersonParams,
    UpdatePersonParams,
};

use crate::error::Result;
use crate::query::Pagination;

/// Relational store port for person rows.
///
/// Listing methods return an empty vector when nothing matches; translating
/// that into `NotFound` is left to the caller.
#[async_trait]
pub trait PersonsRepository: Send + Sync {
    async fn get_persons(
        &self,
        ids: &[PersonID],
        pagination: Pagination,
    ) -> Result<Vec<Person>>;
    async fn get_all_persons(&self, pagination: Pagination) -> Result<Vec<Person>>;
    async fn search_persons(
        &self,
        params: &SearchPersonParams,
        pagination: Pagination,
    ) -> Result<Vec<Person>>;
    /// Case-insensitive prefix match against both name columns.
    async fn search_persons_by_name(
        &self,
        name: &str,
        pagination: Pagination,
    ) -> Result<Vec<Person>>;

    /// Ids of rows matching every present field of `params`, in id order.
    async fn matching_ids(
        &self,
        params: &SearchPersonParams,
        limit: Option<i64>,
    ) -> Result<Vec<PersonID>>;
    async fn person_exists(&self, id: PersonID) -> Result<bool>;
    /// Subset of `ids` present in the store.
    async fn existing_ids(&self, ids: &[PersonID]) -> Result<Vec<PersonID>>;

    async fn create_person(&self, params: &CreatePersonParams) -> Result<PersonID>;
    /// Update one row. `exclude_defaults` selects a partial update; otherwise
    /// absent descriptive fields are cleared. Fails with `NotFound` when the
    /// row is gone.
    async fn update_person(
        &self,
        id: PersonID,
        params: &UpdatePersonParams,
        exclude_defaults: bool,
    ) -> Result<()>;
    /// Delete the given rows, returning the ids that were actually removed.
    async fn delete_persons(&self, ids: &[PersonID]) -> Result<Vec<PersonID>>;
}
