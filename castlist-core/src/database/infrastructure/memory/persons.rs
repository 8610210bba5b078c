use std::collections::BTreeMap;

use async_trait::async_trait;
use castlist_model::{
    CreatePersonParams, Person, PersonID, SearchPersonParams,
    UpdatePersonParams,
};
use tokio::sync::RwLock;
use tracing::info;

use crate::database::ports::persons::PersonsRepository;
use crate::error::{CatalogError, Result};
use crate::query::Pagination;

#[derive(Debug, Default)]
struct Table {
    rows: BTreeMap<PersonID, Person>,
    last_id: i32,
}

/// Process-local person store used in dev mode and tests.
///
/// Mirrors the statement semantics of the PostgreSQL adapter: id ordering,
/// sparse predicates, and clearing on a full overwrite.
#[derive(Debug, Default)]
pub struct InMemoryPersonsRepository {
    table: RwLock<Table>,
}

impl InMemoryPersonsRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.table.read().await.rows.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

fn matches(person: &Person, params: &SearchPersonParams) -> bool {
    let eq = |expected: &Option<String>, actual: Option<&str>| match expected {
        Some(expected) => actual == Some(expected.as_str()),
        None => true,
    };

    eq(&params.fullname_ru, Some(person.fullname_ru.as_str()))
        && eq(&params.fullname_en, person.fullname_en.as_deref())
        && params.birthday.is_none_or(|b| person.birthday == Some(b))
        && eq(&params.sex, person.sex.as_deref())
}

fn page<'a>(
    rows: impl Iterator<Item = &'a Person>,
    pagination: Pagination,
) -> Vec<Person> {
    rows.skip(pagination.offset() as usize)
        .take(pagination.limit() as usize)
        .cloned()
        .collect()
}

#[async_trait]
impl PersonsRepository for InMemoryPersonsRepository {
    async fn get_persons(
        &self,
        ids: &[PersonID],
        pagination: Pagination,
    ) -> Result<Vec<Person>> {
        let table = self.table.read().await;
        Ok(page(
            table.rows.values().filter(|p| ids.contains(&p.id)),
            pagination,
        ))
    }

    async fn get_all_persons(&self, pagination: Pagination) -> Result<Vec<Person>> {
        let table = self.table.read().await;
        Ok(page(table.rows.values(), pagination))
    }

    async fn search_persons(
        &self,
        params: &SearchPersonParams,
        pagination: Pagination,
    ) -> Result<Vec<Person>> {
        if params.is_empty() {
            return Err(CatalogError::invalid_argument(
                "search predicate has no fields",
            ));
        }
        let table = self.table.read().await;
        Ok(page(
            table.rows.values().filter(|p| matches(p, params)),
            pagination,
        ))
    }

    async fn search_persons_by_name(
        &self,
        name: &str,
        pagination: Pagination,
    ) -> Result<Vec<Person>> {
        let prefix = name.to_lowercase();
        let starts = |value: Option<&str>| {
            value.is_some_and(|v| v.to_lowercase().starts_with(&prefix))
        };

        let table = self.table.read().await;
        Ok(page(
            table.rows.values().filter(|p| {
                starts(Some(p.fullname_ru.as_str()))
                    || starts(p.fullname_en.as_deref())
            }),
            pagination,
        ))
    }

    async fn matching_ids(
        &self,
        params: &SearchPersonParams,
        limit: Option<i64>,
    ) -> Result<Vec<PersonID>> {
        if params.is_empty() {
            return Err(CatalogError::invalid_argument(
                "search predicate has no fields",
            ));
        }
        let table = self.table.read().await;
        let limit = limit.map_or(usize::MAX, |l| l.max(0) as usize);
        Ok(table
            .rows
            .values()
            .filter(|p| matches(p, params))
            .map(|p| p.id)
            .take(limit)
            .collect())
    }

    async fn person_exists(&self, id: PersonID) -> Result<bool> {
        Ok(self.table.read().await.rows.contains_key(&id))
    }

    async fn existing_ids(&self, ids: &[PersonID]) -> Result<Vec<PersonID>> {
        let table = self.table.read().await;
        Ok(table
            .rows
            .keys()
            .filter(|id| ids.contains(id))
            .copied()
            .collect())
    }

    async fn create_person(&self, params: &CreatePersonParams) -> Result<PersonID> {
        let Some(fullname_ru) = params.fullname_ru.clone() else {
            return Err(CatalogError::Internal(
                "null value in column \"fullname_ru\"".to_string(),
            ));
        };

        let mut table = self.table.write().await;
        table.last_id += 1;
        let id = PersonID(table.last_id);
        table.rows.insert(
            id,
            Person {
                id,
                fullname_ru,
                fullname_en: params.fullname_en.clone(),
                birthday: params.birthday,
                sex: params.sex.clone(),
                photo_id: params.photo_id.clone(),
            },
        );

        info!(person_id = %id, "Created person");
        Ok(id)
    }

    async fn update_person(
        &self,
        id: PersonID,
        params: &UpdatePersonParams,
        exclude_defaults: bool,
    ) -> Result<()> {
        let mut table = self.table.write().await;
        let person = table
            .rows
            .get_mut(&id)
            .ok_or_else(|| CatalogError::NotFound(format!("person {}", id)))?;

        if exclude_defaults {
            if let Some(name) = &params.fullname_ru {
                person.fullname_ru = name.clone();
            }
            if params.fullname_en.is_some() {
                person.fullname_en = params.fullname_en.clone();
            }
            if params.birthday.is_some() {
                person.birthday = params.birthday;
            }
            if params.sex.is_some() {
                person.sex = params.sex.clone();
            }
        } else {
            person.fullname_ru = params.fullname_ru.clone().unwrap_or_default();
            person.fullname_en = params.fullname_en.clone();
            person.birthday = params.birthday;
            person.sex = params.sex.clone();
        }

        if params.photo_id.is_some() {
            person.photo_id = params.photo_id.clone();
        }
        Ok(())
    }

    async fn delete_persons(&self, ids: &[PersonID]) -> Result<Vec<PersonID>> {
        let mut table = self.table.write().await;
        let mut deleted: Vec<PersonID> = ids
            .iter()
            .filter(|id| table.rows.remove(id).is_some())
            .copied()
            .collect();
        deleted.sort();
        Ok(deleted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pagination() -> Pagination {
        Pagination::new(1, 10).expect("valid pagination")
    }

    async fn seed(repo: &InMemoryPersonsRepository, name: &str) -> PersonID {
        repo.create_person(&CreatePersonParams {
            fullname_ru: Some(name.to_string()),
            sex: Some("M".into()),
            ..Default::default()
        })
        .await
        .expect("create")
    }

    #[tokio::test]
    async fn ids_are_assigned_sequentially() {
        let repo = InMemoryPersonsRepository::new();
        assert_eq!(seed(&repo, "А").await, PersonID(1));
        assert_eq!(seed(&repo, "Б").await, PersonID(2));
        assert_eq!(repo.len().await, 2);
    }

    #[tokio::test]
    async fn name_search_is_case_insensitive_prefix() {
        let repo = InMemoryPersonsRepository::new();
        seed(&repo, "Иванов").await;
        seed(&repo, "Петров").await;

        let found = repo
            .search_persons_by_name("иВа", pagination())
            .await
            .expect("search");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].fullname_ru, "Иванов");
    }

    #[tokio::test]
    async fn full_update_clears_absent_fields() {
        let repo = InMemoryPersonsRepository::new();
        let id = seed(&repo, "Иванов").await;

        repo.update_person(id, &UpdatePersonParams::default(), false)
            .await
            .expect("update");

        let person = repo
            .get_persons(&[id], pagination())
            .await
            .expect("get")
            .remove(0);
        assert_eq!(person.fullname_ru, "");
        assert_eq!(person.sex, None);
    }

    #[tokio::test]
    async fn delete_reports_only_removed_ids() {
        let repo = InMemoryPersonsRepository::new();
        let a = seed(&repo, "А").await;
        let b = seed(&repo, "Б").await;

        let deleted = repo
            .delete_persons(&[b, PersonID(99), a])
            .await
            .expect("delete");
        assert_eq!(deleted, vec![a, b]);
        assert!(repo.is_empty().await);
    }
}
