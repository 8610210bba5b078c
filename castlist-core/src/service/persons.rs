use std::any::type_name_of_val;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use castlist_model::{
    CreatePersonParams, Person, PersonID, PersonView, SearchPersonParams,
    UpdatePersonParams,
};
use chrono::NaiveDate;
use tracing::{debug, info, instrument};

use super::validate::parse_id_list;
use crate::database::ports::persons::PersonsRepository;
use crate::error::{CatalogError, Result};
use crate::events::{PersonEvents, spawn_person_deleted};
use crate::image::ImagePipeline;
use crate::query::Pagination;

/// Upper bound on ids reported by the duplicate probe during create.
pub const DUPLICATE_PROBE_LIMIT: i64 = 2;

/// Descriptive fields plus optional photo bytes, as accepted by create and
/// both update flavours.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PersonPayload {
    pub fullname_ru: Option<String>,
    pub fullname_en: Option<String>,
    pub birthday: Option<NaiveDate>,
    pub sex: Option<String>,
    /// Raw photo; empty means "no new photo".
    pub photo: Vec<u8>,
}

impl PersonPayload {
    fn search_params(&self) -> SearchPersonParams {
        SearchPersonParams {
            fullname_ru: self.fullname_ru.clone(),
            fullname_en: self.fullname_en.clone(),
            birthday: self.birthday,
            sex: self.sex.clone(),
        }
    }

    fn update_params(&self, photo_id: Option<String>) -> UpdatePersonParams {
        UpdatePersonParams {
            fullname_ru: self.fullname_ru.clone(),
            fullname_en: self.fullname_en.clone(),
            birthday: self.birthday,
            sex: self.sex.clone(),
            photo_id,
        }
    }
}

/// Result of a predicate existence probe.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PersonExistence {
    pub exists: bool,
    pub ids: Vec<PersonID>,
}

/// Result of an id-set existence check.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PersonsExistence {
    pub all_exist: bool,
    pub not_found_ids: Vec<PersonID>,
}

/// Person lifecycle: dedup-before-create, paginated reads, partial and full
/// updates, deletes with notifications, and existence checks.
#[derive(Clone)]
pub struct PersonsService {
    repo: Arc<dyn PersonsRepository>,
    images: ImagePipeline,
    events: Arc<dyn PersonEvents>,
}

impl fmt::Debug for PersonsService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PersonsService")
            .field("repo", &type_name_of_val(self.repo.as_ref()))
            .field("images", &self.images)
            .field("events", &type_name_of_val(self.events.as_ref()))
            .finish()
    }
}

impl PersonsService {
    pub fn new(
        repo: Arc<dyn PersonsRepository>,
        images: ImagePipeline,
        events: Arc<dyn PersonEvents>,
    ) -> Self {
        Self {
            repo,
            images,
            events,
        }
    }

    /// List persons by id, or all persons when `ids` is empty.
    #[instrument(skip(self))]
    pub async fn get_persons(
        &self,
        ids: &str,
        page: i32,
        limit: i32,
    ) -> Result<Vec<PersonView>> {
        let pagination = Pagination::new(page, limit)?;

        let persons = if ids.is_empty() {
            self.repo.get_all_persons(pagination).await?
        } else {
            let ids = parse_id_list(ids)?;
            if ids.is_empty() {
                Vec::new()
            } else {
                self.repo.get_persons(&ids, pagination).await?
            }
        };

        self.found(persons)
    }

    #[instrument(skip(self))]
    pub async fn search_person(
        &self,
        params: SearchPersonParams,
        page: i32,
        limit: i32,
    ) -> Result<Vec<PersonView>> {
        let pagination = Pagination::new(page, limit)?;
        if params.is_empty() {
            return Err(CatalogError::invalid_argument_for_user(
                "at least one search field must be set",
            ));
        }

        let persons = self.repo.search_persons(&params, pagination).await?;
        self.found(persons)
    }

    #[instrument(skip(self))]
    pub async fn search_person_by_name(
        &self,
        name: &str,
        page: i32,
        limit: i32,
    ) -> Result<Vec<PersonView>> {
        if name.is_empty() {
            return Err(CatalogError::invalid_argument_for_user(
                "name mustn't be empty",
            ));
        }
        let pagination = Pagination::new(page, limit)?;

        let persons = self.repo.search_persons_by_name(name, pagination).await?;
        self.found(persons)
    }

    pub async fn is_person_with_id_exists(&self, id: PersonID) -> Result<bool> {
        self.repo.person_exists(id).await
    }

    /// Check a comma separated id list; reports the ids that are missing.
    pub async fn is_persons_exists(&self, ids: &str) -> Result<PersonsExistence> {
        let requested = parse_id_list(ids)?;
        let existing: HashSet<PersonID> =
            self.repo.existing_ids(&requested).await?.into_iter().collect();

        let mut seen = HashSet::new();
        let not_found_ids: Vec<PersonID> = requested
            .into_iter()
            .filter(|id| !existing.contains(id) && seen.insert(*id))
            .collect();

        Ok(PersonsExistence {
            all_exist: not_found_ids.is_empty(),
            not_found_ids,
        })
    }

    /// Probe for persons matching every present field of `params`.
    pub async fn is_person_exists(
        &self,
        params: SearchPersonParams,
    ) -> Result<PersonExistence> {
        self.probe(&params, None).await
    }

    /// Create a person unless a likely duplicate already exists.
    #[instrument(skip(self, payload), fields(photo_len = payload.photo.len()))]
    pub async fn create_person(&self, payload: PersonPayload) -> Result<PersonID> {
        let dedup = payload.search_params();
        if dedup.fullname_ru.is_none() {
            return Err(CatalogError::invalid_argument_for_user(
                "fullname_ru mustn't be empty",
            ));
        }

        let duplicates = self.probe(&dedup, Some(DUPLICATE_PROBE_LIMIT)).await?;
        if duplicates.exists {
            return Err(CatalogError::already_exists(duplicates.ids));
        }

        let photo_id = self.upload_photo(&payload.photo).await?;
        let params = CreatePersonParams {
            fullname_ru: payload.fullname_ru,
            fullname_en: payload.fullname_en,
            birthday: payload.birthday,
            sex: payload.sex,
            photo_id,
        };

        let id = self.repo.create_person(&params).await?;
        info!(person_id = %id, "Person created");
        Ok(id)
    }

    /// Partial update: only present fields change.
    #[instrument(skip(self, payload), fields(photo_len = payload.photo.len()))]
    pub async fn update_person_fields(
        &self,
        id: PersonID,
        payload: PersonPayload,
    ) -> Result<()> {
        self.update(id, payload, true).await
    }

    /// Full update: absent descriptive fields are cleared. The photo is only
    /// replaced when new bytes are supplied.
    #[instrument(skip(self, payload), fields(photo_len = payload.photo.len()))]
    pub async fn update_person(&self, id: PersonID, payload: PersonPayload) -> Result<()> {
        self.update(id, payload, false).await
    }

    /// Delete persons by id list and return the ids actually removed.
    ///
    /// A `person_deleted` event per removed id is published in the
    /// background; the call does not wait for it.
    #[instrument(skip(self))]
    pub async fn delete_persons(&self, ids: &str) -> Result<Vec<PersonID>> {
        let ids = parse_id_list(ids)?;
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let deleted = self.repo.delete_persons(&ids).await?;
        if !deleted.is_empty() {
            spawn_person_deleted(Arc::clone(&self.events), deleted.clone());
        }
        Ok(deleted)
    }

    async fn update(
        &self,
        id: PersonID,
        payload: PersonPayload,
        exclude_defaults: bool,
    ) -> Result<()> {
        if !self.repo.person_exists(id).await? {
            return Err(CatalogError::NotFound(format!("person {}", id)));
        }

        let photo_id = self.upload_photo(&payload.photo).await?;
        let params = payload.update_params(photo_id);
        self.repo.update_person(id, &params, exclude_defaults).await?;

        debug!(person_id = %id, exclude_defaults, "Person updated");
        Ok(())
    }

    async fn probe(
        &self,
        params: &SearchPersonParams,
        limit: Option<i64>,
    ) -> Result<PersonExistence> {
        if params.is_empty() {
            return Err(CatalogError::invalid_argument_for_user(
                "at least one search field must be set",
            ));
        }
        let ids = self.repo.matching_ids(params, limit).await?;
        Ok(PersonExistence {
            exists: !ids.is_empty(),
            ids,
        })
    }

    async fn upload_photo(&self, photo: &[u8]) -> Result<Option<String>> {
        if photo.is_empty() {
            return Ok(None);
        }
        self.images.upload(photo).await.map(Some)
    }

    fn found(&self, persons: Vec<Person>) -> Result<Vec<PersonView>> {
        if persons.is_empty() {
            return Err(CatalogError::NotFound("persons not found".to_string()));
        }
        Ok(persons
            .into_iter()
            .map(|person| {
                let url = self
                    .images
                    .photo_url(person.photo_id.as_deref().unwrap_or_default());
                person.into_view(url)
            })
            .collect())
    }
}
