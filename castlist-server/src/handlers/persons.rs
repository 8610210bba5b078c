use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use castlist_core::PersonPayload;
use castlist_model::{PersonID, PersonView, SearchPersonParams, parse_birthday, present};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::infra::{
    app_state::AppState,
    errors::{AppError, AppResult},
    extract::{JsonBody, Path, Query},
};

// Query strings are decoded by `serde_urlencoded`, which cannot parse
// numbers through `#[serde(flatten)]`, so paging fields are repeated.
#[derive(Debug, Default, Deserialize)]
pub struct GetPersonsQuery {
    #[serde(default)]
    pub ids: String,
    #[serde(default)]
    pub page: i32,
    #[serde(default)]
    pub limit: i32,
}

#[derive(Debug, Default, Deserialize)]
pub struct IdsQuery {
    #[serde(default)]
    pub ids: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct NameQuery {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub page: i32,
    #[serde(default)]
    pub limit: i32,
}

/// Descriptive fields as they arrive on the wire. Empty strings count as
/// absent.
#[derive(Debug, Default, Deserialize)]
pub struct PersonFields {
    pub fullname_ru: Option<String>,
    pub fullname_en: Option<String>,
    /// `YYYY-MM-DD`.
    pub birthday: Option<String>,
    pub sex: Option<String>,
}

impl PersonFields {
    fn into_search_params(self) -> AppResult<SearchPersonParams> {
        let birthday = parse_birthday(self.birthday.as_deref())
            .map_err(|err| AppError::bad_request(err.to_string()))?;
        Ok(SearchPersonParams {
            fullname_ru: present(self.fullname_ru),
            fullname_en: present(self.fullname_en),
            birthday,
            sex: present(self.sex),
        })
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct SearchQuery {
    pub fullname_ru: Option<String>,
    pub fullname_en: Option<String>,
    pub birthday: Option<String>,
    pub sex: Option<String>,
    #[serde(default)]
    pub page: i32,
    #[serde(default)]
    pub limit: i32,
}

impl SearchQuery {
    fn fields(&self) -> PersonFields {
        PersonFields {
            fullname_ru: self.fullname_ru.clone(),
            fullname_en: self.fullname_en.clone(),
            birthday: self.birthday.clone(),
            sex: self.sex.clone(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct PersonBody {
    #[serde(flatten)]
    pub fields: PersonFields,
    /// Base64 encoded photo; absent or empty keeps the current one.
    #[serde(default)]
    pub photo: Option<String>,
}

impl PersonBody {
    fn into_payload(self) -> AppResult<PersonPayload> {
        let photo = match self.photo.as_deref().map(str::trim) {
            None | Some("") => Vec::new(),
            Some(encoded) => BASE64.decode(encoded).map_err(|err| {
                AppError::bad_request(format!("photo is not valid base64: {err}"))
            })?,
        };
        let params = self.fields.into_search_params()?;
        Ok(PersonPayload {
            fullname_ru: params.fullname_ru,
            fullname_en: params.fullname_en,
            birthday: params.birthday,
            sex: params.sex,
            photo,
        })
    }
}

#[derive(Debug, Serialize)]
pub struct PersonsResponse {
    pub persons: Vec<PersonView>,
}

#[derive(Debug, Serialize)]
pub struct CreatedResponse {
    pub id: PersonID,
}

#[derive(Debug, Serialize)]
pub struct DeletedResponse {
    pub deleted_ids: Vec<PersonID>,
}

#[derive(Debug, Serialize)]
pub struct ExistsResponse {
    pub exists: bool,
}

#[derive(Debug, Serialize)]
pub struct PersonsExistResponse {
    pub all_exist: bool,
    pub not_found_ids: Vec<PersonID>,
}

#[derive(Debug, Serialize)]
pub struct MatchResponse {
    pub exists: bool,
    pub ids: Vec<PersonID>,
}

pub async fn get_persons(
    State(state): State<AppState>,
    Query(query): Query<GetPersonsQuery>,
) -> AppResult<Json<PersonsResponse>> {
    let persons = state
        .persons()
        .get_persons(&query.ids, query.page, query.limit)
        .await?;
    Ok(Json(PersonsResponse { persons }))
}

pub async fn search_persons(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> AppResult<Json<PersonsResponse>> {
    let params = query.fields().into_search_params()?;
    let persons = state
        .persons()
        .search_person(params, query.page, query.limit)
        .await?;
    Ok(Json(PersonsResponse { persons }))
}

pub async fn search_persons_by_name(
    State(state): State<AppState>,
    Query(query): Query<NameQuery>,
) -> AppResult<Json<PersonsResponse>> {
    let persons = state
        .persons()
        .search_person_by_name(&query.name, query.page, query.limit)
        .await?;
    Ok(Json(PersonsResponse { persons }))
}

pub async fn person_exists(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> AppResult<Json<ExistsResponse>> {
    let exists = state
        .persons()
        .is_person_with_id_exists(PersonID(id))
        .await?;
    Ok(Json(ExistsResponse { exists }))
}

pub async fn persons_exist(
    State(state): State<AppState>,
    Query(query): Query<IdsQuery>,
) -> AppResult<Json<PersonsExistResponse>> {
    let existence = state.persons().is_persons_exists(&query.ids).await?;
    Ok(Json(PersonsExistResponse {
        all_exist: existence.all_exist,
        not_found_ids: existence.not_found_ids,
    }))
}

pub async fn person_matches(
    State(state): State<AppState>,
    JsonBody(fields): JsonBody<PersonFields>,
) -> AppResult<Json<MatchResponse>> {
    let params = fields.into_search_params()?;
    let existence = state.persons().is_person_exists(params).await?;
    Ok(Json(MatchResponse {
        exists: existence.exists,
        ids: existence.ids,
    }))
}

pub async fn create_person(
    State(state): State<AppState>,
    JsonBody(body): JsonBody<PersonBody>,
) -> AppResult<impl IntoResponse> {
    let id = state.persons().create_person(body.into_payload()?).await?;
    Ok((StatusCode::CREATED, Json(CreatedResponse { id })))
}

/// Full update: absent fields are cleared.
pub async fn update_person(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    JsonBody(body): JsonBody<PersonBody>,
) -> AppResult<StatusCode> {
    state
        .persons()
        .update_person(PersonID(id), body.into_payload()?)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Partial update: only fields present in the body change.
pub async fn update_person_fields(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    JsonBody(body): JsonBody<PersonBody>,
) -> AppResult<StatusCode> {
    state
        .persons()
        .update_person_fields(PersonID(id), body.into_payload()?)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn delete_persons(
    State(state): State<AppState>,
    Query(query): Query<IdsQuery>,
) -> AppResult<Json<DeletedResponse>> {
    let deleted_ids = state.persons().delete_persons(&query.ids).await?;
    debug!(count = deleted_ids.len(), "delete request served");
    Ok(Json(DeletedResponse { deleted_ids }))
}
