use axum::{
    Router,
    routing::{get, put},
};

use crate::{AppState, handlers::persons};

/// Create all v1 API routes
pub fn create_v1_router() -> Router<AppState> {
    Router::new()
        .route(
            "/persons",
            get(persons::get_persons)
                .post(persons::create_person)
                .delete(persons::delete_persons),
        )
        .route("/persons/search", get(persons::search_persons))
        .route("/persons/search/name", get(persons::search_persons_by_name))
        .route(
            "/persons/exists",
            get(persons::persons_exist).post(persons::person_matches),
        )
        .route("/persons/{id}/exists", get(persons::person_exists))
        .route(
            "/persons/{id}",
            put(persons::update_person)
                .patch(persons::update_person_fields),
        )
}
