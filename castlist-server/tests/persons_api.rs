use std::io::Cursor;
use std::sync::Arc;

use anyhow::Result;
use axum::http::StatusCode;
use axum_test::TestServer;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use castlist_config::ConfigLoader;
use castlist_config::models::sources::EnvConfig;
use castlist_server::{create_app, infra::startup::build_state};
use image::{ImageFormat, RgbImage};
use serde_json::{Value, json};

const PERSONS: &str = "/api/v1/persons";

async fn dev_server() -> Result<TestServer> {
    let load = ConfigLoader::new().load_from_env(EnvConfig::from_lookup(
        |name| match name {
            "DEV_MODE" => Some("true".to_string()),
            "BASE_PHOTO_URL" => Some("http://photos.local/".to_string()),
            "UPLOAD_PARALLELISM" => Some("2".to_string()),
            _ => None,
        },
    ))?;
    let state = build_state(Arc::new(load.config)).await?;
    TestServer::new(create_app(state)).map_err(|err| anyhow::anyhow!(err.to_string()))
}

fn png(width: u32, height: u32) -> String {
    let mut bytes = Cursor::new(Vec::new());
    RgbImage::from_pixel(width, height, image::Rgb([120, 80, 40]))
        .write_to(&mut bytes, ImageFormat::Png)
        .expect("encode png");
    BASE64.encode(bytes.into_inner())
}

async fn create(server: &TestServer, body: Value) -> i64 {
    let response = server.post(PERSONS).json(&body).await;
    response.assert_status(StatusCode::CREATED);
    response.json::<Value>()["id"]
        .as_i64()
        .expect("created id")
}

async fn get_one(server: &TestServer, id: i64) -> Value {
    let response = server
        .get(PERSONS)
        .add_query_param("ids", id)
        .add_query_param("page", 1)
        .add_query_param("limit", 10)
        .await;
    response.assert_status_ok();
    response.json::<Value>()["persons"][0].clone()
}

#[tokio::test]
async fn health_reports_memory_backend() -> Result<()> {
    let server = dev_server().await?;
    let response = server.get("/health").await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["checks"]["database"]["backend"], "memory");
    Ok(())
}

#[tokio::test]
async fn created_person_is_readable_with_photo_url() -> Result<()> {
    let server = dev_server().await?;
    let id = create(
        &server,
        json!({
            "fullname_ru": "Иванов Иван",
            "fullname_en": "Ivan Ivanov",
            "birthday": "1990-01-01",
            "sex": "M",
            "photo": png(150, 200),
        }),
    )
    .await;

    let person = get_one(&server, id).await;
    assert_eq!(person["id"], id);
    assert_eq!(person["fullname_ru"], "Иванов Иван");
    assert_eq!(person["birthday"], "1990-01-01");
    let url = person["photo_url"].as_str().unwrap_or_default();
    assert!(url.starts_with("http://photos.local/persons/"), "{url}");
    Ok(())
}

#[tokio::test]
async fn duplicate_create_conflicts_with_matched_ids() -> Result<()> {
    let server = dev_server().await?;
    let body = json!({ "fullname_ru": "Петрова Анна", "sex": "F" });
    let id = create(&server, body.clone()).await;

    let response = server.post(PERSONS).json(&body).await;
    response.assert_status(StatusCode::CONFLICT);
    let error = &response.json::<Value>()["error"];
    assert_eq!(error["kind"], "already_exists");
    assert_eq!(error["ids"], json!([id]));
    assert!(
        error["user_message"]
            .as_str()
            .unwrap_or_default()
            .contains(&id.to_string())
    );
    Ok(())
}

#[tokio::test]
async fn small_photo_is_rejected_with_details() -> Result<()> {
    let server = dev_server().await?;
    let response = server
        .post(PERSONS)
        .json(&json!({ "fullname_ru": "Сидоров", "photo": png(10, 10) }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    let error = &response.json::<Value>()["error"];
    assert_eq!(error["kind"], "invalid_image");
    assert!(
        error["details"]
            .as_str()
            .unwrap_or_default()
            .contains("width")
    );
    Ok(())
}

#[tokio::test]
async fn malformed_requests_are_bad_requests() -> Result<()> {
    let server = dev_server().await?;

    let response = server
        .post(PERSONS)
        .json(&json!({ "fullname_ru": "Сидоров", "photo": "not base64!" }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);

    let response = server
        .post(PERSONS)
        .json(&json!({ "fullname_en": "No Russian Name" }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(
        response.json::<Value>()["error"]["user_message"],
        "fullname_ru mustn't be empty"
    );

    let response = server
        .get(PERSONS)
        .add_query_param("page", 0)
        .add_query_param("limit", 10)
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);

    let response = server
        .get(PERSONS)
        .add_query_param("ids", "1;2")
        .add_query_param("page", 1)
        .add_query_param("limit", 10)
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn missing_persons_are_not_found() -> Result<()> {
    let server = dev_server().await?;
    let response = server
        .get(PERSONS)
        .add_query_param("ids", "404")
        .add_query_param("page", 1)
        .add_query_param("limit", 10)
        .await;
    response.assert_status(StatusCode::NOT_FOUND);
    assert_eq!(response.json::<Value>()["error"]["kind"], "not_found");

    let response = server
        .patch(&format!("{PERSONS}/404"))
        .json(&json!({ "sex": "M" }))
        .await;
    response.assert_status(StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn patch_keeps_fields_and_put_clears_them() -> Result<()> {
    let server = dev_server().await?;
    let id = create(
        &server,
        json!({ "fullname_ru": "Иванов", "fullname_en": "Ivanov", "sex": "M" }),
    )
    .await;
    let item = format!("{PERSONS}/{id}");

    server
        .patch(&item)
        .json(&json!({ "birthday": "1980-05-05" }))
        .await
        .assert_status(StatusCode::NO_CONTENT);
    let person = get_one(&server, id).await;
    assert_eq!(person["fullname_en"], "Ivanov");
    assert_eq!(person["birthday"], "1980-05-05");

    server
        .put(&item)
        .json(&json!({ "sex": "F" }))
        .await
        .assert_status(StatusCode::NO_CONTENT);
    let person = get_one(&server, id).await;
    assert_eq!(person["fullname_ru"], "");
    assert_eq!(person["fullname_en"], "");
    assert_eq!(person["birthday"], "");
    assert_eq!(person["sex"], "F");
    Ok(())
}

#[tokio::test]
async fn search_and_existence_endpoints() -> Result<()> {
    let server = dev_server().await?;
    let ivan = create(
        &server,
        json!({ "fullname_ru": "Иванов Иван", "fullname_en": "Ivan Ivanov", "sex": "M" }),
    )
    .await;
    let anna = create(
        &server,
        json!({ "fullname_ru": "Петрова Анна", "fullname_en": "Anna Petrova", "sex": "F" }),
    )
    .await;

    let response = server
        .get(&format!("{PERSONS}/search"))
        .add_query_param("sex", "F")
        .add_query_param("page", 1)
        .add_query_param("limit", 10)
        .await;
    response.assert_status_ok();
    let persons = response.json::<Value>()["persons"].clone();
    assert_eq!(persons.as_array().map(Vec::len), Some(1));
    assert_eq!(persons[0]["id"], anna);

    let response = server
        .get(&format!("{PERSONS}/search/name"))
        .add_query_param("name", "ivan")
        .add_query_param("page", 1)
        .add_query_param("limit", 10)
        .await;
    response.assert_status_ok();
    assert_eq!(response.json::<Value>()["persons"][0]["id"], ivan);

    let response = server.get(&format!("{PERSONS}/{ivan}/exists")).await;
    assert_eq!(response.json::<Value>()["exists"], true);
    let response = server.get(&format!("{PERSONS}/9999/exists")).await;
    assert_eq!(response.json::<Value>()["exists"], false);

    let response = server
        .get(&format!("{PERSONS}/exists"))
        .add_query_param("ids", format!("{ivan},9999,{anna},9999"))
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["all_exist"], false);
    assert_eq!(body["not_found_ids"], json!([9999]));

    let response = server
        .post(&format!("{PERSONS}/exists"))
        .json(&json!({ "fullname_en": "Anna Petrova" }))
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["exists"], true);
    assert_eq!(body["ids"], json!([anna]));
    Ok(())
}

#[tokio::test]
async fn delete_returns_removed_ids() -> Result<()> {
    let server = dev_server().await?;
    let first = create(&server, json!({ "fullname_ru": "Первый" })).await;
    let second = create(&server, json!({ "fullname_ru": "Второй" })).await;

    let response = server
        .delete(PERSONS)
        .add_query_param("ids", format!("{first},{second},777"))
        .await;
    response.assert_status_ok();
    assert_eq!(
        response.json::<Value>()["deleted_ids"],
        json!([first, second])
    );

    let response = server
        .get(PERSONS)
        .add_query_param("ids", first)
        .add_query_param("page", 1)
        .add_query_param("limit", 10)
        .await;
    response.assert_status(StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn unparsable_requests_use_the_error_body() -> Result<()> {
    let server = dev_server().await?;

    let response = server.get(&format!("{PERSONS}/abc/exists")).await;
    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(response.json::<Value>()["error"]["kind"], "invalid_argument");

    let response = server
        .get(PERSONS)
        .add_query_param("page", "x")
        .add_query_param("limit", 10)
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    let error = &response.json::<Value>()["error"];
    assert_eq!(error["kind"], "invalid_argument");
    assert_eq!(error["status"], 400);

    let response = server
        .post(PERSONS)
        .text("{ not json")
        .content_type("application/json")
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(response.json::<Value>()["error"]["kind"], "invalid_argument");
    Ok(())
}
