mod common;

use axum::{
    body::Body,
    http::{Method, Request, StatusCode, header},
};
use common::{PNG_BYTES, TestApp, multipart_field, multipart_image};
use newsroom_api::{
    error::GENERIC_FAILURE,
    models::WriterAccount,
    providers::{MockEmailSender, MockImageStore, MockPaymentProvider},
    repository::Repository,
    validation::MAX_IMAGE_BYTES,
};
use serde_json::Value;

const JPEG_BYTES: &[u8] = &[0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, b'J', b'F', b'I', b'F'];

async fn upload(app: &TestApp, uri: &str, token: &str, form: (String, Vec<u8>)) -> (StatusCode, Value) {
    let (content_type, body) = form;
    let request = Request::builder()
        .method(Method::PUT)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .header(header::CONTENT_TYPE, content_type)
        .body(Body::from(body))
        .unwrap();
    app.send(request).await
}

async fn writer_with_token(app: &TestApp, email: &str) -> (WriterAccount, String) {
    let section = match app.repo.find_section_by_name("Tech").await.unwrap() {
        Some(section) => section,
        None => app.seed_section("Tech").await,
    };
    let writer = app.seed_writer(email, section.id).await;
    let token = app.token_for(writer.id);
    (writer, token)
}

async fn stored_image_id(app: &TestApp, writer_id: uuid::Uuid) -> Option<String> {
    app.repo.find_writer(writer_id).await.unwrap().unwrap().image_id
}

// --- Profile image ---

#[tokio::test]
async fn test_profile_image_upload_replaces_previous_file() {
    let app = TestApp::new();
    let (writer, token) = writer_with_token(&app, "w@news.com").await;

    let (status, body) = upload(
        &app,
        "/api/writers/account/image",
        &token,
        multipart_image(PNG_BYTES, "me.png", "image/png"),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["msg"], "Image updated successfully!");
    let first_url = body["data"]["image"].as_str().unwrap().to_string();
    assert!(first_url.contains("/writers/"));
    assert!(first_url.ends_with(".png"));
    // The store handle never leaves the server.
    assert!(body["data"].get("imageId").is_none());

    let first_id = stored_image_id(&app, writer.id).await.unwrap();
    assert!(app.storage.deleted().is_empty());

    let (status, body) = upload(
        &app,
        "/api/writers/account/image",
        &token,
        multipart_image(JPEG_BYTES, "me.jpg", "image/jpeg"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["data"]["image"].as_str().unwrap().ends_with(".jpg"));

    assert_eq!(app.storage.uploaded().len(), 2);
    assert_eq!(app.storage.deleted(), vec![first_id]);
}

#[tokio::test]
async fn test_image_content_is_sniffed_not_trusted() {
    let app = TestApp::new();
    let (_, token) = writer_with_token(&app, "w@news.com").await;

    // A GIF declared as PNG is still a GIF.
    let (status, body) = upload(
        &app,
        "/api/writers/account/image",
        &token,
        multipart_image(b"GIF89a\x01\x00\x01\x00", "fake.png", "image/png"),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["msg"], "File format not allowed! Only JPG or PNG...");
    assert!(app.storage.uploaded().is_empty());
}

#[tokio::test]
async fn test_oversized_image_gets_the_size_message() {
    let app = TestApp::new();
    let (_, token) = writer_with_token(&app, "w@news.com").await;

    let mut oversized = PNG_BYTES.to_vec();
    oversized.resize(MAX_IMAGE_BYTES + 1, 0);
    let (status, body) = upload(
        &app,
        "/api/writers/account/image",
        &token,
        multipart_image(&oversized, "big.png", "image/png"),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["msg"], "File must be up to 2mb!");
}

#[tokio::test]
async fn test_upload_requires_an_image_part() {
    let app = TestApp::new();
    let (_, token) = writer_with_token(&app, "w@news.com").await;

    let (status, body) = upload(
        &app,
        "/api/writers/account/image",
        &token,
        multipart_field("avatar", PNG_BYTES, "me.png", "image/png"),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["msg"], "Image file is missing!");

    // Not a multipart request at all.
    let (status, body) = app
        .put("/api/writers/account/image", Some(&token), serde_json::json!({}))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["statusCode"], 400);
}

#[tokio::test]
async fn test_delete_profile_image() {
    let app = TestApp::new();
    let (writer, token) = writer_with_token(&app, "w@news.com").await;

    let (status, body) = app.delete("/api/writers/account/image", Some(&token)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["msg"], "You do not have a profile image!");

    upload(
        &app,
        "/api/writers/account/image",
        &token,
        multipart_image(PNG_BYTES, "me.png", "image/png"),
    )
    .await;
    let remote_id = stored_image_id(&app, writer.id).await.unwrap();

    let (status, body) = app.delete("/api/writers/account/image", Some(&token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["msg"], "Image deleted successfully!");
    assert!(body["data"]["image"].is_null());
    assert_eq!(app.storage.deleted(), vec![remote_id]);
    assert!(stored_image_id(&app, writer.id).await.is_none());
}

#[tokio::test]
async fn test_store_failure_is_a_server_error() {
    let app = TestApp::with_collaborators(
        MockImageStore::new_failing(),
        MockPaymentProvider::new(),
        MockEmailSender::new(),
    );
    let (writer, token) = writer_with_token(&app, "w@news.com").await;

    let (status, body) = upload(
        &app,
        "/api/writers/account/image",
        &token,
        multipart_image(PNG_BYTES, "me.png", "image/png"),
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["msg"], GENERIC_FAILURE);
    assert!(stored_image_id(&app, writer.id).await.is_none());
}

#[tokio::test]
async fn test_uploads_need_a_writer_session() {
    let app = TestApp::new();
    let reader = app.seed_reader("r@news.com", false).await;

    let (status, _) = upload(
        &app,
        "/api/writers/account/image",
        &app.token_for(reader.id),
        multipart_image(PNG_BYTES, "me.png", "image/png"),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(app.storage.uploaded().is_empty());
}

// --- Article photo ---

#[tokio::test]
async fn test_article_photo_is_owner_only_and_replaced() {
    let app = TestApp::new();
    let (owner, owner_token) = writer_with_token(&app, "owner@news.com").await;
    let (_, other_token) = writer_with_token(&app, "other@news.com").await;
    let article = app.seed_article(&owner, "Photo", true, false).await;
    let uri = format!("/api/writers/article/{}/image", article.id);

    let (status, body) = upload(&app, &uri, &other_token, multipart_image(PNG_BYTES, "a.png", "image/png")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["msg"], "You can not access to an article that is not yours!");
    assert!(app.storage.uploaded().is_empty());

    let (status, body) = upload(&app, &uri, &owner_token, multipart_image(PNG_BYTES, "a.png", "image/png")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["data"]["photo"].as_str().unwrap().contains("/articles/"));
    let first = app.storage.uploaded()[0].clone();

    upload(&app, &uri, &owner_token, multipart_image(JPEG_BYTES, "b.jpg", "image/jpeg")).await;
    assert_eq!(app.storage.deleted(), vec![first]);

    // Deleting the article removes its current photo too.
    let second = app.storage.uploaded()[1].clone();
    let (status, _) = app
        .delete(&format!("/api/writers/article/{}", article.id), Some(&owner_token))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(app.storage.deleted().last(), Some(&second));
}

#[tokio::test]
async fn test_article_photo_for_missing_article() {
    let app = TestApp::new();
    let (_, token) = writer_with_token(&app, "w@news.com").await;
    let missing = uuid::Uuid::new_v4();

    let (status, body) = upload(
        &app,
        &format!("/api/writers/article/{missing}/image"),
        &token,
        multipart_image(PNG_BYTES, "a.png", "image/png"),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["msg"], format!("Article with ID: {missing} not found!"));
}
