mod common;

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use common::{PASSWORD, TestApp};
use newsroom_api::{
    auth::LOCAL_BYPASS_HEADER,
    error::GENERIC_FAILURE,
    models::ArticleChanges,
    providers::{MockEmailSender, MockImageStore, MockPaymentProvider},
    repository::Repository,
};
use serde_json::{Value, json};

async fn login(app: &TestApp, audience: &str, email: &str) -> String {
    let (status, body) = app
        .post(
            &format!("/api/{audience}/login"),
            None,
            json!({ "email": email, "password": PASSWORD }),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "login failed: {body}");
    assert_eq!(body["msg"], "You logged in successfully");
    body["data"]["token"].as_str().expect("token").to_string()
}

fn msg(body: &Value) -> &str {
    body["msg"].as_str().unwrap_or_default()
}

#[tokio::test]
async fn test_health_check() {
    let app = TestApp::new();
    let (status, _) = app.get("/health", None).await;
    assert_eq!(status, StatusCode::OK);
}

// --- Reader lifecycle ---

#[tokio::test]
async fn test_reader_registration_verification_and_session() {
    let app = TestApp::new();
    let registration = json!({
        "email": "reader@news.com",
        "password": PASSWORD,
        "password2": PASSWORD,
    });

    let (status, body) = app.post("/api/users/account", None, registration.clone()).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["statusCode"], 201);
    assert_eq!(msg(&body), "Account created successfully!");
    assert_eq!(body["data"]["isVerified"], false);
    let reader_id = body["data"]["id"].as_str().unwrap().to_string();

    // The verification link is mailed out.
    let sent = app.mailer.sent();
    assert_eq!(sent.len(), 1);
    assert!(sent[0].html.contains(&format!("/api/users/account/{reader_id}/verify")));

    let (status, body) = app.post("/api/users/account", None, registration).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(msg(&body), "Email \"reader@news.com\" exists! Try with another one!");

    // Unverified readers cannot log in.
    let (status, body) = app
        .post("/api/users/login", None, json!({ "email": "reader@news.com", "password": PASSWORD }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(msg(&body), "Please verify your account!");

    let verify = format!("/api/users/account/{reader_id}/verify");
    let (status, body) = app.get(&verify, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(msg(&body), "Your account is now verified!");
    let (status, body) = app.get(&verify, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(msg(&body), "Account already verified!");

    let token = login(&app, "users", "READER@news.com").await;

    let (status, body) = app
        .post("/api/users/login", Some(&token), json!({ "email": "reader@news.com", "password": PASSWORD }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(msg(&body), "An user is already logged in!");

    let (status, body) = app.get("/api/users/account", Some(&token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["type"], "USER");
    assert_eq!(body["data"]["email"], "reader@news.com");

    // Registration left a welcome notification.
    let (status, body) = app.get("/api/users/notifications", Some(&token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["totalResults"], 1);
    assert_eq!(body["data"]["data"][0]["text"], "Your account was created successfully!");

    let (status, body) = app.get("/api/users/logout", Some(&token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(msg(&body), "You successfully logged out!");

    // The revoked token no longer resolves.
    let (status, body) = app.get("/api/users/account", Some(&token)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(msg(&body), "No User Account logged in");
    let (status, body) = app.get("/api/users/logout", Some(&token)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(msg(&body), "No user logged in");
}

#[tokio::test]
async fn test_registration_validation_messages() {
    let app = TestApp::new();

    let (status, body) = app
        .post("/api/users/account", None, json!({ "email": "reader@news.com", "password": "short" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(msg(&body), "Password must be at least 8 characters long");

    let (_, body) = app
        .post(
            "/api/users/account",
            None,
            json!({ "email": "reader@news.com", "password": PASSWORD, "password2": "Secret#999" }),
        )
        .await;
    assert_eq!(msg(&body), "Password and Password Confirmation not match");

    let (_, body) = app.post("/api/users/account", None, json!({ "password": PASSWORD })).await;
    assert_eq!(msg(&body), "Email is missing");

    // Nothing was stored for any of the rejected attempts.
    assert!(app.mailer.sent().is_empty());
}

#[tokio::test]
async fn test_email_failure_after_registration_is_a_server_error() {
    let app = TestApp::with_collaborators(
        MockImageStore::new(),
        MockPaymentProvider::new(),
        MockEmailSender::new_failing(),
    );
    let (status, body) = app
        .post(
            "/api/users/account",
            None,
            json!({ "email": "reader@news.com", "password": PASSWORD, "password2": PASSWORD }),
        )
        .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(msg(&body), GENERIC_FAILURE);
}

// --- Publishing and moderation ---

#[tokio::test]
async fn test_publish_moderate_and_read_article() {
    let app = TestApp::new();
    app.seed_admin("admin@news.com").await;
    let admin = login(&app, "admin", "admin@news.com").await;

    let (status, body) = app.post("/api/admin/section", Some(&admin), json!({ "name": "wORLD" })).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["name"], "World");
    let section_id = body["data"]["id"].as_str().unwrap().to_string();

    let (status, body) = app.post("/api/admin/section", Some(&admin), json!({ "name": "world" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(msg(&body), "Section World exists! Try with another name...");

    let (status, body) = app
        .post(
            "/api/admin/writer/account",
            Some(&admin),
            json!({
                "email": "writer@news.com",
                "password": PASSWORD,
                "password2": PASSWORD,
                "sectionId": section_id,
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    let writer_id = body["data"]["id"].as_str().unwrap().to_string();

    let writer = login(&app, "writers", "writer@news.com").await;
    let (status, body) = app
        .post(
            "/api/writers/article",
            Some(&writer),
            json!({
                "title": "Rust 2024",
                "subtitle": "Editions",
                "introduction": "A new edition",
                "body": "Details",
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["isShown"], false);
    assert_eq!(body["data"]["sectionId"], section_id.as_str());
    let article_id = body["data"]["id"].as_str().unwrap().to_string();

    // Hidden until an admin shows it.
    let (status, body) = app.get("/api/articles", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(msg(&body), "No shown articles saved in DB!");

    let (status, body) = app.get("/api/writers/articles", Some(&writer)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["totalResults"], 1);

    let (status, body) = app
        .put(&format!("/api/admin/article/{article_id}"), Some(&admin), json!({ "isShown": true }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["isShown"], true);

    let (status, body) = app.get("/api/articles", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["totalResults"], 1);
    assert_eq!(body["data"]["data"][0]["title"], "Rust 2024");
    assert_eq!(body["data"]["data"][0]["writer"]["email"], "writer@news.com");

    let (status, body) = app.get(&format!("/api/articles/section/{section_id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["totalResults"], 1);
    let (status, _) = app.get(&format!("/api/articles/writer/{writer_id}"), None).await;
    assert_eq!(status, StatusCode::OK);

    // A verified reader opens the article and comments on it.
    let reader = app.seed_reader("reader@news.com", false).await;
    let reader_token = app.token_for(reader.id);
    let (status, body) = app.get(&format!("/api/users/article/{article_id}"), Some(&reader_token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["readers"], 1);

    let (status, body) = app
        .post(
            "/api/users/comment",
            Some(&reader_token),
            json!({ "articleId": article_id, "text": "Great read" }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(msg(&body), "Comment created successfully!");

    let (status, body) = app.get(&format!("/api/articles/{article_id}/comments"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["data"][0]["text"], "Great read");

    let (_, body) = app.get("/api/articles/readers", None).await;
    assert_eq!(body["data"]["data"][0]["readers"], 1);
    assert_eq!(body["data"]["data"][0]["comments"], 1);

    // Subscriber-only content is gated for non-subscribers.
    app.put(&format!("/api/admin/article/{article_id}"), Some(&admin), json!({ "forSubscribers": true }))
        .await;
    let (status, body) = app.get(&format!("/api/users/article/{article_id}"), Some(&reader_token)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(msg(&body), "This article is only for subscribers!");
    let (status, _) = app
        .post("/api/users/comment", Some(&reader_token), json!({ "articleId": article_id, "text": "Hi" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_home_feed_cache_is_dropped_on_moderation() {
    let app = TestApp::new();
    let admin_id = app.seed_admin("admin@news.com").await;
    let admin = app.token_for(admin_id);
    let section = app.seed_section("Tech").await;
    let writer = app.seed_writer("writer@news.com", section.id).await;
    let first = app.seed_article(&writer, "First", true, false).await;

    let (_, body) = app.get("/api/articles", None).await;
    assert_eq!(body["data"]["data"][0]["title"], "First");

    // A write that bypasses the handlers is invisible while the page is cached.
    app.repo
        .update_article(
            first.id,
            ArticleChanges {
                title: Some("Renamed".to_string()),
                ..ArticleChanges::default()
            },
        )
        .await
        .unwrap();
    let (_, body) = app.get("/api/articles", None).await;
    assert_eq!(body["data"]["data"][0]["title"], "First");

    // The uncached feed sees it immediately.
    let (_, body) = app.get("/api/articles/last", None).await;
    assert_eq!(body["data"]["data"][0]["title"], "Renamed");

    // Admin moderation clears the cache.
    let second = app.seed_article(&writer, "Second", false, false).await;
    app.put(&format!("/api/admin/article/{}", second.id), Some(&admin), json!({ "isShown": true }))
        .await;
    let (_, body) = app.get("/api/articles", None).await;
    assert_eq!(body["data"]["totalResults"], 2);
    assert_eq!(body["data"]["data"][1]["title"], "Renamed");
}

#[tokio::test]
async fn test_banned_writer_disappears_from_public_views() {
    let app = TestApp::new();
    let admin_id = app.seed_admin("admin@news.com").await;
    let admin = app.token_for(admin_id);
    let section = app.seed_section("Tech").await;
    let writer = app.seed_writer("writer@news.com", section.id).await;
    let article = app.seed_article(&writer, "Doomed", true, false).await;
    let reader = app.seed_reader("reader@news.com", false).await;

    let (status, _) = app.get("/api/articles", None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = app
        .put(&format!("/api/admin/writer/{}/ban", writer.id), Some(&admin), json!({ "isBanned": true }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(msg(&body), "Writer banned successfully!");

    let (status, _) = app.get("/api/articles", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = app.get(&format!("/api/articles/writer/{}", writer.id), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(msg(&body), "This writer is banned!");

    let (status, _) = app
        .get(&format!("/api/users/article/{}", article.id), Some(&app.token_for(reader.id)))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = app
        .post("/api/writers/login", None, json!({ "email": "writer@news.com", "password": PASSWORD }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(msg(&body), "This account is banned! Please contact the admin of the page...");

    // Admins still see the article in the unfiltered listing.
    let (_, body) = app.get("/api/admin/articles", Some(&admin)).await;
    assert_eq!(body["data"]["totalResults"], 1);
    let (status, body) = app.get("/api/admin/writers/banned/TRUE", Some(&admin)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["data"][0]["id"], writer.id.to_string());
}

#[tokio::test]
async fn test_writers_only_touch_their_own_articles() {
    let app = TestApp::new();
    let section = app.seed_section("Tech").await;
    let owner = app.seed_writer("owner@news.com", section.id).await;
    let other = app.seed_writer("other@news.com", section.id).await;
    let article = app.seed_article(&owner, "Mine", false, false).await;
    let other_token = app.token_for(other.id);
    let owner_token = app.token_for(owner.id);
    let uri = format!("/api/writers/article/{}", article.id);

    let (status, body) = app.get(&uri, Some(&other_token)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(msg(&body), "You can not access to an article that is not yours!");
    let (status, _) = app.delete(&uri, Some(&other_token)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = app.put(&uri, Some(&owner_token), json!({})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(msg(&body), "Nothing to update");

    let (status, body) = app.put(&uri, Some(&owner_token), json!({ "title": "Ours" })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["title"], "Ours");
    assert_eq!(body["data"]["body"], "Mine body");

    let (status, body) = app.delete(&uri, Some(&owner_token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(msg(&body), "Article deleted successfully!");
    let (status, body) = app.get(&uri, Some(&owner_token)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(msg(&body), format!("Article with ID: {} not found!", article.id));
}

// --- Subscriptions ---

#[tokio::test]
async fn test_subscription_lifecycle() {
    let app = TestApp::new();
    let section = app.seed_section("Tech").await;
    let writer = app.seed_writer("writer@news.com", section.id).await;
    let premium = app.seed_article(&writer, "Premium", true, true).await;
    let reader = app.seed_reader("reader@news.com", false).await;
    let token = app.token_for(reader.id);

    let (status, body) = app.post("/api/users/create-subscription", Some(&token), json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["subscriptionId"], "I-MOCK");
    assert!(
        body["data"]["approvalUrl"]
            .as_str()
            .unwrap()
            .contains("http://localhost:5000/api/users/payment/success")
    );

    let (status, body) = app.get("/api/users/payment/success", Some(&token)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(msg(&body), "subscription_id is missing");

    let (status, body) = app
        .get("/api/users/payment/success?subscription_id=I-MOCK", Some(&token))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["isActive"], true);
    assert_eq!(body["data"]["subscriptionId"], "I-MOCK");
    let sent = app.mailer.sent();
    assert_eq!(sent.last().unwrap().subject, "Thanks for Subscribing!");

    let (status, body) = app.post("/api/users/create-subscription", Some(&token), json!({})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(msg(&body), "You already have an active subscription!");

    let (status, _) = app.get(&format!("/api/users/article/{}", premium.id), Some(&token)).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = app.post("/api/users/cancel-subscription", Some(&token), json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["isActive"], false);
    assert_eq!(app.payments.cancelled(), vec!["I-MOCK".to_string()]);

    let (status, body) = app.post("/api/users/cancel-subscription", Some(&token), json!({})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(msg(&body), "You do not have an active subscription!");

    let (status, _) = app.get(&format!("/api/users/article/{}", premium.id), Some(&token)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_deleting_account_cancels_subscription_and_ends_session() {
    let app = TestApp::new();
    let reader = app.seed_reader("reader@news.com", true).await;
    let token = app.token_for(reader.id);

    let (status, body) = app.delete("/api/users/account", Some(&token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(msg(&body), "Account deleted successfully!");
    assert_eq!(app.payments.cancelled(), vec!["I-SEEDED".to_string()]);
    assert!(app.repo.find_reader(reader.id).await.unwrap().is_none());

    let (status, _) = app.get("/api/users/notifications", Some(&token)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

// --- Access guard ---

#[tokio::test]
async fn test_guard_rejects_missing_and_wrong_sessions() {
    let app = TestApp::new();
    let section = app.seed_section("Tech").await;
    let writer = app.seed_writer("writer@news.com", section.id).await;
    let reader = app.seed_reader("reader@news.com", false).await;

    let (status, body) = app.get("/api/users/notifications", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["statusCode"], 401);
    assert_eq!(msg(&body), "You are not authorized! Please login...");

    let (status, body) = app.get("/api/users/notifications", Some(&app.token_for(writer.id))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(msg(&body), "You are not authorized! Please login with an User account...");

    let (status, body) = app.get("/api/admin/writers", Some(&app.token_for(reader.id))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(msg(&body), "You are not authorized! Please login with an Admin account...");

    let (status, _) = app.delete("/api/users/account", Some(&app.token_for(writer.id))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = app.get("/api/writers/account", Some(&app.token_for(reader.id))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(msg(&body), "No Writer Account logged in");

    let (status, _) = app.get("/api/users/notifications", Some("not-a-jwt")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_local_bypass_header() {
    let app = TestApp::new();
    let admin_id = app.seed_admin("admin@news.com").await;

    let request = Request::builder()
        .uri("/api/admin/account")
        .header(LOCAL_BYPASS_HEADER, admin_id.to_string())
        .body(Body::empty())
        .unwrap();
    let (status, body) = app.send(request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["type"], "ADMIN");
}

// --- Admin listings and pagination ---

#[tokio::test]
async fn test_admin_user_listings_and_pagination_errors() {
    let app = TestApp::new();
    let admin_id = app.seed_admin("admin@news.com").await;
    let admin = app.token_for(admin_id);

    let (status, body) = app.get("/api/admin/users", Some(&admin)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(msg(&body), "No users saved in DB!");

    app.seed_reader("a@news.com", false).await;
    app.seed_reader("b@news.com", true).await;
    let banned = app.seed_reader("c@news.com", false).await;

    let (status, body) = app
        .put(&format!("/api/admin/user/{}/ban", banned.id), Some(&admin), json!({ "isBanned": true }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(msg(&body), "User banned successfully!");

    let (_, body) = app.get("/api/admin/users?page=1&limit=2", Some(&admin)).await;
    assert_eq!(body["data"]["totalResults"], 3);
    assert_eq!(body["data"]["totalPages"], 2);
    assert_eq!(body["data"]["data"].as_array().unwrap().len(), 2);

    let (status, body) = app.get("/api/admin/users?page=abc", Some(&admin)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(msg(&body), "Page must be a positive integer");

    let (status, body) = app.get("/api/admin/users?limit=0", Some(&admin)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(msg(&body), "Page not found!");

    let (status, body) = app.get("/api/admin/users?page=9", Some(&admin)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(msg(&body), "Page not found!");

    let (_, body) = app
        .get("/api/admin/users/filter?banned=FALSE&subscriber=true", Some(&admin))
        .await;
    assert_eq!(body["data"]["totalResults"], 1);
    assert_eq!(body["data"]["data"][0]["email"], "b@news.com");

    let (status, body) = app.get("/api/admin/users/filter?verified=maybe", Some(&admin)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(msg(&body), "Verified query value must be true or false");

    let (status, body) = app.get("/api/admin/writers/banned/yes", Some(&admin)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(msg(&body), "Banned query value must be true or false");

    let (status, body) = app
        .put("/api/admin/user/not-an-id/ban", Some(&admin), json!({ "isBanned": true }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(msg(&body), "ID: not-an-id - Invalid format!");
}

#[tokio::test]
async fn test_pages_past_any_offset_are_not_found() {
    let app = TestApp::new();
    let section = app.seed_section("Tech").await;
    let writer = app.seed_writer("w@news.com", section.id).await;
    app.seed_article(&writer, "Shown", true, false).await;
    let admin = app.token_for(app.seed_admin("admin@news.com").await);

    let (status, body) = app.get("/api/articles?page=4294967295&limit=4294967295", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(msg(&body), "Page not found!");

    let (status, body) = app
        .get("/api/admin/users?page=3000000000&limit=4000000000", Some(&admin))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(msg(&body), "Page not found!");

    // The feed still serves its first page afterwards.
    let (status, body) = app.get("/api/articles", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["totalResults"], 1);
}

#[tokio::test]
async fn test_admin_bootstrap_and_billing_setup() {
    let app = TestApp::new();

    let (status, body) = app
        .post(
            "/api/admin/account",
            None,
            json!({ "email": "root@news.com", "password": PASSWORD, "password2": PASSWORD }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["email"], "root@news.com");

    let admin = login(&app, "admin", "root@news.com").await;

    let (status, body) = app.post("/api/admin/create-product", Some(&admin), json!({})).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["id"], "PROD-MOCK");

    let (status, body) = app.post("/api/admin/create-plan", Some(&admin), json!({})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(msg(&body), "productId is missing");

    let (status, body) = app
        .post("/api/admin/create-plan", Some(&admin), json!({ "productId": "PROD-MOCK" }))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["id"], "P-MOCK");

    let (status, body) = app
        .post(
            "/api/admin/writer/account",
            Some(&admin),
            json!({
                "email": "w@news.com",
                "password": PASSWORD,
                "password2": PASSWORD,
                "sectionId": uuid::Uuid::nil().to_string(),
            }),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(msg(&body), format!("Section with ID: {} not found!", uuid::Uuid::nil()));
}

#[tokio::test]
async fn test_public_lookups_validate_ids() {
    let app = TestApp::new();

    let (status, body) = app.get("/api/articles/section/abc", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(msg(&body), "ID: abc - Invalid format!");

    let missing = uuid::Uuid::new_v4();
    let (status, body) = app.get(&format!("/api/articles/writer/{missing}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(msg(&body), format!("Account with ID: {missing} not found!"));

    let (status, body) = app.get("/api/sections", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(msg(&body), "No sections saved in DB!");
}
