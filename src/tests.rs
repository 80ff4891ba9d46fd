//! Integration tests for the content backend.

use std::sync::Arc;

use jsonwebtoken::{encode, EncodingKey, Header};
use reqwest::{Client, RequestBuilder};
use serde_json::{json, Value};
use sqlx::{Row, SqlitePool};
use tempfile::TempDir;

use crate::auth::{TokenClaims, TokenVerifier};
use crate::db::{init_database, ContentRepository};
use crate::{create_router, AppState};

const SECRET: &str = "integration-test-secret";
const OWNER: &str = "owner@example.com";
const OTHER: &str = "other@example.com";

/// Test fixture for integration tests.
struct TestFixture {
    client: Client,
    base_url: String,
    pool: SqlitePool,
    _temp_dir: TempDir,
}

impl TestFixture {
    async fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let db_path = temp_dir.path().join("test.sqlite");

        // Initialize database
        let pool = init_database(&db_path).await.expect("Failed to init DB");

        let state = AppState {
            repo: Arc::new(ContentRepository::new(pool.clone())),
            verifier: Arc::new(TokenVerifier::new(SECRET)),
        };

        let app = create_router(state);

        // Bind to random port
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind");
        let addr = listener.local_addr().expect("Failed to get addr");
        let base_url = format!("http://{}", addr);

        // Spawn server
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        // Wait for server to start
        tokio::time::sleep(tokio::time::Duration::from_millis(100)).await;

        TestFixture {
            client: Client::new(),
            base_url,
            pool,
            _temp_dir: temp_dir,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn insert_campaign(&self, id: i64, account: &str, status: i32) {
        sqlx::query("INSERT INTO campaigns (id_campaign, account_name, status) VALUES (?, ?, ?)")
            .bind(id)
            .bind(account)
            .bind(status)
            .execute(&self.pool)
            .await
            .unwrap();
    }
}

fn token_with(account: &str, is_su: Option<bool>, exp_offset: i64) -> String {
    let claims = TokenClaims {
        unique_name: account.to_string(),
        is_su,
        exp: chrono::Utc::now().timestamp() + exp_offset,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(SECRET.as_bytes()),
    )
    .unwrap()
}

fn token(account: &str) -> String {
    token_with(account, None, 3600)
}

trait Authed {
    fn as_account(self, account: &str) -> Self;
}

impl Authed for RequestBuilder {
    fn as_account(self, account: &str) -> Self {
        self.bearer_auth(token(account))
    }
}

fn unlayer_body(html: &str) -> Value {
    json!({
        "type": "unlayer",
        "htmlContent": html,
        "meta": {"body": {"rows": []}},
        "previewImage": "https://cdn.example.com/preview.png"
    })
}

#[tokio::test]
async fn test_health_check() {
    let fixture = TestFixture::new().await;

    let resp = fixture
        .client
        .get(fixture.url("/health"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    assert_eq!(resp.text().await.unwrap(), "OK");
}

#[tokio::test]
async fn test_missing_token_is_unauthorized() {
    let fixture = TestFixture::new().await;
    fixture.insert_campaign(1, OWNER, 1).await;

    let resp = fixture
        .client
        .get(fixture.url("/accounts/owner@example.com/campaigns/1/content"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);

    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["success"], false);
    assert_eq!(body["error"]["code"], "UNAUTHORIZED");
}

#[tokio::test]
async fn test_expired_and_forged_tokens_are_unauthorized() {
    let fixture = TestFixture::new().await;
    fixture.insert_campaign(1, OWNER, 1).await;
    let url = fixture.url("/accounts/owner@example.com/campaigns/1/content");

    let expired = token_with(OWNER, Some(true), -60);
    let resp = fixture
        .client
        .get(&url)
        .bearer_auth(expired)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"]["message"], "Token expired");

    let forged = encode(
        &Header::default(),
        &TokenClaims {
            unique_name: OWNER.to_string(),
            is_su: Some(true),
            exp: chrono::Utc::now().timestamp() + 3600,
        },
        &EncodingKey::from_secret(b"not-the-secret"),
    )
    .unwrap();
    let resp = fixture
        .client
        .get(&url)
        .bearer_auth(forged)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);
}

#[tokio::test]
async fn test_foreign_account_is_forbidden() {
    let fixture = TestFixture::new().await;
    fixture.insert_campaign(1, OWNER, 1).await;

    let resp = fixture
        .client
        .put(fixture.url("/accounts/owner@example.com/campaigns/1/content"))
        .as_account(OTHER)
        .json(&unlayer_body("<p>hijack</p>"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 403);

    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"]["code"], "FORBIDDEN");

    // explicit false superuser claim changes nothing
    let resp = fixture
        .client
        .get(fixture.url("/accounts/owner@example.com/campaigns/1/content"))
        .bearer_auth(token_with(OTHER, Some(false), 3600))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 403);
}

#[tokio::test]
async fn test_super_user_can_act_for_any_account() {
    let fixture = TestFixture::new().await;
    fixture.insert_campaign(1, OWNER, 1).await;

    let resp = fixture
        .client
        .put(fixture.url("/accounts/owner@example.com/campaigns/1/content"))
        .bearer_auth(token_with("admin@example.com", Some(true), 3600))
        .json(&unlayer_body("<p>by admin</p>"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
}

#[tokio::test]
async fn test_campaign_content_roundtrip() {
    let fixture = TestFixture::new().await;
    fixture.insert_campaign(7, OWNER, 1).await;
    let url = fixture.url("/accounts/owner@example.com/campaigns/7/content");

    // no content yet
    let resp = fixture
        .client
        .get(&url)
        .as_account(OWNER)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);

    let html = r#"<p>Hi [[[FIRST_NAME]]]</p><a href="https://shop.example.com">shop</a>"#;
    let resp = fixture
        .client
        .put(&url)
        .as_account(OWNER)
        .json(&unlayer_body(html))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let summary: Value = resp.json().await.unwrap();
    assert_eq!(summary["fieldsLinked"], 1);
    assert_eq!(summary["hyperlinksAdded"], 1);

    let resp = fixture
        .client
        .get(&url)
        .as_account(OWNER)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["type"], "unlayer");
    assert_eq!(body["campaignId"], 7);
    assert_eq!(body["readOnly"], false);
    assert_eq!(body["htmlContent"], html);
    assert_eq!(body["meta"]["body"]["rows"], json!([]));
    assert_eq!(body["previewImage"], "https://cdn.example.com/preview.png");
}

#[tokio::test]
async fn test_read_only_campaign_rejects_writes() {
    let fixture = TestFixture::new().await;
    fixture.insert_campaign(8, OWNER, 5).await;

    let resp = fixture
        .client
        .put(fixture.url("/accounts/owner@example.com/campaigns/8/content"))
        .as_account(OWNER)
        .json(&unlayer_body("<p>late edit</p>"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_unsupported_content_type_is_rejected() {
    let fixture = TestFixture::new().await;
    fixture.insert_campaign(9, OWNER, 1).await;

    let resp = fixture
        .client
        .put(fixture.url("/accounts/owner@example.com/campaigns/9/content"))
        .as_account(OWNER)
        .json(&json!({"type": "html", "htmlContent": "<p></p>", "meta": {}}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);

    let count: i64 = sqlx::query("SELECT COUNT(*) AS n FROM contents")
        .fetch_one(&fixture.pool)
        .await
        .unwrap()
        .get("n");
    assert_eq!(count, 0);
}

#[tokio::test]
async fn test_unknown_stored_content_reads_as_unknown() {
    let fixture = TestFixture::new().await;
    fixture.insert_campaign(10, OWNER, 1).await;
    sqlx::query(
        "INSERT INTO contents (id_campaign, editor_type, html, meta, updated_at) VALUES (10, 2, '<p>legacy</p>', '', 'now')",
    )
    .execute(&fixture.pool)
    .await
    .unwrap();

    let resp = fixture
        .client
        .get(fixture.url("/accounts/owner@example.com/campaigns/10/content"))
        .as_account(OWNER)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["type"], "unknown");
    assert_eq!(body["editorType"], 2);
}

#[tokio::test]
async fn test_hyperlinks_follow_latest_content() {
    let fixture = TestFixture::new().await;
    fixture.insert_campaign(11, OWNER, 18).await;
    let url = fixture.url("/accounts/owner@example.com/campaigns/11/content");

    for html in [
        r#"<a href="https://a.example.com">a</a><a href="https://b.example.com">b</a>"#,
        r#"<a href="https://b.example.com">b</a>"#,
    ] {
        let resp = fixture
            .client
            .put(&url)
            .as_account(OWNER)
            .json(&unlayer_body(html))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);
    }

    let urls: Vec<String> =
        sqlx::query("SELECT url FROM content_hyperlinks WHERE id_content = 11 ORDER BY url")
            .fetch_all(&fixture.pool)
            .await
            .unwrap()
            .iter()
            .map(|row| row.get("url"))
            .collect();
    assert_eq!(urls, vec!["https://b.example.com"]);
}

#[tokio::test]
async fn test_template_lifecycle() {
    let fixture = TestFixture::new().await;

    let resp = fixture
        .client
        .post(fixture.url("/accounts/owner@example.com/templates"))
        .as_account(OWNER)
        .json(&json!({
            "templateName": "Welcome",
            "type": "unlayer",
            "htmlContent": "<p>[[[EMAIL]]]</p>",
            "meta": {}
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 201);
    let created: Value = resp.json().await.unwrap();
    let template_id = created["createdResourceId"].as_i64().unwrap();

    let template_url = fixture.url(&format!(
        "/accounts/owner@example.com/templates/{}",
        template_id
    ));

    let resp = fixture
        .client
        .put(&template_url)
        .as_account(OWNER)
        .json(&json!({
            "templateName": "Welcome v2",
            "type": "unlayer",
            "htmlContent": "<p>v2</p>",
            "meta": {}
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let resp = fixture
        .client
        .get(&template_url)
        .as_account(OWNER)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["templateName"], "Welcome v2");
    assert_eq!(body["htmlContent"], "<p>v2</p>");
    assert_eq!(body["isPublic"], false);

    // another account cannot see a private template
    let resp = fixture
        .client
        .get(fixture.url(&format!(
            "/accounts/other@example.com/templates/{}",
            template_id
        )))
        .as_account(OTHER)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
}

#[tokio::test]
async fn test_update_missing_template_is_not_found() {
    let fixture = TestFixture::new().await;

    let resp = fixture
        .client
        .put(fixture.url("/accounts/owner@example.com/templates/4242"))
        .as_account(OWNER)
        .json(&json!({"templateName": "x", "type": "unlayer", "htmlContent": "", "meta": {}}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"]["code"], "RELATION_NOT_FOUND");
}

#[tokio::test]
async fn test_content_from_template() {
    let fixture = TestFixture::new().await;
    fixture.insert_campaign(12, OWNER, 1).await;

    let resp = fixture
        .client
        .post(fixture.url("/accounts/owner@example.com/templates"))
        .as_account(OWNER)
        .json(&json!({
            "templateName": "Base",
            "type": "unlayer",
            "htmlContent": "<p>from template</p>",
            "meta": {}
        }))
        .send()
        .await
        .unwrap();
    let created: Value = resp.json().await.unwrap();
    let template_id = created["createdResourceId"].as_i64().unwrap();

    let resp = fixture
        .client
        .post(fixture.url(&format!(
            "/accounts/owner@example.com/campaigns/12/content/from-template/{}",
            template_id
        )))
        .as_account(OWNER)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let resp = fixture
        .client
        .get(fixture.url("/accounts/owner@example.com/campaigns/12/content"))
        .as_account(OWNER)
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["htmlContent"], "<p>from template</p>");
}

#[tokio::test]
async fn test_promo_code_lifecycle() {
    let fixture = TestFixture::new().await;
    fixture.insert_campaign(13, OWNER, 1).await;
    let base = "/accounts/owner@example.com/campaigns/13/content/promo-codes";

    let resp = fixture
        .client
        .post(fixture.url(base))
        .as_account(OWNER)
        .json(&json!({"type": "percent", "value": 10.0, "firstPurchase": true}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 201);
    let created: Value = resp.json().await.unwrap();
    let promo_code_id = created["createdResourceId"].as_i64().unwrap();

    let promo_url = fixture.url(&format!("{}/{}", base, promo_code_id));
    let resp = fixture
        .client
        .put(&promo_url)
        .as_account(OWNER)
        .json(&json!({"type": "money", "value": 5.0, "minPrice": 30.0}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let resp = fixture
        .client
        .get(&promo_url)
        .as_account(OWNER)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["type"], "money");
    assert_eq!(body["value"], 5.0);
    assert_eq!(body["minPrice"], 30.0);
    assert_eq!(body["firstPurchase"], false);

    // updating a pair that does not exist
    let resp = fixture
        .client
        .put(fixture.url(&format!("{}/{}", base, promo_code_id + 100)))
        .as_account(OWNER)
        .json(&json!({"type": "money", "value": 5.0}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"]["code"], "RELATION_NOT_FOUND");
}

#[tokio::test]
async fn test_promo_code_validation() {
    let fixture = TestFixture::new().await;
    fixture.insert_campaign(14, OWNER, 1).await;

    let resp = fixture
        .client
        .post(fixture.url(
            "/accounts/owner@example.com/campaigns/14/content/promo-codes",
        ))
        .as_account(OWNER)
        .json(&json!({"type": "percent", "value": 150.0}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
}

#[tokio::test]
async fn test_promo_codes_of_foreign_campaign_are_not_found() {
    let fixture = TestFixture::new().await;
    fixture.insert_campaign(15, OTHER, 1).await;

    let resp = fixture
        .client
        .post(fixture.url(
            "/accounts/owner@example.com/campaigns/15/content/promo-codes",
        ))
        .as_account(OWNER)
        .json(&json!({"type": "money", "value": 5.0}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
}
