use cafeteria_api::config::ApiConfig;
use cafeteria_auth::{JwtClaims, Role};
use cafeteria_core::UserId;
use chrono::{Duration as ChronoDuration, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use reqwest::StatusCode;
use serde_json::{json, Value};

const JWT_SECRET: &str = "test-secret";

struct TestServer {
    base_url: String,
    client: reqwest::Client,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn() -> Self {
        // Same router as prod, fresh in-memory database, ephemeral port.
        let config = ApiConfig::in_memory(JWT_SECRET);
        let app = cafeteria_api::app::build_app(&config)
            .await
            .expect("failed to build app");
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url,
            client: reqwest::Client::new(),
            handle,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn post(&self, token: &str, path: &str, body: Value) -> (StatusCode, Value) {
        let res = self
            .client
            .post(self.url(path))
            .bearer_auth(token)
            .json(&body)
            .send()
            .await
            .unwrap();
        read(res).await
    }

    async fn put(&self, token: &str, path: &str, body: Value) -> (StatusCode, Value) {
        let res = self
            .client
            .put(self.url(path))
            .bearer_auth(token)
            .json(&body)
            .send()
            .await
            .unwrap();
        read(res).await
    }

    async fn get(&self, token: &str, path: &str) -> (StatusCode, Value) {
        let res = self
            .client
            .get(self.url(path))
            .bearer_auth(token)
            .send()
            .await
            .unwrap();
        read(res).await
    }

    async fn delete(&self, token: &str, path: &str) -> StatusCode {
        self.client
            .delete(self.url(path))
            .bearer_auth(token)
            .send()
            .await
            .unwrap()
            .status()
    }

    async fn stock_of(&self, token: &str, product_id: i64) -> i64 {
        let (status, body) = self.get(token, &format!("/api/products/{product_id}")).await;
        assert_eq!(status, StatusCode::OK);
        body["quantity"].as_i64().unwrap()
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn read(res: reqwest::Response) -> (StatusCode, Value) {
    let status = res.status();
    let text = res.text().await.unwrap_or_default();
    let body = serde_json::from_str(&text).unwrap_or(Value::Null);
    (status, body)
}

fn mint_jwt(roles: Vec<Role>) -> String {
    let now = Utc::now();
    let claims = JwtClaims {
        sub: "tester".to_string(),
        uid: UserId::new(1),
        roles,
        iat: now,
        exp: now + ChronoDuration::minutes(10),
    };

    jsonwebtoken::encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(JWT_SECRET.as_bytes()),
    )
    .expect("failed to encode jwt")
}

/// Flour at 100000 g, pancakes needing 500 g each, one table and an open order.
struct Kitchen {
    product_id: i64,
    dish_id: i64,
    order_id: i64,
}

async fn seed_kitchen(srv: &TestServer, token: &str) -> Kitchen {
    let (status, unit) = srv
        .post(token, "/api/units", json!({ "name": "gram", "abbreviation": "g" }))
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, product) = srv
        .post(
            token,
            "/api/products",
            json!({ "name": "Мука", "quantity": 100000, "unit_id": unit["id"] }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(product["unit"]["abbreviation"], "g");

    let (status, dish) = srv
        .post(token, "/api/dishes", json!({ "name": "Блинчики", "price": 350 }))
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _) = srv
        .post(
            token,
            "/api/dish-ingredients",
            json!({ "dish_id": dish["id"], "product_id": product["id"], "quantity": 500 }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, table) = srv
        .post(token, "/api/tables", json!({ "number": 1, "capacity": 4 }))
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, order) = srv
        .post(token, "/api/orders", json!({ "table_id": table["id"] }))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(order["status"], "pending");

    Kitchen {
        product_id: product["id"].as_i64().unwrap(),
        dish_id: dish["id"].as_i64().unwrap(),
        order_id: order["id"].as_i64().unwrap(),
    }
}

#[tokio::test]
async fn health_is_public() {
    let srv = TestServer::spawn().await;
    let res = srv.client.get(srv.url("/health")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn auth_required_for_protected_endpoints() {
    let srv = TestServer::spawn().await;

    let res = srv.client.get(srv.url("/api/whoami")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "unauthorized");

    let (status, _) = srv.get("not-a-jwt", "/api/products").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let res = srv.client.get(srv.url("/api/nowhere")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn register_login_and_whoami() {
    let srv = TestServer::spawn().await;
    let creds = json!({ "username": "cashier", "password": "secret1" });

    let res = srv
        .client
        .post(srv.url("/api/auth/register"))
        .json(&creds)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let account: Value = res.json().await.unwrap();
    assert_eq!(account["username"], "cashier");
    assert!(account.get("password_hash").is_none());

    let res = srv
        .client
        .post(srv.url("/api/auth/register"))
        .json(&creds)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CONFLICT);

    let res = srv
        .client
        .post(srv.url("/api/auth/register"))
        .json(&json!({ "username": "other", "password": "123" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = srv
        .client
        .post(srv.url("/api/auth/login"))
        .json(&json!({ "username": "cashier", "password": "wrong-one" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let res = srv
        .client
        .post(srv.url("/api/auth/login"))
        .json(&creds)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let login: Value = res.json().await.unwrap();
    assert_eq!(login["token_type"], "bearer");
    assert_eq!(login["expires_in"], 24 * 3600);
    let token = login["token"].as_str().unwrap();

    let (status, me) = srv.get(token, "/api/whoami").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["username"], "cashier");
    assert!(me["roles"].as_array().unwrap().iter().any(|r| r == "user"));

    // Plain users cannot list accounts.
    let (status, body) = srv.get(token, "/api/users").await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "forbidden");
}

#[tokio::test]
async fn user_role_reads_catalog_but_cannot_write_it() {
    let srv = TestServer::spawn().await;
    let token = mint_jwt(vec![Role::user()]);

    let (status, units) = srv.get(&token, "/api/units").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(units, json!([]));

    let (status, _) = srv
        .post(&token, "/api/units", json!({ "name": "gram", "abbreviation": "g" }))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn catalog_validation_and_lookup_errors() {
    let srv = TestServer::spawn().await;
    let token = mint_jwt(vec![Role::manager()]);

    let (status, body) = srv
        .post(&token, "/api/units", json!({ "name": "  ", "abbreviation": "g" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_error");

    let (status, body) = srv.get(&token, "/api/dishes/abc").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid_id");

    let (status, body) = srv.get(&token, "/api/dishes/42").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "not_found");

    let (status, _) = srv
        .post(&token, "/api/orders", json!({ "table_id": 99 }))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn order_lines_move_stock_through_the_ledger() {
    let srv = TestServer::spawn().await;
    let token = mint_jwt(vec![Role::admin()]);
    let k = seed_kitchen(&srv, &token).await;

    // 50 pancakes take 25000 g.
    let (status, item) = srv
        .post(
            &token,
            &format!("/api/orders/{}/items", k.order_id),
            json!({ "dish_id": k.dish_id, "quantity": 50 }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(item["quantity"], 50);
    assert_eq!(srv.stock_of(&token, k.product_id).await, 75000);
    let item_path = format!("/api/order-items/{}", item["id"]);

    // Shrinking the line returns the difference.
    let (status, item) = srv.put(&token, &item_path, json!({ "quantity": 10 })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(item["quantity"], 10);
    assert_eq!(srv.stock_of(&token, k.product_id).await, 95000);

    // Zero is not a quantity; delete the line instead.
    let (status, _) = srv.put(&token, &item_path, json!({ "quantity": 0 })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Too much for the shelf: nothing moves.
    let (status, body) = srv
        .post(
            &token,
            &format!("/api/orders/{}/items", k.order_id),
            json!({ "dish_id": k.dish_id, "quantity": 250 }),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "insufficient_stock");
    assert_eq!(srv.stock_of(&token, k.product_id).await, 95000);

    let (status, details) = srv.get(&token, &format!("/api/orders/{}", k.order_id)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(details["items"].as_array().unwrap().len(), 1);
    assert_eq!(details["items"][0]["dish"]["name"], "Блинчики");

    // Deleting returns everything, and a second delete credits nothing.
    assert_eq!(srv.delete(&token, &item_path).await, StatusCode::NO_CONTENT);
    assert_eq!(srv.stock_of(&token, k.product_id).await, 100000);
    assert_eq!(srv.delete(&token, &item_path).await, StatusCode::NOT_FOUND);
    assert_eq!(srv.stock_of(&token, k.product_id).await, 100000);
}

#[tokio::test]
async fn deleting_an_order_returns_all_its_lines() {
    let srv = TestServer::spawn().await;
    let token = mint_jwt(vec![Role::admin()]);
    let k = seed_kitchen(&srv, &token).await;
    let items_path = format!("/api/orders/{}/items", k.order_id);

    let (status, _) = srv
        .post(&token, &items_path, json!({ "dish_id": k.dish_id, "quantity": 5 }))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    // Same dish again merges into the existing line.
    let (status, merged) = srv
        .post(&token, &items_path, json!({ "dish_id": k.dish_id, "quantity": 3 }))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(merged["quantity"], 8);
    assert_eq!(srv.stock_of(&token, k.product_id).await, 96000);

    let order_path = format!("/api/orders/{}", k.order_id);
    assert_eq!(srv.delete(&token, &order_path).await, StatusCode::NO_CONTENT);
    assert_eq!(srv.stock_of(&token, k.product_id).await, 100000);

    let (status, _) = srv.get(&token, &order_path).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, items) = srv.get(&token, "/api/order-items").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(items, json!([]));
}

#[tokio::test]
async fn stock_adjustment_never_goes_negative() {
    let srv = TestServer::spawn().await;
    let token = mint_jwt(vec![Role::manager()]);
    let k = seed_kitchen(&srv, &token).await;
    let adjust = format!("/api/products/{}/adjust", k.product_id);

    let (status, body) = srv.post(&token, &adjust, json!({ "delta": 500 })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["quantity"], 100500);

    let (status, body) = srv.post(&token, &adjust, json!({ "delta": -200000 })).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "insufficient_stock");

    let (status, _) = srv.post(&token, &adjust, json!({ "delta": 0 })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Plain users may not correct stock.
    let user = mint_jwt(vec![Role::user()]);
    let (status, _) = srv.post(&user, &adjust, json!({ "delta": 1 })).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    assert_eq!(srv.stock_of(&token, k.product_id).await, 100500);
}

#[tokio::test]
async fn public_products_hide_quantities() {
    let srv = TestServer::spawn().await;
    let token = mint_jwt(vec![Role::admin()]);
    let k = seed_kitchen(&srv, &token).await;

    let res = srv
        .client
        .get(srv.url("/api/products/public"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let products: Value = res.json().await.unwrap();
    let listed = &products[0];
    assert_eq!(listed["id"], k.product_id);
    assert_eq!(listed["unit"], "g");
    assert_eq!(listed["in_stock"], true);
    assert!(listed.get("quantity").is_none());
}

#[tokio::test]
async fn referenced_rows_cannot_be_deleted() {
    let srv = TestServer::spawn().await;
    let token = mint_jwt(vec![Role::admin()]);
    let k = seed_kitchen(&srv, &token).await;

    let status = srv
        .delete(&token, &format!("/api/products/{}", k.product_id))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn recipe_changes_wait_until_no_line_uses_the_dish() {
    let srv = TestServer::spawn().await;
    let token = mint_jwt(vec![Role::admin()]);
    let k = seed_kitchen(&srv, &token).await;

    let (status, item) = srv
        .post(
            &token,
            &format!("/api/orders/{}/items", k.order_id),
            json!({ "dish_id": k.dish_id, "quantity": 10 }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(srv.stock_of(&token, k.product_id).await, 95000);

    let (status, lines) = srv.get(&token, "/api/dish-ingredients").await;
    assert_eq!(status, StatusCode::OK);
    let line_path = format!("/api/dish-ingredients/{}", lines[0]["id"]);
    let heavier = json!({ "dish_id": k.dish_id, "product_id": k.product_id, "quantity": 5000 });

    let (status, body) = srv.put(&token, &line_path, heavier.clone()).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "conflict");
    assert_eq!(srv.delete(&token, &line_path).await, StatusCode::CONFLICT);

    let item_path = format!("/api/order-items/{}", item["id"]);
    assert_eq!(srv.delete(&token, &item_path).await, StatusCode::NO_CONTENT);
    assert_eq!(srv.stock_of(&token, k.product_id).await, 100000);

    let (status, updated) = srv.put(&token, &line_path, heavier).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["quantity"], 5000);
}
