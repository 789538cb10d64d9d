//! HTTP API tests
//!
//! Drive the full router (auth middleware, routing, error bodies) with
//! in-memory tenant stores behind the inventory service.

mod common;

use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use common::{at, dec, MemoryStore, MemoryTenants, MovementBuilder};
use jsonwebtoken::{encode, EncodingKey, Header};
use rust_decimal::Decimal;
use serde_json::{json, Value};
use sqlx::postgres::PgPoolOptions;
use tower::ServiceExt;

use stock_backend::config::{
    Config, CorsConfig, DatabaseConfig, JwtConfig, ServerConfig, StorageConfig,
};
use stock_backend::middleware::Claims;
use stock_backend::{create_app, AppState, InventoryService, TenantRegistry, UploadService};

const SECRET: &str = "test-secret";

fn test_config() -> Config {
    Config {
        environment: "test".into(),
        server: ServerConfig::default(),
        database: DatabaseConfig {
            url: "postgres://postgres@localhost:5432/acessos".into(),
            tenant_url_template: "postgres://postgres@localhost:5432/{database}".into(),
            max_connections: 2,
            min_connections: 0,
            acquire_timeout_secs: 1,
            run_tenant_migrations: false,
        },
        jwt: JwtConfig {
            secret: SECRET.into(),
        },
        storage: StorageConfig {
            account_id: "acct".into(),
            access_key_id: "AKID".into(),
            secret_access_key: "secret".into(),
            region: "auto".into(),
            bucket_name: "goldpdv-assets".into(),
            public_domain: "https://cdn.goldpdv.com.br/".into(),
            bucket_name_epdv: None,
            public_domain_epdv: None,
            presign_expiry_secs: 600,
        },
        cors: CorsConfig {
            allowed_origins: vec!["https://goldpdv.com.br".into()],
            base_domain: Some("goldpdv.com.br".into()),
        },
    }
}

fn app() -> Router {
    let store = Arc::new(MemoryStore::new());
    store.add_company(1);
    store.add_item(1, 7, "Cafe torrado 500g");
    store.add_movement(
        MovementBuilder::new(1, 1, 7)
            .entry("10")
            .value("50")
            .on(at(2024, 1, 10, 9))
            .build(),
    );
    store.add_movement(
        MovementBuilder::new(2, 1, 7)
            .exit("4")
            .value("20")
            .on(at(2024, 1, 15, 14))
            .build(),
    );

    let config = test_config();
    let main_pool = PgPoolOptions::new()
        .max_connections(1)
        .connect_lazy(&config.database.url)
        .unwrap();
    let tenants = MemoryTenants::default().with("loja1", store);

    create_app(AppState {
        tenants: Arc::new(TenantRegistry::new(main_pool, config.database.clone())),
        inventory: Arc::new(InventoryService::new(Arc::new(tenants))),
        uploads: Arc::new(UploadService::new(config.storage.clone())),
        config: Arc::new(config),
    })
}

fn token(tenant: Option<&str>, admin: bool) -> String {
    let claims = Claims {
        sub: "1".into(),
        tenant: tenant.map(String::from),
        admin: Some(admin),
        ..Default::default()
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(SECRET.as_bytes()),
    )
    .unwrap()
}

fn get(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::empty()).unwrap()
}

fn post(uri: &str, token: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

fn decimal(value: &Value) -> Decimal {
    match value {
        Value::String(s) => s.parse().unwrap(),
        Value::Number(n) => n.to_string().parse().unwrap(),
        other => panic!("not a decimal: {}", other),
    }
}

// ============================================================================
// Authentication
// ============================================================================

#[cfg(test)]
mod auth_tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_token_is_unauthorized() {
        let (status, body) = send(app(), get("/api/v1/inventory/movements", None)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"]["code"], "UNAUTHORIZED");
    }

    #[tokio::test]
    async fn test_wrong_secret_is_unauthorized() {
        let forged = encode(
            &Header::default(),
            &Claims {
                sub: "1".into(),
                tenant: Some("loja1".into()),
                ..Default::default()
            },
            &EncodingKey::from_secret(b"other"),
        )
        .unwrap();
        let (status, _) = send(app(), get("/api/v1/inventory/movements", Some(&forged))).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_token_without_tenant() {
        let jwt = token(None, false);
        let (status, body) = send(app(), get("/api/v1/inventory/movements", Some(&jwt))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "TENANT_MISSING");
        assert_eq!(body["error"]["message_pt"], "Tenant nao encontrado no token JWT.");
    }

    #[tokio::test]
    async fn test_tenant_header_mismatch() {
        let jwt = token(Some("loja1"), false);
        let request = Request::builder()
            .uri("/api/v1/inventory/movements")
            .header(header::AUTHORIZATION, format!("Bearer {}", jwt))
            .header("x-tenant", "loja2")
            .body(Body::empty())
            .unwrap();
        let (status, body) = send(app(), request).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["error"]["code"], "FORBIDDEN");
    }
}

// ============================================================================
// Inventory endpoints
// ============================================================================

#[cfg(test)]
mod inventory_api_tests {
    use super::*;

    #[tokio::test]
    async fn test_list_movements() {
        let jwt = token(Some("loja1"), false);
        let (status, body) = send(app(), get("/api/v1/inventory/movements?type=S", Some(&jwt))).await;

        assert_eq!(status, StatusCode::OK);
        let rows = body.as_array().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["nrlan"], 2);
        assert_eq!(rows[0]["type"], "S");
        assert_eq!(rows[0]["itemCode"], "7");
        assert_eq!(rows[0]["itemDescription"], "Cafe torrado 500g");
    }

    #[tokio::test]
    async fn test_summary_route_is_not_a_kardex() {
        let jwt = token(Some("loja1"), false);
        let (status, body) = send(
            app(),
            get(
                "/api/v1/inventory/movements/summary?from=2024-01-01&to=2024-01-31&itemId=7",
                Some(&jwt),
            ),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(decimal(&body["entries"]["quantity"]), dec("10"));
        assert_eq!(decimal(&body["entries"]["value"]), dec("50"));
        assert_eq!(decimal(&body["exits"]["quantity"]), dec("4"));
        assert_eq!(decimal(&body["exits"]["value"]), dec("20"));
        assert_eq!(decimal(&body["netQuantity"]), dec("6"));
        assert_eq!(decimal(&body["currentBalance"]), dec("6"));
        assert_eq!(body["from"], "2024-01-01");
    }

    #[tokio::test]
    async fn test_summary_without_bounds() {
        let jwt = token(Some("loja1"), false);
        let (status, body) = send(
            app(),
            get("/api/v1/inventory/movements/summary?from=2024-01-01", Some(&jwt)),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
        assert_eq!(
            body["error"]["message_en"],
            "Parameters `from` and `to` are required"
        );
    }

    #[tokio::test]
    async fn test_kardex() {
        let jwt = token(Some("loja1"), false);
        let (status, body) = send(app(), get("/api/v1/inventory/movements/7", Some(&jwt))).await;

        assert_eq!(status, StatusCode::OK);
        let rows = body.as_array().unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(decimal(&rows[1]["previousBalance"]), dec("10"));
        assert_eq!(decimal(&rows[1]["currentBalance"]), dec("6"));
    }

    #[tokio::test]
    async fn test_kardex_rejects_non_numeric_item() {
        let jwt = token(Some("loja1"), false);
        let (status, body) = send(app(), get("/api/v1/inventory/movements/abc", Some(&jwt))).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["field"], "itemId");
    }

    #[tokio::test]
    async fn test_create_movement_missing_quantity() {
        let jwt = token(Some("loja1"), false);
        let payload = json!({
            "itemId": "3f2504e0-4f89-11d3-9a0c-0305e82c3301",
            "type": "E",
            "warehouse": 1,
            "customerOrSupplier": "12",
            "date": "2024-02-01",
            "codusu": "ADM"
        });
        let (status, body) = send(app(), post("/api/v1/inventory/movements", &jwt, payload)).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "MISSING_FIELDS");
        assert_eq!(
            body["error"]["message_en"],
            "Missing required fields in payload: qtde (quantity)."
        );
    }

    #[tokio::test]
    async fn test_create_movement_amount_out_of_range() {
        let jwt = token(Some("loja1"), false);
        let payload = json!({
            "itemId": "3f2504e0-4f89-11d3-9a0c-0305e82c3301",
            "type": "E",
            "quantity": "79228162514264337593543950335",
            "unitPrice": 2,
            "warehouse": 1,
            "customerOrSupplier": 12,
            "date": "2024-02-01",
            "codusu": "ADM"
        });
        let (status, body) = send(app(), post("/api/v1/inventory/movements", &jwt, payload)).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["field"], "unitPrice");
    }

    #[tokio::test]
    async fn test_create_movement_unknown_warehouse() {
        let jwt = token(Some("loja1"), false);
        let payload = json!({
            "itemId": "3f2504e0-4f89-11d3-9a0c-0305e82c3301",
            "type": "E",
            "quantity": "2",
            "warehouse": "42",
            "customerOrSupplier": 12,
            "date": "2024-02-01",
            "user": "maria"
        });
        let (status, body) = send(app(), post("/api/v1/inventory/movements", &jwt, payload)).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "NOT_FOUND");
        assert!(body["error"]["message_en"].as_str().unwrap().contains("'42'"));
    }
}

// ============================================================================
// Upload endpoint
// ============================================================================

#[cfg(test)]
mod upload_api_tests {
    use super::*;

    fn upload_body(file_type: &str, size: i64) -> Value {
        json!({ "fileName": "logo.png", "fileType": file_type, "fileSize": size })
    }

    #[tokio::test]
    async fn test_upload_requires_admin() {
        let jwt = token(Some("loja1"), false);
        let (status, body) = send(
            app(),
            post("/api/v1/upload/presigned", &jwt, upload_body("image/png", 1024)),
        )
        .await;

        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["error"]["code"], "FORBIDDEN");
    }

    #[tokio::test]
    async fn test_upload_default_target() {
        let jwt = token(Some("Loja1"), true);
        let (status, body) = send(
            app(),
            post("/api/v1/upload/presigned", &jwt, upload_body(" Image/PNG ", 1024)),
        )
        .await;

        assert_eq!(status, StatusCode::CREATED);
        let key = body["fileKey"].as_str().unwrap();
        assert!(key.starts_with("uploads/loja1/"));
        assert!(key.ends_with(".png"));
        assert_eq!(
            body["fileUrl"].as_str().unwrap(),
            format!("https://cdn.goldpdv.com.br/{}", key)
        );
        let url = body["uploadUrl"].as_str().unwrap();
        assert!(url.starts_with("https://acct.r2.cloudflarestorage.com/goldpdv-assets/uploads/loja1/"));
        assert!(url.contains("X-Amz-Expires=600"));
    }

    #[tokio::test]
    async fn test_upload_epdv_origin_uses_fallback_target() {
        let jwt = token(Some("loja1"), true);
        let request = Request::builder()
            .method("POST")
            .uri("/api/v1/upload/presigned")
            .header(header::AUTHORIZATION, format!("Bearer {}", jwt))
            .header(header::CONTENT_TYPE, "application/json")
            .header(header::ORIGIN, "https://painel.e-pdv.com")
            .body(Body::from(upload_body("application/pdf", 2048).to_string()))
            .unwrap();
        let (status, body) = send(app(), request).await;

        assert_eq!(status, StatusCode::CREATED);
        assert!(body["fileUrl"]
            .as_str()
            .unwrap()
            .starts_with("https://cdn.e-pdv.com/uploads/loja1/"));
        assert!(body["uploadUrl"].as_str().unwrap().contains("/e-pdv-assets/"));
        assert!(body["fileKey"].as_str().unwrap().ends_with(".pdf"));
    }

    #[tokio::test]
    async fn test_upload_rejects_type_and_size() {
        let jwt = token(Some("loja1"), true);

        let (status, body) = send(
            app(),
            post("/api/v1/upload/presigned", &jwt, upload_body("image/gif", 1024)),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["message_en"], "File type not allowed");

        let (status, body) = send(
            app(),
            post(
                "/api/v1/upload/presigned",
                &jwt,
                upload_body("image/jpeg", 5 * 1024 * 1024 + 1),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            body["error"]["message_en"],
            "File exceeds the maximum allowed size"
        );
    }
}
