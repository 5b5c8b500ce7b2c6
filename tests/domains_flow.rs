mod common;

use anyhow::Result;
use axum::body::Body;
use axum::http::StatusCode;
use serde_json::{json, Value};
use uuid::Uuid;

use common::{acquire_db_lock, body_to_vec, TestApp};

async fn read_json(response: hyper::Response<Body>) -> Result<Value> {
    Ok(serde_json::from_slice(
        &body_to_vec(response.into_body()).await?,
    )?)
}

/// Provisions a tenant with `acme.local` as its primary domain; returns the
/// tenant id.
async fn provision_acme(app: &TestApp, token: &str) -> Result<Uuid> {
    let response = app
        .post_json(
            "/api/tenants",
            &json!({
                "name": "Acme",
                "schema_name": "tenant1",
                "admin_email": "admin@acme.test",
                "admin_first_name": "Ada",
                "admin_last_name": "Lovelace",
                "domain": "acme.local",
                "generate_password": true,
            }),
            Some(token),
        )
        .await?;
    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await?;
    Ok(serde_json::from_value(body["tenant"]["id"].clone())?)
}

async fn list_domains(app: &TestApp, token: &str) -> Result<Vec<Value>> {
    let response = app.get("/api/domains", Some(token)).await?;
    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await?;
    Ok(body.as_array().expect("array response").clone())
}

fn find_domain<'a>(rows: &'a [Value], hostname: &str) -> &'a Value {
    rows.iter()
        .find(|row| row["domain"] == hostname)
        .expect("domain is listed")
}

#[tokio::test]
async fn primary_domains_cannot_be_deleted() -> Result<()> {
    let _guard = acquire_db_lock().await;
    let app = TestApp::new().await?;
    let token = app.operator_token().await?;
    provision_acme(&app, &token).await?;

    let rows = list_domains(&app, &token).await?;
    let primary = find_domain(&rows, "acme.local");
    assert_eq!(primary["is_primary"], true);
    let id = primary["id"].as_str().expect("domain id").to_string();

    let response = app.delete(&format!("/api/domains/{id}"), Some(&token)).await?;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    // The record survives untouched.
    let rows = list_domains(&app, &token).await?;
    let primary = find_domain(&rows, "acme.local");
    assert_eq!(primary["is_primary"], true);

    app.cleanup().await
}

#[tokio::test]
async fn bound_domains_must_be_detached_before_deletion() -> Result<()> {
    let _guard = acquire_db_lock().await;
    let app = TestApp::new().await?;
    let token = app.operator_token().await?;
    let tenant_id = provision_acme(&app, &token).await?;

    let response = app
        .post_json(
            "/api/domains",
            &json!({"domain": "extra.local", "tenant_id": tenant_id, "is_primary": false}),
            Some(&token),
        )
        .await?;
    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await?;
    let id = body["id"].as_str().expect("domain id").to_string();

    let response = app.delete(&format!("/api/domains/{id}"), Some(&token)).await?;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let response = app
        .post_json(&format!("/api/domains/{id}/detach"), &json!({}), Some(&token))
        .await?;
    assert_eq!(response.status(), StatusCode::OK);
    let detached = read_json(response).await?;
    assert_eq!(detached["tenant_id"], Value::Null);
    assert_eq!(detached["is_primary"], false);

    let response = app.delete(&format!("/api/domains/{id}"), Some(&token)).await?;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let rows = list_domains(&app, &token).await?;
    assert!(rows.iter().all(|row| row["domain"] != "extra.local"));

    app.cleanup().await
}

#[tokio::test]
async fn binding_a_new_primary_demotes_the_old_one() -> Result<()> {
    let _guard = acquire_db_lock().await;
    let app = TestApp::new().await?;
    let token = app.operator_token().await?;
    let tenant_id = provision_acme(&app, &token).await?;

    let response = app
        .post_json(
            "/api/domains",
            &json!({"domain": "second.local", "tenant_id": tenant_id, "is_primary": true}),
            Some(&token),
        )
        .await?;
    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await?;
    assert_eq!(body["is_primary"], true);

    let rows = list_domains(&app, &token).await?;
    assert_eq!(find_domain(&rows, "acme.local")["is_primary"], false);
    assert_eq!(find_domain(&rows, "second.local")["is_primary"], true);

    let tenant = tenant_id.to_string();
    let primaries = rows
        .iter()
        .filter(|row| row["tenant_id"].as_str() == Some(tenant.as_str()) && row["is_primary"] == true)
        .count();
    assert_eq!(primaries, 1);

    app.cleanup().await
}

#[tokio::test]
async fn rejects_a_duplicate_hostname() -> Result<()> {
    let _guard = acquire_db_lock().await;
    let app = TestApp::new().await?;
    let token = app.operator_token().await?;
    let tenant_id = provision_acme(&app, &token).await?;

    let response = app
        .post_json(
            "/api/domains",
            &json!({"domain": "acme.local", "tenant_id": tenant_id, "is_primary": false}),
            Some(&token),
        )
        .await?;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    app.cleanup().await
}

#[tokio::test]
async fn rejects_binding_to_an_unknown_tenant() -> Result<()> {
    let _guard = acquire_db_lock().await;
    let app = TestApp::new().await?;
    let token = app.operator_token().await?;

    let response = app
        .post_json(
            "/api/domains",
            &json!({"domain": "orphan.local", "tenant_id": Uuid::new_v4(), "is_primary": false}),
            Some(&token),
        )
        .await?;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    app.cleanup().await
}
