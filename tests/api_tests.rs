//! HTTP API integration tests against a live server with the in-memory store.

mod common;

use anyhow::Result;
use reqwest::header::AUTHORIZATION;
use reqwest::StatusCode;
use serde_json::{json, Value};

use common::{png_bytes, portfolio_form, TestServer, ADMIN_PASS, ADMIN_USER};

async fn contact_count(srv: &TestServer) -> Result<usize> {
    let resp = srv.http.get(srv.url("/api/contacts")).header(AUTHORIZATION, srv.admin_header()).send().await?;
    assert_eq!(resp.status(), StatusCode::OK);
    Ok(resp.json::<Vec<Value>>().await?.len())
}

async fn create_item(srv: &TestServer, title: &str, category: &str, row_span: &str) -> Result<reqwest::Response> {
    Ok(srv
        .http
        .post(srv.url("/api/portfolio"))
        .header(AUTHORIZATION, srv.admin_header())
        .multipart(portfolio_form(title, category, "Branding, Logo Design", row_span, Some(png_bytes())))
        .send()
        .await?)
}

#[tokio::test]
async fn health_route_answers() -> Result<()> {
    let srv = TestServer::start().await;
    let resp = srv.http.get(srv.url("/")).send().await?;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.text().await?, "vertocraft ok");
    Ok(())
}

#[tokio::test]
async fn login_returns_token_for_valid_credentials_only() -> Result<()> {
    let srv = TestServer::start().await;
    let ok = srv
        .http
        .post(srv.url("/api/auth/login"))
        .json(&json!({ "username": ADMIN_USER, "password": ADMIN_PASS }))
        .send()
        .await?;
    assert_eq!(ok.status(), StatusCode::OK);
    let body: Value = ok.json().await?;
    assert_eq!(body["token"], vertocraft::security::issue_token(ADMIN_USER, ADMIN_PASS));

    for (u, p) in [(ADMIN_USER, "wrong"), ("someone", ADMIN_PASS)] {
        let bad = srv.http.post(srv.url("/api/auth/login")).json(&json!({ "username": u, "password": p })).send().await?;
        assert_eq!(bad.status(), StatusCode::UNAUTHORIZED);
        let body: Value = bad.json().await?;
        assert_eq!(body["status"], "error");
        assert_eq!(body["message"], "invalid credentials");
    }
    Ok(())
}

#[tokio::test]
async fn login_with_malformed_body_is_a_client_error() -> Result<()> {
    let srv = TestServer::start().await;
    let resp = srv
        .http
        .post(srv.url("/api/auth/login"))
        .header("content-type", "application/json")
        .body("{\"username\":")
        .send()
        .await?;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn contact_submission_echoes_record_with_id_and_timestamp() -> Result<()> {
    let srv = TestServer::start().await;
    let resp = srv
        .http
        .post(srv.url("/api/contact"))
        .json(&json!({
            "name": "Ada Lovelace",
            "email": "ada@example.com",
            "subject": "New brand",
            "message": "We would like a new logo and site.",
            "services": ["Branding", "Web Design"]
        }))
        .send()
        .await?;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: Value = resp.json().await?;
    assert_eq!(body["message"], "Contact form submitted successfully");
    let contact = &body["contact"];
    assert!(contact["id"].as_i64().unwrap() > 0);
    assert_eq!(contact["name"], "Ada Lovelace");
    assert_eq!(contact["services"], json!(["Branding", "Web Design"]));
    assert!(contact["createdAt"].as_str().unwrap().ends_with('Z'));
    assert_eq!(contact_count(&srv).await?, 1);
    Ok(())
}

#[tokio::test]
async fn contact_echo_keeps_submitted_values_verbatim() -> Result<()> {
    let srv = TestServer::start().await;
    let submitted = json!({
        "name": "  Ada  ",
        "email": "ada@example.com",
        "subject": " New brand ",
        "message": "  We would like a new logo.  ",
        "services": ["Branding", " ", " Web "]
    });
    let resp = srv.http.post(srv.url("/api/contact")).json(&submitted).send().await?;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: Value = resp.json().await?;
    let contact = &body["contact"];
    for field in ["name", "email", "subject", "message", "services"] {
        assert_eq!(contact[field], submitted[field], "field {}", field);
    }

    let listed: Vec<Value> = srv
        .http
        .get(srv.url("/api/contacts"))
        .header(AUTHORIZATION, srv.admin_header())
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(&listed[0], contact);
    Ok(())
}

#[tokio::test]
async fn invalid_contact_is_rejected_without_storing() -> Result<()> {
    let srv = TestServer::start().await;
    let bad = [
        json!({ "name": "A", "email": "a@example.com", "subject": "Hi", "message": "long enough message" }),
        json!({ "name": "Ada", "email": "not-an-email", "subject": "Hi", "message": "long enough message" }),
        json!({ "name": "Ada", "email": "a@example.com", "subject": "Hi", "message": "short" }),
        json!({ "name": "Ada", "email": "a@example.com" }),
    ];
    for body in bad {
        let resp = srv.http.post(srv.url("/api/contact")).json(&body).send().await?;
        assert!(resp.status().is_client_error(), "{} accepted: {}", body, resp.status());
    }
    assert_eq!(contact_count(&srv).await?, 0);
    Ok(())
}

#[tokio::test]
async fn admin_routes_require_valid_credentials() -> Result<()> {
    let srv = TestServer::start().await;
    let wrong = format!("Basic {}", vertocraft::security::issue_token(ADMIN_USER, "nope"));

    let none = srv.http.get(srv.url("/api/contacts")).send().await?;
    assert_eq!(none.status(), StatusCode::UNAUTHORIZED);
    let bad = srv.http.get(srv.url("/api/contacts")).header(AUTHORIZATION, &wrong).send().await?;
    assert_eq!(bad.status(), StatusCode::UNAUTHORIZED);
    let garbage = srv.http.get(srv.url("/api/contacts")).header(AUTHORIZATION, "Basic %%%").send().await?;
    assert_eq!(garbage.status(), StatusCode::UNAUTHORIZED);

    let create = srv
        .http
        .post(srv.url("/api/portfolio"))
        .multipart(portfolio_form("Test Item", "branding", "", "30", Some(png_bytes())))
        .send()
        .await?;
    assert_eq!(create.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(srv.upload_count(), 0);

    let create_wrong = srv
        .http
        .post(srv.url("/api/portfolio"))
        .header(AUTHORIZATION, &wrong)
        .multipart(portfolio_form("Test Item", "branding", "", "30", Some(png_bytes())))
        .send()
        .await?;
    assert_eq!(create_wrong.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(srv.upload_count(), 0);
    let list: Vec<Value> = srv.http.get(srv.url("/api/portfolio")).send().await?.json().await?;
    assert!(list.is_empty());

    let delete = srv.http.delete(srv.url("/api/portfolio/1")).header(AUTHORIZATION, &wrong).send().await?;
    assert_eq!(delete.status(), StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn row_span_bounds_are_enforced() -> Result<()> {
    let srv = TestServer::start().await;
    for span in ["19", "51", "abc", ""] {
        let resp = create_item(&srv, "Out of range", "branding", span).await?;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "rowSpan {:?}", span);
    }
    assert_eq!(srv.upload_count(), 0);

    for span in ["20", "50"] {
        let resp = create_item(&srv, "In range", "branding", span).await?;
        assert_eq!(resp.status(), StatusCode::CREATED, "rowSpan {}", span);
        let item: Value = resp.json().await?;
        assert_eq!(item["rowSpan"].to_string(), span);
    }
    assert_eq!(srv.upload_count(), 2);
    Ok(())
}

#[tokio::test]
async fn failed_creates_leave_no_files_behind() -> Result<()> {
    let srv = TestServer::start().await;
    let bad_title = create_item(&srv, "", "branding", "30").await?;
    assert_eq!(bad_title.status(), StatusCode::BAD_REQUEST);
    let bad_category = create_item(&srv, "Fine title", "Not A Slug!", "30").await?;
    assert_eq!(bad_category.status(), StatusCode::BAD_REQUEST);
    let reserved = create_item(&srv, "Fine title", "all", "30").await?;
    assert_eq!(reserved.status(), StatusCode::BAD_REQUEST);

    let no_image = srv
        .http
        .post(srv.url("/api/portfolio"))
        .header(AUTHORIZATION, srv.admin_header())
        .multipart(portfolio_form("Fine title", "branding", "", "30", None))
        .send()
        .await?;
    assert_eq!(no_image.status(), StatusCode::BAD_REQUEST);
    let body: Value = no_image.json().await?;
    assert_eq!(body["code"], "missing_image");

    let empty_image = srv
        .http
        .post(srv.url("/api/portfolio"))
        .header(AUTHORIZATION, srv.admin_header())
        .multipart(portfolio_form("Fine title", "branding", "", "30", Some(Vec::new())))
        .send()
        .await?;
    assert_eq!(empty_image.status(), StatusCode::BAD_REQUEST);

    assert_eq!(srv.upload_count(), 0);
    let list: Vec<Value> = srv.http.get(srv.url("/api/portfolio")).send().await?.json().await?;
    assert!(list.is_empty());
    Ok(())
}

#[tokio::test]
async fn oversized_upload_is_rejected_and_rolled_back() -> Result<()> {
    let srv = TestServer::start_with(|c| c.max_upload_bytes = 4096).await;
    let big = vec![0xAB_u8; 200 * 1024];
    let resp = srv
        .http
        .post(srv.url("/api/portfolio"))
        .header(AUTHORIZATION, srv.admin_header())
        .multipart(portfolio_form("Too big", "branding", "", "30", Some(big)))
        .send()
        .await?;
    assert_eq!(resp.status(), StatusCode::PAYLOAD_TOO_LARGE);
    let body: Value = resp.json().await?;
    assert_eq!(body["code"], "payload_too_large");
    assert_eq!(srv.upload_count(), 0);

    let list: Vec<Value> = srv.http.get(srv.url("/api/portfolio")).send().await?.json().await?;
    assert!(list.is_empty());
    Ok(())
}

#[tokio::test]
async fn delete_twice_is_ok_then_not_found() -> Result<()> {
    let srv = TestServer::start().await;
    let item: Value = create_item(&srv, "Short lived", "web", "25").await?.json().await?;
    let id = item["id"].as_i64().unwrap();
    assert_eq!(srv.upload_count(), 1);

    let url = srv.url(&format!("/api/portfolio/{}", id));
    let first = srv.http.delete(&url).header(AUTHORIZATION, srv.admin_header()).send().await?;
    assert_eq!(first.status(), StatusCode::OK);
    let body: Value = first.json().await?;
    assert_eq!(body["id"], id);
    assert_eq!(srv.upload_count(), 0);

    let second = srv.http.delete(&url).header(AUTHORIZATION, srv.admin_header()).send().await?;
    assert_eq!(second.status(), StatusCode::NOT_FOUND);
    assert_eq!(srv.http.get(&url).send().await?.status(), StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn malformed_ids_are_bad_requests() -> Result<()> {
    let srv = TestServer::start().await;
    for raw in ["abc", "0", "-1"] {
        let resp = srv.http.get(srv.url(&format!("/api/portfolio/{}", raw))).send().await?;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "id {}", raw);
    }
    let missing = srv.http.get(srv.url("/api/portfolio/999")).send().await?;
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn category_filter_narrows_listing() -> Result<()> {
    let srv = TestServer::start().await;
    create_item(&srv, "Logo work", "branding", "30").await?;
    create_item(&srv, "Site work", "web", "30").await?;
    create_item(&srv, "More logos", "branding", "40").await?;

    let all: Vec<Value> = srv.http.get(srv.url("/api/portfolio")).send().await?.json().await?;
    assert_eq!(all.len(), 3);
    let ids: Vec<i64> = all.iter().map(|i| i["id"].as_i64().unwrap()).collect();
    assert!(ids.windows(2).all(|w| w[0] < w[1]), "not in insertion order: {:?}", ids);

    let branding: Vec<Value> = srv.http.get(srv.url("/api/portfolio?category=Branding")).send().await?.json().await?;
    assert_eq!(branding.len(), 2);
    assert!(branding.iter().all(|i| i["category"] == "branding"));

    let everything: Vec<Value> = srv.http.get(srv.url("/api/portfolio?category=all")).send().await?.json().await?;
    assert_eq!(everything.len(), 3);
    Ok(())
}

#[tokio::test]
async fn uploaded_images_are_served() -> Result<()> {
    let srv = TestServer::start().await;
    let item: Value = create_item(&srv, "Served", "branding", "30").await?.json().await?;
    let image = item["image"].as_str().unwrap().to_string();
    assert!(image.starts_with("/uploads/") && image.ends_with(".png"), "{}", image);

    let resp = srv.http.get(srv.url(&image)).send().await?;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.headers()["content-type"], "image/png");
    assert_eq!(resp.bytes().await?.to_vec(), png_bytes());

    let missing = srv.http.get(srv.url("/uploads/nothing-here.png")).send().await?;
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn end_to_end_portfolio_scenario() -> Result<()> {
    let srv = TestServer::start().await;

    let token: Value = srv
        .http
        .post(srv.url("/api/auth/login"))
        .json(&json!({ "username": ADMIN_USER, "password": ADMIN_PASS }))
        .send()
        .await?
        .json()
        .await?;
    let auth = format!("Basic {}", token["token"].as_str().unwrap());

    let created = srv
        .http
        .post(srv.url("/api/portfolio"))
        .header(AUTHORIZATION, &auth)
        .multipart(portfolio_form("Test Item", "branding", "Branding, Logo Design", "35", Some(png_bytes())))
        .send()
        .await?;
    assert_eq!(created.status(), StatusCode::CREATED);
    let item: Value = created.json().await?;
    assert_eq!(item["title"], "Test Item");
    assert_eq!(item["category"], "branding");
    assert_eq!(item["categories"], "Branding, Logo Design");
    assert_eq!(item["rowSpan"], 35);
    let id = item["id"].as_i64().unwrap();

    let list: Vec<Value> = srv.http.get(srv.url("/api/portfolio")).send().await?.json().await?;
    assert_eq!(list.len(), 1);
    assert_eq!(list[0]["id"], id);

    let fetched: Value = srv.http.get(srv.url(&format!("/api/portfolio/{}", id))).send().await?.json().await?;
    assert_eq!(fetched, item);

    let deleted = srv
        .http
        .delete(srv.url(&format!("/api/portfolio/{}", id)))
        .header(AUTHORIZATION, &auth)
        .send()
        .await?;
    assert_eq!(deleted.status(), StatusCode::OK);

    let list: Vec<Value> = srv.http.get(srv.url("/api/portfolio")).send().await?.json().await?;
    assert!(list.is_empty());
    assert_eq!(srv.upload_count(), 0);
    Ok(())
}
