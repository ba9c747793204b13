//! Router-level catalog behavior: location scoping, slug lookups, and the
//! error taxonomy on the wire.

mod common;

use axum::http::StatusCode;
use serde_json::json;

async fn create_subcategory(
    app: &common::TestApp,
    cookie: &str,
    category_id: &serde_json::Value,
    name: &str,
    locations: serde_json::Value,
) {
    let (status, _, _) = common::send(
        app,
        "POST",
        "/api/subcategories",
        Some(cookie),
        Some(json!({
            "categoryId": category_id,
            "name": name,
            "minCharge": 150,
            "locations": locations,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "create {name}");
}

#[tokio::test]
async fn location_filter_scopes_the_catalog() {
    let app = common::app();
    let cookie = common::login(&app).await;

    let (_, _, category) = common::send(
        &app,
        "POST",
        "/api/categories",
        Some(&cookie),
        Some(json!({ "name": "Home Services" })),
    )
    .await;
    let category_id = &category["category"]["id"];

    create_subcategory(&app, &cookie, category_id, "Plumbing Services", json!(["malappuram"]))
        .await;
    create_subcategory(&app, &cookie, category_id, "Electrical Repair", json!(["calicut"]))
        .await;
    create_subcategory(
        &app,
        &cookie,
        category_id,
        "AC Service",
        json!(["malappuram", "calicut"]),
    )
    .await;

    let (status, _, body) = common::send(
        &app,
        "GET",
        "/api/subcategories?location=malappuram",
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let slugs: Vec<&str> = body["subcategories"]
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["slug"].as_str().unwrap())
        .collect();
    assert_eq!(slugs, ["ac-service", "plumbing-services"]);

    // No filter: everything, newest first.
    let (_, _, all) = common::send(&app, "GET", "/api/subcategories", None, None).await;
    assert_eq!(all["subcategories"].as_array().unwrap().len(), 3);

    // Unknown location: empty, not an error.
    let (status, _, none) = common::send(
        &app,
        "GET",
        "/api/subcategories?location=kochi",
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(none["subcategories"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn subcategory_detail_populates_parent_category() {
    let app = common::app();
    let cookie = common::login(&app).await;

    let (_, _, category) = common::send(
        &app,
        "POST",
        "/api/categories",
        Some(&cookie),
        Some(json!({ "name": "Home Services" })),
    )
    .await;
    create_subcategory(
        &app,
        &cookie,
        &category["category"]["id"],
        "Plumbing Services",
        json!([]),
    )
    .await;

    let (status, _, body) = common::send(
        &app,
        "GET",
        "/api/subcategories/plumbing-services",
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["subcategory"]["slug"], "plumbing-services");
    assert_eq!(body["subcategory"]["category"]["slug"], "home-services");
    // Default location fallback applied on create.
    assert_eq!(body["subcategory"]["locations"], json!(["malappuram"]));

    let (status, _, missing) =
        common::send(&app, "GET", "/api/subcategories/no-such-slug", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(missing["error"], "subcategory not found");
}

#[tokio::test]
async fn duplicate_category_name_maps_to_bad_request() {
    let app = common::app();
    let cookie = common::login(&app).await;

    for _ in 0..2 {
        let (status, _, body) = common::send(
            &app,
            "POST",
            "/api/categories",
            Some(&cookie),
            Some(json!({ "name": "Home Services" })),
        )
        .await;
        if status == StatusCode::CREATED {
            continue;
        }
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "category with this slug already exists");
        return;
    }
    panic!("second create should have failed");
}

#[tokio::test]
async fn missing_fields_are_named_in_the_error() {
    let app = common::app();
    let cookie = common::login(&app).await;

    let (status, _, body) = common::send(
        &app,
        "POST",
        "/api/locations",
        Some(&cookie),
        Some(json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "name, slug, district are required");
}

#[tokio::test]
async fn seed_endpoint_provisions_a_browsable_catalog() {
    let app = common::app();
    let cookie = common::login(&app).await;

    let (status, _, body) =
        common::send(&app, "POST", "/api/seed", Some(&cookie), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert!(body["seeded"]["subcategories"].as_u64().unwrap() > 0);

    let (_, _, listing) = common::send(
        &app,
        "GET",
        "/api/subcategories?location=malappuram",
        None,
        None,
    )
    .await;
    assert!(!listing["subcategories"].as_array().unwrap().is_empty());

    let (_, _, locations) = common::send(&app, "GET", "/api/locations", None, None).await;
    assert_eq!(locations["locations"][0]["slug"], "malappuram");
}
