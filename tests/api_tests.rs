mod common;

use axum::{
    body::Body,
    http::{Method, Request, StatusCode, header},
};
use common::{
    MultipartBody, PDF_BYTES, call, create_region, delete, get, send_form, test_app,
    test_app_with, tour_form,
};
use tour_cms::{MockStorageService, slug::MAX_SLUG_LEN};

#[tokio::test]
async fn test_health_check() {
    let app = test_app().await;
    let (status, body) = get(&app, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "ok");
}

#[tokio::test]
async fn test_openapi_document_is_served() {
    let app = test_app().await;
    let (status, body) = get(&app, "/api-docs/openapi.json").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["paths"]["/international-tours"].is_object());
    assert!(body["paths"]["/regions/{key}/banners"].is_object());
}

// --- Regions ---

#[tokio::test]
async fn test_region_create_assigns_slug_and_answers_201() {
    let app = test_app().await;
    let region = create_region(&app, "Western Europe", true).await;

    assert_eq!(region["slug"], "western-europe");
    assert_eq!(region["is_active"], true);
    assert!(region["thumbnail"].is_null());
}

#[tokio::test]
async fn test_duplicate_region_names_get_distinct_slugs() {
    let app = test_app().await;
    let first = create_region(&app, "Balkans", true).await;
    let second = create_region(&app, "Balkans!", true).await;

    assert_eq!(first["slug"], "balkans");
    assert_eq!(second["slug"], "balkans-2");
}

#[tokio::test]
async fn test_numeric_name_gets_reachable_slug() {
    let app = test_app().await;
    let region = create_region(&app, "2024", true).await;
    assert_eq!(region["slug"], "region-2024");

    let (status, body) = get(&app, "/regions/region-2024").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], region["id"]);

    let (status, tour) =
        send_form(&app, Method::POST, "/domestic-tours", tour_form("1999")).await;
    assert_eq!(status, StatusCode::CREATED, "{tour}");
    assert_eq!(tour["slug"], "domestic-tour-1999");
}

#[tokio::test]
async fn test_longest_name_gets_slug_within_column_width() {
    let app = test_app().await;
    let name = "北".repeat(255);

    let first = create_region(&app, &name, true).await;
    let second = create_region(&app, &name, true).await;
    for region in [&first, &second] {
        let slug = region["slug"].as_str().unwrap();
        assert!(slug.len() <= MAX_SLUG_LEN, "len = {}", slug.len());
    }
    assert_ne!(first["slug"], second["slug"]);
    assert_eq!(first["name"], name.as_str());
}

#[tokio::test]
async fn test_non_multipart_write_uses_error_envelope() {
    let app = test_app().await;
    let request = Request::builder()
        .method(Method::POST)
        .uri("/regions")
        .header("x-user-id", app.user_id.to_string())
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(r#"{"name": "Alps"}"#))
        .unwrap();
    let (status, body) = call(&app, request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string(), "{body}");

    let (_, regions) = get(&app, "/regions").await;
    assert_eq!(regions, serde_json::json!([]));
}

#[tokio::test]
async fn test_region_lookup_by_id_and_by_slug() {
    let app = test_app().await;
    let region = create_region(&app, "Far East", true).await;
    let id = region["id"].as_i64().unwrap();

    let (status, by_id) = get(&app, &format!("/regions/{id}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(by_id["slug"], "far-east");

    let (status, by_slug) = get(&app, "/regions/far-east").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(by_slug["id"], id);

    let (status, body) = get(&app, "/regions/nowhere").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].as_str().unwrap().contains("nowhere"));
}

#[tokio::test]
async fn test_region_create_requires_name() {
    let app = test_app().await;
    let form = MultipartBody::new().text("is_active", "true");
    let (status, body) = send_form(&app, Method::POST, "/regions", form).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().starts_with("name:"));
}

#[tokio::test]
async fn test_region_thumbnail_is_uploaded_to_storage() {
    let app = test_app().await;
    let form = MultipartBody::new().text("name", "Nordics").image("thumbnail");
    let (status, body) = send_form(&app, Method::POST, "/regions", form).await;

    assert_eq!(status, StatusCode::CREATED);
    let url = body["thumbnail"].as_str().unwrap();
    assert!(url.starts_with("http://localhost:9000/mock-bucket/thumbnails/"));
    assert!(url.ends_with(".png"));

    let keys = app.storage.stored_keys().await;
    assert_eq!(keys.len(), 1);
    assert!(keys[0].starts_with("thumbnails/"));
}

#[tokio::test]
async fn test_region_patch_keeps_slug() {
    let app = test_app().await;
    create_region(&app, "Caucasus", true).await;

    let form = MultipartBody::new().text("name", "Caucasus & Caspian");
    let (status, body) = send_form(&app, Method::PATCH, "/regions/caucasus", form).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "Caucasus & Caspian");
    assert_eq!(body["slug"], "caucasus");
}

#[tokio::test]
async fn test_region_put_requires_name() {
    let app = test_app().await;
    create_region(&app, "Iberia", true).await;

    let form = MultipartBody::new().text("is_active", "false");
    let (status, _) = send_form(&app, Method::PUT, "/regions/iberia", form).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_region_list_filters_by_is_active() {
    let app = test_app().await;
    create_region(&app, "Open", true).await;
    create_region(&app, "Closed", false).await;

    let (_, all) = get(&app, "/regions").await;
    assert_eq!(all.as_array().unwrap().len(), 2);

    let (_, active) = get(&app, "/regions?is_active=TRUE").await;
    let active = active.as_array().unwrap();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0]["name"], "Open");

    let (_, inactive) = get(&app, "/regions?is_active=false").await;
    assert_eq!(inactive.as_array().unwrap()[0]["name"], "Closed");

    let (status, _) = get(&app, "/regions?is_active=maybe").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

// --- Query Whitelists ---

#[tokio::test]
async fn test_unknown_query_parameter_is_rejected() {
    let app = test_app().await;

    let (status, body) = get(&app, "/domestic-tours?bogus=1").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("bogus"));

    for uri in [
        "/regions?page=2",
        "/international-tours?region=1",
        "/banners?kind=home",
    ] {
        let (status, _) = get(&app, uri).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
    }
}

// --- Domestic Tours ---

#[tokio::test]
async fn test_domestic_tour_lifecycle() {
    let app = test_app().await;

    let form = tour_form("Cappadocia Balloons")
        .file("tour_program_pdf", "program.pdf", "application/pdf", PDF_BYTES)
        .image("images")
        .image("images")
        .text("captions", "Sunrise")
        .text("captions", "");
    let (status, tour) = send_form(&app, Method::POST, "/domestic-tours", form).await;
    assert_eq!(status, StatusCode::CREATED, "{tour}");
    assert_eq!(tour["slug"], "cappadocia-balloons");
    assert_eq!(tour["price"], "1499.90");
    assert_eq!(tour["is_active"], true);
    assert!(tour["tour_program_pdf"].as_str().unwrap().contains("tour_programs/"));

    let images = tour["images"].as_array().unwrap();
    assert_eq!(images.len(), 2);
    assert_eq!(images[0]["caption"], "Sunrise");
    assert!(images[1]["caption"].is_null());
    assert!(images[0]["image"].as_str().unwrap().contains("domestic_tour_images/"));

    let id = tour["id"].as_i64().unwrap();
    let (status, fetched) = get(&app, &format!("/domestic-tours/{id}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["name"], "Cappadocia Balloons");

    let (status, _) = delete(&app, "/domestic-tours/cappadocia-balloons").await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = get(&app, &format!("/domestic-tours/{id}")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_domestic_tour_accepts_tour_info_alias() {
    let app = test_app().await;
    let form = MultipartBody::new()
        .text("name", "Black Sea Plateaus")
        .text("airline", "Sky Air")
        .text("start_date", "2025-07-01")
        .text("end_date", "2025-07-05")
        .text("price", "899")
        .text("tour_info", "Highland villages.")
        .image("thumbnail");
    let (status, tour) = send_form(&app, Method::POST, "/domestic-tours", form).await;

    assert_eq!(status, StatusCode::CREATED, "{tour}");
    assert_eq!(tour["description"], "Highland villages.");
    assert_eq!(tour["price"], "899.00");
}

#[tokio::test]
async fn test_domestic_tour_create_reports_every_invalid_field() {
    let app = test_app().await;
    let form = MultipartBody::new()
        .text("name", "Broken")
        .text("start_date", "01/06/2025")
        .text("price", "-10");
    let (status, body) = send_form(&app, Method::POST, "/domestic-tours", form).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    let message = body["error"].as_str().unwrap();
    for field in ["airline:", "start_date:", "end_date:", "price:", "description:", "thumbnail:"] {
        assert!(message.contains(field), "missing {field} in {message}");
    }
}

#[tokio::test]
async fn test_domestic_tour_patch_checks_merged_dates() {
    let app = test_app().await;
    let (_, tour) = send_form(&app, Method::POST, "/domestic-tours", tour_form("Aegean Coast")).await;
    let id = tour["id"].as_i64().unwrap();

    let form = MultipartBody::new().text("end_date", "2025-05-01");
    let (status, body) =
        send_form(&app, Method::PATCH, &format!("/domestic-tours/{id}"), form).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().starts_with("end_date:"));

    let form = MultipartBody::new().text("price", "1200.5").text("is_active", "off");
    let (status, body) =
        send_form(&app, Method::PATCH, &format!("/domestic-tours/{id}"), form).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["price"], "1200.50");
    assert_eq!(body["is_active"], false);
    assert_eq!(body["thumbnail"], tour["thumbnail"]);
}

#[tokio::test]
async fn test_tour_images_are_appended_on_update() {
    let app = test_app().await;
    let form = tour_form("Lycian Way").image("images");
    let (_, tour) = send_form(&app, Method::POST, "/domestic-tours", form).await;

    let form = MultipartBody::new().image("images").text("captions", "Ridge");
    let (status, body) =
        send_form(&app, Method::PATCH, "/domestic-tours/lycian-way", form).await;

    assert_eq!(status, StatusCode::OK);
    let images = body["images"].as_array().unwrap();
    assert_eq!(images.len(), 2);
    assert_eq!(images[0]["id"], tour["images"][0]["id"]);
    assert_eq!(images[1]["caption"], "Ridge");
}

#[tokio::test]
async fn test_non_image_thumbnail_is_rejected() {
    let app = test_app().await;
    let form = MultipartBody::new()
        .text("name", "Nordics")
        .file("thumbnail", "notes.txt", "text/plain", b"hello");
    let (status, body) = send_form(&app, Method::POST, "/regions", form).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().starts_with("thumbnail:"));
    assert!(app.storage.stored_keys().await.is_empty());
}

// --- International Tours ---

#[tokio::test]
async fn test_international_tour_region_filters() {
    let app = test_app().await;
    let europe = create_region(&app, "Europe", true).await;
    let asia = create_region(&app, "Asia", true).await;
    let europe_id = europe["id"].as_i64().unwrap();
    let asia_id = asia["id"].as_i64().unwrap();

    for (name, region_id) in [("Paris Tour", europe_id), ("Rome Tour", europe_id), ("Tokyo Tour", asia_id)] {
        let form = tour_form(name).text("region_id", &region_id.to_string());
        let (status, body) = send_form(&app, Method::POST, "/international-tours", form).await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
    }

    let (_, by_slug) = get(&app, "/international-tours?region_slug=europe").await;
    assert_eq!(by_slug.as_array().unwrap().len(), 2);
    assert_eq!(by_slug[0]["region"]["slug"], "europe");

    let (_, by_id) = get(&app, &format!("/international-tours?region_id={asia_id}")).await;
    assert_eq!(by_id.as_array().unwrap().len(), 1);
    assert_eq!(by_id[0]["name"], "Tokyo Tour");

    let uri = format!("/international-tours?region_id={asia_id}&region_slug=europe");
    let (status, both) = get(&app, &uri).await;
    assert_eq!(status, StatusCode::OK);
    assert!(both.as_array().unwrap().is_empty());

    let (status, _) = get(&app, "/international-tours?region_slug=unknown-slug").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = get(&app, "/international-tours?region_id=abc").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_international_tour_lookup_by_slug() {
    let app = test_app().await;
    let region = create_region(&app, "France", true).await;
    let form = tour_form("Paris Tour").text("region_id", &region["id"].to_string());
    send_form(&app, Method::POST, "/international-tours", form).await;

    let (status, tour) = get(&app, "/international-tours/paris-tour").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(tour["region_id"], region["id"]);
    assert_eq!(tour["region"]["name"], "France");
}

#[tokio::test]
async fn test_international_tour_requires_region_id() {
    let app = test_app().await;
    let (status, body) =
        send_form(&app, Method::POST, "/international-tours", tour_form("Lost Tour")).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("region_id:"));
}

#[tokio::test]
async fn test_international_tour_rejects_inactive_or_missing_region() {
    let app = test_app().await;
    let closed = create_region(&app, "Closed Region", false).await;

    let form = tour_form("Nope").text("region_id", &closed["id"].to_string());
    let (status, body) = send_form(&app, Method::POST, "/international-tours", form).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("not active"));

    let form = tour_form("Nope").text("region_id", "999");
    let (status, body) = send_form(&app, Method::POST, "/international-tours", form).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("Invalid pk"));

    assert!(app.storage.stored_keys().await.is_empty());
}

#[tokio::test]
async fn test_region_deactivation_cascades_through_the_api() {
    let app = test_app().await;
    let region = create_region(&app, "Scandinavia", true).await;
    let form = tour_form("Fjords").text("region_id", &region["id"].to_string());
    send_form(&app, Method::POST, "/international-tours", form).await;

    let form = MultipartBody::new().text("is_active", "false");
    let (status, _) = send_form(&app, Method::PATCH, "/regions/scandinavia", form).await;
    assert_eq!(status, StatusCode::OK);

    let (_, tour) = get(&app, "/international-tours/fjords").await;
    assert_eq!(tour["is_active"], false);

    // Re-saving the tour as active keeps it inactive while the region is inactive.
    let form = MultipartBody::new().text("is_active", "true");
    let (status, tour) = send_form(&app, Method::PATCH, "/international-tours/fjords", form).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(tour["is_active"], false);

    let form = MultipartBody::new().text("is_active", "true");
    send_form(&app, Method::PATCH, "/regions/scandinavia", form).await;
    let (_, tour) = get(&app, "/international-tours/fjords").await;
    assert_eq!(tour["is_active"], true);
}

#[tokio::test]
async fn test_region_delete_keeps_tours_inactive() {
    let app = test_app().await;
    let region = create_region(&app, "Baltics", true).await;
    let form = tour_form("Riga Weekend").text("region_id", &region["id"].to_string());
    send_form(&app, Method::POST, "/international-tours", form).await;

    let (status, body) = delete(&app, "/regions/baltics").await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert!(body.is_null());

    let (status, tour) = get(&app, "/international-tours/riga-weekend").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(tour["is_active"], false);
    assert!(tour["region_id"].is_null());

    let (status, _) = get(&app, "/regions/baltics").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

// --- Region Banners ---

#[tokio::test]
async fn test_region_banner_lifecycle() {
    let app = test_app().await;
    create_region(&app, "Alps", true).await;

    let form = MultipartBody::new().image("image").text("title", "Ski season");
    let (status, banner) = send_form(&app, Method::POST, "/regions/alps/banners", form).await;
    assert_eq!(status, StatusCode::CREATED, "{banner}");
    assert!(banner["image"].as_str().unwrap().contains("region_banners/"));

    let (_, banners) = get(&app, "/regions/alps/banners?is_active=true").await;
    assert_eq!(banners.as_array().unwrap().len(), 1);

    let (status, _) = get(&app, "/regions/alps/banners?type=home").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let uri = format!("/regions/alps/banners/{}", banner["id"]);
    let (status, _) = delete(&app, &uri).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = delete(&app, &uri).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_region_banner_requires_image() {
    let app = test_app().await;
    create_region(&app, "Alps", true).await;

    let form = MultipartBody::new().text("title", "No picture");
    let (status, body) = send_form(&app, Method::POST, "/regions/alps/banners", form).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().starts_with("image:"));
}

// --- Site Banners ---

#[tokio::test]
async fn test_banner_type_filter_and_default() {
    let app = test_app().await;
    let form = MultipartBody::new().text("title", "Welcome").image("image");
    let (status, home) = send_form(&app, Method::POST, "/banners", form).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(home["type"], "home");

    let form = MultipartBody::new()
        .text("title", "Contact us")
        .text("type", "contact")
        .image("image");
    send_form(&app, Method::POST, "/banners", form).await;

    let (_, contact) = get(&app, "/banners?type=contact").await;
    assert_eq!(contact.as_array().unwrap().len(), 1);
    assert_eq!(contact[0]["title"], "Contact us");

    let (status, _) = get(&app, "/banners?type=promo").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Banners have no slug.
    let (status, _) = get(&app, "/banners/welcome").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, fetched) = get(&app, &format!("/banners/{}", home["id"])).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched, home);
}

#[tokio::test]
async fn test_banner_put_keeps_image() {
    let app = test_app().await;
    let form = MultipartBody::new().text("title", "Summer").image("image");
    let (_, banner) = send_form(&app, Method::POST, "/banners", form).await;

    let form = MultipartBody::new()
        .text("title", "Summer deals")
        .text("type", "domestic");
    let (status, updated) =
        send_form(&app, Method::PUT, &format!("/banners/{}", banner["id"]), form).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["title"], "Summer deals");
    assert_eq!(updated["type"], "domestic");
    assert_eq!(updated["image"], banner["image"]);
}

// --- Failures ---

#[tokio::test]
async fn test_storage_failure_is_a_generic_500() {
    let app = test_app_with(MockStorageService::new_failing()).await;
    let form = MultipartBody::new().text("title", "Broken").image("image");
    let (status, body) = send_form(&app, Method::POST, "/banners", form).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "An internal error occurred");
}

#[tokio::test]
async fn test_writes_require_authentication() {
    let app = test_app().await;
    let request = axum::http::Request::builder()
        .method(Method::POST)
        .uri("/regions")
        .header(
            axum::http::header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", common::BOUNDARY),
        )
        .body(axum::body::Body::from(format!("--{}--\r\n", common::BOUNDARY)))
        .unwrap();
    let (status, body) = common::call(&app, request).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body["error"].is_string());

    // Reads on the same path stay public.
    let (status, _) = get(&app, "/regions").await;
    assert_eq!(status, StatusCode::OK);
}
