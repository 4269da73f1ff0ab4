use super::*;
use axum::body::{to_bytes, Body};
use axum::http::Request;
use serde_json::{json, Value};
use tower::ServiceExt;

fn test_app(pool: PgPool, default_mode: LocateMode) -> Router {
    build_app(AppState { pool, default_mode })
}

async fn send(app: Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .expect("request"),
        None => builder.body(Body::empty()).expect("request"),
    };

    let response = app.oneshot(request).await.expect("response");
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body bytes");
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("json parse")
    };
    (status, json)
}

fn square(min_lng: f64, min_lat: f64, max_lng: f64, max_lat: f64) -> Value {
    json!({
        "type": "MultiPolygon",
        "coordinates": [[[
            [min_lng, min_lat],
            [max_lng, min_lat],
            [max_lng, max_lat],
            [min_lng, max_lat],
            [min_lng, min_lat]
        ]]]
    })
}

fn partner_body(id: &str, document: &str, lng: f64, lat: f64) -> Value {
    json!({
        "id": id,
        "tradingName": format!("Adega {id}"),
        "ownerName": "Ze da Silva",
        "document": document,
        "address": { "type": "Point", "coordinates": [lng, lat] },
        "coverageArea": square(lng - 0.5, lat - 0.5, lng + 0.5, lat + 0.5)
    })
}

async fn insert_raw(pool: &PgPool, id: &str, document: &str, address: Value, coverage: Value) {
    sqlx::query(
        "INSERT INTO partners (id, trading_name, owner_name, document, address, coverage_area) \
         VALUES ($1, $2, 'Owner', $3, $4, $5)",
    )
    .bind(id)
    .bind(format!("Partner {id}"))
    .bind(document)
    .bind(address)
    .bind(coverage)
    .execute(pool)
    .await
    .expect("insert partner");
}

#[test]
fn api_error_codes_map_to_statuses() {
    let cases = [
        (ErrorCode::NotFound, "not_found", StatusCode::NOT_FOUND),
        (ErrorCode::BadRequest, "bad_request", StatusCode::BAD_REQUEST),
        (ErrorCode::ValidationError, "validation_error", StatusCode::BAD_REQUEST),
        (ErrorCode::Conflict, "conflict", StatusCode::CONFLICT),
        (ErrorCode::InternalError, "internal_error", StatusCode::INTERNAL_SERVER_ERROR),
    ];
    for (code, wire, status) in cases {
        assert_eq!(serde_json::to_value(code).expect("serialize"), wire);
        let response = ApiError::new("req-1", code, "message").into_response();
        assert_eq!(response.status(), status, "code {wire}");
    }
}

#[test]
fn api_error_serializes_envelope() {
    let err = ApiError::new("req-9", ErrorCode::Conflict, "duplicate");
    let json = serde_json::to_value(&err).expect("serialize");
    assert_eq!(json["error"]["code"], "conflict");
    assert_eq!(json["error"]["message"], "duplicate");
    assert_eq!(json["meta"]["request_id"], "req-9");
}

#[sqlx::test(migrations = "../../migrations")]
async fn health_reports_ok(pool: PgPool) {
    let (status, json) = send(
        test_app(pool, LocateMode::Nearest),
        Method::GET,
        "/api/v1/health",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["status"], "ok");
    assert_eq!(json["data"]["database"], "ok");
}

#[sqlx::test(migrations = "../../migrations")]
async fn create_returns_created_partner_in_camel_case(pool: PgPool) {
    let (status, json) = send(
        test_app(pool, LocateMode::Nearest),
        Method::POST,
        "/api/v1/partners",
        Some(partner_body("1", "1432132123891/0001", -46.57, -21.78)),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(json["data"]["id"], "1");
    assert_eq!(json["data"]["tradingName"], "Adega 1");
    assert_eq!(json["data"]["coverageArea"]["type"], "MultiPolygon");
    assert!(json["data"]["createdAt"].is_string());
}

#[sqlx::test(migrations = "../../migrations")]
async fn create_rejects_duplicate_id_and_document(pool: PgPool) {
    let app = test_app(pool, LocateMode::Nearest);
    let (status, _) = send(
        app.clone(),
        Method::POST,
        "/api/v1/partners",
        Some(partner_body("1", "doc-1", 0.0, 0.0)),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, json) = send(
        app.clone(),
        Method::POST,
        "/api/v1/partners",
        Some(partner_body("1", "doc-2", 0.0, 0.0)),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(json["error"]["message"]
        .as_str()
        .is_some_and(|m| m.contains("id")));

    let (status, json) = send(
        app,
        Method::POST,
        "/api/v1/partners",
        Some(partner_body("2", "doc-1", 0.0, 0.0)),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(json["error"]["message"]
        .as_str()
        .is_some_and(|m| m.contains("document")));
}

#[sqlx::test(migrations = "../../migrations")]
async fn create_rejects_invalid_geometry_and_blank_fields(pool: PgPool) {
    let app = test_app(pool, LocateMode::Nearest);

    let mut body = partner_body("1", "doc-1", 0.0, 0.0);
    body["address"] = json!({ "type": "Point", "coordinates": [200.0, 0.0] });
    let (status, json) = send(app.clone(), Method::POST, "/api/v1/partners", Some(body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"]["code"], "validation_error");

    let mut body = partner_body("1", "doc-1", 0.0, 0.0);
    body["coverageArea"] = json!("not json");
    let (status, _) = send(app.clone(), Method::POST, "/api/v1/partners", Some(body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let mut body = partner_body("1", "doc-1", 0.0, 0.0);
    body["tradingName"] = json!("   ");
    let (status, json) = send(app, Method::POST, "/api/v1/partners", Some(body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"]["code"], "validation_error");
}

#[sqlx::test(migrations = "../../migrations")]
async fn list_get_update_delete_round(pool: PgPool) {
    let app = test_app(pool, LocateMode::Nearest);
    for (id, doc) in [("b", "doc-b"), ("a", "doc-a")] {
        let (status, _) = send(
            app.clone(),
            Method::POST,
            "/api/v1/partners",
            Some(partner_body(id, doc, 10.0, 10.0)),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, json) = send(app.clone(), Method::GET, "/api/v1/partners", None).await;
    assert_eq!(status, StatusCode::OK);
    let ids: Vec<&str> = json["data"]
        .as_array()
        .expect("data array")
        .iter()
        .filter_map(|p| p["id"].as_str())
        .collect();
    assert_eq!(ids, vec!["a", "b"]);

    let update = json!({
        "tradingName": "Renamed",
        "ownerName": "New Owner",
        "document": "doc-a2",
        "address": [11.0, 11.0]
    });
    let (status, json) = send(
        app.clone(),
        Method::PUT,
        "/api/v1/partners/a",
        Some(update),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["tradingName"], "Renamed");
    assert_eq!(json["data"]["coverageArea"], Value::Null);

    let (status, json) = send(app.clone(), Method::GET, "/api/v1/partners/a", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["document"], "doc-a2");

    let (status, json) = send(app.clone(), Method::DELETE, "/api/v1/partners/a", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["deleted"], true);

    let (status, json) = send(app, Method::GET, "/api/v1/partners/a", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["error"]["code"], "not_found");
}

#[sqlx::test(migrations = "../../migrations")]
async fn update_and_delete_missing_partner_return_not_found(pool: PgPool) {
    let app = test_app(pool, LocateMode::Nearest);
    let update = json!({
        "tradingName": "Nobody",
        "ownerName": "Nobody",
        "document": "doc-x"
    });
    let (status, _) = send(
        app.clone(),
        Method::PUT,
        "/api/v1/partners/missing",
        Some(update),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(app, Method::DELETE, "/api/v1/partners/missing", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[sqlx::test(migrations = "../../migrations")]
async fn update_to_taken_document_conflicts(pool: PgPool) {
    let app = test_app(pool, LocateMode::Nearest);
    for (id, doc) in [("1", "doc-1"), ("2", "doc-2")] {
        send(
            app.clone(),
            Method::POST,
            "/api/v1/partners",
            Some(partner_body(id, doc, 0.0, 0.0)),
        )
        .await;
    }
    let update = json!({
        "tradingName": "Two",
        "ownerName": "Owner",
        "document": "doc-1"
    });
    let (status, json) = send(app, Method::PUT, "/api/v1/partners/2", Some(update)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json["error"]["code"], "conflict");
}

#[sqlx::test(migrations = "../../migrations")]
async fn search_requires_both_coordinates(pool: PgPool) {
    let (status, json) = send(
        test_app(pool, LocateMode::Nearest),
        Method::GET,
        "/api/v1/partners/search?long=1.0",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"]["code"], "bad_request");
}

#[sqlx::test(migrations = "../../migrations")]
async fn search_rejects_invalid_coordinates_and_mode(pool: PgPool) {
    let app = test_app(pool, LocateMode::Nearest);
    for uri in [
        "/api/v1/partners/search?long=abc&lat=0",
        "/api/v1/partners/search?long=0&lat=91",
        "/api/v1/partners/search?long=NaN&lat=0",
        "/api/v1/partners/search?long=0&lat=0&mode=closest",
    ] {
        let (status, json) = send(app.clone(), Method::GET, uri, None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
        assert_eq!(json["error"]["code"], "validation_error", "{uri}");
    }
}

#[sqlx::test(migrations = "../../migrations")]
async fn search_on_empty_store_is_not_found(pool: PgPool) {
    let (status, json) = send(
        test_app(pool, LocateMode::Nearest),
        Method::GET,
        "/api/v1/partners/search?long=0&lat=0",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["error"]["message"], "no partners registered");
}

#[sqlx::test(migrations = "../../migrations")]
async fn search_nearest_returns_closest_with_fixed_distance(pool: PgPool) {
    insert_raw(&pool, "far", "doc-far", json!([5.0, 0.0]), Value::Null).await;
    insert_raw(&pool, "near", "doc-near", json!([1.0, 0.0]), Value::Null).await;

    let (status, json) = send(
        test_app(pool, LocateMode::Nearest),
        Method::GET,
        "/api/v1/partners/search?long=0&lat=0",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["partner"]["id"], "near");
    assert_eq!(json["data"]["distance_km"], "111.1949");
    assert_eq!(json["data"]["mode"], "nearest");
    assert_eq!(json["data"]["scanned"], 2);
    assert_eq!(json["data"]["skipped"], 0);
}

#[sqlx::test(migrations = "../../migrations")]
async fn search_coverage_uses_area_and_skips_malformed_rows(pool: PgPool) {
    insert_raw(
        &pool,
        "covering",
        "doc-c",
        json!([2.0, 2.0]),
        square(-1.0, -1.0, 3.0, 3.0),
    )
    .await;
    insert_raw(
        &pool,
        "closer-but-outside",
        "doc-o",
        json!([0.1, 0.1]),
        square(10.0, 10.0, 11.0, 11.0),
    )
    .await;
    insert_raw(
        &pool,
        "broken",
        "doc-b",
        json!([0.0, 0.0]),
        json!("not json"),
    )
    .await;

    let (status, json) = send(
        test_app(pool, LocateMode::Nearest),
        Method::GET,
        "/api/v1/partners/search?long=0&lat=0&mode=coverage",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["partner"]["id"], "covering");
    assert_eq!(json["data"]["mode"], "coverage");
    assert_eq!(json["data"]["scanned"], 3);
    assert_eq!(json["data"]["skipped"], 1);
}

#[sqlx::test(migrations = "../../migrations")]
async fn search_uses_configured_default_mode(pool: PgPool) {
    insert_raw(
        &pool,
        "1",
        "doc-1",
        json!([0.5, 0.5]),
        square(10.0, 10.0, 11.0, 11.0),
    )
    .await;

    let (status, json) = send(
        test_app(pool, LocateMode::Coverage),
        Method::GET,
        "/api/v1/partners/search?long=0&lat=0",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["error"]["message"], "no partner found for this location");
}

#[sqlx::test(migrations = "../../migrations")]
async fn partner_routes_are_public(pool: PgPool) {
    // No Authorization header anywhere: the partner and search routes must answer.
    let app = test_app(pool, LocateMode::Nearest);
    let (status, _) = send(app.clone(), Method::GET, "/api/v1/partners", None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = send(
        app,
        Method::GET,
        "/api/v1/partners/search?long=0&lat=0",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[sqlx::test(migrations = "../../migrations")]
async fn response_replaces_unusable_request_id(pool: PgPool) {
    let response = test_app(pool, LocateMode::Nearest)
        .oneshot(
            Request::builder()
                .uri("/api/v1/health")
                .header("x-request-id", "has spaces")
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");
    let echoed = response
        .headers()
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .expect("request id header");
    assert_ne!(echoed, "has spaces");
    assert!(!echoed.is_empty());
}

#[sqlx::test(migrations = "../../migrations")]
async fn response_echoes_request_id(pool: PgPool) {
    let response = test_app(pool, LocateMode::Nearest)
        .oneshot(
            Request::builder()
                .uri("/api/v1/health")
                .header("x-request-id", "req-abc")
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");
    assert_eq!(
        response
            .headers()
            .get("x-request-id")
            .and_then(|v| v.to_str().ok()),
        Some("req-abc")
    );
}
