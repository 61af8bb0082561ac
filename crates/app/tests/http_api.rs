use app::{AppState, Config, router};
use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use quiz_core::time::fixed_now;
use serde_json::{Value, json};
use services::{AppServices, Clock};
use tower::ServiceExt;

const ADMIN_KEY: &str = "test-key";

fn app_with_key(key: Option<&str>) -> Router {
    let config = Config::from_lookup(|name| match name {
        "QUIZ_ADMIN_KEY" => key.map(str::to_owned),
        _ => None,
    })
    .unwrap();
    let services = AppServices::in_memory(Clock::fixed(fixed_now()));
    router(AppState::new(services, &config))
}

fn app() -> Router {
    app_with_key(Some(ADMIN_KEY))
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn with_json(method: &str, uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn post_empty(uri: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

#[tokio::test]
async fn health_reports_database() {
    let (status, body) = send(&app(), get("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["database"], "healthy");
}

#[tokio::test]
async fn questions_are_public() {
    let (status, body) = send(&app(), get("/api/questions")).await;
    assert_eq!(status, StatusCode::OK);
    let questions = body.as_array().unwrap();
    assert_eq!(questions.len(), 10);
    assert_eq!(questions[0]["id"], 1);
    assert!(questions[0]["question"].is_string());
}

#[tokio::test]
async fn submit_then_results_and_distribution() {
    let app = app();
    let (status, body) = send(
        &app,
        with_json("POST", "/api/submit", &json!({"answers": {"1": 2, "2": 3}})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["overlapPercentage"], 88);
    assert_eq!(body["message"], "Responses submitted successfully");
    let session_id = body["sessionId"].as_str().unwrap().to_owned();

    let (status, results) = send(&app, get(&format!("/api/results/{session_id}"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(results["overlapPercentage"], 88);
    assert_eq!(results["completed"], true);
    assert_eq!(results["responses"], json!({"1": 2, "2": 3}));

    let (status, dist) = send(&app, get("/api/distribution")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(dist["totalResponses"], 1);
    assert_eq!(dist["averageScore"], 88);
    assert_eq!(dist["allScores"], json!([88]));
    assert_eq!(dist["distribution"][8], json!({"bucket": "80-89%", "count": 1}));
}

#[tokio::test]
async fn submit_rejects_invalid_answers() {
    let app = app();
    for payload in [
        json!({}),
        json!({"answers": "nope"}),
        json!({"answers": {"1": 9}}),
        json!({"answers": {"42": 3}}),
        json!({"answers": {"1": 2, "01": 5, " 1": 4}}),
    ] {
        let (status, body) = send(&app, with_json("POST", "/api/submit", &payload)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{payload}");
        assert!(body["error"].is_string());
    }

    let (status, _) = send(&app, post_empty("/api/submit")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn results_errors() {
    let app = app();
    let (status, _) = send(&app, get("/api/results/unknown")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = send(&app, get("/api/results/bad%20id")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn incremental_session_flow() {
    let app = app();
    let (status, body) = send(&app, post_empty("/api/sessions")).await;
    assert_eq!(status, StatusCode::CREATED);
    let id = body["sessionId"].as_str().unwrap().to_owned();

    let (status, _) = send(&app, post_empty(&format!("/api/sessions/{id}/complete"))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let references = [2, 4, 2, 1, 1, 1, 1, 3, 2, 4];
    for (question, answer) in (1..).zip(references) {
        let (status, _) = send(
            &app,
            with_json(
                "PUT",
                &format!("/api/sessions/{id}/answers/{question}"),
                &json!({"answer": answer}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::NO_CONTENT);
    }

    let (status, _) = send(
        &app,
        with_json(
            "PUT",
            &format!("/api/sessions/{id}/answers/1"),
            &json!({"answer": 3}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = send(
        &app,
        with_json(
            "PUT",
            &format!("/api/sessions/{id}/answers/11"),
            &json!({"answer": 3}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(&app, post_empty(&format!("/api/sessions/{id}/complete"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["overlapPercentage"], 100);

    let (status, _) = send(&app, post_empty(&format!("/api/sessions/{id}/complete"))).await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn admin_routes_require_key() {
    let app = app();
    let (status, body) = send(&app, get("/api/admin/stats")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Unauthorized. Admin access required.");

    let (status, _) = send(&app, get("/api/admin/stats?key=wrong")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = send(&app, get("/api/admin/stats?key=a&key=b")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Unauthorized. Admin access required.");

    let (status, body) = send(&app, post_empty(&format!("/api/admin/seed?key={ADMIN_KEY}"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"seeded": true, "sessions": 8}));

    let request = Request::builder()
        .uri("/api/admin/stats")
        .header(header::AUTHORIZATION, format!("Bearer {ADMIN_KEY}"))
        .body(Body::empty())
        .unwrap();
    let (status, stats) = send(&app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stats["count"], 8);
    assert_eq!(stats["mean"], 60);
    assert_eq!(stats["highest"], 91);
    assert_eq!(stats["lowest"], 23);
    assert_eq!(stats["allScores"][0], 91);
    assert_eq!(stats["questionAnalysis"].as_array().unwrap().len(), 10);
    assert_eq!(stats["scoreRanges"]["90%+"], 1);

    let (status, body) =
        send(&app, post_empty(&format!("/api/admin/cleanup?key={ADMIN_KEY}"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["deleted"], 0);
}

#[tokio::test]
async fn admin_routes_locked_without_configured_key() {
    let app = app_with_key(None);
    let (status, _) = send(&app, get("/api/admin/stats?key=")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let request = Request::builder()
        .uri("/api/admin/stats")
        .header(header::AUTHORIZATION, "Bearer ")
        .body(Body::empty())
        .unwrap();
    let (status, _) = send(&app, request).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}
