//! HTTP API tests against the in-memory store

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Method, Request, StatusCode, header},
};
use jsonwebtoken::{EncodingKey, Header, encode};
use serde_json::{Value, json};
use tower::ServiceExt;

use croj_judge::{
    config::JwtConfig,
    create_router,
    db::{MemoryStore, ProblemStore},
    error::DispatchError,
    judge::{Dispatcher, ResultApplier},
    middleware::auth::Claims,
    models::{
        AccountStatus, JudgeMode, JudgeOutcome, ProblemInfo, ProblemVisibility, Role,
        SubmissionId, SubmissionStatus, UserId, UserInfo,
    },
    services::{StatsService, SubmissionService},
    state::AppState,
};

const SECRET: &str = "test-secret";
const OWNER: UserId = 1;
const OTHER: UserId = 2;
const ADMIN: UserId = 3;
const PUBLIC_PROBLEM: i64 = 10;
const PRIVATE_PROBLEM: i64 = 11;

/// Counts enqueues, optionally failing every one
struct RecordingDispatcher {
    enqueued: AtomicUsize,
    fail: bool,
}

#[async_trait]
impl Dispatcher for RecordingDispatcher {
    async fn enqueue(&self, _submission_id: SubmissionId) -> Result<(), DispatchError> {
        if self.fail {
            return Err(DispatchError::Unavailable("redis://10.0.0.5 refused".to_string()));
        }
        self.enqueued.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

struct TestApp {
    router: Router,
    store: Arc<MemoryStore>,
    applier: ResultApplier,
    dispatcher: Arc<RecordingDispatcher>,
}

async fn spawn_app(dispatch_fails: bool) -> TestApp {
    let store = Arc::new(MemoryStore::new());
    for (id, role) in [(OWNER, Role::User), (OTHER, Role::User), (ADMIN, Role::Admin)] {
        store
            .insert_user(UserInfo {
                id,
                role,
                status: AccountStatus::Normal,
            })
            .await;
    }
    for (id, visibility) in [
        (PUBLIC_PROBLEM, ProblemVisibility::Public),
        (PRIVATE_PROBLEM, ProblemVisibility::Private),
    ] {
        store
            .insert_problem(ProblemInfo {
                id,
                visibility,
                owner_id: OWNER,
                time_limit: 1000,
                memory_limit: 256,
                judge_mode: JudgeMode::Acm,
                total_score: 100,
                submit_count: 0,
                accepted_count: 0,
            })
            .await;
    }

    let dispatcher = Arc::new(RecordingDispatcher {
        enqueued: AtomicUsize::new(0),
        fail: dispatch_fails,
    });
    let stats = Arc::new(StatsService::new(store.clone()));
    let service = Arc::new(SubmissionService::new(
        store.clone(),
        store.clone(),
        store.clone(),
        dispatcher.clone(),
        stats.clone(),
    ));
    let state = AppState::new(
        service,
        stats,
        JwtConfig {
            secret: SECRET.to_string(),
        },
    );

    TestApp {
        router: create_router(state),
        applier: ResultApplier::new(store.clone(), store.clone()),
        store,
        dispatcher,
    }
}

fn token(user_id: UserId, role: &str) -> String {
    let claims = Claims {
        sub: user_id.to_string(),
        role: role.to_string(),
        exp: chrono::Utc::now().timestamp() + 3600,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(SECRET.as_bytes()),
    )
    .unwrap()
}

impl TestApp {
    async fn request(
        &self,
        method: Method,
        uri: &str,
        caller: Option<(UserId, &str)>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some((id, role)) = caller {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token(id, role)));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, json)
    }

    async fn submit(&self, caller: UserId, problem_id: i64) -> (StatusCode, Value) {
        self.request(
            Method::POST,
            "/api/submission",
            Some((caller, "USER")),
            Some(json!({"problemId": problem_id, "language": "cpp", "code": "int main() {}"})),
        )
        .await
    }

    async fn problem(&self, id: i64) -> ProblemInfo {
        self.store.find_problem(id).await.unwrap().unwrap()
    }
}

#[tokio::test]
async fn health_is_public() {
    let app = spawn_app(false).await;
    let (status, body) = app.request(Method::GET, "/api/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn submission_routes_require_a_token() {
    let app = spawn_app(false).await;
    let (status, body) = app.request(Method::GET, "/api/submission/1", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["code"], "UNAUTHORIZED");
}

#[tokio::test]
async fn submit_and_read_back_through_judging() {
    let app = spawn_app(false).await;

    let (status, body) = app.submit(OWNER, PUBLIC_PROBLEM).await;
    assert_eq!(status, StatusCode::ACCEPTED);
    assert_eq!(body["code"], 202);
    let id = body["data"]["submissionId"].as_i64().unwrap();
    assert_eq!(app.dispatcher.enqueued.load(Ordering::SeqCst), 1);
    assert_eq!(app.problem(PUBLIC_PROBLEM).await.submit_count, 1);

    let uri = format!("/api/submission/{id}");
    let (_, pending) = app.request(Method::GET, &uri, Some((OWNER, "USER")), None).await;
    assert_eq!(pending["data"]["status"], "PENDING");
    assert_eq!(pending["data"]["statusText"], "Pending");
    assert!(pending["data"]["runTime"].is_null());

    app.applier
        .apply(&JudgeOutcome::new(id, SubmissionStatus::Accepted).with_usage(120, 2048))
        .await
        .unwrap();

    let (status, judged) = app.request(Method::GET, &uri, Some((OWNER, "USER")), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(judged["data"]["status"], "ACCEPTED");
    assert_eq!(judged["data"]["runTime"], 120);
    assert_eq!(judged["data"]["code"], "int main() {}");
    assert_eq!(app.problem(PUBLIC_PROBLEM).await.accepted_count, 1);
}

#[tokio::test]
async fn private_problem_is_forbidden_to_other_users() {
    let app = spawn_app(false).await;

    let (status, body) = app.submit(OTHER, PRIVATE_PROBLEM).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"]["code"], "FORBIDDEN");
    assert_eq!(app.store.submission_count().await, 0);
    assert_eq!(app.problem(PRIVATE_PROBLEM).await.submit_count, 0);
    assert_eq!(app.dispatcher.enqueued.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn unknown_problem_is_not_found() {
    let app = spawn_app(false).await;
    let (status, body) = app.submit(OWNER, 999).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "NOT_FOUND");
}

#[tokio::test]
async fn dispatch_failure_is_generic_and_persists_nothing() {
    let app = spawn_app(true).await;

    let (status, body) = app.submit(OWNER, PUBLIC_PROBLEM).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["error"]["code"], "SYSTEM_ERROR");
    assert_eq!(body["error"]["message"], "Submission failed");
    assert!(!body.to_string().contains("10.0.0.5"));
    assert_eq!(app.store.submission_count().await, 0);
    assert_eq!(app.problem(PUBLIC_PROBLEM).await.submit_count, 0);
}

#[tokio::test]
async fn oversized_code_is_rejected() {
    let app = spawn_app(false).await;
    let (status, body) = app
        .request(
            Method::POST,
            "/api/submission",
            Some((OWNER, "USER")),
            Some(json!({"problemId": PUBLIC_PROBLEM, "language": "cpp", "code": "a".repeat(65536)})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn non_owner_sees_redacted_wrong_answer() {
    let app = spawn_app(false).await;
    let (_, body) = app.submit(OWNER, PUBLIC_PROBLEM).await;
    let id = body["data"]["submissionId"].as_i64().unwrap();
    app.applier
        .apply(
            &JudgeOutcome::new(id, SubmissionStatus::WrongAnswer)
                .with_error_message("expected 3, found 4"),
        )
        .await
        .unwrap();

    let uri = format!("/api/submission/{id}");
    let (_, other) = app.request(Method::GET, &uri, Some((OTHER, "USER")), None).await;
    assert_eq!(other["data"]["status"], "WRONG_ANSWER");
    assert!(other["data"]["errorMessage"].is_null());
    assert!(other["data"]["code"].is_null());
    assert!(other["data"]["judgeInfo"].is_null());

    let (_, admin) = app.request(Method::GET, &uri, Some((ADMIN, "ADMIN")), None).await;
    assert_eq!(admin["data"]["errorMessage"], "expected 3, found 4");
}

#[tokio::test]
async fn list_filters_and_authorizes() {
    let app = spawn_app(false).await;
    app.submit(OWNER, PUBLIC_PROBLEM).await;
    app.submit(OWNER, PUBLIC_PROBLEM).await;
    app.submit(OTHER, PUBLIC_PROBLEM).await;

    let (status, body) = app
        .request(
            Method::POST,
            "/api/submission/list",
            Some((OTHER, "USER")),
            Some(json!({"userId": OWNER})),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"]["code"], "FORBIDDEN");

    let (status, body) = app
        .request(
            Method::POST,
            "/api/submission/list",
            Some((OTHER, "USER")),
            Some(json!({"problemId": PUBLIC_PROBLEM, "current": 1, "size": 2})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["total"], 3);
    assert_eq!(body["data"]["pages"], 2);
    let records = body["data"]["records"].as_array().unwrap();
    assert_eq!(records.len(), 2);
    for record in records {
        assert_eq!(record["code"].is_null(), record["userId"] != OTHER);
    }

    let (status, body) = app
        .request(
            Method::POST,
            "/api/submission/list",
            Some((OTHER, "USER")),
            Some(json!({"size": 101})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn best_submission_and_problem_status() {
    let app = spawn_app(false).await;
    let auth = Some((OWNER, "USER"));

    let best_uri = format!("/api/submission/best?problemId={PUBLIC_PROBLEM}");
    let status_uri = format!("/api/submission/status?problemId={PUBLIC_PROBLEM}");

    let (status, body) = app.request(Method::GET, &best_uri, auth, None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["data"].is_null());
    let (_, body) = app.request(Method::GET, &status_uri, auth, None).await;
    assert_eq!(body["data"]["status"], "NOT_ATTEMPTED");

    let mut ids = Vec::new();
    for run_time in [200, 90] {
        let (_, body) = app.submit(OWNER, PUBLIC_PROBLEM).await;
        let id = body["data"]["submissionId"].as_i64().unwrap();
        app.applier
            .apply(&JudgeOutcome::new(id, SubmissionStatus::Accepted).with_usage(run_time, 512))
            .await
            .unwrap();
        ids.push(id);
    }

    let (_, body) = app.request(Method::GET, &best_uri, auth, None).await;
    assert_eq!(body["data"]["id"], ids[1]);
    assert_eq!(body["data"]["runTime"], 90);
    let (_, body) = app.request(Method::GET, &status_uri, auth, None).await;
    assert_eq!(body["data"]["status"], "ACCEPTED");

    let (status, body) = app
        .request(
            Method::GET,
            &format!("/api/users/{OWNER}/submission-stats"),
            Some((OTHER, "USER")),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["submissionCount"], 2);
    assert_eq!(body["data"]["acceptedProblemCount"], 1);
}
