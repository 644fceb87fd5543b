//! Integration tests for the auth and analysis workflows
//!
//! These drive the workflows end to end: real HTTP client, wiremock backend,
//! file-backed session.

use retentionai::api::HttpChurnApi;
use retentionai::config::ApiConfig;
use retentionai::guard::{Navigation, Route, RouteGuard};
use retentionai::record::EmployeeRecord;
use retentionai::session::{FileStorage, SessionStore};
use retentionai::workflow::{AnalysisState, AnalysisWorkflow, AuthOutcome, AuthWorkflow, Failure, RiskClass, RunOutcome};
use serde_json::json;
use tempfile::TempDir;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn api(server: &MockServer) -> HttpChurnApi {
    HttpChurnApi::from_config(&ApiConfig {
        base_url: server.uri(),
        timeout_ms: 5_000,
    })
    .expect("Failed to build client")
}

async fn mount_token(server: &MockServer, token: &str) {
    Mock::given(method("POST"))
        .and(path("/auth/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": token,
            "token_type": "bearer"
        })))
        .mount(server)
        .await;
}

// =============================================================================
// Login and persistence
// =============================================================================

#[tokio::test]
async fn test_login_persists_and_survives_restart() {
    let server = MockServer::start().await;
    mount_token(&server, "jwt-abc").await;
    let temp = TempDir::new().expect("Failed to create temp dir");
    let session_file = temp.path().join("session.json");

    {
        let mut store = SessionStore::initialize(FileStorage::new(&session_file));
        let guard = RouteGuard::new(store.reader());
        assert!(guard.resolve(Route::Dashboard).is_redirect());

        let mut auth = AuthWorkflow::new();
        let outcome = auth.submit(&api(&server), &mut store, "hr_manager", "pw").await;
        assert_eq!(
            outcome,
            AuthOutcome::LoggedIn {
                username: "hr_manager".to_string()
            }
        );
        assert_eq!(store.session().token(), Some("jwt-abc"));
        assert_eq!(guard.resolve(Route::Dashboard), Navigation::Render(Route::Dashboard));
    }

    // Restart
    let store = SessionStore::initialize(FileStorage::new(&session_file));
    assert_eq!(store.session().token(), Some("jwt-abc"));
    assert_eq!(store.session().username(), Some("hr_manager"));
}

#[tokio::test]
async fn test_rejected_login_leaves_no_session() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/token"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"detail": "Invalid credentials"})))
        .mount(&server)
        .await;
    let temp = TempDir::new().expect("Failed to create temp dir");
    let session_file = temp.path().join("session.json");

    let mut store = SessionStore::initialize(FileStorage::new(&session_file));
    let mut auth = AuthWorkflow::new();
    let outcome = auth.submit(&api(&server), &mut store, "hr_manager", "nope").await;

    assert_eq!(outcome, AuthOutcome::Rejected("Invalid credentials".to_string()));
    assert!(!store.is_authenticated());
    assert!(!session_file.exists());
}

#[tokio::test]
async fn test_logout_then_restart_is_unauthenticated() {
    let server = MockServer::start().await;
    mount_token(&server, "jwt-abc").await;
    let temp = TempDir::new().expect("Failed to create temp dir");
    let session_file = temp.path().join("session.json");

    let mut store = SessionStore::initialize(FileStorage::new(&session_file));
    AuthWorkflow::new()
        .submit(&api(&server), &mut store, "hr_manager", "pw")
        .await;
    store.logout();
    drop(store);

    let store = SessionStore::initialize(FileStorage::new(&session_file));
    let guard = RouteGuard::new(store.reader());
    assert_eq!(guard.resolve(Route::Dashboard), Navigation::Redirect { to: Route::Auth });
}

// =============================================================================
// Analysis
// =============================================================================

#[tokio::test]
async fn test_analysis_happy_path() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/predict"))
        .and(header("authorization", "Bearer jwt-abc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"churn_probability": 72.5})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/generate-retention-plan"))
        .and(header("authorization", "Bearer jwt-abc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"retention_plan": "Offer a raise."})))
        .expect(1)
        .mount(&server)
        .await;

    let temp = TempDir::new().expect("Failed to create temp dir");
    let mut store = SessionStore::initialize(FileStorage::new(temp.path().join("session.json")));
    store.login("jwt-abc", "hr_manager");

    let mut workflow = AnalysisWorkflow::new();
    let mut labels = Vec::new();
    let outcome = workflow
        .run(&api(&server), &store.reader(), EmployeeRecord::default(), |s| {
            labels.push(s.label())
        })
        .await;

    assert_eq!(outcome, RunOutcome::Finished);
    assert_eq!(labels, vec!["analyzing", "generating plan", "done"]);
    let result = workflow.state().result().unwrap();
    assert_eq!(result.churn_probability, 72.5);
    assert_eq!(result.risk_class(), RiskClass::Critical);
    assert_eq!(workflow.state().plan().unwrap().text, "Offer a raise.");
}

#[tokio::test]
async fn test_prediction_failure_skips_plan() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/predict"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({"detail": "Model not loaded"})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/generate-retention-plan"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"retention_plan": "x"})))
        .expect(0)
        .mount(&server)
        .await;

    let temp = TempDir::new().expect("Failed to create temp dir");
    let mut store = SessionStore::initialize(FileStorage::new(temp.path().join("session.json")));
    store.login("jwt-abc", "hr_manager");

    let mut workflow = AnalysisWorkflow::new();
    workflow
        .run(&api(&server), &store.reader(), EmployeeRecord::default(), |_| {})
        .await;

    assert_eq!(
        workflow.state(),
        &AnalysisState::Failed(Failure::Rejected("Model not loaded".to_string()))
    );
}

#[tokio::test]
async fn test_plan_failure_keeps_result() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/predict"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"churn_probability": 30})))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/generate-retention-plan"))
        .respond_with(ResponseTemplate::new(503).set_body_json(json!({"detail": "Plan generator unavailable"})))
        .mount(&server)
        .await;

    let temp = TempDir::new().expect("Failed to create temp dir");
    let mut store = SessionStore::initialize(FileStorage::new(temp.path().join("session.json")));
    store.login("jwt-abc", "hr_manager");

    let mut workflow = AnalysisWorkflow::new();
    workflow
        .run(&api(&server), &store.reader(), EmployeeRecord::default(), |_| {})
        .await;

    let state = workflow.state();
    assert_eq!(state.result().unwrap().risk_class(), RiskClass::Stable);
    assert!(state.plan().is_none());
    assert_eq!(
        state.failure(),
        Some(&Failure::Rejected("Plan generator unavailable".to_string()))
    );
}

#[tokio::test]
async fn test_expired_token_ends_session() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/predict"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"detail": "Could not validate credentials"})))
        .mount(&server)
        .await;

    let temp = TempDir::new().expect("Failed to create temp dir");
    let session_file = temp.path().join("session.json");
    let mut store = SessionStore::initialize(FileStorage::new(&session_file));
    store.login("stale", "hr_manager");

    let mut workflow = AnalysisWorkflow::new();
    let outcome = workflow
        .run(&api(&server), &store.reader(), EmployeeRecord::default(), |_| {})
        .await;
    assert_eq!(outcome, RunOutcome::SessionExpired);

    // What a host does on expiry
    store.logout();
    workflow.reset();
    assert!(!session_file.exists());
    assert_eq!(workflow.state(), &AnalysisState::Idle);
}
