//! Integration tests for the HTTP handlers
//!
//! Handlers are called directly with an `AppState` wired to in-memory
//! fakes, covering:
//! 1. Plan generation, ownership and persistence
//! 2. Completion passthrough and text extraction
//! 3. Recognition by address and by upload, including cleanup
//! 4. Caller-owned uploads and deletes

use async_trait::async_trait;
use axum::body::Body;
use axum::extract::{FromRequest, Multipart, State};
use axum::http::{header, HeaderMap, HeaderValue, Request, StatusCode};
use axum::Json;
use bytes::Bytes;
use object_store::memory::InMemory;
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use travel_planner_backend::api::ai::{
    generate_plan, invoke_completion, CompletionRequest, GeneratePlanRequest,
};
use travel_planner_backend::api::asr::{recognize_audio, recognize_from_url, RecognizeUrlRequest};
use travel_planner_backend::api::oss::{delete_file, upload_audio, DeleteRequest};
use travel_planner_backend::config::Config;
use travel_planner_backend::dashscope::{
    CompletionEnvelope, CompletionError, CompletionInvoker, Parameters, RecognitionError,
    RecognitionTask, RecognitionTaskClient, TaskStatus,
};
use travel_planner_backend::orchestrator::GeneratedPlanDraft;
use travel_planner_backend::services::{
    AuthenticatedUser, DirectoryError, PersistenceError, PlanRepository, UserDirectory,
};
use travel_planner_backend::state::AppState;
use travel_planner_backend::storage::{OssObjectStore, RemoteObjectStore, StorageError};

// ---------------------------------------------------------------------------
// Fakes
// ---------------------------------------------------------------------------

struct FakeCompletion {
    response: Value,
    calls: AtomicUsize,
}

#[async_trait]
impl CompletionInvoker for FakeCompletion {
    async fn invoke(
        &self,
        _: &str,
        _: Option<&str>,
        _: &Parameters,
        _: &Parameters,
    ) -> Result<CompletionEnvelope, CompletionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(CompletionEnvelope::new(self.response.clone()))
    }
}

/// Replays snapshots; falls back to RUNNING when the script runs out
struct ScriptedRecognizer {
    snapshots: Mutex<VecDeque<(TaskStatus, Option<&'static str>, Option<&'static str>)>>,
    submitted: Mutex<Vec<String>>,
}

#[async_trait]
impl RecognitionTaskClient for ScriptedRecognizer {
    async fn submit(&self, address: &str, _: Option<&str>) -> Result<String, RecognitionError> {
        self.submitted.lock().unwrap().push(address.to_string());
        Ok("T1".to_string())
    }

    async fn query(
        &self,
        task_id: &str,
        _: Option<&str>,
    ) -> Result<RecognitionTask, RecognitionError> {
        let (status, result, message) = self
            .snapshots
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or((TaskStatus::Running, None, None));
        Ok(RecognitionTask {
            task_id: task_id.to_string(),
            status,
            result_address: result.map(str::to_string),
            failure_message: message.map(str::to_string),
        })
    }

    async fn fetch_transcript(&self, _: &str) -> Result<String, RecognitionError> {
        Ok("go to the west lake\nthen eat".to_string())
    }
}

/// Real OSS store over an in-memory backend, recording deletes
struct RecordingStore {
    inner: OssObjectStore,
    deleted: Mutex<Vec<String>>,
}

#[async_trait]
impl RemoteObjectStore for RecordingStore {
    async fn store(&self, bytes: Bytes, extension: &str) -> Result<String, StorageError> {
        self.inner.store(bytes, extension).await
    }

    async fn delete(&self, address: &str) -> bool {
        self.deleted.lock().unwrap().push(address.to_string());
        self.inner.delete(address).await
    }
}

struct FakeUsers;

#[async_trait]
impl UserDirectory for FakeUsers {
    async fn get_user(&self, access_token: &str) -> Result<AuthenticatedUser, DirectoryError> {
        if access_token == "directory-down" {
            return Err(DirectoryError::Transport("connection refused".to_string()));
        }
        if access_token != "good-token" {
            return Err(DirectoryError::InvalidToken("invalid JWT".to_string()));
        }
        Ok(AuthenticatedUser {
            id: "user-1".to_string(),
            email: Some("traveler@example.com".to_string()),
            username: "wanderer".to_string(),
            access_token: access_token.to_string(),
        })
    }
}

#[derive(Default)]
struct RecordingPlans {
    created: Mutex<Vec<(GeneratedPlanDraft, String, String)>>,
}

#[async_trait]
impl PlanRepository for RecordingPlans {
    async fn create_plan(
        &self,
        draft: &GeneratedPlanDraft,
        owner_id: &str,
        access_token: &str,
    ) -> Result<String, PersistenceError> {
        self.created.lock().unwrap().push((
            draft.clone(),
            owner_id.to_string(),
            access_token.to_string(),
        ));
        Ok("plan-1".to_string())
    }
}

// ---------------------------------------------------------------------------
// Harness
// ---------------------------------------------------------------------------

struct Harness {
    state: Arc<AppState>,
    completion: Arc<FakeCompletion>,
    recognizer: Arc<ScriptedRecognizer>,
    store: Arc<RecordingStore>,
    plans: Arc<RecordingPlans>,
}

fn harness_with(
    completion_text: Value,
    script: Vec<(TaskStatus, Option<&'static str>, Option<&'static str>)>,
    with_store: bool,
) -> Harness {
    let mut config = Config::from_env();
    config.recognition.poll_max_attempts = 5;
    config.recognition.poll_interval_ms = 1;
    config.recognition.request_ceiling_secs = 5;

    let completion = Arc::new(FakeCompletion {
        response: completion_text,
        calls: AtomicUsize::new(0),
    });
    let recognizer = Arc::new(ScriptedRecognizer {
        snapshots: Mutex::new(script.into()),
        submitted: Mutex::new(Vec::new()),
    });
    let store = Arc::new(RecordingStore {
        inner: OssObjectStore::with_backend(
            Arc::new(InMemory::new()),
            "travel",
            "oss-cn-hangzhou",
            "audio",
        ),
        deleted: Mutex::new(Vec::new()),
    });
    let plans = Arc::new(RecordingPlans::default());

    let state = AppState::new(
        config,
        completion.clone(),
        recognizer.clone(),
        with_store.then(|| store.clone() as Arc<dyn RemoteObjectStore>),
        Arc::new(FakeUsers),
        plans.clone(),
    );

    Harness {
        state: Arc::new(state),
        completion,
        recognizer,
        store,
        plans,
    }
}

fn harness() -> Harness {
    harness_with(json!({}), vec![], true)
}

fn bearer(token: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(
        header::AUTHORIZATION,
        HeaderValue::from_str(&format!("Bearer {}", token)).unwrap(),
    );
    headers
}

/// Build a multipart body from `(name, filename, data)` parts
async fn multipart(parts: &[(&str, Option<&str>, &str)]) -> Multipart {
    let boundary = "test-boundary";
    let mut body = Vec::new();
    for (name, filename, data) in parts {
        body.extend_from_slice(format!("--{}\r\n", boundary).as_bytes());
        match filename {
            Some(filename) => body.extend_from_slice(
                format!(
                    "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: application/octet-stream\r\n\r\n",
                    name, filename
                )
                .as_bytes(),
            ),
            None => body.extend_from_slice(
                format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", name).as_bytes(),
            ),
        }
        body.extend_from_slice(data.as_bytes());
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", boundary).as_bytes());

    let request = Request::builder()
        .method("POST")
        .uri("/")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", boundary),
        )
        .body(Body::from(body))
        .unwrap();

    Multipart::from_request(request, &()).await.unwrap()
}

fn plan_request(prompt: &str) -> GeneratePlanRequest {
    GeneratePlanRequest {
        prompt: prompt.to_string(),
        api_key: Some("caller-key".to_string()),
        parameters: None,
    }
}

// ---------------------------------------------------------------------------
// Plan generation
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_generate_plan_persists_defaults_for_caller() {
    let h = harness_with(
        json!({"output": {"text": "{\"title\": \"  \", \"days\": 5}"}}),
        vec![],
        true,
    );

    let Json(response) = generate_plan(
        State(h.state.clone()),
        bearer("good-token"),
        Json(plan_request("Five days somewhere")),
    )
    .await
    .unwrap();

    assert_eq!(response.plan_id, "plan-1");

    let created = h.plans.created.lock().unwrap();
    assert_eq!(created.len(), 1);
    let (draft, owner, token) = &created[0];
    assert_eq!(owner, "user-1");
    assert_eq!(token, "good-token");
    assert_eq!(draft.title, "Untitled Plan");
    assert_eq!(draft.destination, "Unknown Destination");
    assert_eq!(draft.days, 5);
    assert_eq!(draft.budget, 0.0);
    assert_eq!(draft.travelers, 1);
    assert!(draft.preferences.is_empty());
    assert_eq!(draft.start_date.len(), 10);
}

#[tokio::test]
async fn test_generate_plan_requires_bearer_token() {
    let h = harness();

    let err = generate_plan(
        State(h.state.clone()),
        HeaderMap::new(),
        Json(plan_request("Anywhere")),
    )
    .await
    .unwrap_err();
    assert_eq!(err.status_code(), StatusCode::UNAUTHORIZED);

    let err = generate_plan(
        State(h.state.clone()),
        bearer("expired"),
        Json(plan_request("Anywhere")),
    )
    .await
    .unwrap_err();
    assert_eq!(err.status_code(), StatusCode::UNAUTHORIZED);

    assert_eq!(h.completion.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_generate_plan_directory_outage_is_bad_gateway() {
    let h = harness();

    let err = generate_plan(
        State(h.state.clone()),
        bearer("directory-down"),
        Json(plan_request("Anywhere")),
    )
    .await
    .unwrap_err();

    assert_eq!(err.status_code(), StatusCode::BAD_GATEWAY);
    assert_eq!(h.completion.calls.load(Ordering::SeqCst), 0);
    assert!(h.plans.created.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_generate_plan_rejects_empty_prompt() {
    let h = harness();

    let err = generate_plan(State(h.state.clone()), bearer("good-token"), Json(plan_request("  ")))
        .await
        .unwrap_err();

    assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    assert_eq!(h.completion.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_generate_plan_malformed_text_is_not_persisted() {
    let h = harness_with(
        json!({"output": {"text": "Day 1: arrive. Day 2: explore."}}),
        vec![],
        true,
    );

    let err = generate_plan(
        State(h.state.clone()),
        bearer("good-token"),
        Json(plan_request("Two days")),
    )
    .await
    .unwrap_err();

    assert_eq!(err.status_code(), StatusCode::BAD_GATEWAY);
    assert!(h.plans.created.lock().unwrap().is_empty());
}

// ---------------------------------------------------------------------------
// Completion passthrough
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_completion_parses_json_text() {
    let raw = json!({"output": {"text": "{\"destination\": \"Xi'an\"}"}, "request_id": "r-1"});
    let h = harness_with(raw.clone(), vec![], true);

    let Json(response) = invoke_completion(
        State(h.state.clone()),
        Json(CompletionRequest {
            prompt: "Plan Xi'an".to_string(),
            api_key: None,
            parameters: None,
            debug: None,
            extract_text: true,
        }),
    )
    .await
    .unwrap();

    assert_eq!(response.data, raw);
    assert_eq!(response.text, Some(json!({"destination": "Xi'an"})));
}

#[tokio::test]
async fn test_completion_plain_text_and_opt_out() {
    let h = harness_with(json!({"output": {"text": "Just words"}}), vec![], true);

    let request = |extract_text| CompletionRequest {
        prompt: "Say something".to_string(),
        api_key: None,
        parameters: None,
        debug: None,
        extract_text,
    };

    let Json(response) = invoke_completion(State(h.state.clone()), Json(request(true)))
        .await
        .unwrap();
    assert_eq!(response.text, Some(json!("Just words")));

    let Json(response) = invoke_completion(State(h.state.clone()), Json(request(false)))
        .await
        .unwrap();
    assert_eq!(response.text, None);
}

#[test]
fn test_completion_request_defaults_extract_text() {
    let request: CompletionRequest = serde_json::from_value(json!({"prompt": "hi"})).unwrap();
    assert!(request.extract_text);
    assert!(request.parameters.is_none());
}

// ---------------------------------------------------------------------------
// Recognition
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_recognize_url_does_not_delete_caller_object() {
    let h = harness_with(
        json!({}),
        vec![
            (TaskStatus::Pending, None, None),
            (TaskStatus::Succeeded, Some("https://results/r1.json"), None),
        ],
        true,
    );

    let Json(response) = recognize_from_url(
        State(h.state.clone()),
        Json(RecognizeUrlRequest {
            file_url: "https://travel.oss-cn-hangzhou.aliyuncs.com/audio/mine.wav".to_string(),
            api_key: None,
        }),
    )
    .await
    .unwrap();

    assert_eq!(response.text, "go to the west lake\nthen eat");
    assert!(h.store.deleted.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_recognize_url_rejects_blank_address() {
    let h = harness();

    let err = recognize_from_url(
        State(h.state.clone()),
        Json(RecognizeUrlRequest {
            file_url: " ".to_string(),
            api_key: None,
        }),
    )
    .await
    .unwrap_err();

    assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    assert!(h.recognizer.submitted.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_recognize_upload_cleans_up_on_success() {
    let h = harness_with(
        json!({}),
        vec![(TaskStatus::Succeeded, Some("https://results/r1.json"), None)],
        true,
    );
    let form = multipart(&[
        ("file", Some("voice.mp3"), "ID3 audio bytes"),
        ("api_key", None, "caller-key"),
    ])
    .await;

    let Json(response) = recognize_audio(State(h.state.clone()), form).await.unwrap();

    assert_eq!(response.text, "go to the west lake\nthen eat");

    let submitted = h.recognizer.submitted.lock().unwrap().clone();
    assert_eq!(submitted.len(), 1);
    assert!(submitted[0].starts_with("https://travel.oss-cn-hangzhou.aliyuncs.com/audio/"));
    assert!(submitted[0].ends_with(".mp3"));
    assert_eq!(*h.store.deleted.lock().unwrap(), submitted);
}

#[tokio::test]
async fn test_recognize_upload_cleans_up_on_failure() {
    let h = harness_with(
        json!({}),
        vec![(TaskStatus::Failed, None, Some("Audio format not supported"))],
        true,
    );
    let form = multipart(&[("file", Some("recording"), "RIFF....WAVE")]).await;

    let err = recognize_audio(State(h.state.clone()), form)
        .await
        .unwrap_err();

    assert_eq!(err.status_code(), StatusCode::BAD_GATEWAY);
    assert!(err.to_string().contains("Audio format not supported"));

    let deleted = h.store.deleted.lock().unwrap().clone();
    assert_eq!(deleted.len(), 1);
    assert!(deleted[0].ends_with(".wav"));
}

#[tokio::test]
async fn test_recognize_upload_times_out_and_cleans_up() {
    // Never leaves RUNNING; the attempt budget runs out
    let h = harness_with(json!({}), vec![], true);
    let form = multipart(&[("file", Some("long.wav"), "RIFF")]).await;

    let err = recognize_audio(State(h.state.clone()), form)
        .await
        .unwrap_err();

    assert_eq!(err.status_code(), StatusCode::GATEWAY_TIMEOUT);
    assert_eq!(h.store.deleted.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_recognize_upload_requires_file() {
    let h = harness();
    let form = multipart(&[("api_key", None, "caller-key")]).await;

    let err = recognize_audio(State(h.state.clone()), form)
        .await
        .unwrap_err();

    assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    assert!(h.recognizer.submitted.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_recognize_upload_without_storage() {
    let h = harness_with(json!({}), vec![], false);
    let form = multipart(&[("file", Some("voice.wav"), "RIFF")]).await;

    let err = recognize_audio(State(h.state.clone()), form)
        .await
        .unwrap_err();

    assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
}

// ---------------------------------------------------------------------------
// Caller-owned objects
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_upload_then_delete() {
    let h = harness();
    let form = multipart(&[("file", Some("note.m4a"), "....ftypM4A")]).await;

    let Json(uploaded) = upload_audio(State(h.state.clone()), form).await.unwrap();
    assert!(uploaded.file_url.ends_with(".m4a"));
    assert!(h.store.deleted.lock().unwrap().is_empty());

    let Json(deleted) = delete_file(
        State(h.state.clone()),
        Json(DeleteRequest {
            file_url: uploaded.file_url.clone(),
        }),
    )
    .await
    .unwrap();
    assert!(deleted.success);
    assert_eq!(*h.store.deleted.lock().unwrap(), vec![uploaded.file_url]);
}

#[tokio::test]
async fn test_delete_foreign_address_reports_failure() {
    let h = harness();

    let Json(response) = delete_file(
        State(h.state.clone()),
        Json(DeleteRequest {
            file_url: "https://elsewhere.example.com/audio/x.wav".to_string(),
        }),
    )
    .await
    .unwrap();

    assert!(!response.success);
}

#[tokio::test]
async fn test_recognition_ceiling_from_config() {
    let h = harness();
    assert_eq!(h.state.recognition_ceiling(), Duration::from_secs(5));
}
