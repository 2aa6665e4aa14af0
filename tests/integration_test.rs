use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use exam_tutor::api::{router, AppState};
use exam_tutor::clients::{
    AnalyzeBackend, AssetProbe, ChatModel, GatewayClient, HttpAssetProbe, OpenAiChatModel,
};
use exam_tutor::error::{AppError, AppResult};
use exam_tutor::models::{AnalyzeRequest, ContentPart};
use exam_tutor::services::tutor_service::TRANSLATION_PROMPT;
use exam_tutor::services::{ImageProber, TutoringGateway};
use exam_tutor::utils::logging;
use exam_tutor::workflow::TutorSession;
use exam_tutor::Config;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tower::ServiceExt;

/// 解题时复述官方答案，翻译时加上中文前缀
struct FakeModel {
    fail_with: Option<&'static str>,
    seen: Mutex<Vec<Vec<ContentPart>>>,
}

impl FakeModel {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            fail_with: None,
            seen: Mutex::new(Vec::new()),
        })
    }

    fn failing(message: &'static str) -> Arc<Self> {
        Arc::new(Self {
            fail_with: Some(message),
            seen: Mutex::new(Vec::new()),
        })
    }
}

#[async_trait]
impl ChatModel for FakeModel {
    fn model_name(&self) -> &str {
        "fake"
    }

    async fn complete(&self, system: &str, content: &[ContentPart]) -> AppResult<String> {
        if let Some(message) = self.fail_with {
            return Err(AppError::upstream(message));
        }
        self.seen.lock().unwrap().push(content.to_vec());

        let text = content[0].as_text().unwrap_or_default();
        if system == TRANSLATION_PROMPT {
            return Ok(format!("中文翻译：{}", text));
        }
        let answer = text
            .lines()
            .find_map(|l| l.strip_prefix("The official answer is: "))
            .unwrap_or("unknown");
        Ok(format!("Add 2 and 3 to get {}.\nAnswer: {}", answer, answer))
    }
}

/// 只有 worksheet-a 第 1 页存在
struct OnePage;

#[async_trait]
impl AssetProbe for OnePage {
    async fn exists(&self, url: &str) -> bool {
        url.ends_with("worksheet-apage1.png")
    }
}

fn app(model: Arc<FakeModel>) -> axum::Router {
    let config = Config::default();
    let prober = ImageProber::new(Arc::new(OnePage), config.exam_assets_url(), &config.probe);
    let gateway = Arc::new(TutoringGateway::new(model, prober, &config));
    router(AppState::new(gateway, "fake"), &config)
}

async fn post_json(app: axum::Router, body: Value) -> (StatusCode, Value) {
    let response = app
        .oneshot(
            Request::post("/api/analyze")
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn test_official_answer_end_to_end() {
    logging::init_test();

    let (status, body) = post_json(
        app(FakeModel::new()),
        json!({ "mode": "official_answer", "question": "2+3", "officialAnswer": "5" }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let english = body["response"].as_str().unwrap();
    let chinese = body["translated"].as_str().unwrap();
    assert!(!english.is_empty() && english.contains('5'));
    assert!(chinese.contains("中文"));
}

#[tokio::test]
async fn test_missing_official_answer_is_bad_request() {
    let (status, body) = post_json(
        app(FakeModel::new()),
        json!({ "mode": "official_answer", "question": "2+3" }),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({ "error": "Missing question or official answer." }));
}

#[tokio::test]
async fn test_untagged_official_answer_body() {
    let (status, body) = post_json(
        app(FakeModel::new()),
        json!({ "question": "2+3", "officialAnswer": "5" }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert!(body["response"].as_str().unwrap().contains('5'));
    assert!(!body["translated"].as_str().unwrap().is_empty());
}

#[tokio::test]
async fn test_untagged_question_without_answer_is_bad_request() {
    let (status, body) = post_json(app(FakeModel::new()), json!({ "question": "2+3" })).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({ "error": "Missing question or official answer." }));
}

#[tokio::test]
async fn test_untagged_prompt_and_messages_body() {
    let model = FakeModel::new();
    let (status, _) = post_json(
        app(model.clone()),
        json!({
            "prompt": "Q1",
            "messages": [
                { "type": "text", "text": "Q1" },
                { "type": "image_url", "image_url": { "url": "/exam/math/worksheet-apage1.png" } }
            ]
        }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(model.seen.lock().unwrap()[0].len(), 2);
}

#[tokio::test]
async fn test_get_is_method_not_allowed() {
    let response = app(FakeModel::new())
        .oneshot(Request::get("/api/analyze").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn test_upstream_failure_carries_detail() {
    let (status, body) = post_json(
        app(FakeModel::failing("You exceeded your current quota")),
        json!({ "mode": "official_answer", "question": "2+3", "officialAnswer": "5" }),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        body,
        json!({ "error": "Internal server error", "detail": "You exceeded your current quota" })
    );
}

#[tokio::test]
async fn test_exam_page_missing_image_is_not_found() {
    let model = FakeModel::new();
    let (status, body) = post_json(
        app(model.clone()),
        json!({ "mode": "exam_page", "examId": "worksheet-a", "page": 2, "officialAnswer": "3.14" }),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].as_str().unwrap().contains("worksheet-apage2.png"));
    assert!(model.seen.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_exam_prompt_attaches_discovered_pages() {
    let model = FakeModel::new();
    let (status, _) = post_json(
        app(model.clone()),
        json!({ "mode": "exam_prompt", "prompt": "Q1", "examId": "worksheet-a" }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let seen = model.seen.lock().unwrap();
    assert_eq!(seen[0].len(), 2);
    assert!(seen[0][1].image_url().unwrap().ends_with("/exam/math/worksheet-apage1.png"));
}

/// 真实监听端口：静态图片 + HEAD 探测 + 网关客户端 + 会话
#[tokio::test]
async fn test_session_against_running_server() {
    let assets = tempfile::tempdir().unwrap();
    for page in [1, 2] {
        std::fs::write(assets.path().join(format!("worksheet-cpage{}.png", page)), b"png").unwrap();
    }

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base_url = format!("http://{}", listener.local_addr().unwrap());
    let config = Config {
        public_base_url: base_url.clone(),
        exam_assets_dir: assets.path().to_string_lossy().into_owned(),
        ..Config::default()
    };

    let model = FakeModel::new();
    let http_probe = Arc::new(HttpAssetProbe::new(Duration::from_secs(2)).unwrap());
    let prober = ImageProber::new(http_probe.clone(), config.exam_assets_url(), &config.probe);
    let gateway = Arc::new(TutoringGateway::new(model.clone(), prober, &config));
    let server = router(AppState::new(gateway, "fake"), &config);
    tokio::spawn(async move {
        axum::serve(listener, server).await.unwrap();
    });

    let backend: Arc<dyn AnalyzeBackend> = Arc::new(GatewayClient::new(&base_url));
    let session_prober = ImageProber::new(http_probe, config.exam_assets_url(), &config.probe);
    let mut session = TutorSession::new(session_prober, backend);
    session.set_exam("worksheet-c");

    let payload = session.submit_question("Q4").await;
    assert!(payload.answer_html.contains("<strong>Answer: unknown</strong>"));
    assert_eq!(session.current_exam().unwrap().page_count, Some(2));
    assert_eq!(model.seen.lock().unwrap()[0].len(), 3);
}

#[tokio::test]
async fn test_gateway_client_maps_validation_error() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base_url = format!("http://{}", listener.local_addr().unwrap());
    let server = app(FakeModel::new());
    tokio::spawn(async move {
        axum::serve(listener, server).await.unwrap();
    });

    let err = GatewayClient::new(&base_url)
        .analyze(AnalyzeRequest::exam_prompt("", "worksheet-a"))
        .await
        .unwrap_err();
    assert_eq!(err.status_code(), 400);
    assert_eq!(err.to_string(), "Missing prompt or exam id.");
}

#[tokio::test]
#[ignore] // 默认忽略，需要 OPENAI_API_KEY：cargo test -- --ignored
async fn test_live_official_answer() {
    logging::init_test();

    let config = Config::from_env();
    let prober = ImageProber::new(
        Arc::new(HttpAssetProbe::new(Duration::from_secs(5)).unwrap()),
        config.exam_assets_url(),
        &config.probe,
    );
    let gateway = TutoringGateway::new(Arc::new(OpenAiChatModel::new(&config)), prober, &config);

    let response = gateway
        .handle(AnalyzeRequest::official_answer("2+3", "5"))
        .await
        .expect("模型调用失败");

    assert!(response.english_text.contains('5'));
    assert!(!response.chinese_text.is_empty());
}
