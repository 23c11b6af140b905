use std::sync::Arc;

use actix_web::{http::StatusCode, test, App};
use futures_util::StreamExt;
use object_store::memory::InMemory;
use uuid::Uuid;

use crate::{
    auth::TokenAuthority,
    config::configure_without_clap,
    configure_endpoints,
    media::{ArcMediaTools, Toolchain},
    repo::{sled::SledRepo, ArcRepo},
    state::State,
    store::Store,
    process::Tool,
    test_tools::{ffprobe_reporting, stub_folder, stub_tool, COPY_FFMPEG, TRUNCATING_FFMPEG},
    tmp_file::{ArcTmpDir, TmpDir, TmpFolder},
};

const BOUNDARY: &str = "reelhouse-test-boundary";
const UPLOAD: &[u8] = b"pretend this is an mp4 with its moov atom at the end";

struct Harness {
    state: State,
    tokens: TokenAuthority,
    _stub_dir: ArcTmpDir,
    _stubs: TmpFolder,
}

impl Harness {
    async fn new() -> Self {
        Self::with_tools(|stubs| {
            Toolchain::new(
                stub_tool(stubs, "ffprobe", &ffprobe_reporting(1280, 720)),
                stub_tool(stubs, "ffmpeg", COPY_FFMPEG),
                5,
                2,
            )
        })
        .await
    }

    async fn with_tools(tools: impl FnOnce(&TmpFolder) -> Toolchain) -> Self {
        let config = configure_without_clap(
            None::<&str>,
            serde_json::json!({ "auth": { "secret": "hunter2" } }),
            None::<&str>,
        )
        .expect("configure");

        let tmp_dir = TmpDir::init(std::env::temp_dir().join("reelhouse-http-tests"))
            .await
            .expect("tmp dir");

        let db = sled::Config::new()
            .temporary(true)
            .open()
            .expect("temporary db");
        let repo: ArcRepo = Arc::new(SledRepo::new(db).expect("repo"));

        let store = Store::new(
            Arc::new(InMemory::new()),
            "http://localhost:8080/assets/".parse().expect("url"),
            true,
        );

        let (stub_dir, stubs) = stub_folder().await;
        let tools: ArcMediaTools = Arc::new(tools(&stubs));

        Harness {
            state: State {
                config,
                tmp_dir,
                repo,
                store,
                tools,
            },
            tokens: TokenAuthority::new("hunter2"),
            _stub_dir: stub_dir,
            _stubs: stubs,
        }
    }

    fn bearer(&self, user_id: Uuid) -> (&'static str, String) {
        let token = self
            .tokens
            .issue(user_id, time::Duration::hours(1))
            .expect("issue");

        ("Authorization", format!("Bearer {token}"))
    }

    fn leftover_files(&self) -> usize {
        std::fs::read_dir(self.state.tmp_dir.path())
            .expect("read tmp dir")
            .count()
    }

    async fn published(&self) -> Vec<String> {
        self.state
            .store
            .inner()
            .list(None)
            .map(|res| res.expect("listing").location.to_string())
            .collect()
            .await
    }
}

macro_rules! app {
    ($harness:expr) => {{
        let state = $harness.state.clone();
        let tokens = $harness.tokens.clone();

        test::init_service(App::new().configure(move |sc| configure_endpoints(sc, state, tokens)))
            .await
    }};
}

fn multipart(field: &str, content_type: &str, bytes: &[u8]) -> Vec<u8> {
    let mut body = format!(
        "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{field}\"; filename=\"clip.mp4\"\r\nContent-Type: {content_type}\r\n\r\n"
    )
    .into_bytes();

    body.extend_from_slice(bytes);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

    body
}

fn multipart_without_content_type(field: &str, bytes: &[u8]) -> Vec<u8> {
    let mut body = format!(
        "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{field}\"; filename=\"clip.mp4\"\r\n\r\n"
    )
    .into_bytes();

    body.extend_from_slice(bytes);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

    body
}

fn multipart_header() -> (&'static str, String) {
    (
        "Content-Type",
        format!("multipart/form-data; boundary={BOUNDARY}"),
    )
}

#[actix_web::test]
async fn healthz_reports_ok() {
    let harness = Harness::new().await;
    let app = app!(harness);

    let res = test::call_service(&app, test::TestRequest::get().uri("/healthz").to_request()).await;

    assert_eq!(res.status(), StatusCode::OK);
}

#[actix_web::test]
async fn creating_requires_a_token() {
    let harness = Harness::new().await;
    let app = app!(harness);

    let req = test::TestRequest::post()
        .uri("/api/videos")
        .set_json(serde_json::json!({ "title": "Sunset" }))
        .to_request();
    let res = test::call_service(&app, req).await;

    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let body: serde_json::Value = test::read_body_json(res).await;
    assert_eq!(body["code"], "missing-token");
}

#[actix_web::test]
async fn forged_token_is_unauthorized() {
    let harness = Harness::new().await;
    let app = app!(harness);

    let forged = TokenAuthority::new("swordfish")
        .issue(Uuid::new_v4(), time::Duration::hours(1))
        .expect("issue");

    let req = test::TestRequest::post()
        .uri("/api/videos")
        .insert_header(("Authorization", format!("Bearer {forged}")))
        .set_json(serde_json::json!({ "title": "Sunset" }))
        .to_request();
    let res = test::call_service(&app, req).await;

    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let body: serde_json::Value = test::read_body_json(res).await;
    assert_eq!(body["code"], "invalid-token");
}

#[actix_web::test]
async fn create_then_fetch() {
    let harness = Harness::new().await;
    let app = app!(harness);
    let user_id = Uuid::new_v4();

    let req = test::TestRequest::post()
        .uri("/api/videos")
        .insert_header(harness.bearer(user_id))
        .set_json(serde_json::json!({ "title": "Sunset", "description": "at the beach" }))
        .to_request();
    let res = test::call_service(&app, req).await;

    assert_eq!(res.status(), StatusCode::CREATED);

    let created: serde_json::Value = test::read_body_json(res).await;
    assert_eq!(created["user_id"], user_id.to_string());
    assert_eq!(created["title"], "Sunset");
    assert!(created["video_url"].is_null());

    let id = created["id"].as_str().expect("id");

    let req = test::TestRequest::get()
        .uri(&format!("/api/videos/{id}"))
        .to_request();
    let fetched: serde_json::Value = test::call_and_read_body_json(&app, req).await;

    assert_eq!(fetched, created);
}

#[actix_web::test]
async fn malformed_body_is_a_bad_request() {
    let harness = Harness::new().await;
    let app = app!(harness);

    let req = test::TestRequest::post()
        .uri("/api/videos")
        .insert_header(harness.bearer(Uuid::new_v4()))
        .set_json(serde_json::json!({ "description": "no title" }))
        .to_request();
    let res = test::call_service(&app, req).await;

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let body: serde_json::Value = test::read_body_json(res).await;
    assert_eq!(body["code"], "invalid-request-body");
}

#[actix_web::test]
async fn fetching_unknown_or_malformed_ids() {
    let harness = Harness::new().await;
    let app = app!(harness);

    let req = test::TestRequest::get()
        .uri(&format!("/api/videos/{}", Uuid::now_v7()))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let req = test::TestRequest::get()
        .uri("/api/videos/not-a-uuid")
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let body: serde_json::Value = test::read_body_json(res).await;
    assert_eq!(body["code"], "invalid-video-id");
}

#[cfg(unix)]
#[actix_web::test]
async fn upload_publishes_and_links_the_video() {
    let harness = Harness::new().await;
    let app = app!(harness);
    let user_id = Uuid::new_v4();

    let req = test::TestRequest::post()
        .uri("/api/videos")
        .insert_header(harness.bearer(user_id))
        .set_json(serde_json::json!({ "title": "Sunset" }))
        .to_request();
    let created: serde_json::Value = test::call_and_read_body_json(&app, req).await;
    let id = created["id"].as_str().expect("id");

    let req = test::TestRequest::post()
        .uri(&format!("/api/video_upload/{id}"))
        .insert_header(harness.bearer(user_id))
        .insert_header(multipart_header())
        .set_payload(multipart("video", "video/mp4", UPLOAD))
        .to_request();
    let res = test::call_service(&app, req).await;

    assert_eq!(res.status(), StatusCode::OK);

    let updated: serde_json::Value = test::read_body_json(res).await;
    let url = updated["video_url"].as_str().expect("video url");
    assert!(
        url.starts_with("http://localhost:8080/assets/landscape/"),
        "{url}"
    );
    assert!(url.ends_with(".mp4"), "{url}");

    let key = url.trim_start_matches("http://localhost:8080/assets/");
    assert_eq!(harness.published().await, vec![key.to_string()]);

    let req = test::TestRequest::get()
        .uri(&format!("/assets/{key}"))
        .to_request();
    let res = test::call_service(&app, req).await;

    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(
        res.headers()
            .get("Content-Type")
            .and_then(|value| value.to_str().ok()),
        Some("video/mp4")
    );
    assert_eq!(test::read_body(res).await.as_ref(), UPLOAD);

    let req = test::TestRequest::get()
        .uri(&format!("/api/videos/{id}"))
        .to_request();
    let fetched: serde_json::Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(fetched["video_url"], url);
}

#[actix_web::test]
async fn upload_checks_run_before_the_body_is_read() {
    let harness = Harness::new().await;
    let app = app!(harness);
    let owner = Uuid::new_v4();

    let req = test::TestRequest::post()
        .uri("/api/videos")
        .insert_header(harness.bearer(owner))
        .set_json(serde_json::json!({ "title": "Sunset" }))
        .to_request();
    let created: serde_json::Value = test::call_and_read_body_json(&app, req).await;
    let id = created["id"].as_str().expect("id").to_string();

    let cases = [
        ("not-a-uuid".to_string(), Some(owner), StatusCode::BAD_REQUEST, "invalid-video-id"),
        (id.clone(), None, StatusCode::UNAUTHORIZED, "missing-token"),
        (
            Uuid::now_v7().to_string(),
            Some(owner),
            StatusCode::NOT_FOUND,
            "video-not-found",
        ),
        (id, Some(Uuid::new_v4()), StatusCode::UNAUTHORIZED, "not-owner"),
    ];

    for (video_id, caller, status, code) in cases {
        let mut req = test::TestRequest::post()
            .uri(&format!("/api/video_upload/{video_id}"))
            .insert_header(multipart_header())
            .set_payload(multipart("video", "video/mp4", UPLOAD));

        if let Some(caller) = caller {
            req = req.insert_header(harness.bearer(caller));
        }

        let res = test::call_service(&app, req.to_request()).await;
        assert_eq!(res.status(), status, "{code}");

        let body: serde_json::Value = test::read_body_json(res).await;
        assert_eq!(body["code"], code);
    }

    assert!(harness.published().await.is_empty());
}

#[actix_web::test]
async fn upload_of_other_content_types_is_rejected() {
    let harness = Harness::new().await;
    let app = app!(harness);
    let user_id = Uuid::new_v4();

    let req = test::TestRequest::post()
        .uri("/api/videos")
        .insert_header(harness.bearer(user_id))
        .set_json(serde_json::json!({ "title": "Sunset" }))
        .to_request();
    let created: serde_json::Value = test::call_and_read_body_json(&app, req).await;
    let id = created["id"].as_str().expect("id");

    let req = test::TestRequest::post()
        .uri(&format!("/api/video_upload/{id}"))
        .insert_header(harness.bearer(user_id))
        .insert_header(multipart_header())
        .set_payload(multipart("video", "video/webm", UPLOAD))
        .to_request();
    let res = test::call_service(&app, req).await;

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert!(harness.published().await.is_empty());

    let req = test::TestRequest::get()
        .uri(&format!("/api/videos/{id}"))
        .to_request();
    let fetched: serde_json::Value = test::call_and_read_body_json(&app, req).await;
    assert!(fetched["video_url"].is_null());
}

#[actix_web::test]
async fn missing_asset_is_not_found() {
    let harness = Harness::new().await;
    let app = app!(harness);

    let req = test::TestRequest::get()
        .uri("/assets/landscape/0000.mp4")
        .to_request();
    let res = test::call_service(&app, req).await;

    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let body: serde_json::Value = test::read_body_json(res).await;
    assert_eq!(body["code"], "asset-not-found");
}

async fn upload_as_owner(harness: &Harness, body: Vec<u8>) -> (StatusCode, serde_json::Value) {
    let app = app!(harness);
    let owner = Uuid::new_v4();

    let req = test::TestRequest::post()
        .uri("/api/videos")
        .insert_header(harness.bearer(owner))
        .set_json(serde_json::json!({ "title": "Sunset" }))
        .to_request();
    let created: serde_json::Value = test::call_and_read_body_json(&app, req).await;
    let id = created["id"].as_str().expect("id");

    let req = test::TestRequest::post()
        .uri(&format!("/api/video_upload/{id}"))
        .insert_header(harness.bearer(owner))
        .insert_header(multipart_header())
        .set_payload(body)
        .to_request();
    let res = test::call_service(&app, req).await;
    let status = res.status();

    (status, test::read_body_json(res).await)
}

#[actix_web::test]
async fn upload_part_without_content_type_is_rejected() {
    let harness = Harness::new().await;

    let (status, body) =
        upload_as_owner(&harness, multipart_without_content_type("video", UPLOAD)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "unsupported-content-type");
    assert!(harness.published().await.is_empty());
    assert_eq!(harness.leftover_files(), 0);
}

#[actix_web::test]
async fn missing_ffprobe_is_an_internal_error() {
    let harness = Harness::with_tools(|stubs| {
        Toolchain::new(
            Tool::new("/nonexistent/ffprobe"),
            stub_tool(stubs, "ffmpeg", COPY_FFMPEG),
            5,
            2,
        )
    })
    .await;

    let (status, body) = upload_as_owner(&harness, multipart("video", "video/mp4", UPLOAD)).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["code"], "command-not-found");
    assert!(harness.published().await.is_empty());
    assert_eq!(harness.leftover_files(), 0);
}

#[cfg(unix)]
#[actix_web::test]
async fn empty_rewrite_is_an_internal_error() {
    let harness = Harness::with_tools(|stubs| {
        Toolchain::new(
            stub_tool(stubs, "ffprobe", &ffprobe_reporting(1280, 720)),
            stub_tool(stubs, "ffmpeg", TRUNCATING_FFMPEG),
            5,
            2,
        )
    })
    .await;

    let (status, body) = upload_as_owner(&harness, multipart("video", "video/mp4", UPLOAD)).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["code"], "processing-verification");
    assert!(harness.published().await.is_empty());
    assert_eq!(harness.leftover_files(), 0);
}
