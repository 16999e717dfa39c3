//! Test server harness: a gateway with a stub encoder plus a mock
//! case-management service that records login and clearance calls.

use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use axum::{
    Json, Router,
    extract::{Path, State},
    http::{HeaderMap, header},
    routing::post,
};
use parking_lot::Mutex;
use tempfile::TempDir;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use leafgate::clearance::{ClearanceClient, ClearanceConfig};
use leafgate::concepts::ConceptBank;
use leafgate::embedding::{ClipEncoder, EncoderConfig};
use leafgate::gateway::{HandlerState, create_router_with_state};
use leafgate::scoring::{ScoringMode, SimilarityScorer};

/// Bearer token handed out by the mock login endpoint.
pub const CASE_TOKEN: &str = "case-token";

/// Threshold below every possible score: every image matches.
pub const MATCH_ALL: f32 = -1.0;
/// Threshold above every possible score: nothing matches.
pub const MATCH_NONE: f32 = 1.0;

#[derive(Debug, Clone)]
pub struct ClearanceCall {
    pub listing_id: String,
    pub bearer: Option<String>,
}

/// Shared call log for the mock case-management service.
#[derive(Clone, Default)]
pub struct CaseManagement {
    pub logins: Arc<AtomicUsize>,
    pub clearances: Arc<Mutex<Vec<ClearanceCall>>>,
}

impl CaseManagement {
    pub fn login_count(&self) -> usize {
        self.logins.load(Ordering::SeqCst)
    }

    pub fn clearance_calls(&self) -> Vec<ClearanceCall> {
        self.clearances.lock().clone()
    }
}

async fn login_handler(State(cm): State<CaseManagement>) -> Json<serde_json::Value> {
    cm.logins.fetch_add(1, Ordering::SeqCst);
    Json(serde_json::json!({ "token": CASE_TOKEN }))
}

async fn clearance_handler(
    State(cm): State<CaseManagement>,
    Path(listing_id): Path<String>,
    headers: HeaderMap,
) -> Json<serde_json::Value> {
    let bearer = headers
        .get(header::AUTHORIZATION)
        .and_then(|val| val.to_str().ok())
        .and_then(|s| s.strip_prefix("Bearer "))
        .map(str::to_string);

    cm.clearances.lock().push(ClearanceCall { listing_id, bearer });
    Json(serde_json::json!({ "timb_cleared": true }))
}

pub struct TestServer {
    pub addr: SocketAddr,
    _server_handle: JoinHandle<()>,
    shutdown_tx: Option<oneshot::Sender<()>>,
    _temp_dir: Option<TempDir>,
}

impl TestServer {
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

async fn serve(router: Router, temp_dir: Option<TempDir>) -> TestServer {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind test listener");
    let addr = listener.local_addr().expect("local addr");

    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
    let handle = tokio::spawn(async move {
        axum::serve(listener, router)
            .with_graceful_shutdown(async {
                let _ = shutdown_rx.await;
            })
            .await
            .expect("test server");
    });

    TestServer {
        addr,
        _server_handle: handle,
        shutdown_tx: Some(shutdown_tx),
        _temp_dir: temp_dir,
    }
}

/// Spawns the mock case-management service.
pub async fn spawn_case_management() -> (TestServer, CaseManagement) {
    let cm = CaseManagement::default();
    let router = Router::new()
        .route("/api/login", post(login_handler))
        .route(
            "/api/tobacco_listings/{listing_id}/timb_clearance",
            post(clearance_handler),
        )
        .with_state(cm.clone());

    (serve(router, None).await, cm)
}

pub fn clearance_config_for(addr: SocketAddr) -> ClearanceConfig {
    ClearanceConfig {
        login_url: format!("http://{}/api/login", addr),
        clearance_url_template: format!(
            "http://{}/api/tobacco_listings/{{listing_id}}/timb_clearance",
            addr
        ),
        email: "officer@example.test".to_string(),
        password: "secret".to_string(),
        timeout: Duration::from_secs(2),
    }
}

/// Spawns a gateway with a stub encoder on an ephemeral port.
pub async fn spawn_gateway(
    threshold: f32,
    expected_token: Option<&str>,
    clearance_config: ClearanceConfig,
) -> TestServer {
    let spool = TempDir::new().expect("spool dir");

    let encoder = Arc::new(ClipEncoder::load(EncoderConfig::stub()).expect("stub encoder"));
    let concepts =
        Arc::new(ConceptBank::build(&encoder, ConceptBank::default_prompts()).expect("bank"));
    let scorer = Arc::new(SimilarityScorer::new(ScoringMode::Raw, threshold).expect("scorer"));
    let clearance = Arc::new(ClearanceClient::new(clearance_config).expect("client"));

    let state = HandlerState::new(
        encoder,
        concepts,
        scorer,
        clearance,
        expected_token.map(str::to_string),
        spool.path().to_path_buf(),
    );

    serve(create_router_with_state(state), Some(spool)).await
}

/// Encodes a small deterministic PNG; different seeds give different pixels.
pub fn png_bytes(seed: u8) -> Vec<u8> {
    let img = image::RgbImage::from_fn(8, 8, |x, y| {
        image::Rgb([seed, (x * 13) as u8, (y * 29) as u8])
    });
    let mut buf = std::io::Cursor::new(Vec::new());
    image::DynamicImage::ImageRgb8(img)
        .write_to(&mut buf, image::ImageFormat::Png)
        .expect("encode png");
    buf.into_inner()
}
