//! Local stand-ins for the CORS proxies and the generation API.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use article_rewriter::fetcher::{FetchConfig, ProxyProvider, ResponseShape};
use article_rewriter::llm::{Backend, RewriteConfig};
use axum::{
    Json, Router,
    extract::{Query, State},
    http::{HeaderMap, StatusCode, Uri},
    routing::get,
};
use serde_json::{Value, json};

pub const ARTICLE_HTML: &str = "<html><head><title>SSC</title><script>track()</script></head>\
    <body><h1>SSC CGL 2024 Notification</h1><p>Online Application starts 24 June 2024 &amp; \
    closes 24 July 2024. Total vacancies: 17,727. Age Limit 18&nbsp;to&nbsp;32 years.</p></body></html>";

pub async fn spawn(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr: SocketAddr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("axum serve");
    });
    format!("http://{}", addr)
}

#[derive(Default)]
pub struct ProxyHits {
    pub fail: AtomicUsize,
    pub short: AtomicUsize,
    pub slow: AtomicUsize,
    pub json: AtomicUsize,
    pub json_null: AtomicUsize,
    pub raw: AtomicUsize,
    pub tiny_page: AtomicUsize,
    pub last_user_agent: Mutex<Option<String>>,
    pub last_target: Mutex<Option<String>>,
}

impl ProxyHits {
    pub fn total(&self) -> usize {
        [
            &self.fail,
            &self.short,
            &self.slow,
            &self.json,
            &self.json_null,
            &self.raw,
            &self.tiny_page,
        ]
        .iter()
        .map(|hits| hits.load(Ordering::SeqCst))
        .sum()
    }
}

#[derive(serde::Deserialize)]
struct TargetQuery {
    url: Option<String>,
}

fn record(hits: &ProxyHits, counter: &AtomicUsize, headers: &HeaderMap, query: TargetQuery) {
    counter.fetch_add(1, Ordering::SeqCst);
    *hits.last_user_agent.lock().unwrap() = headers
        .get("user-agent")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    *hits.last_target.lock().unwrap() = query.url;
}

/// Proxy routes: `/fail` 500s, `/short` returns a stub page, `/slow` stalls for
/// two seconds, `/json` and `/json-null` use the `{"contents": ...}` envelope,
/// `/raw` returns the page itself and `/tiny` returns a small but complete page.
pub async fn proxy_fixture() -> (String, Arc<ProxyHits>) {
    let hits = Arc::new(ProxyHits::default());

    let app = Router::new()
        .route(
            "/fail",
            get(|State(h): State<Arc<ProxyHits>>, headers: HeaderMap, Query(q): Query<TargetQuery>| async move {
                record(&h, &h.fail, &headers, q);
                (StatusCode::INTERNAL_SERVER_ERROR, "proxy down")
            }),
        )
        .route(
            "/short",
            get(|State(h): State<Arc<ProxyHits>>, headers: HeaderMap, Query(q): Query<TargetQuery>| async move {
                record(&h, &h.short, &headers, q);
                "Access denied"
            }),
        )
        .route(
            "/slow",
            get(|State(h): State<Arc<ProxyHits>>, headers: HeaderMap, Query(q): Query<TargetQuery>| async move {
                record(&h, &h.slow, &headers, q);
                tokio::time::sleep(Duration::from_secs(2)).await;
                ARTICLE_HTML
            }),
        )
        .route(
            "/json",
            get(|State(h): State<Arc<ProxyHits>>, headers: HeaderMap, Query(q): Query<TargetQuery>| async move {
                record(&h, &h.json, &headers, q);
                Json(json!({ "contents": ARTICLE_HTML, "status": { "http_code": 200 } }))
            }),
        )
        .route(
            "/json-null",
            get(|State(h): State<Arc<ProxyHits>>, headers: HeaderMap, Query(q): Query<TargetQuery>| async move {
                record(&h, &h.json_null, &headers, q);
                Json(json!({ "contents": null }))
            }),
        )
        .route(
            "/raw",
            get(|State(h): State<Arc<ProxyHits>>, headers: HeaderMap, Query(q): Query<TargetQuery>| async move {
                record(&h, &h.raw, &headers, q);
                ([("content-type", "text/html")], ARTICLE_HTML)
            }),
        )
        .route(
            "/tiny",
            get(|State(h): State<Arc<ProxyHits>>, headers: HeaderMap, Query(q): Query<TargetQuery>| async move {
                record(&h, &h.tiny_page, &headers, q);
                ([("content-type", "text/html")], "<html><body>Job details here</body></html>")
            }),
        )
        .with_state(hits.clone());

    (spawn(app).await, hits)
}

pub fn provider(base: &str, route: &str, shape: ResponseShape) -> ProxyProvider {
    ProxyProvider::new(route, format!("{}/{}?url={{url}}", base, route), shape)
}

pub fn fetch_config(providers: Vec<ProxyProvider>) -> FetchConfig {
    FetchConfig {
        providers,
        timeout: Duration::from_millis(500),
        min_length: 100,
        max_chars: 5000,
    }
}

#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub uri: Uri,
    pub authorization: Option<String>,
    pub body: Value,
}

#[derive(Default)]
pub struct GenerationHits {
    pub count: AtomicUsize,
    pub last: Mutex<Option<RecordedCall>>,
}

impl GenerationHits {
    pub fn count(&self) -> usize {
        self.count.load(Ordering::SeqCst)
    }

    pub fn last(&self) -> RecordedCall {
        self.last.lock().unwrap().clone().expect("no generation call recorded")
    }
}

/// Generation API that answers every request with `status` and `body`.
pub async fn generation_fixture(status: StatusCode, body: Value) -> (String, Arc<GenerationHits>) {
    let hits = Arc::new(GenerationHits::default());
    let recorder = hits.clone();

    let app = Router::new().fallback(move |uri: Uri, headers: HeaderMap, Json(request): Json<Value>| {
        let hits = recorder.clone();
        let body = body.clone();
        async move {
            hits.count.fetch_add(1, Ordering::SeqCst);
            *hits.last.lock().unwrap() = Some(RecordedCall {
                uri,
                authorization: headers
                    .get("authorization")
                    .and_then(|v| v.to_str().ok())
                    .map(str::to_string),
                body: request,
            });
            (status, Json(body))
        }
    });

    (spawn(app).await, hits)
}

/// Gemini reply whose only candidate is `text`.
pub fn gemini_reply(text: &str) -> Value {
    json!({
        "candidates": [{
            "content": { "parts": [{ "text": text }], "role": "model" },
            "finishReason": "STOP"
        }]
    })
}

pub fn rewrite_config(backend: Backend, base_url: &str, api_key: Option<&str>) -> RewriteConfig {
    let mut config = RewriteConfig::for_backend(backend);
    config.base_url = base_url.to_string();
    config.api_key = api_key.map(str::to_string);
    config.timeout = Duration::from_secs(5);
    config
}
