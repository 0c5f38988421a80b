pub mod inject;
pub mod provider;
pub(crate) mod shared;
pub mod sse;

use actix_web::{web, HttpRequest, HttpResponse};
use common::error_inject::error_template;
use common::models::InjectionState;
use inject::ErrorInjector;
use provider::{detect_provider, is_always_forward, UpstreamHosts};
use shared::{
    build_forward_headers, build_target_url, forward_response_headers, injected_error_response,
    proxy_error_response, to_actix_status,
};
use std::sync::atomic::{AtomicU64, Ordering};

/// State shared by every request handler and the control channel.
#[derive(Debug)]
pub struct ProxyState {
    pub injector: ErrorInjector,
    pub hosts: UpstreamHosts,
    requests: AtomicU64,
}

impl ProxyState {
    pub fn new(initial: InjectionState, hosts: UpstreamHosts) -> Self {
        Self {
            injector: ErrorInjector::new(initial),
            hosts,
            requests: AtomicU64::new(0),
        }
    }

    /// Count a new request and return its sequence number.
    fn record_request(&self) -> u64 {
        self.requests.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Requests handled so far. Diagnostic only.
    pub fn request_count(&self) -> u64 {
        self.requests.load(Ordering::Relaxed)
    }
}

/// Build the shared upstream client: pooled, no redirects, long total timeout.
pub fn build_client(timeout: std::time::Duration) -> anyhow::Result<reqwest::Client> {
    Ok(reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .timeout(timeout)
        .build()?)
}

/// Catch-all handler: inject a provider error or relay the request upstream.
///
/// Always produces a well-formed response. Upstream failures become a 500
/// proxy-error envelope.
pub async fn proxy_handler(
    req: HttpRequest,
    body: web::Bytes,
    state: web::Data<ProxyState>,
    client: web::Data<reqwest::Client>,
) -> HttpResponse {
    let number = state.record_request();
    let path = req.path();
    let provider = detect_provider(path, req.headers());

    log::info!("Request #{}: {} {} -> {}", number, req.method(), path, provider);

    let always_forward = is_always_forward(path);
    if always_forward {
        log::info!("Always forwarding: {}", path);
    } else if let Some(mode) = state.injector.decide_and_consume() {
        let template = error_template(provider, mode);
        log::warn!(
            "Injecting {} error (status {}) for {}",
            mode,
            template.status,
            provider
        );
        log::info!("Status: {}", state.injector.snapshot().status_line());
        return injected_error_response(template);
    }

    let base_host = state.hosts.resolve(provider, always_forward);
    let target_url = build_target_url(base_host, path, req.uri().query());

    match forward(&req, body, &target_url, client.get_ref()).await {
        Ok(resp) => {
            log::info!("Status: {}", state.injector.snapshot().status_line());
            resp
        }
        Err(e) => {
            log::error!("Error proxying request to {}: {:#}", target_url, e);
            proxy_error_response(&format!("{:#}", e))
        }
    }
}

/// Send the request upstream and relay the response, streamed for
/// event-streams and buffered otherwise.
async fn forward(
    req: &HttpRequest,
    body: web::Bytes,
    target_url: &str,
    client: &reqwest::Client,
) -> anyhow::Result<HttpResponse> {
    let method = reqwest::Method::from_bytes(req.method().as_str().as_bytes())?;

    let upstream = client
        .request(method, target_url)
        .headers(build_forward_headers(req))
        .body(body)
        .send()
        .await?;

    let status = to_actix_status(upstream.status().as_u16())?;
    let mut builder = HttpResponse::build(status);
    forward_response_headers(&mut builder, upstream.headers());

    if sse::is_event_stream(upstream.headers()) {
        log::info!("Streaming response: {}", status.as_u16());
        return Ok(sse::stream_response(builder, upstream));
    }

    let response_body = upstream.bytes().await?;
    log::info!("Proxied response: {}", status.as_u16());
    Ok(builder.body(response_body))
}
