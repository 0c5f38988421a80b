use actix_web::http::header::CONTENT_TYPE;
use actix_web::http::StatusCode;
use actix_web::{HttpRequest, HttpResponse, HttpResponseBuilder};
use common::error_inject::ErrorTemplate;

/// Request headers never copied to the upstream request.
const SKIPPED_REQUEST_HEADERS: &[&str] = &[
    "host",
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailers",
    "transfer-encoding",
    "upgrade",
];

/// Upstream response headers never copied back to the client. The body may
/// have been decompressed by the client, and actix frames the body itself.
const SKIPPED_RESPONSE_HEADERS: &[&str] = &[
    "connection",
    "keep-alive",
    "transfer-encoding",
    "content-encoding",
    "content-length",
];

/// Build the full target URL from a base host, the request path, and an
/// optional query string.
pub fn build_target_url(base_host: &str, path: &str, query: Option<&str>) -> String {
    let mut url = format!("{}{}", base_host.trim_end_matches('/'), path);
    if let Some(qs) = query.filter(|q| !q.is_empty()) {
        url.push('?');
        url.push_str(qs);
    }
    url
}

/// Copy headers from an actix HttpRequest into a reqwest HeaderMap, skipping
/// `Host` and hop-by-hop headers.
pub fn build_forward_headers(req: &HttpRequest) -> reqwest::header::HeaderMap {
    let mut map = reqwest::header::HeaderMap::new();
    for (key, value) in req.headers() {
        if SKIPPED_REQUEST_HEADERS
            .iter()
            .any(|h| key.as_str().eq_ignore_ascii_case(h))
        {
            continue;
        }
        if let Ok(name) = reqwest::header::HeaderName::from_bytes(key.as_ref()) {
            if let Ok(val) = reqwest::header::HeaderValue::from_bytes(value.as_bytes()) {
                map.append(name, val);
            }
        }
    }
    map
}

/// Copy upstream response headers into an actix HttpResponseBuilder,
/// skipping hop-by-hop and body-framing headers.
pub fn forward_response_headers(
    builder: &mut HttpResponseBuilder,
    upstream_headers: &reqwest::header::HeaderMap,
) {
    for (key, value) in upstream_headers {
        if SKIPPED_RESPONSE_HEADERS
            .iter()
            .any(|h| key.as_str().eq_ignore_ascii_case(h))
        {
            continue;
        }
        if let Ok(name) = actix_web::http::header::HeaderName::from_bytes(key.as_ref()) {
            if let Ok(val) = actix_web::http::header::HeaderValue::from_bytes(value.as_bytes()) {
                builder.append_header((name, val));
            }
        }
    }
}

/// Convert a u16 status code to an actix StatusCode.
pub fn to_actix_status(status: u16) -> anyhow::Result<StatusCode> {
    StatusCode::from_u16(status)
        .map_err(|_| anyhow::anyhow!("Invalid status code from upstream: {}", status))
}

/// The canned provider error, returned instead of contacting upstream.
pub fn injected_error_response(template: &ErrorTemplate) -> HttpResponse {
    let status =
        StatusCode::from_u16(template.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    HttpResponse::build(status)
        .insert_header((CONTENT_TYPE, "application/json"))
        .body(template.body_json)
}

/// The 500 envelope used when the proxy itself could not complete a request.
pub fn proxy_error_response(detail: &str) -> HttpResponse {
    HttpResponse::InternalServerError().json(serde_json::json!({
        "error": { "message": format!("Proxy error: {}", detail) }
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::body::MessageBody;
    use actix_web::test::TestRequest;
    use common::error_inject::{error_template, ErrorMode, Provider};

    #[test]
    fn target_url_keeps_path_and_query() {
        assert_eq!(
            build_target_url("http://up.local/", "/v1/chat/completions", Some("a=1&b=2")),
            "http://up.local/v1/chat/completions?a=1&b=2"
        );
        assert_eq!(
            build_target_url("https://api.openai.com", "/v1/models", None),
            "https://api.openai.com/v1/models"
        );
        assert_eq!(
            build_target_url("https://api.openai.com", "/v1/models", Some("")),
            "https://api.openai.com/v1/models"
        );
    }

    #[test]
    fn forward_headers_drop_hop_by_hop() {
        let req = TestRequest::default()
            .insert_header(("host", "localhost:8888"))
            .insert_header(("connection", "keep-alive"))
            .insert_header(("proxy-authorization", "Basic xyz"))
            .insert_header(("TE", "trailers"))
            .insert_header(("upgrade", "h2c"))
            .insert_header(("authorization", "Bearer sk-1"))
            .insert_header(("x-api-key", "sk-ant"))
            .insert_header(("content-type", "application/json"))
            .to_http_request();
        let map = build_forward_headers(&req);
        assert!(map.get("host").is_none());
        assert!(map.get("connection").is_none());
        assert!(map.get("proxy-authorization").is_none());
        assert!(map.get("te").is_none());
        assert!(map.get("upgrade").is_none());
        assert_eq!(map.get("authorization").unwrap(), "Bearer sk-1");
        assert_eq!(map.get("x-api-key").unwrap(), "sk-ant");
        assert_eq!(map.get("content-type").unwrap(), "application/json");
    }

    #[test]
    fn response_headers_drop_encoding_and_length() {
        let mut upstream = reqwest::header::HeaderMap::new();
        upstream.insert("content-encoding", "gzip".parse().unwrap());
        upstream.insert("content-length", "42".parse().unwrap());
        upstream.insert("transfer-encoding", "chunked".parse().unwrap());
        upstream.insert("x-request-id", "req_1".parse().unwrap());
        upstream.append("set-cookie", "a=1".parse().unwrap());
        upstream.append("set-cookie", "b=2".parse().unwrap());

        let mut builder = HttpResponse::Ok();
        forward_response_headers(&mut builder, &upstream);
        let resp = builder.finish();
        assert!(resp.headers().get("content-encoding").is_none());
        assert!(resp.headers().get("transfer-encoding").is_none());
        assert_eq!(resp.headers().get("x-request-id").unwrap(), "req_1");
        assert_eq!(resp.headers().get_all("set-cookie").count(), 2);
    }

    #[test]
    fn invalid_status_is_an_error() {
        assert!(to_actix_status(1000).is_err());
        assert_eq!(to_actix_status(529).unwrap().as_u16(), 529);
    }

    #[test]
    fn injected_response_uses_template() {
        let template = error_template(Provider::Anthropic, ErrorMode::RateLimit);
        let resp = injected_error_response(template);
        assert_eq!(resp.status().as_u16(), 429);
        assert_eq!(resp.headers().get(CONTENT_TYPE).unwrap(), "application/json");
        let body = resp.into_body().try_into_bytes().unwrap();
        assert_eq!(body, template.body_json.as_bytes());
    }

    #[test]
    fn proxy_error_envelope() {
        let resp = proxy_error_response("connection refused");
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = resp.into_body().try_into_bytes().unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error"]["message"], "Proxy error: connection refused");
    }
}
