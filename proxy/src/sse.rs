use actix_web::{HttpResponse, HttpResponseBuilder};
use bytes::Bytes;
use futures::{Stream, StreamExt};
use tokio::sync::mpsc;

/// Chunks buffered between the upstream reader and the client writer.
const RELAY_BUFFER_CHUNKS: usize = 16;

/// True if the upstream response is a Server-Sent-Events stream.
pub fn is_event_stream(headers: &reqwest::header::HeaderMap) -> bool {
    headers
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|ct| ct.to_lowercase().contains("text/event-stream"))
        .unwrap_or(false)
}

/// How a streamed relay ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelayOutcome {
    /// Upstream finished and every chunk reached the client.
    Completed { bytes: usize },
    /// The client went away; the rest of the upstream body was abandoned.
    ClientDisconnected { bytes: usize },
    /// Upstream failed mid-body; the client stream was ended early.
    UpstreamFailed { bytes: usize, error: String },
}

/// Copy chunks from `upstream` into `tx` until either side is done.
///
/// Stops as soon as the receiving half is dropped, even while upstream is idle.
pub async fn relay_chunks<S, E>(
    upstream: S,
    tx: mpsc::Sender<Result<Bytes, actix_web::Error>>,
) -> RelayOutcome
where
    S: Stream<Item = Result<Bytes, E>>,
    E: std::fmt::Display,
{
    let mut upstream = std::pin::pin!(upstream);
    let mut bytes = 0;

    loop {
        let next = tokio::select! {
            _ = tx.closed() => return RelayOutcome::ClientDisconnected { bytes },
            next = upstream.next() => next,
        };
        match next {
            Some(Ok(chunk)) => {
                let len = chunk.len();
                if tx.send(Ok(chunk)).await.is_err() {
                    return RelayOutcome::ClientDisconnected { bytes };
                }
                bytes += len;
            }
            Some(Err(e)) => {
                return RelayOutcome::UpstreamFailed {
                    bytes,
                    error: e.to_string(),
                }
            }
            None => return RelayOutcome::Completed { bytes },
        }
    }
}

/// Start relaying `upstream`'s body and return the streaming response.
///
/// The copy runs on its own task, so a stalled or abandoned stream only
/// affects this request. Dropping the sender ends the chunked body.
pub fn stream_response(
    mut builder: HttpResponseBuilder,
    upstream: reqwest::Response,
) -> HttpResponse {
    let (tx, mut rx) = mpsc::channel::<Result<Bytes, actix_web::Error>>(RELAY_BUFFER_CHUNKS);
    let url = upstream.url().to_string();

    actix_web::rt::spawn(async move {
        match relay_chunks(upstream.bytes_stream(), tx).await {
            RelayOutcome::Completed { bytes } => {
                log::info!("Stream complete: {} bytes from {}", bytes, url);
            }
            RelayOutcome::ClientDisconnected { bytes } => {
                log::warn!(
                    "Stream write error (client may have disconnected) after {} bytes from {}",
                    bytes,
                    url
                );
            }
            RelayOutcome::UpstreamFailed { bytes, error } => {
                log::warn!(
                    "Upstream stream error after {} bytes from {}: {}",
                    bytes,
                    url,
                    error
                );
            }
        }
    });

    let body = futures::stream::poll_fn(move |cx| rx.poll_recv(cx));
    builder.streaming(body)
}
