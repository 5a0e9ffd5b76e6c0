//! Stream session controller: drives one upstream generation to completion,
//! cancellation, or failure, relaying deltas as gateway events.

use crate::adapter::{ProviderAdapter, UpstreamRequest};
use crate::frames::FrameStreamExt;
use crate::types::GatewayEvent;
use crate::Error;
use futures_util::StreamExt;
use tokio::sync::mpsc::UnboundedSender;
use tokio_util::sync::CancellationToken;

/// Send one event to the session unless the generation has been superseded
/// or the session hung up. Returns false when no further events may go out.
fn emit(events: &UnboundedSender<GatewayEvent>, cancel: &CancellationToken, event: GatewayEvent) -> bool {
    if cancel.is_cancelled() {
        return false;
    }
    events.send(event).is_ok()
}

/// Drive one generation request: issue it, decode the streaming response,
/// and relay chunk/done/error events until the stream ends or the token is
/// cancelled.
///
/// Cancellation is checked at every await point and before every send, so a
/// cancelled generation tears down its connection promptly and never
/// delivers another event. The abort itself is not reported as an error.
pub(crate) async fn run_generation(
    client: reqwest::Client,
    adapter: ProviderAdapter,
    request: UpstreamRequest,
    events: UnboundedSender<GatewayEvent>,
    cancel: CancellationToken,
) {
    let mut builder = client.post(&request.url).json(&request.body);
    for (name, value) in &request.headers {
        builder = builder.header(name, value);
    }

    let response = tokio::select! {
        _ = cancel.cancelled() => return,
        result = builder.send() => match result {
            Ok(response) => response,
            Err(e) => {
                emit(&events, &cancel, GatewayEvent::error(Error::from(e).to_string()));
                return;
            }
        },
    };

    let status = response.status();
    if !status.is_success() {
        let body = tokio::select! {
            _ = cancel.cancelled() => return,
            body = response.text() => body.unwrap_or_default(),
        };
        let error = Error::upstream(status.as_u16(), body);
        tracing::debug!("upstream request failed: {error}");
        emit(&events, &cancel, GatewayEvent::error(error.to_string()));
        return;
    }

    let mut frames = response.bytes_stream().frames();
    loop {
        let next = tokio::select! {
            _ = cancel.cancelled() => return,
            frame = frames.next() => frame,
        };

        match next {
            Some(Ok(payload)) => {
                let delta = adapter.parse_stream_payload(&payload);
                if delta.is_empty() {
                    continue;
                }
                if !emit(&events, &cancel, GatewayEvent::chunk(delta)) {
                    return;
                }
            }
            Some(Err(e)) => {
                emit(&events, &cancel, GatewayEvent::error(e.to_string()));
                return;
            }
            None => {
                emit(&events, &cancel, GatewayEvent::Done);
                return;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PromptPair;
    use tokio::sync::mpsc;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn request_for(base_url: &str) -> UpstreamRequest {
        ProviderAdapter::OpenAiCompatible
            .build_request(base_url, "gpt-test", "k", &PromptPair::new("s", "u"), true)
            .unwrap()
    }

    #[tokio::test]
    async fn test_streamed_deltas_arrive_in_order() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_raw(
                        "data: {\"choices\":[{\"delta\":{\"content\":\"Hel\"}}]}\n\n\
                         data: {\"choices\":[{\"delta\":{\"content\":\"lo\"}}]}\n\n\
                         data: [DONE]\n\n",
                        "text/event-stream",
                    ),
            )
            .mount(&server)
            .await;

        let (tx, mut rx) = mpsc::unbounded_channel();
        run_generation(
            reqwest::Client::new(),
            ProviderAdapter::OpenAiCompatible,
            request_for(&server.uri()),
            tx,
            CancellationToken::new(),
        )
        .await;

        assert_eq!(
            rx.recv().await,
            Some(GatewayEvent::Chunk {
                content: Some("Hel".to_string()),
                reasoning: None
            })
        );
        assert_eq!(
            rx.recv().await,
            Some(GatewayEvent::Chunk {
                content: Some("lo".to_string()),
                reasoning: None
            })
        );
        assert_eq!(rx.recv().await, Some(GatewayEvent::Done));
        assert_eq!(rx.recv().await, None);
    }

    #[tokio::test]
    async fn test_error_status_reports_status_and_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_string("bad key"))
            .mount(&server)
            .await;

        let (tx, mut rx) = mpsc::unbounded_channel();
        run_generation(
            reqwest::Client::new(),
            ProviderAdapter::OpenAiCompatible,
            request_for(&server.uri()),
            tx,
            CancellationToken::new(),
        )
        .await;

        match rx.recv().await {
            Some(GatewayEvent::Error { error }) => {
                assert!(error.contains("401"), "missing status in: {error}");
                assert!(error.contains("bad key"), "missing body in: {error}");
            }
            other => panic!("expected error event, got {other:?}"),
        }
        assert_eq!(rx.recv().await, None);
    }

    #[tokio::test]
    async fn test_pre_cancelled_generation_emits_nothing() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_raw("data: {\"choices\":[{\"delta\":{\"content\":\"x\"}}]}\n\n", "text/event-stream"),
            )
            .mount(&server)
            .await;

        let cancel = CancellationToken::new();
        cancel.cancel();

        let (tx, mut rx) = mpsc::unbounded_channel();
        run_generation(
            reqwest::Client::new(),
            ProviderAdapter::OpenAiCompatible,
            request_for(&server.uri()),
            tx,
            cancel,
        )
        .await;

        assert_eq!(rx.recv().await, None);
    }
}
