//! HTTP client side of the relay.
//!
//! One chunked POST per message; the response body is parsed line by line
//! and the text fragments of every in-progress chunk are yielded as soon as
//! they decode. Failures before the stream opens (connection refused,
//! non-2xx status) are hard errors; anything after that ends the stream.

use crate::error::ToolResult;
use crate::relay::sse::{LineDecoder, parse_event_line};
use futures_util::stream::{self, BoxStream};
use futures_util::StreamExt;
use serde::Serialize;
use std::collections::VecDeque;
use tracing::{debug, info};
use url::Url;

/// Lazy, single-consumption sequence of text fragments for one agent turn.
pub type FragmentStream = BoxStream<'static, String>;

/// Fixed envelope identifying the conversation at the agent service.
#[derive(Debug, Clone)]
pub struct RelayConfig {
    /// `/run_sse` endpoint of the agent service
    pub endpoint: Url,
    pub app_name: String,
    pub user_id: String,
    pub session_id: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RunEnvelope<'a> {
    app_name: &'a str,
    user_id: &'a str,
    session_id: &'a str,
    new_message: NewMessage<'a>,
    streaming: bool,
}

#[derive(Debug, Serialize)]
struct NewMessage<'a> {
    role: &'a str,
    parts: Vec<MessagePart<'a>>,
}

#[derive(Debug, Serialize)]
struct MessagePart<'a> {
    text: &'a str,
}

/// Relay client bound to one agent-service endpoint and session.
pub struct RelayClient {
    http: reqwest::Client,
    config: RelayConfig,
}

impl RelayClient {
    /// Create a new relay client.
    ///
    /// No request timeout is set; a turn streams for as long as the agent
    /// keeps talking, and callers needing one impose it externally.
    pub fn new(config: RelayConfig) -> ToolResult<Self> {
        let http = reqwest::Client::builder()
            .build()
            .map_err(crate::error::ToolError::from)?;
        Ok(Self { http, config })
    }

    /// Get the configured endpoint.
    pub fn endpoint(&self) -> &Url {
        &self.config.endpoint
    }

    /// Send one user message and stream back the reply fragments.
    pub async fn stream_message(&self, text: &str) -> ToolResult<FragmentStream> {
        let envelope = RunEnvelope {
            app_name: &self.config.app_name,
            user_id: &self.config.user_id,
            session_id: &self.config.session_id,
            new_message: NewMessage {
                role: "user",
                parts: vec![MessagePart { text }],
            },
            streaming: true,
        };

        info!(
            endpoint = %self.config.endpoint,
            session_id = %self.config.session_id,
            "Relaying message to agent service"
        );

        let response = self
            .http
            .post(self.config.endpoint.clone())
            .json(&envelope)
            .send()
            .await?
            .error_for_status()?;

        let body = response
            .bytes_stream()
            .map(|result| result.map(|bytes| bytes.to_vec()))
            .boxed();

        Ok(fragments(body))
    }
}

struct RelayState {
    body: BoxStream<'static, Result<Vec<u8>, reqwest::Error>>,
    decoder: LineDecoder,
    pending: VecDeque<String>,
    finished: bool,
}

impl RelayState {
    fn enqueue_line(&mut self, line: &str) {
        if let Some(chunk) = parse_event_line(line) {
            if chunk.partial {
                self.pending.extend(chunk.into_texts());
            }
        }
    }
}

/// Turn the response byte stream into an ordered fragment stream.
fn fragments(body: BoxStream<'static, Result<Vec<u8>, reqwest::Error>>) -> FragmentStream {
    let state = RelayState {
        body,
        decoder: LineDecoder::new(),
        pending: VecDeque::new(),
        finished: false,
    };

    stream::unfold(state, |mut state| async move {
        loop {
            if let Some(fragment) = state.pending.pop_front() {
                return Some((fragment, state));
            }
            if state.finished {
                return None;
            }

            match state.body.next().await {
                Some(Ok(chunk)) => {
                    for line in state.decoder.push_chunk(&chunk) {
                        state.enqueue_line(&line);
                    }
                }
                Some(Err(e)) => {
                    // Mid-stream transport failure: the sequence simply ends
                    debug!(error = %e, "Response stream ended with transport error");
                    state.finished = true;
                    if let Some(line) = state.decoder.take_remainder() {
                        state.enqueue_line(&line);
                    }
                }
                None => {
                    state.finished = true;
                    if let Some(line) = state.decoder.take_remainder() {
                        state.enqueue_line(&line);
                    }
                }
            }
        }
    })
    .fuse()
    .boxed()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_envelope_serializes_camel_case() {
        let envelope = RunEnvelope {
            app_name: "adkmcp",
            user_id: "u2",
            session_id: "s2",
            new_message: NewMessage {
                role: "user",
                parts: vec![MessagePart { text: "查询所有评论" }],
            },
            streaming: true,
        };

        let json = serde_json::to_value(&envelope).unwrap();
        assert_eq!(json["appName"], "adkmcp");
        assert_eq!(json["userId"], "u2");
        assert_eq!(json["sessionId"], "s2");
        assert_eq!(json["streaming"], true);
        assert_eq!(json["newMessage"]["role"], "user");
        assert_eq!(json["newMessage"]["parts"][0]["text"], "查询所有评论");
    }

    #[tokio::test]
    async fn test_fragments_from_scripted_body() {
        let chunks: Vec<Result<Vec<u8>, reqwest::Error>> = vec![
            Ok(b"data: {\"partial\": true, \"content\": {\"parts\": [{\"text\": \"he\"}]}}\n"
                .to_vec()),
            Ok(b"data: {broken json\n".to_vec()),
            Ok(b"data: {\"partial\": true, \"content\": {\"parts\": [{\"text\": \"llo\"}]}}\n"
                .to_vec()),
            Ok(b"data: {\"partial\": false, \"content\": {\"parts\": [{\"text\": \"hello\"}]}}\n"
                .to_vec()),
        ];

        let body = stream::iter(chunks).boxed();
        let collected: Vec<String> = fragments(body).collect().await;

        // Malformed line skipped, final (non-partial) chunk not re-emitted
        assert_eq!(collected, vec!["he", "llo"]);
    }

    #[tokio::test]
    async fn test_fragments_split_across_chunk_boundary() {
        let chunks: Vec<Result<Vec<u8>, reqwest::Error>> = vec![
            Ok(b"data: {\"partial\": true, \"content\"".to_vec()),
            Ok(b": {\"parts\": [{\"text\": \"ok\"}]}}\n".to_vec()),
        ];

        let body = stream::iter(chunks).boxed();
        let collected: Vec<String> = fragments(body).collect().await;
        assert_eq!(collected, vec!["ok"]);
    }

    #[tokio::test]
    async fn test_fragments_unterminated_last_line() {
        // No trailing newline: the remainder is still parsed at end of stream
        let chunks: Vec<Result<Vec<u8>, reqwest::Error>> = vec![Ok(
            b"data: {\"partial\": true, \"content\": {\"parts\": [{\"text\": \"tail\"}]}}"
                .to_vec(),
        )];

        let body = stream::iter(chunks).boxed();
        let collected: Vec<String> = fragments(body).collect().await;
        assert_eq!(collected, vec!["tail"]);
    }

    #[tokio::test]
    async fn test_fragments_empty_body() {
        let body = stream::iter(Vec::<Result<Vec<u8>, reqwest::Error>>::new()).boxed();
        let collected: Vec<String> = fragments(body).collect().await;
        assert!(collected.is_empty());
    }
}
