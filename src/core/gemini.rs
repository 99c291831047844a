//! Gemini `streamGenerateContent` backend.

use std::collections::VecDeque;

use async_trait::async_trait;
use futures_util::stream::{self, BoxStream};
use futures_util::StreamExt;
use memchr::memchr;
use tracing::{debug, warn};

use super::credentials::ProviderSettings;
use super::session::{ChatBackend, GenerateRequest, TextStream, TransportError};
use crate::api::{Content, GenerateContentChunk, GenerateContentRequest};
use crate::utils::url::stream_generate_url;

pub struct GeminiBackend {
    client: reqwest::Client,
    settings: ProviderSettings,
}

impl GeminiBackend {
    pub fn new(client: reqwest::Client, settings: ProviderSettings) -> Self {
        Self { client, settings }
    }

    fn build_body(request: &GenerateRequest) -> GenerateContentRequest {
        let contents = request
            .contents
            .iter()
            .map(|turn| Content::text(Some(turn.role.as_str()), turn.text.clone()))
            .collect();
        let system_instruction = if request.system_instruction.trim().is_empty() {
            None
        } else {
            Some(Content::text(None, request.system_instruction.clone()))
        };
        GenerateContentRequest {
            contents,
            system_instruction,
        }
    }
}

#[async_trait]
impl ChatBackend for GeminiBackend {
    async fn stream_generate(&self, request: GenerateRequest) -> Result<TextStream, TransportError> {
        let url = stream_generate_url(&self.settings.base_url, &request.model);
        let body = Self::build_body(&request);

        let mut http_request = self
            .client
            .post(url)
            .header("Content-Type", "application/json");
        // Without a key the call goes out unauthenticated and the provider
        // rejects it; that rejection is what the user gets to see.
        if let Some(api_key) = self.settings.api_key.as_deref() {
            http_request = http_request.header("x-goog-api-key", api_key);
        }

        let response = http_request.json(&body).send().await?;
        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "<no body>".to_string());
            warn!(status = status.as_u16(), "provider rejected stream request");
            return Err(TransportError::Api {
                status: Some(status.as_u16()),
                message: summarize_api_error(&error_text),
            });
        }

        let body = response
            .bytes_stream()
            .map(|chunk| chunk.map(|bytes| bytes.to_vec()))
            .boxed();
        Ok(sse_text_stream(body))
    }
}

struct SseState {
    body: BoxStream<'static, reqwest::Result<Vec<u8>>>,
    buffer: Vec<u8>,
    pending: VecDeque<Result<String, TransportError>>,
    finished: bool,
}

impl SseState {
    fn drain_lines(&mut self) {
        while let Some(newline_pos) = memchr(b'\n', &self.buffer) {
            let line: Vec<u8> = self.buffer.drain(..=newline_pos).collect();
            self.push_line(&line[..newline_pos]);
        }
    }

    fn push_line(&mut self, raw: &[u8]) {
        match std::str::from_utf8(raw) {
            Ok(line) => {
                if let Some(item) = parse_sse_line(line.trim()) {
                    self.pending.push_back(item);
                }
            }
            Err(e) => debug!("invalid UTF-8 in stream: {e}"),
        }
    }
}

/// Turns a raw SSE body into text deltas. The first error ends the stream.
fn sse_text_stream(body: BoxStream<'static, reqwest::Result<Vec<u8>>>) -> TextStream {
    let state = SseState {
        body,
        buffer: Vec::new(),
        pending: VecDeque::new(),
        finished: false,
    };

    stream::unfold(state, |mut state| async move {
        loop {
            if let Some(item) = state.pending.pop_front() {
                if item.is_err() {
                    state.pending.clear();
                    state.finished = true;
                }
                return Some((item, state));
            }
            if state.finished {
                return None;
            }
            match state.body.next().await {
                Some(Ok(bytes)) => {
                    state.buffer.extend_from_slice(&bytes);
                    state.drain_lines();
                }
                Some(Err(e)) => {
                    state.pending.push_back(Err(TransportError::Request(e)));
                }
                None => {
                    let rest = std::mem::take(&mut state.buffer);
                    if !rest.is_empty() {
                        state.push_line(&rest);
                    }
                    state.finished = true;
                }
            }
        }
    })
    .boxed()
}

fn extract_data_payload(line: &str) -> Option<&str> {
    line.strip_prefix("data:").map(str::trim_start)
}

/// Parses one SSE line. Comments, blank lines and other fields yield `None`.
pub(crate) fn parse_sse_line(line: &str) -> Option<Result<String, TransportError>> {
    let payload = extract_data_payload(line)?;
    if payload.trim().is_empty() {
        return None;
    }

    match serde_json::from_str::<GenerateContentChunk>(payload) {
        Ok(chunk) => {
            if chunk.error.is_some() {
                return Some(Err(TransportError::Api {
                    status: None,
                    message: summarize_api_error(payload),
                }));
            }
            if let Some(reason) = chunk.block_reason() {
                return Some(Err(TransportError::Api {
                    status: None,
                    message: format!("prompt blocked: {reason}"),
                }));
            }
            Some(Ok(chunk.text()))
        }
        Err(e) => Some(Err(TransportError::Decode(format!("{e}: {payload}")))),
    }
}

fn extract_error_summary(value: &serde_json::Value) -> Option<String> {
    let summary = value
        .pointer("/error/message")
        .and_then(|v| v.as_str())
        .map(str::to_owned)
        .or_else(|| {
            value
                .get("error")
                .and_then(|v| v.as_str().map(str::to_owned))
        })
        .or_else(|| {
            value
                .get("message")
                .and_then(|v| v.as_str().map(str::to_owned))
        });

    summary.map(|text| text.split_whitespace().collect::<Vec<_>>().join(" "))
}

/// One-line description of a provider error body.
pub(crate) fn summarize_api_error(error_text: &str) -> String {
    let trimmed = error_text.trim();
    if trimmed.is_empty() {
        return "<empty>".to_string();
    }

    // Gemini sometimes wraps the error object in an array.
    if let Ok(json_value) = serde_json::from_str::<serde_json::Value>(trimmed) {
        let value = match &json_value {
            serde_json::Value::Array(items) => items.first().unwrap_or(&json_value),
            other => other,
        };
        if let Some(summary) = extract_error_summary(value).filter(|s| !s.is_empty()) {
            return summary;
        }
    }

    trimmed.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::message::Role;
    use crate::core::session::HistoryTurn;

    fn body_from(parts: &[&str]) -> BoxStream<'static, reqwest::Result<Vec<u8>>> {
        let owned: Vec<reqwest::Result<Vec<u8>>> =
            parts.iter().map(|p| Ok(p.as_bytes().to_vec())).collect();
        stream::iter(owned).boxed()
    }

    async fn collect(stream: TextStream) -> Vec<Result<String, String>> {
        stream
            .map(|item| item.map_err(|e| e.to_string()))
            .collect()
            .await
    }

    #[test]
    fn parse_sse_line_handles_spacing_variants() {
        let spaced = r#"data: {"candidates":[{"content":{"parts":[{"text":"Hello"}]}}]}"#;
        let tight = r#"data:{"candidates":[{"content":{"parts":[{"text":"World"}]}}]}"#;

        assert_eq!(parse_sse_line(spaced).unwrap().unwrap(), "Hello");
        assert_eq!(parse_sse_line(tight).unwrap().unwrap(), "World");
        assert!(parse_sse_line("").is_none());
        assert!(parse_sse_line(": keep-alive").is_none());
        assert!(parse_sse_line("event: message").is_none());
    }

    #[test]
    fn parse_sse_line_routes_stream_errors() {
        let line = r#"data: {"error":{"code":500,"message":"internal   error"}}"#;
        match parse_sse_line(line) {
            Some(Err(TransportError::Api { status, message })) => {
                assert_eq!(status, None);
                assert_eq!(message, "internal error");
            }
            other => panic!("expected api error, got {other:?}"),
        }
    }

    #[test]
    fn parse_sse_line_reports_blocked_prompts() {
        let line = r#"data: {"promptFeedback":{"blockReason":"SAFETY"}}"#;
        let err = parse_sse_line(line).unwrap().unwrap_err();
        assert_eq!(err.to_string(), "API error: prompt blocked: SAFETY");
    }

    #[test]
    fn parse_sse_line_rejects_garbage() {
        assert!(matches!(
            parse_sse_line("data: not json"),
            Some(Err(TransportError::Decode(_)))
        ));
    }

    #[test]
    fn summarize_api_error_prefers_json_message() {
        let raw = r#"[{"error":{"code":400,"message":"API key not valid. Please pass a valid API key.","status":"INVALID_ARGUMENT"}}]"#;
        assert_eq!(
            summarize_api_error(raw),
            "API key not valid. Please pass a valid API key."
        );
        assert_eq!(summarize_api_error("  bad\n gateway "), "bad gateway");
        assert_eq!(summarize_api_error(""), "<empty>");
    }

    #[tokio::test]
    async fn sse_stream_reassembles_lines_split_across_chunks() {
        let body = body_from(&[
            "data: {\"candidates\":[{\"content\":{\"parts\":[{\"text\":\"He\"}]}}]}\r\n\r\ndata: {\"cand",
            "idates\":[{\"content\":{\"parts\":[{\"text\":\"llo\"}]}}]}\n\n",
        ]);

        let items = collect(sse_text_stream(body)).await;
        assert_eq!(items, vec![Ok("He".to_string()), Ok("llo".to_string())]);
    }

    #[tokio::test]
    async fn sse_stream_flushes_unterminated_last_line() {
        let body = body_from(&["data: {\"candidates\":[{\"content\":{\"parts\":[{\"text\":\"end\"}]}}]}"]);
        let items = collect(sse_text_stream(body)).await;
        assert_eq!(items, vec![Ok("end".to_string())]);
    }

    #[tokio::test]
    async fn sse_stream_stops_after_first_error() {
        let body = body_from(&[
            "data: {\"candidates\":[{\"content\":{\"parts\":[{\"text\":\"H\"}]}}]}\n",
            "data: {\"error\":{\"message\":\"overloaded\"}}\n",
            "data: {\"candidates\":[{\"content\":{\"parts\":[{\"text\":\"ignored\"}]}}]}\n",
        ]);

        let items = collect(sse_text_stream(body)).await;
        assert_eq!(items.len(), 2);
        assert_eq!(items[0], Ok("H".to_string()));
        assert_eq!(items[1], Err("API error: overloaded".to_string()));
    }

    #[test]
    fn body_maps_roles_and_omits_blank_instruction() {
        let request = GenerateRequest {
            model: "m1".into(),
            system_instruction: "  ".into(),
            contents: vec![
                HistoryTurn::new(Role::User, "hi"),
                HistoryTurn::new(Role::Model, "hello"),
            ],
        };
        let body = GeminiBackend::build_body(&request);
        assert!(body.system_instruction.is_none());
        assert_eq!(body.contents[0].role.as_deref(), Some("user"));
        assert_eq!(body.contents[1].role.as_deref(), Some("model"));
    }
}
