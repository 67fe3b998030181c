//! Campus assistant: a streaming passthrough to a chat completion provider
//!
//! The provider answers with server-sent events. Only the content deltas are
//! forwarded to the client, as a plain text stream.

use std::time::Duration;

use axum::{body::Bytes, http::StatusCode};
use futures::{Stream, StreamExt, stream::BoxStream};
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::{
    error::ApiError,
    models::{communities::CommunityBrief, events::EventBrief},
    settings::ChatConfig,
};

/// A chat turn as exchanged with the provider
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub messages: Vec<ChatMessage>,
}

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct StreamChunk {
    #[serde(default)]
    choices: Vec<StreamChoice>,
}

#[derive(Debug, Deserialize)]
struct StreamChoice {
    #[serde(default)]
    delta: Delta,
}

#[derive(Debug, Default, Deserialize)]
struct Delta {
    content: Option<String>,
}

/// Incremental decoder for `data: {json}` event lines
///
/// Network chunks do not respect line boundaries, so a trailing partial line
/// is kept until the rest of it arrives.
#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: Vec<u8>,
}

impl SseDecoder {
    /// Feed a chunk and return the content of every completed line
    pub fn push(&mut self, chunk: &[u8]) -> String {
        self.buffer.extend_from_slice(chunk);

        let mut content = String::new();
        while let Some(newline) = self.buffer.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=newline).collect();
            if let Some(delta) = decode_line(&line) {
                content.push_str(&delta);
            }
        }
        content
    }

    /// Decode whatever is left once the upstream stream ends
    pub fn finish(&mut self) -> String {
        let line = std::mem::take(&mut self.buffer);
        decode_line(&line).unwrap_or_default()
    }
}

fn decode_line(line: &[u8]) -> Option<String> {
    let line = String::from_utf8_lossy(line);
    let data = line.trim_end_matches(['\r', '\n']).strip_prefix("data: ")?;
    if data == "[DONE]" {
        return None;
    }

    let chunk: StreamChunk = serde_json::from_str(data).ok()?;
    chunk
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.delta.content)
        .filter(|content| !content.is_empty())
}

/// System prompt describing the site and its current content
pub fn system_prompt(communities: &[CommunityBrief], events: &[EventBrief]) -> String {
    let mut context = String::from("\n\n**CURRENT SITE DATA:**\n");

    if communities.is_empty() {
        context.push_str("Active Communities: None currently created.\n");
    } else {
        context.push_str("Active Communities:\n");
        for community in communities {
            let description = community.description.as_deref().unwrap_or("No description");
            context.push_str(&format!("- {}: {}\n", community.name, description));
        }
    }

    if !events.is_empty() {
        context.push_str("\nUpcoming Events:\n");
        for event in events {
            context.push_str(&format!(
                "- {} ({}) at {}\n",
                event.title,
                event.start_date.format("%Y-%m-%d %H:%M UTC"),
                event.location
            ));
        }
    }

    format!(
        "You are the AI Assistant for Campus Hub, the unified campus resource and event manager. \
Your purpose is to help students and staff streamline campus activities, book resources, and collaborate.\n\n\
Features you know about:\n\
- **Communities**: Students can join and create communities for interests and clubs (Dashboard > Communities).\n\
- **General Chat**: A campus-wide chatroom for everyone.\n\
- **Events**: Users can track and join campus events.\n\
- **Resources**: Booking system for campus resources.\n\
{context}\n\
Be helpful, friendly, and concise. If you don't know something, suggest checking the Dashboard."
    )
}

/// Client for the chat completion provider
#[derive(Clone)]
pub struct ChatClient {
    http: reqwest::Client,
    config: ChatConfig,
}

impl ChatClient {
    pub fn new(config: ChatConfig) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self { http, config })
    }

    /// Start a streamed completion and return the decoded content stream
    pub async fn stream(
        &self,
        system_prompt: String,
        history: Vec<ChatMessage>,
    ) -> Result<BoxStream<'static, Result<Bytes, reqwest::Error>>, ApiError> {
        let api_key = self.config.api_key.as_deref().ok_or_else(|| {
            error!("Chat requested but OPENROUTER_API_KEY is not configured");
            ApiError::Upstream {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                message: "Missing chat provider API key".to_string(),
                details: String::new(),
            }
        })?;

        let mut messages = Vec::with_capacity(history.len() + 1);
        messages.push(ChatMessage {
            role: "system".to_string(),
            content: system_prompt,
        });
        messages.extend(history);

        let body = CompletionRequest {
            model: &self.config.model,
            messages,
            stream: true,
        };

        let mut request = self
            .http
            .post(self.config.completions_url())
            .bearer_auth(api_key)
            .header("X-Title", &self.config.title)
            .json(&body);
        if let Some(referer) = &self.config.referer {
            request = request.header("HTTP-Referer", referer);
        }

        let response = request.send().await.map_err(|e| {
            error!("Failed to reach chat provider: {}", e);
            ApiError::Upstream {
                status: StatusCode::BAD_GATEWAY,
                message: "Failed to connect to chat provider".to_string(),
                details: e.to_string(),
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let details = response.text().await.unwrap_or_default();
            error!("Chat provider error {}: {}", status, details);
            return Err(ApiError::Upstream {
                status: StatusCode::from_u16(status.as_u16()).unwrap_or(StatusCode::BAD_GATEWAY),
                message: format!(
                    "Chat provider error: {}",
                    status.canonical_reason().unwrap_or("unknown")
                ),
                details,
            });
        }

        info!(model = %self.config.model, "Streaming chat completion");
        Ok(decode_stream(response.bytes_stream()).boxed())
    }
}

/// Map a raw SSE byte stream to a stream of content deltas
pub fn decode_stream<S, E>(upstream: S) -> impl Stream<Item = Result<Bytes, E>> + Send + 'static
where
    S: Stream<Item = Result<Bytes, E>> + Send + 'static,
    E: Send + 'static,
{
    let state = (Box::pin(upstream), SseDecoder::default(), false);

    futures::stream::unfold(state, |(mut upstream, mut decoder, done)| async move {
        if done {
            return None;
        }

        match upstream.next().await {
            Some(Ok(chunk)) => {
                let content = decoder.push(&chunk);
                Some((Ok(Bytes::from(content)), (upstream, decoder, false)))
            }
            Some(Err(e)) => Some((Err(e), (upstream, decoder, true))),
            None => {
                let rest = decoder.finish();
                (!rest.is_empty()).then(|| (Ok(Bytes::from(rest)), (upstream, decoder, true)))
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn delta(content: &str) -> String {
        format!(
            "data: {}\n",
            serde_json::json!({ "choices": [{ "delta": { "content": content } }] })
        )
    }

    #[test]
    fn decodes_complete_lines() {
        let mut decoder = SseDecoder::default();
        let chunk = format!("{}\n{}data: [DONE]\n", delta("Hel"), delta("lo"));
        assert_eq!(decoder.push(chunk.as_bytes()), "Hello");
    }

    #[test]
    fn buffers_partial_lines_across_chunks() {
        let mut decoder = SseDecoder::default();
        let line = delta("campus");
        let (first, second) = line.as_bytes().split_at(17);

        assert_eq!(decoder.push(first), "");
        assert_eq!(decoder.push(second), "campus");
    }

    #[test]
    fn keeps_multibyte_characters_split_across_chunks() {
        let mut decoder = SseDecoder::default();
        let line = delta("café");
        let bytes = line.as_bytes();
        // split inside the two-byte 'é'
        let cut = line.find('é').unwrap() + 1;

        assert_eq!(decoder.push(&bytes[..cut]), "");
        assert_eq!(decoder.push(&bytes[cut..]), "café");
    }

    #[test]
    fn ignores_comments_and_malformed_lines() {
        let mut decoder = SseDecoder::default();
        let chunk = ": OPENROUTER PROCESSING\r\ndata: {not json}\n\ndata: {\"choices\":[]}\n";
        assert_eq!(decoder.push(chunk.as_bytes()), "");
    }

    #[test]
    fn finish_flushes_unterminated_line() {
        let mut decoder = SseDecoder::default();
        let line = delta("tail");
        assert_eq!(decoder.push(line.trim_end().as_bytes()), "");
        assert_eq!(decoder.finish(), "tail");
    }

    #[tokio::test]
    async fn stream_yields_content_only() {
        let chunks: Vec<Result<Bytes, std::io::Error>> = vec![
            Ok(Bytes::from(delta("One, "))),
            Ok(Bytes::from(delta("two").into_bytes()[..10].to_vec())),
            Ok(Bytes::from(delta("two").into_bytes()[10..].to_vec())),
            Ok(Bytes::from_static(b"data: [DONE]\n")),
        ];

        let output: Vec<Bytes> = decode_stream(futures::stream::iter(chunks))
            .map(|item| item.unwrap())
            .collect()
            .await;
        let text: String = output
            .iter()
            .map(|bytes| String::from_utf8_lossy(bytes).into_owned())
            .collect();

        assert_eq!(text, "One, two");
    }

    #[test]
    fn prompt_lists_site_data() {
        let communities = vec![CommunityBrief {
            name: "Chess Club".to_string(),
            description: None,
        }];
        let events = vec![EventBrief {
            title: "Career Fair".to_string(),
            start_date: Utc.with_ymd_and_hms(2025, 4, 2, 14, 0, 0).unwrap(),
            location: "Main Hall".to_string(),
        }];

        let prompt = system_prompt(&communities, &events);
        assert!(prompt.contains("- Chess Club: No description"));
        assert!(prompt.contains("- Career Fair (2025-04-02 14:00 UTC) at Main Hall"));

        let empty = system_prompt(&[], &[]);
        assert!(empty.contains("Active Communities: None currently created."));
        assert!(!empty.contains("Upcoming Events"));
    }
}
