use std::time::Duration;

use reqwest::StatusCode;
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};

use crate::error::GenerateError;

pub const API_URL: &str = "https://api.anthropic.com/v1/messages";
pub const API_VERSION: &str = "2023-06-01";

/// Fixed model for the remote path; the CLI tier flag does not apply here.
pub const API_MODEL: &str = "claude-sonnet-4-5-20250929";

/// Terse, deterministic output is preferred over creative variation.
const MAX_TOKENS: u32 = 1000;
const TEMPERATURE: f32 = 0.3;

/// Minimal request/response structs for the Anthropic Messages API.
#[derive(Serialize)]
struct MessagesRequest {
    model: String,
    max_tokens: u32,
    temperature: f32,
    messages: Vec<Message>,
}

#[derive(Serialize)]
struct Message {
    role: String,
    content: String,
}

#[derive(Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
}

#[derive(Deserialize)]
struct ContentBlock {
    text: Option<String>,
}

/// Blocking client for the hosted text-generation endpoint.
pub struct AnthropicClient {
    client: Client,
    api_key: String,
    base_url: String,
}

impl AnthropicClient {
    pub fn new(api_key: String) -> Self {
        Self::with_base_url(api_key, API_URL)
    }

    pub fn with_base_url(api_key: String, base_url: impl Into<String>) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(120))
            .build()
            .expect("failed to build HTTP client");

        AnthropicClient {
            client,
            api_key,
            base_url: base_url.into(),
        }
    }

    /// Send the prompt as a single user turn and return the generated text.
    pub fn generate(
        &self,
        prompt: &str,
        progress: Option<&dyn Fn(&str)>,
    ) -> Result<String, GenerateError> {
        if let Some(notify) = progress {
            notify("Connecting to Anthropic API...");
        }

        let request = MessagesRequest {
            model: API_MODEL.to_string(),
            max_tokens: MAX_TOKENS,
            temperature: TEMPERATURE,
            messages: vec![Message {
                role: "user".into(),
                content: prompt.to_string(),
            }],
        };

        log::info!("Calling Anthropic model {API_MODEL:?}");

        let response = self
            .client
            .post(&self.base_url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION)
            .json(&request)
            .send()
            .map_err(|e| GenerateError::Backend {
                detail: format!("failed to send request to Anthropic: {e}"),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(match status {
                StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                    GenerateError::InvalidCredential
                }
                StatusCode::TOO_MANY_REQUESTS => GenerateError::RateLimit,
                _ => GenerateError::Backend {
                    detail: format!(
                        "Anthropic API error: HTTP {} - {}",
                        status.as_u16(),
                        response.text().unwrap_or_default()
                    ),
                },
            });
        }

        let parsed: MessagesResponse = response.json().map_err(|e| GenerateError::Backend {
            detail: format!("failed to parse Anthropic response: {e}"),
        })?;

        parsed
            .content
            .into_iter()
            .find_map(|block| block.text)
            .ok_or_else(|| GenerateError::Backend {
                detail: "no text content returned from Anthropic".to_string(),
            })
    }
}

/// One-shot HTTP listener answering a canned response, for exercising the
/// client without the network.
#[cfg(test)]
pub(crate) mod fake_server {
    use std::io::{Read, Write};
    use std::net::TcpListener;
    use std::thread::{self, JoinHandle};

    /// Serve exactly one request with `status_line` (e.g. "200 OK") and
    /// `body`, returning the base URL to point the client at.
    pub fn spawn(status_line: &str, body: &str) -> (String, JoinHandle<()>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let url = format!("http://{}/v1/messages", listener.local_addr().unwrap());
        let status_line = status_line.to_string();
        let body = body.to_string();

        let handle = thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            read_request(&mut stream);
            let response = format!(
                "HTTP/1.1 {status_line}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                body.len()
            );
            stream.write_all(response.as_bytes()).unwrap();
        });

        (url, handle)
    }

    /// Read headers plus the content-length body so the response is not
    /// written before the client finished sending.
    fn read_request(stream: &mut impl Read) {
        let mut request = Vec::new();
        let mut buf = [0u8; 1024];
        loop {
            let Ok(n) = stream.read(&mut buf) else { break };
            if n == 0 {
                break;
            }
            request.extend_from_slice(&buf[..n]);

            let Some(header_end) = request.windows(4).position(|w| w == b"\r\n\r\n") else {
                continue;
            };
            let headers = String::from_utf8_lossy(&request[..header_end]);
            let content_length = headers
                .lines()
                .find_map(|line| {
                    let (name, value) = line.split_once(':')?;
                    name.eq_ignore_ascii_case("content-length")
                        .then(|| value.trim().parse::<usize>().ok())
                        .flatten()
                })
                .unwrap_or(0);
            if request.len() >= header_end + 4 + content_length {
                break;
            }
        }
    }
}
