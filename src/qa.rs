// src/qa.rs

use crate::config::{QaBackend, QaSection};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Instructs the model to behave like an extractive question-answering model.
const SYSTEM_PROMPT: &str = "You answer questions about a business document \
(GST invoice, audit report, or similar) using ONLY the document text you are given.
Reply with the shortest span of the document text that answers the question, copied verbatim.
If the document does not contain the answer, reply with an empty string.
No explanations, no quotes, no markdown.";

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f64,
}

#[derive(Debug, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

/// Resolved endpoint configuration ready to make API calls.
struct ResolvedEndpoint {
    base_url: String,
    model: String,
    api_key: String,
}

/// Resolve the QA config section into a concrete endpoint.
fn resolve_endpoint(qa: &QaSection) -> Result<ResolvedEndpoint, Box<dyn std::error::Error>> {
    match qa.backend {
        QaBackend::Ollama => {
            info!(url = %qa.ollama.base_url, model = %qa.ollama.model, "Using Ollama (local) backend");
            Ok(ResolvedEndpoint {
                base_url: qa.ollama.base_url.clone(),
                model: qa.ollama.model.clone(),
                api_key: "ollama".to_string(), // required by API but ignored
            })
        }
        QaBackend::Remote => {
            let api_key = std::env::var("LLM_API_KEY")
                .map_err(|_| "LLM_API_KEY env var required for remote backend")?;
            info!(url = %qa.remote.base_url, model = %qa.remote.model, "Using remote API backend");
            Ok(ResolvedEndpoint {
                base_url: qa.remote.base_url.clone(),
                model: qa.remote.model.clone(),
                api_key,
            })
        }
        QaBackend::Disabled => {
            Err("Question answering is disabled; set [qa] backend in the config file".into())
        }
    }
}

/// Check if the Ollama server is reachable.
async fn check_ollama_health(client: &Client, base_url: &str) -> bool {
    // Ollama's health endpoint is at the root (not under /v1)
    let health_url = base_url.trim_end_matches('/').trim_end_matches("/v1");

    match client
        .get(health_url)
        .timeout(std::time::Duration::from_secs(3))
        .send()
        .await
    {
        Ok(resp) if resp.status().is_success() => {
            info!("Ollama server is reachable");
            true
        }
        Ok(resp) => {
            warn!(status = %resp.status(), "Ollama server returned non-OK status");
            false
        }
        Err(e) => {
            warn!(error = %e, "Ollama server not reachable");
            false
        }
    }
}

/// At most `max_chars` characters of `context`, cut on a char boundary.
fn truncate_context(context: &str, max_chars: usize) -> &str {
    match context.char_indices().nth(max_chars) {
        Some((idx, _)) => &context[..idx],
        None => context,
    }
}

/// Answer a question about the document text.
///
/// Returns an empty string without calling out when the question or the
/// context is blank. Only the first `max_context_chars` characters of the
/// context are sent.
pub async fn answer(
    question: &str,
    context: &str,
    qa: &QaSection,
) -> Result<String, Box<dyn std::error::Error>> {
    if question.trim().is_empty() || context.trim().is_empty() {
        return Ok(String::new());
    }

    let endpoint = resolve_endpoint(qa)?;
    let client = Client::new();

    if qa.backend == QaBackend::Ollama && !check_ollama_health(&client, &endpoint.base_url).await {
        return Err(format!(
            "Ollama is not running at {}. Start it with: ollama serve",
            endpoint.base_url
        )
        .into());
    }

    let context = truncate_context(context, qa.max_context_chars);
    let request = ChatRequest {
        model: endpoint.model.clone(),
        messages: vec![
            ChatMessage {
                role: "system".to_string(),
                content: SYSTEM_PROMPT.to_string(),
            },
            ChatMessage {
                role: "user".to_string(),
                content: format!("Document text:\n\n{context}\n\nQuestion: {question}"),
            },
        ],
        temperature: 0.0,
    };

    let url = format!("{}/chat/completions", endpoint.base_url.trim_end_matches('/'));
    let response = client
        .post(&url)
        .header("Authorization", format!("Bearer {}", endpoint.api_key))
        .json(&request)
        .send()
        .await?;

    if !response.status().is_success() {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        return Err(format!("LLM API error {status}: {body}").into());
    }

    let chat_response: ChatResponse = response.json().await?;
    let content = chat_response
        .choices
        .first()
        .map(|c| c.message.content.as_str())
        .ok_or("Empty response from LLM")?;

    let answer = content.trim().trim_matches('"').trim().to_string();
    info!(question = %question, answer_len = answer.len(), "Question answered");
    Ok(answer)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_context_on_char_boundary() {
        assert_eq!(truncate_context("₹1,000 total", 2), "₹1");
        assert_eq!(truncate_context("short", 2000), "short");
        assert_eq!(truncate_context("", 10), "");
    }

    #[tokio::test]
    async fn test_blank_inputs_short_circuit() {
        let qa = QaSection::default();
        assert_eq!(answer("", "some text", &qa).await.unwrap(), "");
        assert_eq!(answer("Who is the auditor?", "  \n", &qa).await.unwrap(), "");
    }

    #[tokio::test]
    async fn test_disabled_backend_is_an_error() {
        let qa = QaSection::default();
        let err = answer("Who is the auditor?", "Auditor: R. K. Sharma", &qa)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("[qa] backend"));
    }
}
