//! Google Gemini `generateContent` client.
//!
//! Sends the fixed system instruction plus the technician-context prompt and
//! asks for a JSON response at temperature zero. The client sets no timeout
//! of its own; the caller bounds the call.

use async_trait::async_trait;
use lp_protocol::CommandIntent;
use serde::{Deserialize, Serialize};

use super::{CommandInterpreter, InterpretRequest, intent_from_text, system_instruction, user_prompt};
use crate::config::GeminiConfig;
use crate::error::{InterpretError, InterpretResult};

/// Marker the provider puts in the error message for a bad key.
const INVALID_KEY_MESSAGE: &str = "API key not valid";
/// Machine-readable reason for the same condition.
const INVALID_KEY_REASON: &str = "API_KEY_INVALID";

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    system_instruction: Content<'a>,
    contents: Vec<Content<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct Content<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'a str>,
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_mime_type: &'static str,
    temperature: f32,
}

/// Response body (only fields we need).
#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: String,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
    #[serde(default)]
    details: Vec<ErrorDetail>,
}

#[derive(Deserialize)]
struct ErrorDetail {
    #[serde(default)]
    reason: Option<String>,
}

impl GenerateResponse {
    /// Concatenated text of the first candidate.
    fn text(&self) -> String {
        self.candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .map(|c| c.parts.iter().map(|p| p.text.as_str()).collect())
            .unwrap_or_default()
    }
}

/// Command interpreter backed by the Gemini REST API.
pub struct GeminiInterpreter {
    client: reqwest::Client,
    config: GeminiConfig,
}

impl GeminiInterpreter {
    pub fn new(config: GeminiConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().build()?;
        Ok(Self { client, config })
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.config.base_url.trim_end_matches('/'),
            self.config.model
        )
    }
}

/// Classify a non-success response body.
fn classify_error(status: reqwest::StatusCode, body: &str) -> InterpretError {
    let parsed: Option<ErrorBody> = serde_json::from_str::<ErrorEnvelope>(body)
        .ok()
        .map(|e| e.error);

    let invalid_key = match &parsed {
        Some(err) => {
            err.message.contains(INVALID_KEY_MESSAGE)
                || err
                    .details
                    .iter()
                    .any(|d| d.reason.as_deref() == Some(INVALID_KEY_REASON))
        }
        None => body.contains(INVALID_KEY_MESSAGE),
    };
    if invalid_key {
        return InterpretError::InvalidCredential;
    }

    let detail = parsed
        .map(|e| e.message)
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| format!("HTTP {status}"));
    InterpretError::Communication(detail)
}

#[async_trait]
impl CommandInterpreter for GeminiInterpreter {
    async fn complete(&self, request: &InterpretRequest<'_>) -> InterpretResult<CommandIntent> {
        let instruction = system_instruction();
        let prompt = user_prompt(request.user_text, request.technician_names);

        let body = GenerateRequest {
            system_instruction: Content {
                role: None,
                parts: vec![Part { text: &instruction }],
            },
            contents: vec![Content {
                role: Some("user"),
                parts: vec![Part { text: &prompt }],
            }],
            generation_config: GenerationConfig {
                response_mime_type: "application/json",
                temperature: self.config.temperature,
            },
        };

        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", request.credential)
            .json(&body)
            .send()
            .await
            .map_err(|e| InterpretError::Communication(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            tracing::warn!(status = %status, model = %self.config.model, "gemini returned non-200");
            return Err(classify_error(status, &text));
        }

        let parsed: GenerateResponse = response
            .json()
            .await
            .map_err(|e| InterpretError::Malformed(e.to_string()))?;

        let text = parsed.text();
        let intent = intent_from_text(&text);
        if intent.is_err() {
            tracing::warn!(content = %text, "gemini returned invalid intent JSON");
        }
        intent
    }

    fn engine_name(&self) -> &str {
        "gemini"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lp_protocol::CommandAction;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const MODEL: &str = "gemini-test";

    /// Helper: build a generateContent response body.
    fn gemini_response(text: &str) -> serde_json::Value {
        serde_json::json!({
            "candidates": [{
                "content": {"role": "model", "parts": [{"text": text}]},
                "finishReason": "STOP"
            }]
        })
    }

    fn interpreter_for(server: &MockServer) -> GeminiInterpreter {
        GeminiInterpreter::new(GeminiConfig {
            base_url: server.uri(),
            model: MODEL.into(),
            temperature: 0.0,
        })
        .unwrap()
    }

    fn endpoint() -> String {
        format!("/v1beta/models/{MODEL}:generateContent")
    }

    async fn complete(server: &MockServer, names: &[String]) -> InterpretResult<CommandIntent> {
        interpreter_for(server)
            .complete(&InterpretRequest {
                user_text: "criar OS 1290 iphone 14 tela quebrada 800 reais tecnico andré",
                technician_names: names,
                credential: "test-key",
            })
            .await
    }

    #[tokio::test]
    async fn parse_create_order() {
        let server = MockServer::start().await;
        let reply = r#"{"action": "CREATE_OS", "message": "Ok, criando OS #1290.", "data": {"id": 1290, "modelo": "iphone 14", "defeito_reclamado": "tela quebrada", "valor_cobrado": 800, "tecnico_nome": "andré"}}"#;
        Mock::given(method("POST"))
            .and(path(endpoint()))
            .and(header("x-goog-api-key", "test-key"))
            .and(body_partial_json(serde_json::json!({
                "generationConfig": {"responseMimeType": "application/json"},
                "contents": [{"role": "user", "parts": [{"text": "Contexto - Técnicos disponíveis: André. Comando do usuário: criar OS 1290 iphone 14 tela quebrada 800 reais tecnico andré"}]}]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(gemini_response(reply)))
            .expect(1)
            .mount(&server)
            .await;

        let intent = complete(&server, &["André".into()]).await.unwrap();
        let CommandAction::CreateOrder(payload) = intent.action else {
            panic!("expected create order");
        };
        assert_eq!(payload.id.0, 1290);
        assert_eq!(payload.technician_name.as_deref(), Some("andré"));
        assert_eq!(intent.message, "Ok, criando OS #1290.");
    }

    #[tokio::test]
    async fn split_parts_are_joined() {
        let server = MockServer::start().await;
        let body = serde_json::json!({
            "candidates": [{"content": {"parts": [
                {"text": "{\"action\": \"NEED_INFO\","},
                {"text": " \"message\": \"Qual o número da OS?\"}"}
            ]}}]
        });
        Mock::given(method("POST"))
            .and(path(endpoint()))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(&server)
            .await;

        let intent = complete(&server, &[]).await.unwrap();
        assert_eq!(intent.action, CommandAction::NeedMoreInfo);
    }

    #[tokio::test]
    async fn invalid_key_by_message() {
        let server = MockServer::start().await;
        let body = serde_json::json!({
            "error": {
                "code": 400,
                "message": "API key not valid. Please pass a valid API key.",
                "status": "INVALID_ARGUMENT"
            }
        });
        Mock::given(method("POST"))
            .and(path(endpoint()))
            .respond_with(ResponseTemplate::new(400).set_body_json(body))
            .mount(&server)
            .await;

        assert_eq!(
            complete(&server, &[]).await.unwrap_err(),
            InterpretError::InvalidCredential
        );
    }

    #[tokio::test]
    async fn invalid_key_by_reason() {
        let server = MockServer::start().await;
        let body = serde_json::json!({
            "error": {
                "code": 400,
                "message": "Bad request",
                "details": [{"@type": "type.googleapis.com/google.rpc.ErrorInfo", "reason": "API_KEY_INVALID"}]
            }
        });
        Mock::given(method("POST"))
            .and(path(endpoint()))
            .respond_with(ResponseTemplate::new(400).set_body_json(body))
            .mount(&server)
            .await;

        assert_eq!(
            complete(&server, &[]).await.unwrap_err(),
            InterpretError::InvalidCredential
        );
    }

    #[tokio::test]
    async fn other_errors_keep_provider_message() {
        let server = MockServer::start().await;
        let body = serde_json::json!({
            "error": {"code": 429, "message": "Resource has been exhausted", "status": "RESOURCE_EXHAUSTED"}
        });
        Mock::given(method("POST"))
            .and(path(endpoint()))
            .respond_with(ResponseTemplate::new(429).set_body_json(body))
            .mount(&server)
            .await;

        let err = complete(&server, &[]).await.unwrap_err();
        assert_eq!(
            err,
            InterpretError::Communication("Resource has been exhausted".into())
        );
        assert!(err.user_message().starts_with("Erro no assistente: "));
    }

    #[tokio::test]
    async fn non_json_error_body_reports_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(endpoint()))
            .respond_with(ResponseTemplate::new(503).set_body_string("upstream down"))
            .mount(&server)
            .await;

        let err = complete(&server, &[]).await.unwrap_err();
        assert!(matches!(err, InterpretError::Communication(ref d) if d.contains("503")));
    }

    #[tokio::test]
    async fn empty_text_is_malformed() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(endpoint()))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"candidates": []})))
            .mount(&server)
            .await;

        assert!(matches!(
            complete(&server, &[]).await,
            Err(InterpretError::Malformed(_))
        ));
    }

    #[tokio::test]
    async fn invalid_json_is_malformed() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(endpoint()))
            .respond_with(ResponseTemplate::new(200).set_body_json(gemini_response("isto não é JSON")))
            .mount(&server)
            .await;

        assert!(matches!(
            complete(&server, &[]).await,
            Err(InterpretError::Malformed(_))
        ));
    }

    #[tokio::test]
    async fn unreachable_host_is_communication_error() {
        let interpreter = GeminiInterpreter::new(GeminiConfig {
            base_url: "http://127.0.0.1:1".into(),
            model: MODEL.into(),
            temperature: 0.0,
        })
        .unwrap();
        let err = interpreter
            .complete(&InterpretRequest {
                user_text: "oi",
                technician_names: &[],
                credential: "k",
            })
            .await
            .unwrap_err();
        assert!(matches!(err, InterpretError::Communication(_)));
    }

    #[test]
    fn endpoint_trims_trailing_slash() {
        let interpreter = GeminiInterpreter::new(GeminiConfig {
            base_url: "https://example.test/".into(),
            model: "m".into(),
            temperature: 0.0,
        })
        .unwrap();
        assert_eq!(
            interpreter.endpoint(),
            "https://example.test/v1beta/models/m:generateContent"
        );
    }
}
