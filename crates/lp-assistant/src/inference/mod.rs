//! Command interpretation through an external language model.
//!
//! Converts shop-floor text ("criar OS 1290 iphone 14 tela quebrada 800
//! reais tecnico andré") into a [`CommandIntent`]. Engines only perform the
//! remote call and classify its failures; the credential check and the
//! timeout bound live outside them so every engine behaves the same:
//! - [`interpret`] refuses to call an engine without a credential.
//! - The chat session races the call against its configured timeout.

pub mod gemini;
pub mod mock;

use async_trait::async_trait;
use lp_protocol::{CommandIntent, tags};

use crate::error::{InterpretError, InterpretResult};

pub use gemini::GeminiInterpreter;
pub use mock::MockInterpreter;

/// One interpretation request.
#[derive(Debug, Clone, Copy)]
pub struct InterpretRequest<'a> {
    pub user_text: &'a str,
    /// Names the model may reference; embedded as prompt context.
    pub technician_names: &'a [String],
    pub credential: &'a str,
}

/// Trait for engines that turn free text into a structured intent.
#[async_trait]
pub trait CommandInterpreter: Send + Sync {
    /// Issue exactly one completion request. No retries.
    async fn complete(&self, request: &InterpretRequest<'_>) -> InterpretResult<CommandIntent>;

    /// Name of this engine (for logging).
    fn engine_name(&self) -> &str;
}

/// Interpret `text`, failing fast with `MissingCredential` when no usable
/// credential is configured. The engine is not called in that case.
pub async fn interpret(
    engine: &dyn CommandInterpreter,
    text: &str,
    technician_names: &[String],
    credential: Option<&str>,
) -> InterpretResult<CommandIntent> {
    let Some(credential) = credential.map(str::trim).filter(|c| !c.is_empty()) else {
        tracing::info!(engine = engine.engine_name(), "no API credential configured");
        return Err(InterpretError::MissingCredential);
    };

    let request = InterpretRequest {
        user_text: text,
        technician_names,
        credential,
    };

    match engine.complete(&request).await {
        Ok(intent) => {
            tracing::debug!(engine = engine.engine_name(), actionable = intent.is_actionable(), "intent parsed");
            Ok(intent)
        }
        Err(e) => {
            tracing::warn!(engine = engine.engine_name(), error = %e, "interpreter call failed");
            Err(e)
        }
    }
}

/// Parse the model's text reply; empty or non-JSON output is `Malformed`.
pub fn intent_from_text(text: &str) -> InterpretResult<CommandIntent> {
    CommandIntent::from_model_output(text).map_err(|e| InterpretError::Malformed(e.to_string()))
}

/// Fixed instruction describing the JSON-only reply contract.
pub fn system_instruction() -> String {
    format!(
        r#"Você converte comandos em texto livre para JSON no sistema LOJISTA PRO 2.0.
Responda APENAS com um objeto JSON válido, sem markdown e sem texto adicional, no formato:
{{"action": "NOME_DA_ACAO", "message": "Mensagem para o usuário.", "data": {{ ... }}}}

Ação permitida: "{create}".
Quando faltar informação obrigatória use "{need_info}"; quando o comando não for reconhecido use "{unknown}".

Regras de extração para "{create}":
- Campos: "id", "modelo", "defeito_reclamado", "valor_cobrado", "custo_pecas", "tecnico_nome".
- "id" (número da OS) é obrigatório. Sem ele, responda com "{need_info}" e uma message pedindo o número da OS.
- "tecnico_nome" precisa ser um dos nomes listados no contexto. Se nenhum servir, informe na message que o técnico não foi encontrado e liste os disponíveis.
- A "message" confirma a ação de forma amigável, por exemplo: "Ok, criando OS #1234 para o iPhone 13.""#,
        create = tags::CREATE_ORDER,
        need_info = tags::NEED_INFO,
        unknown = tags::UNKNOWN,
    )
}

/// User turn: technician context followed by the raw command.
pub fn user_prompt(text: &str, technician_names: &[String]) -> String {
    format!(
        "Contexto - Técnicos disponíveis: {}. Comando do usuário: {}",
        technician_names.join(", "),
        text
    )
}
