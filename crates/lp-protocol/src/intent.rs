//! Structured command intents produced by the language model.
//!
//! The model replies with untyped JSON of the shape
//! `{"action": "...", "message": "...", "data": {...}}`. This module turns
//! that reply into a closed [`CommandAction`] and checks the per-action
//! required fields, so an action tag alone is never trusted.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::order::OrderId;

/// Wire tags the model may emit in the `action` field.
pub mod tags {
    pub const CREATE_ORDER: &str = "CREATE_OS";
    pub const NEED_INFO: &str = "NEED_INFO";
    pub const UNKNOWN: &str = "UNKNOWN";

    /// Reserved by the prompt contract; no handler exists for them yet.
    pub const RESERVED: &[&str] = &[
        "UPDATE_STATUS",
        "RECORD_PAYMENT",
        "CREATE_LOJISTA",
        "CREATE_TECNICO",
    ];
}

/// A monetary amount as the model sent it: a number or display text such as `"R$ 1.234,50"`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MoneyInput {
    Number(f64),
    Text(String),
}

impl From<f64> for MoneyInput {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<&str> for MoneyInput {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

/// Payload of a `CREATE_OS` action after field validation.
#[derive(Debug, Clone, PartialEq)]
pub struct CreateOrderPayload {
    pub id: OrderId,
    pub model: Option<String>,
    pub defect: Option<String>,
    pub charged: Option<MoneyInput>,
    pub parts_cost: Option<MoneyInput>,
    pub technician_id: Option<String>,
    pub technician_name: Option<String>,
}

impl CreateOrderPayload {
    /// `None` when the required order id is missing or not a positive integer.
    fn from_data(data: &Value) -> Option<Self> {
        Some(Self {
            id: data.get("id").and_then(order_id_field)?,
            model: data.get("modelo").and_then(text_field),
            defect: data.get("defeito_reclamado").and_then(text_field),
            charged: data.get("valor_cobrado").and_then(money_field),
            parts_cost: data.get("custo_pecas").and_then(money_field),
            technician_id: data.get("tecnico_id").and_then(text_field),
            technician_name: data.get("tecnico_nome").and_then(text_field),
        })
    }
}

/// Closed set of actions the core distinguishes.
#[derive(Debug, Clone, PartialEq)]
pub enum CommandAction {
    /// Create a service order.
    CreateOrder(CreateOrderPayload),
    /// The model needs more input from the user.
    NeedMoreInfo,
    /// Nothing to do; only the message is shown.
    Unrecognized,
    /// A reserved tag, an unknown tag, or a tag whose required fields are missing.
    Other { tag: String, data: Value },
}

/// Parsed and validated model reply.
#[derive(Debug, Clone, PartialEq)]
pub struct CommandIntent {
    pub action: CommandAction,
    /// Human-readable text for the user. May be empty.
    pub message: String,
}

/// Why a model reply could not be turned into an intent.
#[derive(Debug, Error)]
pub enum IntentError {
    #[error("empty model output")]
    Empty,

    #[error("invalid intent JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Raw reply shape before classification.
#[derive(Debug, Deserialize)]
struct RawIntent {
    #[serde(default)]
    action: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    data: Option<Value>,
}

impl CommandIntent {
    /// An intent that carries only a message.
    pub fn unrecognized(message: impl Into<String>) -> Self {
        Self {
            action: CommandAction::Unrecognized,
            message: message.into(),
        }
    }

    /// Parse raw model output, tolerating markdown code fences around the JSON.
    pub fn from_model_output(text: &str) -> Result<Self, IntentError> {
        let json = extract_json(text);
        if json.is_empty() {
            return Err(IntentError::Empty);
        }
        let raw: RawIntent = serde_json::from_str(json)?;
        Ok(Self::classify(raw))
    }

    fn classify(raw: RawIntent) -> Self {
        let message = raw.message.unwrap_or_default();
        let data = raw.data.unwrap_or(Value::Null);
        let tag = raw.action.unwrap_or_default();

        let action = match tag.as_str() {
            tags::CREATE_ORDER => CreateOrderPayload::from_data(&data).map(CommandAction::CreateOrder),
            tags::NEED_INFO => Some(CommandAction::NeedMoreInfo),
            tags::UNKNOWN | "" => Some(CommandAction::Unrecognized),
            _ => None,
        }
        .unwrap_or_else(|| CommandAction::Other { tag, data });

        Self { action, message }
    }

    /// Whether the intent should trigger a follow-up state mutation.
    pub fn is_actionable(&self) -> bool {
        matches!(self.action, CommandAction::CreateOrder(_))
    }
}

/// Extract JSON from model output that may be wrapped in markdown code blocks.
pub fn extract_json(text: &str) -> &str {
    let trimmed = text.trim();

    if let Some(start) = trimmed.find("```json") {
        let after_fence = &trimmed[start + 7..];
        if let Some(end) = after_fence.find("```") {
            return after_fence[..end].trim();
        }
    }

    if let Some(start) = trimmed.find("```") {
        let after_fence = &trimmed[start + 3..];
        if let Some(end) = after_fence.find("```") {
            return after_fence[..end].trim();
        }
    }

    trimmed
}

fn order_id_field(value: &Value) -> Option<OrderId> {
    let id = match value {
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.fract() == 0.0 && *f >= 1.0 && *f < i64::MAX as f64)
                .map(|f| f as i64)
        }),
        Value::String(s) => s.trim().trim_start_matches('#').parse().ok(),
        _ => None,
    }?;
    OrderId::new(id)
}

fn text_field(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn money_field(value: &Value) -> Option<MoneyInput> {
    match value {
        Value::Number(n) => n.as_f64().map(MoneyInput::Number),
        Value::String(s) => Some(MoneyInput::Text(s.clone())),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_order_with_all_fields() {
        let raw = r#"{
            "action": "CREATE_OS",
            "message": "Ok, criando OS #1290 para o iPhone 14.",
            "data": {
                "id": 1290,
                "modelo": "iPhone 14",
                "defeito_reclamado": "tela quebrada",
                "valor_cobrado": 800,
                "custo_pecas": "R$ 250,00",
                "tecnico_nome": "andré"
            }
        }"#;
        let intent = CommandIntent::from_model_output(raw).unwrap();
        assert!(intent.is_actionable());
        let CommandAction::CreateOrder(payload) = intent.action else {
            panic!("expected CreateOrder");
        };
        assert_eq!(payload.id, OrderId(1290));
        assert_eq!(payload.model.as_deref(), Some("iPhone 14"));
        assert_eq!(payload.charged, Some(MoneyInput::Number(800.0)));
        assert_eq!(payload.parts_cost, Some(MoneyInput::Text("R$ 250,00".into())));
        assert_eq!(payload.technician_name.as_deref(), Some("andré"));
        assert!(payload.technician_id.is_none());
    }

    #[test]
    fn create_order_accepts_string_id() {
        let raw = r##"{"action": "CREATE_OS", "message": "", "data": {"id": "#77"}}"##;
        let intent = CommandIntent::from_model_output(raw).unwrap();
        match intent.action {
            CommandAction::CreateOrder(p) => assert_eq!(p.id, OrderId(77)),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn create_order_without_id_is_not_actionable() {
        let raw = r#"{"action": "CREATE_OS", "message": "Falta o número", "data": {"modelo": "S21"}}"#;
        let intent = CommandIntent::from_model_output(raw).unwrap();
        assert!(!intent.is_actionable());
        match intent.action {
            CommandAction::Other { tag, data } => {
                assert_eq!(tag, "CREATE_OS");
                assert_eq!(data["modelo"], "S21");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn create_order_with_zero_id_is_not_actionable() {
        let raw = r#"{"action": "CREATE_OS", "data": {"id": 0}}"#;
        let intent = CommandIntent::from_model_output(raw).unwrap();
        assert!(!intent.is_actionable());
    }

    #[test]
    fn create_order_with_out_of_range_float_id_is_not_actionable() {
        let raw = r#"{"action": "CREATE_OS", "data": {"id": 1e20, "tecnico_id": "t1"}}"#;
        let intent = CommandIntent::from_model_output(raw).unwrap();
        assert!(!intent.is_actionable());
        assert!(matches!(intent.action, CommandAction::Other { ref tag, .. } if tag == "CREATE_OS"));
    }

    #[test]
    fn create_order_with_integral_float_id() {
        let raw = r#"{"action": "CREATE_OS", "data": {"id": 1290.0, "tecnico_id": "t1"}}"#;
        let intent = CommandIntent::from_model_output(raw).unwrap();
        let CommandAction::CreateOrder(payload) = intent.action else {
            panic!("expected create order");
        };
        assert_eq!(payload.id, OrderId(1290));
    }

    #[test]
    fn escape_hatches() {
        let need = CommandIntent::from_model_output(
            r#"{"action": "NEED_INFO", "message": "Qual o número da OS?"}"#,
        )
        .unwrap();
        assert_eq!(need.action, CommandAction::NeedMoreInfo);
        assert_eq!(need.message, "Qual o número da OS?");

        let unknown =
            CommandIntent::from_model_output(r#"{"action": "UNKNOWN", "message": "?"}"#).unwrap();
        assert_eq!(unknown.action, CommandAction::Unrecognized);

        let missing = CommandIntent::from_model_output(r#"{"message": "oi"}"#).unwrap();
        assert_eq!(missing.action, CommandAction::Unrecognized);
    }

    #[test]
    fn reserved_tag_falls_back_to_other() {
        let raw = r#"{"action": "RECORD_PAYMENT", "message": "ok", "data": {"id": 3}}"#;
        let intent = CommandIntent::from_model_output(raw).unwrap();
        assert!(tags::RESERVED.contains(&"RECORD_PAYMENT"));
        assert!(matches!(intent.action, CommandAction::Other { ref tag, .. } if tag == "RECORD_PAYMENT"));
        assert!(!intent.is_actionable());
    }

    #[test]
    fn empty_output_is_an_error() {
        assert!(matches!(
            CommandIntent::from_model_output("   "),
            Err(IntentError::Empty)
        ));
    }

    #[test]
    fn non_json_output_is_an_error() {
        assert!(matches!(
            CommandIntent::from_model_output("claro! vou criar a OS"),
            Err(IntentError::Json(_))
        ));
        assert!(CommandIntent::from_model_output("[1, 2]").is_err());
    }

    #[test]
    fn fenced_output_is_unwrapped() {
        let raw = "```json\n{\"action\": \"NEED_INFO\", \"message\": \"Qual OS?\"}\n```";
        let intent = CommandIntent::from_model_output(raw).unwrap();
        assert_eq!(intent.action, CommandAction::NeedMoreInfo);
    }

    #[test]
    fn extract_json_variants() {
        let raw = r#"{"action": "UNKNOWN"}"#;
        assert_eq!(extract_json(raw), raw);
        assert_eq!(extract_json("```\n{\"a\": 1}\n```"), "{\"a\": 1}");
        assert_eq!(
            extract_json("Resultado:\n```json\n{\"a\": 1}\n```\nFim."),
            "{\"a\": 1}"
        );
    }

    #[test]
    fn blank_text_fields_are_dropped() {
        let raw = r#"{"action": "CREATE_OS", "data": {"id": 5, "modelo": "  ", "tecnico_nome": null}}"#;
        let intent = CommandIntent::from_model_output(raw).unwrap();
        let CommandAction::CreateOrder(payload) = intent.action else {
            panic!("expected CreateOrder");
        };
        assert!(payload.model.is_none());
        assert!(payload.technician_name.is_none());
    }
}
