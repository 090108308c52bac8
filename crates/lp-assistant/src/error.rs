//! Error types for the persistence contracts and the command interpreter.

use lp_protocol::{CommandIntent, OrderId};
use thiserror::Error;

/// Errors reported by a persistence collaborator.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("order #{0} already exists")]
    Duplicate(OrderId),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("rejected by backend: {0}")]
    Rejected(String),

    #[error("backend error: {0}")]
    Backend(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        match &e {
            sqlx::Error::RowNotFound => StoreError::NotFound(e.to_string()),
            sqlx::Error::Database(db) => StoreError::Rejected(db.message().to_string()),
            _ => StoreError::Backend(e.to_string()),
        }
    }
}

/// Convenience alias for persistence results.
pub type StoreResult<T> = Result<T, StoreError>;

/// Failure classes of one interpreter call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InterpretError {
    #[error("no API credential configured")]
    MissingCredential,

    #[error("API credential rejected by provider")]
    InvalidCredential,

    #[error("interpreter timed out")]
    Timeout,

    #[error("malformed model response: {0}")]
    Malformed(String),

    #[error("{0}")]
    Communication(String),
}

impl InterpretError {
    /// Text shown to the user in the chat history.
    pub fn user_message(&self) -> String {
        match self {
            Self::MissingCredential => "CONFIGURAÇÃO NECESSÁRIA: a chave da API do Google Gemini não foi configurada. Cadastre-a na tela de Ajustes para usar o assistente.".to_string(),
            Self::InvalidCredential => "CONFIGURAÇÃO INVÁLIDA: a chave da API do Google Gemini salva é inválida. Verifique-a na tela de Ajustes.".to_string(),
            Self::Timeout => "A resposta demorou muito. Verifique sua conexão ou tente novamente mais tarde.".to_string(),
            Self::Malformed(_) => "O assistente retornou uma resposta em formato inesperado. Tente novamente.".to_string(),
            Self::Communication(detail) => format!("Erro no assistente: {detail}"),
        }
    }

    /// Whether resending the same text may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Timeout | Self::Malformed(_) | Self::Communication(_))
    }

    /// Collapse into the `UNKNOWN` intent the chat surfaces.
    pub fn into_intent(self) -> CommandIntent {
        CommandIntent::unrecognized(self.user_message())
    }
}

/// Convenience alias for interpreter results.
pub type InterpretResult<T> = Result<T, InterpretError>;
