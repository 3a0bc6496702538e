use serde::{Deserialize, Serialize};

/// Codici macchina usati nel campo `code`.
pub mod codes {
    /// Il database non è raggiungibile (connessione persa, pool chiuso).
    pub const DATABASE_UNAVAILABLE: &str = "database_unavailable";
    /// La query non ha risposto entro il timeout.
    pub const DATABASE_TIMEOUT: &str = "database_timeout";
    /// La query è fallita (errore SQL o righe non decodificabili).
    pub const QUERY_FAILED: &str = "query_failed";
}

/// Body di errore restituito dal server insieme a uno status 5xx.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Error {
    /// Codice messaggio
    pub code: String,

    pub message: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl Error {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }
}
