use serde::{Deserialize, Serialize};

/// Utente autorizzato, così come viaggia sul wire tra server e client.
///
/// Il server legge le righe dalla tabella `users` e le espone solo con questi
/// tre campi; eventuali altre colonne della tabella non escono mai.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Chiave primaria, usata anche come key della lista nel front-end.
    pub id: i64,
    pub first: String,
    pub last: String,
}

impl User {
    pub fn new(id: i64, first: impl Into<String>, last: impl Into<String>) -> Self {
        Self {
            id,
            first: first.into(),
            last: last.into(),
        }
    }

    /// Etichetta mostrata nella lista: "{first} {last}".
    pub fn display_name(&self) -> String {
        format!("{} {}", self.first, self.last)
    }
}
