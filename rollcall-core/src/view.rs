/* Stato della vista "Authorized Users" lato client.
    La vista parte vuota, lancia una sola fetch alla prima visualizzazione e poi
    resta in Loaded o Failed. Non dipende da yew, così la stessa logica si testa
    in nativo e il componente web si limita a disegnare `items()`.
*/
use crate::models::User;

/// Fasi della vista lista.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ViewState {
    /// Appena montata, lista vuota.
    #[default]
    Initial,
    /// Fetch in volo.
    Loading,
    /// Risposta 2xx con un array JSON valido.
    Loaded(Vec<User>),
    /// Errore di rete, status non 2xx o body illeggibile: lista vuota, nessun messaggio.
    Failed,
}

/// Eventi che fanno avanzare la vista.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewEvent {
    FetchStarted,
    FetchSucceeded(Vec<User>),
    FetchFailed,
}

impl ViewEvent {
    /// Converte l'esito della fetch nell'evento corrispondente, qualunque sia l'errore.
    pub fn from_outcome<E>(outcome: Result<Vec<User>, E>) -> Self {
        match outcome {
            Ok(users) => ViewEvent::FetchSucceeded(users),
            Err(_) => ViewEvent::FetchFailed,
        }
    }
}

/// Una riga della lista da disegnare: `key` è l'id, `label` il testo del `<li>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListItem {
    pub key: i64,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct UsersView {
    state: ViewState,
}

impl UsersView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &ViewState {
        &self.state
    }

    /// Vero solo prima della prima fetch: i render successivi non rifanno la richiesta.
    pub fn should_fetch(&self) -> bool {
        matches!(self.state, ViewState::Initial)
    }

    /// Applica un evento. Le transizioni non previste vengono ignorate
    /// (per esempio un esito che arriva quando la vista non è in Loading).
    pub fn apply(&mut self, event: ViewEvent) {
        let next = match (&self.state, event) {
            (ViewState::Initial, ViewEvent::FetchStarted) => ViewState::Loading,
            (ViewState::Loading, ViewEvent::FetchSucceeded(users)) => ViewState::Loaded(users),
            (ViewState::Loading, ViewEvent::FetchFailed) => ViewState::Failed,
            _ => return,
        };
        self.state = next;
    }

    /// Utenti attualmente mostrati; vuoto in ogni stato diverso da Loaded.
    pub fn users(&self) -> &[User] {
        match &self.state {
            ViewState::Loaded(users) => users,
            _ => &[],
        }
    }

    pub fn items(&self) -> Vec<ListItem> {
        self.users()
            .iter()
            .map(|u| ListItem {
                key: u.id,
                label: u.display_name(),
            })
            .collect()
    }
}
