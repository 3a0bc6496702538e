//! rollcall-core: tipi condivisi tra client e server (modello utente, contratto HTTP,
//! body di errore, stato della vista lista).
//! Niente I/O o dipendenze non compatibili con WASM.

pub mod error;
pub mod models;
pub mod protocol;
pub mod view;

// Re-export utili per ridurre i percorsi nei crate client/server
pub use error::Error;
pub use models::user::User;
pub use protocol::http::{ListUsersResponse, HEALTH_PATH, USERS_PATH};
pub use view::{ListItem, UsersView, ViewEvent, ViewState};
