use crate::models::User;
/*
    contratto HTTP tra client e server: percorsi e forma delle risposte
*/

/// GET: lista completa degli utenti autorizzati.
pub const USERS_PATH: &str = "/api/users";

/// GET: stato della connessione al database (solo status code, nessun body).
pub const HEALTH_PATH: &str = "/health";

/// Body di una risposta 200 a `GET /api/users`: un array JSON nudo,
/// senza envelope.
pub type ListUsersResponse = Vec<User>;
