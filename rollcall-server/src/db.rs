/* Accesso al database.
    Un solo handle aperto all'avvio e passato agli handler dentro AppState.
    Il motore si sceglie dallo schema dell'URL: Postgres in produzione,
    SQLite per sviluppo locale e test. Il pool tiene al massimo una connessione,
    quindi le query delle richieste concorrenti vengono eseguite una alla volta.
*/
use std::time::Duration;

use async_trait::async_trait;
use rollcall_core::User;
use sqlx::{postgres::PgPoolOptions, sqlite::SqlitePoolOptions, FromRow, PgPool, SqlitePool};
use thiserror::Error;
use tracing::{error, info, warn};

// "first" e "last" sono keyword in Postgres: meglio quotarli.
// Il cast porta l'id a 64 bit sia con INTEGER che con SERIAL/BIGINT.
const SELECT_ALL_USERS: &str = r#"SELECT CAST(id AS BIGINT) AS id, "first", "last" FROM users"#;

const INITIAL_BACKOFF: Duration = Duration::from_millis(500);
const MAX_BACKOFF: Duration = Duration::from_secs(8);

#[derive(Error, Debug)]
pub enum DbError {
    #[error("unsupported database url: {0}")]
    UnsupportedUrl(String),

    /// Connessione iniziale fallita.
    #[error("cannot connect to database: {0}")]
    Connection(#[source] sqlx::Error),

    /// Connessione persa, pool chiuso o esaurito.
    #[error("database unavailable: {0}")]
    Unavailable(#[source] sqlx::Error),

    #[error("query timed out after {0:?}")]
    Timeout(Duration),

    #[error("query failed: {0}")]
    Query(#[source] sqlx::Error),
}

impl From<sqlx::Error> for DbError {
    fn from(e: sqlx::Error) -> Self {
        match e {
            sqlx::Error::PoolClosed
            | sqlx::Error::PoolTimedOut
            | sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::WorkerCrashed => DbError::Unavailable(e),
            other => DbError::Query(other),
        }
    }
}

/// Punto di aggancio tra handler HTTP e sorgente degli utenti.
/// `Database` è l'implementazione reale; i test ne usano di finte.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Tutte le righe della tabella `users`, in ordine non specificato.
    /// Un vettore vuoto significa "nessuna riga", mai "errore".
    async fn get_all_users(&self) -> Result<Vec<User>, DbError>;

    /// Verifica che la connessione sia utilizzabile.
    async fn ping(&self) -> Result<(), DbError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DbEngine {
    Postgres,
    Sqlite,
}

impl DbEngine {
    /// Riconosce il motore dallo schema dell'URL.
    pub fn detect(url: &str) -> Result<Self, DbError> {
        let s = url.trim_start();
        if s.starts_with("postgres://") || s.starts_with("postgresql://") {
            Ok(DbEngine::Postgres)
        } else if s.starts_with("sqlite:") {
            Ok(DbEngine::Sqlite)
        } else {
            // niente URL nel messaggio: può contenere la password
            let scheme = s.split(':').next().unwrap_or_default();
            Err(DbError::UnsupportedUrl(format!("scheme {scheme:?}")))
        }
    }
}

#[derive(Debug, Clone)]
pub struct ConnectOpts {
    /// Limite per aprire (o riprendere dal pool) la connessione.
    pub connect_timeout: Duration,
    /// Limite per ogni query.
    pub query_timeout: Duration,
    /// Tentativi aggiuntivi di connessione all'avvio.
    pub retries: u32,
}

impl Default for ConnectOpts {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(5),
            query_timeout: Duration::from_secs(10),
            retries: 0,
        }
    }
}

#[derive(Debug, Clone)]
enum Pool {
    Postgres(PgPool),
    Sqlite(SqlitePool),
}

#[derive(FromRow)]
struct UserRow {
    id: i64,
    first: String,
    last: String,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            id: row.id,
            first: row.first,
            last: row.last,
        }
    }
}

/// Handle al database condiviso da tutte le richieste.
#[derive(Debug, Clone)]
pub struct Database {
    pool: Pool,
    query_timeout: Duration,
}

impl Database {
    /// Apre la connessione una volta sola. Fallisce subito se il database
    /// non risponde entro `connect_timeout`.
    pub async fn connect(url: &str, opts: &ConnectOpts) -> Result<Self, DbError> {
        let pool = match DbEngine::detect(url)? {
            DbEngine::Postgres => PgPoolOptions::new()
                .max_connections(1)
                .acquire_timeout(opts.connect_timeout)
                .connect(url)
                .await
                .map(Pool::Postgres),
            DbEngine::Sqlite => SqlitePoolOptions::new()
                .max_connections(1)
                .acquire_timeout(opts.connect_timeout)
                .connect(url)
                .await
                .map(Pool::Sqlite),
        }
        .map_err(DbError::Connection)?;

        Ok(Self {
            pool,
            query_timeout: opts.query_timeout,
        })
    }

    /// Come `connect`, ma riprova con backoff esponenziale fino a `opts.retries` volte.
    /// Un URL non supportato non viene riprovato.
    pub async fn connect_with_retry(url: &str, opts: &ConnectOpts) -> Result<Self, DbError> {
        let mut delay = INITIAL_BACKOFF;
        let mut attempt: u32 = 0;
        loop {
            attempt += 1;
            match Self::connect(url, opts).await {
                Ok(db) => {
                    info!(attempt, engine = ?db.engine(), "connected");
                    return Ok(db);
                }
                Err(e @ DbError::UnsupportedUrl(_)) => return Err(e),
                Err(e) if attempt > opts.retries => {
                    error!(attempt, error = %e, "connection error, giving up");
                    return Err(e);
                }
                Err(e) => {
                    warn!(attempt, error = %e, "connection error, retrying in {:?}", delay);
                    tokio::time::sleep(delay).await;
                    delay = next_backoff(delay);
                }
            }
        }
    }

    pub fn engine(&self) -> DbEngine {
        match self.pool {
            Pool::Postgres(_) => DbEngine::Postgres,
            Pool::Sqlite(_) => DbEngine::Sqlite,
        }
    }

    /// Chiude la connessione; le query successive falliscono con `Unavailable`.
    pub async fn close(&self) {
        match &self.pool {
            Pool::Postgres(p) => p.close().await,
            Pool::Sqlite(p) => p.close().await,
        }
    }
}

fn next_backoff(delay: Duration) -> Duration {
    (delay * 2).min(MAX_BACKOFF)
}

#[async_trait]
impl UserStore for Database {
    async fn get_all_users(&self) -> Result<Vec<User>, DbError> {
        let query = async {
            match &self.pool {
                Pool::Postgres(p) => {
                    sqlx::query_as::<_, UserRow>(SELECT_ALL_USERS)
                        .fetch_all(p)
                        .await
                }
                Pool::Sqlite(p) => {
                    sqlx::query_as::<_, UserRow>(SELECT_ALL_USERS)
                        .fetch_all(p)
                        .await
                }
            }
        };
        let rows = tokio::time::timeout(self.query_timeout, query)
            .await
            .map_err(|_| DbError::Timeout(self.query_timeout))??;

        Ok(rows.into_iter().map(User::from).collect())
    }

    async fn ping(&self) -> Result<(), DbError> {
        // acquisire la connessione basta: il pool la valida prima di restituirla
        match &self.pool {
            Pool::Postgres(p) => p.acquire().await.map(drop)?,
            Pool::Sqlite(p) => p.acquire().await.map(drop)?,
        }
        Ok(())
    }
}
