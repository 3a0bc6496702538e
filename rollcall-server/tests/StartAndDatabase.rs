use anyhow::Result;
use rollcall_server::db::{ConnectOpts, Database, DbEngine, DbError, UserStore};
use rollcall_server::health_with_store;
use sqlx::sqlite::SqlitePoolOptions;
use std::collections::HashSet;
use std::path::Path;
use std::time::{Duration, Instant};
use tempfile::TempDir;

// Funzione di utilità: crea un file SQLite con la tabella users già popolata
// (la tabella ha una colonna in più, come quella di produzione) e ne restituisce l'URL.
async fn seeded_db(dir: &Path, rows: &[(i64, &str, &str)]) -> Result<String> {
    let path = dir.join("rollcall.db");
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect(&format!("sqlite://{}?mode=rwc", path.display()))
        .await?;
    sqlx::query(
        r#"
        CREATE TABLE users (
            id    INTEGER PRIMARY KEY,
            first TEXT NOT NULL,
            last  TEXT NOT NULL,
            email TEXT
        );"#,
    )
    .execute(&pool)
    .await?;
    for (id, first, last) in rows {
        sqlx::query("INSERT INTO users (id, first, last, email) VALUES (?, ?, ?, ?)")
            .bind(id)
            .bind(first)
            .bind(last)
            .bind(format!("{}@example.org", first.to_lowercase()))
            .execute(&pool)
            .await?;
    }
    pool.close().await;
    Ok(format!("sqlite://{}", path.display()))
}

// Test che verifica che getAllUsers restituisca esattamente gli id presenti in tabella
#[tokio::test]
async fn get_all_users_returns_every_row() -> Result<()> {
    let td = TempDir::new()?;
    let url = seeded_db(
        td.path(),
        &[(1, "Ada", "Lovelace"), (2, "Alan", "Turing"), (42, "Grace", "Hopper")],
    )
    .await?;

    let db = Database::connect(&url, &ConnectOpts::default()).await?;
    assert_eq!(db.engine(), DbEngine::Sqlite);

    let users = db.get_all_users().await?;
    // l'ordine non è specificato: confronto come insiemi
    let ids: HashSet<i64> = users.iter().map(|u| u.id).collect();
    assert_eq!(ids, HashSet::from([1, 2, 42]));

    let grace = users.iter().find(|u| u.id == 42).expect("row 42");
    assert_eq!(grace.display_name(), "Grace Hopper");
    Ok(())
}

// Tabella vuota: successo con vettore vuoto, non un errore
#[tokio::test]
async fn empty_table_is_ok_and_empty() -> Result<()> {
    let td = TempDir::new()?;
    let url = seeded_db(td.path(), &[]).await?;

    let db = Database::connect(&url, &ConnectOpts::default()).await?;
    let users = db.get_all_users().await?;
    assert!(users.is_empty());
    Ok(())
}

// Se la query fallisce (qui manca la tabella) l'errore è distinguibile da "nessuna riga"
#[tokio::test]
async fn missing_table_is_a_query_error() -> Result<()> {
    let td = TempDir::new()?;
    let path = td.path().join("empty.db");
    let url = format!("sqlite://{}?mode=rwc", path.display());

    let db = Database::connect(&url, &ConnectOpts::default()).await?;
    let err = db.get_all_users().await.expect_err("query must fail");
    assert!(matches!(err, DbError::Query(_)), "unexpected error: {err}");
    Ok(())
}

// Dopo la chiusura della connessione le richieste falliscono come Unavailable
#[tokio::test]
async fn closed_connection_is_unavailable() -> Result<()> {
    let td = TempDir::new()?;
    let url = seeded_db(td.path(), &[(1, "Ada", "Lovelace")]).await?;

    let db = Database::connect(&url, &ConnectOpts::default()).await?;
    db.close().await;

    let err = db.get_all_users().await.expect_err("closed pool must fail");
    assert!(matches!(err, DbError::Unavailable(_)), "unexpected error: {err}");
    Ok(())
}

// Test che verifica che l'handler di health segua lo stato della connessione
#[tokio::test]
async fn health_follows_connection_state() -> Result<()> {
    let td = TempDir::new()?;
    let url = seeded_db(td.path(), &[]).await?;

    let db = Database::connect(&url, &ConnectOpts::default()).await?;
    let status = health_with_store(&db).await;
    assert!(status.is_success(), "health should return 200 OK");

    db.close().await;
    let status = health_with_store(&db).await;
    assert_eq!(status.as_u16(), 503);
    Ok(())
}

// Un database che non esiste fa fallire subito la connessione iniziale
#[tokio::test]
async fn connect_fails_fast_when_database_is_missing() -> Result<()> {
    let td = TempDir::new()?;
    // senza mode=rwc SQLite non crea il file
    let url = format!("sqlite://{}", td.path().join("nope.db").display());

    let err = Database::connect_with_retry(&url, &ConnectOpts::default())
        .await
        .expect_err("connection must fail");
    assert!(matches!(err, DbError::Connection(_)), "unexpected error: {err}");
    Ok(())
}

// Con due tentativi in più si aspettano 500 ms e poi 1 s prima di arrendersi
#[tokio::test]
async fn connect_retries_with_backoff_then_gives_up() -> Result<()> {
    let td = TempDir::new()?;
    let url = format!("sqlite://{}", td.path().join("nope.db").display());
    let opts = ConnectOpts {
        retries: 2,
        ..ConnectOpts::default()
    };

    let started = Instant::now();
    let err = Database::connect_with_retry(&url, &opts)
        .await
        .expect_err("connection must fail");
    assert!(matches!(err, DbError::Connection(_)), "unexpected error: {err}");
    assert!(
        started.elapsed() >= Duration::from_millis(1500),
        "gave up after {:?}",
        started.elapsed()
    );
    Ok(())
}

// Se il file compare durante i tentativi la connessione riesce
#[tokio::test]
async fn connect_succeeds_on_a_later_attempt() -> Result<()> {
    let td = TempDir::new()?;
    // stesso file che crea seeded_db
    let url = format!("sqlite://{}", td.path().join("rollcall.db").display());
    let opts = ConnectOpts {
        retries: 3,
        ..ConnectOpts::default()
    };

    let seed_dir = td.path().to_path_buf();
    let seeder = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(200)).await;
        seeded_db(&seed_dir, &[(7, "Barbara", "Liskov")]).await
    });

    let db = Database::connect_with_retry(&url, &opts).await?;
    seeder.await??;
    let users = db.get_all_users().await?;
    assert_eq!(users.len(), 1);
    assert_eq!(users[0].display_name(), "Barbara Liskov");
    Ok(())
}

// Una query che supera il timeout diventa DbError::Timeout, non un errore di query
#[tokio::test]
async fn slow_query_hits_query_timeout() -> Result<()> {
    let td = TempDir::new()?;
    let url = seeded_db(td.path(), &[(1, "Ada", "Lovelace")]).await?;
    let opts = ConnectOpts {
        query_timeout: Duration::ZERO,
        ..ConnectOpts::default()
    };

    let db = Database::connect(&url, &opts).await?;
    let err = db.get_all_users().await.expect_err("query must time out");
    assert!(
        matches!(err, DbError::Timeout(d) if d == Duration::ZERO),
        "unexpected error: {err}"
    );
    Ok(())
}

#[tokio::test]
async fn unsupported_url_is_not_retried() -> Result<()> {
    let opts = ConnectOpts {
        retries: 3,
        ..ConnectOpts::default()
    };
    let err = Database::connect_with_retry("mysql://root:secret@db/app", &opts)
        .await
        .expect_err("mysql is not supported");
    assert!(matches!(err, DbError::UnsupportedUrl(_)));
    Ok(())
}
