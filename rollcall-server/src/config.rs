/* Configurazione del server letta dall'ambiente una sola volta all'avvio.
    Fuori da produzione ogni variabile ha un default; con APP_ENV=production
    porta e credenziali del database vanno impostate esplicitamente.
*/
use std::{env, fmt, path::PathBuf, str::FromStr, time::Duration};

use thiserror::Error;
use tracing::{debug, info};

use crate::db::ConnectOpts;

/// Porta di default del server.
pub const DEFAULT_PORT: u16 = 80;
/// Porta di default dell'entrypoint di sviluppo (`--dev`).
pub const DEV_PORT: u16 = 3000;

pub const DEFAULT_DB_HOST: &str = "db";
pub const DEFAULT_DB_PORT: u16 = 5432;
pub const DEFAULT_DB_USER: &str = "docker";
pub const DEFAULT_DB_PASSWORD: &str = "docker";

pub const DEFAULT_STATIC_DIR: &str = "rollcall-client-web/dist";
pub const DEFAULT_PUBLIC_DIR: &str = "rollcall-client-web/public";

pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 5;
pub const DEFAULT_QUERY_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_CONNECT_RETRIES: u32 = 5;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be set when APP_ENV=production")]
    Missing(&'static str),

    #[error("invalid {key} value {value:?}: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

/// Ambiente di esecuzione, da APP_ENV.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Profile {
    Development,
    Production,
}

impl Profile {
    /// `production` o `prod` (case insensitive) indicano produzione; tutto il resto è sviluppo.
    pub fn from_value(value: Option<&str>) -> Self {
        match value.map(|v| v.trim().to_ascii_lowercase()) {
            Some(v) if v == "production" || v == "prod" => Profile::Production,
            _ => Profile::Development,
        }
    }

    pub fn is_production(self) -> bool {
        self == Profile::Production
    }
}

/// Quale binario sta partendo: cambia solo la porta di default e il profilo.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entrypoint {
    Server,
    Dev,
}

impl Entrypoint {
    pub fn default_port(self) -> u16 {
        match self {
            Entrypoint::Server => DEFAULT_PORT,
            Entrypoint::Dev => DEV_PORT,
        }
    }
}

#[derive(Clone)]
pub struct DbConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    /// Nome del database; se assente coincide con l'utente, come fa libpq.
    pub database: Option<String>,
    /// URL completo (DATABASE_URL) che sostituisce i campi sopra.
    pub url: Option<String>,
    pub connect_timeout: Duration,
    pub query_timeout: Duration,
    pub connect_retries: u32,
}

impl DbConfig {
    pub fn url(&self) -> String {
        if let Some(url) = &self.url {
            return url.clone();
        }
        let database = self.database.as_deref().unwrap_or(&self.user);
        // un indirizzo IPv6 va tra parentesi quadre, altrimenti la porta è ambigua
        let host = if self.host.contains(':') && !self.host.starts_with('[') {
            format!("[{}]", self.host)
        } else {
            self.host.clone()
        };
        format!(
            "postgres://{}:{}@{}:{}/{}",
            urlencoding::encode(&self.user),
            urlencoding::encode(&self.password),
            host,
            self.port,
            urlencoding::encode(database),
        )
    }

    pub fn connect_opts(&self) -> ConnectOpts {
        ConnectOpts {
            connect_timeout: self.connect_timeout,
            query_timeout: self.query_timeout,
            retries: self.connect_retries,
        }
    }
}

// la password non deve finire nei log
impl fmt::Debug for DbConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DbConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("database", &self.database)
            .field("url", &self.url.as_ref().map(|_| "<redacted>"))
            .field("connect_timeout", &self.connect_timeout)
            .field("query_timeout", &self.query_timeout)
            .field("connect_retries", &self.connect_retries)
            .finish()
    }
}

/// Cartelle servite come file statici, in ordine di priorità.
#[derive(Debug, Clone)]
pub struct AssetsConfig {
    /// Output della build del front-end.
    pub static_dir: PathBuf,
    /// Asset pubblici, usati quando il file non è nella build.
    pub public_dir: PathBuf,
}

/// Valori passati da riga di comando: hanno la precedenza sull'ambiente
/// e in produzione contano come impostati esplicitamente.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub port: Option<u16>,
    pub static_dir: Option<PathBuf>,
    pub public_dir: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub profile: Profile,
    pub port: u16,
    pub db: DbConfig,
    pub assets: AssetsConfig,
}

impl Config {
    /// Legge la configurazione dalle variabili d'ambiente del processo.
    pub fn load(entry: Entrypoint, overrides: &Overrides) -> Result<Self, ConfigError> {
        Self::from_lookup_with(entry, overrides, |key| env::var(key).ok())
    }

    /// Come `load`, ma con una sorgente di variabili arbitraria (usata nei test).
    pub fn from_lookup<F>(entry: Entrypoint, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        Self::from_lookup_with(entry, &Overrides::default(), lookup)
    }

    pub fn from_lookup_with<F>(
        entry: Entrypoint,
        overrides: &Overrides,
        lookup: F,
    ) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let profile = match entry {
            Entrypoint::Dev => Profile::Development,
            Entrypoint::Server => Profile::from_value(lookup("APP_ENV").as_deref()),
        };
        let vars = Vars { lookup, profile };

        let url = vars.get("DATABASE_URL");
        // con DATABASE_URL le singole variabili del database non servono
        let db_required = url.is_none();

        let db = DbConfig {
            host: vars.load("HOST", DEFAULT_DB_HOST.to_string(), db_required)?,
            port: vars.load("POSTGRES_PORT", DEFAULT_DB_PORT, db_required)?,
            user: vars.load("POSTGRES_USER", DEFAULT_DB_USER.to_string(), db_required)?,
            password: vars.secret("POSTGRES_PASSWORD", DEFAULT_DB_PASSWORD, db_required)?,
            database: vars.get("POSTGRES_DB"),
            url,
            connect_timeout: Duration::from_secs(vars.load(
                "DB_CONNECT_TIMEOUT_SECS",
                DEFAULT_CONNECT_TIMEOUT_SECS,
                false,
            )?),
            query_timeout: Duration::from_secs(vars.load(
                "DB_QUERY_TIMEOUT_SECS",
                DEFAULT_QUERY_TIMEOUT_SECS,
                false,
            )?),
            connect_retries: vars.load("DB_CONNECT_RETRIES", DEFAULT_CONNECT_RETRIES, false)?,
        };

        let port = match overrides.port {
            Some(port) => port,
            None => vars.load("PORT", entry.default_port(), true)?,
        };
        let static_dir = match &overrides.static_dir {
            Some(dir) => dir.clone(),
            None => vars.load("STATIC_DIR", PathBuf::from(DEFAULT_STATIC_DIR), false)?,
        };
        let public_dir = match &overrides.public_dir {
            Some(dir) => dir.clone(),
            None => vars.load("PUBLIC_DIR", PathBuf::from(DEFAULT_PUBLIC_DIR), false)?,
        };

        Ok(Self {
            profile,
            port,
            db,
            assets: AssetsConfig {
                static_dir,
                public_dir,
            },
        })
    }
}

struct Vars<F> {
    lookup: F,
    profile: Profile,
}

impl<F> Vars<F>
where
    F: Fn(&str) -> Option<String>,
{
    /// Valore impostato e non vuoto.
    fn get(&self, key: &str) -> Option<String> {
        (self.lookup)(key).filter(|v| !v.trim().is_empty())
    }

    /// Legge e converte `key`. Se manca usa `default`, tranne in produzione
    /// quando `required` è vero.
    fn load<T>(&self, key: &'static str, default: T, required: bool) -> Result<T, ConfigError>
    where
        T: FromStr + fmt::Debug,
        T::Err: fmt::Display,
    {
        match self.get(key) {
            Some(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
                key,
                value: raw.clone(),
                reason: e.to_string(),
            }),
            None if required && self.profile.is_production() => Err(ConfigError::Missing(key)),
            None => {
                info!("{key} not set, using default: {default:?}");
                Ok(default)
            }
        }
    }

    fn secret(
        &self,
        key: &'static str,
        default: &str,
        required: bool,
    ) -> Result<String, ConfigError> {
        match self.get(key) {
            Some(raw) => Ok(raw),
            None if required && self.profile.is_production() => Err(ConfigError::Missing(key)),
            None => {
                debug!("{key} not set, using default");
                Ok(default.to_string())
            }
        }
    }
}
