use crate::error::{AppError, AppResult};
use crate::models::Backend;
use rand::distributions::Alphanumeric;
use rand::Rng;
use sqlx::postgres::PgSslMode;
use std::env;

const DEFAULT_SQLITE_PATH: &str = "user_api.db";
const GENERATED_JWT_SECRET_LENGTH: usize = 64;

#[derive(Clone, Debug)]
pub struct PostgresConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub dbname: String,
    pub ssl_mode: PgSslMode,
}

/// 数据库后端配置，由 `POSTGRES_HOST` 是否非空决定
#[derive(Clone, Debug)]
pub enum DatabaseConfig {
    Postgres(PostgresConfig),
    Sqlite { path: String },
}

impl DatabaseConfig {
    pub fn backend(&self) -> Backend {
        match self {
            DatabaseConfig::Postgres(_) => Backend::Postgres,
            DatabaseConfig::Sqlite { .. } => Backend::Sqlite,
        }
    }

    /// Connection target safe for logs (no credentials).
    pub fn display_target(&self) -> String {
        match self {
            DatabaseConfig::Postgres(pg) => format!("{}:{}/{}", pg.host, pg.port, pg.dbname),
            DatabaseConfig::Sqlite { path } => path.clone(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct Config {
    pub database: DatabaseConfig,
    pub server_host: String,
    pub server_port: u16,
    pub log_level: String,
    pub log_file: Option<String>,
    pub jwt_secret: String,
    pub jwt_secret_generated: bool,
    pub jwt_expiration_hours: i64,
}

impl Config {
    pub fn from_env() -> AppResult<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from an arbitrary key lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> AppResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let database = match get("POSTGRES_HOST") {
            Some(host) => DatabaseConfig::Postgres(PostgresConfig {
                host,
                port: get("POSTGRES_PORT")
                    .unwrap_or_else(|| "5432".to_string())
                    .parse()
                    .map_err(|_| AppError::Config("Invalid POSTGRES_PORT".to_string()))?,
                user: get("POSTGRES_USER").unwrap_or_else(|| "postgres".to_string()),
                password: lookup("POSTGRES_PASSWORD").unwrap_or_default(),
                dbname: get("POSTGRES_DB").unwrap_or_else(|| "postgres".to_string()),
                ssl_mode: get("POSTGRES_SSLMODE")
                    .unwrap_or_else(|| "prefer".to_string())
                    .parse()
                    .map_err(|_| AppError::Config("Invalid POSTGRES_SSLMODE".to_string()))?,
            }),
            None => DatabaseConfig::Sqlite {
                path: get("SQLITE_PATH").unwrap_or_else(|| DEFAULT_SQLITE_PATH.to_string()),
            },
        };

        let (jwt_secret, jwt_secret_generated) = match get("JWT_SECRET") {
            Some(secret) => (secret, false),
            None => (generate_secret(GENERATED_JWT_SECRET_LENGTH), true),
        };

        let jwt_expiration_hours: i64 = get("JWT_EXPIRATION_HOURS")
            .unwrap_or_else(|| "24".to_string())
            .parse()
            .map_err(|_| AppError::Config("Invalid JWT_EXPIRATION_HOURS".to_string()))?;
        if !(1..=720).contains(&jwt_expiration_hours) {
            return Err(AppError::Config(
                "JWT_EXPIRATION_HOURS must be between 1 and 720".to_string(),
            ));
        }

        Ok(Config {
            database,
            server_host: get("SERVER_HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            server_port: get("SERVER_PORT")
                .unwrap_or_else(|| "8080".to_string())
                .parse()
                .map_err(|_| AppError::Config("Invalid SERVER_PORT".to_string()))?,
            log_level: get("LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
            log_file: get("LOG_FILE"),
            jwt_secret,
            jwt_secret_generated,
            jwt_expiration_hours,
        })
    }
}

fn generate_secret(length: usize) -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(length)
        .map(char::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> AppResult<Config> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn missing_postgres_host_selects_sqlite() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config.database.backend(), Backend::Sqlite);
        match config.database {
            DatabaseConfig::Sqlite { path } => assert_eq!(path, DEFAULT_SQLITE_PATH),
            other => panic!("unexpected database config: {other:?}"),
        }
    }

    #[test]
    fn empty_postgres_host_selects_sqlite() {
        let config = config_from(&[("POSTGRES_HOST", "")]).unwrap();
        assert_eq!(config.database.backend(), Backend::Sqlite);

        let config = config_from(&[("POSTGRES_HOST", "   ")]).unwrap();
        assert_eq!(config.database.backend(), Backend::Sqlite);
    }

    #[test]
    fn postgres_host_selects_postgres_with_defaults() {
        let config = config_from(&[("POSTGRES_HOST", "db.internal")]).unwrap();
        match config.database {
            DatabaseConfig::Postgres(pg) => {
                assert_eq!(pg.host, "db.internal");
                assert_eq!(pg.port, 5432);
                assert_eq!(pg.user, "postgres");
                assert_eq!(pg.password, "");
                assert_eq!(pg.dbname, "postgres");
                assert!(matches!(pg.ssl_mode, PgSslMode::Prefer));
            }
            other => panic!("unexpected database config: {other:?}"),
        }
    }

    #[test]
    fn postgres_display_target_hides_password() {
        let config = config_from(&[
            ("POSTGRES_HOST", "db"),
            ("POSTGRES_PASSWORD", "s3cret"),
            ("POSTGRES_DB", "users"),
        ])
        .unwrap();
        let target = config.database.display_target();
        assert_eq!(target, "db:5432/users");
        assert!(!target.contains("s3cret"));
    }

    #[test]
    fn invalid_values_are_config_errors() {
        for pairs in [
            vec![("POSTGRES_HOST", "db"), ("POSTGRES_PORT", "not-a-port")],
            vec![("POSTGRES_HOST", "db"), ("POSTGRES_SSLMODE", "sometimes")],
            vec![("SERVER_PORT", "70000")],
            vec![("JWT_EXPIRATION_HOURS", "0")],
        ] {
            match config_from(&pairs) {
                Err(AppError::Config(_)) => {}
                other => panic!("expected config error for {pairs:?}, got {other:?}"),
            }
        }
    }

    #[test]
    fn jwt_secret_is_generated_when_unset() {
        let config = config_from(&[]).unwrap();
        assert!(config.jwt_secret_generated);
        assert_eq!(config.jwt_secret.len(), GENERATED_JWT_SECRET_LENGTH);

        let config = config_from(&[("JWT_SECRET", "provided")]).unwrap();
        assert!(!config.jwt_secret_generated);
        assert_eq!(config.jwt_secret, "provided");
    }
}
