/*!
 * 启动引导模块
 *
 * 按顺序执行：连接数据库 → 执行迁移 → 初始化默认管理员账号。
 * 每个阶段失败都会返回对应的 `BootstrapError`，由入口函数映射为进程退出码。
 */

use crate::auth::hash_password;
use crate::config::Config;
use crate::database::Database;
use crate::error::AppError;
use crate::models::{Backend, NewUser, User};
use thiserror::Error;
use tracing::info;

pub const ADMIN_FIRSTNAME: &str = "Admin";
pub const ADMIN_LASTNAME: &str = "Istrator";
pub const ADMIN_LOGIN: &str = "admin";
pub const ADMIN_PASSWORD: &str = "changeme";

#[derive(Error, Debug)]
pub enum BootstrapError {
    #[error("Failed to load configuration: {0}")]
    Config(#[source] AppError),

    #[error("Failed to connect to {backend}: {source}")]
    Connect {
        backend: Backend,
        #[source]
        source: AppError,
    },

    #[error("Failed to run migrations: {0}")]
    Migrate(#[source] AppError),

    #[error("Could not create admin user, reason {0}")]
    Seed(#[source] AppError),
}

impl BootstrapError {
    pub fn exit_code(&self) -> i32 {
        match self {
            BootstrapError::Config(_) | BootstrapError::Connect { .. } => 1,
            BootstrapError::Migrate(_) => 2,
            BootstrapError::Seed(_) => 3,
        }
    }
}

#[derive(Debug)]
pub enum SeedOutcome {
    Created(User),
    UsersPresent,
}

/// 引导完成后的数据库句柄与初始化结果
pub struct Bootstrapped {
    pub db: Database,
    pub seed: SeedOutcome,
}

pub async fn run(config: &Config) -> Result<Bootstrapped, BootstrapError> {
    let db = connect(config).await?;
    migrate(&db).await?;
    let seed = seed_admin(&db).await?;
    Ok(Bootstrapped { db, seed })
}

pub async fn connect(config: &Config) -> Result<Database, BootstrapError> {
    let backend = config.database.backend();
    match backend {
        Backend::Postgres => info!("Using PostgreSQL database driver"),
        Backend::Sqlite => info!("Using SQLite database driver"),
    }
    info!("Connecting to database: {}", config.database.display_target());

    let db = Database::connect(&config.database)
        .await
        .map_err(|source| BootstrapError::Connect { backend, source })?;
    info!("Database connection established");
    Ok(db)
}

pub async fn migrate(db: &Database) -> Result<(), BootstrapError> {
    info!("Running database migrations");
    db.migrate().await.map_err(BootstrapError::Migrate)?;
    info!("Database migrations completed");
    Ok(())
}

pub async fn seed_admin(db: &Database) -> Result<SeedOutcome, BootstrapError> {
    let admin = NewUser {
        firstname: ADMIN_FIRSTNAME.to_string(),
        lastname: ADMIN_LASTNAME.to_string(),
        login: ADMIN_LOGIN.to_string(),
        password_hash: hash_password(ADMIN_PASSWORD).map_err(BootstrapError::Seed)?,
    };

    match db
        .insert_user_if_none_exist(&admin)
        .await
        .map_err(BootstrapError::Seed)?
    {
        Some(user) => {
            info!("Could not find any users, bootstrapping an admin account");
            info!(
                "Admin account '{}' created with the default password; rotate it immediately",
                user.login
            );
            Ok(SeedOutcome::Created(user))
        }
        None => {
            info!("Found users, skipping admin account bootstrapping");
            Ok(SeedOutcome::UsersPresent)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_follow_phase() {
        let connect = BootstrapError::Connect {
            backend: Backend::Sqlite,
            source: AppError::Database(sqlx::Error::PoolTimedOut),
        };
        assert_eq!(connect.exit_code(), 1);
        assert_eq!(
            BootstrapError::Config(AppError::Config("Invalid SERVER_PORT".into())).exit_code(),
            1
        );
        assert_eq!(
            BootstrapError::Migrate(AppError::Internal("x".into())).exit_code(),
            2
        );
        assert_eq!(
            BootstrapError::Seed(AppError::Internal("x".into())).exit_code(),
            3
        );
    }

    #[test]
    fn messages_name_phase_and_cause() {
        let err = BootstrapError::Connect {
            backend: Backend::Postgres,
            source: AppError::Database(sqlx::Error::PoolTimedOut),
        };
        let message = err.to_string();
        assert!(message.starts_with("Failed to connect to postgresql"));
        assert!(message.contains("pool timed out"));

        let err = BootstrapError::Migrate(AppError::Internal("no such column".into()));
        assert!(err.to_string().contains("no such column"));
    }
}
