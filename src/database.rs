/*!
 * 数据库操作模块
 *
 * 通过 sqlx 的 Any 驱动同时支持 PostgreSQL 和 SQLite：
 * - 建立连接（根据配置选择后端）
 * - 执行对应后端的迁移脚本
 * - 用户表的读写
 */

use crate::config::DatabaseConfig;
use crate::error::AppResult;
use crate::models::{Backend, NewUser, User};
use sqlx::any::{AnyConnectOptions, AnyPoolOptions};
use sqlx::migrate::{MigrateError, Migrator};
use sqlx::postgres::PgConnectOptions;
use sqlx::sqlite::SqliteConnectOptions;
use sqlx::{AnyPool, ConnectOptions, Connection};
use std::time::Duration;

static POSTGRES_MIGRATOR: Migrator = sqlx::migrate!("./migrations/postgres");
static SQLITE_MIGRATOR: Migrator = sqlx::migrate!("./migrations/sqlite");

const USER_COLUMNS: &str = "id, firstname, lastname, login, password";
const POOL_ACQUIRE_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Clone)]
pub struct Database {
    pool: AnyPool,
    backend: Backend,
}

impl Database {
    pub async fn connect(config: &DatabaseConfig) -> AppResult<Self> {
        sqlx::any::install_default_drivers();

        let url = match config {
            DatabaseConfig::Postgres(pg) => PgConnectOptions::new()
                .host(&pg.host)
                .port(pg.port)
                .username(&pg.user)
                .password(&pg.password)
                .database(&pg.dbname)
                .ssl_mode(pg.ssl_mode)
                .to_url_lossy(),
            DatabaseConfig::Sqlite { path } => SqliteConnectOptions::new()
                .filename(path)
                .create_if_missing(true)
                .to_url_lossy(),
        };
        let options = AnyConnectOptions::from_url(&url)?;

        // 先建立单个连接：连接失败时立即返回真实原因，连接池不会重试
        let conn = options.connect().await?;
        conn.close().await?;

        let pool = AnyPoolOptions::new()
            .acquire_timeout(POOL_ACQUIRE_TIMEOUT)
            .connect_with(options)
            .await?;
        Ok(Database {
            pool,
            backend: config.backend(),
        })
    }

    pub async fn connect_with_migrations(config: &DatabaseConfig) -> AppResult<Self> {
        let db = Self::connect(config).await?;
        db.migrate().await?;
        Ok(db)
    }

    /// 执行当前后端的迁移；已执行过的版本会被跳过
    ///
    /// 迁移后校验 users 表包含全部所需列，已存在但结构不符的旧表视为迁移失败。
    pub async fn migrate(&self) -> AppResult<()> {
        let migrator = match self.backend {
            Backend::Postgres => &POSTGRES_MIGRATOR,
            Backend::Sqlite => &SQLITE_MIGRATOR,
        };
        migrator.run(&self.pool).await?;

        sqlx::query(&format!("SELECT {USER_COLUMNS} FROM users WHERE 1 = 0"))
            .fetch_optional(&self.pool)
            .await
            .map_err(MigrateError::Execute)?;
        Ok(())
    }

    pub fn backend(&self) -> Backend {
        self.backend
    }

    pub fn pool(&self) -> &AnyPool {
        &self.pool
    }

    pub async fn ping(&self) -> AppResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    // ---------------------------------------------------------------------
    // 用户管理
    // ---------------------------------------------------------------------

    pub async fn count_users(&self) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    pub async fn list_users(&self) -> AppResult<Vec<User>> {
        let users = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users ORDER BY id"
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(users)
    }

    pub async fn get_user_by_id(&self, user_id: i64) -> AppResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    pub async fn get_user_by_login(&self, login: &str) -> AppResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE login = $1"
        ))
        .bind(login)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    pub async fn create_user(&self, new_user: &NewUser) -> AppResult<User> {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (firstname, lastname, login, password)
            VALUES ($1, $2, $3, $4)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(&new_user.firstname)
        .bind(&new_user.lastname)
        .bind(&new_user.login)
        .bind(&new_user.password_hash)
        .fetch_one(&self.pool)
        .await?;
        Ok(user)
    }

    /// Inserts `new_user` only when the table is empty.
    ///
    /// The emptiness check and the insert are a single statement, and the
    /// unique login index turns a concurrent duplicate into a no-op, so two
    /// racing first runs create at most one row. Returns `None` when nothing
    /// was inserted.
    pub async fn insert_user_if_none_exist(&self, new_user: &NewUser) -> AppResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (firstname, lastname, login, password)
            SELECT $1, $2, $3, $4
            WHERE NOT EXISTS (SELECT 1 FROM users)
            ON CONFLICT (login) DO NOTHING
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(&new_user.firstname)
        .bind(&new_user.lastname)
        .bind(&new_user.login)
        .bind(&new_user.password_hash)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }
}
