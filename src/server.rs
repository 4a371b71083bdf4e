/*!
 * HTTP 服务器模块
 *
 * 接收引导阶段建立好的数据库句柄，负责：
 * - 认证服务初始化
 * - 路由和中间件配置
 * - HTTP 服务器启动
 */

use crate::auth::AuthService;
use crate::config::Config;
use crate::database::Database;
use crate::error::{AppError, AppResult};
use crate::handlers::AppState;
use crate::routes::create_router;
use axum::serve;
use tokio::net::TcpListener;
use tracing::{info, warn};

/// HTTP 服务器结构体
pub struct Server {
    config: Config,
    db: Database,
}

impl Server {
    /// 创建新的服务器实例
    ///
    /// # 参数
    /// - `config`: 应用程序配置
    /// - `db`: 已完成迁移和初始化的数据库句柄
    pub fn new(config: Config, db: Database) -> Self {
        Self { config, db }
    }

    /// 启动并运行服务器，直到监听失败或进程退出
    pub async fn run(self) -> AppResult<()> {
        if self.config.jwt_secret_generated {
            warn!("JWT_SECRET is not set; using a random secret, tokens will not survive a restart");
        }

        let auth = AuthService::new(
            self.config.jwt_secret.clone(),
            self.config.jwt_expiration_hours,
            self.db.clone(),
        );
        let state = AppState { db: self.db, auth };
        let app = create_router(state);

        let addr = format!("{}:{}", self.config.server_host, self.config.server_port);
        let listener = TcpListener::bind(&addr).await.map_err(|e| {
            AppError::Config(format!("Failed to bind to address {}: {}", addr, e))
        })?;

        info!("Server listening on http://{}", addr);
        info!("  GET  /health - Health check");
        info!("  POST /auth/login - User authentication");
        info!("  GET  /users - List users");
        info!("  POST /users - Create user");
        info!("  GET  /users/{{id}} - Get user");

        serve(listener, app)
            .await
            .map_err(|e| AppError::Internal(format!("Server error: {}", e)))?;

        Ok(())
    }
}
