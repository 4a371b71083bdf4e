/*!
 * 错误处理模块
 *
 * 定义了应用程序中所有可能出现的错误类型，并提供统一的错误处理机制。
 * 所有错误都会被转换为适当的 HTTP 响应，确保客户端能够获得有意义的错误信息。
 */

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// 应用程序结果类型的别名
///
/// 所有可能失败的操作都应该返回这个类型，统一错误处理
pub type AppResult<T> = Result<T, AppError>;

/// 应用程序错误枚举
///
/// 定义了所有可能出现的错误情况，每种错误都会映射到相应的 HTTP 状态码
#[derive(Error, Debug)]
pub enum AppError {
    /// 数据库操作错误
    /// 包括连接失败、查询错误等
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// 数据库迁移错误
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// 认证失败错误
    /// 用户名密码错误、JWT 验证失败等
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// 请求验证错误
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    /// 唯一约束冲突，例如重复的登录名
    #[error("Conflict: {0}")]
    Conflict(String),

    /// 配置错误
    /// 环境变量格式错误等
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("JWT error: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl AppError {
    /// 数据库错误是否为唯一约束冲突
    pub fn is_unique_violation(&self) -> bool {
        match self {
            AppError::Database(sqlx::Error::Database(db_err)) => db_err.is_unique_violation(),
            _ => false,
        }
    }
}

impl IntoResponse for AppError {
    /// 将错误转换为 HTTP 响应
    ///
    /// 根据错误类型选择适当的 HTTP 状态码，并返回包含错误信息的 JSON 响应。
    /// 服务端错误只返回概要信息，详细原因写入日志。
    fn into_response(self) -> Response {
        let (status, error_message) = match &self {
            AppError::Auth(_) | AppError::Jwt(_) => {
                (StatusCode::UNAUTHORIZED, "Authentication failed")
            }
            AppError::Validation(_) => (StatusCode::BAD_REQUEST, "Invalid request"),
            AppError::NotFound(_) => (StatusCode::NOT_FOUND, "Resource not found"),
            AppError::Conflict(_) => (StatusCode::CONFLICT, "Resource already exists"),
            _ => (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error"),
        };

        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!("{}", self);
            error_message.to_string()
        } else {
            self.to_string()
        };

        let body = Json(json!({
            "error": error_message,
            "message": message
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_errors_map_to_4xx() {
        let cases = [
            (AppError::Auth("bad".into()), StatusCode::UNAUTHORIZED),
            (AppError::Validation("blank".into()), StatusCode::BAD_REQUEST),
            (AppError::NotFound("user".into()), StatusCode::NOT_FOUND),
            (AppError::Conflict("login".into()), StatusCode::CONFLICT),
        ];

        for (err, expected) in cases {
            assert_eq!(err.into_response().status(), expected);
        }
    }

    #[test]
    fn server_errors_map_to_500() {
        let response = AppError::Internal("boom".into()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let response = AppError::Database(sqlx::Error::PoolTimedOut).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn non_database_errors_are_not_unique_violations() {
        assert!(!AppError::Conflict("login".into()).is_unique_violation());
        assert!(!AppError::Database(sqlx::Error::RowNotFound).is_unique_violation());
    }
}
