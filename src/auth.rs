/*!
 * 身份认证模块
 *
 * - 密码哈希与校验（Argon2）
 * - 用户登录与 JWT 签发、校验
 * - 用户创建（登录名唯一）
 */

use crate::database::Database;
use crate::error::{AppError, AppResult};
use crate::models::{CreateUserRequest, NewUser, User};
use argon2::password_hash::{rand_core::OsRng, SaltString};
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

pub fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AppError::Internal(format!("Failed to hash password: {e}")))?;
    Ok(hash.to_string())
}

pub fn verify_password(password: &str, password_hash: &str) -> AppResult<bool> {
    let parsed_hash = PasswordHash::new(password_hash)
        .map_err(|e| AppError::Internal(format!("Failed to parse password hash: {e}")))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtClaims {
    pub sub: String,
    pub login: String,
    pub exp: usize,
    pub iat: usize,
}

/// 认证服务
#[derive(Clone)]
pub struct AuthService {
    jwt_secret: String,
    jwt_expiration_hours: i64,
    db: Database,
}

impl AuthService {
    pub fn new(jwt_secret: String, jwt_expiration_hours: i64, db: Database) -> Self {
        Self {
            jwt_secret,
            jwt_expiration_hours,
            db,
        }
    }

    pub async fn authenticate_user(&self, login: &str, password: &str) -> AppResult<User> {
        let user = self
            .db
            .get_user_by_login(login)
            .await?
            .ok_or_else(|| AppError::Auth("Invalid credentials".to_string()))?;

        if !verify_password(password, &user.password_hash)? {
            return Err(AppError::Auth("Invalid credentials".to_string()));
        }
        Ok(user)
    }

    pub fn generate_jwt_token(&self, user: &User) -> AppResult<(String, DateTime<Utc>)> {
        let now = Utc::now();
        let expires = now + Duration::hours(self.jwt_expiration_hours);
        let claims = JwtClaims {
            sub: user.id.to_string(),
            login: user.login.clone(),
            exp: expires.timestamp() as usize,
            iat: now.timestamp() as usize,
        };

        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.jwt_secret.as_bytes()),
        )?;

        Ok((token, expires))
    }

    pub async fn authenticate_jwt(&self, token: &str) -> AppResult<User> {
        let token_data = decode::<JwtClaims>(
            token,
            &DecodingKey::from_secret(self.jwt_secret.as_bytes()),
            &Validation::default(),
        )?;

        let user_id: i64 = token_data
            .claims
            .sub
            .parse()
            .map_err(|_| AppError::Auth("Invalid token subject".to_string()))?;

        self.db
            .get_user_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::Auth("User not found".to_string()))
    }

    pub async fn create_user(&self, request: CreateUserRequest) -> AppResult<User> {
        let fields = [
            ("firstname", &request.firstname),
            ("lastname", &request.lastname),
            ("login", &request.login),
            ("password", &request.password),
        ];
        if let Some((name, _)) = fields.iter().find(|(_, value)| value.trim().is_empty()) {
            return Err(AppError::Validation(format!("{name} cannot be empty")));
        }

        let new_user = NewUser {
            firstname: request.firstname,
            lastname: request.lastname,
            login: request.login,
            password_hash: hash_password(&request.password)?,
        };

        match self.db.create_user(&new_user).await {
            Err(err) if err.is_unique_violation() => Err(AppError::Conflict(format!(
                "Login {} is already taken",
                new_user.login
            ))),
            other => other,
        }
    }
}
