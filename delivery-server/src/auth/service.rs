//! 注册、登录、刷新令牌
//!
//! 对外只暴露少数错误码：客户端可处理的 (邮箱不存在、密码错误、
//! 邮箱已注册、字段校验) 原样返回，其余内部故障统一掩盖。

use std::sync::Arc;

use shared::client::{AuthPayload, SignupRequest};
use shared::error::{AppError, AppResult, ErrorCode};
use shared::models::{Identity, PublicUser};

use crate::auth::jwt::{JwtService, TokenKind};
use crate::auth::password::{hash_password, verify_password};
use crate::db::users::normalize_email;
use crate::db::{StorageError, UserRecord, UserStorage};
use crate::security_log;
use crate::utils::validation::{validate_email, validate_name, validate_password};

#[derive(Debug, Clone)]
pub struct AuthService {
    users: UserStorage,
    jwt: Arc<JwtService>,
}

impl AuthService {
    pub fn new(users: UserStorage, jwt: Arc<JwtService>) -> Self {
        Self { users, jwt }
    }

    pub fn users(&self) -> &UserStorage {
        &self.users
    }

    /// 注册新账号
    ///
    /// 除 `AlreadyExists` 和字段校验错误外，其余失败都返回 `InternalError`。
    pub fn signup(&self, req: SignupRequest) -> AppResult<()> {
        self.try_signup(req).map_err(|e| match e.code {
            ErrorCode::AlreadyExists | ErrorCode::ValidationFailed => e,
            _ => {
                tracing::error!(error = %e, "Signup failed");
                AppError::new(ErrorCode::InternalError)
            }
        })
    }

    fn try_signup(&self, req: SignupRequest) -> AppResult<()> {
        let email = normalize_email(&req.email);
        validate_email(&email)?;
        validate_name(&req.name)?;
        validate_password(&req.password)?;
        if req.password != req.repeat_password {
            return Err(AppError::invalid_field(
                "repeatPassword",
                "Passwords do not match",
            ));
        }

        if self.users.email_exists(&email)? {
            return Err(email_taken());
        }

        let password_hash =
            hash_password(&req.password).map_err(|e| AppError::internal(e.to_string()))?;
        let record = UserRecord {
            id: uuid::Uuid::new_v4().to_string(),
            email,
            name: req.name.trim().to_string(),
            role: req.role,
            password_hash,
            created_at: shared::util::now_millis(),
        };

        match self.users.insert(&record) {
            Ok(()) => {}
            Err(StorageError::Duplicate(_)) => return Err(email_taken()),
            Err(e) => return Err(e.into()),
        }

        security_log!(
            "INFO",
            "signup",
            user_id = record.id.as_str(),
            role = record.role.as_str()
        );
        Ok(())
    }

    /// 邮箱 + 密码登录，返回令牌对和用户信息
    ///
    /// `NotFound` (邮箱不存在) 与字段校验错误 (含密码错误) 原样返回，
    /// 其余失败统一为 `AuthenticationFailed`。
    pub fn login(&self, email: &str, password: &str) -> AppResult<AuthPayload> {
        self.try_login(email, password).map_err(|e| match e.code {
            ErrorCode::NotFound | ErrorCode::ValidationFailed => e,
            _ => {
                tracing::error!(error = %e, "Login failed");
                AppError::new(ErrorCode::AuthenticationFailed)
            }
        })
    }

    fn try_login(&self, email: &str, password: &str) -> AppResult<AuthPayload> {
        let email = normalize_email(email);
        if email.is_empty() {
            return Err(AppError::invalid_field("email", "email must not be empty"));
        }
        if password.is_empty() {
            return Err(AppError::invalid_field(
                "password",
                "password must not be empty",
            ));
        }

        let record = self
            .users
            .find_by_email(&email)?
            .ok_or_else(|| AppError::with_message(ErrorCode::NotFound, "Email not found"))?;

        let matches = verify_password(password, &record.password_hash)
            .map_err(|e| AppError::internal(format!("Stored hash unreadable: {e}")))?;
        if !matches {
            security_log!("WARN", "login_failed", user_id = record.id.as_str());
            return Err(AppError::invalid_field("password", "Password is incorrect"));
        }

        let token = self.jwt.issue(&record.identity())?;
        security_log!("INFO", "login", user_id = record.id.as_str());
        Ok(AuthPayload {
            token,
            user: record.public(),
        })
    }

    /// 用刷新令牌换取新的令牌对 (旧刷新令牌在过期前仍有效)
    pub fn refresh(&self, refresh_token: &str) -> AppResult<AuthPayload> {
        let identity = self.jwt.verify(refresh_token.trim(), TokenKind::Refresh)?;
        let user = self.current_user(&identity)?;
        let token = self.jwt.issue(&identity)?;
        Ok(AuthPayload { token, user })
    }

    /// 令牌身份对应的账号
    pub fn current_user(&self, identity: &Identity) -> AppResult<PublicUser> {
        self.users
            .find_by_id(&identity.id)?
            .map(|record| record.public())
            .ok_or_else(|| AppError::not_found("User"))
    }
}

fn email_taken() -> AppError {
    AppError::with_message(ErrorCode::AlreadyExists, "Email is already registered")
}
