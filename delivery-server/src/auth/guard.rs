//! 角色守卫
//!
//! 所有修改订单或按角色限定的查询在访问存储前调用 [`authorize`]。

use shared::error::AppError;
use shared::models::{Identity, Role};

use crate::security_log;

/// 身份角色与要求一致时放行，否则返回 `PermissionDenied`
pub fn authorize(identity: &Identity, required: Role) -> Result<(), AppError> {
    if identity.role == required {
        return Ok(());
    }

    security_log!(
        "WARN",
        "role_denied",
        user_id = identity.id.as_str(),
        user_role = identity.role.as_str(),
        required_role = required.as_str()
    );
    Err(AppError::forbidden())
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::error::ErrorCode;

    fn identity(role: Role) -> Identity {
        Identity {
            id: "u-1".to_string(),
            email: "ann@example.com".to_string(),
            name: "Ann".to_string(),
            role,
        }
    }

    #[test]
    fn test_allows_iff_role_matches() {
        for actual in [Role::Customer, Role::Delivery] {
            for required in [Role::Customer, Role::Delivery] {
                let result = authorize(&identity(actual), required);
                if actual == required {
                    assert!(result.is_ok());
                } else {
                    let err = result.unwrap_err();
                    assert_eq!(err.code, ErrorCode::PermissionDenied);
                    assert_eq!(err.message, "Action not allowed");
                }
            }
        }
    }
}
