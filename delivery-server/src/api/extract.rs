//! JSON 请求体提取器
//!
//! 与 `axum::Json` 相同，但反序列化失败时返回 `ValidationFailed` (code 2)，
//! `details` 指向出错字段，而不是 axum 默认的纯文本 4xx 响应。

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequest, Request};
use serde::de::DeserializeOwned;
use shared::error::AppError;

/// axum 数据错误文本前缀，其后是 `path: message`
const DATA_ERROR_PREFIX: &str = "Failed to deserialize the JSON body into the target type: ";

#[derive(Debug, Clone, Copy, Default)]
pub struct ValidJson<T>(pub T);

impl<T, S> FromRequest<S> for ValidJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(Self(value)),
            Err(rejection) => Err(rejection_error(rejection)),
        }
    }
}

fn rejection_error(rejection: JsonRejection) -> AppError {
    let text = rejection.body_text();
    tracing::debug!(status = %rejection.status(), "Rejected request body: {text}");
    let (field, message) = body_error_field(&text);
    AppError::invalid_field(field, message)
}

/// 从 axum 的拒绝文本中找出字段名，找不到时归到 `body`
fn body_error_field(text: &str) -> (String, String) {
    let Some(rest) = text.strip_prefix(DATA_ERROR_PREFIX) else {
        return ("body".to_string(), text.to_string());
    };

    if let Some(name) = rest
        .strip_prefix("missing field `")
        .and_then(|s| s.split_once('`'))
        .map(|(name, _)| name)
    {
        return (name.to_string(), rest.to_string());
    }

    match rest.split_once(": ") {
        Some((path, message)) if !path.is_empty() && !path.contains(char::is_whitespace) => {
            (path.to_string(), message.to_string())
        }
        _ => ("body".to_string(), rest.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_from_data_error() {
        let (field, message) = body_error_field(
            "Failed to deserialize the JSON body into the target type: role: unknown variant `Admin`, expected `Customer` or `Delivery` at line 1 column 20",
        );
        assert_eq!(field, "role");
        assert!(message.starts_with("unknown variant `Admin`"));
    }

    #[test]
    fn test_field_from_missing_field() {
        let (field, _) = body_error_field(
            "Failed to deserialize the JSON body into the target type: missing field `repeatPassword` at line 1 column 80",
        );
        assert_eq!(field, "repeatPassword");
    }

    #[test]
    fn test_syntax_error_falls_back_to_body() {
        let text = "Failed to parse the request body as JSON: EOF while parsing an object at line 1 column 1";
        assert_eq!(body_error_field(text), ("body".to_string(), text.to_string()));

        let (field, _) = body_error_field(
            "Failed to deserialize the JSON body into the target type: invalid type: string \"x\", expected u32 at line 1 column 3",
        );
        assert_eq!(field, "body");
    }
}
