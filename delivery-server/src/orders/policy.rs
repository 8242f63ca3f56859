//! 订单状态迁移规则

use std::fmt;
use std::str::FromStr;

use shared::models::OrderStatus;

/// 状态迁移策略
///
/// | 策略 | 允许的迁移 |
/// |------|-----------|
/// | `Linear` | `Pending → Accepted → Out_for_delivery → Delivered`，逐级前进 |
/// | `Unrestricted` | 任意状态到任意状态 |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusPolicy {
    #[default]
    Linear,
    Unrestricted,
}

impl StatusPolicy {
    pub fn allows(&self, from: OrderStatus, to: OrderStatus) -> bool {
        match self {
            StatusPolicy::Linear => from.next() == Some(to),
            StatusPolicy::Unrestricted => true,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StatusPolicy::Linear => "linear",
            StatusPolicy::Unrestricted => "unrestricted",
        }
    }
}

impl fmt::Display for StatusPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StatusPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "linear" => Ok(StatusPolicy::Linear),
            "unrestricted" => Ok(StatusPolicy::Unrestricted),
            other => Err(format!("unknown status policy: {other}")),
        }
    }
}
