//! 错误类型体系
//!
//! 分两层：
//!
//! - [`HardwareError`]: 遥测/执行器访问失败，由控制循环在单个 tick 内有限次重试
//! - [`GripperError`]: 对调用者可见的同步错误（命令被拒绝、句柄无效、服务已停止）
//!
//! 运动失败、抓取宽度不匹配、被抢占、超时都**不是**错误：它们作为
//! [`FailureCause`](crate::types::FailureCause) 写入终态结果，`success = false`。

use thiserror::Error;

use crate::config::ConfigError;
use crate::types::GoalId;

/// 硬件访问错误
#[derive(Debug, Clone, Error, PartialEq)]
pub enum HardwareError {
    /// 读取超时
    #[error("Telemetry read timeout after {timeout_ms}ms")]
    Timeout {
        /// 超时时间（毫秒）
        timeout_ms: u64,
    },

    /// 设备断开
    #[error("Gripper hardware disconnected")]
    Disconnected,

    /// 底层 I/O 错误
    #[error("Gripper I/O error: {0}")]
    Io(String),
}

impl HardwareError {
    /// 是否可重试
    ///
    /// 断开连接不可重试，其余错误在同一个 tick 内重试。
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Timeout { .. } | Self::Io(_))
    }
}

/// 夹爪控制错误
#[derive(Debug, Error)]
pub enum GripperError {
    /// 参数无效（命令被拒绝）
    #[error("Invalid parameter '{param}': {reason}")]
    InvalidParameter {
        /// 参数名
        param: String,
        /// 原因
        reason: String,
    },

    /// 未知的目标句柄（从未提交，或结果已被取走）
    #[error("Unknown goal {0}")]
    UnknownGoal(GoalId),

    /// 控制线程已停止
    #[error("Gripper server stopped")]
    ServerStopped,

    /// 硬件错误
    #[error("Hardware error: {0}")]
    Hardware(#[from] HardwareError),

    /// 配置错误
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl GripperError {
    /// 创建参数无效错误
    pub fn invalid_parameter(param: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            param: param.into(),
            reason: reason.into(),
        }
    }

    /// 是否为命令拒绝（参数校验失败）
    pub fn is_rejection(&self) -> bool {
        matches!(self, Self::InvalidParameter { .. })
    }
}

/// Result 类型别名
pub type Result<T> = std::result::Result<T, GripperError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hardware_error_retryable() {
        assert!(HardwareError::Timeout { timeout_ms: 5 }.is_retryable());
        assert!(HardwareError::Io("bus glitch".to_string()).is_retryable());
        assert!(!HardwareError::Disconnected.is_retryable());
    }

    #[test]
    fn test_error_display() {
        let err = GripperError::invalid_parameter("speed", "must be > 0, got 0");
        assert_eq!(format!("{}", err), "Invalid parameter 'speed': must be > 0, got 0");
        assert!(err.is_rejection());

        let err = GripperError::UnknownGoal(GoalId(7));
        assert!(format!("{}", err).contains("#7"));
        assert!(!err.is_rejection());

        let err: GripperError = HardwareError::Timeout { timeout_ms: 5 }.into();
        assert!(format!("{}", err).contains("5ms"));
    }

    #[test]
    fn test_error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<GripperError>();
        assert_send_sync::<HardwareError>();
    }
}
