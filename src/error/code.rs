//! 错误代码定义
//!
//! 错误代码按类别分组：
//! - 1000-1999: 配置相关错误
//! - 2000-2999: 调用相关错误
//! - 3000-3999: 流相关错误
//! - 9000-9999: 通用错误

use serde::{Deserialize, Serialize};
use std::fmt;

/// 错误代码枚举
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[repr(u32)]
pub enum ErrorCode {
    // ============================================================
    // 配置相关错误 (1000-1999)
    // ============================================================
    ConfigurationError = 1000,
    InvalidEndpoint = 1001,

    // ============================================================
    // 调用相关错误 (2000-2999)
    // ============================================================
    OperationFailed = 2000,
    RetryExhausted = 2001,

    // ============================================================
    // 流相关错误 (3000-3999)
    // ============================================================
    StreamClosed = 3000,

    // ============================================================
    // 通用错误 (9000-9999)
    // ============================================================
    IoError = 9000,
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl ErrorCode {
    /// 获取错误代码的数字值
    #[inline]
    pub fn as_u32(&self) -> u32 {
        *self as u32
    }

    /// 从数字值创建错误代码
    pub fn from_u32(code: u32) -> Option<Self> {
        match code {
            1000 => Some(ErrorCode::ConfigurationError),
            1001 => Some(ErrorCode::InvalidEndpoint),
            2000 => Some(ErrorCode::OperationFailed),
            2001 => Some(ErrorCode::RetryExhausted),
            3000 => Some(ErrorCode::StreamClosed),
            9000 => Some(ErrorCode::IoError),
            _ => None,
        }
    }

    /// 获取错误代码的英文标识符
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::ConfigurationError => "CONFIGURATION_ERROR",
            ErrorCode::InvalidEndpoint => "INVALID_ENDPOINT",
            ErrorCode::OperationFailed => "OPERATION_FAILED",
            ErrorCode::RetryExhausted => "RETRY_EXHAUSTED",
            ErrorCode::StreamClosed => "STREAM_CLOSED",
            ErrorCode::IoError => "IO_ERROR",
        }
    }
}
