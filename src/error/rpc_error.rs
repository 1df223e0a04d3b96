//! RPC 客户端统一错误类型

use super::code::ErrorCode;
use thiserror::Error;
use tonic::Status;

/// RPC 客户端统一错误类型
///
/// 调用失败总是携带方法名和已尝试次数，调用方据此区分
/// "重试 N 次后放弃" 与 "首次即被拒绝"。
#[derive(Error, Debug)]
pub enum RpcError {
    /// 配置错误（只在构造阶段出现，调用期间不会出现）
    #[error("配置错误: {0}")]
    Config(String),

    /// 非法的 host:port 地址
    #[error("非法地址 `{endpoint}`: {reason}")]
    InvalidEndpoint { endpoint: String, reason: String },

    /// 错误处理器判定为不可重试的失败
    #[error("调用 {method} 失败 (共尝试 {attempts} 次): {status}")]
    Fatal {
        method: String,
        attempts: u32,
        status: Status,
    },

    /// 重试次数耗尽
    #[error("调用 {method} 重试耗尽 (共尝试 {attempts} 次): {status}")]
    RetryExhausted {
        method: String,
        attempts: u32,
        status: Status,
    },

    /// 双向流已关闭
    #[error("流已关闭: {0}")]
    StreamClosed(String),

    /// IO 错误
    #[error("IO 错误: {0}")]
    Io(String),
}

impl RpcError {
    /// 创建配置错误
    pub fn config(msg: impl Into<String>) -> Self {
        RpcError::Config(msg.into())
    }

    /// 创建非法地址错误
    pub fn invalid_endpoint(endpoint: impl Into<String>, reason: impl Into<String>) -> Self {
        RpcError::InvalidEndpoint {
            endpoint: endpoint.into(),
            reason: reason.into(),
        }
    }

    /// 创建不可重试的调用错误
    pub fn fatal(method: impl Into<String>, attempts: u32, status: Status) -> Self {
        RpcError::Fatal {
            method: method.into(),
            attempts,
            status,
        }
    }

    /// 创建重试耗尽错误
    pub fn retry_exhausted(method: impl Into<String>, attempts: u32, status: Status) -> Self {
        RpcError::RetryExhausted {
            method: method.into(),
            attempts,
            status,
        }
    }

    /// 创建流关闭错误
    pub fn stream_closed(msg: impl Into<String>) -> Self {
        RpcError::StreamClosed(msg.into())
    }

    // ============================================================
    // 信息获取方法
    // ============================================================

    /// 获取错误代码
    pub fn code(&self) -> ErrorCode {
        match self {
            RpcError::Config(_) => ErrorCode::ConfigurationError,
            RpcError::InvalidEndpoint { .. } => ErrorCode::InvalidEndpoint,
            RpcError::Fatal { .. } => ErrorCode::OperationFailed,
            RpcError::RetryExhausted { .. } => ErrorCode::RetryExhausted,
            RpcError::StreamClosed(_) => ErrorCode::StreamClosed,
            RpcError::Io(_) => ErrorCode::IoError,
        }
    }

    /// 失败调用的方法名
    pub fn method(&self) -> Option<&str> {
        match self {
            RpcError::Fatal { method, .. } | RpcError::RetryExhausted { method, .. } => {
                Some(method)
            }
            _ => None,
        }
    }

    /// 失败调用已尝试的次数（含首次调用）
    pub fn attempts(&self) -> Option<u32> {
        match self {
            RpcError::Fatal { attempts, .. } | RpcError::RetryExhausted { attempts, .. } => {
                Some(*attempts)
            }
            _ => None,
        }
    }

    /// 最后一次尝试的 gRPC 状态
    pub fn status(&self) -> Option<&Status> {
        match self {
            RpcError::Fatal { status, .. } | RpcError::RetryExhausted { status, .. } => {
                Some(status)
            }
            _ => None,
        }
    }

    /// 是否为重试耗尽
    pub fn is_retry_exhausted(&self) -> bool {
        matches!(self, RpcError::RetryExhausted { .. })
    }

    /// 是否为不可重试的失败
    pub fn is_fatal(&self) -> bool {
        matches!(self, RpcError::Fatal { .. })
    }
}

impl From<std::io::Error> for RpcError {
    fn from(err: std::io::Error) -> Self {
        RpcError::Io(err.to_string())
    }
}

impl From<toml::de::Error> for RpcError {
    fn from(err: toml::de::Error) -> Self {
        RpcError::config(format!("TOML 解析错误: {}", err))
    }
}

/// 结果类型别名
pub type Result<T> = std::result::Result<T, RpcError>;
