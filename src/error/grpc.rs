//! gRPC 错误处理
//!
//! 提供 RpcError 到 gRPC Status 的转换

use super::{ErrorCode, RpcError};
use tonic::{Code, Status};

impl From<RpcError> for Status {
    fn from(err: RpcError) -> Self {
        let code = err.code();
        let mut status = match err {
            // 保留远端返回的状态码，只补充方法名和尝试次数
            RpcError::Fatal {
                method,
                attempts,
                status,
            }
            | RpcError::RetryExhausted {
                method,
                attempts,
                status,
            } => Status::new(
                status.code(),
                format!("{} (method={}, attempts={})", status.message(), method, attempts),
            ),
            other => Status::new(map_error_code_to_grpc(code), other.to_string()),
        };

        // 添加错误代码到 metadata
        if let Ok(value) = code.as_u32().to_string().parse() {
            status.metadata_mut().insert("error-code", value);
        }

        status
    }
}

/// 将错误代码映射到 gRPC 状态码
fn map_error_code_to_grpc(code: ErrorCode) -> Code {
    match code {
        ErrorCode::ConfigurationError | ErrorCode::InvalidEndpoint => Code::InvalidArgument,
        ErrorCode::StreamClosed => Code::Cancelled,
        ErrorCode::IoError => Code::Unavailable,
        ErrorCode::OperationFailed => Code::Unknown,
        ErrorCode::RetryExhausted => Code::Aborted,
    }
}
