//! Flare RPC Client 错误处理模块
//!
//! 提供统一的错误类型、错误代码分类以及到 gRPC Status 的转换

pub mod code;
pub mod grpc;
pub mod rpc_error;

// 重新导出公共类型
pub use code::ErrorCode;
pub use rpc_error::{Result, RpcError};
