//! 工具函数模块

use crate::error::{Result, RpcError};
use tracing_subscriber::EnvFilter;

/// 初始化全局 tracing 订阅者
///
/// 优先使用 `RUST_LOG` 环境变量，未设置时使用 `default_filter`。
/// 已经存在全局订阅者时返回配置错误。
///
/// # 示例
/// ```rust,no_run
/// use flare_rpc_client::utils::init_tracing;
///
/// init_tracing("flare_rpc_client=debug").expect("tracing already initialized");
/// ```
pub fn init_tracing(default_filter: &str) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_filter))
        .map_err(|e| RpcError::config(format!("非法的日志过滤规则 `{}`: {}", default_filter, e)))?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init()
        .map_err(|e| RpcError::config(format!("日志初始化失败: {}", e)))
}
