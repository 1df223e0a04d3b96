//! 调用诊断拦截器模块
//!
//! 每个逻辑调用在进入、重试、退出时通知拦截器。拦截器只做观测，
//! 不影响控制流和重试结果。

pub mod composite;
pub mod logging;

pub use composite::CompositeInterceptor;
pub use logging::LoggingInterceptor;

use std::time::Duration;
use tonic::Status;

/// 调用诊断拦截器 trait
pub trait CallInterceptor: Send + Sync {
    /// 逻辑调用开始
    fn on_enter(&self, _method: &str) {}

    /// 第 `attempt` 次尝试失败，将在 `delay` 后重试
    fn on_retry(&self, _method: &str, _attempt: u32, _delay: Duration, _status: &Status) {}

    /// 逻辑调用结束
    fn on_exit(&self, _method: &str, _succeeded: bool) {}
}

/// 不做任何事情的拦截器
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopInterceptor;

impl CallInterceptor for NoopInterceptor {}
