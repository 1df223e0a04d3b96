//! 重试模块
//!
//! 包含退避策略、错误处理器约定以及驱动重试循环的 `RetryPolicy`。

pub mod exponential;
pub mod fixed;
pub mod handler;
pub mod policy;

pub use exponential::ExponentialBackoff;
pub use fixed::{FixedBackoff, NoBackoff};
pub use handler::{ErrorHandler, RetryDecision, StatusCodeHandler};
pub use policy::RetryPolicy;

use crate::config::BackoffKind;
use std::time::Duration;

/// 退避策略 trait
///
/// `attempt` 是从 0 开始的重试序号，0 表示首次调用之后的第一次重试。
pub trait BackoffStrategy: Send + Sync {
    fn backoff_duration(&self, attempt: u32) -> Duration;
    fn max_retries(&self) -> u32;

    /// 第 `attempt` 次重试前的等待时间，重试次数用尽时返回 `None`
    fn next_delay(&self, attempt: u32) -> Option<Duration> {
        if attempt >= self.max_retries() {
            return None;
        }
        Some(self.backoff_duration(attempt))
    }
}

impl BackoffKind {
    /// 根据配置创建退避策略实例
    pub fn build(&self, max_retries: u32) -> Box<dyn BackoffStrategy> {
        match *self {
            BackoffKind::Exponential {
                base_delay_ms,
                multiplier,
                max_delay_ms,
            } => Box::new(ExponentialBackoff::new(
                max_retries,
                Duration::from_millis(base_delay_ms),
                multiplier,
                Duration::from_millis(max_delay_ms),
            )),
            BackoffKind::Fixed { delay_ms } => {
                Box::new(FixedBackoff::new(max_retries, Duration::from_millis(delay_ms)))
            }
            BackoffKind::NoBackoff => Box::new(NoBackoff::new(max_retries)),
        }
    }
}
