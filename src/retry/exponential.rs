use super::BackoffStrategy;
use std::time::Duration;

/// 指数退避策略
///
/// 第 n 次重试（从 0 开始）前等待 `base_delay * multiplier^n`，不超过 `max_delay`。
/// 结果只取决于 n，便于测试断言精确序列。
#[derive(Debug, Clone)]
pub struct ExponentialBackoff {
    max_retries: u32,
    base_delay: Duration,
    multiplier: u32,
    max_delay: Duration,
}

impl ExponentialBackoff {
    pub fn new(max_retries: u32, base_delay: Duration, multiplier: u32, max_delay: Duration) -> Self {
        Self {
            max_retries,
            base_delay,
            multiplier,
            max_delay,
        }
    }
}

impl BackoffStrategy for ExponentialBackoff {
    fn backoff_duration(&self, attempt: u32) -> Duration {
        // 溢出时直接取上限
        self.multiplier
            .checked_pow(attempt)
            .and_then(|factor| self.base_delay.checked_mul(factor))
            .map_or(self.max_delay, |delay| delay.min(self.max_delay))
    }

    fn max_retries(&self) -> u32 {
        self.max_retries
    }
}
