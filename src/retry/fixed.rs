use super::BackoffStrategy;
use std::time::Duration;

/// 固定延迟退避策略
#[derive(Debug, Clone)]
pub struct FixedBackoff {
    max_retries: u32,
    delay: Duration,
}

impl FixedBackoff {
    pub fn new(max_retries: u32, delay: Duration) -> Self {
        Self { max_retries, delay }
    }
}

impl BackoffStrategy for FixedBackoff {
    fn backoff_duration(&self, _attempt: u32) -> Duration {
        self.delay
    }

    fn max_retries(&self) -> u32 {
        self.max_retries
    }
}

/// 不等待，立即重试
#[derive(Debug, Clone)]
pub struct NoBackoff {
    max_retries: u32,
}

impl NoBackoff {
    pub fn new(max_retries: u32) -> Self {
        Self { max_retries }
    }
}

impl BackoffStrategy for NoBackoff {
    fn backoff_duration(&self, _attempt: u32) -> Duration {
        Duration::ZERO
    }

    fn max_retries(&self) -> u32 {
        self.max_retries
    }
}
