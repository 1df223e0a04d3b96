use super::CallInterceptor;
use std::time::Duration;
use tonic::Status;
use tracing::{debug, warn};

/// 毫秒数，超出 u64 时取上限
fn delay_millis(delay: Duration) -> u64 {
    u64::try_from(delay.as_millis()).unwrap_or(u64::MAX)
}

/// 日志拦截器
///
/// 通过 `tracing` 输出调用的进入、重试和退出事件。
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingInterceptor;

impl LoggingInterceptor {
    pub fn new() -> Self {
        Self
    }
}

impl CallInterceptor for LoggingInterceptor {
    fn on_enter(&self, method: &str) {
        debug!(method = %method, "Calling gRPC method");
    }

    fn on_retry(&self, method: &str, attempt: u32, delay: Duration, status: &Status) {
        warn!(
            method = %method,
            attempt = attempt,
            delay_ms = delay_millis(delay),
            code = ?status.code(),
            error = %status.message(),
            "gRPC attempt failed, retrying..."
        );
    }

    fn on_exit(&self, method: &str, succeeded: bool) {
        debug!(method = %method, succeeded = succeeded, "Leaving gRPC method");
    }
}
