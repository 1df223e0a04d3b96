//! 错误处理器
//!
//! 每个调用点提供一个错误处理器，把单次尝试的结果归类为
//! 接受、可重试或致命失败。

use std::fmt;
use std::sync::Arc;
use tonic::{Code, Status};

/// 错误处理器对单次尝试结果的判定
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// 接受结果，结束调用
    Accept,
    /// 本次尝试失败，退避后重试
    Retry,
    /// 不可重试，立即把失败交给调用方
    Fatal,
}

/// 错误处理器 trait
///
/// 每次尝试完成后恰好调用一次 `classify`。允许带副作用（例如刷新路由），
/// 但副作用必须在返回前完成，下一次尝试才能看到更新后的状态。
pub trait ErrorHandler<T>: Send + Sync {
    fn classify(&self, outcome: &Result<T, Status>) -> RetryDecision;
}

impl<T, F> ErrorHandler<T> for F
where
    F: Fn(&Result<T, Status>) -> RetryDecision + Send + Sync,
{
    fn classify(&self, outcome: &Result<T, Status>) -> RetryDecision {
        self(outcome)
    }
}

type RefreshFn = Arc<dyn Fn(&Status) + Send + Sync>;

/// 基于 gRPC 状态码的错误处理器
///
/// 成功结果一律接受；失败时：
/// - 命中 `refresh_on` 注册的状态码：先执行刷新回调，再判定为可重试
/// - 命中可重试状态码：可重试
/// - 其他：致命失败
///
/// # 示例
/// ```rust
/// use flare_rpc_client::StatusCodeHandler;
/// use tonic::Code;
///
/// let handler = StatusCodeHandler::new()
///     .retry_on(Code::Aborted)
///     .refresh_on(Code::FailedPrecondition, |status| {
///         tracing::info!(message = status.message(), "leader changed, reloading route");
///     });
/// ```
#[derive(Clone)]
pub struct StatusCodeHandler {
    retryable: Vec<Code>,
    refresh: Vec<(Code, RefreshFn)>,
}

impl StatusCodeHandler {
    /// 默认对 Unavailable / DeadlineExceeded / ResourceExhausted 重试
    pub fn new() -> Self {
        Self {
            retryable: vec![
                Code::Unavailable,
                Code::DeadlineExceeded,
                Code::ResourceExhausted,
            ],
            refresh: Vec::new(),
        }
    }

    /// 不重试任何状态码
    pub fn never_retry() -> Self {
        Self {
            retryable: Vec::new(),
            refresh: Vec::new(),
        }
    }

    /// 增加可重试的状态码
    #[must_use]
    pub fn retry_on(mut self, code: Code) -> Self {
        if !self.retryable.contains(&code) {
            self.retryable.push(code);
        }
        self
    }

    /// 对指定状态码先执行刷新回调再重试
    #[must_use]
    pub fn refresh_on<F>(mut self, code: Code, refresh: F) -> Self
    where
        F: Fn(&Status) + Send + Sync + 'static,
    {
        self.refresh.push((code, Arc::new(refresh)));
        self
    }

    fn classify_status(&self, status: &Status) -> RetryDecision {
        if let Some((_, refresh)) = self.refresh.iter().find(|(code, _)| *code == status.code()) {
            refresh(status);
            return RetryDecision::Retry;
        }
        if self.retryable.contains(&status.code()) {
            RetryDecision::Retry
        } else {
            RetryDecision::Fatal
        }
    }
}

impl Default for StatusCodeHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for StatusCodeHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StatusCodeHandler")
            .field("retryable", &self.retryable)
            .field(
                "refresh",
                &self.refresh.iter().map(|(code, _)| *code).collect::<Vec<_>>(),
            )
            .finish()
    }
}

impl<T> ErrorHandler<T> for StatusCodeHandler {
    fn classify(&self, outcome: &Result<T, Status>) -> RetryDecision {
        match outcome {
            Ok(_) => RetryDecision::Accept,
            Err(status) => self.classify_status(status),
        }
    }
}
