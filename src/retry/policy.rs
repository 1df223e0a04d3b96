//! 重试执行引擎
//!
//! 状态机：ATTEMPTING → {SUCCEEDED, RETRY_WAIT, FAILED}，
//! RETRY_WAIT → ATTEMPTING（等待退避后）或 FAILED（重试次数用尽）。
//! 同步与异步两种循环共享同一套判定逻辑，只是等待方式不同。

use super::handler::{ErrorHandler, RetryDecision};
use super::BackoffStrategy;
use crate::config::ClientConfig;
use crate::error::{Result, RpcError};
use crate::interceptor::{CallInterceptor, LoggingInterceptor};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tonic::Status;

/// 重试执行引擎
pub struct RetryPolicy {
    backoff: Box<dyn BackoffStrategy>,
    interceptor: Arc<dyn CallInterceptor>,
}

/// 单次判定之后的下一步
enum Step<T> {
    Done(Result<T>),
    Wait(Duration),
}

/// 单个逻辑调用的重试状态，不在调用之间共享
struct CallState<'a> {
    method: &'a str,
    attempts: u32,
}

impl RetryPolicy {
    pub fn new(backoff: Box<dyn BackoffStrategy>) -> Self {
        Self {
            backoff,
            interceptor: Arc::new(LoggingInterceptor::new()),
        }
    }

    /// 按配置中的重试次数和退避策略创建
    pub fn from_config(config: &ClientConfig) -> Self {
        Self::new(config.backoff().build(config.retry_count()))
    }

    /// 替换诊断拦截器
    #[must_use]
    pub fn with_interceptor(mut self, interceptor: Arc<dyn CallInterceptor>) -> Self {
        self.interceptor = interceptor;
        self
    }

    /// 同步执行重试循环，退避期间阻塞当前线程
    pub fn call_with_retry<T, H, F>(&self, method: &str, handler: &H, mut attempt: F) -> Result<T>
    where
        H: ErrorHandler<T> + ?Sized,
        F: FnMut() -> std::result::Result<T, Status>,
    {
        let mut state = CallState { method, attempts: 0 };
        loop {
            let outcome = attempt();
            match self.on_outcome(&mut state, handler, outcome) {
                Step::Done(result) => return result,
                Step::Wait(delay) => {
                    if !delay.is_zero() {
                        std::thread::sleep(delay);
                    }
                }
            }
        }
    }

    /// 异步执行重试循环，退避通过 tokio 定时器等待，不占用调用线程
    pub async fn call_with_retry_async<T, H, F, Fut>(
        &self,
        method: &str,
        handler: &H,
        mut attempt: F,
    ) -> Result<T>
    where
        H: ErrorHandler<T> + ?Sized,
        F: FnMut() -> Fut,
        Fut: Future<Output = std::result::Result<T, Status>>,
    {
        let mut state = CallState { method, attempts: 0 };
        loop {
            let outcome = attempt().await;
            match self.on_outcome(&mut state, handler, outcome) {
                Step::Done(result) => return result,
                Step::Wait(delay) => {
                    if !delay.is_zero() {
                        tokio::time::sleep(delay).await;
                    }
                }
            }
        }
    }

    fn on_outcome<T, H>(
        &self,
        state: &mut CallState<'_>,
        handler: &H,
        outcome: std::result::Result<T, Status>,
    ) -> Step<T>
    where
        H: ErrorHandler<T> + ?Sized,
    {
        state.attempts += 1;
        let decision = handler.classify(&outcome);

        match (decision, outcome) {
            (RetryDecision::Accept, Ok(value)) => Step::Done(Ok(value)),
            (RetryDecision::Accept | RetryDecision::Fatal, Err(status)) => {
                Step::Done(Err(RpcError::fatal(state.method, state.attempts, status)))
            }
            (RetryDecision::Fatal, Ok(_)) => Step::Done(Err(RpcError::fatal(
                state.method,
                state.attempts,
                rejected_response(state.method),
            ))),
            (RetryDecision::Retry, outcome) => {
                let status = outcome.err().unwrap_or_else(|| rejected_response(state.method));
                // 第 1 次尝试失败后对应第 0 次重试
                match self.backoff.next_delay(state.attempts - 1) {
                    Some(delay) => {
                        self.interceptor
                            .on_retry(state.method, state.attempts, delay, &status);
                        Step::Wait(delay)
                    }
                    None => Step::Done(Err(RpcError::retry_exhausted(
                        state.method,
                        state.attempts,
                        status,
                    ))),
                }
            }
        }
    }
}

/// 成功响应被错误处理器拒绝时使用的状态
fn rejected_response(method: &str) -> Status {
    Status::aborted(format!("{} 的响应被错误处理器拒绝", method))
}
