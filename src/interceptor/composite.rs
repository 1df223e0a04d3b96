//! 组合拦截器

use super::CallInterceptor;
use std::sync::Arc;
use std::time::Duration;
use tonic::Status;

/// 组合拦截器，按注册顺序依次通知
#[derive(Clone, Default)]
pub struct CompositeInterceptor {
    interceptors: Vec<Arc<dyn CallInterceptor>>,
}

impl CompositeInterceptor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, interceptor: Arc<dyn CallInterceptor>) -> Self {
        self.interceptors.push(interceptor);
        self
    }

    pub fn with_logging(self) -> Self {
        self.with(Arc::new(super::LoggingInterceptor::new()))
    }
}

impl CallInterceptor for CompositeInterceptor {
    fn on_enter(&self, method: &str) {
        for interceptor in &self.interceptors {
            interceptor.on_enter(method);
        }
    }

    fn on_retry(&self, method: &str, attempt: u32, delay: Duration, status: &Status) {
        for interceptor in &self.interceptors {
            interceptor.on_retry(method, attempt, delay, status);
        }
    }

    fn on_exit(&self, method: &str, succeeded: bool) {
        for interceptor in &self.interceptors {
            interceptor.on_exit(method, succeeded);
        }
    }
}
