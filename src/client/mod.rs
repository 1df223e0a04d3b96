//! gRPC 客户端模块
//!
//! `RpcClient` 把三种调用形态（同步一元、异步一元、双向流）包装成统一的
//! 重试调用：每次尝试都重新获取句柄、重新构造请求，再交给 `RetryPolicy`。

pub mod grpc;
pub mod stream;
pub mod stub;

pub use grpc::{GrpcChannelProvider, GrpcStub, ROUTE_METADATA_KEY};
pub use stream::{RequestSink, ResponseObserver};
pub use stub::{
    AsyncStubProvider, AsyncUnaryStub, BidiStreamingStub, BlockingStubProvider,
    BlockingUnaryStub, MethodDescriptor,
};

use crate::config::ClientConfig;
use crate::error::Result;
use crate::interceptor::{CallInterceptor, LoggingInterceptor};
use crate::retry::{ErrorHandler, RetryPolicy};
use std::sync::Arc;
use tracing::{Instrument, Span};
use uuid::Uuid;

/// 带重试的 gRPC 调用适配器
///
/// 配置由会话持有并以 `Arc` 共享，调用期间只读；
/// 重试状态只存在于单个逻辑调用内部。
pub struct RpcClient<P> {
    config: Arc<ClientConfig>,
    provider: P,
    interceptor: Arc<dyn CallInterceptor>,
}

impl<P> RpcClient<P> {
    /// 创建客户端，配置非法时返回配置错误
    pub fn new(config: Arc<ClientConfig>, provider: P) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            provider,
            interceptor: Arc::new(LoggingInterceptor::new()),
        })
    }

    /// 替换诊断拦截器
    #[must_use]
    pub fn with_interceptor(mut self, interceptor: Arc<dyn CallInterceptor>) -> Self {
        self.interceptor = interceptor;
        self
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::from_config(&self.config).with_interceptor(self.interceptor.clone())
    }

    /// 同步一元调用
    ///
    /// 在调用线程上执行整个重试循环（包括退避等待）。
    /// 在异步上下文中应放到 `spawn_blocking` 线程上调用。
    pub fn call_with_retry<Req, Resp, F, H>(
        &self,
        method: &MethodDescriptor<Req, Resp>,
        mut request_factory: F,
        handler: &H,
    ) -> Result<Resp>
    where
        P: BlockingStubProvider,
        P::Stub: BlockingUnaryStub<Req, Resp>,
        F: FnMut() -> Req,
        H: ErrorHandler<Resp> + ?Sized,
    {
        let name = method.full_name();
        let span = call_span(name);
        let _entered = span.enter();

        self.interceptor.on_enter(name);
        let result = self.retry_policy().call_with_retry(name, handler, || {
            let request = request_factory();
            let stub = self.provider.blocking_stub()?;
            stub.blocking_unary(method, request)
        });
        self.interceptor.on_exit(name, result.is_ok());
        result
    }

    /// 异步一元调用
    ///
    /// 重试只覆盖调用的发出阶段：句柄获取或发出失败会交给错误处理器，
    /// 发出成功后远端的响应或错误通过 `observer` 送达，不再重试。
    pub async fn call_async_with_retry<Req, Resp, F, H>(
        &self,
        method: &MethodDescriptor<Req, Resp>,
        mut request_factory: F,
        observer: Arc<dyn ResponseObserver<Resp>>,
        handler: &H,
    ) -> Result<()>
    where
        P: AsyncStubProvider,
        P::Stub: AsyncUnaryStub<Req, Resp>,
        Req: Send + 'static,
        Resp: Send + 'static,
        F: FnMut() -> Req + Send,
        H: ErrorHandler<()> + ?Sized,
    {
        let name = method.full_name();
        async move {
            self.interceptor.on_enter(name);
            let result = self
                .retry_policy()
                .call_with_retry_async(name, handler, || {
                    let request = request_factory();
                    let stub = self.provider.async_stub();
                    let observer = observer.clone();
                    async move { stub?.start_unary(method, request, observer).await }
                })
                .await;
            self.interceptor.on_exit(name, result.is_ok());
            result
        }
        .instrument(call_span(name))
        .await
    }

    /// 双向流调用
    ///
    /// 重试只覆盖流的建立；拿到请求发送端之后，流上的失败不再由这里重试。
    pub async fn call_bidi_streaming_with_retry<Req, Resp, H>(
        &self,
        method: &MethodDescriptor<Req, Resp>,
        observer: Arc<dyn ResponseObserver<Resp>>,
        handler: &H,
    ) -> Result<RequestSink<Req>>
    where
        P: AsyncStubProvider,
        P::Stub: BidiStreamingStub<Req, Resp>,
        Req: Send + 'static,
        Resp: Send + 'static,
        H: ErrorHandler<RequestSink<Req>> + ?Sized,
    {
        let name = method.full_name();
        async move {
            self.interceptor.on_enter(name);
            let result = self
                .retry_policy()
                .call_with_retry_async(name, handler, || {
                    let stub = self.provider.async_stub();
                    let observer = observer.clone();
                    async move { stub?.start_bidi_streaming(method, observer).await }
                })
                .await;
            self.interceptor.on_exit(name, result.is_ok());
            result
        }
        .instrument(call_span(name))
        .await
    }
}

/// 每个逻辑调用一个 span，call_id 用于区分并发调用的日志
fn call_span(method: &str) -> Span {
    tracing::debug_span!("rpc_call", method = %method, call_id = %Uuid::new_v4())
}
