//! 基于 tonic 的调用句柄实现
//!
//! `GrpcChannelProvider` 按配置顺序使用地址，惰性建立并缓存 `Channel`；
//! `invalidate` 丢弃当前连接并切换到下一个地址（故障切换，不做负载均衡）。
//!
//! 运行时必须是多线程运行时：同步调用把请求派发到该运行时上执行，
//! 调用线程只等待结果。

use super::stream::{RequestSink, ResponseObserver};
use super::stub::{
    AsyncStubProvider, AsyncUnaryStub, BidiStreamingStub, BlockingStubProvider,
    BlockingUnaryStub, MethodDescriptor,
};
use crate::config::{ClientConfig, HostAndPort};
use crate::error::{Result, RpcError};
use async_trait::async_trait;
use http::uri::PathAndQuery;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;
use tokio::runtime::{Handle, RuntimeFlavor};
use tokio_stream::wrappers::ReceiverStream;
use tonic::client::Grpc;
use tonic::transport::{Channel, Endpoint};
use tonic::{Request, Response, Status};
use tonic_prost::ProstCodec;
use tracing::{debug, info};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
const STREAM_BUFFER: usize = 64;

/// 句柄返回的错误状态中记录发起调用时的路由序号
pub const ROUTE_METADATA_KEY: &str = "route-index";

/// 基于 tonic `Channel` 的句柄提供者
pub struct GrpcChannelProvider {
    config: Arc<ClientConfig>,
    runtime: Handle,
    current: AtomicUsize,
    channel: RwLock<Option<(usize, Channel)>>,
}

impl GrpcChannelProvider {
    /// 创建提供者
    ///
    /// `runtime` 是发起异步调用和驱动同步调用的运行时，必须是多线程运行时。
    /// 单线程运行时只有在被 `block_on` 驱动时才能推进 IO，同步调用会一直挂起，
    /// 因此直接拒绝。
    pub fn new(config: Arc<ClientConfig>, runtime: Handle) -> Result<Self> {
        config.validate()?;
        if runtime.runtime_flavor() == RuntimeFlavor::CurrentThread {
            return Err(RpcError::config(
                "GrpcChannelProvider 需要多线程 tokio 运行时",
            ));
        }
        Ok(Self {
            config,
            runtime,
            current: AtomicUsize::new(0),
            channel: RwLock::new(None),
        })
    }

    /// 当前使用的地址
    pub fn current_endpoint(&self) -> &HostAndPort {
        self.endpoint_at(self.route())
    }

    /// 当前路由序号，每次成功切换地址后加一
    pub fn route(&self) -> usize {
        self.current.load(Ordering::Acquire)
    }

    fn endpoint_at(&self, route: usize) -> &HostAndPort {
        let endpoints = self.config.endpoints();
        &endpoints[route % endpoints.len()]
    }

    /// 丢弃当前连接，下次获取句柄时连接下一个地址
    ///
    /// 等价于 `invalidate_from(self.route())`。
    pub fn invalidate(&self) -> bool {
        self.invalidate_from(self.route())
    }

    /// 按失败状态中记录的路由序号切换地址
    ///
    /// 供错误处理器的刷新回调使用：多个并发调用因同一个失效地址失败时，
    /// 只有第一个会触发切换。状态不是由 `GrpcStub` 产生时退化为 `invalidate`。
    pub fn invalidate_for(&self, status: &Status) -> bool {
        let seen = status
            .metadata()
            .get(ROUTE_METADATA_KEY)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.parse().ok())
            .unwrap_or_else(|| self.route());
        self.invalidate_from(seen)
    }

    /// 路由序号仍为 `seen` 时切换到下一个地址，返回是否发生了切换
    pub fn invalidate_from(&self, seen: usize) -> bool {
        let mut guard = self.channel.write().unwrap_or_else(PoisonError::into_inner);
        if self
            .current
            .compare_exchange(seen, seen.wrapping_add(1), Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            debug!(seen = seen, current = self.route(), "Route already switched");
            return false;
        }
        *guard = None;
        info!(
            previous = %self.endpoint_at(seen),
            next = %self.current_endpoint(),
            "Channel invalidated, switching endpoint"
        );
        true
    }

    fn channel(&self) -> std::result::Result<(usize, Channel), Status> {
        if let Some(cached) = self
            .channel
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
        {
            return Ok(cached.clone());
        }

        let mut guard = self.channel.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(cached) = guard.as_ref() {
            return Ok(cached.clone());
        }

        let route = self.route();
        let address = self.endpoint_at(route);
        let endpoint = Endpoint::from_shared(format!("http://{}", address))
            .map_err(|e| Status::invalid_argument(format!("Invalid address {}: {}", address, e)))?
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(self.config.timeout());

        // connect_lazy 会在运行时上启动后台任务
        let _enter = self.runtime.enter();
        let channel = endpoint.connect_lazy();
        debug!(address = %address, "Created lazy gRPC channel");

        *guard = Some((route, channel.clone()));
        Ok((route, channel))
    }

    fn stub(&self) -> std::result::Result<GrpcStub, Status> {
        let (route, channel) = self.channel()?;
        Ok(GrpcStub {
            channel,
            route,
            runtime: self.runtime.clone(),
            timeout: self.config.timeout(),
            max_frame_size: self.config.max_frame_size(),
        })
    }
}

impl BlockingStubProvider for GrpcChannelProvider {
    type Stub = GrpcStub;

    fn blocking_stub(&self) -> std::result::Result<GrpcStub, Status> {
        self.stub()
    }
}

impl AsyncStubProvider for GrpcChannelProvider {
    type Stub = GrpcStub;

    fn async_stub(&self) -> std::result::Result<GrpcStub, Status> {
        self.stub()
    }
}

/// 基于 tonic 的 prost 消息调用句柄
#[derive(Clone)]
pub struct GrpcStub {
    channel: Channel,
    route: usize,
    runtime: Handle,
    timeout: Duration,
    max_frame_size: usize,
}

impl GrpcStub {
    fn grpc(&self) -> Grpc<Channel> {
        Grpc::new(self.channel.clone())
            .max_decoding_message_size(self.max_frame_size)
            .max_encoding_message_size(self.max_frame_size)
    }

    fn unary_request<T>(&self, message: T) -> Request<T> {
        let mut request = Request::new(message);
        request.set_timeout(self.timeout);
        request
    }

    /// 构建该句柄时的路由序号
    pub fn route(&self) -> usize {
        self.route
    }

    fn tag_route(&self, mut status: Status) -> Status {
        if let Ok(value) = self.route.to_string().parse() {
            status.metadata_mut().insert(ROUTE_METADATA_KEY, value);
        }
        status
    }
}

async fn ready(grpc: &mut Grpc<Channel>) -> std::result::Result<(), Status> {
    grpc.ready()
        .await
        .map_err(|e| Status::unavailable(format!("Service was not ready: {}", e)))
}

async fn unary_call<Req, Resp>(
    mut grpc: Grpc<Channel>,
    path: PathAndQuery,
    request: Request<Req>,
) -> std::result::Result<Resp, Status>
where
    Req: prost::Message + Send + Sync + 'static,
    Resp: prost::Message + Default + Send + Sync + 'static,
{
    ready(&mut grpc).await?;
    grpc.unary(request, path, ProstCodec::<Req, Resp>::default())
        .await
        .map(Response::into_inner)
}

impl<Req, Resp> BlockingUnaryStub<Req, Resp> for GrpcStub
where
    Req: prost::Message + Send + Sync + 'static,
    Resp: prost::Message + Default + Send + Sync + 'static,
{
    fn blocking_unary(
        &self,
        method: &MethodDescriptor<Req, Resp>,
        request: Req,
    ) -> std::result::Result<Resp, Status> {
        let call = unary_call(self.grpc(), method.path().clone(), self.unary_request(request));
        let task = self.runtime.spawn(call);
        let wait = || futures::executor::block_on(task);

        // 在多线程运行时的工作线程上等待前先让出工作线程
        let joined = match Handle::try_current() {
            Ok(current) if current.runtime_flavor() == RuntimeFlavor::MultiThread => {
                tokio::task::block_in_place(wait)
            }
            _ => wait(),
        };
        joined
            .unwrap_or_else(|e| Err(Status::cancelled(format!("Call task aborted: {}", e))))
            .map_err(|status| self.tag_route(status))
    }
}

#[async_trait]
impl<Req, Resp> AsyncUnaryStub<Req, Resp> for GrpcStub
where
    Req: prost::Message + Send + Sync + 'static,
    Resp: prost::Message + Default + Send + Sync + 'static,
{
    async fn start_unary(
        &self,
        method: &MethodDescriptor<Req, Resp>,
        request: Req,
        observer: Arc<dyn ResponseObserver<Resp>>,
    ) -> std::result::Result<(), Status> {
        let mut grpc = self.grpc();
        ready(&mut grpc).await.map_err(|status| self.tag_route(status))?;

        let path = method.path().clone();
        let request = self.unary_request(request);
        self.runtime.spawn(async move {
            match grpc
                .unary(request, path, ProstCodec::<Req, Resp>::default())
                .await
            {
                Ok(response) => {
                    observer.on_next(response.into_inner());
                    observer.on_completed();
                }
                Err(status) => observer.on_error(status),
            }
        });
        Ok(())
    }
}

#[async_trait]
impl<Req, Resp> BidiStreamingStub<Req, Resp> for GrpcStub
where
    Req: prost::Message + Send + Sync + 'static,
    Resp: prost::Message + Default + Send + Sync + 'static,
{
    async fn start_bidi_streaming(
        &self,
        method: &MethodDescriptor<Req, Resp>,
        observer: Arc<dyn ResponseObserver<Resp>>,
    ) -> std::result::Result<RequestSink<Req>, Status> {
        let mut grpc = self.grpc();
        ready(&mut grpc).await.map_err(|status| self.tag_route(status))?;

        let (sink, outbound) = RequestSink::channel(STREAM_BUFFER);
        let path = method.path().clone();
        let request = Request::new(ReceiverStream::new(outbound));

        // 服务端可能在收到第一条消息后才返回响应头，所以在后台等待
        self.runtime.spawn(async move {
            let mut inbound = match grpc
                .streaming(request, path, ProstCodec::<Req, Resp>::default())
                .await
            {
                Ok(response) => response.into_inner(),
                Err(status) => {
                    observer.on_error(status);
                    return;
                }
            };
            loop {
                match inbound.message().await {
                    Ok(Some(message)) => observer.on_next(message),
                    Ok(None) => {
                        observer.on_completed();
                        break;
                    }
                    Err(status) => {
                        observer.on_error(status);
                        break;
                    }
                }
            }
        });
        Ok(sink)
    }
}
