//! 调用句柄相关的能力接口
//!
//! `RpcClient` 只依赖这些窄接口：能产出同步句柄、能产出异步句柄，
//! 以及句柄能发起的三种调用形态。

use super::stream::{RequestSink, ResponseObserver};
use async_trait::async_trait;
use http::uri::PathAndQuery;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;
use tonic::Status;

/// 远程方法描述
pub struct MethodDescriptor<Req, Resp> {
    full_name: &'static str,
    path: PathAndQuery,
    _marker: PhantomData<fn(Req) -> Resp>,
}

impl<Req, Resp> MethodDescriptor<Req, Resp> {
    /// 由 gRPC 路径创建，如 `/tikvpb.Tikv/KvGet`
    ///
    /// 路径非法时 panic，与生成代码中 `PathAndQuery::from_static` 的行为一致。
    pub fn new(path: &'static str) -> Self {
        Self {
            full_name: path.trim_start_matches('/'),
            path: PathAndQuery::from_static(path),
            _marker: PhantomData,
        }
    }

    /// 完整方法名，如 `tikvpb.Tikv/KvGet`
    pub fn full_name(&self) -> &'static str {
        self.full_name
    }

    /// HTTP/2 请求路径
    pub fn path(&self) -> &PathAndQuery {
        &self.path
    }
}

impl<Req, Resp> Clone for MethodDescriptor<Req, Resp> {
    fn clone(&self) -> Self {
        Self {
            full_name: self.full_name,
            path: self.path.clone(),
            _marker: PhantomData,
        }
    }
}

impl<Req, Resp> fmt::Debug for MethodDescriptor<Req, Resp> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodDescriptor")
            .field("full_name", &self.full_name)
            .finish()
    }
}

/// 能产出同步调用句柄
///
/// 每次尝试都会调用一次，实现可以缓存句柄，也可以每次重新解析。
pub trait BlockingStubProvider: Send + Sync {
    type Stub;

    fn blocking_stub(&self) -> Result<Self::Stub, Status>;
}

/// 能产出异步调用句柄
pub trait AsyncStubProvider: Send + Sync {
    type Stub;

    fn async_stub(&self) -> Result<Self::Stub, Status>;
}

/// 同步一元调用
pub trait BlockingUnaryStub<Req, Resp> {
    fn blocking_unary(
        &self,
        method: &MethodDescriptor<Req, Resp>,
        request: Req,
    ) -> Result<Resp, Status>;
}

/// 异步一元调用
///
/// 调用发出即返回 `Ok(())`，远端结果随后通过 `observer` 送达。
#[async_trait]
pub trait AsyncUnaryStub<Req, Resp>: Send + Sync
where
    Req: Send + 'static,
    Resp: Send + 'static,
{
    async fn start_unary(
        &self,
        method: &MethodDescriptor<Req, Resp>,
        request: Req,
        observer: Arc<dyn ResponseObserver<Resp>>,
    ) -> Result<(), Status>;
}

/// 双向流调用
///
/// 建立流后返回请求发送端，响应通过 `observer` 送达。
#[async_trait]
pub trait BidiStreamingStub<Req, Resp>: Send + Sync
where
    Req: Send + 'static,
    Resp: Send + 'static,
{
    async fn start_bidi_streaming(
        &self,
        method: &MethodDescriptor<Req, Resp>,
        observer: Arc<dyn ResponseObserver<Resp>>,
    ) -> Result<RequestSink<Req>, Status>;
}
