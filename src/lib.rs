//! Flare RPC Client Library
//!
//! Client-side gRPC invocation layer: blocking unary, async unary and
//! bidirectional streaming calls wrapped in a uniform retry-and-backoff loop
//! with caller-supplied error classification.

pub mod client;
pub mod config;
pub mod error;
pub mod interceptor;
pub mod retry;
pub mod utils;

// Re-exports
pub use client::{
    AsyncStubProvider, AsyncUnaryStub, BidiStreamingStub, BlockingStubProvider,
    BlockingUnaryStub, GrpcChannelProvider, GrpcStub, MethodDescriptor, RequestSink,
    ResponseObserver, RpcClient,
};
pub use config::{BackoffKind, ClientConfig, HostAndPort};
pub use error::{ErrorCode, Result, RpcError};
pub use interceptor::{CallInterceptor, CompositeInterceptor, LoggingInterceptor, NoopInterceptor};
pub use retry::{
    BackoffStrategy, ErrorHandler, ExponentialBackoff, FixedBackoff, NoBackoff, RetryDecision,
    RetryPolicy, StatusCodeHandler,
};
