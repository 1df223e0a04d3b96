//! 响应接收端与请求发送端

use crate::error::{Result, RpcError};
use std::fmt;
use tokio::sync::mpsc;
use tonic::Status;

/// 推送式响应接收端
pub trait ResponseObserver<T>: Send + Sync {
    fn on_next(&self, value: T);
    fn on_error(&self, status: Status);
    fn on_completed(&self);
}

/// 把响应转发到无界通道，流结束由发送端被丢弃体现
impl<T: Send> ResponseObserver<T> for mpsc::UnboundedSender<std::result::Result<T, Status>> {
    fn on_next(&self, value: T) {
        let _ = self.send(Ok(value));
    }

    fn on_error(&self, status: Status) {
        let _ = self.send(Err(status));
    }

    fn on_completed(&self) {}
}

/// 双向流的请求发送端
///
/// 可以克隆后在多个任务中发送。请求方向在所有克隆都被丢弃
/// （或调用 `close`）之后才半关闭，单个克隆的 `close` 只释放它自己。
pub struct RequestSink<Req> {
    sender: mpsc::Sender<Req>,
}

impl<Req> RequestSink<Req> {
    pub fn new(sender: mpsc::Sender<Req>) -> Self {
        Self { sender }
    }

    /// 创建发送端以及与之配对的接收端
    pub fn channel(buffer: usize) -> (Self, mpsc::Receiver<Req>) {
        let (sender, receiver) = mpsc::channel(buffer);
        (Self::new(sender), receiver)
    }

    /// 发送一条流消息，缓冲区满时等待
    pub async fn send(&self, message: Req) -> Result<()> {
        self.sender
            .send(message)
            .await
            .map_err(|_| RpcError::stream_closed("请求流已被对端关闭"))
    }

    /// 流是否已经关闭
    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }

    /// 释放这个发送端，最后一个发送端释放时请求方向半关闭
    pub fn close(self) {}
}

impl<Req> Clone for RequestSink<Req> {
    fn clone(&self) -> Self {
        Self {
            sender: self.sender.clone(),
        }
    }
}

impl<Req> fmt::Debug for RequestSink<Req> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestSink")
            .field("closed", &self.sender.is_closed())
            .finish()
    }
}
