//! 传输能力 trait：引擎对网络的全部依赖都经过这里。
//!
//! 默认实现见 [`HttpTransport`](crate::transport::HttpTransport)；测试或特殊协议可自行实现。

use std::pin::Pin;

use async_trait::async_trait;
use bytes::Bytes;
use futures_util::Stream;

use crate::internal::transport::structs::{MultipartForm, TransportError};

/// 下载响应体：按到达顺序产出的字节块。
pub type ByteStream =
    Pin<Box<dyn Stream<Item = Result<Bytes, TransportError>> + Send>>;

/// 上传请求体：由引擎按固定缓冲区大小从本地文件读出。
pub type UploadBody =
    Pin<Box<dyn Stream<Item = Result<Bytes, std::io::Error>> + Send>>;

/// Range 请求的结果。
pub enum RangedResponse {
    /// 2xx：`partial` 为 true 表示服务器按 Range 返回了 206
    Body { partial: bool, stream: ByteStream },
    /// 416：请求的范围已超出资源末尾，视为该段已下载完成
    RangeNotSatisfiable,
}

impl std::fmt::Debug for RangedResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Body { partial, .. } => f
                .debug_struct("Body")
                .field("partial", partial)
                .finish_non_exhaustive(),
            Self::RangeNotSatisfiable => f.write_str("RangeNotSatisfiable"),
        }
    }
}

#[async_trait]
pub trait Transport: Send + Sync {
    /// 远程资源的总字节数。非 2xx 或网络失败时返回错误。
    async fn content_length(&self, url: &str) -> Result<u64, TransportError>;

    /// 发起一次 Range GET，`range` 形如 `bytes=<start>-<end>`。
    async fn ranged_get(
        &self,
        url: &str,
        range: &str,
    ) -> Result<RangedResponse, TransportError>;

    /// 上传一段字节。`content_range` 形如 `bytes <start>-<end>/<total>`，整文件上传时为 `None`。
    async fn put_range(
        &self,
        _url: &str,
        _content_range: Option<String>,
        _length: u64,
        _body: UploadBody,
    ) -> Result<(), TransportError> {
        Err(TransportError::Unsupported("put_range"))
    }

    /// 以 multipart/form-data POST 上传整个文件，`length` 为文件分段的字节数。
    async fn post_multipart(
        &self,
        _url: &str,
        _form: &MultipartForm,
        _length: u64,
        _body: UploadBody,
    ) -> Result<(), TransportError> {
        Err(TransportError::Unsupported("post_multipart"))
    }
}
