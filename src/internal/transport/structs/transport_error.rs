//! 传输层错误类型。

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("HTTP 请求失败: {0}")]
    Request(#[from] reqwest::Error),

    #[error("服务器返回异常状态码: {0}")]
    Status(u16),

    /// 204 No Content：请求成功但没有可返回的资源
    #[error("服务器返回 204，没有内容")]
    NoContent,

    #[error("响应缺少 Content-Length")]
    MissingContentLength,

    #[error("地址格式错误: {0}")]
    InvalidUrl(String),

    /// 认证信息或 MIME 类型无法组成合法的请求头
    #[error("请求头不合法: {0}")]
    InvalidHeader(String),

    #[error("读取数据失败: {0}")]
    Io(#[from] std::io::Error),

    #[error("当前传输实现不支持: {0}")]
    Unsupported(&'static str),
}

impl TransportError {
    /// 根据 HTTP 状态码构造错误；204 单独归类。
    pub fn from_status(code: u16) -> Self {
        if code == 204 {
            Self::NoContent
        } else {
            Self::Status(code)
        }
    }
}
