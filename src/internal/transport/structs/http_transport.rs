//! 基于 reqwest 的默认传输实现。
//!
//! - `content_length`：HEAD 请求，读取 `Content-Length` 响应头
//! - `ranged_get`：GET + `Range`，206 为分段响应，416 视为该段已完整
//! - `put_range`：PUT + `Content-Range`，请求体流式发送
//! - `post_multipart`：POST multipart/form-data，文件分段流式发送，其余字段为文本

use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use futures_util::StreamExt;
use reqwest::header::{
    AUTHORIZATION, CONTENT_LENGTH, CONTENT_RANGE, HeaderMap, HeaderValue, RANGE,
};
use reqwest::multipart::{Form, Part};
use reqwest::{Body, Client, StatusCode};
use url::Url;

use crate::internal::transport::traits::transport::{
    RangedResponse, Transport, UploadBody,
};

use super::http_transport_config::HttpTransportConfig;
use super::multipart_form::MultipartForm;
use super::transport_error::TransportError;

/// HTTP 传输。内部的 `Client` 本身是 Arc，Clone 很廉价。
#[derive(Clone, Debug)]
pub struct HttpTransport {
    client: Client,
    base_url: Option<Url>,
}

impl HttpTransport {
    pub fn builder() -> HttpTransportBuilder {
        HttpTransportBuilder::default()
    }

    /// 使用默认配置创建。
    pub fn new() -> Result<Self, TransportError> {
        Self::builder().build()
    }

    /// 将调用方传入的地址解析为完整地址。
    ///
    /// 有 base_url 时相对地址基于它拼接，且拼接结果不能跳出 base_url；
    /// 完整地址（带 scheme）原样使用。
    pub fn resolve_url(&self, url: &str) -> Result<Url, TransportError> {
        if url.is_empty() {
            return Err(TransportError::InvalidUrl("地址为空".to_string()));
        }

        if let Ok(absolute) = Url::parse(url) {
            return Ok(absolute);
        }

        let base_url = self.base_url.as_ref().ok_or_else(|| {
            TransportError::InvalidUrl(format!("相对地址缺少 base_url: {url}"))
        })?;

        let joined = base_url
            .join(url)
            .map_err(|e| TransportError::InvalidUrl(e.to_string()))?;

        if joined.scheme() != base_url.scheme()
            || joined.host_str() != base_url.host_str()
            || !joined.path().starts_with(base_url.path())
        {
            return Err(TransportError::InvalidUrl(format!(
                "父目录不允许: {url}"
            )));
        }

        Ok(joined)
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn content_length(&self, url: &str) -> Result<u64, TransportError> {
        let url = self.resolve_url(url)?;
        let resp = self.client.head(url).send().await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(TransportError::from_status(status.as_u16()));
        }

        // HEAD 响应没有 body，不能用 `Response::content_length()`
        resp.headers()
            .get(CONTENT_LENGTH)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<u64>().ok())
            .ok_or(TransportError::MissingContentLength)
    }

    async fn ranged_get(
        &self,
        url: &str,
        range: &str,
    ) -> Result<RangedResponse, TransportError> {
        let url = self.resolve_url(url)?;
        let resp = self.client.get(url).header(RANGE, range).send().await?;

        let status = resp.status();
        if status == StatusCode::RANGE_NOT_SATISFIABLE {
            return Ok(RangedResponse::RangeNotSatisfiable);
        }
        if !status.is_success() || status == StatusCode::NO_CONTENT {
            return Err(TransportError::from_status(status.as_u16()));
        }

        let stream = resp
            .bytes_stream()
            .map(|chunk| chunk.map_err(TransportError::from))
            .boxed();

        Ok(RangedResponse::Body {
            partial: status == StatusCode::PARTIAL_CONTENT,
            stream,
        })
    }

    async fn put_range(
        &self,
        url: &str,
        content_range: Option<String>,
        length: u64,
        body: UploadBody,
    ) -> Result<(), TransportError> {
        let url = self.resolve_url(url)?;
        let mut request = self
            .client
            .put(url)
            .header(CONTENT_LENGTH, length)
            .body(Body::wrap_stream(body));
        if let Some(content_range) = content_range {
            request = request.header(CONTENT_RANGE, content_range);
        }

        let resp = request.send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(TransportError::Status(status.as_u16()));
        }
        Ok(())
    }

    async fn post_multipart(
        &self,
        url: &str,
        form: &MultipartForm,
        length: u64,
        body: UploadBody,
    ) -> Result<(), TransportError> {
        let url = self.resolve_url(url)?;

        let mut part = Part::stream_with_length(Body::wrap_stream(body), length)
            .mime_str(&form.mime_type)
            .map_err(|e| TransportError::InvalidHeader(format!("{}: {e}", form.mime_type)))?;
        if let Some(file_name) = &form.file_name {
            part = part.file_name(file_name.clone());
        }

        // 文件分段在前，文本字段在后
        let multipart = form
            .params
            .iter()
            .fold(Form::new().part(form.file_key.clone(), part), |multipart, (key, value)| {
                multipart.text(key.clone(), value.clone())
            });

        let resp = self.client.post(url).multipart(multipart).send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(TransportError::Status(status.as_u16()));
        }
        Ok(())
    }
}

/// HTTP 传输构建器。
#[derive(Debug, Default)]
pub struct HttpTransportBuilder {
    config: HttpTransportConfig,
}

impl HttpTransportBuilder {
    /// 设置基准地址；末尾自动补 `/`，保证相对地址拼接在目录之下。
    pub fn base_url(mut self, base_url: &str) -> Result<Self, TransportError> {
        self.config.base_url = Some(format_base_url(base_url)?);
        Ok(self)
    }

    pub fn basic_auth(mut self, username: &str, password: &str) -> Self {
        self.config.basic_auth = Some((username.to_string(), password.to_string()));
        self
    }

    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.config.user_agent = user_agent.into();
        self
    }

    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.config.connect_timeout = timeout;
        self
    }

    /// 两次读取之间的最长等待
    pub fn read_timeout(mut self, timeout: Duration) -> Self {
        self.config.read_timeout = timeout;
        self
    }

    /// 单个请求的总时限，包括读完响应体
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = Some(timeout);
        self
    }

    pub fn http1_only(mut self) -> Self {
        self.config.http1_only = true;
        self
    }

    pub fn config(&self) -> &HttpTransportConfig {
        &self.config
    }

    pub fn build(self) -> Result<HttpTransport, TransportError> {
        let mut headers = HeaderMap::new();
        if let Some((username, password)) = &self.config.basic_auth {
            headers.insert(AUTHORIZATION, basic_auth_value(username, password)?);
        }

        let mut builder = Client::builder()
            .user_agent(self.config.user_agent.as_str())
            .connect_timeout(self.config.connect_timeout)
            .read_timeout(self.config.read_timeout)
            .default_headers(headers);
        if let Some(timeout) = self.config.timeout {
            builder = builder.timeout(timeout);
        }
        if self.config.http1_only {
            builder = builder.http1_only();
        }

        Ok(HttpTransport {
            client: builder.build()?,
            base_url: self.config.base_url,
        })
    }
}

fn basic_auth_value(
    username: &str,
    password: &str,
) -> Result<HeaderValue, TransportError> {
    let token = base64::engine::general_purpose::STANDARD
        .encode(format!("{username}:{password}"));

    let mut value = HeaderValue::from_str(&format!("Basic {token}"))
        .map_err(|e| TransportError::InvalidHeader(e.to_string()))?;
    value.set_sensitive(true);
    Ok(value)
}

fn format_base_url(url: &str) -> Result<Url, TransportError> {
    if url.is_empty() {
        return Err(TransportError::InvalidUrl("路径为空".to_string()));
    }

    let mut base_url =
        Url::parse(url).map_err(|e| TransportError::InvalidUrl(e.to_string()))?;

    if !base_url.path().ends_with('/') {
        let new_path = format!("{}/", base_url.path());
        base_url.set_path(&new_path);
    }

    Ok(base_url)
}
