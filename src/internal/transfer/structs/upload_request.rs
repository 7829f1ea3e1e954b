use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::internal::transport::structs::MultipartForm;

/// 一次上传的参数。上传不做续传，每次都从头发送。
///
/// 缺省以 PUT 发送原始字节；设置了 [`multipart`](Self::multipart) 时改为
/// multipart/form-data POST，只能整文件单分片发送。
#[derive(Debug, Clone)]
pub struct UploadRequest {
    pub url: String,
    pub source_path: PathBuf,
    pub worker_count: usize,
    pub progress_interval: Option<Duration>,
    pub multipart: Option<MultipartForm>,
}

impl UploadRequest {
    pub fn new(url: impl Into<String>, source_path: impl AsRef<Path>) -> Self {
        Self {
            url: url.into(),
            source_path: source_path.as_ref().to_path_buf(),
            worker_count: 1,
            progress_interval: None,
            multipart: None,
        }
    }

    /// 设置分段数；大于 1 时各段带 `Content-Range` 并发上传
    pub fn workers(mut self, worker_count: usize) -> Self {
        self.worker_count = worker_count;
        self
    }

    pub fn progress_interval(mut self, interval: Duration) -> Self {
        self.progress_interval = Some(interval);
        self
    }

    /// 改用表单上传
    pub fn multipart(mut self, form: MultipartForm) -> Self {
        self.multipart = Some(form);
        self
    }
}
