use std::io::ErrorKind;

use crate::internal::transfer::structs::{TransferError, TransferRequest, UploadRequest};

fn check_common(url: &str, worker_count: usize) -> Result<(), TransferError> {
    if url.trim().is_empty() {
        return Err(TransferError::InvalidArgument("url 不能为空".into()));
    }
    if worker_count < 1 {
        return Err(TransferError::InvalidArgument(format!(
            "分片数必须 >= 1，实际为 {worker_count}"
        )));
    }
    Ok(())
}

/// 下载参数校验：目标路径必须是文件路径（可以尚不存在），不能是目录。
pub(crate) async fn validate_download(request: &TransferRequest) -> Result<(), TransferError> {
    check_common(&request.url, request.worker_count)?;

    let target = &request.target_path;
    if target.file_name().is_none() {
        return Err(TransferError::InvalidArgument(format!(
            "目标路径无效: {}",
            target.display()
        )));
    }
    match tokio::fs::metadata(target).await {
        Ok(meta) if meta.is_dir() => Err(TransferError::InvalidArgument(format!(
            "目标路径是目录: {}",
            target.display()
        ))),
        Ok(_) => Ok(()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(TransferError::filesystem(target, e)),
    }
}

/// 上传参数校验，返回源文件长度。
pub(crate) async fn validate_upload(request: &UploadRequest) -> Result<u64, TransferError> {
    check_common(&request.url, request.worker_count)?;
    if request.multipart.is_some() && request.worker_count > 1 {
        return Err(TransferError::InvalidArgument(format!(
            "表单上传只能使用 1 个分片，实际为 {}",
            request.worker_count
        )));
    }

    let source = &request.source_path;
    let meta = match tokio::fs::metadata(source).await {
        Ok(meta) => meta,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            return Err(TransferError::InvalidArgument(format!(
                "源文件不存在: {}",
                source.display()
            )));
        }
        Err(e) => return Err(TransferError::filesystem(source, e)),
    };
    if !meta.is_file() {
        return Err(TransferError::InvalidArgument(format!(
            "源路径不是文件: {}",
            source.display()
        )));
    }
    if meta.len() == 0 {
        return Err(TransferError::InvalidArgument(format!(
            "源文件为空: {}",
            source.display()
        )));
    }
    Ok(meta.len())
}
