//! 分片文件约定：`<target>.<index>`，index 从 1 开始；续传只依赖分片文件当前长度。

use std::ffi::OsString;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tokio::fs;

use crate::internal::transfer::structs::TransferError;

/// 第 `index` 个分片的文件路径
pub fn slice_path(target: &Path, index: usize) -> PathBuf {
    let mut name: OsString = target.as_os_str().to_os_string();
    name.push(format!(".{index}"));
    PathBuf::from(name)
}

/// 文件长度；不存在时为 0。
pub(crate) async fn file_len(path: &Path) -> Result<u64, TransferError> {
    match fs::metadata(path).await {
        Ok(meta) if meta.is_file() => Ok(meta.len()),
        Ok(_) => Err(TransferError::InvalidArgument(format!(
            "{} 不是文件",
            path.display()
        ))),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(0),
        Err(e) => Err(TransferError::filesystem(path, e)),
    }
}

/// 清空分片文件（保留文件本身），用于丢弃与当前规划不匹配的旧缓存
pub(crate) async fn truncate_slice(path: &Path) -> Result<(), TransferError> {
    fs::OpenOptions::new()
        .write(true)
        .truncate(true)
        .open(path)
        .await
        .map(|_| ())
        .map_err(|e| TransferError::filesystem(path, e))
}

/// 删除目标文件以及同目录下所有 `<target>.<数字>` 分片文件。
pub(crate) async fn clear_cache(target: &Path) -> Result<(), TransferError> {
    remove_if_exists(target).await?;

    let (Some(parent), Some(file_name)) = (target.parent(), target.file_name())
    else {
        return Ok(());
    };
    let parent = if parent.as_os_str().is_empty() {
        Path::new(".")
    } else {
        parent
    };
    let prefix = format!("{}.", file_name.to_string_lossy());

    let mut entries = match fs::read_dir(parent).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(()),
        Err(e) => return Err(TransferError::filesystem(parent, e)),
    };

    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| TransferError::filesystem(parent, e))?
    {
        let name = entry.file_name();
        let name = name.to_string_lossy();
        let is_slice = name
            .strip_prefix(&prefix)
            .is_some_and(|suffix| !suffix.is_empty() && suffix.bytes().all(|b| b.is_ascii_digit()));
        if is_slice {
            remove_if_exists(&entry.path()).await?;
        }
    }

    Ok(())
}

async fn remove_if_exists(path: &Path) -> Result<(), TransferError> {
    match fs::remove_file(path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(TransferError::filesystem(path, e)),
    }
}
