//! 文件合并与切分：纯字节拷贝，不涉及网络。

use std::path::{Path, PathBuf};

use tokio::fs::{self, File};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tracing::warn;

use crate::internal::transfer::structs::TransferError;
use crate::internal::transfer::structs::engine_config::DEFAULT_BUFFER_SIZE;

use super::slice_files::slice_path;

/// 按顺序把分片拼接到 `output`。
///
/// `output` 不存在时连同父目录一起创建，已存在时先清空。
/// 只有全部拼接成功后才删除分片，出错时分片保持原样。
/// 合并结果已完整写出后，删除分片失败只记录警告，不影响返回值；
/// 每个分片都会尝试删除，残留的分片可以用 `clear_cache_before_start` 清理。
pub async fn merge<P: AsRef<Path>>(
    slices: &[P],
    output: &Path,
    delete_slices: bool,
) -> Result<(), TransferError> {
    if slices.is_empty() {
        return Err(TransferError::InvalidArgument(
            "没有需要合并的分片".to_string(),
        ));
    }

    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .await
            .map_err(|e| TransferError::filesystem(parent, e))?;
    }

    let mut out = File::create(output)
        .await
        .map_err(|e| TransferError::filesystem(output, e))?;
    let mut buffer = vec![0u8; DEFAULT_BUFFER_SIZE];

    for slice in slices {
        let slice = slice.as_ref();
        let mut input = File::open(slice)
            .await
            .map_err(|e| TransferError::filesystem(slice, e))?;
        loop {
            let read = input
                .read(&mut buffer)
                .await
                .map_err(|e| TransferError::filesystem(slice, e))?;
            if read == 0 {
                break;
            }
            out.write_all(&buffer[..read])
                .await
                .map_err(|e| TransferError::filesystem(output, e))?;
        }
    }

    out.flush()
        .await
        .map_err(|e| TransferError::filesystem(output, e))?;
    drop(out);

    if delete_slices {
        for slice in slices {
            let slice = slice.as_ref();
            if let Err(e) = fs::remove_file(slice).await {
                warn!(slice = %slice.display(), error = %e, "删除分片失败");
            }
        }
    }

    Ok(())
}

/// 把文件按顺序切成 `count` 份：`<path>.1` ..= `<path>.<count>`。
///
/// 每份 `ceil(len / count)` 字节，最后一份可能更短；向上取整用尽数据后，
/// 剩余的份为空文件，保证返回的路径数恰好为 `count`。
pub async fn split(path: &Path, count: usize) -> Result<Vec<PathBuf>, TransferError> {
    if count == 0 {
        return Err(TransferError::InvalidArgument(
            "分割数量必须大于 0".to_string(),
        ));
    }

    let meta = fs::metadata(path)
        .await
        .map_err(|e| TransferError::filesystem(path, e))?;
    if !meta.is_file() {
        return Err(TransferError::InvalidArgument(format!(
            "{} 不是文件",
            path.display()
        )));
    }

    let file_len = meta.len();
    if file_len < count as u64 {
        return Err(TransferError::InvalidArgument(format!(
            "文件 {} 太小，不能分割为 {} 个小文件",
            path.display(),
            count
        )));
    }

    let block_size = file_len.div_ceil(count as u64);
    let mut input = File::open(path)
        .await
        .map_err(|e| TransferError::filesystem(path, e))?;
    let mut buffer = vec![0u8; DEFAULT_BUFFER_SIZE.min(block_size as usize)];
    let mut remaining_total = file_len;
    let mut parts = Vec::with_capacity(count);

    for index in 1..=count {
        let part_path = slice_path(path, index);
        let mut output = File::create(&part_path)
            .await
            .map_err(|e| TransferError::filesystem(&part_path, e))?;

        let mut remaining = block_size.min(remaining_total);
        remaining_total -= remaining;
        while remaining > 0 {
            let want = (buffer.len() as u64).min(remaining) as usize;
            let read = input
                .read(&mut buffer[..want])
                .await
                .map_err(|e| TransferError::filesystem(path, e))?;
            if read == 0 {
                return Err(TransferError::filesystem(
                    path,
                    std::io::Error::from(std::io::ErrorKind::UnexpectedEof),
                ));
            }
            output
                .write_all(&buffer[..read])
                .await
                .map_err(|e| TransferError::filesystem(&part_path, e))?;
            remaining -= read as u64;
        }

        output
            .flush()
            .await
            .map_err(|e| TransferError::filesystem(&part_path, e))?;
        parts.push(part_path);
    }

    Ok(parts)
}
