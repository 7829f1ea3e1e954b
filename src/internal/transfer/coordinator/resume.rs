//! 续传：根据磁盘上已有分片的长度规划区间。

use std::path::Path;

use tracing::warn;

use crate::internal::transfer::functions::range_planner::plan;
use crate::internal::transfer::functions::slice_files::{file_len, slice_path, truncate_slice};
use crate::internal::transfer::structs::{ByteRange, TransferError};

/// 规划区间并读取分片缓存；比所属区间还长的分片来自旧的规划，清空后从头下载。
///
/// 先规划再读缓存，只访问实际存在区间的分片文件（分片数可能远大于文件字节数）。
pub(crate) async fn plan_with_cache(
    target: &Path,
    total_length: u64,
    worker_count: usize,
) -> Result<Vec<ByteRange>, TransferError> {
    let mut ranges = plan(total_length, worker_count, &[])?;

    for range in ranges.iter_mut() {
        let path = slice_path(target, range.index);
        range.cached_bytes = file_len(&path).await?;
        if range.cached_bytes > range.slice_len() {
            warn!(
                slice = %path.display(),
                cached = range.cached_bytes,
                expected = range.slice_len(),
                "分片长度超出区间，丢弃旧缓存"
            );
            truncate_slice(&path).await?;
            range.cached_bytes = 0;
        }
    }

    Ok(ranges)
}
