//! 分片规划：根据总长度、分片数和各分片已缓存大小计算每个分片的字节区间。

use crate::internal::transfer::structs::{ByteRange, TransferError};

/// 计算各分片的区间。
///
/// - 单分片：`[0, total - 1]`
/// - 多分片：`block = ceil(total / worker_count)`，第 i 个分片为
///   `[block * (i - 1), min(block * i - 1, total - 1)]`
///
/// 向上取整可能让末尾的分片起点落在文件之外（如 10 字节分 6 片），
/// 这些空分片不会出现在结果中，所以返回的区间数可能少于 `worker_count`。
///
/// `cached_per_worker[i]` 是第 i + 1 个分片文件已有的字节数，缺省为 0。
pub fn plan(
    total_length: u64,
    worker_count: usize,
    cached_per_worker: &[u64],
) -> Result<Vec<ByteRange>, TransferError> {
    if total_length == 0 {
        return Err(TransferError::InvalidArgument(
            "文件总大小必须大于 0".to_string(),
        ));
    }
    if worker_count < 1 {
        return Err(TransferError::InvalidArgument(
            "分片数必须大于等于 1".to_string(),
        ));
    }

    let block_size = total_length.div_ceil(worker_count as u64);

    let ranges = (0..worker_count as u64)
        .map(|i| (i, block_size * i))
        .take_while(|(_, range_start)| *range_start < total_length)
        .map(|(i, range_start)| {
            let index = i as usize + 1;
            let range_end = (range_start + block_size - 1).min(total_length - 1);
            ByteRange {
                index,
                file_offset: range_start,
                range_start,
                range_end,
                cached_bytes: cached_per_worker.get(index - 1).copied().unwrap_or(0),
            }
        })
        .collect();

    Ok(ranges)
}
