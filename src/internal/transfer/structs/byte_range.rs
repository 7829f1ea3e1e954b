/// 一个分片负责的字节区间（闭区间）。
///
/// `index` 从 1 开始，与分片文件名 `<target>.<index>` 一致。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    pub index: usize,
    /// 该分片在完整文件中的起始位置
    pub file_offset: u64,
    pub range_start: u64,
    /// 包含
    pub range_end: u64,
    /// 本地分片文件中已有的字节数
    pub cached_bytes: u64,
}

impl ByteRange {
    /// 分片长度：`range_end - range_start + 1`
    pub fn slice_len(&self) -> u64 {
        self.range_end - self.range_start + 1
    }

    /// 续传起点。大于 `range_end` 表示该分片已完整。
    pub fn resume_start(&self) -> u64 {
        self.range_start + self.cached_bytes
    }

    pub fn is_complete(&self) -> bool {
        self.resume_start() > self.range_end
    }

    /// 下载用的 Range 请求头：`bytes=<resume_start>-<range_end>`
    pub fn range_header(&self) -> String {
        format!("bytes={}-{}", self.resume_start(), self.range_end)
    }

    /// 上传用的 Content-Range 请求头：`bytes <start>-<end>/<total>`
    pub fn content_range(&self, total: u64) -> String {
        format!("bytes {}-{}/{}", self.range_start, self.range_end, total)
    }
}
