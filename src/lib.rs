/// 内部实现模块
mod internal;


/// 传输引擎：下载 / 上传入口、请求与状态模型
pub mod transfer {
    use crate::internal;
    pub use internal::transfer::structs::*;
}

/// 对外提供分片与合并能力，不限制在引擎内部使用，以便调用方自行切分 / 拼接文件
pub mod functions {
    use crate::internal;
    pub use internal::transfer::functions::file_merge::{merge, split};
    pub use internal::transfer::functions::range_planner::plan;
    pub use internal::transfer::functions::slice_files::slice_path;
}

/// 传输能力：trait 与默认的 HTTP 实现
pub mod transport {
    use crate::internal;
    pub use internal::transport::structs::*;
    pub use internal::transport::traits::transport::*;
}

pub mod states {
    use crate::internal;
    pub use internal::states::snapshot_property::*;
}

pub use internal::transfer::structs::{
    EngineConfig, TransferEngine, TransferError, TransferInfo, TransferRequest,
    TransferStatus, TransferStream, UploadRequest,
};
pub use internal::transport::structs::{HttpTransport, MultipartForm, TransportError};
pub use internal::transport::traits::transport::Transport;
