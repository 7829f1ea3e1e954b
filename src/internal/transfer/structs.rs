pub mod byte_range;
pub mod engine_config;
pub mod transfer_engine;
pub mod transfer_error;
pub mod transfer_info;
pub mod transfer_request;
pub mod transfer_status;
pub mod transfer_stream;
pub mod upload_request;
pub mod worker_result;

// 重导出公共类型
pub use byte_range::ByteRange;
pub use engine_config::EngineConfig;
pub use transfer_engine::TransferEngine;
pub use transfer_error::TransferError;
pub use transfer_info::{TransferDirection, TransferInfo};
pub use transfer_request::TransferRequest;
pub use transfer_status::TransferStatus;
pub use transfer_stream::{CancelHandle, TransferStream};
pub use upload_request::UploadRequest;
pub use worker_result::{WorkerEvent, WorkerResult};
