//! 分片任务测试：续传偏移、416、Range 不被支持、失败与取消。

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;

use crate::internal::transfer::structs::{ByteRange, TransferError, WorkerEvent, WorkerResult};
use crate::internal::transfer::worker::WorkerReporter;
use crate::internal::transfer::worker::download_worker::{
    DownloadWorkerParams, run_download_worker,
};
use crate::internal::transport::structs::TransportError;
use crate::tests::{MockTransport, random_bytes, read_file, temp_dir, write_file};

fn range(index: usize, start: u64, end: u64, cached: u64) -> ByteRange {
    ByteRange {
        index,
        file_offset: start,
        range_start: start,
        range_end: end,
        cached_bytes: cached,
    }
}

/// 运行一个下载分片，返回它发出的全部消息
async fn run(
    transport: Arc<MockTransport>,
    range: ByteRange,
    slice_path: &Path,
    cancel_token: CancellationToken,
) -> Vec<WorkerResult> {
    let (sender, mut receiver) = mpsc::unbounded_channel();
    let total_length = 100;
    run_download_worker(DownloadWorkerParams {
        transport,
        url: "mock://file".to_string(),
        range,
        total_length,
        slice_path: slice_path.to_path_buf(),
        buffer_size: 16,
        cancel_token,
        reporter: WorkerReporter::new(range.index, sender),
    })
    .await;

    let mut messages = Vec::new();
    while let Some(message) = receiver.recv().await {
        messages.push(message);
    }
    messages
}

fn last_event(messages: &[WorkerResult]) -> &WorkerEvent {
    &messages.last().expect("没有任何消息").event
}

#[tokio::test]
async fn downloads_range_into_slice() {
    let data = random_bytes(100);
    let transport = Arc::new(MockTransport::new(data.clone()).chunk_size(10));
    let dir = temp_dir();
    let slice = dir.path().join("out.bin.2");

    let messages = run(transport.clone(), range(2, 25, 49, 0), &slice, CancellationToken::new()).await;

    assert_eq!(read_file(&slice), &data[25..50]);
    assert!(matches!(last_event(&messages), WorkerEvent::Succeeded));
    assert_eq!(messages.last().unwrap().slice_len, 25);
    assert!(messages.iter().all(|m| m.worker_index == 2));

    // Running 上报的长度单调递增
    let lens: Vec<u64> = messages.iter().map(|m| m.slice_len).collect();
    assert!(lens.windows(2).all(|w| w[0] <= w[1]));
    assert_eq!(transport.ranged_calls(), 1);
}

#[tokio::test]
async fn resumes_from_cached_bytes() {
    let data = random_bytes(100);
    let transport = Arc::new(MockTransport::new(data.clone()));
    let dir = temp_dir();
    let slice = dir.path().join("out.bin.1");
    write_file(&slice, &data[..30]);

    let messages = run(transport, range(1, 0, 49, 30), &slice, CancellationToken::new()).await;

    assert!(matches!(last_event(&messages), WorkerEvent::Succeeded));
    assert_eq!(read_file(&slice), &data[..50]);
    // 第一条进度从已缓存的长度之后开始
    assert!(messages[0].slice_len > 30);
}

#[tokio::test]
async fn complete_slice_skips_network() {
    let data = random_bytes(100);
    let transport = Arc::new(MockTransport::new(data.clone()));
    let dir = temp_dir();
    let slice = dir.path().join("out.bin.1");
    write_file(&slice, &data[..50]);

    let messages = run(transport.clone(), range(1, 0, 49, 50), &slice, CancellationToken::new()).await;

    assert_eq!(messages.len(), 1);
    assert!(matches!(last_event(&messages), WorkerEvent::Succeeded));
    assert_eq!(messages[0].slice_len, 50);
    assert_eq!(transport.ranged_calls(), 0);
}

#[tokio::test]
async fn range_not_satisfiable_counts_as_success() {
    let transport = Arc::new(MockTransport::new(random_bytes(100)));
    let dir = temp_dir();
    let slice = dir.path().join("out.bin.3");

    let messages = run(transport, range(3, 100, 149, 0), &slice, CancellationToken::new()).await;

    assert!(matches!(last_event(&messages), WorkerEvent::Succeeded));
}

#[tokio::test]
async fn full_response_to_partial_request_fails() {
    let transport = Arc::new(MockTransport::new(random_bytes(100)).ignore_range());
    let dir = temp_dir();
    let slice = dir.path().join("out.bin.2");

    let messages = run(transport, range(2, 50, 99, 0), &slice, CancellationToken::new()).await;

    assert!(matches!(
        last_event(&messages),
        WorkerEvent::Failed(TransferError::RangeNotSupported { index: 2 })
    ));
    assert!(!slice.exists());
}

#[tokio::test]
async fn full_response_to_whole_file_request_is_accepted() {
    let data = random_bytes(100);
    let transport = Arc::new(MockTransport::new(data.clone()).ignore_range());
    let dir = temp_dir();
    let slice = dir.path().join("out.bin.1");

    let messages = run(transport, range(1, 0, 99, 0), &slice, CancellationToken::new()).await;

    assert!(matches!(last_event(&messages), WorkerEvent::Succeeded));
    assert_eq!(read_file(&slice), data);
}

#[tokio::test]
async fn short_body_is_incomplete() {
    let transport = Arc::new(MockTransport::new(random_bytes(100)));
    let dir = temp_dir();
    let slice = dir.path().join("out.bin.2");

    let messages = run(transport, range(2, 50, 149, 0), &slice, CancellationToken::new()).await;

    assert!(matches!(
        last_event(&messages),
        WorkerEvent::Failed(TransferError::IncompleteSlice {
            index: 2,
            expected: 100,
            actual: 50
        })
    ));
}

#[tokio::test]
async fn transport_error_is_reported_as_failure() {
    let transport = Arc::new(MockTransport::new(random_bytes(100)).fail_at(10));
    let dir = temp_dir();
    let slice = dir.path().join("out.bin.1");

    let messages = run(transport, range(1, 0, 49, 0), &slice, CancellationToken::new()).await;

    assert!(matches!(
        last_event(&messages),
        WorkerEvent::Failed(TransferError::Transport(TransportError::Status(500)))
    ));
}

#[tokio::test]
async fn cancelled_before_start_is_paused() {
    let transport = Arc::new(MockTransport::new(random_bytes(100)));
    let dir = temp_dir();
    let slice = dir.path().join("out.bin.1");
    let token = CancellationToken::new();
    token.cancel();

    let messages = run(transport.clone(), range(1, 0, 49, 0), &slice, token).await;

    assert!(matches!(last_event(&messages), WorkerEvent::Paused));
    assert_eq!(transport.ranged_calls(), 0);
}

#[tokio::test]
async fn cancel_while_waiting_for_response_is_paused() {
    let transport = Arc::new(MockTransport::new(random_bytes(100)).stall_at(0));
    let dir = temp_dir();
    let slice = dir.path().join("out.bin.1");
    let token = CancellationToken::new();

    let canceller = token.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        canceller.cancel();
    });

    let messages = timeout(
        Duration::from_secs(5),
        run(transport, range(1, 0, 49, 0), &slice, token),
    )
    .await
    .expect("取消后分片应当退出");

    assert_eq!(messages.len(), 1);
    assert!(matches!(last_event(&messages), WorkerEvent::Paused));
}

#[tokio::test]
async fn cancel_mid_body_keeps_partial_slice() {
    let data = random_bytes(100);
    let transport = Arc::new(
        MockTransport::new(data.clone())
            .chunk_size(10)
            .chunk_delay(Duration::from_millis(30)),
    );
    let dir = temp_dir();
    let slice = dir.path().join("out.bin.1");
    let token = CancellationToken::new();

    let canceller = token.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(100)).await;
        canceller.cancel();
    });

    let messages = run(transport, range(1, 0, 99, 0), &slice, token).await;

    assert!(matches!(last_event(&messages), WorkerEvent::Paused));
    let kept = read_file(&slice);
    assert!(kept.len() < 100);
    assert_eq!(kept, &data[..kept.len()]);
    assert_eq!(messages.last().unwrap().slice_len, kept.len() as u64);
}
