//! 下载协调测试：多分片下载、已完整跳过、续传、失败快速结束、取消暂停、清缓存、参数校验、节流。

use std::sync::Arc;
use std::time::Duration;

use futures_util::StreamExt;
use tokio::time::{Instant, timeout};

use crate::internal::transfer::functions::slice_files::slice_path;
use crate::internal::transfer::structs::{
    EngineConfig, TransferEngine, TransferError, TransferInfo, TransferRequest, TransferStatus,
};
use crate::internal::transport::structs::TransportError;
use crate::tests::{MockTransport, random_bytes, read_file, slice_files_of, temp_dir, write_file};

const URL: &str = "mock://file";

fn engine(transport: &Arc<MockTransport>) -> TransferEngine {
    TransferEngine::from_shared(transport.clone(), EngineConfig::default())
}

async fn run_to_end(engine: &TransferEngine, request: TransferRequest) -> Vec<TransferInfo> {
    timeout(Duration::from_secs(20), engine.download(request).collect::<Vec<_>>())
        .await
        .expect("下载没有在限定时间内结束")
}

fn terminals(events: &[TransferInfo]) -> Vec<TransferStatus> {
    events
        .iter()
        .filter(|e| e.is_terminal())
        .map(|e| e.status)
        .collect()
}

#[tokio::test]
async fn four_workers_download_matches_source() {
    let data = random_bytes(1000);
    let transport = Arc::new(MockTransport::new(data.clone()).chunk_size(37));
    let dir = temp_dir();
    let target = dir.path().join("out.bin");

    let events = run_to_end(
        &engine(&transport),
        TransferRequest::new(URL, &target).workers(4).progress_interval(Duration::ZERO),
    )
    .await;

    assert_eq!(terminals(&events), vec![TransferStatus::Succeeded]);
    let last = events.last().unwrap();
    assert_eq!(last.status, TransferStatus::Succeeded);
    assert_eq!(last.cached_size, 1000);
    assert_eq!(last.total_size, 1000);
    assert!(last.error.is_none());

    // 不会推送 Pending，Running 进度单调不减
    assert!(events.iter().all(|e| e.status != TransferStatus::Pending));
    let running: Vec<u64> = events
        .iter()
        .filter(|e| e.status == TransferStatus::Running)
        .map(|e| e.cached_size)
        .collect();
    assert!(!running.is_empty());
    assert!(running.windows(2).all(|w| w[0] <= w[1]));

    assert_eq!(read_file(&target), data);
    assert!(slice_files_of(&target).is_empty(), "合并后分片应被删除");
    assert_eq!(transport.ranged_calls(), 4);
}

#[tokio::test]
async fn multi_worker_output_equals_single_worker_output() {
    let data = random_bytes(1000);
    let transport = Arc::new(MockTransport::new(data.clone()));
    let engine = engine(&transport);
    let dir = temp_dir();
    let single = dir.path().join("single.bin");
    let multi = dir.path().join("multi.bin");

    run_to_end(&engine, TransferRequest::new(URL, &single)).await;
    run_to_end(&engine, TransferRequest::new(URL, &multi).workers(4)).await;

    assert_eq!(read_file(&single), read_file(&multi));
    assert_eq!(read_file(&single), data);
}

#[tokio::test]
async fn complete_target_is_skipped() {
    let data = random_bytes(1000);
    let transport = Arc::new(MockTransport::new(data.clone()));
    let dir = temp_dir();
    let target = dir.path().join("out.bin");
    write_file(&target, &data);

    let events = run_to_end(&engine(&transport), TransferRequest::new(URL, &target).workers(4)).await;

    assert_eq!(events.len(), 1);
    assert_eq!(events[0].status, TransferStatus::Succeeded);
    assert_eq!(events[0].cached_size, 1000);
    assert_eq!(events[0].total_size, 1000);
    assert_eq!(transport.ranged_calls(), 0);
}

#[tokio::test]
async fn complete_slices_resume_without_requests() {
    let data = random_bytes(1000);
    let transport = Arc::new(MockTransport::new(data.clone()));
    let dir = temp_dir();
    let target = dir.path().join("out.bin");
    for (i, part) in data.chunks(250).enumerate() {
        write_file(&slice_path(&target, i + 1), part);
    }

    let events = run_to_end(&engine(&transport), TransferRequest::new(URL, &target).workers(4)).await;

    assert_eq!(terminals(&events), vec![TransferStatus::Succeeded]);
    assert_eq!(transport.ranged_calls(), 0);
    assert_eq!(read_file(&target), data);
    assert!(slice_files_of(&target).is_empty());
}

#[tokio::test]
async fn partial_slices_resume_from_their_length() {
    let data = random_bytes(1000);
    let transport = Arc::new(MockTransport::new(data.clone()));
    let dir = temp_dir();
    let target = dir.path().join("out.bin");
    write_file(&slice_path(&target, 1), &data[..100]);
    write_file(&slice_path(&target, 3), &data[500..749]);

    let events = run_to_end(&engine(&transport), TransferRequest::new(URL, &target).workers(4)).await;

    assert_eq!(terminals(&events), vec![TransferStatus::Succeeded]);
    assert_eq!(read_file(&target), data);
    assert_eq!(transport.ranged_calls(), 4);
}

#[tokio::test]
async fn oversized_stale_slice_is_discarded() {
    let data = random_bytes(1000);
    let transport = Arc::new(MockTransport::new(data.clone()));
    let dir = temp_dir();
    let target = dir.path().join("out.bin");
    // 旧规划（2 分片）留下的 500 字节缓存，比当前区间长
    write_file(&slice_path(&target, 1), &random_bytes(500));

    let events = run_to_end(&engine(&transport), TransferRequest::new(URL, &target).workers(4)).await;

    assert_eq!(terminals(&events), vec![TransferStatus::Succeeded]);
    assert_eq!(read_file(&target), data);
}

#[tokio::test]
async fn one_failing_worker_fails_the_transfer() {
    let data = random_bytes(1000);
    let transport = Arc::new(
        MockTransport::new(data)
            .chunk_size(10)
            .chunk_delay(Duration::from_millis(20))
            .fail_at(600),
    );
    let dir = temp_dir();
    let target = dir.path().join("out.bin");

    let started = Instant::now();
    let events = run_to_end(&engine(&transport), TransferRequest::new(URL, &target).workers(4)).await;

    assert_eq!(terminals(&events), vec![TransferStatus::Failed]);
    let last = events.last().unwrap();
    assert!(matches!(
        last.error.as_deref(),
        Some(TransferError::Transport(TransportError::Status(500)))
    ));
    // 其它分片被取消，不会把 25 块都读完（25 × 20ms）
    assert!(started.elapsed() < Duration::from_millis(400));
    assert!(!target.exists());
}

#[tokio::test]
async fn cancel_pauses_and_later_resumes() {
    let data = random_bytes(1000);
    let slow = Arc::new(
        MockTransport::new(data.clone())
            .chunk_size(10)
            .chunk_delay(Duration::from_millis(20)),
    );
    let dir = temp_dir();
    let target = dir.path().join("out.bin");

    let mut stream = engine(&slow).download(
        TransferRequest::new(URL, &target)
            .workers(2)
            .progress_interval(Duration::ZERO),
    );
    let first = timeout(Duration::from_secs(5), stream.next()).await.unwrap().unwrap();
    assert_eq!(first.status, TransferStatus::Running);

    stream.cancel();
    let last = timeout(Duration::from_secs(5), stream.finish()).await.unwrap().unwrap();
    assert_eq!(last.status, TransferStatus::Paused);
    assert!(last.cached_size < 1000);
    assert!(!target.exists());

    // 分片保留在磁盘上，长度与快照一致
    let cached: u64 = slice_files_of(&target)
        .iter()
        .map(|p| read_file(p).len() as u64)
        .sum();
    assert_eq!(cached, last.cached_size);

    let fast = Arc::new(MockTransport::new(data.clone()));
    let events = run_to_end(&engine(&fast), TransferRequest::new(URL, &target).workers(2)).await;
    assert_eq!(terminals(&events), vec![TransferStatus::Succeeded]);
    assert_eq!(read_file(&target), data);
}

#[tokio::test]
async fn dropping_the_stream_pauses_the_transfer() {
    let transport = Arc::new(
        MockTransport::new(random_bytes(1000))
            .chunk_size(10)
            .chunk_delay(Duration::from_millis(20)),
    );
    let dir = temp_dir();
    let target = dir.path().join("out.bin");

    let mut stream = engine(&transport).download(TransferRequest::new(URL, &target).workers(2));
    let latest = stream.latest();
    let mut watcher = latest.watch();
    stream.next().await.unwrap();
    drop(stream);

    let paused = timeout(Duration::from_secs(5), async {
        loop {
            let info = watcher.changed().await.unwrap();
            if info.is_terminal() {
                break info;
            }
        }
    })
    .await
    .unwrap();
    assert_eq!(paused.status, TransferStatus::Paused);
}

#[tokio::test]
async fn cancel_during_preflight_is_paused() {
    let transport = Arc::new(MockTransport::new(random_bytes(100)));
    let dir = temp_dir();

    let stream = engine(&transport).download(TransferRequest::new(URL, dir.path().join("out.bin")));
    stream.cancel();
    let events: Vec<_> = stream.collect().await;

    assert_eq!(events.len(), 1);
    assert_eq!(events[0].status, TransferStatus::Paused);
    assert_eq!(transport.head_calls(), 0);
}

#[tokio::test]
async fn clear_cache_removes_target_and_slices() {
    let data = random_bytes(1000);
    let transport = Arc::new(MockTransport::new(data.clone()));
    let dir = temp_dir();
    let target = dir.path().join("out.bin");
    write_file(&target, b"stale");
    write_file(&slice_path(&target, 1), &random_bytes(250));
    write_file(&slice_path(&target, 7), b"leftover");
    let unrelated = dir.path().join("out.bin.bak");
    write_file(&unrelated, b"keep");

    let events = run_to_end(
        &engine(&transport),
        TransferRequest::new(URL, &target).workers(4).clear_cache(true),
    )
    .await;

    assert_eq!(terminals(&events), vec![TransferStatus::Succeeded]);
    assert_eq!(read_file(&target), data);
    assert!(slice_files_of(&target).is_empty());
    assert!(unrelated.exists());
    // 缓存被清掉，4 个分片都重新请求
    assert_eq!(transport.ranged_calls(), 4);
}

#[tokio::test]
async fn invalid_requests_fail_once() {
    let transport = Arc::new(MockTransport::new(random_bytes(100)));
    let engine = engine(&transport);
    let dir = temp_dir();

    let cases = [
        TransferRequest::new("", dir.path().join("a.bin")),
        TransferRequest::new(URL, dir.path().join("b.bin")).workers(0),
        TransferRequest::new(URL, dir.path()),
    ];
    for request in cases {
        let events = run_to_end(&engine, request).await;
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].status, TransferStatus::Failed);
        assert!(matches!(
            events[0].error.as_deref(),
            Some(TransferError::InvalidArgument(_))
        ));
    }
    assert_eq!(transport.head_calls(), 0);
}

#[tokio::test]
async fn empty_remote_file_is_rejected() {
    let transport = Arc::new(MockTransport::new(Vec::new()));
    let dir = temp_dir();

    let events = run_to_end(&engine(&transport), TransferRequest::new(URL, dir.path().join("a.bin"))).await;

    assert_eq!(events.len(), 1);
    assert!(matches!(
        events[0].error.as_deref(),
        Some(TransferError::InvalidArgument(_))
    ));
}

#[tokio::test]
async fn progress_events_are_throttled() {
    let transport = Arc::new(
        MockTransport::new(random_bytes(500))
            .chunk_size(1)
            .chunk_delay(Duration::from_millis(4)),
    );
    let dir = temp_dir();
    let target = dir.path().join("out.bin");

    let started = Instant::now();
    let events = run_to_end(
        &engine(&transport),
        TransferRequest::new(URL, &target).progress_interval(Duration::from_millis(100)),
    )
    .await;
    let elapsed = started.elapsed();

    let running = events
        .iter()
        .filter(|e| e.status == TransferStatus::Running)
        .count();
    // 每个间隔最多一次，外加第一次与终态前补发的一次
    let bound = (elapsed.as_millis() / 100) as usize + 2;
    assert!(running >= 2);
    assert!(running <= bound, "running = {running}, bound = {bound}");
    assert_eq!(terminals(&events), vec![TransferStatus::Succeeded]);
}

#[tokio::test]
async fn latest_snapshot_mirrors_the_last_event() {
    let data = random_bytes(300);
    let transport = Arc::new(MockTransport::new(data));
    let dir = temp_dir();

    let stream = engine(&transport).download(TransferRequest::new(URL, dir.path().join("a.bin")).workers(3));
    let latest = stream.latest();
    assert!(matches!(
        latest.get_current().status,
        TransferStatus::Pending | TransferStatus::Running | TransferStatus::Succeeded
    ));

    let last = stream.finish().await.unwrap();
    assert_eq!(latest.get_current().status, last.status);
    assert_eq!(latest.get_current().cached_size, 300);
    assert!((last.pct() - 100.0).abs() < f64::EPSILON);
}

#[tokio::test]
async fn cancel_handle_works_from_another_task() {
    let transport = Arc::new(
        MockTransport::new(random_bytes(1000))
            .chunk_size(10)
            .chunk_delay(Duration::from_millis(20)),
    );
    let dir = temp_dir();
    let target = dir.path().join("out.bin");

    let stream = engine(&transport).download(TransferRequest::new(URL, &target).workers(2));
    let handle = stream.cancel_handle();
    let observer = handle.clone();
    assert!(!observer.is_cancelled());

    let canceller = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(60)).await;
        handle.cancel();
    });

    let last = timeout(Duration::from_secs(5), stream.finish()).await.unwrap().unwrap();
    canceller.await.unwrap();

    assert_eq!(last.status, TransferStatus::Paused);
    assert!(observer.is_cancelled());
    assert!(!target.exists());
}

#[tokio::test]
async fn latest_snapshot_can_be_projected() {
    let transport = Arc::new(MockTransport::new(random_bytes(500)));
    let dir = temp_dir();

    let stream = engine(&transport).download(TransferRequest::new(URL, dir.path().join("a.bin")));
    let latest = stream.latest();
    stream.finish().await.unwrap();

    assert_eq!(latest.map(|info| info.total_size), 500);
    assert_eq!(latest.map(|info| (info.status, info.cached_size)), (TransferStatus::Succeeded, 500));
}

#[tokio::test]
async fn engine_exposes_its_config() {
    let transport = Arc::new(MockTransport::new(Vec::new()));
    let config = EngineConfig {
        buffer_size: 1024,
        progress_interval: Duration::from_secs(1),
    };
    let engine = TransferEngine::from_shared(transport, config);

    assert_eq!(engine.config().buffer_size, 1024);
    assert_eq!(engine.config().progress_interval, Duration::from_secs(1));
    assert_eq!(engine.clone().config().buffer_size, 1024);
}

#[tokio::test]
async fn excess_workers_only_touch_planned_slices() {
    let data = random_bytes(10);
    let transport = Arc::new(MockTransport::new(data.clone()));
    let dir = temp_dir();
    let target = dir.path().join("tiny.bin");

    let started = Instant::now();
    let events = run_to_end(&engine(&transport), TransferRequest::new(URL, &target).workers(300_000)).await;

    assert_eq!(terminals(&events), vec![TransferStatus::Succeeded]);
    assert_eq!(read_file(&target), data);
    // 每个字节一个区间，多出来的分片数既不发请求也不读缓存
    assert_eq!(transport.ranged_calls(), 10);
    assert!(started.elapsed() < Duration::from_secs(2), "elapsed = {:?}", started.elapsed());
}

#[tokio::test]
async fn body_shorter_than_reported_length_fails() {
    let data = random_bytes(500);
    let transport = Arc::new(MockTransport::new(data.clone()).reported_length(1000));
    let dir = temp_dir();
    let target = dir.path().join("short.bin");

    let events = run_to_end(&engine(&transport), TransferRequest::new(URL, &target)).await;

    assert_eq!(terminals(&events), vec![TransferStatus::Failed]);
    let last = events.last().unwrap();
    assert_eq!(last.total_size, 1000);
    assert!(matches!(
        last.error.as_deref(),
        Some(TransferError::IncompleteSlice {
            index: 1,
            expected: 1000,
            actual: 500
        })
    ));
    // 已收到的部分留作续传缓存
    assert!(!target.exists());
    assert_eq!(read_file(&slice_path(&target, 1)), data);
}
