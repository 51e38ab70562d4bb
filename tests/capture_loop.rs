mod common;

use std::sync::atomic::Ordering;
use std::time::Duration;
use tokio::sync::mpsc;

use common::{ScriptedService, SolidSource, detection, wait_until};
use lookout::{
    ControlEvent, ControlPanel, FrameSize, InferenceService, Lookout, LoopMode, Parameters,
    StopHandle, TickOutcome,
};

fn params() -> Parameters {
    Parameters {
        image_size: 128,
        threshold: 0.25,
        capture_scale: 0.5,
    }
}

#[tokio::test]
async fn tick_before_open_is_a_no_op() {
    let source = SolidSource::new(64, 48);
    let grabs = source.grabs.clone();
    let service = ScriptedService::new(FrameSize::new(100, 100));
    let calls = service.calls.clone();
    let mut lookout = Lookout::new(source, service, params());

    assert_eq!(lookout.tick(), TickOutcome::Idle);
    assert_eq!(grabs.load(Ordering::SeqCst), 0);
    assert_eq!(calls.load(Ordering::SeqCst), 0);
    assert!(!lookout.is_processing());
}

#[tokio::test]
async fn zero_scale_surface_is_not_drawable() {
    let service = ScriptedService::new(FrameSize::new(100, 100));
    let calls = service.calls.clone();
    let mut lookout = Lookout::new(
        SolidSource::new(64, 48),
        service,
        Parameters {
            capture_scale: 0.0,
            ..params()
        },
    );
    lookout.open().unwrap();

    assert_eq!(lookout.tick(), TickOutcome::Idle);
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn surface_is_downscaled_by_capture_scale() {
    let mut lookout = Lookout::new(
        SolidSource::new(64, 48),
        ScriptedService::new(FrameSize::new(100, 100)),
        params(),
    );
    let native = lookout.open().unwrap();
    assert_eq!(native, FrameSize::new(64, 48));
    assert_eq!(lookout.surface().unwrap().size(), FrameSize::new(32, 24));

    lookout.apply_control(ControlEvent::Scale(0.25));
    assert_eq!(lookout.surface().unwrap().size(), FrameSize::new(16, 12));
    assert_eq!(lookout.parameters().capture_scale, 0.25);
}

#[tokio::test]
async fn only_one_inference_in_flight() {
    let (service, release) = ScriptedService::new(FrameSize::new(100, 100))
        .respond(vec![detection([10.0, 10.0, 60.0, 60.0, 0.9, 0.0])])
        .respond(vec![])
        .gated();
    let calls = service.calls.clone();
    let mut lookout = Lookout::new(SolidSource::new(64, 48), service, params());
    lookout.open().unwrap();

    assert_eq!(lookout.tick(), TickOutcome::Submitted);
    wait_until(|| calls.load(Ordering::SeqCst) == 1).await;

    for _ in 0..5 {
        assert_eq!(lookout.tick(), TickOutcome::Dropped);
    }
    assert!(lookout.is_processing());
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    release.send(()).unwrap();
    wait_until(|| !lookout.is_processing()).await;
    assert_eq!(lookout.overlay().len(), 1);

    assert_eq!(lookout.tick(), TickOutcome::Submitted);
    wait_until(|| calls.load(Ordering::SeqCst) == 2).await;
    release.send(()).unwrap();
    wait_until(|| !lookout.is_processing()).await;

    let report = lookout.report(8);
    assert_eq!(report.submitted, 2);
    assert_eq!(report.completed, 2);
    assert_eq!(report.dropped, 5);
}

#[tokio::test]
async fn new_batch_replaces_previous_markers() {
    let service = ScriptedService::new(FrameSize::new(100, 100))
        .respond(vec![
            detection([0.0, 0.0, 10.0, 10.0, 0.9, 0.0]),
            detection([10.0, 10.0, 20.0, 20.0, 0.8, 1.0]),
            detection([20.0, 20.0, 30.0, 30.0, 0.7, 2.0]),
        ])
        .respond(vec![detection([50.0, 50.0, 70.0, 90.0, 0.6, 2.0])]);
    let mut lookout = Lookout::new(SolidSource::new(64, 48), service, params());
    lookout.open().unwrap();

    assert_eq!(lookout.tick(), TickOutcome::Submitted);
    wait_until(|| !lookout.is_processing()).await;
    let first = lookout.overlay();
    assert_eq!(first.len(), 3);
    assert_eq!(first.batch(), 1);

    assert_eq!(lookout.tick(), TickOutcome::Submitted);
    wait_until(|| !lookout.is_processing()).await;
    let second = lookout.overlay();
    assert_eq!(second.batch(), 2);
    assert_eq!(second.len(), 1);
    assert_eq!(second.markers()[0].label, "car (60.00%)");
}

#[tokio::test]
async fn threshold_is_read_when_results_arrive() {
    let service = ScriptedService::new(FrameSize::new(100, 100))
        .respond(vec![
            detection([0.0, 0.0, 10.0, 10.0, 0.20, 0.0]),
            detection([0.0, 0.0, 10.0, 10.0, 0.30, 0.0]),
        ])
        .respond(vec![
            detection([0.0, 0.0, 10.0, 10.0, 0.20, 0.0]),
            detection([0.0, 0.0, 10.0, 10.0, 0.30, 0.0]),
        ]);
    let (tx, rx) = mpsc::unbounded_channel();
    let mut lookout =
        Lookout::new(SolidSource::new(64, 48), service, params()).with_controls(rx);
    lookout.open().unwrap();

    lookout.tick();
    wait_until(|| !lookout.is_processing()).await;
    assert_eq!(lookout.overlay().len(), 1);

    tx.send(ControlEvent::Threshold(0.1)).unwrap();
    lookout.tick();
    wait_until(|| !lookout.is_processing()).await;
    assert_eq!(lookout.parameters().threshold, 0.1);
    assert_eq!(lookout.overlay().len(), 2);
}

#[tokio::test]
async fn failed_inference_releases_the_slot() {
    let service = ScriptedService::new(FrameSize::new(100, 100))
        .fail("model exploded")
        .respond(vec![detection([10.0, 10.0, 60.0, 60.0, 0.9, 0.0])]);
    let calls = service.calls.clone();
    let mut lookout = Lookout::new(SolidSource::new(64, 48), service, params());
    lookout.open().unwrap();

    assert_eq!(lookout.tick(), TickOutcome::Submitted);
    wait_until(|| !lookout.is_processing()).await;
    assert_eq!(lookout.report(1).failures, 1);
    assert!(lookout.overlay().is_empty());

    assert_eq!(lookout.tick(), TickOutcome::Submitted);
    wait_until(|| !lookout.is_processing()).await;
    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert_eq!(lookout.overlay().len(), 1);
}

#[tokio::test]
async fn hung_inference_blocks_submissions_without_timeout() {
    let (service, release) = ScriptedService::new(FrameSize::new(100, 100)).gated();
    let calls = service.calls.clone();
    let mut lookout = Lookout::new(SolidSource::new(64, 48), service, params());
    lookout.open().unwrap();

    lookout.tick();
    wait_until(|| calls.load(Ordering::SeqCst) == 1).await;
    for _ in 0..10 {
        tokio::time::sleep(Duration::from_millis(5)).await;
        assert_eq!(lookout.tick(), TickOutcome::Dropped);
    }
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    drop(release);
    wait_until(|| !lookout.is_processing()).await;
}

#[tokio::test]
async fn timeout_reports_failure_but_keeps_the_slot() {
    let (service, release) = ScriptedService::new(FrameSize::new(100, 100))
        .respond(vec![detection([10.0, 10.0, 60.0, 60.0, 0.9, 0.0])])
        .gated();
    let calls = service.calls.clone();
    let mut lookout = Lookout::new(SolidSource::new(64, 48), service, params())
        .with_inference_timeout(Some(Duration::from_millis(20)));
    lookout.open().unwrap();

    assert_eq!(lookout.tick(), TickOutcome::Submitted);
    wait_until(|| lookout.report(1).failures == 1).await;
    assert!(lookout.is_processing());

    // 多个超时周期过去，仍然只有一次推理
    for _ in 0..5 {
        tokio::time::sleep(Duration::from_millis(30)).await;
        assert_eq!(lookout.tick(), TickOutcome::Dropped);
    }

    drop(release);
    wait_until(|| !lookout.is_processing()).await;
    tokio::time::sleep(Duration::from_millis(20)).await;

    let report = lookout.report(6);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(report.submitted, 1);
    assert_eq!(report.failures, 1);
    assert_eq!(report.completed, 0);
    // 超时后返回的结果不会出现在叠加层上
    assert_eq!(lookout.overlay().batch(), 0);

    assert_eq!(lookout.tick(), TickOutcome::Submitted);
    lookout.settle().await;
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn snapshots_follow_the_batch_interval() {
    let dir = tempfile::tempdir().unwrap();
    let service = ScriptedService::new(FrameSize::new(100, 100))
        .respond(vec![detection([10.0, 10.0, 60.0, 60.0, 0.9, 0.0])]);
    let mut lookout = Lookout::new(SolidSource::new(64, 48), service, params())
        .with_snapshots(dir.path(), 2);
    lookout.open().unwrap();

    let mut written = Vec::new();
    for _ in 0..4 {
        assert_eq!(lookout.tick(), TickOutcome::Submitted);
        wait_until(|| !lookout.is_processing()).await;
        written.extend(lookout.write_snapshot().await);
        // 同一批次不会重复写出
        assert!(lookout.write_snapshot().await.is_none());
    }

    let expected = vec![
        dir.path().join("frame_000002.png"),
        dir.path().join("frame_000004.png"),
    ];
    assert_eq!(written, expected);

    let mut files: Vec<String> = std::fs::read_dir(dir.path())
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    files.sort();
    assert_eq!(files, ["frame_000002.png", "frame_000004.png"]);

    let image = image::open(&expected[1]).unwrap();
    assert_eq!((image.width(), image.height()), (540, 405));
}

#[tokio::test]
async fn run_writes_a_final_snapshot_after_settling() {
    let dir = tempfile::tempdir().unwrap();
    let service = ScriptedService::new(FrameSize::new(100, 100));
    let mut lookout = Lookout::new(SolidSource::new(64, 48), service, params())
        .with_snapshots(dir.path().join("out"), 1);
    lookout.open().unwrap();

    let report = lookout
        .run(LoopMode::Count(1), 60, StopHandle::new())
        .await;
    assert_eq!(report.completed, 1);
    assert!(dir.path().join("out").join("frame_000001.png").is_file());
}

#[tokio::test]
async fn image_size_writes_through_to_the_processor() {
    let service = ScriptedService::new(FrameSize::new(100, 100));
    let processor = service.processor();
    let seen = service.seen_edges.clone();
    let mut panel = ControlPanel::new(params(), processor);
    let mut lookout = Lookout::new(SolidSource::new(64, 48), service, params());
    lookout.open().unwrap();

    assert_eq!(panel.apply(ControlEvent::ImageSize(200)), ControlEvent::ImageSize(192));
    lookout.tick();
    wait_until(|| !lookout.is_processing()).await;
    assert_eq!(*seen.lock().unwrap(), vec![192]);
}

#[tokio::test]
async fn run_honours_count_mode_and_settles() {
    let service = ScriptedService::new(FrameSize::new(100, 100))
        .respond(vec![detection([10.0, 10.0, 60.0, 60.0, 0.9, 0.0])]);
    let mut lookout = Lookout::new(SolidSource::new(64, 48), service, params());
    lookout.open().unwrap();

    let report = lookout
        .run(LoopMode::Count(5), 200, StopHandle::new())
        .await;
    assert_eq!(report.ticks, 5);
    assert!(report.submitted >= 1);
    assert_eq!(report.submitted, report.completed + report.failures);
    assert_eq!(report.submitted + report.dropped, 5);
    assert!(!lookout.is_processing());
}

#[tokio::test]
async fn stopped_handle_prevents_ticks() {
    let service = ScriptedService::new(FrameSize::new(100, 100));
    let mut lookout = Lookout::new(SolidSource::new(64, 48), service, params());
    lookout.open().unwrap();

    let stop = StopHandle::new();
    stop.stop();
    let report = lookout.run(LoopMode::Continuous, 60, stop).await;
    assert_eq!(report.ticks, 0);
    assert_eq!(report.submitted, 0);
}

#[tokio::test]
async fn fps_is_tracked_between_completed_batches() {
    let service = ScriptedService::new(FrameSize::new(100, 100));
    let mut lookout = Lookout::new(SolidSource::new(64, 48), service, params());
    lookout.open().unwrap();

    for _ in 0..3 {
        lookout.tick();
        wait_until(|| !lookout.is_processing()).await;
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    let report = lookout.report(3);
    assert_eq!(report.completed, 3);
    assert!(report.mean_fps > 0.0);
    assert!(lookout.fps_readout().starts_with("Average FPS: "));
}
