//! lookout - 摄像头画面实时目标检测
//!
//! 1. 后台加载模型，状态为 Loading → Ready / Error
//! 2. 模型就绪后打开视频流，按刷新频率运行捕获循环
//! 3. 从标准输入读取滑块命令：`size <n>`、`threshold <x>`、`scale <x>`

use anyhow::{Context, Result, anyhow};
use clap::Parser;
use std::io::BufRead;
use std::path::PathBuf;
use std::time::Duration;
use tokio::sync::{mpsc, watch};

use lookout::capture::open_source;
use lookout::config::LookoutConfig;
use lookout::status::load_detector;
use lookout::{
    ControlEvent, ControlPanel, InferenceService, Lookout, LoopMode, ModelStatus, StopHandle,
    Supervisor,
};

#[derive(Parser, Debug)]
#[command(name = "lookout", version, about = "Real-time object detection over a camera feed")]
struct Args {
    /// TOML configuration file
    #[arg(long, env = "LOOKOUT_CONFIG")]
    config: Option<PathBuf>,

    /// ONNX detection model
    #[arg(long)]
    model: Option<PathBuf>,

    /// Label table (config.json with id2label, or one name per line)
    #[arg(long)]
    labels: Option<PathBuf>,

    /// Image file or directory of frames
    #[arg(long)]
    source: Option<PathBuf>,

    #[arg(long)]
    threshold: Option<f32>,

    /// Preprocessing shortest edge
    #[arg(long)]
    size: Option<u32>,

    /// Capture scale
    #[arg(long)]
    scale: Option<f32>,

    #[arg(long)]
    refresh_hz: Option<u32>,

    #[arg(long)]
    inference_timeout_ms: Option<u64>,

    #[arg(long)]
    snapshot_dir: Option<PathBuf>,

    #[arg(long)]
    snapshot_every: Option<u64>,

    /// Stop after this many ticks
    #[arg(long, conflicts_with = "duration_ms")]
    frames: Option<usize>,

    /// Stop after this many milliseconds
    #[arg(long)]
    duration_ms: Option<u64>,

    /// Do not read control commands from stdin
    #[arg(long)]
    no_controls: bool,
}

impl Args {
    fn apply(&self, cfg: &mut LookoutConfig) {
        if let Some(model) = &self.model {
            cfg.model_path = Some(model.clone());
        }
        if let Some(labels) = &self.labels {
            cfg.labels_path = Some(labels.clone());
        }
        if let Some(source) = &self.source {
            cfg.source = Some(source.clone());
        }
        if let Some(threshold) = self.threshold {
            cfg.params.threshold = threshold;
        }
        if let Some(size) = self.size {
            cfg.params.image_size = size;
        }
        if let Some(scale) = self.scale {
            cfg.params.capture_scale = scale;
        }
        if let Some(hz) = self.refresh_hz {
            cfg.refresh_hz = hz;
        }
        if let Some(ms) = self.inference_timeout_ms {
            cfg.inference_timeout = Some(Duration::from_millis(ms));
        }
        if let Some(dir) = &self.snapshot_dir {
            cfg.snapshot_dir = Some(dir.clone());
        }
        if let Some(every) = self.snapshot_every {
            cfg.snapshot_every = every;
        }
    }

    fn loop_mode(&self) -> LoopMode {
        match (self.frames, self.duration_ms) {
            (Some(frames), _) => LoopMode::Count(frames),
            (None, Some(ms)) => LoopMode::Duration(ms),
            (None, None) => LoopMode::Continuous,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let mut cfg = LookoutConfig::load(args.config.as_deref())?;
    args.apply(&mut cfg);
    cfg.validate()?;
    let snapped = cfg.params.snapped();
    if snapped != cfg.params {
        log::info!("parameters aligned to slider steps: {:?} -> {:?}", cfg.params, snapped);
    }
    cfg.params = snapped;

    let model_path = cfg
        .model_path
        .clone()
        .ok_or_else(|| anyhow!("model path is not configured"))?;
    let source_path = cfg
        .source
        .clone()
        .ok_or_else(|| anyhow!("frame source is not configured"))?;

    let (status_tx, status_rx) = watch::channel(ModelStatus::Loading);
    log::info!("status: {}", ModelStatus::Loading);
    let loader = tokio::spawn(load_detector(
        model_path,
        cfg.resolved_labels_path(),
        cfg.params.image_size,
        cfg.intra_threads,
        status_tx,
    ));

    let supervisor = Supervisor::new();
    let ready = supervisor
        .launch_when_ready(status_rx, || log::info!("status: {}", ModelStatus::Ready))
        .await;
    let detector = loader.await.context("model loader task failed")?;
    let detector = match (ready, detector) {
        (Ok(()), Some(detector)) => detector.with_input_name(cfg.input_name.clone()),
        _ => {
            log::error!("status: {}", ModelStatus::Error);
            return Err(anyhow!("model failed to load; capture loop not started"));
        }
    };

    let processor = detector.processor();
    let mut lookout = Lookout::new(open_source(&source_path), detector, cfg.params)
        .with_inference_timeout(cfg.inference_timeout);
    if let Some(dir) = &cfg.snapshot_dir {
        lookout = lookout.with_snapshots(dir.clone(), cfg.snapshot_every);
    }
    if !args.no_controls {
        let (tx, rx) = mpsc::unbounded_channel();
        spawn_control_reader(ControlPanel::new(cfg.params, processor), tx);
        lookout = lookout.with_controls(rx);
    }

    if let Err(e) = lookout.open() {
        log::error!("failed to access video source: {e}");
        return Err(anyhow!("failed to access video source: {e}"));
    }

    let stop = StopHandle::new();
    let ctrl_c_stop = stop.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            log::info!("stop requested");
            ctrl_c_stop.stop();
        }
    });

    let report = lookout.run(args.loop_mode(), cfg.refresh_hz, stop).await;
    println!(
        "{} ticks, {} inferences ({} failed), {} frames dropped, average FPS {:.1}",
        report.ticks, report.completed, report.failures, report.dropped, report.mean_fps
    );
    Ok(())
}

/// 在独立线程上读取标准输入中的滑块命令
fn spawn_control_reader(mut panel: ControlPanel, tx: mpsc::UnboundedSender<ControlEvent>) {
    for control in panel.controls() {
        log::info!(
            "{}: {} (range {}..={}, step {})",
            control.label,
            control.value(),
            control.min,
            control.max,
            control.step
        );
    }
    std::thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else { break };
            if line.trim().is_empty() {
                continue;
            }
            match ControlEvent::parse(&line) {
                Ok(event) => {
                    let applied = panel.apply(event);
                    log::info!("{applied:?}");
                    if tx.send(applied).is_err() {
                        break;
                    }
                }
                Err(e) => log::warn!("{e}; expected `size <n>`, `threshold <x>` or `scale <x>`"),
            }
        }
    });
}
