use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::capture::{FrameSource, Surface};
use crate::controls::{ControlEvent, Parameters};
use crate::detect::{Detection, FrameSize, InferenceService, LabelTable};
use crate::error::{Error, Result};
use crate::overlay::{Overlay, compose};
use crate::session::{SessionState, SharedSession, lock_session};
use crate::utils::muloop::{LoopBudget, LoopMode, StopHandle};

/// 停止循环时等待在途推理结束的最长时间
const SETTLE_GRACE: Duration = Duration::from_secs(5);
/// 状态和帧率读数的日志间隔
const READOUT_INTERVAL: Duration = Duration::from_secs(2);

/// 一拍的处理结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// 表面、视频流或模型尚未就绪，什么也没做
    Idle,
    /// 提交了一次新的推理
    Submitted,
    /// 上一次推理仍在进行，本帧被丢弃
    Dropped,
}

/// 循环结束时的统计
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LoopReport {
    pub ticks: usize,
    pub submitted: u64,
    pub completed: u64,
    pub dropped: u64,
    pub failures: u64,
    pub mean_fps: f64,
}

/// 快照输出设置
#[derive(Debug, Clone)]
struct Snapshots {
    dir: PathBuf,
    every: u64,
    last_batch: u64,
}

/// 采集 → 推理 → 叠加 的主循环
///
/// 每个刷新周期调用一次 [`Lookout::tick`]：把当前帧画到绘制表面上，
/// 如果没有推理在进行，就把表面像素交给推理服务。推理在单独的任务里完成，
/// 任务句柄只有一个槽位，槽位被占用期间到来的帧直接丢弃，不排队。
pub struct Lookout<S: InferenceService, F: FrameSource> {
    source: F,
    service: Arc<Mutex<S>>,
    labels: Arc<LabelTable>,
    surface: Option<Surface>,
    session: SharedSession,
    /// 在途推理任务，唯一的槽位
    in_flight: Option<JoinHandle<()>>,
    submitted: u64,
    inference_timeout: Option<Duration>,
    controls: Option<mpsc::UnboundedReceiver<ControlEvent>>,
    snapshots: Option<Snapshots>,
}

impl<S: InferenceService, F: FrameSource> Lookout<S, F> {
    /// 推荐由外部传入帧来源和已加载的推理服务
    pub fn new(source: F, service: S, params: Parameters) -> Self {
        let labels = Arc::new(service.labels().clone());
        Self {
            source,
            service: Arc::new(Mutex::new(service)),
            labels,
            surface: None,
            session: Arc::new(Mutex::new(SessionState::new(params))),
            in_flight: None,
            submitted: 0,
            inference_timeout: None,
            controls: None,
            snapshots: None,
        }
    }

    /// 推理超过 `timeout` 时立即记为失败
    ///
    /// 阻塞中的推理无法取消，槽位仍然占用到它返回为止，其结果被丢弃。
    pub fn with_inference_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.inference_timeout = timeout;
        self
    }

    /// 接收控制面板的事件，每拍开始时应用
    pub fn with_controls(mut self, controls: mpsc::UnboundedReceiver<ControlEvent>) -> Self {
        self.controls = Some(controls);
        self
    }

    /// 每完成 `every` 批推理，把合成后的画面写入 `dir`
    pub fn with_snapshots(mut self, dir: impl Into<PathBuf>, every: u64) -> Self {
        self.snapshots = Some(Snapshots {
            dir: dir.into(),
            every: every.max(1),
            last_batch: 0,
        });
        self
    }

    /// 打开视频流并按当前缩放比例建立绘制表面
    pub fn open(&mut self) -> Result<FrameSize> {
        let native = self.source.open()?;
        let scale = self.parameters().capture_scale;
        let surface = Surface::new(native, scale);
        let (container_width, container_height) = surface.container();
        log::info!(
            "stream {}x{}, surface {}x{}, container {}x{}",
            native.width,
            native.height,
            surface.size().width,
            surface.size().height,
            container_width,
            container_height
        );
        self.surface = Some(surface);
        Ok(native)
    }

    /// 是否有推理正在进行
    pub fn is_processing(&self) -> bool {
        self.in_flight
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    pub fn parameters(&self) -> Parameters {
        lock_session(&self.session).params
    }

    pub fn surface(&self) -> Option<&Surface> {
        self.surface.as_ref()
    }

    /// 当前叠加层的副本
    pub fn overlay(&self) -> Overlay {
        lock_session(&self.session).overlay.clone()
    }

    pub fn fps_readout(&self) -> String {
        lock_session(&self.session).fps.readout()
    }

    /// 处理一次参数变化
    ///
    /// 阈值在下一批结果渲染时生效；缩放比例立即调整绘制表面。
    /// 图像尺寸已经由控制面板直接写入推理服务，这里只记录。
    pub fn apply_control(&mut self, event: ControlEvent) {
        let mut session = lock_session(&self.session);
        match event {
            ControlEvent::ImageSize(size) => session.params.image_size = size,
            ControlEvent::Threshold(threshold) => session.params.threshold = threshold,
            ControlEvent::Scale(scale) => {
                session.params.capture_scale = scale;
                if let Some(surface) = self.surface.as_mut() {
                    surface.set_scale(scale);
                }
            }
        }
        log::debug!("control applied: {event:?}");
    }

    /// 执行一拍
    pub fn tick(&mut self) -> TickOutcome {
        self.drain_controls();

        let Some(surface) = self.surface.as_mut() else {
            return TickOutcome::Idle;
        };
        if !surface.is_drawable() {
            return TickOutcome::Idle;
        }
        match self.source.grab() {
            Ok(frame) => surface.draw_frame(&frame),
            Err(e) => {
                log::warn!("failed to grab frame: {e}");
                return TickOutcome::Idle;
            }
        }

        if self.is_processing() {
            lock_session(&self.session).dropped += 1;
            log::trace!("inference in flight, frame dropped");
            return TickOutcome::Dropped;
        }

        self.submit();
        TickOutcome::Submitted
    }

    /// 按刷新频率循环执行，直到预算用完或收到停止请求
    pub async fn run(&mut self, mode: LoopMode, refresh_hz: u32, stop: StopHandle) -> LoopReport {
        let period = Duration::from_secs_f64(1.0 / refresh_hz.max(1) as f64);
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        let mut budget = LoopBudget::new(mode);
        let mut last_readout = Instant::now();
        log::info!("capture loop started ({mode:?}, {refresh_hz} Hz)");

        while budget.allows_tick() && stop.is_running() {
            interval.tick().await;
            self.tick();
            budget.record_tick();
            self.write_snapshot().await;

            if last_readout.elapsed() >= READOUT_INTERVAL {
                log::info!("{}", self.fps_readout());
                last_readout = Instant::now();
            }
        }

        self.settle().await;
        self.write_snapshot().await;
        let report = self.report(budget.ticks());
        log::info!(
            "capture loop stopped: {} ticks, {} submitted, {} completed, {} dropped, {} failed, {}",
            report.ticks,
            report.submitted,
            report.completed,
            report.dropped,
            report.failures,
            self.fps_readout()
        );
        report
    }

    /// 等待在途推理结束；超过宽限时间则放弃等待
    pub async fn settle(&mut self) {
        let Some(mut handle) = self.in_flight.take() else {
            return;
        };
        if tokio::time::timeout(SETTLE_GRACE, &mut handle).await.is_err() {
            log::warn!("in-flight inference did not settle within {SETTLE_GRACE:?}, abandoning it");
            handle.abort();
        }
    }

    pub fn report(&self, ticks: usize) -> LoopReport {
        let session = lock_session(&self.session);
        LoopReport {
            ticks,
            submitted: self.submitted,
            completed: session.completed,
            dropped: session.dropped,
            failures: session.failures,
            mean_fps: session.fps.mean(),
        }
    }

    fn drain_controls(&mut self) {
        let mut events = Vec::new();
        if let Some(controls) = self.controls.as_mut() {
            while let Ok(event) = controls.try_recv() {
                events.push(event);
            }
        }
        for event in events {
            self.apply_control(event);
        }
    }

    /// 占用槽位并提交当前表面
    fn submit(&mut self) {
        let Some(surface) = self.surface.as_ref() else {
            return;
        };
        let pixels = surface.image_data();
        let FrameSize { width, height } = surface.size();

        let service = Arc::clone(&self.service);
        let session = Arc::clone(&self.session);
        let labels = Arc::clone(&self.labels);
        let timeout = self.inference_timeout;

        self.submitted += 1;
        let id = self.submitted;
        self.in_flight = Some(tokio::spawn(async move {
            let mut work = tokio::task::spawn_blocking(move || {
                let mut service = service.lock().unwrap_or_else(PoisonError::into_inner);
                let inputs = service.preprocess(&pixels, width, height)?;
                let detections = service.infer(&inputs)?;
                Ok::<_, Error>((detections, inputs.reshaped_size))
            });

            let Some(limit) = timeout else {
                finish(&session, &labels, id, flatten(work.await));
                return;
            };
            match tokio::time::timeout(limit, &mut work).await {
                Ok(joined) => finish(&session, &labels, id, flatten(joined)),
                Err(_) => {
                    finish(&session, &labels, id, Err(Error::Timeout(limit)));
                    // 阻塞调用无法取消：槽位一直占用到它真正返回，迟到的结果丢弃
                    let late = flatten(work.await);
                    log::debug!(
                        "inference #{id} returned after timeout, result discarded (ok: {})",
                        late.is_ok()
                    );
                }
            }
        }));
    }

    /// 已完成批次数是快照间隔的整数倍且尚未写过时，写出一张合成画面
    ///
    /// 合成和 PNG 编码在阻塞线程上进行。返回写入的文件路径。
    pub async fn write_snapshot(&mut self) -> Option<PathBuf> {
        let snapshots = self.snapshots.as_mut()?;
        let surface = self.surface.as_ref()?;
        let (overlay, batch) = {
            let session = lock_session(&self.session);
            (session.overlay.clone(), session.completed)
        };
        if batch == snapshots.last_batch || batch % snapshots.every != 0 {
            return None;
        }
        snapshots.last_batch = batch;

        let dir = snapshots.dir.clone();
        let path = dir.join(format!("frame_{batch:06}.png"));
        let pixels = surface.pixels().clone();
        let container = surface.container();
        let target = path.clone();
        let written = tokio::task::spawn_blocking(move || {
            std::fs::create_dir_all(&dir)?;
            compose(&pixels, &overlay, container).save(&target)?;
            Ok::<_, Error>(())
        })
        .await;

        match flatten(written) {
            Ok(()) => {
                log::debug!("snapshot written to {}", path.display());
                Some(path)
            }
            Err(e) => {
                log::warn!("failed to write snapshot {}: {e}", path.display());
                None
            }
        }
    }
}

fn flatten<T>(joined: std::result::Result<Result<T>, tokio::task::JoinError>) -> Result<T> {
    joined.map_err(|e| Error::Task(e.to_string()))?
}

/// 推理任务的收尾：渲染结果或记录失败，两种情况下槽位都会随任务结束而释放
fn finish(
    session: &Mutex<SessionState>,
    labels: &LabelTable,
    id: u64,
    result: Result<(Vec<Detection>, FrameSize)>,
) {
    let mut session = lock_session(session);
    match result {
        Ok((detections, frame)) => {
            let report = session.complete_batch(&detections, frame, labels, Instant::now());
            log::debug!(
                "inference #{id}: {} detections, {} rendered on {}x{}, {:.1} fps",
                report.detections,
                report.rendered,
                frame.width,
                frame.height,
                report.mean_fps
            );
        }
        Err(e) => {
            session.failures += 1;
            log::warn!("inference #{id} failed: {e}");
        }
    }
}
