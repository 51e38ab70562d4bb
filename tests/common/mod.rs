#![allow(dead_code)]

use image::{DynamicImage, Rgba, RgbaImage};
use ndarray::Array4;
use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc::{Receiver, Sender, channel};
use std::time::{Duration, Instant};

use lookout::{
    Detection, Error, FrameSize, FrameSource, InferenceService, LabelTable, ModelInputs,
    ProcessorHandle, ProcessorOptions, Result,
};

/// 纯色画面的帧来源
pub struct SolidSource {
    width: u32,
    height: u32,
    pub grabs: Arc<AtomicUsize>,
}

impl SolidSource {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            grabs: Arc::new(AtomicUsize::new(0)),
        }
    }
}

impl FrameSource for SolidSource {
    fn open(&mut self) -> Result<FrameSize> {
        Ok(FrameSize::new(self.width, self.height))
    }

    fn grab(&mut self) -> Result<DynamicImage> {
        self.grabs.fetch_add(1, Ordering::SeqCst);
        Ok(DynamicImage::ImageRgba8(RgbaImage::from_pixel(
            self.width,
            self.height,
            Rgba([40, 80, 120, 255]),
        )))
    }
}

/// 按脚本返回结果的推理服务
///
/// 带闸门时，每次推理都要等测试发出一次放行信号；
/// 发送端被丢弃后推理立即返回，测试结束时不会留下阻塞线程。
pub struct ScriptedService {
    processor: ProcessorHandle,
    labels: LabelTable,
    frame: FrameSize,
    responses: VecDeque<Result<Vec<Detection>>>,
    gate: Option<Receiver<()>>,
    pub calls: Arc<AtomicUsize>,
    pub seen_edges: Arc<std::sync::Mutex<Vec<u32>>>,
}

impl ScriptedService {
    pub fn new(frame: FrameSize) -> Self {
        Self {
            processor: ProcessorHandle::new(ProcessorOptions { shortest_edge: 128 }),
            labels: LabelTable::from_names(["person", "bicycle", "car"]),
            frame,
            responses: VecDeque::new(),
            gate: None,
            calls: Arc::new(AtomicUsize::new(0)),
            seen_edges: Arc::new(std::sync::Mutex::new(Vec::new())),
        }
    }

    pub fn respond(mut self, detections: Vec<Detection>) -> Self {
        self.responses.push_back(Ok(detections));
        self
    }

    pub fn fail(mut self, reason: &str) -> Self {
        self.responses.push_back(Err(Error::Task(reason.to_string())));
        self
    }

    /// 加上闸门，返回放行用的发送端
    pub fn gated(mut self) -> (Self, Sender<()>) {
        let (tx, rx) = channel();
        self.gate = Some(rx);
        (self, tx)
    }
}

impl InferenceService for ScriptedService {
    fn processor(&self) -> ProcessorHandle {
        self.processor.clone()
    }

    fn preprocess(&self, rgba: &[u8], width: u32, height: u32) -> Result<ModelInputs> {
        assert_eq!(rgba.len(), (width * height * 4) as usize);
        if let Ok(mut edges) = self.seen_edges.lock() {
            edges.push(self.processor.get().shortest_edge);
        }
        Ok(ModelInputs {
            tensor: Array4::zeros((1, 3, 1, 1)),
            reshaped_size: self.frame,
        })
    }

    fn infer(&mut self, _inputs: &ModelInputs) -> Result<Vec<Detection>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = &self.gate {
            let _ = gate.recv();
        }
        self.responses.pop_front().unwrap_or_else(|| Ok(Vec::new()))
    }

    fn labels(&self) -> &LabelTable {
        &self.labels
    }
}

pub fn detection(row: [f32; 6]) -> Detection {
    Detection::from_row(row)
}

/// 轮询等待条件成立
pub async fn wait_until<F: FnMut() -> bool>(mut condition: F) {
    let deadline = Instant::now() + Duration::from_secs(5);
    while !condition() {
        assert!(Instant::now() < deadline, "condition not reached in time");
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}
