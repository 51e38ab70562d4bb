pub mod capture;
pub mod config;
pub mod controls;
pub mod detect;
pub mod error;
pub mod lookout;
pub mod overlay;
pub mod session;
pub mod status;
pub mod utils;

// 重新导出常用类型和函数
pub use capture::{FolderSource, FrameSource, StillSource, Surface};
pub use controls::{ControlEvent, ControlPanel, Parameters, RangeControl};
pub use detect::{
    BoundingBox, Detection, FrameSize, InferenceService, LabelTable, ModelInputs, OrtDetector,
    ProcessorHandle, ProcessorOptions,
};
pub use error::{Error, Result};
pub use lookout::{Lookout, LoopReport, TickOutcome};
pub use overlay::{Overlay, OverlayMarker, render_box};
pub use session::SessionState;
pub use status::{ModelStatus, Supervisor};
pub use utils::{FpsWindow, LoopMode, StopHandle};
