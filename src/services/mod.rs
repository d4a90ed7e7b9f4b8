// Per-frame pipeline, advice, reporting and persistence services

pub mod advice_engine;
pub mod angle_engine;
pub mod bdc_detector;
pub mod frame_pipeline;
pub mod landmark_smoother;
pub mod live_controller;
pub mod preset_resolver;
pub mod report_comparator;
pub mod session_store;

pub use advice_engine::{AdviceEngine, AdviceUpdate};
pub use angle_engine::{AngleEngine, JointAngles};
pub use bdc_detector::BdcDetector;
pub use frame_pipeline::FramePipeline;
pub use landmark_smoother::{LandmarkSmoother, SideLocker};
pub use live_controller::{CaptureDevice, CoachHint, FrameOutcome, LiveController, UiSink};
pub use preset_resolver::resolve;
pub use report_comparator::{select_pair, ReportComparator};
pub use session_store::{KeyValueStore, MemoryStore, SessionStore, SESSION_KEY};
