//! 业务能力层（Services）
//!
//! 每个服务只描述"我能做什么"：提交一个值、置前一个窗口、扫描一次屏幕。
//! 是否暂停、何时继续由流程层决定。

pub mod action_executor;
pub mod error_detector;
pub mod focus_service;
pub mod image_match;
pub mod interrupt_monitor;
pub mod signature_cache;
pub mod text_match;

pub use action_executor::{ActionExecutor, PasteSubmit};
pub use error_detector::{DetectionStrategy, ErrorDetector, ErrorScan};
pub use focus_service::{focus_any, FocusController, WindowFocus};
pub use interrupt_monitor::InterruptMonitor;
pub use image_match::{locate, ImageMatchStrategy, MatchLocation};
pub use signature_cache::SignatureCache;
pub use text_match::{ClipboardText, TextMatchStrategy, TextSource, WindowTitles};
