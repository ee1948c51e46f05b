//! 基础设施层
//!
//! 持有操作系统资源（剪贴板、键盘、屏幕、窗口），只暴露能力，
//! 不认识记录、不关心流程

pub mod clipboard;
pub mod keyboard;
pub mod screen;
pub mod window;

pub use screen::{PrimaryScreen, ScreenSource};
pub use window::WindowInfo;
