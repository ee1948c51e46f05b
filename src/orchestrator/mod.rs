//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 本层负责整次运行的调度，是整个系统的"指挥中心"。
//!
//! ## 模块划分
//!
//! ### `app` - 应用入口
//! - 管理应用生命周期（初始化、运行、统计）
//! - 持有全部具体实现，组装 `CycleRunner`
//! - 启动中断键监听和控制台
//!
//! ### `cycle_runner` - 循环执行器
//! - 逐条处理记录（提交 → 雷达 → 人工处理）
//! - 决定重试、跳过或结束
//!
//! ### `console` - 操作员控制台
//! - 读取标准输入的暂停 / 继续 / 停止 / 节奏命令
//!
//! ## 层次关系
//!
//! ```text
//! app (组装 + 加载数据)
//!     ↓
//! cycle_runner (处理 RecordSource)
//!     ↓
//! workflow::PauseCoordinator / RunObserver
//!     ↓
//! services (能力层：提交 / 焦点 / 错误检测)
//!     ↓
//! infrastructure (基础设施：剪贴板 / 键盘 / 屏幕 / 窗口)
//! ```

pub mod app;
pub mod console;
pub mod cycle_runner;

// 重新导出主要类型
pub use app::App;
pub use console::{parse_command, ControlCommand};
pub use cycle_runner::{CycleOutcome, CycleRunner, EngineState, RunReport, RunnerSettings};
