//! # Waybill Assign
//!
//! 把表格中的运单号逐条粘贴到浏览器里的分配页面，并在出现错误弹窗时交给人工处理
//!
//! ## 架构设计
//!
//! 本系统采用严格的四层架构：
//!
//! ### ① 基础设施层（Infrastructure）
//! - `infrastructure/` - 持有操作系统资源，只暴露能力
//! - `clipboard` / `keyboard` - 剪贴板写入与按键注入
//! - `screen` / `window` - 主屏截图、窗口枚举与激活
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 描述"我能做什么"
//! - `PasteSubmit` - 复制 → 粘贴 → 回车
//! - `WindowFocus` - 按标题置前窗口
//! - `ErrorDetector` - 文本 / 图像策略链
//! - `InterruptMonitor` - 全局中断键
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/` - 一次运行的共享协议对象
//! - `PauseCoordinator` - 暂停 / 继续 / 取消
//! - `RunObserver` - 状态、进度、日志输出
//! - `CycleCtx` - 单条记录上下文
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/cycle_runner` - 逐条处理的状态机
//! - `orchestrator/app` - 组装与运行
//! - `orchestrator/console` - 操作员命令
//!
//! ## 模块结构

pub mod config;
pub mod error;
pub mod infrastructure;

pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use config::{Config, VisualErrorPolicy};
pub use error::{AppError, AppResult};
pub use models::{Record, RecordSet, RecordSource};
pub use orchestrator::{App, CycleOutcome, CycleRunner, EngineState, RunReport, RunnerSettings};
pub use workflow::{PauseCoordinator, ResumeOutcome, RunObserver, RunStatus};
