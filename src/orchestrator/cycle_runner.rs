//! 循环执行器 - 编排层
//!
//! ## 职责
//!
//! 逐条驱动记录：提交 → 雷达检测 → 出错时交给人工 → 决定重试、跳过或结束。
//!
//! ## 状态
//!
//! ```text
//! Idle ──启动校验──▶ Running ──检测到错误──▶ AwaitingHuman
//!   │                  │  ▲                      │
//!   │                  │  └────────恢复──────────┘
//!   ▼                  ▼                         │取消
//! Failed            Finished ◀── Cancelling ◀────┘
//! ```
//!
//! ## 规则
//!
//! - 同一时刻最多一个动作在执行；第 i 条完全结束后才开始第 i+1 条
//! - `current_index` 只在一条记录的结果确定后前进
//! - 最后一条出现视觉错误时直接结束，不再等待人工
//! - 键盘 / 剪贴板失败：暂停，恢复后重试同一条
//! - 视觉错误：暂停，恢复后按 `VisualErrorPolicy` 跳过或重试
//! - 取消在循环顶部和等待人工时都会被立即发现

use crate::config::{Config, VisualErrorPolicy};
use crate::error::{AppError, AppResult};
use crate::models::{DetectionResult, RecordSource};
use crate::services::{focus_any, ActionExecutor, ErrorScan, FocusController};
use crate::workflow::{timestamped, CycleCtx, PauseCoordinator, ResumeOutcome, RunObserver, RunStatus};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};
use tracing::{debug, error, warn};

/// 执行器状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    Idle,
    Running,
    AwaitingHuman,
    Cancelling,
    Finished,
    Failed,
}

/// 单条记录的处理结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    Success,
    /// 视觉错误已由人工处理，跳过该条
    ErrorHandled,
    /// 最后一条出现错误，直接结束
    ErrorOnFinalRecord,
    Cancelled,
    Fatal,
}

/// 运行汇总
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub state: EngineState,
    pub status: RunStatus,
    pub completed: usize,
    pub handled_errors: usize,
    pub total: usize,
    /// 每条记录的最终结果（按处理顺序）
    pub outcomes: Vec<CycleOutcome>,
}

impl RunReport {
    fn new(total: usize) -> Self {
        Self {
            state: EngineState::Idle,
            status: RunStatus::Running,
            completed: 0,
            handled_errors: 0,
            total,
            outcomes: Vec::new(),
        }
    }
}

/// 执行器参数
#[derive(Debug, Clone)]
pub struct RunnerSettings {
    /// 提交后持续检测错误的时长
    pub radar_window: Duration,
    pub radar_interval: Duration,
    /// 恢复后等待错误消失的最长时间
    pub clear_wait: Duration,
    pub clear_interval: Duration,
    /// 重新置前后、最终复查前的等待
    pub refocus_settle: Duration,
    /// 目标应用窗口标题候选（按顺序尝试）
    pub target_titles: Vec<String>,
    pub data_view_title: Option<String>,
    pub home_window_title: Option<String>,
    pub visual_error_policy: VisualErrorPolicy,
    /// 每次运行开始时的节奏（秒）
    pub initial_delay: f64,
}

impl Default for RunnerSettings {
    fn default() -> Self {
        Self::from(&Config::default())
    }
}

impl From<&Config> for RunnerSettings {
    fn from(config: &Config) -> Self {
        Self {
            radar_window: Duration::from_millis(config.radar_window_ms),
            radar_interval: Duration::from_millis(config.radar_interval_ms),
            clear_wait: Duration::from_secs_f64(config.clear_wait_secs.max(0.0)),
            clear_interval: Duration::from_millis(500),
            refocus_settle: Duration::from_millis(200),
            target_titles: config.target_titles.clone(),
            data_view_title: config.data_view_title.clone(),
            home_window_title: config.home_window_title.clone(),
            visual_error_policy: config.visual_error_policy,
            initial_delay: config.delay_seconds,
        }
    }
}

/// 循环执行器
pub struct CycleRunner {
    executor: Arc<dyn ActionExecutor>,
    detector: Arc<dyn ErrorScan>,
    focus: Arc<dyn FocusController>,
    coordinator: Arc<PauseCoordinator>,
    observer: Arc<dyn RunObserver>,
    settings: RunnerSettings,
    state: Mutex<EngineState>,
}

impl CycleRunner {
    pub fn new(
        executor: Arc<dyn ActionExecutor>,
        detector: Arc<dyn ErrorScan>,
        focus: Arc<dyn FocusController>,
        coordinator: Arc<PauseCoordinator>,
        observer: Arc<dyn RunObserver>,
        settings: RunnerSettings,
    ) -> Self {
        Self {
            executor,
            detector,
            focus,
            coordinator,
            observer,
            settings,
            state: Mutex::new(EngineState::Idle),
        }
    }

    pub fn state(&self) -> EngineState {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn coordinator(&self) -> &Arc<PauseCoordinator> {
        &self.coordinator
    }

    /// 运行一次完整的记录序列
    ///
    /// 任何结束路径都会重置共享状态，并尽量把焦点交回操作员窗口
    pub async fn run(&self, source: &dyn RecordSource) -> RunReport {
        self.coordinator.reset(self.settings.initial_delay);
        self.set_state(EngineState::Idle);

        let mut report = RunReport::new(source.count());

        match self.drive(source, &mut report).await {
            Ok(()) => {
                report.state = EngineState::Finished;
            }
            Err(e) => {
                error!("❌ 运行终止: {}", e);
                self.log(&format!("❌ 致命错误: {}", e));
                self.observer.on_status(RunStatus::Error);
                report.state = EngineState::Failed;
                report.status = RunStatus::Error;
            }
        }
        self.set_state(report.state);

        self.return_home().await;
        self.coordinator.reset(self.settings.initial_delay);

        report
    }

    async fn drive(&self, source: &dyn RecordSource, report: &mut RunReport) -> AppResult<()> {
        let total = source.count();
        if total == 0 {
            self.log("⚠️ 没有需要处理的记录");
            self.observer.on_status(RunStatus::Finished);
            report.status = RunStatus::Finished;
            return Ok(());
        }

        self.establish_focus().await?;

        self.set_state(EngineState::Running);
        self.observer.on_status(RunStatus::Running);
        self.log(&format!("🚀 开始处理，共 {} 条", total));

        let mut index = self.coordinator.current_index();
        while index < total {
            if self.coordinator.is_cancelled() {
                break;
            }

            let Some(record) = source.record(index) else {
                report.outcomes.push(CycleOutcome::Fatal);
                return Err(AppError::missing_record(index, total));
            };
            let ctx = CycleCtx::new(index, total, record.value());

            self.observer.on_progress(ctx.number(), total);
            self.log(&format!("⚙️ {}/{}: {}", ctx.number(), total, ctx.value));

            let outcome = self.process(&ctx).await;
            debug!("{} 结果: {:?}", ctx, outcome);
            report.outcomes.push(outcome);

            match outcome {
                CycleOutcome::Success => report.completed += 1,
                CycleOutcome::ErrorHandled | CycleOutcome::ErrorOnFinalRecord => {
                    report.handled_errors += 1
                }
                CycleOutcome::Cancelled | CycleOutcome::Fatal => break,
            }

            index += 1;
            self.coordinator.set_current_index(index);

            if outcome == CycleOutcome::ErrorOnFinalRecord {
                break;
            }
        }

        if self.coordinator.is_cancelled() {
            self.set_state(EngineState::Cancelling);
            self.log("⛔ 自动化已中止");
            self.observer.on_status(RunStatus::Stopped);
            report.status = RunStatus::Stopped;
        } else {
            self.log("✅ 自动化完成!");
            self.observer.on_status(RunStatus::Finished);
            report.status = RunStatus::Finished;
        }
        Ok(())
    }

    /// 处理一条记录，直到得出结果
    async fn process(&self, ctx: &CycleCtx) -> CycleOutcome {
        loop {
            if self.coordinator.is_cancelled() {
                return CycleOutcome::Cancelled;
            }

            // 上一条结束后收到的人工暂停：处理完再执行本条
            if self.coordinator.is_paused()
                && self.await_human().await == ResumeOutcome::Cancelled
            {
                return CycleOutcome::Cancelled;
            }

            if let Err(e) = self.executor.submit(&ctx.value, self.coordinator.delay()).await {
                warn!("{} 提交失败: {}", ctx, e);
                self.coordinator
                    .request_pause(&format!("❌ 键盘操作失败 ({}): {}", ctx.value, e));
                match self.await_human().await {
                    ResumeOutcome::Cancelled => return CycleOutcome::Cancelled,
                    ResumeOutcome::Resumed => continue,
                }
            }

            let detection = self.radar().await;
            if !detection.found {
                return CycleOutcome::Success;
            }

            if ctx.is_last() {
                self.log(&format!(
                    "🛑 最后一条 ({}) 出现错误 '{}'，结束自动化",
                    ctx.value,
                    detection.label()
                ));
                return CycleOutcome::ErrorOnFinalRecord;
            }

            self.coordinator.request_pause(&format!(
                "🚨 检测到错误 '{}' ({})，请处理",
                detection.label(),
                ctx.value
            ));
            match self.await_human().await {
                ResumeOutcome::Cancelled => return CycleOutcome::Cancelled,
                ResumeOutcome::Resumed => match self.settings.visual_error_policy {
                    VisualErrorPolicy::Skip => {
                        self.log(&format!("⏭️ 错误已处理，跳过 {}", ctx.value));
                        return CycleOutcome::ErrorHandled;
                    }
                    VisualErrorPolicy::Retry => {
                        self.log(&format!("🔁 错误已处理，重新提交 {}", ctx.value));
                        continue;
                    }
                },
            }
        }
    }

    /// 等待人工处理
    ///
    /// 恢复后必须确认错误已消失、焦点已回到目标应用且置前后没有再出现错误，
    /// 否则重新暂停并继续等待
    async fn await_human(&self) -> ResumeOutcome {
        self.set_state(EngineState::AwaitingHuman);
        loop {
            self.observer.on_status(RunStatus::Paused);
            self.log("⏸️ 系统已暂停。处理完成后输入 r 继续，或输入 s 停止");

            if self.coordinator.wait_for_resume().await == ResumeOutcome::Cancelled {
                self.set_state(EngineState::Cancelling);
                self.return_home().await;
                return ResumeOutcome::Cancelled;
            }

            self.log("🔍 正在确认屏幕已清理...");
            if let Some(name) = self.wait_for_clear().await {
                self.coordinator
                    .request_pause(&format!("❌ 错误 '{}' 仍在屏幕上，请关闭后再继续", name));
                continue;
            }

            if focus_any(self.focus.as_ref(), &self.settings.target_titles)
                .await
                .is_none()
            {
                self.coordinator.request_pause("❌ 无法重新获取目标窗口焦点");
                continue;
            }

            tokio::time::sleep(self.settings.refocus_settle).await;

            let again = self.scan_once().await;
            if again.found {
                self.coordinator.request_pause(&format!(
                    "❌ 置前后错误 '{}' 再次出现",
                    again.label()
                ));
                continue;
            }

            self.log("▶️ 继续自动化...");
            self.observer.on_status(RunStatus::Running);
            self.set_state(EngineState::Running);
            return ResumeOutcome::Resumed;
        }
    }

    /// 提交后的错误雷达：在窗口期内反复检测，命中即返回
    async fn radar(&self) -> DetectionResult {
        let start = Instant::now();
        loop {
            let result = self.scan_once().await;
            if result.found || start.elapsed() >= self.settings.radar_window {
                return result;
            }
            tokio::time::sleep(self.settings.radar_interval).await;
        }
    }

    /// 等待错误消失；超时时返回仍在屏幕上的错误名
    async fn wait_for_clear(&self) -> Option<String> {
        let start = Instant::now();
        loop {
            let result = self.scan_once().await;
            if !result.found {
                self.log("✅ 屏幕已确认清理");
                return None;
            }
            if start.elapsed() >= self.settings.clear_wait {
                return Some(result.label().to_string());
            }
            tokio::time::sleep(self.settings.clear_interval).await;
        }
    }

    async fn scan_once(&self) -> DetectionResult {
        let detector = Arc::clone(&self.detector);
        match tokio::task::spawn_blocking(move || detector.scan()).await {
            Ok(result) => result,
            Err(e) => {
                warn!("错误检测任务异常: {}", e);
                DetectionResult::clear()
            }
        }
    }

    /// 启动前建立焦点：数据窗口（如已配置）+ 目标应用
    async fn establish_focus(&self) -> AppResult<()> {
        if let Some(view) = &self.settings.data_view_title {
            if !self.focus.focus(view).await {
                return Err(AppError::focus_unavailable(view.clone()));
            }
        }

        match focus_any(self.focus.as_ref(), &self.settings.target_titles).await {
            Some(title) => {
                self.log(&format!("✓ 目标窗口: {}", title));
                Ok(())
            }
            None => Err(AppError::focus_unavailable(
                self.settings.target_titles.join(" / "),
            )),
        }
    }

    async fn return_home(&self) {
        if let Some(home) = &self.settings.home_window_title {
            if !self.focus.focus(home).await {
                debug!("无法切回窗口: {}", home);
            }
        }
    }

    fn set_state(&self, next: EngineState) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if *state != next {
            debug!("状态: {:?} → {:?}", *state, next);
            *state = next;
        }
    }

    fn log(&self, message: &str) {
        self.observer.on_log(&timestamped(message));
    }
}
