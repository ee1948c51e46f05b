//! 集成测试用的内存替身

#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use waybill_assign::config::VisualErrorPolicy;
use waybill_assign::error::ActionError;
use waybill_assign::models::DetectionResult;
use waybill_assign::services::{ActionExecutor, ErrorScan, FocusController};
use waybill_assign::{CycleRunner, PauseCoordinator, RunObserver, RunStatus, RunnerSettings};

pub const ERROR_IMAGE: &str = "erro_baixada.png";
pub const TARGET: &str = "Google Chrome";
pub const HOME: &str = "Atribuidor";

/// 模拟屏幕：是否有错误弹窗
#[derive(Default)]
pub struct FakeScreen {
    error_visible: AtomicBool,
}

impl FakeScreen {
    pub fn show_error(&self) {
        self.error_visible.store(true, Ordering::SeqCst);
    }

    pub fn clear(&self) {
        self.error_visible.store(false, Ordering::SeqCst);
    }

    pub fn has_error(&self) -> bool {
        self.error_visible.load(Ordering::SeqCst)
    }
}

impl ErrorScan for FakeScreen {
    fn scan(&self) -> DetectionResult {
        if self.has_error() {
            DetectionResult::found(ERROR_IMAGE)
        } else {
            DetectionResult::clear()
        }
    }
}

/// 提交某个值时发生的事
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    /// 键盘注入失败
    Fail,
    /// 提交成功，但页面弹出错误
    ShowError,
    /// 提交成功，操作员同时按下了中断键
    ManualPause,
    /// 提交成功，操作员同时强制停止
    Cancel,
}

/// 按脚本执行的提交动作，记录每次尝试
pub struct ScriptedExecutor {
    screen: Arc<FakeScreen>,
    coordinator: Arc<PauseCoordinator>,
    script: Mutex<HashMap<String, VecDeque<Effect>>>,
    attempts: Mutex<Vec<String>>,
}

impl ScriptedExecutor {
    pub fn new(screen: Arc<FakeScreen>, coordinator: Arc<PauseCoordinator>) -> Self {
        Self {
            screen,
            coordinator,
            script: Mutex::new(HashMap::new()),
            attempts: Mutex::new(Vec::new()),
        }
    }

    /// 第 n 次提交 `value` 时触发第 n 个效果，之后正常
    pub fn on(&self, value: &str, effect: Effect) {
        self.script
            .lock()
            .unwrap()
            .entry(value.to_string())
            .or_default()
            .push_back(effect);
    }

    pub fn attempts(&self) -> Vec<String> {
        self.attempts.lock().unwrap().clone()
    }
}

#[async_trait]
impl ActionExecutor for ScriptedExecutor {
    async fn submit(&self, value: &str, _settle_delay: Duration) -> Result<(), ActionError> {
        self.attempts.lock().unwrap().push(value.to_string());
        let effect = self
            .script
            .lock()
            .unwrap()
            .get_mut(value)
            .and_then(|effects| effects.pop_front());

        match effect {
            Some(Effect::Fail) => Err(ActionError::Keyboard("KeyV".to_string())),
            Some(Effect::ShowError) => {
                self.screen.show_error();
                Ok(())
            }
            Some(Effect::ManualPause) => {
                self.coordinator.request_pause("[ESC] 请求暂停");
                Ok(())
            }
            Some(Effect::Cancel) => {
                self.coordinator.cancel();
                Ok(())
            }
            None => Ok(()),
        }
    }
}

/// 焦点替身：可以整体开关，也可以让窗口置前时弹出错误
pub struct FakeFocus {
    screen: Arc<FakeScreen>,
    available: AtomicBool,
    popup_on_focus: AtomicBool,
    calls: Mutex<Vec<String>>,
}

impl FakeFocus {
    pub fn new(available: bool, screen: Arc<FakeScreen>) -> Self {
        Self {
            screen,
            available: AtomicBool::new(available),
            popup_on_focus: AtomicBool::new(false),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// 下一次成功置前时页面重新弹出错误
    pub fn popup_on_next_focus(&self) {
        self.popup_on_focus.store(true, Ordering::SeqCst);
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl FocusController for FakeFocus {
    async fn focus(&self, title_substring: &str) -> bool {
        self.calls.lock().unwrap().push(title_substring.to_string());
        if !self.available.load(Ordering::SeqCst) {
            return false;
        }
        if self.popup_on_focus.swap(false, Ordering::SeqCst) {
            self.screen.show_error();
        }
        true
    }
}

/// 记录所有回调的观察者
#[derive(Default)]
pub struct RecordingObserver {
    pub statuses: Mutex<Vec<RunStatus>>,
    pub progress: Mutex<Vec<(usize, usize)>>,
    pub lines: Mutex<Vec<String>>,
}

impl RecordingObserver {
    pub fn statuses(&self) -> Vec<RunStatus> {
        self.statuses.lock().unwrap().clone()
    }

    pub fn progress(&self) -> Vec<(usize, usize)> {
        self.progress.lock().unwrap().clone()
    }

    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().unwrap().clone()
    }
}

impl RunObserver for RecordingObserver {
    fn on_status(&self, status: RunStatus) {
        self.statuses.lock().unwrap().push(status);
    }

    fn on_progress(&self, current: usize, total: usize) {
        self.progress.lock().unwrap().push((current, total));
    }

    fn on_log(&self, line: &str) {
        self.lines.lock().unwrap().push(line.to_string());
    }
}

/// 模拟操作员的一步动作（每步都先等到系统暂停）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// 关闭弹窗、恢复目标窗口后继续
    ClearAndResume,
    /// 不关闭弹窗就继续
    ResumeKeepingError,
    /// 关闭弹窗后继续，但目标窗口已不可置前
    ClearLosingFocus,
    /// 关闭弹窗后继续，目标窗口置前时错误又弹出来
    ClearWithPopupOnFocus,
    Cancel,
}

/// 组装好的执行器及其替身
pub struct Harness {
    pub screen: Arc<FakeScreen>,
    pub executor: Arc<ScriptedExecutor>,
    pub focus: Arc<FakeFocus>,
    pub observer: Arc<RecordingObserver>,
    pub coordinator: Arc<PauseCoordinator>,
    pub runner: CycleRunner,
}

pub fn fast_settings(policy: VisualErrorPolicy) -> RunnerSettings {
    RunnerSettings {
        radar_window: Duration::from_millis(30),
        radar_interval: Duration::from_millis(10),
        clear_wait: Duration::from_millis(100),
        clear_interval: Duration::from_millis(10),
        refocus_settle: Duration::from_millis(5),
        target_titles: vec![TARGET.to_string()],
        data_view_title: None,
        home_window_title: Some(HOME.to_string()),
        visual_error_policy: policy,
        initial_delay: 0.0,
    }
}

impl Harness {
    pub fn new(policy: VisualErrorPolicy) -> Self {
        Self::build(fast_settings(policy), true)
    }

    pub fn without_focus() -> Self {
        Self::build(fast_settings(VisualErrorPolicy::Skip), false)
    }

    pub fn build(settings: RunnerSettings, focus_available: bool) -> Self {
        let screen = Arc::new(FakeScreen::default());
        let observer = Arc::new(RecordingObserver::default());
        let coordinator = Arc::new(PauseCoordinator::new(
            observer.clone(),
            Duration::from_millis(10),
            settings.initial_delay,
        ));
        let executor = Arc::new(ScriptedExecutor::new(screen.clone(), coordinator.clone()));
        let focus = Arc::new(FakeFocus::new(focus_available, screen.clone()));

        let runner = CycleRunner::new(
            executor.clone(),
            screen.clone(),
            focus.clone(),
            coordinator.clone(),
            observer.clone(),
            settings,
        );

        Self {
            screen,
            executor,
            focus,
            observer,
            coordinator,
            runner,
        }
    }

    /// 在后台按顺序执行操作员动作，返回完成的步数
    ///
    /// 每一步都等到执行器真正进入等待人工（发出第 n 次 Paused 状态）后才动作
    pub fn operator(&self, steps: Vec<Step>) -> tokio::task::JoinHandle<usize> {
        let coordinator = self.coordinator.clone();
        let screen = self.screen.clone();
        let observer = self.observer.clone();
        let focus = self.focus.clone();
        tokio::spawn(async move {
            let mut done = 0;
            for step in steps {
                loop {
                    let paused_events = observer
                        .statuses()
                        .iter()
                        .filter(|s| **s == RunStatus::Paused)
                        .count();
                    if paused_events > done && coordinator.is_paused() {
                        break;
                    }
                    tokio::time::sleep(Duration::from_millis(5)).await;
                }
                tokio::time::sleep(Duration::from_millis(10)).await;
                match step {
                    Step::ClearAndResume => {
                        screen.clear();
                        focus.set_available(true);
                        coordinator.resume(None);
                    }
                    Step::ClearLosingFocus => {
                        screen.clear();
                        focus.set_available(false);
                        coordinator.resume(None);
                    }
                    Step::ClearWithPopupOnFocus => {
                        screen.clear();
                        focus.popup_on_next_focus();
                        coordinator.resume(None);
                    }
                    Step::ResumeKeepingError => {
                        coordinator.resume(None);
                    }
                    Step::Cancel => coordinator.cancel(),
                }
                done += 1;
            }
            done
        })
    }
}
