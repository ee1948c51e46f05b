//! 暂停协调器
//!
//! 工作流程与按键监听线程 / 控制台线程之间唯一共享的可变状态。
//! 所有暂停来源（中断键、视觉错误、键盘失败）都汇聚到同一个标志上，
//! 因此重复请求是幂等的，只有第一次会输出日志。

use crate::workflow::observer::{timestamped, RunObserver};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::Notify;
use tracing::debug;

/// 运行状态
#[derive(Debug, Clone, PartialEq)]
pub struct RunState {
    /// 下一条要尝试的记录
    pub current_index: usize,
    pub paused: bool,
    pub cancelled: bool,
    /// 当前节奏（秒）
    pub active_delay: f64,
}

impl RunState {
    fn initial(delay: f64) -> Self {
        Self {
            current_index: 0,
            paused: false,
            cancelled: false,
            active_delay: delay,
        }
    }
}

/// `wait_for_resume` 的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResumeOutcome {
    Resumed,
    Cancelled,
}

pub struct PauseCoordinator {
    state: Mutex<RunState>,
    wake: Notify,
    poll_interval: Duration,
    observer: Arc<dyn RunObserver>,
}

impl PauseCoordinator {
    pub fn new(observer: Arc<dyn RunObserver>, poll_interval: Duration, delay: f64) -> Self {
        Self {
            state: Mutex::new(RunState::initial(delay)),
            wake: Notify::new(),
            poll_interval,
            observer,
        }
    }

    fn lock(&self) -> MutexGuard<'_, RunState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// 请求暂停；只有从未暂停变为暂停时返回 `true` 并记录日志
    pub fn request_pause(&self, reason: &str) -> bool {
        let newly_paused = {
            let mut state = self.lock();
            !std::mem::replace(&mut state.paused, true)
        };
        if newly_paused {
            self.observer.on_log(&timestamped(&format!("⏸️ {}", reason)));
        } else {
            debug!("已处于暂停状态，忽略: {}", reason);
        }
        newly_paused
    }

    /// 恢复运行，可同时修改节奏
    ///
    /// 未暂停时无效果，返回 `false`
    pub fn resume(&self, new_delay: Option<f64>) -> bool {
        let delay = {
            let mut state = self.lock();
            if !state.paused {
                return false;
            }
            state.paused = false;
            if let Some(delay) = new_delay {
                state.active_delay = delay;
            }
            state.active_delay
        };
        self.wake.notify_waiters();
        self.observer
            .on_log(&timestamped(&format!("▶️ 继续 (节奏: {}s)", delay)));
        true
    }

    /// 强制停止；同时清除暂停以唤醒等待方
    pub fn cancel(&self) {
        {
            let mut state = self.lock();
            state.cancelled = true;
            state.paused = false;
        }
        self.wake.notify_waiters();
        self.observer.on_log(&timestamped("⛔ 请求强制停止..."));
    }

    pub fn is_paused(&self) -> bool {
        self.lock().paused
    }

    pub fn is_cancelled(&self) -> bool {
        self.lock().cancelled
    }

    /// 阻塞当前任务直到恢复或取消
    ///
    /// 取消优先于恢复；每隔 `poll_interval` 重新检查一次状态
    pub async fn wait_for_resume(&self) -> ResumeOutcome {
        loop {
            let notified = self.wake.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            {
                let state = self.lock();
                if state.cancelled {
                    return ResumeOutcome::Cancelled;
                }
                if !state.paused {
                    return ResumeOutcome::Resumed;
                }
            }

            tokio::select! {
                _ = &mut notified => {}
                _ = tokio::time::sleep(self.poll_interval) => {}
            }
        }
    }

    pub fn delay(&self) -> Duration {
        Duration::from_secs_f64(self.lock().active_delay.max(0.0))
    }

    pub fn set_delay(&self, delay: f64) {
        self.lock().active_delay = delay;
        self.observer
            .on_log(&timestamped(&format!("⏱️ 节奏已调整为 {}s", delay)));
    }

    pub fn current_index(&self) -> usize {
        self.lock().current_index
    }

    pub fn set_current_index(&self, index: usize) {
        self.lock().current_index = index;
    }

    pub fn snapshot(&self) -> RunState {
        self.lock().clone()
    }

    /// 回到初始状态（每次运行开始和结束时调用）
    pub fn reset(&self, delay: f64) {
        *self.lock() = RunState::initial(delay);
    }
}
