//! 全局中断键监听 - 业务能力层
//!
//! 在独立线程里监听系统级按键，按下中断键时回调调用方。
//! 监听器每个进程只启动一次；回调本身必须幂等。

use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::infrastructure::keyboard;
use rdev::{EventType, Key};
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use tracing::{info, warn};

static STARTED: AtomicBool = AtomicBool::new(false);

/// 中断键监听器
#[derive(Debug, Clone, Copy)]
pub struct InterruptMonitor {
    key: Key,
}

impl InterruptMonitor {
    pub fn new(key: Key) -> Self {
        Self { key }
    }

    pub fn from_config(config: &Config) -> AppResult<Self> {
        keyboard::parse_key(&config.interrupt_key)
            .map(Self::new)
            .ok_or_else(|| AppError::unknown_key(&config.interrupt_key))
    }

    pub fn key(&self) -> Key {
        self.key
    }

    /// 事件是否为中断键按下（释放事件不算）
    pub fn matches(&self, event: &EventType) -> bool {
        matches!(event, EventType::KeyPress(k) if *k == self.key)
    }

    /// 启动监听线程
    ///
    /// 已经启动过时直接返回 `false`
    pub fn start<F>(self, on_interrupt: F) -> bool
    where
        F: Fn() + Send + 'static,
    {
        if !claim_start() {
            return false;
        }

        let key = self.key;
        let spawned = thread::Builder::new()
            .name("interrupt-monitor".to_string())
            .spawn(move || {
                let result = rdev::listen(move |event| {
                    if self.matches(&event.event_type) {
                        on_interrupt();
                    }
                });
                if let Err(e) = result {
                    warn!("⚠️ 全局按键监听失败: {:?}", e);
                }
            });

        match spawned {
            Ok(_) => {
                info!("⌨️ 按 {:?} 可在当前记录结束后暂停", key);
                true
            }
            Err(e) => {
                warn!("⚠️ 无法启动按键监听线程: {}", e);
                release_start();
                false
            }
        }
    }
}

/// 占用“已启动”标记；已被占用时返回 `false`
fn claim_start() -> bool {
    !STARTED.swap(true, Ordering::SeqCst)
}

/// 线程没能启动时归还标记，之后还可以再次启动
fn release_start() {
    STARTED.store(false, Ordering::SeqCst);
}
