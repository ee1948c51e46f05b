//! 窗口焦点服务 - 业务能力层
//!
//! 把目标窗口置前。失败时返回 `false`，由流程层决定是暂停还是终止。

use crate::config::Config;
use crate::error::ScreenError;
use crate::infrastructure::window;
use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, info, warn};

/// 焦点控制能力
#[async_trait]
pub trait FocusController: Send + Sync {
    /// 将标题包含 `title_substring` 的窗口置前
    async fn focus(&self, title_substring: &str) -> bool;
}

/// 依次尝试多个标题，返回成功置前的那个
pub async fn focus_any(controller: &dyn FocusController, titles: &[String]) -> Option<String> {
    for title in titles {
        if controller.focus(title).await {
            return Some(title.clone());
        }
    }
    None
}

/// 基于系统窗口列表的焦点控制
#[derive(Debug, Clone)]
pub struct WindowFocus {
    max_attempts: u32,
    backoff: Duration,
    settle: Duration,
}

impl WindowFocus {
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            backoff: Duration::from_millis(200),
            settle: Duration::from_millis(200),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.focus_retries)
    }
}

#[async_trait]
impl FocusController for WindowFocus {
    async fn focus(&self, title_substring: &str) -> bool {
        for attempt in 1..=self.max_attempts {
            let title = title_substring.to_string();
            let result = tokio::task::spawn_blocking(move || -> Result<bool, ScreenError> {
                let windows = window::list_windows()?;
                Ok(match window::find_by_title(&windows, &title) {
                    Some(found) => window::activate(&found),
                    None => false,
                })
            })
            .await;

            match result {
                Ok(Ok(true)) => {
                    tokio::time::sleep(self.settle).await;
                    info!("✓ 窗口 '{}' 已置前", title_substring);
                    return true;
                }
                Ok(Ok(false)) => {
                    debug!("窗口 '{}' 未找到或无法激活 (第 {} 次)", title_substring, attempt);
                }
                Ok(Err(e)) => {
                    debug!("读取窗口列表失败 (第 {} 次): {}", attempt, e);
                }
                Err(e) => {
                    warn!("焦点任务异常: {}", e);
                }
            }

            if attempt < self.max_attempts {
                tokio::time::sleep(self.backoff * attempt).await;
            }
        }

        warn!("⚠️ 无法将窗口 '{}' 置前 (尝试 {} 次)", title_substring, self.max_attempts);
        false
    }
}
