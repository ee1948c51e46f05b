//! 提交动作 - 业务能力层
//!
//! 一次提交 = 复制值 → 粘贴 → 等待 → 回车 → 等待。
//! 任何一步失败都以 `ActionError` 返回，调用方负责暂停。

use crate::error::ActionError;
use crate::infrastructure::{clipboard, keyboard};
use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;

/// 剪贴板写入后等待系统同步的时间
const CLIPBOARD_SETTLE: Duration = Duration::from_millis(50);

/// 向当前焦点窗口提交一个值
#[async_trait]
pub trait ActionExecutor: Send + Sync {
    async fn submit(&self, value: &str, settle_delay: Duration) -> Result<(), ActionError>;
}

/// 剪贴板 + 键盘注入
#[derive(Debug, Default, Clone, Copy)]
pub struct PasteSubmit;

impl PasteSubmit {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ActionExecutor for PasteSubmit {
    async fn submit(&self, value: &str, settle_delay: Duration) -> Result<(), ActionError> {
        let owned = value.to_string();
        run_blocking(move || clipboard::copy_text(&owned)).await?;
        tokio::time::sleep(CLIPBOARD_SETTLE).await;

        run_blocking(keyboard::paste).await?;
        tokio::time::sleep(settle_delay).await;

        run_blocking(keyboard::press_enter).await?;
        tokio::time::sleep(settle_delay).await;

        debug!("已提交: {}", value);
        Ok(())
    }
}

/// 按键注入与剪贴板都是阻塞调用，放到阻塞线程池执行
async fn run_blocking<F>(f: F) -> Result<(), ActionError>
where
    F: FnOnce() -> Result<(), ActionError> + Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| ActionError::Task(e.to_string()))?
}
