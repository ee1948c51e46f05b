//! 文本匹配策略 - 业务能力层
//!
//! 读取当前可见的文本，按关键字做大小写不敏感的子串匹配

use crate::infrastructure::{clipboard, window};
use crate::services::error_detector::DetectionStrategy;
use tracing::debug;

/// 文本来源
pub trait TextSource: Send + Sync {
    /// 读取文本；能力不可用时返回 `None`
    fn read_text(&self) -> Option<String>;
}

/// 所有顶层窗口的标题（每行一个）
#[derive(Debug, Default, Clone, Copy)]
pub struct WindowTitles;

impl TextSource for WindowTitles {
    fn read_text(&self) -> Option<String> {
        match window::list_windows() {
            Ok(windows) => Some(
                windows
                    .into_iter()
                    .map(|w| w.title)
                    .collect::<Vec<_>>()
                    .join("\n"),
            ),
            Err(e) => {
                debug!("无法读取窗口标题: {}", e);
                None
            }
        }
    }
}

/// 剪贴板中的文本（只读，不发送任何按键）
#[derive(Debug, Default, Clone, Copy)]
pub struct ClipboardText;

impl TextSource for ClipboardText {
    fn read_text(&self) -> Option<String> {
        clipboard::read_text()
            .map_err(|e| debug!("无法读取剪贴板: {}", e))
            .ok()
    }
}

/// 关键字匹配策略
pub struct TextMatchStrategy {
    /// (原始关键字, 小写形式)
    keywords: Vec<(String, String)>,
    source: Box<dyn TextSource>,
}

impl TextMatchStrategy {
    pub fn new(keywords: &[String], source: Box<dyn TextSource>) -> Self {
        let keywords = keywords
            .iter()
            .map(|k| k.trim())
            .filter(|k| !k.is_empty())
            .map(|k| (k.to_string(), k.to_lowercase()))
            .collect();
        Self { keywords, source }
    }
}

impl DetectionStrategy for TextMatchStrategy {
    fn name(&self) -> &str {
        "text"
    }

    fn detect(&self) -> Option<String> {
        if self.keywords.is_empty() {
            return None;
        }
        let text = self.source.read_text()?.to_lowercase();
        self.keywords
            .iter()
            .find(|(_, lower)| text.contains(lower.as_str()))
            .map(|(original, _)| original.clone())
    }
}
