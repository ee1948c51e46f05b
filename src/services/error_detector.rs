//! 错误检测服务 - 业务能力层
//!
//! 按固定优先级依次尝试各检测策略，第一个命中的策略给出结果。
//! 检测只读屏幕，不修改运行状态，暂停由调用方决定。

use crate::config::{Config, TextSourceKind};
use crate::infrastructure::PrimaryScreen;
use crate::models::DetectionResult;
use crate::services::image_match::ImageMatchStrategy;
use crate::services::signature_cache::SignatureCache;
use crate::services::text_match::{ClipboardText, TextMatchStrategy, TextSource, WindowTitles};
use tracing::debug;

/// 单一检测策略
///
/// 策略自己处理能力不可用的情况，永远不向调用方抛错
pub trait DetectionStrategy: Send + Sync {
    fn name(&self) -> &str;

    /// 命中时返回错误特征名
    fn detect(&self) -> Option<String>;
}

/// “当前屏幕上是否有错误”
pub trait ErrorScan: Send + Sync {
    fn scan(&self) -> DetectionResult;
}

/// 错误检测器：策略链
#[derive(Default)]
pub struct ErrorDetector {
    strategies: Vec<Box<dyn DetectionStrategy>>,
}

impl ErrorDetector {
    pub fn new() -> Self {
        Self::default()
    }

    /// 追加一个策略（优先级低于已有策略）
    pub fn with_strategy(mut self, strategy: impl DetectionStrategy + 'static) -> Self {
        self.strategies.push(Box::new(strategy));
        self
    }

    /// 按缓存内容组装默认策略链：文本匹配 → 图像匹配
    pub fn from_cache(cache: &SignatureCache, config: &Config) -> Self {
        let mut detector = Self::new();

        let keywords = cache.keywords();
        if !keywords.is_empty() {
            let source: Box<dyn TextSource> = match config.text_source {
                TextSourceKind::WindowTitles => Box::new(WindowTitles),
                TextSourceKind::Clipboard => Box::new(ClipboardText),
            };
            detector = detector.with_strategy(TextMatchStrategy::new(&keywords, source));
        }

        let images = cache.images();
        if !images.is_empty() {
            detector = detector.with_strategy(ImageMatchStrategy::new(
                images,
                config.image_threshold,
                Box::new(PrimaryScreen),
            ));
        }

        debug!("错误检测策略: {:?}", detector.strategy_names());
        detector
    }

    pub fn strategy_names(&self) -> Vec<&str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }
}

impl ErrorScan for ErrorDetector {
    fn scan(&self) -> DetectionResult {
        for strategy in &self.strategies {
            if let Some(name) = strategy.detect() {
                debug!("策略 {} 命中: {}", strategy.name(), name);
                return DetectionResult::found(name);
            }
        }
        DetectionResult::clear()
    }
}
