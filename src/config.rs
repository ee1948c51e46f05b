use std::str::FromStr;

/// 未填写或填写非法时使用的默认节奏（秒）
pub const DEFAULT_DELAY_SECONDS: f64 = 0.2;

/// 视觉错误被人工处理后的策略
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum VisualErrorPolicy {
    /// 视为已处理，继续下一条（默认，避免重复提交）
    #[default]
    Skip,
    /// 重新提交同一条记录
    Retry,
}

impl FromStr for VisualErrorPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "skip" => Ok(VisualErrorPolicy::Skip),
            "retry" => Ok(VisualErrorPolicy::Retry),
            other => Err(format!("未知的错误处理策略: {}", other)),
        }
    }
}

/// 文本匹配策略读取的文本来源
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum TextSourceKind {
    /// 顶层窗口标题
    #[default]
    WindowTitles,
    /// 剪贴板内容
    Clipboard,
}

impl FromStr for TextSourceKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "titles" | "window_titles" => Ok(TextSourceKind::WindowTitles),
            "clipboard" => Ok(TextSourceKind::Clipboard),
            other => Err(format!("未知的文本来源: {}", other)),
        }
    }
}

/// 程序配置文件
#[derive(Clone, Debug)]
pub struct Config {
    /// 待录入的表格文件（TOML）
    pub data_file: String,
    /// 城市过滤（逗号分隔，空表示不过滤）
    pub city_filter: String,
    /// Backlog 过滤（整数，空表示不过滤）
    pub backlog_filter: String,
    /// 粘贴与回车之间的等待时间（秒）
    pub delay_seconds: f64,
    // --- 错误雷达 ---
    pub radar_window_ms: u64,
    pub radar_interval_ms: u64,
    /// 恢复后等待错误弹窗消失的最长时间（秒）
    pub clear_wait_secs: f64,
    /// 暂停期间检查恢复 / 取消的间隔
    pub pause_poll_ms: u64,
    pub focus_retries: u32,
    /// 图像匹配的相似度阈值 (0.0 ~ 1.0)
    pub image_threshold: f32,
    /// 参考图像所在目录
    pub resource_dir: String,
    pub error_images: Vec<String>,
    pub error_keywords: Vec<String>,
    pub text_source: TextSourceKind,
    // --- 窗口 ---
    /// 目标浏览器窗口标题（按顺序尝试）
    pub target_titles: Vec<String>,
    /// 数据表格所在窗口标题（可选）
    pub data_view_title: Option<String>,
    /// 结束或取消时切回的窗口标题（可选）
    pub home_window_title: Option<String>,
    /// 全局暂停键
    pub interrupt_key: String,
    pub visual_error_policy: VisualErrorPolicy,
    /// 是否显示详细日志
    pub verbose_logging: bool,
    /// 暂停 / 结束时是否响铃提醒操作员
    pub sound_alerts: bool,
    /// 输出日志文件
    pub output_log_file: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_file: "atribuicao.toml".to_string(),
            city_filter: String::new(),
            backlog_filter: String::new(),
            delay_seconds: DEFAULT_DELAY_SECONDS,
            radar_window_ms: 500,
            radar_interval_ms: 100,
            clear_wait_secs: 5.0,
            pause_poll_ms: 500,
            focus_retries: 3,
            image_threshold: 0.9,
            resource_dir: ".".to_string(),
            error_images: vec!["erro_baixada.png".to_string()],
            error_keywords: Vec::new(),
            text_source: TextSourceKind::WindowTitles,
            target_titles: vec![
                "Opera".to_string(),
                "Google Chrome".to_string(),
                "Microsoft Edge".to_string(),
            ],
            data_view_title: None,
            home_window_title: None,
            interrupt_key: "Escape".to_string(),
            visual_error_policy: VisualErrorPolicy::Skip,
            verbose_logging: false,
            sound_alerts: true,
            output_log_file: "output.txt".to_string(),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let default = Self::default();
        Self {
            data_file: std::env::var("DATA_FILE").unwrap_or(default.data_file),
            city_filter: std::env::var("CITY_FILTER").unwrap_or(default.city_filter),
            backlog_filter: std::env::var("BACKLOG_FILTER").unwrap_or(default.backlog_filter),
            delay_seconds: std::env::var("DELAY_SECONDS").map(|v| parse_delay(&v)).unwrap_or(default.delay_seconds),
            radar_window_ms: std::env::var("RADAR_WINDOW_MS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.radar_window_ms),
            radar_interval_ms: std::env::var("RADAR_INTERVAL_MS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.radar_interval_ms),
            clear_wait_secs: std::env::var("CLEAR_WAIT_SECS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.clear_wait_secs),
            pause_poll_ms: std::env::var("PAUSE_POLL_MS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.pause_poll_ms),
            focus_retries: std::env::var("FOCUS_RETRIES").ok().and_then(|v| v.parse().ok()).unwrap_or(default.focus_retries),
            image_threshold: std::env::var("IMAGE_THRESHOLD").ok().and_then(|v| v.parse().ok()).unwrap_or(default.image_threshold),
            resource_dir: std::env::var("RESOURCE_DIR").unwrap_or(default.resource_dir),
            error_images: std::env::var("ERROR_IMAGES").map(|v| split_list(&v)).unwrap_or(default.error_images),
            error_keywords: std::env::var("ERROR_KEYWORDS").map(|v| split_list(&v)).unwrap_or(default.error_keywords),
            text_source: std::env::var("TEXT_SOURCE").ok().and_then(|v| v.parse().ok()).unwrap_or(default.text_source),
            target_titles: std::env::var("TARGET_TITLES").map(|v| split_list(&v)).unwrap_or(default.target_titles),
            data_view_title: std::env::var("DATA_VIEW_TITLE").ok().filter(|v| !v.trim().is_empty()),
            home_window_title: std::env::var("HOME_WINDOW_TITLE").ok().filter(|v| !v.trim().is_empty()),
            interrupt_key: std::env::var("INTERRUPT_KEY").unwrap_or(default.interrupt_key),
            visual_error_policy: std::env::var("VISUAL_ERROR_POLICY").ok().and_then(|v| v.parse().ok()).unwrap_or(default.visual_error_policy),
            verbose_logging: std::env::var("VERBOSE_LOGGING").ok().and_then(|v| v.parse().ok()).unwrap_or(default.verbose_logging),
            sound_alerts: std::env::var("SOUND_ALERTS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.sound_alerts),
            output_log_file: std::env::var("OUTPUT_LOG_FILE").unwrap_or(default.output_log_file),
        }
    }
}

/// 解析操作员输入的节奏（秒）
///
/// 支持逗号作为小数点；空值、负数或无法解析时返回默认值
pub fn parse_delay(input: &str) -> f64 {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return DEFAULT_DELAY_SECONDS;
    }
    match trimmed.replace(',', ".").parse::<f64>() {
        Ok(value) if value >= 0.0 && value.is_finite() => value,
        _ => DEFAULT_DELAY_SECONDS,
    }
}

/// 逗号分隔列表，去掉空项
fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
