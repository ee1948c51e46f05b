use std::fmt;

/// 应用程序错误类型
#[derive(Debug)]
pub enum AppError {
    /// 数据源相关错误
    Data(DataError),
    /// 窗口焦点错误
    Focus(FocusError),
    /// 配置错误
    Config(ConfigError),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Data(e) => write!(f, "数据错误: {}", e),
            AppError::Focus(e) => write!(f, "焦点错误: {}", e),
            AppError::Config(e) => write!(f, "配置错误: {}", e),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Data(e) => Some(e),
            AppError::Focus(e) => Some(e),
            AppError::Config(e) => Some(e),
        }
    }
}

/// 数据源相关错误
#[derive(Debug)]
pub enum DataError {
    /// 索引处没有记录（数据源报告的总数与实际不符）
    MissingRecord { index: usize, total: usize },
}

impl fmt::Display for DataError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataError::MissingRecord { index, total } => {
                write!(f, "记录 {} 不存在 (总数: {})", index, total)
            }
        }
    }
}

impl std::error::Error for DataError {}

/// 窗口焦点错误
#[derive(Debug)]
pub enum FocusError {
    /// 找不到或无法激活目标窗口
    Unavailable {
        title: String,
    },
}

impl fmt::Display for FocusError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FocusError::Unavailable { title } => write!(f, "无法将窗口置前: {}", title),
        }
    }
}

impl std::error::Error for FocusError {}

/// 键盘 / 剪贴板操作错误
///
/// 任何一步失败都会触发暂停流程，而不是静默重试
#[derive(Debug, thiserror::Error)]
pub enum ActionError {
    #[error("剪贴板不可用: {0}")]
    Clipboard(String),
    #[error("按键注入失败: {0}")]
    Keyboard(String),
    #[error("后台任务异常: {0}")]
    Task(String),
}

/// 屏幕截图 / 参考图像错误
#[derive(Debug, thiserror::Error)]
pub enum ScreenError {
    #[error("找不到主显示器")]
    NoMonitor,
    #[error("截图失败: {0}")]
    Capture(String),
    #[error("无法读取窗口列表: {0}")]
    Windows(String),
    #[error("无法加载图像 {path}: {source}")]
    ImageLoad {
        path: String,
        #[source]
        source: image::ImageError,
    },
}

/// 配置错误
#[derive(Debug)]
pub enum ConfigError {
    /// 不支持的中断按键名
    UnknownKey { name: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::UnknownKey { name } => write!(f, "不支持的按键: {}", name),
        }
    }
}

impl std::error::Error for ConfigError {}

// ========== 便捷构造函数 ==========

impl AppError {
    /// 创建焦点不可用错误
    pub fn focus_unavailable(title: impl Into<String>) -> Self {
        AppError::Focus(FocusError::Unavailable {
            title: title.into(),
        })
    }

    /// 创建不支持的按键错误
    pub fn unknown_key(name: impl Into<String>) -> Self {
        AppError::Config(ConfigError::UnknownKey { name: name.into() })
    }

    /// 创建记录缺失错误
    pub fn missing_record(index: usize, total: usize) -> Self {
        AppError::Data(DataError::MissingRecord { index, total })
    }
}

// ========== Result 类型别名 ==========

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;
