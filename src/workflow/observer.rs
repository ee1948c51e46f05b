//! 运行观察者
//!
//! 流程层把状态、进度和日志行推给观察者；观察者不能阻塞工作流程。

use std::fmt;
use std::fs::OpenOptions;
use std::io::{self, Write};
use std::sync::Mutex;
use tracing::{debug, info, warn};

/// 对外展示的运行状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Running,
    Paused,
    Finished,
    Error,
    Stopped,
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            RunStatus::Running => "运行中",
            RunStatus::Paused => "已暂停",
            RunStatus::Finished => "已完成",
            RunStatus::Error => "错误",
            RunStatus::Stopped => "已停止",
        };
        write!(f, "{}", text)
    }
}

/// 运行观察者
pub trait RunObserver: Send + Sync {
    fn on_status(&self, status: RunStatus);
    /// `current` 从 1 开始；0 表示尚未开始
    fn on_progress(&self, current: usize, total: usize);
    fn on_log(&self, line: &str);
}

/// 给日志行加上 `[HH:MM:SS]` 前缀
pub fn timestamped(message: &str) -> String {
    format!("[{}] {}", chrono::Local::now().format("%H:%M:%S"), message)
}

/// 需要操作员注意的状态对应的提示；其余状态返回 `None`
pub fn alert_cue(status: RunStatus) -> Option<&'static str> {
    match status {
        RunStatus::Paused => Some("需要人工处理"),
        RunStatus::Finished => Some("全部记录已处理"),
        RunStatus::Stopped => Some("自动化已停止"),
        RunStatus::Error => Some("自动化出错"),
        RunStatus::Running => None,
    }
}

/// 默认观察者：转发到 tracing，并追加写入运行日志文件
///
/// 需要操作员注意的状态会额外输出 🔔 提示，开启响铃时同时向终端发送 BEL
pub struct LogObserver {
    log_file: Option<Mutex<std::fs::File>>,
    bell: bool,
}

impl LogObserver {
    /// 打开（追加模式）日志文件；打不开时只输出到 tracing
    pub fn new(log_file_path: &str) -> Self {
        let log_file = match OpenOptions::new().create(true).append(true).open(log_file_path) {
            Ok(file) => Some(Mutex::new(file)),
            Err(e) => {
                warn!("⚠️ 无法打开日志文件 {}: {}", log_file_path, e);
                None
            }
        };
        Self {
            log_file,
            bell: false,
        }
    }

    /// 不写文件
    pub fn console_only() -> Self {
        Self {
            log_file: None,
            bell: false,
        }
    }

    pub fn with_bell(mut self, bell: bool) -> Self {
        self.bell = bell;
        self
    }

    fn ring(&self) {
        if !self.bell {
            return;
        }
        let mut stderr = io::stderr();
        if let Err(e) = stderr.write_all(b"\x07").and_then(|_| stderr.flush()) {
            debug!("响铃失败: {}", e);
        }
    }

    fn append(&self, line: &str) {
        let Some(file) = &self.log_file else {
            return;
        };
        let mut file = match file.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if let Err(e) = writeln!(file, "{}", line) {
            debug!("写入日志文件失败: {}", e);
        }
    }
}

impl RunObserver for LogObserver {
    fn on_status(&self, status: RunStatus) {
        info!("📌 状态: {}", status);
        self.append(&timestamped(&format!("状态: {}", status)));
        if let Some(cue) = alert_cue(status) {
            warn!("🔔 {}", cue);
            self.ring();
        }
    }

    fn on_progress(&self, current: usize, total: usize) {
        debug!("进度: {}/{}", current, total);
    }

    fn on_log(&self, line: &str) {
        info!("{}", line);
        self.append(line);
    }
}
