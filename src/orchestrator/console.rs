//! 操作员控制台
//!
//! 独立线程读取标准输入，把命令转给暂停协调器：
//!
//! | 命令 | 作用 |
//! |------|------|
//! | `p` / `pause` | 在当前记录结束后暂停 |
//! | `r` / `resume [秒]` | 继续，可同时修改节奏 |
//! | `s` / `stop` | 强制停止 |
//! | `d` / `delay <秒>` | 修改节奏 |

use crate::config::parse_delay;
use crate::utils::logging::truncate_text;
use crate::workflow::PauseCoordinator;
use regex::Regex;
use std::io::BufRead;
use std::sync::{Arc, OnceLock};
use std::thread;
use tracing::{info, warn};

/// 控制命令
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ControlCommand {
    Pause,
    Resume(Option<f64>),
    Stop,
    SetDelay(f64),
}

/// 命令行的正则，进程内只编译一次
fn command_regex() -> &'static Regex {
    static COMMAND_RE: OnceLock<Regex> = OnceLock::new();
    COMMAND_RE.get_or_init(|| {
        Regex::new(r"^(?i)\s*(p|pause|r|resume|s|stop|d|delay)(?:\s+(\S+))?\s*$")
            .expect("命令正则是常量，必然可以编译")
    })
}

/// 解析一行输入；无法识别时返回 `None`
pub fn parse_command(line: &str) -> Option<ControlCommand> {
    let caps = command_regex().captures(line)?;
    let argument = caps.get(2).map(|m| m.as_str());

    let command = match caps[1].to_ascii_lowercase().as_str() {
        "p" | "pause" => ControlCommand::Pause,
        "r" | "resume" => ControlCommand::Resume(argument.map(parse_delay)),
        "s" | "stop" => ControlCommand::Stop,
        "d" | "delay" => ControlCommand::SetDelay(parse_delay(argument?)),
        _ => return None,
    };
    Some(command)
}

/// 执行命令
pub fn apply(command: ControlCommand, coordinator: &PauseCoordinator) {
    match command {
        ControlCommand::Pause => {
            coordinator.request_pause("[控制台] 请求暂停，等待当前记录结束");
        }
        ControlCommand::Resume(delay) => {
            if !coordinator.resume(delay) {
                info!("当前未暂停");
            }
        }
        ControlCommand::Stop => coordinator.cancel(),
        ControlCommand::SetDelay(delay) => coordinator.set_delay(delay),
    }
}

/// 启动控制台线程
pub fn spawn(coordinator: Arc<PauseCoordinator>) {
    let spawned = thread::Builder::new()
        .name("console".to_string())
        .spawn(move || {
            let stdin = std::io::stdin();
            for line in stdin.lock().lines() {
                let Ok(line) = line else {
                    break;
                };
                if line.trim().is_empty() {
                    continue;
                }
                match parse_command(&line) {
                    Some(command) => apply(command, &coordinator),
                    None => warn!(
                        "未知命令: {} (可用: p / r [秒] / s / d <秒>)",
                        truncate_text(line.trim(), 40)
                    ),
                }
            }
        });

    if let Err(e) = spawned {
        warn!("⚠️ 无法启动控制台线程: {}", e);
    }
}
