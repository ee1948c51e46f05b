//! 键盘注入 - 基础设施层
//!
//! 基于 rdev 的事件模拟；两个事件之间需要短暂停顿，
//! 否则部分平台会丢事件

use crate::error::ActionError;
use rdev::{simulate, EventType, Key};
use std::thread;
use std::time::Duration;

const EVENT_GAP: Duration = Duration::from_millis(20);

#[cfg(target_os = "macos")]
const PASTE_MODIFIER: Key = Key::MetaLeft;
#[cfg(not(target_os = "macos"))]
const PASTE_MODIFIER: Key = Key::ControlLeft;

fn send(event: &EventType) -> Result<(), ActionError> {
    simulate(event).map_err(|e| ActionError::Keyboard(format!("{:?}: {:?}", event, e)))?;
    thread::sleep(EVENT_GAP);
    Ok(())
}

/// 按下并释放组合键（按顺序按下，逆序释放）
pub fn press_combo(keys: &[Key]) -> Result<(), ActionError> {
    for key in keys {
        send(&EventType::KeyPress(*key))?;
    }
    for key in keys.iter().rev() {
        send(&EventType::KeyRelease(*key))?;
    }
    Ok(())
}

/// 粘贴（Ctrl+V / Cmd+V）
pub fn paste() -> Result<(), ActionError> {
    press_combo(&[PASTE_MODIFIER, Key::KeyV])
}

/// 回车提交
pub fn press_enter() -> Result<(), ActionError> {
    press_combo(&[Key::Return])
}

/// 解析中断按键名（大小写不敏感）
pub fn parse_key(name: &str) -> Option<Key> {
    let key = match name.trim().to_ascii_lowercase().as_str() {
        "esc" | "escape" => Key::Escape,
        "pause" => Key::Pause,
        "scrolllock" | "scroll_lock" => Key::ScrollLock,
        "f1" => Key::F1,
        "f2" => Key::F2,
        "f3" => Key::F3,
        "f4" => Key::F4,
        "f5" => Key::F5,
        "f6" => Key::F6,
        "f7" => Key::F7,
        "f8" => Key::F8,
        "f9" => Key::F9,
        "f10" => Key::F10,
        "f11" => Key::F11,
        "f12" => Key::F12,
        _ => return None,
    };
    Some(key)
}
