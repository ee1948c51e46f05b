//! 窗口枚举与激活 - 基础设施层

use crate::error::ScreenError;
use tracing::debug;

/// 顶层窗口的快照
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowInfo {
    pub id: u32,
    pub title: String,
    pub app_name: String,
}

/// 列出所有带标题的顶层窗口
pub fn list_windows() -> Result<Vec<WindowInfo>, ScreenError> {
    let windows = xcap::Window::all().map_err(|e| ScreenError::Windows(e.to_string()))?;

    let mut result = Vec::new();
    for window in windows {
        let title = match window.title() {
            Ok(title) if !title.trim().is_empty() => title,
            _ => continue,
        };
        let Ok(id) = window.id() else {
            continue;
        };
        result.push(WindowInfo {
            id,
            title,
            app_name: window.app_name().unwrap_or_default(),
        });
    }
    Ok(result)
}

/// 按标题子串（大小写不敏感）查找第一个窗口
pub fn find_by_title(windows: &[WindowInfo], title_substring: &str) -> Option<WindowInfo> {
    let needle = title_substring.to_lowercase();
    windows
        .iter()
        .find(|w| w.title.to_lowercase().contains(&needle))
        .cloned()
}

/// 将窗口置前；最小化的窗口先还原
#[cfg(target_os = "windows")]
pub fn activate(window: &WindowInfo) -> bool {
    use windows::Win32::Foundation::HWND;
    use windows::Win32::UI::WindowsAndMessaging::{
        BringWindowToTop, IsIconic, SetForegroundWindow, ShowWindow, SW_RESTORE,
    };

    unsafe {
        let hwnd = HWND(window.id as usize as *mut core::ffi::c_void);

        if IsIconic(hwnd).as_bool() {
            debug!("窗口已最小化，正在还原: {}", window.title);
            let _ = ShowWindow(hwnd, SW_RESTORE);
        }

        let _ = BringWindowToTop(hwnd);

        let ok = SetForegroundWindow(hwnd).as_bool();
        if !ok {
            debug!("SetForegroundWindow 失败: {}", window.title);
        }
        ok
    }
}

/// 将窗口置前（X11，依赖 wmctrl）
#[cfg(target_os = "linux")]
pub fn activate(window: &WindowInfo) -> bool {
    let status = std::process::Command::new("wmctrl")
        .args(["-i", "-a", &format!("0x{:08x}", window.id)])
        .status();
    match status {
        Ok(status) => status.success(),
        Err(e) => {
            debug!("wmctrl 不可用: {}", e);
            false
        }
    }
}

/// 将窗口所属应用置前
#[cfg(target_os = "macos")]
pub fn activate(window: &WindowInfo) -> bool {
    let script = format!(
        "tell application \"{}\" to activate",
        window.app_name.replace('"', "")
    );
    match std::process::Command::new("osascript").args(["-e", &script]).status() {
        Ok(status) => status.success(),
        Err(e) => {
            debug!("osascript 不可用: {}", e);
            false
        }
    }
}

#[cfg(not(any(target_os = "windows", target_os = "linux", target_os = "macos")))]
pub fn activate(window: &WindowInfo) -> bool {
    debug!("当前平台不支持窗口激活: {}", window.title);
    false
}
