//! 剪贴板 - 基础设施层

use crate::error::ActionError;
use arboard::Clipboard;

/// 把文本写入系统剪贴板
///
/// 每次调用都打开新的句柄，不跨线程持有 `Clipboard`
pub fn copy_text(value: &str) -> Result<(), ActionError> {
    let mut clipboard = Clipboard::new().map_err(|e| ActionError::Clipboard(e.to_string()))?;
    clipboard
        .set_text(value.to_owned())
        .map_err(|e| ActionError::Clipboard(e.to_string()))
}

/// 读取系统剪贴板中的文本
pub fn read_text() -> Result<String, ActionError> {
    let mut clipboard = Clipboard::new().map_err(|e| ActionError::Clipboard(e.to_string()))?;
    clipboard
        .get_text()
        .map_err(|e| ActionError::Clipboard(e.to_string()))
}
