//! 屏幕截图 - 基础设施层

use crate::error::ScreenError;
use image::{DynamicImage, GrayImage};
use std::path::Path;
use tracing::debug;

/// 屏幕来源
///
/// 检测策略只依赖这个能力，测试时可以替换为固定图像
pub trait ScreenSource: Send + Sync {
    /// 截取当前画面并转为灰度图
    fn capture_gray(&self) -> Result<GrayImage, ScreenError>;
}

/// 主显示器
#[derive(Debug, Default, Clone, Copy)]
pub struct PrimaryScreen;

impl ScreenSource for PrimaryScreen {
    fn capture_gray(&self) -> Result<GrayImage, ScreenError> {
        let monitors =
            xcap::Monitor::all().map_err(|e| ScreenError::Capture(format!("无法获取显示器: {e}")))?;

        let mut primary = None;
        for monitor in monitors {
            match monitor.is_primary() {
                Ok(true) => {
                    primary = Some(monitor);
                    break;
                }
                Ok(false) => continue,
                Err(e) => {
                    return Err(ScreenError::Capture(format!("无法判断主显示器: {e}")));
                }
            }
        }
        let primary = primary.ok_or(ScreenError::NoMonitor)?;

        let image = primary
            .capture_image()
            .map_err(|e| ScreenError::Capture(e.to_string()))?;
        debug!("截图完成: {}x{}", image.width(), image.height());

        Ok(DynamicImage::ImageRgba8(image).into_luma8())
    }
}

/// 从磁盘读取参考图像（灰度）
pub fn load_gray(path: &Path) -> Result<GrayImage, ScreenError> {
    image::open(path)
        .map(DynamicImage::into_luma8)
        .map_err(|source| ScreenError::ImageLoad {
            path: path.display().to_string(),
            source,
        })
}
