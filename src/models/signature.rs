//! 错误特征模型

use image::GrayImage;

/// 错误特征：名称 + 检测载荷，加载后不可变
#[derive(Debug, Clone)]
pub struct ErrorSignature {
    pub name: String,
    pub payload: SignaturePayload,
}

/// 不同检测策略使用的载荷
#[derive(Debug, Clone)]
pub enum SignaturePayload {
    /// 灰度参考图像
    Image(GrayImage),
    /// 关键字，文本即特征名称
    Keyword,
}

impl ErrorSignature {
    pub fn image(name: impl Into<String>, image: GrayImage) -> Self {
        Self {
            name: name.into(),
            payload: SignaturePayload::Image(image),
        }
    }

    pub fn keyword(keyword: impl Into<String>) -> Self {
        Self {
            name: keyword.into(),
            payload: SignaturePayload::Keyword,
        }
    }
}

/// 单次检测结果（不持久化）
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DetectionResult {
    pub found: bool,
    pub signature_name: Option<String>,
}

impl DetectionResult {
    pub fn clear() -> Self {
        Self::default()
    }

    pub fn found(name: impl Into<String>) -> Self {
        Self {
            found: true,
            signature_name: Some(name.into()),
        }
    }

    /// 日志里展示的名称
    pub fn label(&self) -> &str {
        self.signature_name.as_deref().unwrap_or("弹窗")
    }
}
