//! 错误特征缓存 - 业务能力层
//!
//! 进程内只加载一次参考图像与关键字，之后所有运行复用

use crate::config::Config;
use crate::infrastructure::screen::load_gray;
use crate::models::{ErrorSignature, SignaturePayload};
use image::GrayImage;
use std::path::Path;
use std::sync::{Arc, OnceLock};
use tracing::{info, warn};

static SHARED: OnceLock<Arc<SignatureCache>> = OnceLock::new();

/// 错误特征缓存
#[derive(Debug, Default)]
pub struct SignatureCache {
    signatures: Vec<ErrorSignature>,
}

impl SignatureCache {
    pub fn new(signatures: Vec<ErrorSignature>) -> Self {
        Self { signatures }
    }

    /// 从资源目录加载参考图像，并登记关键字
    ///
    /// 找不到或无法解码的图像只记录警告，不中断启动
    pub fn load(resource_dir: &Path, image_names: &[String], keywords: &[String]) -> Self {
        info!("正在加载错误特征...");
        let mut signatures = Vec::new();

        for name in image_names {
            let path = resource_dir.join(name);
            if !path.exists() {
                warn!("⚠️ 严重: 找不到参考图像: {}", path.display());
                continue;
            }
            match load_gray(&path) {
                Ok(image) => signatures.push(ErrorSignature::image(name.clone(), image)),
                Err(e) => warn!("⚠️ 参考图像加载失败: {}", e),
            }
        }
        let image_count = signatures.len();

        signatures.extend(
            keywords
                .iter()
                .filter(|k| !k.trim().is_empty())
                .map(|k| ErrorSignature::keyword(k.trim())),
        );

        if image_count > 0 {
            info!("✅ {} 个参考图像加载成功", image_count);
        }
        info!("✓ 共 {} 个错误特征", signatures.len());

        Self { signatures }
    }

    /// 进程级共享缓存，第一次调用时加载
    pub fn shared(config: &Config) -> Arc<SignatureCache> {
        SHARED
            .get_or_init(|| {
                Arc::new(Self::load(
                    Path::new(&config.resource_dir),
                    &config.error_images,
                    &config.error_keywords,
                ))
            })
            .clone()
    }

    pub fn images(&self) -> Vec<(String, GrayImage)> {
        self.signatures
            .iter()
            .filter_map(|s| match &s.payload {
                SignaturePayload::Image(img) => Some((s.name.clone(), img.clone())),
                SignaturePayload::Keyword => None,
            })
            .collect()
    }

    pub fn keywords(&self) -> Vec<String> {
        self.signatures
            .iter()
            .filter(|s| matches!(s.payload, SignaturePayload::Keyword))
            .map(|s| s.name.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.signatures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.signatures.is_empty()
    }
}
