//! 图像匹配策略 - 业务能力层
//!
//! 在灰度截图中查找参考图像，算法为零均值归一化互相关（NCC），
//! 先在缩小的图像上粗搜，再在原图候选点附近精搜；
//! 粗搜漏掉时（细线条、噪点被缩放抹平）再做一次原图逐像素精确匹配

use crate::infrastructure::ScreenSource;
use crate::services::error_detector::DetectionStrategy;
use image::imageops::{self, FilterType};
use image::GrayImage;
use tracing::debug;

/// 粗搜时模板短边至少保留的像素数
const MIN_COARSE_SIDE: u32 = 12;
const MAX_FACTOR: u32 = 4;
/// 粗搜保留的候选点数（按得分取前几名，不设阈值）
const MAX_CANDIDATES: usize = 8;

/// 匹配位置（左上角）与得分
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchLocation {
    pub x: u32,
    pub y: u32,
    pub score: f32,
}

/// 图像匹配策略
///
/// 截图失败时视为“未发现”，不向调用方抛错
pub struct ImageMatchStrategy {
    templates: Vec<(String, GrayImage)>,
    threshold: f32,
    screen: Box<dyn ScreenSource>,
}

impl ImageMatchStrategy {
    pub fn new(
        templates: Vec<(String, GrayImage)>,
        threshold: f32,
        screen: Box<dyn ScreenSource>,
    ) -> Self {
        Self {
            templates,
            threshold: threshold.clamp(0.0, 1.0),
            screen,
        }
    }
}

impl DetectionStrategy for ImageMatchStrategy {
    fn name(&self) -> &str {
        "image"
    }

    fn detect(&self) -> Option<String> {
        if self.templates.is_empty() {
            return None;
        }
        let screen = match self.screen.capture_gray() {
            Ok(screen) => screen,
            Err(e) => {
                debug!("截图不可用，跳过图像匹配: {}", e);
                return None;
            }
        };

        self.templates.iter().find_map(|(name, template)| {
            locate(&screen, template, self.threshold).map(|m| {
                debug!("图像 {} 匹配于 ({}, {}) 得分 {:.3}", name, m.x, m.y, m.score);
                name.clone()
            })
        })
    }
}

/// 在 `screen` 中查找 `template`，得分达到 `threshold` 时返回最佳位置
///
/// 模板无方差（纯色）时退化为逐像素精确匹配；模板大于屏幕时返回 `None`。
/// 粗搜候选在原图上都达不到阈值时，回退到原图精确匹配，原样出现在屏幕上的模板总能找到
pub fn locate(screen: &GrayImage, template: &GrayImage, threshold: f32) -> Option<MatchLocation> {
    let (sw, sh) = screen.dimensions();
    let (tw, th) = template.dimensions();
    if tw == 0 || th == 0 || tw > sw || th > sh {
        return None;
    }

    let prepared = Prepared::new(template);
    if prepared.is_flat() {
        return locate_exact(screen, template);
    }

    let full = Region::full(sw, sh, tw, th);
    let factor = pyramid_factor(tw, th);
    if factor == 1 {
        return best_in(screen, &prepared, full, threshold);
    }

    let small_screen = imageops::resize(screen, sw / factor, sh / factor, FilterType::Triangle);
    let small_template = imageops::resize(template, tw / factor, th / factor, FilterType::Triangle);
    let small_prepared = Prepared::new(&small_template);
    if small_prepared.is_flat() {
        return best_in(screen, &prepared, full, threshold);
    }

    let coarse_region = Region::full(
        small_screen.width(),
        small_screen.height(),
        small_template.width(),
        small_template.height(),
    );
    let candidates = top_candidates(&small_screen, &small_prepared, coarse_region, MAX_CANDIDATES);

    candidates
        .into_iter()
        .filter_map(|c| {
            let region = full.around(c.x * factor, c.y * factor, factor);
            best_in(screen, &prepared, region, threshold)
        })
        .max_by(|a, b| a.score.total_cmp(&b.score))
        .or_else(|| {
            debug!("粗搜未命中，回退到原图精确匹配");
            locate_exact(screen, template)
        })
}

fn pyramid_factor(tw: u32, th: u32) -> u32 {
    (tw.min(th) / MIN_COARSE_SIDE).clamp(1, MAX_FACTOR)
}

/// 模板的零均值像素与方差
struct Prepared {
    width: usize,
    height: usize,
    zero_mean: Vec<f32>,
    variance: f64,
}

impl Prepared {
    fn new(image: &GrayImage) -> Self {
        let raw = image.as_raw();
        let n = raw.len() as f64;
        let mean = raw.iter().map(|&p| p as f64).sum::<f64>() / n;
        let zero_mean: Vec<f32> = raw.iter().map(|&p| (p as f64 - mean) as f32).collect();
        let variance = zero_mean.iter().map(|&v| (v as f64) * (v as f64)).sum();
        Self {
            width: image.width() as usize,
            height: image.height() as usize,
            zero_mean,
            variance,
        }
    }

    fn is_flat(&self) -> bool {
        self.variance <= f64::EPSILON
    }
}

/// 左上角坐标的搜索范围（闭区间）
#[derive(Debug, Clone, Copy)]
struct Region {
    x0: u32,
    y0: u32,
    x1: u32,
    y1: u32,
}

impl Region {
    fn full(sw: u32, sh: u32, tw: u32, th: u32) -> Self {
        Self {
            x0: 0,
            y0: 0,
            x1: sw - tw,
            y1: sh - th,
        }
    }

    fn around(&self, x: u32, y: u32, radius: u32) -> Self {
        Self {
            x0: x.saturating_sub(radius).max(self.x0),
            y0: y.saturating_sub(radius).max(self.y0),
            x1: (x + radius).min(self.x1),
            y1: (y + radius).min(self.y1),
        }
    }
}

/// 积分图：快速求任意矩形的像素和与平方和
struct Integral {
    stride: usize,
    sum: Vec<f64>,
    sq: Vec<f64>,
}

impl Integral {
    fn new(image: &GrayImage) -> Self {
        let (w, h) = (image.width() as usize, image.height() as usize);
        let stride = w + 1;
        let mut sum = vec![0.0; stride * (h + 1)];
        let mut sq = vec![0.0; stride * (h + 1)];
        let raw = image.as_raw();
        for y in 0..h {
            let (mut row_sum, mut row_sq) = (0.0, 0.0);
            for x in 0..w {
                let v = raw[y * w + x] as f64;
                row_sum += v;
                row_sq += v * v;
                let idx = (y + 1) * stride + x + 1;
                sum[idx] = sum[idx - stride] + row_sum;
                sq[idx] = sq[idx - stride] + row_sq;
            }
        }
        Self { stride, sum, sq }
    }

    fn rect(&self, x: usize, y: usize, w: usize, h: usize) -> (f64, f64) {
        let a = y * self.stride + x;
        let b = a + w;
        let c = (y + h) * self.stride + x;
        let d = c + w;
        (
            self.sum[d] - self.sum[b] - self.sum[c] + self.sum[a],
            self.sq[d] - self.sq[b] - self.sq[c] + self.sq[a],
        )
    }
}

fn score_at(screen: &GrayImage, integral: &Integral, tpl: &Prepared, x: usize, y: usize) -> f32 {
    let n = (tpl.width * tpl.height) as f64;
    let (s, sq) = integral.rect(x, y, tpl.width, tpl.height);
    let var_screen = sq - s * s / n;
    if var_screen <= 1e-6 {
        return 0.0;
    }

    let raw = screen.as_raw();
    let sw = screen.width() as usize;
    let mut cross = 0.0f64;
    for j in 0..tpl.height {
        let start = (y + j) * sw + x;
        let row = &raw[start..start + tpl.width];
        let trow = &tpl.zero_mean[j * tpl.width..(j + 1) * tpl.width];
        let acc: f32 = row.iter().zip(trow).map(|(&p, &t)| p as f32 * t).sum();
        cross += acc as f64;
    }

    (cross / (var_screen * tpl.variance).sqrt()) as f32
}

fn scan(screen: &GrayImage, tpl: &Prepared, region: Region, min_score: f32) -> Vec<MatchLocation> {
    let integral = Integral::new(screen);
    let mut hits = Vec::new();
    for y in region.y0..=region.y1 {
        for x in region.x0..=region.x1 {
            let score = score_at(screen, &integral, tpl, x as usize, y as usize);
            if score >= min_score {
                hits.push(MatchLocation { x, y, score });
            }
        }
    }
    hits
}

/// 得分最高的 `k` 个位置，按得分降序
fn top_candidates(screen: &GrayImage, tpl: &Prepared, region: Region, k: usize) -> Vec<MatchLocation> {
    let integral = Integral::new(screen);
    let mut best: Vec<MatchLocation> = Vec::with_capacity(k + 1);
    for y in region.y0..=region.y1 {
        for x in region.x0..=region.x1 {
            let score = score_at(screen, &integral, tpl, x as usize, y as usize);
            if best.len() == k && best.last().is_some_and(|m| m.score >= score) {
                continue;
            }
            let pos = best.partition_point(|m| m.score >= score);
            best.insert(pos, MatchLocation { x, y, score });
            best.truncate(k);
        }
    }
    best
}

fn best_in(screen: &GrayImage, tpl: &Prepared, region: Region, threshold: f32) -> Option<MatchLocation> {
    scan(screen, tpl, region, threshold)
        .into_iter()
        .max_by(|a, b| a.score.total_cmp(&b.score))
}

fn locate_exact(screen: &GrayImage, template: &GrayImage) -> Option<MatchLocation> {
    let (sw, sh) = screen.dimensions();
    let (tw, th) = template.dimensions();
    for y in 0..=(sh - th) {
        for x in 0..=(sw - tw) {
            let equal = (0..th).all(|j| (0..tw).all(|i| screen.get_pixel(x + i, y + j) == template.get_pixel(i, j)));
            if equal {
                return Some(MatchLocation { x, y, score: 1.0 });
            }
        }
    }
    None
}
