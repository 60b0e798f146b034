//! 光栅辅助操作
//!
//! 在 `image` 之上补充越界安全的裁剪、粘贴、重采样和旋转。
//! 越界部分一律视为透明，粘贴时自动裁剪到目标画布。

use crate::math::{PixelRect, Vector2, Vector2Ext};
use image::imageops::{self, FilterType};
use image::{Rgba, RgbaImage};
use serde::{Deserialize, Serialize};

/// 重采样滤波器
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Resample {
    Nearest,
    Bilinear,
    #[default]
    Bicubic,
    Lanczos,
}

impl Resample {
    pub fn filter(self) -> FilterType {
        match self {
            Resample::Nearest => FilterType::Nearest,
            Resample::Bilinear => FilterType::Triangle,
            Resample::Bicubic => FilterType::CatmullRom,
            Resample::Lanczos => FilterType::Lanczos3,
        }
    }
}

/// 按矩形裁剪，画布外区域填充透明
pub fn crop_padded(image: &RgbaImage, rect: PixelRect) -> RgbaImage {
    let mut out = RgbaImage::new(rect.width, rect.height);
    let visible = rect.clamp_to(image.width(), image.height());
    if visible.is_empty() {
        return out;
    }

    let part = imageops::crop_imm(
        image,
        visible.x as u32,
        visible.y as u32,
        visible.width,
        visible.height,
    )
    .to_image();
    imageops::replace(&mut out, &part, visible.x - rect.x, visible.y - rect.y);
    out
}

/// 不混合地覆盖粘贴，超出目标的部分被裁掉
pub fn paste(target: &mut RgbaImage, source: &RgbaImage, x: i64, y: i64) {
    imageops::replace(target, source, x, y);
}

/// 尺寸不同时重采样，相同时直接克隆
pub fn resize_to(image: &RgbaImage, width: u32, height: u32, resample: Resample) -> RgbaImage {
    if image.dimensions() == (width, height) {
        return image.clone();
    }
    imageops::resize(image, width, height, resample.filter())
}

/// 以 `source` 的 alpha 为蒙版叠加到 `target`（各通道线性插值）
pub fn paste_masked(target: &mut RgbaImage, source: &RgbaImage, x: i64, y: i64) {
    for (sx, sy, pixel) in source.enumerate_pixels() {
        let tx = x + sx as i64;
        let ty = y + sy as i64;
        if tx < 0 || ty < 0 || tx >= target.width() as i64 || ty >= target.height() as i64 {
            continue;
        }
        let alpha = pixel[3] as u32;
        let dst = target.get_pixel_mut(tx as u32, ty as u32);
        for c in 0..4 {
            let blended = (pixel[c] as u32 * alpha + dst[c] as u32 * (255 - alpha) + 127) / 255;
            dst[c] = blended as u8;
        }
    }
}

/// 绕 `center` 旋转 `degrees` 度（Y 轴向上时逆时针），最近邻采样，尺寸不变
pub fn rotate_about(image: &RgbaImage, center: Vector2, degrees: f64) -> RgbaImage {
    if degrees == 0.0 {
        return image.clone();
    }

    let rad = degrees.to_radians();
    let (w, h) = image.dimensions();
    let mut out = RgbaImage::new(w, h);
    for (x, y, dst) in out.enumerate_pixels_mut() {
        // 逆映射：目标像素中心旋转回源图像
        let p = Vector2::new(x as f64 + 0.5, y as f64 + 0.5) - center;
        let src = p.rotated(-rad) + center;
        let (sx, sy) = (src.x.floor(), src.y.floor());
        if sx >= 0.0 && sy >= 0.0 && sx < w as f64 && sy < h as f64 {
            *dst = *image.get_pixel(sx as u32, sy as u32);
        } else {
            *dst = Rgba([0, 0, 0, 0]);
        }
    }
    out
}
