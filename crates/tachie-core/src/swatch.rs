//! 表情差分与图标
//!
//! 差分和图标是不属于变换树的独立光栅，位置借用参考图层：
//! 表情差分放在 `face` 图层处，图标围绕表情中心从首选区域裁剪。

use crate::layer::{GeometryError, LayerId, LayerTree};
use crate::math::{PixelRect, Vector2, Vector2Ext};
use crate::meta::MetaInfo;
use crate::raster::{self, Resample};
use crate::region::RegionPreference;
use image::RgbaImage;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// 图标种类
pub const ICON_KINDS: [&str; 3] = ["shipyardicon", "squareicon", "herohrzicon"];

/// 带投影的图标种类
pub const SHADOW_KIND: &str = "shipyardicon";

/// 投影的最大不透明度
pub const SHADOW_ALPHA: u8 = 76;

/// 投影水平偏移（按缩放换算前）
pub const SHADOW_OFFSET: f64 = -9.0;

/// 解析差分序号：`0` 或不以 0 开头的十进制数
pub fn parse_face_index(name: &str) -> Option<u32> {
    let valid = name == "0" || (!name.starts_with('0') && !name.is_empty() && name.bytes().all(|b| b.is_ascii_digit()));
    if valid {
        name.parse().ok()
    } else {
        None
    }
}

/// 表情差分
#[derive(Debug, Clone)]
pub struct FaceSwatch {
    pub name: String,
    pub index: u32,

    /// 原始差分
    pub image: RgbaImage,

    /// 导入的全画布图像
    pub full: Option<RgbaImage>,

    /// 裁剪后待写回的图像
    pub replacement: Option<RgbaImage>,

    pub source_path: Option<PathBuf>,
}

impl FaceSwatch {
    /// 名称不是合法序号时返回 `None`
    pub fn new(name: impl Into<String>, image: RgbaImage) -> Option<Self> {
        let name = name.into();
        let index = parse_face_index(&name)?;
        Some(Self {
            name,
            index,
            image,
            full: None,
            replacement: None,
            source_path: None,
        })
    }

    pub fn is_modified(&self) -> bool {
        self.replacement.is_some()
    }
}

/// 图标
#[derive(Debug, Clone)]
pub struct IconSwatch {
    pub kind: String,
    pub image: RgbaImage,
    pub replacement: Option<RgbaImage>,
    pub source_path: Option<PathBuf>,
}

impl IconSwatch {
    pub fn new(kind: impl Into<String>, image: RgbaImage) -> Self {
        Self {
            kind: kind.into(),
            image,
            replacement: None,
            source_path: None,
        }
    }

    pub fn is_modified(&self) -> bool {
        self.replacement.is_some()
    }
}

/// 表情差分的裁剪模式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FaceMode {
    /// 只裁剪 `face` 图层区域
    #[default]
    Off,
    /// 裁剪到包含表情的最小图层，写回时修补 `face` 节点
    Adaptive,
    /// 裁剪到包含表情的最大图层，写回时修补 `face` 节点
    Max,
}

impl FaceMode {
    pub fn preference(self) -> RegionPreference {
        match self {
            FaceMode::Max => RegionPreference::Largest,
            FaceMode::Off | FaceMode::Adaptive => RegionPreference::Smallest,
        }
    }

    /// 写回时是否需要修补 `face` 节点布局
    pub fn patches_face_node(self) -> bool {
        self != FaceMode::Off
    }
}

/// 从全画布图像裁出表情差分
///
/// `Off` 取 `face` 图层框；其它模式取首选图层框。`clip` 时首选框外的部分
/// 按表情框（`Max` 模式下扩展到首选图层的画布尺寸）裁掉：
/// 颜色通道保留到框的右上外侧一像素，alpha 通道收缩到框的左下内侧一像素。
pub fn crop_face(
    full: &RgbaImage,
    tree: &LayerTree,
    meta: &MetaInfo,
    face: LayerId,
    preferred: LayerId,
    mode: FaceMode,
    clip: bool,
) -> RgbaImage {
    let face_layer = tree.layer(face);
    if mode == FaceMode::Off {
        return raster::crop_padded(full, face_layer.canvas_box(meta, None));
    }

    let target = tree.layer(preferred).canvas_box(meta, None);
    let mut out = raster::crop_padded(full, target);
    if !clip {
        return out;
    }

    let extent = (mode == FaceMode::Max).then(|| tree.geometry(preferred).canvas_size);
    let clip_box = face_layer.canvas_box(meta, extent);
    let (x1, y1, x2, y2) = (clip_box.x, clip_box.y, clip_box.right(), clip_box.top());
    for (px, py, pixel) in out.enumerate_pixels_mut() {
        let gx = target.x + px as i64;
        let gy = target.y + py as i64;
        if !(x1..=x2).contains(&gx) || !(y1..=y2).contains(&gy) {
            pixel.0 = [0, 0, 0, 0];
        } else if !(x1 + 1..x2).contains(&gx) || !(y1 + 1..y2).contains(&gy) {
            pixel[3] = 0;
        }
    }
    out
}

/// 图标裁剪参数
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IconPreset {
    /// 精灵尺寸
    pub sprite: Vector2,
    /// 纹理尺寸
    pub texture: Vector2,
    /// 表情中心在裁剪框中的相对位置
    pub pivot: Vector2,
    /// 图标相对立绘的缩放
    pub scale: f64,
    /// 逆时针旋转角（度）
    pub angle: f64,
}

impl IconPreset {
    pub fn new(sprite: Vector2, texture: Vector2, pivot: Vector2, scale: f64) -> Self {
        Self {
            sprite,
            texture,
            pivot,
            scale,
            angle: 0.0,
        }
    }

    /// 三种图标的默认参数
    pub fn defaults() -> IndexMap<String, IconPreset> {
        let v = Vector2::new;
        IndexMap::from([
            (
                "shipyardicon".to_string(),
                IconPreset::new(v(192.0, 256.0), v(192.0, 256.0), v(0.5, 0.7), 0.6),
            ),
            (
                "squareicon".to_string(),
                IconPreset::new(v(116.0, 116.0), v(116.0, 116.0), v(0.5, 0.6), 0.6),
            ),
            (
                "herohrzicon".to_string(),
                IconPreset::new(v(272.0, 80.0), v(360.0, 80.0), v(0.2, 0.6), 0.6),
            ),
        ])
    }

    /// 累加一次调整
    pub fn apply(&mut self, pivot: Vector2, scale: f64, angle: f64) {
        self.pivot += pivot;
        self.scale += scale;
        self.angle += angle;
    }

    /// 纹理整数宽高
    pub fn texture_dimensions(&self) -> (u32, u32) {
        let t = self.texture.rounded();
        (t.x.max(0.0) as u32, t.y.max(0.0) as u32)
    }

    /// 立绘空间中的裁剪尺寸
    pub fn clip_size(&self) -> Vector2 {
        self.texture / self.scale
    }
}

impl std::fmt::Display for IconPreset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "<IconPreset angle={}, scale={}, pivot=({}, {})>",
            self.angle, self.scale, self.pivot.x, self.pivot.y
        )
    }
}

/// 图标裁剪的参考图像与表情中心
///
/// 参考图像是全画布图像在首选图层画布框内的部分，缩放到该图层的精灵尺寸。
pub fn icon_reference(
    full: &RgbaImage,
    tree: &LayerTree,
    meta: &MetaInfo,
    face: LayerId,
    preferred: LayerId,
    resample: Resample,
) -> (RgbaImage, Vector2) {
    let pref = tree.geometry(preferred);
    let origin = (pref.pos_min + meta.bias).rounded();
    let extent = pref.canvas_size.rounded();
    let rect = PixelRect::new(origin.x as i64, origin.y as i64, extent.x as u32, extent.y as u32);

    let target = pref.sprite_size.unwrap_or(pref.canvas_size).rounded();
    let reference = raster::resize_to(
        &raster::crop_padded(full, rect),
        target.x as u32,
        target.y as u32,
        resample,
    );

    let face_layer = tree.layer(face);
    let center = tree.geometry(face).pos_min - pref.pos_min + face_layer.node().size_delta / 2.0;
    (reference, center)
}

/// 围绕表情中心裁剪一种图标
pub fn clip_icon(kind: &str, reference: &RgbaImage, center: Vector2, preset: &IconPreset) -> Result<RgbaImage, GeometryError> {
    if !(preset.scale.is_finite() && preset.scale > 0.0) {
        return Err(GeometryError::NonPositive {
            layer: kind.to_string(),
            quantity: "icon scale",
            value: preset.scale,
        });
    }

    let size = preset.clip_size();
    let origin = center - size.component_mul(&preset.pivot);
    let mut image = raster::rotate_about(reference, origin + size / 2.0, preset.angle);

    if kind == SHADOW_KIND {
        let mut shadow = RgbaImage::new(image.width(), image.height());
        raster::paste(&mut shadow, &image, (SHADOW_OFFSET / preset.scale).round() as i64, 0);
        for pixel in shadow.pixels_mut() {
            pixel.0 = [0, 0, 0, pixel[3].min(SHADOW_ALPHA)];
        }
        raster::paste_masked(&mut shadow, &image, 0, 0);
        image = shadow;
    }

    let (lo, hi) = (origin.rounded(), (origin + size).rounded());
    let rect = PixelRect::from_corners((lo.x as i64, lo.y as i64), (hi.x as i64, hi.y as i64));
    Ok(raster::crop_padded(&image, rect))
}
