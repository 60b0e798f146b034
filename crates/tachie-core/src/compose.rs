//! 分层文档合成
//!
//! 把解码后的图层和表情差分组装成一个分层光栅文档。
//! 输出元素按从上到下的堆叠顺序排列，矩形与像素均为自上而下（第 0 行是顶边），
//! 可以直接写入常见的分层图像容器。

use crate::layer::{Layer, LayerId, LayerMap, LayerTree, FACE_NAME};
use crate::math::{PixelRect, Vector2, Vector2Ext};
use crate::meta::MetaInfo;
use crate::raster::{self, Resample};
use crate::swatch::FaceSwatch;
use image::{imageops, RgbaImage};
use std::collections::HashMap;
use tracing::debug;

/// 表情差分分组名
pub const FACE_GROUP_NAME: &str = "paintingface";

/// 单个光栅图层
#[derive(Debug, Clone, PartialEq)]
pub struct RasterLayer {
    pub name: String,
    pub visible: bool,
    /// 画布坐标，自上而下
    pub rect: PixelRect,
    /// 自上而下
    pub pixels: RgbaImage,
}

/// 文档元素
#[derive(Debug, Clone, PartialEq)]
pub enum Element {
    Raster(RasterLayer),
    Group {
        name: String,
        visible: bool,
        /// 从上到下
        children: Vec<Element>,
    },
}

impl Element {
    pub fn name(&self) -> &str {
        match self {
            Element::Raster(layer) => &layer.name,
            Element::Group { name, .. } => name,
        }
    }

    pub fn is_visible(&self) -> bool {
        match self {
            Element::Raster(layer) => layer.visible,
            Element::Group { visible, .. } => *visible,
        }
    }
}

/// 分层文档
#[derive(Debug, Clone, PartialEq)]
pub struct LayeredImage {
    pub width: u32,
    pub height: u32,
    /// 从上到下
    pub elements: Vec<Element>,
}

impl LayeredImage {
    /// 深度优先遍历所有光栅图层（从上到下），附带其是否实际可见
    pub fn rasters(&self) -> Vec<(&RasterLayer, bool)> {
        fn walk<'a>(elements: &'a [Element], parent_visible: bool, out: &mut Vec<(&'a RasterLayer, bool)>) {
            for element in elements {
                let visible = parent_visible && element.is_visible();
                match element {
                    Element::Raster(layer) => out.push((layer, visible)),
                    Element::Group { children, .. } => walk(children, visible, out),
                }
            }
        }
        let mut out = Vec::new();
        walk(&self.elements, true, &mut out);
        out
    }

    /// 可见图层自下而上叠加的合成图
    pub fn flatten(&self) -> RgbaImage {
        let mut canvas = RgbaImage::new(self.width, self.height);
        for (layer, visible) in self.rasters().into_iter().rev() {
            if visible {
                imageops::overlay(&mut canvas, &layer.pixels, layer.rect.x, layer.rect.y);
            }
        }
        canvas
    }
}

/// 把 Y 轴向上的图像放到画布上
///
/// 左边缘 `floor(x)`，上边缘 `floor(H - y - h)`，即 Y 轴向上时底边取 `ceil(y)`。
pub fn place(name: impl Into<String>, position: Vector2, meta: &MetaInfo, image: &RgbaImage, visible: bool) -> RasterLayer {
    let (w, h) = image.dimensions();
    let left = position.x.floor() as i64;
    let top = (meta.size.y - position.y - h as f64).floor() as i64;
    RasterLayer {
        name: name.into(),
        visible,
        rect: PixelRect::new(left, top, w, h),
        pixels: imageops::flip_vertical(image),
    }
}

/// 分层文档合成器
#[derive(Debug, Clone, Copy)]
pub struct LayerDocumentComposer<'a> {
    tree: &'a LayerTree,
    meta: &'a MetaInfo,
    resample: Resample,
}

impl<'a> LayerDocumentComposer<'a> {
    pub fn new(tree: &'a LayerTree, meta: &'a MetaInfo, resample: Resample) -> Self {
        Self { tree, meta, resample }
    }

    /// 合成文档
    ///
    /// 图层按插入顺序的逆序输出（后插入的叠在上面）；`face` 键所在位置输出表情差分分组。
    /// `decoded` 中缺失的图层（解码失败）被跳过。
    pub fn compose(
        &self,
        layers: &LayerMap,
        decoded: &HashMap<LayerId, RgbaImage>,
        faces: &[FaceSwatch],
    ) -> LayeredImage {
        let mut elements = Vec::with_capacity(layers.len());
        for (key, &id) in layers.iter().rev() {
            let layer = self.tree.layer(id);
            if key == FACE_NAME {
                if let Some(group) = self.face_group(layer, faces) {
                    elements.push(group);
                }
                continue;
            }
            match decoded.get(&id) {
                Some(image) => elements.push(Element::Raster(self.painting(layer, image))),
                None => debug!("Skipping undecoded layer {}", key),
            }
        }

        let (width, height) = self.meta.canvas_dimensions();
        LayeredImage {
            width,
            height,
            elements,
        }
    }

    /// 立绘图层：缩放到画布尺寸，默认可见
    fn painting(&self, layer: &Layer, image: &RgbaImage) -> RasterLayer {
        let size = layer.geometry().canvas_size.rounded();
        let resized = raster::resize_to(image, size.x as u32, size.y as u32, self.resample);
        let name = match layer.texture() {
            Some(texture) => format!("{} [{}]", layer.name(), texture.name),
            None => layer.name().to_string(),
        };
        place(name, layer.pos_biased(self.meta), self.meta, &resized, true)
    }

    /// 表情差分：原始分辨率放在 `face` 图层处，序号小的在上，默认隐藏
    fn face_group(&self, face: &Layer, faces: &[FaceSwatch]) -> Option<Element> {
        if faces.is_empty() {
            return None;
        }
        let mut sorted: Vec<&FaceSwatch> = faces.iter().collect();
        sorted.sort_by_key(|f| f.index);

        let position = face.pos_biased(self.meta);
        let children = sorted
            .into_iter()
            .map(|f| Element::Raster(place(format!("face #{}", f.index), position, self.meta, &f.image, false)))
            .collect();
        Some(Element::Group {
            name: FACE_GROUP_NAME.to_string(),
            visible: false,
            children,
        })
    }
}
