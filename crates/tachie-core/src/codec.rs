//! 图集编解码
//!
//! 按网格四边形的包围矩形，在打包图集（编码空间）与完整立绘（解码空间）之间搬运像素。
//!
//! 每个四边形：
//! - 解码矩形 = 顶点 min/max 取整
//! - 编码矩形 = UV min/max × 图集尺寸，取整
//!
//! 两个矩形尺寸相差不超过 1px 时按编码矩形尺寸原样拷贝，两个方向使用同一范围，
//! 因而解码后再编码能逐像素还原；否则重采样到目标矩形。
//! 超出画布的部分被裁掉，源矩形被裁剪时目标位置随之偏移。

use crate::layer::{Layer, LayerId, LayerTree};
use crate::math::PixelRect;
use crate::mesh::{MeshBuffer, Quad};
use crate::raster::{self, Resample};
use image::{imageops, RgbaImage};
use rayon::prelude::*;
use tracing::trace;

/// 编解码错误
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CodecError {
    #[error("Target canvas is empty ({width}x{height})")]
    EmptyCanvas { width: u32, height: u32 },

    #[error("Layer '{0}' has no texture")]
    NoTexture(String),

    #[error("Layer '{layer}': image is {actual:?}, expected {expected:?}")]
    SizeMismatch {
        layer: String,
        expected: (u32, u32),
        actual: (u32, u32),
    },
}

/// 单个四边形在两个空间中的整数矩形
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuadMapping {
    pub decoded: PixelRect,
    pub encoded: PixelRect,
}

impl QuadMapping {
    pub fn new(quad: &Quad, encoded_width: u32, encoded_height: u32) -> Self {
        Self {
            decoded: quad.decoded_rect(),
            encoded: quad.encoded_rect(encoded_width, encoded_height),
        }
    }

    /// 两矩形尺寸每个轴相差不超过 1px
    pub fn is_unscaled(&self) -> bool {
        self.decoded.width.abs_diff(self.encoded.width) <= 1 && self.decoded.height.abs_diff(self.encoded.height) <= 1
    }

    /// 解码端实际参与拷贝的矩形
    fn decoded_extent(&self) -> PixelRect {
        if self.is_unscaled() {
            PixelRect::new(self.decoded.x, self.decoded.y, self.encoded.width, self.encoded.height)
        } else {
            self.decoded
        }
    }
}

/// 图集编解码器
#[derive(Debug, Clone, Copy, Default)]
pub struct AtlasCodec {
    pub resample: Resample,
}

impl AtlasCodec {
    pub fn new(resample: Resample) -> Self {
        Self { resample }
    }

    /// 编码图集 → 解码画布
    ///
    /// `mesh` 为空时原样返回图集。
    pub fn decode(
        &self,
        mesh: Option<&MeshBuffer>,
        encoded: &RgbaImage,
        decoded_size: (u32, u32),
    ) -> Result<RgbaImage, CodecError> {
        let Some(mesh) = mesh else {
            return Ok(encoded.clone());
        };
        let mut canvas = new_canvas(decoded_size)?;
        let (w, h) = encoded.dimensions();
        for quad in mesh.effective_quads() {
            let m = QuadMapping::new(quad, w, h);
            trace!("decode quad {:?} -> {:?}", m.encoded, m.decoded);
            self.transfer(encoded, m.encoded, &mut canvas, m.decoded_extent());
        }
        Ok(canvas)
    }

    /// 解码画布 → 编码图集，与 [`decode`](Self::decode) 互逆
    ///
    /// `mesh` 为空时按目标尺寸整体缩放（尺寸相同则原样返回）。
    pub fn encode(
        &self,
        mesh: Option<&MeshBuffer>,
        decoded: &RgbaImage,
        encoded_size: (u32, u32),
    ) -> Result<RgbaImage, CodecError> {
        let Some(mesh) = mesh else {
            check_canvas(encoded_size)?;
            return Ok(raster::resize_to(decoded, encoded_size.0, encoded_size.1, self.resample));
        };
        let mut canvas = new_canvas(encoded_size)?;
        for quad in mesh.effective_quads() {
            let m = QuadMapping::new(quad, encoded_size.0, encoded_size.1);
            trace!("encode quad {:?} -> {:?}", m.decoded, m.encoded);
            self.transfer(decoded, m.decoded_extent(), &mut canvas, m.encoded);
        }
        Ok(canvas)
    }

    /// 解码图层纹理（无网格时合成覆盖整张纹理的单位四边形）
    pub fn decode_layer(&self, layer: &Layer, encoded: &RgbaImage) -> Result<RgbaImage, CodecError> {
        let size = layer
            .decoded_dimensions()
            .ok_or_else(|| CodecError::NoTexture(layer.name().to_string()))?;
        let identity;
        let mesh = match layer.mesh() {
            Some(mesh) => mesh,
            None => {
                identity = MeshBuffer::identity(encoded.width(), encoded.height());
                &identity
            }
        };
        self.decode(Some(mesh), encoded, size)
    }

    /// 把精灵尺寸的替换图像编码回原纹理尺寸
    pub fn encode_layer(&self, layer: &Layer, decoded: &RgbaImage) -> Result<RgbaImage, CodecError> {
        let texture = layer
            .texture()
            .ok_or_else(|| CodecError::NoTexture(layer.name().to_string()))?;
        let expected = layer
            .decoded_dimensions()
            .ok_or_else(|| CodecError::NoTexture(layer.name().to_string()))?;
        if decoded.dimensions() != expected {
            return Err(CodecError::SizeMismatch {
                layer: layer.name().to_string(),
                expected,
                actual: decoded.dimensions(),
            });
        }
        let identity;
        let mesh = match layer.mesh() {
            Some(mesh) => mesh,
            None => {
                identity = MeshBuffer::identity(texture.width, texture.height);
                &identity
            }
        };
        self.encode(Some(mesh), decoded, (texture.width, texture.height))
    }

    /// 并行解码一批图层
    ///
    /// `load` 读取图层的编码纹理。结果与 `ids` 一一对应，单个图层失败不影响其它图层。
    pub fn decode_layers<F, E>(&self, tree: &LayerTree, ids: &[LayerId], load: F) -> Vec<(LayerId, Result<RgbaImage, E>)>
    where
        F: Fn(&Layer) -> Result<RgbaImage, E> + Sync,
        E: From<CodecError> + Send,
    {
        ids.par_iter()
            .map(|&id| {
                let layer = tree.layer(id);
                let result = load(layer).and_then(|encoded| Ok(self.decode_layer(layer, &encoded)?));
                (id, result)
            })
            .collect()
    }

    /// 把 `source` 中的 `from` 矩形搬到 `target` 的 `to` 矩形
    fn transfer(&self, source: &RgbaImage, from: PixelRect, target: &mut RgbaImage, to: PixelRect) {
        let visible = from.clamp_to(source.width(), source.height());
        if visible.is_empty() || to.is_empty() {
            return;
        }

        if from.width == to.width && from.height == to.height {
            let part = crop(source, visible);
            raster::paste(target, &part, to.x + (visible.x - from.x), to.y + (visible.y - from.y));
            return;
        }

        // 可见部分按比例映射到目标矩形；只重采样落在目标画布内的源像素，
        // 目标矩形远大于画布时不会按整个矩形分配内存
        let axis_x = Axis::new(from.x, to.x, from.width, to.width);
        let axis_y = Axis::new(from.y, to.y, from.height, to.height);
        let (x0, x1) = (axis_x.forward(visible.x), axis_x.forward(visible.right()));
        let (y0, y1) = (axis_y.forward(visible.y), axis_y.forward(visible.top()));
        if x1 <= x0 || y1 <= y0 {
            return;
        }
        let clipped = PixelRect::from_corners((x0, y0), (x1, y1)).clamp_to(target.width(), target.height());
        if clipped.is_empty() {
            return;
        }

        // 覆盖裁剪后目标矩形的整像素源矩形
        let sx0 = (axis_x.backward(clipped.x).floor() as i64).max(visible.x);
        let sx1 = (axis_x.backward(clipped.right()).ceil() as i64).min(visible.right());
        let sy0 = (axis_y.backward(clipped.y).floor() as i64).max(visible.y);
        let sy1 = (axis_y.backward(clipped.top()).ceil() as i64).min(visible.top());
        if sx1 <= sx0 || sy1 <= sy0 {
            return;
        }
        let (dx0, dx1) = (axis_x.forward(sx0), axis_x.forward(sx1));
        let (dy0, dy1) = (axis_y.forward(sy0), axis_y.forward(sy1));
        if dx1 <= dx0 || dy1 <= dy0 {
            return;
        }

        let part = crop(source, PixelRect::from_corners((sx0, sy0), (sx1, sy1)));
        let scaled = raster::resize_to(&part, (dx1 - dx0) as u32, (dy1 - dy0) as u32, self.resample);
        raster::paste(target, &scaled, dx0, dy0);
    }
}

/// 单轴上源矩形到目标矩形的线性映射
#[derive(Debug, Clone, Copy)]
struct Axis {
    from: i64,
    to: i64,
    scale: f64,
}

impl Axis {
    fn new(from: i64, to: i64, from_len: u32, to_len: u32) -> Self {
        Self {
            from,
            to,
            scale: to_len as f64 / from_len as f64,
        }
    }

    fn forward(&self, src: i64) -> i64 {
        self.to + ((src - self.from) as f64 * self.scale).round() as i64
    }

    fn backward(&self, dst: i64) -> f64 {
        self.from as f64 + (dst - self.to) as f64 / self.scale
    }
}

/// 裁剪画布内的矩形
fn crop(source: &RgbaImage, rect: PixelRect) -> RgbaImage {
    imageops::crop_imm(source, rect.x as u32, rect.y as u32, rect.width, rect.height).to_image()
}

fn check_canvas((width, height): (u32, u32)) -> Result<(), CodecError> {
    if width == 0 || height == 0 {
        return Err(CodecError::EmptyCanvas { width, height });
    }
    Ok(())
}

fn new_canvas(size: (u32, u32)) -> Result<RgbaImage, CodecError> {
    check_canvas(size)?;
    Ok(RgbaImage::new(size.0, size.1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::Vector2;
    use image::Rgba;

    fn v(x: f64, y: f64) -> Vector2 {
        Vector2::new(x, y)
    }

    fn atlas(w: u32, h: u32) -> RgbaImage {
        RgbaImage::from_fn(w, h, |x, y| Rgba([x as u8, y as u8, (x ^ y) as u8, 255]))
    }

    fn nearest() -> AtlasCodec {
        AtlasCodec::new(Resample::Nearest)
    }

    /// 解码 (0,0)-(100,100) ↔ UV (0.25,0.25)-(0.75,0.75)，顶点顺序打乱
    fn scenario_b() -> MeshBuffer {
        MeshBuffer::new(vec![Quad {
            decoded: [v(100.0, 100.0), v(0.0, 100.0), v(0.0, 0.0), v(100.0, 0.0)],
            uv: [v(0.75, 0.75), v(0.25, 0.75), v(0.25, 0.25), v(0.75, 0.25)],
        }])
    }

    #[test]
    fn test_scenario_b_decode() {
        let enc = atlas(200, 200);
        let dec = nearest().decode(Some(&scenario_b()), &enc, (100, 100)).unwrap();
        let expected = imageops::crop_imm(&enc, 50, 50, 100, 100).to_image();
        assert_eq!(dec, expected);
    }

    #[test]
    fn test_scenario_b_encode() {
        let enc = atlas(200, 200);
        let codec = nearest();
        let dec = codec.decode(Some(&scenario_b()), &enc, (100, 100)).unwrap();
        let back = codec.encode(Some(&scenario_b()), &dec, (200, 200)).unwrap();

        for (x, y, p) in back.enumerate_pixels() {
            let inside = (50..150).contains(&x) && (50..150).contains(&y);
            if inside {
                assert_eq!(p, enc.get_pixel(x, y));
            } else {
                assert_eq!(p[3], 0);
            }
        }
    }

    #[test]
    fn test_multi_quad_round_trip() {
        let mesh = MeshBuffer::new(vec![
            Quad::axis_aligned(v(0.0, 0.0), v(50.0, 100.0), v(0.0, 0.0), v(0.25, 0.5)),
            Quad::axis_aligned(v(50.0, 0.0), v(100.0, 100.0), v(0.5, 0.5), v(0.75, 1.0)),
        ]);
        let enc = atlas(200, 200);
        let codec = nearest();
        let dec = codec.decode(Some(&mesh), &enc, (100, 100)).unwrap();

        assert_eq!(dec.get_pixel(10, 20), enc.get_pixel(10, 20));
        assert_eq!(dec.get_pixel(60, 20), enc.get_pixel(110, 120));

        let back = codec.encode(Some(&mesh), &dec, (200, 200)).unwrap();
        for (x, y) in [(0, 0), (49, 99), (100, 100), (149, 199)] {
            assert_eq!(back.get_pixel(x, y), enc.get_pixel(x, y));
        }
        assert_eq!(back.get_pixel(75, 50)[3], 0);
    }

    #[test]
    fn test_one_pixel_rounding_uses_encoded_extent() {
        // 编码矩形 51 宽，解码矩形 50 宽：按 51 拷贝，不重采样
        let mesh = MeshBuffer::new(vec![Quad::axis_aligned(
            v(0.0, 0.0),
            v(50.0, 50.0),
            v(0.0, 0.0),
            v(0.255, 0.25),
        )]);
        let enc = atlas(200, 200);
        let codec = nearest();
        let dec = codec.decode(Some(&mesh), &enc, (60, 60)).unwrap();
        assert_eq!(dec.get_pixel(50, 10), enc.get_pixel(50, 10));
        assert_eq!(dec.get_pixel(51, 10)[3], 0);

        let back = codec.encode(Some(&mesh), &dec, (200, 200)).unwrap();
        assert_eq!(back.get_pixel(50, 49), enc.get_pixel(50, 49));
    }

    #[test]
    fn test_resample_when_sizes_differ() {
        let mesh = MeshBuffer::new(vec![Quad::axis_aligned(
            v(0.0, 0.0),
            v(100.0, 100.0),
            v(0.0, 0.0),
            v(0.5, 0.5),
        )]);
        let enc = RgbaImage::from_pixel(100, 100, Rgba([10, 20, 30, 255]));
        let dec = nearest().decode(Some(&mesh), &enc, (100, 100)).unwrap();
        assert!(dec.pixels().all(|p| *p == Rgba([10, 20, 30, 255])));
    }

    #[test]
    fn test_clamped_source_offsets_destination() {
        let mesh = MeshBuffer::new(vec![Quad::axis_aligned(
            v(0.0, 0.0),
            v(50.0, 50.0),
            v(-0.25, 0.0),
            v(0.25, 0.5),
        )]);
        let enc = atlas(100, 100);
        let dec = nearest().decode(Some(&mesh), &enc, (50, 50)).unwrap();
        assert_eq!(dec.get_pixel(24, 10)[3], 0);
        assert_eq!(dec.get_pixel(25, 10), enc.get_pixel(0, 10));
        assert_eq!(dec.get_pixel(49, 49), enc.get_pixel(24, 49));
    }

    #[test]
    fn test_clamped_destination() {
        let mesh = MeshBuffer::new(vec![Quad::axis_aligned(
            v(80.0, 80.0),
            v(120.0, 120.0),
            v(0.0, 0.0),
            v(0.4, 0.4),
        )]);
        let enc = atlas(100, 100);
        let dec = nearest().decode(Some(&mesh), &enc, (100, 100)).unwrap();
        assert_eq!(dec.get_pixel(80, 80), enc.get_pixel(0, 0));
        assert_eq!(dec.get_pixel(99, 99), enc.get_pixel(19, 19));
        assert_eq!(dec.get_pixel(79, 79)[3], 0);
    }

    #[test]
    fn test_scaled_quad_clipped_to_canvas() {
        // 5x5 源放大 20 倍，一半落在画布外
        let mesh = MeshBuffer::new(vec![Quad::axis_aligned(
            v(50.0, 50.0),
            v(150.0, 150.0),
            v(0.0, 0.0),
            v(0.5, 0.5),
        )]);
        let enc = atlas(10, 10);
        let dec = nearest().decode(Some(&mesh), &enc, (100, 100)).unwrap();
        assert_eq!(dec.get_pixel(49, 49)[3], 0);
        assert_eq!(dec.get_pixel(60, 60), enc.get_pixel(0, 0));
        assert_eq!(dec.get_pixel(75, 60), enc.get_pixel(1, 0));
        assert_eq!(dec.get_pixel(95, 95), enc.get_pixel(2, 2));
    }

    #[test]
    fn test_huge_quad_only_samples_visible_pixels() {
        // 解码矩形 10000x10000，画布只有 10x10，落在源像素 (50,50) 内
        let mesh = MeshBuffer::new(vec![Quad::axis_aligned(
            v(-5000.0, -5000.0),
            v(5000.0, 5000.0),
            v(0.0, 0.0),
            v(1.0, 1.0),
        )]);
        let enc = atlas(100, 100);
        let dec = nearest().decode(Some(&mesh), &enc, (10, 10)).unwrap();
        assert!(dec.pixels().all(|p| p == enc.get_pixel(50, 50)));
    }

    #[test]
    fn test_degenerate_and_passthrough() {
        let mesh = MeshBuffer::new(vec![Quad::axis_aligned(
            v(10.0, 0.0),
            v(10.0, 40.0),
            v(0.0, 0.0),
            v(1.0, 1.0),
        )]);
        let enc = atlas(40, 40);
        let dec = nearest().decode(Some(&mesh), &enc, (40, 40)).unwrap();
        assert!(dec.pixels().all(|p| p[3] == 0));

        let same = nearest().decode(None, &enc, (10, 10)).unwrap();
        assert_eq!(same, enc);

        let err = nearest().decode(Some(&mesh), &enc, (0, 40)).unwrap_err();
        assert_eq!(err, CodecError::EmptyCanvas { width: 0, height: 40 });
    }

    #[test]
    fn test_decode_layers_reports_per_layer() {
        use crate::asset::{TextureRef, TransformNode};
        use crate::layer::AnchorFormula;

        #[derive(Debug, PartialEq)]
        enum LoadError {
            Missing,
            Codec(CodecError),
        }
        impl From<CodecError> for LoadError {
            fn from(e: CodecError) -> Self {
                LoadError::Codec(e)
            }
        }

        let root = TransformNode::new("base")
            .with_texture(TextureRef::new("base", 8, 8))
            .with_raw_sprite_size(v(16.0, 16.0))
            .with_child(TransformNode::new("lost").with_texture(TextureRef::new("lost", 4, 4)));
        let tree = LayerTree::build(root, AnchorFormula::PivotBlend).unwrap();
        let ids: Vec<LayerId> = tree.flatten().values().copied().collect();

        let results = nearest().decode_layers(&tree, &ids, |layer| match layer.name() {
            "base" => Ok(atlas(8, 8)),
            _ => Err(LoadError::Missing),
        });
        assert_eq!(results.len(), 2);

        let (id, base) = &results[0];
        assert_eq!(*id, ids[0]);
        let base = base.as_ref().unwrap();
        // 无网格：单位四边形贴在精灵画布左下角
        assert_eq!(base.dimensions(), (16, 16));
        assert_eq!(base.get_pixel(7, 7), atlas(8, 8).get_pixel(7, 7));
        assert_eq!(base.get_pixel(8, 8)[3], 0);

        assert_eq!(results[1].1, Err(LoadError::Missing));
    }
}
