//! 四边形网格缓冲
//!
//! 网格把解码空间（完整立绘像素）中的矩形与编码图集上的 UV 矩形一一对应。
//! 四边形内的顶点顺序并不可靠，所有矩形都通过分量 min/max 归约得到。

use crate::asset::MeshRecord;
use crate::math::{PixelRect, Vector2, Vector2Ext};
use serde::{Deserialize, Serialize};

/// 每个四边形占用的索引数（两个三角形）
pub const INDICES_PER_QUAD: usize = 6;

/// 单个四边形：4 个解码空间顶点 + 4 个对应的 UV
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Quad {
    pub decoded: [Vector2; 4],
    pub uv: [Vector2; 4],
}

impl Quad {
    /// 轴对齐的四边形
    pub fn axis_aligned(decoded_min: Vector2, decoded_max: Vector2, uv_min: Vector2, uv_max: Vector2) -> Self {
        Self {
            decoded: [
                decoded_min,
                Vector2::new(decoded_min.x, decoded_max.y),
                decoded_max,
                Vector2::new(decoded_max.x, decoded_min.y),
            ],
            uv: [
                uv_min,
                Vector2::new(uv_min.x, uv_max.y),
                uv_max,
                Vector2::new(uv_max.x, uv_min.y),
            ],
        }
    }

    /// 解码空间矩形：顶点分量 min/max 后取整
    pub fn decoded_rect(&self) -> PixelRect {
        let (min, max) = min_max(&self.decoded);
        let (min, max) = (min.rounded(), max.rounded());
        PixelRect::from_corners((min.x as i64, min.y as i64), (max.x as i64, max.y as i64))
    }

    /// 编码空间矩形：UV 分量 min/max 乘以图集像素尺寸后取整
    pub fn encoded_rect(&self, width: u32, height: u32) -> PixelRect {
        let (min, max) = min_max(&self.uv);
        let dims = Vector2::new(width as f64, height as f64);
        let min = min.component_mul(&dims).rounded();
        let max = max.component_mul(&dims).rounded();
        PixelRect::from_corners((min.x as i64, min.y as i64), (max.x as i64, max.y as i64))
    }

    /// 解码空间面积为零
    pub fn is_degenerate(&self) -> bool {
        self.decoded_rect().is_empty()
    }
}

fn min_max(points: &[Vector2; 4]) -> (Vector2, Vector2) {
    points
        .iter()
        .skip(1)
        .fold((points[0], points[0]), |(lo, hi), p| (lo.inf(p), hi.sup(p)))
}

/// 网格记录格式错误
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MeshError {
    #[error("Mesh '{mesh}': {vertices} vertices but {uvs} uvs")]
    LengthMismatch { mesh: String, vertices: usize, uvs: usize },

    #[error("Mesh '{mesh}': index count {count} is not a multiple of 6")]
    IndexCount { mesh: String, count: usize },

    #[error("Mesh '{mesh}': index {index} out of range ({len} vertices)")]
    IndexOutOfRange { mesh: String, index: u32, len: usize },

    #[error("Mesh '{mesh}': quad #{quad} references {distinct} distinct vertices, expected 4")]
    NotAQuad { mesh: String, quad: usize, distinct: usize },

    #[error("Mesh '{mesh}': non-finite vertex or uv at index {index}")]
    NonFinite { mesh: String, index: usize },
}

/// 四边形列表
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MeshBuffer {
    quads: Vec<Quad>,
}

impl MeshBuffer {
    pub fn new(quads: Vec<Quad>) -> Self {
        Self { quads }
    }

    /// 覆盖整个画布的单位映射：解码 (0,0)-(w,h) ↔ UV (0,0)-(1,1)
    pub fn identity(width: u32, height: u32) -> Self {
        Self::new(vec![Quad::axis_aligned(
            Vector2::zeros(),
            Vector2::new(width as f64, height as f64),
            Vector2::zeros(),
            Vector2::new(1.0, 1.0),
        )])
    }

    /// 从网格记录构建
    ///
    /// 每 6 个索引为一组，按出现顺序取其中 4 个不同顶点。
    pub fn from_record(record: &MeshRecord) -> Result<Self, MeshError> {
        let mesh = || record.name.clone();

        if record.vertices.len() != record.uvs.len() {
            return Err(MeshError::LengthMismatch {
                mesh: mesh(),
                vertices: record.vertices.len(),
                uvs: record.uvs.len(),
            });
        }
        if record.indices.len() % INDICES_PER_QUAD != 0 {
            return Err(MeshError::IndexCount {
                mesh: mesh(),
                count: record.indices.len(),
            });
        }
        for (index, (v, t)) in record.vertices.iter().zip(&record.uvs).enumerate() {
            if !v.is_finite_all() || !t.is_finite_all() {
                return Err(MeshError::NonFinite { mesh: mesh(), index });
            }
        }

        let len = record.vertices.len();
        let mut quads = Vec::with_capacity(record.indices.len() / INDICES_PER_QUAD);
        for (quad, chunk) in record.indices.chunks(INDICES_PER_QUAD).enumerate() {
            let mut distinct: Vec<u32> = Vec::with_capacity(4);
            for &index in chunk {
                if index as usize >= len {
                    return Err(MeshError::IndexOutOfRange { mesh: mesh(), index, len });
                }
                if !distinct.contains(&index) {
                    distinct.push(index);
                }
            }
            if distinct.len() != 4 {
                return Err(MeshError::NotAQuad {
                    mesh: mesh(),
                    quad,
                    distinct: distinct.len(),
                });
            }

            let pick = |i: usize| distinct[i] as usize;
            quads.push(Quad {
                decoded: [0, 1, 2, 3].map(|i| record.vertices[pick(i)]),
                uv: [0, 1, 2, 3].map(|i| record.uvs[pick(i)]),
            });
        }

        Ok(Self { quads })
    }

    /// 所有四边形（包括退化的）
    pub fn quads(&self) -> &[Quad] {
        &self.quads
    }

    /// 非退化四边形
    pub fn effective_quads(&self) -> impl Iterator<Item = &Quad> {
        self.quads.iter().filter(|q| !q.is_degenerate())
    }

    pub fn len(&self) -> usize {
        self.quads.len()
    }

    pub fn is_empty(&self) -> bool {
        self.quads.is_empty()
    }

    /// 网格覆盖的解码空间尺寸：所有非退化四边形右上角的最大值
    pub fn mesh_size(&self) -> Option<Vector2> {
        self.effective_quads()
            .map(|q| {
                let r = q.decoded_rect();
                Vector2::new(r.right() as f64, r.top() as f64)
            })
            .reduce(|a, b| a.sup(&b))
    }
}
