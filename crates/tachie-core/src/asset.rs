//! 资源边界
//!
//! 资源包读写本身不属于核心。核心只消费这里定义的规范化记录：
//! 变换节点、纹理引用、网格记录，以及一个最小的 [`AssetStore`] 接口。
//!
//! 节点是否挂载纹理/网格/原始尺寸在加载时就以 `Option` 字段确定，
//! 使用时不再做动态探测。

use crate::math::Vector2;
use image::RgbaImage;
use serde::{Deserialize, Serialize};

/// 纹理引用（像素数据按需加载）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextureRef {
    /// 纹理资源名
    pub name: String,
    pub width: u32,
    pub height: u32,
}

impl TextureRef {
    pub fn new(name: impl Into<String>, width: u32, height: u32) -> Self {
        Self {
            name: name.into(),
            width,
            height,
        }
    }

    /// 纹理像素尺寸
    pub fn size(&self) -> Vector2 {
        Vector2::new(self.width as f64, self.height as f64)
    }
}

/// 网格记录
///
/// 顶点为解码空间像素坐标，UV 为编码图集上的 0..1 比例坐标。
/// 索引每 6 个为一个四边形（两个共享对角线的三角形）。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MeshRecord {
    pub name: String,
    pub vertices: Vec<Vector2>,
    pub uvs: Vec<Vector2>,
    pub indices: Vec<u32>,
}

/// 原始变换节点（只读）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransformNode {
    /// 节点名称
    pub name: String,

    pub local_position: Vector2,
    pub local_scale: Vector2,
    pub anchor_min: Vector2,
    pub anchor_max: Vector2,
    pub anchored_position: Vector2,
    pub size_delta: Vector2,
    pub pivot: Vector2,

    /// 挂载的纹理
    pub texture: Option<TextureRef>,

    /// 挂载的网格
    pub mesh: Option<MeshRecord>,

    /// 原始精灵尺寸提示
    pub raw_sprite_size: Option<Vector2>,

    /// 纹理所在资源包的依赖路径（写回时使用）
    pub asset_path: Option<String>,

    /// 子节点（有序）
    pub children: Vec<TransformNode>,
}

impl TransformNode {
    /// 创建一个默认布局的节点：锚点与轴心均在中心，尺寸为零
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            local_position: Vector2::zeros(),
            local_scale: Vector2::new(1.0, 1.0),
            anchor_min: Vector2::new(0.5, 0.5),
            anchor_max: Vector2::new(0.5, 0.5),
            anchored_position: Vector2::zeros(),
            size_delta: Vector2::zeros(),
            pivot: Vector2::new(0.5, 0.5),
            texture: None,
            mesh: None,
            raw_sprite_size: None,
            asset_path: None,
            children: Vec::new(),
        }
    }

    pub fn with_size_delta(mut self, size: Vector2) -> Self {
        self.size_delta = size;
        self
    }

    pub fn with_anchors(mut self, min: Vector2, max: Vector2) -> Self {
        self.anchor_min = min;
        self.anchor_max = max;
        self
    }

    pub fn with_anchored_position(mut self, position: Vector2) -> Self {
        self.anchored_position = position;
        self
    }

    pub fn with_pivot(mut self, pivot: Vector2) -> Self {
        self.pivot = pivot;
        self
    }

    pub fn with_texture(mut self, texture: TextureRef) -> Self {
        self.texture = Some(texture);
        self
    }

    pub fn with_mesh(mut self, mesh: MeshRecord) -> Self {
        self.mesh = Some(mesh);
        self
    }

    pub fn with_raw_sprite_size(mut self, size: Vector2) -> Self {
        self.raw_sprite_size = Some(size);
        self
    }

    pub fn with_child(mut self, child: TransformNode) -> Self {
        self.children.push(child);
        self
    }
}

/// 写回时对节点布局的修补
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodePatch {
    pub size_delta: Vector2,
    pub pivot: Vector2,
    pub anchored_position: Vector2,
}

/// 写回目标
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum WriteTarget {
    /// 立绘图层纹理（附带资源包路径）
    Painting { texture: String, asset_path: Option<String> },
    /// 表情差分
    Face { name: String },
    /// 图标
    Icon { kind: String },
}

/// 资源存储接口
///
/// 所有光栅图像均为 Y 轴向上（第 0 行为底边），由实现方在边界处翻转。
pub trait AssetStore: Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    /// 根节点
    fn root_node(&self) -> Result<TransformNode, Self::Error>;

    /// 加载纹理像素
    fn load_texture(&self, texture: &TextureRef) -> Result<RgbaImage, Self::Error>;

    /// 表情差分名称列表（不存在时为空）
    fn face_swatch_names(&self) -> Result<Vec<String>, Self::Error>;

    /// 加载一张表情差分
    fn load_face_swatch(&self, name: &str) -> Result<RgbaImage, Self::Error>;

    /// 存在的图标种类
    fn icon_kinds(&self) -> Result<Vec<String>, Self::Error>;

    /// 加载图标
    fn load_icon(&self, kind: &str) -> Result<RgbaImage, Self::Error>;

    /// 写回纹理，返回写入位置的描述
    fn write_texture(&self, target: &WriteTarget, image: &RgbaImage) -> Result<String, Self::Error>;

    /// 写回节点布局修补
    fn write_node_patch(&self, node: &str, patch: &NodePatch) -> Result<String, Self::Error>;
}
