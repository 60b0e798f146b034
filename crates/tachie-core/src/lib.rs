//! 立绘核心引擎
//!
//! 把多部件立绘的变换节点树解析为绝对像素矩形，并通过四边形网格
//! 在打包图集与完整画布之间双向搬运像素，最后组装为分层文档。
//!
//! # 架构设计
//!
//! - `asset`: 资源边界（变换节点、纹理、网格记录与存储接口）
//! - `layer`: 图层树与几何解析
//! - `meta`: 文档级画布尺寸与偏移
//! - `mesh` / `codec`: 网格缓冲与图集编解码
//! - `region`: 首选区域查找
//! - `swatch`: 表情差分与图标
//! - `compose`: 分层文档合成
//!
//! # 示例
//!
//! ```rust
//! use tachie_core::prelude::*;
//!
//! let root = TransformNode::new("base")
//!     .with_texture(TextureRef::new("base_tex", 64, 64))
//!     .with_size_delta(Vector2::new(64.0, 64.0));
//! let tree = LayerTree::build(root, AnchorFormula::default()).unwrap();
//! let layers = tree.flatten();
//! let meta = MetaInfo::compute("demo", &tree, &layers);
//! assert_eq!(meta.canvas_dimensions(), (64, 64));
//! ```

pub mod asset;
pub mod codec;
pub mod compose;
pub mod layer;
pub mod math;
pub mod mesh;
pub mod meta;
pub mod raster;
pub mod region;
pub mod swatch;

pub mod prelude {
    //! 常用类型的便捷导入
    pub use crate::asset::{AssetStore, MeshRecord, NodePatch, TextureRef, TransformNode, WriteTarget};
    pub use crate::codec::{AtlasCodec, CodecError};
    pub use crate::compose::{Element, LayerDocumentComposer, LayeredImage, RasterLayer};
    pub use crate::layer::{
        AnchorFormula, GeometryError, Layer, LayerError, LayerId, LayerMap, LayerTree, StructuralError,
    };
    pub use crate::math::{BoundingBox2, PixelRect, Vector2, Vector2Ext};
    pub use crate::mesh::{MeshBuffer, MeshError, Quad};
    pub use crate::meta::MetaInfo;
    pub use crate::raster::Resample;
    pub use crate::region::{preferred_region, RegionPreference};
    pub use crate::swatch::{FaceMode, FaceSwatch, IconPreset, IconSwatch};
}
