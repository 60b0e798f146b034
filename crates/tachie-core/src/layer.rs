//! 图层树与几何解析
//!
//! 把嵌套的锚点/轴心/尺寸增量布局解析为绝对像素矩形。
//!
//! 节点存放在以整数下标索引的数组中，父链接是下标而不是引用。
//! 派生几何量在 [`LayerTree::build`] 中按先序一次算完并缓存，之后只读。

use crate::asset::{TextureRef, TransformNode};
use crate::math::{BoundingBox2, PixelRect, Vector2, Vector2Ext};
use crate::mesh::{MeshBuffer, MeshError};
use crate::meta::MetaInfo;
use image::RgbaImage;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::debug;

/// 图层下标
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LayerId(pub usize);

/// 文档图层表：名称 → 图层，保持插入顺序
pub type LayerMap = IndexMap<String, LayerId>;

/// 通用容器节点名，展开时改用纹理名作为键
pub const GENERIC_PART_NAME: &str = "part";

/// 表情区域节点名
pub const FACE_NAME: &str = "face";

/// 锚点位置公式
///
/// 两者仅在 `anchor_min != anchor_max`（拉伸锚定）时不同。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnchorFormula {
    /// `anchor_min * (1 - pivot) + anchor_max * pivot`
    #[default]
    PivotBlend,
    /// `(anchor_min + anchor_max) / 2`，忽略轴心
    Midpoint,
}

/// 几何解析错误（输入数据损坏）
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GeometryError {
    #[error("Layer '{layer}': non-finite {quantity}")]
    NonFinite { layer: String, quantity: &'static str },

    #[error("Layer '{layer}': negative {quantity} ({x}, {y})")]
    Negative {
        layer: String,
        quantity: &'static str,
        x: f64,
        y: f64,
    },

    #[error("Layer '{layer}': anchor_max is below anchor_min")]
    InvertedAnchors { layer: String },

    #[error("'{layer}': {quantity} must be positive, got {value}")]
    NonPositive {
        layer: String,
        quantity: &'static str,
        value: f64,
    },
}

/// 结构缺失（非致命，只禁用相关功能）
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StructuralError {
    #[error("Node not found: {0}")]
    MissingNode(String),

    #[error("No layer encloses '{0}'")]
    NoEnclosingLayer(String),

    #[error("Layer not found: {0}")]
    UnknownLayer(String),
}

/// 构建图层树时的错误
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LayerError {
    #[error(transparent)]
    Geometry(#[from] GeometryError),

    #[error(transparent)]
    Mesh(#[from] MeshError),
}

/// 缓存的派生几何量
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LayerGeometry {
    /// `size_delta + parent.size * (anchor_max - anchor_min)`
    pub size: Vector2,
    pub anchor_position: Vector2,
    pub pivot_position: Vector2,
    pub pos_min: Vector2,
    pub pos_max: Vector2,

    /// 网格覆盖尺寸；无网格时为纹理尺寸，无纹理时为空
    pub mesh_size: Option<Vector2>,

    /// 网格尺寸与原始精灵尺寸中面积较大者
    pub sprite_size: Option<Vector2>,

    /// 精灵尺寸与 `size_delta` 中面积较大者
    pub canvas_size: Vector2,
}

impl LayerGeometry {
    /// 根据父图层几何（根节点为空）解析
    pub fn resolve(
        node: &TransformNode,
        mesh: Option<&MeshBuffer>,
        parent: Option<&LayerGeometry>,
        formula: AnchorFormula,
    ) -> Result<Self, GeometryError> {
        let layer = || node.name.clone();

        for (quantity, v) in [
            ("anchor_min", node.anchor_min),
            ("anchor_max", node.anchor_max),
            ("anchored_position", node.anchored_position),
            ("size_delta", node.size_delta),
            ("pivot", node.pivot),
        ] {
            if !v.is_finite_all() {
                return Err(GeometryError::NonFinite { layer: layer(), quantity });
            }
        }
        if !node.anchor_max.all_ge(&node.anchor_min) {
            return Err(GeometryError::InvertedAnchors { layer: layer() });
        }

        let (parent_min, parent_size) = parent.map_or((Vector2::zeros(), Vector2::zeros()), |p| (p.pos_min, p.size));

        let size = node.size_delta + parent_size.component_mul(&(node.anchor_max - node.anchor_min));
        let anchor_position = match formula {
            AnchorFormula::PivotBlend => {
                let lower = parent_size.component_mul(&node.anchor_min);
                let upper = parent_size.component_mul(&node.anchor_max);
                parent_min
                    + lower.component_mul(&(Vector2::splat(1.0) - node.pivot))
                    + upper.component_mul(&node.pivot)
            }
            AnchorFormula::Midpoint => {
                parent_min + parent_size.component_mul(&(node.anchor_min + node.anchor_max)) / 2.0
            }
        };
        let pivot_position = anchor_position + node.anchored_position;
        let pos_min = pivot_position - size.component_mul(&node.pivot);
        let pos_max = pos_min + size;

        let mesh_size = match (mesh, &node.texture) {
            (Some(mesh), _) => mesh.mesh_size(),
            (None, Some(texture)) => Some(texture.size()),
            (None, None) => None,
        };
        let sprite_size = match (mesh_size, node.raw_sprite_size) {
            (Some(m), Some(r)) if r.prod() > m.prod() => Some(r),
            (Some(m), _) => Some(m),
            (None, raw) => raw,
        };
        let canvas_size = match sprite_size {
            Some(s) if s.prod() > node.size_delta.prod() => s,
            _ => node.size_delta,
        };

        let geometry = Self {
            size,
            anchor_position,
            pivot_position,
            pos_min,
            pos_max,
            mesh_size,
            sprite_size,
            canvas_size,
        };
        geometry.validate(&node.name)?;
        Ok(geometry)
    }

    /// 绝对矩形
    pub fn bounds(&self) -> BoundingBox2 {
        BoundingBox2::new(self.pos_min, self.pos_max)
    }

    fn validate(&self, layer: &str) -> Result<(), GeometryError> {
        let finite = [
            ("size", Some(self.size)),
            ("anchor_position", Some(self.anchor_position)),
            ("pos_min", Some(self.pos_min)),
            ("pos_max", Some(self.pos_max)),
            ("sprite_size", self.sprite_size),
            ("canvas_size", Some(self.canvas_size)),
        ];
        for (quantity, v) in finite {
            if let Some(v) = v {
                if !v.is_finite_all() {
                    return Err(GeometryError::NonFinite {
                        layer: layer.to_string(),
                        quantity,
                    });
                }
            }
        }

        // 拉伸锚定时 size_delta 本身可以为负；无纹理的节点不输出图像，画布尺寸不校验
        let non_negative = [
            ("size", Some(self.size)),
            ("sprite_size", self.sprite_size),
            ("canvas_size", self.sprite_size.map(|_| self.canvas_size)),
        ];
        for (quantity, v) in non_negative {
            if let Some(v) = v {
                if !v.all_ge(&Vector2::zeros()) {
                    return Err(GeometryError::Negative {
                        layer: layer.to_string(),
                        quantity,
                        x: v.x,
                        y: v.y,
                    });
                }
            }
        }
        Ok(())
    }
}

/// 解析后的图层
#[derive(Debug, Clone)]
pub struct Layer {
    id: LayerId,
    parent: Option<LayerId>,
    children: Vec<LayerId>,
    depth: usize,

    /// 原始节点（子节点已移入树中）
    node: TransformNode,

    mesh: Option<MeshBuffer>,
    geometry: LayerGeometry,

    /// 替换图像的来源文件
    pub source_path: Option<PathBuf>,

    /// 导入后待写回的替换图像（精灵尺寸，Y 轴向上）
    pub replacement: Option<RgbaImage>,
}

impl Layer {
    pub fn id(&self) -> LayerId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.node.name
    }

    pub fn parent(&self) -> Option<LayerId> {
        self.parent
    }

    pub fn children(&self) -> &[LayerId] {
        &self.children
    }

    /// 根节点深度为 1
    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn node(&self) -> &TransformNode {
        &self.node
    }

    pub fn texture(&self) -> Option<&TextureRef> {
        self.node.texture.as_ref()
    }

    pub fn mesh(&self) -> Option<&MeshBuffer> {
        self.mesh.as_ref()
    }

    pub fn geometry(&self) -> &LayerGeometry {
        &self.geometry
    }

    /// 加上文档偏移后的最小角
    pub fn pos_biased(&self, meta: &MetaInfo) -> Vector2 {
        self.geometry.pos_min + meta.bias
    }

    /// 画布上的整数放置框：x 向下取整、y 向上取整
    ///
    /// `size` 为空时使用 `size_delta`。
    pub fn canvas_box(&self, meta: &MetaInfo, size: Option<Vector2>) -> PixelRect {
        let pos = self.pos_biased(meta);
        let size = size.unwrap_or(self.node.size_delta);
        let (x0, y0) = (pos.x.floor() as i64, pos.y.ceil() as i64);
        let (x1, y1) = ((pos.x + size.x).floor() as i64, (pos.y + size.y).ceil() as i64);
        PixelRect::from_corners((x0, y0), (x1, y1))
    }

    /// 解码目标尺寸（精灵尺寸取整）
    pub fn decoded_dimensions(&self) -> Option<(u32, u32)> {
        self.geometry
            .sprite_size
            .map(|s| s.rounded())
            .map(|s| (s.x as u32, s.y as u32))
    }

    /// 是否已导入替换图像
    pub fn is_modified(&self) -> bool {
        self.replacement.is_some()
    }
}

/// 图层树
#[derive(Debug, Clone)]
pub struct LayerTree {
    layers: Vec<Layer>,
    formula: AnchorFormula,
}

impl LayerTree {
    /// 递归包装根节点并解析所有几何量
    pub fn build(root: TransformNode, formula: AnchorFormula) -> Result<Self, LayerError> {
        let mut tree = Self {
            layers: Vec::new(),
            formula,
        };
        tree.insert(root, None)?;
        debug!("Built layer tree with {} nodes", tree.layers.len());
        Ok(tree)
    }

    fn insert(&mut self, mut node: TransformNode, parent: Option<LayerId>) -> Result<LayerId, LayerError> {
        let children = std::mem::take(&mut node.children);
        let id = LayerId(self.layers.len());
        let depth = parent.map_or(1, |p| self.layers[p.0].depth + 1);

        let mesh = node.mesh.as_ref().map(MeshBuffer::from_record).transpose()?;
        let geometry = {
            let parent_geometry = parent.map(|p| &self.layers[p.0].geometry);
            LayerGeometry::resolve(&node, mesh.as_ref(), parent_geometry, self.formula)?
        };

        self.layers.push(Layer {
            id,
            parent,
            children: Vec::with_capacity(children.len()),
            depth,
            node,
            mesh,
            geometry,
            source_path: None,
            replacement: None,
        });
        if let Some(p) = parent {
            self.layers[p.0].children.push(id);
        }

        for child in children {
            self.insert(child, Some(id))?;
        }
        Ok(id)
    }

    pub fn root(&self) -> LayerId {
        LayerId(0)
    }

    pub fn formula(&self) -> AnchorFormula {
        self.formula
    }

    pub fn layer(&self, id: LayerId) -> &Layer {
        &self.layers[id.0]
    }

    pub fn layer_mut(&mut self, id: LayerId) -> &mut Layer {
        &mut self.layers[id.0]
    }

    pub fn geometry(&self, id: LayerId) -> &LayerGeometry {
        &self.layers[id.0].geometry
    }

    pub fn parent(&self, id: LayerId) -> Option<LayerId> {
        self.layers[id.0].parent
    }

    pub fn children(&self, id: LayerId) -> &[LayerId] {
        &self.layers[id.0].children
    }

    pub fn depth(&self, id: LayerId) -> usize {
        self.layers[id.0].depth
    }

    /// 所有图层（先序）
    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    /// 直接子节点中按名称查找
    pub fn get_child(&self, id: LayerId, name: &str) -> Option<LayerId> {
        self.layer(id)
            .children
            .iter()
            .copied()
            .find(|&c| self.layer(c).name() == name)
    }

    /// 整棵树中按名称查找（先序第一个）
    pub fn find(&self, name: &str) -> Option<LayerId> {
        self.layers.iter().find(|l| l.name() == name).map(|l| l.id)
    }

    /// 深度优先收集所有挂载纹理的图层
    ///
    /// 名为 `part` 的节点以纹理名作为键；重名时保留先出现的位置、更新为后出现的图层。
    pub fn flatten(&self) -> LayerMap {
        let mut map = LayerMap::new();
        self.flatten_into(self.root(), &mut map);
        map
    }

    fn flatten_into(&self, id: LayerId, map: &mut LayerMap) {
        let layer = self.layer(id);
        if let Some(texture) = layer.texture() {
            let key = if layer.name() == GENERIC_PART_NAME {
                texture.name.clone()
            } else {
                layer.name().to_string()
            };
            map.insert(key, id);
        }
        for &child in &layer.children {
            self.flatten_into(child, map);
        }
    }

    /// 确保图层表中有 `face` 条目
    ///
    /// 通用遍历中没有名为 `face` 的图层时，在根节点的直接子节点中查找并以 `face` 为键插入。
    pub fn attach_face(&self, map: &mut LayerMap) -> Result<LayerId, StructuralError> {
        if let Some(&id) = map.values().find(|&&id| self.layer(id).name() == FACE_NAME) {
            return Ok(id);
        }
        let id = self
            .get_child(self.root(), FACE_NAME)
            .ok_or_else(|| StructuralError::MissingNode(FACE_NAME.to_string()))?;
        map.insert(FACE_NAME.to_string(), id);
        Ok(id)
    }

    /// `outer` 的矩形是否完整包含 `inner` 的矩形
    pub fn contains(&self, outer: LayerId, inner: LayerId) -> bool {
        self.geometry(outer).bounds().contains_box(&self.geometry(inner).bounds())
    }

    /// 用于日志的简要描述
    pub fn describe(&self, id: LayerId) -> String {
        let layer = self.layer(id);
        let g = layer.geometry();
        let mut items = vec![format!("Layer@{} {}", layer.depth, layer.name())];
        if let Some(texture) = layer.texture() {
            items.push(format!("Texture2D: <Texture2D name={}>", texture.name));
        }
        if let Some(mesh) = &layer.node.mesh {
            items.push(format!("Mesh: <Mesh name={}>", mesh.name));
        }
        let sd = layer.node.size_delta;
        items.push(format!("SizeDelta: ({}, {})", sd.x, sd.y));
        if let Some(m) = g.mesh_size {
            items.push(format!("MeshSize: ({}, {})", m.x, m.y));
        }
        if let Some(r) = layer.node.raw_sprite_size {
            items.push(format!("RawSpriteSize: ({}, {})", r.x, r.y));
        }
        items.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asset::MeshRecord;
    use crate::math::{approx_eq, vectors_approx_eq};

    fn v(x: f64, y: f64) -> Vector2 {
        Vector2::new(x, y)
    }

    fn textured(name: &str, texture: &str, w: u32, h: u32) -> TransformNode {
        TransformNode::new(name).with_texture(TextureRef::new(texture, w, h))
    }

    /// 基础画 2000x3000，`layers` 分组下两个部件
    fn scenario_a() -> TransformNode {
        textured("base", "base_tex", 2000, 3000)
            .with_size_delta(v(2000.0, 3000.0))
            .with_child(
                TransformNode::new("layers")
                    .with_child(
                        textured("part", "arm", 400, 400)
                            .with_size_delta(v(800.0, 800.0))
                            .with_raw_sprite_size(v(400.0, 400.0)),
                    )
                    .with_child(
                        textured("part", "hair", 400, 400)
                            .with_size_delta(v(600.0, 600.0))
                            .with_anchored_position(v(500.0, -200.0))
                            .with_raw_sprite_size(v(400.0, 400.0)),
                    ),
            )
    }

    #[test]
    fn test_scenario_a_geometry() {
        let tree = LayerTree::build(scenario_a(), AnchorFormula::PivotBlend).unwrap();
        let map = tree.flatten();
        assert_eq!(map.keys().collect::<Vec<_>>(), ["base", "arm", "hair"]);

        let base = tree.geometry(map["base"]);
        assert!(vectors_approx_eq(&base.pos_min, &v(-1000.0, -1500.0)));
        assert!(vectors_approx_eq(&base.pos_max, &v(1000.0, 1500.0)));

        let arm = tree.geometry(map["arm"]);
        assert!(vectors_approx_eq(&arm.pos_min, &v(-400.0, -400.0)));
        assert!(vectors_approx_eq(&arm.canvas_size, &v(800.0, 800.0)));
        assert!(vectors_approx_eq(&arm.sprite_size.unwrap(), &v(400.0, 400.0)));

        let hair = tree.geometry(map["hair"]);
        assert!(vectors_approx_eq(&hair.pos_min, &v(200.0, -500.0)));
        assert!(vectors_approx_eq(&hair.pos_max, &v(800.0, 100.0)));

        for key in ["arm", "hair"] {
            assert!(tree.contains(map["base"], map[key]));
        }
        assert!(!tree.contains(map["arm"], map["hair"]));
    }

    #[test]
    fn test_size_invariants() {
        let root = TransformNode::new("root")
            .with_size_delta(v(100.0, 200.0))
            .with_child(
                TransformNode::new("stretch")
                    .with_anchors(v(0.0, 0.25), v(1.0, 0.75))
                    .with_size_delta(v(-10.0, 20.0))
                    .with_child(TransformNode::new("leaf").with_size_delta(v(5.0, 5.0))),
            );
        let tree = LayerTree::build(root, AnchorFormula::PivotBlend).unwrap();

        for layer in tree.layers() {
            let g = layer.geometry();
            let sd = layer.node().size_delta;
            assert!(g.size.all_ge(&sd), "{}", layer.name());
            assert!(vectors_approx_eq(&(g.pos_max - g.pos_min), &g.size));
        }

        let stretch = tree.geometry(tree.find("stretch").unwrap());
        assert!(vectors_approx_eq(&stretch.size, &v(90.0, 120.0)));
        let leaf = tree.find("leaf").unwrap();
        assert_eq!(tree.depth(leaf), 3);
        assert_eq!(tree.parent(leaf), tree.find("stretch"));
        assert_eq!(tree.children(tree.root()).len(), 1);
    }

    #[test]
    fn test_anchor_formulas_diverge_only_when_stretched() {
        let child = TransformNode::new("child")
            .with_anchors(v(0.0, 0.5), v(1.0, 0.5))
            .with_pivot(v(0.0, 0.0))
            .with_size_delta(v(10.0, 10.0));
        let root = TransformNode::new("root")
            .with_size_delta(v(100.0, 100.0))
            .with_pivot(v(0.0, 0.0))
            .with_child(child);

        let blend = LayerTree::build(root.clone(), AnchorFormula::PivotBlend).unwrap();
        let mid = LayerTree::build(root, AnchorFormula::Midpoint).unwrap();
        let id = blend.find("child").unwrap();

        // x 方向拉伸：轴心 0 时混合公式取左边缘，中点公式取中心
        assert!(approx_eq(blend.geometry(id).anchor_position.x, 0.0));
        assert!(approx_eq(mid.geometry(id).anchor_position.x, 50.0));
        // y 方向未拉伸，两者一致
        assert!(approx_eq(blend.geometry(id).anchor_position.y, 50.0));
        assert!(approx_eq(mid.geometry(id).anchor_position.y, 50.0));
    }

    #[test]
    fn test_missing_face_is_structural() {
        let tree = LayerTree::build(scenario_a(), AnchorFormula::PivotBlend).unwrap();
        let mut map = tree.flatten();
        let err = tree.attach_face(&mut map).unwrap_err();
        assert_eq!(err, StructuralError::MissingNode("face".to_string()));
        assert_eq!(map.len(), 3);
    }

    #[test]
    fn test_face_attached_from_root_child() {
        let root = scenario_a().with_child(TransformNode::new("face").with_size_delta(v(40.0, 40.0)));
        let tree = LayerTree::build(root, AnchorFormula::PivotBlend).unwrap();
        let mut map = tree.flatten();
        let face = tree.attach_face(&mut map).unwrap();
        assert_eq!(map.get_index_of("face"), Some(3));
        assert_eq!(tree.layer(face).name(), "face");
    }

    #[test]
    fn test_non_finite_geometry_fails() {
        let root = TransformNode::new("root")
            .with_size_delta(v(100.0, 100.0))
            .with_child(TransformNode::new("bad").with_anchored_position(v(f64::NAN, 0.0)));
        let err = LayerTree::build(root, AnchorFormula::PivotBlend).unwrap_err();
        assert!(matches!(
            err,
            LayerError::Geometry(GeometryError::NonFinite { ref layer, .. }) if layer == "bad"
        ));

        let root = TransformNode::new("root").with_size_delta(v(-1.0, 5.0));
        let err = LayerTree::build(root, AnchorFormula::PivotBlend).unwrap_err();
        assert!(matches!(err, LayerError::Geometry(GeometryError::Negative { .. })));

        let root = TransformNode::new("root").with_anchors(v(1.0, 0.0), v(0.0, 0.0));
        let err = LayerTree::build(root, AnchorFormula::PivotBlend).unwrap_err();
        assert!(matches!(err, LayerError::Geometry(GeometryError::InvertedAnchors { .. })));
    }

    #[test]
    fn test_negative_canvas_size_fails() {
        // 两个负分量的乘积大于纹理面积，画布尺寸取到 size_delta
        let root = TransformNode::new("stage").with_size_delta(v(400.0, 300.0)).with_child(
            textured("panel", "panel", 10, 10)
                .with_anchors(v(0.0, 0.0), v(1.0, 1.0))
                .with_size_delta(v(-100.0, -100.0)),
        );
        let err = LayerTree::build(root, AnchorFormula::PivotBlend).unwrap_err();
        assert!(matches!(
            err,
            LayerError::Geometry(GeometryError::Negative { ref layer, quantity: "canvas_size", .. }) if layer == "panel"
        ));
    }

    #[test]
    fn test_sprite_and_canvas_size() {
        let mesh = MeshRecord {
            name: "m".to_string(),
            vertices: vec![v(0.0, 0.0), v(0.0, 300.0), v(200.0, 300.0), v(200.0, 0.0)],
            uvs: vec![v(0.0, 0.0), v(0.0, 1.0), v(1.0, 1.0), v(1.0, 0.0)],
            indices: vec![0, 1, 2, 2, 3, 0],
        };
        let root = textured("root", "tex", 128, 128)
            .with_mesh(mesh)
            .with_size_delta(v(100.0, 100.0))
            .with_raw_sprite_size(v(150.0, 150.0));
        let tree = LayerTree::build(root, AnchorFormula::PivotBlend).unwrap();
        let g = tree.geometry(tree.root());

        assert_eq!(g.mesh_size, Some(v(200.0, 300.0)));
        // 网格面积更大，原始尺寸提示被忽略
        assert_eq!(g.sprite_size, Some(v(200.0, 300.0)));
        assert!(vectors_approx_eq(&g.canvas_size, &v(200.0, 300.0)));
        assert_eq!(tree.layer(tree.root()).decoded_dimensions(), Some((200, 300)));
    }

    #[test]
    fn test_canvas_box_floor_ceil() {
        let root = textured("root", "tex", 10, 10)
            .with_size_delta(v(40.0, 40.0))
            .with_pivot(v(0.0, 0.0))
            .with_anchored_position(v(0.4, 0.4));
        let tree = LayerTree::build(root, AnchorFormula::PivotBlend).unwrap();
        let meta = MetaInfo {
            source: String::new(),
            name: "root".to_string(),
            size: v(40.0, 40.0),
            bias: v(10.2, 10.2),
        };
        let rect = tree.layer(tree.root()).canvas_box(&meta, None);
        // (10.6, 10.6) → x 向下取整，y 向上取整
        assert_eq!(rect, PixelRect::new(10, 11, 40, 40));
    }
}
