//! 首选区域查找
//!
//! 在文档图层中寻找完整包含探针图层矩形的最小（或最大）图层，
//! 用于决定表情差分和图标裁剪借用哪一块周围画面。

use crate::layer::{LayerId, LayerMap, LayerTree, StructuralError, FACE_NAME};
use crate::math::Vector2Ext;
use serde::{Deserialize, Serialize};

/// 候选选择方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegionPreference {
    /// 面积最小的包含图层
    #[default]
    Smallest,
    /// 面积最大的包含图层
    Largest,
}

/// 查找包含 `probe` 的首选图层
///
/// 探针自身与名为 `face` 的图层不参与候选。面积按 `canvas_size` 计算。
pub fn preferred_region(
    tree: &LayerTree,
    layers: &LayerMap,
    probe: LayerId,
    preference: RegionPreference,
) -> Result<LayerId, StructuralError> {
    let candidates = layers
        .values()
        .copied()
        .filter(|&id| id != probe && tree.layer(id).name() != FACE_NAME)
        .filter(|&id| tree.contains(id, probe));

    let area = |id: &LayerId| tree.geometry(*id).canvas_size.prod();
    let found = match preference {
        RegionPreference::Smallest => candidates.min_by(|a, b| area(a).total_cmp(&area(b))),
        RegionPreference::Largest => candidates.max_by(|a, b| area(a).total_cmp(&area(b))),
    };

    found.ok_or_else(|| StructuralError::NoEnclosingLayer(tree.layer(probe).name().to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asset::{TextureRef, TransformNode};
    use crate::layer::AnchorFormula;
    use crate::math::Vector2;

    fn v(x: f64, y: f64) -> Vector2 {
        Vector2::new(x, y)
    }

    fn textured(name: &str, w: u32, h: u32, size: Vector2) -> TransformNode {
        TransformNode::new(name)
            .with_texture(TextureRef::new(name, w, h))
            .with_size_delta(size)
    }

    fn nested_tree() -> (LayerTree, LayerMap) {
        let root = textured("base", 1000, 1000, v(1000.0, 1000.0))
            .with_child(
                textured("body", 400, 400, v(400.0, 400.0))
                    .with_child(textured("head", 200, 200, v(200.0, 200.0)).with_anchored_position(v(0.0, 50.0))),
            )
            .with_child(textured("side", 100, 100, v(100.0, 100.0)).with_anchored_position(v(400.0, 0.0)))
            .with_child(TransformNode::new("face").with_size_delta(v(50.0, 50.0)).with_anchored_position(v(0.0, 60.0)));
        let tree = LayerTree::build(root, AnchorFormula::PivotBlend).unwrap();
        let mut map = tree.flatten();
        tree.attach_face(&mut map).unwrap();
        (tree, map)
    }

    #[test]
    fn test_smallest_enclosing() {
        let (tree, map) = nested_tree();
        let face = map["face"];

        let found = preferred_region(&tree, &map, face, RegionPreference::Smallest).unwrap();
        assert_eq!(tree.layer(found).name(), "head");
        assert!(tree.contains(found, face));

        // 不存在更小的包含图层
        let area = tree.geometry(found).canvas_size.prod();
        for &id in map.values() {
            if id != face && id != found && tree.contains(id, face) {
                assert!(tree.geometry(id).canvas_size.prod() >= area);
            }
        }

        let found = preferred_region(&tree, &map, face, RegionPreference::Largest).unwrap();
        assert_eq!(tree.layer(found).name(), "base");
    }

    #[test]
    fn test_probe_excluded() {
        let (tree, map) = nested_tree();
        let found = preferred_region(&tree, &map, map["side"], RegionPreference::Smallest).unwrap();
        assert_eq!(tree.layer(found).name(), "base");
    }

    #[test]
    fn test_no_enclosing_layer() {
        let (tree, mut map) = nested_tree();
        map.shift_remove("base");
        let err = preferred_region(&tree, &map, map["side"], RegionPreference::Smallest).unwrap_err();
        assert_eq!(err, StructuralError::NoEnclosingLayer("side".to_string()));
    }
}
