//! 文档级元信息
//!
//! 每次分析产生一份，之后以只读方式显式传给每个图层与差分，不跨文档共享。

use crate::layer::{LayerMap, LayerTree};
use crate::math::{Vector2, Vector2Ext};
use serde::{Deserialize, Serialize};

/// 画布尺寸与偏移
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetaInfo {
    /// 来源（资源包路径或目录）
    pub source: String,

    /// 根节点名称
    pub name: String,

    /// 所有图层矩形的包围并集尺寸（取整）
    pub size: Vector2,

    /// 使全局最小角落在 (0,0) 的平移量
    pub bias: Vector2,
}

impl MetaInfo {
    /// 从文档图层集合计算
    ///
    /// 集合为空时尺寸与偏移均为零。
    pub fn compute(source: impl Into<String>, tree: &LayerTree, layers: &LayerMap) -> Self {
        let bounds = layers
            .values()
            .map(|&id| tree.geometry(id).bounds())
            .reduce(|a, b| a.union(&b));

        let (size, bias) = match bounds {
            Some(b) => (b.size().rounded(), -b.min),
            None => (Vector2::zeros(), Vector2::zeros()),
        };

        Self {
            source: source.into(),
            name: tree.layer(tree.root()).name().to_string(),
            size,
            bias,
        }
    }

    /// 根节点名的基础名，见 [`name_stem`]
    pub fn name_stem(&self) -> String {
        name_stem(&self.name)
    }

    /// 画布整数宽高
    pub fn canvas_dimensions(&self) -> (u32, u32) {
        (self.size.x.max(0.0) as u32, self.size.y.max(0.0) as u32)
    }
}

/// 去掉 `_ex`、`_n` 后缀并转小写的基础名，用于定位表情与图标资源
pub fn name_stem(name: &str) -> String {
    let name = name.strip_suffix("_ex").unwrap_or(name);
    let name = name.strip_suffix("_n").unwrap_or(name);
    name.to_lowercase()
}

impl std::fmt::Display for MetaInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "<MetaInfo name={}, size=({}, {}), bias=({}, {})>: {}",
            self.name, self.size.x, self.size.y, self.bias.x, self.bias.y, self.source
        )
    }
}
