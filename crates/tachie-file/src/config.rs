//! 会话选项
//!
//! 选项随调用显式传入，不做全局保存；宿主自行决定序列化后的存放位置。

use serde::{Deserialize, Serialize};
use tachie_core::layer::AnchorFormula;
use tachie_core::raster::Resample;
use tachie_core::swatch::FaceMode;

/// 分析、导入与导出选项
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Options {
    /// 锚点位置公式
    pub anchor_formula: AnchorFormula,
    /// 表情差分裁剪模式
    pub face_mode: FaceMode,
    /// 表情差分是否按表情框裁掉多余部分
    pub face_clip: bool,
    /// 缩放滤波器
    pub resample: Resample,
    /// 解码时额外把每个图层写成 PNG
    pub dump_layers: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            anchor_formula: AnchorFormula::PivotBlend,
            face_mode: FaceMode::Off,
            face_clip: false,
            resample: Resample::Bicubic,
            dump_layers: false,
        }
    }
}
