//! 导出模块
//!
//! 把分层文档的每个栅格图层写成单独的 PNG，并附带 `layers.json` 清单。

use crate::error::FileError;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tachie_core::compose::{Element, LayeredImage, RasterLayer};
use tachie_core::math::PixelRect;
use tracing::info;

/// 清单文件名
pub const MANIFEST_FILE: &str = "layers.json";

/// 清单条目
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ManifestEntry {
    pub name: String,
    pub file: String,
    /// 图层自身的可见性
    pub visible: bool,
    /// 所在分组
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    pub rect: PixelRect,
}

/// 文档清单
#[derive(Debug, Clone, Serialize)]
pub struct Manifest {
    pub width: u32,
    pub height: u32,
    /// 自上而下
    pub layers: Vec<ManifestEntry>,
}

/// 文件名中不允许的字符替换为 `_`
fn file_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c => c,
        })
        .collect();
    format!("{cleaned}.png")
}

fn collect<'a>(elements: &'a [Element], group: Option<&str>, out: &mut Vec<(&'a RasterLayer, Option<String>)>) {
    for element in elements {
        match element {
            Element::Raster(raster) => out.push((raster, group.map(str::to_string))),
            Element::Group { name, children, .. } => collect(children, Some(name), out),
        }
    }
}

/// 写出每个栅格图层（像素自上而下，原样保存）与清单，返回写出的文件
pub fn dump_layers(image: &LayeredImage, dir: &Path) -> Result<Vec<PathBuf>, FileError> {
    fs::create_dir_all(dir)?;

    let mut rasters = Vec::new();
    collect(&image.elements, None, &mut rasters);

    let mut written = Vec::with_capacity(rasters.len() + 1);
    let mut layers = Vec::with_capacity(rasters.len());
    for (raster, group) in rasters {
        let file = file_name(&raster.name);
        let path = dir.join(&file);
        raster.pixels.save(&path)?;
        written.push(path);
        layers.push(ManifestEntry {
            name: raster.name.clone(),
            file,
            visible: raster.visible,
            group,
            rect: raster.rect,
        });
    }

    let manifest = Manifest {
        width: image.width,
        height: image.height,
        layers,
    };
    let path = dir.join(MANIFEST_FILE);
    fs::write(&path, serde_json::to_string_pretty(&manifest)?)?;
    written.push(path);

    info!("Dumped {} layers to {}", manifest.layers.len(), dir.display());
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    fn raster(name: &str, visible: bool, x: i64) -> Element {
        Element::Raster(RasterLayer {
            name: name.to_string(),
            visible,
            rect: PixelRect::new(x, 0, 2, 1),
            pixels: RgbaImage::from_pixel(2, 1, Rgba([1, 2, 3, 255])),
        })
    }

    #[test]
    fn test_file_name() {
        assert_eq!(file_name("hat [hat]"), "hat [hat].png");
        assert_eq!(file_name("a/b:c"), "a_b_c.png");
    }

    #[test]
    fn test_dump_layers() {
        let dir = tempfile::tempdir().unwrap();
        let image = LayeredImage {
            width: 4,
            height: 1,
            elements: vec![
                Element::Group {
                    name: "paintingface".to_string(),
                    visible: false,
                    children: vec![raster("face #0", false, 0)],
                },
                raster("body [body]", true, 2),
            ],
        };

        let written = dump_layers(&image, dir.path()).unwrap();
        assert_eq!(written.len(), 3);
        assert!(dir.path().join("face #0.png").is_file());

        let manifest: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(dir.path().join(MANIFEST_FILE)).unwrap()).unwrap();
        assert_eq!(manifest["layers"][0]["group"], "paintingface");
        assert_eq!(manifest["layers"][1]["rect"]["x"], 2);
        assert!(manifest["layers"][1].get("group").is_none());
        assert_eq!(manifest["layers"][1]["visible"], true);
    }
}
