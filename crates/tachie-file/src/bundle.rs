//! 目录资源存储
//!
//! 把一个解包后的资源目录作为 [`AssetStore`]：
//!
//! ```text
//! <dir>/scene.json                  节点树
//! <dir>/textures/<name>.png         图层纹理（编码图集）
//! <dir>/paintingface/<index>.png    表情差分
//! <dir>/<kind>/<stem>.png           图标
//! <dir>/output/...                  写回结果，目录结构同上
//! ```
//!
//! 向量字段接受 `[x, y]` 或 `{ "x": .., "y": .. }` 两种写法，在这里统一为 [`Vector2`]。
//! PNG 在磁盘上是自上而下的，读入与写出时翻转为 Y 轴向上。

use crate::error::FileError;
use image::{imageops, RgbaImage};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tachie_core::asset::{AssetStore, MeshRecord, NodePatch, TextureRef, TransformNode, WriteTarget};
use tachie_core::math::Vector2;
use tachie_core::meta::name_stem;
use tachie_core::swatch::{parse_face_index, ICON_KINDS};
use tracing::debug;

/// 节点树文件名
pub const SCENE_FILE: &str = "scene.json";

const TEXTURE_DIR: &str = "textures";
const FACE_DIR: &str = "paintingface";
const OUTPUT_DIR: &str = "output";

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(untagged)]
enum RawVector {
    Pair([f64; 2]),
    Object {
        #[serde(alias = "X")]
        x: f64,
        #[serde(alias = "Y")]
        y: f64,
    },
}

impl From<RawVector> for Vector2 {
    fn from(raw: RawVector) -> Self {
        match raw {
            RawVector::Pair([x, y]) => Vector2::new(x, y),
            RawVector::Object { x, y } => Vector2::new(x, y),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawTexture {
    Sized { name: String, width: u32, height: u32 },
    Named(String),
}

#[derive(Debug, Deserialize)]
struct RawMesh {
    #[serde(default)]
    name: String,
    vertices: Vec<RawVector>,
    uvs: Vec<RawVector>,
    indices: Vec<u32>,
}

#[derive(Debug, Deserialize)]
struct RawNode {
    name: String,
    local_position: Option<RawVector>,
    local_scale: Option<RawVector>,
    anchor_min: Option<RawVector>,
    anchor_max: Option<RawVector>,
    anchored_position: Option<RawVector>,
    size_delta: Option<RawVector>,
    pivot: Option<RawVector>,
    texture: Option<RawTexture>,
    mesh: Option<RawMesh>,
    raw_sprite_size: Option<RawVector>,
    asset_path: Option<String>,
    #[serde(default)]
    children: Vec<RawNode>,
}

/// 基于目录的资源存储
#[derive(Debug, Clone)]
pub struct DirectoryStore {
    root: PathBuf,
    output: PathBuf,
    scene: TransformNode,
    stem: String,
}

impl DirectoryStore {
    /// 打开资源目录并解析节点树
    pub fn open(root: impl AsRef<Path>) -> Result<Self, FileError> {
        let root = root.as_ref().to_path_buf();
        let scene_path = root.join(SCENE_FILE);
        if !scene_path.exists() {
            return Err(FileError::AssetNotFound(scene_path.display().to_string()));
        }

        let raw: RawNode = serde_json::from_str(&fs::read_to_string(&scene_path)?)?;
        let scene = convert_node(raw, &root)?;
        let stem = name_stem(&scene.name);
        debug!("Opened asset directory {} ({})", root.display(), scene.name);

        Ok(Self {
            output: root.join(OUTPUT_DIR),
            root,
            scene,
            stem,
        })
    }

    /// 改变写回目录
    pub fn with_output_dir(mut self, output: impl Into<PathBuf>) -> Self {
        self.output = output.into();
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn output_dir(&self) -> &Path {
        &self.output
    }

    fn icon_path(&self, base: &Path, kind: &str) -> PathBuf {
        base.join(kind).join(format!("{}.png", self.stem))
    }

    fn target_path(&self, target: &WriteTarget) -> PathBuf {
        match target {
            WriteTarget::Painting { texture, .. } => self.output.join(TEXTURE_DIR).join(format!("{texture}.png")),
            WriteTarget::Face { name } => self.output.join(FACE_DIR).join(format!("{name}.png")),
            WriteTarget::Icon { kind } => self.icon_path(&self.output, kind),
        }
    }
}

impl AssetStore for DirectoryStore {
    type Error = FileError;

    fn root_node(&self) -> Result<TransformNode, FileError> {
        Ok(self.scene.clone())
    }

    fn load_texture(&self, texture: &TextureRef) -> Result<RgbaImage, FileError> {
        load_png(&texture_path(&self.root, &texture.name))
    }

    fn face_swatch_names(&self) -> Result<Vec<String>, FileError> {
        let dir = self.root.join(FACE_DIR);
        if !dir.is_dir() {
            return Ok(Vec::new());
        }

        let mut names: Vec<(u32, String)> = Vec::new();
        for entry in fs::read_dir(&dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("png") {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                if let Some(index) = parse_face_index(stem) {
                    names.push((index, stem.to_string()));
                }
            }
        }
        names.sort();
        Ok(names.into_iter().map(|(_, name)| name).collect())
    }

    fn load_face_swatch(&self, name: &str) -> Result<RgbaImage, FileError> {
        load_png(&self.root.join(FACE_DIR).join(format!("{name}.png")))
    }

    fn icon_kinds(&self) -> Result<Vec<String>, FileError> {
        Ok(ICON_KINDS
            .iter()
            .filter(|kind| self.icon_path(&self.root, kind).is_file())
            .map(|kind| kind.to_string())
            .collect())
    }

    fn load_icon(&self, kind: &str) -> Result<RgbaImage, FileError> {
        load_png(&self.icon_path(&self.root, kind))
    }

    fn write_texture(&self, target: &WriteTarget, image: &RgbaImage) -> Result<String, FileError> {
        let path = self.target_path(target);
        save_png(&path, image)?;
        Ok(path.display().to_string())
    }

    fn write_node_patch(&self, node: &str, patch: &NodePatch) -> Result<String, FileError> {
        let out = self.output.join(SCENE_FILE);
        // 多次修补时在已写出的结果上继续
        let source = if out.exists() { out.clone() } else { self.root.join(SCENE_FILE) };
        let mut scene: serde_json::Value = serde_json::from_str(&fs::read_to_string(&source)?)?;

        let target = find_node_mut(&mut scene, node).ok_or_else(|| FileError::AssetNotFound(node.to_string()))?;
        let pair = |v: Vector2| serde_json::json!([v.x, v.y]);
        target["size_delta"] = pair(patch.size_delta);
        target["pivot"] = pair(patch.pivot);
        target["anchored_position"] = pair(patch.anchored_position);

        if let Some(parent) = out.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&out, serde_json::to_string_pretty(&scene)?)?;
        Ok(out.display().to_string())
    }
}

fn texture_path(root: &Path, name: &str) -> PathBuf {
    root.join(TEXTURE_DIR).join(format!("{name}.png"))
}

fn convert_node(raw: RawNode, root: &Path) -> Result<TransformNode, FileError> {
    let mut node = TransformNode::new(raw.name);
    let fields = [
        (&mut node.local_position, raw.local_position),
        (&mut node.local_scale, raw.local_scale),
        (&mut node.anchor_min, raw.anchor_min),
        (&mut node.anchor_max, raw.anchor_max),
        (&mut node.anchored_position, raw.anchored_position),
        (&mut node.size_delta, raw.size_delta),
        (&mut node.pivot, raw.pivot),
    ];
    for (field, value) in fields {
        if let Some(value) = value {
            *field = value.into();
        }
    }

    node.texture = match raw.texture {
        Some(RawTexture::Sized { name, width, height }) => Some(TextureRef::new(name, width, height)),
        Some(RawTexture::Named(name)) => {
            let (width, height) = image::image_dimensions(texture_path(root, &name))?;
            Some(TextureRef::new(name, width, height))
        }
        None => None,
    };
    node.mesh = raw.mesh.map(|mesh| MeshRecord {
        name: mesh.name,
        vertices: mesh.vertices.into_iter().map(Vector2::from).collect(),
        uvs: mesh.uvs.into_iter().map(Vector2::from).collect(),
        indices: mesh.indices,
    });
    node.raw_sprite_size = raw.raw_sprite_size.map(Vector2::from);
    node.asset_path = raw.asset_path;
    node.children = raw
        .children
        .into_iter()
        .map(|child| convert_node(child, root))
        .collect::<Result<_, _>>()?;
    Ok(node)
}

fn find_node_mut<'a>(value: &'a mut serde_json::Value, name: &str) -> Option<&'a mut serde_json::Value> {
    if value.get("name").and_then(|n| n.as_str()) == Some(name) {
        return Some(value);
    }
    value
        .get_mut("children")?
        .as_array_mut()?
        .iter_mut()
        .find_map(|child| find_node_mut(child, name))
}

/// 读取 PNG 并翻转为 Y 轴向上
pub fn load_png(path: &Path) -> Result<RgbaImage, FileError> {
    if !path.is_file() {
        return Err(FileError::AssetNotFound(path.display().to_string()));
    }
    let image = image::open(path)?.to_rgba8();
    Ok(imageops::flip_vertical(&image))
}

/// 把 Y 轴向上的图像翻转后写为 PNG
pub fn save_png(path: &Path, image: &RgbaImage) -> Result<(), FileError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    imageops::flip_vertical(image).save(path)?;
    Ok(())
}
