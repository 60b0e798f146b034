//! 立绘文档会话
//!
//! 一次“分析”产生一个 [`Document`]：图层树、文档元信息、表情差分与图标。
//! 之后的导入只在这份状态上挂替换图像，下一次分析会整体丢弃它们。
//!
//! 批量操作（解码、导入、写回）按条目并行执行，单个条目失败只记录在结果中，
//! 不影响同一批次的其它条目。

use crate::bundle::load_png;
use crate::config::Options;
use crate::error::FileError;
use crate::export::dump_layers;
use crate::psd::write_psd;
use image::RgbaImage;
use indexmap::IndexMap;
use rayon::prelude::*;
use std::collections::HashMap;
use std::fs;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use tachie_core::asset::{AssetStore, NodePatch, WriteTarget};
use tachie_core::codec::{AtlasCodec, CodecError};
use tachie_core::compose::{LayerDocumentComposer, LayeredImage};
use tachie_core::layer::{Layer, LayerId, LayerMap, LayerTree, StructuralError, FACE_NAME};
use tachie_core::meta::MetaInfo;
use tachie_core::raster;
use tachie_core::region::{preferred_region, RegionPreference};
use tachie_core::swatch::{self, FaceMode, FaceSwatch, IconPreset, IconSwatch};
use tracing::{debug, info, warn};

/// 单个条目的处理结果
pub type Outcome<T> = (String, Result<T, FileError>);

/// 解码结果
#[derive(Debug)]
pub struct DecodeReport {
    pub image: LayeredImage,
    /// 解码失败的图层
    pub failures: Vec<(String, FileError)>,
}

/// 立绘文档
#[derive(Debug)]
pub struct Document {
    options: Options,
    tree: LayerTree,
    layers: LayerMap,
    meta: MetaInfo,
    face: Option<LayerId>,
    preferred: Option<LayerId>,
    /// 按序号排列
    faces: Vec<FaceSwatch>,
    icons: IndexMap<String, IconSwatch>,
}

impl Document {
    /// 分析资源：构建图层树、定位表情、计算元信息并加载差分与图标
    ///
    /// 缺少 `face` 节点时表情相关功能被禁用；几何错误直接返回。
    pub fn analyze<S>(store: &S, source: impl Into<String>, options: Options) -> Result<Self, FileError>
    where
        S: AssetStore,
        FileError: From<S::Error>,
    {
        let root = store.root_node()?;
        let tree = LayerTree::build(root, options.anchor_formula)?;
        let mut layers = tree.flatten();

        let face = match tree.attach_face(&mut layers) {
            Ok(id) => Some(id),
            Err(e) => {
                warn!("{}; paintingface disabled", e);
                None
            }
        };
        let meta = MetaInfo::compute(source, &tree, &layers);
        for &id in layers.values() {
            debug!("{}", tree.describe(id));
        }

        let mut document = Self {
            options,
            tree,
            layers,
            meta,
            face,
            preferred: None,
            faces: Vec::new(),
            icons: IndexMap::new(),
        };
        document.preferred = document.resolve_preferred(options.face_mode.preference());

        if face.is_some() {
            document.faces = load_faces(store)?;
        }
        document.icons = load_icons(store)?;

        info!(
            "Analyzed {} layers, {} faces, {} icons: {}",
            document.layers.len(),
            document.faces.len(),
            document.icons.len(),
            document.meta
        );
        Ok(document)
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    pub fn tree(&self) -> &LayerTree {
        &self.tree
    }

    pub fn layers(&self) -> &LayerMap {
        &self.layers
    }

    pub fn meta(&self) -> &MetaInfo {
        &self.meta
    }

    /// `face` 图层（不存在时为空）
    pub fn face(&self) -> Option<LayerId> {
        self.face
    }

    /// 表情的首选包含图层
    pub fn preferred(&self) -> Option<LayerId> {
        self.preferred
    }

    pub fn faces(&self) -> &[FaceSwatch] {
        &self.faces
    }

    pub fn icons(&self) -> &IndexMap<String, IconSwatch> {
        &self.icons
    }

    fn resolve_preferred(&self, preference: RegionPreference) -> Option<LayerId> {
        let face = self.face?;
        match preferred_region(&self.tree, &self.layers, face, preference) {
            Ok(id) => Some(id),
            Err(e) => {
                warn!("{}", e);
                None
            }
        }
    }

    fn face_context(&self) -> Result<(LayerId, LayerId), FileError> {
        let face = self
            .face
            .ok_or_else(|| StructuralError::MissingNode(FACE_NAME.to_string()))?;
        let preferred = self
            .preferred
            .ok_or_else(|| StructuralError::NoEnclosingLayer(FACE_NAME.to_string()))?;
        Ok((face, preferred))
    }

    /// 切换表情裁剪模式，重新裁剪已导入的差分
    pub fn set_face_mode(&mut self, mode: FaceMode, clip: bool) {
        self.options.face_mode = mode;
        self.options.face_clip = clip;
        self.preferred = self.resolve_preferred(mode.preference());

        let Ok((face, preferred)) = self.face_context() else {
            return;
        };
        for swatch in &mut self.faces {
            if let Some(full) = &swatch.full {
                swatch.replacement = Some(swatch::crop_face(
                    full,
                    &self.tree,
                    &self.meta,
                    face,
                    preferred,
                    mode,
                    clip,
                ));
            }
        }
    }

    /// 并行解码所有立绘图层并合成分层文档
    pub fn decode<S>(&self, store: &S) -> Result<DecodeReport, FileError>
    where
        S: AssetStore,
        FileError: From<S::Error>,
    {
        let ids: Vec<LayerId> = self
            .layers
            .iter()
            .filter(|(key, _)| key.as_str() != FACE_NAME)
            .map(|(_, &id)| id)
            .collect();

        let codec = AtlasCodec::new(self.options.resample);
        let results = codec.decode_layers(&self.tree, &ids, |layer| -> Result<RgbaImage, FileError> {
            let texture = layer
                .texture()
                .ok_or_else(|| CodecError::NoTexture(layer.name().to_string()))?;
            Ok(store.load_texture(texture)?)
        });

        let mut decoded = HashMap::with_capacity(results.len());
        let mut failures = Vec::new();
        for (id, result) in results {
            match result {
                Ok(image) => {
                    decoded.insert(id, image);
                }
                Err(e) => {
                    let name = self.tree.layer(id).name().to_string();
                    warn!("Failed to decode {}: {}", name, e);
                    failures.push((name, e));
                }
            }
        }

        let composer = LayerDocumentComposer::new(&self.tree, &self.meta, self.options.resample);
        let image = composer.compose(&self.layers, &decoded, &self.faces);
        info!("Decoded {} layers ({} failed)", decoded.len(), failures.len());
        Ok(DecodeReport { image, failures })
    }

    /// 写出 `<name>.psd`；`dump_layers` 打开时同时写出各图层 PNG
    pub fn export(&self, report: &DecodeReport, dir: &Path) -> Result<Vec<PathBuf>, FileError> {
        fs::create_dir_all(dir)?;
        let psd = dir.join(format!("{}.psd", self.meta.name));
        let mut writer = BufWriter::new(fs::File::create(&psd)?);
        write_psd(&report.image, &mut writer)?;
        info!("Wrote {}", psd.display());

        let mut written = vec![psd];
        if self.options.dump_layers {
            written.extend(dump_layers(&report.image, &dir.join(&self.meta.name))?);
        }
        Ok(written)
    }

    /// 导入立绘图层
    ///
    /// 文件名（不含扩展名）与图层名相同时导入：在全画布图像上按图层画布框裁剪，
    /// 缩放到精灵尺寸。没有对应图层的文件返回 `Ok(None)`。
    pub fn import_paintings(&mut self, paths: &[PathBuf]) -> Vec<Outcome<Option<String>>> {
        let loaded: Vec<_> = paths
            .par_iter()
            .map(|path| (path, self.load_painting(path)))
            .collect();

        let mut outcomes = Vec::with_capacity(loaded.len());
        for (path, result) in loaded {
            let label = path.display().to_string();
            let result = result.map(|found| {
                found.map(|(key, id, image)| {
                    let layer = self.tree.layer_mut(id);
                    layer.replacement = Some(image);
                    layer.source_path = Some(path.clone());
                    info!("Painting '{}' <- {}", key, label);
                    key
                })
            });
            if let Err(e) = &result {
                warn!("Failed to import {}: {}", label, e);
            }
            outcomes.push((label, result));
        }
        outcomes
    }

    fn load_painting(&self, path: &Path) -> Result<Option<(String, LayerId, RgbaImage)>, FileError> {
        let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
            return Ok(None);
        };
        let Some(&id) = self.layers.get(stem).filter(|_| stem != FACE_NAME) else {
            return Ok(None);
        };

        let layer = self.tree.layer(id);
        let (width, height) = layer
            .decoded_dimensions()
            .ok_or_else(|| CodecError::NoTexture(layer.name().to_string()))?;
        let full = load_png(path)?;
        let area = layer.canvas_box(&self.meta, Some(layer.geometry().canvas_size));
        let cropped = raster::crop_padded(&full, area);
        let image = raster::resize_to(&cropped, width, height, self.options.resample);
        Ok(Some((stem.to_string(), id, image)))
    }

    /// 从目录导入表情差分（`<index>.png` 全画布图像）
    pub fn import_faces(&mut self, dir: &Path) -> Result<Vec<Outcome<()>>, FileError> {
        let (face, preferred) = self.face_context()?;
        let (mode, clip) = (self.options.face_mode, self.options.face_clip);

        let jobs: Vec<(usize, PathBuf)> = self
            .faces
            .iter()
            .enumerate()
            .map(|(i, swatch)| (i, dir.join(format!("{}.png", swatch.name))))
            .filter(|(_, path)| path.is_file())
            .collect();

        let loaded: Vec<_> = jobs
            .par_iter()
            .map(|(i, path)| {
                let result = load_png(path).map(|full| {
                    let cropped = swatch::crop_face(&full, &self.tree, &self.meta, face, preferred, mode, clip);
                    (full, cropped)
                });
                (*i, path, result)
            })
            .collect();

        let mut outcomes = Vec::with_capacity(loaded.len());
        for (i, path, result) in loaded {
            let swatch = &mut self.faces[i];
            let result = result.map(|(full, cropped)| {
                swatch.full = Some(full);
                swatch.replacement = Some(cropped);
                swatch.source_path = Some(path.clone());
                info!("Paintingface #{} <- {}", swatch.index, path.display());
            });
            if let Err(e) = &result {
                warn!("Failed to import face #{}: {}", swatch.index, e);
            }
            outcomes.push((swatch.name.clone(), result));
        }
        Ok(outcomes)
    }

    /// 导入图标：文件名必须是已存在的图标种类，缩放到预设纹理尺寸
    pub fn import_icons(
        &mut self,
        paths: &[PathBuf],
        presets: &IndexMap<String, IconPreset>,
    ) -> Vec<Outcome<Option<String>>> {
        let resample = self.options.resample;
        let icons = &self.icons;
        let loaded: Vec<_> = paths
            .par_iter()
            .map(|path| {
                let kind = path
                    .file_stem()
                    .and_then(|s| s.to_str())
                    .filter(|kind| icons.contains_key(*kind));
                let result = match kind.and_then(|kind| presets.get(kind).map(|preset| (kind, preset))) {
                    Some((kind, preset)) => load_png(path).map(|image| {
                        let (w, h) = preset.texture_dimensions();
                        Some((kind.to_string(), raster::resize_to(&image, w, h, resample)))
                    }),
                    None => Ok(None),
                };
                (path, result)
            })
            .collect();

        let mut outcomes = Vec::with_capacity(loaded.len());
        for (path, result) in loaded {
            let label = path.display().to_string();
            let result = result.map(|found| {
                found.and_then(|(kind, image)| {
                    let icon = self.icons.get_mut(&kind)?;
                    icon.replacement = Some(image);
                    icon.source_path = Some(path.clone());
                    info!("Icon '{}' <- {}", kind, label);
                    Some(kind)
                })
            });
            if let Err(e) = &result {
                warn!("Failed to import {}: {}", label, e);
            }
            outcomes.push((label, result));
        }
        outcomes
    }

    /// 从全画布参考图围绕表情中心裁出各种图标
    pub fn clip_icons(
        &self,
        reference: &Path,
        presets: &IndexMap<String, IconPreset>,
    ) -> Result<Vec<Outcome<RgbaImage>>, FileError> {
        let face = self
            .face
            .ok_or_else(|| StructuralError::MissingNode(FACE_NAME.to_string()))?;
        let preferred = preferred_region(&self.tree, &self.layers, face, RegionPreference::Smallest)?;

        let full = load_png(reference)?;
        let (source, center) =
            swatch::icon_reference(&full, &self.tree, &self.meta, face, preferred, self.options.resample);

        let outcomes: Vec<_> = presets
            .par_iter()
            .map(|(kind, preset)| {
                let result = swatch::clip_icon(kind, &source, center, preset).map_err(FileError::from);
                if let Err(e) = &result {
                    warn!("Failed to clip {}: {}", kind, e);
                }
                (kind.clone(), result)
            })
            .collect();
        Ok(outcomes)
    }

    /// 把所有替换图像写回资源存储
    pub fn encode<S>(&self, store: &S) -> Vec<Outcome<String>>
    where
        S: AssetStore,
        FileError: From<S::Error>,
    {
        let codec = AtlasCodec::new(self.options.resample);
        let paintings: Vec<LayerId> = self
            .layers
            .values()
            .copied()
            .filter(|&id| self.tree.layer(id).is_modified())
            .collect();

        let mut outcomes: Vec<Outcome<String>> = paintings
            .par_iter()
            .map(|&id| {
                let layer = self.tree.layer(id);
                (layer.name().to_string(), encode_painting(&codec, store, layer))
            })
            .collect();

        let faces: Vec<&FaceSwatch> = self.faces.iter().filter(|f| f.is_modified()).collect();
        let written: Vec<Outcome<String>> = faces
            .par_iter()
            .filter_map(|swatch| {
                let image = swatch.replacement.as_ref()?;
                let target = WriteTarget::Face {
                    name: swatch.name.clone(),
                };
                let result = store.write_texture(&target, image).map_err(FileError::from);
                Some((format!("face #{}", swatch.index), result))
            })
            .collect();
        outcomes.extend(written);

        if !faces.is_empty() && self.options.face_mode.patches_face_node() {
            if let Some(outcome) = self.patch_face_node(store) {
                outcomes.push(outcome);
            }
        }

        outcomes.extend(
            self.icons
                .values()
                .filter_map(|icon| {
                    let image = icon.replacement.as_ref()?;
                    let target = WriteTarget::Icon { kind: icon.kind.clone() };
                    Some((icon.kind.clone(), store.write_texture(&target, image).map_err(FileError::from)))
                })
                .collect::<Vec<_>>(),
        );

        let failed = outcomes.iter().filter(|(_, r)| r.is_err()).count();
        for (name, result) in &outcomes {
            match result {
                Ok(path) => info!("Encoded {} -> {}", name, path),
                Err(e) => warn!("Failed to encode {}: {}", name, e),
            }
        }
        info!("Encoded {} items ({} failed)", outcomes.len() - failed, failed);
        outcomes
    }

    /// 让 `face` 节点采用首选图层的尺寸与轴心，轴心位置保持不变
    fn patch_face_node<S>(&self, store: &S) -> Option<Outcome<String>>
    where
        S: AssetStore,
        FileError: From<S::Error>,
    {
        let (face, preferred) = self.face_context().ok()?;
        let pref = self.tree.layer(preferred);
        let patch = NodePatch {
            size_delta: pref.node().size_delta,
            pivot: pref.node().pivot,
            anchored_position: pref.geometry().pivot_position - self.tree.geometry(face).anchor_position,
        };
        let result = store
            .write_node_patch(FACE_NAME, &patch)
            .map_err(FileError::from);
        Some((FACE_NAME.to_string(), result))
    }
}

fn encode_painting<S>(codec: &AtlasCodec, store: &S, layer: &Layer) -> Result<String, FileError>
where
    S: AssetStore,
    FileError: From<S::Error>,
{
    let texture = layer
        .texture()
        .ok_or_else(|| CodecError::NoTexture(layer.name().to_string()))?;
    let replacement = layer
        .replacement
        .as_ref()
        .ok_or_else(|| FileError::AssetNotFound(layer.name().to_string()))?;
    let encoded = codec.encode_layer(layer, replacement)?;
    let target = WriteTarget::Painting {
        texture: texture.name.clone(),
        asset_path: layer.node().asset_path.clone(),
    };
    Ok(store.write_texture(&target, &encoded)?)
}

fn load_faces<S>(store: &S) -> Result<Vec<FaceSwatch>, FileError>
where
    S: AssetStore,
    FileError: From<S::Error>,
{
    let names = store.face_swatch_names()?;
    let loaded: Vec<_> = names
        .par_iter()
        .map(|name| (name, store.load_face_swatch(name)))
        .collect();

    let mut faces = Vec::with_capacity(loaded.len());
    for (name, result) in loaded {
        match result {
            Ok(image) => faces.extend(FaceSwatch::new(name.clone(), image)),
            Err(e) => warn!("Failed to load face #{}: {}", name, e),
        }
    }
    faces.sort_by_key(|f| f.index);
    Ok(faces)
}

fn load_icons<S>(store: &S) -> Result<IndexMap<String, IconSwatch>, FileError>
where
    S: AssetStore,
    FileError: From<S::Error>,
{
    let mut icons = IndexMap::new();
    for kind in store.icon_kinds()? {
        match store.load_icon(&kind) {
            Ok(image) => {
                icons.insert(kind.clone(), IconSwatch::new(kind, image));
            }
            Err(e) => warn!("Failed to load {}: {}", kind, e),
        }
    }
    Ok(icons)
}
