//! Photoshop 文档写出
//!
//! 8 位 RGB，通道数据不压缩。图层记录自下而上排列；分组写成三段：
//! 结束分隔记录、组内图层、组头记录，两者都带 `lsct` 附加信息。
//! 合成图像是可见图层叠加到白底上的结果。

use crate::error::FileError;
use image::RgbaImage;
use std::io::Write;
use tachie_core::compose::{Element, LayeredImage, RasterLayer};
use tracing::debug;

const SIGNATURE: &[u8; 4] = b"8BPS";
const BLOCK_SIGNATURE: &[u8; 4] = b"8BIM";
const VERSION: u16 = 1;
const DEPTH: u16 = 8;
const COLOR_MODE_RGB: u16 = 3;
const COMPOSITE_CHANNELS: u16 = 3;
const RAW: u16 = 0;
const FLAG_HIDDEN: u8 = 0x02;
const GROUP_END_NAME: &str = "</Layer group>";
/// PSD（非 PSB）的最大边长
const MAX_DIMENSION: u32 = 30_000;

/// alpha、R、G、B；值是 RGBA 像素中的下标
const LAYER_CHANNELS: [(i16, usize); 4] = [(-1, 3), (0, 0), (1, 1), (2, 2)];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Folder = 1,
    Divider = 3,
}

#[derive(Debug)]
struct Record<'a> {
    name: &'a str,
    visible: bool,
    raster: Option<&'a RasterLayer>,
    section: Option<Section>,
}

impl Record<'_> {
    fn dimensions(&self) -> (u32, u32) {
        self.raster.map_or((0, 0), |r| r.pixels.dimensions())
    }
}

/// 大端字节缓冲
#[derive(Debug, Default)]
struct Buffer(Vec<u8>);

impl Buffer {
    fn u8(&mut self, v: u8) {
        self.0.push(v);
    }

    fn u16(&mut self, v: u16) {
        self.0.extend_from_slice(&v.to_be_bytes());
    }

    fn i16(&mut self, v: i16) {
        self.0.extend_from_slice(&v.to_be_bytes());
    }

    fn u32(&mut self, v: u32) {
        self.0.extend_from_slice(&v.to_be_bytes());
    }

    fn i32(&mut self, v: i32) {
        self.0.extend_from_slice(&v.to_be_bytes());
    }

    fn bytes(&mut self, v: &[u8]) {
        self.0.extend_from_slice(v);
    }

    /// 以 u32 长度前缀写入一段
    fn block(&mut self, body: Buffer) {
        self.u32(body.0.len() as u32);
        self.0.extend(body.0);
    }

    fn pad_to(&mut self, multiple: usize) {
        while self.0.len() % multiple != 0 {
            self.0.push(0);
        }
    }
}

/// 长度字节 + ASCII 名称，总长补齐到 4 的倍数；完整名称另存在 `luni` 中
fn pascal_name(name: &str) -> Vec<u8> {
    let mut bytes: Vec<u8> = name
        .chars()
        .map(|c| if c.is_ascii() { c as u8 } else { b'?' })
        .take(u8::MAX as usize)
        .collect();
    bytes.insert(0, bytes.len() as u8);
    while bytes.len() % 4 != 0 {
        bytes.push(0);
    }
    bytes
}

fn collect_records<'a>(elements: &'a [Element], out: &mut Vec<Record<'a>>) {
    for element in elements.iter().rev() {
        match element {
            Element::Raster(raster) => out.push(Record {
                name: &raster.name,
                visible: raster.visible,
                raster: Some(raster),
                section: None,
            }),
            Element::Group {
                name,
                visible,
                children,
            } => {
                out.push(Record {
                    name: GROUP_END_NAME,
                    visible: true,
                    raster: None,
                    section: Some(Section::Divider),
                });
                collect_records(children, out);
                out.push(Record {
                    name,
                    visible: *visible,
                    raster: None,
                    section: Some(Section::Folder),
                });
            }
        }
    }
}

fn write_record(buf: &mut Buffer, record: &Record) {
    let (width, height) = record.dimensions();
    let (left, top) = record.raster.map_or((0, 0), |r| (r.rect.x as i32, r.rect.y as i32));
    buf.i32(top);
    buf.i32(left);
    buf.i32(top + height as i32);
    buf.i32(left + width as i32);

    buf.u16(LAYER_CHANNELS.len() as u16);
    for (id, _) in LAYER_CHANNELS {
        buf.i16(id);
        buf.u32(2 + width * height);
    }

    let blend = if record.section == Some(Section::Folder) { b"pass" } else { b"norm" };
    buf.bytes(BLOCK_SIGNATURE);
    buf.bytes(blend);
    buf.u8(u8::MAX);
    buf.u8(0);
    buf.u8(if record.visible { 0 } else { FLAG_HIDDEN });
    buf.u8(0);

    let mut extra = Buffer::default();
    extra.u32(0);
    extra.u32(0);
    extra.bytes(&pascal_name(record.name));
    if let Some(section) = record.section {
        extra.bytes(BLOCK_SIGNATURE);
        extra.bytes(b"lsct");
        extra.u32(12);
        extra.u32(section as u32);
        extra.bytes(BLOCK_SIGNATURE);
        extra.bytes(blend);
    }

    let units: Vec<u16> = record.name.encode_utf16().collect();
    let mut luni = Buffer::default();
    luni.u32(units.len() as u32);
    for unit in units {
        luni.u16(unit);
    }
    luni.pad_to(4);
    extra.bytes(BLOCK_SIGNATURE);
    extra.bytes(b"luni");
    extra.block(luni);

    buf.block(extra);
}

fn write_channels(buf: &mut Buffer, record: &Record) {
    for (_, index) in LAYER_CHANNELS {
        buf.u16(RAW);
        if let Some(raster) = record.raster {
            buf.0.extend(raster.pixels.pixels().map(|p| p[index]));
        }
    }
}

/// 合成图叠加到白底，按 R、G、B 平面输出
fn composite_planes(flat: &RgbaImage) -> Vec<u8> {
    let len = (flat.width() * flat.height()) as usize;
    let mut planes = vec![0u8; len * COMPOSITE_CHANNELS as usize];
    for (i, pixel) in flat.pixels().enumerate() {
        let alpha = pixel[3] as u32;
        for c in 0..COMPOSITE_CHANNELS as usize {
            let over_white = (pixel[c] as u32 * alpha + 255 * (255 - alpha) + 127) / 255;
            planes[c * len + i] = over_white as u8;
        }
    }
    planes
}

/// 写出 PSD 文档
pub fn write_psd<W: Write>(image: &LayeredImage, mut writer: W) -> Result<(), FileError> {
    if image.width > MAX_DIMENSION || image.height > MAX_DIMENSION {
        return Err(FileError::InvalidFormat(format!(
            "PSD canvas {}x{} exceeds {} px",
            image.width, image.height, MAX_DIMENSION
        )));
    }
    let mut records = Vec::new();
    collect_records(&image.elements, &mut records);
    let count = i16::try_from(records.len())
        .map_err(|_| FileError::InvalidFormat(format!("too many PSD layers: {}", records.len())))?;

    let mut buf = Buffer::default();
    buf.bytes(SIGNATURE);
    buf.u16(VERSION);
    buf.bytes(&[0; 6]);
    buf.u16(COMPOSITE_CHANNELS);
    buf.u32(image.height);
    buf.u32(image.width);
    buf.u16(DEPTH);
    buf.u16(COLOR_MODE_RGB);

    // 颜色模式数据、图像资源
    buf.u32(0);
    buf.u32(0);

    let mut info = Buffer::default();
    info.i16(count);
    for record in &records {
        write_record(&mut info, record);
    }
    for record in &records {
        write_channels(&mut info, record);
    }
    info.pad_to(2);

    let mut layer_and_mask = Buffer::default();
    layer_and_mask.block(info);
    // 全局图层蒙版
    layer_and_mask.u32(0);
    buf.block(layer_and_mask);

    buf.u16(RAW);
    buf.bytes(&composite_planes(&image.flatten()));

    writer.write_all(&buf.0)?;
    writer.flush()?;
    debug!("Wrote PSD with {} layer records ({} bytes)", records.len(), buf.0.len());
    Ok(())
}
