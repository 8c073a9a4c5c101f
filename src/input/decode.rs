// 该文件是 Yezhen （叶诊） 项目的一部分。
// src/input/decode.rs - 图像解码与归一化
//
// 本文件根据 Apache 许可证第 2.0 版（以下简称“许可证”）授权使用；
// 除非遵守该许可证条款，否则您不得使用本文件。
// 您可通过以下网址获取许可证副本：
// http://www.apache.org/licenses/LICENSE-2.0
// 除非适用法律要求或书面同意，根据本许可协议分发的软件均按“原样”提供，
// 不附带任何形式的明示或暗示的保证或条件。
// 有关许可权限与限制的具体条款，请参阅本许可协议。
//
// Copyright (C) 2026 Johann Li <me@qinka.pro>, Wareless Group

use std::path::Path;

use base64::{Engine as _, engine::general_purpose};
use image::{DynamicImage, ImageFormat, imageops::FilterType};
use thiserror::Error;
use tracing::{debug, error};

use crate::frame::{FrameError, LeafFrame, RgbF32Frame};

/// 单次上传允许的最大字节数（16 MiB）
pub const MAX_UPLOAD_BYTES: usize = 16 * 1024 * 1024;
/// 上传文件允许的扩展名
pub const ALLOWED_EXTENSIONS: [&str; 3] = ["png", "jpg", "jpeg"];
/// 解码器接受的图像格式
pub const SUPPORTED_FORMATS: [ImageFormat; 2] = [ImageFormat::Png, ImageFormat::Jpeg];

const DATA_URL_MARKER: &str = "base64,";

#[derive(Error, Debug)]
pub enum DecodeError {
  #[error("无法识别的图像数据")]
  Unrecognized,
  #[error("不支持的图像格式: {0:?}")]
  UnsupportedFormat(ImageFormat),
  #[error("图像解码错误: {0}")]
  Malformed(#[from] image::ImageError),
  #[error("I/O 错误: {0}")]
  Io(#[from] std::io::Error),
  #[error("不允许的文件扩展名: {0}")]
  DisallowedExtension(String),
  #[error("图像数据过大: {size} 字节, 上限 {limit} 字节")]
  TooLarge { size: usize, limit: usize },
  #[error("Base64 解码错误: {0}")]
  Base64(#[from] base64::DecodeError),
  #[error("帧构造错误: {0}")]
  Frame(#[from] FrameError),
}

/// 将任意 PNG/JPEG 字节解码为标准叶片帧
pub fn decode_leaf_frame(bytes: &[u8]) -> Result<LeafFrame, DecodeError> {
  decode_frame(bytes)
}

/// 解码并缩放到 W x H，像素归一化到 [0, 1]
pub fn decode_frame<const W: u32, const H: u32>(
  bytes: &[u8],
) -> Result<RgbF32Frame<W, H>, DecodeError> {
  if bytes.len() > MAX_UPLOAD_BYTES {
    return Err(DecodeError::TooLarge {
      size: bytes.len(),
      limit: MAX_UPLOAD_BYTES,
    });
  }

  let format = image::guess_format(bytes).map_err(|_| DecodeError::Unrecognized)?;
  if !SUPPORTED_FORMATS.contains(&format) {
    error!("不支持的图像格式: {:?}", format);
    return Err(DecodeError::UnsupportedFormat(format));
  }

  let image = image::load_from_memory_with_format(bytes, format)?;
  debug!(
    "图像解码完成: {:?} {}x{} {:?}",
    format,
    image.width(),
    image.height(),
    image.color()
  );

  normalize_image(image)
}

/// 颜色模式统一为 RGB（丢弃 alpha，灰度扩展为三通道），再用 Lanczos3 缩放
pub fn normalize_image<const W: u32, const H: u32>(
  image: DynamicImage,
) -> Result<RgbF32Frame<W, H>, DecodeError> {
  let rgb = image.to_rgb8();
  let rgb = if rgb.dimensions() == (W, H) {
    rgb
  } else {
    image::imageops::resize(&rgb, W, H, FilterType::Lanczos3)
  };

  Ok(RgbF32Frame::try_from(&rgb)?)
}

/// 从文件读取并解码，格式由内容判断而不是扩展名
pub fn read_leaf_frame(path: &Path) -> Result<LeafFrame, DecodeError> {
  let bytes = std::fs::read(path)?;
  decode_leaf_frame(&bytes)
}

/// 上传校验：扩展名与大小，通过后再解码
pub fn decode_upload(filename: &str, bytes: &[u8]) -> Result<LeafFrame, DecodeError> {
  check_extension(filename)?;
  decode_leaf_frame(bytes)
}

pub fn check_extension(filename: &str) -> Result<(), DecodeError> {
  let extension = Path::new(filename)
    .extension()
    .and_then(|ext| ext.to_str())
    .map(|ext| ext.to_ascii_lowercase());

  match extension {
    Some(ext) if ALLOWED_EXTENSIONS.contains(&ext.as_str()) => Ok(()),
    _ => Err(DecodeError::DisallowedExtension(filename.to_string())),
  }
}

/// 摄像头截图载荷：Base64 字符串，可以带 data URL 前缀
pub fn decode_webcam_payload(payload: &str) -> Result<LeafFrame, DecodeError> {
  let encoded = match payload.find(DATA_URL_MARKER) {
    Some(pos) => &payload[pos + DATA_URL_MARKER.len()..],
    None => payload,
  };

  let bytes = general_purpose::STANDARD.decode(encoded.trim())?;
  decode_leaf_frame(&bytes)
}

#[cfg(test)]
mod tests {
  use std::io::Cursor;

  use image::{GrayImage, Luma, Rgba, RgbaImage};

  use super::*;

  fn encode(image: DynamicImage, format: ImageFormat) -> Vec<u8> {
    let mut buffer = Cursor::new(Vec::new());
    image.write_to(&mut buffer, format).expect("编码测试图像");
    buffer.into_inner()
  }

  #[test]
  fn plain_text_is_rejected() {
    let result = decode_leaf_frame(b"this is definitely not an image");
    assert!(matches!(result, Err(DecodeError::Unrecognized)));
  }

  #[test]
  fn non_png_jpeg_format_is_rejected() {
    let gif_header = b"GIF89a\x01\x00\x01\x00\x00\x00\x00";
    let result = decode_leaf_frame(gif_header);
    assert!(matches!(
      result,
      Err(DecodeError::UnsupportedFormat(ImageFormat::Gif))
    ));
  }

  #[test]
  fn truncated_png_is_malformed() {
    let mut bytes = encode(
      DynamicImage::ImageLuma8(GrayImage::from_pixel(16, 16, Luma([7]))),
      ImageFormat::Png,
    );
    bytes.truncate(bytes.len() / 2);
    assert!(matches!(
      decode_leaf_frame(&bytes),
      Err(DecodeError::Malformed(_))
    ));
  }

  #[test]
  fn grayscale_becomes_equal_channels() {
    let gray = GrayImage::from_fn(50, 30, |x, y| Luma([((x * 5 + y * 3) % 256) as u8]));
    let bytes = encode(DynamicImage::ImageLuma8(gray), ImageFormat::Png);

    let frame = decode_leaf_frame(&bytes).expect("灰度 PNG 可解码");
    assert_eq!(frame.width(), 224);
    assert_eq!(frame.height(), 224);
    for [r, g, b] in frame.pixels() {
      assert!((r - g).abs() < 1e-6 && (g - b).abs() < 1e-6);
      assert!((0.0..=1.0).contains(&r));
    }
  }

  #[test]
  fn alpha_is_dropped() {
    let rgba = RgbaImage::from_pixel(224, 224, Rgba([10, 200, 30, 0]));
    let bytes = encode(DynamicImage::ImageRgba8(rgba), ImageFormat::Png);

    let frame = decode_leaf_frame(&bytes).expect("RGBA PNG 可解码");
    let [r, g, b] = frame.pixel(100, 100);
    assert!((r - 10.0 / 255.0).abs() < 1e-6);
    assert!((g - 200.0 / 255.0).abs() < 1e-6);
    assert!((b - 30.0 / 255.0).abs() < 1e-6);
  }

  #[test]
  fn jpeg_is_accepted() {
    let rgb = image::RgbImage::from_pixel(64, 48, image::Rgb([40, 160, 40]));
    let bytes = encode(DynamicImage::ImageRgb8(rgb), ImageFormat::Jpeg);
    let frame = decode_leaf_frame(&bytes).expect("JPEG 可解码");
    let [r, g, _] = frame.pixel(112, 112);
    assert!(g > r);
  }

  #[test]
  fn oversized_payload_is_rejected_before_decoding() {
    let bytes = vec![0u8; MAX_UPLOAD_BYTES + 1];
    assert!(matches!(
      decode_leaf_frame(&bytes),
      Err(DecodeError::TooLarge { .. })
    ));
  }

  #[test]
  fn upload_extension_is_checked() {
    assert!(check_extension("leaf.PNG").is_ok());
    assert!(check_extension("leaf.jpeg").is_ok());
    assert!(matches!(
      check_extension("leaf.gif"),
      Err(DecodeError::DisallowedExtension(_))
    ));
    assert!(check_extension("noextension").is_err());
  }

  #[test]
  fn webcam_data_url_is_decoded() {
    let rgb = image::RgbImage::from_pixel(32, 32, image::Rgb([20, 180, 20]));
    let bytes = encode(DynamicImage::ImageRgb8(rgb), ImageFormat::Png);
    let payload = format!(
      "data:image/png;base64,{}",
      general_purpose::STANDARD.encode(&bytes)
    );

    let frame = decode_webcam_payload(&payload).expect("data URL 可解码");
    let [r, g, b] = frame.pixel(0, 0);
    assert!((g - 180.0 / 255.0).abs() < 0.02);
    assert!(r < 0.2 && b < 0.2);

    assert!(matches!(
      decode_webcam_payload("data:image/png;base64,@@@"),
      Err(DecodeError::Base64(_))
    ));
  }
}
