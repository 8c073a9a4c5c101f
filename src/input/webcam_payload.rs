// 该文件是 Yezhen （叶诊） 项目的一部分。
// src/input/webcam_payload.rs - 摄像头截图载荷输入
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

use tracing::info;
use url::Url;

use crate::{
  FromUrl, FromUrlWithScheme,
  input::{InputError, LeafInput, decode_webcam_payload},
};

/// 浏览器摄像头截图保存下来的 Base64 文本（可带 data URL 前缀），
/// `webcam:///path/to/capture.txt`
pub struct WebcamPayloadInput {
  input: Option<LeafInput>,
}

impl FromUrlWithScheme for WebcamPayloadInput {
  const SCHEME: &'static str = "webcam";
}

impl FromUrl for WebcamPayloadInput {
  type Error = InputError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    if url.scheme() != Self::SCHEME {
      return Err(InputError::scheme_mismatch(Self::SCHEME, url.scheme()));
    }

    let payload = std::fs::read_to_string(url.path())?;
    let input = Self::from_payload(url.path(), &payload)?;
    info!("读取摄像头载荷: {}", url.path());
    Ok(input)
  }
}

impl WebcamPayloadInput {
  pub fn from_payload(origin: &str, payload: &str) -> Result<Self, InputError> {
    let frame = decode_webcam_payload(payload)?;
    Ok(WebcamPayloadInput {
      input: Some(LeafInput {
        origin: origin.to_string(),
        frame,
      }),
    })
  }
}

impl Iterator for WebcamPayloadInput {
  type Item = LeafInput;

  fn next(&mut self) -> Option<Self::Item> {
    self.input.take()
  }
}

#[cfg(test)]
mod tests {
  use std::io::Cursor;

  use base64::{Engine as _, engine::general_purpose};
  use image::{ImageFormat, Rgb, RgbImage};

  use super::*;

  #[test]
  fn data_url_payload_yields_one_frame() {
    let mut buf = Cursor::new(Vec::new());
    RgbImage::from_pixel(10, 10, Rgb([200, 40, 40]))
      .write_to(&mut buf, ImageFormat::Jpeg)
      .expect("编码成功");
    let payload = format!(
      "data:image/jpeg;base64,{}",
      general_purpose::STANDARD.encode(buf.get_ref())
    );

    let mut input = WebcamPayloadInput::from_payload("webcam", &payload).expect("载荷有效");
    let first = input.next().expect("一帧");
    assert_eq!(first.origin, "webcam");
    assert!(input.next().is_none());
  }

  #[test]
  fn broken_payload_is_rejected() {
    assert!(matches!(
      WebcamPayloadInput::from_payload("webcam", "data:image/png;base64,@@@"),
      Err(InputError::DecodeError(_))
    ));
  }
}
