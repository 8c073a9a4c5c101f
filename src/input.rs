// 该文件是 Yezhen （叶诊） 项目的一部分。
// src/input.rs - 叶片图像输入
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

use thiserror::Error;

use crate::{FromUrl, FromUrlWithScheme, frame::LeafFrame};

mod decode;
pub use self::decode::{
  ALLOWED_EXTENSIONS, DecodeError, MAX_UPLOAD_BYTES, SUPPORTED_FORMATS, check_extension,
  decode_frame, decode_leaf_frame, decode_upload, decode_webcam_payload, normalize_image,
  read_leaf_frame,
};

mod read_image_file;
pub use self::read_image_file::ImageFileInput;

mod webcam_payload;
pub use self::webcam_payload::WebcamPayloadInput;

#[cfg(feature = "directory_input")]
mod directory_input;
#[cfg(feature = "directory_input")]
pub use self::directory_input::DirectoryInput;

/// 帧的来源描述，用于报告与历史记录
pub trait FrameOrigin {
  fn origin(&self) -> &str;
}

/// 带来源信息的叶片帧
#[derive(Debug, Clone)]
pub struct LeafInput {
  pub origin: String,
  pub frame: LeafFrame,
}

impl AsRef<LeafFrame> for LeafInput {
  fn as_ref(&self) -> &LeafFrame {
    &self.frame
  }
}

impl FrameOrigin for LeafInput {
  fn origin(&self) -> &str {
    &self.origin
  }
}

impl FrameOrigin for LeafFrame {
  fn origin(&self) -> &str {
    "memory"
  }
}

#[derive(Error, Debug)]
pub enum InputError {
  #[error("图像解码错误: {0}")]
  DecodeError(#[from] DecodeError),
  #[error("URI 方案不匹配: 期望 '{expected}', 实际 '{found}'")]
  SchemeMismatch { expected: String, found: String },
  #[error("I/O 错误: {0}")]
  IoError(#[from] std::io::Error),
}

impl InputError {
  pub fn scheme_mismatch(expected: impl Into<String>, found: &str) -> Self {
    InputError::SchemeMismatch {
      expected: expected.into(),
      found: found.to_string(),
    }
  }
}

pub enum InputWrapper {
  ReadImageFile(ImageFileInput),
  WebcamPayload(WebcamPayloadInput),
  #[cfg(feature = "directory_input")]
  Directory(DirectoryInput),
}

impl InputWrapper {
  /// 当前构建支持的输入方案
  pub fn schemes() -> Vec<&'static str> {
    #[allow(unused_mut)]
    let mut schemes = vec![ImageFileInput::SCHEME, WebcamPayloadInput::SCHEME];
    #[cfg(feature = "directory_input")]
    schemes.push(DirectoryInput::SCHEME);
    schemes
  }
}

impl FromUrl for InputWrapper {
  type Error = InputError;

  fn from_url(url: &url::Url) -> Result<Self, Self::Error> {
    match url.scheme() {
      ImageFileInput::SCHEME => Ok(InputWrapper::ReadImageFile(ImageFileInput::from_url(url)?)),
      WebcamPayloadInput::SCHEME => Ok(InputWrapper::WebcamPayload(
        WebcamPayloadInput::from_url(url)?,
      )),
      #[cfg(feature = "directory_input")]
      DirectoryInput::SCHEME => Ok(InputWrapper::Directory(DirectoryInput::from_url(url)?)),
      other => Err(InputError::scheme_mismatch(InputWrapper::schemes().join("|"), other)),
    }
  }
}

impl Iterator for InputWrapper {
  type Item = LeafInput;

  fn next(&mut self) -> Option<Self::Item> {
    match self {
      InputWrapper::ReadImageFile(input) => input.next(),
      InputWrapper::WebcamPayload(input) => input.next(),
      #[cfg(feature = "directory_input")]
      InputWrapper::Directory(input) => input.next(),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn unknown_scheme_is_rejected() {
    let url = url::Url::parse("rtsp://camera.local/stream").expect("合法 URL");
    match InputWrapper::from_url(&url) {
      Err(InputError::SchemeMismatch { expected, found }) => {
        assert_eq!(found, "rtsp");
        assert!(expected.split('|').any(|s| s == ImageFileInput::SCHEME));
      }
      _ => panic!("rtsp 不应被接受"),
    }
  }

  #[test]
  fn single_input_reports_expected_scheme() {
    let url = url::Url::parse("webcam:///tmp/leaf.png").expect("合法 URL");
    match ImageFileInput::from_url(&url) {
      Err(InputError::SchemeMismatch { expected, found }) => {
        assert_eq!(expected, ImageFileInput::SCHEME);
        assert_eq!(found, "webcam");
      }
      _ => panic!("方案不匹配应当报错"),
    }
  }
}
