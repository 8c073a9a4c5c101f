// 该文件是 Yezhen （叶诊） 项目的一部分。
// src/input/read_image_file.rs - 图像文件输入
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

use tracing::{error, info};
use url::Url;

use crate::{
  FromUrl, FromUrlWithScheme,
  input::{InputError, LeafInput, read_leaf_frame},
};

/// 单张 PNG/JPEG 图片，`image:///path/to/leaf.jpg`
pub struct ImageFileInput {
  input: Option<LeafInput>,
}

impl FromUrlWithScheme for ImageFileInput {
  const SCHEME: &'static str = "image";
}

impl FromUrl for ImageFileInput {
  type Error = InputError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    if url.scheme() != Self::SCHEME {
      error!(
        "URI 方案不匹配: 期望 '{}', 实际 '{}'",
        Self::SCHEME,
        url.scheme()
      );
      return Err(InputError::scheme_mismatch(Self::SCHEME, url.scheme()));
    }

    Self::open(url.path())
  }
}

impl ImageFileInput {
  pub fn open(path: impl AsRef<Path>) -> Result<Self, InputError> {
    let path = path.as_ref();
    let frame = read_leaf_frame(path)?;
    info!("读取图片: {}", path.display());

    Ok(ImageFileInput {
      input: Some(LeafInput {
        origin: path.display().to_string(),
        frame,
      }),
    })
  }
}

impl Iterator for ImageFileInput {
  type Item = LeafInput;

  fn next(&mut self) -> Option<Self::Item> {
    self.input.take()
  }
}
