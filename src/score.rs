// 该文件是 Yezhen （叶诊） 项目的一部分。
// src/score.rs - 图像评分入口
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

use rand::{Rng, SeedableRng, rngs::StdRng};
use thiserror::Error;
use tracing::info;

use crate::{
  input::{DecodeError, decode_leaf_frame, read_leaf_frame},
  model::{ClassifyError, PredictionResult, ScoringConfig, classify_frame, validate_top_k},
};

/// 待评分图像的来源
#[derive(Debug, Clone, Copy)]
pub enum PixelSource<'a> {
  /// 已编码的 PNG/JPEG 字节
  Bytes(&'a [u8]),
  /// 图像文件路径
  Path(&'a Path),
}

impl<'a> From<&'a [u8]> for PixelSource<'a> {
  fn from(bytes: &'a [u8]) -> Self {
    PixelSource::Bytes(bytes)
  }
}

impl<'a> From<&'a Path> for PixelSource<'a> {
  fn from(path: &'a Path) -> Self {
    PixelSource::Path(path)
  }
}

#[derive(Error, Debug)]
pub enum ScoreError {
  #[error("图像解码错误: {0}")]
  Decode(#[from] DecodeError),
  #[error("参数无效: {0}")]
  InvalidArgument(#[from] ClassifyError),
}

/// 对一张图像评分，返回按置信度降序的前 `top_k` 个类别
pub fn score_image(source: PixelSource<'_>, top_k: usize) -> Result<PredictionResult, ScoreError> {
  let mut rng = StdRng::from_os_rng();
  score_image_with(source, top_k, &ScoringConfig::default(), &mut rng)
}

/// 同 [`score_image`]，但使用给定的配置与随机源
pub fn score_image_with<R: Rng + ?Sized>(
  source: PixelSource<'_>,
  top_k: usize,
  config: &ScoringConfig,
  rng: &mut R,
) -> Result<PredictionResult, ScoreError> {
  let top_k = validate_top_k(top_k)?;

  let frame = match source {
    PixelSource::Bytes(bytes) => decode_leaf_frame(bytes)?,
    PixelSource::Path(path) => {
      info!("读取图像文件: {}", path.display());
      read_leaf_frame(path)?
    }
  };

  Ok(classify_frame(&frame, top_k, config, rng)?)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn top_k_is_checked_before_decoding() {
    let result = score_image(PixelSource::Bytes(b"not an image"), 0);
    assert!(matches!(
      result,
      Err(ScoreError::InvalidArgument(ClassifyError::InvalidTopK(0)))
    ));
  }

  #[test]
  fn missing_file_is_decode_error() {
    let result = score_image(Path::new("/definitely/not/here.png").into(), 3);
    assert!(matches!(result, Err(ScoreError::Decode(_))));
  }
}
