// 该文件是 Yezhen （叶诊） 项目的一部分。
// src/output/save_json_file.rs - 保存 JSON 报告
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

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::info;
use url::Url;

use crate::{
  FromUrl, FromUrlWithScheme, input::FrameOrigin, model::PredictionResult, output::Render,
  report::PredictionReport,
};

pub struct SaveJsonFileOutput {
  path: PathBuf,
}

#[derive(Error, Debug)]
pub enum SaveJsonFileError {
  #[error("I/O 错误: {0}")]
  IoError(#[from] std::io::Error),
  #[error("序列化错误: {0}")]
  SerializeError(#[from] serde_json::Error),
  #[error("URI 方案不匹配: {0}")]
  SchemeMismatch(String),
}

impl FromUrlWithScheme for SaveJsonFileOutput {
  const SCHEME: &'static str = "json";
}

impl FromUrl for SaveJsonFileOutput {
  type Error = SaveJsonFileError;

  fn from_url(uri: &Url) -> Result<Self, Self::Error> {
    if uri.scheme() != Self::SCHEME {
      return Err(SaveJsonFileError::SchemeMismatch(format!(
        "期望保存方式 '{}', 实际保存方式 '{}'",
        Self::SCHEME,
        uri.scheme()
      )));
    }

    Ok(SaveJsonFileOutput {
      path: PathBuf::from(uri.path()),
    })
  }
}

/// 写入格式化的 JSON，必要时创建父目录
pub(crate) fn write_json(path: &Path, json: &str) -> Result<(), std::io::Error> {
  if let Some(parent) = path.parent()
    && !parent.as_os_str().is_empty()
  {
    std::fs::create_dir_all(parent)?;
  }
  std::fs::write(path, json)
}

impl SaveJsonFileOutput {
  pub fn new(path: impl Into<PathBuf>) -> Self {
    Self { path: path.into() }
  }

  pub fn path(&self) -> &Path {
    &self.path
  }
}

impl<F: FrameOrigin> Render<F, PredictionResult> for SaveJsonFileOutput {
  type Error = SaveJsonFileError;

  fn render_result(&self, frame: &F, result: &PredictionResult) -> Result<(), Self::Error> {
    let report = PredictionReport::new(result, frame.origin());
    write_json(&self.path, &report.to_json_pretty()?)?;
    info!("保存报告到文件: {}", self.path.display());
    Ok(())
  }
}
