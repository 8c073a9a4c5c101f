// 该文件是 Yezhen （叶诊） 项目的一部分。
// src/input/directory_input.rs - 目录批量输入
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

use std::{collections::VecDeque, path::PathBuf};

use tracing::{debug, info, warn};
use url::Url;

use crate::{
  FromUrl, FromUrlWithScheme,
  input::{InputError, LeafInput, check_extension, read_leaf_frame},
};

/// 按文件名顺序逐张读取目录中的 PNG/JPEG，`folder:///path/to/leaves`
///
/// 解码失败的文件记录警告后跳过，不会中断迭代。
pub struct DirectoryInput {
  pending: VecDeque<PathBuf>,
}

impl FromUrlWithScheme for DirectoryInput {
  const SCHEME: &'static str = "folder";
}

impl FromUrl for DirectoryInput {
  type Error = InputError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    if url.scheme() != Self::SCHEME {
      return Err(InputError::scheme_mismatch(Self::SCHEME, url.scheme()));
    }

    Self::scan(PathBuf::from(url.path()))
  }
}

impl DirectoryInput {
  pub fn scan(directory: PathBuf) -> Result<Self, InputError> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(&directory)? {
      let path = entry?.path();
      if !path.is_file() {
        continue;
      }
      let accepted = path
        .file_name()
        .and_then(|name| name.to_str())
        .map(|name| check_extension(name).is_ok())
        .unwrap_or(false);
      if accepted {
        files.push(path);
      } else {
        debug!("忽略非图片文件: {}", path.display());
      }
    }
    files.sort();

    info!("目录 {} 中共有 {} 张图片", directory.display(), files.len());
    Ok(DirectoryInput {
      pending: files.into(),
    })
  }

  pub fn remaining(&self) -> usize {
    self.pending.len()
  }
}

impl Iterator for DirectoryInput {
  type Item = LeafInput;

  fn next(&mut self) -> Option<Self::Item> {
    while let Some(path) = self.pending.pop_front() {
      match read_leaf_frame(&path) {
        Ok(frame) => {
          return Some(LeafInput {
            origin: path.display().to_string(),
            frame,
          });
        }
        Err(e) => warn!("跳过无法解码的图片 {}: {}", path.display(), e),
      }
    }
    None
  }
}
