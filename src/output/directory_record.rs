// 该文件是 Yezhen （叶诊） 项目的一部分。
// src/output/directory_record.rs - 目录记录输出
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

use std::{
  path::PathBuf,
  sync::{Arc, Mutex, PoisonError},
};

use chrono::{Datelike, Local, NaiveDateTime};
use thiserror::Error;
use tracing::{debug, info};
use url::Url;

use crate::{
  FromUrl, FromUrlWithScheme,
  history::PredictionHistory,
  input::FrameOrigin,
  model::PredictionResult,
  output::{Render, save_json_file::write_json},
  report::PredictionReport,
};

const HISTORY_FILE: &str = "history.json";

#[derive(Error, Debug)]
pub enum DirectoryRecordOutputError {
  #[error("URI 方案不匹配")]
  SchemeMismatch,
  #[error("无效的历史记录长度: {0}")]
  InvalidHistory(String),
  #[error("序列化错误: {0}")]
  SerializeError(#[from] serde_json::Error),
  #[error("I/O 错误: {0}")]
  IoError(#[from] std::io::Error),
}

/// 每张图像一条 JSON 记录，按 `年/月/日` 分目录存放
///
/// `folder:///dir?history=N` 额外维护最近 N 条的 `history.json`。
pub struct DirectoryRecordOutput {
  directory: PathBuf,
  frame_counters: Arc<Mutex<u16>>,
  history: Option<PredictionHistory>,
}

impl FromUrlWithScheme for DirectoryRecordOutput {
  const SCHEME: &'static str = "folder";
}

impl FromUrl for DirectoryRecordOutput {
  type Error = DirectoryRecordOutputError;

  fn from_url(uri: &Url) -> Result<Self, Self::Error> {
    if uri.scheme() != Self::SCHEME {
      return Err(DirectoryRecordOutputError::SchemeMismatch);
    }

    let mut history = None;
    for (k, v) in uri.query_pairs() {
      if k == "history" {
        let capacity = v
          .parse::<usize>()
          .ok()
          .filter(|&n| n > 0)
          .ok_or_else(|| DirectoryRecordOutputError::InvalidHistory(v.to_string()))?;
        history = Some(PredictionHistory::with_capacity(capacity));
      }
    }

    Ok(DirectoryRecordOutput {
      directory: PathBuf::from(uri.path()),
      frame_counters: Arc::new(Mutex::new(0)),
      history,
    })
  }
}

impl DirectoryRecordOutput {
  fn frame_id(&self) -> u16 {
    let mut counter = self
      .frame_counters
      .lock()
      .unwrap_or_else(PoisonError::into_inner);
    let id = counter.wrapping_add(1);
    *counter = id;
    id
  }

  /// 目录与文件名取自报告自身的时间戳
  fn record_path(&self, now: &NaiveDateTime) -> Result<PathBuf, DirectoryRecordOutputError> {
    let directory = self
      .directory
      .join(now.year().to_string())
      .join(format!("{:02}", now.month()))
      .join(format!("{:02}", now.day()));
    if !directory.exists() {
      std::fs::create_dir_all(&directory)?;
    }

    Ok(directory.join(format!(
      "{}-{:04X}.json",
      now.format("%H-%M-%S"),
      self.frame_id()
    )))
  }

  fn update_history(&self, report: &PredictionReport) -> Result<(), DirectoryRecordOutputError> {
    if let Some(history) = &self.history {
      history.record(report);
      let json = serde_json::to_string_pretty(&history.entries())?;
      write_json(&self.directory.join(HISTORY_FILE), &json)?;
      debug!("更新历史记录: {} 条", history.len());
    }
    Ok(())
  }
}

impl<F: FrameOrigin> Render<F, PredictionResult> for DirectoryRecordOutput {
  type Error = DirectoryRecordOutputError;

  fn render_result(&self, frame: &F, result: &PredictionResult) -> Result<(), Self::Error> {
    let now = Local::now().naive_local();
    let report = PredictionReport::at(result, frame.origin(), now);
    let path = self.record_path(&now)?;
    write_json(&path, &report.to_json_pretty()?)?;
    info!("记录报告: {}", path.display());
    self.update_history(&report)
  }
}
