// 该文件是 Yezhen （叶诊） 项目的一部分。
// src/history.rs - 评分历史
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
  collections::VecDeque,
  sync::{Mutex, PoisonError},
};

use serde::Serialize;

use crate::report::PredictionReport;

pub const DEFAULT_HISTORY_CAPACITY: usize = 10;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryEntry {
  pub timestamp: String,
  pub disease: String,
  pub confidence: f64,
  pub source: String,
}

impl From<&PredictionReport> for HistoryEntry {
  fn from(report: &PredictionReport) -> Self {
    let (disease, confidence) = report
      .top_prediction
      .as_ref()
      .map(|p| (p.display_label.to_string(), p.confidence))
      .unwrap_or_default();

    Self {
      timestamp: report.timestamp.clone(),
      disease,
      confidence,
      source: report.source.clone(),
    }
  }
}

/// 最近的评分记录，最新的在最前
#[derive(Debug)]
pub struct PredictionHistory {
  capacity: usize,
  entries: Mutex<VecDeque<HistoryEntry>>,
}

impl Default for PredictionHistory {
  fn default() -> Self {
    Self::with_capacity(DEFAULT_HISTORY_CAPACITY)
  }
}

impl PredictionHistory {
  pub fn with_capacity(capacity: usize) -> Self {
    Self {
      capacity,
      entries: Mutex::new(VecDeque::with_capacity(capacity)),
    }
  }

  pub fn capacity(&self) -> usize {
    self.capacity
  }

  pub fn record(&self, report: &PredictionReport) -> HistoryEntry {
    let entry = HistoryEntry::from(report);
    let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
    entries.push_front(entry.clone());
    entries.truncate(self.capacity);
    entry
  }

  pub fn entries(&self) -> Vec<HistoryEntry> {
    let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
    entries.iter().cloned().collect()
  }

  pub fn clear(&self) {
    self
      .entries
      .lock()
      .unwrap_or_else(PoisonError::into_inner)
      .clear();
  }

  pub fn len(&self) -> usize {
    self
      .entries
      .lock()
      .unwrap_or_else(PoisonError::into_inner)
      .len()
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }
}
