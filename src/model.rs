// 该文件是 Yezhen （叶诊） 项目的一部分。
// src/model.rs - 模型
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

use serde::Serialize;
use thiserror::Error;

pub trait Model {
  type Input;
  type Output;
  type Error;

  fn infer(&self, input: &Self::Input) -> Result<Self::Output, Self::Error>;
}

mod config;
pub use self::config::{
  ColorThresholds, ConfigError, ResidualRange, ScoringConfig, SpotOperator, TextureThresholds,
};

mod label;
pub use self::label::{CATEGORY_COUNT, DiseaseCategory, lookup_display_label};

pub mod signal;
pub use self::signal::{SignalError, SignalSet, compute_signals};

pub mod scorer;
pub use self::scorer::{CategoryScores, score_categories};

mod rank;
pub use self::rank::rank;

mod heuristic;
pub use self::heuristic::{
  HeuristicBuildError, HeuristicBuilder, HeuristicClassifier, classify_frame, degraded_result,
};

/// 未指定时返回的候选数量
pub const DEFAULT_TOP_K: usize = 3;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ClassifyError {
  #[error("top_k 超出范围: {0}, 允许范围 [1, {max}]", max = CATEGORY_COUNT)]
  InvalidTopK(usize),
  #[error("原始分数总和无效: {0}")]
  DegenerateScores(f64),
}

pub fn validate_top_k(top_k: usize) -> Result<usize, ClassifyError> {
  if (1..=CATEGORY_COUNT).contains(&top_k) {
    Ok(top_k)
  } else {
    Err(ClassifyError::InvalidTopK(top_k))
  }
}

#[derive(Debug, Clone, Serialize)]
pub struct Prediction {
  #[serde(skip)]
  pub category: DiseaseCategory,
  pub category_key: &'static str,
  pub display_label: &'static str,
  pub confidence: f64,
}

impl Prediction {
  pub fn new(category: DiseaseCategory, confidence: f64) -> Self {
    Self {
      category,
      category_key: category.key(),
      display_label: category.display_label(),
      confidence,
    }
  }
}

/// 一次评分的结果，按置信度降序排列
///
/// 正常结果保存全部 15 个类别的分布，对外只暴露前 `top_k` 项；
/// 降级结果只含随机生成的 `top_k` 项，且不构成概率分布。
#[derive(Debug, Clone)]
pub struct PredictionResult {
  ranked: Box<[Prediction]>,
  top_k: usize,
  degraded: bool,
}

impl PredictionResult {
  pub(crate) fn ranked(ranked: Vec<Prediction>, top_k: usize) -> Self {
    Self {
      top_k: top_k.min(ranked.len()),
      ranked: ranked.into_boxed_slice(),
      degraded: false,
    }
  }

  pub(crate) fn degraded(items: Vec<Prediction>) -> Self {
    Self {
      top_k: items.len(),
      ranked: items.into_boxed_slice(),
      degraded: true,
    }
  }

  /// 前 `top_k` 项
  pub fn items(&self) -> &[Prediction] {
    &self.ranked[..self.top_k]
  }

  pub fn top(&self) -> Option<&Prediction> {
    self.items().first()
  }

  /// 全部类别的分布（降级结果只有 `top_k` 项）
  pub fn full_distribution(&self) -> &[Prediction] {
    &self.ranked
  }

  pub fn total_confidence(&self) -> f64 {
    self.ranked.iter().map(|p| p.confidence).sum()
  }

  pub fn is_degraded(&self) -> bool {
    self.degraded
  }

  pub fn len(&self) -> usize {
    self.top_k
  }

  pub fn is_empty(&self) -> bool {
    self.top_k == 0
  }
}
