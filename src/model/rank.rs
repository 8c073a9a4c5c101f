// 该文件是 Yezhen （叶诊） 项目的一部分。
// src/model/rank.rs - 归一化与排序
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

use crate::model::{CategoryScores, ClassifyError, Prediction, PredictionResult, validate_top_k};

/// 将原始分数归一化为概率分布，按置信度降序排列后截取前 `top_k` 项
///
/// 排序是稳定的，置信度相同的类别保持声明顺序。
pub fn rank(scores: &CategoryScores, top_k: usize) -> Result<PredictionResult, ClassifyError> {
  let top_k = validate_top_k(top_k)?;

  let total = scores.total();
  if !(total.is_finite() && total > 0.0) {
    return Err(ClassifyError::DegenerateScores(total));
  }

  let mut ranked = scores
    .iter()
    .map(|(category, score)| Prediction::new(category, score / total))
    .collect::<Vec<_>>();
  ranked.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));

  Ok(PredictionResult::ranked(ranked, top_k))
}
