// 该文件是 Yezhen （叶诊） 项目的一部分。
// src/report.rs - 评分报告
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

use chrono::{Local, NaiveDateTime};
use serde::Serialize;

use crate::{
  model::{Prediction, PredictionResult},
  treatment::{Advisory, UNKNOWN_ADVISORY, advisory_for},
};

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// 一次评分的完整报告：前 K 个候选加上首选类别的防治建议
#[derive(Debug, Clone, Serialize)]
pub struct PredictionReport {
  pub timestamp: String,
  pub top_prediction: Option<Prediction>,
  pub all_predictions: Vec<Prediction>,
  pub treatment: Advisory,
  pub source: String,
  pub degraded: bool,
}

impl PredictionReport {
  pub fn new(result: &PredictionResult, source: impl Into<String>) -> Self {
    Self::at(result, source, Local::now().naive_local())
  }

  pub fn at(result: &PredictionResult, source: impl Into<String>, time: NaiveDateTime) -> Self {
    let top_prediction = result.top().cloned();
    let treatment = match &top_prediction {
      Some(top) => *advisory_for(top.category),
      None => UNKNOWN_ADVISORY,
    };

    Self {
      timestamp: time.format(TIMESTAMP_FORMAT).to_string(),
      top_prediction,
      all_predictions: result.items().to_vec(),
      treatment,
      source: source.into(),
      degraded: result.is_degraded(),
    }
  }

  pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(self)
  }
}

#[cfg(test)]
mod tests {
  use chrono::NaiveDate;

  use super::*;
  use crate::{
    model::{CATEGORY_COUNT, CategoryScores, DiseaseCategory, rank},
    treatment::Severity,
  };

  fn sample_result() -> PredictionResult {
    let mut raw = [0.05; CATEGORY_COUNT];
    raw[DiseaseCategory::LeafSpot.index()] = 0.7;
    rank(&CategoryScores::from_array(raw), 3).expect("分数有效")
  }

  fn noon() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2026, 3, 14)
      .and_then(|d| d.and_hms_opt(12, 30, 5))
      .expect("合法时间")
  }

  #[test]
  fn report_carries_top_advisory() {
    let report = PredictionReport::at(&sample_result(), "leaf.png", noon());
    assert_eq!(report.timestamp, "2026-03-14 12:30:05");
    assert_eq!(report.all_predictions.len(), 3);
    assert_eq!(
      report.top_prediction.as_ref().map(|p| p.category),
      Some(DiseaseCategory::LeafSpot)
    );
    assert_eq!(report.treatment.severity, Severity::Medium);
    assert!(!report.degraded);
  }

  #[test]
  fn report_json_shape() {
    let report = PredictionReport::at(&sample_result(), "leaf.png", noon());
    let json: serde_json::Value =
      serde_json::from_str(&report.to_json_pretty().expect("可序列化")).expect("合法 JSON");
    assert_eq!(json["top_prediction"]["category_key"], "leaf_spot");
    assert_eq!(json["top_prediction"]["display_label"], "Bệnh đốm lá");
    assert_eq!(json["treatment"]["severity"], "medium");
    assert_eq!(json["source"], "leaf.png");
    assert!(json["all_predictions"].as_array().is_some_and(|a| a.len() == 3));
  }
}
