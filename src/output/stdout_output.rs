// 该文件是 Yezhen （叶诊） 项目的一部分。
// src/output/stdout_output.rs - 标准输出
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

use std::io::Write;

use thiserror::Error;
use tracing::warn;
use url::Url;

use crate::{
  FromUrl, FromUrlWithScheme, input::FrameOrigin, model::PredictionResult, output::Render,
  report::PredictionReport,
};

#[derive(Error, Debug)]
pub enum StdoutOutputError {
  #[error("I/O 错误: {0}")]
  IoError(#[from] std::io::Error),
  #[error("序列化错误: {0}")]
  SerializeError(#[from] serde_json::Error),
  #[error("URI 方案不匹配: {0}")]
  SchemeMismatch(String),
}

/// 打印评分结果；`stdout://?format=json` 时打印 JSON 报告
pub struct StdoutOutput {
  json: bool,
}

impl FromUrlWithScheme for StdoutOutput {
  const SCHEME: &'static str = "stdout";
}

impl FromUrl for StdoutOutput {
  type Error = StdoutOutputError;

  fn from_url(uri: &Url) -> Result<Self, Self::Error> {
    if uri.scheme() != Self::SCHEME {
      return Err(StdoutOutputError::SchemeMismatch(format!(
        "期望输出方式 '{}', 实际输出方式 '{}'",
        Self::SCHEME,
        uri.scheme()
      )));
    }

    let json = uri
      .query_pairs()
      .any(|(k, v)| k == "format" && v == "json");

    Ok(StdoutOutput { json })
  }
}

impl StdoutOutput {
  fn write_report(
    &self,
    out: &mut impl Write,
    report: &PredictionReport,
  ) -> Result<(), StdoutOutputError> {
    if self.json {
      writeln!(out, "{}", report.to_json_pretty()?)?;
      return Ok(());
    }

    writeln!(out, "[{}] {}", report.timestamp, report.source)?;
    for (rank, p) in report.all_predictions.iter().enumerate() {
      writeln!(
        out,
        "  {}. {} ({}) {:.2}%",
        rank + 1,
        p.display_label,
        p.category_key,
        p.confidence * 100.0
      )?;
    }
    writeln!(out, "  Chẩn đoán: {}", report.treatment.diagnosis)?;
    writeln!(out, "  Điều trị: {}", report.treatment.treatment)?;
    for item in report.treatment.prevention {
      writeln!(out, "    - {}", item)?;
    }
    Ok(())
  }
}

impl<F: FrameOrigin> Render<F, PredictionResult> for StdoutOutput {
  type Error = StdoutOutputError;

  fn render_result(&self, frame: &F, result: &PredictionResult) -> Result<(), Self::Error> {
    let report = PredictionReport::new(result, frame.origin());
    if report.degraded {
      warn!("{} 的结果为降级结果，置信度不可信", report.source);
    }
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    self.write_report(&mut out, &report)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::model::{CATEGORY_COUNT, CategoryScores, DiseaseCategory, rank};

  fn report() -> PredictionReport {
    let mut raw = [0.05; CATEGORY_COUNT];
    raw[DiseaseCategory::PowderyMildew.index()] = 0.6;
    let result = rank(&CategoryScores::from_array(raw), 2).expect("分数有效");
    PredictionReport::new(&result, "leaf.jpg")
  }

  #[test]
  fn text_lists_ranked_predictions() {
    let output = StdoutOutput { json: false };
    let mut buf = Vec::new();
    output.write_report(&mut buf, &report()).expect("写入内存");
    let text = String::from_utf8(buf).expect("UTF-8");
    assert!(text.contains("1. Bệnh nấm phấn trắng (powdery_mildew)"));
    assert!(text.contains("2. "));
    assert!(!text.contains("3. "));
    assert!(text.contains("Phun Sulfur hoặc Myclobutanil"));
  }

  #[test]
  fn json_format_from_query() {
    let url = Url::parse("stdout://?format=json").expect("合法 URL");
    let output = StdoutOutput::from_url(&url).expect("合法输出");
    let mut buf = Vec::new();
    output.write_report(&mut buf, &report()).expect("写入内存");
    let json: serde_json::Value = serde_json::from_slice(&buf).expect("合法 JSON");
    assert_eq!(json["top_prediction"]["category_key"], "powdery_mildew");
  }
}
