// 该文件是 Yezhen （叶诊） 项目的一部分。
// src/model/config.rs - 评分阈值配置
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

use std::{path::Path, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::model::scorer::lowest_score_cap;

// 颜色掩码阈值，HSV 三通道均为 [0, 1]
const GREEN_HUE_MIN: f32 = 0.15;
const GREEN_HUE_MAX: f32 = 0.4;
const GREEN_SATURATION_MIN: f32 = 0.2;
const YELLOW_HUE_MIN: f32 = 0.08;
const YELLOW_HUE_MAX: f32 = 0.18;
const YELLOW_SATURATION_MIN: f32 = 0.3;
const BROWN_HUE_MAX: f32 = 0.12;
const BROWN_VALUE_MAX: f32 = 0.6;
const PALE_SATURATION_MAX: f32 = 0.2;
const PALE_VALUE_MIN: f32 = 0.6;
const DARK_SPOT_VALUE_MAX: f32 = 0.3;
const DARK_SPOT_SATURATION_MIN: f32 = 0.2;

// 纹理阈值，作用在灰度强度上
const EDGE_THRESHOLD: f32 = 0.1;
const LAPLACIAN_THRESHOLD: f32 = 0.3;
const FIRST_DIFFERENCE_GAIN: f64 = 10.0;

const SCORE_FLOOR: f64 = 0.05;
const RESIDUAL_MASS_FLOOR: f64 = 0.1;
const RESIDUAL_FACTOR_MIN: f64 = 0.3;
const RESIDUAL_FACTOR_MAX: f64 = 1.2;

#[derive(Error, Debug)]
pub enum ConfigError {
  #[error("I/O 错误: {0}")]
  IoError(#[from] std::io::Error),
  #[error("配置解析错误: {0}")]
  ParseError(#[from] serde_json::Error),
  #[error("剩余类别随机区间无效: [{min}, {max}]")]
  InvalidResidualRange { min: f64, max: f64 },
  #[error("分数下限无效: {floor}，须为正且不超过最小上限 {cap}")]
  InvalidScoreFloor { floor: f64, cap: f64 },
  #[error("剩余概率下限无效: {0}")]
  InvalidResidualMassFloor(f64),
  #[error("未知的斑点算子: {0}")]
  UnknownSpotOperator(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColorThresholds {
  pub green_hue_min: f32,
  pub green_hue_max: f32,
  pub green_saturation_min: f32,
  pub yellow_hue_min: f32,
  pub yellow_hue_max: f32,
  pub yellow_saturation_min: f32,
  pub brown_hue_max: f32,
  pub brown_value_max: f32,
  pub pale_saturation_max: f32,
  pub pale_value_min: f32,
  pub dark_spot_value_max: f32,
  pub dark_spot_saturation_min: f32,
}

impl Default for ColorThresholds {
  fn default() -> Self {
    Self {
      green_hue_min: GREEN_HUE_MIN,
      green_hue_max: GREEN_HUE_MAX,
      green_saturation_min: GREEN_SATURATION_MIN,
      yellow_hue_min: YELLOW_HUE_MIN,
      yellow_hue_max: YELLOW_HUE_MAX,
      yellow_saturation_min: YELLOW_SATURATION_MIN,
      brown_hue_max: BROWN_HUE_MAX,
      brown_value_max: BROWN_VALUE_MAX,
      pale_saturation_max: PALE_SATURATION_MAX,
      pale_value_min: PALE_VALUE_MIN,
      dark_spot_value_max: DARK_SPOT_VALUE_MAX,
      dark_spot_saturation_min: DARK_SPOT_SATURATION_MIN,
    }
  }
}

impl ColorThresholds {
  pub fn is_green(&self, [h, s, _]: [f32; 3]) -> bool {
    h > self.green_hue_min && h < self.green_hue_max && s > self.green_saturation_min
  }

  pub fn is_yellow(&self, [h, s, _]: [f32; 3]) -> bool {
    h > self.yellow_hue_min && h < self.yellow_hue_max && s > self.yellow_saturation_min
  }

  pub fn is_brown(&self, [h, _, v]: [f32; 3]) -> bool {
    h < self.brown_hue_max && v < self.brown_value_max
  }

  pub fn is_pale(&self, [_, s, v]: [f32; 3]) -> bool {
    s < self.pale_saturation_max && v > self.pale_value_min
  }

  pub fn is_dark_spot(&self, [_, s, v]: [f32; 3]) -> bool {
    v < self.dark_spot_value_max && s > self.dark_spot_saturation_min
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TextureThresholds {
  pub edge_threshold: f32,
  pub laplacian_threshold: f32,
  pub first_difference_gain: f64,
}

impl Default for TextureThresholds {
  fn default() -> Self {
    Self {
      edge_threshold: EDGE_THRESHOLD,
      laplacian_threshold: LAPLACIAN_THRESHOLD,
      first_difference_gain: FIRST_DIFFERENCE_GAIN,
    }
  }
}

/// 斑点信号的计算方式
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SpotOperator {
  /// 四邻域拉普拉斯，统计 |∇²| 超过阈值的像素比例
  #[default]
  Laplacian,
  /// 行、列一阶差分方差之和乘以增益，数量级与前者相近
  FirstDifference,
}

impl FromStr for SpotOperator {
  type Err = ConfigError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "laplacian" => Ok(SpotOperator::Laplacian),
      "first-difference" => Ok(SpotOperator::FirstDifference),
      other => Err(ConfigError::UnknownSpotOperator(other.to_string())),
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ResidualRange {
  pub min: f64,
  pub max: f64,
}

impl Default for ResidualRange {
  fn default() -> Self {
    Self {
      min: RESIDUAL_FACTOR_MIN,
      max: RESIDUAL_FACTOR_MAX,
    }
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
  pub color: ColorThresholds,
  pub texture: TextureThresholds,
  pub spot_operator: SpotOperator,
  /// 有信号类别的分数下限
  pub score_floor: f64,
  /// 剩余类别可分配概率的下限
  pub residual_mass_floor: f64,
  /// 剩余类别的随机系数区间
  pub residual_factor: ResidualRange,
}

impl Default for ScoringConfig {
  fn default() -> Self {
    Self {
      color: ColorThresholds::default(),
      texture: TextureThresholds::default(),
      spot_operator: SpotOperator::default(),
      score_floor: SCORE_FLOOR,
      residual_mass_floor: RESIDUAL_MASS_FLOOR,
      residual_factor: ResidualRange::default(),
    }
  }
}

impl ScoringConfig {
  /// 读取 JSON 配置，缺省字段使用默认值
  pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path)?;
    let config = Self::from_json_str(&text)?;
    info!("加载评分配置: {}", path.display());
    Ok(config)
  }

  pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
    let config: ScoringConfig = serde_json::from_str(text)?;
    config.validate()
  }

  pub fn validate(self) -> Result<Self, ConfigError> {
    let cap = lowest_score_cap();
    let floor = self.score_floor;
    if !(floor.is_finite() && floor > 0.0 && floor <= cap) {
      return Err(ConfigError::InvalidScoreFloor { floor, cap });
    }
    let mass = self.residual_mass_floor;
    if !(mass.is_finite() && mass >= 0.0) {
      return Err(ConfigError::InvalidResidualMassFloor(mass));
    }
    let ResidualRange { min, max } = self.residual_factor;
    if !(min.is_finite() && max.is_finite() && 0.0 < min && min <= max) {
      return Err(ConfigError::InvalidResidualRange { min, max });
    }
    Ok(self)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn partial_json_keeps_defaults() {
    let config = ScoringConfig::from_json_str(
      r#"{ "spot_operator": "first-difference", "color": { "green_hue_min": 0.2 } }"#,
    )
    .expect("合法配置");
    assert_eq!(config.spot_operator, SpotOperator::FirstDifference);
    assert_eq!(config.color.green_hue_min, 0.2);
    assert_eq!(config.color.green_hue_max, GREEN_HUE_MAX);
    assert_eq!(config.score_floor, SCORE_FLOOR);
  }

  #[test]
  fn inverted_residual_range_is_rejected() {
    let result =
      ScoringConfig::from_json_str(r#"{ "residual_factor": { "min": 1.5, "max": 0.5 } }"#);
    assert!(matches!(
      result,
      Err(ConfigError::InvalidResidualRange { .. })
    ));
  }

  #[test]
  fn score_floor_must_stay_under_every_cap() {
    for text in [
      r#"{ "score_floor": 0.8 }"#,
      r#"{ "score_floor": 0.0 }"#,
      r#"{ "score_floor": -0.1 }"#,
    ] {
      assert!(
        matches!(
          ScoringConfig::from_json_str(text),
          Err(ConfigError::InvalidScoreFloor { .. })
        ),
        "{}",
        text
      );
    }
    let config = ScoringConfig::from_json_str(r#"{ "score_floor": 0.7 }"#).expect("等于最小上限");
    assert_eq!(config.score_floor, 0.7);
  }

  #[test]
  fn non_finite_floors_are_rejected() {
    let config = ScoringConfig {
      score_floor: f64::NAN,
      ..ScoringConfig::default()
    };
    assert!(matches!(
      config.validate(),
      Err(ConfigError::InvalidScoreFloor { .. })
    ));

    for mass in [f64::INFINITY, f64::NAN, -0.5] {
      let config = ScoringConfig {
        residual_mass_floor: mass,
        ..ScoringConfig::default()
      };
      assert!(matches!(
        config.validate(),
        Err(ConfigError::InvalidResidualMassFloor(_))
      ));
    }
  }

  #[test]
  fn spot_operator_from_str() {
    assert_eq!("laplacian".parse::<SpotOperator>().ok(), Some(SpotOperator::Laplacian));
    assert!("sobel".parse::<SpotOperator>().is_err());
  }

  #[test]
  fn color_masks_follow_thresholds() {
    let t = ColorThresholds::default();
    assert!(t.is_green([0.33, 0.8, 0.5]));
    assert!(!t.is_green([0.33, 0.1, 0.5]));
    assert!(t.is_yellow([0.16, 0.9, 0.9]));
    assert!(t.is_brown([0.05, 0.7, 0.4]));
    assert!(t.is_pale([0.5, 0.1, 0.9]));
    assert!(t.is_dark_spot([0.5, 0.5, 0.2]));
    assert!(!t.is_dark_spot([0.0, 0.0, 0.0]));
  }
}
