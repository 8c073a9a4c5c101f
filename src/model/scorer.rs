// 该文件是 Yezhen （叶诊） 项目的一部分。
// src/model/scorer.rs - 类别打分
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

use rand::Rng;
use tracing::debug;

use crate::model::{CATEGORY_COUNT, DiseaseCategory, ScoringConfig, SignalSet};

// 健康：绿色占比高，且颜色均匀
const HEALTHY_GREEN_WEIGHT: f64 = 0.6;
const HEALTHY_MAX_VARIANCE: f64 = 0.02;
const HEALTHY_MAX_YELLOW: f64 = 0.2;
const HEALTHY_MAX_BROWN: f64 = 0.1;
const HEALTHY_BONUS: f64 = 0.3;
const HEALTHY_CAP: f64 = 0.95;

// 叶斑：斑点 + 暗斑 + 黄化
const LEAF_SPOT_SPOT_WEIGHT: f64 = 0.4;
const LEAF_SPOT_DARK_WEIGHT: f64 = 0.3;
const LEAF_SPOT_YELLOW_WEIGHT: f64 = 0.2;
const LEAF_SPOT_MIN_SPOT: f64 = 0.1;
const LEAF_SPOT_MIN_DARK: f64 = 0.05;
const LEAF_SPOT_BONUS: f64 = 0.2;
const LEAF_SPOT_CAP: f64 = 0.85;

// 黄化
const YELLOWING_YELLOW_WEIGHT: f64 = 0.6;
const YELLOWING_MIN_YELLOW: f64 = 0.3;
const YELLOWING_MAX_GREEN: f64 = 0.4;
const YELLOWING_BONUS: f64 = 0.25;
const YELLOWING_CAP: f64 = 0.85;

// 白粉病：低饱和度的浅色斑块
const POWDERY_PALE_WEIGHT: f64 = 0.5;
const POWDERY_MIN_PALE: f64 = 0.2;
const POWDERY_MAX_SATURATION: f64 = 0.3;
const POWDERY_BONUS: f64 = 0.3;
const POWDERY_CAP: f64 = 0.80;

// 枯萎病：褐色 + 纹理
const BLIGHT_BROWN_WEIGHT: f64 = 0.4;
const BLIGHT_EDGE_WEIGHT: f64 = 0.3;
const BLIGHT_MIN_BROWN: f64 = 0.3;
const BLIGHT_MIN_VARIANCE: f64 = 0.03;
const BLIGHT_MAX_VALUE: f64 = 0.5;
const BLIGHT_BONUS: f64 = 0.2;
const BLIGHT_CAP: f64 = 0.80;

// 霜霉病：黄化 + 浅色 + 方差
const DOWNY_YELLOW_WEIGHT: f64 = 0.3;
const DOWNY_PALE_WEIGHT: f64 = 0.2;
const DOWNY_VARIANCE_WEIGHT: f64 = 2.0;
const DOWNY_MIN_YELLOW: f64 = 0.2;
const DOWNY_MIN_VARIANCE: f64 = 0.025;
const DOWNY_BONUS: f64 = 0.2;
const DOWNY_CAP: f64 = 0.75;

// 青枯病：暗绿色
const WILT_BASE: f64 = 0.1;
const WILT_MIN_GREEN: f64 = 0.4;
const WILT_MAX_VALUE: f64 = 0.5;
const WILT_BONUS: f64 = 0.3;
const WILT_CAP: f64 = 0.70;

// 卷叶：边缘密度
const CURL_EDGE_WEIGHT: f64 = 0.4;
const CURL_MIN_EDGE: f64 = 0.3;
const CURL_BONUS: f64 = 0.2;
const CURL_CAP: f64 = 0.70;

/// 有信号支撑的类别数量
pub const SCORED_COUNT: usize = CATEGORY_COUNT - DiseaseCategory::RESIDUAL.len();

/// 有信号类别的分数上限，剩余类别返回 `None`
pub fn score_cap(category: DiseaseCategory) -> Option<f64> {
  match category {
    DiseaseCategory::Healthy => Some(HEALTHY_CAP),
    DiseaseCategory::LeafSpot => Some(LEAF_SPOT_CAP),
    DiseaseCategory::LeafYellowing => Some(YELLOWING_CAP),
    DiseaseCategory::PowderyMildew => Some(POWDERY_CAP),
    DiseaseCategory::Blight => Some(BLIGHT_CAP),
    DiseaseCategory::DownyMildew => Some(DOWNY_CAP),
    DiseaseCategory::BacterialWilt => Some(WILT_CAP),
    DiseaseCategory::LeafCurl => Some(CURL_CAP),
    _ => None,
  }
}

/// 所有有信号类别上限中的最小值，分数下限不得超过它
pub fn lowest_score_cap() -> f64 {
  DiseaseCategory::ALL
    .into_iter()
    .filter_map(score_cap)
    .fold(f64::INFINITY, f64::min)
}

/// 先取下限再取上限；下限无效时不会 panic
fn bound(score: f64, floor: f64, cap: f64) -> f64 {
  score.max(floor).min(cap)
}

fn bonus(condition: bool, amount: f64) -> f64 {
  if condition { amount } else { 0.0 }
}

/// 15 个类别的原始分数，按类别序号存放
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryScores {
  scores: [f64; CATEGORY_COUNT],
}

impl CategoryScores {
  pub fn from_array(scores: [f64; CATEGORY_COUNT]) -> Self {
    Self { scores }
  }

  pub fn get(&self, category: DiseaseCategory) -> f64 {
    self.scores[category.index()]
  }

  pub fn iter(&self) -> impl Iterator<Item = (DiseaseCategory, f64)> + '_ {
    DiseaseCategory::ALL
      .into_iter()
      .zip(self.scores.iter().copied())
  }

  pub fn total(&self) -> f64 {
    self.scores.iter().sum()
  }
}

/// 8 个有信号类别的分数，只依赖信号本身，不含随机成分
pub fn scored_categories(
  signals: &SignalSet,
  floor: f64,
) -> [(DiseaseCategory, f64); SCORED_COUNT] {
  let s = signals;

  let healthy = s.green_ratio * HEALTHY_GREEN_WEIGHT
    + bonus(
      s.variance < HEALTHY_MAX_VARIANCE
        && s.yellow_ratio < HEALTHY_MAX_YELLOW
        && s.brown_ratio < HEALTHY_MAX_BROWN,
      HEALTHY_BONUS,
    );

  let leaf_spot = s.spot_density * LEAF_SPOT_SPOT_WEIGHT
    + s.dark_spot_ratio * LEAF_SPOT_DARK_WEIGHT
    + s.yellow_ratio * LEAF_SPOT_YELLOW_WEIGHT
    + bonus(
      s.spot_density > LEAF_SPOT_MIN_SPOT || s.dark_spot_ratio > LEAF_SPOT_MIN_DARK,
      LEAF_SPOT_BONUS,
    );

  let yellowing = s.yellow_ratio * YELLOWING_YELLOW_WEIGHT
    + bonus(
      s.yellow_ratio > YELLOWING_MIN_YELLOW && s.green_ratio < YELLOWING_MAX_GREEN,
      YELLOWING_BONUS,
    );

  let powdery = s.pale_ratio * POWDERY_PALE_WEIGHT
    + bonus(
      s.pale_ratio > POWDERY_MIN_PALE && s.mean_saturation < POWDERY_MAX_SATURATION,
      POWDERY_BONUS,
    );

  let blight = s.brown_ratio * BLIGHT_BROWN_WEIGHT
    + s.edge_density * BLIGHT_EDGE_WEIGHT
    + bonus(
      s.brown_ratio > BLIGHT_MIN_BROWN
        || (s.variance > BLIGHT_MIN_VARIANCE && s.mean_value < BLIGHT_MAX_VALUE),
      BLIGHT_BONUS,
    );

  let downy = s.yellow_ratio * DOWNY_YELLOW_WEIGHT
    + s.pale_ratio * DOWNY_PALE_WEIGHT
    + s.variance * DOWNY_VARIANCE_WEIGHT
    + bonus(
      s.yellow_ratio > DOWNY_MIN_YELLOW && s.variance > DOWNY_MIN_VARIANCE,
      DOWNY_BONUS,
    );

  let wilt = WILT_BASE
    + bonus(
      s.green_ratio > WILT_MIN_GREEN && s.mean_value < WILT_MAX_VALUE,
      WILT_BONUS,
    );

  let curl = s.edge_density * CURL_EDGE_WEIGHT + bonus(s.edge_density > CURL_MIN_EDGE, CURL_BONUS);

  [
    (DiseaseCategory::Healthy, bound(healthy, floor, HEALTHY_CAP)),
    (DiseaseCategory::LeafSpot, bound(leaf_spot, floor, LEAF_SPOT_CAP)),
    (DiseaseCategory::LeafYellowing, bound(yellowing, floor, YELLOWING_CAP)),
    (DiseaseCategory::PowderyMildew, bound(powdery, floor, POWDERY_CAP)),
    (DiseaseCategory::Blight, bound(blight, floor, BLIGHT_CAP)),
    (DiseaseCategory::DownyMildew, bound(downy, floor, DOWNY_CAP)),
    (DiseaseCategory::BacterialWilt, bound(wilt, floor, WILT_CAP)),
    (DiseaseCategory::LeafCurl, bound(curl, floor, CURL_CAP)),
  ]
}

/// 计算全部 15 个类别的原始分数
///
/// 剩余 7 个类别平分 `max(residual_mass_floor, 1 - Σ有信号类别)`，
/// 每个类别再乘以从 `residual_factor` 区间独立抽取的随机系数。
pub fn score_categories<R: Rng + ?Sized>(
  signals: &SignalSet,
  config: &ScoringConfig,
  rng: &mut R,
) -> CategoryScores {
  let mut scores = [0.0f64; CATEGORY_COUNT];

  let scored = scored_categories(signals, config.score_floor);
  for (category, score) in scored {
    scores[category.index()] = score;
  }

  let assigned: f64 = scored.iter().map(|(_, score)| score).sum();
  let remaining = (1.0 - assigned).max(config.residual_mass_floor);
  let share = remaining / DiseaseCategory::RESIDUAL.len() as f64;
  let range = config.residual_factor;
  for category in DiseaseCategory::RESIDUAL {
    scores[category.index()] = share * rng.random_range(range.min..=range.max);
  }

  debug!("原始分数: 有信号类别合计 {:.4}, 剩余概率 {:.4}", assigned, remaining);
  CategoryScores { scores }
}
