// 该文件是 Yezhen （叶诊） 项目的一部分。
// src/model/signal.rs - 颜色与纹理信号分析
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
use tracing::debug;

use crate::{
  frame::RgbF32Frame,
  model::{ColorThresholds, ScoringConfig, SpotOperator, TextureThresholds},
};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SignalError {
  #[error("信号 {name} 不是有限值: {value}")]
  NonFinite { name: &'static str, value: f64 },
  #[error("比例信号 {name} 超出 [0, 1]: {value}")]
  RatioOutOfRange { name: &'static str, value: f64 },
  #[error("颜色分析线程异常退出")]
  WorkerPanicked,
}

/// 从一帧图像中提取的标量特征
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SignalSet {
  pub green_ratio: f64,
  pub yellow_ratio: f64,
  pub brown_ratio: f64,
  pub pale_ratio: f64,
  pub variance: f64,
  pub edge_density: f64,
  pub spot_density: f64,
  pub dark_spot_ratio: f64,
  pub mean_saturation: f64,
  pub mean_value: f64,
}

impl SignalSet {
  fn ratios(&self) -> [(&'static str, f64); 7] {
    [
      ("green_ratio", self.green_ratio),
      ("yellow_ratio", self.yellow_ratio),
      ("brown_ratio", self.brown_ratio),
      ("pale_ratio", self.pale_ratio),
      ("dark_spot_ratio", self.dark_spot_ratio),
      ("mean_saturation", self.mean_saturation),
      ("mean_value", self.mean_value),
    ]
  }

  fn magnitudes(&self) -> [(&'static str, f64); 3] {
    [
      ("variance", self.variance),
      ("edge_density", self.edge_density),
      ("spot_density", self.spot_density),
    ]
  }

  /// 所有信号必须是有限值，比例类信号必须落在 [0, 1]
  pub fn validate(self) -> Result<Self, SignalError> {
    for (name, value) in self.ratios().into_iter().chain(self.magnitudes()) {
      if !value.is_finite() {
        return Err(SignalError::NonFinite { name, value });
      }
    }
    for (name, value) in self.ratios() {
      if !(0.0..=1.0).contains(&value) {
        return Err(SignalError::RatioOutOfRange { name, value });
      }
    }
    Ok(self)
  }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ColorSignals {
  pub green_ratio: f64,
  pub yellow_ratio: f64,
  pub brown_ratio: f64,
  pub pale_ratio: f64,
  pub dark_spot_ratio: f64,
  pub mean_saturation: f64,
  pub mean_value: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextureSignals {
  pub variance: f64,
  pub edge_density: f64,
  pub spot_density: f64,
}

/// 在 HSV 空间统计各颜色掩码的像素比例
pub fn analyze_color<const W: u32, const H: u32>(
  frame: &RgbF32Frame<W, H>,
  thresholds: &ColorThresholds,
) -> ColorSignals {
  let hsv = frame.to_hsv();
  let total = hsv.pixel_count() as f64;

  let mut green = 0usize;
  let mut yellow = 0usize;
  let mut brown = 0usize;
  let mut pale = 0usize;
  let mut dark = 0usize;
  let mut saturation_sum = 0.0f64;
  let mut value_sum = 0.0f64;

  for px in hsv.pixels() {
    green += thresholds.is_green(px) as usize;
    yellow += thresholds.is_yellow(px) as usize;
    brown += thresholds.is_brown(px) as usize;
    pale += thresholds.is_pale(px) as usize;
    dark += thresholds.is_dark_spot(px) as usize;
    saturation_sum += px[1] as f64;
    value_sum += px[2] as f64;
  }

  ColorSignals {
    green_ratio: green as f64 / total,
    yellow_ratio: yellow as f64 / total,
    brown_ratio: brown as f64 / total,
    pale_ratio: pale as f64 / total,
    dark_spot_ratio: dark as f64 / total,
    mean_saturation: saturation_sum / total,
    mean_value: value_sum / total,
  }
}

/// 方差、边缘密度与斑点密度
pub fn analyze_texture<const W: u32, const H: u32>(
  frame: &RgbF32Frame<W, H>,
  thresholds: &TextureThresholds,
  operator: SpotOperator,
) -> TextureSignals {
  let (width, height) = (W as usize, H as usize);
  let total = (width * height) as f64;
  let gray = frame.to_gray();

  let pixel_variance = variance(frame.as_slice().iter().copied());

  let mut edges = 0usize;
  for y in 0..height {
    for x in 0..width {
      let gy = gradient(|i| gray[i * width + x], y, height);
      let gx = gradient(|i| gray[y * width + i], x, width);
      if gy.abs() + gx.abs() > thresholds.edge_threshold {
        edges += 1;
      }
    }
  }

  let spot_density = match operator {
    SpotOperator::Laplacian => {
      let mut spots = 0usize;
      for y in 0..height {
        for x in 0..width {
          if laplacian(&gray, width, height, x, y).abs() > thresholds.laplacian_threshold {
            spots += 1;
          }
        }
      }
      spots as f64 / total
    }
    SpotOperator::FirstDifference => {
      // 沿行方向与沿列方向的一阶差分
      let rows = (1..height)
        .flat_map(|y| (0..width).map(move |x| (x, y)))
        .map(|(x, y)| gray[y * width + x] - gray[(y - 1) * width + x]);
      let cols = (0..height)
        .flat_map(|y| (1..width).map(move |x| (x, y)))
        .map(|(x, y)| gray[y * width + x] - gray[y * width + x - 1]);
      (variance(rows) + variance(cols)) * thresholds.first_difference_gain
    }
  };

  TextureSignals {
    variance: pixel_variance,
    edge_density: edges as f64 / total,
    spot_density,
  }
}

/// 颜色分析与纹理分析并行执行，两者都完成后合并
pub fn compute_signals<const W: u32, const H: u32>(
  frame: &RgbF32Frame<W, H>,
  config: &ScoringConfig,
) -> Result<SignalSet, SignalError> {
  let (color, texture) = std::thread::scope(|s| {
    let color = s.spawn(|| analyze_color(frame, &config.color));
    let texture = analyze_texture(frame, &config.texture, config.spot_operator);
    (color.join(), texture)
  });
  let color = color.map_err(|_| SignalError::WorkerPanicked)?;

  let signals = SignalSet {
    green_ratio: color.green_ratio,
    yellow_ratio: color.yellow_ratio,
    brown_ratio: color.brown_ratio,
    pale_ratio: color.pale_ratio,
    variance: texture.variance,
    edge_density: texture.edge_density,
    spot_density: texture.spot_density,
    dark_spot_ratio: color.dark_spot_ratio,
    mean_saturation: color.mean_saturation,
    mean_value: color.mean_value,
  };
  debug!("信号: {:?}", signals);

  signals.validate()
}

/// 总体方差（除以 n），空序列为 0
fn variance(values: impl Iterator<Item = f32> + Clone) -> f64 {
  let (count, sum) = values
    .clone()
    .fold((0usize, 0.0f64), |(n, s), v| (n + 1, s + v as f64));
  if count == 0 {
    return 0.0;
  }
  let mean = sum / count as f64;
  values
    .map(|v| {
      let d = v as f64 - mean;
      d * d
    })
    .sum::<f64>()
    / count as f64
}

/// 内部用中心差分，边界用单侧差分
fn gradient(at: impl Fn(usize) -> f32, i: usize, n: usize) -> f32 {
  if n < 2 {
    0.0
  } else if i == 0 {
    at(1) - at(0)
  } else if i == n - 1 {
    at(n - 1) - at(n - 2)
  } else {
    (at(i + 1) - at(i - 1)) / 2.0
  }
}

/// 四邻域拉普拉斯，越界时复制边缘像素
fn laplacian(gray: &[f32], width: usize, height: usize, x: usize, y: usize) -> f32 {
  let at = |x: usize, y: usize| gray[y * width + x];
  let up = at(x, y.saturating_sub(1));
  let down = at(x, (y + 1).min(height - 1));
  let left = at(x.saturating_sub(1), y);
  let right = at((x + 1).min(width - 1), y);
  up + down + left + right - 4.0 * at(x, y)
}

#[cfg(test)]
mod tests {
  use rand::{Rng, SeedableRng, rngs::StdRng};

  use super::*;
  use crate::frame::LeafFrame;

  fn signals_of(frame: &LeafFrame) -> SignalSet {
    compute_signals(frame, &ScoringConfig::default()).expect("信号应当有效")
  }

  #[test]
  fn uniform_green_frame() {
    let signals = signals_of(&LeafFrame::filled([0.1, 0.8, 0.1]));
    assert!((signals.green_ratio - 1.0).abs() < 1e-9);
    assert_eq!(signals.yellow_ratio, 0.0);
    assert_eq!(signals.brown_ratio, 0.0);
    assert_eq!(signals.pale_ratio, 0.0);
    assert_eq!(signals.edge_density, 0.0);
    assert_eq!(signals.spot_density, 0.0);
    assert_eq!(signals.dark_spot_ratio, 0.0);
    assert!((signals.mean_value - 0.8).abs() < 1e-6);
    // 三个取值 0.1/0.8/0.1 的总体方差
    assert!((signals.variance - 0.108_888_9).abs() < 1e-5, "{}", signals.variance);
  }

  #[test]
  fn black_frame_has_no_nan() {
    let signals = signals_of(&LeafFrame::default());
    assert_eq!(signals.green_ratio, 0.0);
    assert_eq!(signals.pale_ratio, 0.0);
    assert_eq!(signals.mean_value, 0.0);
    assert_eq!(signals.mean_saturation, 0.0);
    assert_eq!(signals.variance, 0.0);
    // 黑色像素色相为 0 且明度低，算作褐色
    assert!((signals.brown_ratio - 1.0).abs() < 1e-9);
  }

  #[test]
  fn pale_frame() {
    let signals = signals_of(&LeafFrame::filled([0.9, 0.9, 0.88]));
    assert!((signals.pale_ratio - 1.0).abs() < 1e-9);
    assert_eq!(signals.green_ratio, 0.0);
  }

  #[test]
  fn vertical_stripes_produce_edges_and_spots() {
    let frame = LeafFrame::from_fn(|x, _| if x % 2 == 0 { [1.0; 3] } else { [0.0; 3] });
    let signals = signals_of(&frame);
    // 相邻列交替，中心差分为 0，只有左右边界列有单侧梯度
    assert!((signals.edge_density - 2.0 / 224.0).abs() < 1e-9);
    // 每个像素的拉普拉斯幅值都是 2
    assert!((signals.spot_density - 1.0).abs() < 1e-9);
  }

  #[test]
  fn gradient_matches_numpy_convention() {
    let values = [1.0f32, 2.0, 4.0, 7.0];
    let at = |i: usize| values[i];
    assert_eq!(gradient(at, 0, 4), 1.0);
    assert_eq!(gradient(at, 1, 4), 1.5);
    assert_eq!(gradient(at, 2, 4), 2.5);
    assert_eq!(gradient(at, 3, 4), 3.0);
    assert_eq!(gradient(at, 0, 1), 0.0);
  }

  #[test]
  fn single_bright_pixel_laplacian() {
    let frame = RgbF32Frame::<5, 5>::from_fn(|x, y| if (x, y) == (2, 2) { [1.0; 3] } else { [0.0; 3] });
    let signals = analyze_texture(&frame, &TextureThresholds::default(), SpotOperator::Laplacian);
    // 中心 -4，四个邻居各 +1
    assert!((signals.spot_density - 5.0 / 25.0).abs() < 1e-9);
  }

  #[test]
  fn first_difference_operator_is_non_negative() {
    let mut rng = StdRng::seed_from_u64(11);
    let frame = LeafFrame::from_fn(|_, _| [rng.random(), rng.random(), rng.random()]);
    let texture = analyze_texture(
      &frame,
      &TextureThresholds::default(),
      SpotOperator::FirstDifference,
    );
    assert!(texture.spot_density > 0.0);
    assert!(texture.spot_density.is_finite());

    let flat = analyze_texture(
      &LeafFrame::filled([0.4, 0.5, 0.6]),
      &TextureThresholds::default(),
      SpotOperator::FirstDifference,
    );
    assert_eq!(flat.spot_density, 0.0);
  }

  #[test]
  fn random_frames_keep_ratios_in_range() {
    let mut rng = StdRng::seed_from_u64(7);
    for _ in 0..4 {
      let frame = LeafFrame::from_fn(|_, _| [rng.random(), rng.random(), rng.random()]);
      let signals = signals_of(&frame);
      for (_, value) in signals.ratios() {
        assert!((0.0..=1.0).contains(&value));
      }
      assert!(signals.variance >= 0.0);
      assert!(signals.edge_density >= 0.0 && signals.spot_density >= 0.0);
    }
  }

  #[test]
  fn nan_pixel_is_reported() {
    let frame = LeafFrame::from_fn(|x, y| if (x, y) == (3, 3) { [f32::NAN, 0.5, 0.5] } else { [0.2, 0.6, 0.2] });
    let result = compute_signals(&frame, &ScoringConfig::default());
    assert!(matches!(result, Err(SignalError::NonFinite { .. })));
  }
}
