// 该文件是 Yezhen （叶诊） 项目的一部分。
// src/model/heuristic.rs - 启发式叶片病害分类器
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
  marker::PhantomData,
  path::PathBuf,
  sync::{Mutex, PoisonError},
};

use rand::{Rng, SeedableRng, rngs::StdRng};
use thiserror::Error;
use tracing::{debug, error, info, warn};
use url::Url;

use crate::{
  FromUrl, FromUrlWithScheme,
  frame::{LeafFrame, RgbF32Frame},
  model::{
    CATEGORY_COUNT, ClassifyError, ConfigError, DEFAULT_TOP_K, DiseaseCategory, Model,
    Prediction, PredictionResult, ScoringConfig, SignalError, SignalSet, SpotOperator,
    compute_signals, rank, score_categories, validate_top_k,
  },
};

const DEGRADED_CONFIDENCE_MIN: f64 = 0.2;
const DEGRADED_CONFIDENCE_MAX: f64 = 0.9;

#[derive(Error, Debug)]
pub enum HeuristicBuildError {
  #[error("URI 方案不匹配: 期望 '{expected}', 实际 '{0}'", expected = HeuristicBuilder::SCHEME)]
  SchemeMismatch(String),
  #[error("无效的模型参数 {key}={value}")]
  InvalidParameter { key: String, value: String },
  #[error("评分配置错误: {0}")]
  ConfigError(#[from] ConfigError),
  #[error("分类参数错误: {0}")]
  ClassifyError(#[from] ClassifyError),
}

impl HeuristicBuildError {
  fn invalid(key: &str, value: &str) -> Self {
    HeuristicBuildError::InvalidParameter {
      key: key.to_string(),
      value: value.to_string(),
    }
  }
}

/// 基于颜色与纹理信号的分类器
///
/// 剩余类别的随机系数来自 `rng`，互斥锁只在抽取随机数期间持有。
pub struct HeuristicClassifier<F, R = StdRng> {
  config: ScoringConfig,
  top_k: usize,
  rng: Mutex<R>,
  _phantom: PhantomData<F>,
}

impl<F, R: Rng> HeuristicClassifier<F, R> {
  pub fn new(config: ScoringConfig, top_k: usize, rng: R) -> Result<Self, ClassifyError> {
    Ok(Self {
      config,
      top_k: validate_top_k(top_k)?,
      rng: Mutex::new(rng),
      _phantom: PhantomData,
    })
  }

  pub fn config(&self) -> &ScoringConfig {
    &self.config
  }

  pub fn top_k(&self) -> usize {
    self.top_k
  }

  /// 对任意尺寸的帧评分
  pub fn classify<const W: u32, const H: u32>(
    &self,
    frame: &RgbF32Frame<W, H>,
  ) -> Result<PredictionResult, ClassifyError> {
    let signals = compute_signals(frame, &self.config);
    let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
    classify_signals(signals, self.top_k, &self.config, &mut *rng)
  }
}

impl<F: AsRef<LeafFrame>, R: Rng> Model for HeuristicClassifier<F, R> {
  type Input = F;
  type Output = PredictionResult;
  type Error = ClassifyError;

  fn infer(&self, input: &Self::Input) -> Result<Self::Output, Self::Error> {
    self.classify(input.as_ref())
  }
}

impl<F> FromUrl for HeuristicClassifier<F, StdRng> {
  type Error = HeuristicBuildError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    HeuristicBuilder::from_url(url)?.build()
  }
}

impl<F> FromUrlWithScheme for HeuristicClassifier<F, StdRng> {
  const SCHEME: &'static str = HeuristicBuilder::SCHEME;
}

/// 对一帧完成 信号 -> 打分 -> 排序
///
/// 信号无效时不报错，返回降级结果。
pub fn classify_frame<const W: u32, const H: u32, R: Rng + ?Sized>(
  frame: &RgbF32Frame<W, H>,
  top_k: usize,
  config: &ScoringConfig,
  rng: &mut R,
) -> Result<PredictionResult, ClassifyError> {
  let top_k = validate_top_k(top_k)?;
  classify_signals(compute_signals(frame, config), top_k, config, rng)
}

fn classify_signals<R: Rng + ?Sized>(
  signals: Result<SignalSet, SignalError>,
  top_k: usize,
  config: &ScoringConfig,
  rng: &mut R,
) -> Result<PredictionResult, ClassifyError> {
  match signals {
    Ok(signals) => {
      let scores = score_categories(&signals, config, rng);
      let result = rank(&scores, top_k)?;
      if let Some(top) = result.top() {
        debug!("最高置信度: {} ({:.4})", top.category_key, top.confidence);
      }
      Ok(result)
    }
    Err(e) => {
      warn!("信号计算失败，返回降级结果: {}", e);
      Ok(degraded_result(top_k, rng))
    }
  }
}

/// 降级结果：按声明顺序取前 `top_k` 个类别，置信度随机取自 [0.2, 0.9]
pub fn degraded_result<R: Rng + ?Sized>(top_k: usize, rng: &mut R) -> PredictionResult {
  let mut items = DiseaseCategory::ALL
    .into_iter()
    .take(top_k.min(CATEGORY_COUNT))
    .map(|category| {
      Prediction::new(
        category,
        rng.random_range(DEGRADED_CONFIDENCE_MIN..=DEGRADED_CONFIDENCE_MAX),
      )
    })
    .collect::<Vec<_>>();
  items.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
  PredictionResult::degraded(items)
}

pub struct HeuristicBuilder {
  config: ScoringConfig,
  top_k: usize,
  seed: Option<u64>,
}

impl Default for HeuristicBuilder {
  fn default() -> Self {
    Self {
      config: ScoringConfig::default(),
      top_k: DEFAULT_TOP_K,
      seed: None,
    }
  }
}

impl FromUrlWithScheme for HeuristicBuilder {
  const SCHEME: &'static str = "heuristic";
}

impl FromUrl for HeuristicBuilder {
  type Error = HeuristicBuildError;

  /// `heuristic://?seed=7&top_k=5&spot=first-difference&config=/etc/yezhen.json`
  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    if url.scheme() != Self::SCHEME {
      error!("模型 URI 方案错误: {}", url.scheme());
      return Err(HeuristicBuildError::SchemeMismatch(
        url.scheme().to_string(),
      ));
    }

    let mut builder = HeuristicBuilder::default();
    let mut spot = None;
    let mut config_path = None;
    for (k, v) in url.query_pairs() {
      match k.as_ref() {
        "seed" => {
          let seed = v.parse().map_err(|_| HeuristicBuildError::invalid(&k, &v))?;
          builder = builder.seed(seed);
        }
        "top_k" => {
          let top_k = v.parse().map_err(|_| HeuristicBuildError::invalid(&k, &v))?;
          builder = builder.top_k(top_k);
        }
        "spot" => spot = Some(v.parse::<SpotOperator>()?),
        "config" => config_path = Some(PathBuf::from(v.as_ref())),
        other => warn!("忽略未知的模型参数: {}", other),
      }
    }

    // 先读配置文件，再让 spot 参数覆盖其中的算子
    if let Some(path) = config_path {
      builder = builder.config(ScoringConfig::from_json_file(path)?);
    }
    if let Some(spot) = spot {
      builder.config.spot_operator = spot;
    }

    Ok(builder)
  }
}

impl HeuristicBuilder {
  pub fn config(mut self, config: ScoringConfig) -> Self {
    self.config = config;
    self
  }

  pub fn top_k(mut self, top_k: usize) -> Self {
    self.top_k = top_k;
    self
  }

  pub fn seed(mut self, seed: u64) -> Self {
    self.seed = Some(seed);
    self
  }

  pub fn build<F>(self) -> Result<HeuristicClassifier<F, StdRng>, HeuristicBuildError> {
    let rng = match self.seed {
      Some(seed) => {
        info!("使用固定随机种子: {}", seed);
        StdRng::seed_from_u64(seed)
      }
      None => StdRng::from_os_rng(),
    };
    self.build_with_rng(rng)
  }

  pub fn build_with_rng<F, R: Rng>(
    self,
    rng: R,
  ) -> Result<HeuristicClassifier<F, R>, HeuristicBuildError> {
    info!(
      "创建启发式分类器: top_k = {}, 斑点算子 = {:?}",
      self.top_k, self.config.spot_operator
    );
    Ok(HeuristicClassifier::new(self.config, self.top_k, rng)?)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::input::LeafInput;

  fn classifier(url: &str) -> HeuristicClassifier<LeafFrame> {
    let url = Url::parse(url).expect("合法 URL");
    HeuristicClassifier::from_url(&url).expect("合法模型参数")
  }

  #[test]
  fn url_parameters_are_applied() {
    let url = Url::parse("heuristic://?seed=7&top_k=5&spot=first-difference").expect("合法 URL");
    let builder = HeuristicBuilder::from_url(&url).expect("合法模型参数");
    assert_eq!(builder.seed, Some(7));
    assert_eq!(builder.top_k, 5);
    assert_eq!(builder.config.spot_operator, SpotOperator::FirstDifference);
  }

  #[test]
  fn bad_parameters_are_rejected() {
    for url in [
      "heuristic://?seed=abc",
      "heuristic://?top_k=-1",
      "heuristic://?spot=sobel",
      "model://?seed=1",
    ] {
      let url = Url::parse(url).expect("合法 URL");
      assert!(HeuristicBuilder::from_url(&url).is_err(), "{}", url);
    }

    let url = Url::parse("heuristic://?top_k=16").expect("合法 URL");
    assert!(matches!(
      HeuristicClassifier::<LeafFrame>::from_url(&url),
      Err(HeuristicBuildError::ClassifyError(ClassifyError::InvalidTopK(16)))
    ));
  }

  #[test]
  fn same_seed_gives_same_result() {
    let frame = LeafFrame::from_fn(|x, y| {
      let t = ((x * 7 + y * 13) % 32) as f32 / 32.0;
      [0.2 + 0.5 * t, 0.6, 0.1 + 0.2 * t]
    });
    let a = classifier("heuristic://?seed=42&top_k=15")
      .infer(&frame)
      .expect("评分成功");
    let b = classifier("heuristic://?seed=42&top_k=15")
      .infer(&frame)
      .expect("评分成功");

    let pairs = a.items().iter().zip(b.items());
    for (pa, pb) in pairs {
      assert_eq!(pa.category, pb.category);
      assert_eq!(pa.confidence.to_bits(), pb.confidence.to_bits());
    }
  }

  #[test]
  fn green_leaf_is_healthy() {
    let input = LeafInput {
      origin: "test".to_string(),
      frame: LeafFrame::filled([0.1, 0.8, 0.1]),
    };
    let model: HeuristicClassifier<LeafInput> =
      HeuristicBuilder::default().seed(1).build().expect("默认参数合法");
    let result = model.infer(&input).expect("评分成功");
    assert_eq!(result.len(), DEFAULT_TOP_K);
    assert_eq!(
      result.top().map(|p| p.category),
      Some(DiseaseCategory::Healthy)
    );
    assert!((result.total_confidence() - 1.0).abs() < 1e-6);
    assert_eq!(model.top_k(), DEFAULT_TOP_K);
  }

  #[test]
  fn nan_frame_is_degraded() {
    let mut frame = LeafFrame::filled([0.1, 0.8, 0.1]);
    frame.as_mut()[0] = f32::NAN;

    let result = classifier("heuristic://?seed=3&top_k=4")
      .infer(&frame)
      .expect("降级结果不是错误");
    assert!(result.is_degraded());
    assert_eq!(result.len(), 4);

    let mut categories = result.items().iter().map(|p| p.category).collect::<Vec<_>>();
    categories.sort();
    assert_eq!(categories, DiseaseCategory::ALL[..4].to_vec());
    for pair in result.items().windows(2) {
      assert!(pair[0].confidence >= pair[1].confidence);
    }
    for p in result.items() {
      assert!((DEGRADED_CONFIDENCE_MIN..=DEGRADED_CONFIDENCE_MAX).contains(&p.confidence));
    }
  }

  #[test]
  fn classify_frame_accepts_other_sizes() {
    let frame = RgbF32Frame::<16, 16>::filled([0.1, 0.8, 0.1]);
    let mut rng = StdRng::seed_from_u64(5);
    let result =
      classify_frame(&frame, 2, &ScoringConfig::default(), &mut rng).expect("评分成功");
    assert_eq!(result.len(), 2);
    assert!(matches!(
      classify_frame(&frame, 0, &ScoringConfig::default(), &mut rng),
      Err(ClassifyError::InvalidTopK(0))
    ));
  }
}
