// 该文件是 Yezhen （叶诊） 项目的一部分。
// src/model/label.rs - 病害类别与显示名称
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

use std::fmt;

use serde::{Deserialize, Serialize};

pub const CATEGORY_COUNT: usize = 15;

/// 固定的 15 个类别：健康 + 14 种病害
///
/// 声明顺序即类别序号，排名相同时按此顺序排列。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiseaseCategory {
  Healthy,
  LeafSpot,
  LeafYellowing,
  PowderyMildew,
  Blight,
  DownyMildew,
  BacterialWilt,
  LeafCurl,
  VirusMosaic,
  Anthracnose,
  RootRot,
  RingSpot,
  LeafMosaic,
  FruitRot,
  Wilting,
}

impl DiseaseCategory {
  pub const ALL: [DiseaseCategory; CATEGORY_COUNT] = [
    DiseaseCategory::Healthy,
    DiseaseCategory::LeafSpot,
    DiseaseCategory::LeafYellowing,
    DiseaseCategory::PowderyMildew,
    DiseaseCategory::Blight,
    DiseaseCategory::DownyMildew,
    DiseaseCategory::BacterialWilt,
    DiseaseCategory::LeafCurl,
    DiseaseCategory::VirusMosaic,
    DiseaseCategory::Anthracnose,
    DiseaseCategory::RootRot,
    DiseaseCategory::RingSpot,
    DiseaseCategory::LeafMosaic,
    DiseaseCategory::FruitRot,
    DiseaseCategory::Wilting,
  ];

  /// 没有像素信号支撑、只分配剩余概率的类别
  pub const RESIDUAL: [DiseaseCategory; 7] = [
    DiseaseCategory::VirusMosaic,
    DiseaseCategory::Anthracnose,
    DiseaseCategory::RootRot,
    DiseaseCategory::RingSpot,
    DiseaseCategory::LeafMosaic,
    DiseaseCategory::FruitRot,
    DiseaseCategory::Wilting,
  ];

  pub fn index(self) -> usize {
    self as usize
  }

  pub fn key(self) -> &'static str {
    match self {
      DiseaseCategory::Healthy => "healthy",
      DiseaseCategory::LeafSpot => "leaf_spot",
      DiseaseCategory::LeafYellowing => "leaf_yellowing",
      DiseaseCategory::PowderyMildew => "powdery_mildew",
      DiseaseCategory::Blight => "blight",
      DiseaseCategory::DownyMildew => "downy_mildew",
      DiseaseCategory::BacterialWilt => "bacterial_wilt",
      DiseaseCategory::LeafCurl => "leaf_curl",
      DiseaseCategory::VirusMosaic => "virus_mosaic",
      DiseaseCategory::Anthracnose => "anthracnose",
      DiseaseCategory::RootRot => "root_rot",
      DiseaseCategory::RingSpot => "ring_spot",
      DiseaseCategory::LeafMosaic => "leaf_mosaic",
      DiseaseCategory::FruitRot => "fruit_rot",
      DiseaseCategory::Wilting => "wilting",
    }
  }

  /// 越南语显示名称
  pub fn display_label(self) -> &'static str {
    match self {
      DiseaseCategory::Healthy => "Lá khỏe mạnh",
      DiseaseCategory::LeafSpot => "Bệnh đốm lá",
      DiseaseCategory::LeafYellowing => "Bệnh vàng lá",
      DiseaseCategory::PowderyMildew => "Bệnh nấm phấn trắng",
      DiseaseCategory::Blight => "Bệnh đạo ôn",
      DiseaseCategory::DownyMildew => "Bệnh giả phấn",
      DiseaseCategory::BacterialWilt => "Bệnh héo xanh",
      DiseaseCategory::LeafCurl => "Bệnh xoăn lá",
      DiseaseCategory::VirusMosaic => "Bệnh khảm virus",
      DiseaseCategory::Anthracnose => "Bệnh thán thư",
      DiseaseCategory::RootRot => "Bệnh thối rễ",
      DiseaseCategory::RingSpot => "Bệnh đốm vòng",
      DiseaseCategory::LeafMosaic => "Bệnh khảm lá",
      DiseaseCategory::FruitRot => "Bệnh thối quả",
      DiseaseCategory::Wilting => "Bệnh héo rũ",
    }
  }

  pub fn from_key(key: &str) -> Option<Self> {
    Self::ALL.into_iter().find(|c| c.key() == key)
  }

  pub fn from_display_label(label: &str) -> Option<Self> {
    Self::ALL.into_iter().find(|c| c.display_label() == label)
  }

  pub fn is_residual(self) -> bool {
    Self::RESIDUAL.contains(&self)
  }
}

impl fmt::Display for DiseaseCategory {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.key())
  }
}

/// 类别键 -> 显示名称，未知的键原样返回
pub fn lookup_display_label(key: &str) -> &str {
  DiseaseCategory::from_key(key)
    .map(DiseaseCategory::display_label)
    .unwrap_or(key)
}
