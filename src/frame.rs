// 该文件是 Yezhen （叶诊） 项目的一部分。
// src/frame.rs - HWC 浮点帧定义
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

use image::RgbImage;
use thiserror::Error;

const RGB_CHANNELS: usize = 3;
const HSV_CHANNELS: usize = 3;

/// 叶片帧的标准宽度
pub const LEAF_FRAME_WIDTH: u32 = 224;
/// 叶片帧的标准高度
pub const LEAF_FRAME_HEIGHT: u32 = 224;

/// 评分引擎使用的标准叶片帧，RGB 三通道，取值 [0, 1]
pub type LeafFrame = RgbF32Frame<LEAF_FRAME_WIDTH, LEAF_FRAME_HEIGHT>;

#[derive(Error, Debug)]
pub enum FrameError {
  #[error("数据长度不匹配: 期望长度 {expected}, 实际长度 {actual}")]
  LengthMismatch { expected: usize, actual: usize },
  #[error("图像尺寸不匹配: 期望 {expected_w}x{expected_h}, 实际 {actual_w}x{actual_h}")]
  ShapeMismatch {
    expected_w: u32,
    expected_h: u32,
    actual_w: u32,
    actual_h: u32,
  },
}

#[derive(Debug, Clone)]
pub struct RgbF32Frame<const W: u32, const H: u32> {
  data: Box<[f32]>,
}

impl<const W: u32, const H: u32> TryFrom<Vec<f32>> for RgbF32Frame<W, H> {
  type Error = FrameError;

  fn try_from(data: Vec<f32>) -> Result<Self, Self::Error> {
    let expected = RGB_CHANNELS * W as usize * H as usize;
    if data.len() != expected {
      return Err(FrameError::LengthMismatch {
        expected,
        actual: data.len(),
      });
    }

    Ok(Self {
      data: data.into_boxed_slice(),
    })
  }
}

impl<const W: u32, const H: u32> TryFrom<&RgbImage> for RgbF32Frame<W, H> {
  type Error = FrameError;

  fn try_from(image: &RgbImage) -> Result<Self, Self::Error> {
    let (width, height) = image.dimensions();
    if width != W || height != H {
      return Err(FrameError::ShapeMismatch {
        expected_w: W,
        expected_h: H,
        actual_w: width,
        actual_h: height,
      });
    }

    // RgbImage 本身就是 HWC 排列，逐字节归一化即可
    let data = image
      .as_raw()
      .iter()
      .map(|&value| value as f32 / 255.0)
      .collect::<Vec<_>>();

    Self::try_from(data)
  }
}

impl<const W: u32, const H: u32> Default for RgbF32Frame<W, H> {
  fn default() -> Self {
    let size = RGB_CHANNELS * (W as usize) * (H as usize);
    let data = vec![0.0f32; size].into_boxed_slice();
    Self { data }
  }
}

impl<const W: u32, const H: u32> RgbF32Frame<W, H> {
  pub fn height(&self) -> usize {
    H as usize
  }

  pub fn width(&self) -> usize {
    W as usize
  }

  pub fn channels(&self) -> usize {
    RGB_CHANNELS
  }

  pub fn pixel_count(&self) -> usize {
    W as usize * H as usize
  }

  /// 用同一颜色填满整帧
  pub fn filled(rgb: [f32; 3]) -> Self {
    Self::from_fn(|_, _| rgb)
  }

  /// 按坐标 (x, y) 逐像素生成帧
  pub fn from_fn(mut f: impl FnMut(u32, u32) -> [f32; 3]) -> Self {
    let mut data = Vec::with_capacity(RGB_CHANNELS * W as usize * H as usize);
    for y in 0..H {
      for x in 0..W {
        data.extend_from_slice(&f(x, y));
      }
    }
    Self {
      data: data.into_boxed_slice(),
    }
  }

  pub fn as_slice(&self) -> &[f32] {
    &self.data
  }

  pub fn pixel(&self, x: usize, y: usize) -> [f32; 3] {
    let idx = (y * W as usize + x) * RGB_CHANNELS;
    [self.data[idx], self.data[idx + 1], self.data[idx + 2]]
  }

  /// 按行优先顺序遍历全部像素
  pub fn pixels(&self) -> impl Iterator<Item = [f32; 3]> + '_ {
    self
      .data
      .chunks_exact(RGB_CHANNELS)
      .map(|px| [px[0], px[1], px[2]])
  }

  /// 灰度强度：每个像素 R、G、B 的均值，行优先
  pub fn to_gray(&self) -> Box<[f32]> {
    self
      .pixels()
      .map(|[r, g, b]| (r + g + b) / 3.0)
      .collect()
  }

  pub fn to_hsv(&self) -> HsvFrame<W, H> {
    let mut data = Vec::with_capacity(self.data.len());
    for px in self.pixels() {
      data.extend_from_slice(&rgb_to_hsv(px));
    }
    HsvFrame {
      data: data.into_boxed_slice(),
    }
  }
}

impl<const W: u32, const H: u32> AsMut<[f32]> for RgbF32Frame<W, H> {
  fn as_mut(&mut self) -> &mut [f32] {
    &mut self.data
  }
}

impl<const W: u32, const H: u32> AsRef<RgbF32Frame<W, H>> for RgbF32Frame<W, H> {
  fn as_ref(&self) -> &RgbF32Frame<W, H> {
    self
  }
}

/// HSV 帧，三个通道都缩放到 [0, 1]
#[derive(Debug, Clone)]
pub struct HsvFrame<const W: u32, const H: u32> {
  data: Box<[f32]>,
}

impl<const W: u32, const H: u32> HsvFrame<W, H> {
  pub fn pixel_count(&self) -> usize {
    W as usize * H as usize
  }

  pub fn pixel(&self, x: usize, y: usize) -> [f32; 3] {
    let idx = (y * W as usize + x) * HSV_CHANNELS;
    [self.data[idx], self.data[idx + 1], self.data[idx + 2]]
  }

  pub fn pixels(&self) -> impl Iterator<Item = [f32; 3]> + '_ {
    self
      .data
      .chunks_exact(HSV_CHANNELS)
      .map(|px| [px[0], px[1], px[2]])
  }
}

/// 六棱锥模型的 RGB -> HSV 转换，输入输出均在 [0, 1]
pub fn rgb_to_hsv([r, g, b]: [f32; 3]) -> [f32; 3] {
  let max = r.max(g).max(b);
  let min = r.min(g).min(b);
  let delta = max - min;

  if max <= 0.0 || delta <= 0.0 {
    return [0.0, 0.0, max];
  }

  let s = delta / max;
  let h = if r == max {
    (g - b) / delta
  } else if g == max {
    2.0 + (b - r) / delta
  } else {
    4.0 + (r - g) / delta
  };

  [(h / 6.0).rem_euclid(1.0), s, max]
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn hsv_of_primary_colors() {
    let [h, s, v] = rgb_to_hsv([1.0, 0.0, 0.0]);
    assert!(h.abs() < 1e-6 && (s - 1.0).abs() < 1e-6 && (v - 1.0).abs() < 1e-6);

    let [h, _, _] = rgb_to_hsv([0.0, 1.0, 0.0]);
    assert!((h - 1.0 / 3.0).abs() < 1e-6);

    let [h, _, _] = rgb_to_hsv([0.0, 0.0, 1.0]);
    assert!((h - 2.0 / 3.0).abs() < 1e-6);

    // 品红的色相落在 (2/3, 1) 区间，不能出现负值
    let [h, _, _] = rgb_to_hsv([1.0, 0.0, 0.5]);
    assert!(h > 2.0 / 3.0 && h < 1.0, "hue = {}", h);
  }

  #[test]
  fn hsv_of_gray_and_black() {
    assert_eq!(rgb_to_hsv([0.0, 0.0, 0.0]), [0.0, 0.0, 0.0]);
    let [h, s, v] = rgb_to_hsv([0.5, 0.5, 0.5]);
    assert_eq!((h, s), (0.0, 0.0));
    assert!((v - 0.5).abs() < 1e-6);
  }

  #[test]
  fn frame_length_is_checked() {
    let result = RgbF32Frame::<2, 2>::try_from(vec![0.0; 11]);
    assert!(matches!(
      result,
      Err(FrameError::LengthMismatch {
        expected: 12,
        actual: 11
      })
    ));
  }

  #[test]
  fn frame_from_rgb_image_normalizes() {
    let image = RgbImage::from_pixel(2, 2, image::Rgb([255, 0, 51]));
    let frame = RgbF32Frame::<2, 2>::try_from(&image).expect("尺寸一致");
    assert_eq!(frame.pixel(1, 1), [1.0, 0.0, 0.2]);

    let wrong = RgbF32Frame::<3, 2>::try_from(&image);
    assert!(matches!(wrong, Err(FrameError::ShapeMismatch { .. })));
  }

  #[test]
  fn gray_is_channel_mean() {
    let frame = RgbF32Frame::<2, 1>::from_fn(|x, _| if x == 0 { [0.3, 0.6, 0.9] } else { [0.0; 3] });
    let gray = frame.to_gray();
    assert!((gray[0] - 0.6).abs() < 1e-6);
    assert_eq!(gray[1], 0.0);
  }
}
