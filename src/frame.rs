// 该文件是 Lianpu （脸谱） 项目的一部分。
// src/frame.rs - 模型输入张量定义
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

use image::{RgbImage, imageops::FilterType};

const BGR_CHANNELS: usize = 3;

/// Res10 SSD 训练时使用的 BGR 通道均值
pub const RES10_MEAN_BGR: [f32; 3] = [104.0, 177.0, 123.0];

pub trait AsNchwBlob {
  /// NCHW 维度，批大小固定为 1
  fn shape(&self) -> [i32; 4];
  fn as_nchw(&self) -> &[f32];
}

/// 缩放到 W×H、减去通道均值后的 BGR 浮点张量（NCHW）
#[derive(Debug, Clone)]
pub struct BgrBlob<const W: u32, const H: u32> {
  data: Box<[f32]>,
}

impl<const W: u32, const H: u32> BgrBlob<W, H> {
  pub fn from_image(image: &RgbImage, mean_bgr: [f32; 3]) -> Self {
    let resized = if image.dimensions() == (W, H) {
      image.clone()
    } else {
      image::imageops::resize(image, W, H, FilterType::Triangle)
    };

    let plane = (W * H) as usize;
    let mut data = vec![0f32; BGR_CHANNELS * plane];
    for (x, y, pixel) in resized.enumerate_pixels() {
      let idx = (y * W + x) as usize;
      // RGB -> BGR
      for c in 0..BGR_CHANNELS {
        let value = pixel[BGR_CHANNELS - 1 - c] as f32;
        data[c * plane + idx] = value - mean_bgr[c];
      }
    }

    Self {
      data: data.into_boxed_slice(),
    }
  }

  pub fn height(&self) -> usize {
    H as usize
  }

  pub fn width(&self) -> usize {
    W as usize
  }

  pub fn channels(&self) -> usize {
    BGR_CHANNELS
  }
}

impl<const W: u32, const H: u32> From<&RgbImage> for BgrBlob<W, H> {
  fn from(image: &RgbImage) -> Self {
    Self::from_image(image, RES10_MEAN_BGR)
  }
}

impl<const W: u32, const H: u32> AsNchwBlob for BgrBlob<W, H> {
  fn shape(&self) -> [i32; 4] {
    [1, BGR_CHANNELS as i32, H as i32, W as i32]
  }

  fn as_nchw(&self) -> &[f32] {
    &self.data
  }
}
