// 该文件是 Lianpu （脸谱） 项目的一部分。
// src/output/save_image_file.rs - 保存图像文件
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

use std::path::Path;

use image::RgbImage;
use thiserror::Error;
use tracing::info;
use url::Url;

use crate::{
  FromUrl, FromUrlWithScheme,
  model::DetectionTensor,
  output::{DEFAULT_CONFIDENCE, Render, draw::Draw},
};

pub struct SaveImageFileOutput {
  path: String,
  draw: Draw,
  confidence: f32,
}

#[derive(Error, Debug)]
pub enum SaveImageFileError {
  #[error("I/O 错误: {0}")]
  IoError(std::io::Error),
  #[error("图像错误: {0}")]
  ImageError(image::ImageError),
  #[error("URI 方案不匹配: {0}")]
  SchemeMismatch(String),
}

impl FromUrlWithScheme for SaveImageFileOutput {
  const SCHEME: &'static str = "image";
}

impl FromUrl for SaveImageFileOutput {
  type Error = SaveImageFileError;

  fn from_url(uri: &Url) -> Result<Self, Self::Error> {
    if uri.scheme() != Self::SCHEME {
      return Err(SaveImageFileError::SchemeMismatch(format!(
        "期望保存方式 '{}', 实际保存方式 '{}'",
        Self::SCHEME,
        uri.scheme()
      )));
    }

    Ok(SaveImageFileOutput {
      path: uri.path().to_string(),
      draw: Draw::default(),
      confidence: DEFAULT_CONFIDENCE,
    })
  }
}

impl SaveImageFileOutput {
  pub fn with_draw(mut self, draw: Draw) -> Self {
    self.draw = draw;
    self
  }

  pub fn with_confidence(mut self, confidence: f32) -> Self {
    self.confidence = confidence;
    self
  }

  fn save_image(&self, image: &RgbImage) -> Result<(), SaveImageFileError> {
    if let Some(parent) = Path::new(&self.path).parent()
      && !parent.as_os_str().is_empty()
    {
      std::fs::create_dir_all(parent).map_err(SaveImageFileError::IoError)?;
    }

    image
      .save(&self.path)
      .map_err(SaveImageFileError::ImageError)?;

    info!("保存图像到文件: {}", self.path);

    Ok(())
  }
}

impl Render<RgbImage, DetectionTensor> for SaveImageFileOutput {
  type Error = SaveImageFileError;

  fn render_result(&self, frame: &RgbImage, result: &DetectionTensor) -> Result<(), Self::Error> {
    let mut image = frame.clone();
    self
      .draw
      .render_detections(&mut image, result, self.confidence);
    self.save_image(&image)
  }
}

#[cfg(test)]
mod tests {
  use image::Rgb;

  use super::*;
  use crate::model::DetectionRecord;

  #[test]
  fn annotated_copy_is_written_to_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("out.png");
    let url = Url::parse(&format!("image://{}", path.display())).unwrap();

    let output = SaveImageFileOutput::from_url(&url)
      .unwrap()
      .with_confidence(0.6);
    let frame = RgbImage::new(100, 100);
    let tensor = DetectionTensor::from(vec![
      DetectionRecord {
        image_id: 0.0,
        label: 1.0,
        confidence: 0.9,
        bbox: [0.1, 0.1, 0.5, 0.5],
      },
      DetectionRecord {
        image_id: 0.0,
        label: 1.0,
        confidence: 0.6,
        bbox: [0.6, 0.6, 0.9, 0.9],
      },
    ]);

    output.render_result(&frame, &tensor).unwrap();

    let saved = image::open(&path).unwrap().into_rgb8();
    assert_eq!(saved.get_pixel(10, 10), &Rgb([255, 0, 0]));
    assert_eq!(saved.get_pixel(60, 60), &Rgb([0, 0, 0]));
    // 靠近顶部的标签画在框内
    let label_pixels = (12..48)
      .flat_map(|x| (12..22).map(move |y| (x, y)))
      .filter(|&(x, y)| saved.get_pixel(x, y)[0] > 0)
      .count();
    assert!(label_pixels > 0);
    // 原图不被修改
    assert_eq!(frame.get_pixel(10, 10), &Rgb([0, 0, 0]));
  }

  #[test]
  fn wrong_scheme_is_rejected() {
    let url = Url::parse("window:Output").unwrap();
    assert!(matches!(
      SaveImageFileOutput::from_url(&url),
      Err(SaveImageFileError::SchemeMismatch(_))
    ));
  }
}
