// 该文件是 Lianpu （脸谱） 项目的一部分。
// src/output/window.rs - 窗口显示输出
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

use std::io::Cursor;

use image::{ImageFormat, RgbImage};
use opencv::{core::Vector, highgui, imgcodecs};
use thiserror::Error;
use tracing::info;
use url::Url;

use crate::{
  FromUrl, FromUrlWithScheme,
  model::DetectionTensor,
  output::{DEFAULT_CONFIDENCE, Render, draw::Draw},
};

const DEFAULT_WINDOW_NAME: &str = "Output";

/// 在 OpenCV 窗口中显示结果，按任意键关闭
pub struct WindowOutput {
  name: String,
  draw: Draw,
  confidence: f32,
}

#[derive(Error, Debug)]
pub enum WindowOutputError {
  #[error("图像编码错误: {0}")]
  EncodeError(image::ImageError),
  #[error("OpenCV 错误: {0}")]
  OpenCvError(#[from] opencv::Error),
  #[error("URI 方案不匹配: {0}")]
  SchemeMismatch(String),
}

impl FromUrlWithScheme for WindowOutput {
  const SCHEME: &'static str = "window";
}

impl FromUrl for WindowOutput {
  type Error = WindowOutputError;

  fn from_url(uri: &Url) -> Result<Self, Self::Error> {
    if uri.scheme() != Self::SCHEME {
      return Err(WindowOutputError::SchemeMismatch(format!(
        "期望输出方式 '{}', 实际输出方式 '{}'",
        Self::SCHEME,
        uri.scheme()
      )));
    }

    let name = match uri.path().trim_matches('/') {
      "" => DEFAULT_WINDOW_NAME.to_string(),
      name => name.to_string(),
    };
    Ok(WindowOutput {
      name,
      draw: Draw::default(),
      confidence: DEFAULT_CONFIDENCE,
    })
  }
}

impl WindowOutput {
  pub fn with_draw(mut self, draw: Draw) -> Self {
    self.draw = draw;
    self
  }

  pub fn with_confidence(mut self, confidence: f32) -> Self {
    self.confidence = confidence;
    self
  }

  fn show(&self, image: &RgbImage) -> Result<(), WindowOutputError> {
    // 经 PNG 转为 OpenCV 的 BGR Mat
    let mut encoded = Vec::new();
    image
      .write_to(&mut Cursor::new(&mut encoded), ImageFormat::Png)
      .map_err(WindowOutputError::EncodeError)?;
    let mat = imgcodecs::imdecode(&Vector::from_slice(&encoded), imgcodecs::IMREAD_COLOR)?;

    info!("显示结果窗口 '{}', 按任意键退出", self.name);
    highgui::imshow(&self.name, &mat)?;
    highgui::wait_key(0)?;
    highgui::destroy_all_windows()?;
    Ok(())
  }
}

impl Render<RgbImage, DetectionTensor> for WindowOutput {
  type Error = WindowOutputError;

  fn render_result(&self, frame: &RgbImage, result: &DetectionTensor) -> Result<(), Self::Error> {
    let mut image = frame.clone();
    self
      .draw
      .render_detections(&mut image, result, self.confidence);
    self.show(&image)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn window_name_comes_from_url() {
    let output = WindowOutput::from_url(&Url::parse("window:Faces").unwrap()).unwrap();
    assert_eq!(output.name, "Faces");

    let output = WindowOutput::from_url(&Url::parse("window:").unwrap()).unwrap();
    assert_eq!(output.name, DEFAULT_WINDOW_NAME);
  }
}
