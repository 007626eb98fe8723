// 该文件是 Lianpu （脸谱） 项目的一部分。
// src/output.rs - 输出定义
//
// 本程序遵循 GNU Affero 通用公共许可证（AGPL）许可协议。
// 本程序的发布旨在提供实用价值，但不作任何形式的担保，
// 包括但不限于对适销性或特定用途适用性的默示担保。
// 更多详情请参阅 GNU 通用公共许可证。
//
// Copyright (C) 2026 Johann Li <me@qinka.pro>, ETVP

use image::RgbImage;
use thiserror::Error;
use url::Url;

use crate::{FromUrl, FromUrlWithScheme, model::DetectionTensor};

pub trait Render<Frame, Output>: Sized {
  type Error;
  fn render_result(&self, frame: &Frame, result: &Output) -> Result<(), Self::Error>;
}

pub mod draw;

mod save_image_file;
pub use self::save_image_file::{SaveImageFileError, SaveImageFileOutput};

#[cfg(feature = "display_window")]
mod window;
#[cfg(feature = "display_window")]
pub use self::window::{WindowOutput, WindowOutputError};

/// 默认置信度阈值
pub const DEFAULT_CONFIDENCE: f32 = 0.5;

#[derive(Error, Debug)]
pub enum OutputError {
  #[error("保存图像文件错误: {0}")]
  SaveImageFileError(#[from] SaveImageFileError),
  #[cfg(feature = "display_window")]
  #[error("窗口显示错误: {0}")]
  WindowOutputError(#[from] WindowOutputError),
  #[error("URI 方案不匹配: {0}")]
  SchemeMismatch(String),
}

pub enum OutputWrapper {
  SaveImageFileOutput(SaveImageFileOutput),
  #[cfg(feature = "display_window")]
  WindowOutput(WindowOutput),
}

impl FromUrl for OutputWrapper {
  type Error = OutputError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    match url.scheme() {
      SaveImageFileOutput::SCHEME => {
        let output = SaveImageFileOutput::from_url(url)?;
        Ok(OutputWrapper::SaveImageFileOutput(output))
      }
      #[cfg(feature = "display_window")]
      WindowOutput::SCHEME => {
        let output = WindowOutput::from_url(url)?;
        Ok(OutputWrapper::WindowOutput(output))
      }
      other => Err(OutputError::SchemeMismatch(other.to_string())),
    }
  }
}

impl OutputWrapper {
  pub fn with_draw(self, draw: draw::Draw) -> Self {
    match self {
      OutputWrapper::SaveImageFileOutput(output) => {
        OutputWrapper::SaveImageFileOutput(output.with_draw(draw))
      }
      #[cfg(feature = "display_window")]
      OutputWrapper::WindowOutput(output) => OutputWrapper::WindowOutput(output.with_draw(draw)),
    }
  }

  pub fn with_confidence(self, confidence: f32) -> Self {
    match self {
      OutputWrapper::SaveImageFileOutput(output) => {
        OutputWrapper::SaveImageFileOutput(output.with_confidence(confidence))
      }
      #[cfg(feature = "display_window")]
      OutputWrapper::WindowOutput(output) => {
        OutputWrapper::WindowOutput(output.with_confidence(confidence))
      }
    }
  }
}

impl Render<RgbImage, DetectionTensor> for OutputWrapper {
  type Error = OutputError;

  fn render_result(&self, frame: &RgbImage, result: &DetectionTensor) -> Result<(), Self::Error> {
    match self {
      OutputWrapper::SaveImageFileOutput(output) => output
        .render_result(frame, result)
        .map_err(OutputError::from),
      #[cfg(feature = "display_window")]
      OutputWrapper::WindowOutput(output) => output
        .render_result(frame, result)
        .map_err(OutputError::from),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn unknown_scheme_is_rejected() {
    let url = Url::parse("rtsp://camera.local/stream").unwrap();
    match OutputWrapper::from_url(&url) {
      Err(OutputError::SchemeMismatch(scheme)) => assert_eq!(scheme, "rtsp"),
      _ => panic!("rtsp output should not be accepted"),
    }
  }

  #[test]
  fn image_scheme_selects_file_output() {
    let url = Url::parse("image:///tmp/lianpu/out.png").unwrap();
    assert!(matches!(
      OutputWrapper::from_url(&url),
      Ok(OutputWrapper::SaveImageFileOutput(_))
    ));
  }
}
