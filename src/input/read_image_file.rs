// 该文件是 Lianpu （脸谱） 项目的一部分。
// src/input/read_image_file.rs - 图像文件输入
//
// 本程序遵循 GNU Affero 通用公共许可证（AGPL）许可协议。
// 本程序的发布旨在提供实用价值，但不作任何形式的担保，
// 包括但不限于对适销性或特定用途适用性的默示担保。
// 更多详情请参阅 GNU 通用公共许可证。
//
// Copyright (C) 2026 Johann Li <me@qinka.pro>, ETVP

use std::path::{Path, PathBuf};

use image::{ImageReader, RgbImage};
use thiserror::Error;
use tracing::{error, info};

#[derive(Error, Debug)]
pub enum ImageFileInputError {
  #[error("无法读取图像文件 {path}: {source}")]
  IoError {
    path: PathBuf,
    source: std::io::Error,
  },
  #[error("无法加载图像 {path}: {source}")]
  ImageLoadError {
    path: PathBuf,
    source: image::ImageError,
  },
}

/// 单张图像输入，只产出一帧
pub struct ImageFileInput {
  image: Option<RgbImage>,
}

impl ImageFileInput {
  pub fn open(path: impl AsRef<Path>) -> Result<Self, ImageFileInputError> {
    let path = path.as_ref();
    let io_error = |source| ImageFileInputError::IoError {
      path: path.to_path_buf(),
      source,
    };

    let image = ImageReader::open(path)
      .map_err(io_error)?
      .with_guessed_format()
      .map_err(io_error)?
      .decode()
      .map_err(|source| {
        error!("图像解码失败: {}", path.display());
        ImageFileInputError::ImageLoadError {
          path: path.to_path_buf(),
          source,
        }
      })?;

    info!(
      "已加载图像 {}: {}x{}",
      path.display(),
      image.width(),
      image.height()
    );
    Ok(ImageFileInput {
      image: Some(image.into_rgb8()),
    })
  }

  pub fn into_frames(self) -> ImageFileFrames {
    ImageFileFrames { inner: self }
  }
}

pub struct ImageFileFrames {
  inner: ImageFileInput,
}

impl Iterator for ImageFileFrames {
  type Item = RgbImage;

  fn next(&mut self) -> Option<Self::Item> {
    self.inner.image.take()
  }
}

#[cfg(test)]
mod tests {
  use image::Rgb;

  use super::*;

  #[test]
  fn png_yields_exactly_one_frame() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("face.png");
    RgbImage::from_pixel(8, 6, Rgb([10, 20, 30]))
      .save(&path)
      .unwrap();

    let mut frames = ImageFileInput::open(&path).unwrap().into_frames();
    let frame = frames.next().unwrap();
    assert_eq!(frame.dimensions(), (8, 6));
    assert_eq!(frame.get_pixel(0, 0), &Rgb([10, 20, 30]));
    assert!(frames.next().is_none());
  }

  #[test]
  fn missing_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = ImageFileInput::open(dir.path().join("missing.jpg")).err().unwrap();
    assert!(matches!(err, ImageFileInputError::IoError { .. }));
  }

  #[test]
  fn garbage_is_image_load_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("not-an-image.jpg");
    std::fs::write(&path, b"definitely not a jpeg").unwrap();

    let err = ImageFileInput::open(&path).err().unwrap();
    assert!(matches!(err, ImageFileInputError::ImageLoadError { .. }));
  }
}
