// 该文件是 Lianpu （脸谱） 项目的一部分。
// src/fetch.rs - 模型文件下载
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

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{error, info, warn};
use url::Url;

use crate::artifact::{
  ArtifactError, ModelArtifact, TOPOLOGY_MIN_SIZE, WEIGHTS_MIN_SIZE, format_size,
};

mod curl;
pub use self::curl::CurlTransport;

#[cfg(feature = "fetch_https")]
mod https;
#[cfg(feature = "fetch_https")]
pub use self::https::HttpsTransport;

pub const WEIGHTS_URL: &str = "https://raw.githubusercontent.com/opencv/opencv_3rdparty/dnn_samples_face_detector_20170830/res10_300x300_ssd_iter_140000.caffemodel";
pub const WEIGHTS_FILE: &str = "res10_300x300_ssd_iter_140000.caffemodel";
pub const TOPOLOGY_URL: &str =
  "https://raw.githubusercontent.com/opencv/opencv/master/samples/dnn/face_detector/deploy.prototxt";
pub const TOPOLOGY_FILE: &str = "deploy.prototxt";

#[derive(Error, Debug)]
pub enum FetchError {
  #[error("I/O 错误: {0}")]
  Io(#[from] std::io::Error),
  #[cfg(feature = "fetch_https")]
  #[error("HTTP 请求失败: {0}")]
  Http(Box<ureq::Error>),
  #[error("无法启动下载程序 {program}: {source}")]
  CurlSpawn {
    program: String,
    source: std::io::Error,
  },
  #[error("下载的文件过小: {path} ({size} 字节, 至少需要 {min_size} 字节)")]
  DownloadTooSmall {
    path: PathBuf,
    size: u64,
    min_size: u64,
  },
  #[error("下载后的文件检查失败: {0}")]
  Artifact(ArtifactError),
  #[error("下载失败 (主通道: {primary}; 备用通道: {fallback})")]
  DownloadFailed {
    primary: Box<FetchError>,
    fallback: Box<FetchError>,
  },
}

impl From<ArtifactError> for FetchError {
  fn from(err: ArtifactError) -> Self {
    match err {
      ArtifactError::TooSmall {
        path,
        size,
        min_size,
      } => FetchError::DownloadTooSmall {
        path,
        size,
        min_size,
      },
      other => FetchError::Artifact(other),
    }
  }
}

/// 下载通道
pub trait Transport {
  fn name(&self) -> &str;
  fn fetch(&self, url: &Url, destination: &Path) -> Result<(), FetchError>;
}

#[derive(Debug, Clone)]
pub struct FetchConfig {
  pub url: Url,
  pub destination: PathBuf,
  pub min_size: u64,
}

impl FetchConfig {
  /// Res10 SSD 权重文件
  pub fn weights() -> Self {
    FetchConfig {
      url: Url::parse(WEIGHTS_URL).expect("内置权重下载地址无效"),
      destination: PathBuf::from(WEIGHTS_FILE),
      min_size: WEIGHTS_MIN_SIZE,
    }
  }

  /// Res10 SSD 拓扑文件
  pub fn topology() -> Self {
    FetchConfig {
      url: Url::parse(TOPOLOGY_URL).expect("内置拓扑下载地址无效"),
      destination: PathBuf::from(TOPOLOGY_FILE),
      min_size: TOPOLOGY_MIN_SIZE,
    }
  }
}

impl Default for FetchConfig {
  fn default() -> Self {
    Self::weights()
  }
}

pub struct Fetcher<P, F> {
  config: FetchConfig,
  primary: P,
  fallback: F,
}

impl<P: Transport, F: Transport> Fetcher<P, F> {
  pub fn new(config: FetchConfig, primary: P, fallback: F) -> Self {
    Fetcher {
      config,
      primary,
      fallback,
    }
  }

  /// 重新下载模型文件，主通道失败时使用备用通道重试一次
  ///
  /// 目标位置已有的文件会先被删除。两个通道都失败时，目标文件的状态不确定
  /// （可能不存在、不完整或为备用通道留下的内容）。
  pub fn ensure_model_available(&self) -> Result<ModelArtifact, FetchError> {
    info!(
      "正在下载模型文件: {} -> {}",
      self.config.url,
      self.config.destination.display()
    );

    let primary = self
      .remove_stale()
      .and_then(|()| self.fetch_with(&self.primary));
    let primary = match primary {
      Ok(artifact) => {
        info!("模型下载成功");
        return Ok(artifact);
      }
      Err(e) => e,
    };
    error!("下载失败 ({}): {}", self.primary.name(), primary);

    info!("尝试备用下载方式 ({})...", self.fallback.name());
    match self.fetch_with(&self.fallback) {
      Ok(artifact) => {
        info!("模型下载成功 ({})", self.fallback.name());
        Ok(artifact)
      }
      Err(fallback) => {
        error!("备用下载方式也失败了: {}", fallback);
        Err(FetchError::DownloadFailed {
          primary: Box::new(primary),
          fallback: Box::new(fallback),
        })
      }
    }
  }

  fn remove_stale(&self) -> Result<(), FetchError> {
    let destination = &self.config.destination;
    if destination.exists() {
      warn!("删除已存在的文件: {}", destination.display());
      std::fs::remove_file(destination)?;
    }
    Ok(())
  }

  fn fetch_with<T: Transport>(&self, transport: &T) -> Result<ModelArtifact, FetchError> {
    transport.fetch(&self.config.url, &self.config.destination)?;
    self.validate()
  }

  fn validate(&self) -> Result<ModelArtifact, FetchError> {
    let artifact = ModelArtifact::inspect(&self.config.destination)?;
    info!("下载的模型大小: {} 字节", format_size(artifact.size()));
    Ok(artifact.ensure_min_size(self.config.min_size)?)
  }
}
