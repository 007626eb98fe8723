// 该文件是 Lianpu （脸谱） 项目的一部分。
// src/artifact.rs - 模型文件检查
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
use tracing::debug;

/// 下载得到的权重文件最小尺寸（约 10MB）
pub const WEIGHTS_MIN_SIZE: u64 = 10_000_000;
/// 拓扑文件最小尺寸
pub const TOPOLOGY_MIN_SIZE: u64 = 1_000;
/// 加载模型前对权重文件的最低要求
pub const WEIGHTS_LOAD_MIN_SIZE: u64 = 1_000;

#[derive(Error, Debug)]
pub enum ArtifactError {
  #[error("文件不存在: {0}")]
  FileNotFound(PathBuf),
  #[error("文件过小: {path} ({size} 字节, 至少需要 {min_size} 字节)")]
  TooSmall {
    path: PathBuf,
    size: u64,
    min_size: u64,
  },
  #[error("I/O 错误: {0}")]
  Io(#[from] std::io::Error),
}

/// 本地磁盘上的模型文件
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelArtifact {
  path: PathBuf,
  size: u64,
}

impl ModelArtifact {
  /// 读取文件元数据，文件不存在时返回 `FileNotFound`
  pub fn inspect(path: impl AsRef<Path>) -> Result<Self, ArtifactError> {
    let path = path.as_ref();
    let metadata = match std::fs::metadata(path) {
      Ok(metadata) => metadata,
      Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
        return Err(ArtifactError::FileNotFound(path.to_path_buf()));
      }
      Err(e) => return Err(e.into()),
    };
    if !metadata.is_file() {
      return Err(ArtifactError::FileNotFound(path.to_path_buf()));
    }

    debug!("文件 {} 大小: {} 字节", path.display(), metadata.len());
    Ok(ModelArtifact {
      path: path.to_path_buf(),
      size: metadata.len(),
    })
  }

  pub fn ensure_min_size(self, min_size: u64) -> Result<Self, ArtifactError> {
    if self.size < min_size {
      return Err(ArtifactError::TooSmall {
        path: self.path,
        size: self.size,
        min_size,
      });
    }
    Ok(self)
  }

  pub fn path(&self) -> &Path {
    &self.path
  }

  pub fn size(&self) -> u64 {
    self.size
  }
}

/// 加载模型前检查拓扑文件与权重文件
///
/// 只检查存在性与权重文件的大小，不做完整性校验。
pub fn verify_model_files(
  topology: impl AsRef<Path>,
  weights: impl AsRef<Path>,
) -> Result<(ModelArtifact, ModelArtifact), ArtifactError> {
  let topology = ModelArtifact::inspect(topology)?;
  let weights = ModelArtifact::inspect(weights)?.ensure_min_size(WEIGHTS_LOAD_MIN_SIZE)?;
  Ok((topology, weights))
}

/// 以千分位格式化字节数，如 `10,666,211`
pub fn format_size(size: u64) -> String {
  let digits = size.to_string();
  let mut out = String::with_capacity(digits.len() + digits.len() / 3);
  for (i, ch) in digits.chars().enumerate() {
    if i > 0 && (digits.len() - i) % 3 == 0 {
      out.push(',');
    }
    out.push(ch);
  }
  out
}
