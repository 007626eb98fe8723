// 该文件是 Lianpu （脸谱） 项目的一部分。
// src/fetch/curl.rs - 备用下载通道（外部 curl 进程）
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

use std::{path::Path, process::Command};

use tracing::{debug, warn};
use url::Url;

use super::{FetchError, Transport};

const DEFAULT_PROGRAM: &str = "curl";

/// 调用外部 `curl -L <url> -o <destination>` 下载
///
/// curl 的退出状态只记录日志，下载结果由调用方按文件大小判断。
#[derive(Debug, Clone)]
pub struct CurlTransport {
  program: String,
}

impl Default for CurlTransport {
  fn default() -> Self {
    CurlTransport {
      program: DEFAULT_PROGRAM.to_string(),
    }
  }
}

impl CurlTransport {
  pub fn with_program(program: impl Into<String>) -> Self {
    CurlTransport {
      program: program.into(),
    }
  }
}

impl Transport for CurlTransport {
  fn name(&self) -> &str {
    &self.program
  }

  fn fetch(&self, url: &Url, destination: &Path) -> Result<(), FetchError> {
    debug!("执行: {} -L {} -o {}", self.program, url, destination.display());
    let status = Command::new(&self.program)
      .arg("-L")
      .arg(url.as_str())
      .arg("-o")
      .arg(destination)
      .status()
      .map_err(|source| FetchError::CurlSpawn {
        program: self.program.clone(),
        source,
      })?;

    if !status.success() {
      warn!("{} 退出状态异常: {}", self.program, status);
    }
    Ok(())
  }
}
