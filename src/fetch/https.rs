// 该文件是 Lianpu （脸谱） 项目的一部分。
// src/fetch/https.rs - 主下载通道（HTTPS）
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

use tempfile::NamedTempFile;
use tracing::debug;
use url::Url;

use super::{FetchError, Transport};

/// 基于 ureq 的 HTTPS 下载，证书使用内置的 webpki 根证书集验证
///
/// 响应体先写入目标目录下的临时文件，写完后再重命名到目标位置。
pub struct HttpsTransport {
  agent: ureq::Agent,
}

impl Default for HttpsTransport {
  fn default() -> Self {
    HttpsTransport {
      agent: ureq::AgentBuilder::new().build(),
    }
  }
}

impl From<ureq::Error> for FetchError {
  fn from(err: ureq::Error) -> Self {
    FetchError::Http(Box::new(err))
  }
}

impl Transport for HttpsTransport {
  fn name(&self) -> &str {
    "https"
  }

  fn fetch(&self, url: &Url, destination: &Path) -> Result<(), FetchError> {
    let response = self.agent.get(url.as_str()).call()?;
    if let Some(length) = response.header("Content-Length") {
      debug!("服务器报告的文件大小: {} 字节", length);
    }

    let dir = match destination.parent() {
      Some(parent) if !parent.as_os_str().is_empty() => parent,
      _ => Path::new("."),
    };
    std::fs::create_dir_all(dir)?;

    let mut temp = NamedTempFile::new_in(dir)?;
    let written = std::io::copy(&mut response.into_reader(), temp.as_file_mut())?;
    temp.as_file().sync_all()?;
    temp.persist(destination).map_err(|e| e.error)?;
    debug!("已写入 {} 字节到 {}", written, destination.display());

    Ok(())
  }
}
