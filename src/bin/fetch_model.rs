// 该文件是 Lianpu （脸谱） 项目的一部分。
// src/bin/fetch_model.rs - 下载人脸检测模型
//
// 本程序遵循 GNU Affero 通用公共许可证（AGPL）许可协议。
// 本程序的发布旨在提供实用价值，但不作任何形式的担保，
// 包括但不限于对适销性或特定用途适用性的默示担保。
// 更多详情请参阅 GNU 通用公共许可证。
//
// Copyright (C) 2026 Johann Li <me@qinka.pro>, ETVP

use std::{path::PathBuf, process::ExitCode};

use anyhow::Result;
use clap::Parser;
use tracing::{error, info};
use url::Url;

use lianpu::{
  artifact::{WEIGHTS_MIN_SIZE, format_size},
  fetch::{CurlTransport, FetchConfig, Fetcher, HttpsTransport, WEIGHTS_FILE, WEIGHTS_URL},
};

/// 下载 Res10 SSD 人脸检测模型
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
  /// 权重文件下载地址
  #[arg(long, value_name = "URL", default_value = WEIGHTS_URL)]
  pub url: Url,
  /// 权重文件保存路径（已存在时会被覆盖）
  #[arg(long, value_name = "FILE", default_value = WEIGHTS_FILE)]
  pub output: PathBuf,
  /// 下载结果的最小字节数，低于此值视为下载失败
  #[arg(long, value_name = "BYTES", default_value_t = WEIGHTS_MIN_SIZE)]
  pub min_size: u64,
  /// 备用下载程序
  #[arg(long, value_name = "PROGRAM", default_value = "curl")]
  pub curl: String,
  /// 同时下载拓扑文件 deploy.prototxt
  #[arg(long)]
  pub with_topology: bool,
}

fn run(args: Args) -> Result<()> {
  let mut configs = vec![FetchConfig {
    url: args.url,
    destination: args.output,
    min_size: args.min_size,
  }];
  if args.with_topology {
    configs.push(FetchConfig::topology());
  }

  for config in configs {
    let fetcher = Fetcher::new(
      config,
      HttpsTransport::default(),
      CurlTransport::with_program(&args.curl),
    );
    let artifact = fetcher.ensure_model_available()?;
    info!(
      "模型文件就绪: {} ({} 字节)",
      artifact.path().display(),
      format_size(artifact.size())
    );
  }

  Ok(())
}

fn main() -> ExitCode {
  tracing_subscriber::fmt::init();

  let args = Args::parse();
  match run(args) {
    Ok(()) => ExitCode::SUCCESS,
    Err(e) => {
      error!("{:#}", e);
      ExitCode::FAILURE
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn defaults_match_res10_weights() {
    let args = Args::try_parse_from(["fetch-model"]).unwrap();
    assert_eq!(args.url.as_str(), WEIGHTS_URL);
    assert_eq!(args.output, PathBuf::from(WEIGHTS_FILE));
    assert_eq!(args.min_size, 10_000_000);
    assert_eq!(args.curl, "curl");
    assert!(!args.with_topology);
  }

  #[test]
  fn invalid_url_is_rejected() {
    assert!(Args::try_parse_from(["fetch-model", "--url", "not a url"]).is_err());
  }
}
