// 该文件是 Lianpu （脸谱） 项目的一部分。
// src/bin/detect_faces.rs - 单张图像人脸检测
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
  FromUrl,
  input::ImageFileInput,
  model::Res10SsdBuilder,
  output::{DEFAULT_CONFIDENCE, OutputWrapper, draw::Draw},
  task::{OneShotTask, Task},
};

/// Lianpu 人脸检测参数配置
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
  /// 输入图像路径
  #[arg(short, long, value_name = "IMAGE")]
  pub image: PathBuf,
  /// Caffe 拓扑文件（deploy.prototxt）路径
  #[arg(short, long, value_name = "PROTOTXT")]
  pub prototxt: PathBuf,
  /// Caffe 预训练权重文件路径
  #[arg(short, long, value_name = "MODEL")]
  pub model: PathBuf,
  /// 置信度阈值 (0.0 - 1.0)，只绘制置信度严格大于该值的检测
  #[arg(short, long, value_name = "THRESHOLD", default_value_t = DEFAULT_CONFIDENCE, value_parser = parse_confidence)]
  pub confidence: f32,
  /// 输出方式
  /// 支持格式:
  /// - 窗口显示: window:Output
  /// - 保存图像: image:///path/to/result.png
  #[arg(short, long, value_name = "OUTPUT", default_value = "window:Output")]
  pub output: Url,
  /// 标签字体文件，默认使用内置的 DejaVu Sans
  #[arg(long, value_name = "FONT")]
  pub font: Option<PathBuf>,
}

fn parse_confidence(s: &str) -> Result<f32, String> {
  let value: f32 = s.parse().map_err(|e| format!("无效的数值: {e}"))?;
  if (0.0..=1.0).contains(&value) {
    Ok(value)
  } else {
    Err(format!("置信度阈值必须在 0.0 到 1.0 之间, 实际为 {value}"))
  }
}

fn run(args: Args) -> Result<()> {
  info!("输入图像: {}", args.image.display());
  info!("拓扑文件: {}", args.prototxt.display());
  info!("权重文件: {}", args.model.display());
  info!("置信度阈值: {}", args.confidence);

  let mut output = OutputWrapper::from_url(&args.output)?.with_confidence(args.confidence);
  if let Some(path) = &args.font {
    output = output.with_draw(Draw::with_font_file(path)?);
  }

  let model = Res10SsdBuilder::new(&args.prototxt, &args.model).build()?;
  let input = ImageFileInput::open(&args.image)?;

  OneShotTask.run_task(input.into_frames(), model, output)
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
