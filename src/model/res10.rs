// 该文件是 Lianpu （脸谱） 项目的一部分。
// src/model/res10.rs - Res10 SSD 人脸检测模型（OpenCV DNN）
//
// 本程序遵循 GNU Affero 通用公共许可证（AGPL）许可协议。
// 本程序的发布旨在提供实用价值，但不作任何形式的担保，
// 包括但不限于对适销性或特定用途适用性的默示担保。
// 更多详情请参阅 GNU 通用公共许可证。
//
// Copyright (C) 2026 Johann Li <me@qinka.pro>, ETVP

use std::{cell::RefCell, path::PathBuf};

use image::RgbImage;
use opencv::{
  core::{CV_32F, Mat, Scalar},
  dnn::{self, Net},
  prelude::*,
};
use thiserror::Error;
use tracing::{debug, error, info};

use crate::{
  artifact::{ArtifactError, format_size, verify_model_files},
  frame::{AsNchwBlob, BgrBlob},
  model::{DetectionTensor, MalformedOutput, Model},
};

const RES10_INPUT_W: u32 = 300;
const RES10_INPUT_H: u32 = 300;
/// 权重文件截断时 OpenCV 报错信息中的特征
const BATCH_NORM_SIGNATURE: &str = "BatchNormLayerImpl";

pub type Res10Blob = BgrBlob<RES10_INPUT_W, RES10_INPUT_H>;

#[derive(Error, Debug)]
pub enum Res10Error {
  #[error("模型文件检查失败: {0}")]
  Artifact(#[from] ArtifactError),
  #[error("模型加载错误: {0}")]
  ModelLoadError(opencv::Error),
  #[error("权重文件可能已损坏或下载不完整: {0}")]
  TruncatedWeights(opencv::Error),
  #[error("推理错误: {0}")]
  InferenceError(opencv::Error),
  #[error("输出解析错误: {0}")]
  MalformedOutput(#[from] MalformedOutput),
}

impl Res10Error {
  fn load(err: opencv::Error) -> Self {
    if err.message.contains(BATCH_NORM_SIGNATURE) {
      error!("BatchNorm 层错误, 这通常意味着模型文件已损坏或不完整");
      error!("请确认使用了正确的模型文件, 并且已完整下载");
      Res10Error::TruncatedWeights(err)
    } else {
      Res10Error::ModelLoadError(err)
    }
  }
}

pub struct Res10Ssd {
  net: RefCell<Net>,
}

pub struct Res10SsdBuilder {
  topology: PathBuf,
  weights: PathBuf,
}

impl Res10SsdBuilder {
  pub fn new(topology: impl Into<PathBuf>, weights: impl Into<PathBuf>) -> Self {
    Res10SsdBuilder {
      topology: topology.into(),
      weights: weights.into(),
    }
  }

  pub fn build(self) -> Result<Res10Ssd, Res10Error> {
    let (topology, weights) = verify_model_files(&self.topology, &self.weights)?;
    debug!("权重文件大小: {} 字节", format_size(weights.size()));

    info!("加载模型: {}", weights.path().display());
    let mut net = dnn::read_net_from_caffe(
      &topology.path().to_string_lossy(),
      &weights.path().to_string_lossy(),
    )
    .map_err(Res10Error::load)?;

    net
      .set_preferable_backend(dnn::DNN_BACKEND_DEFAULT)
      .map_err(Res10Error::ModelLoadError)?;
    net
      .set_preferable_target(dnn::DNN_TARGET_CPU)
      .map_err(Res10Error::ModelLoadError)?;
    info!("模型加载完成");

    Ok(Res10Ssd {
      net: RefCell::new(net),
    })
  }
}

impl Res10Ssd {
  fn forward(&self, blob: &Res10Blob) -> Result<Vec<f32>, opencv::Error> {
    let mut input = Mat::new_nd_with_default(&blob.shape(), CV_32F, Scalar::all(0.0))?;
    input.data_typed_mut::<f32>()?.copy_from_slice(blob.as_nchw());

    let mut net = self.net.borrow_mut();
    net.set_input(&input, "", 1.0, Scalar::default())?;
    let output = net.forward_single("")?;
    debug!("模型输出: {} 维, {} 个元素", output.dims(), output.total());

    Ok(output.data_typed::<f32>()?.to_vec())
  }
}

impl Model for Res10Ssd {
  type Input = RgbImage;
  type Output = DetectionTensor;
  type Error = Res10Error;

  fn infer(&self, input: &Self::Input) -> Result<Self::Output, Self::Error> {
    debug!("准备 {}x{} 输入张量", RES10_INPUT_W, RES10_INPUT_H);
    let blob = Res10Blob::from(input);

    info!("正在检测人脸...");
    let raw = self.forward(&blob).map_err(|e| {
      error!("检测失败: {}", e);
      Res10Error::InferenceError(e)
    })?;

    Self::postprocess(&raw)
  }

  fn postprocess(output: &[f32]) -> Result<Self::Output, Self::Error> {
    let tensor = DetectionTensor::from_raw(output)?;
    debug!("候选检测数: {}", tensor.len());
    Ok(tensor)
  }
}
