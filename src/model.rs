// 该文件是 Lianpu （脸谱） 项目的一部分。
// src/model.rs - 模型
//
// 本程序遵循 GNU Affero 通用公共许可证（AGPL）许可协议。
// 本程序的发布旨在提供实用价值，但不作任何形式的担保，
// 包括但不限于对适销性或特定用途适用性的默示担保。
// 更多详情请参阅 GNU 通用公共许可证。
//
// Copyright (C) 2026 Johann Li <me@qinka.pro>, ETVP

use thiserror::Error;

pub trait Model {
  type Input;
  type Output;
  type Error;

  fn infer(&self, input: &Self::Input) -> Result<Self::Output, Self::Error>;
  fn postprocess(output: &[f32]) -> Result<Self::Output, Self::Error>;
}

/// 每条检测记录的字段数：[image_id, label, confidence, xmin, ymin, xmax, ymax]
pub const DETECTION_FIELDS: usize = 7;

#[derive(Error, Debug, PartialEq, Eq)]
#[error("检测输出长度 {len} 不是 {} 的整数倍", DETECTION_FIELDS)]
pub struct MalformedOutput {
  pub len: usize,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DetectionRecord {
  pub image_id: f32,
  pub label: f32,
  pub confidence: f32,
  pub bbox: [f32; 4], // 归一化 [x_min, y_min, x_max, y_max]
}

impl DetectionRecord {
  fn from_fields(fields: &[f32]) -> Self {
    DetectionRecord {
      image_id: fields[0],
      label: fields[1],
      confidence: fields[2],
      bbox: [fields[3], fields[4], fields[5], fields[6]],
    }
  }
}

/// `[1, 1, N, 7]` 检测输出，解码为 N 条记录
#[derive(Debug, Clone, Default)]
pub struct DetectionTensor {
  pub records: Box<[DetectionRecord]>,
}

impl DetectionTensor {
  pub fn from_raw(raw: &[f32]) -> Result<Self, MalformedOutput> {
    if raw.len() % DETECTION_FIELDS != 0 {
      return Err(MalformedOutput { len: raw.len() });
    }

    let records = raw
      .chunks_exact(DETECTION_FIELDS)
      .map(DetectionRecord::from_fields)
      .collect();
    Ok(DetectionTensor { records })
  }

  pub fn len(&self) -> usize {
    self.records.len()
  }

  pub fn is_empty(&self) -> bool {
    self.records.is_empty()
  }

  pub fn iter(&self) -> impl Iterator<Item = &DetectionRecord> {
    self.records.iter()
  }
}

impl From<Vec<DetectionRecord>> for DetectionTensor {
  fn from(records: Vec<DetectionRecord>) -> Self {
    DetectionTensor {
      records: records.into_boxed_slice(),
    }
  }
}

#[cfg(feature = "model_res10")]
mod res10;
#[cfg(feature = "model_res10")]
pub use self::res10::{Res10Error, Res10Ssd, Res10SsdBuilder};

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn raw_output_decodes_into_records() {
    let raw = [
      0.0, 1.0, 0.98, 0.1, 0.2, 0.5, 0.6, //
      0.0, 1.0, 0.12, 0.0, 0.0, 1.0, 1.0,
    ];
    let tensor = DetectionTensor::from_raw(&raw).unwrap();

    assert_eq!(tensor.len(), 2);
    let first = tensor.records[0];
    assert_eq!(first.label, 1.0);
    assert_eq!(first.confidence, 0.98);
    assert_eq!(first.bbox, [0.1, 0.2, 0.5, 0.6]);
    assert_eq!(tensor.records[1].confidence, 0.12);
  }

  #[test]
  fn ragged_output_is_rejected() {
    let raw = [0.0; 10];
    assert_eq!(
      DetectionTensor::from_raw(&raw).unwrap_err(),
      MalformedOutput { len: 10 }
    );
  }

  #[test]
  fn empty_output_is_empty_tensor() {
    let tensor = DetectionTensor::from_raw(&[]).unwrap();
    assert!(tensor.is_empty());
  }
}
