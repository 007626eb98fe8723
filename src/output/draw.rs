// 该文件是 Lianpu （脸谱） 项目的一部分。
// src/output/draw.rs - 人脸检测结果可视化
//
// 本程序遵循 GNU Affero 通用公共许可证（AGPL）许可协议。
// 本程序的发布旨在提供实用价值，但不作任何形式的担保，
// 包括但不限于对适销性或特定用途适用性的默示担保。
// 更多详情请参阅 GNU 通用公共许可证。
//
// Copyright (C) 2026 Johann Li <me@qinka.pro>, ETVP

use std::path::Path;

use ab_glyph::{FontArc, PxScale};
use image::{Rgb, RgbImage};
use imageproc::{
  drawing::{draw_hollow_rect_mut, draw_text_mut, text_size},
  rect::Rect,
};
use thiserror::Error;
use tracing::{debug, info};

use crate::model::{DetectionRecord, DetectionTensor};

// 文本渲染常量
const LABEL_FONT_SIZE: f32 = 16.0;
const LABEL_OFFSET: i32 = 10;
const BOX_THICKNESS: i32 = 2;
const BOX_COLOR: [u8; 3] = [255, 0, 0]; // 红色

#[derive(Error, Debug)]
pub enum DrawError {
  #[error("无法读取字体文件: {0}")]
  FontReadError(#[from] std::io::Error),
  #[error("无效的字体文件: {0}")]
  InvalidFont(#[from] ab_glyph::InvalidFont),
}

/// 像素坐标下的检测框
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
  pub start_x: i32,
  pub start_y: i32,
  pub end_x: i32,
  pub end_y: i32,
  pub confidence: f32,
}

impl BoundingBox {
  /// 按 (w, h, w, h) 缩放归一化坐标并向零取整
  pub fn from_record(record: &DetectionRecord, width: u32, height: u32) -> Self {
    let (w, h) = (width as f32, height as f32);
    let [x_min, y_min, x_max, y_max] = record.bbox;
    BoundingBox {
      start_x: (x_min * w) as i32,
      start_y: (y_min * h) as i32,
      end_x: (x_max * w) as i32,
      end_y: (y_max * h) as i32,
      confidence: record.confidence,
    }
  }

  pub fn label(&self) -> String {
    format!("{:.2}%", self.confidence * 100.0)
  }

  /// 标签基线位置，靠近图像顶部时放到框内侧
  pub fn label_origin(&self) -> (i32, i32) {
    let above = self.start_y.saturating_sub(LABEL_OFFSET);
    let y = if above > LABEL_OFFSET {
      above
    } else {
      self.start_y.saturating_add(LABEL_OFFSET)
    };
    (self.start_x, y)
  }

  // 限制在图像范围内，图像尺寸需大于 0
  fn clamped(&self, width: u32, height: u32) -> Self {
    let (max_x, max_y) = (width as i32 - 1, height as i32 - 1);
    BoundingBox {
      start_x: self.start_x.clamp(0, max_x),
      start_y: self.start_y.clamp(0, max_y),
      end_x: self.end_x.clamp(0, max_x),
      end_y: self.end_y.clamp(0, max_y),
      confidence: self.confidence,
    }
  }
}

pub struct Draw {
  font_size: f32,
  color: [u8; 3],
  font: FontArc,
}

impl Default for Draw {
  fn default() -> Self {
    let font_data: &'static [u8] = include_bytes!("../../assets/DejaVuSans.ttf"); // default font
    let font = FontArc::try_from_slice(font_data).expect("无法加载嵌入的字体文件");

    Self {
      font_size: LABEL_FONT_SIZE,
      color: BOX_COLOR,
      font,
    }
  }
}

impl Draw {
  pub fn with_font_file(path: impl AsRef<Path>) -> Result<Self, DrawError> {
    let path = path.as_ref();
    let font = FontArc::try_from_vec(std::fs::read(path)?)?;
    debug!("使用字体文件: {}", path.display());

    Ok(Self {
      font_size: LABEL_FONT_SIZE,
      color: BOX_COLOR,
      font,
    })
  }

  /// 在图像上绘制置信度严格大于阈值的检测框，返回绘制的框
  pub fn render_detections(
    &self,
    image: &mut RgbImage,
    tensor: &DetectionTensor,
    confidence_threshold: f32,
  ) -> Vec<BoundingBox> {
    let (width, height) = image.dimensions();

    let boxes: Vec<BoundingBox> = tensor
      .iter()
      .filter(|record| record.confidence > confidence_threshold)
      .map(|record| BoundingBox::from_record(record, width, height))
      .collect();

    if width > 0 && height > 0 {
      for bbox in &boxes {
        debug!("绘制检测框: {:?}", bbox);
        self.draw_bbox_with_label(image, &bbox.clamped(width, height));
      }
    }

    info!(
      "{} 个候选中有 {} 个置信度高于 {}",
      tensor.len(),
      boxes.len(),
      confidence_threshold
    );
    boxes
  }

  fn draw_bbox_with_label(&self, image: &mut RgbImage, bbox: &BoundingBox) {
    let color = Rgb(self.color);

    // 2 像素边框，线宽以边为中心；宽或高为 0 的框画成线段
    let (x0, x1) = (bbox.start_x.min(bbox.end_x), bbox.start_x.max(bbox.end_x));
    let (y0, y1) = (bbox.start_y.min(bbox.end_y), bbox.start_y.max(bbox.end_y));
    for d in -(BOX_THICKNESS / 2)..(BOX_THICKNESS - BOX_THICKNESS / 2) {
      let (left, top, right, bottom) = (x0 + d, y0 + d, x1 - d, y1 - d);
      if right < left || bottom < top {
        continue;
      }
      let rect =
        Rect::at(left, top).of_size((right - left + 1) as u32, (bottom - top + 1) as u32);
      draw_hollow_rect_mut(image, rect, color);
    }

    let label = bbox.label();
    let scale = PxScale::from(self.font_size);
    let (_, text_height) = text_size(scale, &self.font, &label);
    let (x, y) = bbox.label_origin();
    draw_text_mut(
      image,
      color,
      x,
      y - text_height as i32,
      scale,
      &self.font,
      &label,
    );
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn record(confidence: f32, bbox: [f32; 4]) -> DetectionRecord {
    DetectionRecord {
      image_id: 0.0,
      label: 1.0,
      confidence,
      bbox,
    }
  }

  fn boxed(start_y: i32) -> BoundingBox {
    BoundingBox {
      start_x: 7,
      start_y,
      end_x: 100,
      end_y: 100,
      confidence: 0.9,
    }
  }

  #[test]
  fn normalized_box_scales_to_pixels() {
    let bbox = BoundingBox::from_record(&record(0.9, [0.1, 0.2, 0.5, 0.6]), 640, 480);
    assert_eq!(
      (bbox.start_x, bbox.start_y, bbox.end_x, bbox.end_y),
      (64, 96, 320, 288)
    );
  }

  #[test]
  fn coordinates_truncate_toward_zero() {
    let bbox = BoundingBox::from_record(&record(0.9, [0.0999, -0.001, 0.985, 1.0]), 100, 100);
    assert_eq!(
      (bbox.start_x, bbox.start_y, bbox.end_x, bbox.end_y),
      (9, 0, 98, 100)
    );
  }

  #[test]
  fn label_moves_inside_near_top_edge() {
    assert_eq!(boxed(5).label_origin(), (7, 15));
    assert_eq!(boxed(20).label_origin(), (7, 30));
    assert_eq!(boxed(21).label_origin(), (7, 11));
    assert_eq!(boxed(50).label_origin(), (7, 40));
  }

  #[test]
  fn label_is_percentage_with_two_decimals() {
    let mut bbox = boxed(50);
    bbox.confidence = 0.125;
    assert_eq!(bbox.label(), "12.50%");
    bbox.confidence = 1.0;
    assert_eq!(bbox.label(), "100.00%");
  }

  #[test]
  fn threshold_is_strict() {
    let tensor = DetectionTensor::from(vec![
      record(0.5, [0.1, 0.1, 0.4, 0.4]),
      record(0.5001, [0.5, 0.5, 0.9, 0.9]),
      record(0.2, [0.0, 0.0, 1.0, 1.0]),
    ]);
    let mut image = RgbImage::new(100, 100);

    let boxes = Draw::default().render_detections(&mut image, &tensor, 0.5);
    assert_eq!(boxes.len(), 1);
    assert_eq!(boxes[0].start_x, 50);
    assert_eq!(boxes[0].confidence, 0.5001);
  }

  #[test]
  fn outline_is_centred_on_the_box_edge() {
    let tensor = DetectionTensor::from(vec![record(0.9, [0.1, 0.2, 0.5, 0.6])]);
    let mut image = RgbImage::new(640, 480);

    Draw::default().render_detections(&mut image, &tensor, 0.5);
    assert_eq!(image.get_pixel(64, 96), &Rgb(BOX_COLOR));
    assert_eq!(image.get_pixel(63, 95), &Rgb(BOX_COLOR));
    assert_eq!(image.get_pixel(320, 288), &Rgb(BOX_COLOR));
    assert_eq!(image.get_pixel(65, 97), &Rgb([0, 0, 0]));
    assert_eq!(image.get_pixel(200, 200), &Rgb([0, 0, 0]));
  }

  #[test]
  fn label_is_drawn_above_the_box() {
    let tensor = DetectionTensor::from(vec![record(0.9, [0.1, 0.5, 0.5, 0.9])]);
    let mut image = RgbImage::new(100, 100);

    let boxes = Draw::default().render_detections(&mut image, &tensor, 0.5);
    let (x, y) = boxes[0].label_origin();
    assert_eq!((x, y), (10, 40));

    // 标签区域位于边框上方，不与边框重叠
    let label_pixels = (x..x + 50)
      .flat_map(|px| (y - 20..y).map(move |py| (px as u32, py as u32)))
      .filter(|&(px, py)| image.get_pixel(px, py)[0] > 0)
      .count();
    assert!(label_pixels > 0);
  }

  #[test]
  fn font_file_overrides_embedded_font() {
    let path = concat!(env!("CARGO_MANIFEST_DIR"), "/assets/DejaVuSans.ttf");
    let draw = Draw::with_font_file(path).unwrap();
    let tensor = DetectionTensor::from(vec![record(0.9, [0.1, 0.5, 0.5, 0.9])]);
    let mut image = RgbImage::new(100, 100);

    draw.render_detections(&mut image, &tensor, 0.5);
    let label_pixels = (10..60)
      .flat_map(|px| (20..40).map(move |py| (px, py)))
      .filter(|&(px, py)| image.get_pixel(px, py)[0] > 0)
      .count();
    assert!(label_pixels > 0);
  }

  #[test]
  fn nothing_above_threshold_leaves_image_untouched() {
    let tensor = DetectionTensor::from(vec![record(0.3, [0.1, 0.2, 0.5, 0.6])]);
    let mut image = RgbImage::from_pixel(32, 32, Rgb([9, 9, 9]));
    let before = image.clone();

    let boxes = Draw::default().render_detections(&mut image, &tensor, 0.5);
    assert!(boxes.is_empty());
    assert_eq!(image, before);
  }

  #[test]
  fn degenerate_box_is_drawn_as_a_line() {
    let tensor = DetectionTensor::from(vec![record(0.9, [0.5, 0.5, 0.5, 0.7])]);
    let mut image = RgbImage::new(10, 10);

    let boxes = Draw::default().render_detections(&mut image, &tensor, 0.5);
    assert_eq!(boxes.len(), 1);
    assert_eq!((boxes[0].start_x, boxes[0].end_x), (5, 5));
    assert_eq!(image.get_pixel(5, 6), &Rgb(BOX_COLOR));
  }

  #[test]
  fn out_of_range_coordinates_are_clamped_when_drawing() {
    let tensor = DetectionTensor::from(vec![record(0.9, [-1e10, 0.0, 1e10, 1.0])]);
    let mut image = RgbImage::new(100, 100);

    let boxes = Draw::default().render_detections(&mut image, &tensor, 0.5);
    assert_eq!(boxes[0].start_x, i32::MIN);
    assert_eq!(boxes[0].end_x, i32::MAX);
    assert_eq!(image.get_pixel(0, 50), &Rgb(BOX_COLOR));
    assert_eq!(image.get_pixel(99, 50), &Rgb(BOX_COLOR));

    let extreme = BoundingBox {
      start_x: i32::MIN,
      start_y: i32::MIN,
      end_x: i32::MAX,
      end_y: i32::MAX,
      confidence: 0.9,
    };
    assert_eq!(extreme.label_origin(), (i32::MIN, i32::MIN + LABEL_OFFSET));
  }

  #[test]
  fn bad_font_file_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("font.ttf");
    std::fs::write(&path, b"not a font").unwrap();

    assert!(matches!(
      Draw::with_font_file(&path),
      Err(DrawError::InvalidFont(_))
    ));
    assert!(matches!(
      Draw::with_font_file(dir.path().join("missing.ttf")),
      Err(DrawError::FontReadError(_))
    ));
  }
}
