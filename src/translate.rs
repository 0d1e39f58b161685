// 该文件是 Shanan Bridge（山南桥）项目的一部分。
// src/translate.rs - 推理结果到出站消息的转换
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

use crate::{
  engine::{DetectItem, DetectResult, Mask},
  frame::{Encoding, Frame, Header, WireImage},
  message::{ImageClassification, ObjectDetection, OutboundMessage, RegionOfInterest},
};

const FLOAT32_BYTES: u32 = 4;

pub fn classification(labels: Vec<String>, header: &Header) -> OutboundMessage {
  OutboundMessage::Classification(ImageClassification {
    header: header.clone(),
    object_names: labels,
  })
}

pub fn visualization(frame: &Frame, header: &Header) -> OutboundMessage {
  OutboundMessage::Visualization(WireImage::from_frame(frame, header.clone()))
}

/// 检测结果转换为 P2（无掩码）或 P3（含掩码）消息，保持检测顺序
pub fn translate(result: &DetectResult, include_masks: bool, header: &Header) -> OutboundMessage {
  let count = result.len();
  let mut detection = ObjectDetection {
    header: header.clone(),
    class_indices: Vec::with_capacity(count),
    scores: Vec::with_capacity(count),
    bboxes: Vec::with_capacity(count),
    masks: Vec::with_capacity(if include_masks { count } else { 0 }),
  };

  for DetectItem {
    class_index,
    score,
    bbox,
    mask,
  } in result.items.iter()
  {
    detection.class_indices.push(*class_index);
    detection.scores.push(*score);
    detection.bboxes.push(region_of_interest(bbox));
    if include_masks {
      detection.masks.push(mask_image(mask.as_ref(), header));
    }
  }

  if include_masks {
    OutboundMessage::DetectionWithMasks(detection)
  } else {
    OutboundMessage::Detection(detection)
  }
}

/// [x_min, y_min, x_max, y_max] 转为偏移加宽高，调用方保证 max >= min
pub fn region_of_interest(bbox: &[f32; 4]) -> RegionOfInterest {
  let [x0, y0, x1, y1] = *bbox;
  RegionOfInterest {
    x_offset: x0 as u32,
    y_offset: y0 as u32,
    width: (x1 - x0) as u32,
    height: (y1 - y0) as u32,
    do_rectify: false,
  }
}

/// 掩码编码为单通道 32 位浮点图像；缺失的掩码用 0x0 图像占位
pub fn mask_image(mask: Option<&Mask>, header: &Header) -> WireImage {
  let (width, height, data) = match mask {
    Some(mask) => (
      mask.width,
      mask.height,
      mask.data.iter().flat_map(|v| v.to_le_bytes()).collect(),
    ),
    None => (0, 0, Vec::new()),
  };

  WireImage {
    header: header.clone(),
    height,
    width,
    encoding: Encoding::Float32C1.as_str().to_string(),
    is_bigendian: 0,
    step: width * FLOAT32_BYTES,
    data,
  }
}
