// 该文件是 Shanan Bridge（山南桥）项目的一部分。
// src/message.rs - 出站消息定义
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

use serde::{Deserialize, Serialize};

use crate::frame::{Header, WireImage};

/// 桥接节点使用的通道
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Topic {
  ImageInput,
  StateInput,
  Visualization,
  Classification,
  Detection,
  DetectionWithMasks,
}

impl Topic {
  pub const OUTPUTS: [Topic; 4] = [
    Topic::Visualization,
    Topic::Classification,
    Topic::Detection,
    Topic::DetectionWithMasks,
  ];

  pub fn name(&self) -> &'static str {
    match self {
      Topic::ImageInput => "/processor/image_input",
      Topic::StateInput => "/processor/state_input",
      Topic::Visualization => "/processor/output",
      Topic::Classification => "/processor/epd_p1_output",
      Topic::Detection => "/processor/epd_p2_output",
      Topic::DetectionWithMasks => "/processor/epd_p3_output",
    }
  }
}

impl std::fmt::Display for Topic {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(self.name())
  }
}

/// 检测框，像素坐标
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionOfInterest {
  pub x_offset: u32,
  pub y_offset: u32,
  pub height: u32,
  pub width: u32,
  pub do_rectify: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImageClassification {
  pub header: Header,
  pub object_names: Vec<String>,
}

/// 检测结果，四个序列按下标一一对应
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ObjectDetection {
  pub header: Header,
  pub class_indices: Vec<i64>,
  pub scores: Vec<f32>,
  pub bboxes: Vec<RegionOfInterest>,
  pub masks: Vec<WireImage>,
}

impl ObjectDetection {
  pub fn len(&self) -> usize {
    self.class_indices.len()
  }

  pub fn is_empty(&self) -> bool {
    self.class_indices.is_empty()
  }
}

/// 每帧恰好产生一条出站消息
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum OutboundMessage {
  Classification(ImageClassification),
  Detection(ObjectDetection),
  DetectionWithMasks(ObjectDetection),
  Visualization(WireImage),
}

impl OutboundMessage {
  pub fn topic(&self) -> Topic {
    match self {
      OutboundMessage::Classification(_) => Topic::Classification,
      OutboundMessage::Detection(_) => Topic::Detection,
      OutboundMessage::DetectionWithMasks(_) => Topic::DetectionWithMasks,
      OutboundMessage::Visualization(_) => Topic::Visualization,
    }
  }

  pub fn header(&self) -> &Header {
    match self {
      OutboundMessage::Classification(msg) => &msg.header,
      OutboundMessage::Detection(msg) | OutboundMessage::DetectionWithMasks(msg) => &msg.header,
      OutboundMessage::Visualization(image) => &image.header,
    }
  }
}
