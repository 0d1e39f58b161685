// 该文件是 Shanan Bridge（山南桥）项目的一部分。
// src/engine/replay.rs - 回放推理引擎
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

use image::{Rgb, RgbImage};
use imageproc::{drawing::draw_hollow_rect_mut, rect::Rect};
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info};
use url::Url;

use crate::{
  FromUrl, FromUrlWithScheme,
  engine::{DetectItem, DetectResult, Engine, Precision},
  frame::Frame,
};

const PALETTE_SIZE: usize = 80;
const MASK_THRESHOLD: f32 = 0.5;

/// 预先录制的推理结果，每次推理按顺序循环取用
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReplayScript {
  #[serde(default)]
  pub labels: Vec<Vec<String>>,
  #[serde(default)]
  pub detections: Vec<Vec<DetectItem>>,
}

#[derive(Error, Debug)]
pub enum ReplayEngineError {
  #[error("URI 方案不匹配: {0}")]
  SchemeMismatch(String),
  #[error("I/O 错误: {0}")]
  IoError(#[from] std::io::Error),
  #[error("回放脚本解析错误: {0}")]
  ScriptError(#[from] serde_json::Error),
  #[error("推理会话已初始化")]
  AlreadyInitialized,
  #[error("推理会话尚未初始化")]
  NotInitialized,
}

pub struct ReplayEngine {
  script: ReplayScript,
  session: Option<(u32, u32)>,
  cursor: usize,
  colors: Vec<Rgb<u8>>,
}

impl FromUrlWithScheme for ReplayEngine {
  const SCHEME: &'static str = "replay";
}

impl FromUrl for ReplayEngine {
  type Error = ReplayEngineError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    if url.scheme() != Self::SCHEME {
      return Err(ReplayEngineError::SchemeMismatch(format!(
        "期望方案 '{}', 实际方案 '{}'",
        Self::SCHEME,
        url.scheme()
      )));
    }

    info!("加载回放脚本: {}", url.path());
    let file = std::fs::File::open(url.path())?;
    let script: ReplayScript = serde_json::from_reader(std::io::BufReader::new(file))?;
    debug!(
      "回放脚本: {} 组分类结果, {} 组检测结果",
      script.labels.len(),
      script.detections.len()
    );

    Ok(Self::from_script(script))
  }
}

impl ReplayEngine {
  pub fn from_script(script: ReplayScript) -> Self {
    // 每个类别一种颜色
    let colors = (0..PALETTE_SIZE)
      .map(|i| hsv_to_rgb((i as f32 / PALETTE_SIZE as f32) * 360.0, 0.8, 0.9))
      .collect();

    Self {
      script,
      session: None,
      cursor: 0,
      colors,
    }
  }

  pub fn session(&self) -> Option<(u32, u32)> {
    self.session
  }

  fn check_session(&self) -> Result<(), ReplayEngineError> {
    self
      .session
      .map(|_| ())
      .ok_or(ReplayEngineError::NotInitialized)
  }

  fn next_index(&mut self, len: usize) -> Option<usize> {
    if len == 0 {
      return None;
    }
    let index = self.cursor % len;
    self.cursor = self.cursor.wrapping_add(1);
    Some(index)
  }

  fn next_detections(&mut self) -> Vec<DetectItem> {
    match self.next_index(self.script.detections.len()) {
      Some(index) => self.script.detections[index].clone(),
      None => Vec::new(),
    }
  }

  fn draw(&self, precision: Precision, frame: &Frame, items: &[DetectItem]) -> Frame {
    let mut image = frame.to_rgb_image();
    for item in items {
      let color = self.colors[item.class_index.rem_euclid(PALETTE_SIZE as i64) as usize];

      if precision == Precision::DetectionWithMasks
        && let Some(mask) = &item.mask
      {
        tint_mask(&mut image, mask, color);
      }

      let [x0, y0, x1, y1] = item.bbox;
      let width = (x1 - x0).max(0.0) as u32;
      let height = (y1 - y0).max(0.0) as u32;
      if width > 0 && height > 0 {
        let rect = Rect::at(x0 as i32, y0 as i32).of_size(width, height);
        draw_hollow_rect_mut(&mut image, rect, color);
      }
    }
    Frame::from_rgb_image(&image)
  }
}

impl Engine for ReplayEngine {
  type Error = ReplayEngineError;

  fn initialize_session(&mut self, width: u32, height: u32) -> Result<(), Self::Error> {
    if self.session.is_some() {
      return Err(ReplayEngineError::AlreadyInitialized);
    }
    info!("回放会话建立: {}x{}", width, height);
    self.session = Some((width, height));
    Ok(())
  }

  fn infer(&mut self, _frame: &Frame) -> Result<Vec<String>, Self::Error> {
    self.check_session()?;
    let labels = match self.next_index(self.script.labels.len()) {
      Some(index) => self.script.labels[index].clone(),
      None => Vec::new(),
    };
    debug!("分类结果: {:?}", labels);
    Ok(labels)
  }

  fn infer_visualize(&mut self, precision: Precision, frame: &Frame) -> Result<Frame, Self::Error> {
    self.check_session()?;
    let items = self.next_detections();
    Ok(self.draw(precision, frame, &items))
  }

  fn infer_action(
    &mut self,
    _precision: Precision,
    _frame: &Frame,
  ) -> Result<DetectResult, Self::Error> {
    self.check_session()?;
    let items = self.next_detections();
    debug!("检测到 {} 个物体", items.len());
    Ok(DetectResult::from(items))
  }
}

/// 掩码与图像同尺寸时，将掩码值较高的像素与类别颜色混合
fn tint_mask(image: &mut RgbImage, mask: &crate::engine::Mask, color: Rgb<u8>) {
  if (mask.width, mask.height) != image.dimensions() {
    debug!(
      "掩码尺寸 {}x{} 与图像不一致, 跳过绘制",
      mask.width, mask.height
    );
    return;
  }

  for (pixel, value) in image.pixels_mut().zip(mask.data.iter()) {
    if *value > MASK_THRESHOLD {
      for c in 0..3 {
        pixel[c] = ((pixel[c] as u16 + color[c] as u16) / 2) as u8;
      }
    }
  }
}

fn hsv_to_rgb(h: f32, s: f32, v: f32) -> Rgb<u8> {
  let c = v * s;
  let x = c * (1.0 - ((h / 60.0) % 2.0 - 1.0).abs());
  let m = v - c;

  let (r, g, b) = if h < 60.0 {
    (c, x, 0.0)
  } else if h < 120.0 {
    (x, c, 0.0)
  } else if h < 180.0 {
    (0.0, c, x)
  } else if h < 240.0 {
    (0.0, x, c)
  } else if h < 300.0 {
    (x, 0.0, c)
  } else {
    (c, 0.0, x)
  };

  Rgb([
    ((r + m) * 255.0) as u8,
    ((g + m) * 255.0) as u8,
    ((b + m) * 255.0) as u8,
  ])
}
