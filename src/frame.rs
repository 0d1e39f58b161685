// 该文件是 Shanan Bridge（山南桥）项目的一部分。
// src/frame.rs - 图像消息与 BGR 帧定义
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

use std::str::FromStr;

use chrono::{DateTime, Utc};
use image::{ImageBuffer, Rgb, RgbImage};
use serde::{Deserialize, Serialize};
use thiserror::Error;

const BGR_CHANNELS: usize = 3;

/// 消息头，出站消息沿用输入帧的消息头
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Header {
  pub stamp: DateTime<Utc>,
  pub frame_id: String,
}

impl Header {
  pub fn now(frame_id: impl Into<String>) -> Self {
    Self {
      stamp: Utc::now(),
      frame_id: frame_id.into(),
    }
  }
}

/// 线上图像的像素编码
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
  Bgr8,
  Rgb8,
  Bgra8,
  Rgba8,
  Mono8,
  Float32C1,
}

impl Encoding {
  pub fn as_str(&self) -> &'static str {
    match self {
      Encoding::Bgr8 => "bgr8",
      Encoding::Rgb8 => "rgb8",
      Encoding::Bgra8 => "bgra8",
      Encoding::Rgba8 => "rgba8",
      Encoding::Mono8 => "mono8",
      Encoding::Float32C1 => "32FC1",
    }
  }

  pub fn bytes_per_pixel(&self) -> usize {
    match self {
      Encoding::Bgr8 | Encoding::Rgb8 => 3,
      Encoding::Bgra8 | Encoding::Rgba8 | Encoding::Float32C1 => 4,
      Encoding::Mono8 => 1,
    }
  }
}

impl FromStr for Encoding {
  type Err = DecodeError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "bgr8" => Ok(Encoding::Bgr8),
      "rgb8" => Ok(Encoding::Rgb8),
      "bgra8" => Ok(Encoding::Bgra8),
      "rgba8" => Ok(Encoding::Rgba8),
      "mono8" => Ok(Encoding::Mono8),
      "32FC1" => Ok(Encoding::Float32C1),
      other => Err(DecodeError::UnsupportedEncoding(other.to_string())),
    }
  }
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum DecodeError {
  #[error("不支持的图像编码: {0}")]
  UnsupportedEncoding(String),
  #[error("行跨度过小: 每行至少 {min} 字节, 实际 {step} 字节")]
  StepTooSmall { min: usize, step: usize },
  #[error("数据长度不匹配: 期望长度 {expected}, 实际长度 {actual}")]
  LengthMismatch { expected: usize, actual: usize },
}

/// 线上图像消息，字段布局与相机驱动发布的图像一致
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WireImage {
  pub header: Header,
  pub height: u32,
  pub width: u32,
  pub encoding: String,
  pub is_bigendian: u8,
  /// 每行字节数
  pub step: u32,
  pub data: Vec<u8>,
}

impl WireImage {
  /// 高度为 0 的图像视为空帧
  pub fn is_empty(&self) -> bool {
    self.height == 0
  }

  pub fn geometry(&self) -> (u32, u32) {
    (self.width, self.height)
  }

  pub fn from_frame(frame: &Frame, header: Header) -> Self {
    Self {
      header,
      height: frame.height,
      width: frame.width,
      encoding: Encoding::Bgr8.as_str().to_string(),
      is_bigendian: 0,
      step: frame.width * BGR_CHANNELS as u32,
      data: frame.data.to_vec(),
    }
  }

  pub fn from_rgb_image(image: &RgbImage, header: Header) -> Self {
    let (width, height) = image.dimensions();
    Self {
      header,
      height,
      width,
      encoding: Encoding::Rgb8.as_str().to_string(),
      is_bigendian: 0,
      step: width * BGR_CHANNELS as u32,
      data: image.as_raw().clone(),
    }
  }
}

/// 解码后的帧，像素按 BGR 顺序紧密排列（NHWC）
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
  width: u32,
  height: u32,
  data: Box<[u8]>,
}

impl Frame {
  pub fn new(width: u32, height: u32, data: Vec<u8>) -> Result<Self, DecodeError> {
    let expected = BGR_CHANNELS * width as usize * height as usize;
    if data.len() != expected {
      return Err(DecodeError::LengthMismatch {
        expected,
        actual: data.len(),
      });
    }

    Ok(Self {
      width,
      height,
      data: data.into_boxed_slice(),
    })
  }

  pub fn blank(width: u32, height: u32) -> Self {
    let size = BGR_CHANNELS * (width as usize) * (height as usize);
    Self {
      width,
      height,
      data: vec![0u8; size].into_boxed_slice(),
    }
  }

  /// 将线上图像解码为 BGR 帧
  pub fn decode(image: &WireImage) -> Result<Self, DecodeError> {
    let encoding: Encoding = image.encoding.parse()?;
    let to_bgr: fn(&[u8]) -> [u8; 3] = match encoding {
      Encoding::Bgr8 | Encoding::Bgra8 => |px: &[u8]| [px[0], px[1], px[2]],
      Encoding::Rgb8 | Encoding::Rgba8 => |px: &[u8]| [px[2], px[1], px[0]],
      Encoding::Mono8 => |px: &[u8]| [px[0], px[0], px[0]],
      Encoding::Float32C1 => {
        return Err(DecodeError::UnsupportedEncoding(image.encoding.clone()));
      }
    };

    let width = image.width as usize;
    let height = image.height as usize;
    let step = image.step as usize;
    let bpp = encoding.bytes_per_pixel();

    if step < width * bpp {
      return Err(DecodeError::StepTooSmall {
        min: width * bpp,
        step,
      });
    }

    let expected = step * height;
    if image.data.len() != expected {
      return Err(DecodeError::LengthMismatch {
        expected,
        actual: image.data.len(),
      });
    }

    if step == 0 {
      return Self::new(image.width, image.height, Vec::new());
    }

    let mut data = Vec::with_capacity(width * height * BGR_CHANNELS);
    for row in image.data.chunks_exact(step) {
      for px in row[..width * bpp].chunks_exact(bpp) {
        data.extend_from_slice(&to_bgr(px));
      }
    }

    Self::new(image.width, image.height, data)
  }

  pub fn height(&self) -> u32 {
    self.height
  }

  pub fn width(&self) -> u32 {
    self.width
  }

  pub fn geometry(&self) -> (u32, u32) {
    (self.width, self.height)
  }

  pub fn channels(&self) -> usize {
    BGR_CHANNELS
  }

  pub fn as_bgr(&self) -> &[u8] {
    &self.data
  }

  pub fn to_rgb_image(&self) -> RgbImage {
    let width = self.width as usize;
    let data = &self.data;

    ImageBuffer::from_fn(self.width, self.height, |x, y| {
      let idx = (y as usize * width + x as usize) * BGR_CHANNELS;
      Rgb([data[idx + 2], data[idx + 1], data[idx]])
    })
  }

  pub fn from_rgb_image(image: &RgbImage) -> Self {
    let (width, height) = image.dimensions();
    let mut data = Vec::with_capacity((width * height) as usize * BGR_CHANNELS);
    for pixel in image.pixels() {
      data.extend_from_slice(&[pixel[2], pixel[1], pixel[0]]);
    }

    Self {
      width,
      height,
      data: data.into_boxed_slice(),
    }
  }
}

impl AsMut<[u8]> for Frame {
  fn as_mut(&mut self) -> &mut [u8] {
    &mut self.data
  }
}
