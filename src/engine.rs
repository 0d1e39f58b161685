// 该文件是 Shanan Bridge（山南桥）项目的一部分。
// src/engine.rs - 推理引擎接口
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
use thiserror::Error;
use url::Url;

use crate::{FromUrl, error::BridgeError, frame::Frame};

/// 精度等级，在配置阶段确定，运行期间不变
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Precision {
  /// P1: 图像分类
  Classification,
  /// P2: 目标检测
  Detection,
  /// P3: 目标检测加分割掩码
  DetectionWithMasks,
}

impl Precision {
  pub fn level(&self) -> i64 {
    match self {
      Precision::Classification => 1,
      Precision::Detection => 2,
      Precision::DetectionWithMasks => 3,
    }
  }
}

impl TryFrom<i64> for Precision {
  type Error = BridgeError;

  fn try_from(level: i64) -> Result<Self, Self::Error> {
    match level {
      1 => Ok(Precision::Classification),
      2 => Ok(Precision::Detection),
      3 => Ok(Precision::DetectionWithMasks),
      other => Err(BridgeError::UnhandledPrecision(other)),
    }
  }
}

impl std::fmt::Display for Precision {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "P{}", self.level())
  }
}

/// 分割掩码，行优先存储
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Mask {
  pub width: u32,
  pub height: u32,
  pub data: Vec<f32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectItem {
  pub class_index: i64,
  pub score: f32,
  pub bbox: [f32; 4], // [x_min, y_min, x_max, y_max]，像素坐标
  #[serde(default)]
  pub mask: Option<Mask>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DetectResult {
  pub items: Box<[DetectItem]>,
}

impl DetectResult {
  pub fn len(&self) -> usize {
    self.items.len()
  }

  pub fn is_empty(&self) -> bool {
    self.items.is_empty()
  }
}

impl From<Vec<DetectItem>> for DetectResult {
  fn from(items: Vec<DetectItem>) -> Self {
    Self {
      items: items.into_boxed_slice(),
    }
  }
}

/// 推理引擎，内部按精度等级各持有一个模型
pub trait Engine {
  type Error: std::error::Error + Send + Sync + 'static;

  /// 按输入帧尺寸建立推理会话，桥接生命周期内只调用一次
  fn initialize_session(&mut self, width: u32, height: u32) -> Result<(), Self::Error>;

  /// P1 分类
  fn infer(&mut self, frame: &Frame) -> Result<Vec<String>, Self::Error>;

  /// 返回绘制了推理结果的图像
  fn infer_visualize(&mut self, precision: Precision, frame: &Frame) -> Result<Frame, Self::Error>;

  fn infer_action(
    &mut self,
    precision: Precision,
    frame: &Frame,
  ) -> Result<DetectResult, Self::Error>;
}

impl<E: Engine + ?Sized> Engine for Box<E> {
  type Error = E::Error;

  fn initialize_session(&mut self, width: u32, height: u32) -> Result<(), Self::Error> {
    (**self).initialize_session(width, height)
  }

  fn infer(&mut self, frame: &Frame) -> Result<Vec<String>, Self::Error> {
    (**self).infer(frame)
  }

  fn infer_visualize(&mut self, precision: Precision, frame: &Frame) -> Result<Frame, Self::Error> {
    (**self).infer_visualize(precision, frame)
  }

  fn infer_action(
    &mut self,
    precision: Precision,
    frame: &Frame,
  ) -> Result<DetectResult, Self::Error> {
    (**self).infer_action(precision, frame)
  }
}

#[cfg(feature = "replay_engine")]
mod replay;
#[cfg(feature = "replay_engine")]
pub use self::replay::{ReplayEngine, ReplayEngineError, ReplayScript};

#[derive(Error, Debug)]
pub enum EngineError {
  #[cfg(feature = "replay_engine")]
  #[error("回放引擎错误: {0}")]
  ReplayEngineError(#[from] ReplayEngineError),
  #[error("URI 方案不匹配")]
  SchemeMismatch,
}

pub enum EngineWrapper {
  #[cfg(feature = "replay_engine")]
  Replay(ReplayEngine),
}

impl FromUrl for EngineWrapper {
  type Error = EngineError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    #[cfg(feature = "replay_engine")]
    {
      use crate::FromUrlWithScheme;

      if url.scheme() == ReplayEngine::SCHEME {
        let engine = ReplayEngine::from_url(url)?;
        return Ok(EngineWrapper::Replay(engine));
      }
    }
    let _ = url;
    Err(EngineError::SchemeMismatch)
  }
}

impl Engine for EngineWrapper {
  type Error = EngineError;

  fn initialize_session(&mut self, width: u32, height: u32) -> Result<(), Self::Error> {
    match self {
      #[cfg(feature = "replay_engine")]
      EngineWrapper::Replay(engine) => engine
        .initialize_session(width, height)
        .map_err(EngineError::from),
    }
  }

  fn infer(&mut self, frame: &Frame) -> Result<Vec<String>, Self::Error> {
    match self {
      #[cfg(feature = "replay_engine")]
      EngineWrapper::Replay(engine) => engine.infer(frame).map_err(EngineError::from),
    }
  }

  fn infer_visualize(&mut self, precision: Precision, frame: &Frame) -> Result<Frame, Self::Error> {
    match self {
      #[cfg(feature = "replay_engine")]
      EngineWrapper::Replay(engine) => engine
        .infer_visualize(precision, frame)
        .map_err(EngineError::from),
    }
  }

  fn infer_action(
    &mut self,
    precision: Precision,
    frame: &Frame,
  ) -> Result<DetectResult, Self::Error> {
    match self {
      #[cfg(feature = "replay_engine")]
      EngineWrapper::Replay(engine) => engine
        .infer_action(precision, frame)
        .map_err(EngineError::from),
    }
  }
}
