// 该文件是 Shanan Bridge（山南桥）项目的一部分。
// src/error.rs - 桥接错误定义
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

use thiserror::Error;

use crate::frame::DecodeError;

pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Error, Debug)]
pub enum BridgeError {
  #[error("图像解码错误: {0}")]
  Decode(#[from] DecodeError),
  #[error("推理引擎错误: {0}")]
  Engine(BoxError),
  #[error("推理引擎初始化失败: {0}")]
  EngineInit(BoxError),
  #[error("发布消息失败: {0}")]
  Publish(BoxError),
  #[error("输入相机已变化, 请重启: 期望 {expected:?}, 实际 {actual:?}")]
  GeometryChanged {
    expected: (u32, u32),
    actual: (u32, u32),
  },
  #[error("推理引擎尚未初始化")]
  NotInitialized,
  #[error("未处理的精度等级: {0}")]
  UnhandledPrecision(i64),
}

impl BridgeError {
  pub fn engine<E: std::error::Error + Send + Sync + 'static>(err: E) -> Self {
    BridgeError::Engine(Box::new(err))
  }

  pub fn engine_init<E: std::error::Error + Send + Sync + 'static>(err: E) -> Self {
    BridgeError::EngineInit(Box::new(err))
  }

  pub fn publish<E: std::error::Error + Send + Sync + 'static>(err: E) -> Self {
    BridgeError::Publish(Box::new(err))
  }

  /// 无法在单帧范围内恢复的错误，桥接循环遇到后终止
  pub fn is_fatal(&self) -> bool {
    matches!(
      self,
      BridgeError::GeometryChanged { .. }
        | BridgeError::EngineInit(_)
        | BridgeError::UnhandledPrecision(_)
    )
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn classifies_fatal_errors() {
    assert!(
      BridgeError::GeometryChanged {
        expected: (640, 480),
        actual: (320, 240)
      }
      .is_fatal()
    );
    assert!(BridgeError::UnhandledPrecision(4).is_fatal());
    assert!(!BridgeError::NotInitialized.is_fatal());
    assert!(!BridgeError::Decode(DecodeError::UnsupportedEncoding("yuv".into())).is_fatal());
  }
}
