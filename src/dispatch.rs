// 该文件是 Shanan Bridge（山南桥）项目的一部分。
// src/dispatch.rs - 按精度等级分派推理
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

use tracing::debug;

use crate::{
  engine::{Engine, Precision},
  error::BridgeError,
  frame::{Frame, Header},
  lifecycle::EngineGuard,
  message::OutboundMessage,
  translate,
};

/// 分派路由，引擎状态通过构造时传入的守卫获取
pub struct Router<E> {
  guard: EngineGuard<E>,
}

impl<E: Engine> Router<E> {
  pub fn new(guard: EngineGuard<E>) -> Self {
    Self { guard }
  }

  pub fn guard(&self) -> &EngineGuard<E> {
    &self.guard
  }

  pub fn guard_mut(&mut self) -> &mut EngineGuard<E> {
    &mut self.guard
  }

  /// 对已通过生命周期检查的帧执行一次推理，生成对应的出站消息
  pub fn route(&mut self, frame: &Frame, header: &Header) -> Result<OutboundMessage, BridgeError> {
    let state = *self.guard.state();
    if !state.is_initialized() {
      return Err(BridgeError::NotInitialized);
    }

    let precision = state.precision();
    let engine = self.guard.engine_mut();
    debug!("分派推理: {}, 可视化: {}", precision, state.is_visualize());

    let message = match precision {
      Precision::Classification => {
        let labels = engine.infer(frame).map_err(BridgeError::engine)?;
        translate::classification(labels, header)
      }
      Precision::Detection | Precision::DetectionWithMasks if state.is_visualize() => {
        let image = engine
          .infer_visualize(precision, frame)
          .map_err(BridgeError::engine)?;
        translate::visualization(&image, header)
      }
      Precision::Detection => {
        let result = engine
          .infer_action(precision, frame)
          .map_err(BridgeError::engine)?;
        translate::translate(&result, false, header)
      }
      Precision::DetectionWithMasks => {
        let result = engine
          .infer_action(precision, frame)
          .map_err(BridgeError::engine)?;
        translate::translate(&result, true, header)
      }
    };

    Ok(message)
  }
}
