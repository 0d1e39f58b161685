// 该文件是 Shanan Bridge（山南桥）项目的一部分。
// src/lifecycle.rs - 推理引擎生命周期守卫
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

use tracing::{error, info};

use crate::{
  engine::{Engine, Precision},
  error::BridgeError,
  frame::Frame,
};

/// 引擎状态，只在首帧初始化时修改一次
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineState {
  initialized: bool,
  expected_width: u32,
  expected_height: u32,
  precision: Precision,
  visualize: bool,
}

impl EngineState {
  pub fn new(precision: Precision, visualize: bool) -> Self {
    Self {
      initialized: false,
      expected_width: 0,
      expected_height: 0,
      precision,
      visualize,
    }
  }

  pub fn is_initialized(&self) -> bool {
    self.initialized
  }

  pub fn expected_width(&self) -> u32 {
    self.expected_width
  }

  pub fn expected_height(&self) -> u32 {
    self.expected_height
  }

  pub fn precision(&self) -> Precision {
    self.precision
  }

  pub fn is_visualize(&self) -> bool {
    self.visualize
  }
}

/// 持有引擎与其状态，保证引擎按首帧尺寸初始化且仅初始化一次
pub struct EngineGuard<E> {
  engine: E,
  state: EngineState,
}

impl<E: Engine> EngineGuard<E> {
  pub fn new(engine: E, precision: Precision, visualize: bool) -> Self {
    Self {
      engine,
      state: EngineState::new(precision, visualize),
    }
  }

  /// 未初始化时按该帧尺寸建立推理会话；已初始化时检查尺寸是否一致
  pub fn ensure_ready(&mut self, frame: &Frame) -> Result<(), BridgeError> {
    let (width, height) = frame.geometry();

    if !self.state.initialized {
      info!("首帧尺寸 {}x{}, 初始化推理会话", width, height);
      self
        .engine
        .initialize_session(width, height)
        .map_err(BridgeError::engine_init)?;
      self.state.expected_width = width;
      self.state.expected_height = height;
      self.state.initialized = true;
      info!("推理会话初始化完成");
      return Ok(());
    }

    // TODO: 尺寸变化时的恢复策略（丢弃、重建会话或退出）尚未确定，目前直接报错
    if width != self.state.expected_width || height != self.state.expected_height {
      error!(
        "输入尺寸变化: 期望 {}x{}, 实际 {}x{}",
        self.state.expected_width, self.state.expected_height, width, height
      );
      return Err(BridgeError::GeometryChanged {
        expected: (self.state.expected_width, self.state.expected_height),
        actual: (width, height),
      });
    }

    Ok(())
  }

  pub fn state(&self) -> &EngineState {
    &self.state
  }

  pub fn is_initialized(&self) -> bool {
    self.state.initialized
  }

  pub fn expected_width(&self) -> u32 {
    self.state.expected_width
  }

  pub fn expected_height(&self) -> u32 {
    self.state.expected_height
  }

  pub fn engine(&self) -> &E {
    &self.engine
  }

  pub(crate) fn engine_mut(&mut self) -> &mut E {
    &mut self.engine
  }
}
