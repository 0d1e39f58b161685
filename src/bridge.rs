// 该文件是 Shanan Bridge（山南桥）项目的一部分。
// src/bridge.rs - 桥接节点
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

use std::sync::mpsc::Receiver;
use std::time::Instant;

use tracing::{error, info, warn};

use crate::{
  control::ControlCommand,
  dispatch::Router,
  engine::{Engine, Precision},
  error::BridgeError,
  frame::{Frame, WireImage},
  lifecycle::{EngineGuard, EngineState},
  message::Topic,
  output::Publish,
};

/// 单帧处理结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Processed {
  /// 空帧，已丢弃
  Discarded,
  Published(Topic),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
  Shutdown,
  InputExhausted,
  FrameLimit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
  pub published: usize,
  pub discarded: usize,
  pub failed: usize,
  pub stop: StopReason,
}

/// 桥接节点：逐帧解码、检查、推理、发布，同一时刻只处理一帧
pub struct Bridge<E, O> {
  router: Router<E>,
  output: O,
  frame_number: Option<usize>,
}

impl<E, O> Bridge<E, O>
where
  E: Engine,
  O: Publish,
  O::Error: std::error::Error + Send + Sync + 'static,
{
  pub fn new(engine: E, precision: Precision, visualize: bool, output: O) -> Self {
    info!("桥接节点启动: 精度等级 {}, 可视化: {}", precision, visualize);
    Self {
      router: Router::new(EngineGuard::new(engine, precision, visualize)),
      output,
      frame_number: None,
    }
  }

  /// 处理指定帧数后退出，`None` 表示不限制
  pub fn with_frame_number(mut self, frame_number: Option<usize>) -> Self {
    self.frame_number = frame_number;
    self
  }

  pub fn state(&self) -> &EngineState {
    self.router.guard().state()
  }

  pub fn engine(&self) -> &E {
    self.router.guard().engine()
  }

  pub fn output(&self) -> &O {
    &self.output
  }

  pub fn handle_control(&self, command: &str) -> ControlCommand {
    let command = ControlCommand::parse(command);
    match &command {
      ControlCommand::Shutdown => info!("收到 shutdown 请求"),
      ControlCommand::Invalid(other) => warn!("无效的状态请求: {:?}", other),
    }
    command
  }

  /// 处理一帧输入图像。解码、推理与发布错误只影响本帧；
  /// 尺寸变化与引擎初始化失败为致命错误，由调用方决定退出
  pub fn process(&mut self, image: &WireImage) -> Result<Processed, BridgeError> {
    if image.is_empty() {
      warn!("输入图像为空, 丢弃");
      return Ok(Processed::Discarded);
    }

    let frame = Frame::decode(image)?;
    self.router.guard_mut().ensure_ready(&frame)?;

    let begin = Instant::now();
    let message = self.router.route(&frame, &image.header)?;
    self
      .output
      .publish(&message)
      .map_err(BridgeError::publish)?;

    let elapsed = begin.elapsed();
    info!(
      "[-FPS-]= {:.2} ({:.2?})",
      1.0 / elapsed.as_secs_f64().max(f64::EPSILON),
      elapsed
    );
    Ok(Processed::Published(message.topic()))
  }

  /// 处理所有待处理的控制命令，收到 shutdown 时返回 true
  fn poll_control(&self, control: &Receiver<String>) -> bool {
    let mut shutdown = false;
    while let Ok(command) = control.try_recv() {
      if self.handle_control(&command) == ControlCommand::Shutdown {
        shutdown = true;
      }
    }
    shutdown
  }

  /// 按到达顺序处理输入，直到输入结束、达到帧数限制、收到 shutdown 或发生致命错误
  pub fn run<I>(&mut self, input: I, control: &Receiver<String>) -> Result<RunSummary, BridgeError>
  where
    I: IntoIterator<Item = WireImage>,
  {
    info!("开始处理 {} 上的图像...", Topic::ImageInput);
    let mut summary = RunSummary {
      published: 0,
      discarded: 0,
      failed: 0,
      stop: StopReason::InputExhausted,
    };
    let mut frame_index = 0usize;
    let mut frames = input.into_iter();

    loop {
      if self.poll_control(control) {
        summary.stop = StopReason::Shutdown;
        break;
      }

      let Some(image) = frames.next() else {
        summary.stop = StopReason::InputExhausted;
        break;
      };
      frame_index += 1;

      match self.process(&image) {
        Ok(Processed::Published(_)) => summary.published += 1,
        Ok(Processed::Discarded) => summary.discarded += 1,
        Err(e) if e.is_fatal() => {
          error!("第 {} 帧发生致命错误: {}", frame_index, e);
          return Err(e);
        }
        Err(e) => {
          error!("第 {} 帧处理失败: {}", frame_index, e);
          summary.failed += 1;
        }
      }

      if self.frame_number.is_some_and(|n| frame_index >= n) {
        info!("达到指定帧数 {}, 退出处理循环", frame_index);
        summary.stop = StopReason::FrameLimit;
        break;
      }
    }

    info!(
      "处理结束: 发布 {} 帧, 丢弃 {} 帧, 失败 {} 帧",
      summary.published, summary.discarded, summary.failed
    );
    Ok(summary)
  }
}
