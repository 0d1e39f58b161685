// 该文件是 Shanan Bridge（山南桥）项目的一部分。
// src/output/memory.rs - 内存输出
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

use std::convert::Infallible;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::{
  message::{OutboundMessage, Topic},
  output::Publish,
};

/// 收集所有发布的消息，克隆后共享同一份记录
#[derive(Debug, Clone, Default)]
pub struct MemoryOutput {
  messages: Arc<Mutex<Vec<OutboundMessage>>>,
}

impl MemoryOutput {
  fn lock(&self) -> MutexGuard<'_, Vec<OutboundMessage>> {
    self.messages.lock().unwrap_or_else(PoisonError::into_inner)
  }

  pub fn messages(&self) -> Vec<OutboundMessage> {
    self.lock().clone()
  }

  pub fn on(&self, topic: Topic) -> Vec<OutboundMessage> {
    self
      .lock()
      .iter()
      .filter(|message| message.topic() == topic)
      .cloned()
      .collect()
  }

  pub fn len(&self) -> usize {
    self.lock().len()
  }

  pub fn is_empty(&self) -> bool {
    self.lock().is_empty()
  }
}

impl Publish for MemoryOutput {
  type Error = Infallible;

  fn publish(&self, message: &OutboundMessage) -> Result<(), Self::Error> {
    self.lock().push(message.clone());
    Ok(())
  }
}
