// 该文件是 Shanan Bridge（山南桥）项目的一部分。
// src/output/stdout_output.rs - 标准输出 JSON 行输出
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

use std::io::Write;

use serde::Serialize;
use thiserror::Error;
use url::Url;

use crate::{FromUrl, FromUrlWithScheme, message::OutboundMessage, output::Publish};

#[derive(Error, Debug)]
pub enum StdoutOutputError {
  #[error("URI 方案不匹配")]
  SchemeMismatch,
  #[error("序列化错误: {0}")]
  SerializeError(#[from] serde_json::Error),
  #[error("I/O 错误: {0}")]
  IoError(#[from] std::io::Error),
}

/// 每条消息输出一行 `{"topic": ..., "message": ...}`
#[derive(Debug, Default)]
pub struct StdoutOutput;

impl FromUrlWithScheme for StdoutOutput {
  const SCHEME: &'static str = "stdout";
}

impl FromUrl for StdoutOutput {
  type Error = StdoutOutputError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    if url.scheme() != Self::SCHEME {
      return Err(StdoutOutputError::SchemeMismatch);
    }
    Ok(StdoutOutput)
  }
}

#[derive(Serialize)]
struct Line<'a> {
  topic: &'static str,
  message: &'a OutboundMessage,
}

pub(crate) fn json_line(message: &OutboundMessage) -> Result<String, serde_json::Error> {
  serde_json::to_string(&Line {
    topic: message.topic().name(),
    message,
  })
}

impl Publish for StdoutOutput {
  type Error = StdoutOutputError;

  fn publish(&self, message: &OutboundMessage) -> Result<(), Self::Error> {
    let line = json_line(message)?;
    let mut stdout = std::io::stdout().lock();
    writeln!(stdout, "{}", line)?;
    stdout.flush()?;
    Ok(())
  }
}
