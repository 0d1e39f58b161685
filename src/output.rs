// 该文件是 Shanan Bridge（山南桥）项目的一部分。
// src/output.rs - 输出定义
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
use url::Url;

use crate::{FromUrl, FromUrlWithScheme, message::OutboundMessage};

/// 出站消息发布端，按消息类型发往对应通道
pub trait Publish {
  type Error;
  fn publish(&self, message: &OutboundMessage) -> Result<(), Self::Error>;
}

mod memory;
pub use self::memory::MemoryOutput;

mod stdout_output;
pub use self::stdout_output::{StdoutOutput, StdoutOutputError};

#[cfg(feature = "directory_record")]
mod directory_record;
#[cfg(feature = "directory_record")]
pub use self::directory_record::{DirectoryRecordOutput, DirectoryRecordOutputError};

#[derive(Error, Debug)]
pub enum OutputError {
  #[error("标准输出错误: {0}")]
  StdoutOutputError(#[from] StdoutOutputError),
  #[cfg(feature = "directory_record")]
  #[error("目录记录输出错误: {0}")]
  DirectoryRecordOutputError(#[from] DirectoryRecordOutputError),
  #[error("URI 方案不匹配")]
  SchemeMismatch,
}

pub enum OutputWrapper {
  Stdout(StdoutOutput),
  Memory(MemoryOutput),
  #[cfg(feature = "directory_record")]
  DirectoryRecordOutput(DirectoryRecordOutput),
}

impl FromUrl for OutputWrapper {
  type Error = OutputError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    match url.scheme() {
      StdoutOutput::SCHEME => {
        let output = StdoutOutput::from_url(url)?;
        Ok(OutputWrapper::Stdout(output))
      }
      #[cfg(feature = "directory_record")]
      DirectoryRecordOutput::SCHEME => {
        let output = DirectoryRecordOutput::from_url(url)?;
        Ok(OutputWrapper::DirectoryRecordOutput(output))
      }
      _ => Err(OutputError::SchemeMismatch),
    }
  }
}

impl Publish for OutputWrapper {
  type Error = OutputError;

  fn publish(&self, message: &OutboundMessage) -> Result<(), Self::Error> {
    match self {
      OutputWrapper::Stdout(output) => output.publish(message).map_err(OutputError::from),
      OutputWrapper::Memory(output) => match output.publish(message) {
        Ok(()) => Ok(()),
        Err(never) => match never {},
      },
      #[cfg(feature = "directory_record")]
      OutputWrapper::DirectoryRecordOutput(output) => {
        output.publish(message).map_err(OutputError::from)
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn selects_output_by_scheme() {
    let url = Url::parse("stdout:").unwrap();
    assert!(matches!(
      OutputWrapper::from_url(&url),
      Ok(OutputWrapper::Stdout(_))
    ));

    let url = Url::parse("rtsp://127.0.0.1:8554/live").unwrap();
    assert!(matches!(
      OutputWrapper::from_url(&url),
      Err(OutputError::SchemeMismatch)
    ));
  }
}
