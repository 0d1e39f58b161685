// 该文件是 Shanan Bridge（山南桥）项目的一部分。
// src/output/directory_record.rs - 目录记录输出
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

use std::collections::HashMap;
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use thiserror::Error;
use tracing::debug;

use crate::{
  FromUrl, FromUrlWithScheme,
  frame::{DecodeError, Frame},
  message::{OutboundMessage, Topic},
  output::Publish,
};

#[derive(Error, Debug)]
pub enum DirectoryRecordOutputError {
  #[error("URI 方案不匹配")]
  SchemeMismatch,
  #[error("图像错误: {0}")]
  ImageError(#[from] image::ImageError),
  #[error("可视化图像解码错误: {0}")]
  DecodeError(#[from] DecodeError),
  #[error("序列化错误: {0}")]
  SerializeError(#[from] serde_json::Error),
  #[error("I/O 错误: {0}")]
  IoError(#[from] std::io::Error),
}

/// 每条消息写入 `<目录>/<通道名>/` 下的一个文件：
/// 可视化图像保存为 PNG，结构化消息保存为 JSON
pub struct DirectoryRecordOutput {
  directory: PathBuf,
  counters: Arc<Mutex<HashMap<Topic, u64>>>,
}

impl FromUrlWithScheme for DirectoryRecordOutput {
  const SCHEME: &'static str = "folder";
}

impl FromUrl for DirectoryRecordOutput {
  type Error = DirectoryRecordOutputError;

  fn from_url(uri: &url::Url) -> Result<Self, Self::Error> {
    if uri.scheme() != Self::SCHEME {
      return Err(DirectoryRecordOutputError::SchemeMismatch);
    }

    Ok(Self::new(uri.path()))
  }
}

impl DirectoryRecordOutput {
  pub fn new(directory: impl AsRef<Path>) -> Self {
    Self {
      directory: directory.as_ref().to_path_buf(),
      counters: Arc::new(Mutex::new(HashMap::new())),
    }
  }

  fn sequence(&self, topic: Topic) -> u64 {
    let mut counters = self.counters.lock().unwrap_or_else(PoisonError::into_inner);
    let counter = counters.entry(topic).or_insert(0);
    *counter += 1;
    *counter
  }

  /// 通道名形如 `/processor/output`，去掉开头的 `/` 作为相对路径
  pub fn topic_directory(&self, topic: Topic) -> PathBuf {
    self.directory.join(topic.name().trim_start_matches('/'))
  }

  fn message_path(&self, topic: Topic, extension: &str) -> Result<PathBuf, std::io::Error> {
    let directory = self.topic_directory(topic);
    if !directory.exists() {
      std::fs::create_dir_all(&directory)?;
    }
    Ok(directory.join(format!("{:06}.{}", self.sequence(topic), extension)))
  }
}

impl Publish for DirectoryRecordOutput {
  type Error = DirectoryRecordOutputError;

  fn publish(&self, message: &OutboundMessage) -> Result<(), Self::Error> {
    let topic = message.topic();
    match message {
      OutboundMessage::Visualization(image) => {
        let path = self.message_path(topic, "png")?;
        Frame::decode(image)?.to_rgb_image().save(&path)?;
        debug!("保存可视化图像: {}", path.display());
      }
      _ => {
        let path = self.message_path(topic, "json")?;
        let writer = BufWriter::new(File::create(&path)?);
        serde_json::to_writer_pretty(writer, message)?;
        debug!("保存消息: {}", path.display());
      }
    }
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{
    frame::{Header, WireImage},
    message::{ObjectDetection, RegionOfInterest},
  };

  #[test]
  fn writes_each_message_under_its_topic() {
    let dir = std::env::temp_dir().join(format!("shanan-bridge-record-{}", std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);
    let output = DirectoryRecordOutput::new(&dir);

    let detection = OutboundMessage::Detection(ObjectDetection {
      header: Header::default(),
      class_indices: vec![4],
      scores: vec![0.9],
      bboxes: vec![RegionOfInterest {
        x_offset: 10,
        y_offset: 10,
        width: 40,
        height: 50,
        do_rectify: false,
      }],
      masks: Vec::new(),
    });
    output.publish(&detection).unwrap();
    output.publish(&detection).unwrap();
    output
      .publish(&OutboundMessage::Visualization(WireImage::from_frame(
        &Frame::blank(2, 2),
        Header::default(),
      )))
      .unwrap();

    let p2 = dir.join("processor/epd_p2_output");
    assert!(p2.join("000001.json").is_file());
    assert!(p2.join("000002.json").is_file());
    assert!(dir.join("processor/output/000001.png").is_file());

    let saved: serde_json::Value =
      serde_json::from_reader(File::open(p2.join("000001.json")).unwrap()).unwrap();
    assert_eq!(saved["class_indices"][0], 4);
    assert_eq!(saved["bboxes"][0]["width"], 40);

    std::fs::remove_dir_all(&dir).unwrap();
  }
}
