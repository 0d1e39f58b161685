// 该文件是 Shanan Bridge（山南桥）项目的一部分。
// src/bin/simple_oneshot.rs - 单帧推理测试代码
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

use anyhow::Result;
use clap::Parser;
use url::Url;

use shanan_bridge::{
  Bridge, FromUrl, Processed,
  engine::{EngineWrapper, Precision},
  input::ImageFileInput,
  output::StdoutOutput,
};
use tracing::info;

/// 对单张图片执行一次推理，结果以 JSON 行输出到标准输出
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
  /// 推理引擎
  #[arg(long, value_name = "ENGINE")]
  pub engine: Url,
  /// 输入图片
  #[arg(long, value_name = "SOURCE")]
  pub input: Url,
  /// 精度等级
  #[arg(long, value_name = "LEVEL", default_value = "2")]
  pub precision: i64,
  #[arg(long)]
  pub visualize: bool,
}

fn main() -> Result<()> {
  tracing_subscriber::fmt::init();

  let args = Args::parse();

  info!("推理引擎: {}", args.engine);
  info!("输入来源: {}", args.input);

  let precision = Precision::try_from(args.precision)?;
  let engine = EngineWrapper::from_url(&args.engine)?;
  let mut input = ImageFileInput::from_url(&args.input)?;
  let image = input
    .next()
    .ok_or_else(|| anyhow::anyhow!("没有输入帧"))?;

  let mut bridge = Bridge::new(engine, precision, args.visualize, StdoutOutput);
  let now = std::time::Instant::now();
  match bridge.process(&image)? {
    Processed::Published(topic) => info!("结果已发布到 {}, 耗时: {:.2?}", topic, now.elapsed()),
    Processed::Discarded => info!("输入图像为空"),
  }

  Ok(())
}
