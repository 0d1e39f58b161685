// 该文件是 Shanan Bridge（山南桥）项目的一部分。
// src/main.rs - 桥接节点主程序
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

mod args;

use anyhow::Result;
use clap::Parser;
use tracing::info;

use shanan_bridge::{
  Bridge, FromUrl,
  control::{control_channel, install_interrupt_handler, spawn_stdin_reader},
  engine::{EngineWrapper, Precision},
  input::InputWrapper,
  message::Topic,
  output::OutputWrapper,
};

fn main() -> Result<()> {
  tracing_subscriber::fmt::init();

  let args = args::Args::parse();

  info!("推理引擎: {}", args.engine);
  info!("输入来源: {}", args.input);
  info!("输出路径: {}", args.output);

  let precision = Precision::try_from(args.precision)?;
  let engine = EngineWrapper::from_url(&args.engine)?;
  let input = InputWrapper::from_url(&args.input)?;
  let output = OutputWrapper::from_url(&args.output)?;

  let (tx, rx) = control_channel();
  install_interrupt_handler(tx.clone())?;
  if !args.no_stdin_control {
    info!("从标准输入监听 {} 控制命令", Topic::StateInput);
    spawn_stdin_reader(tx);
  }

  let summary = Bridge::new(engine, precision, args.visualize, output)
    .with_frame_number(args.frame_number)
    .run(input, &rx)?;

  info!("退出原因: {:?}", summary.stop);
  Ok(())
}
