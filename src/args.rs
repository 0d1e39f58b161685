// 该文件是 Shanan Bridge（山南桥）项目的一部分。
// src/args.rs - 项目参数配置
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

use clap::Parser;
use url::Url;

/// Shanan Bridge 参数配置
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
  /// 推理引擎
  /// 支持格式:
  /// - 回放脚本: replay:///path/to/script.json
  #[arg(long, value_name = "ENGINE")]
  pub engine: Url,

  /// 输入来源
  /// 支持格式:
  /// - 单张图片: image:///path/to/frame.png
  /// - 图片目录: folder:///path/to/frames
  #[arg(long, value_name = "SOURCE")]
  pub input: Url,

  /// 输出路径
  /// 支持格式:
  /// - 目录记录: folder:///path/to/records
  /// - 标准输出: stdout:
  #[arg(long, value_name = "OUTPUT", default_value = "stdout:")]
  pub output: Url,

  /// 精度等级: 1 分类, 2 检测, 3 检测加分割掩码
  #[arg(long, value_name = "LEVEL", default_value = "2", allow_negative_numbers = true)]
  pub precision: i64,

  /// 输出可视化图像而非结构化检测结果（仅对等级 2、3 有效）
  #[arg(long)]
  pub visualize: bool,

  /// 最大处理帧数，不指定表示不限制
  #[arg(long, value_name = "FRAME_NUMBER")]
  pub frame_number: Option<usize>,

  /// 不从标准输入读取控制命令
  #[arg(long)]
  pub no_stdin_control: bool,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn parses_full_command_line() {
    let args = Args::try_parse_from([
      "shanan-bridge",
      "--engine",
      "replay:///tmp/script.json",
      "--input",
      "folder:///tmp/frames",
      "--precision",
      "3",
      "--visualize",
      "--frame-number",
      "10",
    ])
    .unwrap();

    assert_eq!(args.engine.scheme(), "replay");
    assert_eq!(args.output.scheme(), "stdout");
    assert_eq!(args.precision, 3);
    assert!(args.visualize);
    assert_eq!(args.frame_number, Some(10));
    assert!(!args.no_stdin_control);
  }
}
