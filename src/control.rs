// 该文件是 Shanan Bridge（山南桥）项目的一部分。
// src/control.rs - 控制通道
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

use std::io::BufRead;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tracing::{info, warn};

pub const SHUTDOWN_COMMAND: &str = "shutdown";

const FORCE_EXIT_AFTER: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControlCommand {
  Shutdown,
  Invalid(String),
}

impl ControlCommand {
  /// 只有完全等于 `shutdown` 的命令被识别
  pub fn parse(command: &str) -> Self {
    if command == SHUTDOWN_COMMAND {
      ControlCommand::Shutdown
    } else {
      ControlCommand::Invalid(command.to_string())
    }
  }
}

pub fn control_channel() -> (Sender<String>, Receiver<String>) {
  mpsc::channel()
}

/// 从标准输入逐行读取控制命令
pub fn spawn_stdin_reader(tx: Sender<String>) -> JoinHandle<()> {
  thread::spawn(move || {
    let stdin = std::io::stdin();
    for line in stdin.lock().lines() {
      let Ok(line) = line else {
        warn!("读取标准输入失败, 停止监听控制命令");
        break;
      };
      if tx.send(line.trim_end_matches('\r').to_string()).is_err() {
        break;
      }
    }
  })
}

/// Ctrl-C 转换为 shutdown 命令；若 30 秒内仍未退出则强制结束进程
pub fn install_interrupt_handler(tx: Sender<String>) -> Result<(), ctrlc::Error> {
  ctrlc::set_handler(move || {
    info!("收到中断信号，准备退出...");
    let _ = tx.send(SHUTDOWN_COMMAND.to_string());
    thread::spawn(|| {
      thread::sleep(FORCE_EXIT_AFTER);
      warn!("强制退出程序");
      std::process::exit(1);
    });
  })
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn only_exact_shutdown_is_recognized() {
    assert_eq!(ControlCommand::parse("shutdown"), ControlCommand::Shutdown);
    for other in ["Shutdown", "shutdown ", "stop", ""] {
      assert_eq!(
        ControlCommand::parse(other),
        ControlCommand::Invalid(other.to_string())
      );
    }
  }
}
