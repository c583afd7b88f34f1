// 该文件是 Jiema （解码） 项目的一部分。
// src/bin/pp_list.rs - 列出已注册的解码器
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
use serde_json::json;

use jiema::registry;

/// 列出全部已注册的后处理解码器
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
  /// 以 JSON 输出
  #[arg(long)]
  pub json: bool,
  /// 同时列出默认参数下的输入张量要求
  #[arg(long)]
  pub inputs: bool,
}

fn main() -> Result<()> {
  tracing_subscriber::fmt::init();

  let args = Args::parse();
  registry::init();

  let mut rows = Vec::new();
  for entry in registry::entries() {
    let inputs = if args.inputs {
      // 带锚框的家族没有默认参数，初始化失败时只列出名称
      match entry.builder().build() {
        Ok(mut decoder) => {
          let spec = decoder
            .input_spec()
            .iter()
            .map(|s| format!("{}:{:?}[{}]", s.name, s.dtype, s.len))
            .collect::<Vec<_>>();
          decoder.deinit();
          Some(spec)
        }
        Err(err) => {
          tracing::debug!("{}: {}", entry.name, err);
          None
        }
      }
    } else {
      None
    };
    rows.push((entry.name, entry.pp_type().as_str(), inputs));
  }

  if args.json {
    let value: Vec<_> = rows
      .iter()
      .map(|(name, pp_type, inputs)| json!({ "name": name, "type": pp_type, "inputs": inputs }))
      .collect();
    println!("{}", serde_json::to_string_pretty(&value)?);
  } else {
    for (name, pp_type, inputs) in &rows {
      match inputs {
        Some(inputs) => println!("{:<28} {:<5} {}", name, pp_type, inputs.join(" ")),
        None => println!("{:<28} {}", name, pp_type),
      }
    }
  }

  registry::deinit();
  Ok(())
}
