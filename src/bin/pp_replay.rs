// 该文件是 Jiema （解码） 项目的一部分。
// src/bin/pp_replay.rs - 离线回放模型原始输出
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

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use url::Url;

use jiema::{
  BufferPool, DecoderBuilder, FromUrl, Quantization, StaticRuntime,
  input::TensorFileInput,
  output::OutputWrapper,
  registry,
  task::{OneShotTask, RepeatShotTask, Task},
};

fn parse_quantization(s: &str) -> Result<Quantization, String> {
  let (scale, zero_point) = s
    .split_once(',')
    .ok_or_else(|| format!("量化参数格式应为 SCALE,ZERO_POINT: {}", s))?;
  let scale = scale.trim().parse::<f32>().map_err(|e| e.to_string())?;
  let zero_point = zero_point.trim().parse::<i32>().map_err(|e| e.to_string())?;
  Ok(Quantization::new(scale, zero_point))
}

/// Jiema 离线回放参数
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
  /// 解码器地址，例如 pp://pp_od_yolo_v2_uf
  #[arg(long, value_name = "DECODER")]
  pub decoder: Url,
  /// JSON 参数文件
  #[arg(long, value_name = "CONFIG")]
  pub config: Option<PathBuf>,
  /// 输入来源，例如 tensor:///tmp/frame
  #[arg(long, value_name = "SOURCE")]
  pub input: Url,
  /// 输出，log:// 或 jsonl:///tmp/out.jsonl
  #[arg(long, value_name = "OUTPUT", default_value = "log://")]
  pub output: Url,
  /// 每个输出张量的量化参数，按顺序给出
  #[arg(long, value_name = "SCALE,ZERO_POINT", value_parser = parse_quantization)]
  pub quant: Vec<Quantization>,
  /// 内存池容量（字节），缺省不限
  #[arg(long, value_name = "BYTES")]
  pub pool: Option<usize>,
  /// 重复解码次数，用于测量耗时
  #[arg(long, value_name = "TIMES")]
  pub repeat: Option<usize>,
  /// 覆盖置信度阈值
  #[arg(long)]
  pub confidence: Option<f32>,
  /// 覆盖 NMS 阈值
  #[arg(long)]
  pub nms: Option<f32>,
}

fn main() -> Result<()> {
  tracing_subscriber::fmt::init();

  let args = Args::parse();

  info!("解码器: {}", args.decoder);
  info!("输入来源: {}", args.input);
  info!("输出: {}", args.output);

  registry::init();

  let runtime = StaticRuntime::new(args.quant.iter().copied());
  let pool = match args.pool {
    Some(bytes) => BufferPool::with_capacity(bytes),
    None => BufferPool::unbounded(),
  };

  let mut builder = DecoderBuilder::from_url(&args.decoder)?
    .pool(pool.clone())
    .runtime(&runtime);
  if let Some(path) = &args.config {
    let json = std::fs::read_to_string(path)
      .with_context(|| format!("读取参数文件失败: {}", path.display()))?;
    builder = builder.config(&json);
  }
  let mut decoder = builder.build()?;

  if let Some(threshold) = args.confidence {
    decoder.set_confidence_threshold(threshold);
  }
  if let Some(threshold) = args.nms {
    decoder.set_nms_threshold(threshold);
  }
  info!(
    "阈值: 置信度 {}, NMS {}",
    decoder.confidence_threshold(),
    decoder.nms_threshold()
  );

  let input = TensorFileInput::from_url(&args.input)?;
  let output = OutputWrapper::from_url(&args.output)?;

  match args.repeat {
    Some(times) => RepeatShotTask { times }.run_task(input, decoder.as_mut(), output)?,
    None => OneShotTask.run_task(input, decoder.as_mut(), output)?,
  }

  decoder.deinit();
  info!("内存池: {:?}", pool.stats());
  registry::deinit();

  Ok(())
}
