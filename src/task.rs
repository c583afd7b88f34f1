// 该文件是 Jiema （解码） 项目的一部分。
// src/task.rs - 离线回放任务
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

use std::time::{Duration, Instant};

use tracing::{info, warn};

use crate::frame::{OwnedTensor, TensorFrame};
use crate::model::Decoder;
use crate::output::Render;
use crate::result::PpResult;
use crate::tensor::RawTensor;

pub trait Task<I, O>: Sized {
  type Error;
  fn run_task(self, input: I, decoder: &mut dyn Decoder, output: O) -> Result<(), Self::Error>;
}

fn next_frame<I: Iterator<Item = TensorFrame>>(
  input: &mut I,
  decoder: &dyn Decoder,
) -> anyhow::Result<(TensorFrame, Vec<OwnedTensor>)> {
  let frame = input.next().ok_or_else(|| anyhow::anyhow!("没有输入帧"))?;
  let tensors = frame.bind(decoder.input_spec())?;
  Ok((frame, tensors))
}

pub struct OneShotTask;

impl<RE, I, O> Task<I, O> for OneShotTask
where
  RE: std::error::Error + Sync + Send + 'static,
  I: Iterator<Item = TensorFrame>,
  O: Render<TensorFrame, PpResult, Error = RE>,
{
  type Error = anyhow::Error;

  fn run_task(self, mut input: I, decoder: &mut dyn Decoder, output: O) -> Result<(), Self::Error> {
    info!("开始任务...");
    let (frame, tensors) = next_frame(&mut input, decoder)?;
    let raw: Vec<RawTensor<'_>> = tensors.iter().map(OwnedTensor::as_raw).collect();
    info!("输入帧获取成功，开始解码...");
    let now = Instant::now();
    let result = decoder.run(&raw)?;
    let elapsed = now.elapsed();
    info!("解码完成，耗时: {:.2?}", elapsed);
    output.render_result(&frame, result)?;

    Ok(())
  }
}

/// 同一帧反复解码，统计平均耗时（跳过前两次预热）
pub struct RepeatShotTask {
  pub times: usize,
}

impl Default for RepeatShotTask {
  fn default() -> Self {
    Self { times: 1000 }
  }
}

impl<RE, I, O> Task<I, O> for RepeatShotTask
where
  RE: std::error::Error + Sync + Send + 'static,
  I: Iterator<Item = TensorFrame>,
  O: Render<TensorFrame, PpResult, Error = RE>,
{
  type Error = anyhow::Error;

  fn run_task(self, mut input: I, decoder: &mut dyn Decoder, output: O) -> Result<(), Self::Error> {
    const WARMUP: usize = 2;

    info!("开始任务...");
    let (frame, tensors) = next_frame(&mut input, decoder)?;
    let raw: Vec<RawTensor<'_>> = tensors.iter().map(OwnedTensor::as_raw).collect();
    info!("输入帧获取成功，重复解码 {} 次...", self.times);
    let mut times = Vec::with_capacity(self.times);
    for i in 0..self.times {
      let now = Instant::now();
      let result = decoder.run(&raw)?;
      let elapsed = now.elapsed();
      info!("({})解码完成，耗时: {:.2?}, 数量 {}", i, elapsed, result.nb_detect());
      if i + 1 == self.times {
        output.render_result(&frame, result)?;
      }
      times.push(elapsed);
    }

    if times.len() > WARMUP {
      warn!(
        "平均解码时间: {:.2?}",
        times.iter().skip(WARMUP).sum::<Duration>() / (times.len() - WARMUP) as u32
      );
    }

    Ok(())
  }
}
