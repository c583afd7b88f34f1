// 该文件是 Jiema （解码） 项目的一部分。
// src/tensor.rs - 原始输出张量与量化参数
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

use crate::error::KernelError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DType {
  F32,
  I8,
  U8,
}

/// 推理运行时输出的一块原始张量（借用）
#[derive(Debug, Clone, Copy)]
pub enum RawTensor<'a> {
  F32(&'a [f32]),
  I8(&'a [i8]),
  U8(&'a [u8]),
}

impl RawTensor<'_> {
  pub fn dtype(&self) -> DType {
    match self {
      RawTensor::F32(_) => DType::F32,
      RawTensor::I8(_) => DType::I8,
      RawTensor::U8(_) => DType::U8,
    }
  }

  pub fn len(&self) -> usize {
    match self {
      RawTensor::F32(data) => data.len(),
      RawTensor::I8(data) => data.len(),
      RawTensor::U8(data) => data.len(),
    }
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }
}

impl<'a> From<&'a [f32]> for RawTensor<'a> {
  fn from(data: &'a [f32]) -> Self {
    RawTensor::F32(data)
  }
}

impl<'a> From<&'a [i8]> for RawTensor<'a> {
  fn from(data: &'a [i8]) -> Self {
    RawTensor::I8(data)
  }
}

impl<'a> From<&'a [u8]> for RawTensor<'a> {
  fn from(data: &'a [u8]) -> Self {
    RawTensor::U8(data)
  }
}

/// 解码器对某个输入张量的要求
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TensorSpec {
  pub name: &'static str,
  pub dtype: DType,
  pub len: usize,
}

/// 整数张量的量化参数: real = (q - zero_point) * scale
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quantization {
  pub scale: f32,
  pub zero_point: i32,
}

impl Quantization {
  pub const fn new(scale: f32, zero_point: i32) -> Self {
    Self { scale, zero_point }
  }

  /// 配置中的 `raw_output_scale` / `raw_output_zero_point` 覆盖
  pub(crate) fn override_from(&mut self, cfg: &crate::config::PpConfig) {
    cfg.override_f32("raw_output_scale", &mut self.scale);
    if let Some(zp) = cfg.i32("raw_output_zero_point") {
      self.zero_point = zp;
    }
  }
}

impl Default for Quantization {
  fn default() -> Self {
    Self::new(1.0 / 255.0, 0)
  }
}

/// 推理运行时接口：提供每个输出张量的量化参数
pub trait NnRuntime {
  fn output_quantization(&self, index: usize) -> Option<Quantization>;
}

/// 固定量化参数表，多用于测试与离线回放
#[derive(Debug, Clone, Default)]
pub struct StaticRuntime {
  pub outputs: Vec<Option<Quantization>>,
}

impl StaticRuntime {
  pub fn new(outputs: impl IntoIterator<Item = Quantization>) -> Self {
    Self {
      outputs: outputs.into_iter().map(Some).collect(),
    }
  }
}

impl NnRuntime for StaticRuntime {
  fn output_quantization(&self, index: usize) -> Option<Quantization> {
    self.outputs.get(index).copied().flatten()
  }
}

/// 按实数读取的张量视图，整数张量按量化参数反量化
#[derive(Debug, Clone, Copy)]
pub struct Dequant<'a> {
  tensor: RawTensor<'a>,
  quant: Quantization,
}

impl<'a> Dequant<'a> {
  pub fn new(tensor: RawTensor<'a>, quant: Quantization) -> Self {
    Self { tensor, quant }
  }

  pub fn float(data: &'a [f32]) -> Self {
    Self::new(RawTensor::F32(data), Quantization::new(1.0, 0))
  }

  pub fn len(&self) -> usize {
    self.tensor.len()
  }

  pub fn is_empty(&self) -> bool {
    self.tensor.is_empty()
  }

  /// 检查长度，不足时返回内核错误
  pub fn require(&self, index: usize, expected: usize) -> Result<(), KernelError> {
    if self.len() < expected {
      return Err(KernelError::ShortInput {
        index,
        expected,
        actual: self.len(),
      });
    }
    Ok(())
  }

  #[inline]
  pub fn get(&self, i: usize) -> f32 {
    let Quantization { scale, zero_point } = self.quant;
    match self.tensor {
      RawTensor::F32(data) => data[i],
      RawTensor::I8(data) => (data[i] as i32 - zero_point) as f32 * scale,
      RawTensor::U8(data) => (data[i] as i32 - zero_point) as f32 * scale,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn dequantizes_integer_tensors() {
    let raw: [u8; 2] = [128, 255];
    let view = Dequant::new(RawTensor::from(&raw[..]), Quantization::new(0.5, 128));
    assert_eq!(view.get(0), 0.0);
    assert_eq!(view.get(1), 63.5);

    let raw: [i8; 2] = [-128, 127];
    let view = Dequant::new(RawTensor::from(&raw[..]), Quantization::new(1.0, -128));
    assert_eq!(view.get(0), 0.0);
    assert_eq!(view.get(1), 255.0);
  }

  #[test]
  fn float_tensors_ignore_quantization() {
    let raw = [1.5f32];
    let view = Dequant::new(RawTensor::from(&raw[..]), Quantization::new(9.0, 3));
    assert_eq!(view.get(0), 1.5);
  }

  #[test]
  fn require_reports_short_input() {
    let raw = [0.0f32; 3];
    let view = Dequant::float(&raw);
    assert!(view.require(0, 3).is_ok());
    assert_eq!(
      view.require(2, 4),
      Err(KernelError::ShortInput {
        index: 2,
        expected: 4,
        actual: 3
      })
    );
  }
}
