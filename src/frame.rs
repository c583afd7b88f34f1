// 该文件是 Jiema （解码） 项目的一部分。
// src/frame.rs - 离线回放的张量帧
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

use crate::tensor::{DType, RawTensor, TensorSpec};

#[derive(Error, Debug)]
pub enum FrameError {
  #[error("张量数量不匹配: 期望 {expected}, 实际 {actual}")]
  CountMismatch { expected: usize, actual: usize },
  #[error("张量 `{name}` 字节数 {bytes} 不是元素大小 {elem} 的整数倍")]
  Misaligned {
    name: &'static str,
    bytes: usize,
    elem: usize,
  },
}

/// 持有数据的张量，字节按小端解释
#[derive(Debug, Clone, PartialEq)]
pub enum OwnedTensor {
  F32(Vec<f32>),
  I8(Vec<i8>),
  U8(Vec<u8>),
}

fn elem_size(dtype: DType) -> usize {
  match dtype {
    DType::F32 => 4,
    DType::I8 | DType::U8 => 1,
  }
}

impl OwnedTensor {
  pub fn from_le_bytes(spec: &TensorSpec, bytes: &[u8]) -> Result<Self, FrameError> {
    let elem = elem_size(spec.dtype);
    if bytes.len() % elem != 0 {
      return Err(FrameError::Misaligned {
        name: spec.name,
        bytes: bytes.len(),
        elem,
      });
    }

    Ok(match spec.dtype {
      DType::F32 => OwnedTensor::F32(
        bytes
          .chunks_exact(4)
          .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
          .collect(),
      ),
      DType::I8 => OwnedTensor::I8(bytes.iter().map(|&b| b as i8).collect()),
      DType::U8 => OwnedTensor::U8(bytes.to_vec()),
    })
  }

  pub fn as_raw(&self) -> RawTensor<'_> {
    match self {
      OwnedTensor::F32(data) => RawTensor::F32(data),
      OwnedTensor::I8(data) => RawTensor::I8(data),
      OwnedTensor::U8(data) => RawTensor::U8(data),
    }
  }
}

/// 一次推理的全部输出，未解释的字节块
#[derive(Debug, Clone, Default)]
pub struct TensorFrame {
  blobs: Vec<Vec<u8>>,
}

impl From<Vec<Vec<u8>>> for TensorFrame {
  fn from(blobs: Vec<Vec<u8>>) -> Self {
    Self { blobs }
  }
}

impl TensorFrame {
  pub fn len(&self) -> usize {
    self.blobs.len()
  }

  pub fn is_empty(&self) -> bool {
    self.blobs.is_empty()
  }

  /// 按解码器的输入要求解释每个字节块
  pub fn bind(&self, spec: &[TensorSpec]) -> Result<Vec<OwnedTensor>, FrameError> {
    if spec.len() != self.blobs.len() {
      return Err(FrameError::CountMismatch {
        expected: spec.len(),
        actual: self.blobs.len(),
      });
    }
    spec
      .iter()
      .zip(&self.blobs)
      .map(|(spec, bytes)| OwnedTensor::from_le_bytes(spec, bytes))
      .collect()
  }
}
