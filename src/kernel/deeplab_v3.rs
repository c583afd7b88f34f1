// 该文件是 Jiema （解码） 项目的一部分。
// src/kernel/deeplab_v3.rs - DeepLabV3 逐像素分类
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
use crate::kernel::argmax;
use crate::mem::PoolVec;
use crate::tensor::{DType, Dequant, TensorSpec};

#[derive(Debug, Clone)]
pub struct DeepLabV3 {
  width: usize,
  height: usize,
  nb_classes: usize,
  inputs: [TensorSpec; 1],
}

impl DeepLabV3 {
  pub fn new(width: usize, height: usize, nb_classes: usize) -> Self {
    Self {
      width,
      height,
      nb_classes,
      inputs: [TensorSpec {
        name: "logits",
        dtype: DType::F32,
        len: width * height * nb_classes,
      }],
    }
  }

  pub fn input_spec(&self) -> &[TensorSpec] {
    &self.inputs
  }

  pub fn pixels(&self) -> usize {
    self.width * self.height
  }

  /// logits 布局 `[h][w][nc]`，输出行优先的类别图
  pub fn decode(&self, input: &Dequant<'_>, out: &mut PoolVec<u8>) -> Result<(), KernelError> {
    input.require(0, self.inputs[0].len)?;

    let len = out.activate(self.pixels());
    for (p, class) in out.as_mut_slice().iter_mut().enumerate().take(len) {
      let base = p * self.nb_classes;
      let (idx, _) = argmax(self.nb_classes, |c| input.get(base + c));
      *class = idx.min(u8::MAX as usize) as u8;
    }
    Ok(())
  }
}
