// 该文件是 Jiema （解码） 项目的一部分。
// src/kernel/st_yolox.rs - ST YOLOX 三尺度解码
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

use super::yolo_v2::{ClassActivation, GridScale};
use super::{Candidate, DetectKernel};
use crate::error::KernelError;
use crate::mem::PoolVec;
use crate::tensor::{DType, Dequant, TensorSpec};

/// 输入张量顺序为 small, large, medium
#[derive(Debug, Clone)]
pub struct StYolox {
  nb_classes: usize,
  large: GridScale,
  medium: GridScale,
  small: GridScale,
  inputs: [TensorSpec; 3],
}

impl StYolox {
  pub fn new(nb_classes: usize, large: GridScale, medium: GridScale, small: GridScale) -> Self {
    let spec = |name, scale: &GridScale| TensorSpec {
      name,
      dtype: DType::F32,
      len: scale.tensor_len(nb_classes),
    };
    let inputs = [
      spec("small", &small),
      spec("large", &large),
      spec("medium", &medium),
    ];
    Self {
      nb_classes,
      large,
      medium,
      small,
      inputs,
    }
  }
}

impl DetectKernel for StYolox {
  fn input_spec(&self) -> &[TensorSpec] {
    &self.inputs
  }

  fn max_candidates(&self) -> usize {
    self.large.nb_boxes() + self.medium.nb_boxes() + self.small.nb_boxes()
  }

  fn decode(
    &self,
    inputs: &[Dequant<'_>],
    conf_threshold: f32,
    out: &mut PoolVec<Candidate>,
  ) -> Result<(), KernelError> {
    let order = [
      (1, &self.large),
      (2, &self.medium),
      (0, &self.small),
    ];
    let mut offset = 0;
    for (index, scale) in order {
      scale.decode(
        index,
        &inputs[index],
        self.nb_classes,
        ClassActivation::Sigmoid,
        conf_threshold,
        offset,
        out,
      )?;
      offset += scale.nb_boxes();
    }
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::mem::BufferPool;

  fn scale(grid: usize) -> GridScale {
    GridScale {
      grid_width: grid,
      grid_height: grid,
      anchors: vec![1.0, 1.0],
    }
  }

  #[test]
  fn all_three_scales_are_decoded() {
    let kernel = StYolox::new(1, scale(2), scale(1), scale(1));
    assert_eq!(kernel.max_candidates(), 6);

    let hit = |len: usize| {
      let mut raw = vec![-20.0f32; len];
      raw[0] = 0.0;
      raw[1] = 0.0;
      raw[2] = 0.0;
      raw[3] = 0.0;
      raw[4] = 20.0;
      raw[5] = 20.0;
      raw
    };
    let small = hit(6);
    let large = hit(24);
    let medium = vec![-20.0f32; 6];

    let pool = BufferPool::unbounded();
    let mut out = pool.slots(kernel.max_candidates(), 0, |_| Candidate::default()).unwrap();
    kernel
      .decode(
        &[Dequant::float(&small), Dequant::float(&large), Dequant::float(&medium)],
        0.6,
        &mut out,
      )
      .unwrap();

    assert_eq!(out.len(), 2);
    assert_eq!(out[0].source, 0);
    assert_eq!(out[1].source, 5);
    assert!((out[0].width - 0.5).abs() < 1e-6);
    assert!((out[1].width - 1.0).abs() < 1e-6);
  }
}
