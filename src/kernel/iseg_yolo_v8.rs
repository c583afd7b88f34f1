// 该文件是 Jiema （解码） 项目的一部分。
// src/kernel/iseg_yolo_v8.rs - YOLOv8 实例分割解码
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

use super::yolo_v8::ChannelMajor;
use super::{Candidate, DetectKernel};
use crate::error::KernelError;
use crate::mem::PoolVec;
use crate::tensor::{DType, Dequant, TensorSpec};

/// 两个输入：检测 `[4 + nc + nm][N]` 与原型掩码 `[ms][ms][nm]`
///
/// 每个目标的掩码为系数与原型的线性组合，sigmoid 大于 0.5（即线性和大于 0）
/// 且像素中心落在框内时置 1。
#[derive(Debug, Clone)]
pub struct IsegYoloV8 {
  layout: ChannelMajor,
  mask_size: usize,
  nb_masks: usize,
  inputs: [TensorSpec; 2],
}

impl IsegYoloV8 {
  pub fn new(nb_classes: usize, total_boxes: usize, mask_size: usize, nb_masks: usize) -> Self {
    let layout = ChannelMajor {
      nb_classes,
      total_boxes,
      extra_channels: nb_masks,
    };
    Self {
      layout,
      mask_size,
      nb_masks,
      inputs: [
        TensorSpec {
          name: "detections",
          dtype: DType::I8,
          len: layout.tensor_len(),
        },
        TensorSpec {
          name: "prototypes",
          dtype: DType::I8,
          len: mask_size * mask_size * nb_masks,
        },
      ],
    }
  }
}

impl DetectKernel for IsegYoloV8 {
  fn input_spec(&self) -> &[TensorSpec] {
    &self.inputs
  }

  fn max_candidates(&self) -> usize {
    self.layout.total_boxes
  }

  fn decode(
    &self,
    inputs: &[Dequant<'_>],
    conf_threshold: f32,
    out: &mut PoolVec<Candidate>,
  ) -> Result<(), KernelError> {
    inputs[1].require(1, self.inputs[1].len)?;
    self.layout.decode(&inputs[0], conf_threshold, out)
  }

  fn mask_size(&self) -> usize {
    self.mask_size
  }

  fn mask(&self, inputs: &[Dequant<'_>], cand: &Candidate, out: &mut [u8]) {
    let (detections, prototypes) = (&inputs[0], &inputs[1]);
    let first = 4 + self.layout.nb_classes;
    let ms = self.mask_size as f32;

    let x_min = cand.x_center - cand.width / 2.0;
    let x_max = cand.x_center + cand.width / 2.0;
    let y_min = cand.y_center - cand.height / 2.0;
    let y_max = cand.y_center + cand.height / 2.0;

    for (p, pixel) in out.iter_mut().enumerate().take(self.mask_size * self.mask_size) {
      let row = p / self.mask_size;
      let col = p % self.mask_size;
      let px = (col as f32 + 0.5) / ms;
      let py = (row as f32 + 0.5) / ms;
      if px < x_min || px > x_max || py < y_min || py > y_max {
        *pixel = 0;
        continue;
      }

      let sum: f32 = (0..self.nb_masks)
        .map(|m| {
          self.layout.at(detections, first + m, cand.source) * prototypes.get(p * self.nb_masks + m)
        })
        .sum();
      *pixel = (sum > 0.0) as u8;
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::tensor::{Quantization, RawTensor};

  #[test]
  fn mask_is_cropped_to_box() {
    let kernel = IsegYoloV8::new(1, 1, 2, 1);
    // xc, yc, w, h, class, coeff
    let detections: [i8; 6] = [25, 50, 50, 100, 100, 10];
    let prototypes: [i8; 4] = [5, 5, -5, 5];
    let quant = Quantization::new(0.01, 0);
    let inputs = [
      Dequant::new(RawTensor::from(&detections[..]), quant),
      Dequant::new(RawTensor::from(&prototypes[..]), quant),
    ];
    let cand = Candidate {
      x_center: 0.25,
      y_center: 0.5,
      width: 0.5,
      height: 1.0,
      conf: 1.0,
      class_index: 0,
      source: 0,
    };

    let mut mask = [9u8; 4];
    kernel.mask(&inputs, &cand, &mut mask);
    // 右列在框外；左下像素原型为负
    assert_eq!(mask, [1, 0, 0, 0]);
  }
}
