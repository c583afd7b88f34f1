// 该文件是 Jiema （解码） 项目的一部分。
// src/kernel/yolo_v5.rs - YOLOv5 中心点解码
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

use super::{Candidate, DetectKernel, argmax};
use crate::error::KernelError;
use crate::mem::PoolVec;
use crate::tensor::{DType, Dequant, TensorSpec};

/// 输出布局 `[N][5 + nc]`：`xc, yc, w, h, objectness, class scores...`，
/// 坐标已归一化，分数已是概率
#[derive(Debug, Clone)]
pub struct YoloV5 {
  nb_classes: usize,
  total_boxes: usize,
  inputs: [TensorSpec; 1],
}

impl YoloV5 {
  pub fn new(nb_classes: usize, total_boxes: usize, dtype: DType) -> Self {
    Self {
      nb_classes,
      total_boxes,
      inputs: [TensorSpec {
        name: "detections",
        dtype,
        len: total_boxes * (5 + nb_classes),
      }],
    }
  }
}

impl DetectKernel for YoloV5 {
  fn input_spec(&self) -> &[TensorSpec] {
    &self.inputs
  }

  fn max_candidates(&self) -> usize {
    self.total_boxes
  }

  fn decode(
    &self,
    inputs: &[Dequant<'_>],
    conf_threshold: f32,
    out: &mut PoolVec<Candidate>,
  ) -> Result<(), KernelError> {
    let input = &inputs[0];
    let stride = 5 + self.nb_classes;
    input.require(0, self.total_boxes * stride)?;

    for i in 0..self.total_boxes {
      let base = i * stride;
      let objectness = input.get(base + 4);
      if objectness < conf_threshold {
        continue;
      }

      let (class_index, class_score) = argmax(self.nb_classes, |c| input.get(base + 5 + c));
      let conf = objectness * class_score;
      if conf < conf_threshold {
        continue;
      }

      let pushed = out.push(Candidate {
        x_center: input.get(base),
        y_center: input.get(base + 1),
        width: input.get(base + 2),
        height: input.get(base + 3),
        conf,
        class_index: class_index as i32,
        source: i,
      });
      if !pushed {
        break;
      }
    }
    Ok(())
  }
}
