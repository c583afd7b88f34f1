// 该文件是 Jiema （解码） 项目的一部分。
// src/kernel/ssd.rs - SSD 锚框偏移解码
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

const CENTER_VARIANCE: f32 = 10.0;
const SIZE_VARIANCE: f32 = 5.0;

/// 三个输入：类别概率 `[N][nc]`（0 号类别为背景）、框偏移 `[N][4]`、锚框 `[N][4]`，
/// 锚框为归一化的 `xc, yc, w, h`
#[derive(Debug, Clone)]
pub struct Ssd {
  nb_classes: usize,
  total_boxes: usize,
  inputs: [TensorSpec; 3],
}

impl Ssd {
  pub fn new(nb_classes: usize, total_boxes: usize) -> Self {
    let spec = |name, len| TensorSpec {
      name,
      dtype: DType::F32,
      len,
    };
    Self {
      nb_classes,
      total_boxes,
      inputs: [
        spec("scores", total_boxes * nb_classes),
        spec("boxes", total_boxes * 4),
        spec("anchors", total_boxes * 4),
      ],
    }
  }
}

impl DetectKernel for Ssd {
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
    let (scores, boxes, anchors) = (&inputs[0], &inputs[1], &inputs[2]);
    for (index, spec) in self.inputs.iter().enumerate() {
      inputs[index].require(index, spec.len)?;
    }

    for i in 0..self.total_boxes {
      let base = i * self.nb_classes;
      // 跳过背景类别
      let (idx, conf) = argmax(self.nb_classes.saturating_sub(1), |c| scores.get(base + 1 + c));
      if conf < conf_threshold {
        continue;
      }

      let (ax, ay, aw, ah) = (
        anchors.get(4 * i),
        anchors.get(4 * i + 1),
        anchors.get(4 * i + 2),
        anchors.get(4 * i + 3),
      );
      let pushed = out.push(Candidate {
        x_center: ax + boxes.get(4 * i) / CENTER_VARIANCE * aw,
        y_center: ay + boxes.get(4 * i + 1) / CENTER_VARIANCE * ah,
        width: aw * (boxes.get(4 * i + 2) / SIZE_VARIANCE).exp(),
        height: ah * (boxes.get(4 * i + 3) / SIZE_VARIANCE).exp(),
        conf,
        class_index: (idx + 1) as i32,
        source: i,
      });
      if !pushed {
        break;
      }
    }
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::mem::BufferPool;

  #[test]
  fn background_is_never_reported() {
    let kernel = Ssd::new(3, 2);
    let scores = [0.9, 0.05, 0.05, 0.1, 0.2, 0.7];
    let boxes = [0.0f32; 8];
    let anchors = [0.5, 0.5, 0.2, 0.2, 0.3, 0.3, 0.4, 0.4];

    let pool = BufferPool::unbounded();
    let mut out = pool.slots(kernel.max_candidates(), 0, |_| Candidate::default()).unwrap();
    kernel
      .decode(
        &[Dequant::float(&scores), Dequant::float(&boxes), Dequant::float(&anchors)],
        0.5,
        &mut out,
      )
      .unwrap();

    assert_eq!(out.len(), 1);
    assert_eq!(out[0].class_index, 2);
    assert_eq!(out[0].source, 1);
    assert_eq!(out[0].x_center, 0.3);
    assert_eq!(out[0].width, 0.4);
  }
}
