// 该文件是 Jiema （解码） 项目的一部分。
// src/kernel/movenet.rs - MoveNet 热力图解码
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
use crate::result::Keypoint;
use crate::tensor::{DType, Dequant, TensorSpec};

/// 热力图布局 `[hh][hw][K]`，每个关键点取峰值所在像素的中心
#[derive(Debug, Clone)]
pub struct MoveNet {
  heatmap_width: usize,
  heatmap_height: usize,
  nb_keypoints: usize,
  inputs: [TensorSpec; 1],
}

impl MoveNet {
  pub fn new(heatmap_width: usize, heatmap_height: usize, nb_keypoints: usize) -> Self {
    Self {
      heatmap_width,
      heatmap_height,
      nb_keypoints,
      inputs: [TensorSpec {
        name: "heatmaps",
        dtype: DType::F32,
        len: heatmap_width * heatmap_height * nb_keypoints,
      }],
    }
  }

  pub fn input_spec(&self) -> &[TensorSpec] {
    &self.inputs
  }

  pub fn nb_keypoints(&self) -> usize {
    self.nb_keypoints
  }

  pub fn decode(&self, input: &Dequant<'_>, out: &mut PoolVec<Keypoint>) -> Result<(), KernelError> {
    input.require(0, self.inputs[0].len)?;

    let pixels = self.heatmap_width * self.heatmap_height;
    let len = out.activate(self.nb_keypoints);
    for (k, kp) in out.as_mut_slice().iter_mut().enumerate().take(len) {
      let (peak, conf) = argmax(pixels, |p| input.get(p * self.nb_keypoints + k));
      let row = peak / self.heatmap_width.max(1);
      let col = peak % self.heatmap_width.max(1);
      *kp = Keypoint {
        x: (col as f32 + 0.5) / self.heatmap_width as f32,
        y: (row as f32 + 0.5) / self.heatmap_height as f32,
        conf,
      };
    }
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::mem::BufferPool;

  #[test]
  fn peak_pixel_center_is_reported() {
    let kernel = MoveNet::new(2, 2, 2);
    // 像素优先，每个像素 2 个关键点通道
    let raw = [0.1f32, 0.0, 0.2, 0.0, 0.3, 0.1, 0.9, 0.8];
    let pool = BufferPool::unbounded();
    let mut out = pool.slots(2, 0, |_| Keypoint::default()).unwrap();
    kernel.decode(&Dequant::float(&raw), &mut out).unwrap();

    assert_eq!(out.len(), 2);
    assert_eq!(out[0], Keypoint { x: 0.75, y: 0.75, conf: 0.9 });
    assert_eq!(out[1], Keypoint { x: 0.75, y: 0.75, conf: 0.8 });
  }
}
