// 该文件是 Jiema （解码） 项目的一部分。
// src/kernel.rs - 解码内核公共部分
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

//! 每个模型家族一个解码内核：把原始输出张量解码为归一化的中心点候选框，
//! 经过置信度过滤和 NMS 后交给 [`crate::project`] 生成公开结果。

use crate::error::KernelError;
use crate::mem::PoolVec;
use crate::result::Keypoint;
use crate::tensor::{Dequant, TensorSpec};

pub mod blazeface;
pub mod deeplab_v3;
pub mod iseg_yolo_v8;
pub mod movenet;
pub mod nms;
pub mod palm;
pub mod pose_yolo_v8;
pub mod ssd;
pub mod st_yolox;
pub mod yolo_v2;
pub mod yolo_v5;
pub mod yolo_v8;

pub use self::nms::{iou, nms};

/// 内核输出的候选框，坐标为归一化的中心点格式
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Candidate {
  pub x_center: f32,
  pub y_center: f32,
  pub width: f32,
  pub height: f32,
  pub conf: f32,
  pub class_index: i32,
  /// 候选框在原始输出中的下标，用于之后解码关键点或掩码
  pub source: usize,
}

/// 检测类解码内核
///
/// 关键点与掩码只对 NMS 之后保留下来的候选框解码，
/// 默认实现表示该家族不输出这两类附加信息。
pub trait DetectKernel: Send {
  fn input_spec(&self) -> &[TensorSpec];

  /// 候选缓冲的容量，即原始输出中的框总数
  fn max_candidates(&self) -> usize;

  fn decode(
    &self,
    inputs: &[Dequant<'_>],
    conf_threshold: f32,
    out: &mut PoolVec<Candidate>,
  ) -> Result<(), KernelError>;

  fn nb_keypoints(&self) -> usize {
    0
  }

  fn keypoints(&self, _inputs: &[Dequant<'_>], _cand: &Candidate, _out: &mut [Keypoint]) {}

  fn mask_size(&self) -> usize {
    0
  }

  fn mask(&self, _inputs: &[Dequant<'_>], _cand: &Candidate, _out: &mut [u8]) {}
}

#[inline]
pub fn sigmoid(x: f32) -> f32 {
  1.0 / (1.0 + (-x).exp())
}

/// 最大值及其下标；`n == 0` 时返回 `(0, f32::MIN)`
#[inline]
pub fn argmax(n: usize, value: impl Fn(usize) -> f32) -> (usize, f32) {
  let mut best = (0usize, f32::MIN);
  for i in 0..n {
    let v = value(i);
    if v > best.1 {
      best = (i, v);
    }
  }
  best
}

/// softmax 之后的最大概率及其下标
pub fn softmax_max(n: usize, logit: impl Fn(usize) -> f32) -> (usize, f32) {
  let (idx, max) = argmax(n, &logit);
  if n == 0 {
    return (0, 0.0);
  }
  let sum: f32 = (0..n).map(|i| (logit(i) - max).exp()).sum();
  (idx, 1.0 / sum)
}

/// 锚框数组长度检查，供运行期使用
pub(crate) fn require_anchors(anchors: &[f32], expected: usize) -> Result<(), KernelError> {
  if anchors.len() < expected {
    return Err(KernelError::AnchorMismatch {
      expected,
      actual: anchors.len(),
    });
  }
  Ok(())
}
