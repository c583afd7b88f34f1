// 该文件是 Jiema （解码） 项目的一部分。
// src/project.rs - 候选框到公开结果的投影
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

//! 所有检测类家族共用同一个投影：中心点转左上角后再裁剪到 [0, 1]，
//! 按类别表解析名称，截断到 `max_boxes_limit`。
//! 关键点与掩码通过 `attach` 回调写入各自的记录。

use std::sync::Arc;

use crate::kernel::Candidate;
use crate::labels::LabelTable;
use crate::mem::PoolVec;
use crate::result::{IsegDetect, Keypoint, MpeDetect, OdDetect};

#[inline]
pub fn clamp_unit(v: f32) -> f32 {
  0f32.max(1f32.min(v))
}

/// 归一化的左上角格式框
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct NormBox {
  pub x: f32,
  pub y: f32,
  pub width: f32,
  pub height: f32,
}

impl NormBox {
  /// 先转换为左上角，再逐项裁剪
  pub fn from_centroid(x_center: f32, y_center: f32, width: f32, height: f32) -> Self {
    Self {
      x: clamp_unit(x_center - width / 2.0),
      y: clamp_unit(y_center - height / 2.0),
      width: clamp_unit(width),
      height: clamp_unit(height),
    }
  }
}

impl From<&Candidate> for NormBox {
  fn from(c: &Candidate) -> Self {
    Self::from_centroid(c.x_center, c.y_center, c.width, c.height)
  }
}

/// 可以接收投影结果的检测记录
pub trait DetectRecord {
  fn assign(&mut self, bbox: NormBox, conf: f32, class_name: Arc<str>);
}

macro_rules! impl_detect_record {
  ($($ty:ty),*) => {
    $(
      impl DetectRecord for $ty {
        fn assign(&mut self, bbox: NormBox, conf: f32, class_name: Arc<str>) {
          self.x = bbox.x;
          self.y = bbox.y;
          self.width = bbox.width;
          self.height = bbox.height;
          self.conf = conf;
          self.class_name = class_name;
        }
      }
    )*
  };
}

impl_detect_record!(OdDetect, MpeDetect, IsegDetect);

/// 把 NMS 之后的候选投影到结果缓冲，返回写入数量
///
/// 候选已按置信度降序排列；写入数量不超过 `limit` 与缓冲容量。
pub fn project<R: DetectRecord>(
  candidates: &[Candidate],
  labels: &LabelTable,
  limit: usize,
  out: &mut PoolVec<R>,
  mut attach: impl FnMut(&Candidate, &mut R),
) -> usize {
  out.clear();
  for cand in candidates.iter().take(limit) {
    let written = out.push_with(|record| {
      record.assign(
        NormBox::from(cand),
        clamp_unit(cand.conf),
        labels.resolve(cand.class_index),
      );
      attach(cand, record);
    });
    if !written {
      break;
    }
  }
  out.len()
}

/// 关键点坐标与置信度裁剪到 [0, 1]
pub fn clamp_keypoints(keypoints: &mut [Keypoint]) {
  for kp in keypoints {
    kp.x = clamp_unit(kp.x);
    kp.y = clamp_unit(kp.y);
    kp.conf = clamp_unit(kp.conf);
  }
}
