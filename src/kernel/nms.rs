// 该文件是 Jiema （解码） 项目的一部分。
// src/kernel/nms.rs - 非极大值抑制
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

use super::Candidate;
use crate::mem::PoolVec;

/// 计算两个中心点格式候选框的 IoU
pub fn iou(a: &Candidate, b: &Candidate) -> f32 {
  let x1 = (a.x_center - a.width / 2.0).max(b.x_center - b.width / 2.0);
  let y1 = (a.y_center - a.height / 2.0).max(b.y_center - b.height / 2.0);
  let x2 = (a.x_center + a.width / 2.0).min(b.x_center + b.width / 2.0);
  let y2 = (a.y_center + a.height / 2.0).min(b.y_center + b.height / 2.0);

  let intersection = (x2 - x1).max(0.0) * (y2 - y1).max(0.0);
  let area_a = a.width * a.height;
  let area_b = b.width * b.height;
  let union = area_a + area_b - intersection;

  if union > 0.0 {
    intersection / union
  } else {
    0.0
  }
}

/// 同类别非极大值抑制，就地完成
///
/// 按置信度降序排序后贪心保留，保留的候选框依次交换到缓冲前部，
/// 最后截断到保留数量。与已保留框 IoU 大于阈值的同类候选被丢弃。
pub fn nms(candidates: &mut PoolVec<Candidate>, iou_threshold: f32) {
  let items = candidates.as_mut_slice();
  items.sort_unstable_by(|a, b| b.conf.total_cmp(&a.conf));

  let mut kept = 0;
  for i in 0..items.len() {
    let current = items[i];
    let suppressed = items[..kept]
      .iter()
      .any(|k| k.class_index == current.class_index && iou(k, &current) > iou_threshold);
    if !suppressed {
      items.swap(kept, i);
      kept += 1;
    }
  }

  candidates.truncate(kept);
}
