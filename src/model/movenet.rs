// 该文件是 Jiema （解码） 项目的一部分。
// src/model/movenet.rs - pp_spe_movenet_uf
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

use std::sync::Arc;

use tracing::{debug, error, info};

use super::{Decoder, InitContext, bind_inputs, checked_geometry};
use crate::error::PpError;
use crate::kernel::movenet::MoveNet;
use crate::labels::Skeleton;
use crate::project::clamp_keypoints;
use crate::result::{Keypoint, PpResult, PpType, SpeOutput};
use crate::tensor::{RawTensor, TensorSpec};

pub const NAME: &str = "pp_spe_movenet_uf";

const DEFAULT_HEATMAP: usize = 64;
const DEFAULT_KEYPOINTS: usize = 17;

/// 单人姿态没有阈值概念，阈值的设置被忽略，读取恒为 0
pub(crate) struct MoveNetDecoder {
  kernel: MoveNet,
  result: Option<PpResult>,
}

pub(crate) fn init(ctx: InitContext<'_>) -> Result<Box<dyn Decoder>, PpError> {
  let cfg = &ctx.config;

  let mut heatmap_width = DEFAULT_HEATMAP;
  let mut heatmap_height = DEFAULT_HEATMAP;
  let mut nb_keypoints = DEFAULT_KEYPOINTS;
  cfg.override_usize("heatmap_width", &mut heatmap_width);
  cfg.override_usize("heatmap_height", &mut heatmap_height);
  cfg.override_usize("num_keypoints", &mut nb_keypoints);

  let pixels = checked_geometry(NAME, "热力图像素数", heatmap_width.checked_mul(heatmap_height))?;
  checked_geometry(NAME, "热力图长度", pixels.checked_mul(nb_keypoints))?;

  let skeleton = Skeleton::from_config(cfg, nb_keypoints);
  let keypoints = ctx.pool.slots(nb_keypoints, 0, |_| Keypoint::default())?;
  info!(
    "{}: 初始化完成, 热力图 {}x{}, {} 个关键点, {} 条连线",
    NAME,
    heatmap_width,
    heatmap_height,
    nb_keypoints,
    skeleton.connections.len()
  );

  Ok(Box::new(MoveNetDecoder {
    kernel: MoveNet::new(heatmap_width, heatmap_height, nb_keypoints),
    result: Some(PpResult::Spe(SpeOutput {
      keypoints,
      skeleton: Arc::new(skeleton),
    })),
  }))
}

impl Decoder for MoveNetDecoder {
  fn name(&self) -> &'static str {
    NAME
  }

  fn pp_type(&self) -> PpType {
    PpType::Spe
  }

  fn input_spec(&self) -> &[TensorSpec] {
    self.kernel.input_spec()
  }

  fn is_ready(&self) -> bool {
    self.result.is_some()
  }

  fn run(&mut self, inputs: &[RawTensor<'_>]) -> Result<&PpResult, PpError> {
    let Some(result) = self.result.as_mut() else {
      error!("{}: 解码器未初始化或已释放", NAME);
      return Err(PpError::NotReady { family: NAME });
    };

    let views = bind_inputs(NAME, self.kernel.input_spec(), &[], inputs)?;
    result.reset();
    if let PpResult::Spe(out) = &mut *result {
      self.kernel.decode(&views[0], &mut out.keypoints)?;
      clamp_keypoints(out.keypoints.as_mut_slice());
      debug!("{}: 输出 {} 个关键点", NAME, out.keypoints.len());
    }
    Ok(&*result)
  }

  fn deinit(&mut self) {
    if self.result.take().is_some() {
      info!("{}: 已释放全部缓冲", NAME);
    }
  }

  fn set_confidence_threshold(&mut self, _threshold: f32) {}

  fn confidence_threshold(&self) -> f32 {
    0.0
  }

  fn set_nms_threshold(&mut self, _threshold: f32) {}

  fn nms_threshold(&self) -> f32 {
    0.0
  }
}
