// 该文件是 Jiema （解码） 项目的一部分。
// src/registry.rs - 解码器注册表
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

//! 注册表在编译期固定，只读，可以在多个线程中同时查询。

use tracing::{debug, info};
use url::Url;

use crate::config::PpConfig;
use crate::error::PpError;
use crate::mem::BufferPool;
use crate::model::{
  Decoder, InitContext, blazeface, deeplab_v3, iseg_yolo_v8, movenet, palm, pose_yolo_v8,
  ssd, st_yolox, yolo_v2, yolo_v5, yolo_v8,
};
use crate::result::PpType;
use crate::tensor::NnRuntime;
use crate::{FromUrl, FromUrlWithScheme};

/// 已注册的模型家族
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Family {
  OdYoloV2Uf,
  OdYoloV5Uu,
  OdYoloV8Uf,
  OdYoloV8Ui,
  OdStYoloxUf,
  OdSsdUf,
  OdFdBlazefaceUu,
  MpeYoloV8Uf,
  MpePdUf,
  SpeMovenetUf,
  SsegDeeplabV3Uf,
  IsegYoloV8Ui,
}

impl Family {
  /// 输出的结果类型
  pub fn pp_type(&self) -> PpType {
    match self {
      Family::OdYoloV2Uf
      | Family::OdYoloV5Uu
      | Family::OdYoloV8Uf
      | Family::OdYoloV8Ui
      | Family::OdStYoloxUf
      | Family::OdSsdUf
      | Family::OdFdBlazefaceUu => PpType::Od,
      Family::MpeYoloV8Uf | Family::MpePdUf => PpType::Mpe,
      Family::SpeMovenetUf => PpType::Spe,
      Family::SsegDeeplabV3Uf => PpType::Sseg,
      Family::IsegYoloV8Ui => PpType::Iseg,
    }
  }

  fn init(&self, ctx: InitContext<'_>) -> Result<Box<dyn Decoder>, PpError> {
    match self {
      Family::OdYoloV2Uf => yolo_v2::init(ctx),
      Family::OdYoloV5Uu => yolo_v5::init(ctx),
      Family::OdYoloV8Uf => yolo_v8::init_uf(ctx),
      Family::OdYoloV8Ui => yolo_v8::init_ui(ctx),
      Family::OdStYoloxUf => st_yolox::init(ctx),
      Family::OdSsdUf => ssd::init(ctx),
      Family::OdFdBlazefaceUu => blazeface::init(ctx),
      Family::MpeYoloV8Uf => pose_yolo_v8::init(ctx),
      Family::MpePdUf => palm::init(ctx),
      Family::SpeMovenetUf => movenet::init(ctx),
      Family::SsegDeeplabV3Uf => deeplab_v3::init(ctx),
      Family::IsegYoloV8Ui => iseg_yolo_v8::init(ctx),
    }
  }
}

/// 注册表项：名称与家族，进程生命周期内不变
#[derive(Debug, PartialEq, Eq, Hash)]
pub struct PpEntry {
  pub name: &'static str,
  pub family: Family,
}

static ENTRIES: [PpEntry; 12] = [
  PpEntry {
    name: yolo_v2::NAME,
    family: Family::OdYoloV2Uf,
  },
  PpEntry {
    name: yolo_v5::NAME,
    family: Family::OdYoloV5Uu,
  },
  PpEntry {
    name: yolo_v8::NAME_UF,
    family: Family::OdYoloV8Uf,
  },
  PpEntry {
    name: yolo_v8::NAME_UI,
    family: Family::OdYoloV8Ui,
  },
  PpEntry {
    name: st_yolox::NAME,
    family: Family::OdStYoloxUf,
  },
  PpEntry {
    name: ssd::NAME,
    family: Family::OdSsdUf,
  },
  PpEntry {
    name: blazeface::NAME,
    family: Family::OdFdBlazefaceUu,
  },
  PpEntry {
    name: pose_yolo_v8::NAME,
    family: Family::MpeYoloV8Uf,
  },
  PpEntry {
    name: palm::NAME,
    family: Family::MpePdUf,
  },
  PpEntry {
    name: movenet::NAME,
    family: Family::SpeMovenetUf,
  },
  PpEntry {
    name: deeplab_v3::NAME,
    family: Family::SsegDeeplabV3Uf,
  },
  PpEntry {
    name: iseg_yolo_v8::NAME,
    family: Family::IsegYoloV8Ui,
  },
];

/// 全局初始化，目前没有全局状态
pub fn init() {
  info!("后处理注册表: {} 个解码器", ENTRIES.len());
}

pub fn deinit() {
  debug!("后处理注册表释放");
}

/// 按名称精确查找（区分大小写）
pub fn find(name: &str) -> Option<&'static PpEntry> {
  let entry = ENTRIES.iter().find(|entry| entry.name == name);
  if entry.is_none() {
    debug!("未注册的解码器: {:?}", name);
  }
  entry
}

/// 全部已注册的名称，顺序固定
pub fn model_support_list() -> Vec<&'static str> {
  ENTRIES.iter().map(|entry| entry.name).collect()
}

pub fn entries() -> &'static [PpEntry] {
  &ENTRIES
}

impl PpEntry {
  pub fn pp_type(&self) -> PpType {
    self.family.pp_type()
  }

  pub fn builder(&'static self) -> DecoderBuilder<'static> {
    DecoderBuilder {
      entry: self,
      config: PpConfig::default(),
      pool: BufferPool::unbounded(),
      runtime: None,
    }
  }
}

/// 解码器构建器
pub struct DecoderBuilder<'a> {
  entry: &'static PpEntry,
  config: PpConfig,
  pool: BufferPool,
  runtime: Option<&'a dyn NnRuntime>,
}

impl<'a> DecoderBuilder<'a> {
  /// JSON 配置文本，解析失败时使用默认参数
  pub fn config(mut self, json: &str) -> Self {
    self.config = PpConfig::parse(Some(json));
    self
  }

  pub fn parsed_config(mut self, config: PpConfig) -> Self {
    self.config = config;
    self
  }

  pub fn pool(mut self, pool: BufferPool) -> Self {
    self.pool = pool;
    self
  }

  pub fn runtime<'b>(self, runtime: &'b dyn NnRuntime) -> DecoderBuilder<'b> {
    DecoderBuilder {
      entry: self.entry,
      config: self.config,
      pool: self.pool,
      runtime: Some(runtime),
    }
  }

  pub fn build(self) -> Result<Box<dyn Decoder>, PpError> {
    info!("初始化解码器: {}", self.entry.name);
    self.entry.family.init(InitContext {
      config: self.config,
      pool: self.pool,
      runtime: self.runtime,
    })
  }
}

const PP_SCHEME: &str = "pp";

/// `pp://<name>` 形式的解码器地址
impl FromUrl for DecoderBuilder<'static> {
  type Error = PpError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    if url.scheme() != PP_SCHEME {
      return Err(PpError::InvalidConfig {
        family: "registry",
        reason: format!("解码器地址必须使用 {} 方案", PP_SCHEME),
      });
    }
    let name = url.host_str().unwrap_or_default();
    find(name).map(PpEntry::builder).ok_or_else(|| PpError::InvalidConfig {
      family: "registry",
      reason: format!("未注册的解码器: {}", name),
    })
  }
}

impl FromUrlWithScheme for DecoderBuilder<'static> {
  const SCHEME: &'static str = PP_SCHEME;
}
