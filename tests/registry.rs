// 该文件是 Jiema （解码） 项目的一部分。
// tests/registry.rs - 注册表测试
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

use std::collections::HashSet;

use url::Url;

use jiema::{DecoderBuilder, FromUrl, PpError, PpType, find, model_support_list, registry};

const EXPECTED: [&str; 12] = [
  "pp_od_yolo_v2_uf",
  "pp_od_yolo_v5_uu",
  "pp_od_yolo_v8_uf",
  "pp_od_yolo_v8_ui",
  "pp_od_st_yolox_uf",
  "pp_od_ssd_uf",
  "pp_od_fd_blazeface_uu",
  "pp_mpe_yolo_v8_uf",
  "pp_mpe_pd_uf",
  "pp_spe_movenet_uf",
  "pp_sseg_deeplab_v3_uf",
  "pp_iseg_yolo_v8_ui",
];

#[test]
fn support_list_is_stable_and_unique() {
  registry::init();
  let names = model_support_list();
  assert_eq!(names, EXPECTED);
  assert_eq!(names, model_support_list());

  let unique: HashSet<_> = names.iter().collect();
  assert_eq!(unique.len(), names.len());
  registry::deinit();
}

#[test]
fn every_listed_name_is_found() {
  for name in model_support_list() {
    let entry = find(name).unwrap();
    assert_eq!(entry.name, name);
    assert!(std::ptr::eq(entry, find(name).unwrap()));
  }
}

#[test]
fn lookup_is_exact_and_case_sensitive() {
  assert!(find("PP_OD_YOLO_V2_UF").is_none());
  assert!(find("pp_od_yolo_v2").is_none());
  assert!(find("pp_od_yolo_v2_uf ").is_none());
  assert!(find("").is_none());
}

#[test]
fn entries_report_their_result_type() {
  let expect = |name: &str| find(name).unwrap().pp_type();
  assert_eq!(expect("pp_od_ssd_uf"), PpType::Od);
  assert_eq!(expect("pp_od_fd_blazeface_uu"), PpType::Od);
  assert_eq!(expect("pp_mpe_pd_uf"), PpType::Mpe);
  assert_eq!(expect("pp_spe_movenet_uf"), PpType::Spe);
  assert_eq!(expect("pp_sseg_deeplab_v3_uf"), PpType::Sseg);
  assert_eq!(expect("pp_iseg_yolo_v8_ui"), PpType::Iseg);
}

#[test]
fn default_builds_match_entry_type() {
  // 不依赖锚框的家族可以直接用默认参数初始化
  let names = [
    "pp_od_yolo_v5_uu",
    "pp_od_yolo_v8_uf",
    "pp_od_yolo_v8_ui",
    "pp_od_ssd_uf",
    "pp_mpe_yolo_v8_uf",
    "pp_spe_movenet_uf",
    "pp_sseg_deeplab_v3_uf",
    "pp_iseg_yolo_v8_ui",
  ];
  for name in names {
    let entry = find(name).unwrap();
    let mut decoder = entry.builder().build().unwrap();
    assert_eq!(decoder.name(), name);
    assert_eq!(decoder.pp_type(), entry.pp_type());
    assert!(decoder.is_ready());
    decoder.deinit();
  }
}

#[test]
fn builder_from_url() {
  let url = Url::parse("pp://pp_od_ssd_uf").unwrap();
  let decoder = DecoderBuilder::from_url(&url).unwrap().build().unwrap();
  assert_eq!(decoder.name(), "pp_od_ssd_uf");

  let url = Url::parse("pp://pp_unknown").unwrap();
  assert!(matches!(
    DecoderBuilder::from_url(&url),
    Err(PpError::InvalidConfig { .. })
  ));

  let url = Url::parse("tensor:///pp_od_ssd_uf").unwrap();
  assert!(DecoderBuilder::from_url(&url).is_err());
}
