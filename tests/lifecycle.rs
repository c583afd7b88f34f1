// 该文件是 Jiema （解码） 项目的一部分。
// tests/lifecycle.rs - 解码器生命周期测试
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

use jiema::{
  BufferPool, DType, Decoder, KernelError, PpError, PpType, Quantization, RawTensor, StaticRuntime,
  find,
};

const EPS: f32 = 1e-4;

fn build(name: &str, json: &str, pool: &BufferPool) -> Result<Box<dyn Decoder>, PpError> {
  find(name)
    .unwrap()
    .builder()
    .config(json)
    .pool(pool.clone())
    .build()
}

fn build_with_runtime(
  name: &str,
  json: &str,
  pool: &BufferPool,
  runtime: &StaticRuntime,
) -> Result<Box<dyn Decoder>, PpError> {
  find(name)
    .unwrap()
    .builder()
    .config(json)
    .pool(pool.clone())
    .runtime(runtime)
    .build()
}

/// 带锚框的家族没有默认参数，这里给出最小的合法配置
fn minimal_config(name: &str) -> &'static str {
  match name {
    "pp_od_yolo_v2_uf" => r#"{ "num_anchors": 1, "anchors": [1.0, 1.0] }"#,
    "pp_od_st_yolox_uf" => {
      r#"{ "scales": {
        "large": { "grid_width": 1, "grid_height": 1, "anchors": [1.0, 1.0] },
        "medium": { "grid_width": 1, "grid_height": 1, "anchors": [1.0, 1.0] },
        "small": { "grid_width": 1, "grid_height": 1, "anchors": [1.0, 1.0] }
      } }"#
    }
    "pp_od_fd_blazeface_uu" => {
      r#"{ "detections_0": 1, "detections_1": 1, "num_keypoints": 0,
        "anchors_0": [0.5, 0.5, 1.0, 1.0], "anchors_1": [0.2, 0.2, 1.0, 1.0] }"#
    }
    "pp_mpe_pd_uf" => {
      r#"{ "total_detections": 2, "num_keypoints": 1, "image_width": 100, "image_height": 100,
        "anchors": [[0.2, 0.2], [0.5, 0.5]] }"#
    }
    _ => "{}",
  }
}

const DETECTION_FAMILIES: [&str; 10] = [
  "pp_od_yolo_v2_uf",
  "pp_od_yolo_v5_uu",
  "pp_od_yolo_v8_uf",
  "pp_od_yolo_v8_ui",
  "pp_od_st_yolox_uf",
  "pp_od_ssd_uf",
  "pp_od_fd_blazeface_uu",
  "pp_mpe_yolo_v8_uf",
  "pp_mpe_pd_uf",
  "pp_iseg_yolo_v8_ui",
];

/// YOLOv8 通道优先布局：`boxes` 为 `(xc, yc, w, h, class_scores)`
fn yolo_v8_raw(nb_classes: usize, boxes: &[([f32; 4], Vec<f32>)]) -> Vec<f32> {
  let n = boxes.len();
  let mut raw = vec![0.0; (4 + nb_classes) * n];
  for (i, (bbox, scores)) in boxes.iter().enumerate() {
    for (c, v) in bbox.iter().enumerate() {
      raw[c * n + i] = *v;
    }
    for (c, v) in scores.iter().enumerate() {
      raw[(4 + c) * n + i] = *v;
    }
  }
  raw
}

#[test]
fn yolo_v2_single_cell() {
  let pool = BufferPool::unbounded();
  let json = r#"{
    "num_classes": 2, "class_names": ["a", "b"], "confidence_threshold": 0.3,
    "grid_width": 2, "grid_height": 2, "num_anchors": 1, "anchors": [1.0, 1.0]
  }"#;
  let mut decoder = build("pp_od_yolo_v2_uf", json, &pool).unwrap();
  assert_eq!(decoder.input_spec()[0].len, 28);

  let mut raw = vec![0.0f32; 28];
  for cell in 0..4 {
    let base = cell * 7;
    raw[base + 4] = if cell == 0 { 20.0 } else { -20.0 };
    raw[base + 6] = 9f32.ln();
  }

  let result = decoder.run(&[RawTensor::F32(&raw)]).unwrap();
  assert!(result.is_valid());
  let od = result.as_od().unwrap();
  assert_eq!(od.nb_detect(), 1);
  let d = &od.detects()[0];
  assert_eq!(&*d.class_name, "b");
  assert!((d.conf - 0.9).abs() < 1e-3);
  assert!(d.x.abs() < EPS);
  assert!(d.y.abs() < EPS);
  assert!((d.width - 0.5).abs() < EPS);
  assert!((d.height - 0.5).abs() < EPS);
}

#[test]
fn boxes_and_confidence_are_clamped() {
  let pool = BufferPool::unbounded();
  let json = r#"{ "num_classes": 1, "total_boxes": 2, "class_names": ["obj"] }"#;
  let mut decoder = build("pp_od_yolo_v8_uf", json, &pool).unwrap();

  let raw = yolo_v8_raw(
    1,
    &[
      ([0.05, 0.95, 0.3, 0.3], vec![0.9]),
      ([0.5, 0.5, 1.4, 0.2], vec![1.5]),
    ],
  );
  let result = decoder.run(&[RawTensor::F32(&raw)]).unwrap();
  let od = result.as_od().unwrap();
  assert_eq!(od.nb_detect(), 2);

  for d in od.detects() {
    for v in [d.x, d.y, d.width, d.height, d.conf] {
      assert!((0.0..=1.0).contains(&v), "{:?}", d);
    }
  }

  let first = &od.detects()[0];
  assert_eq!(first.conf, 1.0);
  assert_eq!(first.x, 0.0);
  assert_eq!(first.width, 1.0);
  assert!((first.y - 0.4).abs() < EPS);

  let second = &od.detects()[1];
  assert_eq!(second.x, 0.0);
  assert!((second.y - 0.8).abs() < EPS);
  assert!((second.height - 0.3).abs() < EPS);
}

#[test]
fn output_is_truncated_to_max_detections() {
  let pool = BufferPool::unbounded();
  let json = r#"{ "num_classes": 1, "total_boxes": 5, "max_detections": 2 }"#;
  let mut decoder = build("pp_od_yolo_v8_uf", json, &pool).unwrap();

  let boxes: Vec<_> = (0..5)
    .map(|i| {
      let xc = 0.1 + 0.2 * i as f32;
      ([xc, 0.5, 0.1, 0.1], vec![0.6 + 0.05 * i as f32])
    })
    .collect();
  let raw = yolo_v8_raw(1, &boxes);

  let result = decoder.run(&[RawTensor::F32(&raw)]).unwrap();
  let od = result.as_od().unwrap();
  assert_eq!(od.nb_detect(), 2);
  assert!((od.detects()[0].conf - 0.8).abs() < EPS);
  assert!((od.detects()[1].conf - 0.75).abs() < EPS);
}

#[test]
fn unnamed_classes_fall_back() {
  let pool = BufferPool::unbounded();
  let json = r#"{ "num_classes": 3, "total_boxes": 2, "class_names": ["a"] }"#;
  let mut decoder = build("pp_od_yolo_v8_uf", json, &pool).unwrap();

  let raw = yolo_v8_raw(
    3,
    &[
      ([0.2, 0.2, 0.1, 0.1], vec![0.9, 0.0, 0.0]),
      ([0.7, 0.7, 0.1, 0.1], vec![0.0, 0.0, 0.8]),
    ],
  );
  let result = decoder.run(&[RawTensor::F32(&raw)]).unwrap();
  let od = result.as_od().unwrap();
  assert_eq!(&*od.detects()[0].class_name, "a");
  assert_eq!(&*od.detects()[1].class_name, "unknown");
}

#[test]
fn empty_result_is_not_valid() {
  let pool = BufferPool::unbounded();
  let json = r#"{ "num_classes": 1, "total_boxes": 2 }"#;
  let mut decoder = build("pp_od_yolo_v8_uf", json, &pool).unwrap();
  let raw = vec![0.0f32; 10];
  let result = decoder.run(&[RawTensor::F32(&raw)]).unwrap();
  assert!(!result.is_valid());
  assert_eq!(result.nb_detect(), 0);
  assert_eq!(result.pp_type(), PpType::Od);
}

#[test]
fn buffers_are_released_on_deinit() {
  let pool = BufferPool::unbounded();
  let mut decoder = build("pp_mpe_yolo_v8_uf", "{}", &pool).unwrap();
  let stats = pool.stats();
  assert!(stats.live() > 0);
  assert!(stats.bytes_in_use > 0);

  decoder.deinit();
  decoder.deinit();
  let stats = pool.stats();
  assert_eq!(stats.live(), 0);
  assert_eq!(stats.bytes_in_use, 0);
  assert!(!decoder.is_ready());

  let raw = vec![0.0f32; decoder.input_spec()[0].len];
  assert_eq!(
    decoder.run(&[RawTensor::F32(&raw)]).unwrap_err(),
    PpError::NotReady {
      family: "pp_mpe_yolo_v8_uf"
    }
  );
}

#[test]
fn dropping_a_decoder_releases_buffers() {
  let pool = BufferPool::unbounded();
  {
    let _decoder = build("pp_sseg_deeplab_v3_uf", "{}", &pool).unwrap();
    assert!(pool.stats().live() > 0);
  }
  assert_eq!(pool.stats().live(), 0);
}

#[test]
fn missing_anchors_leak_nothing() {
  let pool = BufferPool::unbounded();
  for name in [
    "pp_od_yolo_v2_uf",
    "pp_od_st_yolox_uf",
    "pp_od_fd_blazeface_uu",
    "pp_mpe_pd_uf",
  ] {
    let Err(err) = build(name, "{}", &pool) else {
      panic!("{} 缺少锚框时不应初始化成功", name);
    };
    assert!(matches!(err, PpError::MissingAnchors { .. }), "{}", err);
  }
  let stats = pool.stats();
  assert_eq!(stats.allocations, stats.releases);
  assert_eq!(stats.bytes_in_use, 0);
}

#[test]
fn short_anchor_list_is_rejected() {
  let pool = BufferPool::unbounded();
  let json = r#"{ "num_anchors": 5, "anchors": [1.0, 1.0, 2.0] }"#;
  let Err(err) = build("pp_od_yolo_v2_uf", json, &pool) else {
    panic!("锚框不足时不应初始化成功");
  };
  assert_eq!(
    err,
    PpError::InvalidAnchors {
      family: "pp_od_yolo_v2_uf",
      key: "anchors",
      expected: 10,
      actual: 3,
    }
  );
}

#[test]
fn bounded_pool_reports_out_of_memory() {
  let pool = BufferPool::with_capacity(64);
  let Err(err) = build("pp_iseg_yolo_v8_ui", "{}", &pool) else {
    panic!("内存池不足时不应初始化成功");
  };
  assert!(matches!(err, PpError::OutOfMemory { .. }));
  assert_eq!(pool.stats().live(), 0);
}

#[test]
fn thresholds_round_trip() {
  let pool = BufferPool::unbounded();
  for name in DETECTION_FAMILIES {
    let mut decoder = build(name, minimal_config(name), &pool).unwrap();
    for v in [0.0, 0.5, 1.0] {
      decoder.set_confidence_threshold(v);
      decoder.set_nms_threshold(v);
      assert_eq!(decoder.confidence_threshold(), v, "{}", name);
      assert_eq!(decoder.nms_threshold(), v, "{}", name);
    }
  }
}

#[test]
fn configured_thresholds_are_reported() {
  let pool = BufferPool::unbounded();
  let json = r#"{ "postprocess_params": { "confidence_threshold": 0.25, "iou_threshold": 0.6 } }"#;
  let decoder = build("pp_od_ssd_uf", json, &pool).unwrap();
  assert_eq!(decoder.confidence_threshold(), 0.25);
  assert_eq!(decoder.nms_threshold(), 0.6);
}

#[test]
fn dense_decoders_ignore_thresholds() {
  let pool = BufferPool::unbounded();
  for name in ["pp_spe_movenet_uf", "pp_sseg_deeplab_v3_uf"] {
    let mut decoder = build(name, "{}", &pool).unwrap();
    for v in [0.0, 0.5, 1.0] {
      decoder.set_confidence_threshold(v);
      decoder.set_nms_threshold(v);
      assert_eq!(decoder.confidence_threshold(), 0.0, "{}", name);
      assert_eq!(decoder.nms_threshold(), 0.0, "{}", name);
    }
  }
}

#[test]
fn wrong_inputs_are_rejected() {
  let pool = BufferPool::unbounded();
  let json = r#"{ "num_classes": 1, "total_boxes": 2 }"#;
  let mut decoder = build("pp_od_yolo_v8_uf", json, &pool).unwrap();

  assert!(matches!(
    decoder.run(&[]).unwrap_err(),
    PpError::InputCount {
      expected: 1,
      actual: 0,
      ..
    }
  ));

  let bytes = [0u8; 10];
  assert!(matches!(
    decoder.run(&[RawTensor::U8(&bytes)]).unwrap_err(),
    PpError::InputType {
      expected: DType::F32,
      actual: DType::U8,
      ..
    }
  ));

  let short = [0.0f32; 4];
  assert_eq!(
    decoder.run(&[RawTensor::F32(&short)]).unwrap_err(),
    PpError::Decode(KernelError::ShortInput {
      index: 0,
      expected: 10,
      actual: 4,
    })
  );
}

#[test]
fn movenet_picks_heatmap_peaks() {
  let pool = BufferPool::unbounded();
  let json = r#"{ "heatmap_width": 2, "heatmap_height": 2, "num_keypoints": 1 }"#;
  let mut decoder = build("pp_spe_movenet_uf", json, &pool).unwrap();

  let raw = [0.1f32, 0.2, 0.3, 0.8];
  let result = decoder.run(&[RawTensor::F32(&raw)]).unwrap();
  assert!(result.is_valid());
  let spe = result.as_spe().unwrap();
  assert_eq!(spe.keypoints().len(), 1);
  let kp = spe.keypoints()[0];
  assert!((kp.x - 0.75).abs() < EPS);
  assert!((kp.y - 0.75).abs() < EPS);
  assert!((kp.conf - 0.8).abs() < EPS);
}

#[test]
fn deeplab_writes_class_map() {
  let pool = BufferPool::unbounded();
  let json = r#"{ "num_classes": 2, "width": 2, "height": 1, "class_names": ["bg", "fg"] }"#;
  let mut decoder = build("pp_sseg_deeplab_v3_uf", json, &pool).unwrap();

  let raw = [0.9f32, 0.1, 0.2, 0.7];
  let result = decoder.run(&[RawTensor::F32(&raw)]).unwrap();
  let sseg = result.as_sseg().unwrap();
  assert_eq!(sseg.class_map(), &[0, 1]);
  assert_eq!((sseg.width(), sseg.height()), (2, 1));
  assert_eq!(&*sseg.labels().resolve(1), "fg");
}

#[test]
fn too_many_segmentation_classes_are_rejected() {
  let pool = BufferPool::unbounded();
  let Err(err) = build("pp_sseg_deeplab_v3_uf", r#"{ "num_classes": 300 }"#, &pool) else {
    panic!("类别数超过 256 时不应初始化成功");
  };
  assert!(matches!(err, PpError::InvalidConfig { .. }));
}

#[test]
fn rerun_replaces_previous_result() {
  let pool = BufferPool::unbounded();
  let json = r#"{ "num_classes": 1, "total_boxes": 1 }"#;
  let mut decoder = build("pp_od_yolo_v8_uf", json, &pool).unwrap();

  let hit = yolo_v8_raw(1, &[([0.5, 0.5, 0.2, 0.2], vec![0.9])]);
  assert_eq!(decoder.run(&[RawTensor::F32(&hit)]).unwrap().nb_detect(), 1);

  let miss = yolo_v8_raw(1, &[([0.5, 0.5, 0.2, 0.2], vec![0.1])]);
  assert_eq!(decoder.run(&[RawTensor::F32(&miss)]).unwrap().nb_detect(), 0);
}

#[test]
fn every_detection_family_runs_on_zero_input() {
  let pool = BufferPool::unbounded();
  for name in DETECTION_FAMILIES {
    let mut decoder = build(name, minimal_config(name), &pool).unwrap();
    assert!(decoder.is_ready(), "{}", name);

    let f32_zeros: Vec<Vec<f32>> = decoder
      .input_spec()
      .iter()
      .map(|spec| vec![0.0; spec.len])
      .collect();
    let i8_zeros: Vec<Vec<i8>> = decoder
      .input_spec()
      .iter()
      .map(|spec| vec![0; spec.len])
      .collect();
    let u8_zeros: Vec<Vec<u8>> = decoder
      .input_spec()
      .iter()
      .map(|spec| vec![0; spec.len])
      .collect();
    let inputs: Vec<RawTensor<'_>> = decoder
      .input_spec()
      .iter()
      .enumerate()
      .map(|(i, spec)| match spec.dtype {
        DType::F32 => RawTensor::F32(&f32_zeros[i]),
        DType::I8 => RawTensor::I8(&i8_zeros[i]),
        DType::U8 => RawTensor::U8(&u8_zeros[i]),
      })
      .collect();

    let pp_type = decoder.pp_type();
    let result = decoder.run(&inputs).unwrap();
    assert_eq!(result.pp_type(), pp_type, "{}", name);
    decoder.deinit();
  }
  assert_eq!(pool.stats().live(), 0);
}

#[test]
fn st_yolox_decodes_the_large_scale() {
  let pool = BufferPool::unbounded();
  let mut decoder = build("pp_od_st_yolox_uf", minimal_config("pp_od_st_yolox_uf"), &pool).unwrap();
  assert_eq!(decoder.input_spec().len(), 3);

  // 输入顺序 small, large, medium；每个尺度 1 个框，6 个通道
  let miss = [0.0f32, 0.0, 0.0, 0.0, -20.0, -20.0];
  let hit = [0.0f32, 0.0, 0.0, 0.0, 20.0, 20.0];
  let result = decoder
    .run(&[RawTensor::F32(&miss), RawTensor::F32(&hit), RawTensor::F32(&miss)])
    .unwrap();

  let od = result.as_od().unwrap();
  assert_eq!(od.nb_detect(), 1);
  let d = &od.detects()[0];
  assert_eq!(&*d.class_name, "unknown");
  assert!(d.conf > 0.99);
  assert!(d.x.abs() < EPS);
  assert!((d.width - 1.0).abs() < EPS);
}

#[test]
fn blazeface_uses_runtime_quantization_and_face_fallback() {
  let pool = BufferPool::unbounded();
  let runtime = StaticRuntime::new([Quantization::new(1.0, 128); 4]);
  let json = r#"{ "image_size": 100, "detections_0": 1, "detections_1": 1, "num_keypoints": 0,
    "anchors_0": [0.5, 0.5, 1.0, 1.0], "anchors_1": [0.2, 0.2, 1.0, 1.0] }"#;
  let mut decoder = build_with_runtime("pp_od_fd_blazeface_uu", json, &pool, &runtime).unwrap();

  let scores_0 = [255u8];
  let scores_1 = [0u8];
  let boxes_0 = [128u8, 128, 148, 168];
  let boxes_1 = [128u8; 4];
  let result = decoder
    .run(&[
      RawTensor::U8(&scores_0),
      RawTensor::U8(&scores_1),
      RawTensor::U8(&boxes_0),
      RawTensor::U8(&boxes_1),
    ])
    .unwrap();

  let od = result.as_od().unwrap();
  assert_eq!(od.nb_detect(), 1);
  let d = &od.detects()[0];
  assert_eq!(&*d.class_name, "face");
  assert!((d.x - 0.4).abs() < EPS);
  assert!((d.y - 0.3).abs() < EPS);
  assert!((d.width - 0.2).abs() < EPS);
  assert!((d.height - 0.4).abs() < EPS);
}

#[test]
fn palm_keypoints_are_clamped() {
  let pool = BufferPool::unbounded();
  let mut decoder = build("pp_mpe_pd_uf", minimal_config("pp_mpe_pd_uf"), &pool).unwrap();

  let probs = [-10.0f32, 10.0];
  // 第二个锚点 (0.5, 0.5)：框偏移 (10, -10)，尺寸 20x40，关键点落在图像之外
  let boxes = [
    0.0f32, 0.0, 0.0, 0.0, 0.0, 0.0, //
    10.0, -10.0, 20.0, 40.0, 80.0, -70.0,
  ];
  let result = decoder
    .run(&[RawTensor::F32(&probs), RawTensor::F32(&boxes)])
    .unwrap();

  let mpe = result.as_mpe().unwrap();
  assert_eq!(mpe.nb_detect(), 1);
  let d = &mpe.detects()[0];
  assert_eq!(&*d.class_name, "palm");
  assert!((d.x - 0.5).abs() < EPS);
  assert!((d.y - 0.2).abs() < EPS);
  assert!((d.height - 0.4).abs() < EPS);

  let kp = d.keypoints[0];
  assert_eq!(kp.x, 1.0);
  assert_eq!(kp.y, 0.0);
  assert_eq!(kp.conf, 1.0);
}

#[test]
fn pose_keypoints_are_clamped() {
  let pool = BufferPool::unbounded();
  let json = r#"{ "num_classes": 1, "total_boxes": 1, "num_keypoints": 1, "class_names": ["person"] }"#;
  let mut decoder = build("pp_mpe_yolo_v8_uf", json, &pool).unwrap();

  let raw = [0.5f32, 0.5, 0.2, 0.2, 0.9, 1.5, -0.3, 2.0];
  let result = decoder.run(&[RawTensor::F32(&raw)]).unwrap();
  let mpe = result.as_mpe().unwrap();
  assert_eq!(mpe.nb_detect(), 1);
  let d = &mpe.detects()[0];
  assert_eq!(&*d.class_name, "person");
  assert_eq!(d.keypoints.len(), 1);
  assert_eq!(d.keypoints[0].x, 1.0);
  assert_eq!(d.keypoints[0].y, 0.0);
  assert_eq!(d.keypoints[0].conf, 1.0);
}

#[test]
fn yolo_v5_dequantizes_with_runtime_parameters() {
  let pool = BufferPool::unbounded();
  let runtime = StaticRuntime::new([Quantization::new(0.01, 0)]);
  let json = r#"{ "num_classes": 1, "total_boxes": 1, "class_names": ["obj"] }"#;
  let mut decoder = build_with_runtime("pp_od_yolo_v5_uu", json, &pool, &runtime).unwrap();

  let raw = [50u8, 50, 20, 40, 90, 100];
  let result = decoder.run(&[RawTensor::U8(&raw)]).unwrap();
  let od = result.as_od().unwrap();
  assert_eq!(od.nb_detect(), 1);
  let d = &od.detects()[0];
  assert_eq!(&*d.class_name, "obj");
  assert!((d.conf - 0.9).abs() < EPS);
  assert!((d.x - 0.4).abs() < EPS);
  assert!((d.y - 0.3).abs() < EPS);
}

#[test]
fn yolo_v5_config_overrides_runtime_quantization() {
  let pool = BufferPool::unbounded();
  let runtime = StaticRuntime::new([Quantization::new(0.01, 0)]);
  let json = r#"{ "num_classes": 1, "total_boxes": 1, "class_names": ["obj"],
    "raw_output_scale": 0.005, "raw_output_zero_point": 0 }"#;
  let mut decoder = build_with_runtime("pp_od_yolo_v5_uu", json, &pool, &runtime).unwrap();

  let raw = [100u8, 100, 40, 80, 180, 200];
  let result = decoder.run(&[RawTensor::U8(&raw)]).unwrap();
  let d = &result.as_od().unwrap().detects()[0];
  assert!((d.conf - 0.9).abs() < EPS);
  assert!((d.width - 0.2).abs() < EPS);
  assert!((d.height - 0.4).abs() < EPS);
}

#[test]
fn overflowing_geometry_is_rejected_before_allocation() {
  let pool = BufferPool::with_capacity(1 << 20);
  let cases = [
    ("pp_od_yolo_v8_uf", r#"{ "total_boxes": 1e19 }"#),
    ("pp_od_yolo_v8_ui", r#"{ "num_classes": 1e19, "total_boxes": 2 }"#),
    ("pp_od_yolo_v5_uu", r#"{ "total_boxes": 1e19 }"#),
    ("pp_od_ssd_uf", r#"{ "total_boxes": 1e19 }"#),
    (
      "pp_od_yolo_v2_uf",
      r#"{ "grid_width": 1e10, "grid_height": 1e10, "num_anchors": 1, "anchors": [1.0, 1.0] }"#,
    ),
    ("pp_od_yolo_v2_uf", r#"{ "num_anchors": 1e19 }"#),
    (
      "pp_od_st_yolox_uf",
      r#"{ "scales": {
        "large": { "grid_width": 1e10, "grid_height": 1e10, "anchors": [1.0, 1.0] },
        "medium": { "anchors": [1.0, 1.0] },
        "small": { "anchors": [1.0, 1.0] }
      } }"#,
    ),
    ("pp_od_fd_blazeface_uu", r#"{ "detections_0": 1e19 }"#),
    ("pp_mpe_yolo_v8_uf", r#"{ "num_keypoints": 1e19 }"#),
    ("pp_mpe_pd_uf", r#"{ "total_detections": 1e19 }"#),
    ("pp_spe_movenet_uf", r#"{ "heatmap_width": 1e10, "heatmap_height": 1e10 }"#),
    ("pp_sseg_deeplab_v3_uf", r#"{ "width": 1e10, "height": 1e10 }"#),
    ("pp_iseg_yolo_v8_ui", r#"{ "mask_size": 1e10 }"#),
  ];
  for (name, json) in cases {
    let Err(err) = build(name, json, &pool) else {
      panic!("{} 几何参数溢出时不应初始化成功: {}", name, json);
    };
    assert!(matches!(err, PpError::InvalidConfig { .. }), "{}: {}", name, err);
  }
  assert_eq!(pool.stats().allocations, 0);
}

#[test]
fn max_detections_is_capped_by_candidates() {
  let pool = BufferPool::unbounded();
  let json = r#"{ "num_classes": 1, "total_boxes": 2, "max_detections": 1e14 }"#;
  let mut decoder = build("pp_od_yolo_v8_uf", json, &pool).unwrap();
  assert!(pool.stats().bytes_in_use < 1 << 20);

  let raw = yolo_v8_raw(
    1,
    &[
      ([0.2, 0.2, 0.1, 0.1], vec![0.9]),
      ([0.7, 0.7, 0.1, 0.1], vec![0.8]),
    ],
  );
  assert_eq!(decoder.run(&[RawTensor::F32(&raw)]).unwrap().nb_detect(), 2);
}

#[test]
fn unreservable_buffers_report_out_of_memory() {
  let pool = BufferPool::unbounded();
  let json = r#"{ "num_classes": 1, "total_boxes": 1e15 }"#;
  let Err(err) = build("pp_od_yolo_v8_uf", json, &pool) else {
    panic!("候选缓冲无法分配时不应初始化成功");
  };
  assert!(matches!(err, PpError::OutOfMemory { .. }), "{}", err);
  let stats = pool.stats();
  assert_eq!(stats.live(), 0);
  assert_eq!(stats.bytes_in_use, 0);
}
