// 该文件是 Shanan Bridge（山南桥）项目的一部分。
// tests/bridge.rs - 桥接节点端到端测试
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

use std::sync::mpsc::{self, Receiver, Sender};

use shanan_bridge::{
  Bridge, BridgeError, Processed, StopReason,
  engine::{DetectItem, DetectResult, Engine, Mask, Precision},
  frame::{Frame, Header, WireImage},
  message::{OutboundMessage, RegionOfInterest, Topic},
  output::MemoryOutput,
};

#[derive(Debug, thiserror::Error)]
#[error("scripted engine failure")]
struct ScriptedFailure;

/// Engine returning fixed results and recording every call it receives.
#[derive(Default)]
struct ScriptedEngine {
  sessions: Vec<(u32, u32)>,
  labels: Vec<String>,
  detections: Vec<DetectItem>,
  fail_inference: bool,
}

impl Engine for ScriptedEngine {
  type Error = ScriptedFailure;

  fn initialize_session(&mut self, width: u32, height: u32) -> Result<(), Self::Error> {
    self.sessions.push((width, height));
    Ok(())
  }

  fn infer(&mut self, _frame: &Frame) -> Result<Vec<String>, Self::Error> {
    if self.fail_inference {
      return Err(ScriptedFailure);
    }
    Ok(self.labels.clone())
  }

  fn infer_visualize(&mut self, _: Precision, frame: &Frame) -> Result<Frame, Self::Error> {
    Ok(frame.clone())
  }

  fn infer_action(&mut self, _: Precision, _frame: &Frame) -> Result<DetectResult, Self::Error> {
    if self.fail_inference {
      return Err(ScriptedFailure);
    }
    Ok(DetectResult::from(self.detections.clone()))
  }
}

fn image(width: u32, height: u32) -> WireImage {
  WireImage {
    header: Header::now("camera"),
    height,
    width,
    encoding: "bgr8".into(),
    is_bigendian: 0,
    step: width * 3,
    data: vec![0; (width * height * 3) as usize],
  }
}

fn empty_image() -> WireImage {
  WireImage {
    header: Header::now("camera"),
    encoding: "bgr8".into(),
    ..Default::default()
  }
}

fn sample_detection() -> DetectItem {
  DetectItem {
    class_index: 4,
    score: 0.9,
    bbox: [10.0, 10.0, 50.0, 60.0],
    mask: Some(Mask {
      width: 2,
      height: 2,
      data: vec![0.0, 1.0, 1.0, 0.0],
    }),
  }
}

fn bridge(
  engine: ScriptedEngine,
  precision: Precision,
  visualize: bool,
) -> (Bridge<ScriptedEngine, MemoryOutput>, MemoryOutput) {
  let output = MemoryOutput::default();
  (Bridge::new(engine, precision, visualize, output.clone()), output)
}

fn control() -> (Sender<String>, Receiver<String>) {
  mpsc::channel()
}

#[test]
fn empty_frames_are_discarded_without_touching_state() {
  let (mut bridge, output) = bridge(ScriptedEngine::default(), Precision::Detection, false);
  let before = *bridge.state();

  assert_eq!(bridge.process(&empty_image()).unwrap(), Processed::Discarded);

  assert!(output.is_empty());
  assert_eq!(*bridge.state(), before);
  assert!(!bridge.state().is_initialized());
  assert!(bridge.engine().sessions.is_empty());
}

#[test]
fn first_frame_initializes_engine_exactly_once() {
  let (mut bridge, output) = bridge(ScriptedEngine::default(), Precision::Detection, false);

  bridge.process(&empty_image()).unwrap();
  for _ in 0..3 {
    bridge.process(&image(64, 48)).unwrap();
  }

  let state = bridge.state();
  assert!(state.is_initialized());
  assert_eq!((state.expected_width(), state.expected_height()), (64, 48));
  assert_eq!(bridge.engine().sessions, vec![(64, 48)]);
  assert_eq!(output.len(), 3);
}

#[test]
fn geometry_change_fails_without_publishing() {
  let (mut bridge, output) = bridge(ScriptedEngine::default(), Precision::Detection, false);
  bridge.process(&image(64, 48)).unwrap();

  for (w, h) in [(32, 48), (64, 32), (32, 32)] {
    let err = bridge.process(&image(w, h)).unwrap_err();
    assert!(matches!(
      err,
      BridgeError::GeometryChanged {
        expected: (64, 48),
        ..
      }
    ));
    assert!(err.is_fatal());
  }

  assert_eq!(output.len(), 1);
  assert_eq!(bridge.engine().sessions.len(), 1);
}

#[test]
fn classification_preserves_label_order() {
  let engine = ScriptedEngine {
    labels: vec!["a".into(), "b".into(), "c".into()],
    ..Default::default()
  };
  let (mut bridge, output) = bridge(engine, Precision::Classification, true);

  assert_eq!(
    bridge.process(&image(8, 8)).unwrap(),
    Processed::Published(Topic::Classification)
  );

  let messages = output.on(Topic::Classification);
  let [OutboundMessage::Classification(msg)] = messages.as_slice() else {
    panic!("expected one classification message, got {messages:?}");
  };
  assert_eq!(msg.object_names, vec!["a", "b", "c"]);
  assert_eq!(msg.header.frame_id, "camera");
}

#[test]
fn detection_level_publishes_boxes() {
  let engine = ScriptedEngine {
    detections: vec![sample_detection()],
    ..Default::default()
  };
  let (mut bridge, output) = bridge(engine, Precision::Detection, false);
  bridge.process(&image(100, 100)).unwrap();

  let messages = output.on(Topic::Detection);
  let [OutboundMessage::Detection(detection)] = messages.as_slice() else {
    panic!("expected one detection message, got {messages:?}");
  };
  assert_eq!(detection.class_indices, vec![4]);
  assert_eq!(detection.scores, vec![0.9]);
  assert_eq!(
    detection.bboxes,
    vec![RegionOfInterest {
      x_offset: 10,
      y_offset: 10,
      width: 40,
      height: 50,
      do_rectify: false,
    }]
  );
  assert!(detection.masks.is_empty());
}

#[test]
fn mask_level_publishes_aligned_masks() {
  let engine = ScriptedEngine {
    detections: vec![sample_detection()],
    ..Default::default()
  };
  let (mut bridge, output) = bridge(engine, Precision::DetectionWithMasks, false);
  bridge.process(&image(100, 100)).unwrap();

  let messages = output.on(Topic::DetectionWithMasks);
  let [OutboundMessage::DetectionWithMasks(detection)] = messages.as_slice() else {
    panic!("expected one detection-with-masks message, got {messages:?}");
  };
  assert_eq!(detection.class_indices, vec![4]);
  assert_eq!(detection.bboxes[0].width, 40);
  assert_eq!(detection.masks.len(), 1);
  assert_eq!(detection.masks[0].encoding, "32FC1");
  assert_eq!((detection.masks[0].width, detection.masks[0].height), (2, 2));
}

#[test]
fn visualize_mode_publishes_only_images() {
  let engine = ScriptedEngine {
    detections: vec![sample_detection()],
    ..Default::default()
  };
  let (mut bridge, output) = bridge(engine, Precision::DetectionWithMasks, true);
  bridge.process(&image(16, 12)).unwrap();

  assert_eq!(output.len(), 1);
  let messages = output.on(Topic::Visualization);
  let [OutboundMessage::Visualization(image)] = messages.as_slice() else {
    panic!("expected one visualization message, got {messages:?}");
  };
  assert_eq!(image.encoding, "bgr8");
  assert_eq!((image.width, image.height), (16, 12));
}

#[test]
fn per_frame_errors_do_not_stop_the_run() {
  let engine = ScriptedEngine {
    fail_inference: true,
    ..Default::default()
  };
  let (mut bridge, output) = bridge(engine, Precision::Detection, false);
  let mut bad_encoding = image(8, 8);
  bad_encoding.encoding = "yuv422".into();

  let (_tx, rx) = control();
  let summary = bridge
    .run(vec![bad_encoding, image(8, 8), image(8, 8)], &rx)
    .unwrap();

  assert_eq!(summary.failed, 3);
  assert_eq!(summary.published, 0);
  assert_eq!(summary.stop, StopReason::InputExhausted);
  assert!(output.is_empty());
  assert_eq!(bridge.engine().sessions, vec![(8, 8)]);
}

#[test]
fn run_stops_on_geometry_change() {
  let (mut bridge, output) = bridge(ScriptedEngine::default(), Precision::Detection, false);
  let (_tx, rx) = control();

  let result = bridge.run(vec![image(8, 8), empty_image(), image(4, 4), image(8, 8)], &rx);

  assert!(matches!(result, Err(BridgeError::GeometryChanged { .. })));
  assert_eq!(output.len(), 1);
}

#[test]
fn shutdown_command_stops_the_run() {
  let (mut bridge, output) = bridge(ScriptedEngine::default(), Precision::Detection, false);
  let (tx, rx) = control();
  tx.send("shutdown".into()).unwrap();

  let summary = bridge.run(vec![image(8, 8)], &rx).unwrap();

  assert_eq!(summary.stop, StopReason::Shutdown);
  assert!(output.is_empty());
}

#[test]
fn invalid_commands_are_ignored() {
  let (mut bridge, output) = bridge(ScriptedEngine::default(), Precision::Detection, false);
  let (tx, rx) = control();
  tx.send("restart".into()).unwrap();
  tx.send("SHUTDOWN".into()).unwrap();

  let summary = bridge.run(vec![image(8, 8), image(8, 8)], &rx).unwrap();

  assert_eq!(summary.stop, StopReason::InputExhausted);
  assert_eq!(summary.published, 2);
  assert_eq!(output.len(), 2);
}

#[test]
fn invalid_command_alone_publishes_nothing() {
  let (mut bridge, output) = bridge(ScriptedEngine::default(), Precision::Detection, false);
  let (tx, rx) = control();
  tx.send("pause".into()).unwrap();

  let summary = bridge.run(Vec::new(), &rx).unwrap();

  assert_eq!(summary.stop, StopReason::InputExhausted);
  assert!(output.is_empty());
}

#[test]
fn frame_limit_counts_every_frame() {
  let (bridge, output) = bridge(ScriptedEngine::default(), Precision::Detection, false);
  let mut bridge = bridge.with_frame_number(Some(2));
  let (_tx, rx) = control();

  let summary = bridge
    .run(vec![empty_image(), image(8, 8), image(8, 8)], &rx)
    .unwrap();

  assert_eq!(summary.stop, StopReason::FrameLimit);
  assert_eq!(summary.discarded, 1);
  assert_eq!(output.len(), 1);
}

#[test]
fn frames_arrive_through_a_channel_in_order() {
  let engine = ScriptedEngine {
    labels: vec!["only".into()],
    ..Default::default()
  };
  let (mut bridge, output) = bridge(engine, Precision::Classification, false);
  let (frame_tx, frame_rx) = mpsc::channel();
  for id in ["first", "second", "third"] {
    let mut frame = image(4, 4);
    frame.header.frame_id = id.into();
    frame_tx.send(frame).unwrap();
  }
  drop(frame_tx);

  let (_tx, rx) = control();
  bridge.run(frame_rx, &rx).unwrap();

  let ids: Vec<String> = output
    .messages()
    .iter()
    .map(|m| m.header().frame_id.clone())
    .collect();
  assert_eq!(ids, vec!["first", "second", "third"]);
}
