//! Pipeline Regression Tests
//!
//! Drives the public library API end-to-end: scripted line streams go
//! through a real `LineLink` over an in-memory duplex pipe, and the bytes
//! the device would receive are read back from the other end.

use std::sync::{Arc, Mutex};

use accelmon::acquisition::{LineLink, LineSource};
use accelmon::classifier::{Classifier, ClassifierError};
use accelmon::config::MonitorConfig;
use accelmon::pipeline::{AnalysisError, StreamProcessor};
use accelmon::processing::Calibrator;
use accelmon::sensors::{SyntheticAccelerometer, VibrationPhase};
use accelmon::types::{Bias, ClassLabel, FeatureVector};
use tokio::io::{AsyncReadExt, AsyncWriteExt, DuplexStream};
use tokio_util::sync::CancellationToken;

/// Labels a window FAULT 1 when the x-axis peak exceeds 20, and keeps a
/// copy of every feature vector it sees.
#[derive(Clone, Default)]
struct PeakClassifier {
    seen: Arc<Mutex<Vec<FeatureVector>>>,
}

impl Classifier for PeakClassifier {
    fn classify(&self, features: &FeatureVector) -> Result<ClassLabel, ClassifierError> {
        self.seen.lock().unwrap().push(*features);
        Ok(if features.x.max > 20.0 { ClassLabel(2) } else { ClassLabel(0) })
    }
}

struct FailingClassifier;

impl Classifier for FailingClassifier {
    fn classify(&self, _features: &FeatureVector) -> Result<ClassLabel, ClassifierError> {
        Err(ClassifierError::NonFinite)
    }
}

fn lines(n: usize, x: f64) -> String {
    (0..n).map(|_| format!("{x},0,0\r\n")).collect()
}

/// Link whose input is `input` followed by end of stream. The returned
/// peer receives whatever the link sends.
async fn scripted_link(input: &str) -> (LineLink<DuplexStream>, DuplexStream) {
    let (link_side, mut device) = tokio::io::duplex(1 << 20);
    device.write_all(input.as_bytes()).await.unwrap();
    device.shutdown().await.unwrap();
    (LineLink::new(link_side, "duplex"), device)
}

async fn sent_bytes(link: LineLink<DuplexStream>, mut device: DuplexStream) -> Vec<u8> {
    link.close().await.unwrap();
    let mut sent = Vec::new();
    device.read_to_end(&mut sent).await.unwrap();
    sent
}

#[tokio::test]
async fn spike_in_last_step_shows_in_first_window() {
    let classifier = PeakClassifier::default();
    let seen = classifier.seen.clone();
    let config = MonitorConfig::default();
    let mut processor = StreamProcessor::from_config(classifier, Bias::ZERO, &config).unwrap();

    let input = lines(100, 1.0) + &lines(30, 50.0);
    let (mut link, device) = scripted_link(&input).await;
    let stats = processor.run(&mut link, &CancellationToken::new()).await.unwrap();

    assert_eq!(stats.lines_read, 130);
    assert_eq!(stats.windows_classified, 1);

    let seen = seen.lock().unwrap();
    let x = seen[0].x;
    assert_eq!(x.max, 50.0);
    // window = 70 baseline samples + the 30 spike samples
    let expected_rms = ((70.0 + 30.0 * 2500.0) / 100.0_f64).sqrt();
    assert!((x.rms - expected_rms).abs() < 1e-9);
    let mean = (70.0 + 30.0 * 50.0) / 100.0;
    let expected_std = ((70.0 * (1.0_f64 - mean).powi(2) + 30.0 * (50.0_f64 - mean).powi(2)) / 100.0).sqrt();
    assert!((x.std - expected_std).abs() < 1e-9);
    drop(seen);

    // one window is far below the confirmation threshold
    assert!(sent_bytes(link, device).await.is_empty());
}

#[tokio::test]
async fn sustained_fault_sends_one_command() {
    let config = MonitorConfig::default();
    let mut processor = StreamProcessor::from_config(PeakClassifier::default(), Bias::ZERO, &config).unwrap();

    // windows at 130 (normal) then 160..=280 (fault, five in a row)
    let input = lines(130, 1.0) + &lines(150, 60.0) + &lines(30, 60.0);
    let (mut link, device) = scripted_link(&input).await;
    let stats = processor.run(&mut link, &CancellationToken::new()).await.unwrap();

    assert_eq!(stats.windows_classified, 7);
    assert_eq!(stats.actions_sent, 1);
    assert_eq!(processor.debouncer().confirmed(), Some(ClassLabel(2)));
    assert_eq!(sent_bytes(link, device).await, b"ATFA");
}

#[tokio::test]
async fn malformed_lines_do_not_shift_windows() {
    let config = MonitorConfig::default();
    let clean = lines(130, 3.0);
    let noisy: String = clean
        .lines()
        .enumerate()
        .map(|(i, l)| {
            if i % 10 == 0 {
                format!("garbage\r\n{l}\r\n,,\r\n")
            } else {
                format!("{l}\r\n")
            }
        })
        .collect();

    let classifier = PeakClassifier::default();
    let seen = classifier.seen.clone();
    let mut processor = StreamProcessor::from_config(classifier, Bias::ZERO, &config).unwrap();
    let (mut link, _device) = scripted_link(&noisy).await;
    let stats = processor.run(&mut link, &CancellationToken::new()).await.unwrap();

    assert_eq!(stats.lines_read, 130 + 26);
    assert_eq!(stats.lines_skipped, 26);
    assert_eq!(stats.windows_classified, 1);
    assert_eq!(seen.lock().unwrap()[0].x.max, 3.0);
}

#[tokio::test]
async fn bias_is_subtracted_before_features() {
    let config = MonitorConfig::default();
    let classifier = PeakClassifier::default();
    let seen = classifier.seen.clone();
    let bias = Bias::new(-130.0, -85.0, 935.0);
    let mut processor = StreamProcessor::from_config(classifier, bias, &config).unwrap();

    let input: String = (0..130).map(|_| "-130,-85,935\r\n").collect();
    let (mut link, _device) = scripted_link(&input).await;
    processor.run(&mut link, &CancellationToken::new()).await.unwrap();

    let fv = seen.lock().unwrap()[0];
    assert_eq!(fv.to_array(), [0.0; 9]);
}

#[tokio::test]
async fn classifier_failure_aborts_session() {
    let config = MonitorConfig::default();
    let mut processor = StreamProcessor::from_config(FailingClassifier, Bias::ZERO, &config).unwrap();

    let (mut link, _device) = scripted_link(&lines(200, 1.0)).await;
    let err = processor.run(&mut link, &CancellationToken::new()).await.unwrap_err();

    assert!(matches!(err, AnalysisError::Classifier(ClassifierError::NonFinite)));
    assert_eq!(processor.stats().lines_read, 130);
}

#[tokio::test]
async fn calibration_recovers_simulated_offset() {
    let offset = Bias::new(-130.0, -85.0, 935.0);
    let mut sensor = SyntheticAccelerometer::new(offset, Some(11)).with_malformed_rate(0.05);
    sensor.set_phase(VibrationPhase::Normal);
    let input: String = (0..1200).map(|_| sensor.next_line()).collect();

    let (mut link, _device) = scripted_link(&input).await;
    link.discard_input().await.unwrap();
    let bias = Calibrator::new(1000)
        .run(&mut link, &CancellationToken::new())
        .await
        .unwrap();

    assert!((bias.x - offset.x).abs() < 1.0, "x = {}", bias.x);
    assert!((bias.y - offset.y).abs() < 1.0, "y = {}", bias.y);
    assert!((bias.z - offset.z).abs() < 1.0, "z = {}", bias.z);
}

#[tokio::test]
async fn cancel_stops_an_idle_session() {
    let config = MonitorConfig::default();
    let mut processor = StreamProcessor::from_config(PeakClassifier::default(), Bias::ZERO, &config).unwrap();

    // peer never writes and never closes
    let (link_side, _device) = tokio::io::duplex(64);
    let mut link = LineLink::new(link_side, "idle");
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        trigger.cancel();
    });

    let stats = processor.run(&mut link, &cancel).await.unwrap();
    assert_eq!(stats.lines_read, 0);
}
