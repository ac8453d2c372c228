// End-to-end saves against a synthetic FFmpeg test source
//
// Skipped when ffmpeg or ffprobe are not on PATH.

use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::atomic::AtomicBool;

use tempfile::TempDir;

use region_fx::{
    config::Config,
    error::{RegionFxError, SaveError},
    region::Point,
    save::{run_save, SaveProgress, SaveReport, SaveRunner, TransformWindow},
    session::Session,
    transform::TransformMode,
    video,
};

fn tools_available() -> bool {
    let available = video::check_tool_available("ffmpeg") && video::check_tool_available("ffprobe");
    if !available {
        eprintln!("ffmpeg/ffprobe not found, skipping");
    }
    available
}

/// 1920x1080, 30 fps, 10 s test pattern with a sine audio track
fn make_source(dir: &Path) -> PathBuf {
    let path = dir.join("source.mp4");
    let status = Command::new("ffmpeg")
        .args(["-hide_banner", "-loglevel", "error", "-y"])
        .args(["-f", "lavfi", "-i", "testsrc=size=1920x1080:rate=30:duration=10"])
        .args(["-f", "lavfi", "-i", "sine=frequency=440:duration=10"])
        .args(["-c:v", "libx264", "-preset", "ultrafast", "-pix_fmt", "yuv420p"])
        .args(["-c:a", "aac", "-shortest"])
        .arg(&path)
        .status()
        .expect("failed to run ffmpeg");
    assert!(status.success(), "could not generate test source");
    path
}

fn open_session(dir: &TempDir, source: &Path, start: f64, output: &str) -> Session {
    let mut config = Config::default();
    config.output.path = dir.path().join(output);
    Session::open(config, source, start).expect("session should open")
}

fn select_scenario_rect(session: &mut Session) {
    session.press(Point::new(100.0, 100.0));
    session.drag(Point::new(200.0, 180.0));
    session.release(Some(Point::new(301.0, 241.0)));
}

fn save(session: &Session, mode: TransformMode) -> region_fx::Result<SaveReport> {
    let request = session.build_request(mode)?;
    run_save(&request, &AtomicBool::new(false), &|_| {})
}

#[test]
fn test_crop_and_mosaic_scenario() {
    if !tools_available() {
        return;
    }
    let dir = TempDir::new().unwrap();
    let source = make_source(dir.path());

    let mut session = open_session(&dir, &source, 2.0, "crop.mov");
    assert_eq!(session.preview().dimensions(), (1920, 1080));
    select_scenario_rect(&mut session);
    session.duration_input = "3.0".to_string();

    let report = save(&session, TransformMode::Crop).unwrap();
    assert_eq!((report.width, report.height), (200, 140));
    assert_eq!(report.frames_written, 90);
    assert!(!report.truncated);

    let crop = video::probe(&session.config().tools, &report.output).unwrap();
    assert_eq!((crop.width, crop.height), (200, 140));
    assert!(crop.has_audio, "crop output should carry the source audio");
    if let Some(frames) = crop.frame_count {
        assert!(frames.abs_diff(90) <= 1, "crop output has {frames} frames");
    }

    let mut session = open_session(&dir, &source, 2.0, "mosaic.mov");
    select_scenario_rect(&mut session);
    session.duration_input = "3.0".to_string();

    let report = save(&session, TransformMode::Mosaic).unwrap();
    assert_eq!((report.width, report.height), (1920, 1080));

    let mosaic = video::probe(&session.config().tools, &report.output).unwrap();
    assert_eq!((mosaic.width, mosaic.height), (1920, 1080));
    assert!(!mosaic.has_audio);
    if let Some(frames) = mosaic.frame_count {
        assert!(frames.abs_diff(90) <= 1, "mosaic output has {frames} frames");
    }
}

#[test]
fn test_second_save_replaces_output() {
    if !tools_available() {
        return;
    }
    let dir = TempDir::new().unwrap();
    let source = make_source(dir.path());

    let mut session = open_session(&dir, &source, 0.0, "output.mov");
    select_scenario_rect(&mut session);
    session.duration_input = "1".to_string();
    save(&session, TransformMode::Mosaic).unwrap();

    let report = save(&session, TransformMode::Crop).unwrap();
    let replaced = video::probe(&session.config().tools, &report.output).unwrap();
    assert_eq!((replaced.width, replaced.height), (200, 140));
}

#[test]
fn test_window_past_end_is_truncated() {
    if !tools_available() {
        return;
    }
    let dir = TempDir::new().unwrap();
    let source = make_source(dir.path());

    let mut session = open_session(&dir, &source, 9.0, "short.mov");
    select_scenario_rect(&mut session);
    session.duration_input = "5".to_string();

    let report = save(&session, TransformMode::Crop).unwrap();
    assert!(report.truncated);
    assert_eq!(report.frames_requested, 150);
    assert!(report.frames_written <= 30, "wrote {}", report.frames_written);
}

#[test]
fn test_mosaic_window_past_end_is_truncated() {
    if !tools_available() {
        return;
    }
    let dir = TempDir::new().unwrap();
    let source = make_source(dir.path());

    let mut session = open_session(&dir, &source, 9.0, "short_mosaic.mov");
    select_scenario_rect(&mut session);
    session.duration_input = "5".to_string();

    let report = save(&session, TransformMode::Mosaic).unwrap();
    assert!(report.truncated);
    assert_eq!((report.width, report.height), (1920, 1080));
    assert!(report.frames_written > 0 && report.frames_written <= 30, "wrote {}", report.frames_written);

    let out = video::probe(&session.config().tools, &report.output).unwrap();
    assert_eq!((out.width, out.height), (1920, 1080));
}

#[test]
fn test_window_starting_after_end_writes_nothing() {
    if !tools_available() {
        return;
    }
    let dir = TempDir::new().unwrap();
    let source = make_source(dir.path());

    let mut session = open_session(&dir, &source, 0.0, "empty.mov");
    select_scenario_rect(&mut session);
    session.duration_input = "1".to_string();

    let mut request = session.build_request(TransformMode::Crop).unwrap();
    request.window = TransformWindow::new(request.source.frame_rate, 12.0, 1.0).unwrap();
    let output = request.output().clone();

    let result = run_save(&request, &AtomicBool::new(false), &|_| {});
    assert!(
        matches!(result, Err(RegionFxError::Save(SaveError::NoFrames { .. }))),
        "unexpected result {result:?}"
    );
    assert!(!output.exists());
}

#[tokio::test(flavor = "multi_thread")]
async fn test_runner_reports_progress_to_completion() {
    if !tools_available() {
        return;
    }
    let dir = TempDir::new().unwrap();
    let source = make_source(dir.path());

    let mut session = open_session(&dir, &source, 1.0, "progress.mov");
    select_scenario_rect(&mut session);
    session.duration_input = "1".to_string();
    let request = session.build_request(TransformMode::Mosaic).unwrap();

    let mut runner = SaveRunner::new(tokio::runtime::Handle::current());
    runner.start(request).unwrap();

    let mut updates: Vec<SaveProgress> = Vec::new();
    let report = runner
        .wait(|progress| updates.push(progress))
        .await
        .expect("a save was running")
        .unwrap();

    assert_eq!(report.frames_written, 30);
    let last = updates.last().copied().expect("no progress reported");
    assert_eq!(last.frames_written, last.frames_requested);
    assert_eq!(last.frames_requested, 30);
    assert!(
        updates.windows(2).all(|w| w[1].frames_written > w[0].frames_written),
        "progress went backwards: {updates:?}"
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn test_cancel_removes_partial_output() {
    if !tools_available() {
        return;
    }
    let dir = TempDir::new().unwrap();
    let source = make_source(dir.path());

    let mut session = open_session(&dir, &source, 0.0, "cancelled.mov");
    select_scenario_rect(&mut session);
    session.duration_input = "10".to_string();
    let request = session.build_request(TransformMode::Mosaic).unwrap();
    let output = request.output().clone();

    let mut runner = SaveRunner::new(tokio::runtime::Handle::current());
    runner.start(request).unwrap();
    runner.cancel();

    let result = runner.wait(|_| {}).await.expect("a save was running");
    assert!(matches!(result, Err(RegionFxError::Save(SaveError::Cancelled { .. }))));
    assert!(!output.exists());
}
