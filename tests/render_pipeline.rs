use image::RgbImage;
use pulseframe::media::{self, ffmpeg::RenderOptions, probe};
use pulseframe::render::{remix, slideshow};
use std::path::Path;
use std::process::Command;

/// Skip integration tests on machines without the external tools.
fn ffmpeg_available() -> bool {
    let missing = media::health::check_dependencies();
    if !missing.is_empty() {
        eprintln!("skipping: missing external tools {:?}", missing);
        return false;
    }
    true
}

/// Generate a short test-pattern video with ffmpeg's lavfi source.
fn make_test_video(path: &Path, secs: u32, fps: u32) {
    let status = Command::new("ffmpeg")
        .args([
            "-y",
            "-f",
            "lavfi",
            "-i",
            &format!("testsrc=duration={}:size=320x240:rate={}", secs, fps),
            "-c:v",
            "libx264",
            "-pix_fmt",
            "yuv420p",
        ])
        .arg(path)
        .output()
        .expect("Failed to execute ffmpeg");
    if !status.status.success() {
        eprintln!("FFmpeg stderr: {}", String::from_utf8_lossy(&status.stderr));
        panic!("Failed to create test video");
    }
}

/// Generate a sine-tone WAV with ffmpeg's lavfi source.
fn make_test_audio(path: &Path, secs: u32) {
    let status = Command::new("ffmpeg")
        .args([
            "-y",
            "-f",
            "lavfi",
            "-i",
            &format!("sine=frequency=440:duration={}", secs),
        ])
        .arg(path)
        .output()
        .expect("Failed to execute ffmpeg");
    if !status.status.success() {
        eprintln!("FFmpeg stderr: {}", String::from_utf8_lossy(&status.stderr));
        panic!("Failed to create test audio");
    }
}

#[tokio::test]
async fn test_remix_pipeline_end_to_end() {
    if !ffmpeg_available() {
        return;
    }

    let dir = tempfile::tempdir().unwrap();
    let video = dir.path().join("input.mp4");
    let audio = dir.path().join("track.wav");
    let output = dir.path().join("out_remix.mp4");

    make_test_video(&video, 3, 12);
    make_test_audio(&audio, 2);

    let opts = remix::RemixOptions {
        cycle_secs: 2.0,
        height: 144,
        fade_secs: 1.0,
        fps: Some(12.0),
        render: RenderOptions::default(),
    };
    let summary = remix::render(&video, &audio, &output, opts)
        .await
        .expect("remix render failed");

    assert!(summary.output_path.exists());
    assert!(summary.size_mb > 0.0);

    // Target duration = min(video 3s, audio 2s + fade 1s) = 3s.
    let duration = probe::media_duration(&output).await.unwrap();
    assert!(
        (duration - 3.0).abs() < 0.5,
        "expected ~3s output, got {:.2}",
        duration
    );
}

#[tokio::test]
async fn test_remix_audio_longer_than_video() {
    if !ffmpeg_available() {
        return;
    }

    let dir = tempfile::tempdir().unwrap();
    let video = dir.path().join("input.mp4");
    let audio = dir.path().join("track.wav");
    let output = dir.path().join("out_remix.mp4");

    // Audio (4s) outlasts the video (2s): the container must end with
    // the video, not run on with audio over a frozen last frame.
    make_test_video(&video, 2, 12);
    make_test_audio(&audio, 4);

    let opts = remix::RemixOptions {
        cycle_secs: 2.0,
        height: 144,
        fade_secs: 1.0,
        fps: Some(12.0),
        render: RenderOptions::default(),
    };
    let summary = remix::render(&video, &audio, &output, opts)
        .await
        .expect("remix render failed");
    assert!((summary.duration - 2.0).abs() < 0.2);

    let duration = probe::media_duration(&output).await.unwrap();
    assert!(
        (duration - 2.0).abs() < 0.5,
        "expected ~2s output (video length), got {:.2}",
        duration
    );
}

#[tokio::test]
async fn test_slideshow_pipeline_end_to_end() {
    if !ffmpeg_available() {
        return;
    }

    let dir = tempfile::tempdir().unwrap();
    let images_dir = dir.path().join("images");
    std::fs::create_dir(&images_dir).unwrap();
    for (i, color) in [[200u8, 30, 30], [30, 200, 30], [30, 30, 200]]
        .iter()
        .enumerate()
    {
        let img = RgbImage::from_pixel(120, 90, image::Rgb(*color));
        img.save(images_dir.join(format!("img_{}.png", i))).unwrap();
    }

    let audio = dir.path().join("track.wav");
    make_test_audio(&audio, 2);
    let output = dir.path().join("out_slides.mp4");

    let opts = slideshow::SlideshowOptions {
        fps: 8.0,
        size: (64, 64),
        seed: 42,
        fade_secs: 0.5,
        render: RenderOptions::default(),
    };
    let summary = slideshow::render(&audio, &images_dir, &output, opts)
        .await
        .expect("slideshow render failed");

    assert!(summary.output_path.exists());
    assert!((summary.duration - 2.0).abs() < 0.25);

    let duration = probe::media_duration(&output).await.unwrap();
    assert!(
        (duration - 2.0).abs() < 0.5,
        "expected ~2s output, got {:.2}",
        duration
    );
}

#[tokio::test]
async fn test_slideshow_rejects_empty_image_folder() {
    if !ffmpeg_available() {
        return;
    }

    let dir = tempfile::tempdir().unwrap();
    let images_dir = dir.path().join("empty");
    std::fs::create_dir(&images_dir).unwrap();
    let audio = dir.path().join("track.wav");
    make_test_audio(&audio, 1);

    let result = slideshow::render(
        &audio,
        &images_dir,
        &dir.path().join("out.mp4"),
        slideshow::SlideshowOptions::default(),
    )
    .await;

    let err = result.expect_err("empty folder must fail");
    assert!(err.to_string().contains("No images"), "got: {}", err);
}
