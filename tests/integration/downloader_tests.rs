/*!
 * Integration tests for the yutto downloader subprocess
 */

use anyhow::Result;
use subdigest::downloader::{SubtitleSource, YuttoDownloader};
use subdigest::errors::DownloadError;
use subdigest::video::VideoReference;
use crate::common;

fn video() -> VideoReference {
    VideoReference::parse("https://www.bilibili.com/video/BV1xx411c7mD")
}

/// Shell script standing in for yutto: writes the given files under `--dir`
#[cfg(unix)]
fn fake_yutto(dir: &std::path::Path, body: &str) -> Result<String> {
    let script = format!(
        "out=''\nwhile [ $# -gt 0 ]; do\n  if [ \"$1\" = \"--dir\" ]; then shift; out=\"$1\"; fi\n  shift\ndone\n{}\n",
        body
    );
    let path = common::create_test_file(dir, "fake_yutto.sh", &script)?;
    Ok(format!("sh {}", path.display()))
}

/// Test that an empty SESSDATA is rejected before anything runs
#[tokio::test]
async fn test_fetch_withEmptySessdata_shouldFailFast() {
    let downloader = YuttoDownloader::new("definitely-not-installed-tool", 5, None);
    let result = downloader.fetch(&video(), "  ").await;

    assert!(matches!(result, Err(DownloadError::MissingSessdata)));
}

/// Test that a missing binary is reported as such
#[tokio::test]
async fn test_fetch_withMissingBinary_shouldReturnToolMissing() {
    let downloader = YuttoDownloader::new("definitely-not-installed-tool", 5, None);
    let result = downloader.fetch(&video(), "token").await;

    match result {
        Err(DownloadError::ToolMissing { tool, .. }) => assert_eq!(tool, "definitely-not-installed-tool"),
        other => panic!("expected missing tool, got {:?}", other),
    }
}

/// Test that SRT files are collected from nested directories
#[cfg(unix)]
#[tokio::test]
async fn test_fetch_withFakeTool_shouldCollectSrtFiles() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let out_dir = temp_dir.path().join("out");
    let tool = fake_yutto(
        temp_dir.path(),
        "mkdir -p \"$out/video\"\nprintf '1\\n00:00:01,000 --> 00:00:02,000\\nhi\\n' > \"$out/video/zh.srt\"\necho '[Script Info]' > \"$out/video/zh.ass\"",
    )?;
    let downloader = YuttoDownloader::new(tool, 30, Some(out_dir.clone()));

    let downloaded = downloader.fetch(&video(), "token").await?;

    assert_eq!(downloaded.subtitle_files.len(), 1);
    assert!(downloaded.subtitle_files[0].ends_with("video/zh.srt"));
    assert!(!downloaded.is_temporary());
    assert_eq!(downloaded.video, video());
    Ok(())
}

/// Test the ASS fallback when no SRT was produced
#[cfg(unix)]
#[tokio::test]
async fn test_fetch_withOnlyAss_shouldFallBackToAss() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let tool = fake_yutto(temp_dir.path(), "echo '[Script Info]' > \"$out/zh.ass\"")?;
    let downloader = YuttoDownloader::new(tool, 30, Some(temp_dir.path().join("out")));

    let downloaded = downloader.fetch(&video(), "token").await?;

    assert_eq!(downloaded.subtitle_files.len(), 1);
    assert!(downloaded.subtitle_files[0].ends_with("zh.ass"));
    Ok(())
}

/// Test that the temporary directory is removed with the result
#[cfg(unix)]
#[tokio::test]
async fn test_fetch_withoutOutputDir_shouldCleanUpTempDir() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let tool = fake_yutto(temp_dir.path(), "printf '1\\n00:00:01,000 --> 00:00:02,000\\nhi\\n' > \"$out/a.srt\"")?;
    let downloader = YuttoDownloader::new(tool, 30, None);

    let downloaded = downloader.fetch(&video(), "token").await?;
    let dir = downloaded.output_dir.clone();
    assert!(downloaded.is_temporary());
    assert!(dir.join("a.srt").is_file());

    drop(downloaded);
    assert!(!dir.exists());
    Ok(())
}

/// Test that a run producing nothing is reported
#[cfg(unix)]
#[tokio::test]
async fn test_fetch_withNoOutput_shouldReturnNoSubtitles() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let tool = fake_yutto(temp_dir.path(), "true")?;
    let downloader = YuttoDownloader::new(tool, 30, Some(temp_dir.path().join("out")));

    let result = downloader.fetch(&video(), "token").await;
    assert!(matches!(result, Err(DownloadError::NoSubtitles(_))));
    Ok(())
}

/// Test that a failing tool surfaces its stderr
#[cfg(unix)]
#[tokio::test]
async fn test_fetch_withFailingTool_shouldReturnStderr() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let tool = fake_yutto(temp_dir.path(), "echo 'SESSDATA expired' >&2\nexit 3")?;
    let downloader = YuttoDownloader::new(tool, 30, Some(temp_dir.path().join("out")));

    match downloader.fetch(&video(), "token").await {
        Err(DownloadError::ToolFailed { tool, stderr }) => {
            assert_eq!(tool, "sh");
            assert_eq!(stderr, "SESSDATA expired");
        }
        other => panic!("expected tool failure, got {:?}", other),
    }
    Ok(())
}

/// Test that a hanging tool is stopped by the timeout
#[cfg(unix)]
#[tokio::test]
async fn test_fetch_withSlowTool_shouldTimeOut() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let tool = fake_yutto(temp_dir.path(), "sleep 10")?;
    let downloader = YuttoDownloader::new(tool, 1, Some(temp_dir.path().join("out")));

    let result = downloader.fetch(&video(), "token").await;
    assert!(matches!(result, Err(DownloadError::Timeout { secs: 1, .. })));
    Ok(())
}
