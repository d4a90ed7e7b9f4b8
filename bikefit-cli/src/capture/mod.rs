// Recorded pose streams: a capture device over a JSONL file and the task
// that feeds its frames to the controller

use anyhow::{Context, Result};
use bikefit::models::PoseFrame;
use bikefit::services::CaptureDevice;
use bikefit::CaptureError;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

/// A recorded pose stream standing in for the camera
pub struct ReplayDevice {
    path: PathBuf,
    open: bool,
}

impl ReplayDevice {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            open: false,
        }
    }

    pub fn is_open(&self) -> bool {
        self.open
    }
}

impl CaptureDevice for ReplayDevice {
    fn open(&mut self) -> Result<(), CaptureError> {
        match std::fs::metadata(&self.path) {
            Ok(meta) if meta.is_file() => {
                self.open = true;
                Ok(())
            }
            Ok(_) => Err(CaptureError::Unavailable(format!(
                "{} is not a file",
                self.path.display()
            ))),
            Err(err) if err.kind() == std::io::ErrorKind::PermissionDenied => {
                Err(CaptureError::PermissionDenied(self.path.display().to_string()))
            }
            Err(err) => Err(CaptureError::Unavailable(format!(
                "{}: {}",
                self.path.display(),
                err
            ))),
        }
    }

    fn close(&mut self) {
        self.open = false;
    }
}

/// Parse one line of a recording; blank lines carry no frame
pub fn parse_frame(line: &str) -> Result<Option<PoseFrame>> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    let frame = serde_json::from_str(line).context("Invalid pose frame")?;
    Ok(Some(frame))
}

/// Read a recording and send its frames in order
///
/// With `realtime` the gaps between frame timestamps are slept, so throttles
/// see the stream at its recorded pace. Returns the number of frames sent;
/// stops early when the receiver goes away.
pub async fn stream_frames(path: &Path, tx: mpsc::Sender<PoseFrame>, realtime: bool) -> Result<usize> {
    let file = tokio::fs::File::open(path)
        .await
        .with_context(|| format!("Failed to open recording {}", path.display()))?;
    let mut lines = BufReader::new(file).lines();

    let mut sent = 0;
    let mut previous_ts: Option<u64> = None;
    let mut line_no = 0;

    while let Some(line) = lines.next_line().await.context("Failed to read recording")? {
        line_no += 1;
        let Some(frame) = parse_frame(&line).with_context(|| format!("Line {}", line_no))? else {
            continue;
        };

        if realtime {
            if let Some(previous) = previous_ts {
                let gap = frame.timestamp_ms.saturating_sub(previous);
                tokio::time::sleep(Duration::from_millis(gap)).await;
            }
        }
        previous_ts = Some(frame.timestamp_ms);

        if tx.send(frame).await.is_err() {
            tracing::debug!("Frame receiver closed after {} frames", sent);
            break;
        }
        sent += 1;
    }

    Ok(sent)
}
