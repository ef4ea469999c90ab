use anyhow::{Context, Result};
use std::ffi::{OsStr, OsString};
use std::io::{Read, Write};
use std::path::Path;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread::{self, JoinHandle};

use crate::config::OutputConfig;

/// Pipes raw RGBA frames into an ffmpeg child process.
///
/// stderr is drained on a background thread for the lifetime of the child and
/// reported from [`finish`](Self::finish) or [`abort`](Self::abort).
pub struct FfmpegEncoder {
    child: Child,
    stderr: Option<JoinHandle<Vec<u8>>>,
    frame_bytes: usize,
}

impl FfmpegEncoder {
    pub fn new(output_path: &Path, width: u32, height: u32, frame_rate: &str, output: &OutputConfig) -> Result<Self> {
        let args = ffmpeg_args(output_path, width, height, frame_rate, output);
        let encoder = Self::spawn(OsStr::new("ffmpeg"), &args, width as usize * height as usize * 4)
            .context("Failed to spawn ffmpeg. Is ffmpeg installed?")?;

        log::info!(
            "FFmpeg encoder started: {}x{} @ {} fps, codec={}",
            width, height, frame_rate, output.codec
        );
        Ok(encoder)
    }

    fn spawn(program: &OsStr, args: &[OsString], frame_bytes: usize) -> Result<Self> {
        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()?;

        let stderr = child.stderr.take().map(|mut pipe| {
            thread::spawn(move || {
                let mut buf = Vec::new();
                let _ = pipe.read_to_end(&mut buf);
                buf
            })
        });

        Ok(Self {
            child,
            stderr,
            frame_bytes,
        })
    }

    pub fn write_frame(&mut self, rgba_pixels: &[u8]) -> Result<()> {
        if rgba_pixels.len() != self.frame_bytes {
            anyhow::bail!(
                "Frame is {} bytes, encoder expects {}",
                rgba_pixels.len(),
                self.frame_bytes
            );
        }
        let stdin = self.child.stdin.as_mut().context("FFmpeg stdin not available")?;
        stdin.write_all(rgba_pixels).context("Failed to write frame to ffmpeg")?;
        Ok(())
    }

    pub fn finish(mut self) -> Result<()> {
        let (status, stderr) = self.shutdown()?;
        if !status.success() {
            anyhow::bail!("FFmpeg exited with error:\n{}", stderr);
        }

        log::info!("FFmpeg encoding complete");
        Ok(())
    }

    /// Shuts ffmpeg down after a failed write and attaches whatever it
    /// reported on stderr to `err`.
    pub fn abort(mut self, err: anyhow::Error) -> anyhow::Error {
        match self.shutdown() {
            Ok((status, stderr)) if stderr.is_empty() => err.context(format!("FFmpeg exited with {}", status)),
            Ok((status, stderr)) => err.context(format!("FFmpeg exited with {}:\n{}", status, stderr)),
            Err(wait_err) => err.context(format!("{:#}", wait_err)),
        }
    }

    fn shutdown(&mut self) -> Result<(ExitStatus, String)> {
        // Close stdin to signal EOF
        drop(self.child.stdin.take());

        let status = self.child.wait().context("Failed to wait for ffmpeg")?;
        let stderr = self
            .stderr
            .take()
            .and_then(|reader| reader.join().ok())
            .unwrap_or_default();
        Ok((status, String::from_utf8_lossy(&stderr).trim_end().to_string()))
    }
}

fn ffmpeg_args(output_path: &Path, width: u32, height: u32, frame_rate: &str, output: &OutputConfig) -> Vec<OsString> {
    let video_size = format!("{}x{}", width, height);
    let crf = output.crf.to_string();
    let mut args: Vec<OsString> = [
        "-y",
        "-hide_banner",
        "-nostats",
        "-f", "rawvideo",
        "-pixel_format", "rgba",
        "-video_size", video_size.as_str(),
        "-framerate", frame_rate,
        "-i", "pipe:0",
        "-c:v", output.codec.as_str(),
        "-pix_fmt", output.pix_fmt.as_str(),
        "-crf", crf.as_str(),
        "-preset", "medium",
        "-an",
    ]
    .iter()
    .map(OsString::from)
    .collect();
    args.push(output_path.as_os_str().to_os_string());
    args
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn args_describe_rawvideo_input_without_audio() {
        let args = ffmpeg_args(Path::new("out.mp4"), 1280, 720, "44100/2048", &OutputConfig::default());
        let args: Vec<String> = args.iter().map(|a| a.to_string_lossy().into_owned()).collect();

        let value_after = |flag: &str| {
            let pos = args.iter().position(|a| a == flag).unwrap();
            args[pos + 1].clone()
        };
        assert_eq!(value_after("-video_size"), "1280x720");
        assert_eq!(value_after("-framerate"), "44100/2048");
        assert_eq!(value_after("-c:v"), "libx264");
        assert_eq!(value_after("-crf"), "18");
        assert!(args.contains(&"-an".to_string()));
        assert!(args.contains(&"-nostats".to_string()));
        assert_eq!(args.last().map(String::as_str), Some("out.mp4"));
    }

    #[cfg(unix)]
    fn shell(script: &str) -> Vec<OsString> {
        vec![OsString::from("-c"), OsString::from(script)]
    }

    #[cfg(unix)]
    #[test]
    fn chatty_stderr_does_not_stall_frame_writes() {
        use std::sync::mpsc;
        use std::time::Duration;

        let frame_bytes = 256 * 256 * 4;
        let script = shell("head -c 200000 /dev/zero >&2; cat >/dev/null");
        let (tx, rx) = mpsc::channel();
        thread::spawn(move || {
            let result = (|| {
                let mut encoder = FfmpegEncoder::spawn(OsStr::new("sh"), &script, frame_bytes)?;
                let frame = vec![0u8; frame_bytes];
                for _ in 0..4 {
                    encoder.write_frame(&frame)?;
                }
                encoder.finish()
            })();
            let _ = tx.send(result.is_ok());
        });
        assert_eq!(rx.recv_timeout(Duration::from_secs(10)), Ok(true));
    }

    #[cfg(unix)]
    #[test]
    fn failed_run_reports_stderr() {
        let script = shell("echo 'Unknown encoder libnope' >&2; exit 1");
        let encoder = FfmpegEncoder::spawn(OsStr::new("sh"), &script, 4).unwrap();
        let err = encoder.finish().unwrap_err();
        assert!(err.to_string().contains("Unknown encoder libnope"));
    }

    #[cfg(unix)]
    #[test]
    fn abort_attaches_stderr_to_write_error() {
        let script = shell("echo 'Unknown encoder libnope' >&2; exit 1");
        let encoder = FfmpegEncoder::spawn(OsStr::new("sh"), &script, 4).unwrap();
        let err = encoder.abort(anyhow::anyhow!("Failed to write frame to ffmpeg"));
        let report = format!("{:#}", err);
        assert!(report.contains("Unknown encoder libnope"));
        assert!(report.contains("Failed to write frame to ffmpeg"));
    }

    #[cfg(unix)]
    #[test]
    fn wrong_frame_size_is_rejected() {
        let mut encoder = FfmpegEncoder::spawn(OsStr::new("sh"), &shell("cat >/dev/null"), 16).unwrap();
        assert!(encoder.write_frame(&[0u8; 8]).is_err());
        assert!(encoder.write_frame(&[0u8; 16]).is_ok());
        assert!(encoder.finish().is_ok());
    }
}
