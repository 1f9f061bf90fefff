use crate::encode::encoder::{EncoderBackend, EncoderEvent, EncoderSettings, StreamEncoder};
use crate::encode::format::VideoFormat;
use crate::foundation::error::{ReelError, ReelResult};
use crate::render::surface::flatten_premul_over_bg_to_opaque_rgba8;
use std::collections::{HashSet, VecDeque};
use std::io::{Read, Write as _};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdin, Command, Stdio};
use std::sync::mpsc;
use std::time::{Duration, Instant};

const READ_BUF_LEN: usize = 64 * 1024;

/// Encoders backed by the system `ffmpeg` binary.
///
/// Supported codecs and containers are discovered once, when the backend is created, from
/// `ffmpeg -encoders` and `ffmpeg -muxers`.
#[derive(Clone, Debug)]
pub struct FfmpegBackend {
    program: PathBuf,
    encoders: HashSet<String>,
    muxers: HashSet<String>,
    bg_rgba: [u8; 4],
}

impl FfmpegBackend {
    /// Probe `ffmpeg` on `PATH`.
    pub fn probe() -> ReelResult<Self> {
        Self::probe_program("ffmpeg")
    }

    pub fn probe_program(program: impl Into<PathBuf>) -> ReelResult<Self> {
        let program = program.into();
        let encoders = parse_capability_list(&run_listing(&program, "-encoders")?);
        let muxers = parse_capability_list(&run_listing(&program, "-muxers")?);
        tracing::debug!(
            program = %program.display(),
            encoders = encoders.len(),
            muxers = muxers.len(),
            "probed ffmpeg capabilities"
        );
        Ok(Self {
            program,
            encoders,
            muxers,
            bg_rgba: [0, 0, 0, 255],
        })
    }

    /// Backend with a fixed capability set; nothing is probed.
    pub fn with_capabilities<E, M>(program: impl Into<PathBuf>, encoders: E, muxers: M) -> Self
    where
        E: IntoIterator,
        E::Item: Into<String>,
        M: IntoIterator,
        M::Item: Into<String>,
    {
        Self {
            program: program.into(),
            encoders: encoders.into_iter().map(Into::into).collect(),
            muxers: muxers.into_iter().map(Into::into).collect(),
            bg_rgba: [0, 0, 0, 255],
        }
    }

    /// Color transparent pixels are flattened onto (straight RGBA8).
    pub fn with_background(mut self, bg_rgba: [u8; 4]) -> Self {
        self.bg_rgba = bg_rgba;
        self
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    fn command_args(&self, format: VideoFormat, settings: &EncoderSettings) -> Vec<String> {
        let mut args: Vec<String> = [
            "-hide_banner",
            "-loglevel",
            "error",
            "-f",
            "rawvideo",
            "-pix_fmt",
            "rgba",
            "-s",
        ]
        .iter()
        .map(|s| (*s).to_owned())
        .collect();
        args.push(format!("{}x{}", settings.width, settings.height));
        args.extend(["-r".to_owned(), settings.fps.to_string()]);
        args.extend(["-i".to_owned(), "pipe:0".to_owned(), "-an".to_owned()]);

        if let Some(codec) = format.codec {
            args.extend(["-c:v".to_owned(), codec.to_owned()]);
        }
        args.extend(["-b:v".to_owned(), settings.bitrate_bps.to_string()]);
        if matches!(format.codec, Some("libvpx") | Some("libvpx-vp9")) {
            // Live capture: trade compression for keeping up with the frame rate.
            args.extend(
                ["-deadline", "realtime", "-cpu-used", "8"]
                    .iter()
                    .map(|s| (*s).to_owned()),
            );
        }
        args.extend(
            [
                "-pix_fmt",
                "yuv420p",
                "-f",
                format.container,
                "-flush_packets",
                "1",
                "pipe:1",
            ]
            .iter()
            .map(|s| (*s).to_owned()),
        );
        args
    }
}

impl EncoderBackend for FfmpegBackend {
    fn name(&self) -> &str {
        "ffmpeg"
    }

    fn supports(&self, format: &VideoFormat) -> bool {
        self.muxers.contains(format.container)
            && format.codec.is_none_or(|c| self.encoders.contains(c))
    }

    fn open(
        &self,
        format: VideoFormat,
        settings: &EncoderSettings,
    ) -> ReelResult<Box<dyn StreamEncoder>> {
        if !settings.width.is_multiple_of(2) || !settings.height.is_multiple_of(2) {
            return Err(ReelError::invalid_config(
                "ffmpeg output width/height must be even (required for yuv420p)",
            ));
        }

        let mut cmd = Command::new(&self.program);
        cmd.args(self.command_args(format, settings))
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        let mut child = cmd.spawn().map_err(|e| {
            ReelError::encode(format!(
                "failed to spawn {} (is it installed and on PATH?): {e}",
                self.program.display()
            ))
        })?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| ReelError::encode("failed to open ffmpeg stdin (unexpected)"))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| ReelError::encode("failed to open ffmpeg stdout (unexpected)"))?;
        let mut stderr = child
            .stderr
            .take()
            .ok_or_else(|| ReelError::encode("failed to open ffmpeg stderr (unexpected)"))?;

        let stderr_drain = std::thread::spawn(move || {
            let mut stderr_bytes = Vec::new();
            stderr.read_to_end(&mut stderr_bytes)?;
            Ok(stderr_bytes)
        });

        let (tx, rx) = mpsc::channel();
        let timeslice = Duration::from_millis(u64::from(settings.timeslice_ms));
        let stdout_pump = std::thread::spawn(move || pump_stdout(stdout, timeslice, tx));

        tracing::info!(
            format = %format,
            width = settings.width,
            height = settings.height,
            fps = settings.fps,
            "ffmpeg encoder started"
        );
        Ok(Box::new(FfmpegEncoder {
            format,
            bg_rgba: self.bg_rgba,
            scratch: vec![0u8; settings.frame_len()],
            child: Some(child),
            stdin: Some(stdin),
            chunks: rx,
            stdout_pump: Some(stdout_pump),
            stderr_drain: Some(stderr_drain),
            terminal: VecDeque::new(),
            finished: false,
        }))
    }
}

/// Forward ffmpeg's stdout as chunks, cutting one whenever a timeslice has passed.
fn pump_stdout(
    mut stdout: impl Read,
    timeslice: Duration,
    tx: mpsc::Sender<Vec<u8>>,
) -> std::io::Result<()> {
    let mut buf = vec![0u8; READ_BUF_LEN];
    let mut pending = Vec::new();
    let mut slice_started = Instant::now();
    loop {
        let n = stdout.read(&mut buf)?;
        if n == 0 {
            break;
        }
        pending.extend_from_slice(&buf[..n]);
        if slice_started.elapsed() >= timeslice {
            if tx.send(std::mem::take(&mut pending)).is_err() {
                return Ok(());
            }
            slice_started = Instant::now();
        }
    }
    if !pending.is_empty() {
        let _ = tx.send(pending);
    }
    Ok(())
}

type DrainHandle = std::thread::JoinHandle<std::io::Result<Vec<u8>>>;

struct FfmpegEncoder {
    format: VideoFormat,
    bg_rgba: [u8; 4],
    scratch: Vec<u8>,
    child: Option<Child>,
    stdin: Option<ChildStdin>,
    chunks: mpsc::Receiver<Vec<u8>>,
    stdout_pump: Option<std::thread::JoinHandle<std::io::Result<()>>>,
    stderr_drain: Option<DrainHandle>,
    /// Events produced after the process exited, ending with `Stopped`.
    terminal: VecDeque<EncoderEvent>,
    /// The terminal `Stopped` was handed out.
    finished: bool,
}

impl FfmpegEncoder {
    /// Reap the process once stdout hit EOF and turn its exit status into the terminal events.
    fn finish(&mut self) -> Vec<EncoderEvent> {
        let mut events = Vec::new();
        drop(self.stdin.take());

        if let Some(pump) = self.stdout_pump.take() {
            match pump.join() {
                Ok(Ok(())) => {}
                Ok(Err(e)) => events.push(EncoderEvent::Error(format!(
                    "reading ffmpeg output failed: {e}"
                ))),
                Err(_) => events.push(EncoderEvent::Error(
                    "ffmpeg stdout pump thread panicked".to_owned(),
                )),
            }
        }

        let status = match self.child.take() {
            Some(mut child) => child.wait().map_err(|e| e.to_string()),
            None => Err("ffmpeg process already reaped".to_owned()),
        };
        let stderr_bytes = match self.stderr_drain.take() {
            Some(handle) => handle.join().ok().and_then(Result::ok).unwrap_or_default(),
            None => Vec::new(),
        };

        match status {
            Ok(status) if status.success() => {}
            Ok(status) => {
                let stderr = String::from_utf8_lossy(&stderr_bytes);
                events.push(EncoderEvent::Error(format!(
                    "ffmpeg exited with status {status}: {}",
                    stderr.trim()
                )));
            }
            Err(e) => events.push(EncoderEvent::Error(format!(
                "failed to wait for ffmpeg to finish: {e}"
            ))),
        }
        events.push(EncoderEvent::Stopped);
        events
    }

    fn next_event(&mut self, block: bool) -> Option<EncoderEvent> {
        if self.finished {
            return None;
        }
        if let Some(ev) = self.terminal.pop_front() {
            if ev == EncoderEvent::Stopped {
                self.finished = true;
            }
            return Some(ev);
        }

        let received = if block {
            self.chunks.recv().map_err(|_| mpsc::TryRecvError::Disconnected)
        } else {
            self.chunks.try_recv()
        };
        match received {
            Ok(chunk) => Some(EncoderEvent::Chunk(chunk)),
            Err(mpsc::TryRecvError::Empty) => None,
            Err(mpsc::TryRecvError::Disconnected) => {
                let events = self.finish();
                self.terminal.extend(events);
                self.next_event(block)
            }
        }
    }
}

impl StreamEncoder for FfmpegEncoder {
    fn format(&self) -> VideoFormat {
        self.format
    }

    fn write_frame(&mut self, premul_rgba8: &[u8], _timestamp_ms: f64) -> ReelResult<()> {
        if premul_rgba8.len() != self.scratch.len() {
            return Err(ReelError::encode(format!(
                "frame is {} bytes, expected {}",
                premul_rgba8.len(),
                self.scratch.len()
            )));
        }
        // ffmpeg does not understand premultiplied alpha.
        flatten_premul_over_bg_to_opaque_rgba8(&mut self.scratch, premul_rgba8, self.bg_rgba)?;

        let Some(stdin) = self.stdin.as_mut() else {
            return Err(ReelError::encode("ffmpeg encoder is already stopping"));
        };
        stdin.write_all(&self.scratch).map_err(|e| {
            ReelError::encode(format!("failed to write frame to ffmpeg stdin: {e}"))
        })?;
        Ok(())
    }

    fn poll_event(&mut self) -> Option<EncoderEvent> {
        self.next_event(false)
    }

    fn request_stop(&mut self) -> ReelResult<()> {
        // Closing stdin is ffmpeg's end-of-stream; it flushes and exits on its own.
        match self.stdin.take() {
            Some(stdin) => {
                drop(stdin);
                tracing::debug!("ffmpeg stdin closed");
                Ok(())
            }
            None => Err(ReelError::encoder_stop(
                "ffmpeg encoder was already asked to stop",
            )),
        }
    }

    fn wait_event(&mut self) -> Option<EncoderEvent> {
        self.next_event(true)
    }
}

impl Drop for FfmpegEncoder {
    fn drop(&mut self) {
        drop(self.stdin.take());
        if let Some(mut child) = self.child.take() {
            if let Err(e) = child.kill() {
                tracing::debug!(error = %e, "ffmpeg already exited");
            }
            let _ = child.wait();
        }
    }
}

fn run_listing(program: &Path, flag: &str) -> ReelResult<String> {
    let output = Command::new(program)
        .args(["-hide_banner", flag])
        .stdin(Stdio::null())
        .stderr(Stdio::null())
        .output()
        .map_err(|e| {
            ReelError::encode(format!(
                "failed to run {} {flag} (is ffmpeg installed and on PATH?): {e}",
                program.display()
            ))
        })?;
    if !output.status.success() {
        return Err(ReelError::encode(format!(
            "{} {flag} exited with status {}",
            program.display(),
            output.status
        )));
    }
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

/// Names from an `ffmpeg -encoders` / `-muxers` listing.
///
/// Both listings print a legend, a `--` separator line, then one `<flags> <name> <description>`
/// row per entry.
pub(crate) fn parse_capability_list(listing: &str) -> HashSet<String> {
    listing
        .lines()
        .skip_while(|line| !line.trim_start().starts_with("--"))
        .skip(1)
        .filter_map(|line| {
            let mut cols = line.split_whitespace();
            let _flags = cols.next()?;
            cols.next()
        })
        .flat_map(|names| names.split(','))
        .map(str::to_owned)
        .collect()
}

/// Return `true` when `ffmpeg` can be invoked from `PATH`.
pub fn is_ffmpeg_on_path() -> bool {
    Command::new("ffmpeg")
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

#[cfg(test)]
#[path = "../../tests/unit/encode/ffmpeg.rs"]
mod tests;
