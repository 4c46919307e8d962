use std::path::PathBuf;
use std::process::Stdio;

use bytes::{Buf, Bytes, BytesMut};
use log::{info, warn};
use tokio::io::AsyncReadExt;
use tokio::process::{Child, ChildStdout, Command};

use crate::error::RelayError;
use crate::relay::{redact_credentials, FrameReader, FrameSource};



const READ_CHUNK: usize = 64 * 1024;

/// A single JPEG bigger than this means we lost sync with the stream.
const MAX_FRAME_SIZE: usize = 16 * 1024 * 1024;

const SOI: [u8; 2] = [0xFF, 0xD8];
const EOI: [u8; 2] = [0xFF, 0xD9];

/// Decodes camera streams by running ffmpeg and reading MJPEG from its stdout.
pub struct FfmpegSource {
	ffmpeg_path: PathBuf,
}

impl FfmpegSource {
	pub fn new(ffmpeg_path: impl Into<PathBuf>) -> Self {
		Self { ffmpeg_path: ffmpeg_path.into() }
	}

	fn command(&self, url: &str) -> Command {
		let mut command = Command::new(&self.ffmpeg_path);
		command.arg("-hide_banner").arg("-loglevel").arg("error");
		if url.starts_with("rtsp://") || url.starts_with("rtsps://") {
			command.arg("-rtsp_transport").arg("tcp");
		}
		command
			.arg("-i")
			.arg(url)
			// Re-encode to JPEG frames, drop audio
			.arg("-an")
			.arg("-f")
			.arg("mjpeg")
			.arg("-q:v")
			.arg("5")
			.arg("pipe:1")
			.stdin(Stdio::null())
			.stdout(Stdio::piped())
			.stderr(Stdio::null())
			.kill_on_drop(true);
		command
	}
}

#[rocket::async_trait]
impl FrameSource for FfmpegSource {
	async fn open(&self, url: &str) -> Result<Box<dyn FrameReader>, RelayError> {
		let mut child = self.command(url).spawn().map_err(|err| {
			if err.kind() == std::io::ErrorKind::NotFound {
				RelayError::FfmpegNotFound
			} else {
				RelayError::Spawn(err)
			}
		})?;
		let stdout = child.stdout.take().ok_or(RelayError::SourceClosed)?;
		info!("Spawned ffmpeg (pid {:?}) for {}", child.id(), redact_credentials(url));

		Ok(Box::new(FfmpegReader {
			_child: child,
			stdout,
			splitter: JpegSplitter::new(),
			chunk: vec![0u8; READ_CHUNK],
		}))
	}
}

/// Holds the ffmpeg process; dropping the reader kills it.
struct FfmpegReader {
	_child: Child,
	stdout: ChildStdout,
	splitter: JpegSplitter,
	chunk: Vec<u8>,
}

#[rocket::async_trait]
impl FrameReader for FfmpegReader {
	async fn read_frame(&mut self) -> Result<Bytes, RelayError> {
		loop {
			if let Some(frame) = self.splitter.next_frame() {
				return Ok(frame);
			}
			let n = self.stdout.read(&mut self.chunk).await.map_err(RelayError::Read)?;
			if n == 0 {
				return Err(RelayError::SourceClosed);
			}
			self.splitter.push(&self.chunk[..n]);
		}
	}
}

/// Cuts a concatenated MJPEG byte stream into individual JPEG images.
#[derive(Debug, Default)]
pub struct JpegSplitter {
	buffer: BytesMut,
}

impl JpegSplitter {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn push(&mut self, data: &[u8]) {
		self.buffer.extend_from_slice(data);
	}

	pub fn next_frame(&mut self) -> Option<Bytes> {
		let start = match find(&self.buffer, &SOI, 0) {
			Some(start) => start,
			None => {
				// Keep a trailing 0xFF in case it is the first half of a marker
				let keep = usize::from(self.buffer.last() == Some(&0xFF));
				let discard = self.buffer.len() - keep;
				self.buffer.advance(discard);
				return None;
			}
		};
		self.buffer.advance(start);

		match find(&self.buffer, &EOI, SOI.len()) {
			Some(end) => Some(self.buffer.split_to(end + EOI.len()).freeze()),
			None => {
				if self.buffer.len() > MAX_FRAME_SIZE {
					warn!("Discarding {} bytes of MJPEG without an end marker", self.buffer.len());
					self.buffer.clear();
				}
				None
			}
		}
	}
}

fn find(haystack: &[u8], needle: &[u8; 2], from: usize) -> Option<usize> {
	haystack.get(from..)?
		.windows(needle.len())
		.position(|window| window == needle)
		.map(|position| position + from)
}
