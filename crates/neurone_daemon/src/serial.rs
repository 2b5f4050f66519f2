use neurone_core::{FrameWriter, LightCommand, LightingSink};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Device name fragments of the USB serial adapters the lighting boards use.
const DEVICE_MARKERS: [&str; 2] = ["tty.usbserial", "ttyUSB"];

pub const BAUD_RATE: u32 = 9600;
/// Older boards reset when the port opens; commands sent before this are lost.
pub const SETTLE_DELAY: Duration = Duration::from_secs(1);
const WRITE_TIMEOUT: Duration = Duration::from_millis(500);
/// Frames buffered for the writer thread; further frames are dropped until it catches up.
const FRAME_QUEUE_DEPTH: usize = 16;

/// Lighting sink backed by the serial port; `None` when no board is attached.
pub type SerialSink = Option<LightingThread>;

/// Forwards commands to a sink owned by a dedicated OS thread, so port writes
/// (bounded only by `WRITE_TIMEOUT`) never run on the async workers.
#[derive(Debug)]
pub struct LightingThread {
    frames: mpsc::Sender<LightCommand>,
}

impl LightingThread {
    pub fn spawn<S>(mut sink: S) -> io::Result<Self>
    where
        S: LightingSink + Send + 'static,
    {
        let (frames, mut queue) = mpsc::channel::<LightCommand>(FRAME_QUEUE_DEPTH);
        thread::Builder::new()
            .name("lighting".to_string())
            .spawn(move || {
                while let Some(command) = queue.blocking_recv() {
                    if let Err(e) = sink.send(command) {
                        warn!(command = ?command, error = %e, "Lighting write failed");
                    }
                }
                debug!("Lighting writer stopped");
            })?;
        Ok(Self { frames })
    }
}

impl LightingSink for LightingThread {
    fn send(&mut self, command: LightCommand) -> io::Result<()> {
        self.frames.try_send(command).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => {
                io::Error::new(io::ErrorKind::WouldBlock, "lighting queue full, frame dropped")
            }
            mpsc::error::TrySendError::Closed(_) => {
                io::Error::new(io::ErrorKind::BrokenPipe, "lighting writer stopped")
            }
        })
    }
}

/// Finds the lighting board, if any.
pub trait DeviceLocator {
    fn locate(&self) -> Option<PathBuf>;
}

/// Scans a device directory (normally `/dev`) for a USB serial adapter.
#[derive(Debug, Clone)]
pub struct DevDirectory {
    root: PathBuf,
}

impl DevDirectory {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl Default for DevDirectory {
    fn default() -> Self {
        Self::new("/dev")
    }
}

impl DeviceLocator for DevDirectory {
    fn locate(&self) -> Option<PathBuf> {
        let entries = match fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(e) => {
                warn!(root = ?self.root, error = %e, "Could not scan device directory");
                return None;
            }
        };

        let mut names: Vec<String> = entries
            .filter_map(|entry| entry.ok())
            .filter_map(|entry| entry.file_name().into_string().ok())
            .collect();
        names.sort();

        names
            .into_iter()
            .find(|name| DEVICE_MARKERS.iter().any(|marker| name.contains(marker)))
            .map(|name| self.root.join(name))
    }
}

/// Locate and open the lighting board. Any failure leaves the sink absent and
/// the neurone animates without physical output.
pub async fn open_lighting_sink(locator: &impl DeviceLocator) -> SerialSink {
    let Some(path) = locator.locate() else {
        info!("No lighting device found, running without lights");
        return None;
    };

    let port = serialport::new(path.to_string_lossy(), BAUD_RATE)
        .timeout(WRITE_TIMEOUT)
        .open();

    match port {
        Ok(port) => {
            info!(device = ?path, baud = BAUD_RATE, "Lighting device opened");
            tokio::time::sleep(SETTLE_DELAY).await;
            match LightingThread::spawn(FrameWriter::new(port)) {
                Ok(sink) => Some(sink),
                Err(e) => {
                    warn!(error = %e, "Failed to start lighting writer, running without lights");
                    None
                }
            }
        }
        Err(e) => {
            warn!(device = ?path, error = %e, "Failed to open lighting device, running without lights");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};
    use std::time::Instant;

    struct Absent;

    /// Byte stream that can be inspected from the test thread.
    #[derive(Clone, Default)]
    struct SharedPort(Arc<Mutex<Vec<u8>>>);

    impl io::Write for SharedPort {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    /// A port that takes its full write timeout on every frame.
    struct StalledPort;

    impl LightingSink for StalledPort {
        fn send(&mut self, _command: LightCommand) -> io::Result<()> {
            thread::sleep(WRITE_TIMEOUT);
            Err(io::Error::new(io::ErrorKind::TimedOut, "write timed out"))
        }
    }

    impl DeviceLocator for Absent {
        fn locate(&self) -> Option<PathBuf> {
            None
        }
    }

    #[test]
    fn test_locates_usb_serial_adapter() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["tty0", "ttyS0", "ttyUSB1", "ttyUSB0", "null"] {
            fs::write(dir.path().join(name), b"").unwrap();
        }

        let locator = DevDirectory::new(dir.path());
        assert_eq!(locator.locate(), Some(dir.path().join("ttyUSB0")));
    }

    #[test]
    fn test_locates_macos_adapter() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("tty.usbserial-A1017HU2"), b"").unwrap();

        let locator = DevDirectory::new(dir.path());
        assert_eq!(
            locator.locate(),
            Some(dir.path().join("tty.usbserial-A1017HU2"))
        );
    }

    #[test]
    fn test_no_adapter_or_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("ttyS0"), b"").unwrap();
        assert_eq!(DevDirectory::new(dir.path()).locate(), None);

        assert_eq!(DevDirectory::new(dir.path().join("missing")).locate(), None);
    }

    #[tokio::test]
    async fn test_absent_device_gives_absent_sink() {
        assert!(open_lighting_sink(&Absent).await.is_none());
    }

    #[test]
    fn test_lighting_thread_writes_frames_in_order() {
        let port = SharedPort::default();
        let mut sink = LightingThread::spawn(FrameWriter::new(port.clone())).unwrap();
        sink.send(LightCommand::Energy(-2.0)).unwrap();
        sink.send(LightCommand::Powerup).unwrap();

        let mut expected = LightCommand::Energy(-2.0).encode().to_vec();
        expected.extend_from_slice(&LightCommand::Powerup.encode());

        let deadline = Instant::now() + Duration::from_secs(5);
        while port.0.lock().unwrap().len() < expected.len() && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(5));
        }
        assert_eq!(*port.0.lock().unwrap(), expected);
    }

    #[test]
    fn test_stalled_port_never_blocks_sender() {
        let mut sink = LightingThread::spawn(StalledPort).unwrap();

        let started = Instant::now();
        let results: Vec<_> = (0..FRAME_QUEUE_DEPTH + 4)
            .map(|_| sink.send(LightCommand::Energy(0.5)))
            .collect();

        assert!(started.elapsed() < WRITE_TIMEOUT);
        let dropped = results
            .iter()
            .filter(|r| matches!(r, Err(e) if e.kind() == io::ErrorKind::WouldBlock))
            .count();
        assert!(dropped >= 3, "expected dropped frames, got {}", dropped);
    }
}
