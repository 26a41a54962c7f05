use std::io::{self, PipeReader, PipeWriter, Read};
use std::process::Stdio;
use std::thread::{self, JoinHandle};

/// Where a stage reads its standard input from.
#[derive(Debug)]
pub enum InputEnd {
    /// The interpreter's own standard input.
    Inherit,
    /// The null device.
    Null,
    /// Read end of the link from the previous stage.
    Link(PipeReader),
}

impl InputEnd {
    /// Convert this endpoint into a [`Stdio`] handle, giving up the interpreter's copy.
    pub fn stdio(self) -> Stdio {
        match self {
            InputEnd::Inherit => Stdio::inherit(),
            InputEnd::Null => Stdio::null(),
            InputEnd::Link(reader) => reader.into(),
        }
    }
}

/// Where a stage writes its standard output (or error) to.
#[derive(Debug)]
pub enum OutputEnd {
    /// The interpreter's corresponding stream.
    Inherit,
    /// Write end of the link to the next stage.
    Link(PipeWriter),
    /// Collected in memory by a [`CaptureBuffer`].
    Capture,
}

impl OutputEnd {
    /// Convert this endpoint into a [`Stdio`] handle, giving up the interpreter's copy.
    pub fn stdio(self) -> Stdio {
        match self {
            OutputEnd::Inherit => Stdio::inherit(),
            OutputEnd::Link(writer) => writer.into(),
            OutputEnd::Capture => Stdio::piped(),
        }
    }

    pub fn is_capture(&self) -> bool {
        matches!(self, OutputEnd::Capture)
    }
}

/// The three standard streams assigned to one stage.
#[derive(Debug)]
pub struct StageEndpoints {
    pub stdin: InputEnd,
    pub stdout: OutputEnd,
    pub stderr: OutputEnd,
}

impl StageEndpoints {
    /// All three streams shared with the interpreter.
    pub fn inherited() -> Self {
        Self {
            stdin: InputEnd::Inherit,
            stdout: OutputEnd::Inherit,
            stderr: OutputEnd::Inherit,
        }
    }
}

/// Memory-backed sink for the terminal stage of a pipeline.
///
/// A background thread reads the source to the end while the pipeline runs,
/// so the producing process never stalls on a full pipe. The bytes are handed
/// over by [`CaptureBuffer::collect`] once the caller is ready to copy them out.
pub struct CaptureBuffer {
    reader: JoinHandle<io::Result<Vec<u8>>>,
}

impl CaptureBuffer {
    /// Start draining `source` in the background.
    pub fn drain<R: Read + Send + 'static>(mut source: R) -> Self {
        let reader = thread::spawn(move || {
            let mut buf = Vec::new();
            source.read_to_end(&mut buf)?;
            Ok(buf)
        });
        Self { reader }
    }

    /// Block until the source reaches end-of-stream and return everything read.
    pub fn collect(self) -> io::Result<Vec<u8>> {
        self.reader
            .join()
            .map_err(|_| io::Error::other("capture reader panicked"))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Write};

    #[test]
    fn test_capture_collects_everything() {
        let capture = CaptureBuffer::drain(Cursor::new(b"hello\nworld".to_vec()));
        assert_eq!(capture.collect().unwrap(), b"hello\nworld");
    }

    #[test]
    fn test_capture_does_not_block_large_writers() {
        let (reader, mut writer) = io::pipe().unwrap();
        let capture = CaptureBuffer::drain(reader);

        // Well past any OS pipe buffer; only succeeds if the capture is draining.
        let payload = vec![b'x'; 1 << 20];
        writer.write_all(&payload).unwrap();
        drop(writer);

        assert_eq!(capture.collect().unwrap().len(), payload.len());
    }

    #[test]
    fn test_only_capture_reports_capture() {
        assert!(OutputEnd::Capture.is_capture());
        assert!(!OutputEnd::Inherit.is_capture());
        let (_reader, writer) = io::pipe().unwrap();
        assert!(!OutputEnd::Link(writer).is_capture());
    }
}
