use crate::frame::{FRAME_FLAG, MAX_FRAME_SIZE};
use crate::transport::Transport;
use std::io::{self, BufRead, BufReader, Read, Write};
use std::net::{TcpStream, ToSocketAddrs};
#[cfg(unix)]
use std::os::unix::net::UnixStream;
#[cfg(unix)]
use std::path::Path;
use std::vec::Vec;

#[derive(Debug, thiserror::Error)]
pub enum StreamTransportError {
    #[error("i/o error: {0}")]
    Io(#[from] io::Error),
    #[error("connection closed by peer")]
    Closed,
    #[error("frame exceeds {max} bytes", max = MAX_FRAME_SIZE)]
    FrameTooLarge,
}

/// Frame transport over any byte stream.
///
/// Bytes outside a frame are discarded, as are empty frames (two adjacent
/// flags), so a reader that joins mid-stream resynchronises on the next flag.
pub struct StreamTransport<S: Read + Write> {
    reader: BufReader<S>,
}

impl<S: Read + Write> StreamTransport<S> {
    pub fn new(stream: S) -> Self {
        Self {
            reader: BufReader::new(stream),
        }
    }

    pub fn get_ref(&self) -> &S {
        self.reader.get_ref()
    }

    pub fn into_inner(self) -> S {
        self.reader.into_inner()
    }

    fn next_byte(&mut self) -> Result<u8, StreamTransportError> {
        loop {
            match self.reader.fill_buf() {
                Ok([]) => return Err(StreamTransportError::Closed),
                Ok(buffer) => {
                    let byte = buffer[0];
                    self.reader.consume(1);
                    return Ok(byte);
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }
    }
}

impl StreamTransport<HubStream> {
    pub fn connect_tcp<A: ToSocketAddrs>(addr: A) -> Result<Self, StreamTransportError> {
        Ok(Self::new(HubStream::Tcp(TcpStream::connect(addr)?)))
    }

    #[cfg(unix)]
    pub fn connect_unix<P: AsRef<Path>>(path: P) -> Result<Self, StreamTransportError> {
        Ok(Self::new(HubStream::Unix(UnixStream::connect(path)?)))
    }
}

impl<S: Read + Write> Transport for StreamTransport<S> {
    type Error = StreamTransportError;

    fn send(&mut self, bytes: &[u8]) -> Result<(), Self::Error> {
        let stream = self.reader.get_mut();
        stream.write_all(bytes)?;
        stream.flush()?;
        Ok(())
    }

    fn receive(&mut self) -> Result<Vec<u8>, Self::Error> {
        let mut buffer = Vec::new();
        let mut in_frame = false;

        loop {
            let byte = self.next_byte()?;

            if byte == FRAME_FLAG {
                if in_frame && buffer.len() > 1 {
                    buffer.push(FRAME_FLAG);
                    return Ok(buffer);
                }
                // Opening flag, or the closing flag of an empty frame which
                // doubles as the next opening flag.
                buffer.clear();
                buffer.push(FRAME_FLAG);
                in_frame = true;
            } else if in_frame {
                if buffer.len() + 1 >= MAX_FRAME_SIZE {
                    return Err(StreamTransportError::FrameTooLarge);
                }
                buffer.push(byte);
            }
        }
    }
}

/// Stream to the hub daemon: TCP, or a Unix-domain socket where available.
#[derive(Debug)]
pub enum HubStream {
    Tcp(TcpStream),
    #[cfg(unix)]
    Unix(UnixStream),
}

impl Read for HubStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            HubStream::Tcp(stream) => stream.read(buf),
            #[cfg(unix)]
            HubStream::Unix(stream) => stream.read(buf),
        }
    }
}

impl Write for HubStream {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            HubStream::Tcp(stream) => stream.write(buf),
            #[cfg(unix)]
            HubStream::Unix(stream) => stream.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            HubStream::Tcp(stream) => stream.flush(),
            #[cfg(unix)]
            HubStream::Unix(stream) => stream.flush(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    struct Duplex {
        input: Cursor<Vec<u8>>,
        output: Vec<u8>,
    }

    impl Read for Duplex {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            self.input.read(buf)
        }
    }

    impl Write for Duplex {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.output.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn transport(input: &[u8]) -> StreamTransport<Duplex> {
        StreamTransport::new(Duplex {
            input: Cursor::new(input.to_vec()),
            output: Vec::new(),
        })
    }

    #[test]
    fn test_noise_and_empty_frames_are_skipped() {
        let mut transport = transport(&[0x00, 0x13, 0x7E, 0x7E, 0x01, 0x02, 0x03, 0x7E]);
        assert_eq!(
            transport.receive().unwrap(),
            vec![0x7E, 0x01, 0x02, 0x03, 0x7E]
        );
        assert!(matches!(
            transport.receive(),
            Err(StreamTransportError::Closed)
        ));
    }

    #[test]
    fn test_send_writes_through() {
        let mut transport = transport(&[]);
        transport.send(&[0x7E, 0xAA, 0x7E]).unwrap();
        assert_eq!(transport.get_ref().output, vec![0x7E, 0xAA, 0x7E]);
    }

    #[test]
    fn test_runaway_frame_is_refused() {
        let mut input = vec![0x7E];
        input.extend(std::iter::repeat(0x55).take(MAX_FRAME_SIZE));
        let mut transport = transport(&input);
        assert!(matches!(
            transport.receive(),
            Err(StreamTransportError::FrameTooLarge)
        ));
    }
}
