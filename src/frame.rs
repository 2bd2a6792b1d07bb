use crc::Crc;
use std::vec::Vec;

pub const FRAME_FLAG: u8 = 0x7E;
pub const FRAME_ESCAPE: u8 = 0x7D;
const ESCAPE_XOR: u8 = 0x20;

/// Largest payload a frame may carry: tag, id, length prefix and a full value,
/// with headroom for handshake messages.
pub const MAX_FRAME_PAYLOAD: usize = 512;
/// Largest encoded frame: every payload and checksum byte stuffed, plus flags.
pub const MAX_FRAME_SIZE: usize = 2 * (MAX_FRAME_PAYLOAD + 2) + 2;

pub const CRC_CCITT_FALSE: crc::Algorithm<u16> = crc::Algorithm {
    width: 16,
    poly: 0x1021,
    init: 0xFFFF,
    refin: false,
    refout: false,
    xorout: 0x0000,
    check: 0x29B1,
    residue: 0x0000,
};
pub const CRC_ALGORITHM: Crc<u16> = Crc::<u16>::new(&CRC_CCITT_FALSE);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub payload: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FrameError {
    #[error("invalid frame")]
    InvalidFrame,
    #[error("frame check sequence mismatch")]
    InvalidFcs,
    #[error("frame payload of {0} bytes exceeds {max}", max = MAX_FRAME_PAYLOAD)]
    TooLarge(usize),
}

impl Frame {
    pub fn new(payload: Vec<u8>) -> Self {
        Frame { payload }
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, FrameError> {
        if self.payload.len() > MAX_FRAME_PAYLOAD {
            return Err(FrameError::TooLarge(self.payload.len()));
        }

        let checksum = CRC_ALGORITHM.checksum(&self.payload);

        let mut frame = Vec::with_capacity(self.payload.len() + 6);
        frame.push(FRAME_FLAG);
        for &byte in self.payload.iter().chain(checksum.to_le_bytes().iter()) {
            if byte == FRAME_FLAG || byte == FRAME_ESCAPE {
                frame.push(FRAME_ESCAPE);
                frame.push(byte ^ ESCAPE_XOR);
            } else {
                frame.push(byte);
            }
        }
        frame.push(FRAME_FLAG);

        Ok(frame)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, FrameError> {
        if bytes.len() < 4 || bytes[0] != FRAME_FLAG || bytes[bytes.len() - 1] != FRAME_FLAG {
            return Err(FrameError::InvalidFrame);
        }

        let mut body = Vec::with_capacity(bytes.len() - 2);
        let mut stuffed = bytes[1..bytes.len() - 1].iter();
        while let Some(&byte) = stuffed.next() {
            match byte {
                FRAME_FLAG => return Err(FrameError::InvalidFrame),
                FRAME_ESCAPE => {
                    let &escaped = stuffed.next().ok_or(FrameError::InvalidFrame)?;
                    body.push(escaped ^ ESCAPE_XOR);
                }
                _ => body.push(byte),
            }
        }

        if body.len() < 2 {
            return Err(FrameError::InvalidFrame);
        }

        let (payload, fcs) = body.split_at(body.len() - 2);
        let received_checksum = u16::from_le_bytes([fcs[0], fcs[1]]);
        if received_checksum != CRC_ALGORITHM.checksum(payload) {
            return Err(FrameError::InvalidFcs);
        }
        if payload.len() > MAX_FRAME_PAYLOAD {
            return Err(FrameError::TooLarge(payload.len()));
        }

        Ok(Frame {
            payload: payload.to_vec(),
        })
    }
}
