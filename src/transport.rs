use std::vec::Vec;

/// Moves encoded frames between the device and the hub.
///
/// `receive` blocks until one complete frame, flags included, is available.
pub trait Transport {
    type Error: std::error::Error + Send + Sync + 'static;

    fn send(&mut self, bytes: &[u8]) -> Result<(), Self::Error>;
    fn receive(&mut self) -> Result<Vec<u8>, Self::Error>;
}
