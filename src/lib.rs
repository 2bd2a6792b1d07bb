//! Device-side library for exchanging attribute updates with the hub daemon.
//!
//! The application initialises a [`Client`] with a set handler and a notify
//! handler, then drives it from its own event loop with [`Client::poll`] or
//! [`Client::handle_frame`].
//!
//! ```no_run
//! use aflib::{Client, ClientConfig};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ClientConfig::load("/etc/aflib.toml")?;
//! let transport = config.endpoint.connect()?;
//! let mut client = Client::init(
//!     transport,
//!     &config.options(),
//!     |attr_id, value| {
//!         println!("service wants {} = {:?}", attr_id, value);
//!         true
//!     },
//!     |attr_id, value| println!("{} is now {:?}", attr_id, value),
//! )?;
//! client.set_attribute_i16(1024, 215)?;
//! client.run()?;
//! # Ok(())
//! # }
//! ```

pub mod attribute;
pub mod auth;
pub mod client;
pub mod config;
pub mod debug;
pub mod error;
pub mod frame;
pub mod hub;
pub mod message;
pub mod status;
pub mod stream_transport;
pub mod transport;

pub use attribute::{AttributeId, AttributeValue, MAX_ATTRIBUTE_SIZE};
pub use client::{Client, ClientOptions};
pub use config::{ClientConfig, Endpoint};
pub use debug::DebugLevel;
pub use error::AflibError;
pub use hub::{Hub, HubOptions};
pub use status::AfStatus;
pub use stream_transport::{HubStream, StreamTransport};
pub use transport::Transport;
