//! Device-side client of the hub.
//!
//! The client owns its transport and is driven by the caller: `poll` reads
//! and dispatches one frame, `handle_frame` dispatches a frame the caller read
//! itself, `run` polls until the hub link fails. Handlers always fire on the
//! thread that drives the client.

use crate::attribute::{AttributeId, AttributeValue};
use crate::auth;
use crate::debug::DebugLevel;
use crate::error::AflibError;
use crate::frame::Frame;
use crate::message::{Event, Request, PROTOCOL_VERSION};
use crate::transport::Transport;
use std::boxed::Box;
use std::collections::BTreeMap;
use std::string::String;
use std::vec::Vec;

const LOG_TARGET: &str = "aflib";

/// A remote client asks for an attribute change. Return `true` to accept.
pub type SetHandler = Box<dyn FnMut(AttributeId, &AttributeValue) -> bool + Send>;
/// An attribute's current value, after a change or a `get_attribute`.
pub type NotifyHandler = Box<dyn FnMut(AttributeId, &AttributeValue) + Send>;
/// The hub's connection to the service went up or down.
pub type ConnectHandler = Box<dyn FnMut(bool) + Send>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientOptions {
    pub client_name: String,
    pub auth_key: Option<Vec<u8>>,
    pub async_set: bool,
    pub debug_level: DebugLevel,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            client_name: "aflib".into(),
            auth_key: None,
            async_set: false,
            debug_level: DebugLevel::Off,
        }
    }
}

pub struct Client<T: Transport> {
    transport: T,
    set_handler: SetHandler,
    notify_handler: NotifyHandler,
    connect_handler: Option<ConnectHandler>,
    async_set: bool,
    pending_sets: BTreeMap<AttributeId, AttributeValue>,
    service_connected: bool,
    hub_available: bool,
    debug_level: DebugLevel,
}

impl<T: Transport> Client<T> {
    /// Starts the library: greets the hub, authenticates when challenged and
    /// waits for the welcome.
    pub fn init<S, N>(
        transport: T,
        options: &ClientOptions,
        set_handler: S,
        notify_handler: N,
    ) -> Result<Self, AflibError>
    where
        S: FnMut(AttributeId, &AttributeValue) -> bool + Send + 'static,
        N: FnMut(AttributeId, &AttributeValue) + Send + 'static,
    {
        let mut client = Client {
            transport,
            set_handler: Box::new(set_handler),
            notify_handler: Box::new(notify_handler),
            connect_handler: None,
            async_set: options.async_set,
            pending_sets: BTreeMap::new(),
            service_connected: false,
            hub_available: true,
            debug_level: options.debug_level,
        };
        client.handshake(options)?;
        Ok(client)
    }

    fn handshake(&mut self, options: &ClientOptions) -> Result<(), AflibError> {
        if self.debug_enabled(DebugLevel::Debug2) {
            log::debug!(target: LOG_TARGET, "Greeting hub as {:?}", options.client_name);
        }
        self.send(&Request::Hello {
            version: PROTOCOL_VERSION,
            client_name: options.client_name.clone(),
        })?;

        loop {
            match self.receive_event()? {
                Event::Challenge { nonce } => {
                    let key = options
                        .auth_key
                        .as_deref()
                        .ok_or(AflibError::Auth("hub requires a key, none configured"))?;
                    let mac = auth::respond(key, &nonce)
                        .map_err(|_| AflibError::Auth("configured key is unusable"))?;
                    if self.debug_enabled(DebugLevel::Debug2) {
                        log::debug!(target: LOG_TARGET, "Answering hub challenge");
                    }
                    self.send(&Request::Authenticate { mac })?;
                }
                Event::Welcome { service_connected } => {
                    self.service_connected = service_connected;
                    if self.debug_enabled(DebugLevel::Debug2) {
                        log::debug!(
                            target: LOG_TARGET,
                            "Hub accepted client, service connected: {}",
                            service_connected
                        );
                    }
                    return Ok(());
                }
                Event::Rejected { reason } => {
                    log::warn!(target: LOG_TARGET, "Hub rejected client: {:?}", reason);
                    return Err(AflibError::Rejected(reason));
                }
                other => return Err(AflibError::UnexpectedMessage(other.name())),
            }
        }
    }

    /// Requests the current value of an attribute. The value is delivered to
    /// the notify handler.
    pub fn get_attribute(&mut self, attr_id: AttributeId) -> Result<(), AflibError> {
        self.send(&Request::GetAttribute { attr_id })
    }

    pub fn set_attribute(
        &mut self,
        attr_id: AttributeId,
        value: AttributeValue,
    ) -> Result<(), AflibError> {
        if self.debug_enabled(DebugLevel::Debug3) {
            log::debug!(target: LOG_TARGET, "Setting attribute {} to {:?}", attr_id, value);
        }
        self.send(&Request::SetAttribute { attr_id, value })
    }

    pub fn set_attribute_bytes(
        &mut self,
        attr_id: AttributeId,
        value: &[u8],
    ) -> Result<(), AflibError> {
        self.set_attribute(attr_id, AttributeValue::new(value)?)
    }

    pub fn set_attribute_bool(&mut self, attr_id: AttributeId, value: bool) -> Result<(), AflibError> {
        self.set_attribute(attr_id, AttributeValue::from_bool(value))
    }

    pub fn set_attribute_i8(&mut self, attr_id: AttributeId, value: i8) -> Result<(), AflibError> {
        self.set_attribute(attr_id, AttributeValue::from_i8(value))
    }

    pub fn set_attribute_i16(&mut self, attr_id: AttributeId, value: i16) -> Result<(), AflibError> {
        self.set_attribute(attr_id, AttributeValue::from_i16(value))
    }

    pub fn set_attribute_i32(&mut self, attr_id: AttributeId, value: i32) -> Result<(), AflibError> {
        self.set_attribute(attr_id, AttributeValue::from_i32(value))
    }

    pub fn set_attribute_i64(&mut self, attr_id: AttributeId, value: i64) -> Result<(), AflibError> {
        self.set_attribute(attr_id, AttributeValue::from_i64(value))
    }

    pub fn set_attribute_str(&mut self, attr_id: AttributeId, value: &str) -> Result<(), AflibError> {
        self.set_attribute(attr_id, AttributeValue::from_str(value)?)
    }

    /// Registers the service connection handler, replacing any previous one.
    pub fn set_connect_handler<F>(&mut self, handler: F)
    where
        F: FnMut(bool) + Send + 'static,
    {
        self.connect_handler = Some(Box::new(handler));
    }

    /// With `async_set` on, the set handler's return value is ignored and
    /// every set request must be answered through `confirm_attr`.
    pub fn handle_set_async(&mut self, async_set: bool) {
        self.async_set = async_set;
    }

    pub fn is_set_async(&self) -> bool {
        self.async_set
    }

    /// Answers a set request deferred in asynchronous mode.
    pub fn confirm_attr(&mut self, attr_id: AttributeId, accepted: bool) -> Result<(), AflibError> {
        if !self.pending_sets.contains_key(&attr_id) {
            return Err(AflibError::NoPendingSet(attr_id));
        }
        self.send(&Request::ConfirmSet { attr_id, accepted })?;
        self.pending_sets.remove(&attr_id);
        Ok(())
    }

    /// Value requested by a set request still awaiting `confirm_attr`.
    pub fn pending_set(&self, attr_id: AttributeId) -> Option<&AttributeValue> {
        self.pending_sets.get(&attr_id)
    }

    pub fn set_debug_level(&mut self, level: DebugLevel) {
        self.debug_level = level;
    }

    pub fn debug_level(&self) -> DebugLevel {
        self.debug_level
    }

    pub fn is_service_connected(&self) -> bool {
        self.service_connected
    }

    pub fn is_hub_available(&self) -> bool {
        self.hub_available
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Receives one frame from the hub and dispatches it.
    pub fn poll(&mut self) -> Result<(), AflibError> {
        let event = self.receive_event()?;
        self.dispatch(event)
    }

    /// Dispatches a frame read outside the client, e.g. by the caller's own
    /// event loop.
    pub fn handle_frame(&mut self, bytes: &[u8]) -> Result<(), AflibError> {
        let event = self.decode_event(bytes)?;
        self.dispatch(event)
    }

    /// Polls until the hub link fails. Malformed or unexpected frames are
    /// logged and skipped.
    pub fn run(&mut self) -> Result<(), AflibError> {
        loop {
            match self.poll() {
                Ok(()) => {}
                Err(AflibError::Unavailable) => return Err(AflibError::Unavailable),
                Err(err) => log::warn!(target: LOG_TARGET, "Dropping frame from hub: {}", err),
            }
        }
    }

    fn dispatch(&mut self, event: Event) -> Result<(), AflibError> {
        if self.debug_enabled(DebugLevel::Debug1) {
            log::debug!(target: LOG_TARGET, "Received {}", event.name());
        }

        match event {
            Event::Notify { attr_id, value } => {
                if self.debug_enabled(DebugLevel::Debug3) {
                    log::debug!(target: LOG_TARGET, "Attribute {} is {:?}", attr_id, value);
                }
                (self.notify_handler)(attr_id, &value);
            }
            Event::SetRequest { attr_id, value } => {
                if self.debug_enabled(DebugLevel::Debug3) {
                    log::debug!(target: LOG_TARGET, "Set request for {} to {:?}", attr_id, value);
                }
                let accepted = (self.set_handler)(attr_id, &value);
                if self.async_set {
                    self.pending_sets.insert(attr_id, value);
                } else {
                    self.send(&Request::ConfirmSet { attr_id, accepted })?;
                }
            }
            Event::ConnectionStatus { connected } => {
                if connected != self.service_connected {
                    self.service_connected = connected;
                    if self.debug_enabled(DebugLevel::Debug2) {
                        log::debug!(target: LOG_TARGET, "Service connected: {}", connected);
                    }
                    if let Some(handler) = self.connect_handler.as_mut() {
                        handler(connected);
                    }
                }
            }
            other => {
                log::warn!(target: LOG_TARGET, "Unexpected {} from hub", other.name());
                return Err(AflibError::UnexpectedMessage(other.name()));
            }
        }
        Ok(())
    }

    fn send(&mut self, request: &Request) -> Result<(), AflibError> {
        if !self.hub_available {
            return Err(AflibError::Unavailable);
        }

        let bytes = Frame::new(request.to_bytes()?).to_bytes()?;
        if self.debug_enabled(DebugLevel::Debug1) {
            log::debug!(target: LOG_TARGET, "Sending {}", request.name());
        }
        if self.debug_enabled(DebugLevel::Debug4) {
            log::trace!(target: LOG_TARGET, "tx {:02x?}", bytes);
        }

        if let Err(err) = self.transport.send(&bytes) {
            log::warn!(
                target: LOG_TARGET,
                "Lost hub connection sending {}: {}",
                request.name(),
                err
            );
            self.hub_available = false;
            return Err(AflibError::Unavailable);
        }
        Ok(())
    }

    fn receive_event(&mut self) -> Result<Event, AflibError> {
        if !self.hub_available {
            return Err(AflibError::Unavailable);
        }

        match self.transport.receive() {
            Ok(bytes) => self.decode_event(&bytes),
            Err(err) => {
                log::warn!(target: LOG_TARGET, "Lost hub connection: {}", err);
                self.hub_available = false;
                Err(AflibError::Unavailable)
            }
        }
    }

    fn decode_event(&self, bytes: &[u8]) -> Result<Event, AflibError> {
        if self.debug_enabled(DebugLevel::Debug4) {
            log::trace!(target: LOG_TARGET, "rx {:02x?}", bytes);
        }
        let frame = Frame::from_bytes(bytes)?;
        Event::from_bytes(&frame.payload)
    }

    fn debug_enabled(&self, level: DebugLevel) -> bool {
        self.debug_level.allows(level)
    }
}
