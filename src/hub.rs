//! Hub side of the link: the daemon that relays attributes to the service.
//!
//! Used to simulate a hub for devices under test and to exercise the client
//! against a real peer.

use crate::attribute::{AttributeId, AttributeValue};
use crate::auth;
use crate::error::AflibError;
use crate::frame::Frame;
use crate::message::{Event, RejectReason, Request, PROTOCOL_VERSION};
use crate::transport::Transport;
use std::collections::BTreeMap;
use std::string::String;
use std::vec::Vec;

const LOG_TARGET: &str = "aflib::hub";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HubOptions {
    pub auth_key: Option<Vec<u8>>,
    pub service_connected: bool,
}

pub struct Hub<T: Transport> {
    transport: T,
    options: HubOptions,
    client_name: Option<String>,
    attributes: BTreeMap<AttributeId, AttributeValue>,
    outstanding_sets: BTreeMap<AttributeId, AttributeValue>,
    confirmations: Vec<(AttributeId, bool)>,
}

impl<T: Transport> Hub<T> {
    pub fn new(transport: T, options: HubOptions) -> Self {
        Hub {
            transport,
            options,
            client_name: None,
            attributes: BTreeMap::new(),
            outstanding_sets: BTreeMap::new(),
            confirmations: Vec::new(),
        }
    }

    /// Seeds the attribute store without notifying the client.
    pub fn insert_attribute(&mut self, attr_id: AttributeId, value: AttributeValue) {
        self.attributes.insert(attr_id, value);
    }

    pub fn attribute(&self, attr_id: AttributeId) -> Option<&AttributeValue> {
        self.attributes.get(&attr_id)
    }

    pub fn confirmations(&self) -> &[(AttributeId, bool)] {
        &self.confirmations
    }

    pub fn client_name(&self) -> Option<&str> {
        self.client_name.as_deref()
    }

    /// Runs the hello exchange with a newly connected client.
    pub fn accept(&mut self) -> Result<(), AflibError> {
        let (version, client_name) = match self.receive_request()? {
            Request::Hello {
                version,
                client_name,
            } => (version, client_name),
            other => return Err(AflibError::UnexpectedMessage(other.name())),
        };

        if version != PROTOCOL_VERSION {
            return self.reject(RejectReason::UnsupportedVersion);
        }

        if let Some(key) = self.options.auth_key.clone() {
            let nonce = auth::generate_challenge();
            self.send(&Event::Challenge { nonce })?;

            let mac = match self.receive_request()? {
                Request::Authenticate { mac } => mac,
                _ => return self.reject(RejectReason::AuthRequired),
            };
            let valid = auth::verify(&key, &nonce, &mac)
                .map_err(|_| AflibError::Auth("configured key is unusable"))?;
            if !valid {
                return self.reject(RejectReason::AuthFailed);
            }
        }

        log::info!(target: LOG_TARGET, "Client {:?} connected", client_name);
        self.client_name = Some(client_name);
        self.send(&Event::Welcome {
            service_connected: self.options.service_connected,
        })
    }

    fn reject(&mut self, reason: RejectReason) -> Result<(), AflibError> {
        log::warn!(target: LOG_TARGET, "Rejecting client: {:?}", reason);
        self.send(&Event::Rejected { reason })?;
        Err(AflibError::Rejected(reason))
    }

    /// Handles requests until the transport fails. Bad frames are skipped.
    pub fn serve(&mut self) -> Result<(), AflibError> {
        loop {
            let bytes = self.transport.receive().map_err(AflibError::transport)?;
            match self.handle_request(&bytes) {
                Ok(()) => {}
                Err(err @ AflibError::Transport(_)) => return Err(err),
                Err(err) => log::warn!(target: LOG_TARGET, "Dropping request: {}", err),
            }
        }
    }

    pub fn handle_request(&mut self, bytes: &[u8]) -> Result<(), AflibError> {
        let frame = Frame::from_bytes(bytes)?;
        let request = Request::from_bytes(&frame.payload)?;
        log::debug!(target: LOG_TARGET, "Received {}", request.name());

        match request {
            Request::GetAttribute { attr_id } => {
                let value = self.attributes.get(&attr_id).cloned().unwrap_or_default();
                self.send(&Event::Notify { attr_id, value })
            }
            Request::SetAttribute { attr_id, value } => {
                self.attributes.insert(attr_id, value);
                Ok(())
            }
            Request::ConfirmSet { attr_id, accepted } => {
                self.confirmations.push((attr_id, accepted));
                match self.outstanding_sets.remove(&attr_id) {
                    Some(value) if accepted => {
                        self.attributes.insert(attr_id, value);
                    }
                    Some(_) => {}
                    None => log::warn!(
                        target: LOG_TARGET,
                        "Confirmation for attribute {} without a set request",
                        attr_id
                    ),
                }
                Ok(())
            }
            other => Err(AflibError::UnexpectedMessage(other.name())),
        }
    }

    /// Forwards a service-side set request to the device.
    pub fn push_set_request(
        &mut self,
        attr_id: AttributeId,
        value: AttributeValue,
    ) -> Result<(), AflibError> {
        self.outstanding_sets.insert(attr_id, value.clone());
        self.send(&Event::SetRequest { attr_id, value })
    }

    /// Stores a new value and notifies the device.
    pub fn update_attribute(
        &mut self,
        attr_id: AttributeId,
        value: AttributeValue,
    ) -> Result<(), AflibError> {
        self.attributes.insert(attr_id, value.clone());
        self.send(&Event::Notify { attr_id, value })
    }

    pub fn set_service_connected(&mut self, connected: bool) -> Result<(), AflibError> {
        self.options.service_connected = connected;
        self.send(&Event::ConnectionStatus { connected })
    }

    fn send(&mut self, event: &Event) -> Result<(), AflibError> {
        let bytes = Frame::new(event.to_bytes()?).to_bytes()?;
        self.transport.send(&bytes).map_err(AflibError::transport)
    }

    fn receive_request(&mut self) -> Result<Request, AflibError> {
        let bytes = self.transport.receive().map_err(AflibError::transport)?;
        let frame = Frame::from_bytes(&bytes)?;
        Request::from_bytes(&frame.payload)
    }
}
