use crate::attribute::{AttributeId, AttributeValue};
use crate::auth::{MAC_LEN, NONCE_LEN};
use crate::error::AflibError;
use nom::bytes::complete::take;
use nom::combinator::{all_consuming, map, map_res};
use nom::multi::length_data;
use nom::number::complete::{le_u16, le_u8};
use nom::{IResult, Parser};
use std::string::String;
use std::vec::Vec;

pub const PROTOCOL_VERSION: u8 = 1;

const TAG_HELLO: u8 = 0x01;
const TAG_AUTHENTICATE: u8 = 0x02;
const TAG_GET_ATTRIBUTE: u8 = 0x10;
const TAG_SET_ATTRIBUTE: u8 = 0x11;
const TAG_CONFIRM_SET: u8 = 0x12;

const TAG_WELCOME: u8 = 0x81;
const TAG_CHALLENGE: u8 = 0x82;
const TAG_REJECTED: u8 = 0x83;
const TAG_NOTIFY: u8 = 0x90;
const TAG_SET_REQUEST: u8 = 0x91;
const TAG_CONNECTION_STATUS: u8 = 0x92;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    UnsupportedVersion,
    AuthFailed,
    AuthRequired,
    Other(u8),
}

impl RejectReason {
    pub fn to_u8(self) -> u8 {
        match self {
            RejectReason::UnsupportedVersion => 1,
            RejectReason::AuthFailed => 2,
            RejectReason::AuthRequired => 3,
            RejectReason::Other(code) => code,
        }
    }
}

impl From<u8> for RejectReason {
    fn from(code: u8) -> Self {
        match code {
            1 => RejectReason::UnsupportedVersion,
            2 => RejectReason::AuthFailed,
            3 => RejectReason::AuthRequired,
            other => RejectReason::Other(other),
        }
    }
}

// --- Client -> hub ---
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    Hello {
        version: u8,
        client_name: String,
    },
    Authenticate {
        mac: [u8; MAC_LEN],
    },
    GetAttribute {
        attr_id: AttributeId,
    },
    SetAttribute {
        attr_id: AttributeId,
        value: AttributeValue,
    },
    ConfirmSet {
        attr_id: AttributeId,
        accepted: bool,
    },
}

impl Request {
    pub fn to_bytes(&self) -> Result<Vec<u8>, AflibError> {
        let mut bytes = Vec::new();
        match self {
            Request::Hello {
                version,
                client_name,
            } => {
                bytes.push(TAG_HELLO);
                bytes.push(*version);
                push_short_bytes(&mut bytes, client_name.as_bytes())?;
            }
            Request::Authenticate { mac } => {
                bytes.push(TAG_AUTHENTICATE);
                bytes.extend_from_slice(mac);
            }
            Request::GetAttribute { attr_id } => {
                bytes.push(TAG_GET_ATTRIBUTE);
                bytes.extend_from_slice(&attr_id.to_le_bytes());
            }
            Request::SetAttribute { attr_id, value } => {
                bytes.push(TAG_SET_ATTRIBUTE);
                bytes.extend_from_slice(&attr_id.to_le_bytes());
                push_short_bytes(&mut bytes, value.as_bytes())?;
            }
            Request::ConfirmSet { attr_id, accepted } => {
                bytes.push(TAG_CONFIRM_SET);
                bytes.extend_from_slice(&attr_id.to_le_bytes());
                bytes.push(*accepted as u8);
            }
        }
        Ok(bytes)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, AflibError> {
        let (&tag, body) = bytes.split_first().ok_or(AflibError::Decode)?;
        match tag {
            TAG_HELLO => finish(body, hello),
            TAG_AUTHENTICATE => finish(body, authenticate),
            TAG_GET_ATTRIBUTE => finish(body, get_attribute),
            TAG_SET_ATTRIBUTE => finish(body, set_attribute),
            TAG_CONFIRM_SET => finish(body, confirm_set),
            _ => Err(AflibError::Decode),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Request::Hello { .. } => "hello",
            Request::Authenticate { .. } => "authenticate",
            Request::GetAttribute { .. } => "get-attribute",
            Request::SetAttribute { .. } => "set-attribute",
            Request::ConfirmSet { .. } => "confirm-set",
        }
    }
}

// --- Hub -> client ---
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Welcome {
        service_connected: bool,
    },
    Challenge {
        nonce: [u8; NONCE_LEN],
    },
    Rejected {
        reason: RejectReason,
    },
    Notify {
        attr_id: AttributeId,
        value: AttributeValue,
    },
    SetRequest {
        attr_id: AttributeId,
        value: AttributeValue,
    },
    ConnectionStatus {
        connected: bool,
    },
}

impl Event {
    pub fn to_bytes(&self) -> Result<Vec<u8>, AflibError> {
        let mut bytes = Vec::new();
        match self {
            Event::Welcome { service_connected } => {
                bytes.push(TAG_WELCOME);
                bytes.push(*service_connected as u8);
            }
            Event::Challenge { nonce } => {
                bytes.push(TAG_CHALLENGE);
                bytes.extend_from_slice(nonce);
            }
            Event::Rejected { reason } => {
                bytes.push(TAG_REJECTED);
                bytes.push(reason.to_u8());
            }
            Event::Notify { attr_id, value } => {
                bytes.push(TAG_NOTIFY);
                bytes.extend_from_slice(&attr_id.to_le_bytes());
                push_short_bytes(&mut bytes, value.as_bytes())?;
            }
            Event::SetRequest { attr_id, value } => {
                bytes.push(TAG_SET_REQUEST);
                bytes.extend_from_slice(&attr_id.to_le_bytes());
                push_short_bytes(&mut bytes, value.as_bytes())?;
            }
            Event::ConnectionStatus { connected } => {
                bytes.push(TAG_CONNECTION_STATUS);
                bytes.push(*connected as u8);
            }
        }
        Ok(bytes)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, AflibError> {
        let (&tag, body) = bytes.split_first().ok_or(AflibError::Decode)?;
        match tag {
            TAG_WELCOME => finish(body, welcome),
            TAG_CHALLENGE => finish(body, challenge),
            TAG_REJECTED => finish(body, rejected),
            TAG_NOTIFY => finish(body, notify),
            TAG_SET_REQUEST => finish(body, set_request),
            TAG_CONNECTION_STATUS => finish(body, connection_status),
            _ => Err(AflibError::Decode),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Event::Welcome { .. } => "welcome",
            Event::Challenge { .. } => "challenge",
            Event::Rejected { .. } => "rejected",
            Event::Notify { .. } => "notify",
            Event::SetRequest { .. } => "set-request",
            Event::ConnectionStatus { .. } => "connection-status",
        }
    }
}

fn push_short_bytes(buffer: &mut Vec<u8>, bytes: &[u8]) -> Result<(), AflibError> {
    let len = u8::try_from(bytes.len()).map_err(|_| AflibError::ValueTooLarge(bytes.len()))?;
    buffer.push(len);
    buffer.extend_from_slice(bytes);
    Ok(())
}

fn finish<'a, T>(
    input: &'a [u8],
    parser: fn(&'a [u8]) -> IResult<&'a [u8], T>,
) -> Result<T, AflibError> {
    let (_, value) = all_consuming(parser).parse(input)?;
    Ok(value)
}

fn flag(input: &[u8]) -> IResult<&[u8], bool> {
    map(le_u8, |byte| byte != 0).parse(input)
}

fn attribute_value(input: &[u8]) -> IResult<&[u8], AttributeValue> {
    map_res(length_data(le_u8), AttributeValue::new).parse(input)
}

fn short_string(input: &[u8]) -> IResult<&[u8], String> {
    map_res(length_data(le_u8), |bytes: &[u8]| {
        std::str::from_utf8(bytes).map(String::from)
    })
    .parse(input)
}

fn fixed<const N: usize>(input: &[u8]) -> IResult<&[u8], [u8; N]> {
    map_res(take(N), |bytes: &[u8]| <[u8; N]>::try_from(bytes)).parse(input)
}

fn hello(input: &[u8]) -> IResult<&[u8], Request> {
    map((le_u8, short_string), |(version, client_name)| {
        Request::Hello {
            version,
            client_name,
        }
    })
    .parse(input)
}

fn authenticate(input: &[u8]) -> IResult<&[u8], Request> {
    map(fixed::<MAC_LEN>, |mac| Request::Authenticate { mac }).parse(input)
}

fn get_attribute(input: &[u8]) -> IResult<&[u8], Request> {
    map(le_u16, |attr_id| Request::GetAttribute { attr_id }).parse(input)
}

fn set_attribute(input: &[u8]) -> IResult<&[u8], Request> {
    map((le_u16, attribute_value), |(attr_id, value)| {
        Request::SetAttribute { attr_id, value }
    })
    .parse(input)
}

fn confirm_set(input: &[u8]) -> IResult<&[u8], Request> {
    map((le_u16, flag), |(attr_id, accepted)| Request::ConfirmSet {
        attr_id,
        accepted,
    })
    .parse(input)
}

fn welcome(input: &[u8]) -> IResult<&[u8], Event> {
    map(flag, |service_connected| Event::Welcome { service_connected }).parse(input)
}

fn challenge(input: &[u8]) -> IResult<&[u8], Event> {
    map(fixed::<NONCE_LEN>, |nonce| Event::Challenge { nonce }).parse(input)
}

fn rejected(input: &[u8]) -> IResult<&[u8], Event> {
    map(le_u8, |code| Event::Rejected {
        reason: RejectReason::from(code),
    })
    .parse(input)
}

fn notify(input: &[u8]) -> IResult<&[u8], Event> {
    map((le_u16, attribute_value), |(attr_id, value)| Event::Notify {
        attr_id,
        value,
    })
    .parse(input)
}

fn set_request(input: &[u8]) -> IResult<&[u8], Event> {
    map((le_u16, attribute_value), |(attr_id, value)| {
        Event::SetRequest { attr_id, value }
    })
    .parse(input)
}

fn connection_status(input: &[u8]) -> IResult<&[u8], Event> {
    map(flag, |connected| Event::ConnectionStatus { connected }).parse(input)
}
