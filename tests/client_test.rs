use aflib::auth;
use aflib::client::{Client, ClientOptions};
use aflib::frame::Frame;
use aflib::message::{Event, RejectReason, Request, PROTOCOL_VERSION};
use aflib::transport::Transport;
use aflib::{AfStatus, AflibError, AttributeValue, MAX_ATTRIBUTE_SIZE};
use std::collections::VecDeque;
use std::io;

#[derive(Default)]
struct ScriptedTransport {
    incoming: VecDeque<Vec<u8>>,
    sent: Vec<Vec<u8>>,
    fail_sends_after: Option<usize>,
}

impl ScriptedTransport {
    fn with_events(events: &[Event]) -> Self {
        Self {
            incoming: events.iter().map(encode_event).collect(),
            ..Default::default()
        }
    }
}

impl Transport for ScriptedTransport {
    type Error = io::Error;

    fn send(&mut self, bytes: &[u8]) -> Result<(), Self::Error> {
        if self
            .fail_sends_after
            .is_some_and(|limit| self.sent.len() >= limit)
        {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "hub went away"));
        }
        self.sent.push(bytes.to_vec());
        Ok(())
    }

    fn receive(&mut self) -> Result<Vec<u8>, Self::Error> {
        self.incoming
            .pop_front()
            .ok_or_else(|| io::Error::new(io::ErrorKind::UnexpectedEof, "script exhausted"))
    }
}

fn encode_event(event: &Event) -> Vec<u8> {
    Frame::new(event.to_bytes().expect("event encoding"))
        .to_bytes()
        .expect("frame encoding")
}

fn welcome() -> Event {
    Event::Welcome {
        service_connected: true,
    }
}

fn sent_requests(client: &Client<ScriptedTransport>) -> Vec<Request> {
    client
        .transport()
        .sent
        .iter()
        .map(|bytes| {
            let frame = Frame::from_bytes(bytes).expect("sent frame");
            Request::from_bytes(&frame.payload).expect("sent request")
        })
        .collect()
}

fn connected_client(transport: ScriptedTransport) -> Client<ScriptedTransport> {
    Client::init(transport, &ClientOptions::default(), |_, _| true, |_, _| {})
        .expect("handshake")
}

#[test]
fn get_attribute_sends_request() {
    let mut client = connected_client(ScriptedTransport::with_events(&[welcome()]));

    client.get_attribute(1201).unwrap();

    assert_eq!(
        sent_requests(&client).last(),
        Some(&Request::GetAttribute { attr_id: 1201 })
    );
}

#[test]
fn typed_setters_encode_values() {
    let mut client = connected_client(ScriptedTransport::with_events(&[welcome()]));

    client.set_attribute_bool(1, true).unwrap();
    client.set_attribute_i8(2, -1).unwrap();
    client.set_attribute_i16(3, 0x0102).unwrap();
    client.set_attribute_i32(4, 0x0102_0304).unwrap();
    client.set_attribute_i64(5, -2).unwrap();
    client.set_attribute_str(6, "heat").unwrap();
    client.set_attribute_bytes(7, &[0xDE, 0xAD]).unwrap();

    let values: Vec<(u16, Vec<u8>)> = sent_requests(&client)
        .into_iter()
        .filter_map(|request| match request {
            Request::SetAttribute { attr_id, value } => Some((attr_id, value.into_bytes())),
            _ => None,
        })
        .collect();

    assert_eq!(
        values,
        vec![
            (1, vec![0x01]),
            (2, vec![0xFF]),
            (3, vec![0x02, 0x01]),
            (4, vec![0x04, 0x03, 0x02, 0x01]),
            (5, vec![0xFE, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF]),
            (6, b"heat".to_vec()),
            (7, vec![0xDE, 0xAD]),
        ]
    );
}

#[test]
fn oversized_values_are_rejected_before_sending() {
    let mut client = connected_client(ScriptedTransport::with_events(&[welcome()]));
    let sent_before = client.transport().sent.len();

    let bytes = vec![0u8; MAX_ATTRIBUTE_SIZE + 1];
    let result = client.set_attribute_bytes(10, &bytes);
    assert!(matches!(result, Err(AflibError::ValueTooLarge(256))));
    assert_eq!(AfStatus::from(result), AfStatus::InvalidParam);

    let text = "x".repeat(MAX_ATTRIBUTE_SIZE + 10);
    assert_eq!(
        AfStatus::from(client.set_attribute_str(10, &text)),
        AfStatus::InvalidParam
    );

    assert_eq!(client.transport().sent.len(), sent_before);
    assert!(client.is_hub_available());
}

#[test]
fn full_size_value_is_accepted() {
    let mut client = connected_client(ScriptedTransport::with_events(&[welcome()]));
    let value = AttributeValue::new(&[0x7E; MAX_ATTRIBUTE_SIZE]).unwrap();

    client.set_attribute(11, value.clone()).unwrap();

    assert_eq!(
        sent_requests(&client).last(),
        Some(&Request::SetAttribute { attr_id: 11, value })
    );
}

#[test]
fn send_failure_makes_hub_unavailable() {
    let transport = ScriptedTransport {
        fail_sends_after: Some(1),
        ..ScriptedTransport::with_events(&[welcome()])
    };
    let mut client = connected_client(transport);

    let result = client.set_attribute_i32(1, 5);
    assert!(matches!(result, Err(AflibError::Unavailable)));
    assert_eq!(AfStatus::from(result), AfStatus::Unavailable);
    assert!(!client.is_hub_available());

    assert!(matches!(client.get_attribute(1), Err(AflibError::Unavailable)));
    assert!(matches!(client.poll(), Err(AflibError::Unavailable)));
    assert_eq!(client.transport().sent.len(), 1);
}

#[test]
fn receive_failure_makes_hub_unavailable() {
    let mut client = connected_client(ScriptedTransport::with_events(&[welcome()]));

    assert!(matches!(client.poll(), Err(AflibError::Unavailable)));
    assert!(!client.is_hub_available());
    assert!(matches!(
        client.set_attribute_bool(1, true),
        Err(AflibError::Unavailable)
    ));
}

#[test]
fn handshake_answers_challenge() {
    let nonce = [0x5A; auth::NONCE_LEN];
    let transport = ScriptedTransport::with_events(&[Event::Challenge { nonce }, welcome()]);
    let options = ClientOptions {
        client_name: "thermostat".into(),
        auth_key: Some(b"hub-secret".to_vec()),
        ..ClientOptions::default()
    };

    let client = Client::init(transport, &options, |_, _| true, |_, _| {}).unwrap();

    let expected_mac = auth::respond(b"hub-secret", &nonce).unwrap();
    assert_eq!(
        sent_requests(&client),
        vec![
            Request::Hello {
                version: PROTOCOL_VERSION,
                client_name: "thermostat".into(),
            },
            Request::Authenticate { mac: expected_mac },
        ]
    );
    assert!(client.is_service_connected());
}

#[test]
fn challenge_without_key_fails() {
    let transport = ScriptedTransport::with_events(&[Event::Challenge {
        nonce: [1; auth::NONCE_LEN],
    }]);

    let result = Client::init(transport, &ClientOptions::default(), |_, _| true, |_, _| {});

    assert!(matches!(result, Err(AflibError::Auth(_))));
}

#[test]
fn rejection_is_reported() {
    let transport = ScriptedTransport::with_events(&[Event::Rejected {
        reason: RejectReason::AuthFailed,
    }]);

    let result = Client::init(transport, &ClientOptions::default(), |_, _| true, |_, _| {});

    assert!(matches!(
        result,
        Err(AflibError::Rejected(RejectReason::AuthFailed))
    ));
}

#[test]
fn unexpected_event_during_handshake() {
    let transport = ScriptedTransport::with_events(&[Event::Notify {
        attr_id: 1,
        value: AttributeValue::empty(),
    }]);

    let result = Client::init(transport, &ClientOptions::default(), |_, _| true, |_, _| {});

    assert!(matches!(result, Err(AflibError::UnexpectedMessage("notify"))));
}

#[test]
fn silent_hub_during_handshake_is_unavailable() {
    let result = Client::init(
        ScriptedTransport::default(),
        &ClientOptions::default(),
        |_, _| true,
        |_, _| {},
    );

    match result {
        Err(err) => assert_eq!(err.status(), AfStatus::Unavailable),
        Ok(_) => panic!("handshake should fail without a hub"),
    }
}
