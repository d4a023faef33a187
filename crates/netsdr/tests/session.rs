use std::path::PathBuf;
use std::time::Duration;

use netsdr::control::{CaptureMode, DataFormat, ListenerState, ReceiverChannel};
use netsdr::frame::{decode_header, MessageType, HEADER_SIZE};
use netsdr::iq::IqReceiverConfig;
use netsdr::transport::TransportError;
use netsdr::{ClientConfig, NetSdrClient, ProtocolError};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream, UdpSocket};
use tokio::sync::mpsc;

fn unique_temp_dir(tag: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!(
        "netsdr-session-{tag}-{}-{}",
        std::process::id(),
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .expect("time should be after epoch")
            .as_nanos()
    ));
    std::fs::create_dir_all(&dir).expect("temp dir should be creatable");
    dir
}

fn target_frame(message_type: MessageType, control_code: u16, body: &[u8]) -> Vec<u8> {
    let length = (HEADER_SIZE + body.len()) as u16;
    let mut frame = Vec::with_capacity(HEADER_SIZE + body.len());
    frame.extend_from_slice(&(length | (u16::from(message_type.bits()) << 13)).to_le_bytes());
    frame.extend_from_slice(&control_code.to_le_bytes());
    frame.extend_from_slice(body);
    frame
}

/// Read one host request; `None` once the host closes the stream.
async fn read_request(stream: &mut TcpStream) -> Option<(u16, Vec<u8>)> {
    let mut header = [0u8; HEADER_SIZE];
    stream.read_exact(&mut header).await.ok()?;
    let header = decode_header(&header);
    let mut parameters = vec![0u8; usize::from(header.length) + 2 - HEADER_SIZE];
    stream.read_exact(&mut parameters).await.ok()?;
    Some((header.control_code, parameters))
}

enum Reply {
    Ack,
    Nak,
}

/// A receiver double: answers every request and reports what it was sent.
/// A run command is preceded by an unsolicited item.
async fn spawn_device(reply: Reply) -> (u16, mpsc::UnboundedReceiver<(u16, Vec<u8>)>) {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("device should bind");
    let port = listener.local_addr().expect("device addr").port();
    let (tx, rx) = mpsc::unbounded_channel();

    tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.expect("device should accept");
        while let Some((control_code, parameters)) = read_request(&mut stream).await {
            let starting = control_code == 0x0018 && parameters.get(1) == Some(&0x02);
            let _ = tx.send((control_code, parameters));

            if starting {
                let event = target_frame(MessageType::UNSOLICITED_CONTROL_ITEM, 0x0005, &[0x01]);
                stream.write_all(&event).await.expect("device should notify");
            }
            let response = match reply {
                Reply::Ack => target_frame(MessageType::RESPONSE, control_code, &[]),
                Reply::Nak => {
                    let mut nak = 2u16.to_le_bytes().to_vec();
                    nak.extend_from_slice(&control_code.to_le_bytes());
                    nak
                }
            };
            stream.write_all(&response).await.expect("device should reply");
        }
    });

    (port, rx)
}

#[tokio::test]
async fn full_session_streams_iq_to_file() {
    let (port, mut requests) = spawn_device(Reply::Ack).await;
    let dir = unique_temp_dir("full");
    let output = dir.join("capture.raw");

    let mut client = NetSdrClient::default();
    client
        .connect("127.0.0.1", port)
        .await
        .expect("client should connect");
    let mut events = client.subscribe();

    client
        .set_frequency(ReceiverChannel::Channel1, 7_074_000)
        .await
        .expect("frequency should be acknowledged");

    let iq_addr = client
        .start_iq_receiver(
            &IqReceiverConfig {
                bind_addr: "127.0.0.1:0".parse().expect("addr"),
                ..IqReceiverConfig::default()
            },
            &output,
        )
        .await
        .expect("iq receiver should start");

    client
        .start_iq_stream(DataFormat::Complex, CaptureMode::Contiguous16Bit, 0)
        .await
        .expect("start should be acknowledged");

    let event = tokio::time::timeout(Duration::from_secs(2), events.recv())
        .await
        .expect("event should arrive")
        .expect("event channel open");
    assert_eq!(event.control_code, 0x0005);
    assert_eq!(event.body.as_ref(), &[0x01]);

    let sender = UdpSocket::bind("127.0.0.1:0").await.expect("sender bind");
    let datagrams: [&[u8]; 3] = [&[1, 2, 3, 4], &[5, 6], &[7, 8, 9]];
    for datagram in datagrams {
        sender.send_to(datagram, iq_addr).await.expect("send datagram");
    }
    tokio::time::timeout(Duration::from_secs(2), async {
        while client.iq_receiver_stats().map(|s| s.datagrams) != Some(3) {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("all datagrams should be received");

    client
        .stop_iq_stream()
        .await
        .expect("stop should be acknowledged");
    let summary = client
        .stop_iq_receiver()
        .await
        .expect("receiver should stop cleanly")
        .expect("receiver was running");
    assert_eq!(summary.datagrams, 3);
    assert_eq!(summary.bytes, 9);

    let status = client.listener_status().expect("connected");
    assert_eq!(status.unsolicited_dispatched, 1);
    assert_eq!(status.state, ListenerState::Running);
    client.disconnect().await;

    assert_eq!(
        std::fs::read(&output).expect("capture should exist"),
        [1, 2, 3, 4, 5, 6, 7, 8, 9]
    );

    let mut seen = Vec::new();
    while let Ok(request) = requests.try_recv() {
        seen.push(request);
    }
    assert_eq!(
        seen,
        vec![
            (0x0020, vec![0x00, 0xD0, 0xF0, 0x6B, 0x00, 0x00]),
            (0x0018, vec![0x80, 0x02, 0x00, 0x00]),
            (0x0018, vec![0x00, 0x01, 0x00, 0x00]),
        ]
    );

    let _ = std::fs::remove_dir_all(&dir);
}

#[tokio::test]
async fn nak_from_device_is_reported() {
    let (port, _requests) = spawn_device(Reply::Nak).await;

    let mut client = NetSdrClient::default();
    client
        .connect("127.0.0.1", port)
        .await
        .expect("client should connect");

    let err = client
        .start_iq_stream(DataFormat::Real, CaptureMode::Fifo16Bit, 4)
        .await
        .expect_err("device rejects everything");
    assert!(matches!(err, ProtocolError::Nak { control_code: 0x0018 }));

    // The NAK carried no body, so the next exchange is still aligned.
    let err = client
        .set_frequency(ReceiverChannel::Channel2, 10_000_000)
        .await
        .expect_err("device rejects everything");
    assert!(matches!(err, ProtocolError::Nak { control_code: 0x0020 }));

    client.disconnect().await;
}

#[tokio::test]
async fn connect_refused_is_transport_error() {
    let port = {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        listener.local_addr().expect("addr").port()
    };

    let mut client = NetSdrClient::new(ClientConfig {
        connect_timeout: Duration::from_secs(2),
        ..ClientConfig::default()
    });
    let err = client
        .connect("127.0.0.1", port)
        .await
        .expect_err("nothing is listening");
    assert!(matches!(
        err,
        ProtocolError::Transport(TransportError::Connect { .. })
    ));
    assert!(!client.is_connected());
}

#[tokio::test]
async fn device_hangup_closes_listener() {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let port = listener.local_addr().expect("addr").port();
    tokio::spawn(async move {
        let (stream, _) = listener.accept().await.expect("accept");
        drop(stream);
    });

    let mut client = NetSdrClient::default();
    client
        .connect("127.0.0.1", port)
        .await
        .expect("client should connect");

    let mut updates = client.listener_updates().expect("connected");
    tokio::time::timeout(Duration::from_secs(2), async {
        while updates.borrow_and_update().is_running() {
            if updates.changed().await.is_err() {
                break;
            }
        }
    })
    .await
    .expect("listener should notice the hangup");
    let state = client.listener_status().expect("still attached").state;
    assert!(matches!(state, ListenerState::Closed | ListenerState::Failed));
    assert!(!client.is_connected());

    let err = client.stop_iq_stream().await.expect_err("device is gone");
    assert!(matches!(err, ProtocolError::NotConnected));
}
