//! End-to-end tests against an in-process fake host.
//!
//! The fake host accepts both session sockets on loopback, answers each
//! NUL-terminated command through a test-supplied closure, and can emit
//! framed payloads on the push socket.
use std::io::{BufRead, BufReader, Read, Write};
use std::net::{TcpListener, TcpStream};
use std::thread;
use std::time::Duration;

use vlink::{LinkError, PayloadKind, Session, SessionConfig};

/// Bind a command/push listener pair on consecutive loopback ports.
fn bind_pair() -> (TcpListener, TcpListener, u16) {
    loop {
        let command = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = command.local_addr().unwrap().port();
        if port == u16::MAX {
            continue;
        }
        if let Ok(push) = TcpListener::bind(("127.0.0.1", port + 1)) {
            return (command, push, port);
        }
    }
}

/// Read one NUL-terminated command off the wire.
fn read_command(reader: &mut BufReader<TcpStream>) -> Option<String> {
    let mut raw = Vec::new();
    match reader.read_until(0, &mut raw) {
        Ok(0) | Err(_) => return None,
        Ok(_) => {}
    }
    if raw.last() == Some(&0) {
        raw.pop();
    }
    Some(String::from_utf8_lossy(&raw).into_owned())
}

fn write_response(writer: &mut TcpStream, text: String) -> bool {
    let mut response = text.into_bytes();
    response.push(0);
    writer.write_all(&response).is_ok()
}

/// Spawn a fake host. The responder sees each decoded command and the push
/// stream, and returns the response text (NUL terminator appended here).
fn spawn_host<F>(mut respond: F) -> u16
where
    F: FnMut(&str, &mut TcpStream) -> String + Send + 'static,
{
    let (command_listener, push_listener, port) = bind_pair();

    thread::spawn(move || {
        let (command, _) = command_listener.accept().unwrap();
        let (mut push, _) = push_listener.accept().unwrap();

        let mut reader = BufReader::new(command.try_clone().unwrap());
        let mut writer = command;
        while let Some(text) = read_command(&mut reader) {
            let response = respond(&text, &mut push);
            if !write_response(&mut writer, response) {
                return;
            }
        }
    });

    port
}

/// Spawn a fake host that answers the version probe and then aborts the
/// connection in the middle of the next command, for `aborted_pairs`
/// consecutive connection pairs. After that it serves commands normally.
fn spawn_flaky_host(aborted_pairs: usize) -> u16 {
    let (command_listener, push_listener, port) = bind_pair();

    thread::spawn(move || {
        for _ in 0..aborted_pairs {
            let (command, _) = command_listener.accept().unwrap();
            let (_push, _) = push_listener.accept().unwrap();
            let mut reader = BufReader::new(command.try_clone().unwrap());
            let mut writer = command;

            assert_eq!(
                read_command(&mut reader).as_deref(),
                Some("GetVSTARSVersion()")
            );
            assert!(write_response(&mut writer, version_response("4.9.8.53")));

            // Take one byte of the next command, then drop the socket with
            // the rest unread; the peer sees a connection reset rather than
            // a clean close.
            let mut one = [0u8; 1];
            let _ = writer.read(&mut one);
        }

        let (command, _) = command_listener.accept().unwrap();
        let (_push, _) = push_listener.accept().unwrap();
        let mut reader = BufReader::new(command.try_clone().unwrap());
        let mut writer = command;
        while let Some(text) = read_command(&mut reader) {
            let response = match text.as_str() {
                "GetVSTARSVersion()" => version_response("4.9.8.53"),
                "ProjectPath()" => "{projectPath=D:/jobs/demo}".to_string(),
                other => panic!("unexpected command: {other}"),
            };
            if !write_response(&mut writer, response) {
                return;
            }
        }
    });

    port
}

fn connect(port: u16) -> Session {
    let _ = env_logger::builder().is_test(true).try_init();
    let mut session = Session::new(SessionConfig {
        host: "127.0.0.1".to_string(),
        command_port: port,
    });
    session.connect().unwrap();
    session
}

fn version_response(version: &str) -> String {
    format!("{{versionString={version}}}")
}

const CLOUD_FRAME: &str = concat!(
    "<json>",
    r#"{"GCloud": {"points": [
        {"label": "T1", "X": 1.0, "Y": 0.0, "Z": 0.0,
         "i": 0.0, "j": 0.0, "k": 1.0,
         "nRays": 4, "offset": 0.0,
         "covariance": {"rows": 0, "cols": 0, "data": []}}
    ]}}"#,
    r"<\json>"
);

#[test]
fn connect_reads_and_encodes_host_version() {
    let port = spawn_host(|cmd, _| {
        assert_eq!(cmd, "GetVSTARSVersion()");
        version_response("4.9.8.53")
    });

    let session = connect(port);
    assert!(session.is_connected());
    assert_eq!(session.host_version(), 40_090_080_530_000);
}

#[test]
fn execute_parses_values_into_the_store() {
    let port = spawn_host(|cmd, _| match cmd {
        "GetVSTARSVersion()" => version_response("4.9.8.53"),
        "ProjectPath()" => "{projectPath=D:/jobs/demo}".to_string(),
        other => panic!("unexpected command: {other}"),
    });

    let mut session = connect(port);
    assert_eq!(session.project_path().unwrap(), "D:/jobs/demo");
    assert!(!session.last_failed());
}

#[test]
fn host_reported_failure_raises_and_records_message() {
    let port = spawn_host(|cmd, _| match cmd {
        "GetVSTARSVersion()" => version_response("4.9.8.53"),
        cmd if cmd.starts_with("FileOpenTemplateProject") => {
            "vstarsError {errorMessage=no such template}".to_string()
        }
        // The dispatcher forwards the failure to the host's script log.
        cmd if cmd.starts_with("ScriptErrorToLog") => "{}".to_string(),
        other => panic!("unexpected command: {other}"),
    });

    let mut session = connect(port);
    let err = session
        .file_open_template_project("Missing", "Out")
        .unwrap_err();

    assert!(matches!(err, LinkError::Host(ref msg) if msg == "no such template"));
    assert!(session.last_failed());
    assert_eq!(session.last_error(), Some("no such template"));
}

#[test]
fn async_payload_hands_off_to_waiting_caller() {
    let port = spawn_host(|cmd, push| match cmd {
        "GetVSTARSVersion()" => version_response("4.9.8.53"),
        cmd if cmd.starts_with("GetCloud") => {
            // Emitted before the command response; arm-before-dispatch
            // makes the ordering irrelevant.
            push.write_all(CLOUD_FRAME.as_bytes()).unwrap();
            "{}".to_string()
        }
        other => panic!("unexpected command: {other}"),
    });

    let mut session = connect(port);
    let cloud = session
        .get_cloud("Final Results", Some(Duration::from_secs(10)))
        .unwrap();

    assert_eq!(cloud.points.len(), 1);
    assert_eq!(cloud.points[0].label, "T1");
    assert_eq!(cloud.points[0].total_rays, -1);

    // The latest-slot keeps the payload after the handoff.
    assert!(session.latest(PayloadKind::Cloud).is_some());
}

#[test]
fn payload_frame_split_across_writes_still_arrives() {
    let port = spawn_host(|cmd, push| match cmd {
        "GetVSTARSVersion()" => version_response("4.9.8.53"),
        cmd if cmd.starts_with("GetCloud") => {
            let bytes = CLOUD_FRAME.as_bytes();
            let mid = bytes.len() / 2;
            push.write_all(&bytes[..mid]).unwrap();
            push.flush().unwrap();
            thread::sleep(Duration::from_millis(50));
            push.write_all(&bytes[mid..]).unwrap();
            "{}".to_string()
        }
        other => panic!("unexpected command: {other}"),
    });

    let mut session = connect(port);
    let cloud = session
        .get_cloud("Final Results", Some(Duration::from_secs(10)))
        .unwrap();
    assert_eq!(cloud.points[0].label, "T1");
}

#[test]
fn payload_split_inside_a_multibyte_character_stays_intact() {
    const FRAME: &str = concat!(
        "<json>",
        r#"{"GCloud": {"points": [
            {"label": "Tü1", "X": 1.0, "Y": 0.0, "Z": 0.0,
             "i": 0.0, "j": 0.0, "k": 1.0,
             "nRays": 4, "offset": 0.0,
             "covariance": {"rows": 0, "cols": 0, "data": []}}
        ]}}"#,
        r"<\json>"
    );

    let port = spawn_host(|cmd, push| match cmd {
        "GetVSTARSVersion()" => version_response("4.9.8.53"),
        cmd if cmd.starts_with("GetCloud") => {
            // Cut between the two bytes of the 'ü'.
            let bytes = FRAME.as_bytes();
            let mid = bytes.iter().position(|&b| b == 0xc3).unwrap() + 1;
            push.write_all(&bytes[..mid]).unwrap();
            push.flush().unwrap();
            thread::sleep(Duration::from_millis(50));
            push.write_all(&bytes[mid..]).unwrap();
            "{}".to_string()
        }
        other => panic!("unexpected command: {other}"),
    });

    let mut session = connect(port);
    let cloud = session
        .get_cloud("Final Results", Some(Duration::from_secs(10)))
        .unwrap();
    assert_eq!(cloud.points[0].label, "Tü1");
}

#[test]
fn send_failure_reconnects_and_retries_once() {
    let port = spawn_flaky_host(1);

    let mut session = connect(port);
    assert_eq!(session.project_path().unwrap(), "D:/jobs/demo");
    assert!(session.is_connected());
    assert_eq!(session.host_version(), 40_090_080_530_000);
}

#[test]
fn second_send_failure_is_fatal() {
    let port = spawn_flaky_host(2);

    let mut session = connect(port);
    let err = session.project_path().unwrap_err();
    assert!(matches!(err, LinkError::Io(_)));
}

#[test]
fn missing_payload_times_out_distinctly() {
    let port = spawn_host(|cmd, _| match cmd {
        "GetVSTARSVersion()" => version_response("4.9.8.53"),
        cmd if cmd.starts_with("GetCloud") => "{}".to_string(),
        other => panic!("unexpected command: {other}"),
    });

    let mut session = connect(port);
    let err = session
        .get_cloud("Nothing", Some(Duration::from_millis(100)))
        .unwrap_err();

    assert!(matches!(
        err,
        LinkError::PayloadTimeout {
            kind: PayloadKind::Cloud
        }
    ));
    // Timeout is not a host-reported failure.
    assert!(!session.last_failed());
}

#[test]
fn old_host_refuses_gated_payload_kinds() {
    let port = spawn_host(|cmd, _| match cmd {
        "GetVSTARSVersion()" => version_response("4.9.4-1"),
        cmd if cmd.starts_with("GetMatrix") => "{}".to_string(),
        other => panic!("unexpected command: {other}"),
    });

    let mut session = connect(port);
    let err = session
        .get_matrix("alignment", Some(Duration::from_secs(1)))
        .unwrap_err();

    assert!(matches!(
        err,
        LinkError::UnsupportedPayload {
            kind: PayloadKind::Matrix,
            ..
        }
    ));
}

#[test]
fn operations_on_unconnected_session_fail_loudly() {
    let mut session = Session::new(SessionConfig::default());
    assert!(matches!(
        session.project_path(),
        Err(LinkError::NotConnected)
    ));
    assert!(matches!(session.store(), Err(LinkError::NotConnected)));
}
