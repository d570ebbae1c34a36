//! Codec Tests
//!
//! Tests for command and response encoding/decoding.

use udpkv::protocol::{
    decode_command, decode_message, decode_response, encode_command, encode_message,
    encode_response, Command, CommandMessage, ErrCode, Response, MAX_DATAGRAM_SIZE,
};
use udpkv::KvError;

// =============================================================================
// Command Encoding/Decoding Tests
// =============================================================================

#[test]
fn test_encode_decode_put() {
    let cmd = Command::Put {
        key: b"mykey".to_vec(),
        value: b"myvalue".to_vec(),
        version: 7,
    };
    let encoded = encode_command(&cmd).unwrap();
    let decoded = decode_command(&encoded).unwrap();

    assert_eq!(decoded, cmd);
}

#[test]
fn test_encode_decode_get() {
    let cmd = Command::Get {
        key: b"hello".to_vec(),
    };
    let encoded = encode_command(&cmd).unwrap();
    let decoded = decode_command(&encoded).unwrap();

    match decoded {
        Command::Get { key } => assert_eq!(key, b"hello"),
        _ => panic!("Expected GET command"),
    }
}

#[test]
fn test_encode_decode_remove() {
    let cmd = Command::Remove {
        key: b"todelete".to_vec(),
    };
    let decoded = decode_command(&encode_command(&cmd).unwrap()).unwrap();
    assert_eq!(decoded, cmd);
}

#[test]
fn test_encode_decode_admin_commands() {
    for cmd in [
        Command::Shutdown,
        Command::Wipeout,
        Command::IsAlive,
        Command::GetPid,
        Command::GetMembershipCount,
    ] {
        let decoded = decode_command(&encode_command(&cmd).unwrap()).unwrap();
        assert_eq!(decoded, cmd);
    }
}

#[test]
fn test_unknown_command_code_survives_decoding() {
    let cmd = Command::Unknown(99);
    let decoded = decode_command(&encode_command(&cmd).unwrap()).unwrap();
    assert_eq!(decoded, Command::Unknown(99));
}

#[test]
fn test_command_codes() {
    assert_eq!(Command::Put { key: vec![], value: vec![], version: 0 }.code(), 0x01);
    assert_eq!(Command::Get { key: vec![] }.code(), 0x02);
    assert_eq!(Command::Remove { key: vec![] }.code(), 0x03);
    assert_eq!(Command::Shutdown.code(), 0x04);
    assert_eq!(Command::Wipeout.code(), 0x05);
    assert_eq!(Command::IsAlive.code(), 0x06);
    assert_eq!(Command::GetPid.code(), 0x07);
    assert_eq!(Command::GetMembershipCount.code(), 0x08);
}

#[test]
fn test_encode_decode_binary_data() {
    // Binary data containing null bytes and high bytes
    let binary_key: Vec<u8> = vec![0x00, 0x01, 0xFF, 0xFE, 0x80];
    let binary_value: Vec<u8> = (0..=255).collect();

    let cmd = Command::Put {
        key: binary_key.clone(),
        value: binary_value.clone(),
        version: -1,
    };
    let decoded = decode_command(&encode_command(&cmd).unwrap()).unwrap();

    match decoded {
        Command::Put {
            key,
            value,
            version,
        } => {
            assert_eq!(key, binary_key);
            assert_eq!(value, binary_value);
            assert_eq!(version, -1);
        }
        _ => panic!("Expected PUT command"),
    }
}

#[test]
fn test_missing_fields_decode_to_defaults() {
    let message = CommandMessage {
        command: 0x01,
        key: None,
        value: None,
        version: None,
    };
    let encoded = encode_message(&message).unwrap();

    // Raw decode keeps the fields absent
    assert_eq!(decode_message(&encoded).unwrap(), message);

    // Typed decode fills in defaults
    assert_eq!(
        decode_command(&encoded).unwrap(),
        Command::Put {
            key: vec![],
            value: vec![],
            version: 0
        }
    );
}

#[test]
fn test_get_message_omits_value_and_version() {
    let message = CommandMessage::from(&Command::Get {
        key: b"k".to_vec(),
    });
    assert_eq!(message.command, 0x02);
    assert_eq!(message.key, Some(b"k".to_vec()));
    assert_eq!(message.value, None);
    assert_eq!(message.version, None);
}

// =============================================================================
// Response Encoding/Decoding Tests
// =============================================================================

#[test]
fn test_encode_decode_response_value() {
    let resp = Response::value(b"value".to_vec(), 3);
    let decoded = decode_response(&encode_response(&resp).unwrap()).unwrap();

    assert_eq!(decoded.err_code, ErrCode::Success);
    assert_eq!(decoded.value, Some(b"value".to_vec()));
    assert_eq!(decoded.version, Some(3));
    assert_eq!(decoded.pid, None);
    assert_eq!(decoded.membership_count, None);
}

#[test]
fn test_encode_decode_response_status_only() {
    for code in [
        ErrCode::Success,
        ErrCode::NoKey,
        ErrCode::NoSpace,
        ErrCode::Overload,
        ErrCode::GeneralFail,
        ErrCode::NoCmd,
        ErrCode::InvalKey,
        ErrCode::InvalVal,
    ] {
        let resp = Response::status(code);
        let decoded = decode_response(&encode_response(&resp).unwrap()).unwrap();
        assert_eq!(decoded, resp);
    }
}

#[test]
fn test_encode_decode_response_pid_and_membership() {
    let pid = Response::pid(4242);
    assert_eq!(decode_response(&encode_response(&pid).unwrap()).unwrap(), pid);

    let members = Response::membership_count(1);
    assert_eq!(
        decode_response(&encode_response(&members).unwrap()).unwrap(),
        members
    );
}

#[test]
fn test_err_code_is_first_byte() {
    let encoded = encode_response(&Response::status(ErrCode::InvalVal)).unwrap();
    assert_eq!(encoded[0], 7);
}

// =============================================================================
// Error Handling Tests
// =============================================================================

#[test]
fn test_unknown_err_code_rejected() {
    let mut encoded = encode_response(&Response::success()).unwrap();
    encoded[0] = 9;

    let result = decode_response(&encoded);
    assert!(matches!(result, Err(KvError::MalformedMessage(_))));
}

#[test]
fn test_trailing_bytes_rejected() {
    let mut encoded = encode_command(&Command::IsAlive).unwrap();
    encoded.push(0x00);

    assert!(matches!(
        decode_command(&encoded),
        Err(KvError::MalformedMessage(_))
    ));
}

#[test]
fn test_truncated_command_rejected() {
    let encoded = encode_command(&Command::Put {
        key: b"key".to_vec(),
        value: b"value".to_vec(),
        version: 1,
    })
    .unwrap();

    let result = decode_command(&encoded[..encoded.len() - 2]);
    assert!(result.is_err());
}

#[test]
fn test_empty_input_rejected() {
    assert!(decode_command(&[]).is_err());
    assert!(decode_response(&[]).is_err());
}

#[test]
fn test_oversize_command_fails_to_encode() {
    let cmd = Command::Put {
        key: b"key".to_vec(),
        value: vec![0xAB; MAX_DATAGRAM_SIZE + 1],
        version: 0,
    };
    assert!(matches!(
        encode_command(&cmd),
        Err(KvError::MalformedMessage(_))
    ));
}

#[test]
fn test_malformed_errors_are_protocol_errors() {
    let err = decode_command(&[0xFF]).unwrap_err();
    assert!(err.is_protocol());
}
