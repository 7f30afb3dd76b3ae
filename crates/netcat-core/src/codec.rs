//! Artifact Codec: command-name escaping and command-output compression.
//!
//! Grounded on the original's `encode_command`/`decode_command` and
//! `compress_device_data`/`decompress_device_data` (hex + digit/letter
//! rotation; BZip2 then Base85). The teacher pack has no precedent for this
//! exact compression pairing, so `bzip2` and `base85` are pulled in fresh —
//! both are registry crates used elsewhere in the pack's ecosystem for
//! analogous compress/encode steps (`flate2`/`zstd`, `base64`).

use std::io::{Read, Write};

use bzip2::write::BzEncoder;
use bzip2::read::BzDecoder;
use bzip2::Compression;

use crate::error::NetcatError;

const DIGITS: &[u8; 10] = b"0123456789";
const LETTERS: &[u8; 10] = b"ghijklmnop";

/// Escape a command string into an all-alphabetic, storage-safe token:
/// UTF-8 bytes, hex-encoded, then each decimal digit substituted for a
/// letter so the result never starts with a digit and never needs quoting
/// as a document-store key.
pub fn encode_command(command: &str) -> String {
    let hex = hex_encode(command.as_bytes());
    translate(&hex, DIGITS, LETTERS)
}

/// Inverse of [`encode_command`].
pub fn decode_command(token: &str) -> Result<String, NetcatError> {
    let hex = translate(token, LETTERS, DIGITS);
    let bytes = hex_decode(&hex)?;
    String::from_utf8(bytes)
        .map_err(|e| NetcatError::ProtocolFault(format!("decoded command is not valid UTF-8: {e}")))
}

fn hex_encode(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        out.push_str(&format!("{b:02x}"));
    }
    out
}

fn hex_decode(s: &str) -> Result<Vec<u8>, NetcatError> {
    if s.len() % 2 != 0 {
        return Err(NetcatError::ProtocolFault("odd-length hex token".into()));
    }
    let mut out = Vec::with_capacity(s.len() / 2);
    let bytes = s.as_bytes();
    for chunk in bytes.chunks(2) {
        let hi = hex_digit(chunk[0])?;
        let lo = hex_digit(chunk[1])?;
        out.push((hi << 4) | lo);
    }
    Ok(out)
}

fn hex_digit(c: u8) -> Result<u8, NetcatError> {
    match c {
        b'0'..=b'9' => Ok(c - b'0'),
        b'a'..=b'f' => Ok(c - b'a' + 10),
        _ => Err(NetcatError::ProtocolFault(format!("invalid hex digit: {}", c as char))),
    }
}

fn translate(s: &str, from: &[u8; 10], to: &[u8; 10]) -> String {
    s.bytes()
        .map(|b| match from.iter().position(|&f| f == b) {
            Some(idx) => to[idx] as char,
            None => b as char,
        })
        .collect()
}

/// Compress a command output with BZip2, then Base85-encode the compressed
/// bytes so the result is safe to store in a text field.
pub fn compress_output(data: &str) -> Result<String, NetcatError> {
    let mut encoder = BzEncoder::new(Vec::new(), Compression::best());
    encoder.write_all(data.as_bytes()).map_err(NetcatError::Io)?;
    let compressed = encoder.finish().map_err(NetcatError::Io)?;
    Ok(base85::encode(&compressed))
}

/// Inverse of [`compress_output`].
pub fn decompress_output(blob: &str) -> Result<String, NetcatError> {
    let compressed = base85::decode(blob)
        .map_err(|e| NetcatError::ProtocolFault(format!("invalid base85 blob: {e:?}")))?;
    let mut decoder = BzDecoder::new(&compressed[..]);
    let mut out = String::new();
    decoder
        .read_to_string(&mut out)
        .map_err(NetcatError::Io)?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_name_round_trips() {
        for command in ["show running-config", "terminal length 0", "", "日本語 config"] {
            let encoded = encode_command(command);
            assert!(encoded.bytes().all(|b| b.is_ascii_alphabetic()));
            assert_eq!(decode_command(&encoded).unwrap(), command);
        }
    }

    #[test]
    fn encode_never_starts_with_a_digit() {
        let encoded = encode_command("0 starts with a hex digit producing byte 0x30");
        assert!(!encoded.chars().next().unwrap().is_ascii_digit());
    }

    #[test]
    fn output_round_trips_through_compress_and_decompress() {
        let original = "hostname foo\ninterface Gi0/1\n description uplink\n".repeat(50);
        let compressed = compress_output(&original).unwrap();
        assert!(compressed.is_ascii());
        let restored = decompress_output(&compressed).unwrap();
        assert_eq!(restored, original);
    }

    #[test]
    fn output_round_trips_for_empty_string() {
        let compressed = compress_output("").unwrap();
        assert_eq!(decompress_output(&compressed).unwrap(), "");
    }
}
