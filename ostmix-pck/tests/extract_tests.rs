//! Extraction tests against synthetic containers

use ostmix_pck::{extract, PckError, PckIndex};
use std::fs;
use tempfile::TempDir;

/// Build a container holding `streams`, payloads appended after the table
fn build_container(streams: &[(u32, &[u8])]) -> Vec<u8> {
    let language_map = b"\x01\x00\x00\x00en\x00\x00";

    let mut header = Vec::new();
    header.extend_from_slice(b"AKPK");
    header.extend_from_slice(&[0u8; 8]);
    header.extend_from_slice(&(language_map.len() as u32).to_le_bytes());
    header.resize(25, 0);
    header.extend_from_slice(language_map);
    header.extend_from_slice(&0u32.to_le_bytes());
    header.extend_from_slice(&[0u8; 3]);
    header.extend_from_slice(&(streams.len() as u32).to_le_bytes());

    let table_end = header.len() + streams.len() * 20;
    let mut payload = Vec::new();
    for (id, bytes) in streams {
        let offset = (table_end + payload.len()) as u32;
        for value in [*id, 1, bytes.len() as u32, offset, 0] {
            header.extend_from_slice(&value.to_le_bytes());
        }
        payload.extend_from_slice(bytes);
    }

    header.extend_from_slice(&payload);
    header
}

#[test]
fn test_extract_writes_each_stream() {
    let dir = TempDir::new().unwrap();
    let pck = dir.path().join("music.pck");
    let container = build_container(&[(101, &b"first"[..]), (202, &b"second stream"[..])]);
    fs::write(&pck, container).unwrap();

    let out = dir.path().join("out/music");
    let written = extract(&pck, &out).unwrap();

    assert_eq!(written, vec![out.join("101.wem"), out.join("202.wem")]);
    assert_eq!(fs::read(out.join("101.wem")).unwrap(), b"first");
    assert_eq!(fs::read(out.join("202.wem")).unwrap(), b"second stream");
}

#[test]
fn test_index_matches_builder() {
    let data = build_container(&[(7, &b"abc"[..])]);
    let index = PckIndex::parse(&data).unwrap();
    assert_eq!(index.len(), 1);
    let entry = index.entries[0];
    assert_eq!(entry.id, 7);
    assert_eq!(&data[entry.range(data.len()).unwrap()], b"abc");
}

#[test]
fn test_out_of_bounds_entry_fails() {
    let dir = TempDir::new().unwrap();
    let mut data = build_container(&[(5, &b"payload"[..])]);
    data.truncate(data.len() - 3);
    let pck = dir.path().join("cut.pck");
    fs::write(&pck, data).unwrap();

    let result = extract(&pck, &dir.path().join("out"));
    assert!(matches!(
        result,
        Err(PckError::EntryOutOfBounds { id: 5, .. })
    ));
}

#[test]
fn test_not_a_container() {
    let dir = TempDir::new().unwrap();
    let pck = dir.path().join("fake.pck");
    fs::write(&pck, b"RIFF\x00\x00\x00\x00WAVE").unwrap();

    let result = extract(&pck, &dir.path().join("out"));
    assert!(matches!(result, Err(PckError::InvalidMagic(m)) if &m == b"RIFF"));
    assert!(!dir.path().join("out").exists());
}
