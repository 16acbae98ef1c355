//! Test fixtures and helpers.

use super::server::TestServer;
use bytes::Bytes;
use shelf_core::progress::TransferProgress;
use shelf_server::transfer::{self, UploadRequest};
use uuid::Uuid;

/// Deterministic payload of the given length.
#[allow(dead_code)]
pub fn payload(len: usize) -> Bytes {
    Bytes::from((0..len).map(|i| (i % 251) as u8).collect::<Vec<u8>>())
}

/// Build an upload request with root directory and no tags.
#[allow(dead_code)]
pub fn upload_request(name: &str, file_type: &str, data: Bytes) -> UploadRequest {
    UploadRequest {
        file_name: name.to_string(),
        file_type: file_type.to_string(),
        data,
        directory_id: None,
        tags: Vec::new(),
        created_at: None,
    }
}

/// Upload a file straight through the orchestrator, panicking on failure.
#[allow(dead_code)]
pub async fn upload_fixture(server: &TestServer, name: &str, file_type: &str, len: usize) -> Uuid {
    transfer::upload_one(
        &server.state,
        upload_request(name, file_type, payload(len)),
        &TransferProgress::default(),
    )
    .await
    .expect("fixture upload failed")
}

/// Read a tar archive back into (name, contents) pairs.
#[allow(dead_code)]
pub fn read_archive(archive: &[u8]) -> Vec<(String, Vec<u8>)> {
    let mut reader = tar::Archive::new(archive);
    let mut entries = Vec::new();
    for entry in reader.entries().expect("archive entries") {
        let mut entry = entry.expect("archive entry");
        let name = entry.path().expect("entry path").display().to_string();
        let mut contents = Vec::new();
        std::io::Read::read_to_end(&mut entry, &mut contents).expect("entry contents");
        entries.push((name, contents));
    }
    entries
}
