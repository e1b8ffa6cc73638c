//! File attachment encoding: size/type/count limits and payload encoding.
//! Text-like files keep their UTF-8 text; everything else becomes a base64
//! data URL, mirroring what the persistence backend stores.

use crate::types::FileAttachment;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use thiserror::Error;

pub const MAX_FILE_SIZE: u64 = 10 * 1024 * 1024;
pub const MAX_FILES: usize = 10;

const ALLOWED_TYPES: &[&str] = &[
    "text/plain",
    "text/csv",
    "application/json",
    "application/pdf",
    "image/jpeg",
    "image/png",
    "image/gif",
    "application/msword",
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
];

#[derive(Debug, Error)]
pub enum AttachmentError {
    #[error("file \"{name}\" is too large; the maximum is 10MB")]
    TooLarge { name: String },
    #[error("file type \"{mime_type}\" is not supported for \"{name}\"")]
    UnsupportedType { name: String, mime_type: String },
    #[error("cannot attach more than {MAX_FILES} files")]
    TooManyFiles,
    #[error("file \"{name}\" is not valid UTF-8 text")]
    InvalidText { name: String },
}

/// How many more files may be attached given the current count.
pub fn remaining_slots(current_count: usize) -> usize {
    MAX_FILES.saturating_sub(current_count)
}

pub fn is_allowed_type(mime_type: &str) -> bool {
    ALLOWED_TYPES.contains(&mime_type)
}

fn is_text_like(mime_type: &str) -> bool {
    mime_type.starts_with("text/") || mime_type == "application/json"
}

/// MIME type from the file extension. Unknown extensions yield an
/// unsupported marker that the allowlist will reject.
pub fn mime_for_name(name: &str) -> String {
    let extension = name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    match extension.as_str() {
        "txt" => "text/plain",
        "csv" => "text/csv",
        "json" => "application/json",
        "pdf" => "application/pdf",
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "doc" => "application/msword",
        "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        _ => "application/octet-stream",
    }
    .to_string()
}

/// Encode picked file bytes into an immutable attachment, enforcing the
/// size and type limits.
pub fn encode_attachment(
    name: &str,
    bytes: &[u8],
    last_modified: Option<u64>,
) -> Result<FileAttachment, AttachmentError> {
    let mime_type = mime_for_name(name);
    if !is_allowed_type(&mime_type) {
        return Err(AttachmentError::UnsupportedType {
            name: name.to_string(),
            mime_type,
        });
    }
    let size = bytes.len() as u64;
    if size > MAX_FILE_SIZE {
        return Err(AttachmentError::TooLarge {
            name: name.to_string(),
        });
    }

    let content = if is_text_like(&mime_type) {
        let text = std::str::from_utf8(bytes).map_err(|_| AttachmentError::InvalidText {
            name: name.to_string(),
        })?;
        text.to_string()
    } else {
        format!("data:{};base64,{}", mime_type, BASE64.encode(bytes))
    };

    Ok(FileAttachment {
        name: name.to_string(),
        size,
        mime_type,
        content: Some(content),
        last_modified,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn infers_mime_from_extension() {
        assert_eq!(mime_for_name("notes.TXT"), "text/plain");
        assert_eq!(mime_for_name("photo.jpeg"), "image/jpeg");
        assert_eq!(mime_for_name("archive.tar.gz"), "application/octet-stream");
        assert_eq!(mime_for_name("no_extension"), "application/octet-stream");
    }

    #[test]
    fn text_files_keep_plain_content() {
        let file = encode_attachment("notes.txt", b"hello", None).unwrap();
        assert_eq!(file.mime_type, "text/plain");
        assert_eq!(file.content.as_deref(), Some("hello"));
        assert_eq!(file.size, 5);
    }

    #[test]
    fn binary_files_become_data_urls() {
        let file = encode_attachment("dot.png", &[0x89, 0x50, 0x4e, 0x47], Some(7)).unwrap();
        let content = file.content.unwrap();
        assert!(content.starts_with("data:image/png;base64,"));
        assert_eq!(file.last_modified, Some(7));
    }

    #[test]
    fn rejects_unsupported_types() {
        let err = encode_attachment("script.sh", b"#!/bin/sh", None).unwrap_err();
        assert!(matches!(err, AttachmentError::UnsupportedType { .. }));
    }

    #[test]
    fn rejects_oversized_files() {
        let huge = vec![0u8; (MAX_FILE_SIZE + 1) as usize];
        let err = encode_attachment("big.png", &huge, None).unwrap_err();
        assert!(matches!(err, AttachmentError::TooLarge { .. }));
    }

    #[test]
    fn rejects_non_utf8_text() {
        let err = encode_attachment("weird.txt", &[0xff, 0xfe], None).unwrap_err();
        assert!(matches!(err, AttachmentError::InvalidText { .. }));
    }

    #[test]
    fn slot_accounting() {
        assert_eq!(remaining_slots(0), MAX_FILES);
        assert_eq!(remaining_slots(9), 1);
        assert_eq!(remaining_slots(10), 0);
        assert_eq!(remaining_slots(11), 0);
    }
}
