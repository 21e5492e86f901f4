// SPDX-FileCopyrightText: 2026 Accesspark Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Listing photos and their storage paths.

use std::fmt;

use accesspark_core::{AccessParkError, StoredObject};

/// A photo picked for upload.
#[derive(Clone, PartialEq, Eq)]
pub struct PhotoFile {
    /// Original file name, only its extension is kept.
    pub name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl PhotoFile {
    /// Builds a photo, guessing the content type from the file name.
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        let name = name.into();
        let content_type = content_type_for(&name).to_string();
        Self {
            name,
            content_type,
            bytes,
        }
    }

    pub(crate) fn into_object(self) -> Result<StoredObject, AccessParkError> {
        if self.bytes.is_empty() {
            return Err(AccessParkError::Validation(format!(
                "photo `{}` is empty",
                self.name
            )));
        }
        Ok(StoredObject {
            content_type: self.content_type,
            bytes: self.bytes,
        })
    }
}

impl fmt::Debug for PhotoFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PhotoFile")
            .field("name", &self.name)
            .field("content_type", &self.content_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}

fn extension(name: &str) -> Option<&str> {
    name.rsplit_once('.')
        .map(|(_, ext)| ext)
        .filter(|ext| !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()))
}

fn content_type_for(name: &str) -> &'static str {
    match extension(name).map(str::to_ascii_lowercase).as_deref() {
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("webp") => "image/webp",
        Some("gif") => "image/gif",
        Some("heic") => "image/heic",
        _ => "application/octet-stream",
    }
}

/// Random storage path for a photo: `<prefix>/<uuid>.<ext>`.
///
/// The extension is whatever follows the last `.` of the original name when
/// it is ASCII alphanumeric; any other name yields a bare uuid.
pub fn photo_path(prefix: &str, file_name: &str) -> String {
    let id = uuid::Uuid::new_v4();
    let file = match extension(file_name) {
        Some(ext) => format!("{id}.{ext}"),
        None => id.to_string(),
    };
    let prefix = prefix.trim_matches('/');
    if prefix.is_empty() {
        file
    } else {
        format!("{prefix}/{file}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn path_keeps_extension() {
        let path = photo_path("spots", "IMG_2041.JPG");
        let (prefix, file) = path.split_once('/').unwrap();
        assert_eq!(prefix, "spots");
        let (stem, ext) = file.rsplit_once('.').unwrap();
        assert_eq!(ext, "JPG");
        assert!(uuid::Uuid::parse_str(stem).is_ok());
    }

    #[test]
    fn path_without_extension_is_bare_uuid() {
        let path = photo_path("spots/", "photo");
        let file = path.strip_prefix("spots/").unwrap();
        assert!(uuid::Uuid::parse_str(file).is_ok());
        assert!(uuid::Uuid::parse_str(&photo_path("", "trailing.")).is_ok());
    }

    #[test]
    fn unsafe_extension_is_dropped() {
        for name in ["a.p?g", "a.j pg", "a.png/..", "a.p%2Fg", "a.\u{e9}"] {
            let path = photo_path("spots", name);
            let file = path.strip_prefix("spots/").unwrap();
            assert!(uuid::Uuid::parse_str(file).is_ok(), "{name} gave {path}");
        }
        assert_eq!(PhotoFile::new("a.p?g", vec![1]).content_type, "application/octet-stream");
    }

    #[test]
    fn paths_are_unique() {
        assert_ne!(photo_path("spots", "a.png"), photo_path("spots", "a.png"));
    }

    #[test]
    fn content_type_from_name() {
        assert_eq!(PhotoFile::new("ramp.jpeg", vec![1]).content_type, "image/jpeg");
        assert_eq!(PhotoFile::new("ramp.PNG", vec![1]).content_type, "image/png");
        assert_eq!(
            PhotoFile::new("ramp", vec![1]).content_type,
            "application/octet-stream"
        );
    }

    #[test]
    fn empty_photo_is_rejected() {
        let err = PhotoFile::new("a.png", Vec::new()).into_object().unwrap_err();
        assert!(matches!(err, AccessParkError::Validation(_)));
    }
}
