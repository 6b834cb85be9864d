// Input Probing
// Builds MediaDescriptors from superficial facts only: filename, byte
// size, caller-declared dimensions and duration. Codec and container
// parsing is deliberately out of scope.

use crate::models::{ContentType, MediaDescriptor};
use std::fs;
use std::path::Path;

/// Caller-declared facts that cannot be read from metadata alone.
#[derive(Debug, Clone, Copy, Default)]
pub struct DeclaredFacts {
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub duration_secs: Option<f64>,
}

/// Describe a file on disk. Missing metadata degrades to an emptier
/// descriptor rather than failing the scan.
pub fn probe_path(path: &Path, declared: DeclaredFacts) -> MediaDescriptor {
    let filename = path
        .file_name()
        .map(|s| s.to_string_lossy().to_string());
    let size_bytes = fs::metadata(path).ok().map(|m| m.len());

    MediaDescriptor {
        filename,
        size_bytes,
        width: declared.width,
        height: declared.height,
        duration_secs: declared.duration_secs,
        text: None,
    }
}

/// Describe a pasted text snippet.
pub fn describe_text(text: &str) -> MediaDescriptor {
    MediaDescriptor {
        text: Some(text.to_string()),
        size_bytes: Some(text.len() as u64),
        ..Default::default()
    }
}

/// Guess the content type from the file extension.
pub fn infer_content_type(path: &Path) -> Option<ContentType> {
    let ext = path.extension()?.to_string_lossy().to_lowercase();
    match ext.as_str() {
        "jpg" | "jpeg" | "png" | "webp" | "bmp" | "tiff" | "heic" => Some(ContentType::Image),
        "mp4" | "mov" | "mkv" | "avi" | "webm" => Some(ContentType::Video),
        "mp3" | "wav" | "flac" | "ogg" | "m4a" | "aac" => Some(ContentType::Audio),
        "txt" | "md" | "rtf" => Some(ContentType::Text),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_infer_content_type() {
        assert_eq!(
            infer_content_type(Path::new("clip.MP4")),
            Some(ContentType::Video)
        );
        assert_eq!(
            infer_content_type(Path::new("photo.jpeg")),
            Some(ContentType::Image)
        );
        assert_eq!(
            infer_content_type(Path::new("speech.wav")),
            Some(ContentType::Audio)
        );
        assert_eq!(infer_content_type(Path::new("essay.txt")), Some(ContentType::Text));
        assert_eq!(infer_content_type(Path::new("archive.tar")), None);
        assert_eq!(infer_content_type(Path::new("no_extension")), None);
    }

    #[test]
    fn test_probe_missing_file_degrades() {
        let descriptor = probe_path(Path::new("/no/such/file.png"), DeclaredFacts::default());
        assert_eq!(descriptor.filename.as_deref(), Some("file.png"));
        assert_eq!(descriptor.size_bytes, None);
    }

    #[test]
    fn test_describe_text() {
        let descriptor = describe_text("hello world");
        assert_eq!(descriptor.text.as_deref(), Some("hello world"));
        assert_eq!(descriptor.size_bytes, Some(11));
        assert!(descriptor.filename.is_none());
    }
}
