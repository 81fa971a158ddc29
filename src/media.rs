//! Media-type sniffing from file extensions.

const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp"];
const VIDEO_EXTENSIONS: &[&str] = &["mp4", "mov", "avi", "mkv", "webm"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaType {
    Image,
    Video,
    File,
}

impl MediaType {
    /// The `attachment.type` value the Messenger API expects.
    pub fn attachment_type(&self) -> &'static str {
        match self {
            MediaType::Image => "image",
            MediaType::Video => "video",
            MediaType::File => "file",
        }
    }
}

/// Classify a media URL by its file extension, case-insensitively.
/// Query strings and fragments are ignored; anything outside the image and
/// video allowlists falls back to `File`.
pub fn classify(url: &str) -> MediaType {
    let lower = url.to_lowercase();
    let path = lower.split(['?', '#']).next().unwrap_or("");

    let Some((_, extension)) = path.rsplit_once('.') else {
        return MediaType::File;
    };

    if IMAGE_EXTENSIONS.contains(&extension) {
        MediaType::Image
    } else if VIDEO_EXTENSIONS.contains(&extension) {
        MediaType::Video
    } else {
        MediaType::File
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_images() {
        assert_eq!(classify("https://example.com/photo.jpg"), MediaType::Image);
        assert_eq!(classify("https://example.com/photo.jpeg"), MediaType::Image);
        assert_eq!(classify("banner.png"), MediaType::Image);
        assert_eq!(classify("anim.gif"), MediaType::Image);
        assert_eq!(classify("pic.webp"), MediaType::Image);
    }

    #[test]
    fn test_classify_videos() {
        assert_eq!(classify("https://example.com/clip.mp4"), MediaType::Video);
        assert_eq!(classify("clip.mov"), MediaType::Video);
        assert_eq!(classify("clip.avi"), MediaType::Video);
        assert_eq!(classify("clip.webm"), MediaType::Video);
    }

    #[test]
    fn test_classify_is_case_insensitive() {
        assert_eq!(classify("PHOTO.JPG"), MediaType::Image);
        assert_eq!(classify("clip.MKV"), MediaType::Video);
    }

    #[test]
    fn test_classify_fallback_to_file() {
        assert_eq!(classify("doc.pdf"), MediaType::File);
        assert_eq!(classify("archive.tar.gz"), MediaType::File);
        assert_eq!(classify("no-extension"), MediaType::File);
        assert_eq!(classify(""), MediaType::File);
    }

    #[test]
    fn test_classify_ignores_query_and_fragment() {
        assert_eq!(classify("https://cdn.example.com/a.png?w=640&h=480"), MediaType::Image);
        assert_eq!(classify("https://cdn.example.com/a.mp4#t=30"), MediaType::Video);
        assert_eq!(classify("https://cdn.example.com/download?file=a.png"), MediaType::File);
    }

    #[test]
    fn test_attachment_type_names() {
        assert_eq!(MediaType::Image.attachment_type(), "image");
        assert_eq!(MediaType::Video.attachment_type(), "video");
        assert_eq!(MediaType::File.attachment_type(), "file");
    }
}
