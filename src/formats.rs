/// Container formats accepted for ingestion
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub(crate) enum VideoFormat {
    Mp4,
}

impl VideoFormat {
    pub(crate) fn from_media_type(media_type: &mime::Mime) -> Option<Self> {
        match media_type.essence_str() {
            "video/mp4" => Some(Self::Mp4),
            _ => None,
        }
    }

    /// Recognize a format from the extension at the end of a file name or key
    pub(crate) fn from_extension(name: &str) -> Option<Self> {
        if name.ends_with(Self::Mp4.file_extension()) {
            Some(Self::Mp4)
        } else {
            None
        }
    }

    pub(crate) const fn ffmpeg_format(self) -> &'static str {
        match self {
            Self::Mp4 => "mp4",
        }
    }

    pub(crate) const fn file_extension(self) -> &'static str {
        match self {
            Self::Mp4 => ".mp4",
        }
    }

    pub(crate) fn media_type(self) -> mime::Mime {
        match self {
            Self::Mp4 => "video/mp4".parse().expect("valid media type"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::VideoFormat;

    #[test]
    fn mp4_is_accepted() {
        let media_type: mime::Mime = "video/mp4".parse().expect("valid");

        assert_eq!(
            VideoFormat::from_media_type(&media_type),
            Some(VideoFormat::Mp4)
        );
    }

    #[test]
    fn parameters_are_ignored() {
        let media_type: mime::Mime = "video/mp4; codecs=\"avc1.42E01E\"".parse().expect("valid");

        assert_eq!(
            VideoFormat::from_media_type(&media_type),
            Some(VideoFormat::Mp4)
        );
    }

    #[test]
    fn extensions() {
        assert_eq!(
            VideoFormat::from_extension("landscape/0f3e.mp4"),
            Some(VideoFormat::Mp4)
        );
        assert_eq!(VideoFormat::from_extension("landscape/0f3e.webm"), None);
        assert_eq!(VideoFormat::from_extension("mp4"), None);
    }

    #[test]
    fn other_types_are_rejected() {
        for media_type in ["video/webm", "image/png", "application/octet-stream"] {
            let media_type: mime::Mime = media_type.parse().expect("valid");

            assert_eq!(VideoFormat::from_media_type(&media_type), None);
        }
    }
}
