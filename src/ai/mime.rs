/// Content type and file extension for generated image bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageFormat {
    pub mime: &'static str,
    pub extension: &'static str,
}

const PNG: ImageFormat = ImageFormat {
    mime: "image/png",
    extension: "png",
};

pub fn detect_image_format(bytes: &[u8]) -> ImageFormat {
    match bytes {
        [0xFF, 0xD8, 0xFF, ..] => ImageFormat {
            mime: "image/jpeg",
            extension: "jpg",
        },
        [0x89, 0x50, 0x4E, 0x47, ..] => PNG,
        [0x52, 0x49, 0x46, 0x46, _, _, _, _, 0x57, 0x45, 0x42, 0x50, ..] => ImageFormat {
            mime: "image/webp",
            extension: "webp",
        },
        _ => {
            tracing::warn!(
                "Unrecognized image format (first 4 bytes: {:02X?}), falling back to image/png",
                &bytes[..bytes.len().min(4)]
            );
            PNG
        }
    }
}
