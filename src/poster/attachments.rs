use std::fs;
use std::path::{Path, PathBuf};

use image::codecs::png::{CompressionType, FilterType as PngFilter, PngEncoder};
use image::imageops::FilterType as ResizeFilter;
use image::DynamicImage;
use uuid::Uuid;

use crate::errors::AppResult;

use super::discord_client::Attachment;

/// Discord rejects files above this size on the default tier.
pub const MAX_ATTACHMENT_BYTES: u64 = 20 * 1024 * 1024;

/// Per-invocation scratch directory, removed when the scope drops — on the
/// error path as much as on success.
struct TempScope {
    dir: PathBuf,
}

impl TempScope {
    fn create() -> AppResult<Self> {
        let dir = std::env::temp_dir().join(format!("discord-webhook-{}", Uuid::new_v4()));
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    fn path(&self) -> &Path {
        &self.dir
    }
}

impl Drop for TempScope {
    fn drop(&mut self) {
        if let Err(e) = fs::remove_dir_all(&self.dir) {
            log::warn!("Failed to clean up temp dir {}: {}", self.dir.display(), e);
        }
    }
}

/// Encodes every frame to a size-bounded PNG attachment named
/// `image_<idx>.png`.
///
/// The first pass uses fast compression. An attachment over the size cap is
/// re-encoded once at best compression with both dimensions halved (floor,
/// minimum 1 px), and that result is used regardless of its size.
pub fn encode_attachments(frames: &[DynamicImage]) -> AppResult<Vec<Attachment>> {
    let scope = TempScope::create()?;
    let mut attachments = Vec::with_capacity(frames.len());

    for (index, frame) in frames.iter().enumerate() {
        let filename = format!("image_{}.png", index);
        let file_path = scope.path().join(&filename);

        write_png(frame, &file_path, CompressionType::Fast)?;

        let encoded_size = fs::metadata(&file_path)?.len();
        if encoded_size > MAX_ATTACHMENT_BYTES {
            let (width, height) = (frame.width(), frame.height());
            log::warn!(
                "{} is {} bytes at {}x{}, downscaling and recompressing",
                filename,
                encoded_size,
                width,
                height
            );
            let halved = frame.resize_exact(
                (width / 2).max(1),
                (height / 2).max(1),
                ResizeFilter::CatmullRom,
            );
            write_png(&halved, &file_path, CompressionType::Best)?;
        }

        attachments.push(Attachment::new(filename, fs::read(&file_path)?));
    }

    log::debug!("Encoded {} attachment(s)", attachments.len());
    Ok(attachments)
}

fn write_png(image: &DynamicImage, path: &Path, compression: CompressionType) -> AppResult<()> {
    let file = fs::File::create(path)?;
    let writer = std::io::BufWriter::new(file);
    let encoder = PngEncoder::new_with_quality(writer, compression, PngFilter::Adaptive);
    image.write_with_encoder(encoder)?;
    Ok(())
}
