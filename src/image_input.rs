use image::{DynamicImage, GrayImage, Rgb, RgbImage, RgbaImage};

use crate::errors::{AppError, AppResult};

/// Pixel data handed over by the host: one flat f32 buffer plus a shape.
///
/// Values are expected in [0, 1]; anything outside is clamped during
/// conversion. Shape is H×W×C for a single frame or N×H×W×C for a batch.
#[derive(Debug, Clone)]
pub struct PixelArray {
    shape: Vec<usize>,
    data: Vec<f32>,
}

impl PixelArray {
    pub fn new(shape: Vec<usize>, data: Vec<f32>) -> AppResult<Self> {
        let expected: usize = shape.iter().product();
        if expected != data.len() {
            return Err(AppError::validation(
                "pixels",
                &format!(
                    "shape {:?} expects {} values, got {}",
                    shape,
                    expected,
                    data.len()
                ),
            ));
        }
        Ok(Self { shape, data })
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    pub fn ndim(&self) -> usize {
        self.shape.len()
    }
}

/// Device-resident tensor that can be transferred into host memory.
///
/// The workflow host hands over whatever its inference backend produced; all
/// this crate needs is a host-memory copy in H×W×C or N×H×W×C layout.
pub trait TensorSource: Send + Sync {
    fn to_host(&self) -> AppResult<PixelArray>;
}

/// Everything a node accepts on its image socket, resolved once here so the
/// rest of the pipeline only ever sees decoded frames.
pub enum ImageInput {
    /// Already-decoded image, used as-is.
    Image(DynamicImage),
    /// Float pixel array, one frame or a batch.
    Pixels(PixelArray),
    /// Device tensor, transferred to host memory first.
    Tensor(Box<dyn TensorSource>),
    /// Unrecognized image-like payload, decoded best-effort for forward
    /// compatibility.
    Bytes(Vec<u8>),
}

impl std::fmt::Debug for ImageInput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Image(image) => write!(f, "Image({}x{})", image.width(), image.height()),
            Self::Pixels(pixels) => f.debug_tuple("Pixels").field(&pixels.shape()).finish(),
            Self::Tensor(_) => f.write_str("Tensor(..)"),
            Self::Bytes(bytes) => write!(f, "Bytes({} bytes)", bytes.len()),
        }
    }
}

/// Flattens any accepted input into the ordered list of frames to encode.
///
/// `None` yields exactly one synthetic test card so a bare node still posts
/// something visible.
pub fn normalize(input: Option<&ImageInput>) -> AppResult<Vec<DynamicImage>> {
    let Some(input) = input else {
        return Ok(vec![test_pattern()]);
    };

    match input {
        ImageInput::Image(image) => Ok(vec![image.clone()]),
        ImageInput::Pixels(pixels) => frames_from_array(pixels),
        ImageInput::Tensor(tensor) => frames_from_array(&tensor.to_host()?),
        ImageInput::Bytes(bytes) => Ok(vec![image::load_from_memory(bytes)?]),
    }
}

fn frames_from_array(pixels: &PixelArray) -> AppResult<Vec<DynamicImage>> {
    match pixels.shape() {
        &[height, width, channels] => {
            Ok(vec![frame_to_image(&pixels.data, height, width, channels)?])
        }
        &[frames, height, width, channels] => {
            let frame_len = height * width * channels;
            (0..frames)
                .map(|i| {
                    frame_to_image(
                        &pixels.data[i * frame_len..(i + 1) * frame_len],
                        height,
                        width,
                        channels,
                    )
                })
                .collect()
        }
        _ => Err(AppError::validation(
            "image",
            "pixel array must be 3D or 4D",
        )),
    }
}

/// Scale by 255, clamp to [0, 255], convert to 8-bit.
fn frame_to_image(
    data: &[f32],
    height: usize,
    width: usize,
    channels: usize,
) -> AppResult<DynamicImage> {
    let bytes: Vec<u8> = data
        .iter()
        .map(|value| (value * 255.0).clamp(0.0, 255.0) as u8)
        .collect();

    let (width, height) = (width as u32, height as u32);
    let image = match channels {
        1 => GrayImage::from_raw(width, height, bytes).map(DynamicImage::ImageLuma8),
        3 => RgbImage::from_raw(width, height, bytes).map(DynamicImage::ImageRgb8),
        4 => RgbaImage::from_raw(width, height, bytes).map(DynamicImage::ImageRgba8),
        other => {
            return Err(AppError::validation(
                "image",
                &format!("unsupported channel count: {}", other),
            ))
        }
    };

    // from_raw only fails on a length mismatch, which PixelArray::new rules out
    image.ok_or_else(|| AppError::validation("image", "pixel buffer does not match its shape"))
}

const TEST_PATTERN_SIZE: u32 = 128;

// Classic TV test card bar order, PIL palette values.
const TEST_PATTERN_BARS: [Rgb<u8>; 8] = [
    Rgb([255, 255, 255]), // white
    Rgb([255, 255, 0]),   // yellow
    Rgb([0, 255, 255]),   // cyan
    Rgb([0, 128, 0]),     // green
    Rgb([255, 0, 255]),   // magenta
    Rgb([255, 0, 0]),     // red
    Rgb([0, 0, 255]),     // blue
    Rgb([0, 0, 0]),       // black
];

/// 128×128 vertical-bar test card, the placeholder output every node emits
/// when it has no real image to pass along.
pub fn test_pattern() -> DynamicImage {
    let bar_width = TEST_PATTERN_SIZE / TEST_PATTERN_BARS.len() as u32;
    let bars = RgbImage::from_fn(TEST_PATTERN_SIZE, TEST_PATTERN_SIZE, |x, _| {
        let bar = (x / bar_width).min(TEST_PATTERN_BARS.len() as u32 - 1) as usize;
        TEST_PATTERN_BARS[bar]
    });
    DynamicImage::ImageRgb8(bars)
}
