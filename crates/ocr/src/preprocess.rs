use admitscan_core::NormalizeConfig;
use image::{DynamicImage, GrayImage, ImageBuffer, Luma};
use std::io::Cursor;
use std::path::Path;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum PreprocessError {
    #[error("Failed to load image: {0}")]
    Load(#[from] image::ImageError),
    #[error("Failed to encode processed image: {0}")]
    Encode(String),
}

/// Output of the normalizer: the contrast-enhanced grayscale intermediate and
/// the final two-valued image handed to recognition.
#[derive(Debug, Clone)]
pub struct Normalized {
    pub grayscale: GrayImage,
    pub binary: GrayImage,
}

pub struct Normalizer {
    config: NormalizeConfig,
}

impl Normalizer {
    pub fn new(config: NormalizeConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &NormalizeConfig {
        &self.config
    }

    /// Load an image file and normalize it.
    pub fn normalize_file(&self, path: &Path) -> Result<Normalized, PreprocessError> {
        let img = image::open(path)?;
        Ok(self.normalize(&img))
    }

    /// Decode raw image bytes (JPEG / PNG / …) and normalize.
    pub fn normalize_bytes(&self, data: &[u8]) -> Result<Normalized, PreprocessError> {
        let img = image::load_from_memory(data)?;
        Ok(self.normalize(&img))
    }

    /// Grayscale → CLAHE → Gaussian adaptive threshold.
    pub fn normalize(&self, img: &DynamicImage) -> Normalized {
        let c = &self.config;
        debug!(
            width = img.width(),
            height = img.height(),
            clip_limit = c.clip_limit,
            tile_grid = c.tile_grid,
            block_size = c.block_size,
            offset = c.offset,
            "normalizing image"
        );
        let gray = to_luma(img);
        let grayscale = clahe(&gray, c.clip_limit, c.tile_grid);
        let binary = adaptive_threshold_gaussian(&grayscale, c.block_size, c.offset);
        Normalized { grayscale, binary }
    }
}

/// BT.601 luma: Y = 0.299 R + 0.587 G + 0.114 B.
pub fn to_luma(img: &DynamicImage) -> GrayImage {
    if let DynamicImage::ImageLuma8(gray) = img {
        return gray.clone();
    }
    let rgb = img.to_rgb8();
    ImageBuffer::from_fn(rgb.width(), rgb.height(), |x, y| {
        let [r, g, b] = rgb.get_pixel(x, y).0;
        let luma = (299 * r as u32 + 587 * g as u32 + 114 * b as u32 + 500) / 1000;
        Luma([luma.min(255) as u8])
    })
}

/// Contrast-limited adaptive histogram equalization over a `grid × grid`
/// tiling. Each tile gets its own clipped-histogram mapping; every output
/// pixel is a bilinear blend of the four nearest tile mappings.
pub fn clahe(gray: &GrayImage, clip_limit: f32, grid: u32) -> GrayImage {
    let (width, height) = gray.dimensions();
    if width == 0 || height == 0 || grid == 0 {
        return gray.clone();
    }

    let cols = tile_bounds(width, grid);
    let rows = tile_bounds(height, grid);
    let tiles_x = cols.len() as u32;
    let tiles_y = rows.len() as u32;

    let mut luts: Vec<[u8; 256]> = Vec::with_capacity(cols.len() * rows.len());
    for &(y0, y1) in &rows {
        for &(x0, x1) in &cols {
            luts.push(tile_lut(gray, x0, y0, x1, y1, clip_limit));
        }
    }

    let lut = |tx: u32, ty: u32| &luts[(ty * tiles_x + tx) as usize];
    let inv_tw = tiles_x as f32 / width as f32;
    let inv_th = tiles_y as f32 / height as f32;

    ImageBuffer::from_fn(width, height, |x, y| {
        let p = gray.get_pixel(x, y)[0] as usize;

        let tyf = y as f32 * inv_th - 0.5;
        let ty1 = tyf.floor();
        let ya = tyf - ty1;
        let ty2 = ((ty1 as i64 + 1).min(tiles_y as i64 - 1)) as u32;
        let ty1 = ty1.max(0.0) as u32;

        let txf = x as f32 * inv_tw - 0.5;
        let tx1 = txf.floor();
        let xa = txf - tx1;
        let tx2 = ((tx1 as i64 + 1).min(tiles_x as i64 - 1)) as u32;
        let tx1 = tx1.max(0.0) as u32;

        let top = lut(tx1, ty1)[p] as f32 * (1.0 - xa) + lut(tx2, ty1)[p] as f32 * xa;
        let bottom = lut(tx1, ty2)[p] as f32 * (1.0 - xa) + lut(tx2, ty2)[p] as f32 * xa;
        let v = top * (1.0 - ya) + bottom * ya;
        Luma([v.round().clamp(0.0, 255.0) as u8])
    })
}

/// Split `len` pixels into `grid` contiguous tiles whose bounds are
/// `i * len / grid`, so every tile is within one pixel of the others. Axes
/// shorter than the grid get one tile per pixel.
fn tile_bounds(len: u32, grid: u32) -> Vec<(u32, u32)> {
    let n = grid.min(len) as u64;
    let len64 = len as u64;
    (0..n)
        .map(|i| ((i * len64 / n) as u32, ((i + 1) * len64 / n) as u32))
        .collect()
}

fn tile_lut(gray: &GrayImage, x0: u32, y0: u32, x1: u32, y1: u32, clip_limit: f32) -> [u8; 256] {
    let mut hist = [0u32; 256];
    for y in y0..y1 {
        for x in x0..x1 {
            hist[gray.get_pixel(x, y)[0] as usize] += 1;
        }
    }
    let area = (x1 - x0) * (y1 - y0);

    // Clip and spread the excess evenly, leftovers one per bin at a stride.
    let limit = ((clip_limit * area as f32 / 256.0) as u32).max(1);
    let mut clipped = 0u32;
    for bin in hist.iter_mut() {
        if *bin > limit {
            clipped += *bin - limit;
            *bin = limit;
        }
    }
    let batch = clipped / 256;
    let mut residual = clipped - batch * 256;
    for bin in hist.iter_mut() {
        *bin += batch;
    }
    if residual > 0 {
        let step = (256 / residual).max(1) as usize;
        for bin in hist.iter_mut().step_by(step) {
            if residual == 0 {
                break;
            }
            *bin += 1;
            residual -= 1;
        }
    }

    let scale = 255.0 / area as f32;
    let mut lut = [0u8; 256];
    let mut sum = 0u32;
    for (i, count) in hist.iter().enumerate() {
        sum += count;
        lut[i] = (sum as f32 * scale).round().min(255.0) as u8;
    }
    lut
}

/// Binarize against a Gaussian-weighted local mean: a pixel becomes white when
/// it is brighter than `mean - offset`, black otherwise.
pub fn adaptive_threshold_gaussian(gray: &GrayImage, block_size: u32, offset: i32) -> GrayImage {
    let kernel = gaussian_kernel(block_size);
    // Blur in f32 and round, so the mean is not truncated on its way back to u8.
    let wide: ImageBuffer<Luma<f32>, Vec<f32>> =
        ImageBuffer::from_fn(gray.width(), gray.height(), |x, y| {
            Luma([gray.get_pixel(x, y)[0] as f32])
        });
    let mean =
        imageproc::filter::separable_filter_equal::<Luma<f32>, f32>(&wide, kernel.as_slice());
    ImageBuffer::from_fn(gray.width(), gray.height(), |x, y| {
        let p = gray.get_pixel(x, y)[0] as i32;
        let m = mean.get_pixel(x, y)[0].round() as i32;
        Luma([if p > m - offset { 255 } else { 0 }])
    })
}

/// Normalized 1-D Gaussian of width `size`; sigma follows the usual
/// size-derived default `0.3 * ((size - 1) / 2 - 1) + 0.8`.
fn gaussian_kernel(size: u32) -> Vec<f32> {
    let size = size.max(1);
    let radius = (size / 2) as f32;
    let sigma = 0.3 * ((size as f32 - 1.0) * 0.5 - 1.0) + 0.8;
    let denom = 2.0 * sigma * sigma;
    let mut kernel: Vec<f32> = (0..size)
        .map(|i| {
            let d = i as f32 - radius;
            (-(d * d) / denom).exp()
        })
        .collect();
    let total: f32 = kernel.iter().sum();
    for k in kernel.iter_mut() {
        *k /= total;
    }
    kernel
}

pub fn encode_png(img: &GrayImage) -> Result<Vec<u8>, PreprocessError> {
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .map_err(|e| PreprocessError::Encode(e.to_string()))?;
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    fn solid_gray(width: u32, height: u32, value: u8) -> GrayImage {
        ImageBuffer::from_fn(width, height, |_, _| Luma([value]))
    }

    fn gradient_gray(width: u32, height: u32) -> GrayImage {
        ImageBuffer::from_fn(width, height, |x, _| Luma([(x * 255 / width) as u8]))
    }

    /// Light page with a dark bar across the middle, like a line of text.
    fn page_with_bar() -> DynamicImage {
        let img: RgbImage = ImageBuffer::from_fn(120, 80, |_, y| {
            if (38..42).contains(&y) {
                Rgb([20, 20, 20])
            } else {
                Rgb([230, 225, 220])
            }
        });
        DynamicImage::ImageRgb8(img)
    }

    fn normalizer() -> Normalizer {
        Normalizer::new(NormalizeConfig::default())
    }

    #[test]
    fn luma_uses_bt601_weights() {
        let img: RgbImage = ImageBuffer::from_fn(3, 1, |x, _| match x {
            0 => Rgb([255, 0, 0]),
            1 => Rgb([0, 255, 0]),
            _ => Rgb([0, 0, 255]),
        });
        let gray = to_luma(&DynamicImage::ImageRgb8(img));
        assert_eq!(gray.get_pixel(0, 0)[0], 76);
        assert_eq!(gray.get_pixel(1, 0)[0], 150);
        assert_eq!(gray.get_pixel(2, 0)[0], 29);
    }

    #[test]
    fn gaussian_kernel_is_normalized_and_symmetric() {
        let k = gaussian_kernel(31);
        assert_eq!(k.len(), 31);
        let total: f32 = k.iter().sum();
        assert!((total - 1.0).abs() < 1e-4);
        assert!((k[0] - k[30]).abs() < 1e-7);
        assert!(k[15] > k[14]);
    }

    #[test]
    fn clahe_preserves_dimensions() {
        let out = clahe(&gradient_gray(100, 37), 2.0, 8);
        assert_eq!(out.dimensions(), (100, 37));
    }

    #[test]
    fn clahe_handles_image_smaller_than_grid() {
        let out = clahe(&gradient_gray(4, 3), 2.0, 8);
        assert_eq!(out.dimensions(), (4, 3));
    }

    #[test]
    fn tile_bounds_keep_the_full_grid() {
        let rows = tile_bounds(10, 8);
        assert_eq!(rows.len(), 8);
        assert_eq!(rows.first().unwrap().0, 0);
        assert_eq!(rows.last().unwrap().1, 10);
        assert!(rows.windows(2).all(|w| w[0].1 == w[1].0));
        assert!(rows.iter().all(|(a, b)| b > a));

        assert_eq!(tile_bounds(100, 8).len(), 8);
        assert_eq!(tile_bounds(3, 8), vec![(0, 1), (1, 2), (2, 3)]);
    }

    #[test]
    fn clahe_uniform_image_stays_uniform() {
        let out = clahe(&solid_gray(64, 64, 128), 2.0, 8);
        let first = out.get_pixel(0, 0)[0];
        assert!(out.pixels().all(|p| p[0] == first));
    }

    #[test]
    fn clahe_keeps_ordering_of_intensities() {
        let out = clahe(&gradient_gray(256, 16), 2.0, 8);
        let row: Vec<u8> = (0..256).map(|x| out.get_pixel(x, 8)[0]).collect();
        assert!(row.first() < row.last());
    }

    #[test]
    fn binary_output_is_two_valued() {
        let n = normalizer().normalize(&page_with_bar());
        assert!(n.binary.pixels().all(|p| p[0] == 0 || p[0] == 255));

        let n = normalizer().normalize(&DynamicImage::ImageLuma8(gradient_gray(90, 50)));
        assert!(n.binary.pixels().all(|p| p[0] == 0 || p[0] == 255));
    }

    #[test]
    fn threshold_compares_against_rounded_mean() {
        // With a 3-wide window the centre mean is ~0.52, which rounds to 1:
        // the centre pixel is not brighter than it and must go black.
        let row: GrayImage = ImageBuffer::from_fn(3, 1, |x, _| Luma([u8::from(x == 1)]));
        let out = adaptive_threshold_gaussian(&row, 3, 0);
        assert_eq!(out.get_pixel(1, 0)[0], 0);
    }

    #[test]
    fn uniform_page_binarizes_to_white() {
        let img = DynamicImage::ImageLuma8(solid_gray(40, 40, 200));
        let n = normalizer().normalize(&img);
        assert!(n.binary.pixels().all(|p| p[0] == 255));
    }

    #[test]
    fn dark_bar_becomes_black_background_white() {
        let n = normalizer().normalize(&page_with_bar());
        assert_eq!(n.binary.get_pixel(60, 40)[0], 0);
        assert_eq!(n.binary.get_pixel(60, 5)[0], 255);
        assert_eq!(n.grayscale.dimensions(), (120, 80));
    }

    #[test]
    fn normalize_bytes_rejects_garbage() {
        let r = normalizer().normalize_bytes(b"definitely not an image");
        assert!(matches!(r, Err(PreprocessError::Load(_))));
    }

    #[test]
    fn encode_png_produces_png_header() {
        let bytes = encode_png(&solid_gray(4, 4, 100)).unwrap();
        assert_eq!(&bytes[..4], b"\x89PNG");
    }

    #[test]
    fn normalize_is_deterministic() {
        let a = normalizer().normalize(&page_with_bar());
        let b = normalizer().normalize(&page_with_bar());
        assert_eq!(a.binary, b.binary);
    }
}
