// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Image preprocessing for the CLIP visual tower

use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView};
use ndarray::Array4;
use std::borrow::Cow;
use thiserror::Error;

/// Default input resolution shared by the ViT-B CLIP variants
pub const CLIP_INPUT_SIZE: u32 = 224;

/// OpenAI CLIP normalization mean values
pub const CLIP_MEAN: [f32; 3] = [0.481_454_66, 0.457_827_5, 0.408_210_73];

/// OpenAI CLIP normalization std values
pub const CLIP_STD: [f32; 3] = [0.268_629_54, 0.261_302_58, 0.275_777_11];

/// Longest resized side kept ahead of the center crop, in crop widths
const MAX_RESIZED_SPAN: u64 = 2;

#[derive(Debug, Error)]
pub enum PreprocessError {
    #[error("resized image side does not fit in u32: {0}")]
    DimensionOverflow(u64),
}

/// Parameters of the CLIP image transform
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PreprocessConfig {
    /// Side of the square model input
    pub image_size: u32,
    /// Per-channel mean subtracted after scaling to [0, 1]
    pub mean: [f32; 3],
    /// Per-channel std divided after mean subtraction
    pub std: [f32; 3],
}

impl Default for PreprocessConfig {
    fn default() -> Self {
        Self {
            image_size: CLIP_INPUT_SIZE,
            mean: CLIP_MEAN,
            std: CLIP_STD,
        }
    }
}

/// Preprocess an image for the CLIP visual encoder
///
/// Steps:
/// 1. Drop the ends of the long axis that the crop would discard anyway
/// 2. Resize the shortest edge to `image_size` with bicubic filtering
/// 3. Center crop to `image_size` x `image_size`
/// 4. Normalize: (pixel/255 - mean) / std
/// 5. Convert to NCHW tensor format [1, 3, H, W]
///
/// Step 1 keeps the intermediate image at most `2 * image_size` on its long
/// side whatever the aspect ratio of the input.
pub fn preprocess_for_clip(
    image: &DynamicImage,
    config: &PreprocessConfig,
) -> Result<Array4<f32>, PreprocessError> {
    let size = config.image_size;
    let trimmed = trim_long_axis(image, size);
    let cropped = center_crop(&resize_shortest_edge(&trimmed, size)?, size);
    let rgb = cropped.to_rgb8();

    let side = size as usize;
    let mut tensor = Array4::zeros((1, 3, side, side));

    for (x, y, pixel) in rgb.enumerate_pixels() {
        for c in 0..3 {
            tensor[[0, c, y as usize, x as usize]] =
                (pixel[c] as f32 / 255.0 - config.mean[c]) / config.std[c];
        }
    }

    Ok(tensor)
}

/// Center-crop the long axis to the band that survives a later
/// resize-to-`target` plus center crop
///
/// The band spans `2 * target` resized pixels, so the crop window and the
/// bicubic filter support both stay inside it. Images already within that
/// span are borrowed untouched.
pub fn trim_long_axis(image: &DynamicImage, target: u32) -> Cow<'_, DynamicImage> {
    let (w, h) = image.dimensions();
    if w == 0 || h == 0 || target == 0 {
        return Cow::Borrowed(image);
    }

    let (short, long) = (w.min(h) as u64, w.max(h) as u64);
    let target = target as u64;
    let limit = target * MAX_RESIZED_SPAN;
    if target * long / short <= limit {
        return Cow::Borrowed(image);
    }

    // Source pixels mapping onto `limit` resized pixels, rounded up
    let keep = ((limit * short).div_ceil(target)).min(long) as u32;
    let offset = (long as u32 - keep) / 2;

    let trimmed = if w < h {
        image.crop_imm(0, offset, w, keep)
    } else {
        image.crop_imm(offset, 0, keep, h)
    };
    Cow::Owned(trimmed)
}

/// Resize so the shorter side equals `target`, keeping aspect ratio
///
/// The longer side is truncated the same way torchvision's `Resize(int)` does.
pub fn resize_shortest_edge(
    image: &DynamicImage,
    target: u32,
) -> Result<DynamicImage, PreprocessError> {
    let (w, h) = image.dimensions();
    if w == 0 || h == 0 {
        return Ok(DynamicImage::new_rgb8(target, target));
    }

    let scale = |long: u32, short: u32| -> Result<u32, PreprocessError> {
        let value = (target as u64 * long as u64 / short as u64).max(1);
        u32::try_from(value).map_err(|_| PreprocessError::DimensionOverflow(value))
    };

    let (new_w, new_h) = if w <= h {
        (target, scale(h, w)?)
    } else {
        (scale(w, h)?, target)
    };

    if (new_w, new_h) == (w, h) {
        return Ok(image.clone());
    }

    Ok(image.resize_exact(new_w, new_h, FilterType::CatmullRom))
}

/// Crop the central `size` x `size` square
///
/// Images smaller than `size` on an axis are padded with black, matching
/// torchvision's `CenterCrop`.
pub fn center_crop(image: &DynamicImage, size: u32) -> DynamicImage {
    let (w, h) = image.dimensions();

    if w >= size && h >= size {
        let x = ((w - size) as f32 / 2.0).round() as u32;
        let y = ((h - size) as f32 / 2.0).round() as u32;
        return image.crop_imm(x, y, size, size);
    }

    let rgb = image.to_rgb8();
    let mut canvas = image::RgbImage::new(size, size);
    let offset_x = (size as i64 - w as i64) / 2;
    let offset_y = (size as i64 - h as i64) / 2;
    for (x, y, pixel) in rgb.enumerate_pixels() {
        let tx = x as i64 + offset_x;
        let ty = y as i64 + offset_y;
        if (0..size as i64).contains(&tx) && (0..size as i64).contains(&ty) {
            canvas.put_pixel(tx as u32, ty as u32, *pixel);
        }
    }
    DynamicImage::ImageRgb8(canvas)
}
