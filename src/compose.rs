use crate::palette::{Season, Swatch};
use image::{imageops, ImageFormat, Rgb, RgbImage, RgbaImage};
use std::io::Cursor;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ComposeError {
    #[error("failed to decode processed image: {0}")]
    Decode(#[source] image::ImageError),
    #[error("failed to encode composite: {0}")]
    Encode(#[source] image::ImageError),
}

/// Blend a background-removed image over a flat color
///
/// Alpha 255 keeps the subject pixel, alpha 0 yields `background`.
pub fn composite(subject: &RgbaImage, background: Rgb<u8>) -> RgbImage {
    let _span = tracing::debug_span!("composite").entered();

    let (width, height) = subject.dimensions();
    RgbImage::from_fn(width, height, |x, y| {
        let pixel = subject.get_pixel(x, y);
        let alpha = pixel[3] as f32 / 255.0;
        let blend = |fg: u8, bg: u8| {
            (fg as f32 * alpha + bg as f32 * (1.0 - alpha))
                .round()
                .clamp(0.0, 255.0) as u8
        };
        Rgb([
            blend(pixel[0], background[0]),
            blend(pixel[1], background[1]),
            blend(pixel[2], background[2]),
        ])
    })
}

pub fn decode_subject(png: &[u8]) -> Result<RgbaImage, ComposeError> {
    let image = image::load_from_memory(png).map_err(ComposeError::Decode)?;
    Ok(image.to_rgba8())
}

pub fn encode_png(image: &RgbImage) -> Result<Vec<u8>, ComposeError> {
    let mut bytes = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .map_err(ComposeError::Encode)?;
    Ok(bytes)
}

/// Decode the relay's PNG, put it on `swatch` and encode the result
pub fn composite_png(png: &[u8], swatch: &Swatch) -> Result<Vec<u8>, ComposeError> {
    let subject = decode_subject(png)?;
    encode_png(&composite(&subject, swatch.rgb()))
}

/// Render the swatch grid: one row per season, one `tile`-sized square per swatch
///
/// The subject is scaled to fit each tile, keeping its aspect ratio.
/// Seasons without swatches in `swatches` are skipped.
pub fn contact_sheet(subject: &RgbaImage, swatches: &[Swatch], tile: u32) -> RgbImage {
    let _span = tracing::debug_span!("contact_sheet").entered();

    let rows: Vec<Vec<&Swatch>> = Season::ALL
        .iter()
        .map(|&season| swatches.iter().filter(|s| s.season == season).collect::<Vec<_>>())
        .filter(|row| !row.is_empty())
        .collect();
    let columns = rows.iter().map(Vec::len).max().unwrap_or(0) as u32;

    let mut sheet = RgbImage::from_pixel(
        (columns * tile).max(1),
        (rows.len() as u32 * tile).max(1),
        Rgb([255, 255, 255]),
    );
    if tile == 0 || columns == 0 {
        return sheet;
    }

    let thumbnail = fit_into(subject, tile);
    let (thumb_width, thumb_height) = thumbnail.dimensions();
    let offset_x = (tile - thumb_width) / 2;
    let offset_y = (tile - thumb_height) / 2;

    for (row, row_swatches) in rows.iter().enumerate() {
        for (column, swatch) in row_swatches.iter().enumerate() {
            let mut cell = RgbImage::from_pixel(tile, tile, swatch.rgb());
            let placed = composite(&thumbnail, swatch.rgb());
            imageops::replace(&mut cell, &placed, offset_x as i64, offset_y as i64);
            imageops::replace(
                &mut sheet,
                &cell,
                (column as u32 * tile) as i64,
                (row as u32 * tile) as i64,
            );
        }
    }

    sheet
}

fn fit_into(subject: &RgbaImage, tile: u32) -> RgbaImage {
    let (width, height) = subject.dimensions();
    if width == 0 || height == 0 {
        return RgbaImage::new(1, 1);
    }

    let scale = (tile as f32 / width as f32).min(tile as f32 / height as f32);
    let target_width = ((width as f32 * scale).round() as u32).clamp(1, tile);
    let target_height = ((height as f32 * scale).round() as u32).clamp(1, tile);

    if (target_width, target_height) == (width, height) {
        subject.clone()
    } else {
        imageops::resize(
            subject,
            target_width,
            target_height,
            imageops::FilterType::Lanczos3,
        )
    }
}
