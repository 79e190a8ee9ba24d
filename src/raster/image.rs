//! Image XObject decoding into pixmaps.

use lopdf::{Dictionary, Object, Stream};
use tiny_skia::{IntSize, Pixmap};

use crate::backend::{number, LopdfBackend};

/// Images with more pixels than this are skipped.
const MAX_IMAGE_PIXELS: u64 = 64 * 1024 * 1024;

#[derive(Debug, Clone, PartialEq)]
enum ColorSpace {
    Gray,
    Rgb,
    Cmyk,
    /// Palette of base-space colors, already expanded to RGB.
    Indexed(Vec<[u8; 3]>),
}

impl ColorSpace {
    fn components(&self) -> usize {
        match self {
            ColorSpace::Gray | ColorSpace::Indexed(_) => 1,
            ColorSpace::Rgb => 3,
            ColorSpace::Cmyk => 4,
        }
    }

    fn to_rgb(&self, sample: &[u8]) -> [u8; 3] {
        match (self, sample) {
            (ColorSpace::Gray, [g, ..]) => [*g, *g, *g],
            (ColorSpace::Rgb, [r, g, b, ..]) => [*r, *g, *b],
            (ColorSpace::Cmyk, [c, m, y, k, ..]) => cmyk_to_rgb(*c, *m, *y, *k),
            (ColorSpace::Indexed(palette), [i, ..]) => {
                palette.get(*i as usize).copied().unwrap_or([0, 0, 0])
            }
            _ => [0, 0, 0],
        }
    }
}

fn cmyk_to_rgb(c: u8, m: u8, y: u8, k: u8) -> [u8; 3] {
    let k = 255 - k as u16;
    [
        ((255 - c as u16) * k / 255) as u8,
        ((255 - m as u16) * k / 255) as u8,
        ((255 - y as u16) * k / 255) as u8,
    ]
}

/// Decode an image XObject. Returns `None` for images we cannot handle.
///
/// Stencil masks (`/ImageMask true`) are painted in `fill`.
pub(super) fn decode_image(backend: &LopdfBackend, stream: &Stream, fill: [u8; 3]) -> Option<Pixmap> {
    let dict = &stream.dict;
    let width = dict.get(b"Width").ok().and_then(number)? as u32;
    let height = dict.get(b"Height").ok().and_then(number)? as u32;
    if width == 0 || height == 0 || width as u64 * height as u64 > MAX_IMAGE_PIXELS {
        return None;
    }

    let filters = filter_names(backend, dict);
    if filters.iter().any(|f| f == b"DCTDecode") {
        return decode_jpeg(&stream.content, width, height);
    }
    if filters
        .iter()
        .any(|f| matches!(f.as_slice(), b"JPXDecode" | b"JBIG2Decode" | b"CCITTFaxDecode"))
    {
        log::debug!("Unsupported image filter {:?}", filters);
        return None;
    }

    let data = if filters.is_empty() {
        stream.content.clone()
    } else {
        stream.decompressed_content().ok()?
    };

    let is_mask = matches!(dict.get(b"ImageMask"), Ok(Object::Boolean(true)));
    if is_mask {
        return decode_stencil(&data, width, height, fill, inverted_decode(backend, dict));
    }

    let color_space = dict
        .get(b"ColorSpace")
        .ok()
        .and_then(|o| parse_color_space(backend, o))?;
    let bits = dict
        .get(b"BitsPerComponent")
        .ok()
        .and_then(number)
        .unwrap_or(8.0) as u32;

    let rgba = match bits {
        8 => unpack_8bit(&data, width, height, &color_space)?,
        1 if color_space.components() == 1 => unpack_1bit(&data, width, height, &color_space)?,
        other => {
            log::debug!("Unsupported image depth {} bits", other);
            return None;
        }
    };

    Pixmap::from_vec(rgba, IntSize::from_wh(width, height)?)
}

fn filter_names(backend: &LopdfBackend, dict: &Dictionary) -> Vec<Vec<u8>> {
    match dict.get(b"Filter").map(|o| backend.resolve(o)) {
        Ok(Object::Name(name)) => vec![name.clone()],
        Ok(Object::Array(items)) => items
            .iter()
            .filter_map(|o| backend.resolve(o).as_name().ok())
            .map(<[u8]>::to_vec)
            .collect(),
        _ => Vec::new(),
    }
}

fn inverted_decode(backend: &LopdfBackend, dict: &Dictionary) -> bool {
    dict.get(b"Decode")
        .ok()
        .and_then(|o| backend.resolve(o).as_array().ok())
        .and_then(|a| a.first())
        .and_then(number)
        == Some(1.0)
}

fn parse_color_space(backend: &LopdfBackend, obj: &Object) -> Option<ColorSpace> {
    match backend.resolve(obj) {
        Object::Name(name) => match name.as_slice() {
            b"DeviceGray" | b"CalGray" | b"G" => Some(ColorSpace::Gray),
            b"DeviceRGB" | b"CalRGB" | b"RGB" => Some(ColorSpace::Rgb),
            b"DeviceCMYK" | b"CMYK" => Some(ColorSpace::Cmyk),
            _ => None,
        },
        Object::Array(items) => {
            let family = items.first().and_then(|o| backend.resolve(o).as_name().ok())?;
            match family {
                b"ICCBased" => {
                    let profile = backend.resolve_dict(items.get(1)?)?;
                    match profile.get(b"N").ok().and_then(number)? as u32 {
                        1 => Some(ColorSpace::Gray),
                        3 => Some(ColorSpace::Rgb),
                        4 => Some(ColorSpace::Cmyk),
                        _ => None,
                    }
                }
                b"CalGray" => Some(ColorSpace::Gray),
                b"CalRGB" => Some(ColorSpace::Rgb),
                b"Indexed" | b"I" => parse_indexed(backend, items),
                _ => None,
            }
        }
        _ => None,
    }
}

fn parse_indexed(backend: &LopdfBackend, items: &[Object]) -> Option<ColorSpace> {
    let base = parse_color_space(backend, items.get(1)?)?;
    if matches!(base, ColorSpace::Indexed(_)) {
        return None;
    }
    let hival = items.get(2).and_then(number)? as usize;
    let lookup = match backend.resolve(items.get(3)?) {
        Object::String(bytes, _) => bytes.clone(),
        Object::Stream(s) => s
            .decompressed_content()
            .unwrap_or_else(|_| s.content.clone()),
        _ => return None,
    };

    let n = base.components();
    let palette = lookup
        .chunks_exact(n)
        .take(hival + 1)
        .map(|entry| base.to_rgb(entry))
        .collect();
    Some(ColorSpace::Indexed(palette))
}

fn unpack_8bit(data: &[u8], width: u32, height: u32, space: &ColorSpace) -> Option<Vec<u8>> {
    let n = space.components();
    let pixels = (width * height) as usize;
    if data.len() < pixels * n {
        log::debug!("Image data truncated ({} < {})", data.len(), pixels * n);
        return None;
    }

    let mut rgba = Vec::with_capacity(pixels * 4);
    for sample in data.chunks_exact(n).take(pixels) {
        let [r, g, b] = space.to_rgb(sample);
        rgba.extend_from_slice(&[r, g, b, 255]);
    }
    Some(rgba)
}

fn unpack_1bit(data: &[u8], width: u32, height: u32, space: &ColorSpace) -> Option<Vec<u8>> {
    let row_bytes = (width as usize).div_ceil(8);
    if data.len() < row_bytes * height as usize {
        return None;
    }

    let mut rgba = Vec::with_capacity((width * height * 4) as usize);
    for row in data.chunks_exact(row_bytes).take(height as usize) {
        for x in 0..width as usize {
            let bit = (row[x / 8] >> (7 - x % 8)) & 1;
            let [r, g, b] = match space {
                ColorSpace::Indexed(_) => space.to_rgb(&[bit]),
                _ => space.to_rgb(&[bit * 255]),
            };
            rgba.extend_from_slice(&[r, g, b, 255]);
        }
    }
    Some(rgba)
}

/// 1-bit stencil: painted samples take the fill color, the rest stay transparent.
fn decode_stencil(
    data: &[u8],
    width: u32,
    height: u32,
    fill: [u8; 3],
    inverted: bool,
) -> Option<Pixmap> {
    let row_bytes = (width as usize).div_ceil(8);
    if data.len() < row_bytes * height as usize {
        return None;
    }

    let mut rgba = Vec::with_capacity((width * height * 4) as usize);
    for row in data.chunks_exact(row_bytes).take(height as usize) {
        for x in 0..width as usize {
            let bit = (row[x / 8] >> (7 - x % 8)) & 1;
            let painted = (bit == 0) != inverted;
            if painted {
                rgba.extend_from_slice(&[fill[0], fill[1], fill[2], 255]);
            } else {
                rgba.extend_from_slice(&[0, 0, 0, 0]);
            }
        }
    }
    Pixmap::from_vec(rgba, IntSize::from_wh(width, height)?)
}

fn decode_jpeg(data: &[u8], width: u32, height: u32) -> Option<Pixmap> {
    let decoded = match ::image::load_from_memory_with_format(data, ::image::ImageFormat::Jpeg) {
        Ok(img) => img.to_rgba8(),
        Err(e) => {
            log::warn!("JPEG image could not be decoded: {}", e);
            return None;
        }
    };
    if decoded.width() != width || decoded.height() != height {
        log::debug!(
            "JPEG size {}x{} differs from declared {}x{}",
            decoded.width(),
            decoded.height(),
            width,
            height
        );
    }
    let size = IntSize::from_wh(decoded.width(), decoded.height())?;
    Pixmap::from_vec(decoded.into_raw(), size)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cmyk_to_rgb() {
        assert_eq!(cmyk_to_rgb(0, 0, 0, 0), [255, 255, 255]);
        assert_eq!(cmyk_to_rgb(0, 0, 0, 255), [0, 0, 0]);
        assert_eq!(cmyk_to_rgb(255, 0, 0, 0), [0, 255, 255]);
    }

    #[test]
    fn test_unpack_8bit_gray() {
        let rgba = unpack_8bit(&[0, 255], 2, 1, &ColorSpace::Gray).unwrap();
        assert_eq!(rgba, vec![0, 0, 0, 255, 255, 255, 255, 255]);
        assert!(unpack_8bit(&[0], 2, 1, &ColorSpace::Gray).is_none());
    }

    #[test]
    fn test_unpack_1bit_rows_are_padded() {
        // 3 pixels wide: 101 in the first row, 010 in the second
        let rgba = unpack_1bit(&[0b1010_0000, 0b0100_0000], 3, 2, &ColorSpace::Gray).unwrap();
        let grays: Vec<u8> = rgba.chunks(4).map(|p| p[0]).collect();
        assert_eq!(grays, vec![255, 0, 255, 0, 255, 0]);
    }

    #[test]
    fn test_stencil_paints_zero_bits() {
        let pixmap = decode_stencil(&[0b0100_0000], 2, 1, [10, 20, 30], false).unwrap();
        let first = pixmap.pixel(0, 0).unwrap();
        let second = pixmap.pixel(1, 0).unwrap();
        assert_eq!(first.alpha(), 255);
        assert_eq!(first.red(), 10);
        assert_eq!(second.alpha(), 0);
    }

    #[test]
    fn test_indexed_lookup() {
        let space = ColorSpace::Indexed(vec![[1, 2, 3], [4, 5, 6]]);
        assert_eq!(space.to_rgb(&[1]), [4, 5, 6]);
        assert_eq!(space.to_rgb(&[9]), [0, 0, 0]);
    }
}
