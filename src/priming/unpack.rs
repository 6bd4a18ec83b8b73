//! Texel-block unpacking for formats the image-rebuild render/store strategies need to expand
//! into a staging format the GPU can write into.
//!
//! Coverage decision (see `DESIGN.md`): rather than porting the bit-shuffling float-unpack logic
//! this was distilled from, half-float and packed-float formats are unpacked using the IEEE 754
//! binary16 and `VK_FORMAT_B10G11R11_UFLOAT_PACK32` bit layouts directly. Formats outside that
//! explicit list return [`Error::UnsupportedFormat`] rather than a best-effort byte copy, so a
//! caller can tell a correct unpack from a silently wrong one.

use ash::vk;

use crate::error::Error;

/// Size in bytes of one texel block of `format`, for the formats this crate needs to reason
/// about during priming (uncompressed, non-planar formats only).
pub fn format_block_bytes(format: vk::Format) -> Option<u32> {
    use vk::Format as F;
    Some(match format {
        F::R8_UNORM | F::R8_UINT | F::R8_SINT | F::R8_SRGB => 1,
        F::R8G8_UNORM | F::R8G8_UINT | F::R16_SFLOAT | F::R16_UNORM | F::D16_UNORM => 2,
        F::R8G8B8A8_UNORM | F::R8G8B8A8_SRGB | F::B8G8R8A8_UNORM | F::B8G8R8A8_SRGB | F::R32_UINT | F::R32_SFLOAT | F::D32_SFLOAT | F::B10G11R11_UFLOAT_PACK32 | F::E5B9G9R9_UFLOAT_PACK32 => 4,
        F::R16G16B16A16_SFLOAT | F::R16G16B16A16_UNORM | F::R32G32_SFLOAT | F::R32G32_UINT => 8,
        F::R32G32B32A32_SFLOAT | F::R32G32B32A32_UINT => 16,
        _ => return None,
    })
}

/// Decode an IEEE 754 binary16 value to `f32`.
pub fn half_to_f32(bits: u16) -> f32 {
    let sign = (bits >> 15) as u32;
    let exponent = ((bits >> 10) & 0x1F) as u32;
    let mantissa = (bits & 0x3FF) as u32;

    let (exponent, mantissa) = if exponent == 0 {
        if mantissa == 0 {
            (0u32, 0u32)
        } else {
            let mut e = 127 - 15 + 1;
            let mut m = mantissa;
            while m & 0x400 == 0 {
                m <<= 1;
                e -= 1;
            }
            (e, (m & 0x3FF) << 13)
        }
    } else if exponent == 0x1F {
        (0xFF, mantissa << 13)
    } else {
        (exponent - 15 + 127, mantissa << 13)
    };

    f32::from_bits((sign << 31) | (exponent << 23) | mantissa)
}

/// Decode a 10-bit or 11-bit unsigned float field from `VK_FORMAT_B10G11R11_UFLOAT_PACK32`
/// (`mantissa_bits` is 5 for the 10-bit blue field, 6 for the 11-bit red/green fields).
fn unpack_ufloat(value: u32, mantissa_bits: u32) -> f32 {
    let exponent_bits = 5;
    let mantissa_mask = (1 << mantissa_bits) - 1;
    let mantissa = value & mantissa_mask;
    let exponent = (value >> mantissa_bits) & ((1 << exponent_bits) - 1);

    if exponent == 0 {
        if mantissa == 0 {
            0.0
        } else {
            (mantissa as f32) * 2f32.powi(-14 - mantissa_bits as i32)
        }
    } else if exponent == 0x1F {
        if mantissa == 0 {
            f32::INFINITY
        } else {
            f32::NAN
        }
    } else {
        let implicit_mantissa = mantissa as f32 / (1u32 << mantissa_bits) as f32;
        (1.0 + implicit_mantissa) * 2f32.powi(exponent as i32 - 15)
    }
}

/// Unpack one `VK_FORMAT_B10G11R11_UFLOAT_PACK32` texel into `[r, g, b]`.
pub fn unpack_b10g11r11(packed: u32) -> [f32; 3] {
    let r = unpack_ufloat(packed & 0x7FF, 6);
    let g = unpack_ufloat((packed >> 11) & 0x7FF, 6);
    let b = unpack_ufloat((packed >> 22) & 0x3FF, 5);
    [r, g, b]
}

/// Unpack `src` (raw texel bytes of `format`) into 32-bit words suitable for the render-strategy
/// staging images (`R32G32B32A32_UINT`/`R32_UINT`), expanding half-float and packed-float formats
/// to full 32-bit representations rather than copying bytes verbatim.
pub fn unpack_to_staging_words(format: vk::Format, src: &[u8]) -> Result<Vec<u32>, Error> {
    use vk::Format as F;
    match format {
        F::R16G16B16A16_SFLOAT => {
            if src.len() < 8 {
                return Err(Error::DimensionError("R16G16B16A16_SFLOAT texel shorter than 8 bytes".into()));
            }
            let mut out = Vec::with_capacity(4);
            for chunk in src[..8].chunks_exact(2) {
                let half = u16::from_le_bytes([chunk[0], chunk[1]]);
                out.push(half_to_f32(half).to_bits());
            }
            Ok(out)
        }
        F::B10G11R11_UFLOAT_PACK32 => {
            if src.len() < 4 {
                return Err(Error::DimensionError("B10G11R11_UFLOAT_PACK32 texel shorter than 4 bytes".into()));
            }
            let packed = u32::from_le_bytes([src[0], src[1], src[2], src[3]]);
            let [r, g, b] = unpack_b10g11r11(packed);
            Ok(vec![r.to_bits(), g.to_bits(), b.to_bits()])
        }
        F::R32G32B32A32_SFLOAT | F::R32G32B32A32_UINT | F::R32_SFLOAT | F::R32_UINT => {
            let block = format_block_bytes(format).unwrap() as usize;
            if src.len() < block {
                return Err(Error::DimensionError("texel shorter than its declared block size".into()));
            }
            Ok(src[..block].chunks_exact(4).map(|c| u32::from_le_bytes([c[0], c[1], c[2], c[3]])).collect())
        }
        other => Err(Error::UnsupportedFormat(other)),
    }
}
