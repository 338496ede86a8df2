//! Source quality estimation from quantization tables.
//!
//! Encoders derived from the IJG reference scale the Annex K luminance table
//! by a quality-dependent factor. The estimate is the quality whose scaled
//! table lies closest to the luminance table found in the file.

use super::markers::{Header, QuantTable};
use crate::attr::Quality;

/// Annex K luminance quantization table, natural (row-major) order.
const STD_LUMA_QTABLE: [u16; 64] = [
    16, 11, 10, 16, 24, 40, 51, 61, //
    12, 12, 14, 19, 26, 58, 60, 55, //
    14, 13, 16, 24, 40, 57, 69, 56, //
    14, 17, 22, 29, 51, 87, 80, 62, //
    18, 22, 37, 56, 68, 109, 103, 77, //
    24, 35, 55, 64, 81, 104, 113, 92, //
    49, 64, 78, 87, 103, 121, 120, 101, //
    72, 92, 95, 98, 112, 100, 103, 99,
];

/// Natural-order index for each zigzag position.
const ZIGZAG: [usize; 64] = [
    0, 1, 8, 16, 9, 2, 3, 10, 17, 24, 32, 25, 18, 11, 4, 5, //
    12, 19, 26, 33, 40, 48, 41, 34, 27, 20, 13, 6, 7, 14, 21, 28, //
    35, 42, 49, 56, 57, 50, 43, 36, 29, 22, 15, 23, 30, 37, 44, 51, //
    58, 59, 52, 45, 38, 31, 39, 46, 53, 60, 61, 54, 47, 55, 62, 63,
];

/// The luminance table an IJG-style encoder writes at `quality`, in zigzag
/// order.
pub fn scaled_luma_table(quality: Quality) -> [u16; 64] {
    let quality = u32::from(quality.clamp(1, 100));
    let scale = if quality < 50 {
        5000 / quality
    } else {
        200 - quality * 2
    };

    let mut table = [0u16; 64];
    for (zz, value) in table.iter_mut().enumerate() {
        let base = u32::from(STD_LUMA_QTABLE[ZIGZAG[zz]]);
        *value = ((base * scale + 50) / 100).clamp(1, 255) as u16;
    }
    table
}

/// Estimate the quality a luminance table was produced at.
pub fn estimate_table(table: &QuantTable) -> Quality {
    let mut best = (u32::MAX, 0);
    for quality in 1..=100u8 {
        let candidate = scaled_luma_table(quality);
        let distance: u32 = candidate
            .iter()
            .zip(table.values.iter())
            .map(|(&a, &b)| u32::from(a.abs_diff(b)))
            .sum();
        // ties resolve to the higher quality
        if distance <= best.0 {
            best = (distance, quality);
        }
    }
    best.1
}

/// Estimate source quality from a parsed header; 0 when it has no tables.
pub fn estimate(header: &Header) -> Quality {
    header
        .quant_tables
        .iter()
        .find(|t| t.id == 0)
        .or_else(|| header.quant_tables.first())
        .map(estimate_table)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(values: [u16; 64]) -> QuantTable {
        QuantTable { id: 0, values }
    }

    #[test]
    fn test_quality_50_is_standard_table() {
        let expected: Vec<u16> = ZIGZAG.iter().map(|&i| STD_LUMA_QTABLE[i]).collect();
        assert_eq!(scaled_luma_table(50).to_vec(), expected);
    }

    #[test]
    fn test_quality_100_is_all_ones() {
        assert!(scaled_luma_table(100).iter().all(|&v| v == 1));
    }

    #[test]
    fn test_low_quality_clamps_to_255() {
        assert!(scaled_luma_table(1).iter().all(|&v| v == 255));
    }

    #[test]
    fn test_zigzag_is_permutation() {
        let mut seen = [false; 64];
        for &i in &ZIGZAG {
            assert!(!seen[i]);
            seen[i] = true;
        }
    }

    #[test]
    fn test_estimate_exact_tables() {
        for quality in [10u8, 50, 75, 85, 90, 95, 100] {
            assert_eq!(estimate_table(&table(scaled_luma_table(quality))), quality);
        }
    }

    #[test]
    fn test_estimate_noisy_table() {
        let mut values = scaled_luma_table(80);
        values[10] += 1;
        values[40] -= 1;
        assert_eq!(estimate_table(&table(values)), 80);
    }

    #[test]
    fn test_estimate_empty_header() {
        assert_eq!(estimate(&Header::default()), 0);
    }

    #[test]
    fn test_estimate_prefers_luma_table() {
        let header = Header {
            quant_tables: vec![
                QuantTable {
                    id: 1,
                    values: scaled_luma_table(30),
                },
                table(scaled_luma_table(88)),
            ],
            metadata: vec![],
            ..Default::default()
        };
        assert_eq!(estimate(&header), 88);
    }
}
