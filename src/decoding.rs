//! Weight notification decoding for every protocol variant.
//!
//! A buffer that does not have the shape expected for the variant is not an
//! error: scales interleave other message types and partial frames with
//! weight reports, so [`decode`] simply yields `None` for them.

use std::fmt;

use crate::variant::Variant;

const NEW_FRAME_LEN: usize = 13;
const NEW_WEIGHT_MSG: u8 = 0x05;
const OLD_FRAME_LEN: usize = 10;
// Sign byte plus six digits; anything after the digits is ignored.
const GENERIC_MIN_LEN: usize = 9;
const SIGN_NEGATIVE: u8 = 0x02;

/// Most recent weight reading reported by the scale.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WeightSample {
    magnitude: f32,
    negative: bool,
}

impl WeightSample {
    pub fn new(magnitude: f32, negative: bool) -> Self {
        Self {
            magnitude,
            negative,
        }
    }

    pub fn magnitude(&self) -> f32 {
        self.magnitude
    }

    pub fn is_negative(&self) -> bool {
        self.negative
    }

    /// Signed weight in the unit displayed by the scale.
    pub fn value(&self) -> f32 {
        if self.negative {
            -self.magnitude
        } else {
            self.magnitude
        }
    }
}

impl fmt::Display for WeightSample {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.value())
    }
}

/// Decodes a notification buffer received on the read channel.
pub fn decode(buffer: &[u8], variant: Variant) -> Option<WeightSample> {
    match variant {
        Variant::New => decode_new(buffer),
        Variant::Old => decode_old(buffer),
        Variant::Generic => decode_generic(buffer),
    }
}

fn decode_new(buffer: &[u8]) -> Option<WeightSample> {
    if buffer.len() != NEW_FRAME_LEN || buffer[4] != NEW_WEIGHT_MSG {
        return None;
    }
    Some(decode_scaled(&buffer[5..]))
}

fn decode_old(buffer: &[u8]) -> Option<WeightSample> {
    if buffer.len() != OLD_FRAME_LEN {
        return None;
    }
    Some(decode_scaled(&buffer[2..]))
}

// Acaia weight payload: u16 LE raw value, two unused bytes, decimal
// exponent, sign flags.
fn decode_scaled(weight_payload: &[u8]) -> WeightSample {
    let raw = (weight_payload[1] as u16) << 8 | weight_payload[0] as u16;
    let unit = weight_payload[4];
    let magnitude = raw as f32 / 10f32.powi(unit as i32);
    let negative = weight_payload[5] & SIGN_NEGATIVE == SIGN_NEGATIVE;
    WeightSample::new(magnitude, negative)
}

// Generic scales send ASCII: byte 2 is the sign, bytes 3..9 are the digits
// of a fixed-point value with two decimals (e.g. "001234" is 12.34).
fn decode_generic(buffer: &[u8]) -> Option<WeightSample> {
    if buffer.len() < GENERIC_MIN_LEN {
        return None;
    }

    let mut hundredths: u32 = 0;
    for &digit in &buffer[3..9] {
        if !digit.is_ascii_digit() {
            return None;
        }
        hundredths = hundredths * 10 + (digit - b'0') as u32;
    }

    let negative = buffer[2] != b'+';
    Some(WeightSample::new(hundredths as f32 / 100.0, negative))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_weight(sample: Option<WeightSample>, expected: f32) {
        let sample = sample.expect("expected a weight sample");
        assert!(
            (sample.value() - expected).abs() < 1e-4,
            "got {}, expected {expected}",
            sample.value()
        );
    }

    fn new_frame(lo: u8, hi: u8, exponent: u8, flags: u8) -> [u8; 13] {
        let mut buffer = [0u8; 13];
        buffer[0] = 0xef;
        buffer[1] = 0xdd;
        buffer[2] = 0x0c;
        buffer[4] = 0x05;
        buffer[5] = lo;
        buffer[6] = hi;
        buffer[9] = exponent;
        buffer[10] = flags;
        buffer
    }

    fn old_frame(lo: u8, hi: u8, exponent: u8, flags: u8) -> [u8; 10] {
        let mut buffer = [0u8; 10];
        buffer[2] = lo;
        buffer[3] = hi;
        buffer[6] = exponent;
        buffer[7] = flags;
        buffer
    }

    #[test]
    fn new_variant_positive_weight() {
        let buffer = new_frame(0x88, 0x01, 1, 0x00);
        assert_weight(decode(&buffer, Variant::New), 39.2);
    }

    #[test]
    fn new_variant_negative_weight() {
        let buffer = new_frame(0x88, 0x01, 2, 0x02);
        let sample = decode(&buffer, Variant::New).unwrap();
        assert!(sample.is_negative());
        assert_weight(Some(sample), -3.92);
    }

    #[test]
    fn new_variant_requires_weight_message() {
        let mut buffer = new_frame(0x88, 0x01, 1, 0x00);
        buffer[4] = 0x07;
        assert_eq!(decode(&buffer, Variant::New), None);
    }

    #[test]
    fn new_variant_requires_exact_length() {
        let buffer = new_frame(0x88, 0x01, 1, 0x00);
        assert_eq!(decode(&buffer[..12], Variant::New), None);

        let mut longer = buffer.to_vec();
        longer.push(0);
        assert_eq!(decode(&longer, Variant::New), None);
    }

    #[test]
    fn old_variant_negative_weight() {
        let buffer = old_frame(0x64, 0x00, 1, 0x02);
        assert_weight(decode(&buffer, Variant::Old), -10.0);
    }

    #[test]
    fn old_variant_sign_uses_bit_one_only() {
        let buffer = old_frame(0x64, 0x00, 1, 0x01 | 0x04);
        let sample = decode(&buffer, Variant::Old).unwrap();
        assert!(!sample.is_negative());
        assert_weight(Some(sample), 10.0);
    }

    #[test]
    fn old_variant_requires_exact_length() {
        assert_eq!(decode(&[0u8; 13], Variant::Old), None);
        assert_eq!(decode(&[], Variant::Old), None);
    }

    #[test]
    fn zero_exponent_is_unscaled() {
        let buffer = old_frame(0x10, 0x27, 0, 0x00);
        assert_weight(decode(&buffer, Variant::Old), 10000.0);
    }

    #[test]
    fn generic_positive_weight() {
        let buffer = *b"ST+001234 g\r\n";
        assert_weight(decode(&buffer, Variant::Generic), 12.34);
    }

    #[test]
    fn generic_negative_weight() {
        let buffer = *b"ST-001234 g\r\n";
        assert_weight(decode(&buffer, Variant::Generic), -12.34);
    }

    #[test]
    fn generic_digits_are_thousands_to_hundredths() {
        let buffer = *b"ST+012345 g\r\n";
        assert_weight(decode(&buffer, Variant::Generic), 123.45);
    }

    #[test]
    fn generic_sign_other_than_plus_is_negative() {
        let buffer = *b"ST 000050 g\r\n";
        assert_weight(decode(&buffer, Variant::Generic), -0.5);
    }

    #[test]
    fn generic_rejects_non_digit_payload() {
        let buffer = *b"ST+00x234 g\r\n";
        assert_eq!(decode(&buffer, Variant::Generic), None);
        assert_eq!(decode(b"ST+0", Variant::Generic), None);
    }

    #[test]
    fn buffers_are_variant_specific() {
        let old = old_frame(0x64, 0x00, 1, 0x00);
        assert_eq!(decode(&old, Variant::New), None);

        let new = new_frame(0x88, 0x01, 1, 0x00);
        assert_eq!(decode(&new, Variant::Old), None);
    }

    #[test]
    fn display_is_signed_with_two_decimals() {
        assert_eq!(WeightSample::new(12.5, true).to_string(), "-12.50");
        assert_eq!(WeightSample::new(3.0, false).to_string(), "3.00");
    }
}
