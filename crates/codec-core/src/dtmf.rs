//! Inband DTMF detection via the Goertzel algorithm, and the RFC 4733
//! telephone-event <-> keypad symbol mapping shared by both the inband and
//! out-of-band detection paths.

/// Sample rate all DTMF detection in this client operates at.
pub const SAMPLE_RATE_HZ: f64 = 8000.0;

/// DTMF low-group (row) frequencies.
pub const ROW_FREQS: [f64; 4] = [697.0, 770.0, 852.0, 941.0];
/// DTMF high-group (column) frequencies.
pub const COL_FREQS: [f64; 4] = [1209.0, 1336.0, 1477.0, 1633.0];

const KEYPAD: [[char; 4]; 4] = [
    ['1', '2', '3', 'A'],
    ['4', '5', '6', 'B'],
    ['7', '8', '9', 'C'],
    ['*', '0', '#', 'D'],
];

/// Minimum Goertzel power for a bin to be considered "present", chosen to
/// reject ordinary speech energy at typical telephony levels.
pub const POWER_THRESHOLD: f64 = 1.0e11;

/// Recursive single-bin DFT power for `samples` at `freq_hz`, per the
/// classic Goertzel formulation: `s = x + coeff*s1 - s2`, power derived
/// from the last two running states.
pub fn goertzel_power(samples: &[i16], freq_hz: f64, sample_rate: f64) -> f64 {
    let omega = 2.0 * std::f64::consts::PI * freq_hz / sample_rate;
    let coeff = 2.0 * omega.cos();

    let mut s_prev = 0.0f64;
    let mut s_prev2 = 0.0f64;
    for &x in samples {
        let s = x as f64 + coeff * s_prev - s_prev2;
        s_prev2 = s_prev;
        s_prev = s;
    }
    s_prev2 * s_prev2 + s_prev * s_prev - coeff * s_prev * s_prev2
}

/// Run Goertzel over all 8 DTMF tones and return the strongest row/column
/// pair, or `None` if neither exceeds [`POWER_THRESHOLD`].
///
/// This is the inband path used when telephone-event was not negotiated:
/// the receiver hands it three consecutive 160-sample (20ms) frames of
/// decoded PCM ([`crate::DTMF_PACKETS_COUNT`] worth).
pub fn detect_dtmf(samples: &[i16]) -> Option<char> {
    let row_powers: Vec<f64> = ROW_FREQS
        .iter()
        .map(|&f| goertzel_power(samples, f, SAMPLE_RATE_HZ))
        .collect();
    let col_powers: Vec<f64> = COL_FREQS
        .iter()
        .map(|&f| goertzel_power(samples, f, SAMPLE_RATE_HZ))
        .collect();

    let (row_idx, &row_power) = row_powers
        .iter()
        .enumerate()
        .max_by(|a, b| a.1.partial_cmp(b.1).unwrap())?;
    let (col_idx, &col_power) = col_powers
        .iter()
        .enumerate()
        .max_by(|a, b| a.1.partial_cmp(b.1).unwrap())?;

    if row_power > POWER_THRESHOLD && col_power > POWER_THRESHOLD {
        Some(KEYPAD[row_idx][col_idx])
    } else {
        None
    }
}

/// Map an RFC 4733 telephone-event code (0..16) to its keypad symbol.
/// 0-9 are digits, 10 is `*`, 11 is `#`, 12-15 are A-D, 16 is Flash.
pub fn telephone_event_to_symbol(event: u8) -> Option<&'static str> {
    match event {
        0..=9 => Some(match event {
            0 => "0",
            1 => "1",
            2 => "2",
            3 => "3",
            4 => "4",
            5 => "5",
            6 => "6",
            7 => "7",
            8 => "8",
            _ => "9",
        }),
        10 => Some("*"),
        11 => Some("#"),
        12 => Some("A"),
        13 => Some("B"),
        14 => Some("C"),
        15 => Some("D"),
        16 => Some("Flash"),
        _ => None,
    }
}

/// Map a keypad symbol to its RFC 4733 telephone-event code, the inverse
/// of [`telephone_event_to_symbol`].
pub fn symbol_to_telephone_event(symbol: char) -> Option<u8> {
    match symbol {
        '0'..='9' => Some(symbol as u8 - b'0'),
        '*' => Some(10),
        '#' => Some(11),
        'A' => Some(12),
        'B' => Some(13),
        'C' => Some(14),
        'D' => Some(15),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn synth_dual_tone(f1: f64, f2: f64, amplitude: f64, n: usize) -> Vec<i16> {
        (0..n)
            .map(|i| {
                let t = i as f64 / SAMPLE_RATE_HZ;
                let v = amplitude
                    * ((2.0 * std::f64::consts::PI * f1 * t).sin()
                        + (2.0 * std::f64::consts::PI * f2 * t).sin())
                    / 2.0;
                v as i16
            })
            .collect()
    }

    #[test]
    fn detects_digit_one() {
        let samples = synth_dual_tone(697.0, 1209.0, 32767.0, 480);
        assert_eq!(detect_dtmf(&samples), Some('1'));
    }

    #[test]
    fn single_frequency_does_not_detect() {
        let samples: Vec<i16> = (0..480)
            .map(|i| {
                let t = i as f64 / SAMPLE_RATE_HZ;
                (32767.0 * (2.0 * std::f64::consts::PI * 697.0 * t).sin()) as i16
            })
            .collect();
        assert_eq!(detect_dtmf(&samples), None);
    }

    #[test]
    fn low_amplitude_does_not_detect() {
        let samples = synth_dual_tone(697.0, 1209.0, 50.0, 480);
        assert_eq!(detect_dtmf(&samples), None);
    }

    #[test]
    fn telephone_event_roundtrip() {
        for c in "0123456789*#ABCD".chars() {
            let event = symbol_to_telephone_event(c).unwrap();
            let symbol = telephone_event_to_symbol(event).unwrap();
            assert_eq!(symbol.chars().next(), Some(c));
        }
    }
}
