use thiserror::Error;

use crate::Reading;

/// Why a frame did not produce a [`Reading`].
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FrameError {
    /// Less than two `|` separated parts, e.g. a partial or unrelated message.
    #[error("expected at least 2 '|' separated parts, got {0}")]
    TooFewParts(usize),
    /// A part has no `label: value` shape.
    #[error("part {index} has no ':' separator: {part:?}")]
    MissingSeparator { index: usize, part: String },
    #[error("invalid ADC value: {0:?}")]
    InvalidAdc(String),
    #[error("invalid voltage: {0:?}")]
    InvalidVoltage(String),
}

impl FrameError {
    /// Short frames are expected noise on the stream and are dropped quietly.
    pub fn is_silent(&self) -> bool {
        matches!(self, FrameError::TooFewParts(_))
    }
}

/// Decodes one frame of the form `"Valor: <int>|Volts: <float>"`.
///
/// Labels and the whitespace around `:` and `|` may vary. Parts after the
/// second one are ignored.
pub fn decode_frame(frame: &str) -> Result<Reading, FrameError> {
    let parts: Vec<&str> = frame.split('|').collect();
    if parts.len() < 2 {
        return Err(FrameError::TooFewParts(parts.len()));
    }

    let adc = field_value(parts[0], 0)?;
    let adc_value: i64 = adc
        .parse()
        .map_err(|_| FrameError::InvalidAdc(adc.to_string()))?;

    let volts = field_value(parts[1], 1)?;
    let sensor_voltage_raw: f64 = volts
        .parse()
        .ok()
        .filter(|v: &f64| v.is_finite())
        .ok_or_else(|| FrameError::InvalidVoltage(volts.to_string()))?;

    Ok(Reading::new(adc_value, sensor_voltage_raw))
}

fn field_value(part: &str, index: usize) -> Result<&str, FrameError> {
    part.split(':')
        .nth(1)
        .map(str::trim)
        .ok_or_else(|| FrameError::MissingSeparator {
            index,
            part: part.to_string(),
        })
}
