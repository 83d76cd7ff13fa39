//! Text a frontend shows for the latest reading.
//!
//! Each field has a placeholder with the same shape as a formatted value, so
//! the layout does not jump when the first reading arrives.

use crate::Reading;

pub const HUMIDITY_PLACEHOLDER: &str = "--.-";
pub const VOLTAGE_PLACEHOLDER: &str = "-.--";
pub const ADC_PLACEHOLDER: &str = "----";

/// Relative humidity with one decimal, without the unit.
pub fn humidity_text(reading: Option<&Reading>) -> String {
    reading.map_or_else(
        || HUMIDITY_PLACEHOLDER.to_string(),
        |r| format!("{:.1}", r.relative_humidity()),
    )
}

/// Sensor voltage with two decimals, without the unit.
pub fn voltage_text(reading: Option<&Reading>) -> String {
    reading.map_or_else(
        || VOLTAGE_PLACEHOLDER.to_string(),
        |r| format!("{:.2}", r.sensor_voltage()),
    )
}

pub fn adc_text(reading: Option<&Reading>) -> String {
    reading.map_or_else(|| ADC_PLACEHOLDER.to_string(), |r| r.adc_value().to_string())
}
