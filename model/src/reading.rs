use serde::Serialize;

/// Largest count a 10 bit converter reports.
pub const ADC_MAX: i64 = 1023;

/// Relative humidity in percent per volt transmitted by the source.
const HUMIDITY_PER_VOLT: f64 = 20.0;

/// Supply voltage of the sensor, the humidity percentage is scaled onto it.
const SUPPLY_VOLTAGE: f64 = 3.3;

/// One decoded sample of the humidity sensor.
///
/// Only the two transmitted values are stored as given. Humidity and sensor
/// voltage are derived from the raw voltage on construction and can not be
/// set on their own.
#[derive(Serialize, Clone, Copy, Debug, PartialEq)]
pub struct Reading {
    adc_value: i64,
    sensor_voltage_raw: f64,
    relative_humidity: f64,
    sensor_voltage: f64,
}

impl Reading {
    pub fn new(adc_value: i64, sensor_voltage_raw: f64) -> Self {
        let relative_humidity = HUMIDITY_PER_VOLT * sensor_voltage_raw;
        let sensor_voltage = (SUPPLY_VOLTAGE / 100.0) * relative_humidity;

        Self {
            adc_value,
            sensor_voltage_raw,
            relative_humidity,
            sensor_voltage,
        }
    }

    /// Raw analog-to-digital count.
    pub fn adc_value(&self) -> i64 {
        self.adc_value
    }

    /// Volts as transmitted by the source.
    pub fn sensor_voltage_raw(&self) -> f64 {
        self.sensor_voltage_raw
    }

    /// Relative humidity in percent.
    pub fn relative_humidity(&self) -> f64 {
        self.relative_humidity
    }

    /// Sensor voltage in volts.
    pub fn sensor_voltage(&self) -> f64 {
        self.sensor_voltage
    }

    /// Checks the reading against the range the hardware can produce.
    ///
    /// The protocol carries no limits, so an out of range value is still a
    /// valid reading. The flags only tell the caller that it looks suspicious.
    pub fn range_flags(&self) -> RangeFlags {
        RangeFlags {
            adc_out_of_range: !(0..=ADC_MAX).contains(&self.adc_value),
            negative_voltage: self.sensor_voltage_raw < 0.0,
        }
    }
}

/// Result of [`Reading::range_flags`].
#[derive(Serialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RangeFlags {
    pub adc_out_of_range: bool,
    pub negative_voltage: bool,
}

impl RangeFlags {
    pub fn any(&self) -> bool {
        self.adc_out_of_range || self.negative_voltage
    }
}
