//! BACnet engineering units.
//!
//! A common subset is named. The units property of an input accepts any
//! enumerated value, so unnamed ones are kept as `Custom`/`Reserved`.

use crate::generate_custom_enum;

generate_custom_enum!(
    /// Engineering units
    EngineeringUnits {
        SquareMeters = 0,
        SquareFeet = 1,
        Milliamperes = 2,
        Amperes = 3,
        Ohms = 4,
        Volts = 5,
        Kilovolts = 6,
        KilowattHours = 19,
        Hertz = 27,
        PercentRelativeHumidity = 29,
        Lux = 37,
        Watts = 47,
        Kilowatts = 48,
        Pascals = 53,
        Kilopascals = 54,
        Bars = 55,
        PoundsForcePerSquareInch = 56,
        DegreesCelsius = 62,
        DegreesKelvin = 63,
        DegreesFahrenheit = 64,
        Hours = 71,
        Minutes = 72,
        Seconds = 73,
        MetersPerSecond = 74,
        KilometersPerHour = 75,
        CubicFeetPerMinute = 84,
        CubicMetersPerSecond = 85,
        LitersPerSecond = 87,
        LitersPerMinute = 88,
        NoUnits = 95,
        PartsPerMillion = 96,
        Percent = 98,
        Millivolts = 124,
    },
    u32,
    256..=65_535
);

impl Default for EngineeringUnits {
    fn default() -> Self {
        EngineeringUnits::NoUnits
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_units() {
        assert_eq!(u32::from(EngineeringUnits::DegreesCelsius), 62);
        assert_eq!(EngineeringUnits::default(), EngineeringUnits::NoUnits);
        assert_eq!(u32::from(EngineeringUnits::from(47_808u32)), 47_808);
    }
}
