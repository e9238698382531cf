//! Utility Functions Module
//!
//! Small helpers shared by the object stores: instance validation, readable
//! renderings of BACnet dates and times (wildcards shown as `*`), and the
//! hex rendering used by trace logging of encoded payloads.

mod enum_macros;

/// Largest instance number an object identifier can carry
pub const MAX_INSTANCE: u32 = 0x3F_FFFF;

/// Validate object instance number (must be 0-4194303)
pub fn is_valid_instance_number(instance: u32) -> bool {
    instance <= MAX_INSTANCE
}

fn field_or_wildcard(value: u8, width: usize) -> String {
    if value == 255 {
        String::from("*")
    } else {
        format!("{:0width$}", value, width = width)
    }
}

/// Convert BACnet date to string representation
pub fn bacnet_date_to_string(year: u16, month: u8, day: u8, weekday: u8) -> String {
    let year_str = if year == 255 {
        String::from("*")
    } else {
        year.to_string()
    };
    let month_str = match month {
        13 => String::from("odd"),
        14 => String::from("even"),
        _ => field_or_wildcard(month, 2),
    };
    let day_str = match day {
        32 => String::from("last"),
        _ => field_or_wildcard(day, 2),
    };
    let weekday_str = match weekday {
        1 => "Mon",
        2 => "Tue",
        3 => "Wed",
        4 => "Thu",
        5 => "Fri",
        6 => "Sat",
        7 => "Sun",
        255 => "*",
        _ => "?",
    };

    format!("{}-{}-{} ({})", year_str, month_str, day_str, weekday_str)
}

/// Convert BACnet time to string representation
pub fn bacnet_time_to_string(hour: u8, minute: u8, second: u8, hundredths: u8) -> String {
    format!(
        "{}:{}:{}.{}",
        field_or_wildcard(hour, 2),
        field_or_wildcard(minute, 2),
        field_or_wildcard(second, 2),
        field_or_wildcard(hundredths, 2)
    )
}

/// Render an encoded payload for trace output
pub fn payload_hex(data: &[u8]) -> String {
    hex::encode_upper(data)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_instance_bounds() {
        assert!(is_valid_instance_number(0));
        assert!(is_valid_instance_number(MAX_INSTANCE));
        assert!(!is_valid_instance_number(MAX_INSTANCE + 1));
    }

    #[test]
    fn test_date_time_strings() {
        assert_eq!(bacnet_date_to_string(2024, 3, 15, 5), "2024-03-15 (Fri)");
        assert_eq!(bacnet_date_to_string(255, 255, 32, 255), "*-*-last (*)");
        assert_eq!(bacnet_time_to_string(7, 5, 0, 255), "07:05:00.*");
    }

    #[test]
    fn test_payload_hex() {
        assert_eq!(payload_hex(&[0x44, 0x41, 0x40, 0x00, 0x00]), "4441400000");
    }
}
