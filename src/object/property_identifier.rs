//! BACnet property identifier enumeration.
//!
//! Only the identifiers used by the input objects of this crate, and the ones
//! a dispatcher commonly asks for, are named. Everything from 512 upwards is
//! vendor space and arrives as [`PropertyIdentifier::Custom`].

use crate::generate_custom_enum;

generate_custom_enum!(
    /// BACnet property identifiers
    PropertyIdentifier {
        AckedTransitions = 0,
        CovIncrement = 22,
        Deadband = 25,
        Description = 28,
        EventEnable = 35,
        EventState = 36,
        HighLimit = 45,
        LimitEnable = 52,
        LowLimit = 59,
        NotificationClass = 17,
        NotifyType = 72,
        NumberOfStates = 74,
        ObjectIdentifier = 75,
        ObjectList = 76,
        ObjectName = 77,
        ObjectType = 79,
        OutOfService = 81,
        PresentValue = 85,
        Priority = 86,
        Reliability = 103,
        StateText = 110,
        StatusFlags = 111,
        TimeDelay = 113,
        Units = 117,
        EventTimeStamps = 130,
        AckRequired = 1,
        PropertyList = 371,
    },
    u32,
    512..=4_194_303
);

/// Proprietary property: time of the last present-value update
pub const PROP_LAST_RX_TIME: u32 = 9997;
/// Proprietary property: date of the last present-value update
pub const PROP_LAST_RX_DATE: u32 = 9998;

impl PropertyIdentifier {
    /// Raw identifier as carried on the wire
    pub fn id(self) -> u32 {
        u32::from(self)
    }

    /// Time of the last present-value update (vendor range)
    pub fn last_rx_time() -> Self {
        Self::from(PROP_LAST_RX_TIME)
    }

    /// Date of the last present-value update (vendor range)
    pub fn last_rx_date() -> Self {
        Self::from(PROP_LAST_RX_DATE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_proprietary_identifiers() {
        let rx_time = PropertyIdentifier::last_rx_time();
        assert!(rx_time.is_custom());
        assert_eq!(rx_time.id(), 9997);
        assert_eq!(PropertyIdentifier::from(9998u32), PropertyIdentifier::last_rx_date());
    }

    #[test]
    fn test_standard_identifiers() {
        assert_eq!(PropertyIdentifier::from(130u32), PropertyIdentifier::EventTimeStamps);
        assert_eq!(PropertyIdentifier::PresentValue.id(), 85);
        assert_eq!(PropertyIdentifier::StateText.to_string(), "StateText");
    }
}
