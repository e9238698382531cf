//! BACnet Application Layer Service Data
//!
//! This module holds the service-level data the object stores consume and
//! produce: the ReadProperty/WriteProperty request envelopes, the error and
//! abort codes a dispatcher answers with, and the alarm and event service data
//! (event notifications, AcknowledgeAlarm, GetEventInformation and
//! GetAlarmSummary).
//!
//! # Overview
//!
//! Event notifications leave an object through a [`NotificationRouter`]. The
//! router decides priority and whether the notification requires an
//! acknowledgment, the way a Notification Class object does. The bundled
//! [`NotificationClasses`] keeps per-class configuration and queues routed
//! notifications in an outbox for the transport layer to drain.
//!
//! # Example
//!
//! ```
//! use bacnet_objects::object::EventEnable;
//! use bacnet_objects::service::{NotificationClassConfig, NotificationClasses, NotificationRouter};
//!
//! let router = NotificationClasses::new().with_class(
//!     4,
//!     NotificationClassConfig {
//!         priorities: [100, 200, 200],
//!         ack_required: EventEnable::TO_OFFNORMAL,
//!     },
//! );
//! assert_eq!(router.priorities(4), [100, 200, 200]);
//! ```

use std::collections::{HashMap, VecDeque};

use log::debug;

use crate::encoding::MAX_APDU;
use crate::object::{
    BacnetDateTime, EventEnable, EventState, EventTransition, NotifyType, ObjectIdentifier,
    PropertyIdentifier, PropertyValue, StatusFlags, Time,
};

/// Special array index value indicating all elements
pub const BACNET_ARRAY_ALL: u32 = 0xFFFFFFFF;

/// Error class codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum ErrorClass {
    Device = 0,
    Object = 1,
    Property = 2,
    Resources = 3,
    Security = 4,
    Services = 5,
    Vt = 6,
    Communication = 7,
}

/// Error codes used by the property access and alarm services
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum ErrorCode {
    Other = 0,
    InvalidTimeStamp = 14,
    UnknownObject = 31,
    UnknownProperty = 32,
    ValueOutOfRange = 37,
    WriteAccessDenied = 40,
    InvalidArrayIndex = 42,
    DuplicateName = 48,
    PropertyIsNotAnArray = 50,
    ValueNotInitialized = 72,
    InvalidEventState = 73,
}

/// Abort reason codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum AbortReason {
    Other = 0,
    BufferOverflow = 1,
    InvalidApduInThisState = 2,
    PreemptedByHigherPriorityTask = 3,
    SegmentationNotSupported = 4,
}

fn normalize_array_index(index: Option<u32>) -> Option<u32> {
    index.filter(|&i| i != BACNET_ARRAY_ALL)
}

/// Read Property request (confirmed service)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadPropertyRequest {
    /// Object identifier to read from
    pub object_identifier: ObjectIdentifier,
    /// Property identifier to read
    pub property_identifier: PropertyIdentifier,
    /// Property array index, `None` for the whole property
    pub property_array_index: Option<u32>,
    /// Largest reply the requester accepts
    pub max_apdu: usize,
}

impl ReadPropertyRequest {
    /// Create a new Read Property request
    pub fn new(object_identifier: ObjectIdentifier, property_identifier: PropertyIdentifier) -> Self {
        Self {
            object_identifier,
            property_identifier,
            property_array_index: None,
            max_apdu: MAX_APDU,
        }
    }

    /// Create a new Read Property request with array index
    ///
    /// [`BACNET_ARRAY_ALL`] is the same as no index.
    pub fn with_array_index(
        object_identifier: ObjectIdentifier,
        property_identifier: PropertyIdentifier,
        array_index: u32,
    ) -> Self {
        Self {
            property_array_index: normalize_array_index(Some(array_index)),
            ..Self::new(object_identifier, property_identifier)
        }
    }

    /// Limit the reply size
    pub fn with_max_apdu(mut self, max_apdu: usize) -> Self {
        self.max_apdu = max_apdu;
        self
    }

    /// Requested array index, `None` meaning all elements
    pub fn array_index(&self) -> Option<u32> {
        normalize_array_index(self.property_array_index)
    }
}

/// Write Property request (confirmed service)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WritePropertyRequest {
    /// Object identifier to write to
    pub object_identifier: ObjectIdentifier,
    /// Property identifier to write
    pub property_identifier: PropertyIdentifier,
    /// Property array index (optional)
    pub property_array_index: Option<u32>,
    /// Property value to write
    pub property_value: Vec<u8>, // Raw application-tagged value(s)
    /// Priority (optional, 1-16)
    pub priority: Option<u8>,
}

impl WritePropertyRequest {
    /// Create a new Write Property request
    pub fn new(
        object_identifier: ObjectIdentifier,
        property_identifier: PropertyIdentifier,
        property_value: Vec<u8>,
    ) -> Self {
        Self {
            object_identifier,
            property_identifier,
            property_array_index: None,
            property_value,
            priority: None,
        }
    }

    /// Create a new Write Property request with array index
    pub fn with_array_index(
        object_identifier: ObjectIdentifier,
        property_identifier: PropertyIdentifier,
        array_index: u32,
        property_value: Vec<u8>,
    ) -> Self {
        Self {
            property_array_index: normalize_array_index(Some(array_index)),
            ..Self::new(object_identifier, property_identifier, property_value)
        }
    }

    /// Set the write priority
    pub fn with_priority(mut self, priority: u8) -> Self {
        self.priority = Some(priority);
        self
    }

    /// Requested array index, `None` meaning all elements
    pub fn array_index(&self) -> Option<u32> {
        normalize_array_index(self.property_array_index)
    }
}

/// Event types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum EventType {
    ChangeOfBitstring = 0,
    ChangeOfState = 1,
    ChangeOfValue = 2,
    CommandFailure = 3,
    FloatingLimit = 4,
    OutOfRange = 5,
}

/// BACnetTimeStamp choice
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeStamp {
    Time(Time),
    SequenceNumber(u16),
    DateTime(BacnetDateTime),
}

/// Event values of an out-of-range notification
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OutOfRangeValues {
    /// Present value that caused the event
    pub exceeding_value: f32,
    /// Status flags of the object at the time of the event
    pub status_flags: StatusFlags,
    /// Deadband used for the limit check
    pub deadband: f32,
    /// Limit that was crossed
    pub exceeded_limit: f32,
}

/// Confirmed/unconfirmed event notification data
#[derive(Debug, Clone, PartialEq)]
pub struct EventNotification {
    /// Object that detected the event
    pub event_object_identifier: ObjectIdentifier,
    /// Time of the transition
    pub time_stamp: TimeStamp,
    /// Notification class used for routing
    pub notification_class: u32,
    /// Filled in by the router
    pub priority: u8,
    /// Event algorithm that produced the notification
    pub event_type: EventType,
    /// Human readable message
    pub message_text: Option<String>,
    /// Alarm, event or ack notification
    pub notify_type: NotifyType,
    /// Filled in by the router
    pub ack_required: bool,
    /// Previous state, absent for ack notifications
    pub from_state: Option<EventState>,
    /// New state, or the acknowledged state for ack notifications
    pub to_state: EventState,
    /// Absent for ack notifications
    pub event_values: Option<OutOfRangeValues>,
}

/// AcknowledgeAlarm request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlarmAckRequest {
    pub acknowledging_process_identifier: u32,
    pub event_object_identifier: ObjectIdentifier,
    pub event_state_acknowledged: EventState,
    /// Time stamp of the transition being acknowledged
    pub event_time_stamp: TimeStamp,
    pub acknowledgment_source: String,
    pub time_of_acknowledgment: TimeStamp,
}

/// One entry of a GetEventInformation reply
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventInformation {
    pub object_identifier: ObjectIdentifier,
    pub event_state: EventState,
    /// Bit set means the transition is acknowledged
    pub acknowledged_transitions: EventEnable,
    pub event_time_stamps: [BacnetDateTime; 3],
    pub notify_type: NotifyType,
    pub event_enable: EventEnable,
    pub event_priorities: [u8; 3],
}

/// One entry of a GetAlarmSummary reply
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlarmSummary {
    pub object_identifier: ObjectIdentifier,
    pub alarm_state: EventState,
    /// Bit set means the transition is acknowledged
    pub acknowledged_transitions: EventEnable,
}

/// Outcome of a positional scan over a store
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanResult<T> {
    /// Index is past the last object
    EndOfList,
    /// Object exists but has nothing to report
    Skipped,
    /// Object has something to report
    Found(T),
}

impl<T> ScanResult<T> {
    /// Status in the -1 (end of list), 0 (nothing), 1 (found) convention
    pub fn status(&self) -> i8 {
        match self {
            ScanResult::EndOfList => -1,
            ScanResult::Skipped => 0,
            ScanResult::Found(_) => 1,
        }
    }

    /// Reported data, if any
    pub fn found(self) -> Option<T> {
        match self {
            ScanResult::Found(value) => Some(value),
            _ => None,
        }
    }
}

/// One property/value pair of a COV notification
#[derive(Debug, Clone, PartialEq)]
pub struct CovValue {
    pub property_identifier: PropertyIdentifier,
    pub value: PropertyValue,
}

/// Routes event notifications to their recipients
pub trait NotificationRouter {
    /// Fill in priority and ack-required, then deliver the notification
    fn report(&mut self, notification: &mut EventNotification);

    /// Priorities of a class for to-offnormal, to-fault and to-normal
    fn priorities(&self, notification_class: u32) -> [u8; 3];
}

/// Configuration of one notification class
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NotificationClassConfig {
    /// Priorities for to-offnormal, to-fault and to-normal
    pub priorities: [u8; 3],
    /// Transitions that require an acknowledgment
    pub ack_required: EventEnable,
}

impl Default for NotificationClassConfig {
    fn default() -> Self {
        Self {
            priorities: [255; 3],
            ack_required: EventEnable::empty(),
        }
    }
}

/// In-process notification class table with an outbox
#[derive(Debug, Clone, Default)]
pub struct NotificationClasses {
    classes: HashMap<u32, NotificationClassConfig>,
    outbox: VecDeque<EventNotification>,
}

impl NotificationClasses {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style class registration
    pub fn with_class(mut self, notification_class: u32, config: NotificationClassConfig) -> Self {
        self.set_class(notification_class, config);
        self
    }

    /// Add or replace a class
    pub fn set_class(&mut self, notification_class: u32, config: NotificationClassConfig) {
        self.classes.insert(notification_class, config);
    }

    /// Configuration of a class
    pub fn class(&self, notification_class: u32) -> Option<&NotificationClassConfig> {
        self.classes.get(&notification_class)
    }

    /// Number of notifications waiting for delivery
    pub fn pending(&self) -> usize {
        self.outbox.len()
    }

    /// Take every queued notification, oldest first
    pub fn drain(&mut self) -> Vec<EventNotification> {
        self.outbox.drain(..).collect()
    }
}

impl NotificationRouter for NotificationClasses {
    fn report(&mut self, notification: &mut EventNotification) {
        let Some(config) = self.classes.get(&notification.notification_class) else {
            debug!(
                "{}: notification class {} not configured, notification dropped",
                notification.event_object_identifier, notification.notification_class
            );
            return;
        };

        let transition = EventTransition::for_state(notification.to_state);
        notification.priority = config.priorities[transition as usize];
        notification.ack_required = notification.notify_type != NotifyType::AckNotification
            && config.ack_required.contains(transition.flag());

        self.outbox.push_back(notification.clone());
    }

    fn priorities(&self, notification_class: u32) -> [u8; 3] {
        self.classes
            .get(&notification_class)
            .map(|config| config.priorities)
            .unwrap_or(NotificationClassConfig::default().priorities)
    }
}
