//! Intrinsic Reporting
//!
//! Out-of-range event detection for analog inputs, as defined by the
//! OUT_OF_RANGE event algorithm of ASHRAE 135 clause 13.3.6.
//!
//! # Overview
//!
//! An [`IntrinsicReporting`] block holds the alarm configuration and the
//! alarm state of one object:
//!
//! - Limits, deadband and the limit/event enable masks
//! - The current event state and the time-delay countdown
//! - Acknowledgment state and time stamp per transition kind
//! - A queued acknowledgment notification
//!
//! The block evaluates one poll cycle at a time. A state change commits only
//! after the condition has held on `time_delay` consecutive cycles. Building
//! and routing the resulting notification is left to the owning store, which
//! knows the object identifier and the device.

use core::cmp::Ordering;

use bitflags::bitflags;

use crate::object::{bool_slice_to_flags, flags_to_bool_vec, BacnetDateTime, ObjectError, Result};
use crate::service::TimeStamp;

/// Notification class meaning "not connected to any class"
pub const UNCONNECTED_NOTIFICATION_CLASS: u32 = 4_194_303;

/// Event state enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u32)]
pub enum EventState {
    #[default]
    Normal = 0,
    Fault = 1,
    Offnormal = 2,
    HighLimit = 3,
    LowLimit = 4,
    LifeSafetyAlarm = 5,
}

impl EventState {
    /// True for every state other than normal
    pub fn is_off_normal(self) -> bool {
        self != EventState::Normal
    }
}

impl TryFrom<u32> for EventState {
    type Error = ObjectError;

    fn try_from(value: u32) -> Result<Self> {
        match value {
            0 => Ok(EventState::Normal),
            1 => Ok(EventState::Fault),
            2 => Ok(EventState::Offnormal),
            3 => Ok(EventState::HighLimit),
            4 => Ok(EventState::LowLimit),
            5 => Ok(EventState::LifeSafetyAlarm),
            _ => Err(ObjectError::ValueOutOfRange),
        }
    }
}

/// Notify type enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u32)]
pub enum NotifyType {
    #[default]
    Alarm = 0,
    Event = 1,
    /// Only used on notifications, never stored on an object
    AckNotification = 2,
}

impl TryFrom<u32> for NotifyType {
    type Error = ObjectError;

    /// Only alarm and event can be configured on an object
    fn try_from(value: u32) -> Result<Self> {
        match value {
            0 => Ok(NotifyType::Alarm),
            1 => Ok(NotifyType::Event),
            _ => Err(ObjectError::ValueOutOfRange),
        }
    }
}

bitflags! {
    /// Limit_Enable bit string
    #[derive(Debug, Clone, Copy, Default, Eq, PartialEq)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    pub struct LimitEnable: u8 {
        const LOW_LIMIT = 1 << 0;
        const HIGH_LIMIT = 1 << 1;
    }
}

impl LimitEnable {
    /// Number of bits on the wire
    pub const BITS: usize = 2;

    pub fn to_bool_vec(&self) -> Vec<bool> {
        flags_to_bool_vec(self.bits() as u32, Self::BITS)
    }

    /// Parse a bit string, which must have exactly two bits
    pub fn from_bit_string(bits: &[bool]) -> Result<Self> {
        if bits.len() != Self::BITS {
            return Err(ObjectError::ValueOutOfRange);
        }
        Ok(Self::from_bits_truncate(bool_slice_to_flags(bits) as u8))
    }
}

bitflags! {
    /// Event transition bits, used by Event_Enable, Acked_Transitions and the
    /// ack-required mask of a notification class
    #[derive(Debug, Clone, Copy, Default, Eq, PartialEq)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    pub struct EventEnable: u8 {
        const TO_OFFNORMAL = 1 << 0;
        const TO_FAULT = 1 << 1;
        const TO_NORMAL = 1 << 2;
    }
}

impl EventEnable {
    /// Number of bits on the wire
    pub const BITS: usize = 3;

    pub fn to_bool_vec(&self) -> Vec<bool> {
        flags_to_bool_vec(self.bits() as u32, Self::BITS)
    }

    /// Parse a bit string, which must have exactly three bits
    pub fn from_bit_string(bits: &[bool]) -> Result<Self> {
        if bits.len() != Self::BITS {
            return Err(ObjectError::ValueOutOfRange);
        }
        Ok(Self::from_bits_truncate(bool_slice_to_flags(bits) as u8))
    }
}

/// Transition kinds, in the order of the event-transition bit string
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(usize)]
pub enum EventTransition {
    ToOffnormal = 0,
    ToFault = 1,
    ToNormal = 2,
}

impl EventTransition {
    /// Transition that ends in the given state
    pub fn for_state(to_state: EventState) -> Self {
        match to_state {
            EventState::Normal => EventTransition::ToNormal,
            EventState::Fault => EventTransition::ToFault,
            _ => EventTransition::ToOffnormal,
        }
    }

    /// Bit of this transition in an [`EventEnable`] mask
    pub fn flag(self) -> EventEnable {
        match self {
            EventTransition::ToOffnormal => EventEnable::TO_OFFNORMAL,
            EventTransition::ToFault => EventEnable::TO_FAULT,
            EventTransition::ToNormal => EventEnable::TO_NORMAL,
        }
    }
}

/// Acknowledgment state of one transition kind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AckedTransition {
    /// False while an acknowledgment is outstanding
    pub acked: bool,
    /// Time stamp of the transition that needs the acknowledgment
    pub time_stamp: BacnetDateTime,
}

impl Default for AckedTransition {
    fn default() -> Self {
        Self {
            acked: true,
            time_stamp: BacnetDateTime::unspecified(),
        }
    }
}

/// Initial alarm configuration of an object
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct IntrinsicConfig {
    /// Poll cycles a condition must hold before the state changes
    pub time_delay: u32,
    pub notification_class: u32,
    pub high_limit: f32,
    pub low_limit: f32,
    pub deadband: f32,
    pub limit_enable: LimitEnable,
    pub event_enable: EventEnable,
    pub notify_type: NotifyType,
}

impl Default for IntrinsicConfig {
    fn default() -> Self {
        Self {
            time_delay: 0,
            notification_class: UNCONNECTED_NOTIFICATION_CLASS,
            high_limit: 0.0,
            low_limit: 0.0,
            deadband: 0.0,
            limit_enable: LimitEnable::empty(),
            event_enable: EventEnable::empty(),
            notify_type: NotifyType::Alarm,
        }
    }
}

impl IntrinsicConfig {
    pub fn with_limits(mut self, low_limit: f32, high_limit: f32, deadband: f32) -> Self {
        self.low_limit = low_limit;
        self.high_limit = high_limit;
        self.deadband = deadband;
        self
    }

    pub fn with_enables(mut self, limit_enable: LimitEnable, event_enable: EventEnable) -> Self {
        self.limit_enable = limit_enable;
        self.event_enable = event_enable;
        self
    }

    pub fn with_time_delay(mut self, time_delay: u32) -> Self {
        self.time_delay = time_delay;
        self
    }

    pub fn with_notification_class(mut self, notification_class: u32) -> Self {
        self.notification_class = notification_class;
        self
    }

    pub fn with_notify_type(mut self, notify_type: NotifyType) -> Self {
        self.notify_type = notify_type;
        self
    }
}

/// A committed event-state change
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StateChange {
    pub from: EventState,
    pub to: EventState,
    /// Limit the present value crossed
    pub exceeded_limit: f32,
    pub message: &'static str,
}

/// Alarm configuration and state of one object
#[derive(Debug, Clone, PartialEq)]
pub struct IntrinsicReporting {
    pub event_state: EventState,
    pub high_limit: f32,
    pub low_limit: f32,
    pub deadband: f32,
    pub limit_enable: LimitEnable,
    pub event_enable: EventEnable,
    pub notify_type: NotifyType,
    pub notification_class: u32,
    /// Indexed by [`EventTransition`]
    pub acked_transitions: [AckedTransition; 3],
    /// Indexed by [`EventTransition`]
    pub event_time_stamps: [BacnetDateTime; 3],
    time_delay: u32,
    remaining_time_delay: u32,
    pending_ack: Option<EventState>,
}

impl IntrinsicReporting {
    pub fn new(config: &IntrinsicConfig) -> Self {
        Self {
            event_state: EventState::Normal,
            high_limit: config.high_limit,
            low_limit: config.low_limit,
            deadband: config.deadband,
            limit_enable: config.limit_enable,
            event_enable: config.event_enable,
            notify_type: config.notify_type,
            notification_class: config.notification_class,
            acked_transitions: [AckedTransition::default(); 3],
            event_time_stamps: [BacnetDateTime::unspecified(); 3],
            time_delay: config.time_delay,
            remaining_time_delay: config.time_delay,
            pending_ack: None,
        }
    }

    pub fn time_delay(&self) -> u32 {
        self.time_delay
    }

    /// Poll cycles left before a pending condition commits
    pub fn remaining_time_delay(&self) -> u32 {
        self.remaining_time_delay
    }

    /// Change the time delay and restart the countdown
    pub fn set_time_delay(&mut self, time_delay: u32) {
        self.time_delay = time_delay;
        self.remaining_time_delay = time_delay;
    }

    /// State whose acknowledgment still has to be announced
    pub fn pending_ack(&self) -> Option<EventState> {
        self.pending_ack
    }

    pub(crate) fn take_pending_ack(&mut self) -> Option<EventState> {
        self.pending_ack.take()
    }

    /// Acked_Transitions as a bit mask, set bits are acknowledged
    pub fn acked_bits(&self) -> EventEnable {
        [
            EventTransition::ToOffnormal,
            EventTransition::ToFault,
            EventTransition::ToNormal,
        ]
        .into_iter()
        .filter(|&t| self.acked_transitions[t as usize].acked)
        .fold(EventEnable::empty(), |acc, t| acc | t.flag())
    }

    /// True when every transition is acknowledged
    pub fn fully_acked(&self) -> bool {
        self.acked_transitions.iter().all(|t| t.acked)
    }

    /// State the present value asks for, if the current state has to change
    fn target_state(&self, present_value: f32) -> Option<(EventState, f32, &'static str)> {
        let high_enabled = self.limit_enable.contains(LimitEnable::HIGH_LIMIT);
        let low_enabled = self.limit_enable.contains(LimitEnable::LOW_LIMIT);

        match self.event_state {
            EventState::Normal if self.event_enable.contains(EventEnable::TO_OFFNORMAL) => {
                if high_enabled && present_value > self.high_limit {
                    Some((EventState::HighLimit, self.high_limit, "Goes to high limit"))
                } else if low_enabled && present_value < self.low_limit {
                    Some((EventState::LowLimit, self.low_limit, "Goes to low limit"))
                } else {
                    None
                }
            }
            EventState::HighLimit
                if high_enabled
                    && self.event_enable.contains(EventEnable::TO_NORMAL)
                    && present_value < self.high_limit - self.deadband =>
            {
                Some((
                    EventState::Normal,
                    self.high_limit,
                    "Back to normal state from high limit",
                ))
            }
            EventState::LowLimit
                if low_enabled
                    && self.event_enable.contains(EventEnable::TO_NORMAL)
                    && present_value > self.low_limit + self.deadband =>
            {
                Some((
                    EventState::Normal,
                    self.low_limit,
                    "Back to normal state from low limit",
                ))
            }
            _ => None,
        }
    }

    /// Run one poll cycle of the out-of-range algorithm
    ///
    /// Returns the committed change, if any. The countdown restarts whenever
    /// the condition does not hold and after every commit. Fault and the other
    /// states outside the algorithm are left alone.
    pub fn evaluate(&mut self, present_value: f32) -> Option<StateChange> {
        if !matches!(
            self.event_state,
            EventState::Normal | EventState::HighLimit | EventState::LowLimit
        ) {
            return None;
        }

        let Some((to, exceeded_limit, message)) = self.target_state(present_value) else {
            self.remaining_time_delay = self.time_delay;
            return None;
        };

        self.remaining_time_delay = self.remaining_time_delay.saturating_sub(1);
        if self.remaining_time_delay > 0 {
            return None;
        }

        let from = self.event_state;
        self.event_state = to;
        self.remaining_time_delay = self.time_delay;

        Some(StateChange {
            from,
            to,
            exceeded_limit,
            message,
        })
    }

    /// Store the time stamp of a committed transition
    pub(crate) fn record_transition(
        &mut self,
        to: EventState,
        time_stamp: BacnetDateTime,
        ack_required: bool,
    ) {
        let transition = EventTransition::for_state(to) as usize;
        self.event_time_stamps[transition] = time_stamp;
        if ack_required {
            self.acked_transitions[transition] = AckedTransition {
                acked: false,
                time_stamp,
            };
        }
    }

    /// Apply an AcknowledgeAlarm request
    ///
    /// On success an ack notification is queued for the next poll cycle.
    pub fn acknowledge(&mut self, state_acked: EventState, event_time_stamp: &TimeStamp) -> Result<()> {
        let transition = match state_acked {
            EventState::Offnormal | EventState::HighLimit | EventState::LowLimit => {
                EventTransition::ToOffnormal
            }
            EventState::Fault => EventTransition::ToFault,
            EventState::Normal => EventTransition::ToNormal,
            EventState::LifeSafetyAlarm => return Err(ObjectError::InvalidEventState),
        };

        let slot = &mut self.acked_transitions[transition as usize];
        if !slot.acked {
            let TimeStamp::DateTime(acked_stamp) = event_time_stamp else {
                return Err(ObjectError::InvalidTimeStamp);
            };
            if acked_stamp.compare(&slot.time_stamp) == Ordering::Less {
                return Err(ObjectError::InvalidTimeStamp);
            }
            slot.acked = true;
        } else if state_acked != self.event_state {
            return Err(ObjectError::InvalidEventState);
        }

        self.pending_ack = Some(state_acked);
        Ok(())
    }
}
