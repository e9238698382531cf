//! Analog Input Object Type Implementation
//!
//! This module implements the Analog Input object type as defined in ASHRAE 135
//! clause 12.2, including intrinsic out-of-range reporting.
//!
//! # Overview
//!
//! [`AnalogInputs`] owns every Analog Input of a device, keyed and ordered by
//! instance number. A poller feeds measured values through
//! [`AnalogInputs::set_present_value`] and then runs
//! [`AnalogInputs::intrinsic_reporting`] once per cycle. A request dispatcher
//! reaches the objects through the [`ObjectStore`] trait.
//!
//! # Example
//!
//! ```
//! use bacnet_objects::object::{AnalogInputs, Device, ObjectStore};
//! use chrono::Utc;
//!
//! let mut device = Device::new(1, "Plant Controller");
//! let mut inputs = AnalogInputs::new();
//! assert!(inputs.create(3, &mut device));
//! inputs.set_present_value(3, 21.5, Utc::now());
//! assert_eq!(inputs.present_value(3), Some(21.5));
//! assert!(inputs.change_of_value(3));
//! ```

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use log::{debug, info, trace, warn};

use crate::encoding::{
    decode_application_data, encode_bit_string, encode_boolean, encode_character_string,
    encode_closing_tag, encode_date, encode_enumerated, encode_object_identifier,
    encode_object_type, encode_opening_tag, encode_real, encode_time, encode_unsigned,
};
use crate::object::intrinsic::{EventTransition, IntrinsicConfig, IntrinsicReporting, NotifyType};
use crate::object::property_identifier::{PROP_LAST_RX_DATE, PROP_LAST_RX_TIME};
use crate::object::{
    append_array_element, assign_object_name, BacnetDateTime, DeviceContext, EngineeringUnits,
    EventEnable, EventState, LimitEnable, ObjectError, ObjectIdentifier, ObjectStore, ObjectType,
    PropertyIdentifier, PropertyLists, PropertyValue, Reliability, Result, StatusFlags,
};
use crate::service::{
    AlarmAckRequest, AlarmSummary, CovValue, EventInformation, EventNotification, EventType,
    NotificationRouter, OutOfRangeValues, ReadPropertyRequest, ScanResult, TimeStamp,
    WritePropertyRequest,
};
use crate::util::{is_valid_instance_number, payload_hex};

/// Properties that only exist while intrinsic reporting is enabled
const INTRINSIC_PROPERTIES: [PropertyIdentifier; 10] = [
    PropertyIdentifier::TimeDelay,
    PropertyIdentifier::NotificationClass,
    PropertyIdentifier::HighLimit,
    PropertyIdentifier::LowLimit,
    PropertyIdentifier::Deadband,
    PropertyIdentifier::LimitEnable,
    PropertyIdentifier::EventEnable,
    PropertyIdentifier::AckedTransitions,
    PropertyIdentifier::NotifyType,
    PropertyIdentifier::EventTimeStamps,
];

/// Number of elements of the Event_Time_Stamps array
const EVENT_TIME_STAMPS_LEN: u32 = 3;

/// Context tag of the date-time choice of BACnetTimeStamp
const TIME_STAMP_DATETIME: u8 = 2;

/// Settings applied to every Analog Input a store creates
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AnalogInputConfig {
    /// Present value before the first update
    pub present_value: f32,
    pub units: EngineeringUnits,
    pub cov_increment: f32,
    /// Give new objects an intrinsic reporting block
    pub intrinsic_reporting: bool,
    /// Initial alarm configuration
    pub intrinsic: IntrinsicConfig,
}

impl Default for AnalogInputConfig {
    fn default() -> Self {
        Self {
            present_value: 12.0,
            units: EngineeringUnits::NoUnits,
            cov_increment: 0.0,
            intrinsic_reporting: true,
            intrinsic: IntrinsicConfig::default(),
        }
    }
}

impl AnalogInputConfig {
    pub fn with_units(mut self, units: EngineeringUnits) -> Self {
        self.units = units;
        self
    }

    pub fn with_cov_increment(mut self, cov_increment: f32) -> Self {
        self.cov_increment = cov_increment;
        self
    }

    /// Enable intrinsic reporting with the given initial configuration
    pub fn with_intrinsic(mut self, intrinsic: IntrinsicConfig) -> Self {
        self.intrinsic_reporting = true;
        self.intrinsic = intrinsic;
        self
    }

    /// Create objects without intrinsic reporting
    pub fn without_intrinsic(mut self) -> Self {
        self.intrinsic_reporting = false;
        self
    }
}

/// Analog Input object
#[derive(Debug, Clone, PartialEq)]
pub struct AnalogInput {
    /// Object identifier
    pub identifier: ObjectIdentifier,
    /// Object name, unique within the device
    pub object_name: Option<String>,
    /// Present value
    pub present_value: f32,
    /// Value of the last reported change
    pub prior_value: f32,
    /// COV increment
    pub cov_increment: f32,
    /// Set when a change worth a COV notification happened
    pub changed: bool,
    /// Out of service
    pub out_of_service: bool,
    /// Units
    pub units: EngineeringUnits,
    /// Reliability
    pub reliability: Reliability,
    /// Time of the last present-value update
    pub last_rx: Option<BacnetDateTime>,
    /// Alarm configuration and state
    pub intrinsic: Option<IntrinsicReporting>,
}

impl AnalogInput {
    /// Create a new Analog Input object
    pub fn new(instance: u32, config: &AnalogInputConfig) -> Self {
        Self {
            identifier: ObjectIdentifier::new(ObjectType::AnalogInput, instance),
            object_name: None,
            present_value: config.present_value,
            prior_value: 0.0,
            cov_increment: config.cov_increment,
            changed: false,
            out_of_service: false,
            units: config.units,
            reliability: Reliability::NoFaultDetected,
            last_rx: None,
            intrinsic: config
                .intrinsic_reporting
                .then(|| IntrinsicReporting::new(&config.intrinsic)),
        }
    }

    /// Event state, normal when intrinsic reporting is off
    pub fn event_state(&self) -> EventState {
        self.intrinsic
            .as_ref()
            .map_or(EventState::Normal, |intrinsic| intrinsic.event_state)
    }

    /// Current status flags
    pub fn status_flags(&self) -> StatusFlags {
        let mut flags = StatusFlags::empty();
        flags.set(StatusFlags::IN_ALARM, self.event_state() != EventState::Normal);
        flags.set(StatusFlags::OUT_OF_SERVICE, self.out_of_service);
        flags
    }

    /// Flag a change when the value moved at least one COV increment
    fn detect_cov(&mut self, value: f32) {
        if (value - self.prior_value).abs() >= self.cov_increment {
            self.changed = true;
            self.prior_value = value;
        }
    }

    fn update_present_value(&mut self, value: f32, rx_time: &DateTime<Utc>) {
        self.detect_cov(value);
        self.present_value = value;
        self.last_rx = Some(BacnetDateTime::from_utc(rx_time));
    }

    fn update_cov_increment(&mut self, cov_increment: f32) {
        self.cov_increment = cov_increment;
        self.detect_cov(self.present_value);
    }

    fn update_out_of_service(&mut self, out_of_service: bool) {
        if self.out_of_service != out_of_service {
            self.changed = true;
        }
        self.out_of_service = out_of_service;
    }

    fn property_lists(&self) -> PropertyLists {
        let mut optional = vec![
            PropertyIdentifier::Description,
            PropertyIdentifier::Reliability,
            PropertyIdentifier::CovIncrement,
        ];
        if self.intrinsic.is_some() {
            optional.extend_from_slice(&INTRINSIC_PROPERTIES);
        }

        PropertyLists {
            required: vec![
                PropertyIdentifier::ObjectIdentifier,
                PropertyIdentifier::ObjectName,
                PropertyIdentifier::ObjectType,
                PropertyIdentifier::PresentValue,
                PropertyIdentifier::StatusFlags,
                PropertyIdentifier::EventState,
                PropertyIdentifier::OutOfService,
                PropertyIdentifier::Units,
            ],
            optional,
            proprietary: vec![
                PropertyIdentifier::last_rx_time(),
                PropertyIdentifier::last_rx_date(),
            ],
        }
    }
}

/// All Analog Input objects of a device
#[derive(Debug, Clone, Default)]
pub struct AnalogInputs {
    objects: BTreeMap<u32, AnalogInput>,
    config: AnalogInputConfig,
}

impl AnalogInputs {
    /// Create an empty store with the default object settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty store with custom object settings
    pub fn with_config(config: AnalogInputConfig) -> Self {
        Self {
            objects: BTreeMap::new(),
            config,
        }
    }

    /// Settings applied to new objects
    pub fn config(&self) -> &AnalogInputConfig {
        &self.config
    }

    /// Create an object
    ///
    /// Fails when the instance exists or cannot be encoded.
    pub fn create(&mut self, instance: u32, device: &mut dyn DeviceContext) -> bool {
        if !is_valid_instance_number(instance) || self.objects.contains_key(&instance) {
            return false;
        }

        self.objects
            .insert(instance, AnalogInput::new(instance, &self.config));
        device.increment_database_revision();
        debug!("analog-input {} created", instance);
        true
    }

    /// Delete an object and release its name
    pub fn delete(&mut self, instance: u32, device: &mut dyn DeviceContext) -> bool {
        let Some(object) = self.objects.remove(&instance) else {
            return false;
        };

        device.unregister_object_name(object.identifier);
        device.increment_database_revision();
        debug!("analog-input {} deleted", instance);
        true
    }

    /// Delete every object
    pub fn clear(&mut self, device: &mut dyn DeviceContext) {
        let instances: Vec<u32> = self.objects.keys().copied().collect();
        for instance in instances {
            self.delete(instance, device);
        }
    }

    pub fn get(&self, instance: u32) -> Option<&AnalogInput> {
        self.objects.get(&instance)
    }

    pub fn get_mut(&mut self, instance: u32) -> Option<&mut AnalogInput> {
        self.objects.get_mut(&instance)
    }

    /// Rename an object
    ///
    /// Fails for an empty name or a name another object owns.
    pub fn set_object_name(
        &mut self,
        instance: u32,
        name: &str,
        device: &mut dyn DeviceContext,
    ) -> bool {
        let Some(object) = self.objects.get_mut(&instance) else {
            return false;
        };
        assign_object_name(&mut object.object_name, object.identifier, name, device).is_ok()
    }

    pub fn present_value(&self, instance: u32) -> Option<f32> {
        self.get(instance).map(|object| object.present_value)
    }

    /// Store a new measurement
    ///
    /// Runs change-of-value detection and records the receive time.
    pub fn set_present_value(&mut self, instance: u32, value: f32, rx_time: DateTime<Utc>) -> bool {
        let Some(object) = self.get_mut(instance) else {
            return false;
        };
        object.update_present_value(value, &rx_time);
        true
    }

    pub fn change_of_value(&self, instance: u32) -> bool {
        self.get(instance).is_some_and(|object| object.changed)
    }

    pub fn change_of_value_clear(&mut self, instance: u32) {
        if let Some(object) = self.get_mut(instance) {
            object.changed = false;
        }
    }

    /// Values carried by a COV notification: present value and status flags
    pub fn cov_value_list(&self, instance: u32) -> Option<Vec<CovValue>> {
        let object = self.get(instance)?;
        Some(vec![
            CovValue {
                property_identifier: PropertyIdentifier::PresentValue,
                value: PropertyValue::Real(object.present_value),
            },
            CovValue {
                property_identifier: PropertyIdentifier::StatusFlags,
                value: PropertyValue::BitString(object.status_flags().to_bool_vec()),
            },
        ])
    }

    pub fn cov_increment(&self, instance: u32) -> Option<f32> {
        self.get(instance).map(|object| object.cov_increment)
    }

    /// Change the COV increment and re-check the current value against it
    pub fn set_cov_increment(&mut self, instance: u32, cov_increment: f32) {
        if let Some(object) = self.get_mut(instance) {
            object.update_cov_increment(cov_increment);
        }
    }

    pub fn out_of_service(&self, instance: u32) -> Option<bool> {
        self.get(instance).map(|object| object.out_of_service)
    }

    pub fn set_out_of_service(&mut self, instance: u32, out_of_service: bool) {
        if let Some(object) = self.get_mut(instance) {
            object.update_out_of_service(out_of_service);
        }
    }

    pub fn set_units(&mut self, instance: u32, units: EngineeringUnits) -> bool {
        let Some(object) = self.get_mut(instance) else {
            return false;
        };
        object.units = units;
        true
    }

    pub fn set_reliability(&mut self, instance: u32, reliability: Reliability) -> bool {
        let Some(object) = self.get_mut(instance) else {
            return false;
        };
        object.reliability = reliability;
        true
    }

    pub fn event_state(&self, instance: u32) -> Option<EventState> {
        self.get(instance).map(AnalogInput::event_state)
    }

    /// Run one cycle of intrinsic reporting for an object
    ///
    /// A queued acknowledgment is announced first and takes the whole cycle.
    /// Otherwise the present value is checked against the limits and a
    /// committed state change is reported through the router.
    pub fn intrinsic_reporting(
        &mut self,
        instance: u32,
        device: &dyn DeviceContext,
        router: &mut dyn NotificationRouter,
    ) {
        let Some(object) = self.objects.get_mut(&instance) else {
            return;
        };
        let identifier = object.identifier;
        let present_value = object.present_value;
        let out_of_service = object.out_of_service;
        let Some(intrinsic) = object.intrinsic.as_mut() else {
            return;
        };
        if intrinsic.limit_enable.is_empty() {
            return;
        }

        if let Some(acked_state) = intrinsic.take_pending_ack() {
            debug!("{}: sending ack notification for {:?}", identifier, acked_state);
            let transition = EventTransition::for_state(acked_state);
            let mut notification = EventNotification {
                event_object_identifier: identifier,
                time_stamp: TimeStamp::DateTime(intrinsic.event_time_stamps[transition as usize]),
                notification_class: intrinsic.notification_class,
                priority: 0,
                event_type: EventType::OutOfRange,
                message_text: Some("AckNotification".to_string()),
                notify_type: NotifyType::AckNotification,
                ack_required: false,
                from_state: None,
                to_state: acked_state,
                event_values: None,
            };
            router.report(&mut notification);
            return;
        }

        let Some(change) = intrinsic.evaluate(present_value) else {
            return;
        };

        let time_stamp = device.current_date_time();
        info!(
            "{}: event state {:?} -> {:?} at {} (value {})",
            identifier, change.from, change.to, time_stamp, present_value
        );

        let mut status_flags = StatusFlags::empty();
        status_flags.set(StatusFlags::IN_ALARM, change.to != EventState::Normal);
        status_flags.set(StatusFlags::OUT_OF_SERVICE, out_of_service);

        let mut notification = EventNotification {
            event_object_identifier: identifier,
            time_stamp: TimeStamp::DateTime(time_stamp),
            notification_class: intrinsic.notification_class,
            priority: 0,
            event_type: EventType::OutOfRange,
            message_text: Some(change.message.to_string()),
            notify_type: intrinsic.notify_type,
            ack_required: false,
            from_state: Some(change.from),
            to_state: change.to,
            event_values: Some(OutOfRangeValues {
                exceeding_value: present_value,
                status_flags,
                deadband: intrinsic.deadband,
                exceeded_limit: change.exceeded_limit,
            }),
        };
        router.report(&mut notification);

        if notification.ack_required {
            debug!("{}: ack required for {:?}", identifier, change.to);
        }
        intrinsic.record_transition(change.to, time_stamp, notification.ack_required);
    }

    /// Apply an AcknowledgeAlarm request
    pub fn alarm_ack(&mut self, request: &AlarmAckRequest) -> Result<()> {
        let identifier = request.event_object_identifier;
        let intrinsic = self
            .objects
            .get_mut(&identifier.instance)
            .and_then(|object| object.intrinsic.as_mut())
            .ok_or(ObjectError::UnknownObject)?;

        intrinsic
            .acknowledge(request.event_state_acknowledged, &request.event_time_stamp)
            .inspect_err(|err| {
                warn!(
                    "{}: acknowledgment of {:?} from {:?} rejected: {}",
                    identifier, request.event_state_acknowledged, request.acknowledgment_source, err
                )
            })
    }

    /// GetEventInformation entry of the object at a position
    pub fn event_information(
        &self,
        index: usize,
        router: &dyn NotificationRouter,
    ) -> ScanResult<EventInformation> {
        let Some(object) = self.objects.values().nth(index) else {
            return ScanResult::EndOfList;
        };
        let Some(intrinsic) = object.intrinsic.as_ref() else {
            return ScanResult::Skipped;
        };
        if intrinsic.event_state == EventState::Normal && intrinsic.fully_acked() {
            return ScanResult::Skipped;
        }

        ScanResult::Found(EventInformation {
            object_identifier: object.identifier,
            event_state: intrinsic.event_state,
            acknowledged_transitions: intrinsic.acked_bits(),
            event_time_stamps: intrinsic.event_time_stamps,
            notify_type: intrinsic.notify_type,
            event_enable: intrinsic.event_enable,
            event_priorities: router.priorities(intrinsic.notification_class),
        })
    }

    /// GetAlarmSummary entry of the object at a position
    pub fn alarm_summary(&self, index: usize) -> ScanResult<AlarmSummary> {
        let Some(object) = self.objects.values().nth(index) else {
            return ScanResult::EndOfList;
        };

        match object.intrinsic.as_ref() {
            Some(intrinsic)
                if intrinsic.event_state.is_off_normal()
                    && intrinsic.notify_type == NotifyType::Alarm =>
            {
                ScanResult::Found(AlarmSummary {
                    object_identifier: object.identifier,
                    alarm_state: intrinsic.event_state,
                    acknowledged_transitions: intrinsic.acked_bits(),
                })
            }
            _ => ScanResult::Skipped,
        }
    }
}

fn encode_time_stamp(buffer: &mut Vec<u8>, stamp: &BacnetDateTime) -> Result<()> {
    encode_opening_tag(buffer, TIME_STAMP_DATETIME)?;
    encode_date(buffer, &stamp.date)?;
    encode_time(buffer, &stamp.time)?;
    encode_closing_tag(buffer, TIME_STAMP_DATETIME)?;
    Ok(())
}

fn encode_event_time_stamps(
    buffer: &mut Vec<u8>,
    stamps: &[BacnetDateTime; 3],
    array_index: Option<u32>,
    max_apdu: usize,
) -> Result<()> {
    match array_index {
        Some(0) => encode_unsigned(buffer, EVENT_TIME_STAMPS_LEN)?,
        None => {
            for stamp in stamps {
                let mut element = Vec::new();
                encode_time_stamp(&mut element, stamp)?;
                append_array_element(buffer, &element, max_apdu)?;
            }
        }
        Some(index @ 1..=EVENT_TIME_STAMPS_LEN) => {
            encode_time_stamp(buffer, &stamps[index as usize - 1])?
        }
        Some(_) => return Err(ObjectError::InvalidArrayIndex),
    }
    Ok(())
}

fn encode_intrinsic_property(
    buffer: &mut Vec<u8>,
    intrinsic: &IntrinsicReporting,
    property: PropertyIdentifier,
    array_index: Option<u32>,
    max_apdu: usize,
) -> Result<()> {
    match property {
        PropertyIdentifier::TimeDelay => encode_unsigned(buffer, intrinsic.time_delay())?,
        PropertyIdentifier::NotificationClass => {
            encode_unsigned(buffer, intrinsic.notification_class)?
        }
        PropertyIdentifier::HighLimit => encode_real(buffer, intrinsic.high_limit)?,
        PropertyIdentifier::LowLimit => encode_real(buffer, intrinsic.low_limit)?,
        PropertyIdentifier::Deadband => encode_real(buffer, intrinsic.deadband)?,
        PropertyIdentifier::LimitEnable => {
            encode_bit_string(buffer, &intrinsic.limit_enable.to_bool_vec())?
        }
        PropertyIdentifier::EventEnable => {
            encode_bit_string(buffer, &intrinsic.event_enable.to_bool_vec())?
        }
        PropertyIdentifier::AckedTransitions => {
            encode_bit_string(buffer, &intrinsic.acked_bits().to_bool_vec())?
        }
        PropertyIdentifier::NotifyType => encode_enumerated(buffer, intrinsic.notify_type as u32)?,
        PropertyIdentifier::EventTimeStamps => encode_event_time_stamps(
            buffer,
            &intrinsic.event_time_stamps,
            array_index,
            max_apdu,
        )?,
        _ => return Err(ObjectError::UnknownProperty),
    }
    Ok(())
}

fn write_intrinsic_property(
    intrinsic: &mut IntrinsicReporting,
    property: PropertyIdentifier,
    value: &PropertyValue,
) -> Result<()> {
    match property {
        PropertyIdentifier::TimeDelay => {
            let time_delay = value.as_unsigned().ok_or(ObjectError::ValueOutOfRange)?;
            intrinsic.set_time_delay(time_delay);
        }
        PropertyIdentifier::NotificationClass => {
            intrinsic.notification_class =
                value.as_unsigned().ok_or(ObjectError::ValueOutOfRange)?;
        }
        PropertyIdentifier::HighLimit => {
            intrinsic.high_limit = value.as_real().ok_or(ObjectError::ValueOutOfRange)?;
        }
        PropertyIdentifier::LowLimit => {
            intrinsic.low_limit = value.as_real().ok_or(ObjectError::ValueOutOfRange)?;
        }
        PropertyIdentifier::Deadband => {
            intrinsic.deadband = value.as_real().ok_or(ObjectError::ValueOutOfRange)?;
        }
        PropertyIdentifier::LimitEnable => {
            let bits = value.as_bit_string().ok_or(ObjectError::ValueOutOfRange)?;
            intrinsic.limit_enable = LimitEnable::from_bit_string(bits)?;
        }
        PropertyIdentifier::EventEnable => {
            let bits = value.as_bit_string().ok_or(ObjectError::ValueOutOfRange)?;
            intrinsic.event_enable = EventEnable::from_bit_string(bits)?;
        }
        PropertyIdentifier::NotifyType => {
            let raw = value.as_enumerated().ok_or(ObjectError::ValueOutOfRange)?;
            intrinsic.notify_type = NotifyType::try_from(raw)?;
        }
        PropertyIdentifier::AckedTransitions | PropertyIdentifier::EventTimeStamps => {
            return Err(ObjectError::WriteAccessDenied)
        }
        _ => return Err(ObjectError::UnknownProperty),
    }
    Ok(())
}

fn is_last_rx_property(property: PropertyIdentifier) -> bool {
    matches!(property.id(), PROP_LAST_RX_TIME | PROP_LAST_RX_DATE)
}

impl ObjectStore for AnalogInputs {
    fn object_type(&self) -> ObjectType {
        ObjectType::AnalogInput
    }

    fn count(&self) -> usize {
        self.objects.len()
    }

    fn index_to_instance(&self, index: usize) -> Option<u32> {
        self.objects.keys().nth(index).copied()
    }

    fn instance_to_index(&self, instance: u32) -> usize {
        if self.objects.contains_key(&instance) {
            self.objects.range(..instance).count()
        } else {
            self.objects.len()
        }
    }

    fn object_name(&self, instance: u32) -> Option<String> {
        self.get(instance)?.object_name.clone()
    }

    fn property_lists(&self, instance: u32) -> Result<PropertyLists> {
        self.get(instance)
            .map(AnalogInput::property_lists)
            .ok_or(ObjectError::UnknownObject)
    }

    fn read_property(&self, request: &ReadPropertyRequest) -> Result<Vec<u8>> {
        let object = self
            .get(request.object_identifier.instance)
            .ok_or(ObjectError::UnknownObject)?;
        let property = request.property_identifier;
        let array_index = request.array_index();
        let mut buffer = Vec::new();

        match property {
            PropertyIdentifier::ObjectIdentifier => {
                encode_object_identifier(&mut buffer, object.identifier)?
            }
            PropertyIdentifier::ObjectName | PropertyIdentifier::Description => {
                encode_character_string(&mut buffer, object.object_name.as_deref().unwrap_or(""))?
            }
            PropertyIdentifier::ObjectType => encode_object_type(&mut buffer, ObjectType::AnalogInput)?,
            PropertyIdentifier::PresentValue => encode_real(&mut buffer, object.present_value)?,
            PropertyIdentifier::StatusFlags => {
                encode_bit_string(&mut buffer, &object.status_flags().to_bool_vec())?
            }
            PropertyIdentifier::EventState => {
                encode_enumerated(&mut buffer, object.event_state() as u32)?
            }
            PropertyIdentifier::Reliability => {
                encode_enumerated(&mut buffer, object.reliability as u32)?
            }
            PropertyIdentifier::OutOfService => encode_boolean(&mut buffer, object.out_of_service)?,
            PropertyIdentifier::Units => encode_enumerated(&mut buffer, u32::from(object.units))?,
            PropertyIdentifier::CovIncrement => encode_real(&mut buffer, object.cov_increment)?,
            p if INTRINSIC_PROPERTIES.contains(&p) => {
                let intrinsic = object
                    .intrinsic
                    .as_ref()
                    .ok_or(ObjectError::UnknownProperty)?;
                encode_intrinsic_property(&mut buffer, intrinsic, p, array_index, request.max_apdu)?
            }
            p if p.id() == PROP_LAST_RX_TIME => {
                let last_rx = object.last_rx.ok_or(ObjectError::ValueNotInitialized)?;
                encode_time(&mut buffer, &last_rx.time)?
            }
            p if p.id() == PROP_LAST_RX_DATE => {
                let last_rx = object.last_rx.ok_or(ObjectError::ValueNotInitialized)?;
                encode_date(&mut buffer, &last_rx.date)?
            }
            _ => return Err(ObjectError::UnknownProperty),
        }

        if array_index.is_some() && property != PropertyIdentifier::EventTimeStamps {
            return Err(ObjectError::PropertyIsNotAnArray);
        }

        trace!("{} {} -> {}", object.identifier, property, payload_hex(&buffer));
        Ok(buffer)
    }

    fn write_property(
        &mut self,
        request: &WritePropertyRequest,
        _device: &mut dyn DeviceContext,
    ) -> Result<()> {
        let (value, _) = decode_application_data(&request.property_value)
            .map_err(|_| ObjectError::ValueOutOfRange)?;
        let property = request.property_identifier;

        if request.array_index().is_some() && property != PropertyIdentifier::EventTimeStamps {
            return Err(ObjectError::PropertyIsNotAnArray);
        }

        let object = self
            .objects
            .get_mut(&request.object_identifier.instance)
            .ok_or(ObjectError::UnknownObject)?;
        trace!(
            "{} {} <- {}",
            object.identifier,
            property,
            payload_hex(&request.property_value)
        );

        match property {
            PropertyIdentifier::PresentValue => Err(ObjectError::WriteAccessDenied),
            PropertyIdentifier::OutOfService => {
                let out_of_service = value.as_boolean().ok_or(ObjectError::ValueOutOfRange)?;
                object.update_out_of_service(out_of_service);
                Ok(())
            }
            PropertyIdentifier::CovIncrement => {
                let cov_increment = value.as_real().ok_or(ObjectError::ValueOutOfRange)?;
                if cov_increment.is_nan() || cov_increment < 0.0 {
                    return Err(ObjectError::ValueOutOfRange);
                }
                object.update_cov_increment(cov_increment);
                Ok(())
            }
            PropertyIdentifier::Units => {
                let units = value.as_enumerated().ok_or(ObjectError::ValueOutOfRange)?;
                object.units = EngineeringUnits::from(units);
                Ok(())
            }
            p if INTRINSIC_PROPERTIES.contains(&p) => {
                let intrinsic = object
                    .intrinsic
                    .as_mut()
                    .ok_or(ObjectError::UnknownProperty)?;
                write_intrinsic_property(intrinsic, p, &value)
            }
            PropertyIdentifier::ObjectIdentifier
            | PropertyIdentifier::ObjectName
            | PropertyIdentifier::ObjectType
            | PropertyIdentifier::StatusFlags
            | PropertyIdentifier::EventState
            | PropertyIdentifier::Description
            | PropertyIdentifier::Reliability => Err(ObjectError::WriteAccessDenied),
            p if is_last_rx_property(p) => Err(ObjectError::WriteAccessDenied),
            _ => Err(ObjectError::UnknownProperty),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoding::{
        decode_application_data, decode_bit_string, decode_enumerated, decode_real,
        decode_unsigned, encode_application_data,
    };
    use crate::object::Device;
    use crate::service::{NotificationClassConfig, NotificationClasses};
    use chrono::TimeZone;
    use proptest::prelude::*;

    fn device() -> Device {
        Device::new(100, "Test Device").with_time(Utc.with_ymd_and_hms(2024, 5, 1, 8, 0, 0).unwrap())
    }

    fn router() -> NotificationClasses {
        NotificationClasses::new().with_class(
            4,
            NotificationClassConfig {
                priorities: [100, 150, 200],
                ack_required: EventEnable::all(),
            },
        )
    }

    fn id(instance: u32) -> ObjectIdentifier {
        ObjectIdentifier::new(ObjectType::AnalogInput, instance)
    }

    fn read(inputs: &AnalogInputs, instance: u32, property: PropertyIdentifier) -> Result<Vec<u8>> {
        inputs.read_property(&ReadPropertyRequest::new(id(instance), property))
    }

    fn write(
        inputs: &mut AnalogInputs,
        device: &mut Device,
        instance: u32,
        property: PropertyIdentifier,
        value: PropertyValue,
    ) -> Result<()> {
        let mut payload = Vec::new();
        encode_application_data(&mut payload, &value).unwrap();
        inputs.write_property(&WritePropertyRequest::new(id(instance), property, payload), device)
    }

    /// Store with instance 5 set up for high limit alarms
    fn high_limit_store(device: &mut Device) -> AnalogInputs {
        let config = AnalogInputConfig::default().with_intrinsic(
            IntrinsicConfig::default()
                .with_limits(0.0, 80.0, 5.0)
                .with_enables(
                    LimitEnable::HIGH_LIMIT,
                    EventEnable::TO_OFFNORMAL | EventEnable::TO_NORMAL,
                )
                .with_notification_class(4),
        );
        let mut inputs = AnalogInputs::with_config(config);
        assert!(inputs.create(5, device));
        inputs
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 8, 0, 0).unwrap()
    }

    #[test]
    fn test_create_and_delete() {
        let mut device = device();
        let mut inputs = AnalogInputs::new();

        assert!(inputs.create(10, &mut device));
        assert!(!inputs.create(10, &mut device));
        assert!(!inputs.create(0x40_0000, &mut device));
        assert_eq!(device.database_revision(), 1);

        let object = inputs.get(10).unwrap();
        assert_eq!(object.present_value, 12.0);
        assert_eq!(object.units, EngineeringUnits::NoUnits);
        assert!(object.intrinsic.is_some());

        assert!(inputs.set_object_name(10, "Zone Temp", &mut device));
        assert!(inputs.delete(10, &mut device));
        assert!(!inputs.delete(10, &mut device));
        assert_eq!(device.lookup_object_name("Zone Temp"), None);
        assert_eq!(device.database_revision(), 3);
    }

    #[test]
    fn test_index_instance_mapping_is_sorted() {
        let mut device = device();
        let mut inputs = AnalogInputs::new();
        for instance in [30, 10, 20] {
            inputs.create(instance, &mut device);
        }

        assert_eq!(inputs.index_to_instance(0), Some(10));
        assert_eq!(inputs.index_to_instance(2), Some(30));
        assert_eq!(inputs.index_to_instance(3), None);
        assert_eq!(inputs.instance_to_index(20), 1);
        assert_eq!(inputs.instance_to_index(25), 3);
        assert!(!inputs.valid_instance(25));

        inputs.delete(10, &mut device);
        assert_eq!(inputs.instance_to_index(20), 0);
    }

    #[test]
    fn test_object_name_uniqueness() {
        let mut device = device();
        let mut inputs = AnalogInputs::new();
        inputs.create(1, &mut device);
        inputs.create(2, &mut device);

        assert!(inputs.set_object_name(1, "Supply Temp", &mut device));
        let revision = device.database_revision();
        assert!(inputs.set_object_name(1, "Supply Temp", &mut device));
        assert_eq!(device.database_revision(), revision);

        assert!(!inputs.set_object_name(2, "Supply Temp", &mut device));
        assert!(!inputs.set_object_name(2, "Test Device", &mut device));
        assert!(!inputs.set_object_name(2, "", &mut device));
        assert_eq!(inputs.object_name(2), None);
        assert_eq!(inputs.object_name(1), Some("Supply Temp".to_string()));
    }

    #[test]
    fn test_clear_removes_everything() {
        let mut device = device();
        let mut inputs = AnalogInputs::new();
        inputs.create(1, &mut device);
        inputs.create(2, &mut device);
        inputs.set_object_name(2, "Return Temp", &mut device);

        inputs.clear(&mut device);
        assert_eq!(inputs.count(), 0);
        assert_eq!(device.lookup_object_name("Return Temp"), None);
    }

    #[test]
    fn test_change_of_value() {
        let mut device = device();
        let mut inputs = AnalogInputs::new();
        inputs.create(1, &mut device);
        inputs.set_present_value(1, 0.0, now());
        inputs.set_cov_increment(1, 1.0);
        inputs.change_of_value_clear(1);

        inputs.set_present_value(1, 0.5, now());
        assert!(!inputs.change_of_value(1));
        assert_eq!(inputs.get(1).unwrap().prior_value, 0.0);

        inputs.set_present_value(1, 1.0, now());
        assert!(inputs.change_of_value(1));
        assert_eq!(inputs.get(1).unwrap().prior_value, 1.0);

        inputs.change_of_value_clear(1);
        inputs.set_out_of_service(1, true);
        assert!(inputs.change_of_value(1));

        let values = inputs.cov_value_list(1).unwrap();
        assert_eq!(values[0].value, PropertyValue::Real(1.0));
        assert_eq!(
            values[1].value,
            PropertyValue::BitString(vec![false, false, false, true])
        );
    }

    #[test]
    fn test_cov_increment_change_rechecks_present_value() {
        let mut device = device();
        let mut inputs = AnalogInputs::new();
        inputs.create(1, &mut device);
        inputs.create(2, &mut device);

        // present value 12 against a prior value of 0
        inputs.set_cov_increment(1, 20.0);
        assert!(!inputs.change_of_value(1));
        assert_eq!(inputs.get(1).unwrap().prior_value, 0.0);

        inputs.set_cov_increment(1, 5.0);
        assert!(inputs.change_of_value(1));
        assert_eq!(inputs.get(1).unwrap().prior_value, 12.0);

        write(&mut inputs, &mut device, 2, PropertyIdentifier::CovIncrement, PropertyValue::Real(1.0)).unwrap();
        assert!(inputs.change_of_value(2));
        assert_eq!(inputs.get(2).unwrap().prior_value, 12.0);
    }

    #[test]
    fn test_present_value_round_trip() {
        let mut device = device();
        let mut inputs = AnalogInputs::new();
        inputs.create(1, &mut device);

        for value in [0.0f32, -40.25, 1.0e-7, 3.4e38, 72.123_456] {
            inputs.set_present_value(1, value, now());
            let payload = read(&inputs, 1, PropertyIdentifier::PresentValue).unwrap();
            let (decoded, _) = decode_real(&payload).unwrap();
            assert_eq!(decoded.to_bits(), value.to_bits());
        }
    }

    #[test]
    fn test_present_value_write_is_denied() {
        let mut device = device();
        let mut inputs = AnalogInputs::new();
        inputs.create(1, &mut device);

        for out_of_service in [false, true] {
            inputs.set_out_of_service(1, out_of_service);
            assert_eq!(
                write(&mut inputs, &mut device, 1, PropertyIdentifier::PresentValue, PropertyValue::Real(1.0)),
                Err(ObjectError::WriteAccessDenied)
            );
        }
    }

    #[test]
    fn test_read_errors() {
        let mut device = device();
        let mut inputs = AnalogInputs::with_config(AnalogInputConfig::default().without_intrinsic());
        inputs.create(1, &mut device);

        assert_eq!(read(&inputs, 2, PropertyIdentifier::PresentValue), Err(ObjectError::UnknownObject));
        assert_eq!(read(&inputs, 1, PropertyIdentifier::HighLimit), Err(ObjectError::UnknownProperty));
        assert_eq!(read(&inputs, 1, PropertyIdentifier::StateText), Err(ObjectError::UnknownProperty));
        assert_eq!(
            read(&inputs, 1, PropertyIdentifier::last_rx_time()),
            Err(ObjectError::ValueNotInitialized)
        );
        assert_eq!(
            inputs.read_property(&ReadPropertyRequest::with_array_index(
                id(1),
                PropertyIdentifier::PresentValue,
                1
            )),
            Err(ObjectError::PropertyIsNotAnArray)
        );

        // event state reads normal without intrinsic reporting
        let payload = read(&inputs, 1, PropertyIdentifier::EventState).unwrap();
        assert_eq!(decode_enumerated(&payload).unwrap().0, 0);
    }

    #[test]
    fn test_last_rx_properties() {
        let mut device = device();
        let mut inputs = AnalogInputs::new();
        inputs.create(1, &mut device);
        inputs.set_present_value(1, 3.0, Utc.with_ymd_and_hms(2024, 2, 29, 23, 59, 58).unwrap());

        let time = read(&inputs, 1, PropertyIdentifier::last_rx_time()).unwrap();
        assert_eq!(time, vec![0xB4, 23, 59, 58, 0]);
        let date = read(&inputs, 1, PropertyIdentifier::last_rx_date()).unwrap();
        assert_eq!(date, vec![0xA4, 124, 2, 29, 4]);
        assert_eq!(
            write(&mut inputs, &mut device, 1, PropertyIdentifier::last_rx_date(), PropertyValue::Null),
            Err(ObjectError::WriteAccessDenied)
        );
    }

    #[test]
    fn test_property_lists() {
        let mut device = device();
        let mut inputs = AnalogInputs::new();
        inputs.create(1, &mut device);
        let lists = inputs.property_lists(1).unwrap();
        assert_eq!(lists.required.len(), 8);
        assert!(lists.contains(PropertyIdentifier::EventTimeStamps));
        assert_eq!(lists.proprietary.len(), 2);

        let mut plain = AnalogInputs::with_config(AnalogInputConfig::default().without_intrinsic());
        plain.create(1, &mut device);
        assert!(!plain.property_lists(1).unwrap().contains(PropertyIdentifier::HighLimit));
        assert_eq!(plain.property_lists(2), Err(ObjectError::UnknownObject));
    }

    #[test]
    fn test_writes() {
        let mut device = device();
        let mut inputs = AnalogInputs::new();
        inputs.create(1, &mut device);

        write(&mut inputs, &mut device, 1, PropertyIdentifier::CovIncrement, PropertyValue::Real(0.5)).unwrap();
        assert_eq!(inputs.cov_increment(1), Some(0.5));
        assert_eq!(
            write(&mut inputs, &mut device, 1, PropertyIdentifier::CovIncrement, PropertyValue::Real(-1.0)),
            Err(ObjectError::ValueOutOfRange)
        );
        assert_eq!(
            write(&mut inputs, &mut device, 1, PropertyIdentifier::OutOfService, PropertyValue::Real(1.0)),
            Err(ObjectError::ValueOutOfRange)
        );

        write(&mut inputs, &mut device, 1, PropertyIdentifier::Units, PropertyValue::Enumerated(62)).unwrap();
        assert_eq!(inputs.get(1).unwrap().units, EngineeringUnits::DegreesCelsius);

        write(&mut inputs, &mut device, 1, PropertyIdentifier::TimeDelay, PropertyValue::UnsignedInteger(4)).unwrap();
        let intrinsic = inputs.get(1).unwrap().intrinsic.as_ref().unwrap();
        assert_eq!(intrinsic.time_delay(), 4);
        assert_eq!(intrinsic.remaining_time_delay(), 4);

        write(
            &mut inputs,
            &mut device,
            1,
            PropertyIdentifier::LimitEnable,
            PropertyValue::BitString(vec![true, true]),
        )
        .unwrap();
        assert_eq!(
            write(
                &mut inputs,
                &mut device,
                1,
                PropertyIdentifier::EventEnable,
                PropertyValue::BitString(vec![true, true]),
            ),
            Err(ObjectError::ValueOutOfRange)
        );
        assert_eq!(
            write(&mut inputs, &mut device, 1, PropertyIdentifier::NotifyType, PropertyValue::Enumerated(2)),
            Err(ObjectError::ValueOutOfRange)
        );
        write(&mut inputs, &mut device, 1, PropertyIdentifier::NotifyType, PropertyValue::Enumerated(1)).unwrap();

        let payload = read(&inputs, 1, PropertyIdentifier::LimitEnable).unwrap();
        assert_eq!(decode_bit_string(&payload).unwrap().0, vec![true, true]);
        let payload = read(&inputs, 1, PropertyIdentifier::NotifyType).unwrap();
        assert_eq!(decode_enumerated(&payload).unwrap().0, 1);

        for property in [
            PropertyIdentifier::ObjectName,
            PropertyIdentifier::StatusFlags,
            PropertyIdentifier::AckedTransitions,
        ] {
            assert_eq!(
                write(&mut inputs, &mut device, 1, property, PropertyValue::Null),
                Err(ObjectError::WriteAccessDenied)
            );
        }
        assert_eq!(
            write(&mut inputs, &mut device, 1, PropertyIdentifier::StateText, PropertyValue::Null),
            Err(ObjectError::UnknownProperty)
        );
        assert_eq!(
            write(&mut inputs, &mut device, 9, PropertyIdentifier::Units, PropertyValue::Enumerated(62)),
            Err(ObjectError::UnknownObject)
        );
    }

    #[test]
    fn test_write_check_order() {
        let mut device = device();
        let mut inputs = AnalogInputs::new();
        inputs.create(1, &mut device);

        // undecodable payload wins over everything else
        let garbage = WritePropertyRequest::new(id(9), PropertyIdentifier::Units, vec![0x44, 0x00]);
        assert_eq!(
            inputs.write_property(&garbage, &mut device),
            Err(ObjectError::ValueOutOfRange)
        );

        // array index is checked before the instance
        let mut payload = Vec::new();
        encode_application_data(&mut payload, &PropertyValue::Enumerated(62)).unwrap();
        let indexed = WritePropertyRequest::with_array_index(id(9), PropertyIdentifier::Units, 1, payload);
        assert_eq!(
            inputs.write_property(&indexed, &mut device),
            Err(ObjectError::PropertyIsNotAnArray)
        );
    }

    #[test]
    fn test_event_time_stamps_array() {
        let mut device = device();
        let mut inputs = AnalogInputs::new();
        inputs.create(1, &mut device);
        let base = ReadPropertyRequest::new(id(1), PropertyIdentifier::EventTimeStamps);

        let size = inputs
            .read_property(&ReadPropertyRequest::with_array_index(id(1), PropertyIdentifier::EventTimeStamps, 0))
            .unwrap();
        assert_eq!(decode_unsigned(&size).unwrap().0, 3);

        let all = inputs.read_property(&base).unwrap();
        assert_eq!(all.len(), 36);
        assert_eq!(&all[..12], &[0x2E, 0xA4, 255, 255, 255, 255, 0xB4, 255, 255, 255, 255, 0x2F]);

        let second = inputs
            .read_property(&ReadPropertyRequest::with_array_index(id(1), PropertyIdentifier::EventTimeStamps, 2))
            .unwrap();
        assert_eq!(second.len(), 12);

        assert_eq!(
            inputs.read_property(&ReadPropertyRequest::with_array_index(id(1), PropertyIdentifier::EventTimeStamps, 4)),
            Err(ObjectError::InvalidArrayIndex)
        );
        assert_eq!(
            inputs.read_property(&base.clone().with_max_apdu(36)),
            Err(ObjectError::AbortSegmentationNotSupported)
        );
        assert!(inputs.read_property(&base.with_max_apdu(37)).is_ok());
    }

    #[test]
    fn test_high_limit_scenario() {
        let mut device = device();
        let mut router = router();
        let mut inputs = high_limit_store(&mut device);

        inputs.set_present_value(5, 90.0, now());
        inputs.intrinsic_reporting(5, &device, &mut router);
        assert_eq!(inputs.event_state(5), Some(EventState::HighLimit));

        let status = read(&inputs, 5, PropertyIdentifier::StatusFlags).unwrap();
        assert_eq!(decode_bit_string(&status).unwrap().0, vec![true, false, false, false]);

        inputs.set_present_value(5, 74.0, now());
        inputs.intrinsic_reporting(5, &device, &mut router);
        let payload = read(&inputs, 5, PropertyIdentifier::EventState).unwrap();
        assert_eq!(
            decode_application_data(&payload).unwrap().0,
            PropertyValue::Enumerated(EventState::Normal as u32)
        );

        let sent = router.drain();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0].from_state, Some(EventState::Normal));
        assert_eq!(sent[0].to_state, EventState::HighLimit);
        assert_eq!(sent[0].message_text.as_deref(), Some("Goes to high limit"));
        assert_eq!(sent[0].priority, 100);
        assert!(sent[0].ack_required);
        let values = sent[0].event_values.unwrap();
        assert_eq!(values.exceeding_value, 90.0);
        assert_eq!(values.exceeded_limit, 80.0);
        assert_eq!(values.deadband, 5.0);
        assert!(values.status_flags.contains(StatusFlags::IN_ALARM));

        assert_eq!(sent[1].to_state, EventState::Normal);
        assert_eq!(
            sent[1].message_text.as_deref(),
            Some("Back to normal state from high limit")
        );
        assert_eq!(sent[1].priority, 200);
    }

    #[test]
    fn test_debounce_with_interruption() {
        let mut device = device();
        let mut router = router();
        let mut inputs = high_limit_store(&mut device);
        inputs.get_mut(5).unwrap().intrinsic.as_mut().unwrap().set_time_delay(3);

        let mut cycle = |inputs: &mut AnalogInputs, value: f32| {
            inputs.set_present_value(5, value, now());
            inputs.intrinsic_reporting(5, &device, &mut router);
            inputs.event_state(5).unwrap()
        };

        assert_eq!(cycle(&mut inputs, 95.0), EventState::Normal);
        // disqualifying value at step 2
        assert_eq!(cycle(&mut inputs, 50.0), EventState::Normal);
        assert_eq!(cycle(&mut inputs, 95.0), EventState::Normal);
        assert_eq!(cycle(&mut inputs, 95.0), EventState::Normal);
        assert_eq!(cycle(&mut inputs, 95.0), EventState::HighLimit);
    }

    #[test]
    fn test_transition_records_time_stamp_and_ack_state() {
        let mut device = device();
        let mut router = router();
        let mut inputs = high_limit_store(&mut device);

        inputs.set_present_value(5, 90.0, now());
        inputs.intrinsic_reporting(5, &device, &mut router);

        let intrinsic = inputs.get(5).unwrap().intrinsic.as_ref().unwrap();
        let expected = BacnetDateTime::from_utc(&now());
        assert_eq!(intrinsic.event_time_stamps[EventTransition::ToOffnormal as usize], expected);
        assert!(!intrinsic.acked_transitions[EventTransition::ToOffnormal as usize].acked);

        let acked = read(&inputs, 5, PropertyIdentifier::AckedTransitions).unwrap();
        assert_eq!(decode_bit_string(&acked).unwrap().0, vec![false, true, true]);
    }

    #[test]
    fn test_alarm_ack_with_earlier_time_stamp() {
        let mut device = device();
        let mut router = router();
        let mut inputs = high_limit_store(&mut device);
        inputs.set_present_value(5, 90.0, now());
        inputs.intrinsic_reporting(5, &device, &mut router);

        let earlier = BacnetDateTime::from_utc(&Utc.with_ymd_and_hms(2024, 5, 1, 7, 59, 59).unwrap());
        let request = AlarmAckRequest {
            acknowledging_process_identifier: 1,
            event_object_identifier: id(5),
            event_state_acknowledged: EventState::HighLimit,
            event_time_stamp: TimeStamp::DateTime(earlier),
            acknowledgment_source: "operator".to_string(),
            time_of_acknowledgment: TimeStamp::DateTime(earlier),
        };

        assert_eq!(inputs.alarm_ack(&request), Err(ObjectError::InvalidTimeStamp));
        let intrinsic = inputs.get(5).unwrap().intrinsic.as_ref().unwrap();
        assert!(!intrinsic.acked_transitions[EventTransition::ToOffnormal as usize].acked);
        assert_eq!(intrinsic.pending_ack(), None);
    }

    #[test]
    fn test_ack_flush_suppresses_evaluation() {
        let mut device = device();
        let mut router = router();
        let mut inputs = high_limit_store(&mut device);
        inputs.set_present_value(5, 90.0, now());
        inputs.intrinsic_reporting(5, &device, &mut router);
        router.drain();

        let request = AlarmAckRequest {
            acknowledging_process_identifier: 1,
            event_object_identifier: id(5),
            event_state_acknowledged: EventState::HighLimit,
            event_time_stamp: TimeStamp::DateTime(BacnetDateTime::from_utc(&now())),
            acknowledgment_source: "operator".to_string(),
            time_of_acknowledgment: TimeStamp::DateTime(BacnetDateTime::from_utc(&now())),
        };
        inputs.alarm_ack(&request).unwrap();

        // back in range, but this cycle only announces the acknowledgment
        inputs.set_present_value(5, 10.0, now());
        inputs.intrinsic_reporting(5, &device, &mut router);
        let sent = router.drain();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].notify_type, NotifyType::AckNotification);
        assert_eq!(sent[0].message_text.as_deref(), Some("AckNotification"));
        assert_eq!(sent[0].to_state, EventState::HighLimit);
        assert_eq!(sent[0].from_state, None);
        assert_eq!(sent[0].event_values, None);
        assert!(!sent[0].ack_required);
        assert_eq!(inputs.event_state(5), Some(EventState::HighLimit));

        inputs.intrinsic_reporting(5, &device, &mut router);
        assert_eq!(inputs.event_state(5), Some(EventState::Normal));
    }

    #[test]
    fn test_alarm_ack_unknown_object() {
        let mut inputs = AnalogInputs::new();
        let request = AlarmAckRequest {
            acknowledging_process_identifier: 1,
            event_object_identifier: id(1),
            event_state_acknowledged: EventState::Normal,
            event_time_stamp: TimeStamp::SequenceNumber(0),
            acknowledgment_source: String::new(),
            time_of_acknowledgment: TimeStamp::SequenceNumber(0),
        };
        assert_eq!(inputs.alarm_ack(&request), Err(ObjectError::UnknownObject));
    }

    #[test]
    fn test_event_information_and_alarm_summary() {
        let mut device = device();
        let mut router = router();
        let mut inputs = high_limit_store(&mut device);
        inputs.create(6, &mut device);
        inputs.create(7, &mut device);
        let intrinsic = inputs.get_mut(7).unwrap().intrinsic.as_mut().unwrap();
        intrinsic.notify_type = NotifyType::Event;
        intrinsic.notification_class = 4;

        for instance in [5, 7] {
            inputs.set_present_value(instance, 90.0, now());
            inputs.intrinsic_reporting(instance, &device, &mut router);
        }

        let info = inputs.event_information(0, &router).found().unwrap();
        assert_eq!(info.object_identifier, id(5));
        assert_eq!(info.event_state, EventState::HighLimit);
        assert_eq!(
            info.acknowledged_transitions,
            EventEnable::TO_FAULT | EventEnable::TO_NORMAL
        );
        assert_eq!(info.event_priorities, [100, 150, 200]);
        assert_eq!(inputs.event_information(1, &router), ScanResult::Skipped);
        assert_eq!(inputs.event_information(2, &router).status(), 1);
        assert_eq!(inputs.event_information(3, &router), ScanResult::EndOfList);

        assert_eq!(inputs.alarm_summary(0).status(), 1);
        assert_eq!(inputs.alarm_summary(1).status(), 0);
        // event-type objects are not alarms
        assert_eq!(inputs.alarm_summary(2).status(), 0);
        assert_eq!(inputs.alarm_summary(3).status(), -1);
    }

    #[test]
    fn test_event_information_reports_unacked_normal_object() {
        let mut device = device();
        let mut router = router();
        let mut inputs = high_limit_store(&mut device);

        inputs.set_present_value(5, 90.0, now());
        inputs.intrinsic_reporting(5, &device, &mut router);
        inputs.set_present_value(5, 10.0, now());
        inputs.intrinsic_reporting(5, &device, &mut router);
        assert_eq!(router.drain().len(), 2);
        assert_eq!(inputs.event_state(5), Some(EventState::Normal));

        assert_eq!(inputs.event_information(0, &router).status(), 1);
        let info = inputs.event_information(0, &router).found().unwrap();
        assert_eq!(info.event_state, EventState::Normal);
        assert_eq!(info.acknowledged_transitions, EventEnable::TO_FAULT);
        // not an alarm any more
        assert_eq!(inputs.alarm_summary(0), ScanResult::Skipped);
    }

    #[test]
    fn test_reporting_needs_limit_enable() {
        let mut device = device();
        let mut router = router();
        let mut inputs = AnalogInputs::new();
        inputs.create(1, &mut device);

        inputs.set_present_value(1, 1.0e6, now());
        inputs.intrinsic_reporting(1, &device, &mut router);
        inputs.intrinsic_reporting(99, &device, &mut router);
        assert_eq!(inputs.event_state(1), Some(EventState::Normal));
        assert_eq!(router.pending(), 0);
    }

    proptest! {
        #[test]
        fn prop_index_instance_bijection(ops in proptest::collection::vec((any::<bool>(), 0u32..64), 0..80)) {
            let mut device = device();
            let mut inputs = AnalogInputs::new();
            for (create, instance) in ops {
                if create {
                    inputs.create(instance, &mut device);
                } else {
                    inputs.delete(instance, &mut device);
                }
            }

            for instance in 0u32..64 {
                let index = inputs.instance_to_index(instance);
                prop_assert_eq!(inputs.valid_instance(instance), index < inputs.count());
                if inputs.valid_instance(instance) {
                    prop_assert_eq!(inputs.index_to_instance(index), Some(instance));
                }
            }
        }

        #[test]
        fn prop_cov_rule(prior in -100.0f32..100.0, increment in 0.0f32..10.0, value in -100.0f32..100.0) {
            let mut device = device();
            let mut inputs = AnalogInputs::new();
            inputs.create(1, &mut device);
            {
                let object = inputs.get_mut(1).unwrap();
                object.prior_value = prior;
                object.cov_increment = increment;
                object.changed = false;
            }

            inputs.set_present_value(1, value, now());
            let object = inputs.get(1).unwrap();
            let expected = (value - prior).abs() >= increment;
            prop_assert_eq!(object.changed, expected);
            prop_assert_eq!(object.prior_value, if expected { value } else { prior });
        }
    }
}
