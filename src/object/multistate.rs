//! Multi-state Input Object Type Implementation
//!
//! A Multi-state Input reports one of `number_of_states` discrete states,
//! numbered from one. Each state has a State_Text entry that names it.
//!
//! ```
//! use bacnet_objects::object::{Device, MultiStateInputs, ObjectStore};
//!
//! let mut device = Device::new(1, "Plant Controller");
//! let mut inputs = MultiStateInputs::new();
//! inputs.create(0, &mut device);
//! assert_eq!(inputs.object_name(0).as_deref(), Some("MULTISTATE INPUT 0"));
//! assert!(inputs.set_present_value(0, 3));
//! assert!(!inputs.set_present_value(0, 0));
//! ```

use std::collections::BTreeMap;

use log::{debug, trace};

use crate::encoding::{
    decode_application_data, encode_bit_string, encode_boolean, encode_character_string,
    encode_enumerated, encode_object_identifier, encode_object_type, encode_unsigned,
};
use crate::object::{
    append_array_element, assign_object_name, DeviceContext, EventState, ObjectError,
    ObjectIdentifier, ObjectStore, ObjectType, PropertyIdentifier, PropertyLists, PropertyValue,
    Result, StatusFlags,
};
use crate::service::{ReadPropertyRequest, WritePropertyRequest};
use crate::util::{is_valid_instance_number, payload_hex};

/// Settings applied to every Multi-state Input a store creates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MultiStateInputConfig {
    pub number_of_states: u32,
    /// Present value before the first update
    pub present_value: u32,
}

impl Default for MultiStateInputConfig {
    fn default() -> Self {
        Self {
            number_of_states: 254,
            present_value: 1,
        }
    }
}

impl MultiStateInputConfig {
    pub fn with_number_of_states(mut self, number_of_states: u32) -> Self {
        self.number_of_states = number_of_states;
        self
    }

    pub fn with_present_value(mut self, present_value: u32) -> Self {
        self.present_value = present_value;
        self
    }
}

/// Multi-state Input object
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MultiStateInput {
    pub identifier: ObjectIdentifier,
    pub object_name: Option<String>,
    pub description: String,
    /// Current state, `1..=number_of_states`
    pub present_value: u32,
    pub out_of_service: bool,
    /// One entry per state
    pub state_text: Vec<String>,
}

impl MultiStateInput {
    pub fn new(instance: u32, config: &MultiStateInputConfig) -> Self {
        let number_of_states = config.number_of_states as usize;
        Self {
            identifier: ObjectIdentifier::new(ObjectType::MultiStateInput, instance),
            object_name: None,
            description: format!("MULTISTATE INPUT {}", instance),
            present_value: config.present_value,
            out_of_service: false,
            state_text: vec![String::new(); number_of_states],
        }
    }

    pub fn number_of_states(&self) -> u32 {
        self.state_text.len() as u32
    }

    pub fn status_flags(&self) -> StatusFlags {
        if self.out_of_service {
            StatusFlags::OUT_OF_SERVICE
        } else {
            StatusFlags::empty()
        }
    }

    fn in_range(&self, value: u32) -> bool {
        (1..=self.number_of_states()).contains(&value)
    }

    fn encode_state_text(
        &self,
        buffer: &mut Vec<u8>,
        array_index: Option<u32>,
        max_apdu: usize,
    ) -> Result<()> {
        match array_index {
            Some(0) => encode_unsigned(buffer, self.number_of_states())?,
            None => {
                for text in &self.state_text {
                    let mut element = Vec::new();
                    encode_character_string(&mut element, text)?;
                    append_array_element(buffer, &element, max_apdu)?;
                }
            }
            Some(index) if self.in_range(index) => {
                encode_character_string(buffer, &self.state_text[index as usize - 1])?
            }
            Some(_) => return Err(ObjectError::InvalidArrayIndex),
        }
        Ok(())
    }

    fn write_state_text(&mut self, array_index: Option<u32>, payload: &[u8]) -> Result<()> {
        match array_index {
            Some(0) => Err(ObjectError::WriteAccessDenied),
            None => {
                let mut texts = Vec::with_capacity(self.state_text.len());
                let mut offset = 0;
                for _ in 0..self.state_text.len() {
                    let (value, consumed) = decode_application_data(&payload[offset..])
                        .map_err(|_| ObjectError::ValueOutOfRange)?;
                    let text = value
                        .as_character_string()
                        .ok_or(ObjectError::ValueOutOfRange)?;
                    texts.push(text.to_string());
                    offset += consumed;
                }
                self.state_text = texts;
                Ok(())
            }
            Some(index) if self.in_range(index) => {
                let (value, _) = decode_application_data(payload)
                    .map_err(|_| ObjectError::ValueOutOfRange)?;
                let text = value
                    .as_character_string()
                    .ok_or(ObjectError::ValueOutOfRange)?;
                self.state_text[index as usize - 1] = text.to_string();
                Ok(())
            }
            Some(_) => Err(ObjectError::ValueOutOfRange),
        }
    }
}

/// All Multi-state Input objects of a device
#[derive(Debug, Clone, Default)]
pub struct MultiStateInputs {
    objects: BTreeMap<u32, MultiStateInput>,
    config: MultiStateInputConfig,
}

impl MultiStateInputs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: MultiStateInputConfig) -> Self {
        Self {
            objects: BTreeMap::new(),
            config,
        }
    }

    /// Create an object
    ///
    /// The object is named `MULTISTATE INPUT <instance>` unless another object
    /// already owns that name.
    pub fn create(&mut self, instance: u32, device: &mut dyn DeviceContext) -> bool {
        if !is_valid_instance_number(instance) || self.objects.contains_key(&instance) {
            return false;
        }

        let mut object = MultiStateInput::new(instance, &self.config);
        let name = format!("MULTISTATE INPUT {}", instance);
        if device.lookup_object_name(&name).is_none() {
            device.register_object_name(object.identifier, &name);
            object.object_name = Some(name);
        }

        self.objects.insert(instance, object);
        device.increment_database_revision();
        debug!("multi-state-input {} created", instance);
        true
    }

    pub fn delete(&mut self, instance: u32, device: &mut dyn DeviceContext) -> bool {
        let Some(object) = self.objects.remove(&instance) else {
            return false;
        };

        device.unregister_object_name(object.identifier);
        device.increment_database_revision();
        debug!("multi-state-input {} deleted", instance);
        true
    }

    pub fn clear(&mut self, device: &mut dyn DeviceContext) {
        let instances: Vec<u32> = self.objects.keys().copied().collect();
        for instance in instances {
            self.delete(instance, device);
        }
    }

    pub fn get(&self, instance: u32) -> Option<&MultiStateInput> {
        self.objects.get(&instance)
    }

    pub fn get_mut(&mut self, instance: u32) -> Option<&mut MultiStateInput> {
        self.objects.get_mut(&instance)
    }

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

    pub fn present_value(&self, instance: u32) -> Option<u32> {
        self.get(instance).map(|object| object.present_value)
    }

    /// Store a new state, rejected when outside `1..=number_of_states`
    pub fn set_present_value(&mut self, instance: u32, value: u32) -> bool {
        match self.get_mut(instance) {
            Some(object) if object.in_range(value) => {
                object.present_value = value;
                true
            }
            _ => false,
        }
    }

    pub fn set_out_of_service(&mut self, instance: u32, out_of_service: bool) {
        if let Some(object) = self.get_mut(instance) {
            object.out_of_service = out_of_service;
        }
    }

    pub fn state_text(&self, instance: u32, state: u32) -> Option<&str> {
        let object = self.get(instance)?;
        object
            .state_text
            .get((state as usize).checked_sub(1)?)
            .map(String::as_str)
    }

    pub fn set_state_text(&mut self, instance: u32, state: u32, text: &str) -> bool {
        let Some(slot) = self
            .get_mut(instance)
            .and_then(|object| object.state_text.get_mut((state as usize).checked_sub(1)?))
        else {
            return false;
        };
        *slot = text.to_string();
        true
    }
}

impl ObjectStore for MultiStateInputs {
    fn object_type(&self) -> ObjectType {
        ObjectType::MultiStateInput
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
        if !self.objects.contains_key(&instance) {
            return Err(ObjectError::UnknownObject);
        }

        Ok(PropertyLists {
            required: vec![
                PropertyIdentifier::ObjectIdentifier,
                PropertyIdentifier::ObjectName,
                PropertyIdentifier::ObjectType,
                PropertyIdentifier::PresentValue,
                PropertyIdentifier::StatusFlags,
                PropertyIdentifier::EventState,
                PropertyIdentifier::OutOfService,
                PropertyIdentifier::NumberOfStates,
            ],
            optional: vec![PropertyIdentifier::Description, PropertyIdentifier::StateText],
            proprietary: Vec::new(),
        })
    }

    fn read_property(&self, request: &ReadPropertyRequest) -> Result<Vec<u8>> {
        let object = self
            .get(request.object_identifier.instance)
            .ok_or(ObjectError::UnknownObject)?;
        let property = request.property_identifier;
        let array_index = request.array_index();
        if array_index.is_some() && property != PropertyIdentifier::StateText {
            return Err(ObjectError::PropertyIsNotAnArray);
        }

        let mut buffer = Vec::new();
        match property {
            PropertyIdentifier::ObjectIdentifier => {
                encode_object_identifier(&mut buffer, object.identifier)?
            }
            PropertyIdentifier::ObjectName => {
                encode_character_string(&mut buffer, object.object_name.as_deref().unwrap_or(""))?
            }
            PropertyIdentifier::Description => {
                encode_character_string(&mut buffer, &object.description)?
            }
            PropertyIdentifier::ObjectType => {
                encode_object_type(&mut buffer, ObjectType::MultiStateInput)?
            }
            PropertyIdentifier::PresentValue => encode_unsigned(&mut buffer, object.present_value)?,
            PropertyIdentifier::StatusFlags => {
                encode_bit_string(&mut buffer, &object.status_flags().to_bool_vec())?
            }
            PropertyIdentifier::EventState => {
                encode_enumerated(&mut buffer, EventState::Normal as u32)?
            }
            PropertyIdentifier::OutOfService => encode_boolean(&mut buffer, object.out_of_service)?,
            PropertyIdentifier::NumberOfStates => {
                encode_unsigned(&mut buffer, object.number_of_states())?
            }
            PropertyIdentifier::StateText => {
                object.encode_state_text(&mut buffer, array_index, request.max_apdu)?
            }
            _ => return Err(ObjectError::UnknownProperty),
        }

        trace!("{} {} -> {}", object.identifier, property, payload_hex(&buffer));
        Ok(buffer)
    }

    fn write_property(
        &mut self,
        request: &WritePropertyRequest,
        device: &mut dyn DeviceContext,
    ) -> Result<()> {
        let (value, _) = decode_application_data(&request.property_value)
            .map_err(|_| ObjectError::ValueOutOfRange)?;
        let property = request.property_identifier;
        let array_index = request.array_index();

        if array_index.is_some() && property != PropertyIdentifier::StateText {
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
            PropertyIdentifier::ObjectName => {
                let name = value
                    .as_character_string()
                    .ok_or(ObjectError::ValueOutOfRange)?;
                assign_object_name(&mut object.object_name, object.identifier, name, device)
            }
            PropertyIdentifier::Description => {
                let description = value
                    .as_character_string()
                    .ok_or(ObjectError::ValueOutOfRange)?;
                object.description = description.to_string();
                Ok(())
            }
            PropertyIdentifier::PresentValue => match value {
                PropertyValue::UnsignedInteger(state) if object.in_range(state) => {
                    object.present_value = state;
                    Ok(())
                }
                _ => Err(ObjectError::ValueOutOfRange),
            },
            PropertyIdentifier::OutOfService => {
                object.out_of_service = value.as_boolean().ok_or(ObjectError::ValueOutOfRange)?;
                Ok(())
            }
            PropertyIdentifier::StateText => {
                object.write_state_text(array_index, &request.property_value)
            }
            PropertyIdentifier::ObjectIdentifier
            | PropertyIdentifier::ObjectType
            | PropertyIdentifier::StatusFlags
            | PropertyIdentifier::EventState
            | PropertyIdentifier::NumberOfStates => Err(ObjectError::WriteAccessDenied),
            _ => Err(ObjectError::UnknownProperty),
        }
    }
}
