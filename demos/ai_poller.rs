//! Analog Input Poller Demo
//!
//! Drives a handful of Analog Inputs with a simulated sensor, runs intrinsic
//! reporting once per cycle and prints every notification the notification
//! class table emits. The first high-limit alarm is acknowledged to show the
//! acknowledgment notification.
//!
//! Run with `RUST_LOG=debug cargo run --example ai_poller --features demo`.

use bacnet_objects::{
    object::{
        AnalogInputConfig, AnalogInputs, Device, DeviceContext, EngineeringUnits, EventEnable,
        EventState, IntrinsicConfig, LimitEnable, ObjectStore,
    },
    service::{
        AlarmAckRequest, NotificationClassConfig, NotificationClasses, ScanResult, TimeStamp,
    },
};
use chrono::{Duration, TimeZone, Utc};

const CYCLES: u32 = 40;

/// Simulated supply air temperature, swinging between 8 and 32 degrees
fn sensor(instance: u32, cycle: u32) -> f32 {
    let phase = (cycle as f32 + instance as f32 * 5.0) / 6.0;
    20.0 + 12.0 * phase.sin()
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    println!("bacnet-objects Analog Input Poller");
    println!("==================================");

    let start = Utc.with_ymd_and_hms(2024, 1, 15, 6, 0, 0).single().ok_or("invalid start time")?;
    let mut device = Device::new(2600, "AHU-1 Controller").with_time(start);
    let mut classes = NotificationClasses::new().with_class(
        1,
        NotificationClassConfig {
            priorities: [32, 64, 128],
            ack_required: EventEnable::TO_OFFNORMAL,
        },
    );

    let alarms = IntrinsicConfig::default()
        .with_limits(10.0, 28.0, 1.5)
        .with_enables(LimitEnable::all(), EventEnable::all())
        .with_time_delay(2)
        .with_notification_class(1);
    let config = AnalogInputConfig::default()
        .with_units(EngineeringUnits::DegreesCelsius)
        .with_cov_increment(0.5)
        .with_intrinsic(alarms);
    let mut inputs = AnalogInputs::with_config(config);

    for instance in 1..=3 {
        inputs.create(instance, &mut device);
        inputs.set_object_name(instance, &format!("SAT-{}", instance), &mut device);
    }
    println!(
        "Created {} analog inputs, database revision {}",
        inputs.count(),
        device.database_revision()
    );

    let mut acknowledged = false;
    for cycle in 0..CYCLES {
        let now = start + Duration::seconds(i64::from(cycle) * 10);
        device.set_time(now);

        for index in 0..inputs.count() {
            let Some(instance) = inputs.index_to_instance(index) else {
                continue;
            };
            inputs.set_present_value(instance, sensor(instance, cycle), now);
            if inputs.change_of_value(instance) {
                inputs.change_of_value_clear(instance);
            }
            inputs.intrinsic_reporting(instance, &device, &mut classes);
        }

        for notification in classes.drain() {
            println!(
                "[cycle {:2}] {} {:?} -> {:?} priority {} ack {} ({})",
                cycle,
                notification.event_object_identifier,
                notification.from_state,
                notification.to_state,
                notification.priority,
                notification.ack_required,
                notification.message_text.as_deref().unwrap_or("")
            );

            if !acknowledged && notification.ack_required {
                let request = AlarmAckRequest {
                    acknowledging_process_identifier: 1,
                    event_object_identifier: notification.event_object_identifier,
                    event_state_acknowledged: notification.to_state,
                    event_time_stamp: notification.time_stamp,
                    acknowledgment_source: "operator".to_string(),
                    time_of_acknowledgment: TimeStamp::DateTime(device.current_date_time()),
                };
                inputs.alarm_ack(&request)?;
                acknowledged = true;
            }
        }
    }

    println!("\nActive alarms:");
    for index in 0..inputs.count() {
        if let ScanResult::Found(summary) = inputs.alarm_summary(index) {
            println!(
                "  {} {:?} acked {:?}",
                summary.object_identifier, summary.alarm_state, summary.acknowledged_transitions
            );
        }
    }

    let in_alarm = (1..=3)
        .filter(|&instance| inputs.event_state(instance) != Some(EventState::Normal))
        .count();
    println!("{} of {} inputs off normal", in_alarm, inputs.count());

    Ok(())
}
