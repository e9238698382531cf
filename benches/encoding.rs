use bacnet_objects::encoding::{decode_application_data, encode_application_data};
use bacnet_objects::object::{
    AnalogInputs, Device, ObjectIdentifier, ObjectStore, ObjectType, PropertyIdentifier,
    PropertyValue,
};
use bacnet_objects::service::ReadPropertyRequest;
use chrono::Utc;
use criterion::{black_box, criterion_group, criterion_main, Criterion};

fn encode_benchmark(c: &mut Criterion) {
    let value = PropertyValue::CharacterString("Supply Air Temperature".to_string());
    c.bench_function("encode_application_data", |b| {
        b.iter(|| {
            let mut buffer = Vec::with_capacity(32);
            encode_application_data(&mut buffer, black_box(&value)).unwrap();
            buffer
        })
    });
}

fn decode_benchmark(c: &mut Criterion) {
    let mut payload = Vec::new();
    encode_application_data(&mut payload, &PropertyValue::Real(21.5)).unwrap();
    c.bench_function("decode_application_data", |b| {
        b.iter(|| decode_application_data(black_box(&payload)).unwrap())
    });
}

fn read_property_benchmark(c: &mut Criterion) {
    let mut device = Device::new(1, "bench");
    let mut inputs = AnalogInputs::new();
    for instance in 0..256 {
        inputs.create(instance, &mut device);
        inputs.set_present_value(instance, instance as f32 * 0.5, Utc::now());
    }

    let present_value = ReadPropertyRequest::new(
        ObjectIdentifier::new(ObjectType::AnalogInput, 128),
        PropertyIdentifier::PresentValue,
    );
    c.bench_function("read_property_present_value", |b| {
        b.iter(|| inputs.read_property(black_box(&present_value)).unwrap())
    });

    let time_stamps = ReadPropertyRequest::new(
        ObjectIdentifier::new(ObjectType::AnalogInput, 255),
        PropertyIdentifier::EventTimeStamps,
    );
    c.bench_function("read_property_event_time_stamps", |b| {
        b.iter(|| inputs.read_property(black_box(&time_stamps)).unwrap())
    });
}

criterion_group!(benches, encode_benchmark, decode_benchmark, read_property_benchmark);
criterion_main!(benches);
