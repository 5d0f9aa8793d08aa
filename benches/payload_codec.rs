//! Encode and classify throughput across payload types.

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use qr_payload::{FieldSet, PayloadClassifier, PayloadEncoder, PayloadType};

fn sample_forms() -> Vec<(PayloadType, FieldSet)> {
    vec![
        (
            PayloadType::Url,
            FieldSet::new().with("url", "https://example.com/path?q=1"),
        ),
        (
            PayloadType::Wifi,
            FieldSet::new()
                .with("ssid", "CoffeeShop")
                .with("password", "hunter22")
                .with("encryption", "WPA"),
        ),
        (
            PayloadType::VCard,
            FieldSet::new()
                .with("firstName", "Ada")
                .with("lastName", "Lovelace")
                .with("phone", "+441234")
                .with("email", "ada@example.com")
                .with("organization", "Engines Ltd")
                .with("website", "https://ada.example"),
        ),
        (
            PayloadType::Event,
            FieldSet::new()
                .with("summary", "Launch")
                .with("location", "Hall 2")
                .with("start", "2025-01-01T12:00:00Z")
                .with("end", "2025-01-01T13:30:00Z"),
        ),
        (
            PayloadType::Upi,
            FieldSet::new()
                .with("vpa", "shop@bank")
                .with("name", "Corner Shop")
                .with("amount", "250"),
        ),
    ]
}

fn bench_encode(c: &mut Criterion) {
    let encoder = PayloadEncoder::new();
    let forms = sample_forms();
    c.bench_function("encode_mixed_forms", |b| {
        b.iter(|| {
            for (payload_type, fields) in &forms {
                black_box(encoder.encode(*payload_type, black_box(fields)));
            }
        })
    });
}

fn bench_classify(c: &mut Criterion) {
    let encoder = PayloadEncoder::new();
    let classifier = PayloadClassifier::new();
    let mut payloads: Vec<String> = sample_forms()
        .iter()
        .map(|(payload_type, fields)| encoder.encode(*payload_type, fields))
        .collect();
    payloads.push("just some words nobody can classify".to_string());

    c.bench_function("classify_mixed_payloads", |b| {
        b.iter(|| {
            for raw in &payloads {
                black_box(classifier.classify(black_box(raw)));
            }
        })
    });
}

criterion_group!(benches, bench_encode, bench_classify);
criterion_main!(benches);
