use num_format::{CustomFormat, Grouping};

/// Digit grouping by `_`, the way Rust writes number literals
pub fn number_format() -> CustomFormat {
    CustomFormat::builder()
        .grouping(Grouping::Standard)
        .minus_sign("-")
        .separator("_")
        .build()
        .unwrap_or_default()
}
