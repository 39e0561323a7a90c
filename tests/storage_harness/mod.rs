//! Shared test harness for storage backend testing
//!
//! Provides `Asset`, a record whose columns cover every `FieldValue`
//! variant, and helpers for creating test rows.
//!
//! # Usage
//!
//! From any integration test file in `tests/`:
//! ```rust,ignore
//! #[macro_use]
//! mod storage_harness;
//! use storage_harness::*;
//! ```

#![allow(dead_code)]

#[macro_use]
mod data_service_tests;

use opsboard::core::field::FieldValue;
use opsboard::{closed_set, impl_data_entity};
use uuid::Uuid;

closed_set!(
    AssetStatus {
        Active => "active",
        Retired => "retired",
    }
);

// Columns: email (String), age (Integer), score (Float), active (Boolean),
// tags (List)
impl_data_entity!(
    Asset,
    "asset",
    "assets",
    AssetStatus,
    ["name", "email"],
    {
        email: String,
        age: i64,
        score: f64,
        active: bool,
        tags: Vec<String>,
    }
);

/// Create an `Asset` with a fresh id, status `active` and no owner
pub fn create_test_asset(name: &str, email: &str, age: i64, score: f64, active: bool) -> Asset {
    Asset::new(
        name.to_string(),
        AssetStatus::Active,
        None,
        email.to_string(),
        age,
        score,
        active,
        vec![],
    )
}

/// Create an `Asset` owned by `owner`
pub fn create_owned_asset(name: &str, owner: Uuid) -> Asset {
    let mut asset = create_test_asset(name, &format!("{}@test.com", name.to_lowercase()), 30, 1.0, true);
    asset.owner_id = Some(owner);
    asset
}

/// `n` assets with varied column values
///
/// Ages wrap at 100, scores step by 1.5 from 0.5, and `active` alternates.
pub fn sample_batch(n: usize) -> Vec<Asset> {
    (0..n)
        .map(|i| {
            create_test_asset(
                &format!("Asset_{}", i),
                &format!("asset_{}@test.com", i),
                (20 + i as i64) % 100,
                (i as f64) * 1.5 + 0.5,
                i % 2 == 0,
            )
        })
        .collect()
}

pub fn assert_count<T>(list: &[T], expected: usize) {
    assert_eq!(
        list.len(),
        expected,
        "Expected {} items, got {}",
        expected,
        list.len()
    );
}

pub fn assert_field_value_float(fv: &FieldValue, expected: f64) {
    match fv {
        FieldValue::Float(f) => assert!(
            (*f - expected).abs() < f64::EPSILON,
            "Expected FieldValue::Float({}), got FieldValue::Float({})",
            expected,
            f
        ),
        other => panic!("Expected FieldValue::Float({}), got {:?}", expected, other),
    }
}
