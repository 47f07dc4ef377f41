//! Catalog Model Tests
//!
//! Exercises the standard record types end to end:
//! - Courses sum lesson durations across modules
//! - Carts and profiles validate nested lists with element paths
//! - Category and settings records
//! - Schemas persist to disk and reload unchanged
//! - The process-wide registry installs once

use recordkit::catalog::{self, standard_registry, standard_schemas};
use recordkit::schema::{global, install_global, SchemaError};
use recordkit::{EngineConfig, RecordValidator, SchemaRegistry, TreeResolver, ValidationError};
use serde_json::{json, Value};
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

fn registry() -> SchemaRegistry {
    standard_registry().unwrap()
}

fn lesson(id: u64, duration: u64) -> Value {
    json!({
        "lesson_id": id,
        "topic": format!("Topic {}", id),
        "description": "Lesson body",
        "duration": duration,
        "lesson_type": "video",
        "content": format!("https://example.com/lessons/{}", id)
    })
}

fn course_input() -> Value {
    json!({
        "course_id": 1,
        "title": "Rust for Beginners",
        "description": "From zero to ownership",
        "instructor_id": 3,
        "price": 49.99,
        "discount": 10.0,
        "category": { "category_id": 1, "name": "Programming" },
        "modules": [
            {
                "module_id": 1,
                "name": "Basics",
                "description": "Syntax and tooling",
                "lessons": [lesson(1, 600), lesson(2, 900)]
            },
            {
                "module_id": 2,
                "name": "Ownership",
                "description": "Moves and borrows",
                "lessons": [lesson(3, 300)]
            }
        ]
    })
}

fn profile_input() -> Value {
    json!({
        "id": 1,
        "name": "John Doe",
        "email": "john@example.com",
        "age": 30,
        "address": {
            "street": "123 Main St",
            "city": "Anytown",
            "state": "CA",
            "zip": "12345"
        },
        "phone_numbers": "+1-555-1234",
        "cart": [
            { "id": 1, "name": "Pen", "price": 2.5, "quantity": 4 },
            { "id": 2, "name": "Notebook", "price": 5.0, "quantity": 1 }
        ]
    })
}

// =============================================================================
// Course Tests
// =============================================================================

/// Total duration sums every lesson of every module.
#[test]
fn test_course_total_duration() {
    let registry = registry();
    let validator = RecordValidator::new(&registry);

    let course = validator.validate("course", &course_input()).unwrap();

    assert_eq!(course.computed("total_duration"), Some(json!(1800)));
    assert_eq!(course.computed("module_count"), Some(json!(2)));
    assert_eq!(course.get("category").unwrap()["is_active"], json!(true));
}

/// A course without modules lasts zero seconds.
#[test]
fn test_course_without_modules() {
    let registry = registry();
    let validator = RecordValidator::new(&registry);

    let mut input = course_input();
    input.as_object_mut().unwrap().remove("modules");

    let course = validator.validate("course", &input).unwrap();
    assert_eq!(course.get("modules"), Some(&json!([])));
    assert_eq!(course.computed("total_duration"), Some(json!(0)));
}

/// Lesson failures carry their full path.
#[test]
fn test_course_nested_lesson_error() {
    let registry = registry();
    let validator = RecordValidator::new(&registry);

    let mut input = course_input();
    input["modules"][1]["lessons"][0]["duration"] = json!(-5);

    let err = validator.validate("course", &input).unwrap_err();
    assert_eq!(err.code(), "RECORD_OUT_OF_RANGE");
    assert_eq!(err.field(), Some("modules[1].lessons[0].duration"));
}

/// Discounts are percentages.
#[test]
fn test_course_discount_bounds() {
    let registry = registry();
    let validator = RecordValidator::new(&registry);

    let mut input = course_input();
    input["discount"] = json!(100.5);

    let err = validator.validate("course", &input).unwrap_err();
    assert_eq!(err.field(), Some("discount"));
}

// =============================================================================
// Cart and Profile Tests
// =============================================================================

/// Cart item total is price times quantity.
#[test]
fn test_cart_item_total() {
    let registry = registry();
    let validator = RecordValidator::new(&registry);

    let item = validator
        .validate(
            "cart_item",
            &json!({ "id": 1, "name": "Pen", "price": 2.5, "quantity": 4 }),
        )
        .unwrap();
    assert_eq!(item.computed("total_price"), Some(json!(10.0)));
}

/// Profiles count their cart and report element paths.
#[test]
fn test_profile_cart() {
    let registry = registry();
    let validator = RecordValidator::new(&registry);

    let profile = validator.validate("user_profile", &profile_input()).unwrap();
    assert_eq!(profile.computed("cart_size"), Some(json!(2)));
    assert_eq!(profile.get("cart").unwrap()[1]["price"], json!(5.0));

    let mut input = profile_input();
    input["cart"][1]["price"] = json!(-1.0);
    let err = validator.validate("user_profile", &input).unwrap_err();
    assert_eq!(err.field(), Some("cart[1].price"));

    let mut input = profile_input();
    input["cart"][0]["quantity"] = json!("four");
    let err = validator.validate("user_profile", &input).unwrap_err();
    assert_eq!(
        err,
        ValidationError::type_mismatch("cart[0].quantity", "int", "string")
    );
}

/// A profile needs an address.
#[test]
fn test_profile_requires_address() {
    let registry = registry();
    let validator = RecordValidator::new(&registry);

    let mut input = profile_input();
    input.as_object_mut().unwrap().remove("address");

    let err = validator.validate("user_profile", &input).unwrap_err();
    assert_eq!(err, ValidationError::missing("address"));
}

// =============================================================================
// Settings and Feedback Tests
// =============================================================================

/// Settings are a string map that defaults to empty.
#[test]
fn test_user_settings_map() {
    let registry = registry();
    let validator = RecordValidator::new(&registry);

    let settings = validator
        .validate(
            "user_settings",
            &json!({ "user_id": 1, "settings": { "theme": "dark", "lang": "en" } }),
        )
        .unwrap();
    assert_eq!(settings.get("settings").unwrap()["theme"], json!("dark"));
    assert_eq!(settings.get("preferences"), Some(&json!([])));

    let empty = validator
        .validate("user_settings", &json!({ "user_id": 2 }))
        .unwrap();
    assert_eq!(empty.get("settings"), Some(&json!({})));

    let err = validator
        .validate(
            "user_settings",
            &json!({ "user_id": 3, "settings": { "theme": 3 } }),
        )
        .unwrap_err();
    assert_eq!(err.field(), Some("settings.theme"));
}

/// Ratings run from one to five.
#[test]
fn test_feedback_rating() {
    let registry = registry();
    let validator = RecordValidator::new(&registry);

    let feedback = |rating: i64| {
        json!({
            "feedback_id": 1,
            "user_id": 2,
            "course_id": 3,
            "rating": rating
        })
    };

    assert!(validator.validate("user_feedback", &feedback(1)).is_ok());
    assert!(validator.validate("user_feedback", &feedback(5)).is_ok());
    assert!(validator.validate("user_feedback", &feedback(0)).is_err());
    assert!(validator.validate("user_feedback", &feedback(6)).is_err());
}

// =============================================================================
// Category Tree Tests
// =============================================================================

/// Categories nest under `subcategories`.
#[test]
fn test_category_tree() {
    let registry = registry();
    let resolver = TreeResolver::new(RecordValidator::new(&registry));

    let tree = resolver
        .resolve(
            "course_category",
            &json!({
                "category_id": 1,
                "name": "Programming",
                "subcategories": [
                    { "category_id": 2, "name": "Rust" },
                    { "category_id": 3, "name": "Go", "subcategories": [
                        { "category_id": 4, "name": "Concurrency" }
                    ]}
                ]
            }),
        )
        .unwrap();

    let root = tree.roots()[0];
    assert_eq!(tree.computed(root, "subcategory_count"), Some(json!(2)));
    let four = tree.find(&json!(4)).unwrap();
    assert_eq!(tree.record(four).get("parent_category_id"), Some(&json!(3)));
    assert!(tree.record(four).get("subcategories").is_none());
}

/// A category naming itself as parent breaks its own invariant.
#[test]
fn test_category_self_parent() {
    let registry = registry();
    let resolver = TreeResolver::new(RecordValidator::new(&registry));

    let err = resolver
        .resolve(
            "course_category",
            &json!({ "category_id": 4, "name": "Rust", "parent_category_id": 4 }),
        )
        .unwrap_err();
    assert_eq!(err.invariant_id(), Some("category_not_own_parent"));
}

/// Only recursive types resolve as trees.
#[test]
fn test_non_tree_type() {
    let registry = registry();
    let resolver = TreeResolver::new(RecordValidator::new(&registry));

    let err = resolver.resolve("patient", &json!({})).unwrap_err();
    assert_eq!(err.code(), "RECORD_NOT_RECURSIVE");
}

// =============================================================================
// Persistence Tests
// =============================================================================

/// Saved schemas reload into an equivalent registry.
#[test]
fn test_schemas_save_and_reload() {
    let temp = TempDir::new().unwrap();
    let dir = temp.path().join("schemas");

    for schema in standard_schemas() {
        SchemaRegistry::save_schema(&dir, &schema).unwrap();
    }
    assert!(dir.join("schema_patient_1.json").exists());

    let mut loaded = SchemaRegistry::new();
    let count = loaded.load_dir(&dir).unwrap();
    assert_eq!(count, standard_schemas().len());
    assert!(loaded.unresolved_references().is_empty());

    assert_eq!(
        loaded.lookup("patient").unwrap().schema(),
        &catalog::patient()
    );

    let employee = json!({ "id": 1, "name": "John Doe", "age": 30, "salary": 5000 });
    let original = RecordValidator::new(&registry()).validate("employee", &employee);
    let reloaded = RecordValidator::new(&loaded).validate("employee", &employee);
    assert_eq!(original.unwrap(), reloaded.unwrap());
}

/// A missing schema directory loads nothing.
#[test]
fn test_load_missing_dir() {
    let temp = TempDir::new().unwrap();
    let mut registry = SchemaRegistry::new();
    assert_eq!(registry.load_dir(&temp.path().join("absent")).unwrap(), 0);
    assert!(registry.is_empty());
}

/// A corrupt schema file fails the load.
#[test]
fn test_load_corrupt_schema() {
    let temp = TempDir::new().unwrap();
    std::fs::write(temp.path().join("schema_bad_1.json"), "{ not json").unwrap();

    let mut registry = SchemaRegistry::new();
    let err = registry.load_dir(temp.path()).unwrap_err();
    assert!(matches!(err, SchemaError::Parse { .. }));
}

/// Engine config loads from disk.
#[test]
fn test_config_file() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("recordkit.json");
    std::fs::write(&path, r#"{ "max_depth": 1, "orphan_policy": "treat_as_root" }"#).unwrap();

    let config = EngineConfig::load(&path).unwrap();
    assert_eq!(config.max_depth, 1);

    let registry = registry();
    let validator = RecordValidator::new(&registry).with_config(config);
    let err = validator
        .validate("course", &course_input())
        .unwrap_err();
    assert_eq!(
        err,
        ValidationError::DepthExceeded {
            path: "modules[0].lessons[0]".into(),
            max_depth: 1
        }
    );
}

// =============================================================================
// Global Registry Tests
// =============================================================================

/// The process-wide registry installs once and is shared.
#[test]
fn test_global_registry() {
    let installed = install_global(registry()).unwrap();
    assert!(installed.contains("patient"));
    assert!(std::ptr::eq(global().unwrap(), installed));

    let err = install_global(SchemaRegistry::new()).unwrap_err();
    assert!(matches!(err, SchemaError::AlreadyInstalled));

    let handles: Vec<_> = (0..4)
        .map(|i| {
            std::thread::spawn(move || {
                let validator = RecordValidator::new(global().unwrap());
                validator
                    .validate(
                        "cart_item",
                        &json!({ "id": i, "name": "Pen", "price": 1.5, "quantity": 2 }),
                    )
                    .unwrap()
                    .computed("total_price")
            })
        })
        .collect();
    for handle in handles {
        assert_eq!(handle.join().unwrap(), Some(json!(3.0)));
    }
}
