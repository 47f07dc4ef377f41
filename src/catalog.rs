//! Standard record types
//!
//! Patient intake, account signup, a course catalog, shopping and booking
//! records, and threaded comments. `standard_registry()` registers all of
//! them.

use serde_json::json;

use crate::schema::{
    CompareOp, ComputedField, ComputedKind, Condition, Constraint, FieldDef, FieldType, Invariant,
    Schema, SchemaRegistry, SchemaResult, Transform, TreeSpec,
};

const NAME_PATTERN: &str = "^[a-zA-Z ]*$";

const LESSON_TYPES: [&str; 7] = [
    "video",
    "article",
    "quiz",
    "assignment",
    "exam",
    "attachment",
    "other",
];

/// Registers every standard schema.
pub fn standard_registry() -> SchemaResult<SchemaRegistry> {
    let mut registry = SchemaRegistry::new();
    for schema in standard_schemas() {
        registry.register(schema)?;
    }
    Ok(registry)
}

/// Every standard schema, nested types before the types that embed them.
pub fn standard_schemas() -> Vec<Schema> {
    vec![
        address(),
        emergency_contact(),
        patient(),
        signup(),
        user_feedback(),
        cart_item(),
        user_profile(),
        course_promotion(),
        course_category(),
        lesson(),
        course_module(),
        course(),
        booking(),
        employee(),
        comment(),
        user_settings(),
    ]
}

fn audit_fields(schema: Schema) -> Schema {
    schema
        .field(FieldDef::datetime_now("created_at"))
        .field(FieldDef::datetime_now("updated_at"))
        .field(FieldDef::bool_with_default("is_active", true))
        .field(FieldDef::bool_with_default("is_deleted", false))
}

pub fn address() -> Schema {
    Schema::new("address", "1")
        .describe("Postal address")
        .field(FieldDef::required_string("street").describe("Street address"))
        .field(FieldDef::required_string("city").describe("City name"))
        .field(FieldDef::required_string("state").describe("State name"))
        .field(FieldDef::required_string("zip").describe("ZIP or postal code"))
        .field(FieldDef::optional_string("country"))
}

pub fn emergency_contact() -> Schema {
    Schema::new("emergency_contact", "1")
        .field(FieldDef::required_string("name"))
        .field(FieldDef::required_string("relationship"))
        .field(FieldDef::required_string("phone"))
}

/// Patient intake: uppercased name, bank-domain email, BMI, and an
/// emergency contact for patients over 60.
pub fn patient() -> Schema {
    Schema::new("patient", "1")
        .field(FieldDef::optional_int("id"))
        .field(
            FieldDef::required_string("name")
                .constraint(Constraint::length(1, 100))
                .transform(Transform::Uppercase),
        )
        .field(
            FieldDef::required_string("email")
                .constraint(Constraint::email())
                .constraint(Constraint::email_domain(["icici.com", "hdfc.com", "axis.com"])),
        )
        .field(
            FieldDef::required_int("age").constraint(
                Constraint::range(0.0, 120.0).with_message("Age must be a between 0 to 120"),
            ),
        )
        .field(FieldDef::optional_string("phone"))
        .field(FieldDef::optional_string("linkedin").constraint(Constraint::url()))
        .field(FieldDef::optional_record("address", "address"))
        .field(
            FieldDef::optional_float("weight")
                .constraint(Constraint::min(0.0))
                .describe("Weight in kg"),
        )
        .field(
            FieldDef::optional_float("height")
                .constraint(Constraint::min(0.0))
                .describe("Height in cm"),
        )
        .field(FieldDef::bool_with_default("married", false))
        .field(
            FieldDef::new("allergies", FieldType::array_of(FieldType::String))
                .constraint(Constraint::max_length(10)),
        )
        .field(FieldDef::new(
            "medications",
            FieldType::array_of(FieldType::String),
        ))
        .field(FieldDef::optional_record("emergency", "emergency_contact"))
        .invariant(
            Invariant::required_if(
                "senior_emergency_contact",
                "age",
                Condition::new(CompareOp::Gt, 60),
                "emergency",
            )
            .with_message("Emergency contact is required for patients over 60 years old"),
        )
        .computed(ComputedField::new(
            "bmi",
            ComputedKind::Ratio {
                numerator: "weight".into(),
                denominator: "height".into(),
                denominator_scale: 0.01,
                denominator_power: 2,
                precision: Some(2),
            },
        ))
}

/// Account signup. The password is stored only as a salted hash; the
/// confirmation is checked against the raw password and never stored.
pub fn signup() -> Schema {
    Schema::new("signup", "1")
        .field(FieldDef::required_int("user_id"))
        .field(FieldDef::required_string("username").constraint(Constraint::length(3, 50)))
        .field(FieldDef::required_string("email").constraint(Constraint::email()))
        .field(
            FieldDef::required_string("password")
                .constraint(Constraint::min_length(8))
                .constraint(Constraint::pattern(r"^[A-Za-z\d]{8,}$"))
                .constraint(Constraint::letters_and_digits())
                .transform(Transform::OneWayHash),
        )
        .field(
            FieldDef::required_string("confirm_password")
                .constraint(Constraint::min_length(8))
                .transient(),
        )
        .field(FieldDef::datetime_now("created_at"))
        .field(FieldDef::datetime_now("updated_at"))
        .field(FieldDef::bool_with_default("is_active", false))
        .field(FieldDef::bool_with_default("is_deleted", false))
        .field(FieldDef::bool_with_default("is_verified", false))
        .invariant(
            Invariant::equal("password_match", "password", "confirm_password")
                .with_message("Passwords do not match"),
        )
}

pub fn user_feedback() -> Schema {
    Schema::new("user_feedback", "1")
        .field(FieldDef::required_int("feedback_id"))
        .field(FieldDef::required_int("user_id"))
        .field(FieldDef::required_int("course_id"))
        .field(FieldDef::required_int("rating").constraint(Constraint::range(1.0, 5.0)))
        .field(FieldDef::optional_string("comment"))
        .field(FieldDef::new("created_at", FieldType::Datetime))
        .field(FieldDef::new("updated_at", FieldType::Datetime))
        .field(FieldDef::bool_with_default("is_user_enrolled", false))
        .field(FieldDef::bool_with_default("is_anonymous", false))
        .field(FieldDef::bool_with_default("is_active", true))
        .field(FieldDef::bool_with_default("is_deleted", false))
}

pub fn cart_item() -> Schema {
    Schema::new("cart_item", "1")
        .field(FieldDef::required_int("id"))
        .field(FieldDef::optional_string("sku"))
        .field(FieldDef::required_string("name"))
        .field(FieldDef::required_float("price").constraint(Constraint::min(0.0)))
        .field(FieldDef::required_int("quantity").constraint(Constraint::min(0.0)))
        .computed(ComputedField::product("total_price", ["price", "quantity"]))
}

pub fn user_profile() -> Schema {
    Schema::new("user_profile", "1")
        .field(FieldDef::required_int("id"))
        .field(
            FieldDef::required_string("name")
                .constraint(Constraint::length(3, 50))
                .constraint(Constraint::pattern(NAME_PATTERN)),
        )
        .field(FieldDef::required_string("email").constraint(Constraint::email()))
        .field(FieldDef::required_int("age"))
        .field(FieldDef::required_record("address", "address"))
        .field(FieldDef::required_string("phone_numbers"))
        .field(FieldDef::list_of("cart", FieldType::record("cart_item")))
        .computed(ComputedField::new(
            "cart_size",
            ComputedKind::Count {
                field: "cart".into(),
            },
        ))
}

/// A promotion window; the start must strictly precede the end.
pub fn course_promotion() -> Schema {
    audit_fields(
        Schema::new("course_promotion", "1")
            .field(FieldDef::required_int("promotion_id"))
            .field(FieldDef::required_int("admin_id"))
            .field(
                FieldDef::required_float("discount_percentage")
                    .constraint(Constraint::range(0.0, 100.0)),
            )
            .field(FieldDef::required_string("promo_code"))
            .field(FieldDef::required_datetime("start_date"))
            .field(FieldDef::required_datetime("end_date")),
    )
    .invariant(
        Invariant::ordering("promotion_dates", "start_date", "end_date")
            .with_message("Start date must be before end date"),
    )
}

/// Category hierarchy. A category may not be its own parent.
pub fn course_category() -> Schema {
    audit_fields(
        Schema::new("course_category", "1")
            .field(FieldDef::required_int("category_id"))
            .field(FieldDef::required_string("name"))
            .field(FieldDef::optional_string("description"))
            .field(FieldDef::optional_int("parent_category_id"))
            .field(FieldDef::list_of(
                "subcategories",
                FieldType::record("course_category"),
            )),
    )
    .invariant(
        Invariant::not_equal("category_not_own_parent", "parent_category_id", "category_id")
            .with_message("Parent category cannot be the same as the category itself"),
    )
    .computed(ComputedField::new(
        "subcategory_count",
        ComputedKind::ChildCount,
    ))
    .tree(TreeSpec::new(
        "category_id",
        "parent_category_id",
        "subcategories",
    ))
}

pub fn lesson() -> Schema {
    audit_fields(
        Schema::new("lesson", "1")
            .field(FieldDef::required_int("lesson_id"))
            .field(FieldDef::required_string("topic"))
            .field(FieldDef::required_string("description"))
            .field(
                FieldDef::required_int("duration")
                    .constraint(Constraint::min(0.0))
                    .describe("Duration in seconds"),
            )
            .field(
                FieldDef::required_string("lesson_type")
                    .constraint(Constraint::one_of(LESSON_TYPES)),
            )
            .field(FieldDef::required_string("content").describe("URL or path to the content")),
    )
}

pub fn course_module() -> Schema {
    audit_fields(
        Schema::new("course_module", "1")
            .field(FieldDef::required_int("module_id"))
            .field(FieldDef::required_string("name"))
            .field(FieldDef::required_string("description"))
            .field(FieldDef::list_of("lessons", FieldType::record("lesson"))),
    )
}

pub fn course() -> Schema {
    audit_fields(
        Schema::new("course", "1")
            .field(FieldDef::required_int("course_id"))
            .field(FieldDef::required_string("title"))
            .field(FieldDef::required_string("description"))
            .field(FieldDef::required_int("instructor_id"))
            .field(FieldDef::optional_string("thumbnail"))
            .field(FieldDef::required_float("price").constraint(Constraint::min(0.0)))
            .field(
                FieldDef::optional_float("discount")
                    .constraint(Constraint::range(0.0, 100.0))
                    .describe("Percentage discount"),
            )
            .field(FieldDef::required_record("category", "course_category"))
            .field(FieldDef::optional_string("prerequisites"))
            .field(FieldDef::list_of("modules", FieldType::record("course_module"))),
    )
    .computed(ComputedField::sum_over(
        "total_duration",
        ["modules", "lessons", "duration"],
    ))
    .computed(ComputedField::new(
        "module_count",
        ComputedKind::Count {
            field: "modules".into(),
        },
    ))
}

pub fn booking() -> Schema {
    Schema::new("booking", "1")
        .field(FieldDef::required_int("user_id"))
        .field(FieldDef::required_int("room_id"))
        .field(FieldDef::required_datetime("check_in"))
        .field(
            FieldDef::required_int("nights").constraint(
                Constraint::greater_than(1.0).with_message("Nights must be greater than 1"),
            ),
        )
        .field(
            FieldDef::required_float("rate_per_night").constraint(
                Constraint::greater_than(0.0)
                    .with_message("Rate per night must be greater than 0"),
            ),
        )
        .computed(ComputedField::product(
            "total_amount",
            ["nights", "rate_per_night"],
        ))
}

pub fn employee() -> Schema {
    Schema::new("employee", "1")
        .field(FieldDef::required_int("id"))
        .field(
            FieldDef::required_string("name")
                .constraint(Constraint::length(3, 50))
                .constraint(Constraint::pattern(NAME_PATTERN))
                .describe("Employee name"),
        )
        .field(FieldDef::required_int("age"))
        .field(FieldDef::optional_string("image_url").constraint(Constraint::url()))
        .field(FieldDef::optional_string("department").default_value(json!("General")))
        .field(
            FieldDef::required_float("salary").constraint(
                Constraint::greater_than(1000.0)
                    .with_message("Salary must be greater than 1000"),
            ),
        )
}

/// Threaded comments: replies nest under `replies` and point back through
/// `parent_id`.
pub fn comment() -> Schema {
    Schema::new("comment", "1")
        .field(FieldDef::required_int("id"))
        .field(FieldDef::required_int("post_id"))
        .field(FieldDef::required_string("comment"))
        .field(FieldDef::optional_int("parent_id"))
        .field(FieldDef::list_of("replies", FieldType::record("comment")))
        .computed(ComputedField::new("reply_count", ComputedKind::ChildCount))
        .computed(ComputedField::new(
            "thread_size",
            ComputedKind::DescendantCount,
        ))
        .tree(TreeSpec::new("id", "parent_id", "replies"))
}

pub fn user_settings() -> Schema {
    Schema::new("user_settings", "1")
        .field(FieldDef::required_int("user_id"))
        .field(
            FieldDef::new("settings", FieldType::map_of(FieldType::String))
                .default_value(json!({})),
        )
        .field(FieldDef::list_of("preferences", FieldType::String))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_schema_is_well_formed() {
        for schema in standard_schemas() {
            assert!(
                schema.validate_structure().is_ok(),
                "{}: {:?}",
                schema.type_name,
                schema.validate_structure()
            );
        }
    }

    #[test]
    fn test_registry_has_no_dangling_types() {
        let registry = standard_registry().unwrap();
        assert_eq!(registry.len(), standard_schemas().len());
        assert!(registry.unresolved_references().is_empty());
    }

    #[test]
    fn test_type_names_unique() {
        let mut names: Vec<String> = standard_schemas()
            .into_iter()
            .map(|s| s.type_name)
            .collect();
        let total = names.len();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), total);
    }
}
