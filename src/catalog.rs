//! Built-in record types served to the database viewer

use crate::schema::{FieldDef, RecordType};

/// All built-in record types, in declaration order
pub fn builtin_record_types() -> Vec<RecordType> {
    vec![user(), product(), lead(), inquiry()]
}

pub fn user() -> RecordType {
    RecordType::new("User")
        .describe("Users collection schema")
        .field(FieldDef::string("name").describe("Full name"))
        .field(FieldDef::email("email").describe("Email address"))
        .field(FieldDef::string("address").describe("Address"))
        .field(
            FieldDef::int("age")
                .optional()
                .min(0)
                .max(120)
                .describe("Age in years"),
        )
        .field(
            FieldDef::bool("is_active")
                .with_default(true)
                .describe("Whether user is active"),
        )
}

pub fn product() -> RecordType {
    RecordType::new("Product")
        .describe("Products collection schema")
        .field(FieldDef::string("title").describe("Product title"))
        .field(
            FieldDef::string("description")
                .optional()
                .describe("Product description"),
        )
        .field(FieldDef::float("price").min(0).describe("Price in dollars"))
        .field(FieldDef::string("category").describe("Product category"))
        .field(
            FieldDef::bool("in_stock")
                .with_default(true)
                .describe("Whether product is in stock"),
        )
}

pub fn lead() -> RecordType {
    RecordType::new("Lead")
        .describe("Marketing/contact leads for TWIP")
        .field(FieldDef::string("name").min_length(2).describe("Contact name"))
        .field(FieldDef::email("email").describe("Contact email"))
        .field(
            FieldDef::string("business_name")
                .optional()
                .describe("Business name"),
        )
        .field(
            FieldDef::string("message")
                .min_length(5)
                .describe("Message or project details"),
        )
}

pub fn inquiry() -> RecordType {
    RecordType::new("Inquiry")
        .describe("Customer inquiries for custom silver jewelry")
        .field(FieldDef::string("name").min_length(2).describe("Customer name"))
        .field(FieldDef::email("email").describe("Customer email"))
        .field(
            FieldDef::string("phone")
                .optional()
                .describe("Optional phone number"),
        )
        .field(
            FieldDef::string("message")
                .min_length(10)
                .describe("Inquiry details or design ideas"),
        )
        .field(
            FieldDef::string("budget")
                .optional()
                .describe("Approximate budget or range"),
        )
        .field(
            FieldDef::string("reference_link")
                .optional()
                .describe("Link to inspiration or reference image"),
        )
}
