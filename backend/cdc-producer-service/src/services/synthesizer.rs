//! Row synthesis for the four simulated tables.
//!
//! Everything here is a pure function of the allocated id, the operation,
//! the capture clock and the caller's random source; the only shared state a
//! caller needs is the id it already allocated.
//!
//! | table     | system | designated mutable field | prior value              |
//! |-----------|--------|--------------------------|--------------------------|
//! | customer  | oracle | `email`                  | `unknown@example.invalid`|
//! | order     | oracle | `status`                 | `pending`                |
//! | product   | db2    | `price`                  | `0.00`                   |
//! | inventory | db2    | `quantity`               | `0`                      |

use cdc_envelope::{FieldValue, Operation, Record};
use fake::faker::internet::en::SafeEmail;
use fake::faker::name::en::Name;
use fake::Fake;
use rand::Rng;
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};

use crate::error::{ProducerError, Result};
use crate::models::EntityKind;

pub const ORDER_STATUSES: [&str; 4] = ["pending", "confirmed", "shipped", "delivered"];

pub const CATEGORIES: [&str; 10] = [
    "Electronics",
    "Clothing",
    "Home & Garden",
    "Sports",
    "Books",
    "Toys",
    "Automotive",
    "Health",
    "Food",
    "Office",
];

pub const WAREHOUSES: [&str; 7] = [
    "WH-EAST-01",
    "WH-EAST-02",
    "WH-WEST-01",
    "WH-WEST-02",
    "WH-CENTRAL-01",
    "WH-SOUTH-01",
    "WH-NORTH-01",
];

/// Orders reference customer ids in `1..=CUSTOMER_REFERENCE_BOUND`.
pub const CUSTOMER_REFERENCE_BOUND: u64 = 100_000;

/// Inventory rows reference product ids in `1..=PRODUCT_REFERENCE_BOUND`.
pub const PRODUCT_REFERENCE_BOUND: u64 = 50_000;

const PRIOR_EMAIL: &str = "unknown@example.invalid";

const PRODUCT_ADJECTIVES: [&str; 12] = [
    "Small",
    "Ergonomic",
    "Rustic",
    "Intelligent",
    "Gorgeous",
    "Incredible",
    "Practical",
    "Sleek",
    "Durable",
    "Lightweight",
    "Heavy Duty",
    "Aerodynamic",
];

const PRODUCT_MATERIALS: [&str; 12] = [
    "Steel", "Wooden", "Concrete", "Plastic", "Cotton", "Granite", "Rubber", "Leather", "Silk",
    "Wool", "Marble", "Copper",
];

const PRODUCT_NOUNS: [&str; 14] = [
    "Chair", "Car", "Computer", "Gloves", "Pants", "Shirt", "Table", "Shoes", "Hat", "Lamp",
    "Keyboard", "Bag", "Clock", "Wallet",
];

/// Before/after images for one synthesized change, already nulled per
/// operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowImages {
    pub before: Option<Record>,
    pub after: Option<Record>,
}

/// Foreign key for a row with primary key `id`, wrapped into `1..=bound`.
///
/// Plausible without the referenced row being guaranteed to exist.
pub fn referenced_id(id: u64, bound: u64) -> u64 {
    id % bound + 1
}

/// The single column an update rewrites, with the value it had before.
pub fn designated_field(entity: EntityKind) -> (&'static str, FieldValue) {
    match entity {
        EntityKind::Customer => ("email", FieldValue::from(PRIOR_EMAIL)),
        EntityKind::Order => ("status", FieldValue::from(ORDER_STATUSES[0])),
        EntityKind::Product => ("price", FieldValue::Decimal(Decimal::new(0, 2))),
        EntityKind::Inventory => ("quantity", FieldValue::Integer(0)),
    }
}

/// Synthesize the before/after images for one change.
pub fn synthesize<R: Rng + ?Sized>(
    entity: EntityKind,
    id: u64,
    op: Operation,
    now_ms: i64,
    rng: &mut R,
) -> Result<RowImages> {
    let row = synthesize_row(entity, id, op, now_ms, rng)?;
    Ok(derive_images(entity, row, op))
}

/// Build the current-state row. For updates and reads the designated field
/// is drawn from values that differ from its prior value.
pub fn synthesize_row<R: Rng + ?Sized>(
    entity: EntityKind,
    id: u64,
    op: Operation,
    now_ms: i64,
    rng: &mut R,
) -> Result<Record> {
    let progressed = matches!(op, Operation::Update | Operation::Read);

    let record = match entity {
        EntityKind::Customer => {
            let name: String = Name().fake_with_rng(rng);
            let email: String = SafeEmail().fake_with_rng(rng);
            Record::new()
                .with("id", id)
                .with("name", name)
                .with("email", email)
                .with("created_at", FieldValue::TimestampMillis(now_ms))
        }
        EntityKind::Order => {
            let statuses = if progressed {
                &ORDER_STATUSES[1..]
            } else {
                &ORDER_STATUSES[..]
            };
            Record::new()
                .with("id", id)
                .with("customer_id", referenced_id(id, CUSTOMER_REFERENCE_BOUND))
                .with("total_amount", amount(rng, 10.0, 10_000.0)?)
                .with("status", pick(rng, statuses))
                .with("created_at", FieldValue::TimestampMillis(now_ms))
        }
        EntityKind::Product => Record::new()
            .with("id", id)
            .with("name", product_name(rng))
            .with("category", pick(rng, &CATEGORIES))
            .with("price", amount(rng, 5.0, 500.0)?),
        EntityKind::Inventory => {
            let low = if progressed { 1 } else { 0 };
            Record::new()
                .with("id", id)
                .with("product_id", referenced_id(id, PRODUCT_REFERENCE_BOUND))
                .with("warehouse", pick(rng, &WAREHOUSES))
                .with("quantity", FieldValue::Integer(rng.gen_range(low..10_000)))
                .with("updated_at", FieldValue::TimestampMillis(now_ms))
        }
    };

    Ok(record)
}

/// Split a row into before/after images for `op`.
///
/// Create carries only `after`. Every other operation gets a `before` copy
/// with the designated field reset to its prior value, and delete drops
/// `after`.
pub fn derive_images(entity: EntityKind, row: Record, op: Operation) -> RowImages {
    match op {
        Operation::Create => RowImages {
            before: None,
            after: Some(row),
        },
        Operation::Update | Operation::Read => RowImages {
            before: Some(prior_image(entity, &row)),
            after: Some(row),
        },
        Operation::Delete => RowImages {
            before: Some(prior_image(entity, &row)),
            after: None,
        },
    }
}

fn prior_image(entity: EntityKind, row: &Record) -> Record {
    let (field, prior) = designated_field(entity);
    let mut before = row.clone();
    before.set(field, prior);
    before
}

/// Two-decimal amount in `[low, high)`, rounded half-up.
fn amount<R: Rng + ?Sized>(rng: &mut R, low: f64, high: f64) -> Result<Decimal> {
    let raw: f64 = rng.gen_range(low..high);
    let mut value = Decimal::from_f64(raw)
        .ok_or_else(|| ProducerError::Synthesis(format!("amount {} is not representable", raw)))?
        .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    value.rescale(2);
    Ok(value)
}

fn pick<'a, R: Rng + ?Sized>(rng: &mut R, options: &[&'a str]) -> &'a str {
    options[rng.gen_range(0..options.len())]
}

fn product_name<R: Rng + ?Sized>(rng: &mut R) -> String {
    format!(
        "{} {} {}",
        pick(rng, &PRODUCT_ADJECTIVES),
        pick(rng, &PRODUCT_MATERIALS),
        pick(rng, &PRODUCT_NOUNS)
    )
}
