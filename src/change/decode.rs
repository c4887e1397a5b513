//! Decoding raw change records into typed domain events.
//!
//! Decode failures are local to one record; the dispatcher logs them and
//! moves on. Missing optional attributes fall back to documented defaults,
//! while missing identity fields and malformed values fail the record.

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::domain::{BookSnapshot, PurchaseLineItem, PurchaseSnapshot};

use super::record::{AttrError, AttrMap, AttrValue, ChangeRecord, EntityKind, EventKind};

/// Default language code when a book carries none.
pub const DEFAULT_LANGUAGE: &str = "es";

/// Failure to decode one change record.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("{kind} record carries no {side} image")]
    MissingImage { kind: EventKind, side: &'static str },

    #[error(transparent)]
    Attr(#[from] AttrError),

    #[error("attribute {field:?} is not a valid timestamp: {value:?}")]
    InvalidTimestamp { field: &'static str, value: String },
}

/// A change record classified and typed.
#[derive(Debug, Clone, PartialEq)]
pub enum DomainEvent {
    BookUpserted(BookSnapshot),
    BookRemoved {
        tenant_id: String,
        book_id: String,
    },
    PurchaseUpserted {
        purchase: Box<PurchaseSnapshot>,
        kind: EventKind,
    },
    PurchaseRemoved {
        tenant_id: String,
        purchase_id: String,
    },
}

/// Decode one raw change record into a domain event.
pub fn decode(record: &ChangeRecord) -> Result<DomainEvent, DecodeError> {
    let kind = record.event_name;
    match (record.entity_kind, kind) {
        (EntityKind::Book, EventKind::Insert | EventKind::Modify) => {
            let image = after_image(record)?;
            Ok(DomainEvent::BookUpserted(decode_book(image)?))
        }
        (EntityKind::Book, EventKind::Remove) => {
            let image = before_image(record)?;
            Ok(DomainEvent::BookRemoved {
                tenant_id: image.require_str("tenant_id")?,
                book_id: image.require_str("book_id")?,
            })
        }
        (EntityKind::Purchase, EventKind::Insert | EventKind::Modify) => {
            let image = after_image(record)?;
            Ok(DomainEvent::PurchaseUpserted {
                purchase: Box::new(decode_purchase(image)?),
                kind,
            })
        }
        (EntityKind::Purchase, EventKind::Remove) => {
            let image = before_image(record)?;
            Ok(DomainEvent::PurchaseRemoved {
                tenant_id: image.require_str("tenant_id")?,
                purchase_id: image.require_str("purchase_id")?,
            })
        }
    }
}

fn after_image(record: &ChangeRecord) -> Result<&AttrMap, DecodeError> {
    record.after.as_ref().ok_or(DecodeError::MissingImage {
        kind: record.event_name,
        side: "after",
    })
}

fn before_image(record: &ChangeRecord) -> Result<&AttrMap, DecodeError> {
    record.before.as_ref().ok_or(DecodeError::MissingImage {
        kind: record.event_name,
        side: "before",
    })
}

fn decode_book(attrs: &AttrMap) -> Result<BookSnapshot, DecodeError> {
    Ok(BookSnapshot {
        book_id: attrs.require_str("book_id")?,
        tenant_id: attrs.require_str("tenant_id")?,
        isbn: attrs.string_or_default("isbn"),
        title: attrs.string_or_default("title"),
        author: attrs.string_or_default("author"),
        editorial: attrs.string_or_default("editorial"),
        category: attrs.string_or_default("category"),
        price: attrs.decimal_or_zero("price")?,
        description: attrs.string_or_default("description"),
        cover_image_url: attrs.string_or_default("cover_image_url"),
        stock_quantity: attrs.u32_or_zero("stock_quantity")?,
        publication_year: attrs.i32_or_zero("publication_year")?,
        language: attrs.string_or("language", DEFAULT_LANGUAGE),
        pages: attrs.u32_or_zero("pages")?,
        rating: attrs.f64_or_zero("rating")?,
        created_at: attrs.string_or_default("created_at"),
        updated_at: attrs.string_or_default("updated_at"),
        is_active: attrs.bool_or("is_active", true),
    })
}

fn decode_purchase(attrs: &AttrMap) -> Result<PurchaseSnapshot, DecodeError> {
    let created_at_raw = attrs.require_str("created_at")?;
    let created_at = parse_timestamp("created_at", &created_at_raw)?;

    let mut items = Vec::new();
    for entry in attrs.list("items") {
        items.push(decode_line_item(entry)?);
    }

    Ok(PurchaseSnapshot {
        purchase_id: attrs.require_str("purchase_id")?,
        tenant_id: attrs.require_str("tenant_id")?,
        user_id: attrs.string_or_default("user_id"),
        total_amount: attrs.decimal_or_zero("total_amount")?,
        status: attrs.string_or_default("status"),
        payment_method: attrs.string_or_default("payment_method"),
        created_at,
        updated_at: attrs.string_or_default("updated_at"),
        items,
    })
}

fn decode_line_item(entry: &AttrValue) -> Result<PurchaseLineItem, DecodeError> {
    let attrs = match entry {
        AttrValue::Map(m) => AttrMap(m.clone()),
        other => {
            return Err(AttrError::Invalid {
                field: "items",
                expected: "map entry",
                value: format!("{other:?}"),
            }
            .into())
        }
    };

    Ok(PurchaseLineItem {
        book_id: attrs.string_or_default("book_id"),
        quantity: attrs.u32_or_zero("quantity")?,
        unit_price: attrs.decimal_or_zero("unit_price")?,
        subtotal: attrs.decimal_or_zero("subtotal")?,
        title: attrs.string_or_default("title"),
        author: attrs.string_or_default("author"),
    })
}

/// Parse an event-time timestamp from the entity's own attributes.
///
/// Malformed timestamps fail the record; they are never defaulted to the
/// processing clock, which would corrupt partitioning.
fn parse_timestamp(field: &'static str, value: &str) -> Result<DateTime<Utc>, DecodeError> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| DecodeError::InvalidTimestamp {
            field,
            value: value.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use serde_json::json;

    fn record(value: serde_json::Value) -> ChangeRecord {
        serde_json::from_value(value).unwrap()
    }

    fn book_insert() -> ChangeRecord {
        record(json!({
            "eventName": "INSERT",
            "entityKind": "BOOK",
            "after": {
                "book_id": {"S": "b-1"},
                "tenant_id": {"S": "t1"},
                "title": {"S": "Cien años de soledad"},
                "author": {"S": "Gabriel García Márquez"},
                "category": {"S": "fiction"},
                "price": {"N": "19.99"},
            }
        }))
    }

    #[test]
    fn test_book_insert_decodes_with_defaults() {
        let event = decode(&book_insert()).unwrap();

        let DomainEvent::BookUpserted(book) = event else {
            panic!("expected BookUpserted, got {event:?}");
        };
        assert_eq!(book.book_id, "b-1");
        assert_eq!(book.tenant_id, "t1");
        assert_eq!(book.price, dec!(19.99));
        assert_eq!(book.stock_quantity, 0);
        assert_eq!(book.language, DEFAULT_LANGUAGE);
        assert!(book.is_active);
    }

    #[test]
    fn test_book_remove_reads_before_image() {
        let event = decode(&record(json!({
            "eventName": "REMOVE",
            "entityKind": "BOOK",
            "before": {
                "book_id": {"S": "b-9"},
                "tenant_id": {"S": "t1"},
            }
        })))
        .unwrap();

        assert_eq!(
            event,
            DomainEvent::BookRemoved {
                tenant_id: "t1".to_string(),
                book_id: "b-9".to_string(),
            }
        );
    }

    #[test]
    fn test_missing_identity_fails_record() {
        let result = decode(&record(json!({
            "eventName": "INSERT",
            "entityKind": "BOOK",
            "after": {"title": {"S": "orphan"}}
        })));

        assert!(matches!(
            result,
            Err(DecodeError::Attr(AttrError::Missing("book_id")))
        ));
    }

    #[test]
    fn test_missing_image_fails_record() {
        let result = decode(&record(json!({
            "eventName": "REMOVE",
            "entityKind": "BOOK",
        })));

        assert!(matches!(
            result,
            Err(DecodeError::MissingImage { side: "before", .. })
        ));
    }

    #[test]
    fn test_purchase_decodes_line_items_and_event_time() {
        let event = decode(&record(json!({
            "eventName": "INSERT",
            "entityKind": "PURCHASE",
            "after": {
                "purchase_id": {"S": "p-1"},
                "tenant_id": {"S": "t1"},
                "user_id": {"S": "u-1"},
                "total_amount": {"N": "35.50"},
                "payment_method": {"S": "card"},
                "created_at": {"S": "2024-03-15T10:00:00Z"},
                "items": {"L": [
                    {"M": {
                        "book_id": {"S": "b-1"},
                        "quantity": {"N": "2"},
                        "unit_price": {"N": "10.00"},
                        "subtotal": {"N": "20.00"},
                    }},
                    {"M": {
                        "book_id": {"S": "b-2"},
                        "quantity": {"N": "3"},
                    }},
                ]},
            }
        })))
        .unwrap();

        let DomainEvent::PurchaseUpserted { purchase, kind } = event else {
            panic!("expected PurchaseUpserted");
        };
        assert_eq!(kind, EventKind::Insert);
        assert_eq!(purchase.total_amount, dec!(35.50));
        assert_eq!(purchase.items.len(), 2);
        assert_eq!(purchase.items[1].quantity, 3);
        assert_eq!(purchase.items[1].unit_price, Decimal::ZERO);
        assert_eq!(
            purchase.created_at,
            Utc.with_ymd_and_hms(2024, 3, 15, 10, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_malformed_created_at_is_a_decode_error() {
        let result = decode(&record(json!({
            "eventName": "INSERT",
            "entityKind": "PURCHASE",
            "after": {
                "purchase_id": {"S": "p-1"},
                "tenant_id": {"S": "t1"},
                "created_at": {"S": "yesterday-ish"},
            }
        })));

        assert!(matches!(
            result,
            Err(DecodeError::InvalidTimestamp {
                field: "created_at",
                ..
            })
        ));
    }

    #[test]
    fn test_purchase_remove_is_classified() {
        let event = decode(&record(json!({
            "eventName": "REMOVE",
            "entityKind": "PURCHASE",
            "before": {
                "purchase_id": {"S": "p-7"},
                "tenant_id": {"S": "t1"},
            }
        })))
        .unwrap();

        assert_eq!(
            event,
            DomainEvent::PurchaseRemoved {
                tenant_id: "t1".to_string(),
                purchase_id: "p-7".to_string(),
            }
        );
    }
}
