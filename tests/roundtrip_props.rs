//! Property checks over hydration, encodings and the memory store

mod common;

use chrono::{DateTime, TimeZone, Utc};
use common::*;
use proptest::prelude::*;
use recordmap::{encoding, extract, hydrate, Record, Value};

fn arb_timestamp() -> impl Strategy<Value = Option<DateTime<Utc>>> {
    prop::option::of((0i64..4_102_444_800).prop_map(|secs| {
        Utc.timestamp_opt(secs, 0)
            .single()
            .unwrap_or_else(|| utc(2000, 1, 1, 0, 0))
    }))
}

fn arb_example() -> impl Strategy<Value = ExampleDto> {
    (
        "[A-Za-z][A-Za-z ]{0,20}",
        any::<i64>(),
        "[a-z]{1,12}@[a-z]{1,8}\\.com",
        arb_timestamp(),
        arb_timestamp(),
        1i64..1_000_000,
    )
        .prop_map(|(name, age, email, created_at, updated_at, id)| ExampleDto {
            name,
            age,
            email,
            created_at,
            updated_at,
            id,
        })
}

proptest! {
    #[test]
    fn test_extract_then_hydrate_is_identity(record in arb_example()) {
        let restored: ExampleDto = hydrate(extract(&record).unwrap()).unwrap();
        prop_assert_eq!(restored, record);
    }

    #[test]
    fn test_encode_then_decode_drops_only_hidden_fields(record in arb_example()) {
        let decoded: ExampleDto = encoding::decode(encoding::encode(&record).unwrap()).unwrap();
        prop_assert_eq!(decoded, ExampleDto { id: 0, ..record });
    }

    #[test]
    fn test_map_form_keeps_everything(record in arb_example()) {
        let restored: ExampleDto = encoding::from_map(encoding::to_map(&record).unwrap()).unwrap();
        prop_assert_eq!(restored, record);
    }

    #[test]
    fn test_encoded_keys_never_include_hidden(record in arb_example()) {
        let encoded = encoding::encode(&record).unwrap();
        prop_assert!(encoded.get("id").is_none());
        prop_assert_eq!(encoded.as_object().map(|o| o.len()), Some(5));
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn test_inserted_record_fetchable_by_id(mut record in arb_example()) {
        let store = example_store();
        record.id = 0;
        record.insert(&store).unwrap();
        prop_assert_eq!(record.id, 4);

        let fetched = ExampleDto::fetch_by_id(&store, Value::Int(record.id)).unwrap();
        prop_assert_eq!(fetched, record);
    }
}
