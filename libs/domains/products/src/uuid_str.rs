//! Serde adapter keeping every stored UUID a hyphenated string.
//!
//! `uuid::Uuid` picks its encoding from the serializer: a string for JSON
//! and `to_bson`, raw bytes for the driver's document encoder. Pinning the
//! string form keeps inserted documents, `_id` filters and `$lookup` joins
//! on one representation.

use serde::{de, Deserialize, Deserializer, Serializer};
use uuid::Uuid;

pub fn serialize<S: Serializer>(id: &Uuid, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(&id.hyphenated())
}

pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Uuid, D::Error> {
    let raw = String::deserialize(deserializer)?;
    Uuid::parse_str(&raw).map_err(de::Error::custom)
}

pub mod option {
    use super::*;

    pub fn serialize<S: Serializer>(id: &Option<Uuid>, serializer: S) -> Result<S::Ok, S::Error> {
        match id {
            Some(id) => serializer.collect_str(&id.hyphenated()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<Uuid>, D::Error> {
        Option::<String>::deserialize(deserializer)?
            .map(|raw| Uuid::parse_str(&raw).map_err(de::Error::custom))
            .transpose()
    }
}

/// The stored form of `id`, for filters and lookups.
pub fn to_db(id: Uuid) -> String {
    id.hyphenated().to_string()
}

#[cfg(test)]
mod tests {
    use mongodb::bson::{doc, from_slice, to_raw_document_buf};
    use serde::{Deserialize, Serialize};
    use uuid::Uuid;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Row {
        #[serde(rename = "_id", with = "super")]
        id: Uuid,
        #[serde(default, with = "super::option")]
        owner: Option<Uuid>,
    }

    #[test]
    fn test_driver_encoding_matches_filter() {
        let row = Row {
            id: Uuid::now_v7(),
            owner: Some(Uuid::now_v7()),
        };

        // Same encoder `insert_one` uses
        let stored = to_raw_document_buf(&row).unwrap().to_document().unwrap();

        let expected = doc! {
            "_id": super::to_db(row.id),
            "owner": super::to_db(row.owner.unwrap()),
        };
        assert_eq!(stored, expected);
    }

    #[test]
    fn test_reads_back_from_driver_encoding() {
        let row = Row {
            id: Uuid::now_v7(),
            owner: None,
        };
        let stored = to_raw_document_buf(&row).unwrap();
        let back: Row = from_slice(stored.as_bytes()).unwrap();
        assert_eq!(back, row);
    }

    #[test]
    fn test_json_stays_hyphenated() {
        let id = Uuid::now_v7();
        let json = serde_json::to_value(Row { id, owner: Some(id) }).unwrap();
        assert_eq!(json["_id"], id.to_string());
        assert_eq!(json["owner"], id.to_string());
    }
}
