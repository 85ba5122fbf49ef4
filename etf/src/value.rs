use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Number, Value};

use crate::{
    buffer::EtfBuffer,
    decode::Term,
    encode::Encoder,
    errors::Result,
};

/// Serializes any record to a complete term buffer, version byte included.
///
/// Records are flattened through `serde_json::Value`, so field names become
/// binary map keys and absent (`None`, skipped) fields are omitted entirely.
/// Types with a hand-written term shape should go through
/// [`Encoder::write`](crate::Encoder::write) instead.
pub fn to_bytes<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    let json = serde_json::to_value(value)?;
    let mut buf = EtfBuffer::resizable();
    let mut encoder = Encoder::new(&mut buf);
    encoder.write_version()?;
    encoder.write_value(&json)?;
    Ok(buf.into_vec())
}

/// Deserializes a record from a complete term buffer.
///
/// The term tree is bridged through `serde_json::Value`: unknown map keys
/// are skipped by serde, missing keys take their defaults, and integers are
/// widened from whichever wire shape they arrived in.
pub fn from_bytes<T: DeserializeOwned>(input: &[u8]) -> Result<T> {
    let term = Term::parse(input)?;
    serde_json::from_value(term_to_value(&term)).map_err(Into::into)
}

/// Lowers a parsed term into a JSON value, interpreting atoms and binaries.
///
/// The conversion is tolerant in the directions the gateway exercises: any
/// textual shape (binary, charlist, atom) becomes a string, the atoms
/// `true`/`false`/`nil` become their scalar meanings, and the empty list is
/// an empty array.
pub fn term_to_value(term: &Term) -> Value {
    match term {
        Term::Integer(i) => Value::Number(Number::from(*i)),
        Term::Unsigned(u) => Value::Number(Number::from(*u)),
        Term::Float(f) => Number::from_f64(*f).map(Value::Number).unwrap_or(Value::Null),
        Term::Atom(name) => match name.as_str() {
            "true" => Value::Bool(true),
            "false" => Value::Bool(false),
            "nil" | "null" => Value::Null,
            other => Value::String(other.to_string()),
        },
        Term::Binary(bytes) | Term::Charlist(bytes) => {
            Value::String(String::from_utf8_lossy(bytes).into_owned())
        }
        Term::Nil => Value::Array(Vec::new()),
        Term::List(items) | Term::Tuple(items) => {
            Value::Array(items.iter().map(term_to_value).collect())
        }
        Term::Map(entries) => {
            let mut object = Map::with_capacity(entries.len());
            for (key, value) in entries {
                let name = match key.as_str() {
                    Some(text) => text.to_string(),
                    None => match term_to_value(key) {
                        Value::String(s) => s,
                        other => other.to_string(),
                    },
                };
                object.insert(name, term_to_value(value));
            }
            Value::Object(object)
        }
    }
}

#[cfg(test)]
mod tests {
    use serde::{Deserialize, Serialize};

    use super::*;

    #[derive(Serialize, Deserialize, Debug, Default, PartialEq)]
    struct Session {
        id: u64,
        name: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        topic: Option<String>,
        #[serde(default)]
        tags: Vec<String>,
        #[serde(default)]
        active: bool,
    }

    fn round_trip<T: Serialize + DeserializeOwned>(value: &T) -> T {
        from_bytes(&to_bytes(value).unwrap()).unwrap()
    }

    #[test]
    fn integers_round_trip_across_all_wire_forms() {
        for value in &[
            0i64,
            1,
            255,
            256,
            -1,
            i32::MAX as i64,
            i32::MIN as i64,
            i32::MAX as i64 + 1,
            i64::MAX,
            i64::MIN + 1,
            i64::MIN,
        ] {
            assert_eq!(round_trip(value), *value, "value {}", value);
        }
        assert_eq!(round_trip(&u64::MAX), u64::MAX);
    }

    #[test]
    fn floats_and_strings_round_trip() {
        assert_eq!(round_trip(&1.5f64), 1.5);
        assert_eq!(round_trip(&-0.25f64), -0.25);
        let text = String::from("héllo wörld ☃");
        assert_eq!(round_trip(&text), text);
    }

    #[test]
    fn scalars_and_sequences_round_trip() {
        assert_eq!(round_trip(&true), true);
        assert_eq!(round_trip(&false), false);
        let empty: Vec<u8> = Vec::new();
        assert_eq!(round_trip(&empty), empty);
        assert_eq!(round_trip(&vec![1u8, 2, 3]), vec![1u8, 2, 3]);
        assert_eq!(round_trip(&(1u8, String::from("two"))), (1u8, String::from("two")));
    }

    #[test]
    fn records_with_optional_fields_round_trip() {
        let full = Session {
            id: 1 << 40,
            name: String::from("general"),
            topic: Some(String::from("rust")),
            tags: vec![String::from("a"), String::from("b")],
            active: true,
        };
        assert_eq!(round_trip(&full), full);

        let sparse = Session { id: 7, name: String::from("sparse"), ..Default::default() };
        assert_eq!(round_trip(&sparse), sparse);
    }

    #[test]
    fn absent_fields_are_omitted_from_the_wire() {
        let sparse = Session { id: 7, name: String::from("x"), ..Default::default() };
        let term = Term::parse(&to_bytes(&sparse).unwrap()).unwrap();
        assert!(term.get("topic").is_none());
    }

    #[test]
    fn unknown_map_keys_are_skipped_on_decode() {
        let value = serde_json::json!({
            "id": 3,
            "name": "x",
            "something_new": {"deeply": ["nested", 1]},
        });
        let bytes = to_bytes(&value).unwrap();
        let session: Session = from_bytes(&bytes).unwrap();
        assert_eq!(session.id, 3);
        assert_eq!(session.name, "x");
    }

    #[test]
    fn null_encodes_as_the_nil_atom() {
        let bytes = to_bytes(&Value::Null).unwrap();
        assert_eq!(bytes, b"\x83\x73\x03nil");
        assert_eq!(from_bytes::<Option<u8>>(&bytes).unwrap(), None);
    }
}
