use std::fmt;

use serde::{de, de::{Deserializer, Visitor}, Deserialize};
use serde::ser::{Serialize, Serializer};

use accord_etf::{Encoder, IntoTerm, Result as EtfResult};

/// A 64-bit Twitter snowflake, used as the ID for most Discord entities.
///
/// Snowflakes travel as decimal strings in JSON payloads and as plain
/// unsigned integers in ETF payloads; equality and hashing always use the
/// numeric value.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Snowflake(pub u64);

impl From<u64> for Snowflake {
    fn from(u: u64) -> Self {
        Snowflake(u)
    }
}

impl From<Snowflake> for u64 {
    fn from(s: Snowflake) -> u64 {
        s.0
    }
}

impl fmt::Display for Snowflake {
    fn fmt(&self, fmtter: &mut fmt::Formatter) -> fmt::Result {
        write!(fmtter, "{}", self.0)
    }
}

impl Serialize for Snowflake {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where S: Serializer,
    {
        serializer.serialize_str(self.0.to_string().as_str())
    }
}

impl IntoTerm for Snowflake {
    fn encode(&self, encoder: &mut Encoder) -> EtfResult<()> {
        encoder.write_unsigned(self.0)
    }
}

struct SnowflakeVisitor;

impl<'de> Visitor<'de> for SnowflakeVisitor {
    type Value = Snowflake;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a snowflake as a string or an unsigned integer")
    }

    fn visit_str<E>(self, value: &str) -> std::result::Result<Self::Value, E>
        where
            E: de::Error,
    {
        let i: u64 = value.parse().map_err(|_| de::Error::invalid_type(de::Unexpected::Str(value), &self))?;
        Ok(Snowflake(i))
    }

    fn visit_u64<E>(self, value: u64) -> std::result::Result<Self::Value, E>
        where
            E: de::Error,
    {
        Ok(Snowflake(value))
    }

    fn visit_i64<E>(self, value: i64) -> std::result::Result<Self::Value, E>
        where
            E: de::Error,
    {
        if value < 0 {
            return Err(de::Error::invalid_value(de::Unexpected::Signed(value), &self));
        }
        Ok(Snowflake(value as u64))
    }
}

impl<'de> Deserialize<'de> for Snowflake {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Snowflake, D::Error>
        where
            D: Deserializer<'de>,
    {
        deserializer.deserialize_any(SnowflakeVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::Snowflake;

    #[test]
    fn serializes_as_string() {
        let json = serde_json::to_string(&Snowflake(448379145494265858)).unwrap();
        assert_eq!(json, "\"448379145494265858\"");
    }

    #[test]
    fn deserializes_from_string_and_integer() {
        let from_str: Snowflake = serde_json::from_str("\"42\"").unwrap();
        let from_int: Snowflake = serde_json::from_str("42").unwrap();
        assert_eq!(from_str, from_int);
        assert_eq!(from_str.0, 42);
    }
}
