use std::str;

use crate::{
    errors::{Error, Result},
    tag,
};

/// A parsed term tree.
///
/// Parsing stops at the structural level: children and map keys are kept as
/// terms, and interpretation (integer widening, textual coercion) is left to
/// the accessors or to [`term_to_value`](crate::term_to_value).
#[derive(Debug, Clone, PartialEq)]
pub enum Term {
    /// Any integer with a magnitude that fits a signed 64-bit value.
    Integer(i64),
    /// A positive big integer past `i64::MAX`.
    Unsigned(u64),
    /// An IEEE-754 double.
    Float(f64),
    /// A named constant.
    Atom(String),
    /// A length-prefixed byte sequence; the usual shape of text.
    Binary(Vec<u8>),
    /// The compact byte form of a list of small integers.
    Charlist(Vec<u8>),
    /// A proper list.
    List(Vec<Term>),
    /// A fixed-arity tuple.
    Tuple(Vec<Term>),
    /// A map of key/value pairs in wire order.
    Map(Vec<(Term, Term)>),
    /// The empty list.
    Nil,
}

impl Term {
    /// Parses a complete term, including the leading version byte.
    pub fn parse(input: &[u8]) -> Result<Term> {
        let mut decoder = Decoder::new(input);
        decoder.read_version()?;
        decoder.read_term()
    }

    /// The wire-level type of this term, for logging.
    pub fn type_name(&self) -> &'static str {
        match self {
            Term::Integer(_) => "integer",
            Term::Unsigned(_) => "integer",
            Term::Float(_) => "float",
            Term::Atom(_) => "atom",
            Term::Binary(_) => "binary",
            Term::Charlist(_) => "string",
            Term::List(_) => "list",
            Term::Tuple(_) => "tuple",
            Term::Map(_) => "map",
            Term::Nil => "nil",
        }
    }

    /// Interprets this term as text, tolerating any textual wire shape.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Term::Atom(name) => Some(name.as_str()),
            Term::Binary(bytes) | Term::Charlist(bytes) => str::from_utf8(bytes).ok(),
            Term::Nil => Some(""),
            _ => None,
        }
    }

    /// Interprets this term as an unsigned 64-bit integer, widening from any
    /// integer wire shape.
    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Term::Integer(i) if *i >= 0 => Some(*i as u64),
            Term::Unsigned(u) => Some(*u),
            _ => None,
        }
    }

    /// Interprets this term as a signed 64-bit integer.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Term::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Looks up a map entry by textual key.
    pub fn get(&self, key: &str) -> Option<&Term> {
        match self {
            Term::Map(entries) => entries
                .iter()
                .find(|(k, _)| k.as_str() == Some(key))
                .map(|(_, v)| v),
            _ => None,
        }
    }
}

/// A cursor over an encoded term buffer.
pub struct Decoder<'a> {
    input: &'a [u8],
    pos: usize,
}

impl<'a> Decoder<'a> {
    pub fn new(input: &'a [u8]) -> Decoder<'a> {
        Decoder { input, pos: 0 }
    }

    /// Consumes and checks the leading format version byte.
    pub fn read_version(&mut self) -> Result<()> {
        let byte = self.take_u8()?;
        if byte != crate::FORMAT_VERSION {
            return Err(Error::BadVersion(byte));
        }
        Ok(())
    }

    /// Reads the next complete term.
    pub fn read_term(&mut self) -> Result<Term> {
        match self.take_u8()? {
            tag::SMALL_INTEGER => Ok(Term::Integer(self.take_u8()? as i64)),
            tag::INTEGER => Ok(Term::Integer(self.take_i32()? as i64)),
            tag::NEW_FLOAT => Ok(Term::Float(f64::from_bits(self.take_u64()?))),
            tag::ATOM | tag::ATOM_UTF8 => {
                let len = self.take_u16()? as usize;
                self.take_atom(len)
            }
            tag::SMALL_ATOM | tag::SMALL_ATOM_UTF8 => {
                let len = self.take_u8()? as usize;
                self.take_atom(len)
            }
            tag::SMALL_TUPLE => {
                let arity = self.take_u8()? as usize;
                self.take_sequence(arity).map(Term::Tuple)
            }
            tag::LARGE_TUPLE => {
                let arity = self.take_u32()? as usize;
                self.take_sequence(arity).map(Term::Tuple)
            }
            tag::NIL => Ok(Term::Nil),
            tag::STRING => {
                let len = self.take_u16()? as usize;
                Ok(Term::Charlist(self.take_slice(len)?.to_vec()))
            }
            tag::LIST => {
                let len = self.take_u32()? as usize;
                let mut items = self.take_sequence(len)?;
                // a proper list ends in nil; tolerate improper tails
                match self.read_term()? {
                    Term::Nil => {}
                    tail => items.push(tail),
                }
                Ok(Term::List(items))
            }
            tag::BINARY => {
                let len = self.take_u32()? as usize;
                Ok(Term::Binary(self.take_slice(len)?.to_vec()))
            }
            tag::MAP => {
                let arity = self.take_u32()? as usize;
                let mut pairs = Vec::with_capacity(arity.min(4096));
                for _ in 0..arity {
                    let key = self.read_term()?;
                    let value = self.read_term()?;
                    pairs.push((key, value));
                }
                Ok(Term::Map(pairs))
            }
            tag::SMALL_BIG => {
                let count = self.take_u8()? as usize;
                self.take_big(count)
            }
            tag::LARGE_BIG => {
                let count = self.take_u32()? as usize;
                self.take_big(count)
            }
            other => Err(Error::BadTag(other)),
        }
    }

    fn take_atom(&mut self, len: usize) -> Result<Term> {
        let bytes = self.take_slice(len)?;
        Ok(Term::Atom(String::from_utf8_lossy(bytes).into_owned()))
    }

    fn take_sequence(&mut self, len: usize) -> Result<Vec<Term>> {
        let mut items = Vec::with_capacity(len.min(4096));
        for _ in 0..len {
            items.push(self.read_term()?);
        }
        Ok(items)
    }

    // Sign-magnitude little-endian big integer, widened into 64 bits.
    fn take_big(&mut self, count: usize) -> Result<Term> {
        let sign = self.take_u8()?;
        let bytes = self.take_slice(count)?;
        if bytes.iter().skip(8).any(|b| *b != 0) {
            return Err(Error::OutOfRange);
        }
        let mut magnitude: u64 = 0;
        for (i, byte) in bytes.iter().take(8).enumerate() {
            magnitude |= (*byte as u64) << (8 * i);
        }
        if sign == 0 {
            if magnitude <= i64::MAX as u64 {
                Ok(Term::Integer(magnitude as i64))
            } else {
                Ok(Term::Unsigned(magnitude))
            }
        } else if magnitude <= i64::MAX as u64 {
            Ok(Term::Integer(-(magnitude as i64)))
        } else if magnitude == 1 << 63 {
            Ok(Term::Integer(i64::MIN))
        } else {
            Err(Error::OutOfRange)
        }
    }

    fn take_u8(&mut self) -> Result<u8> {
        let byte = *self.input.get(self.pos).ok_or(Error::ShortBuffer)?;
        self.pos += 1;
        Ok(byte)
    }

    fn take_slice(&mut self, len: usize) -> Result<&'a [u8]> {
        let end = self.pos.checked_add(len).ok_or(Error::ShortBuffer)?;
        if end > self.input.len() {
            return Err(Error::ShortBuffer);
        }
        let slice = &self.input[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    fn take_u16(&mut self) -> Result<u16> {
        let bytes = self.take_slice(2)?;
        Ok(u16::from_be_bytes([bytes[0], bytes[1]]))
    }

    fn take_u32(&mut self) -> Result<u32> {
        let bytes = self.take_slice(4)?;
        Ok(u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    fn take_i32(&mut self) -> Result<i32> {
        self.take_u32().map(|u| u as i32)
    }

    fn take_u64(&mut self) -> Result<u64> {
        let bytes = self.take_slice(8)?;
        let mut raw = [0u8; 8];
        raw.copy_from_slice(bytes);
        Ok(u64::from_be_bytes(raw))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_a_wrong_version_byte() {
        match Term::parse(&[130, 97, 1]) {
            Err(Error::BadVersion(130)) => {}
            other => panic!("expected BadVersion, got {:?}", other),
        }
    }

    #[test]
    fn rejects_unknown_tags() {
        match Term::parse(&[131, 42]) {
            Err(Error::BadTag(42)) => {}
            other => panic!("expected BadTag, got {:?}", other),
        }
    }

    #[test]
    fn rejects_truncated_input() {
        match Term::parse(&[131, 109, 0, 0, 0, 9, b'h', b'i']) {
            Err(Error::ShortBuffer) => {}
            other => panic!("expected ShortBuffer, got {:?}", other),
        }
    }

    #[test]
    fn rejects_bigs_past_64_bits() {
        let mut input = vec![131, 110, 9, 0];
        input.extend_from_slice(&[0xFF; 9]);
        match Term::parse(&input) {
            Err(Error::OutOfRange) => {}
            other => panic!("expected OutOfRange, got {:?}", other),
        }
    }

    #[test]
    fn widens_bigs_into_64_bit_integers() {
        // 2^32 as a five byte little-endian magnitude
        let term = Term::parse(&[131, 110, 5, 0, 0, 0, 0, 0, 1]).unwrap();
        assert_eq!(term.as_u64(), Some(1 << 32));
        let term = Term::parse(&[131, 110, 5, 1, 0, 0, 0, 0, 1]).unwrap();
        assert_eq!(term.as_i64(), Some(-(1i64 << 32)));
    }

    #[test]
    fn parses_nested_structure_as_a_tree() {
        // #{<<"op">> => 0, <<"s">> => 42}
        let mut input = vec![131, 116, 0, 0, 0, 2];
        input.extend_from_slice(&[109, 0, 0, 0, 2, b'o', b'p', 97, 0]);
        input.extend_from_slice(&[109, 0, 0, 0, 1, b's', 97, 42]);
        let term = Term::parse(&input).unwrap();
        assert_eq!(term.type_name(), "map");
        assert_eq!(term.get("op").and_then(Term::as_u64), Some(0));
        assert_eq!(term.get("s").and_then(Term::as_u64), Some(42));
    }

    #[test]
    fn textual_terms_are_interchangeable() {
        let atom = Term::parse(b"\x83\x73\x02ok").unwrap();
        let binary = Term::parse(&[131, 109, 0, 0, 0, 2, b'o', b'k']).unwrap();
        let charlist = Term::parse(&[131, 107, 0, 2, b'o', b'k']).unwrap();
        assert_eq!(atom.as_str(), Some("ok"));
        assert_eq!(binary.as_str(), Some("ok"));
        assert_eq!(charlist.as_str(), Some("ok"));
    }
}
