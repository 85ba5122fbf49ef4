use serde_json::Value;

use crate::{
    buffer::EtfBuffer,
    errors::{Error, Result},
    tag,
};

/// A type that knows how to encode itself as a term.
///
/// Implementations take precedence over the reflective record bridge in
/// [`to_bytes`](crate::to_bytes): a type with a hand-written term shape is
/// written through [`Encoder::write`] instead of being flattened to a map.
pub trait IntoTerm {
    /// Writes this value as a single term.
    fn encode(&self, encoder: &mut Encoder) -> Result<()>;
}

impl IntoTerm for Value {
    fn encode(&self, encoder: &mut Encoder) -> Result<()> {
        encoder.write_value(self)
    }
}

/// A typed term writer over an [`EtfBuffer`].
///
/// Every public write either appends a complete term or leaves the buffer
/// untouched; a failure mid-term rolls back to the previous length.
pub struct Encoder<'a> {
    buf: &'a mut EtfBuffer,
}

impl<'a> Encoder<'a> {
    pub fn new(buf: &'a mut EtfBuffer) -> Encoder<'a> {
        Encoder { buf }
    }

    /// Writes the leading format version byte.
    pub fn write_version(&mut self) -> Result<()> {
        self.buf.put_u8(crate::FORMAT_VERSION)
    }

    /// Writes a custom term via its [`IntoTerm`] hook.
    pub fn write<T: IntoTerm + ?Sized>(&mut self, value: &T) -> Result<()> {
        self.guarded(|enc| value.encode(enc))
    }

    /// Writes an atom, choosing the small form when the name fits one byte.
    pub fn write_atom(&mut self, name: &str) -> Result<()> {
        self.guarded(|enc| {
            let bytes = name.as_bytes();
            if bytes.len() <= u8::MAX as usize {
                enc.buf.put_u8(tag::SMALL_ATOM)?;
                enc.buf.put_u8(bytes.len() as u8)?;
            } else if bytes.len() <= u16::MAX as usize {
                enc.buf.put_u8(tag::ATOM)?;
                enc.buf.put_u16(bytes.len() as u16)?;
            } else {
                return Err(Error::OutOfRange);
            }
            enc.buf.put_slice(bytes)
        })
    }

    /// Writes a boolean as the atom `true` or `false`.
    pub fn write_bool(&mut self, value: bool) -> Result<()> {
        self.write_atom(if value { "true" } else { "false" })
    }

    /// Writes the atom `nil`, the encoding of an absent value.
    pub fn write_nil(&mut self) -> Result<()> {
        self.write_atom("nil")
    }

    /// Writes an unsigned integer in its smallest wire form.
    pub fn write_unsigned(&mut self, value: u64) -> Result<()> {
        self.guarded(|enc| {
            if value <= u8::MAX as u64 {
                enc.buf.put_u8(tag::SMALL_INTEGER)?;
                enc.buf.put_u8(value as u8)
            } else if value <= i32::MAX as u64 {
                enc.buf.put_u8(tag::INTEGER)?;
                enc.buf.put_i32(value as i32)
            } else {
                enc.write_big(0, value)
            }
        })
    }

    /// Writes a signed integer in its smallest wire form.
    pub fn write_integer(&mut self, value: i64) -> Result<()> {
        self.guarded(|enc| {
            if value >= 0 && value <= u8::MAX as i64 {
                enc.buf.put_u8(tag::SMALL_INTEGER)?;
                enc.buf.put_u8(value as u8)
            } else if value >= i32::MIN as i64 && value <= i32::MAX as i64 {
                enc.buf.put_u8(tag::INTEGER)?;
                enc.buf.put_i32(value as i32)
            } else {
                let sign = if value < 0 { 1 } else { 0 };
                enc.write_big(sign, value.unsigned_abs())
            }
        })
    }

    // Length-minimal sign-magnitude little-endian form; always fits the
    // small-big tag since the magnitude is at most eight bytes.
    fn write_big(&mut self, sign: u8, magnitude: u64) -> Result<()> {
        let bytes = magnitude.to_le_bytes();
        let count = 8 - magnitude.leading_zeros() as usize / 8;
        let count = count.max(1);
        self.buf.put_u8(tag::SMALL_BIG)?;
        self.buf.put_u8(count as u8)?;
        self.buf.put_u8(sign)?;
        self.buf.put_slice(&bytes[..count])
    }

    /// Writes a double as an IEEE-754 big-endian float term.
    pub fn write_float(&mut self, value: f64) -> Result<()> {
        self.guarded(|enc| {
            enc.buf.put_u8(tag::NEW_FLOAT)?;
            enc.buf.put_f64(value)
        })
    }

    /// Writes a byte sequence as a binary term.
    pub fn write_binary(&mut self, bytes: &[u8]) -> Result<()> {
        self.guarded(|enc| {
            if bytes.len() > u32::MAX as usize {
                return Err(Error::OutOfRange);
            }
            enc.buf.put_u8(tag::BINARY)?;
            enc.buf.put_u32(bytes.len() as u32)?;
            enc.buf.put_slice(bytes)
        })
    }

    /// Writes a string as a binary term.
    pub fn write_binary_str(&mut self, value: &str) -> Result<()> {
        self.write_binary(value.as_bytes())
    }

    /// Writes the header of a non-empty list. The caller writes `len`
    /// elements followed by [`write_list_tail`](Self::write_list_tail).
    pub fn write_list_header(&mut self, len: u32) -> Result<()> {
        self.guarded(|enc| {
            enc.buf.put_u8(tag::LIST)?;
            enc.buf.put_u32(len)
        })
    }

    /// Writes the nil tail that terminates a proper list.
    pub fn write_list_tail(&mut self) -> Result<()> {
        self.buf.put_u8(tag::NIL)
    }

    /// Writes the empty list.
    pub fn write_empty_list(&mut self) -> Result<()> {
        self.buf.put_u8(tag::NIL)
    }

    /// Writes a tuple header; the caller writes `arity` elements after it.
    pub fn write_tuple_header(&mut self, arity: usize) -> Result<()> {
        self.guarded(|enc| {
            if arity <= u8::MAX as usize {
                enc.buf.put_u8(tag::SMALL_TUPLE)?;
                enc.buf.put_u8(arity as u8)
            } else if arity <= u32::MAX as usize {
                enc.buf.put_u8(tag::LARGE_TUPLE)?;
                enc.buf.put_u32(arity as u32)
            } else {
                Err(Error::OutOfRange)
            }
        })
    }

    /// Writes a map header; the caller writes `arity` key/value pairs after it.
    pub fn write_map_header(&mut self, arity: u32) -> Result<()> {
        self.guarded(|enc| {
            enc.buf.put_u8(tag::MAP)?;
            enc.buf.put_u32(arity)
        })
    }

    /// Writes an arbitrary JSON value as a term.
    ///
    /// Strings become binaries, records become maps keyed by binary field
    /// names, empty arrays become the empty list and null becomes the atom
    /// `nil`.
    pub fn write_value(&mut self, value: &Value) -> Result<()> {
        self.guarded(|enc| enc.write_value_inner(value))
    }

    fn write_value_inner(&mut self, value: &Value) -> Result<()> {
        match value {
            Value::Null => self.write_nil(),
            Value::Bool(b) => self.write_bool(*b),
            Value::Number(n) => {
                if let Some(u) = n.as_u64() {
                    self.write_unsigned(u)
                } else if let Some(i) = n.as_i64() {
                    self.write_integer(i)
                } else {
                    // not representable as an integer, must be a float
                    self.write_float(n.as_f64().ok_or(Error::OutOfRange)?)
                }
            }
            Value::String(s) => self.write_binary_str(s),
            Value::Array(items) => {
                if items.is_empty() {
                    return self.write_empty_list();
                }
                if items.len() > u32::MAX as usize {
                    return Err(Error::OutOfRange);
                }
                self.write_list_header(items.len() as u32)?;
                for item in items {
                    self.write_value_inner(item)?;
                }
                self.write_list_tail()
            }
            Value::Object(entries) => {
                if entries.len() > u32::MAX as usize {
                    return Err(Error::OutOfRange);
                }
                self.write_map_header(entries.len() as u32)?;
                for (key, entry) in entries {
                    self.write_binary_str(key)?;
                    self.write_value_inner(entry)?;
                }
                Ok(())
            }
        }
    }

    fn guarded<F>(&mut self, write: F) -> Result<()>
    where
        F: FnOnce(&mut Self) -> Result<()>,
    {
        let mark = self.buf.len();
        write(self).map_err(|err| {
            self.buf.truncate(mark);
            err
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode_one<F>(write: F) -> Vec<u8>
    where
        F: FnOnce(&mut Encoder) -> Result<()>,
    {
        let mut buf = EtfBuffer::resizable();
        let mut enc = Encoder::new(&mut buf);
        enc.write_version().unwrap();
        write(&mut enc).unwrap();
        buf.into_vec()
    }

    #[test]
    fn atoms_use_the_small_form() {
        let bytes = encode_one(|enc| enc.write_atom("Hello World"));
        let mut expected = vec![0x83, 0x73, 0x0B];
        expected.extend_from_slice(b"Hello World");
        assert_eq!(bytes, expected);
    }

    #[test]
    fn booleans_encode_as_atoms() {
        assert_eq!(encode_one(|enc| enc.write_bool(true)), b"\x83\x73\x04true");
        assert_eq!(encode_one(|enc| enc.write_bool(false)), b"\x83\x73\x05false");
    }

    #[test]
    fn floats_encode_as_big_endian_doubles() {
        let bytes = encode_one(|enc| enc.write_float(2.5));
        assert_eq!(bytes, [0x83, 70, 0x40, 0x04, 0, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn integers_choose_the_smallest_form() {
        assert_eq!(encode_one(|enc| enc.write_unsigned(0)), [0x83, 97, 0]);
        assert_eq!(encode_one(|enc| enc.write_unsigned(255)), [0x83, 97, 255]);
        assert_eq!(encode_one(|enc| enc.write_unsigned(256)), [0x83, 98, 0, 0, 1, 0]);
        assert_eq!(encode_one(|enc| enc.write_integer(-1)), [0x83, 98, 255, 255, 255, 255]);
        // past the signed 32-bit range the encoder switches to small-big
        assert_eq!(
            encode_one(|enc| enc.write_unsigned(1 << 32)),
            [0x83, 110, 5, 0, 0, 0, 0, 0, 1]
        );
        assert_eq!(
            encode_one(|enc| enc.write_integer(-(1i64 << 32))),
            [0x83, 110, 5, 1, 0, 0, 0, 0, 1]
        );
    }

    #[test]
    fn empty_arrays_become_the_empty_list() {
        let bytes = encode_one(|enc| enc.write_value(&serde_json::json!([])));
        assert_eq!(bytes, [0x83, 106]);
    }

    #[test]
    fn lists_carry_a_nil_tail() {
        let bytes = encode_one(|enc| enc.write_value(&serde_json::json!([1])));
        assert_eq!(bytes, [0x83, 108, 0, 0, 0, 1, 97, 1, 106]);
    }

    #[test]
    fn custom_hooks_take_precedence_over_the_value_bridge() {
        struct Point {
            x: u64,
            y: u64,
        }

        impl IntoTerm for Point {
            fn encode(&self, encoder: &mut Encoder) -> Result<()> {
                encoder.write_tuple_header(2)?;
                encoder.write_unsigned(self.x)?;
                encoder.write_unsigned(self.y)
            }
        }

        let mut buf = EtfBuffer::resizable();
        let mut enc = Encoder::new(&mut buf);
        enc.write_version().unwrap();
        enc.write(&Point { x: 3, y: 4 }).unwrap();
        assert_eq!(buf.as_slice(), [0x83, 104, 2, 97, 3, 97, 4]);
    }

    #[test]
    fn fixed_buffers_reject_oversize_terms_without_corruption() {
        let mut buf = EtfBuffer::fixed(4);
        let mut enc = Encoder::new(&mut buf);
        enc.write_version().unwrap();
        match enc.write_binary_str("this does not fit") {
            Err(Error::BufferFull { capacity: 4, .. }) => {}
            other => panic!("expected BufferFull, got {:?}", other),
        }
        // the failed write must not be observable
        assert_eq!(buf.len(), 1);
        let mut enc = Encoder::new(&mut buf);
        enc.write_unsigned(7).unwrap();
        assert_eq!(buf.as_slice(), [0x83, 97, 7]);
    }
}
