use crate::errors::{Error, Result};

/// An output buffer for encoded terms.
///
/// A buffer is either resizable or fixed-capacity. Fixed buffers refuse any
/// write that would exceed their capacity; the [`Encoder`](crate::Encoder)
/// rolls the buffer back to its pre-term length on failure, so a partially
/// written term is never observable.
#[derive(Debug, Clone)]
pub struct EtfBuffer {
    data: Vec<u8>,
    capacity: Option<usize>,
}

impl EtfBuffer {
    /// Creates a buffer which grows as needed.
    pub fn resizable() -> Self {
        EtfBuffer { data: Vec::new(), capacity: None }
    }

    /// Creates a buffer which refuses to grow past `capacity` bytes.
    pub fn fixed(capacity: usize) -> Self {
        EtfBuffer { data: Vec::with_capacity(capacity), capacity: Some(capacity) }
    }

    /// The number of bytes written so far.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the buffer contains no bytes.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// A view of the encoded bytes.
    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    /// Consumes the buffer, returning the encoded bytes.
    pub fn into_vec(self) -> Vec<u8> {
        self.data
    }

    fn ensure(&self, extra: usize) -> Result<()> {
        if let Some(capacity) = self.capacity {
            let needed = self.data.len() + extra;
            if needed > capacity {
                return Err(Error::BufferFull { needed, capacity });
            }
        }
        Ok(())
    }

    pub(crate) fn put_u8(&mut self, byte: u8) -> Result<()> {
        self.ensure(1)?;
        self.data.push(byte);
        Ok(())
    }

    pub(crate) fn put_slice(&mut self, bytes: &[u8]) -> Result<()> {
        self.ensure(bytes.len())?;
        self.data.extend_from_slice(bytes);
        Ok(())
    }

    pub(crate) fn put_u16(&mut self, value: u16) -> Result<()> {
        self.put_slice(&value.to_be_bytes())
    }

    pub(crate) fn put_u32(&mut self, value: u32) -> Result<()> {
        self.put_slice(&value.to_be_bytes())
    }

    pub(crate) fn put_i32(&mut self, value: i32) -> Result<()> {
        self.put_slice(&value.to_be_bytes())
    }

    pub(crate) fn put_f64(&mut self, value: f64) -> Result<()> {
        self.put_slice(&value.to_be_bytes())
    }

    pub(crate) fn truncate(&mut self, len: usize) {
        self.data.truncate(len);
    }
}
