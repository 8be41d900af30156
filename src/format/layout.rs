//! Declarative field layouts and the generic record reader
//!
//! Each section keeps one static table per format variant. A table lists
//! fields in on-disk order with their encoding; [`read_record`] walks the
//! table and collects whatever fields it names. Fields missing from a
//! variant's table simply come back as `None`, so version differences stay
//! in data instead of branches.

use std::marker::PhantomData;

use crate::cursor::{ByteCursor, PrefixWidth};
use crate::error::DecodeError;

/// How one field is stored
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    /// Unsigned byte
    U8,
    /// Little-endian `u16`
    U16,
    /// Little-endian `u32`
    U32,
    /// Little-endian IEEE 754 single
    F32,
    /// Little-endian unsigned integer of 1 to 8 bytes
    UInt(usize),
    /// NUL-padded text of a fixed width
    Fixed(usize),
    /// Text behind a length field of the given width
    Prefixed(PrefixWidth),
    /// Bytes with no known meaning
    Skip(usize),
}

impl Encoding {
    /// Fewest bytes this encoding can occupy
    #[must_use]
    pub const fn min_size(self) -> usize {
        match self {
            Self::U8 => 1,
            Self::U16 => 2,
            Self::U32 | Self::F32 => 4,
            Self::UInt(n) | Self::Fixed(n) | Self::Skip(n) => n,
            Self::Prefixed(width) => width.bytes(),
        }
    }

    /// True if the encoded width does not depend on the data
    #[must_use]
    pub const fn is_fixed(self) -> bool {
        !matches!(self, Self::Prefixed(_))
    }
}

/// A field identifier usable as a table key
pub trait LayoutField: Copy + 'static {
    /// Number of distinct fields
    const COUNT: usize;

    /// Dense index in `0..COUNT`
    fn index(self) -> usize;
}

/// One entry of a layout table
#[derive(Debug, Clone, Copy)]
pub struct FieldSpec<F> {
    /// Field this entry fills, `None` for skipped bytes
    pub field: Option<F>,
    /// On-disk encoding
    pub encoding: Encoding,
}

impl<F> FieldSpec<F> {
    /// A named field
    pub const fn new(field: F, encoding: Encoding) -> Self {
        Self {
            field: Some(field),
            encoding,
        }
    }

    /// Reserved or not yet understood bytes
    pub const fn skip(n: usize) -> Self {
        Self {
            field: None,
            encoding: Encoding::Skip(n),
        }
    }
}

/// Ordered field table for one record type in one variant
#[derive(Debug)]
pub struct Layout<F: 'static> {
    /// Human-readable name for logs
    pub name: &'static str,
    /// Fields in on-disk order
    pub fields: &'static [FieldSpec<F>],
}

impl<F: 'static> Layout<F> {
    /// Fewest bytes a record of this layout can occupy
    #[must_use]
    pub fn min_size(&self) -> usize {
        self.fields.iter().map(|spec| spec.encoding.min_size()).sum()
    }

    /// Exact record size, if no field is length-prefixed
    #[must_use]
    pub fn fixed_size(&self) -> Option<usize> {
        self.fields
            .iter()
            .all(|spec| spec.encoding.is_fixed())
            .then(|| self.min_size())
    }
}

/// A decoded field value
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Any integer encoding
    Int(u64),
    /// `F32`
    Float(f32),
    /// `Fixed` and `Prefixed`
    Text(String),
}

/// Fields collected by [`read_record`]
#[derive(Debug)]
pub struct Record<F> {
    values: Vec<Option<Value>>,
    _field: PhantomData<F>,
}

impl<F: LayoutField> Record<F> {
    fn new() -> Self {
        Self {
            values: vec![None; F::COUNT],
            _field: PhantomData,
        }
    }

    /// True if the layout contained this field
    #[must_use]
    pub fn has(&self, field: F) -> bool {
        self.values[field.index()].is_some()
    }

    /// Integer value of a field
    #[must_use]
    pub fn int(&self, field: F) -> Option<u64> {
        match self.values[field.index()] {
            Some(Value::Int(v)) => Some(v),
            _ => None,
        }
    }

    /// Integer field narrowed to `u8`; tables only pair `U8` with these
    #[must_use]
    pub fn u8(&self, field: F) -> Option<u8> {
        self.int(field).map(|v| v as u8)
    }

    /// Integer field narrowed to `u16`
    #[must_use]
    pub fn u16(&self, field: F) -> Option<u16> {
        self.int(field).map(|v| v as u16)
    }

    /// Integer field narrowed to `u32`
    #[must_use]
    pub fn u32(&self, field: F) -> Option<u32> {
        self.int(field).map(|v| v as u32)
    }

    /// Float value of a field
    #[must_use]
    pub fn float(&self, field: F) -> Option<f32> {
        match self.values[field.index()] {
            Some(Value::Float(v)) => Some(v),
            _ => None,
        }
    }

    /// Move a text value out of the record
    pub fn take_text(&mut self, field: F) -> Option<String> {
        match self.values[field.index()].take() {
            Some(Value::Text(s)) => Some(s),
            other => {
                self.values[field.index()] = other;
                None
            }
        }
    }
}

/// Read one record described by `layout`
///
/// # Errors
///
/// Propagates the first cursor failure; the cursor is left wherever that
/// read stopped.
pub fn read_record<F: LayoutField>(
    cursor: &mut ByteCursor<'_>,
    layout: &Layout<F>,
) -> Result<Record<F>, DecodeError> {
    let mut record = Record::new();

    for spec in layout.fields {
        let value = match spec.encoding {
            Encoding::U8 => Value::Int(u64::from(cursor.read_u8()?)),
            Encoding::U16 => Value::Int(u64::from(cursor.read_u16()?)),
            Encoding::U32 => Value::Int(u64::from(cursor.read_u32()?)),
            Encoding::F32 => Value::Float(cursor.read_f32()?),
            Encoding::UInt(width) => Value::Int(cursor.read_uint(width)?),
            Encoding::Fixed(n) => Value::Text(cursor.read_fixed_string(n)?),
            Encoding::Prefixed(width) => Value::Text(cursor.read_length_prefixed_string(width)?),
            Encoding::Skip(n) => {
                cursor.skip(n)?;
                continue;
            }
        };

        if let Some(field) = spec.field {
            record.values[field.index()] = Some(value);
        }
    }

    Ok(record)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Demo {
        Id,
        Name,
        Speed,
    }

    impl LayoutField for Demo {
        const COUNT: usize = 3;

        fn index(self) -> usize {
            self as usize
        }
    }

    static SHORT: Layout<Demo> = Layout {
        name: "demo short",
        fields: &[
            FieldSpec::new(Demo::Id, Encoding::U16),
            FieldSpec::skip(2),
            FieldSpec::new(Demo::Speed, Encoding::F32),
        ],
    };

    static LONG: Layout<Demo> = Layout {
        name: "demo long",
        fields: &[
            FieldSpec::new(Demo::Id, Encoding::U16),
            FieldSpec::new(Demo::Name, Encoding::Prefixed(PrefixWidth::One)),
            FieldSpec::new(Demo::Speed, Encoding::F32),
        ],
    };

    #[test]
    fn test_sizes() {
        assert_eq!(SHORT.min_size(), 8);
        assert_eq!(SHORT.fixed_size(), Some(8));
        assert_eq!(LONG.min_size(), 7);
        assert_eq!(LONG.fixed_size(), None);
    }

    #[test]
    fn test_absent_fields_are_none() {
        let mut data = 7u16.to_le_bytes().to_vec();
        data.extend_from_slice(&[0xEE, 0xEE]);
        data.extend_from_slice(&2.5f32.to_le_bytes());

        let mut cursor = ByteCursor::new(&data);
        let mut record = read_record(&mut cursor, &SHORT).unwrap();

        assert!(cursor.at_end());
        assert_eq!(record.u16(Demo::Id), Some(7));
        assert_eq!(record.float(Demo::Speed), Some(2.5));
        assert!(!record.has(Demo::Name));
        assert_eq!(record.take_text(Demo::Name), None);
    }

    #[test]
    fn test_text_fields() {
        let mut data = 1u16.to_le_bytes().to_vec();
        data.extend_from_slice(&[2, b'o', b'k']);
        data.extend_from_slice(&0f32.to_le_bytes());

        let mut record = read_record(&mut ByteCursor::new(&data), &LONG).unwrap();
        assert_eq!(record.take_text(Demo::Name).as_deref(), Some("ok"));
        assert_eq!(record.take_text(Demo::Name), None);
        assert_eq!(record.int(Demo::Name), None);
    }

    #[test]
    fn test_short_input_fails() {
        let data = [1, 0, 9];
        let err = read_record(&mut ByteCursor::new(&data), &LONG).unwrap_err();
        assert!(matches!(err, DecodeError::MalformedLength { .. }));
    }
}
