//! Scan predicates.
//!
//! A [`ScanPredicate`] compares one fixed-width attribute of a record against
//! a literal. Records carry no schema, so the predicate says where the
//! attribute lives (`offset`, `length`) and how to read it ([`Datatype`]).

use std::cmp::Ordering;

use crate::common::{Error, Result};

/// How the attribute bytes are interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Datatype {
    /// Little-endian `i32`.
    Int32,
    /// Little-endian IEEE `f32`.
    Float32,
    /// Fixed-width, NUL-terminated byte string.
    FixedString,
}

/// Comparison applied as `attribute <op> literal`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompOp {
    Lt,
    Lte,
    Eq,
    Gte,
    Gt,
    Ne,
}

impl CompOp {
    /// Whether the operator accepts an attribute that orders `ord` against
    /// the literal.
    fn accepts(self, ord: Ordering) -> bool {
        match self {
            CompOp::Lt => ord == Ordering::Less,
            CompOp::Lte => ord != Ordering::Greater,
            CompOp::Eq => ord == Ordering::Equal,
            CompOp::Gte => ord != Ordering::Less,
            CompOp::Gt => ord == Ordering::Greater,
            CompOp::Ne => ord != Ordering::Equal,
        }
    }
}

/// Filter applied by a [`HeapFileScan`](super::HeapFileScan).
///
/// # Example
/// ```
/// use heapdb::heap::{CompOp, ScanPredicate};
///
/// let over_three = ScanPredicate::int32(0, CompOp::Gt, 3);
/// assert!(over_three.matches(&5i32.to_le_bytes()));
/// assert!(!over_three.matches(&2i32.to_le_bytes()));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ScanPredicate {
    offset: usize,
    length: usize,
    datatype: Datatype,
    op: CompOp,
    literal: Vec<u8>,
}

impl ScanPredicate {
    /// Build a predicate from raw parts.
    ///
    /// # Errors
    /// `Error::BadScanParam` if `length` is 0, or if a numeric type is given
    /// a `length` or literal other than 4 bytes.
    pub fn new(
        offset: usize,
        length: usize,
        datatype: Datatype,
        op: CompOp,
        literal: &[u8],
    ) -> Result<Self> {
        if length == 0 {
            return Err(Error::BadScanParam("attribute length must be at least 1".into()));
        }
        match datatype {
            Datatype::Int32 | Datatype::Float32 => {
                if length != 4 {
                    return Err(Error::BadScanParam(format!(
                        "{:?} attribute must be 4 bytes, got {}",
                        datatype, length
                    )));
                }
                if literal.len() != 4 {
                    return Err(Error::BadScanParam(format!(
                        "{:?} literal must be 4 bytes, got {}",
                        datatype,
                        literal.len()
                    )));
                }
            }
            Datatype::FixedString => {}
        }

        Ok(Self {
            offset,
            length,
            datatype,
            op,
            literal: literal.to_vec(),
        })
    }

    /// `i32` attribute at `offset`.
    pub fn int32(offset: usize, op: CompOp, value: i32) -> Self {
        Self {
            offset,
            length: 4,
            datatype: Datatype::Int32,
            op,
            literal: value.to_le_bytes().to_vec(),
        }
    }

    /// `f32` attribute at `offset`.
    pub fn float32(offset: usize, op: CompOp, value: f32) -> Self {
        Self {
            offset,
            length: 4,
            datatype: Datatype::Float32,
            op,
            literal: value.to_le_bytes().to_vec(),
        }
    }

    /// String attribute of `length` bytes at `offset`.
    ///
    /// # Errors
    /// `Error::BadScanParam` if `length` is 0.
    pub fn string(offset: usize, length: usize, op: CompOp, value: &str) -> Result<Self> {
        Self::new(offset, length, Datatype::FixedString, op, value.as_bytes())
    }

    #[inline]
    pub fn offset(&self) -> usize {
        self.offset
    }

    #[inline]
    pub fn length(&self) -> usize {
        self.length
    }

    #[inline]
    pub fn datatype(&self) -> Datatype {
        self.datatype
    }

    #[inline]
    pub fn op(&self) -> CompOp {
        self.op
    }

    /// Evaluate against a record.
    ///
    /// A record too short to hold the attribute never matches.
    pub fn matches(&self, record: &[u8]) -> bool {
        let end = match self.offset.checked_add(self.length) {
            Some(end) if end <= record.len() => end,
            _ => return false,
        };
        let attr = &record[self.offset..end];

        let ord = match self.datatype {
            Datatype::Int32 => {
                let a = i64::from(i32::from_le_bytes(to_array(attr)));
                let b = i64::from(i32::from_le_bytes(to_array(&self.literal)));
                (a - b).cmp(&0)
            }
            Datatype::Float32 => {
                let a = f32::from_le_bytes(to_array(attr));
                let b = f32::from_le_bytes(to_array(&self.literal));
                match a.partial_cmp(&b) {
                    Some(ord) => ord,
                    // NaN is unordered: only "not equal" holds
                    None => return self.op == CompOp::Ne,
                }
            }
            Datatype::FixedString => compare_fixed(attr, &self.literal),
        };

        self.op.accepts(ord)
    }
}

/// Compare up to `attr.len()` bytes, stopping after a NUL common to both.
/// A literal shorter than the attribute reads as NUL-padded.
fn compare_fixed(attr: &[u8], literal: &[u8]) -> Ordering {
    for (i, &a) in attr.iter().enumerate() {
        let b = literal.get(i).copied().unwrap_or(0);
        match a.cmp(&b) {
            Ordering::Equal if a == 0 => return Ordering::Equal,
            Ordering::Equal => continue,
            other => return other,
        }
    }
    Ordering::Equal
}

fn to_array(bytes: &[u8]) -> [u8; 4] {
    [bytes[0], bytes[1], bytes[2], bytes[3]]
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn record_with_int(prefix: &[u8], value: i32) -> Vec<u8> {
        let mut rec = prefix.to_vec();
        rec.extend_from_slice(&value.to_le_bytes());
        rec
    }

    #[test]
    fn test_validation() {
        assert!(matches!(
            ScanPredicate::new(0, 0, Datatype::FixedString, CompOp::Eq, b"a"),
            Err(Error::BadScanParam(_))
        ));
        assert!(matches!(
            ScanPredicate::new(0, 8, Datatype::Int32, CompOp::Eq, &[0; 4]),
            Err(Error::BadScanParam(_))
        ));
        assert!(matches!(
            ScanPredicate::new(0, 4, Datatype::Float32, CompOp::Eq, &[0; 2]),
            Err(Error::BadScanParam(_))
        ));
        assert!(ScanPredicate::new(3, 4, Datatype::Int32, CompOp::Ne, &[0; 4]).is_ok());
        assert!(ScanPredicate::new(0, 10, Datatype::FixedString, CompOp::Eq, b"much longer than ten").is_ok());
    }

    #[test]
    fn test_int_operators() {
        let rec = record_with_int(b"xx", 7);
        let cases = [
            (CompOp::Lt, 8, true),
            (CompOp::Lt, 7, false),
            (CompOp::Lte, 7, true),
            (CompOp::Eq, 7, true),
            (CompOp::Eq, 6, false),
            (CompOp::Gte, 7, true),
            (CompOp::Gt, 7, false),
            (CompOp::Gt, 6, true),
            (CompOp::Ne, 7, false),
            (CompOp::Ne, 0, true),
        ];
        for (op, literal, expected) in cases {
            let pred = ScanPredicate::int32(2, op, literal);
            assert_eq!(pred.matches(&rec), expected, "{:?} {}", op, literal);
        }
    }

    #[test]
    fn test_int_extremes_do_not_overflow() {
        let pred = ScanPredicate::int32(0, CompOp::Lt, i32::MAX);
        assert!(pred.matches(&i32::MIN.to_le_bytes()));

        let pred = ScanPredicate::int32(0, CompOp::Gt, i32::MIN);
        assert!(pred.matches(&i32::MAX.to_le_bytes()));
    }

    #[test]
    fn test_float() {
        let pred = ScanPredicate::float32(0, CompOp::Gte, 1.5);
        assert!(pred.matches(&1.5f32.to_le_bytes()));
        assert!(pred.matches(&2.0f32.to_le_bytes()));
        assert!(!pred.matches(&(-1.0f32).to_le_bytes()));
    }

    #[test]
    fn test_float_nan_only_not_equal() {
        let nan = f32::NAN.to_le_bytes();
        assert!(ScanPredicate::float32(0, CompOp::Ne, 1.0).matches(&nan));
        for op in [CompOp::Lt, CompOp::Lte, CompOp::Eq, CompOp::Gte, CompOp::Gt] {
            assert!(!ScanPredicate::float32(0, op, 1.0).matches(&nan));
        }
    }

    #[test]
    fn test_string_comparison() {
        let mut rec = [0u8; 8];
        rec[..3].copy_from_slice(b"bob");

        let eq = ScanPredicate::string(0, 8, CompOp::Eq, "bob").unwrap();
        assert!(eq.matches(&rec));

        let gt = ScanPredicate::string(0, 8, CompOp::Gt, "alice").unwrap();
        assert!(gt.matches(&rec));

        let lt = ScanPredicate::string(0, 8, CompOp::Lt, "bobby").unwrap();
        assert!(lt.matches(&rec));
    }

    #[test]
    fn test_string_prefix_within_length() {
        // only the first 3 bytes take part
        let pred = ScanPredicate::string(0, 3, CompOp::Eq, "bobcat").unwrap();
        assert!(pred.matches(b"bobby"));
    }

    #[test]
    fn test_short_record_never_matches() {
        let pred = ScanPredicate::int32(4, CompOp::Ne, 0);
        assert!(!pred.matches(&[1, 2, 3, 4, 5, 6, 7]));
        assert!(pred.matches(&[1, 2, 3, 4, 5, 6, 7, 8]));

        let huge = ScanPredicate::string(usize::MAX, 2, CompOp::Ne, "a").unwrap();
        assert!(!huge.matches(b"abc"));
    }

    proptest! {
        #[test]
        fn prop_int_predicate_agrees_with_ord(value in any::<i32>(), literal in any::<i32>()) {
            let rec = value.to_le_bytes();
            prop_assert_eq!(ScanPredicate::int32(0, CompOp::Lt, literal).matches(&rec), value < literal);
            prop_assert_eq!(ScanPredicate::int32(0, CompOp::Eq, literal).matches(&rec), value == literal);
            prop_assert_eq!(ScanPredicate::int32(0, CompOp::Gte, literal).matches(&rec), value >= literal);
        }
    }
}
