use crate::api::{read_value, write_value, LockRequest, PointApi};
use crate::value::PointValue;
use foxtail_error::Error;

/// Bit-level characteristics of an integer point type, letting bit-oriented
/// components (mux/demux) accept any integer GUID.
pub struct IntegerAttributes {
    pub guid: &'static str,
    pub num_bits: u8,
    /// Read the point's raw bits, masked to `num_bits`. `None` = invalid.
    pub read_as_u64: fn(&dyn PointApi) -> Result<Option<u64>, Error>,
    /// Write the low `num_bits` of `bits` into the point.
    pub write_from_u64: fn(&dyn PointApi, u64, LockRequest) -> Result<(), Error>,
}

trait IntegerBits: PointValue {
    const BITS: u8;
    fn to_bits(self) -> u64;
    fn from_bits(bits: u64) -> Self;
}

macro_rules! integer_bits {
    ($ty:ty, $bits:expr) => {
        impl IntegerBits for $ty {
            const BITS: u8 = $bits;
            fn to_bits(self) -> u64 {
                (self as u64) & (u64::MAX >> (64 - $bits))
            }
            fn from_bits(bits: u64) -> Self {
                bits as $ty
            }
        }
    };
}

integer_bits!(u8, 8);
integer_bits!(u16, 16);
integer_bits!(u32, 32);
integer_bits!(u64, 64);
integer_bits!(i8, 8);
integer_bits!(i16, 16);
integer_bits!(i32, 32);
integer_bits!(i64, 64);

fn read_as<T: IntegerBits>(point: &dyn PointApi) -> Result<Option<u64>, Error> {
    Ok(read_value::<T>(point)?.map(IntegerBits::to_bits))
}

fn write_from<T: IntegerBits>(
    point: &dyn PointApi,
    bits: u64,
    lock_request: LockRequest,
) -> Result<(), Error> {
    write_value::<T>(point, T::from_bits(bits), lock_request)
}

macro_rules! attributes_for {
    ($ty:ty) => {
        IntegerAttributes {
            guid: <$ty as PointValue>::GUID,
            num_bits: <$ty as IntegerBits>::BITS,
            read_as_u64: read_as::<$ty>,
            write_from_u64: write_from::<$ty>,
        }
    };
}

static INTEGER_ATTRIBUTES: &[IntegerAttributes] = &[
    attributes_for!(u8),
    attributes_for!(u16),
    attributes_for!(u32),
    attributes_for!(u64),
    attributes_for!(i8),
    attributes_for!(i16),
    attributes_for!(i32),
    attributes_for!(i64),
];

/// Attribute table lookup by point type GUID; `None` for non-integer types.
pub fn integer_attributes(guid: &str) -> Option<&'static IntegerAttributes> {
    INTEGER_ATTRIBUTES.iter().find(|attrs| attrs.guid == guid)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arena::{StatefulAlloc, StatefulArena};
    use crate::basic::Basic;
    use std::sync::Arc;

    #[test]
    fn masks_signed_values_to_their_width() {
        let arena = StatefulArena::new(64);
        let slot = StatefulAlloc::Arena(&arena)
            .slot(Basic::<i8>::STATEFUL_BYTES)
            .unwrap();
        let pt = Arc::new(Basic::<i8>::new(1, "s".into(), slot, None));
        pt.write(-1, LockRequest::NoRequest);

        let attrs = integer_attributes(<i8 as PointValue>::GUID).unwrap();
        assert_eq!(attrs.num_bits, 8);
        assert_eq!((attrs.read_as_u64)(pt.as_ref()).unwrap(), Some(0xFF));
    }

    #[test]
    fn non_integer_types_have_no_attributes() {
        assert!(integer_attributes(<bool as PointValue>::GUID).is_none());
        assert!(integer_attributes(<f32 as PointValue>::GUID).is_none());
    }

    #[test]
    fn write_from_u64_round_trips() {
        let arena = StatefulArena::new(64);
        let slot = StatefulAlloc::Arena(&arena)
            .slot(Basic::<u16>::STATEFUL_BYTES)
            .unwrap();
        let pt = Arc::new(Basic::<u16>::new(1, "w".into(), slot, None));

        let attrs = integer_attributes(<u16 as PointValue>::GUID).unwrap();
        (attrs.write_from_u64)(pt.as_ref(), 0xABCD, LockRequest::NoRequest).unwrap();
        assert_eq!(pt.read(), Some(0xABCD));
    }
}
