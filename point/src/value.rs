use serde::de::DeserializeOwned;
use serde::Serialize;

/// A scalar payload type storable in a point.
///
/// The type GUID is the wire-stable contract with configuration producers;
/// the type name is for humans. `encode`/`decode` fix the little-endian
/// stateful byte layout so layout-equivalent banks are bit-copyable.
pub trait PointValue:
    Copy + PartialEq + Default + Send + Sync + Serialize + DeserializeOwned + std::fmt::Debug + 'static
{
    const GUID: &'static str;
    const TYPE_NAME: &'static str;
    const SIZE: usize;

    fn encode(&self, dst: &mut [u8]);
    fn decode(src: &[u8]) -> Self;
}

impl PointValue for bool {
    const GUID: &'static str = "f574ca64-b5f2-41ae-bdbf-d7cb7d52aeb0";
    const TYPE_NAME: &'static str = "Foxtail::Point::Bool";
    const SIZE: usize = 1;

    fn encode(&self, dst: &mut [u8]) {
        dst[0] = *self as u8;
    }

    fn decode(src: &[u8]) -> Self {
        src[0] != 0
    }
}

macro_rules! numeric_point_value {
    ($ty:ty, $guid:literal, $name:literal) => {
        impl PointValue for $ty {
            const GUID: &'static str = $guid;
            const TYPE_NAME: &'static str = $name;
            const SIZE: usize = std::mem::size_of::<$ty>();

            fn encode(&self, dst: &mut [u8]) {
                dst[..Self::SIZE].copy_from_slice(&self.to_le_bytes());
            }

            fn decode(src: &[u8]) -> Self {
                let mut raw = [0u8; std::mem::size_of::<$ty>()];
                raw.copy_from_slice(&src[..Self::SIZE]);
                <$ty>::from_le_bytes(raw)
            }
        }
    };
}

numeric_point_value!(i8, "2f8b4c1d-9c43-4a3a-8e5a-1c9d0e6b7a21", "Foxtail::Point::Int8");
numeric_point_value!(i16, "6a0cfe1e-8b32-49dc-9f17-3c2bb1a4d5f8", "Foxtail::Point::Int16");
numeric_point_value!(i32, "54770ab1-e2d6-49cb-ae51-6b1c0f7e8d3a", "Foxtail::Point::Int32");
numeric_point_value!(i64, "8d40b26e-2c57-4d0e-b6a9-5f1e3d7c9bd4", "Foxtail::Point::Int64");
numeric_point_value!(u8, "a9f6c3d2-7e15-48b4-9c0a-d2b8e4f615c7", "Foxtail::Point::Uint8");
numeric_point_value!(u16, "c4d7e8f1-3a62-4c5d-8b9e-6f0a1d2c3eb9", "Foxtail::Point::Uint16");
numeric_point_value!(u32, "e1b2a3c4-5d68-47f0-9a1b-8c2d3e4f5a66", "Foxtail::Point::Uint32");
numeric_point_value!(u64, "b3c4d5e6-1f79-4a8b-bc2d-9e0f1a2b3c12", "Foxtail::Point::Uint64");
numeric_point_value!(f32, "708745fa-cef6-4364-abad-063a40f35cbc", "Foxtail::Point::Float");
numeric_point_value!(f64, "d8e9f0a1-6b83-4c2d-a5e6-0f1b2c3d4e97", "Foxtail::Point::Double");
