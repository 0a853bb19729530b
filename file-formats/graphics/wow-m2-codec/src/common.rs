use std::io::{Read, Write};

use crate::codec::M2Value;
use crate::error::Result;
use crate::io_ext::{ReadExt, WriteExt};

/// A 3D vector in the M2 format
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde-support", derive(serde::Serialize, serde::Deserialize))]
pub struct C3Vector {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl C3Vector {
    pub const ZERO: Self = Self::new(0.0, 0.0, 0.0);
    pub const ONE: Self = Self::new(1.0, 1.0, 1.0);

    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Convert to a glam vector for easier math operations
    pub fn to_glam(&self) -> glam::Vec3 {
        glam::Vec3::new(self.x, self.y, self.z)
    }

    /// Create from a glam vector
    pub fn from_glam(v: glam::Vec3) -> Self {
        Self::new(v.x, v.y, v.z)
    }
}

impl M2Value for C3Vector {
    fn read_value<R: Read>(reader: &mut R) -> Result<Self> {
        let x = reader.read_f32_le()?;
        let y = reader.read_f32_le()?;
        let z = reader.read_f32_le()?;
        Ok(Self { x, y, z })
    }

    fn write_value<W: Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_f32_le(self.x)?;
        writer.write_f32_le(self.y)?;
        writer.write_f32_le(self.z)?;
        Ok(())
    }
}

/// A 2D vector in the M2 format
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde-support", derive(serde::Serialize, serde::Deserialize))]
pub struct C2Vector {
    pub x: f32,
    pub y: f32,
}

impl C2Vector {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn to_glam(&self) -> glam::Vec2 {
        glam::Vec2::new(self.x, self.y)
    }

    pub fn from_glam(v: glam::Vec2) -> Self {
        Self::new(v.x, v.y)
    }
}

impl M2Value for C2Vector {
    fn read_value<R: Read>(reader: &mut R) -> Result<Self> {
        let x = reader.read_f32_le()?;
        let y = reader.read_f32_le()?;
        Ok(Self { x, y })
    }

    fn write_value<W: Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_f32_le(self.x)?;
        writer.write_f32_le(self.y)?;
        Ok(())
    }
}

/// A quaternion stored as four floats (x, y, z, w)
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde-support", derive(serde::Serialize, serde::Deserialize))]
pub struct Quaternion {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub w: f32,
}

impl Quaternion {
    pub const IDENTITY: Self = Self {
        x: 0.0,
        y: 0.0,
        z: 0.0,
        w: 1.0,
    };

    pub fn to_glam(&self) -> glam::Quat {
        glam::Quat::from_xyzw(self.x, self.y, self.z, self.w)
    }

    pub fn from_glam(q: glam::Quat) -> Self {
        Self {
            x: q.x,
            y: q.y,
            z: q.z,
            w: q.w,
        }
    }
}

impl Default for Quaternion {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl M2Value for Quaternion {
    fn read_value<R: Read>(reader: &mut R) -> Result<Self> {
        let x = reader.read_f32_le()?;
        let y = reader.read_f32_le()?;
        let z = reader.read_f32_le()?;
        let w = reader.read_f32_le()?;
        Ok(Self { x, y, z, w })
    }

    fn write_value<W: Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_f32_le(self.x)?;
        writer.write_f32_le(self.y)?;
        writer.write_f32_le(self.z)?;
        writer.write_f32_le(self.w)?;
        Ok(())
    }
}

/// Compressed quaternion using 16-bit integers.
/// Used by bone rotation tracks from The Burning Crusade on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde-support", derive(serde::Serialize, serde::Deserialize))]
pub struct M2CompQuat {
    pub x: i16,
    pub y: i16,
    pub z: i16,
    pub w: i16,
}

impl M2CompQuat {
    /// Identity rotation as stored on disk
    pub const IDENTITY: Self = Self {
        x: 32767,
        y: 32767,
        z: 32767,
        w: -1,
    };

    fn decompress(value: i16) -> f32 {
        if value == -1 {
            return 1.0;
        }
        let shifted = if value > 0 {
            value as f32 - 32767.0
        } else {
            value as f32 + 32767.0
        };
        shifted / 32767.0
    }

    fn compress(value: f32) -> i16 {
        if value > 0.0 {
            (value * 32767.0 - 32768.0) as i16
        } else {
            (value * 32767.0 + 32768.0) as i16
        }
    }

    /// Expand to a float quaternion
    pub fn to_quaternion(&self) -> Quaternion {
        Quaternion {
            x: Self::decompress(self.x),
            y: Self::decompress(self.y),
            z: Self::decompress(self.z),
            w: Self::decompress(self.w),
        }
    }

    /// Compress a float quaternion
    pub fn from_quaternion(q: Quaternion) -> Self {
        Self {
            x: Self::compress(q.x),
            y: Self::compress(q.y),
            z: Self::compress(q.z),
            w: Self::compress(q.w),
        }
    }
}

impl Default for M2CompQuat {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl M2Value for M2CompQuat {
    fn read_value<R: Read>(reader: &mut R) -> Result<Self> {
        let x = reader.read_i16_le()?;
        let y = reader.read_i16_le()?;
        let z = reader.read_i16_le()?;
        let w = reader.read_i16_le()?;
        Ok(Self { x, y, z, w })
    }

    fn write_value<W: Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_i16_le(self.x)?;
        writer.write_i16_le(self.y)?;
        writer.write_i16_le(self.z)?;
        writer.write_i16_le(self.w)?;
        Ok(())
    }
}

/// Axis-aligned bounding box
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde-support", derive(serde::Serialize, serde::Deserialize))]
pub struct CAaBox {
    pub min: C3Vector,
    pub max: C3Vector,
}

impl M2Value for CAaBox {
    fn read_value<R: Read>(reader: &mut R) -> Result<Self> {
        let min = C3Vector::read_value(reader)?;
        let max = C3Vector::read_value(reader)?;
        Ok(Self { min, max })
    }

    fn write_value<W: Write>(&self, writer: &mut W) -> Result<()> {
        self.min.write_value(writer)?;
        self.max.write_value(writer)
    }
}

/// Bounding box plus the radius of the enclosing sphere
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde-support", derive(serde::Serialize, serde::Deserialize))]
pub struct M2Bounds {
    pub extent: CAaBox,
    pub radius: f32,
}

impl M2Value for M2Bounds {
    fn read_value<R: Read>(reader: &mut R) -> Result<Self> {
        let extent = CAaBox::read_value(reader)?;
        let radius = reader.read_f32_le()?;
        Ok(Self { extent, radius })
    }

    fn write_value<W: Write>(&self, writer: &mut W) -> Result<()> {
        self.extent.write_value(writer)?;
        writer.write_f32_le(self.radius)?;
        Ok(())
    }
}

/// Packed 8-bit color, stored as b, g, r, a
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde-support", derive(serde::Serialize, serde::Deserialize))]
pub struct CArgb {
    pub b: u8,
    pub g: u8,
    pub r: u8,
    pub a: u8,
}

impl M2Value for CArgb {
    fn read_value<R: Read>(reader: &mut R) -> Result<Self> {
        let b = reader.read_u8()?;
        let g = reader.read_u8()?;
        let r = reader.read_u8()?;
        let a = reader.read_u8()?;
        Ok(Self { b, g, r, a })
    }

    fn write_value<W: Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_u8(self.b)?;
        writer.write_u8(self.g)?;
        writer.write_u8(self.r)?;
        writer.write_u8(self.a)?;
        Ok(())
    }
}

/// Float range
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde-support", derive(serde::Serialize, serde::Deserialize))]
pub struct CRange {
    pub min: f32,
    pub max: f32,
}

impl M2Value for CRange {
    fn read_value<R: Read>(reader: &mut R) -> Result<Self> {
        let min = reader.read_f32_le()?;
        let max = reader.read_f32_le()?;
        Ok(Self { min, max })
    }

    fn write_value<W: Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_f32_le(self.min)?;
        writer.write_f32_le(self.max)?;
        Ok(())
    }
}

/// Integer range, used for keyframe ranges and replay counts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde-support", derive(serde::Serialize, serde::Deserialize))]
pub struct M2Range {
    pub minimum: u32,
    pub maximum: u32,
}

impl M2Range {
    pub const fn new(minimum: u32, maximum: u32) -> Self {
        Self { minimum, maximum }
    }
}

impl M2Value for M2Range {
    fn read_value<R: Read>(reader: &mut R) -> Result<Self> {
        let minimum = reader.read_u32_le()?;
        let maximum = reader.read_u32_le()?;
        Ok(Self { minimum, maximum })
    }

    fn write_value<W: Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_u32_le(self.minimum)?;
        writer.write_u32_le(self.maximum)?;
        Ok(())
    }
}

macro_rules! fixed_point {
    ($(#[$meta:meta])* $name:ident($raw:ty, $scale:expr, $read:ident, $write:ident)) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
        #[cfg_attr(feature = "serde-support", derive(serde::Serialize, serde::Deserialize))]
        pub struct $name(pub $raw);

        impl $name {
            pub fn to_f32(self) -> f32 {
                self.0 as f32 / $scale
            }

            pub fn from_f32(value: f32) -> Self {
                Self((value * $scale).round() as $raw)
            }
        }

        impl M2Value for $name {
            fn read_value<R: Read>(reader: &mut R) -> Result<Self> {
                Ok(Self(reader.$read()?))
            }

            fn write_value<W: Write>(&self, writer: &mut W) -> Result<()> {
                writer.$write(self.0)?;
                Ok(())
            }
        }
    };
}

fixed_point! {
    /// Signed 0.15 fixed point, used for alpha values (32767 is opaque)
    FixedPoint016(i16, 32767.0, read_i16_le, write_i16_le)
}

fixed_point! {
    /// Signed 6.9 fixed point, used by particle multi-texture parameters
    FixedPoint69(i16, 512.0, read_i16_le, write_i16_le)
}

fixed_point! {
    /// Unsigned 2.5 fixed point, used by particle multi-texture parameters
    FixedPoint25(u8, 32.0, read_u8, write_u8)
}

/// Four bone indices attached to a skin vertex
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde-support", derive(serde::Serialize, serde::Deserialize))]
pub struct VertexProperty(pub [u8; 4]);

impl M2Value for VertexProperty {
    fn read_value<R: Read>(reader: &mut R) -> Result<Self> {
        let mut bytes = [0u8; 4];
        reader.read_exact(&mut bytes)?;
        Ok(Self(bytes))
    }

    fn write_value<W: Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_all(&self.0)?;
        Ok(())
    }
}

/// Spline keyframe with in and out tangents, used by camera tracks
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde-support", derive(serde::Serialize, serde::Deserialize))]
pub struct M2SplineKey<T> {
    pub value: T,
    pub in_tan: T,
    pub out_tan: T,
}

impl<T> M2SplineKey<T> {
    pub const fn flat(value: T) -> Self
    where
        T: Copy,
    {
        Self {
            value,
            in_tan: value,
            out_tan: value,
        }
    }
}

impl<T: M2Value> M2Value for M2SplineKey<T> {
    fn read_value<R: Read>(reader: &mut R) -> Result<Self> {
        let value = T::read_value(reader)?;
        let in_tan = T::read_value(reader)?;
        let out_tan = T::read_value(reader)?;
        Ok(Self {
            value,
            in_tan,
            out_tan,
        })
    }

    fn write_value<W: Write>(&self, writer: &mut W) -> Result<()> {
        self.value.write_value(writer)?;
        self.in_tan.write_value(writer)?;
        self.out_tan.write_value(writer)
    }
}

/// A 4D vector, also used for planes and colors with float channels
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde-support", derive(serde::Serialize, serde::Deserialize))]
pub struct C4Vector {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub w: f32,
}

impl C4Vector {
    pub const fn new(x: f32, y: f32, z: f32, w: f32) -> Self {
        Self { x, y, z, w }
    }

    pub fn to_glam(&self) -> glam::Vec4 {
        glam::Vec4::new(self.x, self.y, self.z, self.w)
    }
}

impl M2Value for C4Vector {
    fn read_value<R: Read>(reader: &mut R) -> Result<Self> {
        let x = reader.read_f32_le()?;
        let y = reader.read_f32_le()?;
        let z = reader.read_f32_le()?;
        let w = reader.read_f32_le()?;
        Ok(Self { x, y, z, w })
    }

    fn write_value<W: Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_f32_le(self.x)?;
        writer.write_f32_le(self.y)?;
        writer.write_f32_le(self.z)?;
        writer.write_f32_le(self.w)?;
        Ok(())
    }
}

/// 3x3 matrix stored as three columns
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde-support", derive(serde::Serialize, serde::Deserialize))]
pub struct C33Matrix {
    pub columns: [C3Vector; 3],
}

impl C33Matrix {
    pub fn to_glam(&self) -> glam::Mat3 {
        glam::Mat3::from_cols(
            self.columns[0].to_glam(),
            self.columns[1].to_glam(),
            self.columns[2].to_glam(),
        )
    }
}

impl M2Value for C33Matrix {
    fn read_value<R: Read>(reader: &mut R) -> Result<Self> {
        let columns = [
            C3Vector::read_value(reader)?,
            C3Vector::read_value(reader)?,
            C3Vector::read_value(reader)?,
        ];
        Ok(Self { columns })
    }

    fn write_value<W: Write>(&self, writer: &mut W) -> Result<()> {
        for column in &self.columns {
            column.write_value(writer)?;
        }
        Ok(())
    }
}

/// Plane given by its normal and distance from the origin
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde-support", derive(serde::Serialize, serde::Deserialize))]
pub struct C4Plane {
    pub normal: C3Vector,
    pub distance: f32,
}

impl M2Value for C4Plane {
    fn read_value<R: Read>(reader: &mut R) -> Result<Self> {
        let normal = C3Vector::read_value(reader)?;
        let distance = reader.read_f32_le()?;
        Ok(Self { normal, distance })
    }

    fn write_value<W: Write>(&self, writer: &mut W) -> Result<()> {
        self.normal.write_value(writer)?;
        writer.write_f32_le(self.distance)?;
        Ok(())
    }
}

/// Sphere given by its center and radius
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde-support", derive(serde::Serialize, serde::Deserialize))]
pub struct CAaSphere {
    pub position: C3Vector,
    pub radius: f32,
}

impl M2Value for CAaSphere {
    fn read_value<R: Read>(reader: &mut R) -> Result<Self> {
        let position = C3Vector::read_value(reader)?;
        let radius = reader.read_f32_le()?;
        Ok(Self { position, radius })
    }

    fn write_value<W: Write>(&self, writer: &mut W) -> Result<()> {
        self.position.write_value(writer)?;
        writer.write_f32_le(self.radius)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_c3vector_parse() {
        let data = [
            0x00, 0x00, 0x80, 0x3F, // x = 1.0
            0x00, 0x00, 0x00, 0x40, // y = 2.0
            0x00, 0x00, 0x40, 0x40, // z = 3.0
        ];

        let mut cursor = Cursor::new(data);
        let vector = C3Vector::read_value(&mut cursor).unwrap();

        assert_eq!(vector, C3Vector::new(1.0, 2.0, 3.0));
        assert_eq!(vector.to_glam(), glam::Vec3::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn test_bounds_size() {
        let mut cursor = Cursor::new(Vec::new());
        M2Bounds::default().write_value(&mut cursor).unwrap();
        assert_eq!(cursor.into_inner().len(), 28);
    }

    #[test]
    fn test_comp_quat_identity() {
        let q = M2CompQuat::IDENTITY.to_quaternion();
        assert_eq!(q.x, 0.0);
        assert_eq!(q.y, 0.0);
        assert_eq!(q.z, 0.0);
        assert_eq!(q.w, 1.0);
    }

    #[test]
    fn test_fixed_point_scaling() {
        assert_eq!(FixedPoint016(32767).to_f32(), 1.0);
        assert_eq!(FixedPoint016::from_f32(0.5), FixedPoint016(16384));
        assert_eq!(FixedPoint69(512).to_f32(), 1.0);
        assert_eq!(FixedPoint25(16).to_f32(), 0.5);
    }

    #[test]
    fn test_matrix_columns() {
        let data: Vec<u8> = (1..=9u8).flat_map(|i| f32::from(i).to_le_bytes()).collect();
        let matrix = C33Matrix::read_value(&mut Cursor::new(data)).unwrap();
        assert_eq!(matrix.columns[1], C3Vector::new(4.0, 5.0, 6.0));
        assert_eq!(matrix.to_glam().z_axis, glam::Vec3::new(7.0, 8.0, 9.0));
    }

    #[test]
    fn test_spline_key_layout() {
        let key = M2SplineKey::flat(2.0f32);
        let mut cursor = Cursor::new(Vec::new());
        key.write_value(&mut cursor).unwrap();
        let bytes = cursor.into_inner();
        assert_eq!(bytes.len(), 12);

        let parsed = M2SplineKey::<f32>::read_value(&mut Cursor::new(bytes)).unwrap();
        assert_eq!(parsed, key);
    }
}
