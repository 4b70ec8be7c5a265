//! Float4x4 - spatial transform matrix

use std::fmt;

use bytemuck::{Pod, Zeroable};
use serde::{Deserialize, Serialize};

/// Row-major 4x4 single precision matrix.
///
/// The memory layout matches the 64-byte blobs frame sources attach as sample
/// metadata, so a blob can be reinterpreted directly with [`Float4x4::from_ne_bytes`].
/// The all-zero matrix is used as the "no transform available" sentinel.
#[repr(C)]
#[derive(Clone, Copy, PartialEq, Default, Pod, Zeroable, Serialize, Deserialize)]
pub struct Float4x4 {
    pub m: [[f32; 4]; 4],
}

impl Float4x4 {
    /// Byte size of the in-memory representation
    pub const SIZE: usize = std::mem::size_of::<Float4x4>();

    /// All-zero sentinel
    pub const ZERO: Float4x4 = Float4x4 { m: [[0.0; 4]; 4] };

    pub const IDENTITY: Float4x4 = Float4x4 {
        m: [
            [1.0, 0.0, 0.0, 0.0],
            [0.0, 1.0, 0.0, 0.0],
            [0.0, 0.0, 1.0, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ],
    };

    pub const fn from_rows(m: [[f32; 4]; 4]) -> Self {
        Self { m }
    }

    /// Reinterpret a native-endian blob verbatim. Returns `None` unless the
    /// blob is exactly [`Float4x4::SIZE`] bytes long.
    pub fn from_ne_bytes(bytes: &[u8]) -> Option<Self> {
        bytemuck::try_pod_read_unaligned(bytes).ok()
    }

    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::bytes_of(self)
    }

    pub fn rows(&self) -> &[[f32; 4]; 4] {
        &self.m
    }

    /// Row-major iteration over all 16 elements
    pub fn elements(&self) -> impl Iterator<Item = f32> + '_ {
        self.m.iter().flat_map(|row| row.iter().copied())
    }

    /// Bitwise comparison against the sentinel (so `-0.0` is not zero)
    pub fn is_zero(&self) -> bool {
        self.as_bytes().iter().all(|b| *b == 0)
    }

    /// Row-vector convention: `a * b` applies `a` first, then `b`
    pub fn multiply(&self, rhs: &Float4x4) -> Float4x4 {
        let mut out = Float4x4::ZERO;
        for (i, row) in out.m.iter_mut().enumerate() {
            for (j, cell) in row.iter_mut().enumerate() {
                *cell = (0..4).map(|k| self.m[i][k] * rhs.m[k][j]).sum();
            }
        }
        out
    }

    pub fn translation(x: f32, y: f32, z: f32) -> Float4x4 {
        let mut out = Float4x4::IDENTITY;
        out.m[3] = [x, y, z, 1.0];
        out
    }
}

impl fmt::Debug for Float4x4 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for (i, row) in self.m.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "[{}, {}, {}, {}]", row[0], row[1], row[2], row[3])?;
        }
        f.write_str("]")
    }
}
