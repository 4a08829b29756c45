//! Array types for the data that flows through the codec.

use ndarray::{Array2, Array3};
use std::ops::Deref;

/// Continuous phase samples, shape `(height, width)`.
pub type PhaseField = Array2<f64>;

/// Integer phase codes, shape `(height, width)`, each in `[0, 2^bit_depth - 1]`.
pub type CodeField = Array2<u32>;

/// Binary electrode bitmap. Cells are 0/1, or 0/255 after bit replication.
pub type Bitmap = Array2<u8>;

/// Stacked bitplanes for a 24-bit video frame, shape `(channels, rows, cols)`.
pub type BitplaneFrame = Array3<u8>;

/// The packed byte sequence handed to the display collaborator.
///
/// Immutable once produced; the caller owns it and may take the bytes with
/// [`PackedBuffer::into_bytes`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PackedBuffer {
    bytes: Vec<u8>,
}

impl PackedBuffer {
    pub(crate) fn new(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}

impl Deref for PackedBuffer {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.bytes
    }
}

impl AsRef<[u8]> for PackedBuffer {
    fn as_ref(&self) -> &[u8] {
        &self.bytes
    }
}
