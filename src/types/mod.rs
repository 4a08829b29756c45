//! This module defines the core, strongly-typed data representations used
//! throughout the codec.
//!
//! It includes the layout enums that describe how a device wants its bits
//! arranged, and the array aliases for the fields that flow between the
//! quantizer, the packer and the electrode mapper.

pub mod fields;
pub mod layout;

// Re-export the main type(s) for easier access.
pub use fields::{Bitmap, BitplaneFrame, CodeField, PackedBuffer, PhaseField};
pub use layout::{BitOrder, ByteLayout, OutOfDomainPolicy};
