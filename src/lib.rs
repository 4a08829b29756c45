//! This file is the root of the `plm_codec` Rust crate.
//!
//! The crate converts continuous phase fields into the exact byte, bitmap and
//! bitplane formats that phase-only light modulators (PLMs) consume, and back.
//!
//! Its responsibilities here are strictly limited to:
//! 1.  Declaring all the top-level modules of the library.
//! 2.  Re-exporting the public API, so callers can `use plm_codec::FrameCodec`.
//!
//! ```
//! use ndarray::array;
//! use plm_codec::{FrameCodec, ProfileConfig};
//!
//! let profile = ProfileConfig::new(1, (8, 1)).build()?;
//! let codec = FrameCodec::new(profile);
//! let bytes = codec.encode(&array![[0.0, 7.0, 0.0, 7.0, 0.0, 7.0, 0.0, 7.0]])?;
//! assert_eq!(bytes.as_bytes(), &[0x55]);
//! # Ok::<(), plm_codec::PlmError>(())
//! ```

//==================================================================================
// 0. Constants
//==================================================================================
/// The crate version, automatically set from Cargo.toml at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

//==================================================================================
// 1. Module Declarations
//==================================================================================
#[macro_use]
mod observability; // Make macros available throughout the crate

#[doc(hidden)]
pub use log as __log;

pub mod bitstack;
pub mod codec;
pub mod config;
pub mod electrode;
pub mod kernels;
pub mod packer;
pub mod presets;
pub mod quantizer;
pub mod types;

mod error;
mod profile;
mod traits;

//==================================================================================
// 2. Public API
//==================================================================================
pub use codec::{decode, encode, FrameCodec};
pub use config::{ElectrodeConfig, ProfileConfig};
pub use error::PlmError;
pub use observability::enable_verbose_logging;
pub use packer::{pack, unpack};
pub use presets::{preset, preset_config, preset_names};
pub use profile::DeviceProfile;
pub use quantizer::{dequantize, quantize, quantize_with, LevelMapping, LinearMapping};
pub use traits::PhaseMapping;
pub use types::{
    BitOrder, Bitmap, BitplaneFrame, ByteLayout, CodeField, OutOfDomainPolicy, PackedBuffer,
    PhaseField,
};
