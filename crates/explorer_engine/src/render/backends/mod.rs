//! Graphics context implementations
//!
//! - `gl`: OpenGL through `glow`, on a context the platform made current
//! - `headless`: CPU-side bookkeeping context for tests and runs without a display
//!
//! Both keep their objects in a `slotmap`; handles are the slot keys in FFI
//! form, so a deleted handle is never mistaken for a live one.

pub mod gl;
pub mod headless;

use slotmap::{DefaultKey, Key, KeyData};

pub use gl::GlApi;
pub use headless::{DrawCall, HeadlessApi, ObjectKind};

fn to_raw(key: DefaultKey) -> u64 {
    key.data().as_ffi()
}

fn to_key(raw: u64) -> DefaultKey {
    KeyData::from_ffi(raw).into()
}
