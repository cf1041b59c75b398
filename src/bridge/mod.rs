//! Bridge module - JS ↔ Rust communication
//!
//! All #[wasm_bindgen] classes live here.
//! Re-exports only in mod.rs, logic in submodules.

mod counter;

pub use counter::RepCounter;
