//! Data types shared by the humidity monitor crates.
//!
//! Nothing in here does I/O: a [`Reading`] is decoded from a text frame with
//! [`decode_frame`], the connection lifecycle is described by
//! [`ConnectionState`] and the [`display`] module turns both into the strings
//! shown by a frontend.

mod frame;
mod reading;
mod state;

pub mod display;

pub use frame::{decode_frame, FrameError};
pub use reading::{RangeFlags, Reading, ADC_MAX};
pub use state::ConnectionState;
