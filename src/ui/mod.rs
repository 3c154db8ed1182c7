//! Terminal presentation.
//!
//! The controller talks to the user only through the [`console::Console`]
//! trait, so scenarios can be driven by a scripted console in tests.

pub mod console;

pub use console::{Console, StdConsole, Tone};
