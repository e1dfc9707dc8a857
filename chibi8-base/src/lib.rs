//! Host-independent CHIP-8 machine emulation.
//!
//! [`machine::Machine`] owns all interpreter state and is driven entirely
//! by its caller: the host decides when instructions run, when timers
//! tick and when key changes arrive. The `chibi8` binary crate wires a
//! windowed frontend around it.

pub mod font;
pub mod instruction;
pub mod machine;
mod nibbles;
pub mod screen;
