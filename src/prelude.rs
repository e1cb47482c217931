//! Module exporting traits of this library.
pub use crate::boot::Halt;
pub use crate::sink::DebugSink;

pub use fallible_iterator::FallibleIterator;
