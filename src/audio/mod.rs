//! Audio helpers: WAV header inspection and temporary signal files.

pub mod wav;
