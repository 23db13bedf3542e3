//! Property-oriented tests for chunk reassembly and malformed streams.

mod frame_decoder;
mod shared;
