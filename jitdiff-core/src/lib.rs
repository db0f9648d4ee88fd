//! Abstract program tree, random generation, and source printing for the
//! differential fuzzer. No I/O: compiling, executing, and reducing live in
//! `jitdiff-exec` and `jitdiff-reduce`.

pub mod checksum;
pub mod config;
pub mod literal;
pub mod op_tables;
pub mod printer;
pub mod random;
pub mod statics;
pub mod synth;
pub mod tree;
pub mod types_universe;

pub use config::GenConfig;
pub use random::Random;
pub use synth::generate_program;
pub use tree::{FuzzType, PrimitiveKind, Program};
pub use types_universe::TypeUniverse;
