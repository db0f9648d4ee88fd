//! Wire protocol, host-compiler boundary, async executor client, and the
//! outcome taxonomy shared by every consumer of compile+execute results.

pub mod client;
pub mod error;
pub mod host_compiler;
pub mod pipeline;
pub mod protocol;

pub use client::{ExecutorClient, RunPairOutcome};
pub use error::{CompileConfig, InfraError, Outcome, SideResult};
pub use host_compiler::{CompileOutcome, CompileUnit, HostCompiler, MockHostCompiler};
pub use pipeline::run_pipeline;
pub use protocol::{CheckpointSite, Request, Response, RunPairPayload, RunPairResult};
