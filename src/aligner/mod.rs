//! External aligner invocation.
//!
//! `params` resolves MAUS options against configured defaults, `runner`
//! turns them into a command line, and `invoker` owns the temporary
//! artifacts of a single call.

pub mod invoker;
pub mod params;
pub mod runner;

pub use invoker::Aligner;
pub use params::{AlignOptions, ResolvedParams, maus_bool};
pub use runner::{AlignerRunner, CommandExecutor, ProcessOutput, SystemCommandExecutor};
