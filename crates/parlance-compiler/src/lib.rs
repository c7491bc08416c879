//! Module compilation for parlance.
//!
//! The driver parses a module header with the frozen bootstrap scanner,
//! applies imports and pragmas, then compiles and executes one top-level
//! statement at a time: each statement parses under the single-solution
//! demand, runs through the interpreter, may extend the visible grammar,
//! and is appended to the serialized module stream. Everything added to
//! the registry is transactional; any failure rolls the module back.
//!
//! - `header` - the module header grammar
//! - `pragma` - bootstrap method/macro pragmas
//! - `primitives` - the injected primitive registry
//! - `interp` - a phrase evaluator sufficient for bootstrap modules
//! - `codegen` - block-to-function compilation
//! - `serializer` - the checksummed module stream
//! - `driver` - the statement loop and transaction window
//! - `error` - the structured compilation error and its banner

pub mod codegen;
pub mod driver;
pub mod error;
pub mod header;
pub mod interp;
pub mod ir;
pub mod pragma;
pub mod primitives;
pub mod serializer;

#[cfg(test)]
mod header_tests;
#[cfg(test)]
mod pragma_tests;
#[cfg(test)]
mod serializer_tests;

pub use codegen::PhraseCodeGenerator;
pub use driver::{CompiledModule, ModuleCompiler, ModuleNameResolver, StaticResolver};
pub use error::CompilationError;
pub use header::{ModuleHeader, ModuleImport};
pub use interp::{BasicInterpreter, ModuleSpace};
pub use pragma::Pragma;
pub use primitives::PrimitiveRegistry;
pub use serializer::{BinarySerializer, SerializedItem, Serializer};
