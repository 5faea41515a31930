//! Generation backends.
//!
//! Every backend implements [`GenerationBackend`]; the run executor only ever
//! talks to that trait, so adding a backend never touches the executor.

#[path = "backend/traits.rs"]
mod traits;

#[path = "backend/model.rs"]
mod model;

#[path = "backend/tokens.rs"]
mod tokens;

#[cfg(feature = "ollama")]
#[path = "backend/ollama.rs"]
pub mod ollama;

pub use model::{backend_for, ModelRef, DEFAULT_PROVIDER};
pub use tokens::estimate_tokens;
pub use traits::{
    GenerationBackend, GenerationRequest, GenerationResult, DEFAULT_GENERATION_TIMEOUT,
};
