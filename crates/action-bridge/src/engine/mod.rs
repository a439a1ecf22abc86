//! Command execution engine.
//!
//! This module provides the core of the bridge:
//!
//! - **Classifier**: Sorts commands into timing categories and derives delays
//! - **Evaluator**: Resolves state predicates against the live host context
//! - **Executor**: Runs single commands and chains on the UI dispatch thread
//! - **Conditional**: If/then/else and OR-chain execution
//! - **Dispatch**: The UI-affinity thread every host call goes through

pub mod classifier;
pub mod conditional;
pub mod diagnosis;
pub mod dispatch;
pub mod evaluator;
pub mod executor;
pub mod explain;
pub mod result;

pub use classifier::{CommandClassifier, TimingCategory};
pub use conditional::{Condition, ConditionalExecutor, ConditionalResult};
pub use dispatch::UiDispatcher;
pub use evaluator::StateEvaluator;
pub use executor::ExecutionEngine;
pub use explain::CommandRequirements;
pub use result::{ChainDelay, ChainPolicy, ErrorKind, ExecutionResult};
