//! Conditional execution: if/then/else on a state predicate, and OR-chains
//! where the first fully successful alternative wins.

use std::sync::Arc;

use serde::Serialize;
use tracing::info;

use super::evaluator::StateEvaluator;
use super::executor::ExecutionEngine;
use super::result::{ChainDelay, ChainPolicy};

/// A conditional execution request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Condition {
    IfThenElse {
        predicate: String,
        then_chain: Vec<String>,
        else_chain: Option<Vec<String>>,
    },
    /// Alternatives tried in order until one succeeds.
    OrChain { chains: Vec<Vec<String>> },
}

/// Outcome of a conditional execution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConditionalResult {
    pub success: bool,
    /// Every command attempted, across all branches, in order.
    pub executed_commands: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub condition_met: Option<bool>,
}

struct BranchOutcome {
    success: bool,
    executed: Vec<String>,
}

/// Evaluates [`Condition`]s with the execution engine and state evaluator.
pub struct ConditionalExecutor {
    engine: Arc<ExecutionEngine>,
    evaluator: Arc<StateEvaluator>,
}

impl ConditionalExecutor {
    pub fn new(engine: Arc<ExecutionEngine>, evaluator: Arc<StateEvaluator>) -> Self {
        Self { engine, evaluator }
    }

    pub fn execute(&self, condition: &Condition, policy: ChainPolicy) -> ConditionalResult {
        info!(?condition, force = policy.is_force(), "Executing conditional");
        match condition {
            Condition::IfThenElse {
                predicate,
                then_chain,
                else_chain,
            } => self.execute_if_then_else(predicate, then_chain, else_chain.as_deref(), policy),
            Condition::OrChain { chains } => self.execute_or_chain(chains, policy),
        }
    }

    fn execute_if_then_else(
        &self,
        predicate: &str,
        then_chain: &[String],
        else_chain: Option<&[String]>,
        policy: ChainPolicy,
    ) -> ConditionalResult {
        let met = self.evaluator.evaluate(predicate);
        info!(predicate, met, "Condition evaluated");

        let (branch, message) = match (met, else_chain) {
            (true, _) => (then_chain, "Condition met, executed then branch"),
            (false, Some(else_chain)) => (else_chain, "Condition not met, executed else branch"),
            (false, None) => {
                return ConditionalResult {
                    success: true,
                    executed_commands: Vec::new(),
                    message: Some("Condition not met, no else branch".to_string()),
                    error: None,
                    condition_met: Some(false),
                };
            }
        };

        let outcome = self.run_branch(branch, policy);
        ConditionalResult {
            success: outcome.success,
            executed_commands: outcome.executed,
            message: Some(message.to_string()),
            error: None,
            condition_met: Some(met),
        }
    }

    fn execute_or_chain(&self, chains: &[Vec<String>], policy: ChainPolicy) -> ConditionalResult {
        let mut executed = Vec::new();

        for (index, chain) in chains.iter().enumerate() {
            info!(alternative = index + 1, total = chains.len(), ?chain, "Trying OR alternative");
            let outcome = self.run_branch(chain, policy);
            executed.extend(outcome.executed);

            if outcome.success {
                return ConditionalResult {
                    success: true,
                    executed_commands: executed,
                    message: Some(format!("OR chain succeeded at alternative {}", index + 1)),
                    error: None,
                    condition_met: None,
                };
            }
        }

        let error = format!(
            "All {} alternatives failed after executing: {}",
            chains.len(),
            executed.join(", ")
        );
        ConditionalResult {
            success: false,
            executed_commands: executed,
            message: None,
            error: Some(error),
            condition_met: None,
        }
    }

    /// Run one branch. Under force mode a branch that attempted anything
    /// counts as successful.
    fn run_branch(&self, ids: &[String], policy: ChainPolicy) -> BranchOutcome {
        let results = self.engine.run_chain(ids, ChainDelay::Smart, policy);
        let all_succeeded = results.iter().all(|r| r.success);
        let executed: Vec<String> = results.into_iter().map(|r| r.command_id).collect();
        BranchOutcome {
            success: all_succeeded || (policy.is_force() && !executed.is_empty()),
            executed,
        }
    }
}

/// Split `a, b ,c` into ids, dropping empty entries.
pub fn parse_chain(text: &str) -> Vec<String> {
    text.split(',')
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(str::to_string)
        .collect()
}

/// Parse `a,b|c|d,e` into an OR-chain of three alternatives.
pub fn parse_or_chains(text: &str) -> Condition {
    let chains = text
        .split('|')
        .map(parse_chain)
        .filter(|chain| !chain.is_empty())
        .collect();
    Condition::OrChain { chains }
}

/// Build an if/then/else from its three textual fields.
///
/// When `then` holds `|`-separated alternatives only the first one is used.
/// Returns `None` when the predicate or the then-branch is empty.
pub fn parse_if_then_else(check: &str, then: &str, otherwise: Option<&str>) -> Option<Condition> {
    let predicate = check.trim();
    let then_chain = then.split('|').next().map(parse_chain).unwrap_or_default();
    if predicate.is_empty() || then_chain.is_empty() {
        return None;
    }

    let else_chain = otherwise.map(parse_chain).filter(|chain| !chain.is_empty());
    Some(Condition::IfThenElse {
        predicate: predicate.to_string(),
        then_chain,
        else_chain,
    })
}
