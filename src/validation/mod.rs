//! Validation module for locking conditions
//!
//! Structural checks run synchronously and never touch the network. The
//! contract cycle check needs the dependency graph, which is fetched through a
//! [`ContractDependencyResolver`], so the full [`validate`] entry point is async.

pub mod contract_graph;
pub mod locking_condition;

pub use contract_graph::{ContractDependencyResolver, NoContractDependencies, StaticContractGraph};
pub use locking_condition::{detect_contract_cycles, validate, validate_condition, validate_structure};
