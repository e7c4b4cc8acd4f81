//! Contract dependency lookup
//!
//! A contract lock may itself depend on other contracts. The ledger owns that
//! graph; resolvers expose the outgoing edges of one contract at a time.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;

use crate::{data_structures::types::Address, errors::WalletResult};

/// Source of contract-to-contract lock dependencies
#[async_trait]
pub trait ContractDependencyResolver: Send + Sync {
    /// Contracts that `contract`'s own locking conditions reference
    async fn dependencies(&self, contract: &Address) -> WalletResult<Vec<Address>>;
}

/// Resolver for deployments without contract-to-contract locks
#[derive(Debug, Clone, Copy, Default)]
pub struct NoContractDependencies;

#[async_trait]
impl ContractDependencyResolver for NoContractDependencies {
    async fn dependencies(&self, _contract: &Address) -> WalletResult<Vec<Address>> {
        Ok(Vec::new())
    }
}

/// In-memory adjacency set, for tests and pre-fetched graphs
#[derive(Debug, Clone, Default)]
pub struct StaticContractGraph {
    edges: HashMap<Address, HashSet<Address>>,
}

impl StaticContractGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_edge(mut self, from: Address, to: Address) -> Self {
        self.add_edge(from, to);
        self
    }

    pub fn add_edge(&mut self, from: Address, to: Address) {
        self.edges.entry(from).or_default().insert(to);
    }

    pub fn len(&self) -> usize {
        self.edges.values().map(HashSet::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl ContractDependencyResolver for StaticContractGraph {
    async fn dependencies(&self, contract: &Address) -> WalletResult<Vec<Address>> {
        let mut deps: Vec<Address> = self
            .edges
            .get(contract)
            .map(|set| set.iter().copied().collect())
            .unwrap_or_default();
        // Stable order keeps traversal and log output reproducible
        deps.sort();
        Ok(deps)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_static_graph_edges() {
        let a = Address::new([1; 20]);
        let b = Address::new([2; 20]);
        let c = Address::new([3; 20]);
        let graph = StaticContractGraph::new()
            .with_edge(a, c)
            .with_edge(a, b)
            .with_edge(a, b);

        assert_eq!(graph.len(), 2);
        assert_eq!(graph.dependencies(&a).await.unwrap(), vec![b, c]);
        assert!(graph.dependencies(&b).await.unwrap().is_empty());
        assert!(NoContractDependencies.dependencies(&a).await.unwrap().is_empty());
    }
}
