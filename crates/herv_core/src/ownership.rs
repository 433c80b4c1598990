//! Ownership graph between result entities.
//!
//! Deletes walk this table instead of relying on storage-level cascade
//! triggers, so the same rules apply on every backend.

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum Entity {
    RunRecord,
    HervChain,
    Ltr,
    LtrChainAssociation,
    Motif,
    Probabilities,
    Subgene,
    Domain,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum OnOwnerDelete {
    /// Dependent rows are deleted together with the owner.
    Cascade,
    /// The dependent's reference column is cleared; the row survives.
    SetNull,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct OwnershipEdge {
    pub owner: Entity,
    pub dependent: Entity,
    pub on_delete: OnOwnerDelete,
}

const fn edge(owner: Entity, dependent: Entity, on_delete: OnOwnerDelete) -> OwnershipEdge {
    OwnershipEdge {
        owner,
        dependent,
        on_delete,
    }
}

pub const OWNERSHIP: &[OwnershipEdge] = &[
    edge(Entity::RunRecord, Entity::HervChain, OnOwnerDelete::SetNull),
    edge(Entity::HervChain, Entity::Motif, OnOwnerDelete::Cascade),
    edge(
        Entity::HervChain,
        Entity::Probabilities,
        OnOwnerDelete::Cascade,
    ),
    edge(
        Entity::HervChain,
        Entity::LtrChainAssociation,
        OnOwnerDelete::Cascade,
    ),
    edge(Entity::HervChain, Entity::Subgene, OnOwnerDelete::Cascade),
    edge(Entity::Subgene, Entity::Domain, OnOwnerDelete::Cascade),
    edge(
        Entity::Ltr,
        Entity::LtrChainAssociation,
        OnOwnerDelete::Cascade,
    ),
];

pub fn dependents_of(owner: Entity) -> impl Iterator<Item = &'static OwnershipEdge> {
    OWNERSHIP.iter().filter(move |edge| edge.owner == owner)
}

#[cfg(test)]
mod tests {
    use super::{Entity, OnOwnerDelete, dependents_of};

    #[test]
    fn chain_owns_its_annotations_outright() {
        let edges: Vec<_> = dependents_of(Entity::HervChain).collect();
        assert_eq!(edges.len(), 4);
        assert!(
            edges
                .iter()
                .all(|edge| edge.on_delete == OnOwnerDelete::Cascade)
        );
        for entity in [
            Entity::Motif,
            Entity::Probabilities,
            Entity::LtrChainAssociation,
            Entity::Subgene,
        ] {
            assert!(
                edges.iter().any(|edge| edge.dependent == entity),
                "missing {entity:?}"
            );
        }
    }

    #[test]
    fn run_detaches_chains_instead_of_deleting() {
        let edges: Vec<_> = dependents_of(Entity::RunRecord).collect();
        assert_eq!(edges.len(), 1);
        assert_eq!(edges[0].dependent, Entity::HervChain);
        assert_eq!(edges[0].on_delete, OnOwnerDelete::SetNull);
    }

    #[test]
    fn leaves_own_nothing() {
        for entity in [Entity::Domain, Entity::Motif, Entity::LtrChainAssociation] {
            assert_eq!(dependents_of(entity).count(), 0);
        }
        let owned: Vec<_> = dependents_of(Entity::Ltr).collect();
        assert_eq!(owned.len(), 1);
        assert_eq!(owned[0].dependent, Entity::LtrChainAssociation);
    }
}
