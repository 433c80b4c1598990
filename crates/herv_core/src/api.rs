use async_trait::async_trait;

use crate::{
    AssociationId, ChainBundle, ChainBundleIds, ChainHierarchy, ChainId, Domain, DomainAttributes,
    DomainId, HervChain, HervResult, Ltr, LtrAttributes, LtrId, Motif, MotifId, NewChain, NewMotif,
    NewSubgene, ProbabilitiesId, ProbabilityRecord, RetrovirusTypeProbabilities, RunId, RunParams,
    RunRecord, StoreStats, Subgene, SubgeneId,
};

#[async_trait]
pub trait RunRecordApi {
    async fn create_run(&self, params: RunParams) -> HervResult<RunId>;
    async fn get_run(&self, run_id: RunId) -> HervResult<Option<RunRecord>>;
    async fn list_runs(&self) -> HervResult<Vec<RunRecord>>;
    /// Detaches every chain of the run, then removes the run. Returns the
    /// number of detached chains.
    async fn delete_run(&self, run_id: RunId) -> HervResult<u64>;
}

#[async_trait]
pub trait ChainWriteApi {
    async fn create_chain(&self, chain: NewChain) -> HervResult<ChainId>;
    async fn attach_motif(&self, chain_id: ChainId, motif: NewMotif) -> HervResult<MotifId>;
    async fn attach_subgene(&self, chain_id: ChainId, subgene: NewSubgene) -> HervResult<SubgeneId>;
    /// Write-once: a chain that already has a vector fails with `DuplicateSingleton`.
    async fn set_probability_vector(
        &self,
        chain_id: ChainId,
        probabilities: RetrovirusTypeProbabilities,
    ) -> HervResult<ProbabilitiesId>;
    async fn write_chain_bundle(&self, bundle: ChainBundle) -> HervResult<ChainBundleIds>;
    async fn delete_chain(&self, chain_id: ChainId) -> HervResult<()>;
}

#[async_trait]
pub trait SubgeneDomainApi {
    async fn create_subgene(&self, chain_id: ChainId, subgene: NewSubgene) -> HervResult<SubgeneId>;
    async fn add_domain(
        &self,
        subgene_id: SubgeneId,
        domain: DomainAttributes,
    ) -> HervResult<DomainId>;
    async fn list_subgenes(&self, chain_id: ChainId) -> HervResult<Vec<Subgene>>;
    /// Ordered by ordinal index when present, then by creation order.
    async fn list_domains(&self, subgene_id: SubgeneId) -> HervResult<Vec<Domain>>;
}

#[async_trait]
pub trait ProbabilityApi {
    async fn set_probabilities(
        &self,
        chain_id: ChainId,
        probabilities: RetrovirusTypeProbabilities,
    ) -> HervResult<ProbabilitiesId>;
    async fn get_probabilities(&self, chain_id: ChainId) -> HervResult<Option<ProbabilityRecord>>;
}

#[async_trait]
pub trait LtrApi {
    async fn create_ltr(&self, ltr: LtrAttributes) -> HervResult<LtrId>;
    async fn get_ltr(&self, ltr_id: LtrId) -> HervResult<Option<Ltr>>;
    async fn delete_ltr(&self, ltr_id: LtrId) -> HervResult<()>;
    async fn link_ltr_to_chain(&self, chain_id: ChainId, ltr_id: LtrId)
    -> HervResult<AssociationId>;
    async fn unlink_ltr_from_chain(&self, chain_id: ChainId, ltr_id: LtrId) -> HervResult<()>;
    async fn list_ltrs_for_chain(&self, chain_id: ChainId) -> HervResult<Vec<Ltr>>;
    async fn list_chains_for_ltr(&self, ltr_id: LtrId) -> HervResult<Vec<HervChain>>;
    /// LTRs with no remaining association rows. They are kept until purged.
    async fn list_orphan_ltrs(&self) -> HervResult<Vec<Ltr>>;
    /// Deletes every LTR that `list_orphan_ltrs` would return, including one
    /// created a moment ago and not linked yet. Link before purging, or write
    /// the chain and its LTRs together with `write_chain_bundle`.
    async fn purge_orphan_ltrs(&self) -> HervResult<u64>;
}

#[async_trait]
pub trait ResultsReadApi {
    async fn get_chain(&self, chain_id: ChainId) -> HervResult<Option<HervChain>>;
    async fn query_chain(&self, chain_id: ChainId) -> HervResult<ChainHierarchy>;
    async fn list_chains_for_run(&self, run_id: RunId) -> HervResult<Vec<HervChain>>;
    async fn list_motifs(&self, chain_id: ChainId) -> HervResult<Vec<Motif>>;
    async fn stats(&self) -> HervResult<StoreStats>;
}
