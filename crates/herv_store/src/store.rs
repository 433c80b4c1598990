use std::collections::{HashSet, VecDeque};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use sea_orm::sea_query;
use sea_orm::sea_query::{
    Alias, Expr, ExprTrait, Func, InsertStatement, MysqlQueryBuilder, Order, PostgresQueryBuilder,
    Query, QueryStatementWriter, SelectStatement, SqliteQueryBuilder,
};
use sea_orm::{
    ConnectOptions, ConnectionTrait, Database, DatabaseBackend, DatabaseConnection, QueryResult,
    Statement, TransactionTrait,
};
use sea_orm_migration::MigratorTrait;
use tokio::sync::Mutex;

use crate::datastore::prepare_sqlite_file;
use crate::db::*;
use crate::migration::Migrator;
use crate::{HervConfig, ValidationMode};
use herv_core::ownership::{Entity, OnOwnerDelete, OwnershipEdge, dependents_of};
use herv_core::validate::{
    domain_base_count_issue, ltr_containment_issue, validate_chain, validate_domain, validate_ltr,
    validate_motif, validate_probabilities, validate_run, validate_subgene,
};
use herv_core::{
    AssociationId, BundleLtr, ChainBundle, ChainBundleIds, ChainHierarchy, ChainId, ChainType,
    ChainWriteApi, Domain, DomainAttributes, DomainId, HervChain, HervError, HervResult, Ltr,
    LtrApi, LtrAttributes, LtrId, LtrType, Motif, MotifId, MotifType, NewChain, NewMotif,
    NewSubgene, ProbabilitiesId, ProbabilityApi, ProbabilityRecord, ResultsReadApi,
    RetrovirusTypeProbabilities, RunId, RunParams, RunRecord, RunRecordApi, SignalHit, Span,
    StoreStats, Subgene, SubgeneDomainApi, SubgeneId, SubgeneWithDomains, TextLimits, Timestamp,
};

#[derive(Clone)]
pub struct HervStore {
    conn: DatabaseConnection,
    limits: TextLimits,
    probability_tolerance: f64,
    enforce_ltr_containment: bool,
    validation_mode: ValidationMode,
    failpoints: HashSet<String>,
    // Held from `begin` to commit by every write.
    write_gate: Arc<Mutex<()>>,
}

/// Rows touched by one delete, collected before anything is removed.
#[derive(Debug, Default)]
struct CascadePlan {
    deletes: Vec<(Entity, Vec<i32>)>,
    detaches: Vec<(&'static OwnershipEdge, Vec<i32>)>,
}

impl CascadePlan {
    fn deleted(&self, entity: Entity) -> usize {
        self.deletes
            .iter()
            .filter(|(kind, _)| *kind == entity)
            .map(|(_, ids)| ids.len())
            .sum()
    }
}

impl HervStore {
    pub async fn connect(config: &HervConfig, base_dir: &Path) -> HervResult<Self> {
        config.check()?;
        let url = build_connection_url(config, base_dir)?;
        let mut options = ConnectOptions::new(url);
        if let Some(pool) = &config.pool {
            if let Some(max) = pool.max_connections {
                options.max_connections(max);
            }
            if let Some(min) = pool.min_connections {
                options.min_connections(min);
            }
            if let Some(timeout_ms) = pool.connect_timeout_ms {
                options.connect_timeout(Duration::from_millis(timeout_ms));
            }
            if let Some(timeout_ms) = pool.acquire_timeout_ms {
                options.acquire_timeout(Duration::from_millis(timeout_ms));
            }
            if let Some(timeout_ms) = pool.idle_timeout_ms {
                options.idle_timeout(Duration::from_millis(timeout_ms));
            }
        }
        options.sqlx_logging(false);
        let conn = Database::connect(options).await.map_err(HervError::from)?;
        let failpoints = config
            .failpoints
            .clone()
            .unwrap_or_default()
            .into_iter()
            .collect::<HashSet<_>>();
        let store = Self {
            conn,
            limits: config.text_limits(),
            probability_tolerance: config.probability_tolerance(),
            enforce_ltr_containment: config.enforce_ltr_containment(),
            validation_mode: config.validation_mode.unwrap_or(ValidationMode::Error),
            failpoints,
            write_gate: Arc::new(Mutex::new(())),
        };
        Migrator::up(&store.conn, None)
            .await
            .map_err(HervError::from)?;
        log::debug!(
            "herv store connected ({}) with validation mode {:?}",
            config.backend_name(),
            store.validation_mode
        );
        Ok(store)
    }

    pub fn connection(&self) -> &DatabaseConnection {
        &self.conn
    }

    fn soft_check(&self, field: &str, issue: Option<String>) -> HervResult<()> {
        let Some(message) = issue else {
            return Ok(());
        };
        match self.validation_mode {
            ValidationMode::Error => Err(HervError::invalid_range(field, message)),
            ValidationMode::Warn => {
                log::warn!("herv validation warning on {field}: {message}");
                Ok(())
            }
            ValidationMode::Off => Ok(()),
        }
    }

    fn check_domain(&self, domain: &DomainAttributes) -> HervResult<()> {
        validate_domain(domain, &self.limits)?;
        self.soft_check("n_bases", domain_base_count_issue(domain))
    }

    fn check_containment(&self, chain: Span, ltr: Span) -> HervResult<()> {
        if !self.enforce_ltr_containment {
            return Ok(());
        }
        self.soft_check("init_idx..fin_idx", ltr_containment_issue(chain, ltr))
    }

    fn maybe_failpoint(&self, key: &str) -> HervResult<()> {
        if self.failpoints.contains(key) {
            Err(HervError::storage(format!("failpoint {key}")))
        } else {
            Ok(())
        }
    }

    async fn require_chain<C: ConnectionTrait>(
        &self,
        conn: &C,
        chain_id: ChainId,
    ) -> HervResult<HervChain> {
        fetch_chain(conn, chain_id)
            .await?
            .ok_or_else(|| HervError::dangling("herv_chain_id", chain_id.to_string()))
    }

    async fn require_run<C: ConnectionTrait>(&self, conn: &C, run_id: RunId) -> HervResult<()> {
        if entity_exists(conn, Entity::RunRecord, run_id.0).await? {
            Ok(())
        } else {
            Err(HervError::dangling("run_metadata_id", run_id.to_string()))
        }
    }

    async fn require_ltr<C: ConnectionTrait>(&self, conn: &C, ltr_id: LtrId) -> HervResult<Ltr> {
        fetch_ltr(conn, ltr_id)
            .await?
            .ok_or_else(|| HervError::dangling("ltr_id", ltr_id.to_string()))
    }

    /// Walks the ownership graph from `root`, collecting every dependent row.
    async fn plan_cascade<C: ConnectionTrait>(
        &self,
        conn: &C,
        root: Entity,
        ids: Vec<i32>,
    ) -> HervResult<CascadePlan> {
        let mut plan = CascadePlan::default();
        let mut queue = VecDeque::from([(root, ids)]);
        while let Some((entity, ids)) = queue.pop_front() {
            if ids.is_empty() {
                continue;
            }
            for edge in dependents_of(entity) {
                let (table, id_col) = entity_table(edge.dependent);
                let select = Query::select()
                    .from(table)
                    .column(id_col.clone())
                    .and_where(Expr::col(reference_column(edge)?).is_in(ids.iter().copied()))
                    .order_by(id_col.clone(), Order::Asc)
                    .to_owned();
                let mut dependent_ids = Vec::new();
                for row in query_all(conn, &select).await? {
                    dependent_ids.push(row.try_get::<i32>("", &col_name(id_col.clone()))?);
                }
                if dependent_ids.is_empty() {
                    continue;
                }
                match edge.on_delete {
                    OnOwnerDelete::Cascade => queue.push_back((edge.dependent, dependent_ids)),
                    OnOwnerDelete::SetNull => plan.detaches.push((edge, dependent_ids)),
                }
            }
            plan.deletes.push((entity, ids));
        }
        Ok(plan)
    }

    /// Detaches first, then deletes leaves before their owners.
    async fn execute_cascade<C: ConnectionTrait>(
        &self,
        conn: &C,
        plan: &CascadePlan,
    ) -> HervResult<()> {
        for (edge, ids) in &plan.detaches {
            let (table, id_col) = entity_table(edge.dependent);
            let update = Query::update()
                .table(table)
                .value(reference_column(edge)?, Option::<i32>::None)
                .and_where(Expr::col(id_col).is_in(ids.iter().copied()))
                .to_owned();
            exec(conn, &update).await?;
        }
        for (entity, ids) in plan.deletes.iter().rev() {
            let (table, id_col) = entity_table(*entity);
            self.maybe_failpoint(&format!("cascade.{}", col_name(table.clone())))?;
            let delete = Query::delete()
                .from_table(table)
                .and_where(Expr::col(id_col).is_in(ids.iter().copied()))
                .to_owned();
            exec(conn, &delete).await?;
        }
        Ok(())
    }

    async fn link_in<C: ConnectionTrait>(
        &self,
        conn: &C,
        chain: &HervChain,
        ltr: &Ltr,
    ) -> HervResult<AssociationId> {
        if association_exists(conn, chain.chain_id, ltr.ltr_id).await? {
            return Err(HervError::DuplicateAssociation {
                chain_id: chain.chain_id.0,
                ltr_id: ltr.ltr_id.0,
            });
        }
        self.check_containment(chain.span, ltr.attributes.span)?;
        let insert = Query::insert()
            .into_table(HervLtrsOfChain::Table)
            .columns([HervLtrsOfChain::HervChainId, HervLtrsOfChain::LtrId])
            .values_panic([chain.chain_id.0.into(), ltr.ltr_id.0.into()])
            .to_owned();
        let id = insert_returning_id(conn, insert, HervLtrsOfChain::Id).await?;
        AssociationId::from_i64(id)
    }
}

#[async_trait]
impl RunRecordApi for HervStore {
    async fn create_run(&self, params: RunParams) -> HervResult<RunId> {
        validate_run(&params, &self.limits)?;
        let _writer = self.write_gate.lock().await;
        let tx = self.conn.begin().await?;
        let insert = Query::insert()
            .into_table(HervRunMetadata::Table)
            .columns([
                HervRunMetadata::Executer,
                HervRunMetadata::DnaFile,
                HervRunMetadata::Selected,
                HervRunMetadata::Database,
                HervRunMetadata::DbName,
                HervRunMetadata::DbLastModifiedDatetime,
                HervRunMetadata::ExecutionDuration,
                HervRunMetadata::SelectionThreshold,
                HervRunMetadata::FinalSelectionThreshold,
                HervRunMetadata::KeepThreshold,
                HervRunMetadata::ImproveHitsMax,
                HervRunMetadata::SubgeneHitsMax,
                HervRunMetadata::ConservationFactor,
                HervRunMetadata::BrokenPenalty,
                HervRunMetadata::LengthBonus,
                HervRunMetadata::FrameFactor,
                HervRunMetadata::MaxSubgeneSkip,
                HervRunMetadata::BrokenPasses,
                HervRunMetadata::OrfidMinScore,
                HervRunMetadata::Strand,
                HervRunMetadata::Sdfactor,
                HervRunMetadata::FitPuteins,
                HervRunMetadata::MakeChainsFiles,
                HervRunMetadata::ScriptPath,
                HervRunMetadata::ScriptInput,
                HervRunMetadata::InputFile,
                HervRunMetadata::Debugging,
                HervRunMetadata::RunDatetime,
                HervRunMetadata::RetrotectorVersion,
            ])
            .values_panic([
                params.executer.clone().into(),
                params.dna_file.clone().into(),
                params.selected.clone().into(),
                params.database.clone().into(),
                params.db_name.clone().into(),
                params.db_last_modified.map(Timestamp::as_i64).into(),
                params.execution_duration_secs.into(),
                params.selection_threshold.into(),
                params.final_selection_threshold.into(),
                params.keep_threshold.into(),
                params.improve_hits_max.into(),
                params.subgene_hits_max.into(),
                params.conservation_factor.into(),
                params.broken_penalty.into(),
                params.length_bonus.into(),
                params.frame_factor.into(),
                params.max_subgene_skip.into(),
                params.broken_passes.into(),
                params.orfid_min_score.into(),
                params.strand.clone().into(),
                params.sd_factor.into(),
                params.fit_puteins.clone().into(),
                params.make_chains_files.clone().into(),
                params.script_path.clone().into(),
                params.script_input.clone().into(),
                params.input_file.clone().into(),
                params.debugging.clone().into(),
                params.run_datetime.as_i64().into(),
                params.tool_version.clone().into(),
            ])
            .to_owned();
        let id = insert_returning_id(&tx, insert, HervRunMetadata::Id).await?;
        let run_id = RunId::from_i64(id)?;
        tx.commit().await?;
        log::debug!("recorded {run_id} for {}", params.dna_file);
        Ok(run_id)
    }

    async fn get_run(&self, run_id: RunId) -> HervResult<Option<RunRecord>> {
        let select = run_select()
            .and_where(Expr::col(HervRunMetadata::Id).eq(run_id.0))
            .to_owned();
        query_one(&self.conn, &select)
            .await?
            .map(|row| read_run(&row))
            .transpose()
    }

    async fn list_runs(&self) -> HervResult<Vec<RunRecord>> {
        let select = run_select()
            .order_by(HervRunMetadata::Id, Order::Asc)
            .to_owned();
        query_all(&self.conn, &select)
            .await?
            .iter()
            .map(read_run)
            .collect()
    }

    async fn delete_run(&self, run_id: RunId) -> HervResult<u64> {
        let _writer = self.write_gate.lock().await;
        let tx = self.conn.begin().await?;
        if !entity_exists(&tx, Entity::RunRecord, run_id.0).await? {
            return Err(HervError::not_found(run_id.to_string()));
        }
        let plan = self
            .plan_cascade(&tx, Entity::RunRecord, vec![run_id.0])
            .await?;
        self.execute_cascade(&tx, &plan).await?;
        tx.commit().await?;
        let detached: usize = plan.detaches.iter().map(|(_, ids)| ids.len()).sum();
        log::info!("deleted {run_id}, detached {detached} chains");
        Ok(detached as u64)
    }
}

#[async_trait]
impl ChainWriteApi for HervStore {
    async fn create_chain(&self, chain: NewChain) -> HervResult<ChainId> {
        validate_chain(&chain, &self.limits)?;
        let _writer = self.write_gate.lock().await;
        let tx = self.conn.begin().await?;
        if let Some(run_id) = chain.run_id {
            self.require_run(&tx, run_id).await?;
        }
        let chain_id = insert_chain(&tx, &chain).await?;
        tx.commit().await?;
        log::debug!("created {chain_id}");
        Ok(chain_id)
    }

    async fn attach_motif(&self, chain_id: ChainId, motif: NewMotif) -> HervResult<MotifId> {
        validate_motif(&motif)?;
        let _writer = self.write_gate.lock().await;
        let tx = self.conn.begin().await?;
        self.require_chain(&tx, chain_id).await?;
        let motif_id = insert_motif(&tx, chain_id, &motif).await?;
        tx.commit().await?;
        log::debug!("attached {motif_id} to {chain_id}");
        Ok(motif_id)
    }

    async fn attach_subgene(
        &self,
        chain_id: ChainId,
        subgene: NewSubgene,
    ) -> HervResult<SubgeneId> {
        SubgeneDomainApi::create_subgene(self, chain_id, subgene).await
    }

    async fn set_probability_vector(
        &self,
        chain_id: ChainId,
        probabilities: RetrovirusTypeProbabilities,
    ) -> HervResult<ProbabilitiesId> {
        ProbabilityApi::set_probabilities(self, chain_id, probabilities).await
    }

    async fn write_chain_bundle(&self, bundle: ChainBundle) -> HervResult<ChainBundleIds> {
        validate_chain(&bundle.chain, &self.limits)?;
        for motif in &bundle.motifs {
            validate_motif(motif)?;
        }
        for entry in &bundle.subgenes {
            validate_subgene(&entry.subgene, &self.limits)?;
            for domain in &entry.domains {
                self.check_domain(domain)?;
            }
        }
        if let Some(probabilities) = &bundle.probabilities {
            validate_probabilities(probabilities, self.probability_tolerance)?;
        }
        for ltr in &bundle.ltrs {
            if let BundleLtr::New(attributes) = ltr {
                validate_ltr(attributes, &self.limits)?;
                self.check_containment(bundle.chain.span, attributes.span)?;
            }
        }

        let _writer = self.write_gate.lock().await;
        let tx = self.conn.begin().await?;
        if let Some(run_id) = bundle.chain.run_id {
            self.require_run(&tx, run_id).await?;
        }
        let mut existing = Vec::new();
        for ltr in &bundle.ltrs {
            if let BundleLtr::Existing(ltr_id) = ltr {
                let ltr = self.require_ltr(&tx, *ltr_id).await?;
                self.check_containment(bundle.chain.span, ltr.attributes.span)?;
                existing.push(ltr);
            }
        }

        let chain_id = insert_chain(&tx, &bundle.chain).await?;
        let chain = self.require_chain(&tx, chain_id).await?;
        let mut motif_ids = Vec::with_capacity(bundle.motifs.len());
        for motif in &bundle.motifs {
            motif_ids.push(insert_motif(&tx, chain_id, motif).await?);
        }
        let mut subgene_ids = Vec::with_capacity(bundle.subgenes.len());
        let mut domain_ids = Vec::with_capacity(bundle.subgenes.len());
        for entry in &bundle.subgenes {
            let subgene_id = insert_subgene(&tx, chain_id, &entry.subgene).await?;
            let mut ids = Vec::with_capacity(entry.domains.len());
            for domain in &entry.domains {
                ids.push(insert_domain(&tx, subgene_id, domain).await?);
            }
            subgene_ids.push(subgene_id);
            domain_ids.push(ids);
        }
        let probabilities_id = match &bundle.probabilities {
            Some(probabilities) => Some(insert_probabilities(&tx, chain_id, probabilities).await?),
            None => None,
        };
        let mut existing = existing.into_iter();
        let mut ltr_ids = Vec::with_capacity(bundle.ltrs.len());
        for ltr in &bundle.ltrs {
            let ltr = match ltr {
                BundleLtr::Existing(_) => existing
                    .next()
                    .ok_or_else(|| HervError::storage("bundle ltr bookkeeping out of step"))?,
                BundleLtr::New(attributes) => {
                    let ltr_id = insert_ltr(&tx, attributes).await?;
                    Ltr {
                        ltr_id,
                        attributes: attributes.clone(),
                    }
                }
            };
            // A repeated LTR fails here; dropping the transaction discards the chain.
            self.link_in(&tx, &chain, &ltr).await?;
            ltr_ids.push(ltr.ltr_id);
        }
        self.maybe_failpoint("bundle.before_commit")?;
        tx.commit().await?;
        log::debug!(
            "wrote {chain_id} with {} motifs, {} subgenes, {} ltrs",
            motif_ids.len(),
            subgene_ids.len(),
            ltr_ids.len()
        );
        Ok(ChainBundleIds {
            chain_id,
            motif_ids,
            subgene_ids,
            domain_ids,
            probabilities_id,
            ltr_ids,
        })
    }

    async fn delete_chain(&self, chain_id: ChainId) -> HervResult<()> {
        let _writer = self.write_gate.lock().await;
        let tx = self.conn.begin().await?;
        if !entity_exists(&tx, Entity::HervChain, chain_id.0).await? {
            return Err(HervError::not_found(chain_id.to_string()));
        }
        let plan = self
            .plan_cascade(&tx, Entity::HervChain, vec![chain_id.0])
            .await?;
        self.execute_cascade(&tx, &plan).await?;
        tx.commit().await?;
        log::info!(
            "deleted {chain_id}: {} motifs, {} subgenes, {} domains, {} ltr links",
            plan.deleted(Entity::Motif),
            plan.deleted(Entity::Subgene),
            plan.deleted(Entity::Domain),
            plan.deleted(Entity::LtrChainAssociation)
        );
        Ok(())
    }
}

#[async_trait]
impl SubgeneDomainApi for HervStore {
    async fn create_subgene(
        &self,
        chain_id: ChainId,
        subgene: NewSubgene,
    ) -> HervResult<SubgeneId> {
        validate_subgene(&subgene, &self.limits)?;
        let _writer = self.write_gate.lock().await;
        let tx = self.conn.begin().await?;
        self.require_chain(&tx, chain_id).await?;
        let subgene_id = insert_subgene(&tx, chain_id, &subgene).await?;
        tx.commit().await?;
        log::debug!("created {subgene_id} '{}' on {chain_id}", subgene.name);
        Ok(subgene_id)
    }

    async fn add_domain(
        &self,
        subgene_id: SubgeneId,
        domain: DomainAttributes,
    ) -> HervResult<DomainId> {
        self.check_domain(&domain)?;
        let _writer = self.write_gate.lock().await;
        let tx = self.conn.begin().await?;
        if !entity_exists(&tx, Entity::Subgene, subgene_id.0).await? {
            return Err(HervError::dangling("subgene_id", subgene_id.to_string()));
        }
        let domain_id = insert_domain(&tx, subgene_id, &domain).await?;
        tx.commit().await?;
        log::debug!("added {domain_id} to {subgene_id}");
        Ok(domain_id)
    }

    async fn list_subgenes(&self, chain_id: ChainId) -> HervResult<Vec<Subgene>> {
        fetch_subgenes(&self.conn, chain_id).await
    }

    async fn list_domains(&self, subgene_id: SubgeneId) -> HervResult<Vec<Domain>> {
        fetch_domains(&self.conn, &[subgene_id]).await
    }
}

#[async_trait]
impl ProbabilityApi for HervStore {
    async fn set_probabilities(
        &self,
        chain_id: ChainId,
        probabilities: RetrovirusTypeProbabilities,
    ) -> HervResult<ProbabilitiesId> {
        validate_probabilities(&probabilities, self.probability_tolerance)?;
        let _writer = self.write_gate.lock().await;
        let tx = self.conn.begin().await?;
        self.require_chain(&tx, chain_id).await?;
        if fetch_probabilities(&tx, chain_id).await?.is_some() {
            return Err(HervError::duplicate_singleton(format!(
                "{chain_id} already has retrovirus type probabilities"
            )));
        }
        let probabilities_id = insert_probabilities(&tx, chain_id, &probabilities).await?;
        tx.commit().await?;
        log::debug!("set {probabilities_id} on {chain_id}");
        Ok(probabilities_id)
    }

    async fn get_probabilities(&self, chain_id: ChainId) -> HervResult<Option<ProbabilityRecord>> {
        fetch_probabilities(&self.conn, chain_id).await
    }
}

#[async_trait]
impl LtrApi for HervStore {
    async fn create_ltr(&self, ltr: LtrAttributes) -> HervResult<LtrId> {
        validate_ltr(&ltr, &self.limits)?;
        let _writer = self.write_gate.lock().await;
        let tx = self.conn.begin().await?;
        let ltr_id = insert_ltr(&tx, &ltr).await?;
        tx.commit().await?;
        log::debug!("created {ltr_id} ({})", ltr.ltr_type.as_str());
        Ok(ltr_id)
    }

    async fn get_ltr(&self, ltr_id: LtrId) -> HervResult<Option<Ltr>> {
        fetch_ltr(&self.conn, ltr_id).await
    }

    async fn delete_ltr(&self, ltr_id: LtrId) -> HervResult<()> {
        let _writer = self.write_gate.lock().await;
        let tx = self.conn.begin().await?;
        if !entity_exists(&tx, Entity::Ltr, ltr_id.0).await? {
            return Err(HervError::not_found(ltr_id.to_string()));
        }
        let plan = self.plan_cascade(&tx, Entity::Ltr, vec![ltr_id.0]).await?;
        self.execute_cascade(&tx, &plan).await?;
        tx.commit().await?;
        log::info!(
            "deleted {ltr_id} and {} chain links",
            plan.deleted(Entity::LtrChainAssociation)
        );
        Ok(())
    }

    async fn link_ltr_to_chain(
        &self,
        chain_id: ChainId,
        ltr_id: LtrId,
    ) -> HervResult<AssociationId> {
        let _writer = self.write_gate.lock().await;
        let tx = self.conn.begin().await?;
        let chain = self.require_chain(&tx, chain_id).await?;
        let ltr = self.require_ltr(&tx, ltr_id).await?;
        let association_id = self.link_in(&tx, &chain, &ltr).await?;
        tx.commit().await?;
        log::debug!("linked {ltr_id} to {chain_id}");
        Ok(association_id)
    }

    async fn unlink_ltr_from_chain(&self, chain_id: ChainId, ltr_id: LtrId) -> HervResult<()> {
        let _writer = self.write_gate.lock().await;
        let tx = self.conn.begin().await?;
        let delete = Query::delete()
            .from_table(HervLtrsOfChain::Table)
            .and_where(Expr::col(HervLtrsOfChain::HervChainId).eq(chain_id.0))
            .and_where(Expr::col(HervLtrsOfChain::LtrId).eq(ltr_id.0))
            .to_owned();
        if exec(&tx, &delete).await? == 0 {
            return Err(HervError::not_found(format!(
                "no link between {chain_id} and {ltr_id}"
            )));
        }
        tx.commit().await?;
        log::debug!("unlinked {ltr_id} from {chain_id}");
        Ok(())
    }

    async fn list_ltrs_for_chain(&self, chain_id: ChainId) -> HervResult<Vec<Ltr>> {
        fetch_ltrs_for_chain(&self.conn, chain_id).await
    }

    async fn list_chains_for_ltr(&self, ltr_id: LtrId) -> HervResult<Vec<HervChain>> {
        let linked = Query::select()
            .from(HervLtrsOfChain::Table)
            .column(HervLtrsOfChain::HervChainId)
            .and_where(Expr::col(HervLtrsOfChain::LtrId).eq(ltr_id.0))
            .to_owned();
        let select = chain_select()
            .and_where(Expr::col(HervChains::Id).in_subquery(linked))
            .order_by(HervChains::Id, Order::Asc)
            .to_owned();
        query_all(&self.conn, &select)
            .await?
            .iter()
            .map(read_chain)
            .collect()
    }

    async fn list_orphan_ltrs(&self) -> HervResult<Vec<Ltr>> {
        let select = ltr_select()
            .and_where(Expr::col(HervLtr::Id).not_in_subquery(linked_ltr_ids()))
            .order_by(HervLtr::Id, Order::Asc)
            .to_owned();
        query_all(&self.conn, &select)
            .await?
            .iter()
            .map(read_ltr)
            .collect()
    }

    async fn purge_orphan_ltrs(&self) -> HervResult<u64> {
        let _writer = self.write_gate.lock().await;
        let tx = self.conn.begin().await?;
        let delete = Query::delete()
            .from_table(HervLtr::Table)
            .and_where(Expr::col(HervLtr::Id).not_in_subquery(linked_ltr_ids()))
            .to_owned();
        let purged = exec(&tx, &delete).await?;
        tx.commit().await?;
        log::info!("purged {purged} orphan ltrs");
        Ok(purged)
    }
}

#[async_trait]
impl ResultsReadApi for HervStore {
    async fn get_chain(&self, chain_id: ChainId) -> HervResult<Option<HervChain>> {
        fetch_chain(&self.conn, chain_id).await
    }

    async fn query_chain(&self, chain_id: ChainId) -> HervResult<ChainHierarchy> {
        // One transaction so the hierarchy comes from a single snapshot.
        let tx = self.conn.begin().await?;
        let chain = fetch_chain(&tx, chain_id)
            .await?
            .ok_or_else(|| HervError::not_found(chain_id.to_string()))?;
        let motifs = fetch_motifs(&tx, chain_id).await?;
        let subgenes = fetch_subgenes(&tx, chain_id).await?;
        let subgene_ids = subgenes
            .iter()
            .map(|subgene| subgene.subgene_id)
            .collect::<Vec<_>>();
        let mut domains = fetch_domains(&tx, &subgene_ids).await?;
        let subgenes = subgenes
            .into_iter()
            .map(|subgene| {
                let (own, rest): (Vec<Domain>, Vec<Domain>) = domains
                    .drain(..)
                    .partition(|domain| domain.subgene_id == subgene.subgene_id);
                domains = rest;
                SubgeneWithDomains {
                    subgene,
                    domains: own,
                }
            })
            .collect();
        let probabilities = fetch_probabilities(&tx, chain_id).await?;
        let ltrs = fetch_ltrs_for_chain(&tx, chain_id).await?;
        tx.commit().await?;
        Ok(ChainHierarchy {
            chain,
            motifs,
            subgenes,
            probabilities,
            ltrs,
        })
    }

    async fn list_chains_for_run(&self, run_id: RunId) -> HervResult<Vec<HervChain>> {
        let select = chain_select()
            .and_where(Expr::col(HervChains::RunMetadataId).eq(run_id.0))
            .order_by(HervChains::Id, Order::Asc)
            .to_owned();
        query_all(&self.conn, &select)
            .await?
            .iter()
            .map(read_chain)
            .collect()
    }

    async fn list_motifs(&self, chain_id: ChainId) -> HervResult<Vec<Motif>> {
        fetch_motifs(&self.conn, chain_id).await
    }

    async fn stats(&self) -> HervResult<StoreStats> {
        let tx = self.conn.begin().await?;
        let stats = StoreStats {
            runs: count_rows(&tx, Entity::RunRecord).await?,
            chains: count_rows(&tx, Entity::HervChain).await?,
            ltrs: count_rows(&tx, Entity::Ltr).await?,
            associations: count_rows(&tx, Entity::LtrChainAssociation).await?,
            motifs: count_rows(&tx, Entity::Motif).await?,
            probabilities: count_rows(&tx, Entity::Probabilities).await?,
            subgenes: count_rows(&tx, Entity::Subgene).await?,
            domains: count_rows(&tx, Entity::Domain).await?,
        };
        tx.commit().await?;
        Ok(stats)
    }
}

fn alias(iden: impl sea_query::Iden) -> Alias {
    Alias::new(iden.to_string())
}

fn entity_table(entity: Entity) -> (Alias, Alias) {
    match entity {
        Entity::RunRecord => (alias(HervRunMetadata::Table), alias(HervRunMetadata::Id)),
        Entity::HervChain => (alias(HervChains::Table), alias(HervChains::Id)),
        Entity::Ltr => (alias(HervLtr::Table), alias(HervLtr::Id)),
        Entity::LtrChainAssociation => (alias(HervLtrsOfChain::Table), alias(HervLtrsOfChain::Id)),
        Entity::Motif => (alias(HervMotifs::Table), alias(HervMotifs::Id)),
        Entity::Probabilities => (
            alias(HervRetrovirusTypeProbabilities::Table),
            alias(HervRetrovirusTypeProbabilities::Id),
        ),
        Entity::Subgene => (alias(HervSubgenes::Table), alias(HervSubgenes::Id)),
        Entity::Domain => (alias(HervDomains::Table), alias(HervDomains::Id)),
    }
}

/// Column on the dependent table that points at the owner.
fn reference_column(edge: &OwnershipEdge) -> HervResult<Alias> {
    let column = match (edge.owner, edge.dependent) {
        (Entity::RunRecord, Entity::HervChain) => alias(HervChains::RunMetadataId),
        (Entity::HervChain, Entity::Motif) => alias(HervMotifs::HervChainId),
        (Entity::HervChain, Entity::Probabilities) => {
            alias(HervRetrovirusTypeProbabilities::HervChainId)
        }
        (Entity::HervChain, Entity::LtrChainAssociation) => alias(HervLtrsOfChain::HervChainId),
        (Entity::HervChain, Entity::Subgene) => alias(HervSubgenes::HervChainId),
        (Entity::Subgene, Entity::Domain) => alias(HervDomains::SubgeneId),
        (Entity::Ltr, Entity::LtrChainAssociation) => alias(HervLtrsOfChain::LtrId),
        (owner, dependent) => {
            return Err(HervError::storage(format!(
                "no reference column from {dependent:?} to {owner:?}"
            )));
        }
    };
    Ok(column)
}

async fn entity_exists<C: ConnectionTrait>(conn: &C, entity: Entity, id: i32) -> HervResult<bool> {
    let (table, id_col) = entity_table(entity);
    let select = Query::select()
        .from(table)
        .column(id_col.clone())
        .and_where(Expr::col(id_col).eq(id))
        .limit(1)
        .to_owned();
    Ok(query_one(conn, &select).await?.is_some())
}

async fn count_rows<C: ConnectionTrait>(conn: &C, entity: Entity) -> HervResult<u64> {
    let (table, id_col) = entity_table(entity);
    let select = Query::select()
        .from(table)
        .expr_as(Func::count(Expr::col(id_col)), Alias::new("row_count"))
        .to_owned();
    let row = query_one(conn, &select)
        .await?
        .ok_or_else(|| HervError::storage("count returned no row"))?;
    let count: i64 = row.try_get("", "row_count")?;
    Ok(u64::try_from(count).unwrap_or(0))
}

async fn association_exists<C: ConnectionTrait>(
    conn: &C,
    chain_id: ChainId,
    ltr_id: LtrId,
) -> HervResult<bool> {
    let select = Query::select()
        .from(HervLtrsOfChain::Table)
        .column(HervLtrsOfChain::Id)
        .and_where(Expr::col(HervLtrsOfChain::HervChainId).eq(chain_id.0))
        .and_where(Expr::col(HervLtrsOfChain::LtrId).eq(ltr_id.0))
        .limit(1)
        .to_owned();
    Ok(query_one(conn, &select).await?.is_some())
}

fn linked_ltr_ids() -> SelectStatement {
    Query::select()
        .from(HervLtrsOfChain::Table)
        .column(HervLtrsOfChain::LtrId)
        .to_owned()
}

async fn insert_chain<C: ConnectionTrait>(conn: &C, chain: &NewChain) -> HervResult<ChainId> {
    let insert = Query::insert()
        .into_table(HervChains::Table)
        .columns([
            HervChains::RunMetadataId,
            HervChains::TypeOfChain,
            HervChains::ChainLevel,
            HervChains::ChainStartIdx,
            HervChains::ChainEndIdx,
            HervChains::RetrovirusType,
            HervChains::Score,
            HervChains::IntegrationSites,
        ])
        .values_panic([
            chain.run_id.map(RunId::as_i32).into(),
            chain.chain_type.as_str().into(),
            chain.chain_level.into(),
            chain.span.start.into(),
            chain.span.end.into(),
            chain.retrovirus_type.clone().into(),
            chain.score.into(),
            chain.integration_sites.clone().into(),
        ])
        .to_owned();
    ChainId::from_i64(insert_returning_id(conn, insert, HervChains::Id).await?)
}

async fn insert_motif<C: ConnectionTrait>(
    conn: &C,
    chain_id: ChainId,
    motif: &NewMotif,
) -> HervResult<MotifId> {
    let insert = Query::insert()
        .into_table(HervMotifs::Table)
        .columns([
            HervMotifs::HervChainId,
            HervMotifs::Type,
            HervMotifs::PosInit,
            HervMotifs::PosEnd,
            HervMotifs::Score,
        ])
        .values_panic([
            chain_id.0.into(),
            motif.motif_type.as_str().into(),
            motif.span.start.into(),
            motif.span.end.into(),
            motif.score.into(),
        ])
        .to_owned();
    MotifId::from_i64(insert_returning_id(conn, insert, HervMotifs::Id).await?)
}

async fn insert_subgene<C: ConnectionTrait>(
    conn: &C,
    chain_id: ChainId,
    subgene: &NewSubgene,
) -> HervResult<SubgeneId> {
    let insert = Query::insert()
        .into_table(HervSubgenes::Table)
        .columns([
            HervSubgenes::HervChainId,
            HervSubgenes::Name,
            HervSubgenes::Type,
            HervSubgenes::Score,
            HervSubgenes::Hotspot,
        ])
        .values_panic([
            chain_id.0.into(),
            subgene.name.clone().into(),
            subgene.subgene_type.clone().into(),
            subgene.score.into(),
            subgene.hotspot.into(),
        ])
        .to_owned();
    SubgeneId::from_i64(insert_returning_id(conn, insert, HervSubgenes::Id).await?)
}

async fn insert_domain<C: ConnectionTrait>(
    conn: &C,
    subgene_id: SubgeneId,
    domain: &DomainAttributes,
) -> HervResult<DomainId> {
    let insert = Query::insert()
        .into_table(HervDomains::Table)
        .columns([
            HervDomains::SubgeneId,
            HervDomains::Idx,
            HervDomains::Type,
            HervDomains::Origin,
            HervDomains::Score,
            HervDomains::Hotspot,
            HervDomains::Frame,
            HervDomains::PosInit,
            HervDomains::PosFin,
            HervDomains::MatchInput,
            HervDomains::ReferenceMatch,
            HervDomains::NBases,
        ])
        .values_panic([
            subgene_id.0.into(),
            domain.idx.into(),
            domain.domain_type.clone().into(),
            domain.origin.clone().into(),
            domain.score.into(),
            domain.hotspot.into(),
            domain.frame.into(),
            domain.span.start.into(),
            domain.span.end.into(),
            domain.match_input.clone().into(),
            domain.reference_match.clone().into(),
            domain.n_bases.into(),
        ])
        .to_owned();
    DomainId::from_i64(insert_returning_id(conn, insert, HervDomains::Id).await?)
}

async fn insert_probabilities<C: ConnectionTrait>(
    conn: &C,
    chain_id: ChainId,
    probabilities: &RetrovirusTypeProbabilities,
) -> HervResult<ProbabilitiesId> {
    let insert = Query::insert()
        .into_table(HervRetrovirusTypeProbabilities::Table)
        .columns([
            HervRetrovirusTypeProbabilities::HervChainId,
            HervRetrovirusTypeProbabilities::AScore,
            HervRetrovirusTypeProbabilities::BScore,
            HervRetrovirusTypeProbabilities::CScore,
            HervRetrovirusTypeProbabilities::DScore,
            HervRetrovirusTypeProbabilities::EScore,
            HervRetrovirusTypeProbabilities::LScore,
            HervRetrovirusTypeProbabilities::SScore,
            HervRetrovirusTypeProbabilities::GScore,
            HervRetrovirusTypeProbabilities::OScore,
        ])
        .values_panic([
            chain_id.0.into(),
            probabilities.a.into(),
            probabilities.b.into(),
            probabilities.c.into(),
            probabilities.d.into(),
            probabilities.e.into(),
            probabilities.l.into(),
            probabilities.s.into(),
            probabilities.g.into(),
            probabilities.o.into(),
        ])
        .to_owned();
    ProbabilitiesId::from_i64(
        insert_returning_id(conn, insert, HervRetrovirusTypeProbabilities::Id).await?,
    )
}

const LTR_COLUMNS: [HervLtr; 31] = [
    HervLtr::IsPrimary,
    HervLtr::LtrType,
    HervLtr::InitIdx,
    HervLtr::FinIdx,
    HervLtr::FactorScore,
    HervLtr::VirusGenus,
    HervLtr::PeakLoc,
    HervLtr::AdenylationLoc,
    HervLtr::AdenylationSeq,
    HervLtr::U5nnScore,
    HervLtr::U5nnIdx,
    HervLtr::GtmodifierScore,
    HervLtr::U3nnScore,
    HervLtr::U3nnIdx,
    HervLtr::TataaScore,
    HervLtr::TataaIdx,
    HervLtr::Meme50Score,
    HervLtr::Meme50Idx,
    HervLtr::Motifs1Score,
    HervLtr::Motifs1Idx,
    HervLtr::Motifs2Score,
    HervLtr::Motifs2Idx,
    HervLtr::TranssitesScore,
    HervLtr::CpgmodifierScore,
    HervLtr::Spl8modifierScore,
    HervLtr::Limiters,
    HervLtr::Tsd5,
    HervLtr::Tsd3,
    HervLtr::SimilarityStart,
    HervLtr::SimilarityEnd,
    HervLtr::Id,
];

async fn insert_ltr<C: ConnectionTrait>(conn: &C, ltr: &LtrAttributes) -> HervResult<LtrId> {
    let insert = Query::insert()
        .into_table(HervLtr::Table)
        .columns(LTR_COLUMNS[..30].iter().copied())
        .values_panic([
            ltr.is_primary.into(),
            ltr.ltr_type.as_str().into(),
            ltr.span.start.into(),
            ltr.span.end.into(),
            ltr.factor_score.into(),
            ltr.virus_genus.clone().into(),
            ltr.peak_loc.into(),
            ltr.adenylation_loc.into(),
            ltr.adenylation_seq.clone().into(),
            ltr.u5nn.score.into(),
            ltr.u5nn.idx.into(),
            ltr.gt_modifier_score.into(),
            ltr.u3nn.score.into(),
            ltr.u3nn.idx.into(),
            ltr.tataa.score.into(),
            ltr.tataa.idx.into(),
            ltr.meme50.score.into(),
            ltr.meme50.idx.into(),
            ltr.motifs1.score.into(),
            ltr.motifs1.idx.into(),
            ltr.motifs2.score.into(),
            ltr.motifs2.idx.into(),
            ltr.transsites_score.into(),
            ltr.cpg_modifier_score.into(),
            ltr.spl8_modifier_score.into(),
            ltr.limiters.clone().into(),
            ltr.tsd5.clone().into(),
            ltr.tsd3.clone().into(),
            ltr.similarity_start.into(),
            ltr.similarity_end.into(),
        ])
        .to_owned();
    LtrId::from_i64(insert_returning_id(conn, insert, HervLtr::Id).await?)
}

fn run_select() -> SelectStatement {
    Query::select()
        .from(HervRunMetadata::Table)
        .columns([
            HervRunMetadata::Id,
            HervRunMetadata::Executer,
            HervRunMetadata::DnaFile,
            HervRunMetadata::Selected,
            HervRunMetadata::Database,
            HervRunMetadata::DbName,
            HervRunMetadata::DbLastModifiedDatetime,
            HervRunMetadata::ExecutionDuration,
            HervRunMetadata::SelectionThreshold,
            HervRunMetadata::FinalSelectionThreshold,
            HervRunMetadata::KeepThreshold,
            HervRunMetadata::ImproveHitsMax,
            HervRunMetadata::SubgeneHitsMax,
            HervRunMetadata::ConservationFactor,
            HervRunMetadata::BrokenPenalty,
            HervRunMetadata::LengthBonus,
            HervRunMetadata::FrameFactor,
            HervRunMetadata::MaxSubgeneSkip,
            HervRunMetadata::BrokenPasses,
            HervRunMetadata::OrfidMinScore,
            HervRunMetadata::Strand,
            HervRunMetadata::Sdfactor,
            HervRunMetadata::FitPuteins,
            HervRunMetadata::MakeChainsFiles,
            HervRunMetadata::ScriptPath,
            HervRunMetadata::ScriptInput,
            HervRunMetadata::InputFile,
            HervRunMetadata::Debugging,
            HervRunMetadata::RunDatetime,
            HervRunMetadata::RetrotectorVersion,
        ])
        .to_owned()
}

fn chain_select() -> SelectStatement {
    Query::select()
        .from(HervChains::Table)
        .columns([
            HervChains::Id,
            HervChains::RunMetadataId,
            HervChains::TypeOfChain,
            HervChains::ChainLevel,
            HervChains::ChainStartIdx,
            HervChains::ChainEndIdx,
            HervChains::RetrovirusType,
            HervChains::Score,
            HervChains::IntegrationSites,
        ])
        .to_owned()
}

fn ltr_select() -> SelectStatement {
    Query::select()
        .from(HervLtr::Table)
        .columns(LTR_COLUMNS)
        .to_owned()
}

async fn fetch_chain<C: ConnectionTrait>(
    conn: &C,
    chain_id: ChainId,
) -> HervResult<Option<HervChain>> {
    let select = chain_select()
        .and_where(Expr::col(HervChains::Id).eq(chain_id.0))
        .to_owned();
    query_one(conn, &select)
        .await?
        .map(|row| read_chain(&row))
        .transpose()
}

async fn fetch_ltr<C: ConnectionTrait>(conn: &C, ltr_id: LtrId) -> HervResult<Option<Ltr>> {
    let select = ltr_select()
        .and_where(Expr::col(HervLtr::Id).eq(ltr_id.0))
        .to_owned();
    query_one(conn, &select)
        .await?
        .map(|row| read_ltr(&row))
        .transpose()
}

async fn fetch_ltrs_for_chain<C: ConnectionTrait>(
    conn: &C,
    chain_id: ChainId,
) -> HervResult<Vec<Ltr>> {
    let linked = Query::select()
        .from(HervLtrsOfChain::Table)
        .column(HervLtrsOfChain::LtrId)
        .and_where(Expr::col(HervLtrsOfChain::HervChainId).eq(chain_id.0))
        .to_owned();
    let select = ltr_select()
        .and_where(Expr::col(HervLtr::Id).in_subquery(linked))
        .order_by(HervLtr::Id, Order::Asc)
        .to_owned();
    query_all(conn, &select).await?.iter().map(read_ltr).collect()
}

async fn fetch_motifs<C: ConnectionTrait>(conn: &C, chain_id: ChainId) -> HervResult<Vec<Motif>> {
    let select = Query::select()
        .from(HervMotifs::Table)
        .columns([
            HervMotifs::Id,
            HervMotifs::HervChainId,
            HervMotifs::Type,
            HervMotifs::PosInit,
            HervMotifs::PosEnd,
            HervMotifs::Score,
        ])
        .and_where(Expr::col(HervMotifs::HervChainId).eq(chain_id.0))
        .order_by(HervMotifs::Id, Order::Asc)
        .to_owned();
    let mut motifs = Vec::new();
    for row in query_all(conn, &select).await? {
        let motif_type: String = row.try_get("", &col_name(HervMotifs::Type))?;
        motifs.push(Motif {
            motif_id: MotifId(row.try_get("", &col_name(HervMotifs::Id))?),
            chain_id: ChainId(row.try_get("", &col_name(HervMotifs::HervChainId))?),
            motif_type: MotifType::parse(&motif_type)?,
            span: Span::new(
                row.try_get("", &col_name(HervMotifs::PosInit))?,
                row.try_get("", &col_name(HervMotifs::PosEnd))?,
            ),
            score: row.try_get("", &col_name(HervMotifs::Score))?,
        });
    }
    Ok(motifs)
}

async fn fetch_subgenes<C: ConnectionTrait>(
    conn: &C,
    chain_id: ChainId,
) -> HervResult<Vec<Subgene>> {
    let select = Query::select()
        .from(HervSubgenes::Table)
        .columns([
            HervSubgenes::Id,
            HervSubgenes::HervChainId,
            HervSubgenes::Name,
            HervSubgenes::Type,
            HervSubgenes::Score,
            HervSubgenes::Hotspot,
        ])
        .and_where(Expr::col(HervSubgenes::HervChainId).eq(chain_id.0))
        .order_by(HervSubgenes::Id, Order::Asc)
        .to_owned();
    let mut subgenes = Vec::new();
    for row in query_all(conn, &select).await? {
        subgenes.push(Subgene {
            subgene_id: SubgeneId(row.try_get("", &col_name(HervSubgenes::Id))?),
            chain_id: ChainId(row.try_get("", &col_name(HervSubgenes::HervChainId))?),
            name: row.try_get("", &col_name(HervSubgenes::Name))?,
            subgene_type: row.try_get("", &col_name(HervSubgenes::Type))?,
            score: row.try_get("", &col_name(HervSubgenes::Score))?,
            hotspot: row.try_get("", &col_name(HervSubgenes::Hotspot))?,
        });
    }
    Ok(subgenes)
}

async fn fetch_domains<C: ConnectionTrait>(
    conn: &C,
    subgene_ids: &[SubgeneId],
) -> HervResult<Vec<Domain>> {
    if subgene_ids.is_empty() {
        return Ok(Vec::new());
    }
    let select = Query::select()
        .from(HervDomains::Table)
        .columns([
            HervDomains::Id,
            HervDomains::SubgeneId,
            HervDomains::Idx,
            HervDomains::Type,
            HervDomains::Origin,
            HervDomains::Score,
            HervDomains::Hotspot,
            HervDomains::Frame,
            HervDomains::PosInit,
            HervDomains::PosFin,
            HervDomains::MatchInput,
            HervDomains::ReferenceMatch,
            HervDomains::NBases,
        ])
        .and_where(Expr::col(HervDomains::SubgeneId).is_in(subgene_ids.iter().map(|id| id.0)))
        .order_by(HervDomains::Id, Order::Asc)
        .to_owned();
    let mut domains = Vec::new();
    for row in query_all(conn, &select).await? {
        domains.push(Domain {
            domain_id: DomainId(row.try_get("", &col_name(HervDomains::Id))?),
            subgene_id: SubgeneId(row.try_get("", &col_name(HervDomains::SubgeneId))?),
            attributes: DomainAttributes {
                idx: row.try_get("", &col_name(HervDomains::Idx))?,
                domain_type: row.try_get("", &col_name(HervDomains::Type))?,
                origin: row.try_get("", &col_name(HervDomains::Origin))?,
                score: row.try_get("", &col_name(HervDomains::Score))?,
                hotspot: row.try_get("", &col_name(HervDomains::Hotspot))?,
                frame: row.try_get("", &col_name(HervDomains::Frame))?,
                span: Span::new(
                    row.try_get("", &col_name(HervDomains::PosInit))?,
                    row.try_get("", &col_name(HervDomains::PosFin))?,
                ),
                match_input: row.try_get("", &col_name(HervDomains::MatchInput))?,
                reference_match: row.try_get("", &col_name(HervDomains::ReferenceMatch))?,
                n_bases: row.try_get("", &col_name(HervDomains::NBases))?,
            },
        });
    }
    sort_domains(&mut domains);
    Ok(domains)
}

/// Ordinal index first (unindexed domains last), creation order as tiebreak.
fn sort_domains(domains: &mut [Domain]) {
    domains.sort_by_key(|domain| {
        (
            domain.attributes.idx.is_none(),
            domain.attributes.idx,
            domain.domain_id,
        )
    });
}

async fn fetch_probabilities<C: ConnectionTrait>(
    conn: &C,
    chain_id: ChainId,
) -> HervResult<Option<ProbabilityRecord>> {
    let select = Query::select()
        .from(HervRetrovirusTypeProbabilities::Table)
        .columns([
            HervRetrovirusTypeProbabilities::Id,
            HervRetrovirusTypeProbabilities::HervChainId,
            HervRetrovirusTypeProbabilities::AScore,
            HervRetrovirusTypeProbabilities::BScore,
            HervRetrovirusTypeProbabilities::CScore,
            HervRetrovirusTypeProbabilities::DScore,
            HervRetrovirusTypeProbabilities::EScore,
            HervRetrovirusTypeProbabilities::LScore,
            HervRetrovirusTypeProbabilities::SScore,
            HervRetrovirusTypeProbabilities::GScore,
            HervRetrovirusTypeProbabilities::OScore,
        ])
        .and_where(Expr::col(HervRetrovirusTypeProbabilities::HervChainId).eq(chain_id.0))
        .limit(1)
        .to_owned();
    let Some(row) = query_one(conn, &select).await? else {
        return Ok(None);
    };
    let id = |column: HervRetrovirusTypeProbabilities| -> HervResult<i32> {
        Ok(row.try_get("", &col_name(column))?)
    };
    let score = |column: HervRetrovirusTypeProbabilities| -> HervResult<f64> {
        Ok(row.try_get("", &col_name(column))?)
    };
    let probabilities = RetrovirusTypeProbabilities {
        a: score(HervRetrovirusTypeProbabilities::AScore)?,
        b: score(HervRetrovirusTypeProbabilities::BScore)?,
        c: score(HervRetrovirusTypeProbabilities::CScore)?,
        d: score(HervRetrovirusTypeProbabilities::DScore)?,
        e: score(HervRetrovirusTypeProbabilities::EScore)?,
        l: score(HervRetrovirusTypeProbabilities::LScore)?,
        s: score(HervRetrovirusTypeProbabilities::SScore)?,
        g: score(HervRetrovirusTypeProbabilities::GScore)?,
        o: score(HervRetrovirusTypeProbabilities::OScore)?,
    };
    Ok(Some(ProbabilityRecord {
        probabilities_id: ProbabilitiesId(id(HervRetrovirusTypeProbabilities::Id)?),
        chain_id: ChainId(id(HervRetrovirusTypeProbabilities::HervChainId)?),
        probabilities,
    }))
}

fn read_run(row: &QueryResult) -> HervResult<RunRecord> {
    let text = |column: HervRunMetadata| -> HervResult<String> {
        Ok(row.try_get("", &col_name(column))?)
    };
    let opt_text = |column: HervRunMetadata| -> HervResult<Option<String>> {
        Ok(row.try_get("", &col_name(column))?)
    };
    let int = |column: HervRunMetadata| -> HervResult<i64> {
        Ok(row.try_get("", &col_name(column))?)
    };
    let float = |column: HervRunMetadata| -> HervResult<f64> {
        Ok(row.try_get("", &col_name(column))?)
    };
    let db_last_modified: Option<i64> =
        row.try_get("", &col_name(HervRunMetadata::DbLastModifiedDatetime))?;
    Ok(RunRecord {
        run_id: RunId(row.try_get("", &col_name(HervRunMetadata::Id))?),
        params: RunParams {
            executer: text(HervRunMetadata::Executer)?,
            dna_file: text(HervRunMetadata::DnaFile)?,
            selected: opt_text(HervRunMetadata::Selected)?,
            database: text(HervRunMetadata::Database)?,
            db_name: opt_text(HervRunMetadata::DbName)?,
            db_last_modified: db_last_modified.map(Timestamp),
            execution_duration_secs: int(HervRunMetadata::ExecutionDuration)?,
            selection_threshold: float(HervRunMetadata::SelectionThreshold)?,
            final_selection_threshold: float(HervRunMetadata::FinalSelectionThreshold)?,
            keep_threshold: float(HervRunMetadata::KeepThreshold)?,
            improve_hits_max: int(HervRunMetadata::ImproveHitsMax)?,
            subgene_hits_max: int(HervRunMetadata::SubgeneHitsMax)?,
            conservation_factor: int(HervRunMetadata::ConservationFactor)?,
            broken_penalty: float(HervRunMetadata::BrokenPenalty)?,
            length_bonus: float(HervRunMetadata::LengthBonus)?,
            frame_factor: float(HervRunMetadata::FrameFactor)?,
            max_subgene_skip: int(HervRunMetadata::MaxSubgeneSkip)?,
            broken_passes: int(HervRunMetadata::BrokenPasses)?,
            orfid_min_score: int(HervRunMetadata::OrfidMinScore)?,
            strand: text(HervRunMetadata::Strand)?,
            sd_factor: row.try_get("", &col_name(HervRunMetadata::Sdfactor))?,
            fit_puteins: opt_text(HervRunMetadata::FitPuteins)?,
            make_chains_files: opt_text(HervRunMetadata::MakeChainsFiles)?,
            script_path: opt_text(HervRunMetadata::ScriptPath)?,
            script_input: opt_text(HervRunMetadata::ScriptInput)?,
            input_file: opt_text(HervRunMetadata::InputFile)?,
            debugging: opt_text(HervRunMetadata::Debugging)?,
            run_datetime: Timestamp(int(HervRunMetadata::RunDatetime)?),
            tool_version: text(HervRunMetadata::RetrotectorVersion)?,
        },
    })
}

fn read_chain(row: &QueryResult) -> HervResult<HervChain> {
    let chain_type: String = row.try_get("", &col_name(HervChains::TypeOfChain))?;
    let run_id: Option<i32> = row.try_get("", &col_name(HervChains::RunMetadataId))?;
    Ok(HervChain {
        chain_id: ChainId(row.try_get("", &col_name(HervChains::Id))?),
        run_id: run_id.map(RunId),
        chain_type: ChainType::parse(&chain_type)?,
        chain_level: row.try_get("", &col_name(HervChains::ChainLevel))?,
        span: Span::new(
            row.try_get("", &col_name(HervChains::ChainStartIdx))?,
            row.try_get("", &col_name(HervChains::ChainEndIdx))?,
        ),
        retrovirus_type: row.try_get("", &col_name(HervChains::RetrovirusType))?,
        score: row.try_get("", &col_name(HervChains::Score))?,
        integration_sites: row.try_get("", &col_name(HervChains::IntegrationSites))?,
    })
}

fn read_ltr(row: &QueryResult) -> HervResult<Ltr> {
    let opt_f64 = |column: HervLtr| -> HervResult<Option<f64>> {
        Ok(row.try_get("", &col_name(column))?)
    };
    let opt_i64 = |column: HervLtr| -> HervResult<Option<i64>> {
        Ok(row.try_get("", &col_name(column))?)
    };
    let opt_text = |column: HervLtr| -> HervResult<Option<String>> {
        Ok(row.try_get("", &col_name(column))?)
    };
    let signal = |score: HervLtr, idx: HervLtr| -> HervResult<SignalHit> {
        Ok(SignalHit {
            score: opt_f64(score)?,
            idx: opt_i64(idx)?,
        })
    };
    let ltr_type: String = row.try_get("", &col_name(HervLtr::LtrType))?;
    Ok(Ltr {
        ltr_id: LtrId(row.try_get("", &col_name(HervLtr::Id))?),
        attributes: LtrAttributes {
            is_primary: row.try_get("", &col_name(HervLtr::IsPrimary))?,
            ltr_type: LtrType::parse(&ltr_type)?,
            span: Span::new(
                row.try_get("", &col_name(HervLtr::InitIdx))?,
                row.try_get("", &col_name(HervLtr::FinIdx))?,
            ),
            factor_score: opt_f64(HervLtr::FactorScore)?,
            virus_genus: opt_text(HervLtr::VirusGenus)?,
            peak_loc: opt_i64(HervLtr::PeakLoc)?,
            adenylation_loc: opt_i64(HervLtr::AdenylationLoc)?,
            adenylation_seq: opt_text(HervLtr::AdenylationSeq)?,
            u5nn: signal(HervLtr::U5nnScore, HervLtr::U5nnIdx)?,
            u3nn: signal(HervLtr::U3nnScore, HervLtr::U3nnIdx)?,
            tataa: signal(HervLtr::TataaScore, HervLtr::TataaIdx)?,
            meme50: signal(HervLtr::Meme50Score, HervLtr::Meme50Idx)?,
            motifs1: signal(HervLtr::Motifs1Score, HervLtr::Motifs1Idx)?,
            motifs2: signal(HervLtr::Motifs2Score, HervLtr::Motifs2Idx)?,
            gt_modifier_score: opt_f64(HervLtr::GtmodifierScore)?,
            transsites_score: opt_f64(HervLtr::TranssitesScore)?,
            cpg_modifier_score: opt_f64(HervLtr::CpgmodifierScore)?,
            spl8_modifier_score: opt_f64(HervLtr::Spl8modifierScore)?,
            limiters: opt_text(HervLtr::Limiters)?,
            tsd5: opt_text(HervLtr::Tsd5)?,
            tsd3: opt_text(HervLtr::Tsd3)?,
            similarity_start: opt_i64(HervLtr::SimilarityStart)?,
            similarity_end: opt_i64(HervLtr::SimilarityEnd)?,
        },
    })
}

fn col_name(column: impl sea_query::Iden) -> String {
    column.to_string()
}

fn build_stmt<S: QueryStatementWriter>(
    backend: DatabaseBackend,
    stmt: &S,
) -> (String, sea_orm::sea_query::Values) {
    match backend {
        DatabaseBackend::Sqlite => stmt.build(SqliteQueryBuilder),
        DatabaseBackend::Postgres => stmt.build(PostgresQueryBuilder),
        DatabaseBackend::MySql => stmt.build(MysqlQueryBuilder),
        _ => stmt.build(SqliteQueryBuilder),
    }
}

/// Returns the number of affected rows.
async fn exec<C, S>(conn: &C, stmt: &S) -> HervResult<u64>
where
    C: ConnectionTrait,
    S: QueryStatementWriter,
{
    let backend = conn.get_database_backend();
    let (sql, values) = build_stmt(backend, stmt);
    let result = conn
        .execute_raw(Statement::from_sql_and_values(backend, sql, values))
        .await?;
    Ok(result.rows_affected())
}

async fn query_all<C, S>(conn: &C, stmt: &S) -> HervResult<Vec<QueryResult>>
where
    C: ConnectionTrait,
    S: QueryStatementWriter,
{
    let backend = conn.get_database_backend();
    let (sql, values) = build_stmt(backend, stmt);
    let rows = conn
        .query_all_raw(Statement::from_sql_and_values(backend, sql, values))
        .await?;
    Ok(rows)
}

async fn query_one<C, S>(conn: &C, stmt: &S) -> HervResult<Option<QueryResult>>
where
    C: ConnectionTrait,
    S: QueryStatementWriter,
{
    let backend = conn.get_database_backend();
    let (sql, values) = build_stmt(backend, stmt);
    let row = conn
        .query_one_raw(Statement::from_sql_and_values(backend, sql, values))
        .await?;
    Ok(row)
}

/// MySQL has no RETURNING; it reports the generated key on the exec result.
async fn insert_returning_id<C, I>(
    conn: &C,
    mut insert: InsertStatement,
    id_col: I,
) -> HervResult<i64>
where
    C: ConnectionTrait,
    I: sea_query::Iden + Copy + 'static,
{
    let backend = conn.get_database_backend();
    if backend == DatabaseBackend::MySql {
        let (sql, values) = build_stmt(backend, &insert);
        let result = conn
            .execute_raw(Statement::from_sql_and_values(backend, sql, values))
            .await?;
        return i64::try_from(result.last_insert_id())
            .map_err(|_| HervError::storage("generated id out of range"));
    }
    insert.returning_col(id_col);
    let row = query_one(conn, &insert)
        .await?
        .ok_or_else(|| HervError::storage("insert returned no id"))?;
    let id: i32 = row.try_get("", &col_name(id_col))?;
    Ok(i64::from(id))
}

fn build_connection_url(config: &HervConfig, base_dir: &Path) -> HervResult<String> {
    match &config.database {
        crate::DatabaseConfig::Sqlite { .. } => {
            let path = prepare_sqlite_file(config, base_dir)?;
            Ok(format!("sqlite://{}?mode=rwc", path.display()))
        }
        crate::DatabaseConfig::Postgres { url } => Ok(url.clone()),
        crate::DatabaseConfig::Mysql { url } => Ok(url.clone()),
    }
}
