mod common;

use herv_store::{
    BundleLtr, ChainBundle, ChainWriteApi, HervError, HervResult, LtrApi, LtrAttributes, LtrType,
    MotifType, NewMotif, ResultsReadApi, RunRecordApi, SignalHit, Span, StoreStats, SubgeneBundle,
    SubgeneDomainApi,
};
use tempfile::tempdir;

use common::{chain, domain, probabilities, sample_run, sqlite_store, store_with, subgene};

#[tokio::test]
async fn full_chain_is_recorded_queried_and_removed() -> HervResult<()> {
    let dir = tempdir().expect("tempdir");
    let store = sqlite_store(dir.path()).await?;
    let run_id = store.create_run(sample_run()).await?;
    let chain_id = store.create_chain(chain(Some(run_id), 100, 5000)).await?;

    let slippery = store
        .attach_motif(
            chain_id,
            NewMotif {
                motif_type: MotifType::Slippery,
                span: Span::new(120, 126),
                score: 40,
            },
        )
        .await?;
    let knot = store
        .attach_motif(
            chain_id,
            NewMotif {
                motif_type: MotifType::PseudoKnot,
                span: Span::new(130, 180),
                score: 60,
            },
        )
        .await?;
    let gag = store.attach_subgene(chain_id, subgene("gag")).await?;
    let domain_id = store.add_domain(gag, domain(Some(0), 450)).await?;
    store
        .set_probability_vector(chain_id, probabilities(0.7))
        .await?;
    let mut solo = LtrAttributes::new(LtrType::Solo, Span::new(100, 700));
    solo.is_primary = true;
    solo.tataa = SignalHit {
        score: Some(14.5),
        idx: Some(130),
    };
    solo.tsd5 = Some("ACGTA".to_string());
    let ltr_id = store.create_ltr(solo.clone()).await?;
    store.link_ltr_to_chain(chain_id, ltr_id).await?;

    let hierarchy = store.query_chain(chain_id).await?;
    assert_eq!(hierarchy.chain.run_id, Some(run_id));
    assert_eq!(hierarchy.chain.span, Span::new(100, 5000));
    assert_eq!(hierarchy.chain.score, 850);
    let motif_ids: Vec<_> = hierarchy.motifs.iter().map(|m| m.motif_id).collect();
    assert_eq!(motif_ids, vec![slippery, knot]);
    assert_eq!(hierarchy.motifs[1].motif_type, MotifType::PseudoKnot);
    assert_eq!(hierarchy.subgenes.len(), 1);
    assert_eq!(hierarchy.subgenes[0].subgene.name, "gag");
    assert_eq!(hierarchy.subgenes[0].subgene.score, 300);
    assert_eq!(hierarchy.subgenes[0].subgene.hotspot, 1);
    assert_eq!(hierarchy.subgenes[0].domains.len(), 1);
    assert_eq!(hierarchy.subgenes[0].domains[0].domain_id, domain_id);
    assert_eq!(hierarchy.subgenes[0].domains[0].attributes.n_bases, 450);
    let record = hierarchy.probabilities.expect("probabilities");
    assert_eq!(record.probabilities.dominant_class().0, "A");
    assert!((record.probabilities.a - 0.7).abs() < 1e-12);
    assert_eq!(hierarchy.ltrs.len(), 1);
    assert_eq!(hierarchy.ltrs[0].ltr_id, ltr_id);
    assert_eq!(hierarchy.ltrs[0].attributes, solo);

    store.delete_chain(chain_id).await?;
    assert_eq!(
        store.stats().await?,
        StoreStats {
            runs: 1,
            ltrs: 1,
            ..StoreStats::default()
        }
    );
    assert!(store.list_chains_for_ltr(ltr_id).await?.is_empty());
    let err = store.query_chain(chain_id).await.expect_err("chain gone");
    assert!(matches!(err, HervError::NotFound { .. }));
    Ok(())
}

#[tokio::test]
async fn run_parameters_survive_storage() -> HervResult<()> {
    let dir = tempdir().expect("tempdir");
    let store = sqlite_store(dir.path()).await?;
    let first = store.create_run(sample_run()).await?;
    let mut params = sample_run();
    params.selected = None;
    params.db_last_modified = None;
    params.sd_factor = false;
    let second = store.create_run(params.clone()).await?;
    assert!(second > first);

    let stored = store.get_run(second).await?.expect("run");
    assert_eq!(stored.params, params);
    let runs = store.list_runs().await?;
    let ids: Vec<_> = runs.iter().map(|run| run.run_id).collect();
    assert_eq!(ids, vec![first, second]);
    assert_eq!(runs[0].params, sample_run());
    Ok(())
}

#[tokio::test]
async fn domains_list_by_ordinal_with_unindexed_last() -> HervResult<()> {
    let dir = tempdir().expect("tempdir");
    let store = sqlite_store(dir.path()).await?;
    let chain_id = store.create_chain(chain(None, 0, 10_000)).await?;
    let pol = store.create_subgene(chain_id, subgene("pol")).await?;
    let loose = store.add_domain(pol, domain(None, 6)).await?;
    let third = store.add_domain(pol, domain(Some(2), 6)).await?;
    let first = store.add_domain(pol, domain(Some(0), 6)).await?;

    let order: Vec<_> = store
        .list_domains(pol)
        .await?
        .iter()
        .map(|d| d.domain_id)
        .collect();
    assert_eq!(order, vec![first, third, loose]);
    let subgenes = store.list_subgenes(chain_id).await?;
    assert_eq!(subgenes.len(), 1);
    assert_eq!(subgenes[0].subgene_id, pol);
    Ok(())
}

fn bundle(shared_ltr: Option<herv_store::LtrId>) -> ChainBundle {
    let mut ltrs = vec![BundleLtr::New(LtrAttributes::new(
        LtrType::FivePrime,
        Span::new(100, 650),
    ))];
    if let Some(ltr_id) = shared_ltr {
        ltrs.push(BundleLtr::Existing(ltr_id));
    }
    ChainBundle {
        chain: chain(None, 100, 9000),
        motifs: vec![NewMotif {
            motif_type: MotifType::SpliceAcceptor,
            span: Span::new(2000, 2010),
            score: 22,
        }],
        subgenes: vec![
            SubgeneBundle {
                subgene: subgene("gag"),
                domains: vec![domain(Some(0), 90), domain(Some(1), 120)],
            },
            SubgeneBundle {
                subgene: subgene("env"),
                domains: vec![],
            },
        ],
        probabilities: Some(probabilities(0.4)),
        ltrs,
    }
}

#[tokio::test]
async fn chain_bundle_writes_everything_together() -> HervResult<()> {
    let dir = tempdir().expect("tempdir");
    let store = sqlite_store(dir.path()).await?;
    let shared = store
        .create_ltr(LtrAttributes::new(LtrType::ThreePrime, Span::new(8000, 8600)))
        .await?;

    let ids = store.write_chain_bundle(bundle(Some(shared))).await?;
    assert_eq!(ids.motif_ids.len(), 1);
    assert_eq!(ids.subgene_ids.len(), 2);
    assert_eq!(ids.domain_ids[0].len(), 2);
    assert!(ids.domain_ids[1].is_empty());
    assert!(ids.probabilities_id.is_some());
    assert_eq!(ids.ltr_ids.len(), 2);
    assert_eq!(ids.ltr_ids[1], shared);

    let hierarchy = store.query_chain(ids.chain_id).await?;
    assert_eq!(hierarchy.subgenes[0].domains.len(), 2);
    assert_eq!(hierarchy.ltrs.len(), 2);
    assert_eq!(
        store.stats().await?,
        StoreStats {
            runs: 0,
            chains: 1,
            ltrs: 2,
            associations: 2,
            motifs: 1,
            probabilities: 1,
            subgenes: 2,
            domains: 2,
        }
    );
    Ok(())
}

#[tokio::test]
async fn invalid_bundle_writes_nothing() -> HervResult<()> {
    let dir = tempdir().expect("tempdir");
    let store = sqlite_store(dir.path()).await?;
    let mut broken = bundle(None);
    broken.subgenes[0].domains[1].frame = 7;
    let err = store
        .write_chain_bundle(broken)
        .await
        .expect_err("bad frame");
    assert!(matches!(err, HervError::InvalidRange { .. }));

    let mut doubled = bundle(None);
    let ltr_id = store
        .create_ltr(LtrAttributes::new(LtrType::Solo, Span::new(200, 300)))
        .await?;
    doubled.ltrs.push(BundleLtr::Existing(ltr_id));
    doubled.ltrs.push(BundleLtr::Existing(ltr_id));
    let err = store
        .write_chain_bundle(doubled)
        .await
        .expect_err("ltr listed twice");
    match err {
        HervError::DuplicateAssociation { ltr_id: ltr, .. } => assert_eq!(ltr, ltr_id.0),
        other => panic!("unexpected error {other:?}"),
    }

    assert_eq!(
        store.stats().await?,
        StoreStats {
            ltrs: 1,
            ..StoreStats::default()
        }
    );
    Ok(())
}

#[tokio::test]
async fn interrupted_bundle_rolls_back() -> HervResult<()> {
    let dir = tempdir().expect("tempdir");
    let store = store_with(dir.path(), |config| {
        config.failpoints = Some(vec!["bundle.before_commit".to_string()]);
    })
    .await?;
    let err = store
        .write_chain_bundle(bundle(None))
        .await
        .expect_err("failpoint");
    assert!(matches!(err, HervError::Storage { .. }));
    assert_eq!(store.stats().await?, StoreStats::default());
    Ok(())
}

#[tokio::test]
async fn orphan_ltrs_are_kept_until_purged() -> HervResult<()> {
    let dir = tempdir().expect("tempdir");
    let store = sqlite_store(dir.path()).await?;
    let chain_id = store.create_chain(chain(None, 0, 10_000)).await?;
    let linked = store
        .create_ltr(LtrAttributes::new(LtrType::FivePrime, Span::new(0, 600)))
        .await?;
    let loose = store
        .create_ltr(LtrAttributes::new(LtrType::Solo, Span::new(20_000, 20_500)))
        .await?;
    store.link_ltr_to_chain(chain_id, linked).await?;

    let orphans: Vec<_> = store
        .list_orphan_ltrs()
        .await?
        .into_iter()
        .map(|ltr| ltr.ltr_id)
        .collect();
    assert_eq!(orphans, vec![loose]);

    assert_eq!(store.purge_orphan_ltrs().await?, 1);
    assert!(store.get_ltr(loose).await?.is_none());
    assert!(store.get_ltr(linked).await?.is_some());
    assert_eq!(store.purge_orphan_ltrs().await?, 0);
    Ok(())
}

#[tokio::test]
async fn purge_takes_ltrs_that_were_never_linked() -> HervResult<()> {
    let dir = tempdir().expect("tempdir");
    let store = sqlite_store(dir.path()).await?;
    let chain_id = store.create_chain(chain(None, 0, 10_000)).await?;
    let pending = store
        .create_ltr(LtrAttributes::new(LtrType::FivePrime, Span::new(0, 600)))
        .await?;

    assert_eq!(store.purge_orphan_ltrs().await?, 1);
    let err = store
        .link_ltr_to_chain(chain_id, pending)
        .await
        .expect_err("purged before linking");
    assert!(matches!(err, HervError::DanglingReference { .. }));

    let ids = store.write_chain_bundle(bundle(None)).await?;
    assert_eq!(store.purge_orphan_ltrs().await?, 0);
    assert_eq!(store.list_ltrs_for_chain(ids.chain_id).await?.len(), 1);
    Ok(())
}
