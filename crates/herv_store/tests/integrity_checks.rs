mod common;

use herv_store::{
    ChainId, ChainWriteApi, HervError, HervResult, LtrApi, LtrAttributes, LtrId, LtrType, MotifType,
    NewMotif, ProbabilityApi, RetrovirusTypeProbabilities, RunId, Span, SubgeneDomainApi, SubgeneId,
};
use tempfile::tempdir;

use common::{chain, domain, probabilities, sqlite_store, store_with, subgene, warn_store};

#[tokio::test]
async fn writes_reject_dangling_references() -> HervResult<()> {
    let dir = tempdir().expect("tempdir");
    let store = sqlite_store(dir.path()).await?;

    let err = store
        .create_chain(chain(Some(RunId(404)), 0, 100))
        .await
        .expect_err("missing run");
    assert!(matches!(
        err,
        HervError::DanglingReference { ref field, .. } if field == "run_metadata_id"
    ));

    let motif = NewMotif {
        motif_type: MotifType::SpliceDonor,
        span: Span::new(1, 9),
        score: 5,
    };
    let err = store
        .attach_motif(ChainId(404), motif)
        .await
        .expect_err("missing chain");
    assert!(matches!(err, HervError::DanglingReference { .. }));

    let err = store
        .add_domain(SubgeneId(404), domain(None, 3))
        .await
        .expect_err("missing subgene");
    assert!(matches!(err, HervError::DanglingReference { ref field, .. } if field == "subgene_id"));

    let chain_id = store.create_chain(chain(None, 0, 100)).await?;
    let err = store
        .link_ltr_to_chain(chain_id, LtrId(404))
        .await
        .expect_err("missing ltr");
    assert!(matches!(err, HervError::DanglingReference { ref field, .. } if field == "ltr_id"));
    Ok(())
}

#[tokio::test]
async fn linking_the_same_pair_twice_is_rejected() -> HervResult<()> {
    let dir = tempdir().expect("tempdir");
    let store = sqlite_store(dir.path()).await?;
    let chain_id = store.create_chain(chain(None, 0, 5000)).await?;
    let ltr_id = store
        .create_ltr(LtrAttributes::new(LtrType::ThreePrime, Span::new(4000, 4600)))
        .await?;
    store.link_ltr_to_chain(chain_id, ltr_id).await?;

    let err = store
        .link_ltr_to_chain(chain_id, ltr_id)
        .await
        .expect_err("duplicate link");
    match err {
        HervError::DuplicateAssociation {
            chain_id: chain,
            ltr_id: ltr,
        } => {
            assert_eq!(chain, chain_id.0);
            assert_eq!(ltr, ltr_id.0);
        }
        other => panic!("unexpected error {other:?}"),
    }
    assert_eq!(store.list_ltrs_for_chain(chain_id).await?.len(), 1);

    store.unlink_ltr_from_chain(chain_id, ltr_id).await?;
    assert!(store.list_ltrs_for_chain(chain_id).await?.is_empty());
    let err = store
        .unlink_ltr_from_chain(chain_id, ltr_id)
        .await
        .expect_err("nothing to unlink");
    assert!(matches!(err, HervError::NotFound { .. }));
    Ok(())
}

#[tokio::test]
async fn probability_vectors_must_sum_to_one_and_are_write_once() -> HervResult<()> {
    let dir = tempdir().expect("tempdir");
    let store = sqlite_store(dir.path()).await?;
    let near = store.create_chain(chain(None, 0, 100)).await?;
    let half = store.create_chain(chain(None, 0, 100)).await?;

    let nearly_one = RetrovirusTypeProbabilities::from_values([
        0.999999, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0,
    ]);
    store.set_probabilities(near, nearly_one).await?;
    let stored = store.get_probabilities(near).await?.expect("stored vector");
    assert_eq!(stored.chain_id, near);
    assert_eq!(stored.probabilities, nearly_one);

    let err = store
        .set_probability_vector(near, probabilities(0.7))
        .await
        .expect_err("second vector");
    assert!(matches!(err, HervError::DuplicateSingleton { .. }));

    let halved = RetrovirusTypeProbabilities::from_values([
        0.5, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0,
    ]);
    let err = store
        .set_probabilities(half, halved)
        .await
        .expect_err("half distribution");
    assert!(matches!(err, HervError::InvalidDistribution { .. }));
    assert!(store.get_probabilities(half).await?.is_none());

    let negative = RetrovirusTypeProbabilities::from_values([
        1.2, -0.2, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0,
    ]);
    let err = store
        .set_probabilities(half, negative)
        .await
        .expect_err("out of bounds");
    assert!(matches!(err, HervError::InvalidDistribution { .. }));
    Ok(())
}

#[tokio::test]
async fn ranges_and_frames_are_checked_before_writing() -> HervResult<()> {
    let dir = tempdir().expect("tempdir");
    let store = sqlite_store(dir.path()).await?;

    let err = store
        .create_chain(chain(None, 500, 100))
        .await
        .expect_err("reversed span");
    assert!(matches!(err, HervError::InvalidRange { .. }));

    let chain_id = store.create_chain(chain(None, 0, 1000)).await?;
    let subgene_id = store.create_subgene(chain_id, subgene("gag")).await?;
    let mut bad_frame = domain(Some(0), 9);
    bad_frame.frame = 4;
    let err = store
        .add_domain(subgene_id, bad_frame)
        .await
        .expect_err("frame out of range");
    assert!(matches!(err, HervError::InvalidRange { ref field, .. } if field == "frame"));

    let mut negative_frame = domain(Some(1), 9);
    negative_frame.frame = -3;
    store.add_domain(subgene_id, negative_frame).await?;
    assert_eq!(store.list_domains(subgene_id).await?.len(), 1);
    Ok(())
}

#[tokio::test]
async fn base_count_mismatch_depends_on_validation_mode() -> HervResult<()> {
    let strict_dir = tempdir().expect("tempdir");
    let strict = sqlite_store(strict_dir.path()).await?;
    let chain_id = strict.create_chain(chain(None, 0, 1000)).await?;
    let subgene_id = strict.create_subgene(chain_id, subgene("pro")).await?;
    let mut mismatched = domain(Some(0), 30);
    mismatched.n_bases = 31;
    let err = strict
        .add_domain(subgene_id, mismatched.clone())
        .await
        .expect_err("base count mismatch");
    assert!(matches!(err, HervError::InvalidRange { ref field, .. } if field == "n_bases"));

    let lenient_dir = tempdir().expect("tempdir");
    let lenient = warn_store(lenient_dir.path()).await?;
    let chain_id = lenient.create_chain(chain(None, 0, 1000)).await?;
    let subgene_id = lenient.create_subgene(chain_id, subgene("pro")).await?;
    lenient.add_domain(subgene_id, mismatched).await?;
    assert_eq!(lenient.list_domains(subgene_id).await?[0].attributes.n_bases, 31);
    Ok(())
}

#[tokio::test]
async fn ltr_outside_chain_is_flagged_unless_disabled() -> HervResult<()> {
    let strict_dir = tempdir().expect("tempdir");
    let strict = sqlite_store(strict_dir.path()).await?;
    let chain_id = strict.create_chain(chain(None, 100, 5000)).await?;
    let ltr_id = strict
        .create_ltr(LtrAttributes::new(LtrType::Solo, Span::new(6000, 6500)))
        .await?;
    let err = strict
        .link_ltr_to_chain(chain_id, ltr_id)
        .await
        .expect_err("ltr outside chain");
    assert!(matches!(err, HervError::InvalidRange { .. }));
    assert!(strict.list_ltrs_for_chain(chain_id).await?.is_empty());

    let relaxed_dir = tempdir().expect("tempdir");
    let relaxed = store_with(relaxed_dir.path(), |config| {
        if let Some(integrity) = config.integrity.as_mut() {
            integrity.enforce_ltr_containment = Some(false);
        }
    })
    .await?;
    let chain_id = relaxed.create_chain(chain(None, 100, 5000)).await?;
    let ltr_id = relaxed
        .create_ltr(LtrAttributes::new(LtrType::Solo, Span::new(6000, 6500)))
        .await?;
    relaxed.link_ltr_to_chain(chain_id, ltr_id).await?;
    assert_eq!(relaxed.list_ltrs_for_chain(chain_id).await?.len(), 1);
    Ok(())
}

#[tokio::test]
async fn ltr_signal_scores_must_be_non_negative() -> HervResult<()> {
    let dir = tempdir().expect("tempdir");
    let store = sqlite_store(dir.path()).await?;
    let mut ltr = LtrAttributes::new(LtrType::Solo, Span::new(0, 500));
    ltr.tataa.score = Some(-1.0);
    let err = store.create_ltr(ltr).await.expect_err("negative score");
    assert!(matches!(err, HervError::InvalidRange { ref field, .. } if field == "tataa_score"));
    assert!(store.list_orphan_ltrs().await?.is_empty());
    Ok(())
}
