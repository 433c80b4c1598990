mod common;

use herv_store::{
    ChainWriteApi, HervError, HervResult, LtrApi, LtrAttributes, LtrType, ProbabilityApi,
    ResultsReadApi, Span,
};
use tempfile::tempdir;

use common::{chain, probabilities, sqlite_store};

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn parallel_chain_writes_get_distinct_ids() -> HervResult<()> {
    let dir = tempdir().expect("tempdir");
    let store = sqlite_store(dir.path()).await?;

    let mut writers = Vec::new();
    for offset in 0..32_i64 {
        let store = store.clone();
        writers.push(tokio::spawn(async move {
            store
                .create_chain(chain(None, offset * 100, offset * 100 + 50))
                .await
        }));
    }
    let mut readers = Vec::new();
    for _ in 0..8 {
        let store = store.clone();
        readers.push(tokio::spawn(async move { store.stats().await }));
    }

    let mut ids = Vec::new();
    for writer in writers {
        ids.push(writer.await.expect("writer task")?);
    }
    for reader in readers {
        let seen = reader.await.expect("reader task")?;
        assert!(seen.chains <= 32);
    }
    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), 32);
    assert_eq!(store.stats().await?.chains, 32);
    for chain_id in ids {
        assert!(store.get_chain(chain_id).await?.is_some());
    }
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn racing_links_leave_a_single_association() -> HervResult<()> {
    let dir = tempdir().expect("tempdir");
    let store = sqlite_store(dir.path()).await?;
    let chain_id = store.create_chain(chain(None, 0, 5000)).await?;
    let ltr_id = store
        .create_ltr(LtrAttributes::new(LtrType::FivePrime, Span::new(0, 600)))
        .await?;

    let mut attempts = Vec::new();
    for _ in 0..8 {
        let store = store.clone();
        attempts.push(tokio::spawn(async move {
            store.link_ltr_to_chain(chain_id, ltr_id).await
        }));
    }
    let mut linked = 0;
    for attempt in attempts {
        match attempt.await.expect("link task") {
            Ok(_) => linked += 1,
            Err(HervError::DuplicateAssociation { .. }) => {}
            Err(other) => panic!("unexpected error {other:?}"),
        }
    }
    assert_eq!(linked, 1);
    assert_eq!(store.list_ltrs_for_chain(chain_id).await?.len(), 1);
    assert_eq!(store.stats().await?.associations, 1);
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn racing_probability_vectors_keep_the_first() -> HervResult<()> {
    let dir = tempdir().expect("tempdir");
    let store = sqlite_store(dir.path()).await?;
    let chain_id = store.create_chain(chain(None, 0, 5000)).await?;

    let mut attempts = Vec::new();
    for step in 0..8_i32 {
        let store = store.clone();
        let share = 0.5 + f64::from(step) * 0.05;
        attempts.push(tokio::spawn(async move {
            store
                .set_probabilities(chain_id, probabilities(share))
                .await
                .map(|id| (id, share))
        }));
    }
    let mut winners = Vec::new();
    for attempt in attempts {
        match attempt.await.expect("probability task") {
            Ok(winner) => winners.push(winner),
            Err(HervError::DuplicateSingleton { .. }) => {}
            Err(other) => panic!("unexpected error {other:?}"),
        }
    }
    assert_eq!(winners.len(), 1);
    let (probabilities_id, share) = winners[0];
    let stored = store.get_probabilities(chain_id).await?.expect("stored vector");
    assert_eq!(stored.probabilities_id, probabilities_id);
    assert!((stored.probabilities.a - share).abs() < 1e-12);
    assert_eq!(store.stats().await?.probabilities, 1);
    Ok(())
}
