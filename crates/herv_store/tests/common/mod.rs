#![allow(dead_code)]

use std::path::Path;

use herv_store::{
    ChainType, DomainAttributes, HervConfig, HervResult, HervStore, NewChain, NewSubgene,
    RetrovirusTypeProbabilities, RunId, RunParams, Span, Timestamp, ValidationMode,
};

pub async fn sqlite_store(base: &Path) -> HervResult<HervStore> {
    let config = HervConfig::default_sqlite(base.join("herv.sqlite").to_string_lossy());
    HervStore::connect(&config, base).await
}

pub async fn store_with(base: &Path, edit: impl FnOnce(&mut HervConfig)) -> HervResult<HervStore> {
    let mut config = HervConfig::default_sqlite(base.join("herv.sqlite").to_string_lossy());
    edit(&mut config);
    HervStore::connect(&config, base).await
}

pub async fn warn_store(base: &Path) -> HervResult<HervStore> {
    store_with(base, |config| config.validation_mode = Some(ValidationMode::Warn)).await
}

pub fn sample_run() -> RunParams {
    RunParams {
        executer: "lab-runner".to_string(),
        dna_file: "chr7.fa".to_string(),
        selected: Some("chr7:1-250000".to_string()),
        database: "retrotector-ref".to_string(),
        db_name: Some("RetroTectorDB".to_string()),
        db_last_modified: Some(Timestamp::from_unix_seconds(1_700_000_000)),
        execution_duration_secs: 412,
        selection_threshold: 300.0,
        final_selection_threshold: 350.0,
        keep_threshold: 0.75,
        improve_hits_max: 12,
        subgene_hits_max: 20,
        conservation_factor: 3,
        broken_penalty: 0.5,
        length_bonus: 1.25,
        frame_factor: 0.8,
        max_subgene_skip: 2,
        broken_passes: 1,
        orfid_min_score: 150,
        strand: "both".to_string(),
        sd_factor: true,
        fit_puteins: Some("yes".to_string()),
        make_chains_files: None,
        script_path: Some("/opt/retrotector/scripts/scan".to_string()),
        script_input: None,
        input_file: Some("chr7.fa".to_string()),
        debugging: None,
        run_datetime: Timestamp::from_unix_seconds(1_717_000_000),
        tool_version: "1.0.1".to_string(),
    }
}

pub fn chain(run_id: Option<RunId>, start: i64, end: i64) -> NewChain {
    NewChain {
        run_id,
        chain_type: ChainType::Primary,
        chain_level: 0,
        span: Span::new(start, end),
        retrovirus_type: "Gamma".to_string(),
        score: 850,
        integration_sites: None,
    }
}

pub fn subgene(name: &str) -> NewSubgene {
    NewSubgene {
        name: name.to_string(),
        subgene_type: None,
        score: 300,
        hotspot: 1,
    }
}

pub fn domain(idx: Option<i64>, n_bases: usize) -> DomainAttributes {
    DomainAttributes {
        idx,
        domain_type: "Gag".to_string(),
        origin: Some("HERVK".to_string()),
        score: 120,
        hotspot: 0,
        frame: 1,
        span: Span::new(200, 200 + n_bases as i64),
        match_input: "A".repeat(n_bases),
        reference_match: "A".repeat(n_bases),
        n_bases: n_bases as i64,
    }
}

/// Class A at `a`, the remainder spread over B through S.
pub fn probabilities(a: f64) -> RetrovirusTypeProbabilities {
    let rest = (1.0 - a) / 6.0;
    RetrovirusTypeProbabilities {
        a,
        b: rest,
        c: rest,
        d: rest,
        e: rest,
        l: rest,
        s: rest,
        g: 0.0,
        o: 0.0,
    }
}
