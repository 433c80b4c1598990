//! Pure input checks, run before any write touches storage.
//!
//! Hard checks return an error. Soft checks (`domain_base_count_issue`,
//! `ltr_containment_issue`) return a description of the problem and leave the
//! decision to the store's validation mode.

use crate::{
    DomainAttributes, HervError, HervResult, LtrAttributes, NewChain, NewMotif, NewSubgene,
    PROBABILITY_CLASSES, RetrovirusTypeProbabilities, RunParams, Span,
};

pub const DEFAULT_PROBABILITY_TOLERANCE: f64 = 1e-3;
pub const MIN_FRAME: i32 = -3;
pub const MAX_FRAME: i32 = 3;

/// Caps on free-text and sequence columns.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TextLimits {
    pub max_text_bytes: usize,
    pub max_sequence_bytes: usize,
}

impl Default for TextLimits {
    fn default() -> Self {
        Self {
            max_text_bytes: 65_536,
            max_sequence_bytes: 1_048_576,
        }
    }
}

pub fn check_span(field: &str, span: Span) -> HervResult<()> {
    if span.start < 0 {
        return Err(HervError::invalid_range(
            field,
            format!("start {} is negative", span.start),
        ));
    }
    if span.end < span.start {
        return Err(HervError::invalid_range(
            field,
            format!("end {} < start {}", span.end, span.start),
        ));
    }
    Ok(())
}

pub fn check_non_negative(field: &str, value: i64) -> HervResult<()> {
    if value < 0 {
        return Err(HervError::invalid_range(
            field,
            format!("{value} is negative"),
        ));
    }
    Ok(())
}

pub fn check_finite(field: &str, value: f64) -> HervResult<()> {
    if !value.is_finite() {
        return Err(HervError::invalid_range(field, format!("{value} is not finite")));
    }
    Ok(())
}

fn check_score(field: &str, value: f64) -> HervResult<()> {
    check_finite(field, value)?;
    if value < 0.0 {
        return Err(HervError::invalid_range(field, format!("{value} is negative")));
    }
    Ok(())
}

fn check_opt_score(field: &str, value: Option<f64>) -> HervResult<()> {
    value.map_or(Ok(()), |value| check_score(field, value))
}

fn check_opt_index(field: &str, value: Option<i64>) -> HervResult<()> {
    value.map_or(Ok(()), |value| check_non_negative(field, value))
}

pub fn check_required_text(field: &str, value: &str) -> HervResult<()> {
    if value.trim().is_empty() {
        return Err(HervError::validation(format!("{field} is required")));
    }
    Ok(())
}

pub fn check_text_len(field: &str, value: &str, max_bytes: usize) -> HervResult<()> {
    if value.len() > max_bytes {
        return Err(HervError::invalid_range(
            field,
            format!("{} bytes exceeds limit of {max_bytes}", value.len()),
        ));
    }
    Ok(())
}

fn check_opt_text_len(field: &str, value: Option<&str>, max_bytes: usize) -> HervResult<()> {
    value.map_or(Ok(()), |value| check_text_len(field, value, max_bytes))
}

pub fn validate_run(params: &RunParams, limits: &TextLimits) -> HervResult<()> {
    check_required_text("executer", &params.executer)?;
    check_required_text("dna_file", &params.dna_file)?;
    check_required_text("database", &params.database)?;
    check_required_text("retrotector_version", &params.tool_version)?;
    for (field, value) in [
        ("execution_duration", params.execution_duration_secs),
        ("improve_hits_max", params.improve_hits_max),
        ("subgene_hits_max", params.subgene_hits_max),
        ("conservation_factor", params.conservation_factor),
        ("max_subgene_skip", params.max_subgene_skip),
        ("broken_passes", params.broken_passes),
        ("orfid_min_score", params.orfid_min_score),
    ] {
        check_non_negative(field, value)?;
    }
    for (field, value) in [
        ("selection_threshold", params.selection_threshold),
        ("final_selection_threshold", params.final_selection_threshold),
        ("keep_threshold", params.keep_threshold),
        ("broken_penalty", params.broken_penalty),
        ("length_bonus", params.length_bonus),
        ("frame_factor", params.frame_factor),
    ] {
        check_finite(field, value)?;
    }
    for (field, value) in [
        ("executer", Some(params.executer.as_str())),
        ("dna_file", Some(params.dna_file.as_str())),
        ("selected", params.selected.as_deref()),
        ("database", Some(params.database.as_str())),
        ("db_name", params.db_name.as_deref()),
        ("strand", Some(params.strand.as_str())),
        ("fit_puteins", params.fit_puteins.as_deref()),
        ("make_chains_files", params.make_chains_files.as_deref()),
        ("script_path", params.script_path.as_deref()),
        ("script_input", params.script_input.as_deref()),
        ("input_file", params.input_file.as_deref()),
        ("debugging", params.debugging.as_deref()),
        ("retrotector_version", Some(params.tool_version.as_str())),
    ] {
        check_opt_text_len(field, value, limits.max_text_bytes)?;
    }
    Ok(())
}

pub fn validate_chain(chain: &NewChain, limits: &TextLimits) -> HervResult<()> {
    check_non_negative("chain_level", chain.chain_level)?;
    check_span("chain_start_idx..chain_end_idx", chain.span)?;
    check_non_negative("score", chain.score)?;
    check_required_text("retrovirus_type", &chain.retrovirus_type)?;
    check_text_len("retrovirus_type", &chain.retrovirus_type, limits.max_text_bytes)?;
    check_opt_text_len(
        "integration_sites",
        chain.integration_sites.as_deref(),
        limits.max_text_bytes,
    )
}

pub fn validate_motif(motif: &NewMotif) -> HervResult<()> {
    check_span("pos_init..pos_end", motif.span)?;
    check_non_negative("score", motif.score)
}

pub fn validate_subgene(subgene: &NewSubgene, limits: &TextLimits) -> HervResult<()> {
    check_required_text("name", &subgene.name)?;
    check_text_len("name", &subgene.name, limits.max_text_bytes)?;
    check_opt_text_len("type", subgene.subgene_type.as_deref(), limits.max_text_bytes)?;
    check_non_negative("score", subgene.score)?;
    check_non_negative("hotspot", subgene.hotspot)
}

pub fn validate_domain(domain: &DomainAttributes, limits: &TextLimits) -> HervResult<()> {
    check_opt_index("idx", domain.idx)?;
    check_required_text("type", &domain.domain_type)?;
    check_text_len("type", &domain.domain_type, limits.max_text_bytes)?;
    check_opt_text_len("origin", domain.origin.as_deref(), limits.max_text_bytes)?;
    check_non_negative("score", domain.score)?;
    check_non_negative("hotspot", domain.hotspot)?;
    if !(MIN_FRAME..=MAX_FRAME).contains(&domain.frame) {
        return Err(HervError::invalid_range(
            "frame",
            format!("{} outside {MIN_FRAME}..={MAX_FRAME}", domain.frame),
        ));
    }
    check_span("pos_init..pos_fin", domain.span)?;
    check_non_negative("n_bases", domain.n_bases)?;
    check_text_len("match_input", &domain.match_input, limits.max_sequence_bytes)?;
    check_text_len(
        "reference_match",
        &domain.reference_match,
        limits.max_sequence_bytes,
    )
}

pub fn domain_base_count_issue(domain: &DomainAttributes) -> Option<String> {
    let matched = domain.match_input.len() as i64;
    (matched != domain.n_bases).then(|| {
        format!(
            "n_bases {} does not match match_input length {matched}",
            domain.n_bases
        )
    })
}

pub fn validate_ltr(ltr: &LtrAttributes, limits: &TextLimits) -> HervResult<()> {
    check_span("init_idx..fin_idx", ltr.span)?;
    if let Some(factor) = ltr.factor_score {
        check_finite("factor_score", factor)?;
    }
    check_opt_index("peak_loc", ltr.peak_loc)?;
    check_opt_index("adenylation_loc", ltr.adenylation_loc)?;
    for (name, hit) in ltr.signals() {
        check_opt_score(&format!("{name}_score"), hit.score)?;
        check_opt_index(&format!("{name}_idx"), hit.idx)?;
    }
    check_opt_score("gtmodifier_score", ltr.gt_modifier_score)?;
    check_opt_score("transsites_score", ltr.transsites_score)?;
    check_opt_score("cpgmodifier_score", ltr.cpg_modifier_score)?;
    check_opt_score("spl8modifier_score", ltr.spl8_modifier_score)?;
    check_opt_index("similarity_start", ltr.similarity_start)?;
    check_opt_index("similarity_end", ltr.similarity_end)?;
    if let (Some(start), Some(end)) = (ltr.similarity_start, ltr.similarity_end) {
        check_span("similarity_start..similarity_end", Span::new(start, end))?;
    }
    for (field, value) in [
        ("virus_genus", ltr.virus_genus.as_deref()),
        ("limiters", ltr.limiters.as_deref()),
    ] {
        check_opt_text_len(field, value, limits.max_text_bytes)?;
    }
    for (field, value) in [
        ("adenylation_seq", ltr.adenylation_seq.as_deref()),
        ("tsd5", ltr.tsd5.as_deref()),
        ("tsd3", ltr.tsd3.as_deref()),
    ] {
        check_opt_text_len(field, value, limits.max_sequence_bytes)?;
    }
    Ok(())
}

pub fn ltr_containment_issue(chain: Span, ltr: Span) -> Option<String> {
    (!chain.contains(ltr)).then(|| {
        format!(
            "ltr span {}..{} lies outside chain span {}..{}",
            ltr.start, ltr.end, chain.start, chain.end
        )
    })
}

/// Every class must lie in [0, 1] and the total must be within `tolerance` of 1.
/// Input is never renormalised.
pub fn validate_probabilities(
    probabilities: &RetrovirusTypeProbabilities,
    tolerance: f64,
) -> HervResult<()> {
    for (label, value) in PROBABILITY_CLASSES.iter().zip(probabilities.values()) {
        if !value.is_finite() || !(0.0..=1.0).contains(&value) {
            return Err(HervError::invalid_distribution(format!(
                "class {label} probability {value} outside [0, 1]"
            )));
        }
    }
    let sum = probabilities.sum();
    if (sum - 1.0).abs() > tolerance {
        return Err(HervError::invalid_distribution(format!(
            "probabilities sum to {sum}, expected 1 within {tolerance}"
        )));
    }
    Ok(())
}
