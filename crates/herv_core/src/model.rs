use serde::{Deserialize, Serialize};

use crate::{
    ChainId, ChainType, DomainId, LtrId, LtrType, MotifId, MotifType, ProbabilitiesId, RunId,
    SubgeneId, Timestamp,
};

/// Half-open index range into the scanned sequence. `end >= start` always holds
/// for persisted rows.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct Span {
    pub start: i64,
    pub end: i64,
}

impl Span {
    pub fn new(start: i64, end: i64) -> Self {
        Self { start, end }
    }

    pub fn len(self) -> i64 {
        self.end - self.start
    }

    pub fn is_empty(self) -> bool {
        self.end == self.start
    }

    pub fn contains(self, other: Span) -> bool {
        self.start <= other.start && other.end <= self.end
    }
}

/// Parameter set and provenance of one pipeline execution. Append-only.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RunParams {
    pub executer: String,
    pub dna_file: String,
    pub selected: Option<String>,
    pub database: String,
    pub db_name: Option<String>,
    pub db_last_modified: Option<Timestamp>,
    pub execution_duration_secs: i64,
    pub selection_threshold: f64,
    pub final_selection_threshold: f64,
    pub keep_threshold: f64,
    pub improve_hits_max: i64,
    pub subgene_hits_max: i64,
    pub conservation_factor: i64,
    pub broken_penalty: f64,
    pub length_bonus: f64,
    pub frame_factor: f64,
    pub max_subgene_skip: i64,
    pub broken_passes: i64,
    pub orfid_min_score: i64,
    pub strand: String,
    pub sd_factor: bool,
    pub fit_puteins: Option<String>,
    pub make_chains_files: Option<String>,
    pub script_path: Option<String>,
    pub script_input: Option<String>,
    pub input_file: Option<String>,
    pub debugging: Option<String>,
    pub run_datetime: Timestamp,
    pub tool_version: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RunRecord {
    pub run_id: RunId,
    pub params: RunParams,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NewChain {
    pub run_id: Option<RunId>,
    pub chain_type: ChainType,
    pub chain_level: i64,
    pub span: Span,
    pub retrovirus_type: String,
    pub score: i64,
    pub integration_sites: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HervChain {
    pub chain_id: ChainId,
    pub run_id: Option<RunId>,
    pub chain_type: ChainType,
    pub chain_level: i64,
    pub span: Span,
    pub retrovirus_type: String,
    pub score: i64,
    pub integration_sites: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NewMotif {
    pub motif_type: MotifType,
    pub span: Span,
    pub score: i64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Motif {
    pub motif_id: MotifId,
    pub chain_id: ChainId,
    pub motif_type: MotifType,
    pub span: Span,
    pub score: i64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NewSubgene {
    pub name: String,
    pub subgene_type: Option<String>,
    pub score: i64,
    pub hotspot: i64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Subgene {
    pub subgene_id: SubgeneId,
    pub chain_id: ChainId,
    pub name: String,
    pub subgene_type: Option<String>,
    pub score: i64,
    pub hotspot: i64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DomainAttributes {
    /// Ordinal among sibling domains, when the detector reports one.
    pub idx: Option<i64>,
    pub domain_type: String,
    pub origin: Option<String>,
    pub score: i64,
    pub hotspot: i64,
    pub frame: i32,
    pub span: Span,
    pub match_input: String,
    pub reference_match: String,
    pub n_bases: i64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Domain {
    pub domain_id: DomainId,
    pub subgene_id: SubgeneId,
    #[serde(flatten)]
    pub attributes: DomainAttributes,
}

/// Detector output for one regulatory signal of an LTR.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SignalHit {
    pub score: Option<f64>,
    pub idx: Option<i64>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LtrAttributes {
    pub is_primary: bool,
    pub ltr_type: LtrType,
    pub span: Span,
    pub factor_score: Option<f64>,
    pub virus_genus: Option<String>,
    pub peak_loc: Option<i64>,
    pub adenylation_loc: Option<i64>,
    pub adenylation_seq: Option<String>,
    pub u5nn: SignalHit,
    pub u3nn: SignalHit,
    pub tataa: SignalHit,
    pub meme50: SignalHit,
    pub motifs1: SignalHit,
    pub motifs2: SignalHit,
    pub gt_modifier_score: Option<f64>,
    pub transsites_score: Option<f64>,
    pub cpg_modifier_score: Option<f64>,
    pub spl8_modifier_score: Option<f64>,
    pub limiters: Option<String>,
    pub tsd5: Option<String>,
    pub tsd3: Option<String>,
    pub similarity_start: Option<i64>,
    pub similarity_end: Option<i64>,
}

impl LtrAttributes {
    /// Bare LTR with no signal annotations.
    pub fn new(ltr_type: LtrType, span: Span) -> Self {
        Self {
            is_primary: false,
            ltr_type,
            span,
            factor_score: None,
            virus_genus: None,
            peak_loc: None,
            adenylation_loc: None,
            adenylation_seq: None,
            u5nn: SignalHit::default(),
            u3nn: SignalHit::default(),
            tataa: SignalHit::default(),
            meme50: SignalHit::default(),
            motifs1: SignalHit::default(),
            motifs2: SignalHit::default(),
            gt_modifier_score: None,
            transsites_score: None,
            cpg_modifier_score: None,
            spl8_modifier_score: None,
            limiters: None,
            tsd5: None,
            tsd3: None,
            similarity_start: None,
            similarity_end: None,
        }
    }

    pub fn signals(&self) -> [(&'static str, SignalHit); 6] {
        [
            ("u5nn", self.u5nn),
            ("u3nn", self.u3nn),
            ("tataa", self.tataa),
            ("meme50", self.meme50),
            ("motifs1", self.motifs1),
            ("motifs2", self.motifs2),
        ]
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Ltr {
    pub ltr_id: LtrId,
    #[serde(flatten)]
    pub attributes: LtrAttributes,
}

pub const PROBABILITY_CLASSES: [&str; 9] = ["A", "B", "C", "D", "E", "L", "S", "G", "O"];

/// Distribution over retrovirus genera, with `o` covering everything else.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct RetrovirusTypeProbabilities {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
    pub e: f64,
    pub l: f64,
    pub s: f64,
    pub g: f64,
    pub o: f64,
}

impl RetrovirusTypeProbabilities {
    pub fn from_values(values: [f64; 9]) -> Self {
        let [a, b, c, d, e, l, s, g, o] = values;
        Self {
            a,
            b,
            c,
            d,
            e,
            l,
            s,
            g,
            o,
        }
    }

    pub fn values(&self) -> [f64; 9] {
        [
            self.a, self.b, self.c, self.d, self.e, self.l, self.s, self.g, self.o,
        ]
    }

    pub fn sum(&self) -> f64 {
        self.values().iter().sum()
    }

    /// Class label with the highest probability; ties resolve to the earlier class.
    pub fn dominant_class(&self) -> (&'static str, f64) {
        let mut best = (PROBABILITY_CLASSES[0], self.a);
        for (label, value) in PROBABILITY_CLASSES.iter().zip(self.values()) {
            if value > best.1 {
                best = (*label, value);
            }
        }
        best
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProbabilityRecord {
    pub probabilities_id: ProbabilitiesId,
    pub chain_id: ChainId,
    pub probabilities: RetrovirusTypeProbabilities,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SubgeneWithDomains {
    pub subgene: Subgene,
    pub domains: Vec<Domain>,
}

/// A chain with everything it owns or links, read in one snapshot.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChainHierarchy {
    pub chain: HervChain,
    pub motifs: Vec<Motif>,
    pub subgenes: Vec<SubgeneWithDomains>,
    pub probabilities: Option<ProbabilityRecord>,
    pub ltrs: Vec<Ltr>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SubgeneBundle {
    pub subgene: NewSubgene,
    pub domains: Vec<DomainAttributes>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum BundleLtr {
    Existing(LtrId),
    New(LtrAttributes),
}

/// Complete detector output for one chain, written in a single transaction.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChainBundle {
    pub chain: NewChain,
    pub motifs: Vec<NewMotif>,
    pub subgenes: Vec<SubgeneBundle>,
    pub probabilities: Option<RetrovirusTypeProbabilities>,
    pub ltrs: Vec<BundleLtr>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainBundleIds {
    pub chain_id: ChainId,
    pub motif_ids: Vec<MotifId>,
    pub subgene_ids: Vec<SubgeneId>,
    pub domain_ids: Vec<Vec<DomainId>>,
    pub probabilities_id: Option<ProbabilitiesId>,
    pub ltr_ids: Vec<LtrId>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreStats {
    pub runs: u64,
    pub chains: u64,
    pub ltrs: u64,
    pub associations: u64,
    pub motifs: u64,
    pub probabilities: u64,
    pub subgenes: u64,
    pub domains: u64,
}
