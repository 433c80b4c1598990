use sea_orm::sea_query;
use sea_orm_migration::prelude::Iden;

#[derive(Iden, Clone, Copy)]
pub enum HervRunMetadata {
    Table,
    Id,
    Executer,
    DnaFile,
    Selected,
    Database,
    DbName,
    DbLastModifiedDatetime,
    ExecutionDuration,
    SelectionThreshold,
    FinalSelectionThreshold,
    KeepThreshold,
    ImproveHitsMax,
    SubgeneHitsMax,
    ConservationFactor,
    BrokenPenalty,
    LengthBonus,
    FrameFactor,
    MaxSubgeneSkip,
    BrokenPasses,
    OrfidMinScore,
    Strand,
    Sdfactor,
    FitPuteins,
    MakeChainsFiles,
    ScriptPath,
    ScriptInput,
    InputFile,
    Debugging,
    RunDatetime,
    RetrotectorVersion,
}

#[derive(Iden, Clone, Copy)]
pub enum HervChains {
    Table,
    Id,
    RunMetadataId,
    TypeOfChain,
    ChainLevel,
    ChainStartIdx,
    ChainEndIdx,
    RetrovirusType,
    Score,
    IntegrationSites,
}

#[derive(Iden, Clone, Copy)]
pub enum HervLtr {
    Table,
    Id,
    IsPrimary,
    LtrType,
    InitIdx,
    FinIdx,
    FactorScore,
    VirusGenus,
    PeakLoc,
    AdenylationLoc,
    AdenylationSeq,
    #[iden = "u5nn_score"]
    U5nnScore,
    #[iden = "u5nn_idx"]
    U5nnIdx,
    #[iden = "gtmodifier_score"]
    GtmodifierScore,
    #[iden = "u3nn_score"]
    U3nnScore,
    #[iden = "u3nn_idx"]
    U3nnIdx,
    TataaScore,
    TataaIdx,
    #[iden = "meme50_score"]
    Meme50Score,
    #[iden = "meme50_idx"]
    Meme50Idx,
    #[iden = "motifs1_score"]
    Motifs1Score,
    #[iden = "motifs1_idx"]
    Motifs1Idx,
    #[iden = "motifs2_score"]
    Motifs2Score,
    #[iden = "motifs2_idx"]
    Motifs2Idx,
    TranssitesScore,
    CpgmodifierScore,
    #[iden = "spl8modifier_score"]
    Spl8modifierScore,
    Limiters,
    #[iden = "tsd5"]
    Tsd5,
    #[iden = "tsd3"]
    Tsd3,
    SimilarityStart,
    SimilarityEnd,
}

#[derive(Iden, Clone, Copy)]
pub enum HervLtrsOfChain {
    Table,
    Id,
    HervChainId,
    LtrId,
}

#[derive(Iden, Clone, Copy)]
pub enum HervMotifs {
    Table,
    Id,
    HervChainId,
    Type,
    PosInit,
    PosEnd,
    Score,
}

#[derive(Iden, Clone, Copy)]
pub enum HervRetrovirusTypeProbabilities {
    Table,
    Id,
    HervChainId,
    #[iden = "a_score"]
    AScore,
    #[iden = "b_score"]
    BScore,
    #[iden = "c_score"]
    CScore,
    #[iden = "d_score"]
    DScore,
    #[iden = "e_score"]
    EScore,
    #[iden = "l_score"]
    LScore,
    #[iden = "s_score"]
    SScore,
    #[iden = "g_score"]
    GScore,
    #[iden = "o_score"]
    OScore,
}

#[derive(Iden, Clone, Copy)]
pub enum HervSubgenes {
    Table,
    Id,
    HervChainId,
    Name,
    Type,
    Score,
    Hotspot,
}

#[derive(Iden, Clone, Copy)]
pub enum HervDomains {
    Table,
    Id,
    SubgeneId,
    Idx,
    Type,
    Origin,
    Score,
    Hotspot,
    Frame,
    PosInit,
    PosFin,
    MatchInput,
    ReferenceMatch,
    NBases,
}
