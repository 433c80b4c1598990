//! Closed vocabularies stored as text columns.
//!
//! The tables below are fixed at compile time and consulted by value. There is
//! no runtime registration.

use serde::{Deserialize, Serialize};

use crate::{HervError, HervResult};

pub const MOTIF_TYPES: &[&str] = &["Slippery", "PseudoKnot", "SpliceAcceptor", "SpliceDonor"];
pub const LTR_TYPES: &[&str] = &["solo", "five_prime", "three_prime"];
pub const CHAIN_TYPES: &[&str] = &["PR", "SE"];

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum EnumerationKind {
    MotifType,
    LtrType,
    ChainType,
}

impl EnumerationKind {
    pub fn field_name(self) -> &'static str {
        match self {
            EnumerationKind::MotifType => "motif_type",
            EnumerationKind::LtrType => "ltr_type",
            EnumerationKind::ChainType => "type_of_chain",
        }
    }

    pub fn allowed(self) -> &'static [&'static str] {
        match self {
            EnumerationKind::MotifType => MOTIF_TYPES,
            EnumerationKind::LtrType => LTR_TYPES,
            EnumerationKind::ChainType => CHAIN_TYPES,
        }
    }
}

pub fn validate(kind: EnumerationKind, value: &str) -> bool {
    kind.allowed().contains(&value)
}

pub fn require(kind: EnumerationKind, value: &str) -> HervResult<()> {
    if validate(kind, value) {
        Ok(())
    } else {
        Err(HervError::invalid_enumeration(
            kind.field_name(),
            value,
            kind.allowed(),
        ))
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum MotifType {
    Slippery,
    PseudoKnot,
    SpliceAcceptor,
    SpliceDonor,
}

impl MotifType {
    pub fn as_str(self) -> &'static str {
        match self {
            MotifType::Slippery => "Slippery",
            MotifType::PseudoKnot => "PseudoKnot",
            MotifType::SpliceAcceptor => "SpliceAcceptor",
            MotifType::SpliceDonor => "SpliceDonor",
        }
    }

    pub fn parse(value: &str) -> HervResult<Self> {
        require(EnumerationKind::MotifType, value)?;
        Ok(match value {
            "Slippery" => MotifType::Slippery,
            "PseudoKnot" => MotifType::PseudoKnot,
            "SpliceAcceptor" => MotifType::SpliceAcceptor,
            _ => MotifType::SpliceDonor,
        })
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum LtrType {
    Solo,
    FivePrime,
    ThreePrime,
}

impl LtrType {
    pub fn as_str(self) -> &'static str {
        match self {
            LtrType::Solo => "solo",
            LtrType::FivePrime => "five_prime",
            LtrType::ThreePrime => "three_prime",
        }
    }

    pub fn parse(value: &str) -> HervResult<Self> {
        require(EnumerationKind::LtrType, value)?;
        Ok(match value {
            "solo" => LtrType::Solo,
            "five_prime" => LtrType::FivePrime,
            _ => LtrType::ThreePrime,
        })
    }
}

/// Two-letter discriminator for a chain's rank in the scan.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum ChainType {
    Primary,
    Secondary,
}

impl ChainType {
    pub fn as_str(self) -> &'static str {
        match self {
            ChainType::Primary => "PR",
            ChainType::Secondary => "SE",
        }
    }

    pub fn parse(value: &str) -> HervResult<Self> {
        require(EnumerationKind::ChainType, value)?;
        Ok(match value {
            "PR" => ChainType::Primary,
            _ => ChainType::Secondary,
        })
    }
}
