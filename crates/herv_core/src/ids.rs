use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::{HervError, HervResult};

// Surface keys are assigned by the database (auto-increment) and never reused.
macro_rules! surface_id {
    ($name:ident, $label:literal) => {
        #[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
        pub struct $name(pub i32);

        impl $name {
            pub fn as_i32(self) -> i32 {
                self.0
            }

            pub fn from_i64(value: i64) -> HervResult<Self> {
                i32::try_from(value).map(Self).map_err(|_| {
                    HervError::storage(format!("{} {value} out of range", $label))
                })
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{} {}", $label, self.0)
            }
        }

        impl Serialize for $name {
            fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
            where
                S: Serializer,
            {
                serializer.serialize_i32(self.0)
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: Deserializer<'de>,
            {
                Ok(Self(i32::deserialize(deserializer)?))
            }
        }
    };
}

surface_id!(RunId, "run_metadata");
surface_id!(ChainId, "herv_chain");
surface_id!(LtrId, "ltr");
surface_id!(AssociationId, "ltrs_of_hervchain");
surface_id!(MotifId, "motif");
surface_id!(ProbabilitiesId, "retrovirus_type_probabilities");
surface_id!(SubgeneId, "subgene");
surface_id!(DomainId, "domain");
