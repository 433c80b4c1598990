use sea_orm_migration::prelude::*;

use crate::db::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(HervRunMetadata::Table)
                    .if_not_exists()
                    .col(id_col(HervRunMetadata::Id))
                    .col(ColumnDef::new(HervRunMetadata::Executer).text().not_null())
                    .col(ColumnDef::new(HervRunMetadata::DnaFile).text().not_null())
                    .col(ColumnDef::new(HervRunMetadata::Selected).text())
                    .col(ColumnDef::new(HervRunMetadata::Database).text().not_null())
                    .col(ColumnDef::new(HervRunMetadata::DbName).text())
                    .col(ColumnDef::new(HervRunMetadata::DbLastModifiedDatetime).big_integer())
                    .col(
                        ColumnDef::new(HervRunMetadata::ExecutionDuration)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(HervRunMetadata::SelectionThreshold)
                            .double()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(HervRunMetadata::FinalSelectionThreshold)
                            .double()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(HervRunMetadata::KeepThreshold)
                            .double()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(HervRunMetadata::ImproveHitsMax)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(HervRunMetadata::SubgeneHitsMax)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(HervRunMetadata::ConservationFactor)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(HervRunMetadata::BrokenPenalty)
                            .double()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(HervRunMetadata::LengthBonus)
                            .double()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(HervRunMetadata::FrameFactor)
                            .double()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(HervRunMetadata::MaxSubgeneSkip)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(HervRunMetadata::BrokenPasses)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(HervRunMetadata::OrfidMinScore)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(HervRunMetadata::Strand).text().not_null())
                    .col(
                        ColumnDef::new(HervRunMetadata::Sdfactor)
                            .boolean()
                            .not_null(),
                    )
                    .col(ColumnDef::new(HervRunMetadata::FitPuteins).text())
                    .col(ColumnDef::new(HervRunMetadata::MakeChainsFiles).text())
                    .col(ColumnDef::new(HervRunMetadata::ScriptPath).text())
                    .col(ColumnDef::new(HervRunMetadata::ScriptInput).text())
                    .col(ColumnDef::new(HervRunMetadata::InputFile).text())
                    .col(ColumnDef::new(HervRunMetadata::Debugging).text())
                    .col(
                        ColumnDef::new(HervRunMetadata::RunDatetime)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(HervRunMetadata::RetrotectorVersion)
                            .text()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(HervChains::Table)
                    .if_not_exists()
                    .col(id_col(HervChains::Id))
                    .col(ColumnDef::new(HervChains::RunMetadataId).integer().null())
                    .col(
                        ColumnDef::new(HervChains::TypeOfChain)
                            .string_len(2)
                            .not_null(),
                    )
                    .col(ColumnDef::new(HervChains::ChainLevel).big_integer().not_null())
                    .col(
                        ColumnDef::new(HervChains::ChainStartIdx)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(HervChains::ChainEndIdx)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(HervChains::RetrovirusType).text().not_null())
                    .col(ColumnDef::new(HervChains::Score).big_integer().not_null())
                    .col(ColumnDef::new(HervChains::IntegrationSites).text())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_herv_chains_run_metadata")
                            .from(HervChains::Table, HervChains::RunMetadataId)
                            .to(HervRunMetadata::Table, HervRunMetadata::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(HervLtr::Table)
                    .if_not_exists()
                    .col(id_col(HervLtr::Id))
                    .col(ColumnDef::new(HervLtr::IsPrimary).boolean().not_null())
                    .col(ColumnDef::new(HervLtr::LtrType).string_len(16).not_null())
                    .col(ColumnDef::new(HervLtr::InitIdx).big_integer().not_null())
                    .col(ColumnDef::new(HervLtr::FinIdx).big_integer().not_null())
                    .col(ColumnDef::new(HervLtr::FactorScore).double())
                    .col(ColumnDef::new(HervLtr::VirusGenus).text())
                    .col(ColumnDef::new(HervLtr::PeakLoc).big_integer())
                    .col(ColumnDef::new(HervLtr::AdenylationLoc).big_integer())
                    .col(ColumnDef::new(HervLtr::AdenylationSeq).text())
                    .col(ColumnDef::new(HervLtr::U5nnScore).double())
                    .col(ColumnDef::new(HervLtr::U5nnIdx).big_integer())
                    .col(ColumnDef::new(HervLtr::GtmodifierScore).double())
                    .col(ColumnDef::new(HervLtr::U3nnScore).double())
                    .col(ColumnDef::new(HervLtr::U3nnIdx).big_integer())
                    .col(ColumnDef::new(HervLtr::TataaScore).double())
                    .col(ColumnDef::new(HervLtr::TataaIdx).big_integer())
                    .col(ColumnDef::new(HervLtr::Meme50Score).double())
                    .col(ColumnDef::new(HervLtr::Meme50Idx).big_integer())
                    .col(ColumnDef::new(HervLtr::Motifs1Score).double())
                    .col(ColumnDef::new(HervLtr::Motifs1Idx).big_integer())
                    .col(ColumnDef::new(HervLtr::Motifs2Score).double())
                    .col(ColumnDef::new(HervLtr::Motifs2Idx).big_integer())
                    .col(ColumnDef::new(HervLtr::TranssitesScore).double())
                    .col(ColumnDef::new(HervLtr::CpgmodifierScore).double())
                    .col(ColumnDef::new(HervLtr::Spl8modifierScore).double())
                    .col(ColumnDef::new(HervLtr::Limiters).text())
                    .col(ColumnDef::new(HervLtr::Tsd5).text())
                    .col(ColumnDef::new(HervLtr::Tsd3).text())
                    .col(ColumnDef::new(HervLtr::SimilarityStart).big_integer())
                    .col(ColumnDef::new(HervLtr::SimilarityEnd).big_integer())
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(HervLtrsOfChain::Table)
                    .if_not_exists()
                    .col(id_col(HervLtrsOfChain::Id))
                    .col(
                        ColumnDef::new(HervLtrsOfChain::HervChainId)
                            .integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(HervLtrsOfChain::LtrId).integer().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_herv_ltrs_of_chain_chain")
                            .from(HervLtrsOfChain::Table, HervLtrsOfChain::HervChainId)
                            .to(HervChains::Table, HervChains::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_herv_ltrs_of_chain_ltr")
                            .from(HervLtrsOfChain::Table, HervLtrsOfChain::LtrId)
                            .to(HervLtr::Table, HervLtr::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(HervMotifs::Table)
                    .if_not_exists()
                    .col(id_col(HervMotifs::Id))
                    .col(ColumnDef::new(HervMotifs::HervChainId).integer().not_null())
                    .col(ColumnDef::new(HervMotifs::Type).string_len(16).not_null())
                    .col(ColumnDef::new(HervMotifs::PosInit).big_integer().not_null())
                    .col(ColumnDef::new(HervMotifs::PosEnd).big_integer().not_null())
                    .col(ColumnDef::new(HervMotifs::Score).big_integer().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_herv_motifs_chain")
                            .from(HervMotifs::Table, HervMotifs::HervChainId)
                            .to(HervChains::Table, HervChains::Id),
                    )
                    .to_owned(),
            )
            .await?;

        let mut probabilities = Table::create();
        probabilities
            .table(HervRetrovirusTypeProbabilities::Table)
            .if_not_exists()
            .col(id_col(HervRetrovirusTypeProbabilities::Id))
            .col(
                ColumnDef::new(HervRetrovirusTypeProbabilities::HervChainId)
                    .integer()
                    .not_null(),
            );
        for column in [
            HervRetrovirusTypeProbabilities::AScore,
            HervRetrovirusTypeProbabilities::BScore,
            HervRetrovirusTypeProbabilities::CScore,
            HervRetrovirusTypeProbabilities::DScore,
            HervRetrovirusTypeProbabilities::EScore,
            HervRetrovirusTypeProbabilities::LScore,
            HervRetrovirusTypeProbabilities::SScore,
            HervRetrovirusTypeProbabilities::GScore,
            HervRetrovirusTypeProbabilities::OScore,
        ] {
            probabilities.col(ColumnDef::new(column).double().not_null());
        }
        probabilities.foreign_key(
            ForeignKey::create()
                .name("fk_herv_probabilities_chain")
                .from(
                    HervRetrovirusTypeProbabilities::Table,
                    HervRetrovirusTypeProbabilities::HervChainId,
                )
                .to(HervChains::Table, HervChains::Id),
        );
        manager.create_table(probabilities.to_owned()).await?;

        manager
            .create_table(
                Table::create()
                    .table(HervSubgenes::Table)
                    .if_not_exists()
                    .col(id_col(HervSubgenes::Id))
                    .col(ColumnDef::new(HervSubgenes::HervChainId).integer().not_null())
                    .col(ColumnDef::new(HervSubgenes::Name).text().not_null())
                    .col(ColumnDef::new(HervSubgenes::Type).text())
                    .col(ColumnDef::new(HervSubgenes::Score).big_integer().not_null())
                    .col(ColumnDef::new(HervSubgenes::Hotspot).big_integer().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_herv_subgenes_chain")
                            .from(HervSubgenes::Table, HervSubgenes::HervChainId)
                            .to(HervChains::Table, HervChains::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(HervDomains::Table)
                    .if_not_exists()
                    .col(id_col(HervDomains::Id))
                    .col(ColumnDef::new(HervDomains::SubgeneId).integer().not_null())
                    .col(ColumnDef::new(HervDomains::Idx).big_integer())
                    .col(ColumnDef::new(HervDomains::Type).text().not_null())
                    .col(ColumnDef::new(HervDomains::Origin).text())
                    .col(ColumnDef::new(HervDomains::Score).big_integer().not_null())
                    .col(ColumnDef::new(HervDomains::Hotspot).big_integer().not_null())
                    .col(ColumnDef::new(HervDomains::Frame).integer().not_null())
                    .col(ColumnDef::new(HervDomains::PosInit).big_integer().not_null())
                    .col(ColumnDef::new(HervDomains::PosFin).big_integer().not_null())
                    .col(ColumnDef::new(HervDomains::MatchInput).text().not_null())
                    .col(ColumnDef::new(HervDomains::ReferenceMatch).text().not_null())
                    .col(ColumnDef::new(HervDomains::NBases).big_integer().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_herv_domains_subgene")
                            .from(HervDomains::Table, HervDomains::SubgeneId)
                            .to(HervSubgenes::Table, HervSubgenes::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("ux_herv_ltrs_of_chain_pair")
                    .table(HervLtrsOfChain::Table)
                    .col(HervLtrsOfChain::HervChainId)
                    .col(HervLtrsOfChain::LtrId)
                    .unique()
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .name("ix_herv_ltrs_of_chain_ltr")
                    .table(HervLtrsOfChain::Table)
                    .col(HervLtrsOfChain::LtrId)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .name("ux_herv_probabilities_chain")
                    .table(HervRetrovirusTypeProbabilities::Table)
                    .col(HervRetrovirusTypeProbabilities::HervChainId)
                    .unique()
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .name("ix_herv_chains_run")
                    .table(HervChains::Table)
                    .col(HervChains::RunMetadataId)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .name("ix_herv_motifs_chain")
                    .table(HervMotifs::Table)
                    .col(HervMotifs::HervChainId)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .name("ix_herv_subgenes_chain")
                    .table(HervSubgenes::Table)
                    .col(HervSubgenes::HervChainId)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .name("ix_herv_domains_subgene")
                    .table(HervDomains::Table)
                    .col(HervDomains::SubgeneId)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        for table in [
            HervDomains::Table.to_string(),
            HervSubgenes::Table.to_string(),
            HervRetrovirusTypeProbabilities::Table.to_string(),
            HervMotifs::Table.to_string(),
            HervLtrsOfChain::Table.to_string(),
            HervLtr::Table.to_string(),
            HervChains::Table.to_string(),
            HervRunMetadata::Table.to_string(),
        ] {
            manager
                .drop_table(Table::drop().table(Alias::new(table)).if_exists().to_owned())
                .await?;
        }
        Ok(())
    }
}

fn id_col(col: impl IntoIden) -> ColumnDef {
    ColumnDef::new(col)
        .integer()
        .not_null()
        .auto_increment()
        .primary_key()
        .to_owned()
}
