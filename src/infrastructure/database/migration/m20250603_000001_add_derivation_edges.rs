//! Add derivation edge table for materialized-marker provenance

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
	async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
		manager
			.create_table(
				Table::create()
					.table(DerivationEdges::Table)
					.if_not_exists()
					.col(
						ColumnDef::new(DerivationEdges::Id)
							.integer()
							.not_null()
							.auto_increment()
							.primary_key(),
					)
					.col(
						ColumnDef::new(DerivationEdges::SourceMarkerId)
							.integer()
							.not_null(),
					)
					.col(
						ColumnDef::new(DerivationEdges::DerivedMarkerId)
							.integer()
							.not_null(),
					)
					.col(ColumnDef::new(DerivationEdges::RuleId).string().not_null())
					.col(ColumnDef::new(DerivationEdges::Depth).integer().not_null())
					.col(
						ColumnDef::new(DerivationEdges::CreatedAt)
							.timestamp_with_time_zone()
							.not_null(),
					)
					.foreign_key(
						ForeignKey::create()
							.name("fk_derivation_edges_source_marker_id")
							.from(DerivationEdges::Table, DerivationEdges::SourceMarkerId)
							.to(Markers::Table, Markers::Id)
							.on_delete(ForeignKeyAction::Cascade)
							.on_update(ForeignKeyAction::Cascade),
					)
					.foreign_key(
						ForeignKey::create()
							.name("fk_derivation_edges_derived_marker_id")
							.from(DerivationEdges::Table, DerivationEdges::DerivedMarkerId)
							.to(Markers::Table, Markers::Id)
							.on_delete(ForeignKeyAction::Cascade)
							.on_update(ForeignKeyAction::Cascade),
					)
					.to_owned(),
			)
			.await?;

		// Concurrent materialize calls for the same marker must not
		// double-create edges; uniqueness is enforced here, not in the
		// engine
		manager
			.create_index(
				Index::create()
					.name("idx_derivation_edges_source_derived")
					.table(DerivationEdges::Table)
					.col(DerivationEdges::SourceMarkerId)
					.col(DerivationEdges::DerivedMarkerId)
					.unique()
					.to_owned(),
			)
			.await?;

		// One edge per rule per source marker
		manager
			.create_index(
				Index::create()
					.name("idx_derivation_edges_source_rule")
					.table(DerivationEdges::Table)
					.col(DerivationEdges::SourceMarkerId)
					.col(DerivationEdges::RuleId)
					.unique()
					.to_owned(),
			)
			.await?;

		// Reverse lookup: which source produced this marker
		manager
			.create_index(
				Index::create()
					.name("idx_derivation_edges_derived")
					.table(DerivationEdges::Table)
					.col(DerivationEdges::DerivedMarkerId)
					.to_owned(),
			)
			.await?;

		Ok(())
	}

	async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
		manager
			.drop_table(Table::drop().table(DerivationEdges::Table).to_owned())
			.await?;
		Ok(())
	}
}

#[derive(DeriveIden)]
enum Markers {
	Table,
	Id,
}

#[derive(DeriveIden)]
enum DerivationEdges {
	Table,
	Id,
	SourceMarkerId,
	DerivedMarkerId,
	RuleId,
	Depth,
	CreatedAt,
}
