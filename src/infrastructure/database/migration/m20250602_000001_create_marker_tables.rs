//! Create marker, marker tag and marker slot tables

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
	async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
		manager
			.create_table(
				Table::create()
					.table(Markers::Table)
					.if_not_exists()
					.col(
						ColumnDef::new(Markers::Id)
							.integer()
							.not_null()
							.auto_increment()
							.primary_key(),
					)
					.col(ColumnDef::new(Markers::Uuid).uuid().not_null().unique_key())
					.col(ColumnDef::new(Markers::SceneId).integer().not_null())
					.col(ColumnDef::new(Markers::PrimaryTagId).integer().not_null())
					.col(ColumnDef::new(Markers::Seconds).double().not_null())
					.col(ColumnDef::new(Markers::EndSeconds).double())
					.col(
						ColumnDef::new(Markers::CreatedAt)
							.timestamp_with_time_zone()
							.not_null(),
					)
					.col(
						ColumnDef::new(Markers::UpdatedAt)
							.timestamp_with_time_zone()
							.not_null(),
					)
					.foreign_key(
						ForeignKey::create()
							.name("fk_markers_primary_tag_id")
							.from(Markers::Table, Markers::PrimaryTagId)
							.to(Tags::Table, Tags::Id)
							.on_delete(ForeignKeyAction::Restrict)
							.on_update(ForeignKeyAction::Cascade),
					)
					.to_owned(),
			)
			.await?;

		// Markers are always loaded per scene
		manager
			.create_index(
				Index::create()
					.name("idx_markers_scene_id")
					.table(Markers::Table)
					.col(Markers::SceneId)
					.to_owned(),
			)
			.await?;

		manager
			.create_table(
				Table::create()
					.table(MarkerTags::Table)
					.if_not_exists()
					.col(ColumnDef::new(MarkerTags::MarkerId).integer().not_null())
					.col(ColumnDef::new(MarkerTags::TagId).integer().not_null())
					.primary_key(
						Index::create()
							.col(MarkerTags::MarkerId)
							.col(MarkerTags::TagId),
					)
					.foreign_key(
						ForeignKey::create()
							.name("fk_marker_tags_marker_id")
							.from(MarkerTags::Table, MarkerTags::MarkerId)
							.to(Markers::Table, Markers::Id)
							.on_delete(ForeignKeyAction::Cascade)
							.on_update(ForeignKeyAction::Cascade),
					)
					.foreign_key(
						ForeignKey::create()
							.name("fk_marker_tags_tag_id")
							.from(MarkerTags::Table, MarkerTags::TagId)
							.to(Tags::Table, Tags::Id)
							.on_delete(ForeignKeyAction::Cascade)
							.on_update(ForeignKeyAction::Cascade),
					)
					.to_owned(),
			)
			.await?;

		manager
			.create_table(
				Table::create()
					.table(MarkerSlots::Table)
					.if_not_exists()
					.col(
						ColumnDef::new(MarkerSlots::Id)
							.integer()
							.not_null()
							.auto_increment()
							.primary_key(),
					)
					.col(ColumnDef::new(MarkerSlots::MarkerId).integer().not_null())
					.col(
						ColumnDef::new(MarkerSlots::SlotDefinitionId)
							.integer()
							.not_null(),
					)
					.col(ColumnDef::new(MarkerSlots::PerformerId).integer())
					.foreign_key(
						ForeignKey::create()
							.name("fk_marker_slots_marker_id")
							.from(MarkerSlots::Table, MarkerSlots::MarkerId)
							.to(Markers::Table, Markers::Id)
							.on_delete(ForeignKeyAction::Cascade)
							.on_update(ForeignKeyAction::Cascade),
					)
					.foreign_key(
						ForeignKey::create()
							.name("fk_marker_slots_slot_definition_id")
							.from(MarkerSlots::Table, MarkerSlots::SlotDefinitionId)
							.to(SlotDefinitions::Table, SlotDefinitions::Id)
							.on_delete(ForeignKeyAction::Cascade)
							.on_update(ForeignKeyAction::Cascade),
					)
					.to_owned(),
			)
			.await?;

		manager
			.create_index(
				Index::create()
					.name("idx_marker_slots_marker_id")
					.table(MarkerSlots::Table)
					.col(MarkerSlots::MarkerId)
					.to_owned(),
			)
			.await?;

		Ok(())
	}

	async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
		manager
			.drop_table(Table::drop().table(MarkerSlots::Table).to_owned())
			.await?;
		manager
			.drop_table(Table::drop().table(MarkerTags::Table).to_owned())
			.await?;
		manager
			.drop_table(Table::drop().table(Markers::Table).to_owned())
			.await?;
		Ok(())
	}
}

#[derive(DeriveIden)]
enum Tags {
	Table,
	Id,
}

#[derive(DeriveIden)]
enum SlotDefinitions {
	Table,
	Id,
}

#[derive(DeriveIden)]
enum Markers {
	Table,
	Id,
	Uuid,
	SceneId,
	PrimaryTagId,
	Seconds,
	EndSeconds,
	CreatedAt,
	UpdatedAt,
}

#[derive(DeriveIden)]
enum MarkerTags {
	Table,
	MarkerId,
	TagId,
}

#[derive(DeriveIden)]
enum MarkerSlots {
	Table,
	Id,
	MarkerId,
	SlotDefinitionId,
	PerformerId,
}
