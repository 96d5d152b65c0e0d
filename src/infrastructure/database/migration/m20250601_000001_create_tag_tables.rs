//! Create tag and slot definition tables

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
	async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
		// Tags mirror the remote server's namespace, so ids are not
		// auto-incremented locally
		manager
			.create_table(
				Table::create()
					.table(Tags::Table)
					.if_not_exists()
					.col(ColumnDef::new(Tags::Id).integer().not_null().primary_key())
					.col(ColumnDef::new(Tags::Name).string().not_null())
					.col(
						ColumnDef::new(Tags::UpdatedAt)
							.timestamp_with_time_zone()
							.not_null(),
					)
					.to_owned(),
			)
			.await?;

		manager
			.create_table(
				Table::create()
					.table(SlotDefinitions::Table)
					.if_not_exists()
					.col(
						ColumnDef::new(SlotDefinitions::Id)
							.integer()
							.not_null()
							.auto_increment()
							.primary_key(),
					)
					.col(ColumnDef::new(SlotDefinitions::TagId).integer().not_null())
					.col(ColumnDef::new(SlotDefinitions::Label).string())
					.col(
						ColumnDef::new(SlotDefinitions::GenderHints)
							.json()
							.not_null(),
					)
					.col(
						ColumnDef::new(SlotDefinitions::DisplayOrder)
							.integer()
							.not_null()
							.default(0),
					)
					.foreign_key(
						ForeignKey::create()
							.name("fk_slot_definitions_tag_id")
							.from(SlotDefinitions::Table, SlotDefinitions::TagId)
							.to(Tags::Table, Tags::Id)
							.on_delete(ForeignKeyAction::Cascade)
							.on_update(ForeignKeyAction::Cascade),
					)
					.to_owned(),
			)
			.await?;

		// Slot sets are always read per tag
		manager
			.create_index(
				Index::create()
					.name("idx_slot_definitions_tag_id")
					.table(SlotDefinitions::Table)
					.col(SlotDefinitions::TagId)
					.to_owned(),
			)
			.await?;

		Ok(())
	}

	async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
		manager
			.drop_table(Table::drop().table(SlotDefinitions::Table).to_owned())
			.await?;
		manager
			.drop_table(Table::drop().table(Tags::Table).to_owned())
			.await?;
		Ok(())
	}
}

#[derive(DeriveIden)]
enum Tags {
	Table,
	Id,
	Name,
	UpdatedAt,
}

#[derive(DeriveIden)]
enum SlotDefinitions {
	Table,
	Id,
	TagId,
	Label,
	GenderHints,
	DisplayOrder,
}
