use async_trait::async_trait;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Closed set of movement kinds carried by every ledger row.
#[derive(
    Clone, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize, strum::Display,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum MovementType {
    #[sea_orm(string_value = "restock")]
    Restock,
    #[sea_orm(string_value = "sale")]
    Sale,
    #[sea_orm(string_value = "return")]
    Return,
    #[sea_orm(string_value = "adjustment")]
    Adjustment,
}

impl MovementType {
    /// Sign convention for the quantity delta of this kind.
    pub fn expected_sign(&self) -> i32 {
        match self {
            MovementType::Restock | MovementType::Return => 1,
            MovementType::Sale => -1,
            MovementType::Adjustment => 0,
        }
    }
}

/// One row of the append-only movement ledger. The table is range-partitioned
/// on `timestamp`, which therefore participates in the primary key; `id` is
/// drawn from a single global sequence and is only unique together with the
/// timestamp.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "inventory_movement")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: i64,
    pub product_id: i32,
    pub quantity_changed: i32,
    pub movement_type: MovementType,
    #[sea_orm(primary_key, auto_increment = false)]
    pub timestamp: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::product::Entity",
        from = "Column::ProductId",
        to = "super::product::Column::Id"
    )]
    Product,
}

impl Related<super::product::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Product.def()
    }
}

#[async_trait]
impl ActiveModelBehavior for ActiveModel {
    async fn before_save<C: ConnectionTrait>(self, _db: &C, insert: bool) -> Result<Self, DbErr>
    where
        C: ConnectionTrait,
    {
        // The ledger is append-only; updates never go through this entity.
        if !insert {
            return Err(DbErr::Custom(
                "inventory movements are immutable once recorded".into(),
            ));
        }
        Ok(self)
    }
}
