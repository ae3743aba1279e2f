use sea_orm::entity::prelude::*;

/// Reference ingredient. `(name, measurement_unit)` is unique, enforced by
/// the `idx_ingredients_name_unit` index. `search_name` holds the Unicode
/// lowercase of `name` for prefix search.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "ingredients")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub name: String,
    pub measurement_unit: String,
    pub search_name: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::ingredient_amounts::Entity")]
    IngredientAmounts,
}

impl Related<super::ingredient_amounts::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::IngredientAmounts.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
