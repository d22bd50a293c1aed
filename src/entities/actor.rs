use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "actors")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub name: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub biography: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub photo_url: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub imdb_id: Option<String>,
    #[sea_orm(unique)]
    pub slug: String,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::movie_actor::Entity")]
    MovieActor,
}

impl Related<super::movie_actor::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::MovieActor.def()
    }
}

impl Related<super::movie::Entity> for Entity {
    fn to() -> RelationDef {
        super::movie_actor::Relation::Movie.def()
    }

    fn via() -> Option<RelationDef> {
        Some(super::movie_actor::Relation::Actor.def().rev())
    }
}

impl ActiveModelBehavior for ActiveModel {}
