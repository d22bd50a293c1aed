use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "directors")]
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
    #[sea_orm(has_many = "super::movie_director::Entity")]
    MovieDirector,
}

impl Related<super::movie_director::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::MovieDirector.def()
    }
}

impl Related<super::movie::Entity> for Entity {
    fn to() -> RelationDef {
        super::movie_director::Relation::Movie.def()
    }

    fn via() -> Option<RelationDef> {
        Some(super::movie_director::Relation::Director.def().rev())
    }
}

impl ActiveModelBehavior for ActiveModel {}
