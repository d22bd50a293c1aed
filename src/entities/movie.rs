use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "movies")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub title: String,
    pub release_year: Option<i32>,
    /// Runtime in minutes.
    pub duration: Option<i32>,
    pub tagline: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,
    pub rating: Option<f64>,
    pub mpaa_rating: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub poster_url: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub page_img_url: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub trailer_url: Option<String>,
    #[sea_orm(unique)]
    pub slug: String,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::movie_genre::Entity")]
    MovieGenre,
    #[sea_orm(has_many = "super::movie_actor::Entity")]
    MovieActor,
    #[sea_orm(has_many = "super::movie_director::Entity")]
    MovieDirector,
}

impl Related<super::movie_genre::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::MovieGenre.def()
    }
}

impl Related<super::movie_actor::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::MovieActor.def()
    }
}

impl Related<super::movie_director::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::MovieDirector.def()
    }
}

impl Related<super::genre::Entity> for Entity {
    fn to() -> RelationDef {
        super::movie_genre::Relation::Genre.def()
    }

    fn via() -> Option<RelationDef> {
        Some(super::movie_genre::Relation::Movie.def().rev())
    }
}

impl Related<super::actor::Entity> for Entity {
    fn to() -> RelationDef {
        super::movie_actor::Relation::Actor.def()
    }

    fn via() -> Option<RelationDef> {
        Some(super::movie_actor::Relation::Movie.def().rev())
    }
}

impl Related<super::director::Entity> for Entity {
    fn to() -> RelationDef {
        super::movie_director::Relation::Director.def()
    }

    fn via() -> Option<RelationDef> {
        Some(super::movie_director::Relation::Movie.def().rev())
    }
}

impl ActiveModelBehavior for ActiveModel {}
