//! Post entity for SeaORM.

use sea_orm::entity::prelude::*;

use board_core::domain::{Attachment, Post};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "post")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub title: String,
    #[sea_orm(column_type = "Text")]
    pub body: String,
    pub view_count: i64,
    pub author_id: i64,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::member::Entity",
        from = "Column::AuthorId",
        to = "super::member::Column::Id",
        on_update = "Cascade",
        on_delete = "Restrict"
    )]
    Member,
    #[sea_orm(has_many = "super::attachment::Entity")]
    Attachment,
}

impl Related<super::member::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Member.def()
    }
}

impl Related<super::attachment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Attachment.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Assemble the domain aggregate from the row and its attachment rows.
    pub fn into_domain(self, attachments: Vec<Attachment>) -> Post {
        Post {
            id: self.id,
            author_id: self.author_id,
            title: self.title,
            body: self.body,
            view_count: self.view_count,
            attachments,
            created_at: self.created_at.into(),
            updated_at: self.updated_at.into(),
        }
    }
}
