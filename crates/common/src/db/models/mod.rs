//! SeaORM entity models
//!
//! Database entities for the Fronteira backend

mod collaboration;
mod collaboration_file;
mod document;
mod document_tag;
mod gallery;
mod gallery_item;
mod indicator;
mod location;
mod tag;
mod twin_city;

pub use location::{
    Entity as LocationEntity,
    Model as Location,
    ActiveModel as LocationActiveModel,
    Column as LocationColumn,
};

pub use twin_city::{
    Entity as TwinCityEntity,
    Model as TwinCity,
    ActiveModel as TwinCityActiveModel,
    Column as TwinCityColumn,
};

pub use indicator::{
    Entity as IndicatorEntity,
    Model as Indicator,
    ActiveModel as IndicatorActiveModel,
    Column as IndicatorColumn,
    IndicatorCategory,
};

pub use gallery::{
    Entity as GalleryEntity,
    Model as Gallery,
    ActiveModel as GalleryActiveModel,
    Column as GalleryColumn,
    GalleryKind,
};

pub use gallery_item::{
    Entity as GalleryItemEntity,
    Model as GalleryItem,
    ActiveModel as GalleryItemActiveModel,
    Column as GalleryItemColumn,
};

pub use collaboration::{
    Entity as CollaborationEntity,
    Model as Collaboration,
    ActiveModel as CollaborationActiveModel,
    Column as CollaborationColumn,
    CollaborationStatus,
};

pub use collaboration_file::{
    Entity as CollaborationFileEntity,
    Model as CollaborationFile,
    ActiveModel as CollaborationFileActiveModel,
    Column as CollaborationFileColumn,
};

pub use document::{
    Entity as DocumentEntity,
    Model as Document,
    ActiveModel as DocumentActiveModel,
    Column as DocumentColumn,
    DocumentCategory,
    DocumentKind,
};

pub use tag::{
    Entity as TagEntity,
    Model as Tag,
    ActiveModel as TagActiveModel,
    Column as TagColumn,
};

pub use document_tag::{
    Entity as DocumentTagEntity,
    Model as DocumentTag,
    ActiveModel as DocumentTagActiveModel,
    Column as DocumentTagColumn,
};
