pub mod dictionaries;

pub use dictionaries::{
    BodyDef, BodyId, Dictionaries, Dictionary, ItemTypeDef, ItemTypeId, MaterialDef, MaterialId,
    ProfessionDef, ProfessionId,
};
