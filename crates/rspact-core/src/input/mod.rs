pub mod files;
pub mod fluxes;
pub mod groups;
pub mod serialization;

pub use files::{FilesFile, FilesKeyword};
pub use fluxes::{FluxBin, FluxesFile};
pub use groups::{GroupRegistry, STANDARD_GROUPS, standard_registry};
pub use serialization::{
    TextSerializable, deserialize_from_path, serialize_to_path, serialize_to_string,
};
