// File format handlers
pub mod csv;
pub mod img;
pub mod metadata;

pub use self::csv::{export_channels, import_channels, CsvError};
pub use img::{load_image, save_image, save_radio_image, ImgError, SENTINEL};
pub use metadata::Metadata;
