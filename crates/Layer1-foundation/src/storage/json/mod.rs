mod store;

pub use store::JsonFile;
