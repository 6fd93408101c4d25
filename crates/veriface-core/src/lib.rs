pub mod settings;
pub mod store;

pub use settings::{SessionSettings, Settings};
pub use store::{Merge, ResultStore, ResultStores};
