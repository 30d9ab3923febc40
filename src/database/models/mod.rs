pub mod asset;
pub mod principal;

pub use asset::AssetRow;
pub use principal::PrincipalRow;
