use std::path::PathBuf;
use std::sync::Arc;

use crate::store::{AssetStore, PrincipalStore};
use crate::validation::exists::ExistenceChecker;

/// Shared application state threaded through the router.
#[derive(Clone)]
pub struct AppState {
    pub principals: Arc<dyn PrincipalStore>,
    pub assets: Arc<dyn AssetStore>,
    pub existence: Arc<dyn ExistenceChecker>,
    pub upload_root: PathBuf,
}
