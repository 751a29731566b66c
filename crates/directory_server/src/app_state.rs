use std::sync::Arc;

use crate::api::Directory;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) directory: Arc<Directory>,
}
