use std::sync::Arc;

use crate::config::Config;
use crate::ocr::OcrProvider;
use crate::services::UploadService;
use crate::storage::ImageStore;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub store: ImageStore,
    pub ocr: OcrProvider,
    pub uploads: UploadService,
}

impl AppState {
    pub fn new(config: Config, store: ImageStore, ocr: OcrProvider) -> Self {
        let uploads = UploadService::new(store.clone(), ocr.clone(), &config);

        Self {
            config: Arc::new(config),
            store,
            ocr,
            uploads,
        }
    }
}
