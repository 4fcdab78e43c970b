use idportal::Portal;

use crate::error::AppError;

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub portal: Portal,
}

impl AppState {
    pub fn new(portal: Portal) -> Self {
        Self { portal }
    }

    /// Runs a synchronous portal call on the blocking pool. The database and
    /// document store do file I/O.
    pub async fn blocking<T, F>(&self, f: F) -> Result<T, AppError>
    where
        F: FnOnce(&Portal) -> idportal::Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let portal = self.portal.clone();
        tokio::task::spawn_blocking(move || f(&portal))
            .await
            .map_err(|e| AppError::Internal(e.to_string()))?
            .map_err(AppError::from)
    }
}
