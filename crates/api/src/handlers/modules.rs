//! Handler for the `/modules` catalogue.

use axum::response::IntoResponse;
use axum::Json;
use blendopt_core::modules::OptimizationModule;
use serde::Serialize;

use crate::response::DataResponse;

/// One supported optimization module.
#[derive(Debug, Serialize)]
pub struct ModuleInfo {
    pub module: OptimizationModule,
    pub reference_kind: &'static str,
    pub payload_key: &'static str,
    pub start_path: &'static str,
    pub progress_path: &'static str,
    pub stop_path: &'static str,
}

/// GET /api/v1/modules
pub async fn list_modules() -> impl IntoResponse {
    let modules: Vec<ModuleInfo> = OptimizationModule::ALL
        .into_iter()
        .map(|module| {
            let adapter = module.adapter();
            ModuleInfo {
                module,
                reference_kind: adapter.reference_kind.as_str(),
                payload_key: adapter.payload_key,
                start_path: adapter.endpoints.start,
                progress_path: adapter.endpoints.progress,
                stop_path: adapter.endpoints.stop,
            }
        })
        .collect();

    Json(DataResponse { data: modules })
}
