pub mod ast;
pub mod batch;
pub mod erd;
pub mod report;
pub mod sql;
pub mod transform;

use indexmap::IndexMap;
use serde::Deserialize;
use thiserror::Error;
use wasm_bindgen::prelude::*;

pub use ast::ParsedTable;
pub use erd::{build_graph, ErdGraph};
pub use sql::parse;
pub use transform::{to_editable_rows, CharsetCollationMap};

#[derive(Debug, Error)]
pub enum InputError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Request accepted by [`erd_from_json`]: DDL statements keyed by schema,
/// schemas kept in request order.
#[derive(Debug, Deserialize)]
pub struct ErdRequest {
    pub schemas: IndexMap<String, Vec<String>>,
}

/// Parse every statement of the request and build the graph. Unparseable
/// statements are left out.
pub fn erd_from_request(request: &ErdRequest) -> ErdGraph {
    build_graph(request.schemas.iter().map(|(schema, ddls)| {
        let tables = ddls
            .iter()
            .map(|ddl| parse(ddl))
            .filter(ParsedTable::is_parsed)
            .collect::<Vec<_>>();
        (schema.clone(), tables)
    }))
}

pub fn erd_from_json(request_json: &str) -> Result<ErdGraph, InputError> {
    let request: ErdRequest = serde_json::from_str(request_json)?;
    Ok(erd_from_request(&request))
}

/// Initialize panic hook for better error messages in WASM
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(target_arch = "wasm32")]
    console_error_panic_hook::set_once();
}

/// JSON request in, JSON graph out. Never throws: failures come back as
/// `{"error": "..."}`.
#[wasm_bindgen(js_name = "ddlToErd")]
pub fn ddl_to_erd(request_json: &str) -> String {
    let result = erd_from_json(request_json)
        .and_then(|graph| serde_json::to_string(&graph).map_err(InputError::from));
    match result {
        Ok(json) => json,
        Err(e) => serde_json::json!({ "error": e.to_string() }).to_string(),
    }
}
