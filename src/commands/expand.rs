//! Expand command implementation

use crate::expand::expand_query;
use serde::{Deserialize, Serialize};

/// Query variants produced by the expander
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExpandResult {
    pub query: String,
    pub variants: Vec<String>,
}

/// Show how a query is expanded before search
pub fn cmd_expand(query: &str) -> ExpandResult {
    ExpandResult {
        query: query.to_string(),
        variants: expand_query(query),
    }
}

/// Print query variants to console
pub fn print_expand_result(result: &ExpandResult) {
    println!("\n🔀 Variants for: {}\n", result.query);
    for (i, variant) in result.variants.iter().enumerate() {
        println!("{}. {}", i + 1, variant);
    }
}
