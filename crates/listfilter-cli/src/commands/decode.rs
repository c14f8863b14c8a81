//! Decode command implementation.
//!
//! Shows how a query string maps to filter criteria, without a page.

use listfilter_engine::url::decode_query;
use tracing::debug;

use super::{CommandContext, Result};
use crate::output::{format_decoded_json, format_decoded_table};

/// Executes the decode command.
pub fn execute(ctx: &CommandContext, query: &str) -> Result<()> {
    let query = query.strip_prefix('?').unwrap_or(query);
    let variables = decode_query(query);
    debug!(variables = variables.len(), "decoded query");

    if ctx.json_output {
        println!("{}", format_decoded_json(&variables)?);
    } else if !ctx.quiet {
        print!("{}", format_decoded_table(&variables, ctx.use_colors));
    }

    Ok(())
}
