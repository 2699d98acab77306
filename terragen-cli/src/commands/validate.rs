//! Validate module wiring without exporting anything

use crate::commands::generate::InfrastructureBuilder;
use anyhow::Result;
use terragen_core::BuildConfig;

/// Entry point for `terragen validate`
pub fn validate(config: &BuildConfig) -> Result<()> {
    let builder = InfrastructureBuilder::assemble(config)?;
    let report = builder.validate();

    println!("{}", serde_json::to_string_pretty(&report)?);

    if report.is_valid {
        println!("module wiring is valid");
        Ok(())
    } else {
        anyhow::bail!("wiring validation failed with {} errors", report.errors.len())
    }
}

/// Entry point for `terragen graph`
pub fn graph(config: &BuildConfig) -> Result<()> {
    let builder = InfrastructureBuilder::assemble(config)?;
    println!("{}", serde_json::to_string_pretty(&builder.dependency_info())?);
    Ok(())
}
