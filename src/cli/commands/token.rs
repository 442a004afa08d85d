use serde_json::json;

use crate::auth::TokenIssuer;
use crate::cli::OutputFormat;
use crate::config::AppConfig;

pub fn handle(config: &AppConfig, email: &str, output_format: OutputFormat) -> anyhow::Result<()> {
    let issuer = TokenIssuer::from_config(&config.security)?;
    let token = issuer.issue_for_email(email)?;

    match output_format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&json!({ "token": token }))?),
        OutputFormat::Text => println!("{}", token),
    }
    Ok(())
}
