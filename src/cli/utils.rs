use serde_json::{json, Value};

use crate::cli::OutputFormat;

/// Output a success message in the appropriate format
pub fn output_success(output_format: OutputFormat, message: &str, data: Option<Value>) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => {
            let mut response = json!({
                "success": true,
                "message": message
            });

            if let Some(data_value) = data {
                response["data"] = data_value;
            }

            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        OutputFormat::Text => {
            println!("✓ {}", message);
        }
    }
    Ok(())
}

/// Opens the pool named by DATABASE_URL
pub async fn connect() -> anyhow::Result<crate::database::DatabaseManager> {
    let config = crate::config::config();
    let manager = crate::database::DatabaseManager::from_config(&config.database).await?;
    Ok(manager)
}
