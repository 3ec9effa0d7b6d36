use serde_json::json;

use crate::auth::{generate_jwt, hash_password_with_cost, Claims, Role};
use crate::cli::utils::output_success;
use crate::cli::OutputFormat;
use crate::config;

pub fn token(sub: &str, role: Role, output_format: OutputFormat) -> anyhow::Result<()> {
    let security = &config::config().security;
    let claims = Claims::new(sub, role, security.jwt_expiry_hours);
    let token = generate_jwt(&claims, &security.jwt_secret)?;

    match output_format {
        OutputFormat::Text => println!("{}", token),
        OutputFormat::Json => output_success(
            output_format,
            "Token issued",
            Some(json!({ "token": token, "sub": sub, "role": role, "exp": claims.exp })),
        )?,
    }
    Ok(())
}

pub fn hash_password(password: &str, cost: u32, output_format: OutputFormat) -> anyhow::Result<()> {
    let hashed = hash_password_with_cost(password, cost)?;

    match output_format {
        OutputFormat::Text => println!("{}", hashed),
        OutputFormat::Json => output_success(output_format, "Password hash", Some(json!({ "hash": hashed })))?,
    }
    Ok(())
}
