use anyhow::Context;
use serde_json::json;

use crate::cli::utils::{connect, output_success};
use crate::cli::OutputFormat;
use crate::database::{schema, seed as seed_fixture};
use crate::fixture::Fixture;

pub async fn migrate(output_format: OutputFormat) -> anyhow::Result<()> {
    let manager = connect().await?;
    schema::migrate(manager.pool()).await.context("applying schema")?;
    manager.close().await;

    output_success(output_format, "Schema is up to date", None)
}

pub async fn seed(path: &str, output_format: OutputFormat) -> anyhow::Result<()> {
    let fixture = Fixture::load(path)?;
    let manager = connect().await?;

    schema::migrate(manager.pool()).await.context("applying schema")?;
    let report = seed_fixture(manager.pool(), &fixture)
        .await
        .with_context(|| format!("seeding {}", path))?;
    manager.close().await;

    output_success(
        output_format,
        &format!(
            "Seeded {} students, {} instructors, {} courses, {} sections, {} enrollments",
            report.students, report.instructors, report.courses, report.sections, report.takes
        ),
        Some(json!({
            "students": report.students,
            "instructors": report.instructors,
            "courses": report.courses,
            "sections": report.sections,
            "takes": report.takes
        })),
    )
}
