use std::sync::Arc;

use anyhow::Context;

use crate::cli::utils::connect;
use crate::cli::OutputFormat;
use crate::database::{PgDirectory, PgLedger};
use crate::enrollment::EnrollmentCoordinator;

pub async fn show(student_id: &str, output_format: OutputFormat) -> anyhow::Result<()> {
    let manager = connect().await?;
    let pool = manager.pool().clone();
    let coordinator = EnrollmentCoordinator::new(Arc::new(PgDirectory::new(pool.clone())), Arc::new(PgLedger::new(pool)));

    let transcript = coordinator
        .transcript(student_id)
        .await
        .with_context(|| format!("loading transcript for {}", student_id))?;
    manager.close().await;

    match output_format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&transcript)?),
        OutputFormat::Text => {
            let student = &transcript.student;
            println!("{} ({}) - {}", student.name, student.id, student.dept_name);
            println!("{:<10} {:<32} {:<8} {:>4} {:>7} {:>5}", "Course", "Title", "Term", "Year", "Credits", "Grade");
            for course in &transcript.courses {
                println!(
                    "{:<10} {:<32} {:<8} {:>4} {:>7} {:>5}",
                    course.course_id,
                    course.title,
                    course.semester,
                    course.year,
                    course.credits.to_string(),
                    if course.grade.is_empty() { "-" } else { course.grade.as_str() }
                );
            }
            println!("Credits earned: {}  GPA: {}", transcript.total_credits, transcript.gpa);
        }
    }
    Ok(())
}
