//! YAML snapshot of a university catalog, used to seed either backend.

use std::collections::HashMap;
use std::path::Path;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::enrollment::model::{
    Classroom, Course, Department, Instructor, Section, Student, Takes, TimeSlot,
};

#[derive(Debug, Error)]
pub enum FixtureError {
    #[error("failed to read fixture {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid fixture document: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("takes row for student '{student_id}' names unknown section '{section_id}'")]
    UnknownSection { student_id: String, section_id: String },
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Fixture {
    pub departments: Vec<Department>,
    pub students: Vec<StudentAccount>,
    pub instructors: Vec<InstructorAccount>,
    pub courses: Vec<Course>,
    pub prerequisites: Vec<PrerequisiteEdge>,
    pub classrooms: Vec<Classroom>,
    pub time_slots: Vec<TimeSlot>,
    pub sections: Vec<Section>,
    pub teaches: Vec<TeachingAssignment>,
    pub takes: Vec<TakesRow>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudentAccount {
    pub id: String,
    pub name: String,
    pub dept_name: String,
    #[serde(default)]
    pub tot_cred: Decimal,
    /// Output of `registrar hash-password`
    #[serde(default)]
    pub password_digest: Option<String>,
}

impl StudentAccount {
    pub fn record(&self) -> Student {
        Student {
            id: self.id.clone(),
            name: self.name.clone(),
            dept_name: self.dept_name.clone(),
            tot_cred: self.tot_cred,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstructorAccount {
    pub id: String,
    pub name: String,
    pub dept_name: String,
    #[serde(default)]
    pub password_digest: Option<String>,
}

impl InstructorAccount {
    pub fn record(&self) -> Instructor {
        Instructor {
            id: self.id.clone(),
            name: self.name.clone(),
            dept_name: self.dept_name.clone(),
        }
    }
}

/// `course_id` requires `prereq_id`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrerequisiteEdge {
    pub course_id: String,
    pub prereq_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeachingAssignment {
    pub instructor_id: String,
    pub section_id: String,
}

/// Course and term are taken from the section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TakesRow {
    pub student_id: String,
    pub section_id: String,
    #[serde(default)]
    pub grade: Option<String>,
}

impl Fixture {
    pub fn from_yaml_str(source: &str) -> Result<Self, FixtureError> {
        Ok(serde_yaml::from_str(source)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, FixtureError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|source| FixtureError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_yaml_str(&source)
    }

    /// Expands the `takes` rows into full ledger rows.
    pub fn enrollments(&self) -> Result<Vec<Takes>, FixtureError> {
        let sections: HashMap<&str, &Section> =
            self.sections.iter().map(|s| (s.id.as_str(), s)).collect();

        self.takes
            .iter()
            .map(|row| {
                let section = sections.get(row.section_id.as_str()).ok_or_else(|| {
                    FixtureError::UnknownSection {
                        student_id: row.student_id.clone(),
                        section_id: row.section_id.clone(),
                    }
                })?;
                Ok(Takes {
                    student_id: row.student_id.clone(),
                    course_id: section.course_id.clone(),
                    section_id: section.id.clone(),
                    semester: section.semester.clone(),
                    year: section.year,
                    grade: row.grade.clone().filter(|g| !g.is_empty()),
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: &str = r#"
courses:
  - { id: CS-101, title: Intro. to Computer Science, dept_name: Comp. Sci., credits: 4 }
classrooms:
  - { building: Packard, room_number: "101", capacity: 2 }
time_slots:
  - { id: A, days: [1, 3, 5], start: "08:00", end: "08:50" }
sections:
  - { id: CS-101-1-F24, course_id: CS-101, semester: Fall, year: 2024, building: Packard, room_number: "101", time_slot_id: A }
students:
  - { id: "00128", name: Zhang, dept_name: Comp. Sci. }
takes:
  - { student_id: "00128", section_id: CS-101-1-F24, grade: A }
"#;

    #[test]
    fn parses_and_expands_takes_rows() {
        let fixture = Fixture::from_yaml_str(DOC).unwrap();
        assert_eq!(fixture.time_slots[0].days.to_string(), "MWF");
        assert_eq!(fixture.students[0].tot_cred, Decimal::ZERO);

        let rows = fixture.enrollments().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].course_id, "CS-101");
        assert_eq!(rows[0].year, 2024);
        assert_eq!(rows[0].grade.as_deref(), Some("A"));
    }

    #[test]
    fn takes_row_for_unknown_section_is_rejected() {
        let mut fixture = Fixture::from_yaml_str(DOC).unwrap();
        fixture.takes[0].section_id = "nope".into();
        assert!(matches!(
            fixture.enrollments(),
            Err(FixtureError::UnknownSection { .. })
        ));
    }
}
