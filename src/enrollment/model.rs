use std::cmp::Ordering;
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use chrono::{NaiveTime, Timelike};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::error::EnrollmentError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Student {
    pub id: String,
    pub name: String,
    pub dept_name: String,
    /// Cached on the record by the CRUD layer; transcripts never trust it.
    #[serde(default)]
    pub tot_cred: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Instructor {
    pub id: String,
    pub name: String,
    pub dept_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Department {
    pub dept_name: String,
    pub building: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Course {
    pub id: String,
    pub title: String,
    pub dept_name: String,
    pub credits: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Section {
    pub id: String,
    pub course_id: String,
    pub semester: String,
    pub year: i32,
    pub building: String,
    pub room_number: String,
    pub time_slot_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Classroom {
    pub building: String,
    pub room_number: String,
    pub capacity: i64,
}

/// One row of the ledger: a student enrolled in a section.
/// `grade == None` means in progress.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Takes {
    pub student_id: String,
    pub course_id: String,
    pub section_id: String,
    pub semester: String,
    pub year: i32,
    pub grade: Option<String>,
}

impl Takes {
    pub fn is_graded(&self) -> bool {
        self.grade.as_deref().is_some_and(|g| !g.is_empty())
    }

    pub fn is_passed(&self) -> bool {
        is_passing_mark(self.grade.as_deref())
    }
}

/// Values needed to insert a fresh, ungraded ledger row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewEnrollment {
    pub student_id: String,
    pub course_id: String,
    pub section_id: String,
    pub semester: String,
    pub year: i32,
}

impl NewEnrollment {
    pub fn for_section(student_id: &str, section: &Section) -> Self {
        Self {
            student_id: student_id.to_string(),
            course_id: section.course_id.clone(),
            section_id: section.id.clone(),
            semester: section.semester.clone(),
            year: section.year,
        }
    }

    pub fn into_takes(self) -> Takes {
        Takes {
            student_id: self.student_id,
            course_id: self.course_id,
            section_id: self.section_id,
            semester: self.semester,
            year: self.year,
            grade: None,
        }
    }
}

/// A non-empty mark other than "F" completes a course.
pub fn is_passing_mark(grade: Option<&str>) -> bool {
    match grade {
        Some(g) => !g.is_empty() && g != Grade::F.as_str(),
        None => false,
    }
}

// ---------------------------------------------------------------------------
// Grades
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Grade {
    A,
    AMinus,
    BPlus,
    B,
    BMinus,
    CPlus,
    C,
    CMinus,
    DPlus,
    D,
    F,
}

impl Grade {
    pub const ALL: [Grade; 11] = [
        Grade::A,
        Grade::AMinus,
        Grade::BPlus,
        Grade::B,
        Grade::BMinus,
        Grade::CPlus,
        Grade::C,
        Grade::CMinus,
        Grade::DPlus,
        Grade::D,
        Grade::F,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Grade::A => "A",
            Grade::AMinus => "A-",
            Grade::BPlus => "B+",
            Grade::B => "B",
            Grade::BMinus => "B-",
            Grade::CPlus => "C+",
            Grade::C => "C",
            Grade::CMinus => "C-",
            Grade::DPlus => "D+",
            Grade::D => "D",
            Grade::F => "F",
        }
    }

    pub fn points(self) -> Decimal {
        let tenths = match self {
            Grade::A => 40,
            Grade::AMinus => 37,
            Grade::BPlus => 33,
            Grade::B => 30,
            Grade::BMinus => 27,
            Grade::CPlus => 23,
            Grade::C => 20,
            Grade::CMinus => 17,
            Grade::DPlus => 13,
            Grade::D => 10,
            Grade::F => 0,
        };
        Decimal::new(tenths, 1)
    }

    pub fn is_passing(self) -> bool {
        self != Grade::F
    }

    /// Total mapping over stored marks: unknown strings are worth 0.0.
    pub fn points_for(mark: &str) -> Decimal {
        mark.parse::<Grade>().map(Grade::points).unwrap_or(Decimal::ZERO)
    }
}

impl FromStr for Grade {
    type Err = EnrollmentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "A" => Ok(Grade::A),
            "A-" => Ok(Grade::AMinus),
            "B+" => Ok(Grade::BPlus),
            "B" => Ok(Grade::B),
            "B-" => Ok(Grade::BMinus),
            "C+" => Ok(Grade::CPlus),
            "C" => Ok(Grade::C),
            "C-" => Ok(Grade::CMinus),
            "D+" => Ok(Grade::DPlus),
            "D" => Ok(Grade::D),
            "F" => Ok(Grade::F),
            other => Err(EnrollmentError::InvalidGrade(other.to_string())),
        }
    }
}

impl TryFrom<String> for Grade {
    type Error = EnrollmentError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Grade> for String {
    fn from(grade: Grade) -> Self {
        grade.as_str().to_string()
    }
}

impl Display for Grade {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Meeting times
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("weekday marker {0} is outside 1-7")]
pub struct InvalidWeekday(pub u8);

/// Set of weekday markers, 1 = Monday through 7 = Sunday
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "Vec<u8>", into = "Vec<u8>")]
pub struct Weekdays(u8);

impl Weekdays {
    pub const NONE: Self = Weekdays(0);

    const LETTERS: [char; 7] = ['M', 'T', 'W', 'R', 'F', 'S', 'U'];

    pub fn from_markers(markers: &[u8]) -> Result<Self, InvalidWeekday> {
        let mut days = Self::NONE;
        for &marker in markers {
            days.insert(marker)?;
        }
        Ok(days)
    }

    pub fn insert(&mut self, marker: u8) -> Result<(), InvalidWeekday> {
        if !(1..=7).contains(&marker) {
            return Err(InvalidWeekday(marker));
        }
        self.0 |= 1 << (marker - 1);
        Ok(())
    }

    pub fn contains(self, marker: u8) -> bool {
        (1..=7).contains(&marker) && self.0 & (1 << (marker - 1)) != 0
    }

    pub fn intersects(self, other: Weekdays) -> bool {
        self.0 & other.0 != 0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn markers(self) -> Vec<u8> {
        (1..=7).filter(|m| self.contains(*m)).collect()
    }
}

impl TryFrom<Vec<u8>> for Weekdays {
    type Error = InvalidWeekday;

    fn try_from(markers: Vec<u8>) -> Result<Self, Self::Error> {
        Self::from_markers(&markers)
    }
}

impl From<Weekdays> for Vec<u8> {
    fn from(days: Weekdays) -> Self {
        days.markers()
    }
}

impl Display for Weekdays {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        for marker in self.markers() {
            write!(f, "{}", Self::LETTERS[usize::from(marker - 1)])?;
        }
        Ok(())
    }
}

/// Weekly meeting pattern of a section
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "TimeSlotRecord", into = "TimeSlotRecord")]
pub struct TimeSlot {
    pub id: String,
    pub days: Weekdays,
    pub start: NaiveTime,
    pub end: NaiveTime,
}

/// Wire shape of a time slot; only becomes a `TimeSlot` through `from_parts`.
#[derive(Serialize, Deserialize)]
struct TimeSlotRecord {
    id: String,
    days: Vec<u8>,
    #[serde(with = "hhmm")]
    start: NaiveTime,
    #[serde(with = "hhmm")]
    end: NaiveTime,
}

impl TryFrom<TimeSlotRecord> for TimeSlot {
    type Error = EnrollmentError;

    fn try_from(record: TimeSlotRecord) -> Result<Self, Self::Error> {
        Self::from_parts(
            record.id,
            &record.days,
            (record.start.hour(), record.start.minute()),
            (record.end.hour(), record.end.minute()),
        )
    }
}

impl From<TimeSlot> for TimeSlotRecord {
    fn from(slot: TimeSlot) -> Self {
        Self { id: slot.id, days: slot.days.markers(), start: slot.start, end: slot.end }
    }
}

impl TimeSlot {
    pub fn from_parts(
        id: impl Into<String>,
        markers: &[u8],
        (start_hr, start_min): (u32, u32),
        (end_hr, end_min): (u32, u32),
    ) -> Result<Self, EnrollmentError> {
        let id = id.into();
        let malformed = |what: &str| {
            EnrollmentError::infrastructure(format!("malformed time slot '{}': {}", id, what))
        };

        let days = Weekdays::from_markers(markers).map_err(|e| malformed(&e.to_string()))?;
        let start = NaiveTime::from_hms_opt(start_hr, start_min, 0)
            .ok_or_else(|| malformed("invalid start time"))?;
        let end = NaiveTime::from_hms_opt(end_hr, end_min, 0)
            .ok_or_else(|| malformed("invalid end time"))?;
        if end <= start {
            return Err(malformed("end is not after start"));
        }

        Ok(Self { id, days, start, end })
    }

    /// Half-open overlap on at least one shared weekday.
    /// Back-to-back meetings (one ends when the other starts) do not conflict.
    pub fn conflicts_with(&self, other: &TimeSlot) -> bool {
        self.days.intersects(other.days) && self.start < other.end && self.end > other.start
    }
}

mod hhmm {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer};

    const FORMAT: &str = "%H:%M";

    pub fn serialize<S: Serializer>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&time.format(FORMAT).to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        NaiveTime::parse_from_str(&raw, FORMAT).map_err(serde::de::Error::custom)
    }
}

// ---------------------------------------------------------------------------
// Derived views
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Term {
    pub semester: String,
    pub year: i32,
}

impl Term {
    pub fn contains(&self, semester: &str, year: i32) -> bool {
        self.year == year && self.semester.eq_ignore_ascii_case(semester)
    }
}

/// One enrolled student of a section, as shown to the instructor grading it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct RosterEntry {
    pub student_id: String,
    pub name: String,
    pub dept_name: String,
    pub grade: Option<String>,
}

/// Ledger row joined with its course, as read for transcripts and listings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct TranscriptEntry {
    pub course_id: String,
    pub section_id: String,
    pub title: String,
    pub semester: String,
    pub year: i32,
    pub credits: Decimal,
    pub grade: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CourseGrade {
    pub course_id: String,
    pub section_id: String,
    pub title: String,
    pub semester: String,
    pub year: i32,
    pub credits: Decimal,
    /// Empty while the course is in progress
    pub grade: String,
    pub grade_point: Decimal,
}

impl From<TranscriptEntry> for CourseGrade {
    fn from(entry: TranscriptEntry) -> Self {
        let grade = entry.grade.unwrap_or_default();
        let grade_point = Grade::points_for(&grade);
        Self {
            course_id: entry.course_id,
            section_id: entry.section_id,
            title: entry.title,
            semester: entry.semester,
            year: entry.year,
            credits: entry.credits,
            grade,
            grade_point,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudentSummary {
    pub id: String,
    pub name: String,
    pub dept_name: String,
    pub tot_cred: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transcript {
    pub student: StudentSummary,
    pub courses: Vec<CourseGrade>,
    /// Credits of passed courses
    pub total_credits: Decimal,
    /// Credits of every graded course, the GPA denominator
    pub credits_attempted: Decimal,
    pub gpa: Decimal,
}

impl Transcript {
    pub fn compile(student: &Student, mut entries: Vec<TranscriptEntry>) -> Self {
        entries.sort_by(most_recent_first);

        let mut total_credits = Decimal::ZERO;
        let mut credits_attempted = Decimal::ZERO;
        let mut quality_points = Decimal::ZERO;

        let courses: Vec<CourseGrade> = entries.into_iter().map(CourseGrade::from).collect();
        for course in &courses {
            if course.grade.is_empty() {
                continue;
            }
            credits_attempted += course.credits;
            quality_points += course.credits * course.grade_point;
            if is_passing_mark(Some(&course.grade)) {
                total_credits += course.credits;
            }
        }

        let gpa = if credits_attempted.is_zero() {
            Decimal::ZERO
        } else {
            (quality_points / credits_attempted).round_dp(2)
        };

        Self {
            student: StudentSummary {
                id: student.id.clone(),
                name: student.name.clone(),
                dept_name: student.dept_name.clone(),
                tot_cred: total_credits,
            },
            courses,
            total_credits,
            credits_attempted,
            gpa,
        }
    }
}

fn semester_rank(semester: &str) -> u8 {
    match semester.to_ascii_lowercase().as_str() {
        "winter" => 1,
        "spring" => 2,
        "summer" => 3,
        "fall" | "autumn" => 4,
        _ => 0,
    }
}

pub(crate) fn most_recent_first(a: &TranscriptEntry, b: &TranscriptEntry) -> Ordering {
    b.year
        .cmp(&a.year)
        .then_with(|| semester_rank(&b.semester).cmp(&semester_rank(&a.semester)))
        .then_with(|| a.course_id.cmp(&b.course_id))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionSeats {
    pub section_id: String,
    pub enrolled: i64,
    pub capacity: i64,
    pub available: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slot(id: &str, days: &[u8], start: (u32, u32), end: (u32, u32)) -> TimeSlot {
        TimeSlot::from_parts(id, days, start, end).unwrap()
    }

    fn entry(course: &str, credits: i64, grade: Option<&str>, semester: &str, year: i32) -> TranscriptEntry {
        TranscriptEntry {
            course_id: course.into(),
            section_id: format!("{}-1", course),
            title: format!("{} title", course),
            semester: semester.into(),
            year,
            credits: Decimal::from(credits),
            grade: grade.map(str::to_string),
        }
    }

    fn student() -> Student {
        Student {
            id: "S-1".into(),
            name: "Zhang".into(),
            dept_name: "Comp. Sci.".into(),
            tot_cred: Decimal::from(99),
        }
    }

    #[test]
    fn overlapping_slots_on_shared_day_conflict() {
        let a = slot("A", &[1, 3, 5], (9, 0), (10, 15));
        let b = slot("B", &[3], (10, 0), (11, 0));
        assert!(a.conflicts_with(&b));
        assert!(b.conflicts_with(&a));
    }

    #[test]
    fn back_to_back_slots_do_not_conflict() {
        let a = slot("A", &[2], (9, 0), (10, 0));
        let b = slot("B", &[2], (10, 0), (11, 0));
        assert!(!a.conflicts_with(&b));
        assert!(!b.conflicts_with(&a));
    }

    #[test]
    fn disjoint_days_never_conflict() {
        let a = slot("A", &[1, 3], (9, 0), (12, 0));
        let b = slot("B", &[2, 4], (9, 0), (12, 0));
        assert!(!a.conflicts_with(&b));
    }

    #[test]
    fn conflict_is_symmetric_for_containment() {
        let outer = slot("A", &[4], (8, 0), (12, 0));
        let inner = slot("B", &[4], (9, 30), (10, 0));
        assert_eq!(outer.conflicts_with(&inner), inner.conflicts_with(&outer));
        assert!(outer.conflicts_with(&inner));
    }

    #[test]
    fn rejects_malformed_time_slots() {
        assert!(TimeSlot::from_parts("X", &[8], (9, 0), (10, 0)).is_err());
        assert!(TimeSlot::from_parts("X", &[1], (10, 0), (10, 0)).is_err());
        assert!(TimeSlot::from_parts("X", &[1], (25, 0), (26, 0)).is_err());
    }

    #[test]
    fn weekdays_display_and_markers() {
        let days = Weekdays::from_markers(&[5, 1, 3]).unwrap();
        assert_eq!(days.to_string(), "MWF");
        assert_eq!(days.markers(), vec![1, 3, 5]);
        assert!(!days.contains(2));
    }

    #[test]
    fn time_slot_reads_hour_minute_strings() {
        let parsed: TimeSlot =
            serde_json::from_str(r#"{"id":"T1","days":[2,4],"start":"13:30","end":"14:45"}"#).unwrap();
        assert_eq!(parsed, slot("T1", &[2, 4], (13, 30), (14, 45)));
        let json = serde_json::to_value(&parsed).unwrap();
        assert_eq!(json["start"], "13:30");
        assert_eq!(json["days"], serde_json::json!([2, 4]));
    }

    #[test]
    fn time_slot_deserialization_validates_like_from_parts() {
        let backwards = serde_json::from_str::<TimeSlot>(r#"{"id":"T2","days":[1],"start":"10:00","end":"09:00"}"#);
        assert!(backwards.unwrap_err().to_string().contains("end is not after start"));

        let empty = serde_yaml::from_str::<TimeSlot>("{ id: T3, days: [3], start: \"11:00\", end: \"11:00\" }");
        assert!(empty.is_err());

        let bad_day = serde_json::from_str::<TimeSlot>(r#"{"id":"T4","days":[0],"start":"08:00","end":"09:00"}"#);
        assert!(bad_day.is_err());
    }

    #[test]
    fn grade_points_follow_the_fixed_scale() {
        assert_eq!(Grade::A.points(), Decimal::new(40, 1));
        assert_eq!("B+".parse::<Grade>().unwrap().points(), Decimal::new(33, 1));
        assert_eq!(Grade::points_for("C-"), Decimal::new(17, 1));
        assert_eq!(Grade::points_for("W"), Decimal::ZERO);
        assert!(matches!("E".parse::<Grade>(), Err(EnrollmentError::InvalidGrade(_))));
    }

    #[test]
    fn every_grade_letter_parses_back_to_itself() {
        for grade in Grade::ALL {
            assert_eq!(grade.as_str().parse::<Grade>().unwrap(), grade);
        }
        assert_eq!(Grade::F.as_str(), "F");
        assert_eq!(Grade::F.points(), Decimal::ZERO);
        assert_eq!(Grade::D.points(), Decimal::ONE);
        assert!(!Grade::F.is_passing());
    }

    #[test]
    fn passing_marks() {
        assert!(is_passing_mark(Some("D")));
        assert!(!is_passing_mark(Some("F")));
        assert!(!is_passing_mark(Some("")));
        assert!(!is_passing_mark(None));
    }

    #[test]
    fn gpa_counts_failed_credits_in_the_denominator() {
        let transcript = Transcript::compile(
            &student(),
            vec![
                entry("CS-101", 3, Some("A"), "Fall", 2023),
                entry("CS-190", 4, Some("B+"), "Spring", 2024),
                entry("MU-199", 3, Some("F"), "Spring", 2024),
            ],
        );
        assert_eq!(transcript.gpa, Decimal::new(252, 2));
        assert_eq!(transcript.total_credits, Decimal::from(7));
        assert_eq!(transcript.credits_attempted, Decimal::from(10));
    }

    #[test]
    fn ungraded_rows_are_listed_but_not_averaged() {
        let transcript = Transcript::compile(
            &student(),
            vec![
                entry("CS-101", 4, Some("A-"), "Fall", 2023),
                entry("CS-315", 3, None, "Spring", 2025),
            ],
        );
        assert_eq!(transcript.courses.len(), 2);
        assert_eq!(transcript.gpa, Decimal::new(37, 1));
        assert_eq!(transcript.total_credits, Decimal::from(4));
        assert_eq!(transcript.courses[0].grade, "");
    }

    #[test]
    fn transcript_derives_total_credits_instead_of_cached_value() {
        let transcript = Transcript::compile(&student(), vec![]);
        assert_eq!(transcript.student.tot_cred, Decimal::ZERO);
        assert_eq!(transcript.gpa, Decimal::ZERO);
    }

    #[test]
    fn transcript_orders_most_recent_term_first() {
        let transcript = Transcript::compile(
            &student(),
            vec![
                entry("A", 3, Some("A"), "Spring", 2023),
                entry("B", 3, Some("A"), "Fall", 2023),
                entry("C", 3, Some("A"), "Spring", 2024),
            ],
        );
        let order: Vec<&str> = transcript.courses.iter().map(|c| c.course_id.as_str()).collect();
        assert_eq!(order, vec!["C", "B", "A"]);
    }
}
