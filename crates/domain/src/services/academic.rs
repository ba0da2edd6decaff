//! Academic standing of a student, derived from stored attendance and marks.
//!
//! The figures mirror what the registry front-end expects:
//! - `attendance`: share of attendance days marked present, as a percentage
//! - `cgpa`/`sgpa`: mean of all raw mark values divided by ten
//! - `credits`: three per mark record
//! - `greenPoints`: attendance percentage plus the mark mean, rounded

use async_trait::async_trait;
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

use crate::models::{AcademicData, UserRole};

/// Credits granted per recorded mark.
pub const CREDITS_PER_RECORD: i64 = 3;

/// Present and total attendance days for one student.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AttendanceTally {
    pub present: i64,
    pub total: i64,
}

/// Read access to the records the aggregation needs.
#[async_trait]
pub trait AcademicRecordSource: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Role of the user, or `None` if the user does not exist.
    async fn role_of(&self, user_id: Uuid) -> Result<Option<UserRole>, Self::Error>;

    async fn attendance_tally(&self, student_id: Uuid) -> Result<AttendanceTally, Self::Error>;

    /// Raw `marks` of every mark record of the student.
    async fn mark_values(&self, student_id: Uuid) -> Result<Vec<f64>, Self::Error>;
}

#[derive(Debug, Error)]
pub enum AggregationError<E> {
    #[error("User not found")]
    UserNotFound,

    #[error("Academic data is only available for students")]
    NotAStudent,

    #[error(transparent)]
    Source(E),
}

fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

/// Attendance percentage rounded to two decimals; zero when there are no days.
pub fn attendance_percentage(tally: AttendanceTally) -> f64 {
    round_to(raw_percentage(tally), 2)
}

fn raw_percentage(tally: AttendanceTally) -> f64 {
    if tally.total <= 0 {
        0.0
    } else {
        tally.present as f64 / tally.total as f64 * 100.0
    }
}

/// Combines the raw figures into the reported standing.
pub fn summarize(tally: AttendanceTally, marks: &[f64]) -> AcademicData {
    let mean = if marks.is_empty() {
        0.0
    } else {
        marks.iter().sum::<f64>() / marks.len() as f64
    };
    let grade_point = mean / 10.0;
    let attendance = raw_percentage(tally);

    AcademicData {
        attendance: attendance_percentage(tally),
        cgpa: round_to(grade_point, 2),
        sgpa: round_to(grade_point, 2),
        credits: marks.len() as i64 * CREDITS_PER_RECORD,
        // Ties round to even.
        green_points: (attendance + grade_point * 10.0).round_ties_even(),
    }
}

/// Computes [`AcademicData`] for a student through a record source.
pub struct AcademicService<S> {
    source: S,
}

impl<S: AcademicRecordSource> AcademicService<S> {
    pub fn new(source: S) -> Self {
        Self { source }
    }

    pub async fn academic_data(
        &self,
        user_id: Uuid,
    ) -> Result<AcademicData, AggregationError<S::Error>> {
        let role = self
            .source
            .role_of(user_id)
            .await
            .map_err(AggregationError::Source)?
            .ok_or(AggregationError::UserNotFound)?;

        if role != UserRole::Student {
            return Err(AggregationError::NotAStudent);
        }

        let tally = self
            .source
            .attendance_tally(user_id)
            .await
            .map_err(AggregationError::Source)?;
        let marks = self
            .source
            .mark_values(user_id)
            .await
            .map_err(AggregationError::Source)?;

        debug!(
            user_id = %user_id,
            present = tally.present,
            total = tally.total,
            mark_count = marks.len(),
            "Computed academic data"
        );
        Ok(summarize(tally, &marks))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[derive(Debug, Error)]
    #[error("store offline")]
    struct Offline;

    #[derive(Default)]
    struct InMemorySource {
        roles: HashMap<Uuid, UserRole>,
        attendance: HashMap<Uuid, Vec<bool>>,
        marks: HashMap<Uuid, Vec<f64>>,
        offline: bool,
    }

    #[async_trait]
    impl AcademicRecordSource for InMemorySource {
        type Error = Offline;

        async fn role_of(&self, user_id: Uuid) -> Result<Option<UserRole>, Offline> {
            if self.offline {
                return Err(Offline);
            }
            Ok(self.roles.get(&user_id).copied())
        }

        async fn attendance_tally(&self, student_id: Uuid) -> Result<AttendanceTally, Offline> {
            let days = self.attendance.get(&student_id).cloned().unwrap_or_default();
            Ok(AttendanceTally {
                present: days.iter().filter(|p| **p).count() as i64,
                total: days.len() as i64,
            })
        }

        async fn mark_values(&self, student_id: Uuid) -> Result<Vec<f64>, Offline> {
            Ok(self.marks.get(&student_id).cloned().unwrap_or_default())
        }
    }

    #[test]
    fn test_percentage_zero_days() {
        assert_eq!(attendance_percentage(AttendanceTally::default()), 0.0);
    }

    #[test]
    fn test_percentage_rounds_to_two_places() {
        let tally = AttendanceTally {
            present: 2,
            total: 3,
        };
        assert_eq!(attendance_percentage(tally), 66.67);
    }

    #[test]
    fn test_summarize_without_marks() {
        let data = summarize(
            AttendanceTally {
                present: 1,
                total: 4,
            },
            &[],
        );
        assert_eq!(data.attendance, 25.0);
        assert_eq!(data.cgpa, 0.0);
        assert_eq!(data.credits, 0);
        assert_eq!(data.green_points, 25.0);
    }

    #[test]
    fn test_green_points_round_half_even() {
        // 50% attendance plus a mark mean of 72.5 gives 122.5.
        let data = summarize(
            AttendanceTally {
                present: 1,
                total: 2,
            },
            &[72.5],
        );
        assert_eq!(data.green_points, 122.0);
        assert_eq!(data.cgpa, 7.25);
    }

    #[tokio::test]
    async fn test_student_scenario() {
        let student = Uuid::new_v4();
        let mut source = InMemorySource::default();
        source.roles.insert(student, UserRole::Student);
        source
            .attendance
            .insert(student, vec![true, false, true, true, false]);
        source.marks.insert(student, vec![80.0, 90.0]);

        let data = AcademicService::new(source)
            .academic_data(student)
            .await
            .unwrap();

        assert_eq!(data.attendance, 60.0);
        assert_eq!(data.cgpa, 8.5);
        assert_eq!(data.sgpa, 8.5);
        assert_eq!(data.credits, 6);
        assert_eq!(data.green_points, 145.0);
    }

    #[tokio::test]
    async fn test_non_student_rejected() {
        let staff = Uuid::new_v4();
        let mut source = InMemorySource::default();
        source.roles.insert(staff, UserRole::Staff);

        let result = AcademicService::new(source).academic_data(staff).await;
        assert!(matches!(result, Err(AggregationError::NotAStudent)));
    }

    #[tokio::test]
    async fn test_unknown_user() {
        let result = AcademicService::new(InMemorySource::default())
            .academic_data(Uuid::new_v4())
            .await;
        assert!(matches!(result, Err(AggregationError::UserNotFound)));
    }

    #[tokio::test]
    async fn test_source_failure_propagates() {
        let source = InMemorySource {
            offline: true,
            ..Default::default()
        };
        let result = AcademicService::new(source)
            .academic_data(Uuid::new_v4())
            .await;
        assert!(matches!(result, Err(AggregationError::Source(Offline))));
    }

    #[tokio::test]
    async fn test_percentage_bounds_with_generated_days() {
        use fake::{Fake, Faker};

        for _ in 0..20 {
            let student = Uuid::new_v4();
            let days: Vec<bool> = (0..(1..40).fake::<usize>()).map(|_| Faker.fake()).collect();
            let mut source = InMemorySource::default();
            source.roles.insert(student, UserRole::Student);
            source.attendance.insert(student, days);

            let data = AcademicService::new(source)
                .academic_data(student)
                .await
                .unwrap();
            assert!((0.0..=100.0).contains(&data.attendance));
        }
    }
}
