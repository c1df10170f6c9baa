use crate::modules::students::model::{
    CreateStudentDto, Student, StudentIdentity, StudentQueryParams,
};
use anyhow::Context;
use homeroom_core::AppError;
use sqlx::PgPool;
use tracing::instrument;

const STUDENT_COLUMNS: &str =
    "id, student_no, name, grade, class_no, number, gender, created_at, updated_at";

pub struct StudentService;

impl StudentService {
    #[instrument(skip(db, dto), fields(student_no = %dto.student_no))]
    pub async fn create_student(db: &PgPool, dto: CreateStudentDto) -> Result<Student, AppError> {
        let query = format!(
            r#"INSERT INTO students (student_no, name, grade, class_no, number, gender)
               VALUES ($1, $2, $3, $4, $5, $6)
               RETURNING {STUDENT_COLUMNS}"#
        );

        let student = sqlx::query_as::<_, Student>(&query)
            .bind(&dto.student_no)
            .bind(&dto.name)
            .bind(dto.grade)
            .bind(dto.class_no)
            .bind(dto.number)
            .bind(dto.gender)
            .fetch_one(db)
            .await
            .map_err(|e| {
                if let sqlx::Error::Database(db_err) = &e
                    && db_err.is_unique_violation()
                {
                    return AppError::conflict(anyhow::anyhow!(
                        "Student with number {} already exists",
                        dto.student_no
                    ))
                    .with_kind("student_no_taken");
                }
                AppError::database(anyhow::Error::from(e))
            })?;

        Ok(student)
    }

    #[instrument(skip(db))]
    pub async fn get_students(
        db: &PgPool,
        filters: &StudentQueryParams,
    ) -> Result<Vec<Student>, AppError> {
        let query = format!(
            r#"SELECT {STUDENT_COLUMNS}
               FROM students
               WHERE ($1::int IS NULL OR grade = $1)
                 AND ($2::int IS NULL OR class_no = $2)
               ORDER BY grade, class_no, number"#
        );

        let students = sqlx::query_as::<_, Student>(&query)
            .bind(filters.grade)
            .bind(filters.class_no)
            .fetch_all(db)
            .await
            .context("Failed to fetch students")
            .map_err(AppError::database)?;

        Ok(students)
    }

    #[instrument(skip(db))]
    pub async fn get_student_by_id(db: &PgPool, id: i64) -> Result<Student, AppError> {
        let query = format!("SELECT {STUDENT_COLUMNS} FROM students WHERE id = $1");

        let student = sqlx::query_as::<_, Student>(&query)
            .bind(id)
            .fetch_optional(db)
            .await
            .context("Failed to fetch student by ID")
            .map_err(AppError::database)?
            .ok_or_else(|| {
                AppError::not_found(anyhow::anyhow!("Student not found"))
                    .with_kind("student_not_found")
            })?;

        Ok(student)
    }

    #[instrument(skip(db))]
    pub async fn find_identity(
        db: &PgPool,
        id: i64,
    ) -> Result<Option<StudentIdentity>, sqlx::Error> {
        sqlx::query_as::<_, StudentIdentity>("SELECT id, gender FROM students WHERE id = $1")
            .bind(id)
            .fetch_optional(db)
            .await
    }

    /// Deleting a student removes their attendance records through the
    /// foreign key's `ON DELETE CASCADE`.
    #[instrument(skip(db))]
    pub async fn delete_student(db: &PgPool, id: i64) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM students WHERE id = $1")
            .bind(id)
            .execute(db)
            .await
            .context("Failed to delete student")
            .map_err(AppError::database)?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(anyhow::anyhow!("Student not found"))
                .with_kind("student_not_found"));
        }

        Ok(())
    }
}
