//! Student identity lookup consumed by the attendance ledger.

use sqlx::PgPool;
use std::future::Future;

use crate::modules::students::model::StudentIdentity;
use crate::modules::students::service::StudentService;

pub trait StudentDirectory: Send + Sync {
    /// Returns `None` when no student has this id.
    fn get_student(
        &self,
        id: i64,
    ) -> impl Future<Output = Result<Option<StudentIdentity>, sqlx::Error>> + Send;
}

#[derive(Clone, Debug)]
pub struct PgStudentDirectory {
    db: PgPool,
}

impl PgStudentDirectory {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

impl StudentDirectory for PgStudentDirectory {
    async fn get_student(&self, id: i64) -> Result<Option<StudentIdentity>, sqlx::Error> {
        StudentService::find_identity(&self.db, id).await
    }
}
