use std::sync::Arc;

use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};

use crate::{
    errors::{AppError, AppResult},
    models::domain::{Attempt, Certificate, Quiz},
    repositories::{AttemptRepository, CertificateRepository},
};

pub struct CertificateService {
    certificate_repository: Arc<dyn CertificateRepository>,
    attempt_repository: Arc<dyn AttemptRepository>,
    prefix: String,
}

impl CertificateService {
    pub fn new(
        certificate_repository: Arc<dyn CertificateRepository>,
        attempt_repository: Arc<dyn AttemptRepository>,
        prefix: String,
    ) -> Self {
        Self {
            certificate_repository,
            attempt_repository,
            prefix,
        }
    }

    /// Issue a certificate for a passed attempt. Idempotent: if one was
    /// already recorded for this attempt it is returned as-is, so a
    /// submit followed by a manual-grade completion cannot double-issue.
    pub async fn issue_for_attempt(
        &self,
        quiz: &Quiz,
        attempt: &mut Attempt,
    ) -> AppResult<Certificate> {
        if !attempt.passed {
            return Err(AppError::CertificateIneligible(
                "Attempt did not pass".to_string(),
            ));
        }
        if !quiz.generate_certificate {
            return Err(AppError::CertificateIneligible(
                "Quiz does not issue certificates".to_string(),
            ));
        }

        if let Some(existing) = self
            .certificate_repository
            .find_by_attempt(attempt.id)
            .await?
        {
            attempt.certificate_id = Some(existing.id);
            return Ok(existing);
        }

        let issued_at = Utc::now();
        let certificate = self
            .certificate_repository
            .create(Certificate {
                id: 0,
                certificate_number: self.certificate_number(quiz.id, attempt.id, issued_at),
                quiz_id: quiz.id,
                attempt_id: attempt.id,
                user_id: attempt.user_id.clone(),
                issued_at,
            })
            .await?;

        attempt.certificate_id = Some(certificate.id);
        self.attempt_repository.update(attempt.clone()).await?;

        log::info!(
            "Issued certificate {} for attempt {} on quiz {}",
            certificate.certificate_number,
            attempt.id,
            quiz.id
        );

        Ok(certificate)
    }

    pub async fn find_for_attempt(&self, attempt_id: i64) -> AppResult<Certificate> {
        self.certificate_repository
            .find_by_attempt(attempt_id)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!("No certificate for attempt '{}'", attempt_id))
            })
    }

    fn certificate_number(&self, quiz_id: i64, attempt_id: i64, issued_at: DateTime<Utc>) -> String {
        let digest = Sha256::digest(
            format!("{}:{}:{}", quiz_id, attempt_id, issued_at.timestamp_millis()).as_bytes(),
        );
        let suffix: String = digest
            .iter()
            .take(4)
            .map(|byte| format!("{:02X}", byte))
            .collect();

        format!("{}-{:06}-{:06}-{}", self.prefix, quiz_id, attempt_id, suffix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn certificate_number_embeds_quiz_and_attempt() {
        let service = certificate_number_fixture();
        let number = service.certificate_number(3, 17, Utc::now());

        assert!(number.starts_with("CERT-000003-000017-"));
        let suffix = number.rsplit('-').next().unwrap();
        assert_eq!(suffix.len(), 8);
        assert!(suffix.chars().all(|c| c.is_ascii_hexdigit()));
    }

    fn certificate_number_fixture() -> CertificateService {
        use crate::test_utils::in_memory::{InMemoryAttemptRepository, InMemoryCertificateRepository};

        CertificateService::new(
            Arc::new(InMemoryCertificateRepository::new()),
            Arc::new(InMemoryAttemptRepository::new()),
            "CERT".to_string(),
        )
    }
}
