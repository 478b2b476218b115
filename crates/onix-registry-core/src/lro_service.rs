//! §4.F — a thin wrapper over [`RegistryRepository`] for LRO creation and
//! lookup. It never mutates an existing LRO; that's the admin engine's job
//! (§4.H).

use std::sync::Arc;

use onix_api::ports::RegistryRepository;
use onix_types::Lro;

use crate::error::LroError;

pub struct LroService {
    repository: Arc<dyn RegistryRepository>,
}

impl LroService {
    pub fn new(repository: Arc<dyn RegistryRepository>) -> Self {
        Self { repository }
    }

    /// Persists a new LRO. The repository enforces `operation_id`
    /// uniqueness; a duplicate surfaces as [`LroError::AlreadyExists`].
    pub async fn create(&self, lro: Lro) -> Result<(), LroError> {
        self.repository.create_lro(lro).await.map_err(LroError::from)
    }

    pub async fn get(&self, operation_id: &str) -> Result<Lro, LroError> {
        self.repository.get_lro(operation_id).await.map_err(LroError::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use onix_testing::InMemoryRegistryRepository;
    use onix_types::LroType;
    use time::OffsetDateTime;

    fn lro(id: &str) -> Lro {
        Lro::new(id, LroType::CreateSubscription, b"{}".to_vec(), OffsetDateTime::now_utc())
    }

    #[tokio::test]
    async fn create_then_get_round_trips() {
        let service = LroService::new(Arc::new(InMemoryRegistryRepository::new()));
        service.create(lro("op1")).await.unwrap();
        let fetched = service.get("op1").await.unwrap();
        assert_eq!(fetched.operation_id, "op1");
    }

    #[tokio::test]
    async fn duplicate_operation_id_is_rejected() {
        let service = LroService::new(Arc::new(InMemoryRegistryRepository::new()));
        service.create(lro("op1")).await.unwrap();
        let err = service.create(lro("op1")).await.unwrap_err();
        assert!(matches!(err, LroError::AlreadyExists(_)));
    }

    #[tokio::test]
    async fn missing_operation_is_not_found() {
        let service = LroService::new(Arc::new(InMemoryRegistryRepository::new()));
        let err = service.get("missing").await.unwrap_err();
        assert!(matches!(err, LroError::NotFound(_)));
    }
}
