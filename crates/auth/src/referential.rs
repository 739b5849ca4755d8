use std::future::Future;

use findoc_core::ReferenceId;

use crate::{AuthError, StoreError};

/// Refuse deletion of a reference record that documents still point at.
///
/// `counter` reports how many documents reference `record_id`. The count and
/// the delete that follows are not atomic; a document created in between is
/// not caught here.
pub async fn guard_delete<F, Fut>(record_id: ReferenceId, counter: F) -> Result<(), AuthError>
where
    F: FnOnce(ReferenceId) -> Fut,
    Fut: Future<Output = Result<u64, StoreError>>,
{
    let count = counter(record_id).await?;
    if count > 0 {
        tracing::info!(record_id = %record_id, count, "delete refused: record still referenced");
        return Err(AuthError::Referenced { count });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unreferenced_record_may_be_deleted() {
        let id = ReferenceId::new();
        assert_eq!(guard_delete(id, |_| async { Ok(0) }).await, Ok(()));
    }

    #[tokio::test]
    async fn referenced_record_reports_count() {
        let id = ReferenceId::new();
        let err = guard_delete(id, |seen| async move {
            assert_eq!(seen, id);
            Ok(4)
        })
        .await
        .unwrap_err();

        assert_eq!(err, AuthError::Referenced { count: 4 });
        assert_eq!(err.to_string(), "cannot delete: referenced by 4 documents");
    }

    #[tokio::test]
    async fn counter_failure_propagates() {
        let id = ReferenceId::new();
        let err = guard_delete(id, |_| async { Err(StoreError::backend("down")) })
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::Store(StoreError::Backend(_))));
    }
}
