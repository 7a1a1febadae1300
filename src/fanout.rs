use std::future::Future;
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;

/// Run `task` for every item with at most `budget` in flight and collect
/// the successful results in completion order.
///
/// Tasks returning `None` and tasks that panic are left out of the result.
/// There is no cancellation: the call returns once every task has finished.
pub async fn fan_out<I, T, F, Fut>(items: I, budget: usize, task: F) -> Vec<T>
where
    I: IntoIterator,
    I::Item: Send + 'static,
    F: Fn(I::Item) -> Fut,
    Fut: Future<Output = Option<T>> + Send + 'static,
    T: Send + 'static,
{
    let semaphore = Arc::new(Semaphore::new(budget.max(1)));
    let mut join_set = JoinSet::new();
    for item in items {
        let semaphore = semaphore.clone();
        let future = task(item);
        join_set.spawn(async move {
            let _permit = semaphore.acquire_owned().await.ok()?;
            future.await
        });
    }

    let mut results = Vec::with_capacity(join_set.len());
    while let Some(joined) = join_set.join_next().await {
        match joined {
            Ok(Some(value)) => results.push(value),
            Ok(None) => {}
            Err(err) => log::warn!("fan-out task failed: {err}"),
        }
    }
    results
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[tokio::test]
    async fn collects_every_result() {
        let mut results = fan_out(1..=50u32, 8, |n| async move { Some(n * 2) }).await;
        results.sort_unstable();
        assert_eq!(results, (1..=50u32).map(|n| n * 2).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn drops_missing_results() {
        let results = fan_out(vec!["a", "", "b"], 4, |name| async move {
            (!name.is_empty()).then(|| name.to_string())
        })
        .await;
        assert_eq!(results.len(), 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn never_exceeds_budget() {
        let active = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));
        let results = fan_out(0..40, 5, |n| {
            let active = active.clone();
            let peak = peak.clone();
            async move {
                let now = active.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(5)).await;
                active.fetch_sub(1, Ordering::SeqCst);
                Some(n)
            }
        })
        .await;
        assert_eq!(results.len(), 40);
        assert!(peak.load(Ordering::SeqCst) <= 5);
    }

    #[tokio::test]
    async fn zero_budget_still_runs() {
        let results = fan_out(vec![1, 2, 3], 0, |n| async move { Some(n) }).await;
        assert_eq!(results.len(), 3);
    }
}
