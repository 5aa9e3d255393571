//! Review engine integration tests
//!
//! Every test runs against the in-memory remote store and an in-memory
//! SQLite cache; no external services are needed.
//!
//! Run with: cargo test -p integration-tests --test review_flow_tests

use std::sync::Arc;
use std::time::Duration;

use integration_tests::{assert_close, base_time, ReviewBuilder, TestHarness};
use review_common::AppConfig;
use review_core::{
    AuditAction, LocalReviewCache, RemoteFailure, ReplyFilter, ReviewFilter, ReviewId, ReviewSort,
    ReviewStatus, VendorId, VendorIdentity,
};
use review_remote::InMemoryReviewStore;
use review_service::{
    FlagRequest, ModerationService, QueryService, ReplyRequest, ReplyService, ServiceContext,
    ServiceError, SoftDeleteRequest, StatsService, SyncCoordinator,
};

fn ids(records: &[review_core::ReviewRecord]) -> Vec<&str> {
    records.iter().map(|r| r.review_id.as_str()).collect()
}

// ============================================================================
// Aggregation
// ============================================================================

#[tokio::test]
async fn test_five_five_four_scenario() -> anyhow::Result<()> {
    let h = TestHarness::start().await?;
    let reviews = [
        ReviewBuilder::new(&h.vendor, "r1", 5.0).days_ago(1).build(),
        ReviewBuilder::new(&h.vendor, "r2", 5.0).days_ago(2).build(),
        ReviewBuilder::new(&h.vendor, "r3", 4.0).days_ago(3).build(),
    ];
    let aggregate = h.seed_and_refresh(&reviews).await?;

    assert_eq!(aggregate.total_reviews, 3);
    assert_eq!(aggregate.count_for(4), 1);
    assert_eq!(aggregate.count_for(5), 2);
    assert_close(aggregate.average_rating, 4.667);

    let outcome = ModerationService::new(&h.ctx)
        .soft_delete(&h.vendor, &ReviewId::new("r3"), SoftDeleteRequest::default())
        .await?;
    assert!(outcome.aggregate_synced);

    let aggregate = QueryService::new(&h.ctx).aggregate(&h.vendor).await?;
    assert_eq!(aggregate.total_reviews, 2);
    assert_eq!(aggregate.histogram, [0, 0, 0, 0, 2]);
    assert_close(aggregate.average_rating, 5.0);
    assert_eq!(aggregate.thirty_day_count, 2);
    assert_close(aggregate.thirty_day_average, 5.0);
    aggregate.check_invariants()?;

    Ok(())
}

#[tokio::test]
async fn test_recompute_is_byte_identical() -> anyhow::Result<()> {
    let h = TestHarness::start().await?;
    h.seed(&[
        ReviewBuilder::new(&h.vendor, "a", 4.2).days_ago(3).build(),
        ReviewBuilder::new(&h.vendor, "b", 1.0).days_ago(31).build(),
        ReviewBuilder::new(&h.vendor, "c", 3.7).days_ago(12).build(),
    ])
    .await;

    let stats = StatsService::new(&h.ctx);
    let first = serde_json::to_vec(&stats.recompute(&h.vendor).await?)?;
    let second = serde_json::to_vec(&stats.recompute(&h.vendor).await?)?;
    assert_eq!(first, second);

    Ok(())
}

#[tokio::test]
async fn test_lazy_aggregate_creation() {
    let h = TestHarness::start().await.unwrap();
    h.seed(&[
        ReviewBuilder::new(&h.vendor, "a", 5.0).build(),
        ReviewBuilder::new(&h.vendor, "b", 2.0).build(),
    ])
    .await;

    // Nothing pulled yet: zero-valued, not an error
    let empty = QueryService::new(&h.ctx).aggregate(&h.vendor).await.unwrap();
    assert!(empty.is_empty());

    let pulled = SyncCoordinator::new(&h.ctx)
        .pull_aggregate(&h.vendor)
        .await
        .unwrap();
    assert!(pulled.is_empty());
    assert!(h.remote.aggregate_document(&h.vendor).await.is_none());

    // First rating-relevant mutation builds the document from the reviews
    let outcome = ModerationService::new(&h.ctx)
        .soft_delete(&h.vendor, &ReviewId::new("b"), SoftDeleteRequest::default())
        .await
        .unwrap();
    let aggregate = outcome.aggregate.unwrap();
    assert_eq!(aggregate.total_reviews, 1);
    assert_eq!(aggregate.count_for(5), 1);

    let doc = h.remote.aggregate_document(&h.vendor).await.unwrap();
    assert_eq!(doc.total_reviews, 1);
}

// ============================================================================
// Write-through
// ============================================================================

#[tokio::test]
async fn test_soft_delete_remote_failure_changes_nothing() {
    let h = TestHarness::start().await.unwrap();
    let before = h
        .seed_and_refresh(&[
            ReviewBuilder::new(&h.vendor, "a", 5.0).build(),
            ReviewBuilder::new(&h.vendor, "b", 3.0).build(),
        ])
        .await
        .unwrap();

    h.remote.fail_next_updates(1);
    let err = ModerationService::new(&h.ctx)
        .soft_delete(&h.vendor, &ReviewId::new("b"), SoftDeleteRequest::with_reason("spam"))
        .await
        .unwrap_err();
    assert!(err.is_retryable());

    let cached = QueryService::new(&h.ctx)
        .get(&h.vendor, &ReviewId::new("b"))
        .await
        .unwrap();
    assert_eq!(cached.status, ReviewStatus::Active);
    assert_eq!(
        QueryService::new(&h.ctx).aggregate(&h.vendor).await.unwrap(),
        before
    );
    assert_eq!(h.remote.audit_len(&h.vendor).await, 0);

    let doc = h
        .remote
        .review_document(&h.vendor, &ReviewId::new("b"))
        .await
        .unwrap();
    assert_eq!(doc.status, "ACTIVE");
}

#[tokio::test]
async fn test_soft_delete_hides_review_everywhere() {
    let h = TestHarness::start().await.unwrap();
    h.seed_and_refresh(&[
        ReviewBuilder::new(&h.vendor, "a", 5.0).days_ago(1).build(),
        ReviewBuilder::new(&h.vendor, "b", 3.0).days_ago(2).build(),
    ])
    .await
    .unwrap();

    ModerationService::new(&h.ctx)
        .soft_delete(&h.vendor, &ReviewId::new("a"), SoftDeleteRequest::default())
        .await
        .unwrap();

    let query = QueryService::new(&h.ctx);
    let listed = query.list(&h.vendor, &ReviewFilter::default()).await.unwrap();
    assert_eq!(ids(&listed), vec!["b"]);

    // Still fetchable by id
    let hidden = query.get(&h.vendor, &ReviewId::new("a")).await.unwrap();
    assert_eq!(hidden.status, ReviewStatus::Hidden);

    // A fresh pull agrees with the mirrored cache
    SyncCoordinator::new(&h.ctx).pull_reviews(&h.vendor).await.unwrap();
    let listed = query.list(&h.vendor, &ReviewFilter::default()).await.unwrap();
    assert_eq!(ids(&listed), vec!["b"]);

    let history = ModerationService::new(&h.ctx).history(&h.vendor).await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].action(), AuditAction::SoftDelete);
}

#[tokio::test]
async fn test_aggregate_follow_up_failure_is_reported() {
    let h = TestHarness::start().await.unwrap();
    let before = h
        .seed_and_refresh(&[
            ReviewBuilder::new(&h.vendor, "a", 5.0).build(),
            ReviewBuilder::new(&h.vendor, "b", 1.0).build(),
        ])
        .await
        .unwrap();

    h.remote.fail_next_aggregate_writes(1);
    let outcome = ModerationService::new(&h.ctx)
        .soft_delete(&h.vendor, &ReviewId::new("b"), SoftDeleteRequest::default())
        .await
        .unwrap();

    assert!(!outcome.aggregate_synced);
    assert!(outcome.aggregate.is_none());
    assert_eq!(outcome.review.status, ReviewStatus::Hidden);
    assert_eq!(
        QueryService::new(&h.ctx).aggregate(&h.vendor).await.unwrap(),
        before
    );

    // Recompute repairs the drift
    let repaired = StatsService::new(&h.ctx).recompute(&h.vendor).await.unwrap();
    assert_eq!(repaired.total_reviews, 1);
    assert_eq!(
        QueryService::new(&h.ctx).aggregate(&h.vendor).await.unwrap(),
        repaired
    );
}

#[tokio::test]
async fn test_soft_delete_of_reported_review_is_invalid() -> anyhow::Result<()> {
    let h = TestHarness::start().await?;
    h.seed_and_refresh(&[
        ReviewBuilder::new(&h.vendor, "a", 5.0).build(),
        ReviewBuilder::new(&h.vendor, "r", 1.0)
            .status(ReviewStatus::Reported)
            .build(),
    ])
    .await?;
    let calls = h.remote.call_count();

    let err = ModerationService::new(&h.ctx)
        .soft_delete(&h.vendor, &ReviewId::new("r"), SoftDeleteRequest::default())
        .await
        .unwrap_err();

    assert!(matches!(err, ServiceError::InvalidTransition(_)));
    assert_eq!(h.remote.call_count(), calls);
    assert_eq!(h.remote.audit_len(&h.vendor).await, 0);
    let doc = h
        .remote
        .review_document(&h.vendor, &ReviewId::new("r"))
        .await
        .unwrap();
    assert_eq!(doc.status, "REPORTED");

    Ok(())
}

#[tokio::test]
async fn test_blank_reply_is_rejected_before_network() -> anyhow::Result<()> {
    let h = TestHarness::start().await?;
    // Not pulled, so a valid request would have to fetch the review first
    h.seed(&[ReviewBuilder::new(&h.vendor, "a", 4.0).build()]).await;
    let calls = h.remote.call_count();

    let err = ReplyService::new(&h.ctx)
        .add(&h.vendor, &ReviewId::new("a"), ReplyRequest::new("   "))
        .await
        .unwrap_err();

    assert_eq!(err.error_code(), "VALIDATION_ERROR");
    assert_eq!(h.remote.call_count(), calls);

    Ok(())
}

// ============================================================================
// Replies
// ============================================================================

#[tokio::test]
async fn test_reply_lifecycle() {
    let h = TestHarness::start().await.unwrap();
    h.seed_and_refresh(&[
        ReviewBuilder::new(&h.vendor, "a", 4.0).build(),
        ReviewBuilder::new(&h.vendor, "b", 2.0).build(),
    ])
    .await
    .unwrap();
    let replies = ReplyService::new(&h.ctx);
    let id = ReviewId::new("a");

    let added = replies
        .add(&h.vendor, &id, ReplyRequest::new("Thanks for visiting"))
        .await
        .unwrap();
    let created_at = added.review.reply.as_ref().unwrap().created_at;
    assert!(added.aggregate.is_none());

    let err = replies
        .add(&h.vendor, &id, ReplyRequest::new("Second reply"))
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::InvalidTransition(_)));

    let with_reply = QueryService::new(&h.ctx)
        .list(
            &h.vendor,
            &ReviewFilter::default().with_reply(ReplyFilter::WithReply),
        )
        .await
        .unwrap();
    assert_eq!(ids(&with_reply), vec!["a"]);

    h.clock.advance(chrono::Duration::hours(2));
    let edited = replies
        .edit(&h.vendor, &id, ReplyRequest::new("Thanks, see you soon"))
        .await
        .unwrap();
    let reply = edited.review.reply.unwrap();
    assert!(reply.is_edited());
    assert_eq!(reply.created_at, created_at);
    assert_eq!(reply.edited_at, Some(base_time() + chrono::Duration::hours(2)));

    let doc = h.remote.review_document(&h.vendor, &id).await.unwrap();
    assert!(doc.vendor_reply.unwrap().is_edited);

    replies.delete(&h.vendor, &id).await.unwrap();
    let cached = QueryService::new(&h.ctx).get(&h.vendor, &id).await.unwrap();
    assert!(cached.reply.is_none());
    assert!(h
        .remote
        .review_document(&h.vendor, &id)
        .await
        .unwrap()
        .vendor_reply
        .is_none());

    let err = replies.delete(&h.vendor, &id).await.unwrap_err();
    assert_eq!(err, ServiceError::not_found("Reply", "a"));
}

// ============================================================================
// Sync
// ============================================================================

#[tokio::test]
async fn test_pull_timeout_keeps_cached_reviews() {
    let h = TestHarness::start().await.unwrap();
    h.seed(&[
        ReviewBuilder::new(&h.vendor, "a", 5.0).build(),
        ReviewBuilder::new(&h.vendor, "b", 4.0).build(),
        ReviewBuilder::new(&h.vendor, "c", 3.0).build(),
    ])
    .await;
    let sync = SyncCoordinator::new(&h.ctx);
    assert_eq!(sync.pull_reviews(&h.vendor).await.unwrap(), 3);

    h.seed(&[ReviewBuilder::new(&h.vendor, "d", 2.0).build()]).await;
    h.remote.set_latency(Some(Duration::from_secs(2)));
    let err = sync.pull_reviews(&h.vendor).await.unwrap_err();
    assert_eq!(err, ServiceError::RemoteUnavailable(RemoteFailure::Timeout));

    let cached = QueryService::new(&h.ctx)
        .list(&h.vendor, &ReviewFilter::default())
        .await
        .unwrap();
    assert_eq!(cached.len(), 3);

    h.remote.set_latency(None);
    h.remote.set_offline(true);
    let err = sync.refresh(&h.vendor).await.unwrap_err();
    assert_eq!(err.error_code(), "REMOTE_OFFLINE");
    assert_eq!(
        h.cache.list_active(&h.vendor, &ReviewFilter::default()).await.unwrap().len(),
        3
    );

    h.remote.set_offline(false);
    assert_eq!(sync.pull_reviews(&h.vendor).await.unwrap(), 4);
}

#[tokio::test]
async fn test_connect_from_config() {
    let lookup = |key: &str| match key {
        "REVIEW_CACHE_URL" => Some("sqlite::memory:".to_string()),
        "REMOTE_TIMEOUT_MS" => Some("500".to_string()),
        _ => None,
    };
    let config = AppConfig::from_lookup(lookup).unwrap();
    let remote = InMemoryReviewStore::new();
    let ctx = ServiceContext::connect(&config, Arc::new(remote.clone()))
        .await
        .unwrap();
    assert_eq!(ctx.settings().remote_timeout, Duration::from_millis(500));

    let vendor = VendorId::new("configured-vendor");
    remote
        .seed_review(&ReviewBuilder::new(&vendor, "a", 5.0).build())
        .await;

    let summary = SyncCoordinator::new(&ctx).refresh(&vendor).await.unwrap();
    assert_eq!(summary.reviews, 1);
    assert!(summary.aggregate.is_empty());
}

// ============================================================================
// Multiple devices
// ============================================================================

#[tokio::test]
async fn test_stale_device_cannot_hide_twice() -> anyhow::Result<()> {
    let h = TestHarness::start().await?;
    h.seed_and_refresh(&[
        ReviewBuilder::new(&h.vendor, "a", 4.0).days_ago(1).build(),
        ReviewBuilder::new(&h.vendor, "b", 4.0).days_ago(2).build(),
        ReviewBuilder::new(&h.vendor, "c", 5.0).days_ago(3).build(),
    ])
    .await?;
    let other = h.second_device().await?;
    SyncCoordinator::new(&other).refresh(&h.vendor).await?;

    let id = ReviewId::new("a");
    ModerationService::new(&other)
        .soft_delete(&h.vendor, &id, SoftDeleteRequest::with_reason("spam"))
        .await?;

    // This device still caches "a" as active
    let err = ModerationService::new(&h.ctx)
        .soft_delete(&h.vendor, &id, SoftDeleteRequest::with_reason("spam"))
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::InvalidTransition(_)));

    assert_eq!(h.remote.audit_len(&h.vendor).await, 1);
    let aggregate = StatsService::new(&other).aggregate(&h.vendor).await?;
    assert_eq!(aggregate.histogram, [0, 0, 0, 1, 1]);
    assert_eq!(aggregate.total_reviews, 2);
    let doc = h.remote.aggregate_document(&h.vendor).await.unwrap();
    assert_eq!(doc.total_reviews, 2);

    let query = QueryService::new(&h.ctx);
    assert_eq!(query.get(&h.vendor, &id).await?.status, ReviewStatus::Hidden);
    assert_eq!(
        ids(&query.list(&h.vendor, &ReviewFilter::default()).await?),
        vec!["b", "c"]
    );

    Ok(())
}

#[tokio::test]
async fn test_stale_device_cannot_overwrite_reply() -> anyhow::Result<()> {
    let h = TestHarness::start().await?;
    h.seed_and_refresh(&[ReviewBuilder::new(&h.vendor, "a", 5.0).build()])
        .await?;
    let other = h.second_device().await?;
    let id = ReviewId::new("a");

    ReplyService::new(&other)
        .add(&h.vendor, &id, ReplyRequest::new("first"))
        .await?;

    let err = ReplyService::new(&h.ctx)
        .add(&h.vendor, &id, ReplyRequest::new("second"))
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::InvalidTransition(_)));

    let doc = h.remote.review_document(&h.vendor, &id).await.unwrap();
    assert_eq!(doc.vendor_reply.unwrap().text, "first");
    assert_eq!(h.remote.audit_len(&h.vendor).await, 1);

    // The refreshed row lets this device edit the reply it now sees
    h.clock.advance(chrono::Duration::minutes(5));
    let edited = ReplyService::new(&h.ctx)
        .edit(&h.vendor, &id, ReplyRequest::new("first, edited"))
        .await?;
    assert_eq!(edited.review.reply.unwrap().text, "first, edited");

    Ok(())
}

#[tokio::test]
async fn test_stale_edit_targets_current_reply() -> anyhow::Result<()> {
    let h = TestHarness::start().await?;
    h.seed_and_refresh(&[ReviewBuilder::new(&h.vendor, "a", 4.0).build()])
        .await?;
    let id = ReviewId::new("a");

    ReplyService::new(&h.ctx)
        .add(&h.vendor, &id, ReplyRequest::new("orig"))
        .await?;

    let other = h.second_device().await?;
    SyncCoordinator::new(&other).refresh(&h.vendor).await?;
    ReplyService::new(&other).delete(&h.vendor, &id).await?;
    h.clock.advance(chrono::Duration::hours(1));
    ReplyService::new(&other)
        .add(&h.vendor, &id, ReplyRequest::new("newer"))
        .await?;
    let replaced_at = base_time() + chrono::Duration::hours(1);

    // This device still caches "orig"
    h.clock.advance(chrono::Duration::minutes(5));
    let outcome = ReplyService::new(&h.ctx)
        .edit(&h.vendor, &id, ReplyRequest::new("edited"))
        .await?;

    let doc = h.remote.review_document(&h.vendor, &id).await.unwrap();
    let remote_reply = doc.vendor_reply.unwrap();
    assert_eq!(remote_reply.text, "edited");
    assert_eq!(remote_reply.created_at, replaced_at.timestamp_millis());
    assert!(remote_reply.is_edited);

    let committed = outcome.review.reply.unwrap();
    assert_eq!(committed.created_at, replaced_at);
    let cached = h.cache.get_review(&h.vendor, &id).await?.unwrap();
    assert_eq!(cached.reply, Some(committed));

    Ok(())
}

#[tokio::test]
async fn test_stale_device_mirrors_remote_changes() -> anyhow::Result<()> {
    let h = TestHarness::start().await?;
    h.seed_and_refresh(&[ReviewBuilder::new(&h.vendor, "a", 3.0).build()])
        .await?;
    let other = h.second_device().await?;
    let id = ReviewId::new("a");

    ReplyService::new(&other)
        .add(&h.vendor, &id, ReplyRequest::new("hello"))
        .await?;

    h.clock.advance(chrono::Duration::minutes(1));
    ModerationService::new(&h.ctx)
        .flag(&h.vendor, &id, FlagRequest::new("rude"))
        .await?;

    let cached = h.cache.get_review(&h.vendor, &id).await?.unwrap();
    assert!(cached.flagged);
    assert_eq!(cached.reply.unwrap().text, "hello");
    assert_eq!(
        cached.last_synced_at,
        Some(base_time() + chrono::Duration::minutes(1))
    );

    Ok(())
}

// ============================================================================
// Queries
// ============================================================================

#[tokio::test]
async fn test_filters_and_ordering() {
    let h = TestHarness::start().await.unwrap();
    h.seed_and_refresh(&[
        ReviewBuilder::new(&h.vendor, "a", 5.0)
            .days_ago(1)
            .text("Best tacos in town")
            .customer("Alex")
            .helpful(3)
            .build(),
        ReviewBuilder::new(&h.vendor, "b", 2.0)
            .days_ago(2)
            .text("Cold fries")
            .customer("Blair")
            .helpful(10)
            .build(),
        ReviewBuilder::new(&h.vendor, "c", 4.4)
            .days_ago(5)
            .text("Tacos were fine")
            .customer("Casey")
            .build(),
        ReviewBuilder::new(&h.vendor, "d", 3.6)
            .days_ago(10)
            .text("Long queue")
            .anonymous()
            .helpful(1)
            .build(),
    ])
    .await
    .unwrap();
    let query = QueryService::new(&h.ctx);
    let list = |filter: ReviewFilter| {
        let query = &query;
        let vendor = h.vendor.clone();
        async move { query.list(&vendor, &filter).await.unwrap() }
    };

    assert_eq!(ids(&list(ReviewFilter::default()).await), vec!["a", "b", "c", "d"]);
    assert_eq!(
        ids(&list(ReviewFilter::default().sorted_by(ReviewSort::Oldest)).await),
        vec!["d", "c", "b", "a"]
    );
    assert_eq!(
        ids(&list(ReviewFilter::default().sorted_by(ReviewSort::MostHelpful)).await),
        vec!["b", "a", "d", "c"]
    );
    assert_eq!(
        ids(&list(ReviewFilter::default().sorted_by(ReviewSort::HighestRated)).await),
        vec!["a", "c", "d", "b"]
    );

    // 4.4 and 3.6 both land in the 4 bucket
    assert_eq!(ids(&list(ReviewFilter::default().with_star(4)).await), vec!["c", "d"]);

    assert_eq!(
        ids(&list(ReviewFilter::default().with_search("TACOS")).await),
        vec!["a", "c"]
    );
    assert_eq!(ids(&list(ReviewFilter::default().with_search("blair")).await), vec!["b"]);

    assert_eq!(ids(&list(ReviewFilter::default().page(2, 1)).await), vec!["b", "c"]);

    ModerationService::new(&h.ctx)
        .flag(&h.vendor, &ReviewId::new("c"), FlagRequest::new("fake review"))
        .await
        .unwrap();
    assert_eq!(ids(&list(ReviewFilter::default().flagged_only()).await), vec!["c"]);

    // Flagging leaves the aggregate alone
    assert_eq!(query.aggregate(&h.vendor).await.unwrap().total_reviews, 4);
}

// ============================================================================
// Identity
// ============================================================================

#[tokio::test]
async fn test_not_authenticated_before_network() {
    let h = TestHarness::start().await.unwrap();
    h.seed_and_refresh(&[ReviewBuilder::new(&h.vendor, "a", 5.0).build()])
        .await
        .unwrap();
    let id = ReviewId::new("a");

    h.ctx.sign_out();
    let calls = h.remote.call_count();

    let err = ModerationService::new(&h.ctx)
        .soft_delete(&h.vendor, &id, SoftDeleteRequest::default())
        .await
        .unwrap_err();
    assert_eq!(err.error_code(), "NOT_AUTHENTICATED");

    let err = ReplyService::new(&h.ctx)
        .add(&h.vendor, &id, ReplyRequest::new("Hello"))
        .await
        .unwrap_err();
    assert_eq!(err.error_code(), "NOT_AUTHENTICATED");

    let err = ModerationService::new(&h.ctx).history(&h.vendor).await.unwrap_err();
    assert_eq!(err.error_code(), "NOT_AUTHENTICATED");

    // Signed in as someone else
    h.ctx
        .sign_in(VendorIdentity::new(VendorId::new("other-vendor"), "Other Van"));
    let err = ModerationService::new(&h.ctx)
        .flag(&h.vendor, &id, FlagRequest::new("spam"))
        .await
        .unwrap_err();
    assert_eq!(err.error_code(), "NOT_AUTHENTICATED");

    assert_eq!(h.remote.call_count(), calls);

    // Reads need no identity
    assert!(QueryService::new(&h.ctx).get(&h.vendor, &id).await.is_ok());
}

// ============================================================================
// Concurrency
// ============================================================================

#[tokio::test]
async fn test_same_review_mutations_are_serialized() {
    let h = TestHarness::start().await.unwrap();
    h.seed_and_refresh(&[
        ReviewBuilder::new(&h.vendor, "a", 5.0).build(),
        ReviewBuilder::new(&h.vendor, "b", 4.0).build(),
    ])
    .await
    .unwrap();
    h.remote.set_latency(Some(Duration::from_millis(20)));

    let moderation = ModerationService::new(&h.ctx);
    let id = ReviewId::new("a");
    let (first, second) = futures::join!(
        moderation.soft_delete(&h.vendor, &id, SoftDeleteRequest::default()),
        moderation.soft_delete(&h.vendor, &id, SoftDeleteRequest::default()),
    );

    let results = [first, second];
    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    assert!(results
        .iter()
        .any(|r| matches!(r, Err(ServiceError::InvalidTransition(_)))));
    assert_eq!(h.remote.audit_len(&h.vendor).await, 1);

    let replies = ReplyService::new(&h.ctx);
    let id = ReviewId::new("b");
    let outcomes = futures::future::join_all(
        ["one", "two", "three"].map(|text| replies.add(&h.vendor, &id, ReplyRequest::new(text))),
    )
    .await;
    assert_eq!(outcomes.iter().filter(|r| r.is_ok()).count(), 1);
    assert_eq!(h.remote.audit_len(&h.vendor).await, 2);
    assert!(h.ctx.locks().is_empty());
}

#[tokio::test]
async fn test_different_reviews_proceed_concurrently() {
    let h = TestHarness::start().await.unwrap();
    h.seed_and_refresh(&[
        ReviewBuilder::new(&h.vendor, "a", 5.0).build(),
        ReviewBuilder::new(&h.vendor, "b", 4.0).build(),
    ])
    .await
    .unwrap();
    h.remote.set_latency(Some(Duration::from_millis(200)));

    let replies = ReplyService::new(&h.ctx);
    let (id_a, id_b) = (ReviewId::new("a"), ReviewId::new("b"));
    let started = std::time::Instant::now();
    let (a, b) = futures::join!(
        replies.add(&h.vendor, &id_a, ReplyRequest::new("Thanks A")),
        replies.add(&h.vendor, &id_b, ReplyRequest::new("Thanks B")),
    );
    a.unwrap();
    b.unwrap();

    // One remote write each; run back to back they would take 400ms
    assert!(started.elapsed() < Duration::from_millis(380));
}

#[tokio::test]
async fn test_concurrent_soft_deletes_keep_aggregate_exact() -> anyhow::Result<()> {
    let h = TestHarness::start().await?;
    h.seed_and_refresh(&[
        ReviewBuilder::new(&h.vendor, "a", 4.0).days_ago(1).build(),
        ReviewBuilder::new(&h.vendor, "b", 4.0).days_ago(2).build(),
        ReviewBuilder::new(&h.vendor, "c", 5.0).days_ago(3).build(),
    ])
    .await?;
    h.remote.set_latency(Some(Duration::from_millis(20)));

    let moderation = ModerationService::new(&h.ctx);
    let (id_a, id_b) = (ReviewId::new("a"), ReviewId::new("b"));
    let (a, b) = futures::join!(
        moderation.soft_delete(&h.vendor, &id_a, SoftDeleteRequest::default()),
        moderation.soft_delete(&h.vendor, &id_b, SoftDeleteRequest::default()),
    );
    assert!(a?.aggregate_synced);
    assert!(b?.aggregate_synced);
    h.remote.set_latency(None);

    let cached = QueryService::new(&h.ctx).aggregate(&h.vendor).await?;
    assert_eq!(cached.total_reviews, 1);
    assert_eq!(cached.histogram, [0, 0, 0, 0, 1]);
    assert_eq!(cached.thirty_day_count, 1);
    assert_close(cached.thirty_day_average, 5.0);
    cached.check_invariants()?;

    let recomputed = StatsService::new(&h.ctx).recompute(&h.vendor).await?;
    assert_eq!(recomputed.histogram, cached.histogram);
    assert!(h.ctx.aggregate_locks().is_empty());

    Ok(())
}
