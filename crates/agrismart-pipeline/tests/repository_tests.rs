use agrismart_core::{RequestId, RequestStatus};
use agrismart_pipeline::{InMemoryRepository, RepositoryError, RequestFilter, RequestRepository};
use agrismart_test_utils::{pending_request, request_in};

#[tokio::test]
async fn insert_rejects_duplicates() {
    let repo = InMemoryRepository::new();
    repo.insert(pending_request("REQ-1")).await.unwrap();

    let err = repo.insert(pending_request("REQ-1")).await.unwrap_err();
    assert_eq!(err, RepositoryError::Duplicate(RequestId::from("REQ-1")));
}

#[tokio::test]
async fn save_requires_existing_record() {
    let repo = InMemoryRepository::new();
    let err = repo
        .save(pending_request("REQ-2"), RequestStatus::PendingApproval)
        .await
        .unwrap_err();
    assert_eq!(err, RepositoryError::NotFound(RequestId::from("REQ-2")));

    repo.insert(pending_request("REQ-2")).await.unwrap();
    repo.save(
        request_in("REQ-2", RequestStatus::Approved),
        RequestStatus::PendingApproval,
    )
    .await
    .unwrap();
    let stored = repo.get(&RequestId::from("REQ-2")).await.unwrap().unwrap();
    assert_eq!(stored.status(), RequestStatus::Approved);
}

#[tokio::test]
async fn save_refuses_stale_status() {
    let repo = InMemoryRepository::new();
    repo.insert(pending_request("REQ-3")).await.unwrap();
    repo.save(
        request_in("REQ-3", RequestStatus::Rejected),
        RequestStatus::PendingApproval,
    )
    .await
    .unwrap();

    // A writer that loaded the request before the rejection landed.
    let err = repo
        .save(
            request_in("REQ-3", RequestStatus::Approved),
            RequestStatus::PendingApproval,
        )
        .await
        .unwrap_err();

    assert_eq!(
        err,
        RepositoryError::StatusConflict {
            id: RequestId::from("REQ-3"),
            expected: RequestStatus::PendingApproval,
            stored: RequestStatus::Rejected,
        }
    );
    let stored = repo.get(&RequestId::from("REQ-3")).await.unwrap().unwrap();
    assert_eq!(stored.status(), RequestStatus::Rejected);
}

#[tokio::test]
async fn query_matches_names_crop_region_and_id() {
    let mut other = pending_request("REQ-9");
    other.farmer_name = "Ngozi Okafor".into();
    other.farm_name = "Okafor Cassava".into();
    other.crop_type = "Cassava".into();
    other.location.region = "Littoral".into();

    let repo =
        InMemoryRepository::with_requests([pending_request("REQ-1"), other]).unwrap();

    let ids = |found: Vec<agrismart_core::ScanRequest>| -> Vec<String> {
        found.into_iter().map(|r| r.id.0).collect()
    };

    for query in ["mbarga", "COCOA", "centre", "req-1"] {
        let found = repo
            .list(&RequestFilter::all().with_query(query))
            .await
            .unwrap();
        assert_eq!(ids(found), vec!["REQ-1"], "query {query}");
    }

    let found = repo
        .list(&RequestFilter::all().with_query("  "))
        .await
        .unwrap();
    assert_eq!(found.len(), 2);

    let found = repo
        .list(
            &RequestFilter::all()
                .with_query("cassava")
                .with_status(RequestStatus::Approved),
        )
        .await
        .unwrap();
    assert!(found.is_empty());
}
