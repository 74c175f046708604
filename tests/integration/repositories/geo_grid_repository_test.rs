// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::super::helpers::setup_db;
use auditrs::domain::models::geo_grid::{
    CompetitorSample, GeoGridScan, GeoGridStatus, GridPoint, KeywordRanking,
};
use auditrs::domain::repositories::geo_grid_repository::GeoGridRepository;
use auditrs::infrastructure::repositories::geo_grid_repo_impl::GeoGridRepositoryImpl;
use chrono::{Duration, Utc};
use uuid::Uuid;

fn grid_scan(user_id: Uuid, campaign_id: Uuid) -> GeoGridScan {
    GeoGridScan::new(
        user_id,
        campaign_id,
        "Example Dental".to_string(),
        Some("place-1".to_string()),
        30.2672,
        -97.7431,
        3,
        2.0,
        vec!["dentist".to_string()],
    )
}

fn point(scan_id: Uuid, row: i32, col: i32) -> GridPoint {
    GridPoint {
        id: Uuid::new_v4(),
        scan_id,
        row,
        col,
        lat: 30.0,
        lng: -97.0,
        rankings: vec![KeywordRanking {
            keyword: "dentist".to_string(),
            target_rank: Some(2),
            competitors: vec![CompetitorSample {
                place_id: "rival".to_string(),
                name: "Rival Dental".to_string(),
                rank: 1,
                address: None,
                rating: Some(4.8),
                review_count: Some(210),
            }],
        }],
        sampled_at: Utc::now(),
    }
}

/// 同一行列的采样点只写入一次
#[tokio::test]
async fn test_point_upsert_skips_existing_cell() {
    let repo = GeoGridRepositoryImpl::new(setup_db().await);
    let scan = repo.create(&grid_scan(Uuid::new_v4(), Uuid::new_v4())).await.unwrap();

    assert!(repo.upsert_point(&point(scan.id, 0, 0)).await.unwrap());
    assert!(!repo.upsert_point(&point(scan.id, 0, 0)).await.unwrap());
    assert!(repo.upsert_point(&point(scan.id, 0, 1)).await.unwrap());

    let points = repo.list_points(scan.id).await.unwrap();
    assert_eq!(points.len(), 2);
    assert_eq!(points[0].rankings[0].competitors[0].place_id, "rival");
}

#[tokio::test]
async fn test_latest_completed_orders_by_completion() {
    let repo = GeoGridRepositoryImpl::new(setup_db().await);
    let user = Uuid::new_v4();
    let campaign = Uuid::new_v4();

    let mut first = grid_scan(user, campaign).begin_scan().unwrap().complete().unwrap();
    first.completed_at = Some(Utc::now() - Duration::days(7));
    repo.create(&first).await.unwrap();

    let second = grid_scan(user, campaign).begin_scan().unwrap().complete().unwrap();
    repo.create(&second).await.unwrap();

    repo.create(&grid_scan(user, campaign).begin_scan().unwrap().fail("quota").unwrap())
        .await
        .unwrap();
    repo.create(&grid_scan(user, Uuid::new_v4()).begin_scan().unwrap().complete().unwrap())
        .await
        .unwrap();

    let latest = repo.latest_completed(user, campaign, 2).await.unwrap();
    assert_eq!(
        latest.iter().map(|s| s.id).collect::<Vec<_>>(),
        vec![second.id, first.id]
    );
    assert!(latest.iter().all(|s| s.status == GeoGridStatus::Completed));
}

/// 不同用户使用相同活动ID时互不可见
#[tokio::test]
async fn test_latest_completed_is_scoped_to_owner() {
    let repo = GeoGridRepositoryImpl::new(setup_db().await);
    let (alice, bob) = (Uuid::new_v4(), Uuid::new_v4());
    let campaign = Uuid::new_v4();

    let mut alice_scan = grid_scan(alice, campaign).begin_scan().unwrap().complete().unwrap();
    alice_scan.completed_at = Some(Utc::now() - Duration::days(7));
    repo.create(&alice_scan).await.unwrap();
    let bob_scan = grid_scan(bob, campaign).begin_scan().unwrap().complete().unwrap();
    repo.create(&bob_scan).await.unwrap();

    let for_alice = repo.latest_completed(alice, campaign, 2).await.unwrap();
    assert_eq!(for_alice.iter().map(|s| s.id).collect::<Vec<_>>(), vec![alice_scan.id]);

    let for_bob = repo.latest_completed(bob, campaign, 2).await.unwrap();
    assert_eq!(for_bob.iter().map(|s| s.id).collect::<Vec<_>>(), vec![bob_scan.id]);
}

#[tokio::test]
async fn test_delete_removes_points() {
    let repo = GeoGridRepositoryImpl::new(setup_db().await);
    let scan = repo.create(&grid_scan(Uuid::new_v4(), Uuid::new_v4())).await.unwrap();
    repo.upsert_point(&point(scan.id, 1, 1)).await.unwrap();

    repo.delete(scan.id).await.unwrap();

    assert!(repo.find_by_id(scan.id).await.unwrap().is_none());
    assert!(repo.list_points(scan.id).await.unwrap().is_empty());
}
