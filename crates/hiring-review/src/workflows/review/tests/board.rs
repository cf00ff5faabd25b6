use super::common::*;
use crate::workflows::review::board::{NoticeLevel, SortOrder};
use crate::workflows::review::domain::{ApplicationId, Stage};
use crate::workflows::review::error::ReviewError;
use crate::workflows::review::filter::FilterSpec;
use crate::workflows::review::selection::SelectionMark;

#[tokio::test]
async fn load_buckets_records_and_merges_their_tags() {
    let mut odd = application("x", "INTERVIEWING");
    odd.tags = vec!["Referral".to_string()];
    let (board, _, _) = loaded_board(vec![odd, application("y", "HIRED")]).await;

    let columns = board.columns();
    assert_eq!(columns.len(), 4);
    assert_eq!(columns[0].stage, Stage::Pending);
    assert_eq!(columns[0].application_ids, ids(&["x"]));
    assert_eq!(columns[3].count, 1);
    assert!(board.known_tags().contains(&"Referral".to_string()));
    assert!(board.known_tags().contains(&"Needs Review".to_string()));
}

#[tokio::test]
async fn columns_only_show_visible_applications() {
    let (mut board, _, _) = loaded_board(four_across_stages()).await;
    board
        .apply_filter(FilterSpec::with_statuses([Stage::Hired]))
        .await
        .expect("filtered");

    let counts: Vec<usize> = board.columns().iter().map(|column| column.count).collect();
    assert_eq!(counts, vec![0, 0, 0, 1]);

    let summary = board.summary();
    assert_eq!(summary.total, 4);
    assert_eq!(summary.visible, 1);
    assert_eq!(summary.stage_counts[1].count, 2);
    assert_eq!(summary.reviewer.display_name, "Riley Recruiter");
}

#[tokio::test]
async fn summary_reports_tri_state_selection() {
    let (mut board, _, _) = loaded_board(four_across_stages()).await;
    assert_eq!(board.summary().selection, SelectionMark::None);

    board.toggle(&ApplicationId::new("a"));
    assert!(board.is_indeterminate());
    assert_eq!(board.summary().selection, SelectionMark::Partial);

    board.select_all();
    assert_eq!(board.summary().selection, SelectionMark::All);

    board.clear_selection();
    assert_eq!(board.summary().selected, 0);
}

#[tokio::test]
async fn annotate_updates_store_after_remote_accepts() {
    let (mut board, source, _) = loaded_board(four_across_stages()).await;
    let id = ApplicationId::new("b");

    board
        .annotate(&id, "Strong system design answers")
        .await
        .expect("remark saved");

    assert_eq!(
        board.get(&id).expect("record").remark.as_deref(),
        Some("Strong system design answers")
    );
    assert_eq!(
        source.remote("b").expect("remote").remark.as_deref(),
        Some("Strong system design answers")
    );
}

#[tokio::test]
async fn annotate_failure_leaves_store_untouched() {
    let (mut board, source, _) = loaded_board(four_across_stages()).await;
    source.fail_updates_for("b");
    let id = ApplicationId::new("b");

    match board.annotate(&id, "lost").await {
        Err(ReviewError::Update { application_id, .. }) => assert_eq!(application_id, id),
        other => panic!("expected update failure, got {other:?}"),
    }
    assert_eq!(board.get(&id).expect("record").remark, None);
    assert_eq!(board.drain_notices()[0].level, NoticeLevel::Error);
}

#[tokio::test]
async fn retag_replaces_tags_and_grows_catalog() {
    let (mut board, _, _) = loaded_board(four_across_stages()).await;
    let id = ApplicationId::new("c");

    board
        .retag(&id, vec!["Night Shift".to_string()])
        .await
        .expect("tags saved");

    assert_eq!(board.tags_of(&id), Some(vec!["Night Shift".to_string()]));
    assert!(board.known_tags().contains(&"Night Shift".to_string()));
}

#[tokio::test]
async fn add_tag_is_idempotent() {
    let (board, _, _) = loaded_board(four_across_stages()).await;
    assert!(board.add_tag("Remote OK"));
    assert!(!board.add_tag("Remote OK"));
}

#[tokio::test]
async fn visible_records_follow_requested_order() {
    let mut early = application("early", "PENDING");
    early.candidate.name = "zed".to_string();
    early.submitted_at = early.submitted_at - chrono::Duration::days(40);
    let mut late = application("late", "PENDING");
    late.candidate.name = "Amy".to_string();
    late.submitted_at = late.submitted_at + chrono::Duration::days(40);
    let (board, _, _) = loaded_board(vec![early, late]).await;

    let newest: Vec<&str> = board
        .visible_records(SortOrder::Newest)
        .into_iter()
        .map(|record| record.id.as_str())
        .collect();
    assert_eq!(newest, vec!["late", "early"]);

    let oldest: Vec<&str> = board
        .visible_records(SortOrder::Oldest)
        .into_iter()
        .map(|record| record.id.as_str())
        .collect();
    assert_eq!(oldest, vec!["early", "late"]);

    let by_name: Vec<&str> = board
        .visible_records(SortOrder::CandidateName)
        .into_iter()
        .map(|record| record.candidate.name.as_str())
        .collect();
    assert_eq!(by_name, vec!["Amy", "zed"]);
}

#[tokio::test]
async fn failed_initial_load_reports_error_state() {
    let (mut board, source, _) = build_board(four_across_stages());
    source.fail_fetch(true);

    match board.load().await {
        Err(ReviewError::Search(_)) => {}
        other => panic!("expected search failure, got {other:?}"),
    }
    assert!(board.search_state().is_failed());
    assert!(board.columns().iter().all(|column| column.count == 0));
}
