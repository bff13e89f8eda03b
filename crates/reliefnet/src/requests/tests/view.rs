use super::common::request;
use crate::geo::GeoPoint;
use crate::profiles::Uid;
use crate::requests::domain::{Priority, RequestKind, RequestStatus};
use crate::requests::view::{filter_requests, sort_requests, FilterState, SortOrder};

#[test]
fn filters_compose_as_logical_and() {
    let mut mine_resource = request("req-1", "victim-1");
    mine_resource.kind = RequestKind::Resource;
    let mut mine_rescue = request("req-2", "victim-1");
    mine_rescue.kind = RequestKind::Rescue;
    let mut theirs_resource = request("req-3", "victim-2");
    theirs_resource.kind = RequestKind::Resource;

    let all = vec![mine_resource, mine_rescue, theirs_resource];
    let filters = FilterState {
        kind: Some(RequestKind::Resource),
        mine_only: true,
        ..FilterState::default()
    };
    let viewer = Uid("victim-1".to_string());

    let filtered = filter_requests(&all, &filters, Some(&viewer));
    assert_eq!(filtered.len(), 1);
    assert_eq!(filtered[0].id.0, "req-1");
}

#[test]
fn filtering_is_idempotent() {
    let all = vec![request("req-1", "victim-1"), request("req-2", "victim-2")];
    let filters = FilterState {
        status: Some(RequestStatus::NotServed),
        ..FilterState::default()
    };
    let once = filter_requests(&all, &filters, None);
    let twice = filter_requests(&once, &filters, None);
    assert_eq!(once, twice);
}

#[test]
fn mine_only_with_unknown_viewer_hides_everything() {
    let all = vec![request("req-1", "victim-1")];
    let filters = FilterState {
        mine_only: true,
        ..FilterState::default()
    };
    assert!(filter_requests(&all, &filters, None).is_empty());
}

#[test]
fn priority_and_status_filters_run_independently() {
    let mut high_served = request("req-1", "v");
    high_served.priority = Priority::High;
    high_served.status = RequestStatus::Served;
    let mut high_open = request("req-2", "v");
    high_open.priority = Priority::High;
    let low_open = request("req-3", "v");

    let all = vec![high_served, high_open, low_open];
    let filters = FilterState {
        priority: Some(Priority::High),
        status: Some(RequestStatus::NotServed),
        ..FilterState::default()
    };
    let filtered = filter_requests(&all, &filters, None);
    assert_eq!(filtered.len(), 1);
    assert_eq!(filtered[0].id.0, "req-2");
}

#[test]
fn priority_sort_is_stable_high_first() {
    let mut low = request("req-low", "v");
    low.priority = Priority::Low;
    let mut medium_a = request("req-med-a", "v");
    medium_a.priority = Priority::Medium;
    let mut high = request("req-high", "v");
    high.priority = Priority::High;
    let mut medium_b = request("req-med-b", "v");
    medium_b.priority = Priority::Medium;

    let sorted = sort_requests(
        vec![low, medium_a, high, medium_b],
        SortOrder::Priority,
        None,
    );
    let ids: Vec<_> = sorted.iter().map(|r| r.id.0.as_str()).collect();
    // Ties keep their snapshot order: med-a before med-b.
    assert_eq!(ids, vec!["req-high", "req-med-a", "req-med-b", "req-low"]);
}

#[test]
fn distance_sort_orders_by_haversine_from_the_viewer() {
    let mut two_degrees = request("req-far", "v");
    two_degrees.lat = 0.0;
    two_degrees.lng = 2.0;
    let mut one_degree = request("req-near", "v");
    one_degree.lat = 0.0;
    one_degree.lng = 1.0;

    let sorted = sort_requests(
        vec![two_degrees, one_degree],
        SortOrder::Distance,
        Some(GeoPoint::new(0.0, 0.0)),
    );
    let ids: Vec<_> = sorted.iter().map(|r| r.id.0.as_str()).collect();
    assert_eq!(ids, vec!["req-near", "req-far"]);
}

#[test]
fn distance_sort_without_a_location_is_a_no_op() {
    let a = request("req-1", "v");
    let b = request("req-2", "v");
    let sorted = sort_requests(vec![a.clone(), b.clone()], SortOrder::Distance, None);
    assert_eq!(sorted, vec![a, b]);
}

#[test]
fn date_sort_puts_newest_first() {
    let mut old = request("req-old", "v");
    old.created_at = 1_000;
    let mut new = request("req-new", "v");
    new.created_at = 2_000;

    let sorted = sort_requests(vec![old, new], SortOrder::Date, None);
    let ids: Vec<_> = sorted.iter().map(|r| r.id.0.as_str()).collect();
    assert_eq!(ids, vec!["req-new", "req-old"]);
}
