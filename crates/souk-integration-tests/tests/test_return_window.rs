//! # Return Window Boundary Tests
//!
//! The 30-day eligibility window is inclusive: a return exactly 30 days
//! after delivery succeeds, one second later it fails. The exact-boundary
//! cases drive the validator with a pinned clock; the manager-level cases
//! leave a safety margin around the boundary so wall-clock drift during
//! the test run cannot flip the outcome.

use std::sync::Arc;

use chrono::{Duration, Utc};
use souk_core::{
    Actor, CustomerId, OrderId, OrderLineId, Timestamp, VendorId, RETURN_WINDOW_DAYS,
};
use souk_ledger::{Ledger, Order, OrderLine, ReturnReason, ReturnType, TracingSink};
use souk_returns::{check_eligibility, CreateReturn, ReturnError, ReturnManager};

fn delivered_order_and_line(delivered_at: Timestamp) -> (Order, OrderLine) {
    let order_id = OrderId::new();
    let mut order = Order::new(
        order_id.clone(),
        CustomerId::new(),
        1_000,
        0,
        0,
        0,
        1_000,
        Timestamp::from_datetime(*delivered_at.as_datetime() - Duration::days(2)),
    )
    .expect("order reconciles");
    order.mark_delivered(delivered_at).expect("deliver");
    let line = OrderLine::new(
        OrderLineId::new(),
        order_id,
        VendorId::new(),
        "sku-1",
        1_000,
        1,
        0,
        0,
        1_000,
    )
    .expect("line reconciles");
    (order, line)
}

#[test]
fn eligible_exactly_at_the_boundary() {
    let delivered = Timestamp::from_datetime(Utc::now() - Duration::days(60));
    let (order, line) = delivered_order_and_line(delivered.clone());

    let boundary = Timestamp::from_datetime(
        *delivered.as_datetime() + Duration::days(RETURN_WINDOW_DAYS),
    );
    assert!(check_eligibility(&order, &line, None, 1, &boundary).is_ok());
}

#[test]
fn expired_one_second_past_the_boundary() {
    let delivered = Timestamp::from_datetime(Utc::now() - Duration::days(60));
    let (order, line) = delivered_order_and_line(delivered.clone());

    let past = Timestamp::from_datetime(
        *delivered.as_datetime() + Duration::days(RETURN_WINDOW_DAYS) + Duration::seconds(1),
    );
    let err = check_eligibility(&order, &line, None, 1, &past).unwrap_err();
    match err {
        ReturnError::WindowExpired {
            window_days,
            delivered_at,
        } => {
            assert_eq!(window_days, RETURN_WINDOW_DAYS);
            assert_eq!(delivered_at, delivered.to_canonical_string());
        }
        other => panic!("expected WindowExpired, got {other:?}"),
    }
}

fn manager_with_delivery(delivered_at: Timestamp) -> (ReturnManager, OrderLineId, CustomerId) {
    let ledger = Arc::new(Ledger::new());
    let order_id = OrderId::new();
    let line_id = OrderLineId::new();
    let customer_id = CustomerId::new();
    let order = Order::new(
        order_id.clone(),
        customer_id.clone(),
        1_000,
        0,
        0,
        0,
        1_000,
        Timestamp::from_datetime(*delivered_at.as_datetime() - Duration::days(2)),
    )
    .expect("order reconciles");
    let line = OrderLine::new(
        line_id.clone(),
        order_id.clone(),
        VendorId::new(),
        "sku-1",
        1_000,
        1,
        0,
        0,
        1_000,
    )
    .expect("line reconciles");
    ledger.insert_order(order, vec![line]).expect("insert");
    ledger
        .mark_delivered(&order_id, delivered_at, &Actor::system("delivery-feed"))
        .expect("deliver");

    (
        ReturnManager::new(ledger, Arc::new(TracingSink)),
        line_id,
        customer_id,
    )
}

fn input(line_id: &OrderLineId, customer_id: &CustomerId) -> CreateReturn {
    CreateReturn {
        order_line_id: line_id.clone(),
        customer_id: customer_id.clone(),
        return_type: ReturnType::Refund,
        reason: ReturnReason::NoLongerNeeded,
        reason_text: None,
        quantity: 1,
        evidence_refs: Vec::new(),
    }
}

#[test]
fn manager_accepts_well_inside_the_window() {
    let delivered = Timestamp::from_datetime(
        Utc::now() - Duration::days(RETURN_WINDOW_DAYS) + Duration::hours(6),
    );
    let (manager, line_id, customer_id) = manager_with_delivery(delivered);
    assert!(manager.create_return(input(&line_id, &customer_id)).is_ok());
}

#[test]
fn manager_rejects_past_the_window() {
    let delivered = Timestamp::from_datetime(
        Utc::now() - Duration::days(RETURN_WINDOW_DAYS) - Duration::hours(6),
    );
    let (manager, line_id, customer_id) = manager_with_delivery(delivered);
    let err = manager
        .create_return(input(&line_id, &customer_id))
        .unwrap_err();
    assert!(matches!(err, ReturnError::WindowExpired { .. }));
}

#[test]
fn undelivered_order_is_not_returnable() {
    let ledger = Arc::new(Ledger::new());
    let order_id = OrderId::new();
    let line_id = OrderLineId::new();
    let customer_id = CustomerId::new();
    let order = Order::new(
        order_id.clone(),
        customer_id.clone(),
        1_000,
        0,
        0,
        0,
        1_000,
        Timestamp::now(),
    )
    .expect("order reconciles");
    let line = OrderLine::new(
        line_id.clone(),
        order_id,
        VendorId::new(),
        "sku-1",
        1_000,
        1,
        0,
        0,
        1_000,
    )
    .expect("line reconciles");
    ledger.insert_order(order, vec![line]).expect("insert");

    let manager = ReturnManager::new(ledger, Arc::new(TracingSink));
    let err = manager
        .create_return(input(&line_id, &customer_id))
        .unwrap_err();
    assert!(matches!(err, ReturnError::NotDelivered { .. }));
}
