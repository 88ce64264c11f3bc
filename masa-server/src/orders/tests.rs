use super::*;
use crate::store::MemoryStore;
use shared::order::{OrderEventKind, PricedLine};

fn test_ledger() -> (OrderLedger, Arc<MemoryStore>, OrderFeedHub) {
    let store = Arc::new(MemoryStore::new());
    let feed = OrderFeedHub::new();
    let ledger = OrderLedger::new(store.clone(), feed.clone());
    (ledger, store, feed)
}

fn customer() -> CustomerInfo {
    CustomerInfo {
        name: "Ana Reyes".to_string(),
        phone: "555-0100".to_string(),
        email: Some("ana@example.com".to_string()),
    }
}

fn priced_tacos() -> PricedOrder {
    PricedOrder {
        lines: vec![PricedLine {
            item_id: 1,
            name: "Taco".to_string(),
            unit_price: 300,
            quantity: 2,
            customization: None,
        }],
        subtotal: 600,
        tax: 53,
        delivery_fee: 0,
        total: 653,
    }
}

async fn create_pickup(ledger: &OrderLedger) -> Order {
    ledger
        .create_order(&customer(), OrderType::Pickup, None, None, priced_tacos())
        .await
        .unwrap()
}

#[tokio::test]
async fn test_create_order_persists_snapshot() {
    let (ledger, _, _) = test_ledger();
    let order = create_pickup(&ledger).await;

    assert_eq!(order.status, OrderStatus::Pending);
    assert_eq!(order.subtotal, 600);
    assert_eq!(order.tax, 53);
    assert_eq!(order.delivery_fee, 0);
    assert_eq!(order.total, 653);
    assert_eq!(order.lines.len(), 1);
    assert_eq!(order.lines[0].unit_price, 300);
    assert_eq!(order.lines[0].order_id, order.id);
    assert!(order.payment_intent_id.is_none());

    // Subtotal invariant: Σ(unit_price × quantity) over lines
    let line_sum: i64 = order.lines.iter().map(|l| l.line_total()).sum();
    assert_eq!(line_sum, order.subtotal);

    // Round-trips through the store
    let fetched = ledger.get_order(order.id).await.unwrap();
    assert_eq!(fetched, order);
    let by_number = ledger.get_order_by_number(&order.order_number).await.unwrap();
    assert_eq!(by_number.id, order.id);
}

#[tokio::test]
async fn test_order_number_format_and_uniqueness() {
    let (ledger, _, _) = test_ledger();
    let a = create_pickup(&ledger).await;
    let b = create_pickup(&ledger).await;

    let day = chrono::Utc::now().format("%Y%m%d").to_string();
    assert_eq!(a.order_number, format!("ORD-{}-0001", day));
    assert_eq!(b.order_number, format!("ORD-{}-0002", day));
}

#[tokio::test]
async fn test_missing_customer_fields_rejected() {
    let (ledger, store, _) = test_ledger();

    let mut no_name = customer();
    no_name.name = "  ".to_string();
    let err = ledger
        .create_order(&no_name, OrderType::Pickup, None, None, priced_tacos())
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::MissingField("customer_name")));

    let mut no_phone = customer();
    no_phone.phone = String::new();
    let err = ledger
        .create_order(&no_phone, OrderType::Pickup, None, None, priced_tacos())
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::MissingField("customer_phone")));

    // No order row persisted on validation failure
    assert!(store.list_active().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_delivery_requires_address() {
    let (ledger, store, _) = test_ledger();

    let err = ledger
        .create_order(&customer(), OrderType::Delivery, None, None, priced_tacos())
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::MissingDeliveryAddress));

    let err = ledger
        .create_order(
            &customer(),
            OrderType::Delivery,
            Some("   ".to_string()),
            None,
            priced_tacos(),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::MissingDeliveryAddress));

    assert!(store.list_active().await.unwrap().is_empty());

    // With an address it goes through
    let order = ledger
        .create_order(
            &customer(),
            OrderType::Delivery,
            Some("1 Main St, Brooklyn".to_string()),
            None,
            priced_tacos(),
        )
        .await
        .unwrap();
    assert_eq!(
        order.delivery_address.as_deref(),
        Some("1 Main St, Brooklyn")
    );
}

#[tokio::test]
async fn test_happy_path_transitions() {
    let (ledger, _, _) = test_ledger();
    let order = create_pickup(&ledger).await;

    for target in [
        OrderStatus::Preparing,
        OrderStatus::Ready,
        OrderStatus::Completed,
    ] {
        let updated = ledger.transition(order.id, target).await.unwrap();
        assert_eq!(updated.status, target);
    }
}

#[tokio::test]
async fn test_invalid_transition_rejected_and_state_unchanged() {
    let (ledger, _, _) = test_ledger();
    let order = create_pickup(&ledger).await;

    // Kitchen tries to complete an order that is still pending
    let err = ledger
        .transition(order.id, OrderStatus::Completed)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        LedgerError::InvalidTransition {
            from: OrderStatus::Pending,
            to: OrderStatus::Completed
        }
    ));

    let fetched = ledger.get_order(order.id).await.unwrap();
    assert_eq!(fetched.status, OrderStatus::Pending);
}

#[tokio::test]
async fn test_terminal_states_reject_everything() {
    let (ledger, _, _) = test_ledger();
    let order = create_pickup(&ledger).await;
    ledger
        .transition(order.id, OrderStatus::Cancelled)
        .await
        .unwrap();

    for target in OrderStatus::all() {
        let err = ledger.transition(order.id, target).await.unwrap_err();
        assert!(matches!(err, LedgerError::InvalidTransition { .. }));
    }
}

#[tokio::test]
async fn test_transition_unknown_order() {
    let (ledger, _, _) = test_ledger();
    let err = ledger
        .transition(999, OrderStatus::Preparing)
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::NotFound(_)));
}

#[tokio::test]
async fn test_list_active_excludes_terminal_and_is_idempotent() {
    let (ledger, _, _) = test_ledger();
    let a = create_pickup(&ledger).await;
    let b = create_pickup(&ledger).await;
    let c = create_pickup(&ledger).await;

    ledger.transition(b.id, OrderStatus::Cancelled).await.unwrap();
    ledger.transition(c.id, OrderStatus::Preparing).await.unwrap();
    ledger.transition(c.id, OrderStatus::Ready).await.unwrap();

    let first = ledger.list_active().await.unwrap();
    let ids: Vec<i64> = first.iter().map(|o| o.id).collect();
    assert_eq!(ids, vec![a.id]);

    // No intervening writes: identical content and ordering
    let second = ledger.list_active().await.unwrap();
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_concurrent_transitions_exactly_one_winner() {
    let (ledger, _, _) = test_ledger();
    let order = create_pickup(&ledger).await;
    ledger
        .transition(order.id, OrderStatus::Preparing)
        .await
        .unwrap();

    let ledger = Arc::new(ledger);
    let (l1, l2) = (ledger.clone(), ledger.clone());
    let id = order.id;

    // Two terminals race: one marks ready, the other cancels
    let (r1, r2) = tokio::join!(
        tokio::spawn(async move { l1.transition(id, OrderStatus::Ready).await }),
        tokio::spawn(async move { l2.transition(id, OrderStatus::Cancelled).await }),
    );
    let r1 = r1.unwrap();
    let r2 = r2.unwrap();

    let ready_won = r1.is_ok();
    let successes = [r1.is_ok(), r2.is_ok()].iter().filter(|s| **s).count();
    assert_eq!(successes, 1, "exactly one transition must win");

    let loser = if ready_won { r2 } else { r1 };
    assert!(matches!(
        loser.unwrap_err(),
        LedgerError::StatusConflict | LedgerError::InvalidTransition { .. }
    ));

    // Final status matches the winner, not a blend
    let final_order = ledger.get_order(id).await.unwrap();
    let winner_status = if ready_won {
        OrderStatus::Ready
    } else {
        OrderStatus::Cancelled
    };
    assert_eq!(final_order.status, winner_status);
}

#[tokio::test]
async fn test_events_published_on_create_and_transition() {
    let (ledger, _, feed) = test_ledger();
    let mut rx = feed.subscribe();

    let order = create_pickup(&ledger).await;
    let event = rx.recv().await.unwrap();
    assert_eq!(event.kind, OrderEventKind::Created);
    assert_eq!(event.order_id, order.id);
    assert_eq!(event.status, OrderStatus::Pending);

    ledger
        .transition(order.id, OrderStatus::Preparing)
        .await
        .unwrap();
    let event = rx.recv().await.unwrap();
    assert_eq!(event.kind, OrderEventKind::StatusChanged);
    assert_eq!(event.status, OrderStatus::Preparing);
}

#[tokio::test]
async fn test_admin_delete() {
    let (ledger, _, _) = test_ledger();
    let order = create_pickup(&ledger).await;

    ledger.delete_order(order.id).await.unwrap();
    assert!(matches!(
        ledger.get_order(order.id).await.unwrap_err(),
        LedgerError::NotFound(_)
    ));
    assert!(matches!(
        ledger.delete_order(order.id).await.unwrap_err(),
        LedgerError::NotFound(_)
    ));
}
