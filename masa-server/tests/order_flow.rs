//! End-to-end order flow over the in-memory store: checkout pricing, ledger
//! persistence, kitchen transitions, and payment reconciliation.

use std::sync::Arc;

use masa_server::live::OrderFeedHub;
use masa_server::orders::{LedgerError, OrderLedger};
use masa_server::payments::{reconcile, PaymentStatus, ReconcileOutcome};
use masa_server::pricing::{price_order, PricingConfig, PricingError};
use masa_server::store::MemoryStore;
use shared::models::{MenuItem, OrderStatus, OrderType};
use shared::order::{CustomerInfo, OrderLineRequest};

struct Harness {
    store: Arc<MemoryStore>,
    ledger: OrderLedger,
    config: PricingConfig,
}

fn harness() -> Harness {
    let store = Arc::new(MemoryStore::new());
    store.put_item(MenuItem {
        id: 1,
        name: "Taco".to_string(),
        price: 300,
        available: true,
    });
    store.put_item(MenuItem {
        id: 2,
        name: "Horchata".to_string(),
        price: 250,
        available: true,
    });
    let ledger = OrderLedger::new(store.clone(), OrderFeedHub::new());
    Harness {
        store,
        ledger,
        config: PricingConfig::default(),
    }
}

fn customer() -> CustomerInfo {
    CustomerInfo {
        name: "Ana Reyes".to_string(),
        phone: "555-0100".to_string(),
        email: Some("ana@example.com".to_string()),
    }
}

fn two_tacos() -> Vec<OrderLineRequest> {
    vec![OrderLineRequest {
        item_id: 1,
        quantity: 2,
        customization: None,
    }]
}

/// Scenario A: 2 × $3.00 Taco, pickup, 8.875% tax
/// → subtotal $6.00, tax $0.53 (rounded from $0.5325), total $6.53, pending.
#[tokio::test]
async fn scenario_a_pickup_checkout() {
    let h = harness();

    let priced = price_order(
        h.store.as_ref(),
        &two_tacos(),
        OrderType::Pickup,
        &h.config,
    )
    .await
    .unwrap();
    assert_eq!(priced.subtotal, 600);
    assert_eq!(priced.tax, 53);
    assert_eq!(priced.delivery_fee, 0);
    assert_eq!(priced.total, 653);

    let order = h
        .ledger
        .create_order(&customer(), OrderType::Pickup, None, None, priced)
        .await
        .unwrap();
    assert_eq!(order.status, OrderStatus::Pending);
    assert_eq!(order.total, 653);
    assert_eq!(order.lines.len(), 1);
    assert_eq!(order.lines[0].name, "Taco");

    // Appears in the kitchen queue
    let active = h.ledger.list_active().await.unwrap();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].id, order.id);
}

/// Scenario B: same cart, item marked unavailable → pricing fails, nothing
/// persisted.
#[tokio::test]
async fn scenario_b_unavailable_item() {
    let h = harness();
    h.store.put_item(MenuItem {
        id: 1,
        name: "Taco".to_string(),
        price: 300,
        available: false,
    });

    let err = price_order(
        h.store.as_ref(),
        &two_tacos(),
        OrderType::Pickup,
        &h.config,
    )
    .await
    .unwrap_err();
    assert!(matches!(err, PricingError::ItemUnavailable(name) if name == "Taco"));

    assert!(h.ledger.list_active().await.unwrap().is_empty());
}

/// Scenario C: order created, intent for 653 confirmed → reconcile advances
/// to preparing; a second confirmation for the same intent is a no-op.
#[tokio::test]
async fn scenario_c_payment_reconciliation() {
    let h = harness();
    let priced = price_order(
        h.store.as_ref(),
        &two_tacos(),
        OrderType::Pickup,
        &h.config,
    )
    .await
    .unwrap();
    assert_eq!(priced.total, 653);

    let order = h
        .ledger
        .create_order(&customer(), OrderType::Pickup, None, None, priced)
        .await
        .unwrap();

    let outcome = reconcile(
        &h.ledger,
        &order.order_number,
        "pi_653",
        PaymentStatus::Succeeded,
        true,
    )
    .await
    .unwrap();
    assert_eq!(outcome, ReconcileOutcome::Advanced);

    let paid = h.ledger.get_order(order.id).await.unwrap();
    assert_eq!(paid.status, OrderStatus::Preparing);
    assert_eq!(paid.payment_intent_id.as_deref(), Some("pi_653"));

    // Duplicate webhook: order already past pending
    let outcome = reconcile(
        &h.ledger,
        &order.order_number,
        "pi_653",
        PaymentStatus::Succeeded,
        true,
    )
    .await
    .unwrap();
    assert_eq!(outcome, ReconcileOutcome::AlreadyProcessed);
    assert_eq!(
        h.ledger.get_order(order.id).await.unwrap().status,
        OrderStatus::Preparing
    );
}

/// Scenario D: kitchen tries to complete a pending (unpaid) order →
/// InvalidTransition, state unchanged.
#[tokio::test]
async fn scenario_d_premature_completion() {
    let h = harness();
    let priced = price_order(
        h.store.as_ref(),
        &two_tacos(),
        OrderType::Pickup,
        &h.config,
    )
    .await
    .unwrap();
    let order = h
        .ledger
        .create_order(&customer(), OrderType::Pickup, None, None, priced)
        .await
        .unwrap();

    let err = h
        .ledger
        .transition(order.id, OrderStatus::Completed)
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::InvalidTransition { .. }));
    assert_eq!(
        h.ledger.get_order(order.id).await.unwrap().status,
        OrderStatus::Pending
    );
}

/// Scenario E: delivery order without an address fails validation before any
/// pricing work, and nothing is persisted.
#[tokio::test]
async fn scenario_e_delivery_without_address() {
    let h = harness();

    let err = masa_server::orders::validate_order_request(
        &customer(),
        OrderType::Delivery,
        &None,
        &None,
    )
    .unwrap_err();
    assert!(matches!(err, LedgerError::MissingDeliveryAddress));

    // The ledger rejects it too, even when handed a priced cart
    let priced = price_order(
        h.store.as_ref(),
        &two_tacos(),
        OrderType::Delivery,
        &h.config,
    )
    .await
    .unwrap();
    let err = h
        .ledger
        .create_order(&customer(), OrderType::Delivery, None, None, priced)
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::MissingDeliveryAddress));

    assert!(h.ledger.list_active().await.unwrap().is_empty());
}

/// Full lifecycle: checkout → pay → kitchen advances → completed, with a
/// delivery fee in the totals.
#[tokio::test]
async fn full_delivery_lifecycle() {
    let h = harness();
    let lines = vec![
        OrderLineRequest {
            item_id: 1,
            quantity: 2,
            customization: Some("no cilantro".to_string()),
        },
        OrderLineRequest {
            item_id: 2,
            quantity: 1,
            customization: None,
        },
    ];

    let priced = price_order(h.store.as_ref(), &lines, OrderType::Delivery, &h.config)
        .await
        .unwrap();
    // 600 + 250 = 850 subtotal; tax 75.4375 → 75; +500 delivery
    assert_eq!(priced.subtotal, 850);
    assert_eq!(priced.tax, 75);
    assert_eq!(priced.total, 850 + 75 + 500);

    let order = h
        .ledger
        .create_order(
            &customer(),
            OrderType::Delivery,
            Some("1 Main St, Brooklyn".to_string()),
            Some("ring twice".to_string()),
            priced,
        )
        .await
        .unwrap();

    let outcome = reconcile(
        &h.ledger,
        &order.order_number,
        "pi_full",
        PaymentStatus::Succeeded,
        true,
    )
    .await
    .unwrap();
    assert_eq!(outcome, ReconcileOutcome::Advanced);

    h.ledger
        .transition(order.id, OrderStatus::Ready)
        .await
        .unwrap();
    h.ledger
        .transition(order.id, OrderStatus::Completed)
        .await
        .unwrap();

    let done = h.ledger.get_order(order.id).await.unwrap();
    assert_eq!(done.status, OrderStatus::Completed);
    assert!(h.ledger.list_active().await.unwrap().is_empty());
}

/// A customer cancellation beats the payment webhook: the late confirmation
/// must not resurrect the order.
#[tokio::test]
async fn late_confirmation_cannot_resurrect_cancelled_order() {
    let h = harness();
    let priced = price_order(
        h.store.as_ref(),
        &two_tacos(),
        OrderType::Pickup,
        &h.config,
    )
    .await
    .unwrap();
    let order = h
        .ledger
        .create_order(&customer(), OrderType::Pickup, None, None, priced)
        .await
        .unwrap();

    h.ledger
        .transition(order.id, OrderStatus::Cancelled)
        .await
        .unwrap();

    let outcome = reconcile(
        &h.ledger,
        &order.order_number,
        "pi_late",
        PaymentStatus::Succeeded,
        true,
    )
    .await
    .unwrap();
    assert_eq!(outcome, ReconcileOutcome::AlreadyProcessed);
    assert_eq!(
        h.ledger.get_order(order.id).await.unwrap().status,
        OrderStatus::Cancelled
    );
}
