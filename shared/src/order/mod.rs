//! Order flow types: requests, priced snapshots, feed events

pub mod event;
pub mod priced;
pub mod request;

pub use event::{OrderEvent, OrderEventKind};
pub use priced::{PricedLine, PricedOrder};
pub use request::{
    ConfirmPaymentRequest, ConfirmPaymentResponse, CreateOrderRequest, CreatePaymentIntentRequest,
    CustomerInfo, OrderLineRequest, PaymentIntentResponse, StatusUpdateRequest,
    MAX_CUSTOMIZATION_LEN, MAX_LINE_QUANTITY, MAX_NOTE_LEN, MAX_ORDER_LINES, MAX_TEXT_FIELD_LEN,
    MAX_UNIT_PRICE,
};
