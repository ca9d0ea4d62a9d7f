//! Wire types for the browser-automation checkout worker.
//!
//! Field names follow the worker's JSON contract exactly; everything here
//! is plain serde data with no behavior beyond a few read helpers.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use shopwright_core::cart::{CartItem, CartSnapshot};

/// One purchasable line as the worker expects it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OrderItem {
    pub id: String,
    pub name: String,
    pub price: Decimal,
    pub quantity: u32,
}

impl From<&CartItem> for OrderItem {
    fn from(item: &CartItem) -> Self {
        Self {
            id: item.product_id.0.clone(),
            name: item.name.clone(),
            price: item.unit_price,
            quantity: item.quantity,
        }
    }
}

/// Chat turns captured from the shopper's conversation, forwarded so the
/// worker's agent can see what was asked for.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ConversationContext {
    pub session_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub intent: Option<String>,
    pub messages: Vec<ConversationMessage>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ConversationMessage {
    pub role: String,
    pub content: String,
}

impl ConversationContext {
    pub fn push(&mut self, role: impl Into<String>, content: impl Into<String>) {
        self.messages
            .push(ConversationMessage { role: role.into(), content: content.into() });
    }

    /// Texts the human actually typed, in order. The worker replays these
    /// verbatim to its own agent.
    pub fn human_messages(&self) -> Vec<String> {
        self.messages
            .iter()
            .filter(|message| message.role == "user")
            .map(|message| message.content.clone())
            .collect()
    }
}

/// Submission body for `POST /api/browser-checkout`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PurchaseRequest {
    pub user_id: String,
    pub store_id: String,
    pub items: Vec<OrderItem>,
    pub total: Decimal,
    pub merchant_name: String,
    pub checkout_url: String,
    pub payment_method: String,
    pub payment_card_token: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conversation_context: Option<ConversationContext>,
    pub human_messages: Vec<String>,
}

impl PurchaseRequest {
    pub fn item_count(&self) -> u32 {
        self.items.iter().map(|item| item.quantity).sum()
    }
}

/// Builds the submission body from a cart snapshot plus session facts.
pub fn build_purchase_request(
    user_id: &str,
    store_id: &str,
    merchant_name: &str,
    checkout_url: &str,
    token: &str,
    snapshot: &CartSnapshot,
    conversation: Option<&ConversationContext>,
) -> PurchaseRequest {
    PurchaseRequest {
        user_id: user_id.to_string(),
        store_id: store_id.to_string(),
        items: snapshot.items.iter().map(OrderItem::from).collect(),
        total: snapshot.total,
        merchant_name: merchant_name.to_string(),
        checkout_url: checkout_url.to_string(),
        payment_method: "vaultpay_card".to_string(),
        payment_card_token: token.to_string(),
        conversation_context: conversation.cloned(),
        human_messages: conversation.map(ConversationContext::human_messages).unwrap_or_default(),
    }
}

/// Worker lifecycle states for a purchase record.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusKind {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl StatusKind {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }
}

/// Accepted-submission response from `POST /api/browser-checkout`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PurchaseSubmission {
    pub purchase_id: String,
    pub status: StatusKind,
    #[serde(default)]
    pub message: Option<String>,
}

/// Polled record from `GET /api/purchase-status/{id}`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PurchaseStatus {
    pub purchase_id: String,
    pub status: StatusKind,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
    #[serde(default)]
    pub result: Option<PurchaseOutcome>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Terminal success payload nested in a completed status record.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PurchaseOutcome {
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub store_order_id: Option<String>,
    #[serde(default)]
    pub payment_method: Option<String>,
    #[serde(default)]
    pub total_amount: Option<Decimal>,
    #[serde(default)]
    pub items_processed: Option<u32>,
    #[serde(default)]
    pub checkout_method: Option<String>,
}

/// Catalog entry from the demo store's `GET /api/products`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StoreProduct {
    pub id: String,
    pub name: String,
    pub price: Decimal,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;
    use shopwright_core::cart::{Cart, CartItem, ProductId};

    use super::{build_purchase_request, ConversationContext, PurchaseStatus, StatusKind};

    fn cart() -> Cart {
        let mut cart = Cart::new();
        cart.add(CartItem {
            product_id: ProductId("sku-1".to_string()),
            name: "Canvas Tote".to_string(),
            unit_price: Decimal::new(2_499, 2),
            quantity: 2,
        });
        cart
    }

    #[test]
    fn request_carries_snapshot_lines_and_human_messages() {
        let mut conversation = ConversationContext::default();
        conversation.push("user", "buy me two totes");
        conversation.push("assistant", "adding them now");
        conversation.push("user", "check out please");

        let request = build_purchase_request(
            "user-1",
            "demo-store",
            "Shopwright Demo Store",
            "http://localhost:5173/checkout",
            "tok_1234567890",
            &cart().snapshot(),
            Some(&conversation),
        );

        assert_eq!(request.items.len(), 1);
        assert_eq!(request.items[0].quantity, 2);
        assert_eq!(request.total, Decimal::new(4_998, 2));
        assert_eq!(request.item_count(), 2);
        assert_eq!(
            request.human_messages,
            vec!["buy me two totes".to_string(), "check out please".to_string()]
        );
    }

    #[test]
    fn status_kinds_parse_from_lowercase_wire_values() {
        let raw = r#"{
            "purchase_id": "p-1",
            "status": "processing",
            "message": "Filling the payment form"
        }"#;
        let status: PurchaseStatus = serde_json::from_str(raw).expect("decode");

        assert_eq!(status.status, StatusKind::Processing);
        assert!(!status.status.is_terminal());
        assert!(status.result.is_none());
    }

    #[test]
    fn only_completed_and_failed_are_terminal() {
        assert!(!StatusKind::Pending.is_terminal());
        assert!(!StatusKind::Processing.is_terminal());
        assert!(StatusKind::Completed.is_terminal());
        assert!(StatusKind::Failed.is_terminal());
    }
}
