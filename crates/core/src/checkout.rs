//! Three-step checkout: contact and delivery, payment, confirmation.
//!
//! Nothing here charges money or talks to a server. Placing an order yields
//! an [`OrderConfirmation`] whose WhatsApp message the storefront sends to
//! the shop.

use std::collections::BTreeMap;
use std::fmt::{self, Write as _};

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::cart::{Cart, CartItem};
use crate::types::Price;

/// Errors from the checkout flow.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CheckoutError {
    #[error("cannot check out an empty cart")]
    EmptyCart,

    #[error("missing required field: {0}")]
    MissingField(&'static str),

    #[error("invalid {field}: {reason}")]
    InvalidField { field: &'static str, reason: String },

    #[error("checkout is at step {actual}, expected {expected}")]
    WrongStep {
        expected: CheckoutStep,
        actual: CheckoutStep,
    },
}

/// Checkout steps, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckoutStep {
    Contact,
    Payment,
    Confirmation,
}

impl CheckoutStep {
    /// 1-based step number shown in the progress indicator.
    #[must_use]
    pub const fn number(self) -> u8 {
        match self {
            Self::Contact => 1,
            Self::Payment => 2,
            Self::Confirmation => 3,
        }
    }

    const fn next(self) -> Option<Self> {
        match self {
            Self::Contact => Some(Self::Payment),
            Self::Payment => Some(Self::Confirmation),
            Self::Confirmation => None,
        }
    }

    const fn previous(self) -> Option<Self> {
        match self {
            Self::Contact => None,
            Self::Payment => Some(Self::Contact),
            Self::Confirmation => Some(Self::Payment),
        }
    }
}

impl fmt::Display for CheckoutStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Contact => write!(f, "contact"),
            Self::Payment => write!(f, "payment"),
            Self::Confirmation => write!(f, "confirmation"),
        }
    }
}

/// Who is ordering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactInfo {
    pub name: String,
    pub phone: String,
    #[serde(default)]
    pub email: Option<String>,
}

impl ContactInfo {
    fn validate(&self) -> Result<(), CheckoutError> {
        if self.name.trim().is_empty() {
            return Err(CheckoutError::MissingField("name"));
        }
        if self.phone.trim().is_empty() {
            return Err(CheckoutError::MissingField("phone"));
        }
        if !self.phone.chars().any(|c| c.is_ascii_digit()) {
            return Err(CheckoutError::InvalidField {
                field: "phone",
                reason: "must contain digits".to_string(),
            });
        }
        if let Some(email) = self.email.as_deref().map(str::trim)
            && !email.is_empty()
            && !email.contains('@')
        {
            return Err(CheckoutError::InvalidField {
                field: "email",
                reason: format!("'{email}' is not an email address"),
            });
        }
        Ok(())
    }
}

/// Delivery window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeSlot {
    Morning,
    Afternoon,
    Evening,
}

impl TimeSlot {
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Morning => "9:00 AM - 12:00 PM",
            Self::Afternoon => "2:00 PM - 6:00 PM",
            Self::Evening => "6:00 PM - 9:00 PM",
        }
    }
}

/// Where and when to deliver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryDetails {
    /// District slug, e.g. `san-isidro`.
    pub district: String,
    pub address: String,
    #[serde(default)]
    pub reference: Option<String>,
    pub date: NaiveDate,
    pub time_slot: TimeSlot,
}

impl DeliveryDetails {
    fn validate(&self) -> Result<(), CheckoutError> {
        if self.district.trim().is_empty() {
            return Err(CheckoutError::MissingField("district"));
        }
        if self.address.trim().is_empty() {
            return Err(CheckoutError::MissingField("address"));
        }
        Ok(())
    }

    /// District slug as shown to people: `san-isidro` becomes `San isidro`.
    #[must_use]
    pub fn district_label(&self) -> String {
        let spaced = self.district.trim().replace('-', " ");
        let mut chars = spaced.chars();
        chars.next().map_or_else(String::new, |first| {
            first.to_uppercase().chain(chars).collect()
        })
    }
}

/// How the customer will pay once the shop confirms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    Card,
    Yape,
    Plin,
    Transfer,
}

impl PaymentMethod {
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Card => "Tarjeta",
            Self::Yape => "Yape",
            Self::Plin => "Plin",
            Self::Transfer => "Transferencia bancaria",
        }
    }

    /// Wallet payments need the customer to send a payment receipt.
    #[must_use]
    pub const fn requires_receipt(self) -> bool {
        matches!(self, Self::Yape | Self::Plin)
    }
}

/// Delivery fees per district.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryZones {
    fees: BTreeMap<String, Decimal>,
    free_delivery_minimum: Decimal,
}

impl Default for DeliveryZones {
    fn default() -> Self {
        let fees = [
            ("miraflores", 15),
            ("san-isidro", 15),
            ("surco", 20),
            ("la-molina", 20),
            ("san-borja", 18),
            ("barranco", 15),
            ("chorrillos", 25),
            ("san-miguel", 20),
            ("pueblo-libre", 22),
            ("magdalena", 20),
        ];
        Self {
            fees: fees
                .into_iter()
                .map(|(d, fee)| (d.to_string(), Decimal::from(fee)))
                .collect(),
            free_delivery_minimum: Decimal::from(200),
        }
    }
}

impl DeliveryZones {
    /// Fee table with a custom free-delivery threshold.
    #[must_use]
    pub fn with_free_delivery_minimum(mut self, minimum: Decimal) -> Self {
        self.free_delivery_minimum = minimum;
        self
    }

    /// Base fee for a district; unknown districts cost nothing.
    #[must_use]
    pub fn base_fee(&self, district: &str) -> Decimal {
        self.fees
            .get(district.trim())
            .copied()
            .unwrap_or(Decimal::ZERO)
    }

    /// Whether `district` is in the fee table.
    #[must_use]
    pub fn covers(&self, district: &str) -> bool {
        self.fees.contains_key(district.trim())
    }

    /// Fee actually charged for `district` given the cart subtotal.
    #[must_use]
    pub fn fee_for(&self, district: &str, subtotal: Decimal) -> Decimal {
        if subtotal >= self.free_delivery_minimum {
            Decimal::ZERO
        } else {
            self.base_fee(district)
        }
    }

    /// Known district slugs, sorted.
    pub fn districts(&self) -> impl Iterator<Item = &str> {
        self.fees.keys().map(String::as_str)
    }
}

/// State of one checkout.
#[derive(Debug, Clone)]
pub struct CheckoutFlow {
    step: CheckoutStep,
    items: Vec<CartItem>,
    zones: DeliveryZones,
    contact: Option<ContactInfo>,
    delivery: Option<DeliveryDetails>,
    payment: Option<PaymentMethod>,
}

impl CheckoutFlow {
    /// Start a checkout over a snapshot of `cart`.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::EmptyCart`] when the cart has no lines.
    pub fn start(cart: &Cart, zones: DeliveryZones) -> Result<Self, CheckoutError> {
        if cart.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }
        Ok(Self {
            step: CheckoutStep::Contact,
            items: cart.items().to_vec(),
            zones,
            contact: None,
            delivery: None,
            payment: None,
        })
    }

    #[must_use]
    pub const fn step(&self) -> CheckoutStep {
        self.step
    }

    #[must_use]
    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    /// Record contact and delivery data for step 1.
    ///
    /// # Errors
    ///
    /// Returns a validation error when a required field is blank.
    pub fn set_contact(
        &mut self,
        contact: ContactInfo,
        delivery: DeliveryDetails,
    ) -> Result<(), CheckoutError> {
        contact.validate()?;
        delivery.validate()?;
        self.contact = Some(contact);
        self.delivery = Some(delivery);
        Ok(())
    }

    /// Choose the payment method for step 2.
    pub const fn set_payment(&mut self, method: PaymentMethod) {
        self.payment = Some(method);
    }

    /// Move to the next step once the current one has its data.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::MissingField`] when the current step is
    /// incomplete and [`CheckoutError::WrongStep`] past the last step.
    pub fn next(&mut self) -> Result<CheckoutStep, CheckoutError> {
        match self.step {
            CheckoutStep::Contact => {
                if self.contact.is_none() {
                    return Err(CheckoutError::MissingField("contact"));
                }
                if self.delivery.is_none() {
                    return Err(CheckoutError::MissingField("delivery"));
                }
            }
            CheckoutStep::Payment => {
                if self.payment.is_none() {
                    return Err(CheckoutError::MissingField("payment"));
                }
            }
            CheckoutStep::Confirmation => {}
        }

        let next = self.step.next().ok_or(CheckoutError::WrongStep {
            expected: CheckoutStep::Payment,
            actual: self.step,
        })?;
        self.step = next;
        Ok(next)
    }

    /// Go back one step; the first step stays put.
    pub const fn back(&mut self) -> CheckoutStep {
        if let Some(previous) = self.step.previous() {
            self.step = previous;
        }
        self.step
    }

    #[must_use]
    pub fn subtotal(&self) -> Decimal {
        self.items.iter().map(CartItem::line_total).sum()
    }

    /// Delivery fee for the chosen district, zero until one is chosen.
    #[must_use]
    pub fn delivery_fee(&self) -> Decimal {
        self.delivery.as_ref().map_or(Decimal::ZERO, |d| {
            self.zones.fee_for(&d.district, self.subtotal())
        })
    }

    #[must_use]
    pub fn total(&self) -> Decimal {
        self.subtotal() + self.delivery_fee()
    }

    /// Place the order from the confirmation step.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::WrongStep`] before the confirmation step.
    pub fn place_order(&self, now: DateTime<Utc>) -> Result<OrderConfirmation, CheckoutError> {
        if self.step != CheckoutStep::Confirmation {
            return Err(CheckoutError::WrongStep {
                expected: CheckoutStep::Confirmation,
                actual: self.step,
            });
        }
        let contact = self
            .contact
            .clone()
            .ok_or(CheckoutError::MissingField("contact"))?;
        let delivery = self
            .delivery
            .clone()
            .ok_or(CheckoutError::MissingField("delivery"))?;
        let payment = self.payment.ok_or(CheckoutError::MissingField("payment"))?;
        let delivery_fee_pending = !self.zones.covers(&delivery.district);

        Ok(OrderConfirmation {
            order_number: order_number(now),
            placed_at: now,
            contact,
            delivery,
            payment,
            items: self.items.clone(),
            subtotal: self.subtotal(),
            delivery_fee: self.delivery_fee(),
            delivery_fee_pending,
            total: self.total(),
        })
    }
}

/// A placed order, ready to be sent to the shop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderConfirmation {
    pub order_number: String,
    pub placed_at: DateTime<Utc>,
    pub contact: ContactInfo,
    pub delivery: DeliveryDetails,
    pub payment: PaymentMethod,
    pub items: Vec<CartItem>,
    pub subtotal: Decimal,
    pub delivery_fee: Decimal,
    /// The district is outside the fee table, so the shop quotes the fee.
    #[serde(default)]
    pub delivery_fee_pending: bool,
    pub total: Decimal,
}

impl OrderConfirmation {
    /// Plain-text order summary for WhatsApp, using its `*bold*` markup.
    #[must_use]
    pub fn whatsapp_message(&self) -> String {
        let mut msg = String::new();
        let _ = writeln!(msg, "*Nuevo pedido - Lima Rose Florería*");
        let _ = writeln!(msg, "*Pedido:* {}", self.order_number);
        msg.push('\n');

        let _ = writeln!(msg, "*Cliente:* {}", self.contact.name.trim());
        let _ = writeln!(msg, "*Teléfono:* {}", self.contact.phone.trim());
        if let Some(email) = self.contact.email.as_deref().filter(|e| !e.trim().is_empty()) {
            let _ = writeln!(msg, "*Email:* {}", email.trim());
        }
        msg.push('\n');

        let _ = writeln!(msg, "*Productos:*");
        for item in &self.items {
            let _ = writeln!(
                msg,
                "- {} × {}: {}",
                item.name,
                item.quantity,
                Price::pen(item.line_total())
            );
        }
        msg.push('\n');

        let _ = writeln!(msg, "*Subtotal:* {}", Price::pen(self.subtotal));
        if self.delivery_fee_pending {
            let _ = writeln!(
                msg,
                "*Delivery:* Por confirmar ({})",
                self.delivery.district_label()
            );
        } else if self.delivery_fee.is_zero() {
            let _ = writeln!(msg, "*Delivery:* Gratis");
        } else {
            let _ = writeln!(
                msg,
                "*Delivery:* {} vía {}",
                Price::pen(self.delivery_fee),
                self.delivery.district_label()
            );
        }
        let _ = writeln!(msg, "*Total:* {}", Price::pen(self.total));
        msg.push('\n');

        let _ = writeln!(
            msg,
            "*Entrega:* {} ({})",
            self.delivery.date.format("%Y-%m-%d"),
            self.delivery.time_slot.label()
        );
        let _ = writeln!(msg, "*Distrito:* {}", self.delivery.district_label());
        let _ = writeln!(msg, "*Dirección:* {}", self.delivery.address.trim());
        if let Some(reference) = self
            .delivery
            .reference
            .as_deref()
            .filter(|r| !r.trim().is_empty())
        {
            let _ = writeln!(msg, "*Referencia:* {}", reference.trim());
        }
        let _ = write!(msg, "*Pago:* {}", self.payment.label());
        if self.payment.requires_receipt() {
            let _ = write!(msg, "\nEnviaré la constancia de pago por este medio.");
        }
        msg
    }
}

/// Order number `LRF-` followed by the base-36 millisecond timestamp.
#[must_use]
pub fn order_number(now: DateTime<Utc>) -> String {
    let millis = u64::try_from(now.timestamp_millis()).unwrap_or(0);
    format!("LRF-{}", to_base36_upper(millis))
}

fn to_base36_upper(mut value: u64) -> String {
    if value == 0 {
        return "0".to_string();
    }
    let mut out = Vec::new();
    while value > 0 {
        let digit = u32::try_from(value % 36).unwrap_or(0);
        if let Some(c) = char::from_digit(digit, 36) {
            out.push(c.to_ascii_uppercase());
        }
        value /= 36;
    }
    out.iter().rev().collect()
}
