//! Checkout over the persisted cart.
//!
//! Nothing is charged and nothing reaches the catalog API: a placed order
//! becomes a WhatsApp link the customer opens to send it to the shop.

use chrono::{DateTime, Utc};
use url::Url;

use lima_rose_core::{CheckoutFlow, DeliveryZones, OrderConfirmation};

use crate::cart::CartManager;
use crate::error::StorefrontError;
use crate::storage::DeviceStorage;

const WHATSAPP_SEND_URL: &str = "https://api.whatsapp.com/send/";

/// An order ready to be sent.
#[derive(Debug, Clone)]
pub struct PlacedOrder {
    pub confirmation: OrderConfirmation,
    pub whatsapp_url: Url,
}

/// A checkout in progress, holding the cart it will empty.
#[derive(Debug)]
pub struct CheckoutSession<'a, S> {
    cart: &'a mut CartManager<S>,
    flow: CheckoutFlow,
    whatsapp_phone: String,
}

impl<'a, S: DeviceStorage> CheckoutSession<'a, S> {
    /// Start checking out the current cart.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::EmptyCart` when there is nothing to order.
    pub fn start(
        cart: &'a mut CartManager<S>,
        zones: DeliveryZones,
        whatsapp_phone: impl Into<String>,
    ) -> Result<Self, StorefrontError> {
        let flow = CheckoutFlow::start(cart.cart(), zones)?;
        Ok(Self {
            cart,
            flow,
            whatsapp_phone: whatsapp_phone.into(),
        })
    }

    #[must_use]
    pub const fn flow(&self) -> &CheckoutFlow {
        &self.flow
    }

    /// Steps, contact, delivery and payment are set through the flow.
    pub const fn flow_mut(&mut self) -> &mut CheckoutFlow {
        &mut self.flow
    }

    /// Place the order, build its WhatsApp link and empty the cart.
    ///
    /// # Errors
    ///
    /// Returns a checkout error before the confirmation step, and a storage
    /// error if the cart cannot be cleared.
    pub fn place_order(self, now: DateTime<Utc>) -> Result<PlacedOrder, StorefrontError> {
        let confirmation = self.flow.place_order(now)?;
        let whatsapp_url = whatsapp_url(&self.whatsapp_phone, &confirmation.whatsapp_message())?;
        self.cart.clear()?;

        tracing::info!(
            order_number = %confirmation.order_number,
            total = %confirmation.total,
            "Order placed"
        );
        Ok(PlacedOrder {
            confirmation,
            whatsapp_url,
        })
    }
}

/// `https://api.whatsapp.com/send/?phone=<n>&text=<message>`, with the
/// message percent-encoded.
///
/// # Errors
///
/// Returns `url::ParseError` if the result is not a valid URL.
pub fn whatsapp_url(phone: &str, message: &str) -> Result<Url, url::ParseError> {
    Url::parse(&format!(
        "{WHATSAPP_SEND_URL}?phone={}&text={}",
        urlencoding::encode(phone),
        urlencoding::encode(message)
    ))
}
