//! Core types and IDs for the matching engine.
//!
//! Identifiers are newtype wrappers. [`Order`] carries both new trading interest
//! and cancel instructions (`cancel_requested`). Prices are fixed-point
//! [`Decimal`]s, quantities whole units.

use rust_decimal::Decimal;

use crate::error::EngineError;

/// Unique order identifier, assigned monotonically by the store.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize)]
pub struct OrderId(pub u64);

/// Deal identifier, assigned by the store on commit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize)]
pub struct DealId(pub u64);

/// Order side.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    /// Parses a wire value (`"buy"`, `"Sell"`, ...). Anything else is an invalid side.
    pub fn parse(s: &str) -> Result<Self, EngineError> {
        if s.eq_ignore_ascii_case("buy") {
            Ok(Side::Buy)
        } else if s.eq_ignore_ascii_case("sell") {
            Ok(Side::Sell)
        } else {
            Err(EngineError::InvalidSide(s.to_string()))
        }
    }

    pub fn opposite(self) -> Self {
        match self {
            Side::Buy => Side::Sell,
            Side::Sell => Side::Buy,
        }
    }
}

/// Price kind: limit (bounded price) or market (take best available).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum PriceKind {
    Limit,
    Market,
}

impl PriceKind {
    pub fn parse(s: &str) -> Result<Self, EngineError> {
        if s.eq_ignore_ascii_case("limit") {
            Ok(PriceKind::Limit)
        } else if s.eq_ignore_ascii_case("market") {
            Ok(PriceKind::Market)
        } else {
            Err(EngineError::InvalidPriceKind(s.to_string()))
        }
    }
}

/// Validated order fields before the store assigns an id.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct NewOrder {
    pub side: Side,
    pub quantity: u64,
    pub price_kind: PriceKind,
    pub limit_price: Option<Decimal>,
}

impl NewOrder {
    /// Builds a new order from raw ingress fields, rejecting anything the engine
    /// could not rest or price.
    pub fn parse(
        side: &str,
        quantity: u64,
        price_kind: &str,
        limit_price: Option<Decimal>,
    ) -> Result<Self, EngineError> {
        let side = Side::parse(side)?;
        let price_kind = PriceKind::parse(price_kind)?;
        if quantity == 0 {
            return Err(EngineError::InvalidQuantity);
        }
        let limit_price = match price_kind {
            PriceKind::Limit => {
                let price = limit_price.ok_or(EngineError::MissingLimitPrice)?;
                if price <= Decimal::ZERO {
                    return Err(EngineError::InvalidPrice(price));
                }
                Some(price)
            }
            // A market order has no reference price of its own.
            PriceKind::Market => None,
        };
        Ok(Self {
            side,
            quantity,
            price_kind,
            limit_price,
        })
    }

    /// Attaches a store-assigned id. Nothing has matched yet, so the whole quantity remains.
    pub fn into_order(self, id: OrderId) -> Order {
        Order {
            id,
            side: self.side,
            quantity: self.quantity,
            remaining_quantity: self.quantity,
            price_kind: self.price_kind,
            limit_price: self.limit_price,
            cancel_requested: false,
        }
    }
}

/// A resting or incoming trading intent.
///
/// For limit orders `limit_price` is `Some(...)`; for market orders it is `None`.
/// When `cancel_requested` is set the order is a removal instruction for `id`
/// and the remaining fields are not consulted.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub side: Side,
    pub quantity: u64,
    pub remaining_quantity: u64,
    pub price_kind: PriceKind,
    pub limit_price: Option<Decimal>,
    #[serde(default)]
    pub cancel_requested: bool,
}

impl Order {
    /// Cancel instruction for `id`. Side is irrelevant: the engine searches both books.
    pub fn cancel(id: OrderId) -> Self {
        Self {
            id,
            side: Side::Buy,
            quantity: 0,
            remaining_quantity: 0,
            price_kind: PriceKind::Market,
            limit_price: None,
            cancel_requested: true,
        }
    }

    pub fn limit(id: OrderId, side: Side, quantity: u64, price: Decimal) -> Self {
        NewOrder {
            side,
            quantity,
            price_kind: PriceKind::Limit,
            limit_price: Some(price),
        }
        .into_order(id)
    }

    pub fn market(id: OrderId, side: Side, quantity: u64) -> Self {
        NewOrder {
            side,
            quantity,
            price_kind: PriceKind::Market,
            limit_price: None,
        }
        .into_order(id)
    }

    pub fn is_limit(&self) -> bool {
        matches!(self.price_kind, PriceKind::Limit)
    }

    pub fn is_market(&self) -> bool {
        matches!(self.price_kind, PriceKind::Market)
    }

    pub fn is_filled(&self) -> bool {
        self.remaining_quantity == 0
    }

    /// Price this order trades at when resting: its own limit, or none for market orders.
    pub fn reference_price(&self) -> Option<Decimal> {
        match self.price_kind {
            PriceKind::Limit => self.limit_price,
            PriceKind::Market => None,
        }
    }

    /// Whether this order, as taker, accepts a trade at `price`.
    /// Market takers accept any price.
    pub fn accepts(&self, price: Decimal) -> bool {
        match (self.price_kind, self.limit_price) {
            (PriceKind::Market, _) | (PriceKind::Limit, None) => true,
            (PriceKind::Limit, Some(limit)) => match self.side {
                Side::Buy => limit >= price,
                Side::Sell => limit <= price,
            },
        }
    }

    /// Checks the fields the engine relies on for a new-order intent.
    pub fn validate(&self) -> Result<(), EngineError> {
        if self.quantity == 0 || self.remaining_quantity == 0 {
            return Err(EngineError::InvalidQuantity);
        }
        if self.remaining_quantity > self.quantity {
            return Err(EngineError::InvalidQuantity);
        }
        if self.is_limit() && self.limit_price.is_none() {
            return Err(EngineError::MissingLimitPrice);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn side_parse_is_case_insensitive_and_rejects_unknown() {
        assert_eq!(Side::parse("buy").unwrap(), Side::Buy);
        assert_eq!(Side::parse("SELL").unwrap(), Side::Sell);
        let err = Side::parse("hold").unwrap_err();
        assert!(matches!(err, EngineError::InvalidSide(ref s) if s == "hold"));
    }

    #[test]
    fn new_order_limit_requires_positive_price() {
        assert!(matches!(
            NewOrder::parse("buy", 1, "limit", None),
            Err(EngineError::MissingLimitPrice)
        ));
        assert!(matches!(
            NewOrder::parse("buy", 1, "limit", Some(Decimal::ZERO)),
            Err(EngineError::InvalidPrice(_))
        ));
        assert!(matches!(
            NewOrder::parse("buy", 0, "market", None),
            Err(EngineError::InvalidQuantity)
        ));
    }

    #[test]
    fn new_order_market_drops_price() {
        let order = NewOrder::parse("sell", 3, "market", Some(Decimal::from(7)))
            .unwrap()
            .into_order(OrderId(9));
        assert_eq!(order.limit_price, None);
        assert_eq!(order.remaining_quantity, 3);
        assert!(!order.cancel_requested);
    }

    #[test]
    fn limit_taker_acceptance_by_side() {
        let buy = Order::limit(OrderId(1), Side::Buy, 1, Decimal::from(5));
        assert!(buy.accepts(Decimal::from(5)));
        assert!(buy.accepts(Decimal::from(4)));
        assert!(!buy.accepts(Decimal::from(10)));

        let sell = Order::limit(OrderId(2), Side::Sell, 1, Decimal::from(5));
        assert!(sell.accepts(Decimal::from(6)));
        assert!(!sell.accepts(Decimal::from(4)));

        let market = Order::market(OrderId(3), Side::Buy, 1);
        assert!(market.accepts(Decimal::from(1_000_000)));
    }
}
