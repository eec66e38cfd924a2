use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use fuelops_core::money::HUNDRED;
use fuelops_core::{DomainError, DomainResult, Money};

/// How a customer paid.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentChannel {
    Card,
    /// Fleet/company vouchers ("notas").
    Voucher,
    InstantTransfer,
    Cash,
}

impl PaymentChannel {
    pub const ALL: [PaymentChannel; 4] = [
        PaymentChannel::Card,
        PaymentChannel::Voucher,
        PaymentChannel::InstantTransfer,
        PaymentChannel::Cash,
    ];

    pub fn is_cash(self) -> bool {
        matches!(self, PaymentChannel::Cash)
    }
}

/// `amount` reduced by a percentage fee.
pub fn net_of_fee(amount: Money, fee_percent: Decimal) -> Money {
    amount * (Decimal::ONE - fee_percent / HUNDRED)
}

/// Declared total for one payment channel on a closing, with the acquirer fee.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentEntry {
    pub channel: PaymentChannel,
    pub amount: Money,
    pub fee_percent: Decimal,
}

impl PaymentEntry {
    pub fn new(channel: PaymentChannel, amount: Money, fee_percent: Decimal) -> DomainResult<Self> {
        if amount < Decimal::ZERO {
            return Err(DomainError::invalid_input(format!(
                "{channel:?} amount cannot be negative (got {amount})"
            )));
        }
        if fee_percent < Decimal::ZERO || fee_percent > HUNDRED {
            return Err(DomainError::invalid_input(format!(
                "{channel:?} fee must be within 0..=100 percent (got {fee_percent})"
            )));
        }
        Ok(Self {
            channel,
            amount,
            fee_percent,
        })
    }

    pub fn fee(&self) -> Money {
        self.amount - self.net()
    }

    pub fn net(&self) -> Money {
        net_of_fee(self.amount, self.fee_percent)
    }
}

/// Amounts per channel, as declared by an attendant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ChannelAmounts {
    pub card: Money,
    pub voucher: Money,
    pub instant_transfer: Money,
    pub cash: Money,
}

impl ChannelAmounts {
    pub fn get(&self, channel: PaymentChannel) -> Money {
        match channel {
            PaymentChannel::Card => self.card,
            PaymentChannel::Voucher => self.voucher,
            PaymentChannel::InstantTransfer => self.instant_transfer,
            PaymentChannel::Cash => self.cash,
        }
    }

    pub fn set(&mut self, channel: PaymentChannel, amount: Money) {
        match channel {
            PaymentChannel::Card => self.card = amount,
            PaymentChannel::Voucher => self.voucher = amount,
            PaymentChannel::InstantTransfer => self.instant_transfer = amount,
            PaymentChannel::Cash => self.cash = amount,
        }
    }

    pub fn total(&self) -> Money {
        self.card + self.voucher + self.instant_transfer + self.cash
    }

    pub fn non_cash(&self) -> Money {
        self.total() - self.cash
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fee_reduces_net_only() {
        let entry = PaymentEntry::new(PaymentChannel::Card, Decimal::new(1000, 0), Decimal::new(25, 1)).unwrap();
        assert_eq!(entry.net(), Decimal::new(975, 0));
        assert_eq!(entry.fee(), Decimal::new(25, 0));
        assert_eq!(entry.amount, Decimal::new(1000, 0));
    }

    #[test]
    fn out_of_range_fee_is_invalid_input() {
        let err = PaymentEntry::new(PaymentChannel::Voucher, Decimal::TEN, Decimal::new(101, 0)).unwrap_err();
        assert!(err.is_invalid_input());
        let err = PaymentEntry::new(PaymentChannel::Cash, Decimal::NEGATIVE_ONE, Decimal::ZERO).unwrap_err();
        assert!(err.is_invalid_input());
    }

    #[test]
    fn channel_amounts_split_cash() {
        let mut amounts = ChannelAmounts::default();
        amounts.set(PaymentChannel::Card, Decimal::new(300, 0));
        amounts.set(PaymentChannel::InstantTransfer, Decimal::new(120, 0));
        amounts.set(PaymentChannel::Cash, Decimal::new(80, 0));

        assert_eq!(amounts.total(), Decimal::new(500, 0));
        assert_eq!(amounts.non_cash(), Decimal::new(420, 0));
        assert_eq!(amounts.get(PaymentChannel::Voucher), Decimal::ZERO);
    }

    #[test]
    fn channel_tags_serialize_snake_case() {
        let json = serde_json::to_string(&PaymentChannel::InstantTransfer).unwrap();
        assert_eq!(json, "\"instant_transfer\"");
    }
}
