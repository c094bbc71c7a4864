/// NASDAQ ITCH 5.0 message tags with a decode path.
///
/// The feed carries more administrative tags than these (`F`, `H`, `Y`,
/// `Q`, ...); anything outside this set is rejected by the decoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum MessageType {
    AddOrder = b'A',
    ExecuteOrder = b'E',
    ExecuteOrderWithPrice = b'C',
    OrderCancel = b'X',
    OrderDelete = b'D',
    OrderReplace = b'U',
    Trade = b'P',
    SystemEvent = b'S',
    StockDirectory = b'R',
}

/// Floor applied before tag dispatch; no recognized message is shorter.
pub const MIN_MESSAGE_LEN: usize = 15;

impl MessageType {
    /// Maps a wire tag byte to a recognized message type.
    #[inline(always)]
    pub fn from_wire(tag: u8) -> Option<MessageType> {
        match tag {
            b'A' => Some(MessageType::AddOrder),
            b'E' => Some(MessageType::ExecuteOrder),
            b'C' => Some(MessageType::ExecuteOrderWithPrice),
            b'X' => Some(MessageType::OrderCancel),
            b'D' => Some(MessageType::OrderDelete),
            b'U' => Some(MessageType::OrderReplace),
            b'P' => Some(MessageType::Trade),
            b'S' => Some(MessageType::SystemEvent),
            b'R' => Some(MessageType::StockDirectory),
            _ => None,
        }
    }

    /// Total message length on the wire, header included. The same widths
    /// apply to the serialized host-endian form the writer emits.
    #[inline(always)]
    pub const fn wire_size(self) -> usize {
        match self {
            MessageType::AddOrder => 36,
            MessageType::ExecuteOrder => 31,
            MessageType::ExecuteOrderWithPrice => 36,
            MessageType::OrderCancel => 23,
            MessageType::OrderDelete => 19,
            MessageType::OrderReplace => 35,
            MessageType::Trade => 44,
            MessageType::SystemEvent => 16,
            MessageType::StockDirectory => 39,
        }
    }

    #[inline(always)]
    pub const fn as_u8(self) -> u8 {
        self as u8
    }
}

/// Number of implied decimal places in ITCH price fields.
pub const PRICE_DECIMALS: u32 = 4;
const PRICE_SCALE: f64 = 10_000.0;

/// Converts a fixed-point ITCH price to its decimal value.
#[inline(always)]
pub fn price_to_f64(price: u32) -> f64 {
    price as f64 / PRICE_SCALE
}

/// Extracts the logical symbol from an 8-byte space-padded stock field.
/// Only trailing spaces are trimmed; embedded spaces are preserved.
#[inline(always)]
pub fn stock_symbol(stock: &[u8; 8]) -> &str {
    let mut len = stock.len();
    while len > 0 && stock[len - 1] == b' ' {
        len -= 1;
    }
    std::str::from_utf8(&stock[..len]).unwrap_or("")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_sizes() {
        assert_eq!(MessageType::AddOrder.wire_size(), 36);
        assert_eq!(MessageType::ExecuteOrder.wire_size(), 31);
        assert_eq!(MessageType::ExecuteOrderWithPrice.wire_size(), 36);
        assert_eq!(MessageType::OrderCancel.wire_size(), 23);
        assert_eq!(MessageType::OrderDelete.wire_size(), 19);
        assert_eq!(MessageType::OrderReplace.wire_size(), 35);
        assert_eq!(MessageType::Trade.wire_size(), 44);
        assert_eq!(MessageType::SystemEvent.wire_size(), 16);
        assert_eq!(MessageType::StockDirectory.wire_size(), 39);
    }

    #[test]
    fn test_tag_round_trip() {
        for mt in [
            MessageType::AddOrder,
            MessageType::ExecuteOrder,
            MessageType::ExecuteOrderWithPrice,
            MessageType::OrderCancel,
            MessageType::OrderDelete,
            MessageType::OrderReplace,
            MessageType::Trade,
            MessageType::SystemEvent,
            MessageType::StockDirectory,
        ] {
            assert_eq!(MessageType::from_wire(mt.as_u8()), Some(mt));
        }
    }

    #[test]
    fn test_unrecognized_tags() {
        for tag in [b'F', b'H', b'Y', b'L', b'V', b'W', b'K', b'J', b'h', b'Q', b'B', b'I', b'N', b'Z', 0u8] {
            assert_eq!(MessageType::from_wire(tag), None);
        }
    }

    #[test]
    fn test_price_conversion() {
        assert_eq!(price_to_f64(1_500_000), 150.0);
        let p = price_to_f64(999_999);
        assert!(p > 99.999 && p < 100.0);
        assert_eq!(price_to_f64(0), 0.0);
    }

    #[test]
    fn test_stock_symbol_extraction() {
        assert_eq!(stock_symbol(b"AAPL    "), "AAPL");
        assert_eq!(stock_symbol(b"MSFT    "), "MSFT");
        assert_eq!(stock_symbol(b"LONGSYMB"), "LONGSYMB");
        assert_eq!(stock_symbol(b"A B     "), "A B");
        assert_eq!(stock_symbol(b"        "), "");
    }
}
