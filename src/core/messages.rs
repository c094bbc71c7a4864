use crate::core::types::MessageType;

/// Common header shared by every ITCH message.
///
/// On the wire the header occupies the first 11 bytes of each message:
/// the tag byte, two big-endian u16 fields, and a 48-bit big-endian
/// timestamp (nanoseconds since midnight) that is widened to u64 here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MessageHeader {
    pub message_type: u8,
    pub stock_locate: u16,
    pub tracking_number: u16,
    pub timestamp: u64,
}

/// Add Order (tag `A`). The dominant message type in the feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AddOrder {
    pub header: MessageHeader,
    pub order_reference_number: u64,
    pub buy_sell_indicator: u8,
    pub shares: u32,
    pub stock: [u8; 8],
    pub price: u32,
}

/// Order Executed (tag `E`). Second most common.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecuteOrder {
    pub header: MessageHeader,
    pub order_reference_number: u64,
    pub executed_shares: u32,
    pub match_number: u64,
}

/// Order Executed With Price (tag `C`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecuteOrderWithPrice {
    pub header: MessageHeader,
    pub order_reference_number: u64,
    pub executed_shares: u32,
    pub match_number: u64,
    pub printable: u8,
    pub execution_price: u32,
}

/// Order Cancel (tag `X`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderCancel {
    pub header: MessageHeader,
    pub order_reference_number: u64,
    pub cancelled_shares: u32,
}

/// Order Delete (tag `D`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderDelete {
    pub header: MessageHeader,
    pub order_reference_number: u64,
}

/// Order Replace (tag `U`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderReplace {
    pub header: MessageHeader,
    pub original_order_reference_number: u64,
    pub new_order_reference_number: u64,
    pub shares: u32,
    pub price: u32,
}

/// Non-cross Trade (tag `P`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Trade {
    pub header: MessageHeader,
    pub order_reference_number: u64,
    pub buy_sell_indicator: u8,
    pub shares: u32,
    pub stock: [u8; 8],
    pub price: u32,
    pub match_number: u64,
}

/// System Event (tag `S`). The last four bytes of the record are reserved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SystemEvent {
    pub header: MessageHeader,
    pub event_code: u8,
}

/// Stock Directory (tag `R`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StockDirectory {
    pub header: MessageHeader,
    pub stock: [u8; 8],
    pub market_category: u8,
    pub financial_status_indicator: u8,
    pub round_lot_size: u32,
    pub round_lots_only: u8,
    pub issue_classification: u8,
    pub issue_sub_type: [u8; 2],
    pub authenticity: u8,
    pub short_sale_threshold_indicator: u8,
    pub ipo_flag: u8,
    pub luld_reference_price_tier: u8,
    pub etp_flag: u8,
    pub etp_leverage_factor: u32,
    pub inverse_indicator: u8,
}

/// Host-endian decoded message, one variant per recognized tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageBody {
    AddOrder(AddOrder),
    ExecuteOrder(ExecuteOrder),
    ExecuteOrderWithPrice(ExecuteOrderWithPrice),
    OrderCancel(OrderCancel),
    OrderDelete(OrderDelete),
    OrderReplace(OrderReplace),
    Trade(Trade),
    SystemEvent(SystemEvent),
    StockDirectory(StockDirectory),
}

/// A decoded message plus the local clock sample taken right after field
/// extraction. The timestamp is latency instrumentation, not a wire field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParsedMessage {
    pub body: MessageBody,
    pub parse_timestamp_ns: u64,
}

// Native-endian field accessors for the serialized record image. The
// on-disk record keeps the wire offsets but stores integers in host byte
// order; the 48-bit timestamp keeps its 6-byte width.

#[inline(always)]
fn put_u16_ne(buf: &mut [u8], value: u16) {
    buf[..2].copy_from_slice(&value.to_ne_bytes());
}

#[inline(always)]
fn put_u32_ne(buf: &mut [u8], value: u32) {
    buf[..4].copy_from_slice(&value.to_ne_bytes());
}

#[inline(always)]
fn put_u64_ne(buf: &mut [u8], value: u64) {
    buf[..8].copy_from_slice(&value.to_ne_bytes());
}

#[inline(always)]
fn put_u48_ne(buf: &mut [u8], value: u64) {
    let bytes = value.to_ne_bytes();
    #[cfg(target_endian = "little")]
    buf[..6].copy_from_slice(&bytes[..6]);
    #[cfg(target_endian = "big")]
    buf[..6].copy_from_slice(&bytes[2..]);
}

#[inline(always)]
fn get_u16_ne(buf: &[u8]) -> u16 {
    u16::from_ne_bytes([buf[0], buf[1]])
}

#[inline(always)]
fn get_u32_ne(buf: &[u8]) -> u32 {
    u32::from_ne_bytes([buf[0], buf[1], buf[2], buf[3]])
}

#[inline(always)]
fn get_u64_ne(buf: &[u8]) -> u64 {
    u64::from_ne_bytes([
        buf[0], buf[1], buf[2], buf[3], buf[4], buf[5], buf[6], buf[7],
    ])
}

#[inline(always)]
fn get_u48_ne(buf: &[u8]) -> u64 {
    #[cfg(target_endian = "little")]
    return u64::from_ne_bytes([buf[0], buf[1], buf[2], buf[3], buf[4], buf[5], 0, 0]);
    #[cfg(target_endian = "big")]
    return u64::from_ne_bytes([0, 0, buf[0], buf[1], buf[2], buf[3], buf[4], buf[5]]);
}

impl MessageHeader {
    /// Serialized header width.
    pub const SIZE: usize = 11;

    #[inline(always)]
    fn encode_into(&self, buf: &mut [u8]) {
        buf[0] = self.message_type;
        put_u16_ne(&mut buf[1..3], self.stock_locate);
        put_u16_ne(&mut buf[3..5], self.tracking_number);
        put_u48_ne(&mut buf[5..11], self.timestamp);
    }

    #[inline(always)]
    fn decode_host(buf: &[u8]) -> MessageHeader {
        MessageHeader {
            message_type: buf[0],
            stock_locate: get_u16_ne(&buf[1..3]),
            tracking_number: get_u16_ne(&buf[3..5]),
            timestamp: get_u48_ne(&buf[5..11]),
        }
    }
}

impl MessageBody {
    /// The tag this variant carries.
    #[inline(always)]
    pub fn message_type(&self) -> MessageType {
        match self {
            MessageBody::AddOrder(_) => MessageType::AddOrder,
            MessageBody::ExecuteOrder(_) => MessageType::ExecuteOrder,
            MessageBody::ExecuteOrderWithPrice(_) => MessageType::ExecuteOrderWithPrice,
            MessageBody::OrderCancel(_) => MessageType::OrderCancel,
            MessageBody::OrderDelete(_) => MessageType::OrderDelete,
            MessageBody::OrderReplace(_) => MessageType::OrderReplace,
            MessageBody::Trade(_) => MessageType::Trade,
            MessageBody::SystemEvent(_) => MessageType::SystemEvent,
            MessageBody::StockDirectory(_) => MessageType::StockDirectory,
        }
    }

    /// The common header of the contained message.
    #[inline(always)]
    pub fn header(&self) -> &MessageHeader {
        match self {
            MessageBody::AddOrder(m) => &m.header,
            MessageBody::ExecuteOrder(m) => &m.header,
            MessageBody::ExecuteOrderWithPrice(m) => &m.header,
            MessageBody::OrderCancel(m) => &m.header,
            MessageBody::OrderDelete(m) => &m.header,
            MessageBody::OrderReplace(m) => &m.header,
            MessageBody::Trade(m) => &m.header,
            MessageBody::SystemEvent(m) => &m.header,
            MessageBody::StockDirectory(m) => &m.header,
        }
    }

    /// Serialized record width; identical to the wire width for the tag.
    #[inline(always)]
    pub fn wire_size(&self) -> usize {
        self.message_type().wire_size()
    }

    /// Writes the host-endian record image into `buf` and returns the
    /// number of bytes written. `buf` must hold at least `wire_size()`
    /// bytes.
    pub fn encode_into(&self, buf: &mut [u8]) -> usize {
        let size = self.wire_size();
        let buf = &mut buf[..size];
        self.header().encode_into(buf);
        match self {
            MessageBody::AddOrder(m) => {
                put_u64_ne(&mut buf[11..19], m.order_reference_number);
                buf[19] = m.buy_sell_indicator;
                put_u32_ne(&mut buf[20..24], m.shares);
                buf[24..32].copy_from_slice(&m.stock);
                put_u32_ne(&mut buf[32..36], m.price);
            }
            MessageBody::ExecuteOrder(m) => {
                put_u64_ne(&mut buf[11..19], m.order_reference_number);
                put_u32_ne(&mut buf[19..23], m.executed_shares);
                put_u64_ne(&mut buf[23..31], m.match_number);
            }
            MessageBody::ExecuteOrderWithPrice(m) => {
                put_u64_ne(&mut buf[11..19], m.order_reference_number);
                put_u32_ne(&mut buf[19..23], m.executed_shares);
                put_u64_ne(&mut buf[23..31], m.match_number);
                buf[31] = m.printable;
                put_u32_ne(&mut buf[32..36], m.execution_price);
            }
            MessageBody::OrderCancel(m) => {
                put_u64_ne(&mut buf[11..19], m.order_reference_number);
                put_u32_ne(&mut buf[19..23], m.cancelled_shares);
            }
            MessageBody::OrderDelete(m) => {
                put_u64_ne(&mut buf[11..19], m.order_reference_number);
            }
            MessageBody::OrderReplace(m) => {
                put_u64_ne(&mut buf[11..19], m.original_order_reference_number);
                put_u64_ne(&mut buf[19..27], m.new_order_reference_number);
                put_u32_ne(&mut buf[27..31], m.shares);
                put_u32_ne(&mut buf[31..35], m.price);
            }
            MessageBody::Trade(m) => {
                put_u64_ne(&mut buf[11..19], m.order_reference_number);
                buf[19] = m.buy_sell_indicator;
                put_u32_ne(&mut buf[20..24], m.shares);
                buf[24..32].copy_from_slice(&m.stock);
                put_u32_ne(&mut buf[32..36], m.price);
                put_u64_ne(&mut buf[36..44], m.match_number);
            }
            MessageBody::SystemEvent(m) => {
                buf[11] = m.event_code;
                buf[12..16].fill(0);
            }
            MessageBody::StockDirectory(m) => {
                buf[11..19].copy_from_slice(&m.stock);
                buf[19] = m.market_category;
                buf[20] = m.financial_status_indicator;
                put_u32_ne(&mut buf[21..25], m.round_lot_size);
                buf[25] = m.round_lots_only;
                buf[26] = m.issue_classification;
                buf[27..29].copy_from_slice(&m.issue_sub_type);
                buf[29] = m.authenticity;
                buf[30] = m.short_sale_threshold_indicator;
                buf[31] = m.ipo_flag;
                buf[32] = m.luld_reference_price_tier;
                buf[33] = m.etp_flag;
                put_u32_ne(&mut buf[34..38], m.etp_leverage_factor);
                buf[38] = m.inverse_indicator;
            }
        }
        size
    }

    /// Parses one record back from its serialized host-endian image.
    /// Returns the record and the number of bytes consumed; `None` when
    /// `buf` does not start with a complete record.
    pub fn from_host_bytes(buf: &[u8]) -> Option<(MessageBody, usize)> {
        if buf.is_empty() {
            return None;
        }
        let mt = MessageType::from_wire(buf[0])?;
        let size = mt.wire_size();
        if buf.len() < size {
            return None;
        }
        let buf = &buf[..size];
        let header = MessageHeader::decode_host(buf);
        let body = match mt {
            MessageType::AddOrder => MessageBody::AddOrder(AddOrder {
                header,
                order_reference_number: get_u64_ne(&buf[11..19]),
                buy_sell_indicator: buf[19],
                shares: get_u32_ne(&buf[20..24]),
                stock: buf[24..32].try_into().ok()?,
                price: get_u32_ne(&buf[32..36]),
            }),
            MessageType::ExecuteOrder => MessageBody::ExecuteOrder(ExecuteOrder {
                header,
                order_reference_number: get_u64_ne(&buf[11..19]),
                executed_shares: get_u32_ne(&buf[19..23]),
                match_number: get_u64_ne(&buf[23..31]),
            }),
            MessageType::ExecuteOrderWithPrice => {
                MessageBody::ExecuteOrderWithPrice(ExecuteOrderWithPrice {
                    header,
                    order_reference_number: get_u64_ne(&buf[11..19]),
                    executed_shares: get_u32_ne(&buf[19..23]),
                    match_number: get_u64_ne(&buf[23..31]),
                    printable: buf[31],
                    execution_price: get_u32_ne(&buf[32..36]),
                })
            }
            MessageType::OrderCancel => MessageBody::OrderCancel(OrderCancel {
                header,
                order_reference_number: get_u64_ne(&buf[11..19]),
                cancelled_shares: get_u32_ne(&buf[19..23]),
            }),
            MessageType::OrderDelete => MessageBody::OrderDelete(OrderDelete {
                header,
                order_reference_number: get_u64_ne(&buf[11..19]),
            }),
            MessageType::OrderReplace => MessageBody::OrderReplace(OrderReplace {
                header,
                original_order_reference_number: get_u64_ne(&buf[11..19]),
                new_order_reference_number: get_u64_ne(&buf[19..27]),
                shares: get_u32_ne(&buf[27..31]),
                price: get_u32_ne(&buf[31..35]),
            }),
            MessageType::Trade => MessageBody::Trade(Trade {
                header,
                order_reference_number: get_u64_ne(&buf[11..19]),
                buy_sell_indicator: buf[19],
                shares: get_u32_ne(&buf[20..24]),
                stock: buf[24..32].try_into().ok()?,
                price: get_u32_ne(&buf[32..36]),
                match_number: get_u64_ne(&buf[36..44]),
            }),
            MessageType::SystemEvent => MessageBody::SystemEvent(SystemEvent {
                header,
                event_code: buf[11],
            }),
            MessageType::StockDirectory => MessageBody::StockDirectory(StockDirectory {
                header,
                stock: buf[11..19].try_into().ok()?,
                market_category: buf[19],
                financial_status_indicator: buf[20],
                round_lot_size: get_u32_ne(&buf[21..25]),
                round_lots_only: buf[25],
                issue_classification: buf[26],
                issue_sub_type: buf[27..29].try_into().ok()?,
                authenticity: buf[29],
                short_sale_threshold_indicator: buf[30],
                ipo_flag: buf[31],
                luld_reference_price_tier: buf[32],
                etp_flag: buf[33],
                etp_leverage_factor: get_u32_ne(&buf[34..38]),
                inverse_indicator: buf[38],
            }),
        };
        Some((body, size))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header(mt: MessageType) -> MessageHeader {
        MessageHeader {
            message_type: mt.as_u8(),
            stock_locate: 7,
            tracking_number: 42,
            timestamp: 34_200_000_000_123,
        }
    }

    #[test]
    fn test_add_order_host_round_trip() {
        let body = MessageBody::AddOrder(AddOrder {
            header: header(MessageType::AddOrder),
            order_reference_number: 0x0102_0304_0506_0708,
            buy_sell_indicator: b'S',
            shares: 250,
            stock: *b"NVDA    ",
            price: 5_000_000,
        });
        let mut buf = [0u8; 64];
        let written = body.encode_into(&mut buf);
        assert_eq!(written, 36);

        let (decoded, consumed) = MessageBody::from_host_bytes(&buf).unwrap();
        assert_eq!(consumed, 36);
        assert_eq!(decoded, body);
    }

    #[test]
    fn test_stock_directory_host_round_trip() {
        let body = MessageBody::StockDirectory(StockDirectory {
            header: header(MessageType::StockDirectory),
            stock: *b"AAPL    ",
            market_category: b'Q',
            financial_status_indicator: b'N',
            round_lot_size: 100,
            round_lots_only: b'N',
            issue_classification: b'C',
            issue_sub_type: *b"Z ",
            authenticity: b'P',
            short_sale_threshold_indicator: b'N',
            ipo_flag: b'N',
            luld_reference_price_tier: b'1',
            etp_flag: b'N',
            etp_leverage_factor: 0,
            inverse_indicator: b'N',
        });
        let mut buf = [0u8; 64];
        assert_eq!(body.encode_into(&mut buf), 39);

        let (decoded, consumed) = MessageBody::from_host_bytes(&buf).unwrap();
        assert_eq!(consumed, 39);
        assert_eq!(decoded, body);
    }

    #[test]
    fn test_system_event_reserved_tail_zeroed() {
        let body = MessageBody::SystemEvent(SystemEvent {
            header: header(MessageType::SystemEvent),
            event_code: b'O',
        });
        let mut buf = [0xffu8; 64];
        assert_eq!(body.encode_into(&mut buf), 16);
        assert_eq!(&buf[12..16], &[0, 0, 0, 0]);

        let (decoded, _) = MessageBody::from_host_bytes(&buf).unwrap();
        assert_eq!(decoded, body);
    }

    #[test]
    fn test_from_host_bytes_rejects_truncated() {
        let body = MessageBody::OrderDelete(OrderDelete {
            header: header(MessageType::OrderDelete),
            order_reference_number: 12345,
        });
        let mut buf = [0u8; 64];
        let written = body.encode_into(&mut buf);
        assert!(MessageBody::from_host_bytes(&buf[..written - 1]).is_none());
        assert!(MessageBody::from_host_bytes(&[]).is_none());
    }

    #[test]
    fn test_from_host_bytes_rejects_unknown_tag() {
        let buf = [b'Z'; 64];
        assert!(MessageBody::from_host_bytes(&buf).is_none());
    }
}
