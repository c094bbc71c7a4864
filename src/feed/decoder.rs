use crate::core::messages::*;
use crate::core::types::{MessageType, MIN_MESSAGE_LEN};
use crate::utils::clock;

// Big-endian field readers. Every wire integer is read field-by-field from
// the byte slice; the source buffer carries no alignment guarantees.

#[inline(always)]
fn be_u16(b: &[u8]) -> u16 {
    u16::from_be_bytes([b[0], b[1]])
}

#[inline(always)]
fn be_u32(b: &[u8]) -> u32 {
    u32::from_be_bytes([b[0], b[1], b[2], b[3]])
}

#[inline(always)]
fn be_u48(b: &[u8]) -> u64 {
    u64::from_be_bytes([0, 0, b[0], b[1], b[2], b[3], b[4], b[5]])
}

#[inline(always)]
fn be_u64(b: &[u8]) -> u64 {
    u64::from_be_bytes([b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7]])
}

#[inline(always)]
fn stock_field(b: &[u8]) -> [u8; 8] {
    [b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7]]
}

/// Zero-copy ITCH 5.0 decoder.
///
/// Stateless and reentrant: any number of threads may decode through the
/// same instance. A decode never allocates, never blocks, and reports
/// every failure mode as `None`. Callers that need to distinguish
/// short buffers from unknown tags must layer their own checks.
#[derive(Debug, Default, Clone, Copy)]
pub struct ItchDecoder;

impl ItchDecoder {
    pub fn new() -> Self {
        ItchDecoder
    }

    /// Decodes one framed message span into a host-endian record.
    ///
    /// Returns `None` when the span is shorter than any recognized
    /// message, carries an unrecognized tag, or does not match the exact
    /// length of its declared type.
    #[inline]
    pub fn decode(&self, data: &[u8]) -> Option<ParsedMessage> {
        if data.len() < MIN_MESSAGE_LEN {
            return None;
        }

        let tag = data[0];

        // Add Order dominates feed volume (~40% of all messages); keep it
        // ahead of the dispatch table.
        if tag == MessageType::AddOrder.as_u8() {
            if data.len() != MessageType::AddOrder.wire_size() {
                return None;
            }
            return Some(Self::finish(Self::decode_add_order(data)));
        }

        // Order Executed is second (~25%).
        if tag == MessageType::ExecuteOrder.as_u8() {
            if data.len() != MessageType::ExecuteOrder.wire_size() {
                return None;
            }
            return Some(Self::finish(Self::decode_execute_order(data)));
        }

        let message_type = MessageType::from_wire(tag)?;
        if data.len() != message_type.wire_size() {
            return None;
        }

        let body = match message_type {
            MessageType::ExecuteOrderWithPrice => Self::decode_execute_with_price(data),
            MessageType::OrderCancel => Self::decode_order_cancel(data),
            MessageType::OrderDelete => Self::decode_order_delete(data),
            MessageType::OrderReplace => Self::decode_order_replace(data),
            MessageType::Trade => Self::decode_trade(data),
            MessageType::SystemEvent => Self::decode_system_event(data),
            MessageType::StockDirectory => Self::decode_stock_directory(data),
            // Handled on the fast path above.
            MessageType::AddOrder | MessageType::ExecuteOrder => return None,
        };
        Some(Self::finish(body))
    }

    /// Stamps the local clock after field extraction.
    #[inline(always)]
    fn finish(body: MessageBody) -> ParsedMessage {
        ParsedMessage {
            body,
            parse_timestamp_ns: clock::monotonic_nanos(),
        }
    }

    #[inline(always)]
    fn decode_header(data: &[u8]) -> MessageHeader {
        MessageHeader {
            message_type: data[0],
            stock_locate: be_u16(&data[1..3]),
            tracking_number: be_u16(&data[3..5]),
            timestamp: be_u48(&data[5..11]),
        }
    }

    #[inline(always)]
    fn decode_add_order(data: &[u8]) -> MessageBody {
        MessageBody::AddOrder(AddOrder {
            header: Self::decode_header(data),
            order_reference_number: be_u64(&data[11..19]),
            buy_sell_indicator: data[19],
            shares: be_u32(&data[20..24]),
            stock: stock_field(&data[24..32]),
            price: be_u32(&data[32..36]),
        })
    }

    #[inline(always)]
    fn decode_execute_order(data: &[u8]) -> MessageBody {
        MessageBody::ExecuteOrder(ExecuteOrder {
            header: Self::decode_header(data),
            order_reference_number: be_u64(&data[11..19]),
            executed_shares: be_u32(&data[19..23]),
            match_number: be_u64(&data[23..31]),
        })
    }

    #[inline(always)]
    fn decode_execute_with_price(data: &[u8]) -> MessageBody {
        MessageBody::ExecuteOrderWithPrice(ExecuteOrderWithPrice {
            header: Self::decode_header(data),
            order_reference_number: be_u64(&data[11..19]),
            executed_shares: be_u32(&data[19..23]),
            match_number: be_u64(&data[23..31]),
            printable: data[31],
            execution_price: be_u32(&data[32..36]),
        })
    }

    #[inline(always)]
    fn decode_order_cancel(data: &[u8]) -> MessageBody {
        MessageBody::OrderCancel(OrderCancel {
            header: Self::decode_header(data),
            order_reference_number: be_u64(&data[11..19]),
            cancelled_shares: be_u32(&data[19..23]),
        })
    }

    #[inline(always)]
    fn decode_order_delete(data: &[u8]) -> MessageBody {
        MessageBody::OrderDelete(OrderDelete {
            header: Self::decode_header(data),
            order_reference_number: be_u64(&data[11..19]),
        })
    }

    #[inline(always)]
    fn decode_order_replace(data: &[u8]) -> MessageBody {
        MessageBody::OrderReplace(OrderReplace {
            header: Self::decode_header(data),
            original_order_reference_number: be_u64(&data[11..19]),
            new_order_reference_number: be_u64(&data[19..27]),
            shares: be_u32(&data[27..31]),
            price: be_u32(&data[31..35]),
        })
    }

    #[inline(always)]
    fn decode_trade(data: &[u8]) -> MessageBody {
        MessageBody::Trade(Trade {
            header: Self::decode_header(data),
            order_reference_number: be_u64(&data[11..19]),
            buy_sell_indicator: data[19],
            shares: be_u32(&data[20..24]),
            stock: stock_field(&data[24..32]),
            price: be_u32(&data[32..36]),
            match_number: be_u64(&data[36..44]),
        })
    }

    #[inline(always)]
    fn decode_system_event(data: &[u8]) -> MessageBody {
        MessageBody::SystemEvent(SystemEvent {
            header: Self::decode_header(data),
            event_code: data[11],
        })
    }

    #[inline(always)]
    fn decode_stock_directory(data: &[u8]) -> MessageBody {
        MessageBody::StockDirectory(StockDirectory {
            header: Self::decode_header(data),
            stock: stock_field(&data[11..19]),
            market_category: data[19],
            financial_status_indicator: data[20],
            round_lot_size: be_u32(&data[21..25]),
            round_lots_only: data[25],
            issue_classification: data[26],
            issue_sub_type: [data[27], data[28]],
            authenticity: data[29],
            short_sale_threshold_indicator: data[30],
            ipo_flag: data[31],
            luld_reference_price_tier: data[32],
            etp_flag: data[33],
            etp_leverage_factor: be_u32(&data[34..38]),
            inverse_indicator: data[38],
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{price_to_f64, stock_symbol};
    use crate::feed::gen;

    #[test]
    fn test_decode_add_order() {
        let mut msg = vec![0u8; 36];
        msg[0] = b'A';
        msg[1..3].copy_from_slice(&123u16.to_be_bytes());
        msg[3..5].copy_from_slice(&456u16.to_be_bytes());
        msg[5..11].copy_from_slice(&1_234_567_890u64.to_be_bytes()[2..]);
        msg[11..19].copy_from_slice(&999_999u64.to_be_bytes());
        msg[19] = b'B';
        msg[20..24].copy_from_slice(&100u32.to_be_bytes());
        msg[24..32].copy_from_slice(b"AAPL    ");
        msg[32..36].copy_from_slice(&1_500_000u32.to_be_bytes());

        let decoder = ItchDecoder::new();
        let parsed = decoder.decode(&msg).unwrap();
        match parsed.body {
            MessageBody::AddOrder(order) => {
                assert_eq!(order.header.stock_locate, 123);
                assert_eq!(order.header.tracking_number, 456);
                assert_eq!(order.header.timestamp, 1_234_567_890);
                assert_eq!(order.order_reference_number, 999_999);
                assert_eq!(order.buy_sell_indicator, b'B');
                assert_eq!(order.shares, 100);
                assert_eq!(order.price, 1_500_000);
                assert_eq!(stock_symbol(&order.stock), "AAPL");
                assert_eq!(price_to_f64(order.price), 150.0);
            }
            other => panic!("wrong variant: {other:?}"),
        }
    }

    #[test]
    fn test_decode_execute_order() {
        let mut msg = vec![0u8; 31];
        msg[0] = b'E';
        msg[1..3].copy_from_slice(&1u16.to_be_bytes());
        msg[3..5].copy_from_slice(&2u16.to_be_bytes());
        msg[5..11].copy_from_slice(&9_876_543_210u64.to_be_bytes()[2..]);
        msg[11..19].copy_from_slice(&111_111u64.to_be_bytes());
        msg[19..23].copy_from_slice(&50u32.to_be_bytes());
        msg[23..31].copy_from_slice(&222_222u64.to_be_bytes());

        let parsed = ItchDecoder::new().decode(&msg).unwrap();
        match parsed.body {
            MessageBody::ExecuteOrder(exec) => {
                assert_eq!(exec.header.timestamp, 9_876_543_210);
                assert_eq!(exec.order_reference_number, 111_111);
                assert_eq!(exec.executed_shares, 50);
                assert_eq!(exec.match_number, 222_222);
            }
            other => panic!("wrong variant: {other:?}"),
        }
    }

    #[test]
    fn test_decode_rejects_short_buffer() {
        let decoder = ItchDecoder::new();
        assert!(decoder.decode(&[0u8; 5]).is_none());
        assert!(decoder.decode(&[]).is_none());
    }

    #[test]
    fn test_decode_rejects_unknown_tag() {
        let mut msg = vec![0u8; 36];
        msg[0] = b'Z';
        assert!(ItchDecoder::new().decode(&msg).is_none());
    }

    #[test]
    fn test_decode_rejects_unlisted_itch_tags() {
        // Tags that exist in the feed but have no decode path here.
        for tag in [b'F', b'H', b'Y', b'L', b'V', b'W', b'K', b'J', b'h', b'Q', b'B', b'I', b'N'] {
            let mut msg = vec![0u8; 40];
            msg[0] = tag;
            assert!(ItchDecoder::new().decode(&msg).is_none(), "tag {}", tag as char);
        }
    }

    #[test]
    fn test_decode_rejects_length_mismatch() {
        let mut msg = vec![0u8; 100];
        msg[0] = b'A';
        assert!(ItchDecoder::new().decode(&msg).is_none());

        // Every recognized tag, every wrong length around the true one.
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
            let size = mt.wire_size();
            for len in [size - 1, size + 1, size + 16] {
                let mut msg = vec![0u8; len];
                msg[0] = mt.as_u8();
                assert!(
                    ItchDecoder::new().decode(&msg).is_none(),
                    "tag {} len {}",
                    mt.as_u8() as char,
                    len
                );
            }
        }
    }

    #[test]
    fn test_decode_identity_every_type() {
        let decoder = ItchDecoder::new();
        for wire in gen::sample_messages() {
            let parsed = decoder
                .decode(&wire)
                .unwrap_or_else(|| panic!("tag {} must decode", wire[0] as char));
            let header = parsed.body.header();
            assert_eq!(header.message_type, wire[0]);
            assert_eq!(parsed.body.wire_size(), wire.len());

            // Big-endian header fields come back in host order.
            assert_eq!(header.stock_locate, u16::from_be_bytes([wire[1], wire[2]]));
            assert_eq!(
                header.tracking_number,
                u16::from_be_bytes([wire[3], wire[4]])
            );
            let mut ts = [0u8; 8];
            ts[2..].copy_from_slice(&wire[5..11]);
            assert_eq!(header.timestamp, u64::from_be_bytes(ts));

            // Body fields against the fixture values.
            match parsed.body {
                MessageBody::AddOrder(m) => {
                    assert_eq!(m.order_reference_number, 0x0101_0202_0303_0404);
                    assert_eq!(m.buy_sell_indicator, b'B');
                    assert_eq!(m.shares, 100);
                    assert_eq!(&m.stock, b"AAPL    ");
                    assert_eq!(m.price, 1_500_000);
                }
                MessageBody::ExecuteOrder(m) => {
                    assert_eq!(m.order_reference_number, 70_001);
                    assert_eq!(m.executed_shares, 50);
                    assert_eq!(m.match_number, 90_001);
                }
                MessageBody::ExecuteOrderWithPrice(m) => {
                    assert_eq!(m.order_reference_number, 70_002);
                    assert_eq!(m.executed_shares, 75);
                    assert_eq!(m.match_number, 90_002);
                    assert_eq!(m.printable, b'Y');
                    assert_eq!(m.execution_price, 2_345_600);
                }
                MessageBody::OrderCancel(m) => {
                    assert_eq!(m.order_reference_number, 70_003);
                    assert_eq!(m.cancelled_shares, 25);
                }
                MessageBody::OrderDelete(m) => {
                    assert_eq!(m.order_reference_number, 70_004);
                }
                MessageBody::OrderReplace(m) => {
                    assert_eq!(m.original_order_reference_number, 70_005);
                    assert_eq!(m.new_order_reference_number, 70_006);
                    assert_eq!(m.shares, 200);
                    assert_eq!(m.price, 3_210_000);
                }
                MessageBody::Trade(m) => {
                    assert_eq!(m.order_reference_number, 70_007);
                    assert_eq!(m.buy_sell_indicator, b'S');
                    assert_eq!(m.shares, 300);
                    assert_eq!(&m.stock, b"MSFT    ");
                    assert_eq!(m.price, 3_200_000);
                    assert_eq!(m.match_number, 90_003);
                }
                MessageBody::SystemEvent(m) => {
                    assert_eq!(m.event_code, b'O');
                }
                MessageBody::StockDirectory(m) => {
                    assert_eq!(&m.stock, b"GOOGL   ");
                    assert_eq!(m.market_category, b'Q');
                    assert_eq!(m.financial_status_indicator, b'N');
                    assert_eq!(m.round_lot_size, 100);
                    assert_eq!(m.round_lots_only, b'N');
                    assert_eq!(m.issue_classification, b'C');
                    assert_eq!(&m.issue_sub_type, b"Z ");
                    assert_eq!(m.authenticity, b'P');
                    assert_eq!(m.short_sale_threshold_indicator, b'N');
                    assert_eq!(m.ipo_flag, b'N');
                    assert_eq!(m.luld_reference_price_tier, b'1');
                    assert_eq!(m.etp_flag, b'N');
                    assert_eq!(m.etp_leverage_factor, 0);
                    assert_eq!(m.inverse_indicator, b'N');
                }
            }
        }
    }

    #[test]
    fn test_parse_timestamp_monotonic() {
        let decoder = ItchDecoder::new();
        let wire = gen::sample_messages().remove(0);
        let mut prev = 0u64;
        for _ in 0..1000 {
            let parsed = decoder.decode(&wire).unwrap();
            assert!(parsed.parse_timestamp_ns >= prev);
            prev = parsed.parse_timestamp_ns;
        }
    }

    #[test]
    fn test_endian_round_trip() {
        for value in [0u64, 1, 0x1234, 0x1234_5678, 0x1234_5678_9abc_def0, u64::MAX] {
            assert_eq!(u64::from_be(u64::to_be(value)), value);
            let v32 = value as u32;
            assert_eq!(u32::from_be(u32::to_be(v32)), v32);
            let v16 = value as u16;
            assert_eq!(u16::from_be(u16::to_be(v16)), v16);
        }
        assert_eq!(be_u16(&[0x12, 0x34]), 0x1234);
        assert_eq!(be_u32(&[0x12, 0x34, 0x56, 0x78]), 0x1234_5678);
        assert_eq!(
            be_u64(&[0x12, 0x34, 0x56, 0x78, 0x9a, 0xbc, 0xde, 0xf0]),
            0x1234_5678_9abc_def0
        );
        assert_eq!(be_u48(&[0x12, 0x34, 0x56, 0x78, 0x9a, 0xbc]), 0x1234_5678_9abc);
    }
}
