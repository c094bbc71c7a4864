//! Synthetic wire-message builder for the demo binary, benches, and tests.
//! Produces big-endian framed spans shaped exactly like the live feed.

use chrono::Timelike;

use crate::core::types::MessageType;

const TIMESTAMP_MASK: u64 = (1 << 48) - 1;

/// Nanoseconds since local midnight, the clock the feed stamps messages
/// with.
pub fn nanos_since_midnight() -> u64 {
    let now = chrono::Local::now().time();
    now.num_seconds_from_midnight() as u64 * 1_000_000_000 + now.nanosecond() as u64
}

#[inline]
fn put_be16(buf: &mut [u8], value: u16) {
    buf[..2].copy_from_slice(&value.to_be_bytes());
}

#[inline]
fn put_be32(buf: &mut [u8], value: u32) {
    buf[..4].copy_from_slice(&value.to_be_bytes());
}

#[inline]
fn put_be48(buf: &mut [u8], value: u64) {
    buf[..6].copy_from_slice(&value.to_be_bytes()[2..]);
}

#[inline]
fn put_be64(buf: &mut [u8], value: u64) {
    buf[..8].copy_from_slice(&value.to_be_bytes());
}

fn padded_symbol(symbol: &str) -> [u8; 8] {
    let mut stock = [b' '; 8];
    let bytes = symbol.as_bytes();
    let len = bytes.len().min(8);
    stock[..len].copy_from_slice(&bytes[..len]);
    stock
}

fn header(buf: &mut [u8], tag: MessageType, stock_locate: u16, tracking: u16, timestamp: u64) {
    buf[0] = tag.as_u8();
    put_be16(&mut buf[1..3], stock_locate);
    put_be16(&mut buf[3..5], tracking);
    put_be48(&mut buf[5..11], timestamp & TIMESTAMP_MASK);
}

/// Builds synthetic ITCH messages with monotonically advancing tracking,
/// order-reference, and match numbers.
pub struct FeedGenerator {
    tracking: u16,
    next_order_ref: u64,
    next_match: u64,
}

impl FeedGenerator {
    pub fn new() -> Self {
        Self {
            tracking: 0,
            next_order_ref: 100_000,
            next_match: 500_000,
        }
    }

    fn next_tracking(&mut self) -> u16 {
        self.tracking = self.tracking.wrapping_add(1);
        self.tracking
    }

    pub fn add_order(&mut self, symbol: &str, side: u8, shares: u32, price: u32) -> Vec<u8> {
        let tracking = self.next_tracking();
        self.next_order_ref += 1;
        let mut msg = vec![0u8; MessageType::AddOrder.wire_size()];
        header(&mut msg, MessageType::AddOrder, 1, tracking, nanos_since_midnight());
        put_be64(&mut msg[11..19], self.next_order_ref);
        msg[19] = side;
        put_be32(&mut msg[20..24], shares);
        msg[24..32].copy_from_slice(&padded_symbol(symbol));
        put_be32(&mut msg[32..36], price);
        msg
    }

    pub fn execute_order(&mut self, order_ref: u64, executed_shares: u32) -> Vec<u8> {
        let tracking = self.next_tracking();
        self.next_match += 1;
        let mut msg = vec![0u8; MessageType::ExecuteOrder.wire_size()];
        header(&mut msg, MessageType::ExecuteOrder, 1, tracking, nanos_since_midnight());
        put_be64(&mut msg[11..19], order_ref);
        put_be32(&mut msg[19..23], executed_shares);
        put_be64(&mut msg[23..31], self.next_match);
        msg
    }

    pub fn trade(&mut self, symbol: &str, side: u8, shares: u32, price: u32) -> Vec<u8> {
        let tracking = self.next_tracking();
        self.next_order_ref += 1;
        self.next_match += 1;
        let mut msg = vec![0u8; MessageType::Trade.wire_size()];
        header(&mut msg, MessageType::Trade, 1, tracking, nanos_since_midnight());
        put_be64(&mut msg[11..19], self.next_order_ref);
        msg[19] = side;
        put_be32(&mut msg[20..24], shares);
        msg[24..32].copy_from_slice(&padded_symbol(symbol));
        put_be32(&mut msg[32..36], price);
        put_be64(&mut msg[36..44], self.next_match);
        msg
    }
}

impl Default for FeedGenerator {
    fn default() -> Self {
        Self::new()
    }
}

/// One well-formed wire image per recognized tag, with distinct field
/// values in every position. Fixture for identity tests and benches.
pub fn sample_messages() -> Vec<Vec<u8>> {
    let ts = 34_200_000_000_001u64;
    let mut out = Vec::new();

    let mut add = vec![0u8; 36];
    header(&mut add, MessageType::AddOrder, 11, 21, ts);
    put_be64(&mut add[11..19], 0x0101_0202_0303_0404);
    add[19] = b'B';
    put_be32(&mut add[20..24], 100);
    add[24..32].copy_from_slice(b"AAPL    ");
    put_be32(&mut add[32..36], 1_500_000);
    out.push(add);

    let mut exec = vec![0u8; 31];
    header(&mut exec, MessageType::ExecuteOrder, 12, 22, ts + 1);
    put_be64(&mut exec[11..19], 70_001);
    put_be32(&mut exec[19..23], 50);
    put_be64(&mut exec[23..31], 90_001);
    out.push(exec);

    let mut exec_px = vec![0u8; 36];
    header(&mut exec_px, MessageType::ExecuteOrderWithPrice, 13, 23, ts + 2);
    put_be64(&mut exec_px[11..19], 70_002);
    put_be32(&mut exec_px[19..23], 75);
    put_be64(&mut exec_px[23..31], 90_002);
    exec_px[31] = b'Y';
    put_be32(&mut exec_px[32..36], 2_345_600);
    out.push(exec_px);

    let mut cancel = vec![0u8; 23];
    header(&mut cancel, MessageType::OrderCancel, 14, 24, ts + 3);
    put_be64(&mut cancel[11..19], 70_003);
    put_be32(&mut cancel[19..23], 25);
    out.push(cancel);

    let mut delete = vec![0u8; 19];
    header(&mut delete, MessageType::OrderDelete, 15, 25, ts + 4);
    put_be64(&mut delete[11..19], 70_004);
    out.push(delete);

    let mut replace = vec![0u8; 35];
    header(&mut replace, MessageType::OrderReplace, 16, 26, ts + 5);
    put_be64(&mut replace[11..19], 70_005);
    put_be64(&mut replace[19..27], 70_006);
    put_be32(&mut replace[27..31], 200);
    put_be32(&mut replace[31..35], 3_210_000);
    out.push(replace);

    let mut trade = vec![0u8; 44];
    header(&mut trade, MessageType::Trade, 17, 27, ts + 6);
    put_be64(&mut trade[11..19], 70_007);
    trade[19] = b'S';
    put_be32(&mut trade[20..24], 300);
    trade[24..32].copy_from_slice(b"MSFT    ");
    put_be32(&mut trade[32..36], 3_200_000);
    put_be64(&mut trade[36..44], 90_003);
    out.push(trade);

    let mut event = vec![0u8; 16];
    header(&mut event, MessageType::SystemEvent, 0, 28, ts + 7);
    event[11] = b'O';
    out.push(event);

    let mut directory = vec![0u8; 39];
    header(&mut directory, MessageType::StockDirectory, 18, 29, ts + 8);
    directory[11..19].copy_from_slice(b"GOOGL   ");
    directory[19] = b'Q';
    directory[20] = b'N';
    put_be32(&mut directory[21..25], 100);
    directory[25] = b'N';
    directory[26] = b'C';
    directory[27..29].copy_from_slice(b"Z ");
    directory[29] = b'P';
    directory[30] = b'N';
    directory[31] = b'N';
    directory[32] = b'1';
    directory[33] = b'N';
    put_be32(&mut directory[34..38], 0);
    directory[38] = b'N';
    out.push(directory);

    out
}
