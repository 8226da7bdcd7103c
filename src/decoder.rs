//! Decode a framed ITCH message body into a typed record.
//!
//! All multi-byte fields on the wire are big-endian; every value is
//! converted to host order here via [`crate::utils`]'s big-endian readers.

use crate::common::{Price, Side, SymbolIndex, Timestamp};
use crate::symbol_table::SymbolTable;
use crate::utils::{be_u32, be_u64, symbol_at};

/// A message type not carrying a book-affecting payload this crate
/// decodes structurally. Still counted and traceable by raw type byte,
/// rather than silently dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OtherMessage {
    pub msg_type: u8,
}

/// Fully decoded, book-or-risk-relevant message.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParsedMessage {
    pub ingress_ts: Timestamp,
    pub decode_ts: Timestamp,
    pub seq: u32,
    pub msg_type: u8,
    pub symbol_index: Option<SymbolIndex>,
    pub symbol_valid: bool,
    pub side: Option<Side>,
    pub price: Price,
    pub qty: u32,
    pub order_id: u64,
    pub is_book_affecting: bool,
    pub stale: bool,
}

/// Result of decoding one framed message.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DecodedMessage {
    Parsed(ParsedMessage),
    Other(OtherMessage),
}

impl DecodedMessage {
    pub fn is_book_affecting(&self) -> bool {
        matches!(self, DecodedMessage::Parsed(m) if m.is_book_affecting)
    }
}

/// `true` for the message types that carry book mutations: 'A','F','E','C','X','D','U','P'.
pub fn is_book_affecting(msg_type: u8) -> bool {
    matches!(msg_type, b'A' | b'F' | b'E' | b'C' | b'X' | b'D' | b'U' | b'P')
}

/// Decode one framed ITCH message body (type byte and sequence already
/// consumed by the splitter; `body` is everything after the 4-byte seq).
pub fn decode(
    msg_type: u8,
    body: &[u8],
    seq: u32,
    ingress_ts: Timestamp,
    decode_ts: Timestamp,
    stale: bool,
    symbols: &SymbolTable,
) -> DecodedMessage {
    let affecting = is_book_affecting(msg_type);
    if !affecting {
        return DecodedMessage::Other(OtherMessage { msg_type });
    }

    let (symbol_index, symbol_valid, side, price, qty, order_id) = match msg_type {
        b'A' | b'F' => decode_add(body, symbols),
        b'E' => decode_executed(body),
        b'C' => decode_executed_with_price(body),
        b'X' => decode_cancel(body),
        b'D' => decode_delete(body),
        b'U' => decode_replace(body),
        b'P' => decode_trade(body, symbols),
        _ => (None, false, None, 0, 0, 0),
    };

    DecodedMessage::Parsed(ParsedMessage {
        ingress_ts,
        decode_ts,
        seq,
        msg_type,
        symbol_index,
        symbol_valid,
        side,
        price,
        qty,
        order_id,
        is_book_affecting: affecting,
        stale,
    })
}

type AddFields = (Option<SymbolIndex>, bool, Option<Side>, Price, u32, u64);

/// Layout (past type byte and seq, per the ITCH 'A'/'F' body): order_id(8)
/// side(1) qty(4) symbol(8) price(4) [+ MPID(4) for 'F', ignored here].
fn decode_add(body: &[u8], symbols: &SymbolTable) -> AddFields {
    if body.len() < 25 {
        return (None, false, None, 0, 0, 0);
    }
    let order_id = be_u64(body, 0);
    let side = Side::from_itch_byte(body[8]);
    let qty = be_u32(body, 9);
    let key = symbol_at(body, 13);
    let price = be_u32(body, 21);
    let index = symbols.lookup(&key);
    (index, index.is_some(), side, price, qty, order_id)
}

/// Layout for 'E' (order executed): order_id(8) qty(4).
fn decode_executed(body: &[u8]) -> AddFields {
    if body.len() < 12 {
        return (None, false, None, 0, 0, 0);
    }
    let order_id = be_u64(body, 0);
    let qty = be_u32(body, 8);
    (None, false, None, 0, qty, order_id)
}

/// Layout for 'C' (order executed with price): order_id(8) qty(4) price(4).
fn decode_executed_with_price(body: &[u8]) -> AddFields {
    if body.len() < 16 {
        return (None, false, None, 0, 0, 0);
    }
    let order_id = be_u64(body, 0);
    let qty = be_u32(body, 8);
    let price = be_u32(body, 12);
    (None, false, None, price, qty, order_id)
}

/// Layout for 'X' (order cancel): order_id(8) qty(4).
fn decode_cancel(body: &[u8]) -> AddFields {
    if body.len() < 12 {
        return (None, false, None, 0, 0, 0);
    }
    let order_id = be_u64(body, 0);
    let qty = be_u32(body, 8);
    (None, false, None, 0, qty, order_id)
}

/// Layout for 'D' (order delete): order_id(8).
fn decode_delete(body: &[u8]) -> AddFields {
    if body.len() < 8 {
        return (None, false, None, 0, 0, 0);
    }
    let order_id = be_u64(body, 0);
    (None, false, None, 0, 0, order_id)
}

/// Layout for 'U' (order replace): old_order_id(8) new_order_id(8) qty(4) price(4).
fn decode_replace(body: &[u8]) -> AddFields {
    if body.len() < 24 {
        return (None, false, None, 0, 0, 0);
    }
    let new_order_id = be_u64(body, 8);
    let qty = be_u32(body, 16);
    let price = be_u32(body, 20);
    (None, false, None, price, qty, new_order_id)
}

/// Layout for 'P' (trade): order_id(8) side(1) qty(4) symbol(8) price(4) match_id(8).
fn decode_trade(body: &[u8], symbols: &SymbolTable) -> AddFields {
    if body.len() < 25 {
        return (None, false, None, 0, 0, 0);
    }
    let order_id = be_u64(body, 0);
    let qty = be_u32(body, 9);
    let key = symbol_at(body, 13);
    let price = be_u32(body, 21);
    let index = symbols.lookup(&key);
    (index, index.is_some(), None, price, qty, order_id)
}
