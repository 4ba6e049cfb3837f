use crate::types::PaymentNotification;
use tonfeed_format::{Address, Cell, CellSlice, Coins};
use tonfeed_node_types::TransactionRecord;

/// Body discriminator of an incoming token transfer notification.
const TRANSFER_NOTIFICATION_TAG: u32 = 0x7362_d09c;

/// Payload opcode of a plain text comment.
const COMMENT_TAG: u32 = 0;

/// Decodes one transaction into a payment notification, if it carries one.
///
/// Everything that is not a well formed transfer notification with a text
/// comment quietly yields `None`: external messages, missing bodies, other
/// body discriminators, other payload opcodes, truncated data. The one hard
/// failure is a comment payload that is present but undecodable. A payment
/// arrived in that case and dropping it silently would lose it, so the error
/// is surfaced and the caller decides what to do with the block.
pub fn decode_payment_notification(
    tx: &TransactionRecord,
) -> Result<Option<PaymentNotification>, tonfeed_format::Error> {
    let Some(msg) = &tx.in_msg else {
        return Ok(None);
    };
    let Some(info) = msg.as_internal() else {
        return Ok(None);
    };
    let Some(body) = &msg.body else {
        return Ok(None);
    };

    let Some((amount, sender, mut payload)) = match_notification(body) else {
        return Ok(None);
    };

    let opcode = match payload.load_u32() {
        Ok(opcode) => opcode,
        Err(_) => return Ok(None),
    };
    if opcode != COMMENT_TAG {
        log::debug!(
            "skipping notification for {} with payload opcode {opcode:#010x}",
            tx.account
        );
        return Ok(None);
    }

    let comment = payload.load_string_snake()?;
    let notification = PaymentNotification {
        amount,
        sender,
        destination: info.dest,
        comment,
    };
    log::info!(
        "payment of {} from {} to {} with comment {:?}",
        notification.amount,
        notification.sender,
        notification.destination,
        notification.comment
    );
    Ok(Some(notification))
}

/// Matches the fixed head of a transfer notification body and returns the
/// amount, the sender and the forward payload slice. Any mismatch means the
/// message is something else entirely.
fn match_notification(body: &Cell) -> Option<(Coins, Address, CellSlice<'_>)> {
    let mut slice = body.parse();
    if slice.load_u32().ok()? != TRANSFER_NOTIFICATION_TAG {
        return None;
    }
    // query id
    slice.skip_bits(64).ok()?;
    let amount = slice.load_coins().ok()?;
    let sender = slice.load_address().ok()??;
    // the payload is either inlined in the remainder or hangs off a
    // reference cell
    let payload = if slice.load_bit().ok()? {
        slice.load_reference().ok()?.parse()
    } else {
        slice
    };
    Some((amount, sender, payload))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tonfeed_format::{CellBuilder, HashBytes, IntMsgInfo, Message, MsgInfo};

    fn owner() -> Address {
        Address::new(0, [0x22; 32])
    }

    fn sender_wallet() -> Address {
        Address::new(0, [0x44; 32])
    }

    fn tx_with_body(body: Option<Cell>) -> TransactionRecord {
        TransactionRecord {
            account: owner(),
            lt: 1_000_001,
            hash: HashBytes::from([0xaa; 32]),
            in_msg: Some(Message {
                info: MsgInfo::Internal(IntMsgInfo {
                    bounce: false,
                    bounced: false,
                    src: Address::new(0, [0x33; 32]),
                    dest: owner(),
                    value: Coins::new(50_000_000),
                    created_lt: 1_000_000,
                    created_at: 1_700_000_000,
                }),
                body,
            }),
        }
    }

    fn notification_head(amount: u128) -> CellBuilder {
        let mut builder = CellBuilder::new();
        builder.store_u32(TRANSFER_NOTIFICATION_TAG).unwrap();
        builder.store_u64(42).unwrap();
        builder.store_coins(Coins::new(amount)).unwrap();
        builder.store_address(&sender_wallet()).unwrap();
        builder
    }

    fn comment_cell(text: &[u8]) -> Cell {
        let mut builder = CellBuilder::new();
        builder.store_u32(COMMENT_TAG).unwrap();
        builder.store_bytes(text).unwrap();
        builder.build()
    }

    #[test]
    fn test_inline_comment() {
        let mut body = notification_head(1_000_000);
        body.store_bit(false).unwrap();
        body.store_u32(COMMENT_TAG).unwrap();
        body.store_bytes(b"order 17").unwrap();

        let tx = tx_with_body(Some(body.build()));
        let notification = decode_payment_notification(&tx).unwrap().unwrap();
        assert_eq!(notification.amount, Coins::new(1_000_000));
        assert_eq!(notification.sender, sender_wallet());
        assert_eq!(notification.destination, owner());
        assert_eq!(notification.comment, "order 17");
    }

    #[test]
    fn test_referenced_comment() {
        let mut body = notification_head(7);
        body.store_bit(true).unwrap();
        body.store_reference(Arc::new(comment_cell(b"ref comment")))
            .unwrap();

        let tx = tx_with_body(Some(body.build()));
        let notification = decode_payment_notification(&tx).unwrap().unwrap();
        assert_eq!(notification.comment, "ref comment");
    }

    #[test]
    fn test_long_comment_spans_cells() {
        let mut tail = CellBuilder::new();
        tail.store_bytes(b", and then some more").unwrap();

        let mut head = CellBuilder::new();
        head.store_u32(COMMENT_TAG).unwrap();
        head.store_bytes(b"a comment that keeps going").unwrap();
        head.store_reference(Arc::new(tail.build())).unwrap();

        let mut body = notification_head(1);
        body.store_bit(true).unwrap();
        body.store_reference(Arc::new(head.build())).unwrap();

        let tx = tx_with_body(Some(body.build()));
        let notification = decode_payment_notification(&tx).unwrap().unwrap();
        assert_eq!(
            notification.comment,
            "a comment that keeps going, and then some more"
        );
    }

    #[test]
    fn test_other_discriminator_is_not_a_payment() {
        let mut body = CellBuilder::new();
        body.store_u32(0x0f8a_7ea5).unwrap();
        body.store_u64(42).unwrap();

        let tx = tx_with_body(Some(body.build()));
        assert_eq!(decode_payment_notification(&tx).unwrap(), None);
    }

    #[test]
    fn test_non_comment_payload_is_skipped() {
        let mut body = notification_head(5);
        body.store_bit(false).unwrap();
        body.store_u32(0xdead_beef).unwrap();

        let tx = tx_with_body(Some(body.build()));
        assert_eq!(decode_payment_notification(&tx).unwrap(), None);
    }

    #[test]
    fn test_empty_forward_payload() {
        let mut body = notification_head(5);
        body.store_bit(false).unwrap();

        let tx = tx_with_body(Some(body.build()));
        assert_eq!(decode_payment_notification(&tx).unwrap(), None);
    }

    #[test]
    fn test_truncated_body() {
        let mut body = CellBuilder::new();
        body.store_u32(TRANSFER_NOTIFICATION_TAG).unwrap();

        let tx = tx_with_body(Some(body.build()));
        assert_eq!(decode_payment_notification(&tx).unwrap(), None);
    }

    #[test]
    fn test_missing_sender_address() {
        let mut body = CellBuilder::new();
        body.store_u32(TRANSFER_NOTIFICATION_TAG).unwrap();
        body.store_u64(42).unwrap();
        body.store_coins(Coins::new(5)).unwrap();
        // addr_none instead of a standard sender
        body.store_uint(0b00, 2).unwrap();
        body.store_bit(false).unwrap();
        body.store_u32(COMMENT_TAG).unwrap();

        let tx = tx_with_body(Some(body.build()));
        assert_eq!(decode_payment_notification(&tx).unwrap(), None);
    }

    #[test]
    fn test_missing_body() {
        let tx = tx_with_body(None);
        assert_eq!(decode_payment_notification(&tx).unwrap(), None);
    }

    #[test]
    fn test_external_message() {
        let mut tx = tx_with_body(None);
        tx.in_msg = Some(Message {
            info: MsgInfo::ExternalIn(tonfeed_format::ExtInMsgInfo { dest: owner() }),
            body: Some(comment_cell(b"not a transfer")),
        });
        assert_eq!(decode_payment_notification(&tx).unwrap(), None);
    }

    #[test]
    fn test_undecodable_comment_is_fatal() {
        let mut body = notification_head(9);
        body.store_bit(false).unwrap();
        body.store_u32(COMMENT_TAG).unwrap();
        body.store_bytes(&[0xff, 0xfe, 0x00, 0x81]).unwrap();

        let tx = tx_with_body(Some(body.build()));
        assert!(matches!(
            decode_payment_notification(&tx),
            Err(tonfeed_format::Error::InvalidUtf8(_))
        ));
    }
}
