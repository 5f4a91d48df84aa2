//! StreamBuffer のプロパティテスト

use proptest::prelude::*;
use shiguredo_multipart::StreamBuffer;

#[derive(Debug, Clone)]
enum Op {
    Append(Vec<u8>),
    Read(Option<usize>),
    Consume(usize),
    Compact,
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        proptest::collection::vec(any::<u8>(), 0..32).prop_map(Op::Append),
        proptest::option::of(0usize..48).prop_map(Op::Read),
        (0usize..48).prop_map(Op::Consume),
        Just(Op::Compact),
    ]
}

// 操作列を単純なモデル (未読バイト列) と比較する
proptest! {
    #[test]
    fn buffer_matches_model(ops in proptest::collection::vec(op(), 0..64)) {
        let mut buffer = StreamBuffer::new();
        let mut model: Vec<u8> = Vec::new();

        for op in ops {
            match op {
                Op::Append(bytes) => {
                    prop_assert_eq!(buffer.append(&bytes), bytes.len());
                    model.extend_from_slice(&bytes);
                }
                Op::Read(size) => {
                    let n = size.map_or(model.len(), |size| size.min(model.len()));
                    let expected: Vec<u8> = model.drain(..n).collect();
                    prop_assert_eq!(buffer.read(size), expected);
                }
                Op::Consume(n) => {
                    buffer.consume(n);
                    model.drain(..n.min(model.len()));
                }
                Op::Compact => {
                    buffer.compact();
                }
            }
            prop_assert_eq!(buffer.unread(), model.as_slice());
            prop_assert_eq!(buffer.length_unread(), model.len());
            prop_assert_eq!(buffer.is_empty(), model.is_empty());
            prop_assert!(buffer.capacity_used() >= model.len());
        }
    }
}

// compact は読み取り済み領域が未読領域以上のときだけ詰める
proptest! {
    #[test]
    fn buffer_compact_reclaims(data in proptest::collection::vec(any::<u8>(), 1..64), read in 0usize..64) {
        let mut buffer = StreamBuffer::from_bytes(data.clone());
        let read = read.min(data.len());
        buffer.consume(read);
        let unread = data.len() - read;

        let compacted = buffer.compact();
        prop_assert_eq!(compacted, read > 0 && read >= unread);
        if compacted {
            prop_assert_eq!(buffer.capacity_used(), unread);
        } else {
            prop_assert_eq!(buffer.capacity_used(), data.len());
        }
        prop_assert_eq!(buffer.unread(), &data[read..]);
    }
}
