#![no_main]

use libfuzzer_sys::fuzz_target;

use chunkstream::{ChunkedStream, StreamError};

// Differential target: drive a ChunkedStream and a flat Vec<u8> + cursor
// model with the same op sequence and require identical observable behavior.
fuzz_target!(|data: &[u8]| {
    let mut input = data.iter().copied();
    let Some(cap) = input.next() else { return };
    let cap = usize::from(cap % 64) + 1;

    let mut stream = ChunkedStream::with_chunk_capacity(cap);
    let mut model: Vec<u8> = Vec::new();
    let mut cursor: usize = 0;

    while let Some(op) = input.next() {
        match op % 5 {
            0 => {
                // write a run of bytes
                let n = usize::from(input.next().unwrap_or(0));
                let payload: Vec<u8> = (&mut input).take(n).collect();
                stream.write(&payload).unwrap();
                model.extend_from_slice(&payload);
            }
            1 => {
                // read and compare against the model
                let n = usize::from(input.next().unwrap_or(0));
                let mut buf = vec![0u8; n];
                let got = stream.read(&mut buf).unwrap();
                let end = (cursor + n).min(model.len());
                assert_eq!(&buf[..got], &model[cursor..end]);
                cursor += got;
            }
            2 => {
                // seek; out-of-range targets must not move the cursor
                let target = u64::from(input.next().unwrap_or(0))
                    * u64::from(input.next().unwrap_or(1));
                match stream.seek(target) {
                    Ok(()) => cursor = target as usize,
                    Err(StreamError::OutOfRange { .. }) => {
                        assert!(target > model.len() as u64);
                    }
                    Err(e) => panic!("unexpected seek error: {e}"),
                }
                assert_eq!(stream.position().unwrap(), cursor as u64);
            }
            3 => {
                // single byte
                let expected = model.get(cursor).copied();
                assert_eq!(stream.read_byte().unwrap(), expected);
                if expected.is_some() {
                    cursor += 1;
                }
            }
            _ => {
                // snapshot must match the model and preserve the cursor
                let snapshot = stream.to_bytes().unwrap();
                assert_eq!(&snapshot[..], &model[..]);
                assert_eq!(stream.position().unwrap(), cursor as u64);
            }
        }
        assert_eq!(stream.len().unwrap(), model.len() as u64);
    }
});
