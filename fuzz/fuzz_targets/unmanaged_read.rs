#![no_main]

use libfuzzer_sys::fuzz_target;

use chunkstream::UnmanagedChunkedStream;

// Split the input into native-style segments and require that traversal
// through the unmanaged stream reproduces the flat input exactly.
fuzz_target!(|data: &[u8]| {
    let Some((&first, rest)) = data.split_first() else {
        return;
    };
    let segment_len = usize::from(first % 16) + 1;

    let parts: Vec<(*const u8, usize)> = rest
        .chunks(segment_len)
        .map(|c| (c.as_ptr(), c.len()))
        .collect();

    // Safety: every part points into `rest`, which outlives the stream.
    let mut stream = unsafe { UnmanagedChunkedStream::from_parts(&parts) };

    assert_eq!(stream.len().unwrap(), rest.len() as u64);

    // Full traversal matches the flat input and preserves the cursor.
    let snapshot = stream.to_bytes().unwrap();
    assert_eq!(&snapshot[..], rest);
    assert_eq!(stream.position().unwrap(), 0);

    // Every position yields the byte a flat scan finds there.
    for p in 0..rest.len().min(512) {
        stream.seek(p as u64).unwrap();
        assert_eq!(stream.read_byte().unwrap(), Some(rest[p]));
    }
    stream.seek(rest.len() as u64).unwrap();
    assert_eq!(stream.read_byte().unwrap(), None);

    // The write family is rejected unconditionally.
    assert!(stream.write(b"x").is_err());
    assert!(stream.set_len(0).is_err());
});
