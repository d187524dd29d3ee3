#![no_main]
use std::sync::{Arc, LazyLock};

use arbitrary::Arbitrary;
use charstream::{AliasRegistry, Error, ErrorMode, InputStream, Peek, StreamOptions, split_by_sizes};
use libfuzzer_sys::fuzz_target;

static REGISTRY: LazyLock<Arc<AliasRegistry>> =
    LazyLock::new(|| Arc::new(AliasRegistry::builtin()));

#[derive(Debug, Clone, Copy, Arbitrary)]
enum Charset {
    Utf8,
    Utf16,
    Utf16Le,
    Utf32,
    Ucs2,
    Latin1,
    Ascii,
    ShiftJis,
    Gb18030,
}

impl Charset {
    fn name(self) -> &'static str {
        match self {
            Self::Utf8 => "UTF-8",
            Self::Utf16 => "UTF-16",
            Self::Utf16Le => "UTF-16LE",
            Self::Utf32 => "UTF-32",
            Self::Ucs2 => "UCS-2",
            Self::Latin1 => "ISO-8859-1",
            Self::Ascii => "US-ASCII",
            Self::ShiftJis => "Shift_JIS",
            Self::Gb18030 => "GB18030",
        }
    }
}

#[derive(Debug, Arbitrary)]
struct Input {
    charset: Charset,
    strict: bool,
    capacity: u8,
    splits: Vec<usize>,
    bytes: Vec<u8>,
}

/// Reads everything the stream yields after each append, stopping at the
/// first error.
fn read(input: &Input, chunks: &[&[u8]]) -> (Vec<u8>, Option<Error>) {
    let mut stream = InputStream::new(
        Arc::clone(&REGISTRY),
        StreamOptions {
            encoding: Some(input.charset.name().into()),
            error_mode: if input.strict { ErrorMode::Strict } else { ErrorMode::Loose },
            buffer_capacity: usize::from(input.capacity),
            ..Default::default()
        },
        None,
    )
    .expect("charset is registered");

    let mut out = Vec::new();
    let mut drain = |stream: &mut InputStream| -> Result<(), Error> {
        loop {
            match stream.peek(0)? {
                Peek::Char(bytes) => {
                    assert!(std::str::from_utf8(bytes).is_ok());
                    let len = bytes.len();
                    out.extend_from_slice(bytes);
                    stream.advance(len);
                }
                Peek::EndOfData | Peek::OutOfData => return Ok(()),
            }
        }
    };

    for chunk in chunks {
        stream.append(chunk).expect("append");
        if let Err(err) = drain(&mut stream) {
            return (out, Some(err));
        }
    }
    stream.append_eof();
    let outcome = drain(&mut stream).err();
    assert!(outcome.is_some() || stream.peek(0) == Ok(Peek::EndOfData));
    (out, outcome)
}

fuzz_target!(|input: Input| {
    let whole = read(&input, &[input.bytes.as_slice()]);
    let chunked = read(&input, &split_by_sizes(&input.bytes, &input.splits));
    assert_eq!(whole, chunked, "{input:?}");
    if !input.strict {
        assert_eq!(whole.1, None);
    }
});
