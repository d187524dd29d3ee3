use alloc::{sync::Arc, vec, vec::Vec};

use crate::{
    AliasRegistry, Codec, Error, Filter, InputStream, Peek, StreamOptions, error::Result,
};

pub fn registry() -> Arc<AliasRegistry> {
    Arc::new(AliasRegistry::builtin())
}

pub fn stream_with(encoding: &str) -> InputStream {
    InputStream::new(
        registry(),
        StreamOptions {
            encoding: Some(encoding.into()),
            ..Default::default()
        },
        None,
    )
    .unwrap()
}

/// Decodes every chunk with a destination of `step` code points at a time.
pub fn decode_chunks(codec: &mut Codec, chunks: &[&[u8]], step: usize) -> Result<Vec<u32>> {
    let mut out = Vec::new();
    let mut buf = vec![0u32; step];
    for chunk in chunks {
        let mut src = *chunk;
        loop {
            let mut dst: &mut [u32] = &mut buf;
            let result = codec.decode(&mut src, &mut dst);
            let produced = step - dst.len();
            out.extend_from_slice(&buf[..produced]);
            match result {
                Ok(()) => break,
                Err(Error::OutOfSpace) => {}
                Err(err) => return Err(err),
            }
        }
    }
    Ok(out)
}

/// Encodes `cps` with a destination of `step` bytes at a time.
pub fn encode_all(codec: &mut Codec, cps: &[u32], step: usize) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    let mut buf = vec![0u8; step];
    let mut src = cps;
    loop {
        let mut dst: &mut [u8] = &mut buf;
        let result = codec.encode(&mut src, &mut dst);
        let produced = step - dst.len();
        out.extend_from_slice(&buf[..produced]);
        match result {
            Ok(()) => return Ok(out),
            Err(Error::OutOfSpace) => {}
            Err(err) => return Err(err),
        }
    }
}

/// Runs every chunk through the filter, then flushes it, writing at most
/// `step` bytes per call.
pub fn filter_chunks(filter: &mut Filter, chunks: &[&[u8]], step: usize) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    let mut buf = vec![0u8; step];
    let flush: &[u8] = &[];
    for chunk in chunks.iter().copied().chain([flush]) {
        let mut src = chunk;
        loop {
            let mut dst: &mut [u8] = &mut buf;
            let result = filter.process(&mut src, &mut dst);
            let produced = step - dst.len();
            out.extend_from_slice(&buf[..produced]);
            match result {
                Ok(()) => break,
                Err(Error::OutOfSpace) => {}
                Err(err) => return Err(err),
            }
        }
    }
    Ok(out)
}

/// Consumes characters until the stream runs dry, returning what was read
/// and the sentinel that stopped it.
pub fn drain(stream: &mut InputStream) -> (Vec<u8>, Peek<()>) {
    let mut out = Vec::new();
    loop {
        match stream.peek(0).unwrap() {
            Peek::Char(bytes) => {
                let len = bytes.len();
                out.extend_from_slice(bytes);
                stream.advance(len);
            }
            Peek::EndOfData => return (out, Peek::EndOfData),
            Peek::OutOfData => return (out, Peek::OutOfData),
        }
    }
}

pub fn code_points(text: &str) -> Vec<u32> {
    text.chars().map(u32::from).collect()
}
